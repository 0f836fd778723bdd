use anyhow::Result;

use nba_sheet_sync::logging::init_logging;
use nba_sheet_sync::pipelines::PipelineKind;
use nba_sheet_sync::runner::{self, RunOptions};

fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    init_logging();

    let args = std::env::args().skip(1).collect::<Vec<_>>();
    let options = RunOptions::from_args(&args)?;
    let summary = runner::run(PipelineKind::Team, &options)?;
    runner::print_summary(&summary);
    Ok(())
}
