use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};
use chrono::{DateTime, FixedOffset, TimeDelta, Utc};
use tracing::info;

use crate::config::{ImportConfig, parse_lookback_hours};
use crate::game_time::compute_cutoff;
use crate::http_client::http_client;
use crate::importer::{ImportSummary, import_filtered};
use crate::kaggle::{KaggleCredentials, fetch_dataset_file};
use crate::memory_sheets::MemorySheets;
use crate::pipelines::{PipelineKind, PlayerPipeline, StatPipeline, TeamPipeline};
use crate::row_filter::filter_rows;
use crate::sheets_api::SheetsApiClient;

/// Command-line overrides shared by the importer binaries.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunOptions {
    pub lookback: Option<TimeDelta>,
    pub spreadsheet_id: Option<String>,
    pub csv_path: Option<PathBuf>,
    pub dry_run: bool,
}

impl RunOptions {
    /// Accepts `--flag=value` and `--flag value`. Unknown arguments are ignored.
    pub fn from_args(args: &[String]) -> Result<Self> {
        let mut out = Self::default();
        if let Some(raw) = flag_value(args, "--lookback-hours") {
            let hours = parse_lookback_hours(&raw)
                .ok_or_else(|| anyhow!("--lookback-hours must be a positive integer, got {raw:?}"))?;
            out.lookback = Some(hours);
        }
        out.spreadsheet_id = flag_value(args, "--spreadsheet-id");
        out.csv_path = flag_value(args, "--csv").map(PathBuf::from);
        out.dry_run = args.iter().any(|a| a == "--dry-run");
        Ok(out)
    }

    pub fn apply(&self, cfg: &mut ImportConfig) {
        if let Some(lookback) = self.lookback {
            cfg.lookback = lookback;
        }
        if let Some(id) = self.spreadsheet_id.as_ref() {
            cfg.spreadsheet_id = id.clone();
        }
    }
}

fn flag_value(args: &[String], flag: &str) -> Option<String> {
    let prefix = format!("{flag}=");
    for (idx, arg) in args.iter().enumerate() {
        if let Some(value) = arg.strip_prefix(&prefix) {
            let trimmed = value.trim();
            if !trimmed.is_empty() {
                return Some(trimmed.to_string());
            }
        }
        if arg == flag {
            let Some(next) = args.get(idx + 1) else {
                continue;
            };
            if !next.trim().is_empty() {
                return Some(next.trim().to_string());
            }
        }
    }
    None
}

/// Full run for `kind`: resolve config, fetch the CSV, filter, then import.
pub fn run(kind: PipelineKind, options: &RunOptions) -> Result<ImportSummary> {
    let mut cfg = ImportConfig::from_env(kind);
    options.apply(&mut cfg);

    let csv_path = match options.csv_path.as_ref() {
        Some(path) => path.clone(),
        None => download_source(&cfg)?,
    };

    let cutoff = compute_cutoff(Utc::now(), cfg.lookback);
    info!(cutoff = %cutoff.to_rfc3339(), lookback_hours = cfg.lookback_hours(), "computed cutoff");

    match kind {
        PipelineKind::Team => {
            let pipeline = TeamPipeline::default();
            run_pipeline(&cfg, &pipeline, &csv_path, cutoff, options.dry_run)
        }
        PipelineKind::Player => {
            let pipeline = PlayerPipeline::default();
            run_pipeline(&cfg, &pipeline, &csv_path, cutoff, options.dry_run)
        }
    }
}

fn download_source(cfg: &ImportConfig) -> Result<PathBuf> {
    info!(dataset = %cfg.dataset, file = %cfg.file_name, "downloading source CSV");
    let credentials = KaggleCredentials::resolve()?;
    let downloaded = fetch_dataset_file(
        http_client()?,
        &credentials,
        &cfg.dataset,
        &cfg.file_name,
        &cfg.download_dir,
    )
    .with_context(|| format!("download {} from {}", cfg.file_name, cfg.dataset))?;
    info!(
        path = %downloaded.path.display(),
        size_mb = %format!("{:.1}", downloaded.bytes as f64 / 1024.0 / 1024.0),
        "downloaded"
    );
    Ok(downloaded.path)
}

fn run_pipeline<P: StatPipeline>(
    cfg: &ImportConfig,
    pipeline: &P,
    csv_path: &Path,
    cutoff: DateTime<FixedOffset>,
    dry_run: bool,
) -> Result<ImportSummary> {
    let file = File::open(csv_path).with_context(|| format!("open {}", csv_path.display()))?;
    let filtered = filter_rows(BufReader::new(file), pipeline, cutoff)?;
    info!(
        columns = filtered.stats.header_columns,
        rows = filtered.stats.rows_read,
        retained = filtered.stats.retained,
        "CSV headers validated, rows filtered"
    );

    if filtered.rows.is_empty() {
        info!("nothing new to import");
        return Ok(ImportSummary {
            pipeline: pipeline.name().to_string(),
            filter: filtered.stats,
            ..Default::default()
        });
    }

    if dry_run {
        info!("dry run: reconciling against an empty in-memory spreadsheet");
        let mut store = MemorySheets::new();
        return import_filtered(&mut store, pipeline, filtered);
    }

    let mut store = SheetsApiClient::connect(&cfg.spreadsheet_id, &cfg.credentials_path)?;
    info!(spreadsheet = store.spreadsheet_id(), "authenticated with google sheets");
    import_filtered(&mut store, pipeline, filtered)
}

pub fn print_summary(summary: &ImportSummary) {
    println!("{} import complete", summary.pipeline);
    println!(
        "Rows read: {} retained: {} (bad dates {}, before cutoff {}, out of season {})",
        summary.filter.rows_read,
        summary.filter.retained,
        summary.filter.unparseable_dates,
        summary.filter.before_cutoff,
        summary.filter.out_of_season,
    );
    if summary.unrouted > 0 {
        println!("Rows outside importable seasons: {}", summary.unrouted);
    }
    for tab in &summary.tabs {
        println!(
            "tab {}: existing keys={} candidates={} duplicates={} appended={}{}",
            tab.tab,
            tab.existing_keys,
            tab.candidates,
            tab.duplicates,
            tab.appended,
            if tab.created { " (created)" } else { "" }
        );
    }
    println!("Total rows appended: {}", summary.total_appended);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn parses_both_flag_forms() {
        let opts = RunOptions::from_args(&args(&[
            "--lookback-hours=48",
            "--csv",
            "/data/TeamStatistics.csv",
            "--dry-run",
        ]))
        .unwrap();
        assert_eq!(opts.lookback, Some(TimeDelta::hours(48)));
        assert_eq!(opts.csv_path, Some(PathBuf::from("/data/TeamStatistics.csv")));
        assert!(opts.dry_run);
        assert!(opts.spreadsheet_id.is_none());
    }

    #[test]
    fn rejects_bad_lookback_flag() {
        assert!(RunOptions::from_args(&args(&["--lookback-hours=soon"])).is_err());
    }

    #[test]
    fn flags_override_config() {
        let mut cfg = ImportConfig::defaults(PipelineKind::Team);
        let opts = RunOptions {
            lookback: Some(TimeDelta::hours(6)),
            spreadsheet_id: Some("override".to_string()),
            ..Default::default()
        };
        opts.apply(&mut cfg);
        assert_eq!(cfg.lookback_hours(), 6);
        assert_eq!(cfg.spreadsheet_id, "override");
    }
}
