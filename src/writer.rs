use anyhow::{Context, Result};
use tracing::info;

use crate::sheets::{SheetStore, full_width_range};
use crate::stat_rows::StatRecord;

/// Create `tab` with its header row if it is missing. Returns `true` when the
/// tab was created. An existing tab is left as is, header included.
pub fn ensure_tab<S: SheetStore + ?Sized>(store: &mut S, tab: &str, headers: &[&str]) -> Result<bool> {
    let tabs = store.list_tabs().context("list spreadsheet tabs")?;
    if tabs.contains(tab) {
        return Ok(false);
    }
    store
        .create_tab(tab)
        .with_context(|| format!("create tab {tab}"))?;
    let header = headers.iter().map(|h| h.to_string()).collect::<Vec<_>>();
    store
        .write_range(tab, "A1", &[header])
        .with_context(|| format!("write header row to {tab}"))?;
    info!(tab, columns = headers.len(), "created tab");
    Ok(true)
}

/// Bulk-append `rows` to `tab` in header column order. Empty batches make no call.
pub fn append_records<S, R>(store: &mut S, tab: &str, rows: &[R]) -> Result<usize>
where
    S: SheetStore + ?Sized,
    R: StatRecord,
{
    if rows.is_empty() {
        return Ok(0);
    }
    let values = rows.iter().map(StatRecord::values).collect::<Vec<_>>();
    let range = full_width_range(R::HEADERS.len());
    store
        .append_rows(tab, &range, &values)
        .with_context(|| format!("append {} rows to {tab}", values.len()))?;
    Ok(values.len())
}
