use std::collections::HashMap;
use std::io::Read;

use anyhow::{Context, Result};
use chrono::{DateTime, FixedOffset};
use tracing::info;

use crate::dedup::{load_existing_keys, reconcile};
use crate::pipelines::StatPipeline;
use crate::row_filter::{FilterStats, FilteredRows, Retained, filter_rows};
use crate::sheets::SheetStore;
use crate::stat_rows::StatRecord;
use crate::writer::{append_records, ensure_tab};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TabSummary {
    pub tab: String,
    pub created: bool,
    pub existing_keys: usize,
    pub candidates: usize,
    pub duplicates: usize,
    pub appended: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportSummary {
    pub pipeline: String,
    pub filter: FilterStats,
    /// Retained rows the router dropped (season outside the allowed set).
    pub unrouted: usize,
    pub tabs: Vec<TabSummary>,
    pub total_appended: usize,
}

/// Rows grouped by destination tab, tabs in first-seen order.
#[derive(Debug, Clone)]
pub struct RoutedRows<R> {
    pub tabs: Vec<(String, Vec<R>)>,
    pub unrouted: usize,
}

pub fn route_rows<P: StatPipeline>(
    pipeline: &P,
    rows: Vec<Retained<P::Record>>,
) -> RoutedRows<P::Record> {
    let mut tabs: Vec<(String, Vec<P::Record>)> = Vec::new();
    let mut slots: HashMap<String, usize> = HashMap::new();
    let mut unrouted = 0usize;
    for row in rows {
        let Some(tab) = pipeline.route(&row.played_at) else {
            unrouted += 1;
            continue;
        };
        let slot = *slots.entry(tab.clone()).or_insert_with(|| {
            tabs.push((tab, Vec::new()));
            tabs.len() - 1
        });
        tabs[slot].1.push(row.record);
    }
    RoutedRows { tabs, unrouted }
}

/// Route, dedup and append already filtered rows. Tabs are written one after
/// another; an error leaves earlier tabs written.
pub fn import_filtered<S, P>(
    store: &mut S,
    pipeline: &P,
    filtered: FilteredRows<P::Record>,
) -> Result<ImportSummary>
where
    S: SheetStore + ?Sized,
    P: StatPipeline,
{
    let routed = route_rows(pipeline, filtered.rows);
    let mut summary = ImportSummary {
        pipeline: pipeline.name().to_string(),
        filter: filtered.stats,
        unrouted: routed.unrouted,
        ..Default::default()
    };

    for (tab, candidates) in routed.tabs {
        let tab_summary = import_tab(store, pipeline, &tab, candidates)
            .with_context(|| format!("import into tab {tab}"))?;
        summary.total_appended += tab_summary.appended;
        summary.tabs.push(tab_summary);
    }
    Ok(summary)
}

fn import_tab<S, P>(
    store: &mut S,
    pipeline: &P,
    tab: &str,
    candidates: Vec<P::Record>,
) -> Result<TabSummary>
where
    S: SheetStore + ?Sized,
    P: StatPipeline,
{
    let created = ensure_tab(store, tab, P::Record::HEADERS)?;
    let mut keys = load_existing_keys(store, tab, pipeline.key_columns())?;
    let existing_keys = keys.len();
    let candidate_count = candidates.len();
    info!(
        tab,
        existing_keys,
        candidates = candidate_count,
        "reconciling"
    );

    let reconciled = reconcile(candidates, &mut keys);
    let appended = append_records(store, tab, &reconciled.accepted)?;
    if appended > 0 {
        info!(tab, appended, "appended new rows");
    } else {
        info!(tab, "no new rows (all duplicates)");
    }

    Ok(TabSummary {
        tab: tab.to_string(),
        created,
        existing_keys,
        candidates: candidate_count,
        duplicates: reconciled.duplicates,
        appended,
    })
}

/// Filter `reader` against `cutoff`, then import what survives. The store is
/// not touched when nothing survives the filter.
pub fn run_import<S, P, Rd>(
    store: &mut S,
    pipeline: &P,
    reader: Rd,
    cutoff: DateTime<FixedOffset>,
) -> Result<ImportSummary>
where
    S: SheetStore + ?Sized,
    P: StatPipeline,
    Rd: Read,
{
    let filtered = filter_rows(reader, pipeline, cutoff)?;
    if filtered.rows.is_empty() {
        return Ok(ImportSummary {
            pipeline: pipeline.name().to_string(),
            filter: filtered.stats,
            ..Default::default()
        });
    }
    import_filtered(store, pipeline, filtered)
}
