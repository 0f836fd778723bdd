use std::io::Read;

use anyhow::{Context, Result};
use chrono::{DateTime, FixedOffset};

use crate::error::SchemaError;
use crate::game_time::parse_game_datetime;
use crate::pipelines::StatPipeline;
use crate::stat_rows::StatRecord;

#[derive(Debug, Clone)]
pub struct Retained<R> {
    pub record: R,
    pub played_at: DateTime<FixedOffset>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterStats {
    pub header_columns: usize,
    pub rows_read: usize,
    pub unparseable_dates: usize,
    pub before_cutoff: usize,
    pub out_of_season: usize,
    pub retained: usize,
}

#[derive(Debug, Clone)]
pub struct FilteredRows<R> {
    pub rows: Vec<Retained<R>>,
    pub stats: FilterStats,
}

/// Names from `expected` that `header` lacks, in `expected` order.
pub fn missing_columns<'a>(header: &csv::StringRecord, expected: &[&'a str]) -> Vec<&'a str> {
    expected
        .iter()
        .copied()
        .filter(|name| !header.iter().any(|h| h == *name))
        .collect()
}

/// Stream the CSV, keeping rows dated at or after `cutoff` that the pipeline
/// considers in season. The header is checked before any row is read.
pub fn filter_rows<P, Rd>(
    reader: Rd,
    pipeline: &P,
    cutoff: DateTime<FixedOffset>,
) -> Result<FilteredRows<P::Record>>
where
    P: StatPipeline,
    Rd: Read,
{
    let mut rdr = csv::ReaderBuilder::new()
        .trim(csv::Trim::Headers)
        .flexible(true)
        .from_reader(reader);

    let header = rdr.headers().context("read CSV header")?.clone();
    let missing = missing_columns(&header, P::Record::HEADERS);
    if !missing.is_empty() {
        return Err(SchemaError::MissingColumns {
            missing: missing.into_iter().map(str::to_string).collect(),
        }
        .into());
    }

    let mut stats = FilterStats {
        header_columns: header.len(),
        ..Default::default()
    };
    let mut rows = Vec::new();
    for (idx, result) in rdr.deserialize::<P::Record>().enumerate() {
        let record = result.with_context(|| format!("decode CSV record {}", idx + 1))?;
        stats.rows_read += 1;

        let Some(played_at) = parse_game_datetime(record.game_date_time()) else {
            stats.unparseable_dates += 1;
            continue;
        };
        if played_at < cutoff {
            stats.before_cutoff += 1;
            continue;
        }
        if !pipeline.in_season(&played_at) {
            stats.out_of_season += 1;
            continue;
        }
        rows.push(Retained { record, played_at });
    }
    stats.retained = rows.len();

    Ok(FilteredRows { rows, stats })
}
