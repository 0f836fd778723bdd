use std::collections::HashSet;

use anyhow::{Context, Result, anyhow};

use crate::sheets::{SheetStore, column_index, column_letters};
use crate::stat_rows::{StatRecord, composite_key};

/// Which destination columns hold the two key parts, in key order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyColumns {
    pub first: &'static str,
    pub second: &'static str,
}

impl KeyColumns {
    pub const fn new(first: &'static str, second: &'static str) -> Self {
        Self { first, second }
    }

    /// Smallest column span covering both key columns plus the offsets of
    /// each part inside it.
    fn span(&self) -> Result<(String, usize, usize)> {
        let first = column_index(self.first)
            .ok_or_else(|| anyhow!("invalid key column {}", self.first))?;
        let second = column_index(self.second)
            .ok_or_else(|| anyhow!("invalid key column {}", self.second))?;
        let start = first.min(second);
        let end = first.max(second);
        let range = format!("{}:{}", column_letters(start), column_letters(end));
        Ok((range, first - start, second - start))
    }
}

/// Composite keys already present in one tab plus keys accepted during this run.
#[derive(Debug, Clone, Default)]
pub struct KeySet {
    keys: HashSet<String>,
}

impl KeySet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.keys.contains(key)
    }

    pub fn insert(&mut self, key: String) -> bool {
        self.keys.insert(key)
    }
}

impl<S: Into<String>> FromIterator<S> for KeySet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self {
            keys: iter.into_iter().map(Into::into).collect(),
        }
    }
}

/// Build a key set from rows read over a key span. Row 0 is the header.
pub fn keys_from_rows(rows: &[Vec<String>], first_at: usize, second_at: usize) -> KeySet {
    let mut keys = KeySet::new();
    for row in rows.iter().skip(1) {
        let first = row.get(first_at).map(String::as_str).unwrap_or_default();
        let second = row.get(second_at).map(String::as_str).unwrap_or_default();
        if let Some(key) = composite_key(first, second) {
            keys.insert(key);
        }
    }
    keys
}

/// Keys already stored in `tab`. A tab that does not exist yet has none.
pub fn load_existing_keys<S: SheetStore + ?Sized>(
    store: &S,
    tab: &str,
    columns: KeyColumns,
) -> Result<KeySet> {
    let (range, first_at, second_at) = columns.span()?;
    let rows = store
        .read_range(tab, &range)
        .with_context(|| format!("read existing keys from {tab}!{range}"))?;
    let Some(rows) = rows else {
        return Ok(KeySet::new());
    };
    Ok(keys_from_rows(&rows, first_at, second_at))
}

#[derive(Debug, Clone)]
pub struct Reconciled<R> {
    pub accepted: Vec<R>,
    pub duplicates: usize,
}

/// Lookup key for a candidate. A blank part still yields `"<a>|<b>"` so that
/// repeats inside one batch collapse; such keys never match the sheet since
/// `keys_from_rows` leaves blank-part rows out.
fn candidate_key<R: StatRecord>(row: &R) -> String {
    let (first, second) = row.key_parts();
    format!("{}|{}", first.trim(), second.trim())
}

/// Keep candidates whose key is not yet known, in order. Accepted keys join
/// `existing` so repeats later in the same batch are dropped too.
pub fn reconcile<R: StatRecord>(candidates: Vec<R>, existing: &mut KeySet) -> Reconciled<R> {
    let mut accepted = Vec::with_capacity(candidates.len());
    let mut duplicates = 0usize;
    for row in candidates {
        let key = candidate_key(&row);
        if existing.contains(&key) {
            duplicates += 1;
            continue;
        }
        existing.insert(key);
        accepted.push(row);
    }
    Reconciled {
        accepted,
        duplicates,
    }
}
