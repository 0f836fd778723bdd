use std::cell::RefCell;
use std::collections::{BTreeMap, BTreeSet, HashSet};

use anyhow::{Result, anyhow};

use crate::sheets::{SheetStore, column_index};

/// Operations seen by a [`MemorySheets`], in call order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SheetCall {
    ListTabs,
    CreateTab(String),
    WriteRange { tab: String, range: String, rows: usize },
    ReadRange { tab: String, range: String },
    AppendRows { tab: String, range: String, rows: usize },
}

/// Spreadsheet held in memory. Behaves like the remote API for the calls the
/// importer makes: reads trim trailing blanks, missing tabs read as `None`,
/// creating an existing tab fails.
#[derive(Debug, Clone, Default)]
pub struct MemorySheets {
    tabs: BTreeMap<String, Vec<Vec<String>>>,
    calls: RefCell<Vec<SheetCall>>,
    failing_appends: HashSet<String>,
}

impl MemorySheets {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a tab with raw rows (header first).
    pub fn with_tab(mut self, tab: &str, rows: Vec<Vec<String>>) -> Self {
        self.tabs.insert(tab.to_string(), rows);
        self
    }

    /// Make every append to `tab` fail, as a quota or network error would.
    pub fn fail_appends_to(&mut self, tab: &str) {
        self.failing_appends.insert(tab.to_string());
    }

    pub fn rows(&self, tab: &str) -> Option<&[Vec<String>]> {
        self.tabs.get(tab).map(Vec::as_slice)
    }

    /// Data rows, header excluded.
    pub fn data_rows(&self, tab: &str) -> usize {
        self.tabs
            .get(tab)
            .map(|rows| rows.len().saturating_sub(1))
            .unwrap_or(0)
    }

    pub fn calls(&self) -> Vec<SheetCall> {
        self.calls.borrow().clone()
    }

    pub fn clear_calls(&mut self) {
        self.calls.get_mut().clear();
    }

    fn record(&self, call: SheetCall) {
        self.calls.borrow_mut().push(call);
    }

    fn tab_mut(&mut self, tab: &str) -> Result<&mut Vec<Vec<String>>> {
        self.tabs
            .get_mut(tab)
            .ok_or_else(|| anyhow!("Unable to parse range: tab {tab} does not exist"))
    }
}

impl SheetStore for MemorySheets {
    fn list_tabs(&self) -> Result<BTreeSet<String>> {
        self.record(SheetCall::ListTabs);
        Ok(self.tabs.keys().cloned().collect())
    }

    fn create_tab(&mut self, tab: &str) -> Result<()> {
        self.record(SheetCall::CreateTab(tab.to_string()));
        if self.tabs.contains_key(tab) {
            return Err(anyhow!("a sheet with the name \"{tab}\" already exists"));
        }
        self.tabs.insert(tab.to_string(), Vec::new());
        Ok(())
    }

    fn write_range(&mut self, tab: &str, range: &str, values: &[Vec<String>]) -> Result<()> {
        self.record(SheetCall::WriteRange {
            tab: tab.to_string(),
            range: range.to_string(),
            rows: values.len(),
        });
        let (col, row) = parse_cell(range).ok_or_else(|| anyhow!("bad cell reference {range}"))?;
        let grid = self.tab_mut(tab)?;
        for (offset, values) in values.iter().enumerate() {
            let target = row + offset;
            if grid.len() <= target {
                grid.resize(target + 1, Vec::new());
            }
            let line = &mut grid[target];
            if line.len() < col + values.len() {
                line.resize(col + values.len(), String::new());
            }
            for (i, value) in values.iter().enumerate() {
                line[col + i] = value.clone();
            }
        }
        Ok(())
    }

    fn read_range(&self, tab: &str, range: &str) -> Result<Option<Vec<Vec<String>>>> {
        self.record(SheetCall::ReadRange {
            tab: tab.to_string(),
            range: range.to_string(),
        });
        let (start, end) =
            parse_column_span(range).ok_or_else(|| anyhow!("bad column range {range}"))?;
        let Some(grid) = self.tabs.get(tab) else {
            return Ok(None);
        };
        let mut out: Vec<Vec<String>> = grid
            .iter()
            .map(|line| {
                let mut cells: Vec<String> = line
                    .iter()
                    .skip(start)
                    .take(end - start + 1)
                    .cloned()
                    .collect();
                while cells.last().is_some_and(|c| c.is_empty()) {
                    cells.pop();
                }
                cells
            })
            .collect();
        while out.last().is_some_and(|r| r.is_empty()) {
            out.pop();
        }
        Ok(Some(out))
    }

    fn append_rows(&mut self, tab: &str, range: &str, rows: &[Vec<String>]) -> Result<()> {
        self.record(SheetCall::AppendRows {
            tab: tab.to_string(),
            range: range.to_string(),
            rows: rows.len(),
        });
        if self.failing_appends.contains(tab) {
            return Err(anyhow!("append to {tab} rejected"));
        }
        let grid = self.tab_mut(tab)?;
        while grid.last().is_some_and(|r| r.iter().all(String::is_empty)) {
            grid.pop();
        }
        grid.extend(rows.iter().cloned());
        Ok(())
    }
}

/// `A1` → (column 0, row 0).
fn parse_cell(cell: &str) -> Option<(usize, usize)> {
    let split = cell.find(|c: char| c.is_ascii_digit())?;
    let (letters, digits) = cell.split_at(split);
    let col = column_index(letters)?;
    let row = digits.parse::<usize>().ok()?.checked_sub(1)?;
    Some((col, row))
}

/// `C:D` → (2, 3).
fn parse_column_span(range: &str) -> Option<(usize, usize)> {
    let (from, to) = range.split_once(':')?;
    let start = column_index(from)?;
    let end = column_index(to)?;
    (start <= end).then_some((start, end))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(cells: &[&str]) -> Vec<String> {
        cells.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn read_range_slices_columns_and_trims_blanks() {
        let sheets = MemorySheets::new().with_tab(
            "t",
            vec![
                strings(&["a", "b", "c", "d"]),
                strings(&["1", "2", "", ""]),
                strings(&["", "", "", ""]),
            ],
        );
        let rows = sheets.read_range("t", "B:C").unwrap().unwrap();
        assert_eq!(rows, vec![strings(&["b", "c"]), strings(&["2"])]);
        assert!(sheets.read_range("missing", "A:A").unwrap().is_none());
    }

    #[test]
    fn create_then_write_then_append() {
        let mut sheets = MemorySheets::new();
        sheets.create_tab("t").unwrap();
        assert!(sheets.create_tab("t").is_err());
        sheets.write_range("t", "A1", &[strings(&["h1", "h2"])]).unwrap();
        sheets.append_rows("t", "A:B", &[strings(&["x", "y"])]).unwrap();
        assert_eq!(sheets.rows("t").unwrap().len(), 2);
        assert_eq!(sheets.data_rows("t"), 1);
    }
}
