//! Destination spreadsheet seam. One store is bound to one spreadsheet.

use std::collections::BTreeSet;

use anyhow::Result;

pub trait SheetStore {
    /// Titles of every tab in the spreadsheet.
    fn list_tabs(&self) -> Result<BTreeSet<String>>;

    fn create_tab(&mut self, tab: &str) -> Result<()>;

    /// Overwrite cells starting at `range` (e.g. `A1`).
    fn write_range(&mut self, tab: &str, range: &str, values: &[Vec<String>]) -> Result<()>;

    /// Rows of `range` (e.g. `C:D`), header included. `Ok(None)` when the tab
    /// does not exist. Trailing empty cells of a row may be omitted.
    fn read_range(&self, tab: &str, range: &str) -> Result<Option<Vec<Vec<String>>>>;

    /// Append rows after the last data row covered by `range`.
    fn append_rows(&mut self, tab: &str, range: &str, rows: &[Vec<String>]) -> Result<()>;
}

/// Zero-based column index → A1 column letters (`0 → A`, `26 → AA`).
pub fn column_letters(index: usize) -> String {
    let mut n = index + 1;
    let mut out = Vec::new();
    while n > 0 {
        let rem = (n - 1) % 26;
        out.push(b'A' + rem as u8);
        n = (n - 1) / 26;
    }
    out.reverse();
    String::from_utf8(out).unwrap_or_default()
}

/// A1 column letters → zero-based index. `None` for anything but `A..=ZZZ` style input.
pub fn column_index(letters: &str) -> Option<usize> {
    if letters.is_empty() || !letters.bytes().all(|b| b.is_ascii_uppercase()) {
        return None;
    }
    let n = letters
        .bytes()
        .fold(0usize, |acc, b| acc * 26 + usize::from(b - b'A') + 1);
    Some(n - 1)
}

/// Full-width range for a header of `width` columns, e.g. `A:AV` for 48.
pub fn full_width_range(width: usize) -> String {
    format!("A:{}", column_letters(width.saturating_sub(1)))
}

/// `'tab name'!range`, quotes doubled inside the title.
pub fn a1_notation(tab: &str, range: &str) -> String {
    format!("'{}'!{}", tab.replace('\'', "''"), range)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn letters_round_trip_the_edges() {
        assert_eq!(column_letters(0), "A");
        assert_eq!(column_letters(25), "Z");
        assert_eq!(column_letters(26), "AA");
        assert_eq!(column_letters(47), "AV");
        assert_eq!(column_index("AV"), Some(47));
        assert_eq!(column_index("e"), None);
        assert_eq!(column_index(""), None);
    }

    #[test]
    fn ranges_match_header_widths() {
        assert_eq!(full_width_range(48), "A:AV");
        assert_eq!(full_width_range(35), "A:AI");
        assert_eq!(a1_notation("players-2025", "C:D"), "'players-2025'!C:D");
        assert_eq!(a1_notation("bob's", "A1"), "'bob''s'!A1");
    }
}
