use chrono::{DateTime, Datelike, FixedOffset};

/// Season named by the year it ends in: July onwards belongs to next year's season.
pub fn season_end_year(when: &DateTime<FixedOffset>) -> i32 {
    if when.month() >= 7 {
        when.year() + 1
    } else {
        when.year()
    }
}

/// Hard window for one season: July of `end_year - 1` through June of `end_year`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeasonWindow {
    pub end_year: i32,
}

impl SeasonWindow {
    pub fn new(end_year: i32) -> Self {
        Self { end_year }
    }

    pub fn contains(&self, when: &DateTime<FixedOffset>) -> bool {
        if when.year() == self.end_year - 1 && when.month() >= 7 {
            return true;
        }
        when.year() == self.end_year && when.month() <= 6
    }
}

pub fn player_tab_name(end_year: i32) -> String {
    format!("players-{end_year}")
}
