use std::collections::BTreeSet;

use chrono::{DateTime, FixedOffset};

use crate::dedup::KeyColumns;
use crate::season::{SeasonWindow, player_tab_name, season_end_year};
use crate::stat_rows::{PlayerStatRow, StatRecord, TeamStatRow};

pub const DEFAULT_TEAM_SEASON_END_YEAR: i32 = 2026;
pub const DEFAULT_PLAYER_SEASONS: std::ops::RangeInclusive<i32> = 2022..=2026;

/// What varies between the two importers: record schema, where the key lives
/// in the destination, the season rule and the tab a row lands in.
pub trait StatPipeline {
    type Record: StatRecord;

    fn name(&self) -> &'static str;

    /// Destination columns holding the key parts, in key order.
    fn key_columns(&self) -> KeyColumns;

    /// Applied while filtering, after the cutoff check.
    fn in_season(&self, when: &DateTime<FixedOffset>) -> bool;

    /// Destination tab, or `None` to drop the row.
    fn route(&self, when: &DateTime<FixedOffset>) -> Option<String>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineKind {
    Team,
    Player,
}

impl PipelineKind {
    pub fn source_file(self) -> &'static str {
        match self {
            PipelineKind::Team => "TeamStatistics.csv",
            PipelineKind::Player => "PlayerStatistics.csv",
        }
    }
}

/// Team lines for the current season only, all into one tab named after the
/// season's end year.
#[derive(Debug, Clone)]
pub struct TeamPipeline {
    window: SeasonWindow,
    tab: String,
}

impl TeamPipeline {
    pub fn new(season_end_year: i32) -> Self {
        Self {
            window: SeasonWindow::new(season_end_year),
            tab: season_end_year.to_string(),
        }
    }

    pub fn tab(&self) -> &str {
        &self.tab
    }
}

impl Default for TeamPipeline {
    fn default() -> Self {
        Self::new(DEFAULT_TEAM_SEASON_END_YEAR)
    }
}

impl StatPipeline for TeamPipeline {
    type Record = TeamStatRow;

    fn name(&self) -> &'static str {
        "team"
    }

    // Column A holds gameId, column E teamId; keys read as teamId|gameId.
    fn key_columns(&self) -> KeyColumns {
        KeyColumns::new("E", "A")
    }

    fn in_season(&self, when: &DateTime<FixedOffset>) -> bool {
        self.window.contains(when)
    }

    fn route(&self, _when: &DateTime<FixedOffset>) -> Option<String> {
        Some(self.tab.clone())
    }
}

/// Player box scores bucketed into one `players-<year>` tab per season.
#[derive(Debug, Clone)]
pub struct PlayerPipeline {
    seasons: BTreeSet<i32>,
}

impl PlayerPipeline {
    pub fn new(seasons: impl IntoIterator<Item = i32>) -> Self {
        Self {
            seasons: seasons.into_iter().collect(),
        }
    }
}

impl Default for PlayerPipeline {
    fn default() -> Self {
        Self::new(DEFAULT_PLAYER_SEASONS)
    }
}

impl StatPipeline for PlayerPipeline {
    type Record = PlayerStatRow;

    fn name(&self) -> &'static str {
        "player"
    }

    fn key_columns(&self) -> KeyColumns {
        KeyColumns::new("C", "D")
    }

    fn in_season(&self, _when: &DateTime<FixedOffset>) -> bool {
        true
    }

    fn route(&self, when: &DateTime<FixedOffset>) -> Option<String> {
        let end_year = season_end_year(when);
        self.seasons
            .contains(&end_year)
            .then(|| player_tab_name(end_year))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game_time::parse_game_datetime;

    fn at(raw: &str) -> DateTime<FixedOffset> {
        parse_game_datetime(raw).expect("valid date")
    }

    #[test]
    fn player_rows_route_by_season_end_year() {
        let pipeline = PlayerPipeline::default();
        assert_eq!(pipeline.route(&at("2024-11-15")).as_deref(), Some("players-2025"));
        assert_eq!(pipeline.route(&at("2024-03-10")).as_deref(), Some("players-2024"));
        assert_eq!(pipeline.route(&at("2026-08-01")), None);
        assert_eq!(pipeline.route(&at("2021-01-01")), None);
    }

    #[test]
    fn team_rows_share_one_tab_within_the_window() {
        let pipeline = TeamPipeline::default();
        assert_eq!(pipeline.tab(), "2026");
        assert!(pipeline.in_season(&at("2025-08-01")));
        assert!(!pipeline.in_season(&at("2025-06-01")));
        assert!(!pipeline.in_season(&at("2026-07-01")));
        assert_eq!(pipeline.route(&at("2025-08-01")).as_deref(), Some("2026"));
    }
}
