use serde::Deserialize;

pub const GAME_DATE_COLUMN: &str = "gameDateTimeEst";

/// One CSV record with a typed field per expected column.
pub trait StatRecord: for<'de> Deserialize<'de> {
    /// Expected source columns, also the destination header row.
    const HEADERS: &'static [&'static str];

    fn game_date_time(&self) -> &str;

    /// Dedup key parts, in key order.
    fn key_parts(&self) -> (&str, &str);

    /// Cell values in `HEADERS` order.
    fn values(&self) -> Vec<String>;

    fn composite_key(&self) -> Option<String> {
        let (first, second) = self.key_parts();
        composite_key(first, second)
    }
}

/// `"<first>|<second>"`, or `None` if either part is blank.
pub fn composite_key(first: &str, second: &str) -> Option<String> {
    let first = first.trim();
    let second = second.trim();
    if first.is_empty() || second.is_empty() {
        return None;
    }
    Some(format!("{first}|{second}"))
}

// Declares the record struct and its header list from the same column list so
// the output column order always matches the header row.
macro_rules! stat_record {
    (
        $(#[$meta:meta])*
        $name:ident {
            $($field:ident => $column:literal),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
        pub struct $name {
            $(
                #[serde(rename = $column, default)]
                pub $field: String,
            )+
        }

        impl $name {
            pub const COLUMNS: &'static [&'static str] = &[$($column),+];

            fn column_values(&self) -> Vec<String> {
                vec![$(self.$field.clone()),+]
            }
        }
    };
}

stat_record! {
    /// A team's line for one game (`TeamStatistics.csv`).
    TeamStatRow {
        game_id => "gameId",
        game_date_time_est => "gameDateTimeEst",
        team_city => "teamCity",
        team_name => "teamName",
        team_id => "teamId",
        opponent_team_city => "opponentTeamCity",
        opponent_team_name => "opponentTeamName",
        opponent_team_id => "opponentTeamId",
        home => "home",
        win => "win",
        team_score => "teamScore",
        opponent_score => "opponentScore",
        assists => "assists",
        blocks => "blocks",
        steals => "steals",
        field_goals_attempted => "fieldGoalsAttempted",
        field_goals_made => "fieldGoalsMade",
        field_goals_percentage => "fieldGoalsPercentage",
        three_pointers_attempted => "threePointersAttempted",
        three_pointers_made => "threePointersMade",
        three_pointers_percentage => "threePointersPercentage",
        free_throws_attempted => "freeThrowsAttempted",
        free_throws_made => "freeThrowsMade",
        free_throws_percentage => "freeThrowsPercentage",
        rebounds_defensive => "reboundsDefensive",
        rebounds_offensive => "reboundsOffensive",
        rebounds_total => "reboundsTotal",
        fouls_personal => "foulsPersonal",
        turnovers => "turnovers",
        plus_minus_points => "plusMinusPoints",
        num_minutes => "numMinutes",
        q1_points => "q1Points",
        q2_points => "q2Points",
        q3_points => "q3Points",
        q4_points => "q4Points",
        bench_points => "benchPoints",
        biggest_lead => "biggestLead",
        biggest_scoring_run => "biggestScoringRun",
        lead_changes => "leadChanges",
        points_fast_break => "pointsFastBreak",
        points_from_turnovers => "pointsFromTurnovers",
        points_in_the_paint => "pointsInThePaint",
        points_second_chance => "pointsSecondChance",
        times_tied => "timesTied",
        timeouts_remaining => "timeoutsRemaining",
        season_wins => "seasonWins",
        season_losses => "seasonLosses",
        coach_id => "coachId",
    }
}

stat_record! {
    /// A player's box score for one game (`PlayerStatistics.csv`).
    PlayerStatRow {
        first_name => "firstName",
        last_name => "lastName",
        person_id => "personId",
        game_id => "gameId",
        game_date_time_est => "gameDateTimeEst",
        player_team_city => "playerteamCity",
        player_team_name => "playerteamName",
        opponent_team_city => "opponentteamCity",
        opponent_team_name => "opponentteamName",
        game_type => "gameType",
        game_label => "gameLabel",
        game_sub_label => "gameSubLabel",
        series_game_number => "seriesGameNumber",
        win => "win",
        home => "home",
        num_minutes => "numMinutes",
        points => "points",
        assists => "assists",
        blocks => "blocks",
        steals => "steals",
        field_goals_attempted => "fieldGoalsAttempted",
        field_goals_made => "fieldGoalsMade",
        field_goals_percentage => "fieldGoalsPercentage",
        three_pointers_attempted => "threePointersAttempted",
        three_pointers_made => "threePointersMade",
        three_pointers_percentage => "threePointersPercentage",
        free_throws_attempted => "freeThrowsAttempted",
        free_throws_made => "freeThrowsMade",
        free_throws_percentage => "freeThrowsPercentage",
        rebounds_defensive => "reboundsDefensive",
        rebounds_offensive => "reboundsOffensive",
        rebounds_total => "reboundsTotal",
        fouls_personal => "foulsPersonal",
        turnovers => "turnovers",
        plus_minus_points => "plusMinusPoints",
    }
}

impl StatRecord for TeamStatRow {
    const HEADERS: &'static [&'static str] = Self::COLUMNS;

    fn game_date_time(&self) -> &str {
        &self.game_date_time_est
    }

    fn key_parts(&self) -> (&str, &str) {
        (&self.team_id, &self.game_id)
    }

    fn values(&self) -> Vec<String> {
        self.column_values()
    }
}

impl StatRecord for PlayerStatRow {
    const HEADERS: &'static [&'static str] = Self::COLUMNS;

    fn game_date_time(&self) -> &str {
        &self.game_date_time_est
    }

    fn key_parts(&self) -> (&str, &str) {
        (&self.person_id, &self.game_id)
    }

    fn values(&self) -> Vec<String> {
        self.column_values()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_lists_have_expected_shape() {
        assert_eq!(TeamStatRow::HEADERS.len(), 48);
        assert_eq!(PlayerStatRow::HEADERS.len(), 35);
        assert_eq!(TeamStatRow::HEADERS[0], "gameId");
        assert_eq!(TeamStatRow::HEADERS[4], "teamId");
        assert_eq!(PlayerStatRow::HEADERS[2], "personId");
        assert_eq!(PlayerStatRow::HEADERS[3], "gameId");
        assert!(TeamStatRow::HEADERS.contains(&GAME_DATE_COLUMN));
        assert!(PlayerStatRow::HEADERS.contains(&GAME_DATE_COLUMN));
    }

    #[test]
    fn values_follow_header_order() {
        let row = PlayerStatRow {
            first_name: "Jalen".to_string(),
            person_id: "1630169".to_string(),
            game_id: "22500201".to_string(),
            plus_minus_points: "7".to_string(),
            ..Default::default()
        };
        let values = row.values();
        assert_eq!(values.len(), PlayerStatRow::HEADERS.len());
        assert_eq!(values[0], "Jalen");
        assert_eq!(values[2], "1630169");
        assert_eq!(values[34], "7");
        assert_eq!(values[1], "");
    }

    #[test]
    fn composite_key_needs_both_parts() {
        assert_eq!(composite_key(" 100 ", "1"), Some("100|1".to_string()));
        assert_eq!(composite_key("", "1"), None);
        assert_eq!(composite_key("100", "  "), None);

        let team = TeamStatRow {
            team_id: "1610612738".to_string(),
            game_id: "22500001".to_string(),
            ..Default::default()
        };
        assert_eq!(team.composite_key().as_deref(), Some("1610612738|22500001"));
    }
}
