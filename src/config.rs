use std::env;
use std::path::PathBuf;

use chrono::TimeDelta;

use crate::pipelines::PipelineKind;

pub const DEFAULT_LOOKBACK_HOURS: i64 = 24;
pub const DEFAULT_DATASET: &str = "eoinamoore/historical-nba-data-and-player-box-scores";
pub const DEFAULT_CREDENTIALS_PATH: &str = "/tmp/gcp-sa.json";
const DEFAULT_TEAM_SPREADSHEET_ID: &str = "1m3egsHWbasuBQdHUpZcDlyObcomcCkfdCMOGA8Kk44w";
const DEFAULT_PLAYER_SPREADSHEET_ID: &str = "1OlS4ZVRK_bwFkShtZ5HMC6L7bGs6rlYDSNRwIirEhJo";
const CACHE_DIR: &str = "nba_sheet_sync";

/// Settings for one importer run. Built once, never mutated by the run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportConfig {
    pub kind: PipelineKind,
    pub spreadsheet_id: String,
    pub lookback: TimeDelta,
    pub credentials_path: PathBuf,
    pub dataset: String,
    pub file_name: String,
    pub download_dir: PathBuf,
}

impl ImportConfig {
    /// Defaults for `kind`, no environment involved.
    pub fn defaults(kind: PipelineKind) -> Self {
        let spreadsheet_id = match kind {
            PipelineKind::Team => DEFAULT_TEAM_SPREADSHEET_ID,
            PipelineKind::Player => DEFAULT_PLAYER_SPREADSHEET_ID,
        };
        Self {
            kind,
            spreadsheet_id: spreadsheet_id.to_string(),
            lookback: TimeDelta::hours(DEFAULT_LOOKBACK_HOURS),
            credentials_path: PathBuf::from(DEFAULT_CREDENTIALS_PATH),
            dataset: DEFAULT_DATASET.to_string(),
            file_name: kind.source_file().to_string(),
            download_dir: app_cache_dir().unwrap_or_else(|| env::temp_dir().join(CACHE_DIR)),
        }
    }

    pub fn from_env(kind: PipelineKind) -> Self {
        Self::from_lookup(kind, |key| env::var(key).ok())
    }

    /// Overlay values from `lookup` (an environment) on the defaults. Blank
    /// values are ignored; an invalid lookback keeps the default.
    pub fn from_lookup(kind: PipelineKind, lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let mut cfg = Self::defaults(kind);

        let sheet_var = match kind {
            PipelineKind::Team => "DEST_TEAM_SPREADSHEET_ID",
            PipelineKind::Player => "DEST_SPREADSHEET_ID",
        };
        if let Some(id) = get(sheet_var) {
            cfg.spreadsheet_id = id.trim().to_string();
        }
        if let Some(hours) = get("LOOKBACK_HOURS").and_then(|v| parse_lookback_hours(&v)) {
            cfg.lookback = hours;
        }
        if let Some(path) = get("GOOGLE_SA_KEY_PATH") {
            cfg.credentials_path = PathBuf::from(path);
        }
        if let Some(dataset) = get("KAGGLE_DATASET") {
            cfg.dataset = dataset.trim().to_string();
        }
        if let Some(dir) = get("IMPORT_DOWNLOAD_DIR") {
            cfg.download_dir = PathBuf::from(dir);
        }
        cfg
    }

    pub fn lookback_hours(&self) -> i64 {
        self.lookback.num_hours()
    }
}

/// Positive whole hours.
pub fn parse_lookback_hours(raw: &str) -> Option<TimeDelta> {
    raw.trim()
        .parse::<i64>()
        .ok()
        .filter(|h| *h > 0)
        .and_then(TimeDelta::try_hours)
}

pub fn app_cache_dir() -> Option<PathBuf> {
    if let Ok(base) = env::var("XDG_CACHE_HOME") {
        if !base.trim().is_empty() {
            return Some(PathBuf::from(base).join(CACHE_DIR));
        }
    }
    let home = env::var("HOME").ok()?;
    if home.trim().is_empty() {
        return None;
    }
    Some(PathBuf::from(home).join(".cache").join(CACHE_DIR))
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_follow_pipeline_kind() {
        let team = ImportConfig::defaults(PipelineKind::Team);
        let player = ImportConfig::defaults(PipelineKind::Player);
        assert_eq!(team.file_name, "TeamStatistics.csv");
        assert_eq!(player.file_name, "PlayerStatistics.csv");
        assert_ne!(team.spreadsheet_id, player.spreadsheet_id);
        assert_eq!(team.lookback_hours(), 24);
    }

    #[test]
    fn environment_overrides_defaults() {
        let cfg = ImportConfig::from_lookup(
            PipelineKind::Player,
            lookup_from(&[
                ("DEST_SPREADSHEET_ID", "sheet-xyz"),
                ("DEST_TEAM_SPREADSHEET_ID", "ignored"),
                ("LOOKBACK_HOURS", "72"),
                ("GOOGLE_SA_KEY_PATH", "/secrets/sa.json"),
            ]),
        );
        assert_eq!(cfg.spreadsheet_id, "sheet-xyz");
        assert_eq!(cfg.lookback_hours(), 72);
        assert_eq!(cfg.credentials_path, PathBuf::from("/secrets/sa.json"));
    }

    #[test]
    fn bad_lookback_keeps_default() {
        for raw in ["", "abc", "0", "-3"] {
            let cfg = ImportConfig::from_lookup(
                PipelineKind::Team,
                lookup_from(&[("LOOKBACK_HOURS", raw)]),
            );
            assert_eq!(cfg.lookback_hours(), 24, "{raw:?}");
        }
    }
}
