use std::fs::File;
use std::path::PathBuf;

use chrono::{DateTime, FixedOffset, TimeZone};

use nba_sheet_sync::game_time::eastern;
use nba_sheet_sync::importer::run_import;
use nba_sheet_sync::memory_sheets::{MemorySheets, SheetCall};
use nba_sheet_sync::pipelines::{PlayerPipeline, TeamPipeline};
use nba_sheet_sync::sheets::SheetStore;
use nba_sheet_sync::stat_rows::{PlayerStatRow, StatRecord, TeamStatRow};

fn open_fixture(name: &str) -> File {
    let mut path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    path.push("tests");
    path.push("fixtures");
    path.push(name);
    File::open(path).expect("fixture file should be readable")
}

fn eastern_midnight(y: i32, m: u32, d: u32) -> DateTime<FixedOffset> {
    eastern()
        .with_ymd_and_hms(y, m, d, 0, 0, 0)
        .single()
        .expect("valid date")
}

fn header_row<R: StatRecord>() -> Vec<String> {
    R::HEADERS.iter().map(|h| h.to_string()).collect()
}

fn sheet_row(width: usize, cells: &[(usize, &str)]) -> Vec<String> {
    let mut row = vec![String::new(); width];
    for (idx, value) in cells {
        row[*idx] = value.to_string();
    }
    row
}

#[test]
fn team_import_creates_tab_and_appends_new_rows() {
    let mut store = MemorySheets::new();
    let summary = run_import(
        &mut store,
        &TeamPipeline::default(),
        open_fixture("team_stats.csv"),
        eastern_midnight(2025, 5, 1),
    )
    .expect("import should succeed");

    assert_eq!(summary.pipeline, "team");
    assert_eq!(summary.tabs.len(), 1);
    let tab = &summary.tabs[0];
    assert_eq!(tab.tab, "2026");
    assert!(tab.created);
    assert_eq!(tab.existing_keys, 0);
    assert_eq!(tab.candidates, 4);
    assert_eq!(tab.duplicates, 1);
    assert_eq!(tab.appended, 3);
    assert_eq!(summary.total_appended, 3);

    let rows = store.rows("2026").expect("tab exists");
    assert_eq!(rows[0], header_row::<TeamStatRow>());
    assert_eq!(rows.len(), 4);
    assert_eq!(rows[1].len(), 48);
    assert_eq!(rows[1][0], "22500201");
    assert_eq!(rows[1][4], "1610612738");
    assert_eq!(rows[2][4], "1610612752");
    assert_eq!(rows[3][0], "22500001");

    let appends = store
        .calls()
        .into_iter()
        .filter(|c| matches!(c, SheetCall::AppendRows { .. }))
        .collect::<Vec<_>>();
    assert_eq!(
        appends,
        vec![SheetCall::AppendRows {
            tab: "2026".to_string(),
            range: "A:AV".to_string(),
            rows: 3,
        }]
    );
}

#[test]
fn team_import_skips_keys_already_in_the_sheet() {
    let mut store = MemorySheets::new().with_tab(
        "2026",
        vec![
            header_row::<TeamStatRow>(),
            sheet_row(48, &[(0, "22500201"), (4, "1610612738")]),
        ],
    );
    let summary = run_import(
        &mut store,
        &TeamPipeline::default(),
        open_fixture("team_stats.csv"),
        eastern_midnight(2025, 5, 1),
    )
    .expect("import should succeed");

    let tab = &summary.tabs[0];
    assert!(!tab.created);
    assert_eq!(tab.existing_keys, 1);
    assert_eq!(tab.duplicates, 2);
    assert_eq!(tab.appended, 2);
    assert_eq!(store.data_rows("2026"), 3);
    assert!(
        store
            .calls()
            .contains(&SheetCall::ReadRange {
                tab: "2026".to_string(),
                range: "A:E".to_string(),
            })
    );
}

#[test]
fn player_import_routes_rows_into_season_tabs() {
    let mut store = MemorySheets::new();
    let summary = run_import(
        &mut store,
        &PlayerPipeline::default(),
        open_fixture("player_stats.csv"),
        eastern_midnight(2024, 1, 1),
    )
    .expect("import should succeed");

    assert_eq!(summary.unrouted, 1);
    let tabs = summary
        .tabs
        .iter()
        .map(|t| (t.tab.as_str(), t.candidates, t.appended))
        .collect::<Vec<_>>();
    assert_eq!(tabs, vec![("players-2025", 3, 2), ("players-2024", 1, 1)]);
    assert_eq!(summary.total_appended, 3);

    let tabs = store.list_tabs().expect("list tabs");
    assert!(tabs.contains("players-2025"));
    assert!(tabs.contains("players-2024"));
    assert!(!tabs.contains("players-2027"));

    let rows = store.rows("players-2024").expect("tab exists");
    assert_eq!(rows[0], header_row::<PlayerStatRow>());
    assert_eq!(rows[1][..5], ["Nikola", "Jokic", "203999", "22300800", "2024-03-10T15:00:00"]);
    assert_eq!(rows[1].len(), 35);
}

#[test]
fn player_import_reads_person_and_game_columns() {
    let mut store = MemorySheets::new().with_tab(
        "players-2025",
        vec![
            header_row::<PlayerStatRow>(),
            sheet_row(35, &[(0, "Stephen"), (2, "201939"), (3, "22400300")]),
        ],
    );
    let summary = run_import(
        &mut store,
        &PlayerPipeline::default(),
        open_fixture("player_stats.csv"),
        eastern_midnight(2024, 1, 1),
    )
    .expect("import should succeed");

    let tab = summary
        .tabs
        .iter()
        .find(|t| t.tab == "players-2025")
        .expect("players-2025 summary");
    assert_eq!(tab.existing_keys, 1);
    assert_eq!(tab.appended, 1);
    let rows = store.rows("players-2025").expect("tab exists");
    assert_eq!(rows.len(), 3);
    assert_eq!(rows[2][2], "1629029");
}

#[test]
fn second_run_appends_nothing_and_keeps_header() {
    let mut store = MemorySheets::new();
    let cutoff = eastern_midnight(2024, 1, 1);
    let first = run_import(
        &mut store,
        &PlayerPipeline::default(),
        open_fixture("player_stats.csv"),
        cutoff,
    )
    .expect("first run");
    assert_eq!(first.total_appended, 3);
    let before = store.rows("players-2025").expect("tab").to_vec();
    store.clear_calls();

    let second = run_import(
        &mut store,
        &PlayerPipeline::default(),
        open_fixture("player_stats.csv"),
        cutoff,
    )
    .expect("second run");
    assert_eq!(second.total_appended, 0);
    assert!(second.tabs.iter().all(|t| !t.created));
    assert_eq!(store.rows("players-2025").expect("tab"), before.as_slice());

    let writes = store
        .calls()
        .into_iter()
        .filter(|c| {
            matches!(
                c,
                SheetCall::CreateTab(_) | SheetCall::WriteRange { .. } | SheetCall::AppendRows { .. }
            )
        })
        .count();
    assert_eq!(writes, 0);
}

#[test]
fn nothing_retained_means_no_sheet_calls() {
    let mut store = MemorySheets::new();
    let summary = run_import(
        &mut store,
        &TeamPipeline::default(),
        open_fixture("team_stats.csv"),
        eastern_midnight(2030, 1, 1),
    )
    .expect("import should succeed");
    assert_eq!(summary.filter.retained, 0);
    assert!(summary.tabs.is_empty());
    assert!(store.calls().is_empty());
}

#[test]
fn failed_tab_leaves_earlier_tabs_written() {
    let mut store = MemorySheets::new();
    store.fail_appends_to("players-2024");
    let err = run_import(
        &mut store,
        &PlayerPipeline::default(),
        open_fixture("player_stats.csv"),
        eastern_midnight(2024, 1, 1),
    )
    .expect_err("append failure is fatal");
    assert!(format!("{err:#}").contains("players-2024"));
    assert_eq!(store.data_rows("players-2025"), 2);
    assert_eq!(store.data_rows("players-2024"), 0);
}

#[test]
fn schema_error_touches_no_sheet() {
    let mut store = MemorySheets::new();
    let result = run_import(
        &mut store,
        &PlayerPipeline::default(),
        open_fixture("player_missing_column.csv"),
        eastern_midnight(2000, 1, 1),
    );
    assert!(result.is_err());
    assert!(store.calls().is_empty());
}
