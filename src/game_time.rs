use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, TimeDelta, TimeZone, Utc};

/// Offset assumed for game timestamps that carry no zone. Fixed, no DST.
const EASTERN_OFFSET_SECS: i32 = -5 * 3600;

enum Layout {
    /// Wall-clock time, gets the eastern offset.
    Naive(&'static str),
    /// Explicit `%z` offset.
    Zoned(&'static str),
    /// Date only, midnight eastern.
    Date(&'static str),
}

// Order matters only for strings several layouts accept; first match wins.
const LAYOUTS: &[Layout] = &[
    Layout::Naive("%Y-%m-%dT%H:%M:%S"),
    Layout::Naive("%Y-%m-%d %H:%M:%S"),
    // The feed's trailing `Z` is decoration on an eastern wall-clock time.
    Layout::Naive("%Y-%m-%dT%H:%M:%SZ"),
    Layout::Zoned("%Y-%m-%d %H:%M:%S%z"),
    Layout::Zoned("%Y-%m-%dT%H:%M:%S%z"),
    Layout::Naive("%Y-%m-%dT%H:%M"),
    Layout::Naive("%Y-%m-%d %H:%M"),
    Layout::Naive("%m/%d/%Y %I:%M %p"),
    Layout::Date("%Y-%m-%d"),
];

pub fn eastern() -> FixedOffset {
    FixedOffset::east_opt(EASTERN_OFFSET_SECS).expect("UTC-5 is a valid offset")
}

/// Parse a `gameDateTimeEst` cell. Returns `None` for empty or unrecognised input.
pub fn parse_game_datetime(raw: &str) -> Option<DateTime<FixedOffset>> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }
    LAYOUTS.iter().find_map(|layout| parse_with(s, layout))
}

fn parse_with(s: &str, layout: &Layout) -> Option<DateTime<FixedOffset>> {
    match layout {
        Layout::Naive(fmt) => {
            let naive = NaiveDateTime::parse_from_str(s, fmt).ok()?;
            eastern().from_local_datetime(&naive).single()
        }
        Layout::Zoned(fmt) => DateTime::parse_from_str(s, fmt).ok(),
        Layout::Date(fmt) => {
            let date = NaiveDate::parse_from_str(s, fmt).ok()?;
            eastern()
                .from_local_datetime(&date.and_hms_opt(0, 0, 0)?)
                .single()
        }
    }
}

/// Start of the lookback window: `now` on the eastern clock minus `lookback`.
pub fn compute_cutoff(now: DateTime<Utc>, lookback: TimeDelta) -> DateTime<FixedOffset> {
    now.with_timezone(&eastern()) - lookback
}
