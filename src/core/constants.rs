// Format constants for WatchTracker timing runs

pub const SECONDS_PER_DAY: f64 = 86_400.0;

// File layout: 3 preamble rows, 5 metadata rows, blank, column titles, data
pub const HEADER_FIRST_ROW: usize = 3;
pub const HEADER_ROWS: usize = 5;
pub const DATA_FIRST_ROW: usize = 10;
pub const DATA_COLUMNS: usize = 6;

pub const FILE_TITLE: &str = "Timing run file";
pub const FILE_GENERATOR: &str = "Generated by watchtrack";

// Metadata labels in file order
pub const HEADER_LABELS: [&str; HEADER_ROWS] = [
    "Watch name",
    "Watch comment",
    "Timing run name",
    "Timing run comment",
    "First data point",
];

pub const COLUMN_TITLES: &str =
    "Days,Offset,Comment,UNIX time,Atomic clock error,iOS clock offset";

// Placeholders for merged runs
pub const MERGED_WATCH: &str = "|watch|";
pub const MERGED_WATCH_COMMENT: &str = "|watch comment|";
pub const MERGED_RUN: &str = "|run|";
pub const MERGED_RUN_COMMENT: &str = "|run comment|";
pub const MERGED_FILE: &str = "|file|";

pub const INSERTED_COMMENT: &str = "(inserted)";
pub const INTERPOLATED_COMMENT: &str = "inserted";
pub const DEFAULT_RUN_COMMENT: &str = "watchtrack";

/// Converts a span in days to whole device-clock seconds.
pub fn days_to_seconds(days: f64) -> i64 {
    (days * SECONDS_PER_DAY).round() as i64
}

/// Like [`days_to_seconds`], but `None` when the span does not fit the
/// device clock.
pub fn checked_days_to_seconds(days: f64) -> Option<i64> {
    let seconds = (days * SECONDS_PER_DAY).round();
    // i64::MAX as f64 rounds up to 2^63, so that bound is exclusive
    (seconds >= i64::MIN as f64 && seconds < i64::MAX as f64).then_some(seconds as i64)
}

pub fn seconds_to_days(seconds: i64) -> f64 {
    seconds as f64 / SECONDS_PER_DAY
}
