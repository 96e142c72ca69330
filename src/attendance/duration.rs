use chrono::{Duration, NaiveTime, Timelike};

/// Returned instead of an error when either time cannot be parsed.
pub const UNPARSEABLE: &str = "unparseable";

const TIME_FORMAT: &str = "%H:%M";

/// Elapsed time between two `HH:MM` wall-clock times, rendered as `"{H}h {M}m"`.
///
/// An end earlier than the start is taken to be on the next day, so a session
/// is assumed to last less than 24 hours.
pub fn calculate_duration(start: &str, end: &str) -> String {
    match (parse_time(start), parse_time(end)) {
        (Some(start), Some(end)) => format_duration(duration_between(start, end)),
        _ => UNPARSEABLE.to_string(),
    }
}

/// Minute-resolution difference with the same overnight rule as [`calculate_duration`].
pub fn duration_between(start: NaiveTime, end: NaiveTime) -> Duration {
    let start = minutes_of_day(start);
    let mut end = minutes_of_day(end);
    if end < start {
        end += 24 * 60;
    }
    Duration::minutes(end - start)
}

pub fn format_duration(duration: Duration) -> String {
    let total = duration.num_minutes();
    format!("{}h {}m", total / 60, total % 60)
}

/// Truncates to `HH:MM`, the resolution attendance is recorded at.
pub fn format_clock(time: NaiveTime) -> String {
    time.format(TIME_FORMAT).to_string()
}

fn parse_time(raw: &str) -> Option<NaiveTime> {
    NaiveTime::parse_from_str(raw.trim(), TIME_FORMAT).ok()
}

fn minutes_of_day(time: NaiveTime) -> i64 {
    i64::from(time.hour()) * 60 + i64::from(time.minute())
}
