use std::time::Duration;

/// Format a playback position for the elapsed/duration labels.
///
/// Seconds are rounded to the nearest whole second. Positions under an hour
/// render as `mm:ss`, longer ones as `h:mm:ss`.
pub fn format_time(position: Duration) -> String {
    let total_seconds = (position.as_millis() + 500) / 1000;
    let seconds = total_seconds % 60;
    let minutes = total_seconds / 60 % 60;
    let hours = total_seconds / 3600;

    if hours > 0 {
        format!("{}:{:02}:{:02}", hours, minutes, seconds)
    } else {
        format!("{:02}:{:02}", minutes, seconds)
    }
}

/// Absolute position for a fraction of `duration`, rounded to the millisecond
pub fn position_at(duration: Duration, fraction: f64) -> Duration {
    let millis = (duration.as_millis() as f64 * fraction).round();
    Duration::from_millis(millis.max(0.0) as u64)
}

/// Integer progress percentage in [0, 100], or `None` while the duration is unknown
pub fn progress_percent(position: Duration, duration: Duration) -> Option<u8> {
    let total = duration.as_millis();
    if total == 0 {
        return None;
    }
    let percent = 100 * position.as_millis() / total;
    Some(percent.min(100) as u8)
}
