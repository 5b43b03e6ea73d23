//! Small formatting helpers shared by outputs and notifications.

use chrono::{DateTime, Duration, Utc};

/// Width of the four-digit display on the scale.
pub const DISPLAY_WIDTH: usize = 4;

/// Right-justify `beers` for the scale display; wider values pass unpadded.
#[inline]
pub fn format_push_response(beers: i32) -> String {
    format!("{beers:>DISPLAY_WIDTH$}")
}

/// `YYYY-MM-DD HH:MM:SS` in UTC, or empty for the "long ago" epoch sentinel.
pub fn format_date(at: DateTime<Utc>) -> String {
    if at.timestamp() <= 0 {
        return String::new();
    }
    at.format("%Y-%m-%d %H:%M:%S").to_string()
}

/// Two most significant units of an elapsed time, e.g. `"2h 5m"` or `"40s"`.
pub fn format_elapsed(elapsed: Duration) -> String {
    let secs = elapsed.num_seconds().max(0);
    let units = [
        ("d", secs / 86_400),
        ("h", (secs / 3600) % 24),
        ("m", (secs / 60) % 60),
        ("s", secs % 60),
    ];
    let parts: Vec<String> = units
        .iter()
        .skip_while(|(_, v)| *v == 0)
        .take(2)
        .filter(|(_, v)| *v > 0)
        .map(|(u, v)| format!("{v}{u}"))
        .collect();
    if parts.is_empty() {
        "0s".to_string()
    } else {
        parts.join(" ")
    }
}
