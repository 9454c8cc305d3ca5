use chrono::{DateTime, SecondsFormat, Utc};

/// Maps a stored watermark to the `since` value of the next gist query.
/// No watermark means "everything".
pub fn since_cursor(watermark: Option<DateTime<Utc>>) -> Option<String> {
    watermark.map(|at| at.to_rfc3339_opts(SecondsFormat::Secs, true))
}
