use chrono::{DateTime, NaiveDateTime, Utc};

pub fn now() -> DateTime<Utc> {
    Utc::now()
}

pub fn from_rfc3339(s: &str) -> anyhow::Result<DateTime<Utc>> {
    Ok(DateTime::parse_from_rfc3339(s)?.with_timezone(&Utc))
}

/// Accepts RFC 3339 or a zone-less local timestamp, which is taken as UTC.
pub fn parse_timestamp(s: &str) -> anyhow::Result<DateTime<Utc>> {
    if let Ok(dt) = from_rfc3339(s) {
        return Ok(dt);
    }
    let naive = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f")?;
    Ok(naive.and_utc())
}

/// Renders a countdown as `m:ss`.
pub fn format_clock(seconds: u32) -> String {
    format!("{}:{:02}", seconds / 60, seconds % 60)
}
