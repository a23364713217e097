//! CF-convention time units, e.g. `"seconds since 1900-01-01 00:00:00"`.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

/// Units string written for timestamps decoded from text columns.
pub const UNIX_SECONDS_UNITS: &str = "seconds since 1970-01-01T00:00:00Z";

/// A decoded `"<unit> since <epoch>"` definition.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CfTime {
    /// Seconds per stored unit.
    pub scale: f64,
    /// Epoch as Unix seconds.
    pub epoch: f64,
}

impl CfTime {
    /// Parse a CF time units string. Returns `None` for non-time units.
    pub fn parse(units: &str) -> Option<Self> {
        let (unit, reference) = units.trim().split_once(" since ")?;
        let scale = match unit.trim().to_ascii_lowercase().as_str() {
            "milliseconds" | "millisecond" | "msec" | "ms" => 1e-3,
            "seconds" | "second" | "secs" | "sec" | "s" => 1.0,
            "minutes" | "minute" | "mins" | "min" => 60.0,
            "hours" | "hour" | "hrs" | "hr" | "h" => 3600.0,
            "days" | "day" | "d" => 86_400.0,
            _ => return None,
        };
        let epoch = parse_timestamp(reference.trim())?.timestamp() as f64;
        Some(CfTime { scale, epoch })
    }

    pub fn to_unix_seconds(&self, value: f64) -> f64 {
        self.epoch + value * self.scale
    }
}

/// Parse the timestamp forms that show up in CF epochs and ERDDAP exports.
pub fn parse_timestamp(text: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.with_timezone(&Utc));
    }
    let text = text
        .trim_end_matches(" UTC")
        .trim_end_matches('Z')
        .trim();
    for fmt in [
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%d %H:%M",
        "%Y-%m-%dT%H:%M",
    ] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(text, fmt) {
            return Some(naive.and_utc());
        }
    }
    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// Format Unix seconds for a date axis tick.
pub fn format_unix_seconds(seconds: f64, fmt: &str) -> String {
    if !seconds.is_finite() {
        return String::new();
    }
    let secs = seconds.floor();
    let nanos = ((seconds - secs) * 1e9) as u32;
    match DateTime::from_timestamp(secs as i64, nanos) {
        Some(dt) => dt.format(fmt).to_string(),
        None => format!("{seconds:.0}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ooi_epoch_is_1900() {
        let cf = CfTime::parse("seconds since 1900-01-01 00:00:00").unwrap();
        assert_eq!(cf.scale, 1.0);
        assert_eq!(cf.epoch, -2_208_988_800.0);
        // 2019-07-10T09:00:00Z
        assert_eq!(cf.to_unix_seconds(3_771_738_000.0), 1_562_749_200.0);
    }

    #[test]
    fn day_units_and_date_only_epoch() {
        let cf = CfTime::parse("days since 1970-01-01").unwrap();
        assert_eq!(cf.to_unix_seconds(1.5), 129_600.0);
    }

    #[test]
    fn rejects_non_time_units() {
        assert_eq!(CfTime::parse("m"), None);
        assert_eq!(CfTime::parse("umol L-1"), None);
        assert_eq!(CfTime::parse("fortnights since 1970-01-01"), None);
    }

    #[test]
    fn parses_erddap_timestamps() {
        let t = parse_timestamp("2019-07-10T09:00:00Z").unwrap();
        assert_eq!(t.timestamp(), 1_562_749_200);
        let t = parse_timestamp("2019-07-10 09:00:00 UTC").unwrap();
        assert_eq!(t.timestamp(), 1_562_749_200);
        assert!(parse_timestamp("not a date").is_none());
    }

    #[test]
    fn formats_ticks() {
        assert_eq!(format_unix_seconds(1_562_749_200.0, "%Y-%m-%d %H:%M"), "2019-07-10 09:00");
        assert_eq!(format_unix_seconds(f64::NAN, "%H:%M"), "");
    }
}
