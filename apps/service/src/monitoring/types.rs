use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

/// Outcome of a single probe against the target host.
///
/// `response_time` is present exactly when `success` is true; the
/// constructors are the only way this crate builds one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Measurement {
    /// When the probe completed, in the configured timezone
    pub timestamp: DateTime<FixedOffset>,

    /// Round-trip latency in milliseconds
    pub response_time: Option<f64>,

    pub success: bool,

    /// Why the probe failed, when known
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Measurement {
    /// Successful probe with the latency reported by the probe itself
    pub fn success(timestamp: DateTime<FixedOffset>, response_time_ms: f64) -> Self {
        Self { timestamp, response_time: Some(response_time_ms), success: true, error: None }
    }

    /// Failed probe, no latency
    pub fn failure(timestamp: DateTime<FixedOffset>, reason: impl Into<String>) -> Self {
        Self { timestamp, response_time: None, success: false, error: Some(reason.into()) }
    }

    /// Whether `success` and `response_time` agree with each other.
    ///
    /// Records read back from disk may have been written by something else.
    pub fn is_consistent(&self) -> bool {
        self.success == self.response_time.is_some()
    }

    /// Short human status used in tick logs
    pub fn status_line(&self) -> String {
        match self.response_time {
            Some(ms) if self.success => format!("OK ({ms}ms)"),
            _ => "FAILED".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ts() -> DateTime<FixedOffset> {
        DateTime::parse_from_rfc3339("2026-10-15T08:30:00+02:00").unwrap()
    }

    #[test]
    fn test_constructors_keep_latency_and_outcome_in_step() {
        let ok = Measurement::success(ts(), 12.5);
        assert!(ok.success);
        assert_eq!(ok.response_time, Some(12.5));
        assert!(ok.is_consistent());

        let failed = Measurement::failure(ts(), "timeout");
        assert!(!failed.success);
        assert_eq!(failed.response_time, None);
        assert!(failed.is_consistent());
    }

    #[test]
    fn test_json_shape_matches_dashboard_contract() {
        let value = serde_json::to_value(Measurement::success(ts(), 20.0)).unwrap();
        assert_eq!(value["timestamp"], "2026-10-15T08:30:00+02:00");
        assert_eq!(value["response_time"], 20.0);
        assert_eq!(value["success"], true);
        assert!(value.get("error").is_none());

        let value = serde_json::to_value(Measurement::failure(ts(), "unreachable")).unwrap();
        assert!(value["response_time"].is_null());
        assert_eq!(value["error"], "unreachable");
    }

    #[test]
    fn test_reads_records_written_without_error_field() {
        let raw = r#"{"timestamp": "2026-10-15T08:30:00.123456+00:00", "response_time": null, "success": false}"#;
        let parsed: Measurement = serde_json::from_str(raw).unwrap();
        assert!(!parsed.success);
        assert_eq!(parsed.error, None);
        assert!(parsed.is_consistent());
    }

    #[test]
    fn test_status_line() {
        assert_eq!(Measurement::success(ts(), 15.25).status_line(), "OK (15.25ms)");
        assert_eq!(Measurement::failure(ts(), "x").status_line(), "FAILED");
    }
}
