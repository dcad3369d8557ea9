//! Derived statistics over one day of measurements.

use serde::{Deserialize, Serialize, Serializer};

use crate::monitoring::types::Measurement;

/// Summary of a sequence of measurements.
///
/// `success_rate` is a ratio in `[0, 1]` and is `0` for an empty input.
/// Latency figures only cover successful probes and are `None` without any.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Stats {
    #[serde(rename = "total_pings")]
    pub total: usize,
    #[serde(rename = "successful_pings")]
    pub succeeded: usize,
    #[serde(rename = "failed_pings")]
    pub failed: usize,
    pub success_rate: f64,
    #[serde(serialize_with = "round_ms")]
    pub avg_response_time: Option<f64>,
    pub min_response_time: Option<f64>,
    pub max_response_time: Option<f64>,
}

fn round_ms<S: Serializer>(value: &Option<f64>, serializer: S) -> Result<S::Ok, S::Error> {
    match value {
        Some(ms) => serializer.serialize_some(&((ms * 100.0).round() / 100.0)),
        None => serializer.serialize_none(),
    }
}

/// Aggregate `measurements`. Pure, no I/O.
pub fn aggregate(measurements: &[Measurement]) -> Stats {
    let total = measurements.len();
    let succeeded = measurements.iter().filter(|m| m.success).count();

    let latencies: Vec<f64> =
        measurements.iter().filter(|m| m.success).filter_map(|m| m.response_time).collect();

    let avg_response_time = (!latencies.is_empty())
        .then(|| latencies.iter().sum::<f64>() / latencies.len() as f64);
    let min_response_time = latencies.iter().copied().reduce(f64::min);
    let max_response_time = latencies.iter().copied().reduce(f64::max);

    Stats {
        total,
        succeeded,
        failed: total - succeeded,
        success_rate: if total == 0 { 0.0 } else { succeeded as f64 / total as f64 },
        avg_response_time,
        min_response_time,
        max_response_time,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::DateTime;

    fn ok(ms: f64) -> Measurement {
        Measurement::success(DateTime::parse_from_rfc3339("2026-10-15T00:00:00+00:00").unwrap(), ms)
    }

    fn failed() -> Measurement {
        Measurement::failure(DateTime::parse_from_rfc3339("2026-10-15T00:01:00+00:00").unwrap(), "timeout")
    }

    #[test]
    fn test_empty_input() {
        let stats = aggregate(&[]);
        assert_eq!(stats.total, 0);
        assert_eq!(stats.succeeded, 0);
        assert_eq!(stats.failed, 0);
        assert_eq!(stats.success_rate, 0.0);
        assert_eq!(stats.avg_response_time, None);
        assert_eq!(stats.min_response_time, None);
    }

    #[test]
    fn test_mixed_outcomes() {
        let stats = aggregate(&[ok(10.0), ok(20.0), failed()]);
        assert_eq!(stats.total, 3);
        assert_eq!(stats.succeeded, 2);
        assert_eq!(stats.failed, 1);
        assert!((stats.success_rate - 2.0 / 3.0).abs() < 1e-9);
        assert_eq!(stats.avg_response_time, Some(15.0));
        assert_eq!(stats.min_response_time, Some(10.0));
        assert_eq!(stats.max_response_time, Some(20.0));
    }

    #[test]
    fn test_only_failures() {
        let stats = aggregate(&[failed(), failed()]);
        assert_eq!(stats.failed, 2);
        assert_eq!(stats.success_rate, 0.0);
        assert_eq!(stats.avg_response_time, None);
    }

    #[test]
    fn test_json_field_names() {
        let value = serde_json::to_value(aggregate(&[ok(10.0), ok(10.005), failed()])).unwrap();
        assert_eq!(value["total_pings"], 3);
        assert_eq!(value["successful_pings"], 2);
        assert_eq!(value["failed_pings"], 1);
        assert_eq!(value["avg_response_time"], 10.0);

        let value = serde_json::to_value(aggregate(&[])).unwrap();
        assert_eq!(value["success_rate"], 0.0);
        assert!(value["avg_response_time"].is_null());
    }
}
