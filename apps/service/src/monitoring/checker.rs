use anyhow::{Context, Result, anyhow, bail};
use rand::Rng;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tokio::time::timeout;

/// Extra time granted to the `ping` process on top of its own deadline
const PROCESS_GRACE: Duration = Duration::from_secs(5);

/// Checker trait for the different ways of probing the target
#[async_trait::async_trait]
pub trait Checker: Send + Sync {
    /// Perform the check and return the round-trip latency in milliseconds
    async fn check(&self, target: &str) -> Result<f64>;
}

/// ICMP echo through the system `ping` binary.
///
/// Raw sockets need elevated privileges, the setuid `ping` does not.
/// Latency comes from ping's own `time=` report so process spawn overhead
/// is not counted.
pub struct PingChecker {
    timeout_duration: Duration,
}

impl PingChecker {
    pub fn new(timeout_seconds: u64) -> Self {
        Self { timeout_duration: Duration::from_secs(timeout_seconds) }
    }
}

#[async_trait::async_trait]
impl Checker for PingChecker {
    async fn check(&self, target: &str) -> Result<f64> {
        let wait = self.timeout_duration.as_secs().max(1).to_string();

        let child = Command::new("ping")
            .args(["-c", "1", "-W", wait.as_str(), target])
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .context("Failed to spawn ping")?;

        let output = timeout(self.timeout_duration + PROCESS_GRACE, child.wait_with_output())
            .await
            .map_err(|_| anyhow!("Ping timed out"))?
            .context("Failed to collect ping output")?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let stderr = stderr.trim();
            if stderr.is_empty() {
                bail!("Host unreachable ({})", output.status);
            }
            bail!("Host unreachable ({}): {}", output.status, stderr);
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        parse_ping_latency(&stdout).ok_or_else(|| anyhow!("No latency in ping output"))
    }
}

/// Pull the round-trip time out of `ping` output.
///
/// Handles `time=12.3 ms`, `time=12.3ms` and `time<1ms`, the last one
/// being reported as the upper bound.
pub fn parse_ping_latency(output: &str) -> Option<f64> {
    output.lines().find_map(|line| {
        let (_, rest) = line.split_once("time=").or_else(|| line.split_once("time<"))?;
        let value: String = rest
            .chars()
            .take_while(|c| c.is_ascii_digit() || *c == '.')
            .collect();
        value.parse::<f64>().ok().filter(|ms| ms.is_finite() && *ms >= 0.0)
    })
}

/// Synthetic checker for hosts without ICMP (containers, CI).
pub struct MockChecker {
    failure_probability: f64,
}

impl MockChecker {
    /// Latency bounds of generated samples, in milliseconds
    pub const LATENCY_RANGE: std::ops::Range<f64> = 10.0..100.0;

    pub fn new(failure_probability: f64) -> Self {
        let failure_probability =
            if failure_probability.is_nan() { 0.0 } else { failure_probability.clamp(0.0, 1.0) };
        Self { failure_probability }
    }

    fn sample(&self) -> Result<f64> {
        let mut rng = rand::thread_rng();
        if rng.gen_bool(self.failure_probability) {
            bail!("Synthetic failure");
        }
        let latency = rng.gen_range(Self::LATENCY_RANGE);
        Ok((latency * 100.0).round() / 100.0)
    }
}

impl Default for MockChecker {
    fn default() -> Self {
        Self::new(0.05)
    }
}

#[async_trait::async_trait]
impl Checker for MockChecker {
    async fn check(&self, _target: &str) -> Result<f64> {
        self.sample()
    }
}
