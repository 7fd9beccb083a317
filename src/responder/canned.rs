//! The canned responder: table lookup behind an artificial delay that stands
//! in for backend latency.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use log::{debug, info};
use rand::Rng;

use super::provider::{Reply, Responder, ResponderError};
use super::table::ResponseTable;

/// Inclusive range the simulated latency is drawn from, uniformly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DelayRange {
    min: Duration,
    max: Duration,
}

impl Default for DelayRange {
    fn default() -> Self {
        Self::from_millis(500, 2000)
    }
}

impl DelayRange {
    /// Bounds in either order; they are sorted here.
    pub fn from_millis(a: u64, b: u64) -> Self {
        Self {
            min: Duration::from_millis(a.min(b)),
            max: Duration::from_millis(a.max(b)),
        }
    }

    /// No delay at all. Handy for tests and scripted runs.
    pub fn instant() -> Self {
        Self::from_millis(0, 0)
    }

    pub fn min(&self) -> Duration {
        self.min
    }

    pub fn max(&self) -> Duration {
        self.max
    }

    pub fn sample(&self) -> Duration {
        if self.min == self.max {
            return self.min;
        }
        let (lo, hi) = (self.min.as_millis() as u64, self.max.as_millis() as u64);
        Duration::from_millis(rand::thread_rng().gen_range(lo..=hi))
    }
}

pub struct CannedResponder {
    table: ResponseTable,
    delay: DelayRange,
    failure_rate: f64,
}

impl CannedResponder {
    pub fn new(table: ResponseTable, delay: DelayRange) -> Self {
        Self {
            table,
            delay,
            failure_rate: 0.0,
        }
    }

    /// Probability in `[0, 1]` that a call resolves with a simulated failure.
    pub fn with_failure_rate(mut self, rate: f64) -> Self {
        self.failure_rate = if rate.is_nan() { 0.0 } else { rate.clamp(0.0, 1.0) };
        self
    }

    pub fn table(&self) -> &ResponseTable {
        &self.table
    }

    fn roll_failure(&self) -> bool {
        self.failure_rate > 0.0 && rand::thread_rng().gen_bool(self.failure_rate)
    }
}

#[async_trait]
impl Responder for CannedResponder {
    fn name(&self) -> &str {
        "canned"
    }

    async fn respond(&self, user_text: &str) -> Result<Reply, ResponderError> {
        let start = Instant::now();
        let delay = self.delay.sample();
        debug!("Simulating {}ms of backend latency", delay.as_millis());
        tokio::time::sleep(delay).await;

        if self.roll_failure() {
            info!("Simulated responder failure after {}ms", start.elapsed().as_millis());
            return Err(ResponderError::Simulated(
                "backend did not answer".to_string(),
            ));
        }

        let body = self.table.resolve(user_text);
        let latency_ms = start.elapsed().as_millis() as u64;
        info!("Responder resolved in {}ms ({} chars)", latency_ms, body.len());
        Ok(Reply { body, latency_ms })
    }
}
