// ── Command results ──

use std::time::Duration;

use serde::{Serialize, Serializer};

/// Result of one command against one device.
#[derive(Debug, Clone, Serialize)]
pub struct CommandOutcome {
    pub address: String,
    pub name: String,
    pub command: String,
    pub success: bool,
    pub message: String,
    #[serde(serialize_with = "as_secs_f64")]
    pub elapsed: Duration,
}

/// Aggregate of one bulk call. Outcomes are in completion order.
#[derive(Debug, Clone, Serialize)]
pub struct BulkResult {
    pub command: String,
    pub outcomes: Vec<CommandOutcome>,
    #[serde(serialize_with = "as_secs_f64")]
    pub total_time: Duration,
    pub success_count: usize,
    pub failure_count: usize,
}

impl BulkResult {
    pub fn new(command: impl Into<String>, outcomes: Vec<CommandOutcome>, total_time: Duration) -> Self {
        let success_count = outcomes.iter().filter(|o| o.success).count();
        let failure_count = outcomes.len() - success_count;
        Self {
            command: command.into(),
            outcomes,
            total_time,
            success_count,
            failure_count,
        }
    }

    pub fn all_succeeded(&self) -> bool {
        self.failure_count == 0
    }

    pub fn successes(&self) -> impl Iterator<Item = &CommandOutcome> {
        self.outcomes.iter().filter(|o| o.success)
    }

    pub fn failures(&self) -> impl Iterator<Item = &CommandOutcome> {
        self.outcomes.iter().filter(|o| !o.success)
    }
}

fn as_secs_f64<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_f64(d.as_secs_f64())
}
