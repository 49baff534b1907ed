//! Poll policies for waiting on the control plane

use std::time::Duration;

/// How long to keep re-reading a resource after deleting it
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PollPolicy {
    /// Delay between reads
    pub interval: Duration,
    /// Maximum number of reads (0 = unbounded)
    pub max_attempts: u32,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(20),
            max_attempts: 90,
        }
    }
}

impl PollPolicy {
    /// Create a policy with a maximum number of reads
    pub fn with_max_attempts(attempts: u32) -> Self {
        Self {
            max_attempts: attempts,
            ..Default::default()
        }
    }

    /// Create a policy that polls until the resource is gone, however long it takes
    pub fn unbounded() -> Self {
        Self::with_max_attempts(0)
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Returns true once `attempt` reads have used up the budget
    pub fn exhausted(&self, attempt: u32) -> bool {
        self.max_attempts > 0 && attempt >= self.max_attempts
    }
}

/// What to do when a read fails for reasons other than "not found"
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ReadErrorPolicy {
    /// Fail the invocation
    #[default]
    Propagate,
    /// Treat the resource as absent and carry on
    TreatAsAbsent,
}
