//! Restartable deadline for quote refreshes.

use std::time::Duration;

use tokio::time::{Instant, sleep_until};

#[derive(Debug, Clone)]
pub struct Debouncer {
    delay: Duration,
    deadline: Option<Instant>,
}

impl Debouncer {
    #[must_use]
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            deadline: None,
        }
    }

    #[must_use]
    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Start or restart the countdown.
    pub fn arm(&mut self) {
        self.deadline = Some(Instant::now() + self.delay);
    }

    pub fn disarm(&mut self) {
        self.deadline = None;
    }

    #[must_use]
    pub fn is_armed(&self) -> bool {
        self.deadline.is_some()
    }

    #[must_use]
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Resolves at the deadline; never resolves while disarmed.
    pub async fn wait(&self) {
        match self.deadline {
            Some(deadline) => sleep_until(deadline).await,
            None => std::future::pending().await,
        }
    }
}
