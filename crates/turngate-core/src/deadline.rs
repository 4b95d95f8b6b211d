use std::time::{Duration, Instant};

/// A single deadline propagated to every suspension point of a turn (§5):
/// DB queries, tool calls, LLM exchanges, cache probes all race against it.
#[derive(Debug, Clone, Copy)]
pub struct TurnDeadline {
    expires_at: Instant,
}

impl TurnDeadline {
    pub fn from_now(total: Duration) -> Self {
        Self {
            expires_at: Instant::now() + total,
        }
    }

    pub fn remaining(&self) -> Duration {
        self.expires_at.saturating_duration_since(Instant::now())
    }

    pub fn is_expired(&self) -> bool {
        Instant::now() >= self.expires_at
    }

    /// Race any future against the deadline, yielding `None` on timeout.
    pub async fn race<F, T>(&self, fut: F) -> Option<T>
    where
        F: std::future::Future<Output = T>,
    {
        tokio::time::timeout(self.remaining(), fut).await.ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_deadline_is_not_expired() {
        let d = TurnDeadline::from_now(Duration::from_secs(5));
        assert!(!d.is_expired());
        assert!(d.remaining() > Duration::from_secs(0));
    }

    #[test]
    fn zero_duration_deadline_is_expired() {
        let d = TurnDeadline::from_now(Duration::from_millis(0));
        std::thread::sleep(Duration::from_millis(5));
        assert!(d.is_expired());
    }
}
