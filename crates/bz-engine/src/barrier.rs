//! Common start instant for all channels.

use std::time::Duration;
use tokio::time::{self, Instant};

/// Lead time used when nothing else is configured.
pub const DEFAULT_LEAD_TIME: Duration = Duration::from_secs(2);

/// The single future instant every channel starts at.
///
/// Computed once per session and copied into every player.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SyncBarrier {
    target: Instant,
}

impl SyncBarrier {
    /// Place the barrier `lead_time` after now.
    pub fn compute(lead_time: Duration) -> Self {
        Self::at(Instant::now() + lead_time)
    }

    /// Place the barrier at an explicit instant.
    pub fn at(target: Instant) -> Self {
        Self { target }
    }

    pub fn target(&self) -> Instant {
        self.target
    }

    /// Time left until the barrier, zero once it has passed.
    pub fn residual(&self, now: Instant) -> Duration {
        self.target.saturating_duration_since(now)
    }

    /// Suspend until the barrier. Returns immediately if it has passed.
    pub async fn wait(&self) {
        time::sleep_until(self.target).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn target_is_lead_time_ahead() {
        let start = Instant::now();
        let barrier = SyncBarrier::compute(Duration::from_millis(1500));
        assert_eq!(barrier.target() - start, Duration::from_millis(1500));
        assert_eq!(barrier.residual(start), Duration::from_millis(1500));
    }

    #[tokio::test(start_paused = true)]
    async fn wait_ends_exactly_at_target() {
        let barrier = SyncBarrier::compute(DEFAULT_LEAD_TIME);
        barrier.wait().await;
        assert_eq!(Instant::now(), barrier.target());
        assert_eq!(barrier.residual(Instant::now()), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn passed_barrier_does_not_wait() {
        let barrier = SyncBarrier::compute(Duration::from_millis(10));
        time::advance(Duration::from_millis(50)).await;
        let before = Instant::now();
        barrier.wait().await;
        assert_eq!(Instant::now(), before);
        assert_eq!(barrier.residual(before), Duration::ZERO);
    }
}
