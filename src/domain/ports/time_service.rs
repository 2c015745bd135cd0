use async_trait::async_trait;
use std::time::Duration;

#[async_trait]
pub trait TimeService: Send + Sync {
    /// Current wall-clock time in milliseconds since the Unix epoch.
    fn now_millis(&self) -> i64;

    async fn sleep(&self, duration: Duration);
}
