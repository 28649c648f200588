use async_trait::async_trait;
use crate::backend::BoxError;

/// Live schedule lookup used to re-validate a cart before confirmation
#[async_trait]
pub trait ScheduleAvailability: Send + Sync {
    /// `true` while the slot is still unbooked
    async fn is_schedule_available(&self, schedule_id: i64) -> Result<bool, BoxError>;
}
