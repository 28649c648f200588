use async_trait::async_trait;
use salon_shared::{ReservationCreated, ReservationItem};

/// Error type returned by collaborators; forwarded to callers untouched
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Remote side of checkout confirmation
#[async_trait]
pub trait ReservationBackend: Send + Sync {
    /// Book every `{scheduleId, serviceId}` pair as one reservation
    async fn create_reservation(
        &self,
        items: &[ReservationItem],
    ) -> Result<ReservationCreated, BoxError>;
}
