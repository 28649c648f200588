pub mod availability;
pub mod backend;
pub mod kv;

pub use availability::ScheduleAvailability;
pub use backend::{BoxError, ReservationBackend};
pub use kv::KeyValueStore;

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Storage failure: {0}")]
    Storage(String),
    #[error("Serialization failed: {0}")]
    Serialization(String),
}

pub type CoreResult<T> = Result<T, CoreError>;
