pub mod models;
pub mod pii;

pub use models::checkout::{
    PendingReservation, ReservationCreated, ReservationItem, ReservationStatus, ServiceSelection,
};
pub use models::events::CheckoutEvent;
pub use pii::Masked;
