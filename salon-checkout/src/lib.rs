pub mod id;
pub mod store;

pub use store::{CheckoutError, PendingReservationStore, StoreOptions};
