use salon_checkout::{PendingReservationStore, StoreOptions};
use salon_store::app_config::{CheckoutRules, StorageConfig};
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<PendingReservationStore>,
}

impl AppState {
    pub fn new(store: Arc<PendingReservationStore>) -> Self {
        Self { store }
    }
}

pub fn store_options(storage: &StorageConfig, rules: &CheckoutRules) -> StoreOptions {
    StoreOptions {
        storage_key: storage.namespace_key.clone(),
        expiry: expiry(rules.expiry_seconds),
        event_buffer: rules.event_buffer,
    }
}

/// Saturates instead of panicking; the store treats an unreachable cutoff as
/// "nothing expires"
fn expiry(seconds: u64) -> chrono::Duration {
    i64::try_from(seconds)
        .ok()
        .and_then(chrono::Duration::try_seconds)
        .unwrap_or(chrono::Duration::MAX)
}
