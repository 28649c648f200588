use crate::id;
use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use salon_core::{BoxError, CoreError, KeyValueStore, ReservationBackend, ScheduleAvailability};
use salon_shared::{
    CheckoutEvent, PendingReservation, ReservationCreated, ReservationStatus, ServiceSelection,
};
use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::{broadcast, watch};
use tracing::{debug, error, info, warn};

#[derive(Debug, Clone)]
pub struct StoreOptions {
    /// Key holding the whole persisted collection
    pub storage_key: String,
    /// Age after which a reservation is swept
    pub expiry: Duration,
    /// Capacity of the change-event channel
    pub event_buffer: usize,
}

impl Default for StoreOptions {
    fn default() -> Self {
        Self {
            storage_key: "pending_reservations".to_string(),
            expiry: Duration::hours(1),
            event_buffer: 100,
        }
    }
}

#[derive(Default)]
struct Inner {
    /// Creation order
    reservations: Vec<PendingReservation>,
    /// Ids with a backend confirmation outstanding
    in_flight: HashSet<String>,
    /// Bumped on every persisted mutation
    generation: u64,
}

/// What storage should hold after one mutation, taken under the lock and
/// written after it is released
struct Snapshot {
    generation: u64,
    unconfirmed: Vec<PendingReservation>,
}

impl Inner {
    fn snapshot(&mut self) -> Snapshot {
        self.generation += 1;
        Snapshot {
            generation: self.generation,
            unconfirmed: self
                .reservations
                .iter()
                .filter(|r| r.status != ReservationStatus::Confirmed)
                .cloned()
                .collect(),
        }
    }

    fn find(&self, id: &str) -> Option<&PendingReservation> {
        self.reservations.iter().find(|r| r.id == id)
    }

    fn find_mut(&mut self, id: &str) -> Option<&mut PendingReservation> {
        self.reservations.iter_mut().find(|r| r.id == id)
    }
}

/// Client-side cache of reservations awaiting backend confirmation.
///
/// The in-memory collection is authoritative for the session. Every mutation
/// is mirrored into the key-value store on a best-effort basis; storage
/// failures are logged and never reach the caller.
pub struct PendingReservationStore {
    inner: Mutex<Inner>,
    /// Serializes storage writes; holds the last generation written
    persisted: Mutex<u64>,
    kv: Arc<dyn KeyValueStore>,
    backend: Arc<dyn ReservationBackend>,
    availability: Option<Arc<dyn ScheduleAvailability>>,
    current: watch::Sender<Option<String>>,
    events: broadcast::Sender<CheckoutEvent>,
    options: StoreOptions,
}

impl PendingReservationStore {
    pub fn new(
        kv: Arc<dyn KeyValueStore>,
        backend: Arc<dyn ReservationBackend>,
        options: StoreOptions,
    ) -> Self {
        let (current, _) = watch::channel(None);
        let (events, _) = broadcast::channel(options.event_buffer.max(1));
        Self {
            inner: Mutex::new(Inner::default()),
            persisted: Mutex::new(0),
            kv,
            backend,
            availability: None,
            current,
            events,
            options,
        }
    }

    /// Attach the live schedule lookup used by `validate_pending_reservation`
    pub fn with_availability(mut self, availability: Arc<dyn ScheduleAvailability>) -> Self {
        self.availability = Some(availability);
        self
    }

    pub fn options(&self) -> &StoreOptions {
        &self.options
    }

    /// Create a pending reservation and make it the current checkout selection
    pub fn create_pending_reservation(
        &self,
        services: Vec<ServiceSelection>,
    ) -> Result<PendingReservation, CheckoutError> {
        validate_services(&services)?;

        let (reservation, snapshot) = {
            let mut inner = self.lock();
            let id = loop {
                let candidate = id::generate(Utc::now());
                if inner.find(&candidate).is_none() {
                    break candidate;
                }
            };
            let reservation = PendingReservation::new(id, services);
            inner.reservations.push(reservation.clone());
            (reservation, inner.snapshot())
        };
        self.persist(snapshot);

        self.current.send_replace(Some(reservation.id.clone()));
        info!(
            "Pending reservation {} created: {} services, total {}",
            reservation.id,
            reservation.services.len(),
            reservation.total_price
        );
        self.publish(CheckoutEvent::ReservationCreated {
            reservation_id: reservation.id.clone(),
            total_price: reservation.total_price,
            service_count: reservation.services.len(),
            timestamp: Utc::now().timestamp(),
        });

        Ok(reservation)
    }

    /// Submit a pending reservation to the backend.
    ///
    /// At most one confirmation per id runs at a time. On success the entry is
    /// dropped from storage but stays in memory as `confirmed`; on failure it is
    /// marked `failed` and storage is left as is.
    pub async fn confirm_reservation(&self, id: &str) -> Result<ReservationCreated, CheckoutError> {
        let (items, _guard) = {
            let mut inner = self.lock();
            let (status, items) = match inner.find(id) {
                Some(r) => (r.status, r.reservation_items()),
                None => return Err(CheckoutError::NotFound(id.to_string())),
            };
            if inner.in_flight.contains(id) {
                return Err(CheckoutError::ConfirmationInProgress(id.to_string()));
            }
            if status.is_terminal() {
                return Err(CheckoutError::AlreadyProcessed {
                    id: id.to_string(),
                    status,
                });
            }
            inner.in_flight.insert(id.to_string());
            (items, InFlightGuard { store: self, id })
        };

        info!("Confirming reservation {} ({} items)", id, items.len());

        match self.backend.create_reservation(&items).await {
            Ok(created) => {
                let snapshot = {
                    let mut inner = self.lock();
                    match inner.find_mut(id) {
                        Some(r) => r.status = ReservationStatus::Confirmed,
                        None => warn!("Reservation {} vanished while confirming", id),
                    }
                    inner.snapshot()
                };
                self.persist(snapshot);
                info!(
                    "Reservation {} confirmed as backend reservation {}",
                    id, created.reservation_id
                );
                self.publish(CheckoutEvent::ReservationConfirmed {
                    reservation_id: id.to_string(),
                    backend_reservation_id: created.reservation_id,
                    timestamp: Utc::now().timestamp(),
                });
                Ok(created)
            }
            Err(err) => {
                {
                    let mut inner = self.lock();
                    if let Some(r) = inner.find_mut(id) {
                        r.status = ReservationStatus::Failed;
                    }
                }
                error!("Reservation {} failed to confirm: {}", id, err);
                self.publish(CheckoutEvent::ReservationFailed {
                    reservation_id: id.to_string(),
                    reason: err.to_string(),
                    timestamp: Utc::now().timestamp(),
                });
                Err(CheckoutError::Backend(err))
            }
        }
    }

    pub fn get_pending_reservation(&self, id: &str) -> Option<PendingReservation> {
        self.lock().find(id).cloned()
    }

    pub fn list_pending_reservations(&self) -> Vec<PendingReservation> {
        self.lock().reservations.clone()
    }

    /// The reservation behind the current selection, if it still exists
    pub fn get_current_checkout_reservation(&self) -> Option<PendingReservation> {
        let id = self.current.borrow().clone()?;
        self.get_pending_reservation(&id)
    }

    /// Drops the selection only; the reservation itself is kept
    pub fn clear_current_checkout_reservation(&self) {
        self.current.send_replace(None);
    }

    pub fn subscribe_current_checkout(&self) -> watch::Receiver<Option<String>> {
        self.current.subscribe()
    }

    pub fn subscribe_changes(&self) -> broadcast::Receiver<CheckoutEvent> {
        self.events.subscribe()
    }

    /// Replace the in-memory collection with the persisted one.
    /// Absent or unreadable data loads as empty.
    pub fn load_pending_reservations_from_storage(&self) -> usize {
        let loaded = self.read_persisted();
        let count = loaded.len();
        self.lock().reservations = loaded;

        info!("Loaded {} pending reservations from storage", count);
        self.publish(CheckoutEvent::ReservationsLoaded {
            count,
            timestamp: Utc::now().timestamp(),
        });
        count
    }

    pub fn clean_expired_reservations(&self) -> usize {
        self.clean_expired_reservations_at(Utc::now())
    }

    /// Sweep reservations created before `now - expiry`. Ids without a
    /// readable timestamp count as expired. Reservations with a confirmation
    /// outstanding are kept.
    /// An expiry too large to subtract from `now` expires nothing.
    pub fn clean_expired_reservations_at(&self, now: DateTime<Utc>) -> usize {
        let Some(cutoff) = now.checked_sub_signed(self.options.expiry) else {
            debug!("Expiry {} reaches past the earliest date, nothing to sweep", self.options.expiry);
            return 0;
        };

        let (expired, snapshot): (Vec<String>, Snapshot) = {
            let mut inner = self.lock();
            let in_flight = inner.in_flight.clone();
            let (kept, expired): (Vec<_>, Vec<_>) = inner
                .reservations
                .drain(..)
                .partition(|r| in_flight.contains(&r.id) || !is_expired(r, cutoff));
            inner.reservations = kept;
            if expired.is_empty() {
                return 0;
            }
            let snapshot = inner.snapshot();
            (expired.into_iter().map(|r| r.id).collect(), snapshot)
        };
        self.persist(snapshot);

        let selection_expired = self
            .current
            .borrow()
            .as_ref()
            .is_some_and(|current| expired.contains(current));
        if selection_expired {
            self.current.send_replace(None);
        }

        info!("Swept {} expired pending reservations", expired.len());
        let count = expired.len();
        self.publish(CheckoutEvent::ReservationsExpired {
            reservation_ids: expired,
            timestamp: Utc::now().timestamp(),
        });
        count
    }

    /// Check every selected slot against live availability. Without a
    /// configured checker every known reservation validates.
    pub async fn validate_pending_reservation(&self, id: &str) -> Result<bool, CheckoutError> {
        let schedule_ids: Vec<i64> = self
            .get_pending_reservation(id)
            .ok_or_else(|| CheckoutError::NotFound(id.to_string()))?
            .services
            .iter()
            .map(|s| s.schedule_id)
            .collect();

        let Some(availability) = &self.availability else {
            debug!("No availability checker configured, accepting {}", id);
            return Ok(true);
        };

        for schedule_id in schedule_ids {
            let available = availability
                .is_schedule_available(schedule_id)
                .await
                .map_err(CheckoutError::Backend)?;
            if !available {
                info!("Reservation {} invalid: schedule {} is booked", id, schedule_id);
                return Ok(false);
            }
        }
        Ok(true)
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn publish(&self, event: CheckoutEvent) {
        // No subscribers is fine
        let _ = self.events.send(event);
    }

    /// Mirror a snapshot into storage without holding the collection lock.
    /// Confirmed entries are never in a snapshot, and an empty one removes the
    /// key. A snapshot older than the last one attempted is dropped, so storage
    /// always ends on the latest mutation.
    fn persist(&self, snapshot: Snapshot) {
        let mut persisted = self
            .persisted
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if snapshot.generation <= *persisted {
            debug!("Skipping stale snapshot {}", snapshot.generation);
            return;
        }

        let key = &self.options.storage_key;
        let result = if snapshot.unconfirmed.is_empty() {
            self.kv.remove(key)
        } else {
            serde_json::to_string(&snapshot.unconfirmed)
                .map_err(|e| CoreError::Serialization(e.to_string()))
                .and_then(|raw| self.kv.set(key, &raw))
        };

        // A failed write still supersedes older snapshots
        *persisted = snapshot.generation;
        if let Err(e) = result {
            warn!("Failed to persist pending reservations: {}", e);
        }
    }

    fn read_persisted(&self) -> Vec<PendingReservation> {
        match self.kv.get(&self.options.storage_key) {
            Ok(Some(raw)) => serde_json::from_str(&raw).unwrap_or_else(|e| {
                warn!("Discarding unreadable pending reservations: {}", e);
                Vec::new()
            }),
            Ok(None) => Vec::new(),
            Err(e) => {
                warn!("Failed to read pending reservations: {}", e);
                Vec::new()
            }
        }
    }
}

impl std::fmt::Debug for PendingReservationStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PendingReservationStore")
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

/// Clears the in-flight marker even if the confirming future is dropped
struct InFlightGuard<'a> {
    store: &'a PendingReservationStore,
    id: &'a str,
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.store.lock().in_flight.remove(self.id);
    }
}

fn is_expired(reservation: &PendingReservation, cutoff: DateTime<Utc>) -> bool {
    match id::created_at(&reservation.id) {
        Some(created_at) => created_at < cutoff,
        None => {
            warn!("Reservation {} has no readable timestamp, expiring it", reservation.id);
            true
        }
    }
}

fn validate_services(services: &[ServiceSelection]) -> Result<(), CheckoutError> {
    if services.is_empty() {
        return Err(CheckoutError::Validation(
            "a reservation needs at least one service".to_string(),
        ));
    }

    let mut schedules = HashSet::new();
    for service in services {
        if service.price < Decimal::ZERO {
            return Err(CheckoutError::Validation(format!(
                "service {} has a negative price",
                service.service_id
            )));
        }
        if !schedules.insert(service.schedule_id) {
            return Err(CheckoutError::Validation(format!(
                "schedule {} is selected twice",
                service.schedule_id
            )));
        }
    }
    Ok(())
}

#[derive(Debug, thiserror::Error)]
pub enum CheckoutError {
    #[error("Pending reservation not found: {0}")]
    NotFound(String),

    #[error("Invalid reservation: {0}")]
    Validation(String),

    #[error("Reservation {0} is already being confirmed")]
    ConfirmationInProgress(String),

    #[error("Reservation {id} is already {status}")]
    AlreadyProcessed {
        id: String,
        status: ReservationStatus,
    },

    #[error("Reservation backend error: {0}")]
    Backend(#[source] BoxError),
}
