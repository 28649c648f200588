use salon_checkout::PendingReservationStore;
use std::sync::Arc;
use tokio::time::{interval, Duration, MissedTickBehavior};
use tracing::{debug, error, info};

/// Periodically sweep expired pending reservations. Runs until the task is
/// dropped; the first sweep happens immediately.
pub async fn start_expiry_worker(store: Arc<PendingReservationStore>, every: Duration) {
    let mut ticker = interval(every);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    info!("Expiry worker started, sweeping every {:?}", every);

    loop {
        ticker.tick().await;
        let sweeping = store.clone();
        match tokio::task::spawn_blocking(move || sweeping.clean_expired_reservations()).await {
            Ok(0) => debug!("Expiry worker found nothing to remove"),
            Ok(removed) => info!("Expiry worker removed {} reservations", removed),
            Err(e) => error!("Expiry sweep task failed: {}", e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use salon_checkout::StoreOptions;
    use salon_core::{BoxError, KeyValueStore, ReservationBackend};
    use salon_shared::{ReservationCreated, ReservationItem};
    use salon_store::MemoryKv;

    struct NoBackend;

    #[async_trait]
    impl ReservationBackend for NoBackend {
        async fn create_reservation(
            &self,
            _items: &[ReservationItem],
        ) -> Result<ReservationCreated, BoxError> {
            Err("not used".into())
        }
    }

    #[tokio::test]
    async fn test_worker_sweeps_stale_reservations() {
        let kv = Arc::new(MemoryKv::new());
        let stale_millis = (chrono::Utc::now() - chrono::Duration::hours(3)).timestamp_millis();
        kv.set(
            "pending_reservations",
            &serde_json::json!([{
                "id": format!("pending_{}_stale0001", stale_millis),
                "services": [{
                    "serviceId": 1, "serviceName": "Cut", "scheduleId": 2,
                    "employeeId": 3, "employeeName": "Kim", "selectedDate": "2026-01-10",
                    "startTime": "10:00", "endTime": "10:30", "price": 20,
                    "duration": "30 min"
                }],
                "totalPrice": 20,
                "status": "pending"
            }])
            .to_string(),
        )
        .unwrap();

        let store = Arc::new(PendingReservationStore::new(
            kv,
            Arc::new(NoBackend),
            StoreOptions::default(),
        ));
        assert_eq!(store.load_pending_reservations_from_storage(), 1);

        let handle = tokio::spawn(start_expiry_worker(store.clone(), Duration::from_secs(60)));
        tokio::time::timeout(Duration::from_secs(5), async {
            while !store.list_pending_reservations().is_empty() {
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        })
        .await
        .unwrap();
        handle.abort();
    }
}
