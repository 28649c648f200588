use rust_decimal::Decimal;

/// Change notification published by the checkout store
#[derive(Debug, serde::Serialize, serde::Deserialize, Clone, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CheckoutEvent {
    ReservationCreated {
        reservation_id: String,
        total_price: Decimal,
        service_count: usize,
        timestamp: i64,
    },
    ReservationConfirmed {
        reservation_id: String,
        backend_reservation_id: i64,
        timestamp: i64,
    },
    ReservationFailed {
        reservation_id: String,
        reason: String,
        timestamp: i64,
    },
    ReservationsExpired {
        reservation_ids: Vec<String>,
        timestamp: i64,
    },
    ReservationsLoaded {
        count: usize,
        timestamp: i64,
    },
}

impl CheckoutEvent {
    pub fn name(&self) -> &'static str {
        match self {
            CheckoutEvent::ReservationCreated { .. } => "reservation_created",
            CheckoutEvent::ReservationConfirmed { .. } => "reservation_confirmed",
            CheckoutEvent::ReservationFailed { .. } => "reservation_failed",
            CheckoutEvent::ReservationsExpired { .. } => "reservations_expired",
            CheckoutEvent::ReservationsLoaded { .. } => "reservations_loaded",
        }
    }
}
