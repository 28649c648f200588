use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Reservation status in the checkout lifecycle
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ReservationStatus {
    Pending,
    Confirmed,
    Failed,
}

impl ReservationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReservationStatus::Pending => "pending",
            ReservationStatus::Confirmed => "confirmed",
            ReservationStatus::Failed => "failed",
        }
    }

    /// Confirmed and failed reservations never change status again
    pub fn is_terminal(&self) -> bool {
        !matches!(self, ReservationStatus::Pending)
    }
}

impl std::fmt::Display for ReservationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One bookable slot picked by the customer
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ServiceSelection {
    pub service_id: i64,
    pub service_name: String,
    pub schedule_id: i64,
    pub employee_id: i64,
    pub employee_name: String,
    pub selected_date: NaiveDate,
    pub start_time: String,
    pub end_time: String,
    pub price: Decimal,
    pub duration: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

/// A client-held booking that the backend has not acknowledged yet
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PendingReservation {
    pub id: String,
    pub services: Vec<ServiceSelection>,
    pub total_price: Decimal,
    pub status: ReservationStatus,
}

impl PendingReservation {
    /// Build a pending reservation; the total is fixed here and never recomputed
    pub fn new(id: String, services: Vec<ServiceSelection>) -> Self {
        let total_price = services.iter().map(|s| s.price).sum();
        Self {
            id,
            services,
            total_price,
            status: ReservationStatus::Pending,
        }
    }

    /// Items sent to the backend. Display-only fields are dropped, the backend
    /// resolves staff and time window from the schedule id.
    pub fn reservation_items(&self) -> Vec<ReservationItem> {
        self.services
            .iter()
            .map(|s| ReservationItem {
                schedule_id: s.schedule_id,
                service_id: s.service_id,
            })
            .collect()
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ReservationItem {
    pub schedule_id: i64,
    pub service_id: i64,
}

/// Backend acknowledgment of a batch reservation
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ReservationCreated {
    pub reservation_id: i64,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl ReservationCreated {
    pub fn new(reservation_id: i64) -> Self {
        Self {
            reservation_id,
            extra: serde_json::Map::new(),
        }
    }
}
