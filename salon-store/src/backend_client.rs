use crate::app_config::BackendConfig;
use async_trait::async_trait;
use salon_core::{BoxError, ReservationBackend};
use salon_shared::{Masked, ReservationCreated, ReservationItem};
use serde::Serialize;
use std::time::Duration;
use tracing::{error, info};

/// REST client for the salon backend's reservation endpoint
#[derive(Debug, Clone)]
pub struct HttpReservationBackend {
    client: reqwest::Client,
    base_url: String,
    api_token: Option<Masked<String>>,
}

#[derive(Debug, Serialize)]
struct CreateReservationRequest<'a> {
    reservations: &'a [ReservationItem],
}

/// Non-2xx answer from the backend
#[derive(Debug, thiserror::Error)]
#[error("Reservation backend returned {status}: {body}")]
pub struct BackendHttpError {
    pub status: u16,
    pub body: String,
}

impl HttpReservationBackend {
    pub fn new(config: &BackendConfig) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_token: config.api_token.clone(),
        })
    }
}

#[async_trait]
impl ReservationBackend for HttpReservationBackend {
    async fn create_reservation(
        &self,
        items: &[ReservationItem],
    ) -> Result<ReservationCreated, BoxError> {
        let url = format!("{}/reservations", self.base_url);
        let mut request = self
            .client
            .post(&url)
            .json(&CreateReservationRequest { reservations: items });

        if let Some(token) = &self.api_token {
            request = request.bearer_auth(token.expose());
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!("Reservation backend rejected {} items: {}", items.len(), status);
            return Err(Box::new(BackendHttpError {
                status: status.as_u16(),
                body,
            }));
        }

        let created: ReservationCreated = response.json().await?;
        info!("Backend created reservation {}", created.reservation_id);
        Ok(created)
    }
}
