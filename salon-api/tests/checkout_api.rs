use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use futures_util::StreamExt;
use salon_api::{app, AppState};
use salon_checkout::{PendingReservationStore, StoreOptions};
use salon_core::{BoxError, ReservationBackend};
use salon_shared::{ReservationCreated, ReservationItem};
use salon_store::MemoryKv;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceExt;

/// Backend that either books everything as `Ok(id)` or refuses with a message
struct FixedBackend(Result<i64, &'static str>);

#[async_trait]
impl ReservationBackend for FixedBackend {
    async fn create_reservation(
        &self,
        _items: &[ReservationItem],
    ) -> Result<ReservationCreated, BoxError> {
        match self.0 {
            Ok(id) => Ok(ReservationCreated::new(id)),
            Err(msg) => Err(msg.into()),
        }
    }
}

fn test_app(backend: FixedBackend) -> Router {
    let store = PendingReservationStore::new(
        Arc::new(MemoryKv::new()),
        Arc::new(backend),
        StoreOptions::default(),
    );
    app(AppState::new(Arc::new(store)))
}

fn service(schedule_id: i64, price: f64) -> Value {
    json!({
        "serviceId": 12,
        "serviceName": "Manicure",
        "scheduleId": schedule_id,
        "employeeId": 4,
        "employeeName": "Robin",
        "selectedDate": "2026-11-02",
        "startTime": "11:00",
        "endTime": "11:45",
        "price": price,
        "duration": "45 min"
    })
}

async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

async fn create(app: &Router, services: Vec<Value>) -> (StatusCode, Value) {
    send(app, "POST", "/v1/checkout/reservations", Some(json!({ "services": services }))).await
}

#[tokio::test]
async fn test_health() {
    let app = test_app(FixedBackend(Ok(1)));
    let (status, body) = send(&app, "GET", "/health", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn test_create_sets_current_checkout() {
    let app = test_app(FixedBackend(Ok(1)));

    let (status, created) = create(&app, vec![service(1, 50.0), service(2, 75.5)]).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["totalPrice"], json!(125.5));
    assert_eq!(created["status"], "pending");
    assert_eq!(created["services"].as_array().unwrap().len(), 2);

    let (status, current) = send(&app, "GET", "/v1/checkout/current", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(current["id"], created["id"]);

    let (_, listed) = send(&app, "GET", "/v1/checkout/reservations", None).await;
    assert_eq!(listed.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_create_rejects_bad_carts() {
    let app = test_app(FixedBackend(Ok(1)));

    let (status, body) = create(&app, vec![]).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("at least one service"));

    let (status, _) = create(&app, vec![service(8, 10.0), service(8, 10.0)]).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_confirm_flow() {
    let app = test_app(FixedBackend(Ok(42)));
    let (_, created) = create(&app, vec![service(1, 30.0)]).await;
    let id = created["id"].as_str().unwrap();

    let (status, _) = send(&app, "GET", &format!("/v1/checkout/reservations/{}/validate", id), None).await;
    assert_eq!(status, StatusCode::OK);

    let uri = format!("/v1/checkout/reservations/{}/confirm", id);
    let (status, body) = send(&app, "POST", &uri, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["reservationId"], 42);

    let (_, reservation) = send(&app, "GET", &format!("/v1/checkout/reservations/{}", id), None).await;
    assert_eq!(reservation["status"], "confirmed");

    let (status, _) = send(&app, "POST", &uri, None).await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_confirm_backend_failure() {
    let app = test_app(FixedBackend(Err("schedule 1 already booked")));
    let (_, created) = create(&app, vec![service(1, 30.0)]).await;
    let id = created["id"].as_str().unwrap();

    let (status, body) =
        send(&app, "POST", &format!("/v1/checkout/reservations/{}/confirm", id), None).await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["error"], "schedule 1 already booked");

    let (_, reservation) = send(&app, "GET", &format!("/v1/checkout/reservations/{}", id), None).await;
    assert_eq!(reservation["status"], "failed");
}

#[tokio::test]
async fn test_unknown_reservation() {
    let app = test_app(FixedBackend(Ok(1)));

    let (status, _) = send(&app, "POST", "/v1/checkout/reservations/pending_1_nope/confirm", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(&app, "GET", "/v1/checkout/reservations/pending_1_nope", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_clear_current_keeps_reservation() {
    let app = test_app(FixedBackend(Ok(1)));
    let (_, created) = create(&app, vec![service(3, 15.0)]).await;

    let (status, _) = send(&app, "DELETE", "/v1/checkout/current", None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = send(&app, "GET", "/v1/checkout/current", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let id = created["id"].as_str().unwrap();
    let (status, _) = send(&app, "GET", &format!("/v1/checkout/reservations/{}", id), None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_sweep_keeps_fresh_reservations() {
    let app = test_app(FixedBackend(Ok(1)));
    create(&app, vec![service(3, 15.0)]).await;

    let (status, body) = send(&app, "POST", "/v1/checkout/sweep", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["removed"], 0);
}

#[tokio::test]
async fn test_events_stream_reports_creates() {
    let app = test_app(FixedBackend(Ok(1)));
    let request = Request::builder()
        .uri("/v1/checkout/events")
        .body(Body::empty())
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()["content-type"], "text/event-stream");

    let (_, created) = create(&app, vec![service(5, 20.0)]).await;

    let mut body = response.into_body().into_data_stream();
    let frame = tokio::time::timeout(Duration::from_secs(5), body.next())
        .await
        .expect("no event within 5s")
        .unwrap()
        .unwrap();
    let text = String::from_utf8(frame.to_vec()).unwrap();

    assert!(text.contains("event: reservation_created"));
    assert!(text.contains(created["id"].as_str().unwrap()));
}
