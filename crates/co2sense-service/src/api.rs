//! REST API endpoints for the co2sense-service.
//!
//! This module provides HTTP endpoints for provisioning devices, ingesting
//! readings and querying stored data.
//!
//! # Blocking Storage Calls
//!
//! Device stores are SQLite databases. Every handler that touches the
//! [`Registry`] runs the call on the blocking thread pool via
//! [`spawn_blocking`](tokio::task::spawn_blocking), so a slow scan on one
//! device never stalls the async workers serving other devices.
//!
//! ## Error Handling
//!
//! All endpoints return structured JSON errors via [`AppError`]. A device
//! without a store and a store without readings are both reported as
//! "no data yet" on the query endpoints: `404` with `"no_data": true` for
//! the latest reading, an empty list for a ranged query. Malformed device
//! identifiers are `400`. Storage failures are `500`.
//!
//! # Example
//!
//! ```ignore
//! use axum::Router;
//! use co2sense_service::api;
//!
//! let app = api::router().with_state(state);
//! ```

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
};
use co2sense_store::Registry;
use co2sense_types::{DeviceId, Reading};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use tracing::info;

use crate::ingest::{IngestError, IngestOutcome, IngestRequest};
use crate::state::AppState;

/// Create the API router.
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/health", get(health))
        // Provisioning
        .route("/api/devices", get(list_devices).post(provision_device))
        .route(
            "/api/devices/{id}",
            get(get_device).delete(deprovision_device),
        )
        // Data endpoints
        .route("/api/devices/{id}/current", get(get_current_reading))
        .route(
            "/api/devices/{id}/readings",
            get(get_readings).post(ingest_reading),
        )
}

/// Run `f` against the registry on the blocking thread pool.
async fn with_registry<T, F>(state: &AppState, f: F) -> Result<T, AppError>
where
    F: FnOnce(&Registry) -> Result<T, AppError> + Send + 'static,
    T: Send + 'static,
{
    let registry = Arc::clone(&state.registry);
    tokio::task::spawn_blocking(move || f(&registry))
        .await
        .map_err(|e| AppError::Internal(format!("Storage task failed: {}", e)))?
}

fn parse_device_id(id: &str) -> Result<DeviceId, AppError> {
    DeviceId::parse(id).map_err(|e| AppError::BadRequest(e.to_string()))
}

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    #[serde(with = "time::serde::rfc3339")]
    pub timestamp: OffsetDateTime,
    /// Number of open device stores.
    pub devices: usize,
}

/// Health check endpoint.
async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        timestamp: OffsetDateTime::now_utc(),
        devices: state.registry.len(),
    })
}

/// Device response.
#[derive(Debug, Serialize)]
pub struct DeviceResponse {
    pub id: DeviceId,
    pub reading_count: u64,
}

/// List all provisioned devices.
///
/// Devices removed while the list is being built are left out.
async fn list_devices(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<DeviceResponse>>, AppError> {
    let devices = with_registry(&state, |registry| {
        let mut devices = Vec::new();
        for id in registry.devices() {
            let Ok(store) = registry.handle(&id) else {
                continue;
            };
            match store.count() {
                Ok(reading_count) => devices.push(DeviceResponse { id, reading_count }),
                Err(co2sense_store::Error::NotFound(_)) => continue,
                Err(e) => return Err(e.into()),
            }
        }
        Ok(devices)
    })
    .await?;
    Ok(Json(devices))
}

/// Get a single device.
async fn get_device(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<DeviceResponse>, AppError> {
    let id = parse_device_id(&id)?;
    let device = with_registry(&state, move |registry| {
        let reading_count = registry.handle(&id)?.count()?;
        Ok(DeviceResponse { id, reading_count })
    })
    .await?;
    Ok(Json(device))
}

/// Provision a device under a freshly minted identifier.
async fn provision_device(
    State(state): State<Arc<AppState>>,
) -> Result<(StatusCode, Json<DeviceResponse>), AppError> {
    let id = DeviceId::new_v4();
    let device = with_registry(&state, move |registry| {
        registry.create(&id)?;
        Ok(DeviceResponse {
            id,
            reading_count: 0,
        })
    })
    .await?;

    info!("Provisioned device {}", device.id);
    Ok((StatusCode::CREATED, Json(device)))
}

/// Deprovision a device and delete its history.
///
/// Deleting a device that has no store succeeds, so a failed call can be retried.
async fn deprovision_device(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    let id = parse_device_id(&id)?;
    with_registry(&state, move |registry| Ok(registry.remove(&id)?)).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Ingest one reading for a device.
///
/// Returns `201` with the stored reading, or `202` when the reading was a
/// boot artifact and was discarded.
async fn ingest_reading(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(request): Json<IngestRequest>,
) -> Result<axum::response::Response, AppError> {
    let id = parse_device_id(&id)?;
    let ingestor = state.ingestor();
    let outcome = tokio::task::spawn_blocking(move || ingestor.ingest(&id, request))
        .await
        .map_err(|e| AppError::Internal(format!("Storage task failed: {}", e)))??;

    Ok(match outcome {
        IngestOutcome::Stored(reading) => (StatusCode::CREATED, Json(reading)).into_response(),
        IngestOutcome::Dropped => (
            StatusCode::ACCEPTED,
            Json(serde_json::json!({ "dropped": true })),
        )
            .into_response(),
    })
}

/// Get the latest reading for a device.
async fn get_current_reading(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Reading>, AppError> {
    let id = parse_device_id(&id)?;
    let reading = with_registry(&state, move |registry| {
        registry.latest(&id).map_err(|e| {
            if e.is_no_data_yet() {
                AppError::NoData(format!("No readings yet for device {}", id))
            } else {
                e.into()
            }
        })
    })
    .await?;
    Ok(Json(reading))
}

/// Query parameters for ranged readings.
#[derive(Debug, Deserialize, Default)]
pub struct RangeQuery {
    /// Trailing window in minutes.
    pub minutes: Option<u32>,
}

/// Downsampled readings over a trailing window.
#[derive(Debug, Serialize)]
pub struct RangeResponse {
    /// The window actually queried, in minutes.
    pub minutes: u32,
    /// Number of readings returned.
    pub count: usize,
    /// Readings, oldest first.
    pub data: Vec<Reading>,
}

/// Get the readings of the last `minutes`, downsampled for charting.
///
/// A missing or out-of-range `minutes` uses the configured default window.
/// An unknown device yields an empty list.
async fn get_readings(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Query(params): Query<RangeQuery>,
) -> Result<Json<RangeResponse>, AppError> {
    let id = parse_device_id(&id)?;
    let minutes = state.config.sampling.resolve_window(params.minutes);

    let data = with_registry(&state, move |registry| {
        match registry.range(&id, minutes) {
            Ok(readings) => Ok(readings),
            Err(co2sense_store::Error::NotFound(_)) => Ok(Vec::new()),
            Err(e) => Err(e.into()),
        }
    })
    .await?;

    Ok(Json(RangeResponse {
        minutes,
        count: data.len(),
        data,
    }))
}

/// Application error type.
#[derive(Debug)]
pub enum AppError {
    NotFound(String),
    /// The device has no readings to show yet.
    NoData(String),
    BadRequest(String),
    Store(co2sense_store::Error),
    Internal(String),
}

impl From<co2sense_store::Error> for AppError {
    fn from(e: co2sense_store::Error) -> Self {
        match e {
            co2sense_store::Error::NotFound(_) => AppError::NotFound(e.to_string()),
            co2sense_store::Error::NoData(_) => AppError::NoData(e.to_string()),
            other => AppError::Store(other),
        }
    }
}

impl From<IngestError> for AppError {
    fn from(e: IngestError) -> Self {
        match e {
            IngestError::Invalid(e) => AppError::BadRequest(e.to_string()),
            IngestError::Store(e) => e.into(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let (status, body) = match self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, serde_json::json!({ "error": msg })),
            AppError::NoData(msg) => (
                StatusCode::NOT_FOUND,
                serde_json::json!({ "error": msg, "no_data": true }),
            ),
            AppError::BadRequest(msg) => {
                (StatusCode::BAD_REQUEST, serde_json::json!({ "error": msg }))
            }
            AppError::Store(e) => {
                tracing::error!("Storage error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    serde_json::json!({ "error": e.to_string() }),
                )
            }
            AppError::Internal(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                serde_json::json!({ "error": msg }),
            ),
        };

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use co2sense_types::now_millis;
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    use crate::config::Config;

    fn create_test_state() -> (tempfile::TempDir, Arc<AppState>) {
        let temp_dir = tempfile::tempdir().unwrap();
        let config = Config::default();
        let registry = Arc::new(Registry::with_policy(
            temp_dir.path(),
            config.sampling.downsample(),
        ));
        (temp_dir, AppState::new(registry, config))
    }

    fn reading(device: &DeviceId, timestamp: i64, co2: f64) -> Reading {
        Reading::builder(device.clone(), "alice")
            .timestamp(timestamp)
            .co2(co2)
            .temperature(21.0)
            .humidity(45.0)
            .build()
    }

    async fn response_body(response: axum::response::Response) -> String {
        let body = response.into_body();
        let bytes = body.collect().await.unwrap().to_bytes();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    async fn send(
        state: &Arc<AppState>,
        method: &str,
        uri: &str,
        body: Option<serde_json::Value>,
    ) -> (StatusCode, serde_json::Value) {
        let app = router().with_state(Arc::clone(state));
        let builder = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(json) => builder
                .header("content-type", "application/json")
                .body(Body::from(serde_json::to_string(&json).unwrap()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let body = response_body(response).await;
        let json = if body.is_empty() {
            serde_json::Value::Null
        } else {
            serde_json::from_str(&body).unwrap()
        };
        (status, json)
    }

    #[tokio::test]
    async fn test_health_endpoint() {
        let (_dir, state) = create_test_state();
        state.registry.create(&DeviceId::new_v4()).unwrap();

        let (status, json) = send(&state, "GET", "/api/health", None).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["status"], "ok");
        assert!(json["version"].is_string());
        assert!(json["timestamp"].is_string());
        assert_eq!(json["devices"], 1);
    }

    #[tokio::test]
    async fn test_list_devices_empty() {
        let (_dir, state) = create_test_state();
        let (status, json) = send(&state, "GET", "/api/devices", None).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json, serde_json::json!([]));
    }

    #[tokio::test]
    async fn test_provision_and_list() {
        let (dir, state) = create_test_state();

        let (status, json) = send(&state, "POST", "/api/devices", None).await;
        assert_eq!(status, StatusCode::CREATED);
        let id = json["id"].as_str().unwrap().to_string();
        assert!(co2sense_types::is_valid_device_id(&id));
        assert_eq!(json["reading_count"], 0);
        assert!(dir.path().join(&id).is_dir());

        let (status, json) = send(&state, "GET", "/api/devices", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json[0]["id"], id.as_str());

        let (status, json) = send(&state, "GET", &format!("/api/devices/{}", id), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["reading_count"], 0);
    }

    #[tokio::test]
    async fn test_invalid_device_id_is_bad_request() {
        let (_dir, state) = create_test_state();

        for (method, uri) in [
            ("GET", "/api/devices/not-a-device"),
            ("DELETE", "/api/devices/not-a-device"),
            ("GET", "/api/devices/not-a-device/current"),
            ("GET", "/api/devices/not-a-device/readings"),
        ] {
            let (status, json) = send(&state, method, uri, None).await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "{} {}", method, uri);
            assert!(json["error"].is_string());
        }
    }

    #[tokio::test]
    async fn test_get_unknown_device_not_found() {
        let (_dir, state) = create_test_state();
        let uri = format!("/api/devices/{}", DeviceId::new_v4());

        let (status, json) = send(&state, "GET", &uri, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(json["error"].as_str().unwrap().contains("No store"));
        assert!(json.get("no_data").is_none());
    }

    #[tokio::test]
    async fn test_current_reading_no_data_yet() {
        let (_dir, state) = create_test_state();

        // Unknown device and empty store look the same.
        let unknown = DeviceId::new_v4();
        let (status, json) =
            send(&state, "GET", &format!("/api/devices/{}/current", unknown), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(json["no_data"], true);

        let empty = DeviceId::new_v4();
        state.registry.create(&empty).unwrap();
        let (status, json) =
            send(&state, "GET", &format!("/api/devices/{}/current", empty), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(json["no_data"], true);
    }

    #[tokio::test]
    async fn test_ingest_and_current() {
        let (_dir, state) = create_test_state();
        let device = DeviceId::new_v4();
        state.registry.create(&device).unwrap();
        let mut events = state.readings_tx.subscribe();

        let body = serde_json::json!({
            "owner": "alice",
            "co2": 742.0,
            "temperature": 22.5,
            "humidity": 41.0
        });
        let (status, json) = send(
            &state,
            "POST",
            &format!("/api/devices/{}/readings", device),
            Some(body),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(json["co2"], 742.0);
        assert_eq!(json["device_id"], device.as_str());

        let event = events.recv().await.unwrap();
        assert_eq!(event.device_id, device);

        let (status, json) =
            send(&state, "GET", &format!("/api/devices/{}/current", device), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["co2"], 742.0);
        assert_eq!(json["owner"], "alice");
    }

    #[tokio::test]
    async fn test_ingest_boot_artifact_is_accepted_not_stored() {
        let (_dir, state) = create_test_state();
        let device = DeviceId::new_v4();
        state.registry.create(&device).unwrap();

        let body = serde_json::json!({
            "owner": "alice",
            "co2": 0,
            "temperature": 22.5,
            "humidity": 41.0
        });
        let (status, json) = send(
            &state,
            "POST",
            &format!("/api/devices/{}/readings", device),
            Some(body),
        )
        .await;
        assert_eq!(status, StatusCode::ACCEPTED);
        assert_eq!(json["dropped"], true);
        assert_eq!(state.registry.handle(&device).unwrap().count().unwrap(), 0);
    }

    #[tokio::test]
    async fn test_ingest_unprovisioned_device() {
        let (_dir, state) = create_test_state();
        let device = DeviceId::new_v4();

        let body = serde_json::json!({
            "owner": "alice",
            "co2": 600,
            "temperature": 22.5,
            "humidity": 41.0
        });
        let (status, json) = send(
            &state,
            "POST",
            &format!("/api/devices/{}/readings", device),
            Some(body),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(json.get("no_data").is_none());
        assert!(state.registry.handle(&device).is_err());
    }

    #[tokio::test]
    async fn test_ingest_invalid_values() {
        let (_dir, state) = create_test_state();
        let device = DeviceId::new_v4();
        state.registry.create(&device).unwrap();

        let body = serde_json::json!({
            "owner": "alice",
            "co2": -5,
            "temperature": 22.5,
            "humidity": 41.0
        });
        let (status, json) = send(
            &state,
            "POST",
            &format!("/api/devices/{}/readings", device),
            Some(body),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(json["error"].as_str().unwrap().contains("co2"));
    }

    #[tokio::test]
    async fn test_ingest_missing_field() {
        let (_dir, state) = create_test_state();
        let device = DeviceId::new_v4();
        state.registry.create(&device).unwrap();

        let app = router().with_state(Arc::clone(&state));
        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri(format!("/api/devices/{}/readings", device))
                    .header("content-type", "application/json")
                    .body(Body::from(r#"{"owner": "alice", "co2": 500}"#))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert!(response.status().is_client_error());
    }

    #[tokio::test]
    async fn test_readings_unknown_device_is_empty() {
        let (_dir, state) = create_test_state();
        let uri = format!("/api/devices/{}/readings?minutes=60", DeviceId::new_v4());

        let (status, json) = send(&state, "GET", &uri, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["minutes"], 60);
        assert_eq!(json["count"], 0);
        assert_eq!(json["data"], serde_json::json!([]));
    }

    #[tokio::test]
    async fn test_readings_window() {
        let (_dir, state) = create_test_state();
        let device = DeviceId::new_v4();
        state.registry.create(&device).unwrap();

        let now = now_millis();
        state
            .registry
            .append(&device, &reading(&device, now - 8 * 60_000, 500.0))
            .unwrap();
        state
            .registry
            .append(&device, &reading(&device, now - 60_000, 600.0))
            .unwrap();

        // Default window is 10 minutes.
        let uri = format!("/api/devices/{}/readings", device);
        let (status, json) = send(&state, "GET", &uri, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["minutes"], 10);
        assert_eq!(json["count"], 2);
        assert_eq!(json["data"][0]["co2"], 500.0);
        assert_eq!(json["data"][1]["co2"], 600.0);

        let uri = format!("/api/devices/{}/readings?minutes=5", device);
        let (_, json) = send(&state, "GET", &uri, None).await;
        assert_eq!(json["minutes"], 5);
        assert_eq!(json["count"], 1);
        assert_eq!(json["data"][0]["co2"], 600.0);

        // Above the maximum falls back to the default.
        let uri = format!("/api/devices/{}/readings?minutes=20000", device);
        let (_, json) = send(&state, "GET", &uri, None).await;
        assert_eq!(json["minutes"], 10);
        assert_eq!(json["count"], 2);
    }

    #[tokio::test]
    async fn test_readings_are_downsampled() {
        let (_dir, state) = create_test_state();
        let device = DeviceId::new_v4();
        state.registry.create(&device).unwrap();

        let now = now_millis();
        let store = state.registry.handle(&device).unwrap();
        for i in 0..720 {
            store
                .append(&reading(&device, now - i * 10_000, 400.0 + i as f64))
                .unwrap();
        }

        let uri = format!("/api/devices/{}/readings?minutes=120", device);
        let (status, json) = send(&state, "GET", &uri, None).await;
        assert_eq!(status, StatusCode::OK);
        let data = json["data"].as_array().unwrap();
        assert_eq!(data.len(), 60);
        let timestamps: Vec<i64> = data.iter().map(|r| r["timestamp"].as_i64().unwrap()).collect();
        assert!(timestamps.windows(2).all(|w| w[0] < w[1]));
    }

    #[tokio::test]
    async fn test_deprovision_device() {
        let (dir, state) = create_test_state();
        let device = DeviceId::new_v4();
        state.registry.create(&device).unwrap();
        state
            .registry
            .append(&device, &reading(&device, now_millis(), 700.0))
            .unwrap();

        let uri = format!("/api/devices/{}", device);
        let (status, _) = send(&state, "DELETE", &uri, None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        assert!(!dir.path().join(device.as_str()).exists());
        assert!(state.registry.is_empty());

        // Retrying is harmless.
        let (status, _) = send(&state, "DELETE", &uri, None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
    }

    #[tokio::test]
    async fn test_full_device_lifecycle() {
        let (_dir, state) = create_test_state();

        // 1. Provision
        let (status, json) = send(&state, "POST", "/api/devices", None).await;
        assert_eq!(status, StatusCode::CREATED);
        let id = json["id"].as_str().unwrap().to_string();

        // 2. Ingest
        for co2 in [500.0, 510.0, 520.0] {
            let body = serde_json::json!({
                "owner": "carol",
                "co2": co2,
                "temperature": 20.0,
                "humidity": 50.0
            });
            let (status, _) = send(
                &state,
                "POST",
                &format!("/api/devices/{}/readings", id),
                Some(body),
            )
            .await;
            assert_eq!(status, StatusCode::CREATED);
            // Readings are keyed by millisecond.
            tokio::time::sleep(std::time::Duration::from_millis(2)).await;
        }

        // 3. Query
        let (_, json) = send(&state, "GET", &format!("/api/devices/{}/current", id), None).await;
        assert_eq!(json["co2"], 520.0);
        let (_, json) = send(&state, "GET", &format!("/api/devices/{}/readings", id), None).await;
        assert_eq!(json["count"], 3);

        // 4. Deprovision
        let (status, _) = send(&state, "DELETE", &format!("/api/devices/{}", id), None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);

        // 5. Everything reads as "no data yet"
        let (status, json) =
            send(&state, "GET", &format!("/api/devices/{}/current", id), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(json["no_data"], true);
        let (_, json) = send(&state, "GET", &format!("/api/devices/{}/readings", id), None).await;
        assert_eq!(json["count"], 0);
    }

    #[tokio::test]
    async fn test_concurrent_api_requests() {
        let (_dir, state) = create_test_state();
        let devices: Vec<DeviceId> = (0..4).map(|_| DeviceId::new_v4()).collect();
        for d in &devices {
            state.registry.create(d).unwrap();
        }

        let mut handles = Vec::new();
        for device in devices.clone() {
            let state = Arc::clone(&state);
            handles.push(tokio::spawn(async move {
                let body = serde_json::json!({
                    "owner": "dave",
                    "co2": 800,
                    "temperature": 20.0,
                    "humidity": 50.0
                });
                let (status, _) = send(
                    &state,
                    "POST",
                    &format!("/api/devices/{}/readings", device),
                    Some(body),
                )
                .await;
                assert_eq!(status, StatusCode::CREATED);
            }));
        }

        for handle in handles {
            handle.await.unwrap();
        }

        for d in &devices {
            assert_eq!(state.registry.latest(d).unwrap().co2, 800.0);
        }
    }

    #[test]
    fn test_app_error_no_data() {
        let response = AppError::NoData("nothing yet".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_app_error_from_store_error() {
        let id = DeviceId::new_v4();
        assert!(matches!(
            AppError::from(co2sense_store::Error::NotFound(id.clone())),
            AppError::NotFound(_)
        ));
        assert!(matches!(
            AppError::from(co2sense_store::Error::NoData(id)),
            AppError::NoData(_)
        ));
        let io = co2sense_store::Error::Io {
            path: "/data".into(),
            source: std::io::Error::other("disk on fire"),
        };
        let response = AppError::from(io).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_app_error_bad_request() {
        let response = AppError::BadRequest("bad".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_range_query_default() {
        let query = RangeQuery::default();
        assert!(query.minutes.is_none());
    }
}
