use axum::{Json, extract::State, extract::rejection::JsonRejection};
use json::{Value, json};

use crate::{
  prelude::*,
  state::{AppState, SERVICE_NAME},
  sv::{Decision, ValidateReq},
};

/// Every decision, allowed or denied, is a 200. Only malformed requests
/// (400) and store failures (500) leave that shape.
pub async fn validate_license(
  State(app): State<Arc<AppState>>,
  body: std::result::Result<Json<ValidateReq>, JsonRejection>,
) -> Result<Json<Decision>> {
  let Json(req) = body.map_err(|rejection| {
    debug!("Rejected request body: {rejection}");
    Error::bad_request(rejection.body_text())
  })?;

  Ok(Json(app.admission.validate(&req).await?))
}

pub async fn health() -> Json<Value> {
  Json(json!({ "status": "ok", "service": SERVICE_NAME }))
}

#[cfg(test)]
mod tests {
  use axum::{
    body::{Body, to_bytes},
    http::{Request, StatusCode, header},
  };
  use tower::ServiceExt;

  use super::*;
  use crate::{
    entity::{device, license},
    prelude::*,
    plugins::server::routes,
    state::Config,
  };

  const VALIDATE: &str = "/api/screen-watermark/validate-license";

  async fn setup() -> Arc<AppState> {
    let config =
      Config { database_url: "sqlite::memory:".into(), ..Config::default() };
    let app = AppState::new(config).await.unwrap();

    let now = Utc::now().naive_utc();
    for (key, status, seats) in
      [("L1", "active", 1), ("L2", "cancelled", 1), ("L3", "active", 1)]
    {
      license::ActiveModel {
        license_key: Set(key.into()),
        status: Set(status.into()),
        plan_type: Set("paid".into()),
        trial_expires_at: Set(None),
        seat_count: Set(seats),
        watermark_text: Set(format!("Licensed {key}")),
        created_at: Set(now),
      }
      .insert(&app.db)
      .await
      .unwrap();
    }

    Arc::new(app)
  }

  async fn post(app: &Arc<AppState>, body: &str) -> (StatusCode, Value) {
    let request = Request::builder()
      .method("POST")
      .uri(VALIDATE)
      .header(header::CONTENT_TYPE, "application/json")
      .body(Body::from(body.to_owned()))
      .unwrap();

    let response = routes(app.clone()).oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();

    (status, json::from_slice(&bytes).unwrap())
  }

  #[tokio::test]
  async fn test_health() {
    let app = setup().await;

    let request = Request::get("/health").body(Body::empty()).unwrap();
    let response = routes(app).oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body: Value = json::from_slice(&bytes).unwrap();
    assert_eq!(body, json!({ "status": "ok", "service": SERVICE_NAME }));
  }

  #[tokio::test]
  async fn test_missing_fields_is_bad_request() {
    let app = setup().await;

    let (status, body) = post(&app, r#"{"license_key":"L1"}"#).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
      body,
      json!({ "valid": false, "message": "Missing license_key or device_id" })
    );
  }

  #[tokio::test]
  async fn test_malformed_body_is_bad_request() {
    let app = setup().await;

    let (status, body) = post(&app, "{not json").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["valid"], json!(false));
    assert!(body["message"].is_string());
  }

  #[tokio::test]
  async fn test_denials_are_ok_responses() {
    let app = setup().await;

    let (status, body) =
      post(&app, r#"{"license_key":"nope","device_id":"d"}"#).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "valid": false, "message": "Invalid license key" }));

    let (status, body) =
      post(&app, r#"{"license_key":"L2","device_id":"d"}"#).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
      body,
      json!({ "valid": false, "message": "License has been cancelled" })
    );
  }

  #[tokio::test]
  async fn test_activation_flow() {
    let app = setup().await;

    let (status, body) = post(
      &app,
      r#"{"license_key":"L1","device_id":"deviceA","watermark_text":"WM-A"}"#,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
      body,
      json!({
        "valid": true,
        "message": "Device activated successfully",
        "watermark_text": "WM-A"
      })
    );

    let (status, body) = post(
      &app,
      r#"{"license_key":"L1","device_id":"deviceA","watermark_text":"WM-B"}"#,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
      body,
      json!({
        "valid": true,
        "message": "Device authorized",
        "watermark_text": "Licensed L1"
      })
    );

    let (status, body) = post(
      &app,
      r#"{"license_key":"L1","device_id":"deviceB","watermark_text":"WM-C"}"#,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
      body,
      json!({
        "valid": false,
        "message": "No available seats. Please contact support to add more seats."
      })
    );

    let rows = device::Entity::find()
      .filter(device::Column::LicenseKey.eq("L1"))
      .all(&app.db)
      .await
      .unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].watermark_text, "WM-A");
  }

  #[tokio::test]
  async fn test_new_device_without_watermark() {
    let app = setup().await;

    let (status, body) =
      post(&app, r#"{"license_key":"L3","device_id":"d"}"#).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
      body,
      json!({
        "valid": false,
        "message": "watermark_text required for new device activation"
      })
    );
  }

  #[tokio::test]
  async fn test_store_failure_is_server_error() {
    let app = setup().await;
    app
      .db
      .execute_unprepared("DROP TABLE screen_active_devices")
      .await
      .unwrap();

    let (status, body) = post(
      &app,
      r#"{"license_key":"L1","device_id":"d","watermark_text":"WM"}"#,
    )
    .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, json!({ "valid": false, "message": "Server error" }));
  }
}
