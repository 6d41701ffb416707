use std::sync::Arc;

use axum::{extract::rejection::JsonRejection, extract::State, Json};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::server::api_error::{CreateFailure, VerifyFailure};
use crate::server::database::Database;
use crate::server::licensing::{create_license, verify_license};
use crate::server::logging::HealthResponse;

/// Shared application state for handlers.
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<Database>,
}

/// Request body for `POST /api/verify-license`.
#[derive(Debug, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyRequest {
    #[serde(default)]
    pub license_key: Option<String>,
    /// Hardware identifier of the calling machine. Optional.
    #[serde(default)]
    pub hwid: Option<String>,
}

/// Successful verification.
#[derive(Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyResponse {
    pub valid: bool,
    pub expires_at: String,
    pub message: String,
}

/// Request body for `POST /api/create-license`.
#[derive(Debug, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateLicenseRequest {
    #[serde(default)]
    pub license_key: Option<String>,
    #[serde(default)]
    pub expires_at: Option<String>,
}

/// Successful creation.
#[derive(Debug, Deserialize, Serialize)]
pub struct CreateLicenseResponse {
    pub message: String,
}

/// Read a JSON body, treating an unreadable one as carrying no fields.
///
/// A missing content type, an empty body or a field of the wrong type then
/// fails the same presence checks as an omitted field.
fn body_or_default<T: Default>(payload: Result<Json<T>, JsonRejection>) -> T {
    match payload {
        Ok(Json(body)) => body,
        Err(rejection) => {
            warn!("Unreadable request body, treating as empty: {rejection}");
            T::default()
        }
    }
}

/// Handler for verifying a license.
///
/// Binds the presented `hwid` to the license if it is not bound yet.
/// Every rejection carries a distinct message; storage failures become 500.
pub async fn verify_license_handler(
    State(state): State<AppState>,
    payload: Result<Json<VerifyRequest>, JsonRejection>,
) -> Result<Json<VerifyResponse>, VerifyFailure> {
    let payload = body_or_default(payload);

    info!(
        "Verifying license_key={:?} hwid={:?}",
        payload.license_key, payload.hwid
    );

    let verification = verify_license(
        &state.db,
        payload.license_key.as_deref(),
        payload.hwid.as_deref(),
    )
    .await?;

    Ok(Json(VerifyResponse {
        valid: true,
        expires_at: verification.expires_at.unwrap_or_default(),
        message: "License is valid".to_string(),
    }))
}

/// Handler for creating a license.
///
/// Not authenticated: restrict access to this route at the network level.
pub async fn create_license_handler(
    State(state): State<AppState>,
    payload: Result<Json<CreateLicenseRequest>, JsonRejection>,
) -> Result<Json<CreateLicenseResponse>, CreateFailure> {
    let payload = body_or_default(payload);

    info!("Creating license_key={:?}", payload.license_key);

    create_license(
        &state.db,
        payload.license_key.as_deref(),
        payload.expires_at.as_deref(),
    )
    .await?;

    Ok(Json(CreateLicenseResponse {
        message: "License created successfully".to_string(),
    }))
}

/// Handler for `GET /health`.
pub async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    let connected = state.db.ping().await;
    Json(HealthResponse::new(connected, state.db.db_type()))
}
