/// Staff verification workflow
///
/// - `POST /v1/admin/apps/verify` - Bulk "verify selected"
/// - `PUT /v1/admin/apps/:id/status` - Set an app's status directly
///
/// Both require a staff token; anyone else gets 403.

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    extract::{AppJson, AppPath},
    routes::apps::AppDetail,
};
use appstore_shared::{
    auth::{authorization::require_staff, middleware::AuthContext},
    models::app::{App, VerificationStatus},
};
use axum::{extract::State, Extension, Json};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

#[derive(Debug, Deserialize)]
pub struct VerifyAppsRequest {
    pub ids: Vec<Uuid>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct VerifyAppsResponse {
    /// Apps verified by this call; previously verified ones don't count
    pub verified: u64,
}

#[derive(Debug, Deserialize)]
pub struct SetStatusRequest {
    pub verification_status: VerificationStatus,
}

/// Verifies the selected apps, skipping any verified before
pub async fn verify_apps(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    AppJson(req): AppJson<VerifyAppsRequest>,
) -> ApiResult<Json<VerifyAppsResponse>> {
    require_staff(&auth)?;

    let verified = App::verify_many(&state.db, &req.ids).await?;

    info!(staff_id = %auth.user_id, verified, "{} app(s) verified successfully", verified);
    Ok(Json(VerifyAppsResponse { verified }))
}

/// Sets an app's status; the first move into `verified` stamps `verified_at`
pub async fn set_app_status(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    AppPath(id): AppPath<Uuid>,
    AppJson(req): AppJson<SetStatusRequest>,
) -> ApiResult<Json<AppDetail>> {
    require_staff(&auth)?;

    let app = App::update_status(&state.db, id, req.verification_status)
        .await?
        .ok_or_else(ApiError::not_found)?;

    Ok(Json(app.into()))
}
