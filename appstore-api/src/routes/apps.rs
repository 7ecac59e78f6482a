/// App endpoints
///
/// - `GET /v1/apps` - List all apps, newest first
/// - `POST /v1/apps` - List a new app owned by the caller
/// - `GET /v1/apps/:id` - App detail
/// - `PUT /v1/apps/:id` - Replace an app's editable fields (owner only)
/// - `PATCH /v1/apps/:id` - Partially update an app (owner only)
/// - `DELETE /v1/apps/:id` - Delete an app (owner only)
///
/// `owner` and `verification_status` are read-only: request bodies may carry
/// them but they are ignored. Writes by anyone but the owner report 404.

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    extract::{AppJson, AppPath},
};
use appstore_shared::{
    auth::middleware::AuthContext,
    models::app::{App, CreateApp, UpdateApp, VerificationStatus},
};
use axum::{extract::State, http::StatusCode, Extension, Json};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

/// List representation, without the description
#[derive(Debug, Serialize, Deserialize)]
pub struct AppSummary {
    pub id: Uuid,
    pub title: String,
    pub price: Decimal,
    pub owner: Uuid,
    pub verification_status: VerificationStatus,
}

/// Detail representation
#[derive(Debug, Serialize, Deserialize)]
pub struct AppDetail {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub price: Decimal,
    pub owner: Uuid,
    pub verification_status: VerificationStatus,
}

impl From<App> for AppSummary {
    fn from(app: App) -> Self {
        Self {
            id: app.id,
            title: app.title,
            price: app.price,
            owner: app.owner_id,
            verification_status: app.verification_status,
        }
    }
}

impl From<App> for AppDetail {
    fn from(app: App) -> Self {
        Self {
            id: app.id,
            title: app.title,
            description: app.description,
            price: app.price,
            owner: app.owner_id,
            verification_status: app.verification_status,
        }
    }
}

/// Create or full-replace request
#[derive(Debug, Deserialize)]
pub struct AppRequest {
    pub title: String,

    /// Required; kept optional here so a missing value is reported on its field
    pub description: Option<String>,

    pub price: Decimal,
}

impl AppRequest {
    fn description(&mut self) -> ApiResult<String> {
        self.description
            .take()
            .ok_or_else(|| ApiError::field("description", "This field is required."))
    }
}

/// Partial update request
#[derive(Debug, Default, Deserialize)]
pub struct PatchAppRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub price: Option<Decimal>,
}

pub async fn list_apps(State(state): State<AppState>) -> ApiResult<Json<Vec<AppSummary>>> {
    let apps = App::list(&state.db).await?;
    Ok(Json(apps.into_iter().map(AppSummary::from).collect()))
}

/// Creates a pending app owned by the caller
///
/// # Errors
///
/// - `400`: Blank or duplicate title, missing description, invalid price
pub async fn create_app(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    AppJson(mut req): AppJson<AppRequest>,
) -> ApiResult<(StatusCode, Json<AppSummary>)> {
    let description = req.description()?;
    let app = App::create(
        &state.db,
        CreateApp {
            title: req.title,
            description,
            price: req.price,
            owner_id: auth.user_id,
        },
    )
    .await?;

    Ok((StatusCode::CREATED, Json(app.into())))
}

pub async fn get_app(
    State(state): State<AppState>,
    AppPath(id): AppPath<Uuid>,
) -> ApiResult<Json<AppDetail>> {
    let app = App::find_by_id(&state.db, id)
        .await?
        .ok_or_else(ApiError::not_found)?;

    Ok(Json(app.into()))
}

pub async fn replace_app(
    state: State<AppState>,
    auth: Extension<AuthContext>,
    id: AppPath<Uuid>,
    AppJson(mut req): AppJson<AppRequest>,
) -> ApiResult<Json<AppDetail>> {
    let patch = PatchAppRequest {
        description: Some(req.description()?),
        title: Some(req.title),
        price: Some(req.price),
    };

    update_app(state, auth, id, AppJson(patch)).await
}

/// Updates the given fields of the caller's app
///
/// # Errors
///
/// - `400`: Blank or duplicate title, invalid price
/// - `404`: App doesn't exist or belongs to someone else
pub async fn update_app(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    AppPath(id): AppPath<Uuid>,
    AppJson(req): AppJson<PatchAppRequest>,
) -> ApiResult<Json<AppDetail>> {
    let app = App::update(
        &state.db,
        id,
        auth.user_id,
        UpdateApp {
            title: req.title,
            description: req.description,
            price: req.price,
        },
    )
    .await?
    .ok_or_else(ApiError::not_found)?;

    Ok(Json(app.into()))
}

/// Deletes the caller's app along with its orders
pub async fn delete_app(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    AppPath(id): AppPath<Uuid>,
) -> ApiResult<StatusCode> {
    if !App::delete(&state.db, id, auth.user_id).await? {
        return Err(ApiError::not_found());
    }

    info!(app_id = %id, user_id = %auth.user_id, "App deleted");
    Ok(StatusCode::NO_CONTENT)
}
