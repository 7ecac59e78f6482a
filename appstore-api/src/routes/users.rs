/// User endpoints
///
/// - `POST /v1/users` - Register a new account
/// - `POST /v1/users/token` - Exchange email and password for a token
/// - `GET /v1/users/me` - The caller's profile
/// - `PUT|PATCH /v1/users/me` - Update email, name or password

use crate::{
    app::AppState,
    error::{ApiError, ApiResult, NON_FIELD_ERRORS},
    extract::AppJson,
};
use appstore_shared::{
    auth::{middleware::AuthContext, password},
    models::{
        auth_token::AuthToken,
        user::{UpdateUser, User},
    },
};
use axum::{extract::State, http::StatusCode, Extension, Json};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;
use validator::Validate;

/// Register request
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(email(message = "Enter a valid email address."))]
    pub email: String,

    pub password: String,

    #[serde(default)]
    #[validate(length(max = 255, message = "Ensure this field has no more than 255 characters."))]
    pub name: String,
}

/// Obtain-token request
#[derive(Debug, Deserialize)]
pub struct TokenRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TokenResponse {
    pub token: String,
}

/// Profile update; absent fields are left unchanged
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateMeRequest {
    #[validate(email(message = "Enter a valid email address."))]
    pub email: Option<String>,

    #[validate(length(max = 255, message = "Ensure this field has no more than 255 characters."))]
    pub name: Option<String>,

    pub password: Option<String>,
}

/// Public view of a user; never includes the password hash
#[derive(Debug, Serialize, Deserialize)]
pub struct UserResponse {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    pub is_staff: bool,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            email: user.email,
            name: user.name,
            is_staff: user.is_staff,
        }
    }
}

fn check_password(value: &str) -> ApiResult<()> {
    password::validate_password(value).map_err(|e| ApiError::field("password", e))
}

/// Registers a new user
///
/// The email's domain is lowercased before storing.
///
/// # Errors
///
/// - `400`: Invalid email, short password, or email already registered
pub async fn register(
    State(state): State<AppState>,
    AppJson(req): AppJson<RegisterRequest>,
) -> ApiResult<(StatusCode, Json<UserResponse>)> {
    req.validate()?;
    check_password(&req.password)?;

    let user = User::create_user(&state.db, &req.email, &req.password, &req.name).await?;

    Ok((StatusCode::CREATED, Json(user.into())))
}

/// Issues a new token for valid credentials, replacing the previous one
///
/// # Errors
///
/// - `400`: Unknown email, wrong password or inactive account. The three
///   cases share one message.
pub async fn obtain_token(
    State(state): State<AppState>,
    AppJson(req): AppJson<TokenRequest>,
) -> ApiResult<Json<TokenResponse>> {
    let Some(user) = User::authenticate(&state.db, &req.email, &req.password).await? else {
        warn!("Failed token request");
        return Err(ApiError::field(
            NON_FIELD_ERRORS,
            "Unable to log in with provided credentials.",
        ));
    };

    let (token, plaintext) = AuthToken::issue(&state.db, user.id).await?;
    User::update_last_login(&state.db, user.id).await?;

    info!(user_id = %user.id, key_prefix = %token.key_prefix, "Token issued");
    Ok(Json(TokenResponse { token: plaintext }))
}

/// Returns the caller's profile
pub async fn me(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<Json<UserResponse>> {
    let user = User::find_by_id(&state.db, auth.user_id)
        .await?
        .ok_or_else(ApiError::not_found)?;

    Ok(Json(user.into()))
}

/// Updates the caller's profile
///
/// A new password is hashed before storing; existing tokens stay valid.
pub async fn update_me(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    AppJson(req): AppJson<UpdateMeRequest>,
) -> ApiResult<Json<UserResponse>> {
    req.validate()?;
    if let Some(password) = &req.password {
        check_password(password)?;
    }

    let user = User::update(
        &state.db,
        auth.user_id,
        UpdateUser {
            email: req.email,
            password: req.password,
            name: req.name,
            is_active: None,
        },
    )
    .await?
    .ok_or_else(ApiError::not_found)?;

    Ok(Json(user.into()))
}
