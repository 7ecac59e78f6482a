/// Order endpoints
///
/// - `GET /v1/orders` - The caller's orders
/// - `POST /v1/orders` - Purchase a verified app
/// - `GET /v1/orders/:id` - One of the caller's orders
/// - `DELETE /v1/orders/:id` - Delete one of the caller's orders
///
/// Other users' orders are invisible: every lookup is scoped to the caller
/// and misses report 404.

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    extract::{AppJson, AppPath},
};
use appstore_shared::{auth::middleware::AuthContext, models::order::Order};
use axum::{extract::State, http::StatusCode, Extension, Json};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

#[derive(Debug, Serialize, Deserialize)]
pub struct OrderResponse {
    pub id: Uuid,
    pub owner: Uuid,
    pub app: Uuid,
    pub purchase_date: NaiveDate,
}

impl From<Order> for OrderResponse {
    fn from(order: Order) -> Self {
        Self {
            id: order.id,
            owner: order.owner_id,
            app: order.app_id,
            purchase_date: order.purchase_date,
        }
    }
}

/// Create request; `owner` and `purchase_date` are set by the server
#[derive(Debug, Deserialize)]
pub struct CreateOrderRequest {
    pub app: Uuid,
}

pub async fn list_orders(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<Json<Vec<OrderResponse>>> {
    let orders = Order::list_by_owner(&state.db, auth.user_id).await?;
    Ok(Json(orders.into_iter().map(OrderResponse::from).collect()))
}

/// Purchases an app for the caller
///
/// # Errors
///
/// - `400`: App unknown, not verified, or already purchased by the caller
pub async fn create_order(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    AppJson(req): AppJson<CreateOrderRequest>,
) -> ApiResult<(StatusCode, Json<OrderResponse>)> {
    let order = Order::create(&state.db, auth.user_id, req.app).await?;
    Ok((StatusCode::CREATED, Json(order.into())))
}

pub async fn get_order(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    AppPath(id): AppPath<Uuid>,
) -> ApiResult<Json<OrderResponse>> {
    let order = Order::find_for_owner(&state.db, id, auth.user_id)
        .await?
        .ok_or_else(ApiError::not_found)?;

    Ok(Json(order.into()))
}

pub async fn delete_order(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    AppPath(id): AppPath<Uuid>,
) -> ApiResult<StatusCode> {
    if !Order::delete(&state.db, id, auth.user_id).await? {
        return Err(ApiError::not_found());
    }

    info!(order_id = %id, user_id = %auth.user_id, "Order deleted");
    Ok(StatusCode::NO_CONTENT)
}
