/// Order model and database operations
///
/// An order records that a user purchased an app. A user can buy a given
/// app once, and only while the app is verified.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE orders (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     owner_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
///     app_id UUID NOT NULL REFERENCES apps(id) ON DELETE CASCADE,
///     purchase_date DATE NOT NULL DEFAULT CURRENT_DATE,
///     CONSTRAINT unique_owner_app_order UNIQUE (owner_id, app_id)
/// );
/// ```
///
/// # Example
///
/// ```no_run
/// use appstore_shared::models::order::{Order, OrderError};
/// use sqlx::PgPool;
/// use uuid::Uuid;
///
/// # async fn example(pool: PgPool, buyer: Uuid, app_id: Uuid) -> Result<(), Box<dyn std::error::Error>> {
/// match Order::create(&pool, buyer, app_id).await {
///     Ok(order) => println!("Purchased on {}", order.purchase_date),
///     Err(OrderError::AppNotPurchasable(status)) => println!("App is {}", status),
///     Err(e) => return Err(e.into()),
/// }
/// # Ok(())
/// # }
/// ```

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use tracing::{info, warn};
use uuid::Uuid;

use super::app::VerificationStatus;
use super::is_unique_violation;

/// Errors raised when placing an order
#[derive(Debug, thiserror::Error)]
pub enum OrderError {
    /// The referenced app doesn't exist
    #[error("App {0} does not exist")]
    AppNotFound(Uuid),

    /// The app is pending or rejected
    #[error("This app cannot be purchased until it is verified.")]
    AppNotPurchasable(VerificationStatus),

    /// The buyer already owns an order for this app
    #[error("You have already purchased this app.")]
    AlreadyPurchased,

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// A purchase of one app by one user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Order {
    pub id: Uuid,

    /// The purchaser
    pub owner_id: Uuid,

    pub app_id: Uuid,

    /// Day the order was placed; never changes
    pub purchase_date: NaiveDate,
}

impl Order {
    /// Places an order for a verified app
    ///
    /// The app row is share-locked while the order is inserted, so a staff
    /// status change can't slip between the check and the insert.
    ///
    /// # Errors
    ///
    /// - `OrderError::AppNotFound` if `app_id` is unknown
    /// - `OrderError::AppNotPurchasable` unless the app is verified
    /// - `OrderError::AlreadyPurchased` if the buyer already ordered it
    pub async fn create(pool: &PgPool, owner_id: Uuid, app_id: Uuid) -> Result<Self, OrderError> {
        let mut tx = pool.begin().await?;

        let status: Option<VerificationStatus> = sqlx::query_scalar(
            "SELECT verification_status FROM apps WHERE id = $1 FOR SHARE",
        )
        .bind(app_id)
        .fetch_optional(&mut *tx)
        .await?;

        let status = status.ok_or(OrderError::AppNotFound(app_id))?;
        if !status.is_purchasable() {
            warn!(%app_id, %owner_id, %status, "Rejected order for unverified app");
            return Err(OrderError::AppNotPurchasable(status));
        }

        let order = sqlx::query_as::<_, Order>(
            r#"
            INSERT INTO orders (owner_id, app_id)
            VALUES ($1, $2)
            RETURNING id, owner_id, app_id, purchase_date
            "#,
        )
        .bind(owner_id)
        .bind(app_id)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| {
            if is_unique_violation(&e, "unique_owner_app_order") {
                OrderError::AlreadyPurchased
            } else {
                OrderError::Database(e)
            }
        })?;

        tx.commit().await?;

        info!(order_id = %order.id, %app_id, %owner_id, "Order placed");
        Ok(order)
    }

    /// Finds an order only if it belongs to `owner_id`
    pub async fn find_for_owner(
        pool: &PgPool,
        id: Uuid,
        owner_id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Order>(
            r#"
            SELECT id, owner_id, app_id, purchase_date
            FROM orders
            WHERE id = $1 AND owner_id = $2
            "#,
        )
        .bind(id)
        .bind(owner_id)
        .fetch_optional(pool)
        .await
    }

    /// Lists a user's orders, most recent purchase first
    pub async fn list_by_owner(pool: &PgPool, owner_id: Uuid) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Order>(
            r#"
            SELECT id, owner_id, app_id, purchase_date
            FROM orders
            WHERE owner_id = $1
            ORDER BY purchase_date DESC, id
            "#,
        )
        .bind(owner_id)
        .fetch_all(pool)
        .await
    }

    /// Deletes an order on behalf of its owner
    ///
    /// Returns false when nothing was deleted, including when the order
    /// belongs to someone else.
    pub async fn delete(pool: &PgPool, id: Uuid, owner_id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM orders WHERE id = $1 AND owner_id = $2")
            .bind(id)
            .bind(owner_id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Counts orders placed for an app
    pub async fn count_for_app(pool: &PgPool, app_id: Uuid) -> Result<i64, sqlx::Error> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM orders WHERE app_id = $1")
            .bind(app_id)
            .fetch_one(pool)
            .await?;

        Ok(count)
    }
}
