/// App model and verification lifecycle
///
/// An app is a listing owned by one user. Staff move it between three
/// verification states; only verified apps can be purchased.
///
/// # State Machine
///
/// ```text
/// pending  ⇄ rejected
///    ⇅        ⇅
///     verified
/// ```
///
/// Every transition is allowed. The first entry into `verified` stamps
/// `verified_at`; the stamp is never moved or cleared afterwards, whatever
/// the status does next.
///
/// # Schema
///
/// ```sql
/// CREATE TYPE verification_status AS ENUM ('pending', 'verified', 'rejected');
///
/// CREATE TABLE apps (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     title VARCHAR(255) NOT NULL UNIQUE,
///     description TEXT NOT NULL DEFAULT '',
///     price NUMERIC(10, 2) NOT NULL,
///     owner_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
///     verification_status verification_status NOT NULL DEFAULT 'pending',
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     verified_at TIMESTAMPTZ,
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```
///
/// # Example
///
/// ```no_run
/// use appstore_shared::models::app::{App, CreateApp, VerificationStatus};
/// use rust_decimal::Decimal;
/// use sqlx::PgPool;
/// use uuid::Uuid;
///
/// # async fn example(pool: PgPool, owner_id: Uuid) -> Result<(), Box<dyn std::error::Error>> {
/// let app = App::create(&pool, CreateApp {
///     title: "App 1".to_string(),
///     description: "A sample app".to_string(),
///     price: Decimal::new(1000, 2),
///     owner_id,
/// }).await?;
/// assert_eq!(app.verification_status, VerificationStatus::Pending);
///
/// let verified = App::verify_by_id(&pool, app.id).await?.expect("app exists");
/// assert!(verified.verified_at.is_some());
/// # Ok(())
/// # }
/// ```

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{PgPool, Postgres, Transaction};
use tracing::{debug, info};
use uuid::Uuid;

use super::is_unique_violation;

const APP_COLUMNS: &str = "id, title, description, price, owner_id, verification_status, \
                           created_at, verified_at, updated_at";

/// Longest accepted title, matching the column width
pub const MAX_TITLE_LENGTH: usize = 255;

/// Prices are stored as NUMERIC(10, 2)
pub const PRICE_DECIMAL_PLACES: u32 = 2;
pub const PRICE_MAX_DIGITS: u32 = 10;

/// Verification state of an app
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "verification_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum VerificationStatus {
    /// Waiting for staff review
    Pending,

    /// Approved; the app can be purchased
    Verified,

    /// Turned down by staff
    Rejected,
}

impl VerificationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            VerificationStatus::Pending => "pending",
            VerificationStatus::Verified => "verified",
            VerificationStatus::Rejected => "rejected",
        }
    }

    /// Whether orders may be placed for an app in this state
    pub fn is_purchasable(&self) -> bool {
        matches!(self, VerificationStatus::Verified)
    }
}

impl std::fmt::Display for VerificationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Computes `verified_at` after a status change
///
/// The stamp is set to `now` only when the status actually changes into
/// `Verified` and no stamp exists yet. In every other case the existing
/// value is returned untouched.
///
/// # Example
///
/// ```
/// use appstore_shared::models::app::{transition, VerificationStatus::*};
/// use chrono::Utc;
///
/// let now = Utc::now();
/// assert_eq!(transition(None, Pending, Verified, now), Some(now));
/// assert_eq!(transition(None, Pending, Rejected, now), None);
/// ```
pub fn transition(
    verified_at: Option<DateTime<Utc>>,
    old_status: VerificationStatus,
    new_status: VerificationStatus,
    now: DateTime<Utc>,
) -> Option<DateTime<Utc>> {
    match verified_at {
        None if old_status != new_status && new_status == VerificationStatus::Verified => Some(now),
        stamp => stamp,
    }
}

/// Errors raised by app operations
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Title may not be blank")]
    EmptyTitle,

    #[error("Title must be at most 255 characters")]
    TitleTooLong,

    #[error("An app with this title already exists")]
    DuplicateTitle,

    #[error("{0}")]
    InvalidPrice(String),

    #[error("Database error: {0}")]
    Database(sqlx::Error),
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        if is_unique_violation(&err, "apps_title_key") {
            AppError::DuplicateTitle
        } else {
            AppError::Database(err)
        }
    }
}

/// Checks a title before it is written
pub fn validate_title(title: &str) -> Result<(), AppError> {
    if title.trim().is_empty() {
        return Err(AppError::EmptyTitle);
    }
    if title.chars().count() > MAX_TITLE_LENGTH {
        return Err(AppError::TitleTooLong);
    }
    Ok(())
}

/// Checks a price against the NUMERIC(10, 2) column
///
/// Trailing zeros are ignored, so `10.000` is accepted as `10.00`.
pub fn validate_price(price: &Decimal) -> Result<(), AppError> {
    if price.is_sign_negative() && !price.is_zero() {
        return Err(AppError::InvalidPrice(
            "Ensure this value is greater than or equal to 0.".to_string(),
        ));
    }

    let normalized = price.normalize();
    if normalized.scale() > PRICE_DECIMAL_PLACES {
        return Err(AppError::InvalidPrice(format!(
            "Ensure that there are no more than {PRICE_DECIMAL_PLACES} decimal places."
        )));
    }

    let whole_digits = normalized.trunc().abs().to_string().trim_start_matches('0').len() as u32;
    if whole_digits > PRICE_MAX_DIGITS - PRICE_DECIMAL_PLACES {
        return Err(AppError::InvalidPrice(format!(
            "Ensure that there are no more than {PRICE_MAX_DIGITS} digits in total."
        )));
    }

    Ok(())
}

/// A marketplace listing
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct App {
    pub id: Uuid,

    /// Unique, non-empty title
    pub title: String,

    pub description: String,

    /// Non-negative price with two decimal places
    pub price: Decimal,

    /// User who listed the app
    pub owner_id: Uuid,

    pub verification_status: VerificationStatus,

    pub created_at: DateTime<Utc>,

    /// Set on the first entry into `verified`, then immutable
    pub verified_at: Option<DateTime<Utc>>,

    /// Refreshed on every save
    pub updated_at: DateTime<Utc>,
}

/// Input for creating an app; status always starts as `pending`
#[derive(Debug, Clone)]
pub struct CreateApp {
    pub title: String,
    pub description: String,
    pub price: Decimal,
    pub owner_id: Uuid,
}

/// Owner-editable fields; `None` leaves a field unchanged
///
/// Status, stamp and owner are deliberately absent.
#[derive(Debug, Clone, Default)]
pub struct UpdateApp {
    pub title: Option<String>,
    pub description: Option<String>,
    pub price: Option<Decimal>,
}

impl UpdateApp {
    pub fn validate(&self) -> Result<(), AppError> {
        if let Some(title) = &self.title {
            validate_title(title)?;
        }
        if let Some(price) = &self.price {
            validate_price(price)?;
        }
        Ok(())
    }
}

impl App {
    /// Applies a status change in memory, stamping `verified_at` if due
    pub fn set_status(&mut self, status: VerificationStatus, now: DateTime<Utc>) {
        self.verified_at = transition(self.verified_at, self.verification_status, status, now);
        self.verification_status = status;
    }

    /// Verifies the app unless it has been verified before
    ///
    /// Returns whether anything changed. An app that already carries a
    /// `verified_at` stamp is left alone, even if its status has since been
    /// moved back to pending or rejected.
    pub fn verify(&mut self, now: DateTime<Utc>) -> bool {
        if self.verified_at.is_some() {
            return false;
        }
        self.set_status(VerificationStatus::Verified, now);
        true
    }

    pub fn is_purchasable(&self) -> bool {
        self.verification_status.is_purchasable()
    }

    /// Creates a pending app
    ///
    /// # Errors
    ///
    /// - `AppError::EmptyTitle` / `TitleTooLong` for a bad title
    /// - `AppError::InvalidPrice` for a negative or over-precise price
    /// - `AppError::DuplicateTitle` if the title is taken
    pub async fn create(pool: &PgPool, data: CreateApp) -> Result<Self, AppError> {
        validate_title(&data.title)?;
        validate_price(&data.price)?;

        let app = sqlx::query_as::<_, App>(&format!(
            r#"
            INSERT INTO apps (title, description, price, owner_id)
            VALUES ($1, $2, $3, $4)
            RETURNING {APP_COLUMNS}
            "#
        ))
        .bind(data.title)
        .bind(data.description)
        .bind(data.price)
        .bind(data.owner_id)
        .fetch_one(pool)
        .await?;

        info!(app_id = %app.id, owner_id = %app.owner_id, "App created");
        Ok(app)
    }

    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, App>(&format!("SELECT {APP_COLUMNS} FROM apps WHERE id = $1"))
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Lists every app, newest first
    pub async fn list(pool: &PgPool) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, App>(&format!(
            "SELECT {APP_COLUMNS} FROM apps ORDER BY created_at DESC, id"
        ))
        .fetch_all(pool)
        .await
    }

    /// Updates an app on behalf of its owner
    ///
    /// Returns `None` when the app doesn't exist or belongs to someone else;
    /// callers report both cases the same way.
    pub async fn update(
        pool: &PgPool,
        id: Uuid,
        owner_id: Uuid,
        data: UpdateApp,
    ) -> Result<Option<Self>, AppError> {
        data.validate()?;

        let app = sqlx::query_as::<_, App>(&format!(
            r#"
            UPDATE apps
            SET title = COALESCE($3, title),
                description = COALESCE($4, description),
                price = COALESCE($5, price),
                updated_at = NOW()
            WHERE id = $1 AND owner_id = $2
            RETURNING {APP_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(owner_id)
        .bind(data.title)
        .bind(data.description)
        .bind(data.price)
        .fetch_optional(pool)
        .await?;

        if let Some(app) = &app {
            debug!(app_id = %app.id, "App updated");
        }
        Ok(app)
    }

    /// Deletes an app on behalf of its owner; orders for it go too
    ///
    /// Returns false when nothing was deleted, including when the caller
    /// isn't the owner.
    pub async fn delete(pool: &PgPool, id: Uuid, owner_id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM apps WHERE id = $1 AND owner_id = $2")
            .bind(id)
            .bind(owner_id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Sets the verification status, stamping `verified_at` on first entry
    /// into `verified`
    ///
    /// The row is locked for the duration, so concurrent purchases see
    /// either the old or the new status.
    pub async fn update_status(
        pool: &PgPool,
        id: Uuid,
        status: VerificationStatus,
    ) -> Result<Option<Self>, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let Some(mut app) = Self::lock(&mut tx, id).await? else {
            return Ok(None);
        };

        let previous = app.verification_status;
        app.set_status(status, Utc::now());
        let app = app.save_lifecycle(&mut tx).await?;

        tx.commit().await?;

        info!(
            app_id = %app.id,
            from = %previous,
            to = %app.verification_status,
            verified_at = ?app.verified_at,
            "App status changed"
        );
        Ok(Some(app))
    }

    /// Verifies one app; a no-op for apps verified before
    pub async fn verify_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let Some(mut app) = Self::lock(&mut tx, id).await? else {
            return Ok(None);
        };

        let app = if app.verify(Utc::now()) {
            let app = app.save_lifecycle(&mut tx).await?;
            info!(app_id = %app.id, "App verified");
            app
        } else {
            debug!(app_id = %app.id, "App already verified, skipping");
            app
        };

        tx.commit().await?;
        Ok(Some(app))
    }

    /// Bulk "verify selected" action
    ///
    /// Returns how many apps were newly verified. Unknown ids and apps
    /// verified before are skipped.
    pub async fn verify_many(pool: &PgPool, ids: &[Uuid]) -> Result<u64, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let apps = sqlx::query_as::<_, App>(&format!(
            "SELECT {APP_COLUMNS} FROM apps WHERE id = ANY($1) ORDER BY id FOR UPDATE"
        ))
        .bind(ids)
        .fetch_all(&mut *tx)
        .await?;

        let now = Utc::now();
        let mut count = 0;
        for mut app in apps {
            if app.verify(now) {
                app.save_lifecycle(&mut tx).await?;
                count += 1;
            }
        }

        tx.commit().await?;

        info!(requested = ids.len(), verified = count, "Bulk verification finished");
        Ok(count)
    }

    async fn lock(
        tx: &mut Transaction<'_, Postgres>,
        id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, App>(&format!(
            "SELECT {APP_COLUMNS} FROM apps WHERE id = $1 FOR UPDATE"
        ))
        .bind(id)
        .fetch_optional(&mut **tx)
        .await
    }

    /// Writes status and stamp; the stamp is only ever filled, never replaced
    async fn save_lifecycle(
        &self,
        tx: &mut Transaction<'_, Postgres>,
    ) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, App>(&format!(
            r#"
            UPDATE apps
            SET verification_status = $2,
                verified_at = COALESCE(verified_at, $3),
                updated_at = NOW()
            WHERE id = $1
            RETURNING {APP_COLUMNS}
            "#
        ))
        .bind(self.id)
        .bind(self.verification_status)
        .bind(self.verified_at)
        .fetch_one(&mut **tx)
        .await
    }

    pub async fn count(pool: &PgPool) -> Result<i64, sqlx::Error> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM apps")
            .fetch_one(pool)
            .await?;

        Ok(count)
    }
}
