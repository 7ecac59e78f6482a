/// Application state and router builder
///
/// # Example
///
/// ```no_run
/// use appstore_api::{app::AppState, config::Config};
/// use sqlx::PgPool;
///
/// # async fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// let pool = PgPool::connect(&config.database.url).await?;
/// let state = AppState::new(pool, config);
/// let app = appstore_api::app::build_router(state);
/// # Ok(())
/// # }
/// ```

use crate::{config::Config, error::ApiError, routes};
use appstore_shared::auth::middleware::authenticate;
use axum::{
    extract::{Request, State},
    http::{header, HeaderValue, Method},
    middleware::{self, Next},
    response::Response,
    routing::{get, post, put},
    Router,
};
use sqlx::PgPool;
use std::sync::Arc;
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

/// Shared application state
///
/// Cloned into every handler through Axum's `State` extractor.
#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,

    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(db: PgPool, config: Config) -> Self {
        Self {
            db,
            config: Arc::new(config),
        }
    }
}

/// Builds the complete Axum router with all routes and middleware
///
/// ```text
/// /
/// ├── GET  /health
/// └── /v1/
///     ├── POST /users                      register (public)
///     ├── POST /users/token                obtain token (public)
///     ├── GET|PUT|PATCH /users/me
///     ├── GET|POST /apps
///     ├── GET|PUT|PATCH|DELETE /apps/:id
///     ├── GET|POST /orders
///     ├── GET|DELETE /orders/:id
///     └── /admin/                          staff only
///         ├── POST /apps/verify
///         └── PUT  /apps/:id/status
/// ```
///
/// Everything under `/v1` except registration and token exchange goes
/// through [`token_auth_layer`].
pub fn build_router(state: AppState) -> Router {
    let health_routes = Router::new().route("/health", get(routes::health::health_check));

    let public_routes = Router::new()
        .route("/users", post(routes::users::register))
        .route("/users/token", post(routes::users::obtain_token));

    let protected_routes = Router::new()
        .route(
            "/users/me",
            get(routes::users::me)
                .put(routes::users::update_me)
                .patch(routes::users::update_me),
        )
        .route(
            "/apps",
            get(routes::apps::list_apps).post(routes::apps::create_app),
        )
        .route(
            "/apps/:id",
            get(routes::apps::get_app)
                .put(routes::apps::replace_app)
                .patch(routes::apps::update_app)
                .delete(routes::apps::delete_app),
        )
        .route(
            "/orders",
            get(routes::orders::list_orders).post(routes::orders::create_order),
        )
        .route(
            "/orders/:id",
            get(routes::orders::get_order).delete(routes::orders::delete_order),
        )
        .route("/admin/apps/verify", post(routes::admin::verify_apps))
        .route("/admin/apps/:id/status", put(routes::admin::set_app_status))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            token_auth_layer,
        ));

    let v1_routes = Router::new().merge(public_routes).merge(protected_routes);

    let cors = if state.config.allows_any_origin() {
        CorsLayer::permissive()
    } else {
        let origins: Vec<HeaderValue> = state
            .config
            .api
            .cors_origins
            .iter()
            .filter_map(|origin| origin.parse().ok())
            .collect();

        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods([
                Method::GET,
                Method::POST,
                Method::PUT,
                Method::PATCH,
                Method::DELETE,
                Method::OPTIONS,
            ])
            .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
            .max_age(std::time::Duration::from_secs(3600))
    };

    Router::new()
        .merge(health_routes)
        .nest("/v1", v1_routes)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(cors)
        .with_state(state)
}

/// Token authentication middleware layer
///
/// Resolves the `Authorization` header to an
/// [`AuthContext`](appstore_shared::auth::middleware::AuthContext) and
/// stores it in request extensions.
async fn token_auth_layer(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let auth_context = authenticate(&state.db, req.headers()).await?;

    tracing::debug!(user_id = %auth_context.user_id, "Request authenticated");
    req.extensions_mut().insert(auth_context);

    Ok(next.run(req).await)
}
