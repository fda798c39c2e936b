/// Application state and router builder
///
/// # Example
///
/// ```no_run
/// use gymtrack_api::{app::{AppState, build_router}, config::Config};
/// use gymtrack_worker::{ledger::PgBalanceLedger, supervisor::AccrualSupervisor};
/// use sqlx::PgPool;
/// use std::sync::Arc;
///
/// # async fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// let pool = PgPool::connect(&config.database.url).await?;
/// let accruals = AccrualSupervisor::new(
///     Arc::new(PgBalanceLedger::new(pool.clone())),
///     config.accrual.policy(),
/// );
///
/// let app = build_router(AppState::new(pool, config, accruals));
/// let listener = tokio::net::TcpListener::bind("0.0.0.0:10000").await?;
/// axum::serve(listener, app).await?;
/// # Ok(())
/// # }
/// ```

use crate::{
    config::Config,
    middleware::{auth::jwt_auth_layer, security::SecurityHeadersLayer},
    routes,
};
use axum::{
    extract::Request,
    http::{header, HeaderValue, Method},
    middleware::from_fn,
    middleware::from_fn_with_state,
    routing::{get, post, put},
    Router,
};
use gymtrack_shared::auth::middleware::require_admin;
use gymtrack_worker::supervisor::AccrualSupervisor;
use sqlx::PgPool;
use std::sync::Arc;
use std::time::Duration;
use tower_http::{cors::CorsLayer, trace::{DefaultOnResponse, TraceLayer}};
use tracing::Level;

/// Shared application state
///
/// Cloned for each request via Axum's `State` extractor.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool
    pub db: PgPool,

    /// Application configuration
    pub config: Arc<Config>,

    /// Running balance accrual loops, keyed by usage record
    pub accruals: AccrualSupervisor,
}

impl AppState {
    pub fn new(db: PgPool, config: Config, accruals: AccrualSupervisor) -> Self {
        Self {
            db,
            config: Arc::new(config),
            accruals,
        }
    }

    pub fn jwt_secret(&self) -> &str {
        &self.config.jwt.secret
    }
}

/// Builds the complete Axum router
///
/// ```text
/// /
/// ├── GET  /health
/// └── /v1
///     ├── /auth                   public
///     │   ├── POST /register
///     │   ├── POST /login
///     │   └── POST /refresh
///     ├── GET  /equipment         member
///     ├── GET  /equipment/:id
///     ├── POST /usage/action
///     ├── GET  /usage
///     ├── GET  /dashboard
///     ├── GET  /wins
///     └── /admin                  administrator
///         ├── GET  /users
///         ├── GET|POST /wins
///         └── PUT|DELETE /wins/:id
/// ```
///
/// Member routes sit behind the JWT layer; admin routes additionally behind
/// the admin guard.
pub fn build_router(state: AppState) -> Router {
    let health_routes = Router::new().route("/health", get(routes::health::health_check));

    let auth_routes = Router::new()
        .route("/register", post(routes::auth::register))
        .route("/login", post(routes::auth::login))
        .route("/refresh", post(routes::auth::refresh));

    let admin_routes = Router::new()
        .route("/users", get(routes::admin::list_users))
        .route(
            "/wins",
            get(routes::admin::list_wins).post(routes::admin::create_win),
        )
        .route(
            "/wins/:id",
            put(routes::admin::update_win).delete(routes::admin::delete_win),
        )
        .layer(from_fn(require_admin));

    let member_routes = Router::new()
        .route("/equipment", get(routes::equipment::list_equipment))
        .route("/equipment/:id", get(routes::equipment::get_equipment))
        .route("/usage/action", post(routes::usage::usage_action))
        .route("/usage", get(routes::usage::list_usage))
        .route("/dashboard", get(routes::dashboard::dashboard))
        .route("/wins", get(routes::wins::my_wins))
        .nest("/admin", admin_routes)
        .layer(from_fn_with_state(state.clone(), jwt_auth_layer));

    let v1_routes = Router::new()
        .nest("/auth", auth_routes)
        .merge(member_routes);

    let cors = build_cors(&state.config.api.cors_origins, state.config.api.production);

    Router::new()
        .merge(health_routes)
        .nest("/v1", v1_routes)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|req: &Request| {
                    tracing::info_span!(
                        "request",
                        method = %req.method(),
                        uri = %req.uri(),
                        user_id = tracing::field::Empty,
                    )
                })
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(cors)
        .layer(SecurityHeadersLayer::new(state.config.api.production))
        .with_state(state)
}

fn build_cors(origins: &[String], production: bool) -> CorsLayer {
    if origins.iter().any(|o| o == "*") {
        if production {
            tracing::warn!("CORS_ORIGINS is '*' in production; allowing any origin");
        }
        return CorsLayer::permissive();
    }

    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "Ignoring unparseable CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
        .max_age(Duration::from_secs(3600))
}
