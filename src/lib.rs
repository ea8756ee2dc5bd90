//! GLEC Admin - content API, insights and report export for the admin panel

pub mod api;
pub mod bookings;
pub mod calendar;
pub mod client;
pub mod content;
pub mod db;
pub mod error;
pub mod insights;
pub mod logging;
pub mod page;
pub mod report;
pub mod routes;
pub mod store;

use axum::{
    http::{HeaderValue, Method},
    middleware,
    routing::{get, post},
    Router,
};
use std::net::SocketAddr;
use tower_http::{
    compression::CompressionLayer, cors::CorsLayer, limit::RequestBodyLimitLayer, trace::TraceLayer,
};

use crate::content::ContentKind;
use crate::routes::auth::{LoginLimiter, DEFAULT_JWT_SECRET};
use crate::store::{ContentStore, MemoryStore};

/// Shared handler state.
#[derive(Clone)]
pub struct AppState {
    pub store: ContentStore,
    pub login_limiter: LoginLimiter,
}

impl AppState {
    pub fn new(store: ContentStore) -> Self {
        Self {
            store,
            login_limiter: LoginLimiter::default(),
        }
    }
}

/// Configure CORS from environment variables.
/// Uses ALLOWED_ORIGINS (comma-separated) or FRONTEND_ORIGIN.
/// Falls back to the local admin frontend in development.
pub fn configure_cors() -> CorsLayer {
    let allowed_origins = std::env::var("ALLOWED_ORIGINS")
        .ok()
        .and_then(|s| {
            let origins: Vec<HeaderValue> = s
                .split(',')
                .filter_map(|origin| origin.trim().parse().ok())
                .collect();
            if origins.is_empty() {
                None
            } else {
                Some(origins)
            }
        })
        .or_else(|| {
            std::env::var("FRONTEND_ORIGIN")
                .ok()
                .and_then(|s| s.parse().ok())
                .map(|origin| vec![origin])
        })
        .unwrap_or_else(|| {
            vec![
                HeaderValue::from_static("http://localhost:3000"),
                HeaderValue::from_static("http://127.0.0.1:3000"),
            ]
        });

    CorsLayer::new()
        .allow_origin(allowed_origins)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([
            axum::http::header::CONTENT_TYPE,
            axum::http::header::AUTHORIZATION,
        ])
        .allow_credentials(true)
}

/// Create and configure the application router.
pub fn create_app(state: AppState) -> Router {
    let cors = configure_cors();
    tracing::info!(store = state.store.backend(), "CORS configured");

    let mut router = Router::new()
        .route("/api/admin/login", post(routes::auth::login))
        .route(
            "/api/admin/meetings/bookings",
            get(routes::bookings::list_bookings).put(routes::bookings::update_booking),
        )
        .route("/health", get(routes::health::health_ping))
        .route("/health/ready", get(routes::health::health_ready));

    for kind in ContentKind::ALL {
        router = router.route(kind.api_path(), routes::content::kind_routes(kind));
    }

    router
        .with_state(state)
        .layer(logging::middleware::propagate_request_id_layer())
        .layer(middleware::from_fn(logging::middleware::log_request))
        .layer(logging::middleware::request_id_layer())
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new())
        .layer(RequestBodyLimitLayer::new(2 * 1024 * 1024))
        .layer(cors)
}

/// Run the server (used by main).
pub async fn run() {
    dotenvy::dotenv().ok();

    let log_config = logging::LogConfig::from_env();
    // Dropping the guards stops the background writers.
    let _log_guards = logging::init(&log_config);

    routes::health::init_start_time();

    // Refuse to start in production with the insecure default JWT secret.
    if log_config.is_production() {
        let secret = std::env::var("JWT_SECRET").unwrap_or_default();
        if secret.is_empty() || secret == DEFAULT_JWT_SECRET {
            panic!(
                "FATAL: JWT_SECRET must be set to a secure, unique value in production. \
                 Refusing to start with the default secret."
            );
        }
    }

    if std::env::var("DATABASE_URL").is_ok() {
        match db::init_pool(None).await {
            Ok(pool) => {
                if let Err(e) = db::run_migrations(&pool).await {
                    tracing::error!("Failed to run database migrations: {}", e);
                }
            }
            Err(e) => {
                tracing::warn!(
                    "Failed to initialize database pool: {}. Continuing with in-memory store.",
                    e
                );
            }
        }
    } else {
        tracing::info!("DATABASE_URL not set. Running with in-memory store.");
    }

    let fallback = MemoryStore::new();
    let store = ContentStore::from_pool_or_memory(fallback.clone());
    if let ContentStore::Memory(_) = store {
        let admin = routes::auth::env_admin_account();
        if log_config.is_production()
            && std::env::var("ADMIN_PASSWORD_HASH").is_err()
            && std::env::var("ADMIN_PASSWORD").is_err()
        {
            tracing::warn!(
                "SECURITY: Neither ADMIN_PASSWORD_HASH nor ADMIN_PASSWORD is set. \
                 The fallback admin password is insecure."
            );
        }
        tracing::info!(email = %admin.email, "Registered environment admin account");
        fallback.add_admin(admin).await;
    }

    let app = create_app(AppState::new(store));

    // Bind address is configurable via HOST / PORT env vars.
    let host = std::env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
    let port: u16 = std::env::var("PORT")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(3001);
    let addr: SocketAddr = format!("{}:{}", host, port)
        .parse()
        .expect("Invalid HOST/PORT configuration");
    tracing::info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind to address");

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await
    .expect("Server error");
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    fn app() -> Router {
        create_app(AppState::new(ContentStore::Memory(MemoryStore::new())))
    }

    #[tokio::test]
    async fn test_every_content_kind_is_mounted_and_protected() {
        for kind in ContentKind::ALL {
            let res = app()
                .oneshot(Request::get(kind.api_path()).body(Body::empty()).unwrap())
                .await
                .unwrap();
            assert_eq!(res.status(), StatusCode::UNAUTHORIZED, "{}", kind);
            assert_eq!(res.headers().get("www-authenticate").unwrap(), "Bearer");
        }
    }

    #[tokio::test]
    async fn test_health_route_sets_request_id() {
        let res = app()
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        assert!(res.headers().contains_key("x-request-id"));
    }
}
