/**
 * Authentication Routes
 * Admin login, JWT issuing and verification, role-checked extractor
 */
use axum::{
    extract::{rejection::JsonRejection, ConnectInfo, FromRequestParts, State},
    http::{request::Parts, HeaderMap, StatusCode},
    response::IntoResponse,
    Json,
};
use bcrypt::{hash, verify, DEFAULT_COST};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::{collections::HashMap, fmt, net::SocketAddr, str::FromStr, sync::Arc};
use tokio::sync::RwLock;

use crate::api::ApiEnvelope;
use crate::content::ValidationErrors;
use crate::db::models::AdminUserRow;
use crate::error::{ApiError, ApiResult};
use crate::routes::json_body;
use crate::AppState;

// ============================================================================
// Configuration
// ============================================================================

pub const DEFAULT_JWT_SECRET: &str = "default-jwt-secret-change-in-production";

lazy_static::lazy_static! {
    /// JWT secret key from environment
    pub static ref JWT_SECRET: String = std::env::var("JWT_SECRET")
        .unwrap_or_else(|_| DEFAULT_JWT_SECRET.to_string());

    /// Fallback admin email when no database is configured
    pub static ref ADMIN_EMAIL: String = std::env::var("ADMIN_EMAIL")
        .unwrap_or_else(|_| "admin@glec.io".to_string());

    /// Fallback admin password hash (or plain password to hash)
    pub static ref ADMIN_PASSWORD_HASH: String = {
        if let Ok(hash) = std::env::var("ADMIN_PASSWORD_HASH") {
            hash
        } else if let Ok(plain) = std::env::var("ADMIN_PASSWORD") {
            hash(&plain, DEFAULT_COST).unwrap_or_default()
        } else {
            hash("admin123!", DEFAULT_COST).unwrap_or_default()
        }
    };
}

/// Access token lifetime
const ACCESS_TOKEN_EXPIRY_HOURS: i64 = 24;

/// Login attempts allowed per IP inside one window
const LOGIN_MAX_ATTEMPTS: usize = 5;

/// Rate limit window in seconds
const RATE_LIMIT_WINDOW_SECS: i64 = 60;

const MIN_PASSWORD_CHARS: usize = 8;

// ============================================================================
// Types
// ============================================================================

/// Admin roles, highest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AdminRole {
    SuperAdmin,
    ContentManager,
    Analyst,
}

impl AdminRole {
    fn rank(&self) -> u8 {
        match self {
            AdminRole::SuperAdmin => 3,
            AdminRole::ContentManager => 2,
            AdminRole::Analyst => 1,
        }
    }

    /// Whether this role meets `required` or higher.
    pub fn allows(&self, required: AdminRole) -> bool {
        self.rank() >= required.rank()
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AdminRole::SuperAdmin => "SUPER_ADMIN",
            AdminRole::ContentManager => "CONTENT_MANAGER",
            AdminRole::Analyst => "ANALYST",
        }
    }
}

impl fmt::Display for AdminRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AdminRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "SUPER_ADMIN" => Ok(AdminRole::SuperAdmin),
            "CONTENT_MANAGER" => Ok(AdminRole::ContentManager),
            "ANALYST" => Ok(AdminRole::Analyst),
            other => Err(format!("unknown role: {}", other)),
        }
    }
}

/// JWT Claims structure
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    pub sub: String,
    pub email: String,
    pub role: AdminRole,
    pub exp: i64,
    pub iat: i64,
}

/// User info returned to the admin UI
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct UserInfo {
    pub id: String,
    pub email: String,
    #[serde(default)]
    pub name: Option<String>,
    pub role: AdminRole,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct LoginData {
    pub token: String,
    pub user: UserInfo,
}

/// Sliding-window login limiter keyed by client IP.
#[derive(Debug, Clone, Default)]
pub struct LoginLimiter {
    attempts: Arc<RwLock<HashMap<String, Vec<i64>>>>,
}

impl LoginLimiter {
    /// Record an attempt at `now` (unix seconds). False when the IP has
    /// used up its attempts for the current window.
    pub async fn check(&self, ip: &str, now: i64) -> bool {
        let mut attempts = self.attempts.write().await;

        // Drop expired timestamps so the map only holds active IPs.
        attempts.retain(|_, times| {
            times.retain(|t| now - *t < RATE_LIMIT_WINDOW_SECS);
            !times.is_empty()
        });

        let times = attempts.entry(ip.to_string()).or_default();
        if times.len() >= LOGIN_MAX_ATTEMPTS {
            return false;
        }
        times.push(now);
        true
    }
}

// ============================================================================
// Helper Functions
// ============================================================================

/// Create access token
pub fn create_access_token(
    user_id: &str,
    email: &str,
    role: AdminRole,
) -> Result<String, jsonwebtoken::errors::Error> {
    let now = Utc::now();
    let exp = now + Duration::hours(ACCESS_TOKEN_EXPIRY_HOURS);

    let claims = Claims {
        sub: user_id.to_string(),
        email: email.to_string(),
        role,
        exp: exp.timestamp(),
        iat: now.timestamp(),
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(JWT_SECRET.as_bytes()),
    )
}

/// Verify and decode access token
pub fn verify_access_token(token: &str) -> Result<Claims, jsonwebtoken::errors::Error> {
    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(JWT_SECRET.as_bytes()),
        &Validation::default(),
    )?;
    Ok(token_data.claims)
}

/// Extract bearer token from Authorization header
fn extract_bearer_token(headers: &HeaderMap) -> Option<String> {
    let value = headers.get("authorization")?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    let token = token.trim();
    (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then(|| token.to_string())
}

/// Account used for login when no database is configured.
pub fn env_admin_account() -> AdminUserRow {
    AdminUserRow {
        id: "admin-001".to_string(),
        email: ADMIN_EMAIL.clone(),
        password_hash: ADMIN_PASSWORD_HASH.clone(),
        name: Some("GLEC Admin".to_string()),
        role: AdminRole::SuperAdmin.to_string(),
        is_active: true,
        locked_until: None,
    }
}

fn validate_login(payload: &LoginRequest) -> Result<(), ValidationErrors> {
    let mut errors = ValidationErrors::default();
    if !payload.email.contains('@') {
        errors.push("email", "Valid email is required");
    }
    if payload.password.chars().count() < MIN_PASSWORD_CHARS {
        errors.push(
            "password",
            format!("Password must be at least {} characters", MIN_PASSWORD_CHARS),
        );
    }
    errors.into_result()
}

// ============================================================================
// Extractor
// ============================================================================

/// Authenticated admin, taken from the bearer token.
#[derive(Debug, Clone)]
pub struct AdminUser(pub Claims);

impl AdminUser {
    pub fn require(&self, role: AdminRole) -> ApiResult<()> {
        if self.0.role.allows(role) {
            Ok(())
        } else {
            tracing::warn!(
                user = %self.0.email,
                role = %self.0.role,
                required = %role,
                "Access denied"
            );
            Err(ApiError::Forbidden)
        }
    }
}

impl<S> FromRequestParts<S> for AdminUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let token = extract_bearer_token(&parts.headers).ok_or(ApiError::Unauthorized)?;
        match verify_access_token(&token) {
            Ok(claims) => Ok(AdminUser(claims)),
            Err(e) => {
                tracing::debug!("Token verification failed: {}", e);
                Err(ApiError::InvalidToken)
            }
        }
    }
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /api/admin/login
/// Authenticate an admin and return a JWT
pub async fn login(
    State(state): State<AppState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> ApiResult<impl IntoResponse> {
    let ip = addr.ip().to_string();

    if !state.login_limiter.check(&ip, Utc::now().timestamp()).await {
        tracing::warn!(ip = %ip, "Login rate limit exceeded");
        return Err(ApiError::RateLimited);
    }

    let payload = json_body(payload)?;
    validate_login(&payload)?;

    let account = match state.store.find_admin(&payload.email).await? {
        Some(account) => account,
        None => {
            tracing::warn!("Login attempt for unknown user: {}", payload.email);
            return Err(ApiError::InvalidCredentials);
        }
    };

    if let Some(until) = account.locked_until {
        if until > Utc::now() {
            tracing::warn!("Login attempt on locked account: {}", account.email);
            return Err(ApiError::InvalidCredentials);
        }
    }
    if !account.is_active {
        tracing::warn!("Login attempt on disabled account: {}", account.email);
        return Err(ApiError::Forbidden);
    }

    // bcrypt is CPU-bound; keep the async executor free.
    let password = payload.password.clone();
    let password_hash = account.password_hash.clone();
    let password_ok = tokio::task::spawn_blocking(move || {
        verify(&password, &password_hash).unwrap_or(false)
    })
    .await
    .unwrap_or(false);

    if !password_ok {
        state.store.record_login(&account.id, Some(&ip), false).await;
        tracing::warn!("Failed login attempt for: {}", account.email);
        return Err(ApiError::InvalidCredentials);
    }
    state.store.record_login(&account.id, Some(&ip), true).await;

    let role = account.role.parse().unwrap_or(AdminRole::Analyst);
    let token = create_access_token(&account.id, &account.email, role)
        .map_err(|e| ApiError::Internal(format!("Failed to create token: {}", e)))?;

    tracing::info!("Successful login for user: {}", account.email);

    Ok((
        StatusCode::OK,
        Json(ApiEnvelope::ok(LoginData {
            token,
            user: UserInfo {
                id: account.id,
                email: account.email,
                name: account.name,
                role,
            },
        })),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{ContentStore, MemoryStore};
    use axum::body::Body;
    use axum::http::Request;
    use axum::routing::{get, post};
    use axum::Router;
    use tower::ServiceExt;

    async fn whoami(user: AdminUser) -> ApiResult<Json<ApiEnvelope<String>>> {
        user.require(AdminRole::ContentManager)?;
        Ok(Json(ApiEnvelope::ok(user.0.email)))
    }

    async fn auth_router() -> Router {
        use axum::extract::connect_info::MockConnectInfo;

        let store = MemoryStore::new();
        store
            .add_admin(AdminUserRow {
                id: "admin-1".to_string(),
                email: "admin@glec.io".to_string(),
                password_hash: hash("correct-horse", 4).unwrap(),
                name: Some("Content Manager".to_string()),
                role: "CONTENT_MANAGER".to_string(),
                is_active: true,
                locked_until: None,
            })
            .await;
        let state = AppState::new(ContentStore::Memory(store));

        Router::new()
            .route("/api/admin/login", post(login))
            .route("/whoami", get(whoami))
            .with_state(state)
            .layer(MockConnectInfo(SocketAddr::from(([127, 0, 0, 1], 12345))))
    }

    async fn post_json(
        app: Router,
        uri: &str,
        json: &impl serde::Serialize,
    ) -> (StatusCode, axum::body::Bytes) {
        let body = Body::from(serde_json::to_vec(json).unwrap());
        let req = Request::post(uri)
            .header("content-type", "application/json")
            .body(body)
            .unwrap();
        let res = app.oneshot(req).await.unwrap();
        let status = res.status();
        let bytes = axum::body::to_bytes(res.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, bytes)
    }

    async fn get_with_token(app: Router, uri: &str, token: Option<&str>) -> StatusCode {
        let mut req = Request::get(uri);
        if let Some(token) = token {
            req = req.header("authorization", format!("Bearer {}", token));
        }
        let res = app.oneshot(req.body(Body::empty()).unwrap()).await.unwrap();
        res.status()
    }

    fn login_request(email: &str, password: &str) -> LoginRequest {
        LoginRequest {
            email: email.to_string(),
            password: password.to_string(),
        }
    }

    #[test]
    fn test_verify_access_token_invalid_returns_err() {
        assert!(verify_access_token("invalid.jwt.token").is_err());
    }

    #[test]
    fn test_token_round_trip_keeps_role() {
        let token = create_access_token("u-1", "a@glec.io", AdminRole::Analyst).unwrap();
        let claims = verify_access_token(&token).unwrap();
        assert_eq!(claims.role, AdminRole::Analyst);
        assert_eq!(claims.sub, "u-1");
    }

    #[test]
    fn test_role_hierarchy() {
        assert!(AdminRole::SuperAdmin.allows(AdminRole::ContentManager));
        assert!(AdminRole::ContentManager.allows(AdminRole::Analyst));
        assert!(!AdminRole::Analyst.allows(AdminRole::ContentManager));
    }

    #[test]
    fn test_bearer_scheme_is_case_insensitive() {
        let mut headers = HeaderMap::new();
        headers.insert("authorization", "bearer abc".parse().unwrap());
        assert_eq!(extract_bearer_token(&headers).as_deref(), Some("abc"));
        headers.insert("authorization", "Basic abc".parse().unwrap());
        assert!(extract_bearer_token(&headers).is_none());
    }

    #[tokio::test]
    async fn test_login_invalid_email_format_returns_bad_request() {
        let (status, bytes) = post_json(
            auth_router().await,
            "/api/admin/login",
            &login_request("no-at-sign", "correct-horse"),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn test_login_wrong_credentials_returns_unauthorized() {
        let (status, bytes) = post_json(
            auth_router().await,
            "/api/admin/login",
            &login_request("admin@glec.io", "wrong-password"),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["error"]["code"], "INVALID_CREDENTIALS");
    }

    #[tokio::test]
    async fn test_login_returns_token_and_user() {
        let (status, bytes) = post_json(
            auth_router().await,
            "/api/admin/login",
            &login_request("ADMIN@glec.io", "correct-horse"),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let body: ApiEnvelope<LoginData> = serde_json::from_slice(&bytes).unwrap();
        let data = body.data.unwrap();
        assert_eq!(data.user.role, AdminRole::ContentManager);
        assert_eq!(verify_access_token(&data.token).unwrap().sub, "admin-1");
    }

    #[tokio::test]
    async fn test_extractor_distinguishes_missing_and_invalid_tokens() {
        assert_eq!(
            get_with_token(auth_router().await, "/whoami", None).await,
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            get_with_token(auth_router().await, "/whoami", Some("garbage")).await,
            StatusCode::UNAUTHORIZED
        );

        let analyst = create_access_token("u-2", "viewer@glec.io", AdminRole::Analyst).unwrap();
        assert_eq!(
            get_with_token(auth_router().await, "/whoami", Some(&analyst)).await,
            StatusCode::FORBIDDEN
        );

        let manager = create_access_token("u-3", "cm@glec.io", AdminRole::ContentManager).unwrap();
        assert_eq!(
            get_with_token(auth_router().await, "/whoami", Some(&manager)).await,
            StatusCode::OK
        );
    }

    #[tokio::test]
    async fn test_limiter_blocks_after_max_attempts_then_recovers() {
        let limiter = LoginLimiter::default();
        for _ in 0..LOGIN_MAX_ATTEMPTS {
            assert!(limiter.check("10.0.0.1", 1_000).await);
        }
        assert!(!limiter.check("10.0.0.1", 1_001).await);
        assert!(limiter.check("10.0.0.2", 1_001).await);
        assert!(limiter.check("10.0.0.1", 1_000 + RATE_LIMIT_WINDOW_SECS).await);
    }
}
