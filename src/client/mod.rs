//! Admin API Client
//!
//! Typed access to the admin REST endpoints. Every response is decoded
//! through the shared envelope; a rejected token surfaces as
//! [`ClientError::Unauthorized`] so callers can drop the session.

pub mod session;

pub use session::Session;

use reqwest::{RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use thiserror::Error;

use crate::api::{ApiEnvelope, ErrorBody, PaginationMeta};
use crate::bookings::{BookingQuery, BookingUpdate, MeetingBooking};
use crate::content::{
    ContentInput, ContentItem, ContentKind, FieldError, ListQuery, INSIGHTS_PER_PAGE,
};
use crate::routes::auth::{LoginData, LoginRequest};

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("Not logged in")]
    MissingToken,

    #[error("{message}")]
    Unauthorized { code: String, message: String },

    #[error("{message}")]
    Api {
        status: u16,
        code: String,
        message: String,
        details: Vec<FieldError>,
    },

    #[error("Network error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Invalid response: {0}")]
    Decode(String),
}

impl ClientError {
    /// The token is missing, invalid or expired.
    pub fn is_auth(&self) -> bool {
        matches!(
            self,
            ClientError::MissingToken | ClientError::Unauthorized { .. }
        )
    }

    pub fn code(&self) -> Option<&str> {
        match self {
            ClientError::Unauthorized { code, .. } | ClientError::Api { code, .. } => Some(code),
            _ => None,
        }
    }
}

/// One page of a listing.
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub meta: PaginationMeta,
}

#[derive(Debug, Clone)]
pub struct AdminApiClient {
    http: reqwest::Client,
    base_url: String,
}

fn is_auth_code(code: &str) -> bool {
    matches!(code, "INVALID_TOKEN" | "UNAUTHORIZED")
}

/// Decode an envelope, mapping `success: false` and non-2xx answers to
/// errors.
fn decode<T: DeserializeOwned>(status: StatusCode, bytes: &[u8]) -> Result<ApiEnvelope<T>, ClientError> {
    let envelope: ApiEnvelope<T> = match serde_json::from_slice(bytes) {
        Ok(envelope) => envelope,
        Err(e) if status.is_success() => return Err(ClientError::Decode(e.to_string())),
        Err(_) if status == StatusCode::UNAUTHORIZED => {
            return Err(ClientError::Unauthorized {
                code: "UNAUTHORIZED".to_string(),
                message: "Authentication required".to_string(),
            })
        }
        Err(_) => {
            return Err(ClientError::Api {
                status: status.as_u16(),
                code: "HTTP_ERROR".to_string(),
                message: format!("Request failed with status {}", status),
                details: Vec::new(),
            })
        }
    };

    if envelope.success && status.is_success() {
        return Ok(envelope);
    }

    let error = envelope.error.unwrap_or_else(|| ErrorBody {
        code: "HTTP_ERROR".to_string(),
        message: format!("Request failed with status {}", status),
        details: Vec::new(),
    });

    if is_auth_code(&error.code) {
        Err(ClientError::Unauthorized {
            code: error.code,
            message: error.message,
        })
    } else {
        Err(ClientError::Api {
            status: status.as_u16(),
            code: error.code,
            message: error.message,
            details: error.details,
        })
    }
}

impl AdminApiClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(reqwest::Client::new(), base_url)
    }

    pub fn with_client(http: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn authed(&self, request: RequestBuilder, token: &str) -> RequestBuilder {
        request
            .bearer_auth(token)
            .header("Accept", "application/json")
    }

    /// Send a request and decode the envelope.
    async fn send<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
    ) -> Result<ApiEnvelope<T>, ClientError> {
        let response = request.send().await?;
        let status = response.status();
        let bytes = response.bytes().await?;
        decode(status, &bytes)
    }

    async fn send_data<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
    ) -> Result<T, ClientError> {
        self.send(request)
            .await?
            .data
            .ok_or_else(|| ClientError::Decode("response has no data".to_string()))
    }

    // ========================================================================
    // Auth
    // ========================================================================

    pub async fn login(&self, email: &str, password: &str) -> Result<LoginData, ClientError> {
        let body = LoginRequest {
            email: email.to_string(),
            password: password.to_string(),
        };
        let request = self.http.post(self.url("/api/admin/login")).json(&body);
        self.send_data(request).await
    }

    // ========================================================================
    // Content
    // ========================================================================

    pub async fn list(
        &self,
        token: &str,
        kind: ContentKind,
        query: &ListQuery,
    ) -> Result<Page<ContentItem>, ClientError> {
        let request = self.authed(
            self.http.get(self.url(kind.api_path())).query(&query.to_pairs()),
            token,
        );
        let envelope: ApiEnvelope<Vec<ContentItem>> = self.send(request).await?;
        let items = envelope.data.unwrap_or_default();
        let meta = envelope
            .meta
            .unwrap_or_else(|| PaginationMeta::new(query.page, query.per_page, items.len() as u64));
        Ok(Page { items, meta })
    }

    /// Every record the insights tab works on, in one request.
    pub async fn list_all(
        &self,
        token: &str,
        kind: ContentKind,
    ) -> Result<Vec<ContentItem>, ClientError> {
        let page = self.list(token, kind, &ListQuery::all_records()).await?;
        if page.meta.total > INSIGHTS_PER_PAGE as u64 {
            tracing::warn!(
                kind = %kind,
                total = page.meta.total,
                "Insights limited to the first {} records",
                INSIGHTS_PER_PAGE
            );
        }
        Ok(page.items)
    }

    pub async fn get(
        &self,
        token: &str,
        kind: ContentKind,
        id: &str,
    ) -> Result<ContentItem, ClientError> {
        let request = self.authed(
            self.http.get(self.url(kind.api_path())).query(&[("id", id)]),
            token,
        );
        self.send_data(request).await
    }

    pub async fn create(
        &self,
        token: &str,
        kind: ContentKind,
        input: &ContentInput,
    ) -> Result<ContentItem, ClientError> {
        let request = self.authed(self.http.post(self.url(kind.api_path())).json(input), token);
        self.send_data(request).await
    }

    pub async fn update(
        &self,
        token: &str,
        kind: ContentKind,
        id: &str,
        input: &ContentInput,
    ) -> Result<ContentItem, ClientError> {
        let request = self.authed(
            self.http
                .put(self.url(kind.api_path()))
                .query(&[("id", id)])
                .json(input),
            token,
        );
        self.send_data(request).await
    }

    pub async fn delete(&self, token: &str, kind: ContentKind, id: &str) -> Result<(), ClientError> {
        let request = self.authed(
            self.http.delete(self.url(kind.api_path())).query(&[("id", id)]),
            token,
        );
        let response = request.send().await?;
        let status = response.status();
        if status == StatusCode::NO_CONTENT {
            return Ok(());
        }
        let bytes = response.bytes().await?;
        decode::<serde_json::Value>(status, &bytes).map(|_| ())
    }

    // ========================================================================
    // Bookings
    // ========================================================================

    pub async fn list_bookings(
        &self,
        token: &str,
        query: &BookingQuery,
    ) -> Result<Page<MeetingBooking>, ClientError> {
        let request = self.authed(
            self.http
                .get(self.url("/api/admin/meetings/bookings"))
                .query(&query.to_pairs()),
            token,
        );
        let envelope: ApiEnvelope<Vec<MeetingBooking>> = self.send(request).await?;
        let items = envelope.data.unwrap_or_default();
        let meta = envelope
            .meta
            .unwrap_or_else(|| PaginationMeta::new(query.page, query.per_page, items.len() as u64));
        Ok(Page { items, meta })
    }

    pub async fn update_booking(
        &self,
        token: &str,
        id: &str,
        update: &BookingUpdate,
    ) -> Result<MeetingBooking, ClientError> {
        let request = self.authed(
            self.http
                .put(self.url("/api/admin/meetings/bookings"))
                .query(&[("id", id)])
                .json(update),
            token,
        );
        self.send_data(request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_list_decodes_items_and_camel_case_meta() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/admin/knowledge/library"))
            .and(query_param("page", "2"))
            .and(header("authorization", "Bearer t0k"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "success": true,
                "data": [{ "id": "lib-1", "title": "Guide", "category": "GUIDE", "downloadCount": 7 }],
                "meta": { "page": 2, "perPage": 20, "total": 21, "totalPages": 2 }
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = AdminApiClient::new(server.uri());
        let query = ListQuery {
            page: 2,
            ..Default::default()
        };
        let page = client.list("t0k", ContentKind::Library, &query).await.unwrap();
        assert_eq!(page.items[0].views(), 7);
        assert_eq!(page.meta.total_pages, 2);
    }

    #[tokio::test]
    async fn test_invalid_token_maps_to_unauthorized() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/admin/notices"))
            .respond_with(ResponseTemplate::new(401).set_body_json(json!({
                "success": false,
                "error": { "code": "INVALID_TOKEN", "message": "Invalid or expired token" }
            })))
            .mount(&server)
            .await;

        let client = AdminApiClient::new(server.uri());
        let err = client
            .list("stale", ContentKind::Notice, &ListQuery::default())
            .await
            .unwrap_err();
        assert!(err.is_auth());
        assert_eq!(err.code(), Some("INVALID_TOKEN"));
    }

    #[tokio::test]
    async fn test_validation_error_keeps_details() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/admin/knowledge/blog"))
            .respond_with(ResponseTemplate::new(400).set_body_json(json!({
                "success": false,
                "error": {
                    "code": "VALIDATION_ERROR",
                    "message": "Validation failed",
                    "details": [{ "field": "tags", "message": "At least one tag is required" }]
                }
            })))
            .mount(&server)
            .await;

        let client = AdminApiClient::new(server.uri());
        let err = client
            .create("t", ContentKind::Blog, &ContentInput::default())
            .await
            .unwrap_err();
        match err {
            ClientError::Api { status, details, .. } => {
                assert_eq!(status, 400);
                assert_eq!(details[0].field, "tags");
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_delete_accepts_no_content() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path("/api/admin/press"))
            .and(query_param("id", "p-1"))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;

        let client = AdminApiClient::new(format!("{}/", server.uri()));
        client.delete("t", ContentKind::Press, "p-1").await.unwrap();
    }

    #[tokio::test]
    async fn test_non_json_error_body() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(502).set_body_string("Bad Gateway"))
            .mount(&server)
            .await;

        let client = AdminApiClient::new(server.uri());
        let err = client
            .list_bookings("t", &BookingQuery::default())
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::Api { status: 502, .. }));
        assert!(!err.is_auth());
    }
}
