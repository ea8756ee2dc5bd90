//! API errors and their JSON envelope rendering.

use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use crate::api::{ApiEnvelope, ErrorBody};
use crate::content::ValidationErrors;
use crate::store::StoreError;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Authentication required")]
    Unauthorized,
    #[error("Invalid or expired token")]
    InvalidToken,
    #[error("Insufficient permissions")]
    Forbidden,
    #[error("Invalid email or password")]
    InvalidCredentials,
    #[error("Too many login attempts. Please try again later.")]
    RateLimited,
    #[error("Validation failed")]
    Validation(ValidationErrors),
    #[error("{0}")]
    BadRequest(String),
    #[error("Page must be a positive integer")]
    InvalidPage,
    #[error("{0} not found")]
    NotFound(&'static str),
    #[error("Database error")]
    Store(#[from] StoreError),
    #[error("{0}")]
    Internal(String),
}

pub type ApiResult<T> = Result<T, ApiError>;

impl ApiError {
    pub fn code(&self) -> &'static str {
        match self {
            ApiError::Unauthorized => "UNAUTHORIZED",
            ApiError::InvalidToken => "INVALID_TOKEN",
            ApiError::Forbidden => "FORBIDDEN",
            ApiError::InvalidCredentials => "INVALID_CREDENTIALS",
            ApiError::RateLimited => "RATE_LIMITED",
            ApiError::Validation(_) | ApiError::BadRequest(_) => "VALIDATION_ERROR",
            ApiError::InvalidPage => "INVALID_PAGE",
            ApiError::NotFound(_) => "NOT_FOUND",
            ApiError::Store(_) | ApiError::Internal(_) => "INTERNAL_SERVER_ERROR",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Unauthorized | ApiError::InvalidToken | ApiError::InvalidCredentials => {
                StatusCode::UNAUTHORIZED
            }
            ApiError::Forbidden => StatusCode::FORBIDDEN,
            ApiError::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            ApiError::Validation(_) | ApiError::BadRequest(_) | ApiError::InvalidPage => {
                StatusCode::BAD_REQUEST
            }
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Store(_) | ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<ValidationErrors> for ApiError {
    fn from(errors: ValidationErrors) -> Self {
        ApiError::Validation(errors)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let code = self.code();

        match &self {
            ApiError::Store(e) => tracing::error!("Store error: {}", e),
            ApiError::Internal(e) => tracing::error!("Internal error: {}", e),
            _ => {}
        }

        let challenge = match self {
            ApiError::Unauthorized => Some("Bearer"),
            ApiError::InvalidToken => Some("Bearer error=\"invalid_token\""),
            _ => None,
        };

        let message = self.to_string();
        let details = match self {
            ApiError::Validation(errors) => errors.0,
            _ => Vec::new(),
        };
        let body = ErrorBody {
            code: code.to_string(),
            message,
            details,
        };

        let mut response = (status, Json(ApiEnvelope::<()>::failure(body))).into_response();
        if let Some(challenge) = challenge {
            response
                .headers_mut()
                .insert(header::WWW_AUTHENTICATE, HeaderValue::from_static(challenge));
        }
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::FieldError;

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_validation_error_carries_details() {
        let errors = ValidationErrors(vec![FieldError {
            field: "title".to_string(),
            message: "Title is required".to_string(),
        }]);
        let response = ApiError::from(errors).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body = body_json(response).await;
        assert_eq!(body["success"], false);
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
        assert_eq!(body["error"]["details"][0]["field"], "title");
    }

    #[tokio::test]
    async fn test_unauthorized_sets_challenge_header() {
        let response = ApiError::InvalidToken.into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            response.headers().get(header::WWW_AUTHENTICATE).unwrap(),
            "Bearer error=\"invalid_token\""
        );
        let body = body_json(response).await;
        assert_eq!(body["error"]["code"], "INVALID_TOKEN");
    }

    #[test]
    fn test_not_found_message_names_resource() {
        assert_eq!(ApiError::NotFound("Notice").to_string(), "Notice not found");
        assert_eq!(ApiError::NotFound("Notice").status(), StatusCode::NOT_FOUND);
    }
}
