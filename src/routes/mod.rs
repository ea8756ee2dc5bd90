/**
 * Routes Module
 * API route handlers
 */
use axum::{extract::rejection::JsonRejection, Json};
use std::collections::HashMap;

use crate::content::{ValidationErrors, DEFAULT_PER_PAGE, MAX_PER_PAGE};
use crate::error::{ApiError, ApiResult};

pub mod auth;
pub mod bookings;
pub mod content;
pub mod health;

/// Raw query-string parameters.
pub(crate) type Params = HashMap<String, String>;

/// Unwrap a JSON body, answering malformed input with the error envelope.
pub(crate) fn json_body<T>(payload: Result<Json<T>, JsonRejection>) -> ApiResult<T> {
    payload
        .map(|Json(body)| body)
        .map_err(|rejection| ApiError::BadRequest(rejection.body_text()))
}

/// `page` must be a positive integer when present.
pub(crate) fn parse_page(params: &Params) -> ApiResult<u32> {
    match params.get("page").map(|p| p.trim()) {
        None | Some("") => Ok(1),
        Some(raw) => raw
            .parse::<u32>()
            .ok()
            .filter(|p| *p >= 1)
            .ok_or(ApiError::InvalidPage),
    }
}

/// `per_page`, clamped to the served range.
pub(crate) fn parse_per_page(params: &Params) -> u32 {
    params
        .get("per_page")
        .and_then(|p| p.trim().parse::<u32>().ok())
        .unwrap_or(DEFAULT_PER_PAGE)
        .clamp(1, MAX_PER_PAGE)
}

pub(crate) fn param(params: &Params, key: &str) -> Option<String> {
    params
        .get(key)
        .map(|v| v.trim())
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// `?id=` for item-level PUT/DELETE.
pub(crate) fn required_id(params: &Params) -> ApiResult<String> {
    param(params, "id").ok_or_else(|| {
        let mut errors = ValidationErrors::default();
        errors.push("id", "ID is required");
        ApiError::Validation(errors)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(pairs: &[(&str, &str)]) -> Params {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_page_must_be_positive() {
        assert_eq!(parse_page(&params(&[])).unwrap(), 1);
        assert_eq!(parse_page(&params(&[("page", "3")])).unwrap(), 3);
        assert!(matches!(
            parse_page(&params(&[("page", "0")])),
            Err(ApiError::InvalidPage)
        ));
        assert!(matches!(
            parse_page(&params(&[("page", "-1")])),
            Err(ApiError::InvalidPage)
        ));
    }

    #[test]
    fn test_per_page_is_clamped() {
        assert_eq!(parse_per_page(&params(&[])), DEFAULT_PER_PAGE);
        assert_eq!(parse_per_page(&params(&[("per_page", "5000")])), MAX_PER_PAGE);
        assert_eq!(parse_per_page(&params(&[("per_page", "0")])), 1);
        assert_eq!(parse_per_page(&params(&[("per_page", "abc")])), DEFAULT_PER_PAGE);
    }

    #[test]
    fn test_missing_id_is_a_validation_error() {
        let err = required_id(&params(&[("id", "  ")])).unwrap_err();
        assert_eq!(err.code(), "VALIDATION_ERROR");
    }
}
