//! JSON envelope shared by every admin endpoint and the client decoding it:
//! `{ success, data?, meta?, error?: { code, message, details? } }`.

use serde::{Deserialize, Serialize};

use crate::content::FieldError;

/// Pagination metadata. Both snake_case and camelCase spellings are accepted
/// because older endpoints answer with `perPage`/`totalPages`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaginationMeta {
    pub page: u32,
    #[serde(alias = "perPage")]
    pub per_page: u32,
    pub total: u64,
    #[serde(alias = "totalPages")]
    pub total_pages: u32,
}

impl PaginationMeta {
    pub fn new(page: u32, per_page: u32, total: u64) -> Self {
        let per_page = per_page.max(1);
        let total_pages = total.div_ceil(per_page as u64) as u32;
        Self {
            page,
            per_page,
            total,
            total_pages,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub details: Vec<FieldError>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiEnvelope<T> {
    pub success: bool,
    #[serde(default = "none", skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<PaginationMeta>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorBody>,
}

fn none<T>() -> Option<T> {
    None
}

impl<T> ApiEnvelope<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            meta: None,
            error: None,
        }
    }

    pub fn paginated(data: T, meta: PaginationMeta) -> Self {
        Self {
            success: true,
            data: Some(data),
            meta: Some(meta),
            error: None,
        }
    }

    pub fn failure(error: ErrorBody) -> Self {
        Self {
            success: false,
            data: None,
            meta: None,
            error: Some(error),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_meta_total_pages_rounds_up() {
        assert_eq!(PaginationMeta::new(1, 20, 41).total_pages, 3);
        assert_eq!(PaginationMeta::new(1, 20, 0).total_pages, 0);
    }

    #[test]
    fn test_meta_accepts_camel_case() {
        let meta: PaginationMeta = serde_json::from_value(json!({
            "page": 2, "perPage": 20, "total": 30, "totalPages": 2
        }))
        .unwrap();
        assert_eq!(meta, PaginationMeta::new(2, 20, 30));
    }

    #[test]
    fn test_failure_envelope_omits_data() {
        let envelope: ApiEnvelope<()> = ApiEnvelope::failure(ErrorBody {
            code: "NOT_FOUND".to_string(),
            message: "Not found".to_string(),
            details: vec![],
        });
        let value = serde_json::to_value(&envelope).unwrap();
        assert_eq!(value["success"], json!(false));
        assert!(value.get("data").is_none());
        assert_eq!(value["error"]["code"], json!("NOT_FOUND"));
    }
}
