use reqwest::Url;
use serde::{Deserialize, Serialize};

use super::{ContentKind, ContentStatus};

/// Rows per page on the management tab.
pub const DEFAULT_PER_PAGE: u32 = 20;

/// Page size used to approximate "all records" for the insights tab.
pub const INSIGHTS_PER_PAGE: u32 = 1000;

/// Largest page the API will serve.
pub const MAX_PER_PAGE: u32 = 1000;

/// Filter and pagination state of a management view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListQuery {
    pub page: u32,
    pub per_page: u32,
    pub category: Option<String>,
    pub status: Option<ContentStatus>,
    pub search: Option<String>,
}

impl Default for ListQuery {
    fn default() -> Self {
        Self {
            page: 1,
            per_page: DEFAULT_PER_PAGE,
            category: None,
            status: None,
            search: None,
        }
    }
}

impl ListQuery {
    /// Query used by the insights tab.
    pub fn all_records() -> Self {
        Self {
            per_page: INSIGHTS_PER_PAGE,
            ..Self::default()
        }
    }

    /// Parse the filter state out of a page URL query string
    /// (`page=2&category=GUIDE`). Unknown or malformed values fall back to
    /// their defaults.
    pub fn from_query_string(query: &str) -> Self {
        let mut parsed = Self::default();
        let query = query.trim_start_matches('?');
        let url = match Url::parse(&format!("http://admin.local/?{}", query)) {
            Ok(url) => url,
            Err(_) => return parsed,
        };

        for (key, value) in url.query_pairs() {
            let value = value.trim();
            match key.as_ref() {
                "page" => parsed.page = value.parse().ok().filter(|p| *p >= 1).unwrap_or(1),
                "per_page" => {
                    parsed.per_page = value
                        .parse()
                        .ok()
                        .filter(|p| *p >= 1)
                        .unwrap_or(DEFAULT_PER_PAGE)
                }
                "category" if !value.is_empty() => parsed.category = Some(value.to_string()),
                "status" => parsed.status = value.parse().ok(),
                "search" if !value.is_empty() => parsed.search = Some(value.to_string()),
                _ => {}
            }
        }

        parsed
    }

    /// Key/value pairs sent to the API.
    pub fn to_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = vec![
            ("page", self.page.to_string()),
            ("per_page", self.per_page.to_string()),
        ];
        if let Some(category) = &self.category {
            pairs.push(("category", category.clone()));
        }
        if let Some(status) = &self.status {
            pairs.push(("status", status.to_string()));
        }
        if let Some(search) = &self.search {
            pairs.push(("search", search.clone()));
        }
        pairs
    }

    /// Admin page URL carrying this filter state, so it survives reloads and
    /// back-navigation. The default page size is left implicit.
    pub fn page_url(&self, kind: ContentKind) -> String {
        let pairs: Vec<(&str, String)> = self
            .to_pairs()
            .into_iter()
            .filter(|(key, value)| {
                !(*key == "per_page" && value == &DEFAULT_PER_PAGE.to_string())
            })
            .collect();

        match Url::parse_with_params("http://admin.local/", &pairs) {
            Ok(url) => format!("{}?{}", kind.admin_path(), url.query().unwrap_or_default()),
            Err(_) => kind.admin_path().to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_string_round_trips_through_page_url() {
        let query = ListQuery {
            page: 3,
            category: Some("GUIDE".to_string()),
            search: Some("탄소 배출".to_string()),
            ..Default::default()
        };

        let url = query.page_url(ContentKind::Blog);
        assert!(url.starts_with("/admin/knowledge-blog?page=3"));

        let (_, qs) = url.split_once('?').unwrap();
        assert_eq!(ListQuery::from_query_string(qs), query);
    }

    #[test]
    fn test_invalid_page_falls_back_to_first() {
        assert_eq!(ListQuery::from_query_string("page=abc").page, 1);
        assert_eq!(ListQuery::from_query_string("page=0").page, 1);
        assert_eq!(ListQuery::from_query_string("").page, 1);
    }

    #[test]
    fn test_status_parses_case_insensitively() {
        let query = ListQuery::from_query_string("?status=archived");
        assert_eq!(query.status, Some(ContentStatus::Archived));
    }

    #[test]
    fn test_all_records_uses_insights_page_size() {
        let pairs = ListQuery::all_records().to_pairs();
        assert!(pairs.contains(&("per_page", "1000".to_string())));
    }
}
