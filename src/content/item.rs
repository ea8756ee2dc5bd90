//! Content records as they travel over the admin API.
//!
//! Every field the statistics read is deserialized leniently. A missing or
//! `null` text field or tag list becomes empty, and a malformed counter,
//! status or timestamp becomes `None`, so one bad record never fails a page.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;

use super::ContentKind;

/// Lifecycle status of notices and press releases.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ContentStatus {
    Draft,
    Published,
    Archived,
}

impl ContentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContentStatus::Draft => "DRAFT",
            ContentStatus::Published => "PUBLISHED",
            ContentStatus::Archived => "ARCHIVED",
        }
    }
}

impl fmt::Display for ContentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ContentStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "DRAFT" => Ok(ContentStatus::Draft),
            "PUBLISHED" => Ok(ContentStatus::Published),
            "ARCHIVED" => Ok(ContentStatus::Archived),
            other => Err(format!("invalid status: {}", other)),
        }
    }
}

/// Blog post, library file, video, notice or press release.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentItem {
    #[serde(default, deserialize_with = "null_as_default")]
    pub id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slug: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub content: String,
    #[serde(default)]
    pub excerpt: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub category: String,
    #[serde(
        default,
        deserialize_with = "lenient_status",
        skip_serializing_if = "Option::is_none"
    )]
    pub status: Option<ContentStatus>,
    #[serde(default, alias = "downloadCount", deserialize_with = "lenient_counter")]
    pub view_count: Option<u64>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub tags: Vec<String>,
    #[serde(default)]
    pub thumbnail_url: Option<String>,
    #[serde(default, deserialize_with = "lenient_timestamp")]
    pub published_at: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "lenient_timestamp")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "lenient_timestamp")]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(
        default,
        deserialize_with = "lenient_timestamp",
        skip_serializing_if = "Option::is_none"
    )]
    pub deleted_at: Option<DateTime<Utc>>,
    /// Kind-specific fields (fileUrl, fileType, videoUrl, duration, ...).
    #[serde(flatten)]
    pub attributes: Map<String, Value>,
}

impl ContentItem {
    /// Status used for statistics. Records without one count as published.
    pub fn effective_status(&self) -> ContentStatus {
        self.status.unwrap_or(ContentStatus::Published)
    }

    pub fn views(&self) -> u64 {
        self.view_count.unwrap_or(0)
    }

    /// JSON representation for `kind`, naming the counter the way that
    /// content type's clients expect.
    pub fn to_wire(&self, kind: ContentKind) -> Value {
        let mut value = serde_json::to_value(self).unwrap_or(Value::Null);
        if let Value::Object(map) = &mut value {
            let counter = map.remove("viewCount").unwrap_or(Value::Null);
            map.insert(kind.counter_field().to_string(), counter);
        }
        value
    }

    /// Overlay the fields present in `input`.
    pub fn apply(&mut self, input: &ContentInput) {
        if let Some(title) = &input.title {
            self.title = title.clone();
        }
        if let Some(slug) = &input.slug {
            self.slug = Some(slug.clone());
        }
        if let Some(content) = &input.content {
            self.content = content.clone();
        }
        if let Some(excerpt) = &input.excerpt {
            self.excerpt = Some(excerpt.clone());
        }
        if let Some(author) = &input.author {
            self.author = Some(author.clone());
        }
        if let Some(category) = &input.category {
            self.category = category.clone();
        }
        if let Some(status) = input.status {
            self.status = Some(status);
        }
        if let Some(tags) = &input.tags {
            self.tags = tags.clone();
        }
        if let Some(url) = &input.thumbnail_url {
            self.thumbnail_url = Some(url.clone());
        }
        if let Some(published_at) = input.published_at {
            self.published_at = Some(published_at);
        }
        for (key, value) in &input.attributes {
            self.attributes.insert(key.clone(), value.clone());
        }
    }
}

/// Create/update payload. On update only present fields are applied.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentInput {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slug: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub excerpt: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<ContentStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    #[serde(
        default,
        alias = "thumbnail_url",
        skip_serializing_if = "Option::is_none"
    )]
    pub thumbnail_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub published_at: Option<DateTime<Utc>>,
    #[serde(flatten)]
    pub attributes: Map<String, Value>,
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

fn lenient_counter<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.and_then(|v| match v {
        Value::Number(n) => n
            .as_u64()
            .or_else(|| n.as_f64().map(|f| if f > 0.0 { f as u64 } else { 0 })),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }))
}

fn lenient_status<'de, D>(deserializer: D) -> Result<Option<ContentStatus>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.and_then(|v| v.as_str().and_then(|s| s.parse().ok())))
}

fn lenient_timestamp<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.and_then(|v| {
        v.as_str()
            .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
            .map(|dt| dt.with_timezone(&Utc))
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_missing_and_malformed_fields_default_to_none() {
        let item: ContentItem = serde_json::from_value(json!({
            "id": "n-1",
            "title": "Hello",
            "category": "GENERAL",
            "status": "SOMETHING_ELSE",
            "viewCount": -4,
            "publishedAt": "not a date"
        }))
        .unwrap();

        assert_eq!(item.status, None);
        assert_eq!(item.view_count, Some(0));
        assert_eq!(item.published_at, None);
        assert_eq!(item.effective_status(), ContentStatus::Published);
    }

    #[test]
    fn test_null_text_and_tags_become_empty() {
        let item: ContentItem = serde_json::from_value(json!({
            "id": "n-1",
            "title": null,
            "content": null,
            "category": null,
            "tags": null
        }))
        .unwrap();

        assert_eq!(item.title, "");
        assert_eq!(item.content, "");
        assert_eq!(item.category, "");
        assert!(item.tags.is_empty());
    }

    #[test]
    fn test_one_null_record_does_not_fail_the_list() {
        let items: Vec<ContentItem> = serde_json::from_value(json!([
            { "id": "b-1", "title": "First", "category": "GENERAL", "tags": ["a"] },
            { "id": null, "title": null, "category": "GENERAL", "tags": null }
        ]))
        .unwrap();

        assert_eq!(items.len(), 2);
        assert_eq!(items[1].id, "");
        assert!(items[1].tags.is_empty());
    }

    #[test]
    fn test_download_count_is_read_as_counter() {
        let item: ContentItem = serde_json::from_value(json!({
            "id": "lib-1",
            "title": "Whitepaper",
            "category": "WHITEPAPER",
            "downloadCount": 12,
            "fileType": "PDF"
        }))
        .unwrap();

        assert_eq!(item.views(), 12);
        assert_eq!(item.attributes.get("fileType"), Some(&json!("PDF")));
    }

    #[test]
    fn test_to_wire_renames_counter_for_library() {
        let item: ContentItem = serde_json::from_value(json!({
            "id": "lib-1",
            "category": "REPORT",
            "viewCount": 3
        }))
        .unwrap();

        let wire = item.to_wire(ContentKind::Library);
        assert_eq!(wire["downloadCount"], json!(3));
        assert!(wire.get("viewCount").is_none());

        let wire = item.to_wire(ContentKind::Blog);
        assert_eq!(wire["viewCount"], json!(3));
    }

    #[test]
    fn test_apply_only_overwrites_present_fields() {
        let mut item: ContentItem = serde_json::from_value(json!({
            "id": "n-1",
            "title": "Old",
            "content": "Body",
            "category": "GENERAL",
            "status": "DRAFT"
        }))
        .unwrap();

        item.apply(&ContentInput {
            title: Some("New".to_string()),
            status: Some(ContentStatus::Published),
            ..Default::default()
        });

        assert_eq!(item.title, "New");
        assert_eq!(item.content, "Body");
        assert_eq!(item.status, Some(ContentStatus::Published));
    }

    #[test]
    fn test_input_accepts_snake_case_thumbnail() {
        let input: ContentInput =
            serde_json::from_value(json!({ "thumbnail_url": "https://glec.io/a.png" })).unwrap();
        assert_eq!(input.thumbnail_url.as_deref(), Some("https://glec.io/a.png"));
    }
}
