//! Input rules shared by the admin forms and the API handlers, plus the
//! slug and excerpt generators used when a notice is saved.

use regex::Regex;
use reqwest::Url;
use serde::{Deserialize, Serialize};
use std::fmt;

use super::{ContentInput, ContentKind, ContentStatus};

pub const MAX_TITLE_CHARS: usize = 200;
pub const MAX_EXCERPT_CHARS: usize = 300;

lazy_static::lazy_static! {
    static ref HTML_TAG: Regex = Regex::new(r"<[^>]*>").unwrap();
    static ref SLUG_STRIP: Regex = Regex::new(r"[^a-z0-9가-힣\s-]").unwrap();
    static ref WHITESPACE: Regex = Regex::new(r"\s+").unwrap();
    static ref DASHES: Regex = Regex::new(r"-+").unwrap();
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

/// One or more rejected fields. Raised before any request is sent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationErrors(pub Vec<FieldError>);

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let messages: Vec<&str> = self.0.iter().map(|e| e.message.as_str()).collect();
        write!(f, "{}", messages.join(", "))
    }
}

impl std::error::Error for ValidationErrors {}

impl ValidationErrors {
    pub(crate) fn push(&mut self, field: &str, message: impl Into<String>) {
        self.0.push(FieldError {
            field: field.to_string(),
            message: message.into(),
        });
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn has_field(&self, field: &str) -> bool {
        self.0.iter().any(|e| e.field == field)
    }

    pub(crate) fn into_result(self) -> Result<(), ValidationErrors> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

/// Validate a create payload: every required field must be present.
pub fn validate_create(kind: ContentKind, input: &ContentInput) -> Result<(), ValidationErrors> {
    let mut errors = ValidationErrors::default();

    if input.title.as_deref().map(str::trim).unwrap_or("").is_empty() {
        errors.push("title", "Title is required");
    }
    if input.category.is_none() {
        errors.push("category", "Category is required");
    }
    if kind.min_content_chars() > 0 && input.content.is_none() {
        errors.push("content", "Content is required");
    }
    if kind == ContentKind::Blog {
        if input.author.as_deref().map(str::trim).unwrap_or("").is_empty() {
            errors.push("author", "Author is required");
        }
        if input.excerpt.is_none() {
            errors.push("excerpt", "Excerpt is required");
        }
    }
    if kind.requires_tags() && input.tags.is_none() {
        errors.push("tags", "At least one tag is required");
    }
    if kind.has_status() && input.status == Some(ContentStatus::Archived) {
        errors.push("status", "Status must be either DRAFT or PUBLISHED");
    }

    check_present_fields(kind, input, &mut errors);
    errors.into_result()
}

/// Validate a partial update: only the fields present are checked.
pub fn validate_update(kind: ContentKind, input: &ContentInput) -> Result<(), ValidationErrors> {
    let mut errors = ValidationErrors::default();
    check_present_fields(kind, input, &mut errors);
    errors.into_result()
}

fn check_present_fields(kind: ContentKind, input: &ContentInput, errors: &mut ValidationErrors) {
    if let Some(title) = &input.title {
        let len = title.trim().chars().count();
        if len == 0 && !errors.has_field("title") {
            errors.push("title", "Title is required");
        } else if len > MAX_TITLE_CHARS {
            errors.push(
                "title",
                format!("Title must be {} characters or less", MAX_TITLE_CHARS),
            );
        }
    }

    if let Some(content) = &input.content {
        let min = kind.min_content_chars();
        if content.trim().chars().count() < min {
            if min > 1 {
                errors.push(
                    "content",
                    format!("Content must be at least {} characters", min),
                );
            } else {
                errors.push("content", "Content is required");
            }
        }
    }

    if let Some(excerpt) = &input.excerpt {
        if excerpt.chars().count() > MAX_EXCERPT_CHARS {
            errors.push(
                "excerpt",
                format!("Excerpt must be {} characters or less", MAX_EXCERPT_CHARS),
            );
        }
    }

    if let Some(category) = &input.category {
        if !kind.is_valid_category(category) {
            errors.push(
                "category",
                format!("Category must be one of: {}", kind.category_keys().join(", ")),
            );
        }
    }

    if let Some(tags) = &input.tags {
        if kind.requires_tags() && tags.iter().all(|t| t.trim().is_empty()) {
            errors.push("tags", "At least one tag is required");
        }
    }

    if let Some(url) = &input.thumbnail_url {
        if !url.is_empty() && Url::parse(url).is_err() {
            errors.push("thumbnailUrl", "Invalid URL format");
        }
    }
}

/// Raw admin form fields as typed by the user. Tags arrive as one
/// comma-separated string.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContentForm {
    pub title: String,
    pub slug: String,
    pub content: String,
    pub excerpt: String,
    pub author: String,
    pub category: String,
    pub status: Option<ContentStatus>,
    pub tags: String,
    pub thumbnail_url: String,
}

impl ContentForm {
    /// Pre-populate the edit form from an existing record.
    pub fn from_item(item: &super::ContentItem) -> Self {
        Self {
            title: item.title.clone(),
            slug: item.slug.clone().unwrap_or_default(),
            content: item.content.clone(),
            excerpt: item.excerpt.clone().unwrap_or_default(),
            author: item.author.clone().unwrap_or_default(),
            category: item.category.clone(),
            status: item.status,
            tags: item.tags.join(", "),
            thumbnail_url: item.thumbnail_url.clone().unwrap_or_default(),
        }
    }

    pub fn parsed_tags(&self) -> Vec<String> {
        self.tags
            .split(',')
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(str::to_string)
            .collect()
    }

    fn to_input(&self, kind: ContentKind) -> ContentInput {
        let non_empty = |s: &str| {
            let s = s.trim();
            (!s.is_empty()).then(|| s.to_string())
        };

        let tags = self.parsed_tags();
        let category = match kind.fixed_category() {
            Some(fixed) => Some(fixed.to_string()),
            None => non_empty(&self.category),
        };

        ContentInput {
            title: non_empty(&self.title),
            slug: non_empty(&self.slug),
            content: non_empty(&self.content),
            excerpt: non_empty(&self.excerpt),
            author: non_empty(&self.author),
            category,
            status: if kind.has_status() {
                Some(self.status.unwrap_or(ContentStatus::Draft))
            } else {
                None
            },
            tags: if tags.is_empty() { None } else { Some(tags) },
            thumbnail_url: non_empty(&self.thumbnail_url),
            ..Default::default()
        }
    }

    /// Convert into a create payload, rejecting it when a required field is
    /// blank. Blank optional fields are omitted.
    pub fn into_input(self, kind: ContentKind) -> Result<ContentInput, ValidationErrors> {
        let input = self.to_input(kind);
        validate_create(kind, &input)?;
        Ok(input)
    }

    /// Convert the edit form into an update payload. Same required fields as
    /// creation, except that an edit may archive the record.
    pub fn into_update(self, kind: ContentKind) -> Result<ContentInput, ValidationErrors> {
        let input = self.to_input(kind);
        match validate_create(kind, &input) {
            Ok(()) => Ok(input),
            Err(errors) => {
                let remaining: Vec<FieldError> =
                    errors.0.into_iter().filter(|e| e.field != "status").collect();
                if remaining.is_empty() {
                    Ok(input)
                } else {
                    Err(ValidationErrors(remaining))
                }
            }
        }
    }
}

/// URL slug from a title: lowercase ASCII letters, digits and Hangul,
/// words joined with single hyphens.
pub fn generate_slug(title: &str) -> String {
    let lowered = title.to_lowercase();
    let stripped = SLUG_STRIP.replace_all(&lowered, "");
    let hyphenated = WHITESPACE.replace_all(stripped.trim(), "-");
    let collapsed = DASHES.replace_all(&hyphenated, "-");
    collapsed.trim_matches('-').to_string()
}

/// Plain-text excerpt of HTML content, truncated with an ellipsis.
pub fn generate_excerpt(content: &str, max_chars: usize) -> String {
    let text = HTML_TAG.replace_all(content, "");
    let text = text.trim();

    if text.chars().count() <= max_chars {
        return text.to_string();
    }

    let truncated: String = text.chars().take(max_chars.saturating_sub(3)).collect();
    format!("{}...", truncated)
}
