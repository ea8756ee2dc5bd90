//! Content Module
//! Item-shape descriptors for the five admin content types plus the shared
//! record, query and validation types.

pub mod item;
pub mod query;
pub mod validation;

pub use item::{ContentInput, ContentItem, ContentStatus};
pub use query::{ListQuery, DEFAULT_PER_PAGE, INSIGHTS_PER_PAGE, MAX_PER_PAGE};
pub use validation::{ContentForm, FieldError, ValidationErrors};

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A category key with its display label.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Category {
    pub key: &'static str,
    pub label: &'static str,
}

const BLOG_CATEGORIES: &[Category] = &[
    Category { key: "TECHNICAL", label: "기술 블로그" },
    Category { key: "GUIDE", label: "가이드" },
    Category { key: "NEWS", label: "뉴스" },
    Category { key: "CASE_STUDY", label: "사례 연구" },
    Category { key: "TUTORIAL", label: "튜토리얼" },
    Category { key: "INDUSTRY_INSIGHTS", label: "업계 인사이트" },
    Category { key: "PRODUCT_UPDATES", label: "제품 업데이트" },
];

const LIBRARY_CATEGORIES: &[Category] = &[
    Category { key: "TECHNICAL", label: "기술 문서" },
    Category { key: "GUIDE", label: "가이드" },
    Category { key: "NEWS", label: "뉴스" },
    Category { key: "CASE_STUDY", label: "사례 연구" },
    Category { key: "TUTORIAL", label: "튜토리얼" },
    Category { key: "WHITEPAPER", label: "백서" },
    Category { key: "REPORT", label: "보고서" },
    Category { key: "RESEARCH", label: "연구 자료" },
];

const VIDEO_CATEGORIES: &[Category] = &[
    Category { key: "TECHNICAL", label: "기술 영상" },
    Category { key: "GUIDE", label: "가이드" },
    Category { key: "TUTORIAL", label: "튜토리얼" },
    Category { key: "WEBINAR", label: "웨비나" },
    Category { key: "CASE_STUDY", label: "사례 연구" },
    Category { key: "PRODUCT_DEMO", label: "제품 데모" },
];

const NOTICE_CATEGORIES: &[Category] = &[
    Category { key: "GENERAL", label: "일반" },
    Category { key: "PRODUCT", label: "제품" },
    Category { key: "EVENT", label: "이벤트" },
    Category { key: "PRESS", label: "보도자료" },
];

const PRESS_CATEGORIES: &[Category] = &[Category { key: "PRESS", label: "보도자료" }];

/// The admin content types sharing the Insights + Management pattern.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentKind {
    Blog,
    Library,
    Video,
    Notice,
    Press,
}

impl ContentKind {
    pub const ALL: [ContentKind; 5] = [
        ContentKind::Blog,
        ContentKind::Library,
        ContentKind::Video,
        ContentKind::Notice,
        ContentKind::Press,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ContentKind::Blog => "blog",
            ContentKind::Library => "library",
            ContentKind::Video => "video",
            ContentKind::Notice => "notice",
            ContentKind::Press => "press",
        }
    }

    /// REST collection path served by the API.
    pub fn api_path(&self) -> &'static str {
        match self {
            ContentKind::Blog => "/api/admin/knowledge/blog",
            ContentKind::Library => "/api/admin/knowledge/library",
            ContentKind::Video => "/api/admin/knowledge/videos",
            ContentKind::Notice => "/api/admin/notices",
            ContentKind::Press => "/api/admin/press",
        }
    }

    /// Admin screen path, used when reflecting filters into a URL.
    pub fn admin_path(&self) -> &'static str {
        match self {
            ContentKind::Blog => "/admin/knowledge-blog",
            ContentKind::Library => "/admin/knowledge-library",
            ContentKind::Video => "/admin/knowledge-videos",
            ContentKind::Notice => "/admin/notices",
            ContentKind::Press => "/admin/press",
        }
    }

    /// Slug used in report file names.
    pub fn report_slug(&self) -> &'static str {
        match self {
            ContentKind::Blog => "knowledge-blog",
            ContentKind::Library => "knowledge-library",
            ContentKind::Video => "knowledge-videos",
            ContentKind::Notice => "notices",
            ContentKind::Press => "press",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            ContentKind::Blog => "Knowledge Blog",
            ContentKind::Library => "Knowledge Library",
            ContentKind::Video => "Knowledge Videos",
            ContentKind::Notice => "Notices",
            ContentKind::Press => "Press",
        }
    }

    /// Korean noun used in report headings.
    pub fn noun(&self) -> &'static str {
        match self {
            ContentKind::Blog => "블로그",
            ContentKind::Library => "자료",
            ContentKind::Video => "영상",
            ContentKind::Notice => "공지사항",
            ContentKind::Press => "보도자료",
        }
    }

    pub fn categories(&self) -> &'static [Category] {
        match self {
            ContentKind::Blog => BLOG_CATEGORIES,
            ContentKind::Library => LIBRARY_CATEGORIES,
            ContentKind::Video => VIDEO_CATEGORIES,
            ContentKind::Notice => NOTICE_CATEGORIES,
            ContentKind::Press => PRESS_CATEGORIES,
        }
    }

    pub fn category_keys(&self) -> Vec<&'static str> {
        self.categories().iter().map(|c| c.key).collect()
    }

    pub fn is_valid_category(&self, key: &str) -> bool {
        self.categories().iter().any(|c| c.key == key)
    }

    /// Display label for a category key; unknown keys are shown verbatim.
    pub fn category_label<'a>(&self, key: &'a str) -> &'a str {
        self.categories()
            .iter()
            .find(|c| c.key == key)
            .map(|c| c.label)
            .unwrap_or(key)
    }

    /// Notices and press releases carry a real DRAFT/PUBLISHED/ARCHIVED
    /// lifecycle. Knowledge items have no status field.
    pub fn has_status(&self) -> bool {
        matches!(self, ContentKind::Notice | ContentKind::Press)
    }

    /// Wire name of the view/download counter.
    pub fn counter_field(&self) -> &'static str {
        match self {
            ContentKind::Library => "downloadCount",
            _ => "viewCount",
        }
    }

    /// Kind under which records are persisted. Press releases are notices
    /// pinned to the PRESS category.
    pub fn storage_kind(&self) -> ContentKind {
        match self {
            ContentKind::Press => ContentKind::Notice,
            other => *other,
        }
    }

    pub fn fixed_category(&self) -> Option<&'static str> {
        match self {
            ContentKind::Press => Some("PRESS"),
            _ => None,
        }
    }

    pub fn soft_delete(&self) -> bool {
        self.has_status()
    }

    pub fn requires_tags(&self) -> bool {
        matches!(
            self,
            ContentKind::Blog | ContentKind::Library | ContentKind::Video
        )
    }

    pub fn min_content_chars(&self) -> usize {
        match self {
            ContentKind::Blog => 50,
            ContentKind::Notice | ContentKind::Press => 1,
            ContentKind::Library | ContentKind::Video => 0,
        }
    }
}

impl fmt::Display for ContentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, thiserror::Error)]
#[error("unknown content kind: {0}")]
pub struct UnknownKind(pub String);

impl FromStr for ContentKind {
    type Err = UnknownKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "blog" | "knowledge-blog" => Ok(ContentKind::Blog),
            "library" | "knowledge-library" => Ok(ContentKind::Library),
            "video" | "videos" | "knowledge-videos" => Ok(ContentKind::Video),
            "notice" | "notices" => Ok(ContentKind::Notice),
            "press" => Ok(ContentKind::Press),
            _ => Err(UnknownKind(s.to_string())),
        }
    }
}
