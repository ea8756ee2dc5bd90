//! Insights Module
//! Pure aggregation over a fetched content collection: status counts, view
//! totals, category distribution, top-viewed and most recently published.
//!
//! Nothing here fails. Missing statuses count as published and missing
//! counters as zero, so a partially malformed response still renders.

use serde::{Deserialize, Serialize};

use crate::content::{ContentItem, ContentKind, ContentStatus};

/// Size of the top-viewed and recently-published rankings.
pub const TOP_N: usize = 5;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BaseStats {
    pub total_items: usize,
    pub draft_count: usize,
    pub published_count: usize,
    pub archived_count: usize,
    pub total_views: u64,
    pub avg_views_per_item: u64,
}

/// Category key → item count, in the order the keys were given.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryDistribution(pub Vec<(String, usize)>);

impl CategoryDistribution {
    pub fn get(&self, key: &str) -> Option<usize> {
        self.0.iter().find(|(k, _)| k == key).map(|(_, count)| *count)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, usize)> {
        self.0.iter().map(|(k, count)| (k.as_str(), *count))
    }

    pub fn total(&self) -> usize {
        self.0.iter().map(|(_, count)| count).sum()
    }
}

pub fn calculate_base_stats(items: &[ContentItem]) -> BaseStats {
    let mut stats = BaseStats {
        total_items: items.len(),
        ..Default::default()
    };

    for item in items {
        match item.effective_status() {
            ContentStatus::Draft => stats.draft_count += 1,
            ContentStatus::Published => stats.published_count += 1,
            ContentStatus::Archived => stats.archived_count += 1,
        }
        stats.total_views = stats.total_views.saturating_add(item.views());
    }

    if stats.total_items > 0 {
        stats.avg_views_per_item =
            (stats.total_views as f64 / stats.total_items as f64).round() as u64;
    }

    stats
}

/// Zero-filled so every key is present for the chart legend.
pub fn calculate_category_distribution(
    items: &[ContentItem],
    category_keys: &[&str],
) -> CategoryDistribution {
    let counts = category_keys
        .iter()
        .map(|key| {
            let count = items.iter().filter(|i| i.category == *key).count();
            (key.to_string(), count)
        })
        .collect();
    CategoryDistribution(counts)
}

/// The `n` most viewed items. Equal counts keep their input order.
pub fn get_top_viewed(items: &[ContentItem], n: usize) -> Vec<ContentItem> {
    let mut sorted = items.to_vec();
    sorted.sort_by(|a, b| b.views().cmp(&a.views()));
    sorted.truncate(n);
    sorted
}

/// The `n` most recently published items. Undated items are left out.
pub fn get_recent_published(items: &[ContentItem], n: usize) -> Vec<ContentItem> {
    let mut dated: Vec<ContentItem> = items
        .iter()
        .filter(|i| i.published_at.is_some())
        .cloned()
        .collect();
    dated.sort_by(|a, b| b.published_at.cmp(&a.published_at));
    dated.truncate(n);
    dated
}

/// Everything the insights tab shows for one content type.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Insights {
    pub kind: ContentKind,
    #[serde(flatten)]
    pub base: BaseStats,
    pub category_distribution: CategoryDistribution,
    pub top_viewed: Vec<ContentItem>,
    pub recent_published: Vec<ContentItem>,
}

impl Insights {
    pub fn from_items(kind: ContentKind, items: &[ContentItem]) -> Self {
        Self {
            kind,
            base: calculate_base_stats(items),
            category_distribution: calculate_category_distribution(items, &kind.category_keys()),
            top_viewed: get_top_viewed(items, TOP_N),
            recent_published: get_recent_published(items, TOP_N),
        }
    }
}
