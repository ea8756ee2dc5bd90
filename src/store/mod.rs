//! Store Module
//! Persistence for content records, meeting bookings and admin accounts.
//! Postgres when a pool is available, otherwise process memory.

pub mod memory;
pub mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

use chrono::{DateTime, Utc};
use std::cmp::Ordering;
use thiserror::Error;

use crate::bookings::{BookingQuery, MeetingBooking};
use crate::content::{ContentItem, ContentKind, ListQuery};
use crate::db::models::AdminUserRow;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

#[derive(Clone)]
pub enum ContentStore {
    Postgres(PgStore),
    Memory(MemoryStore),
}

impl ContentStore {
    /// Postgres if the shared pool was initialized, otherwise an empty
    /// in-memory store.
    pub fn from_pool_or_memory(fallback: MemoryStore) -> Self {
        match crate::db::get_pool() {
            Some(pool) => ContentStore::Postgres(PgStore::new(pool)),
            None => ContentStore::Memory(fallback),
        }
    }

    pub fn backend(&self) -> &'static str {
        match self {
            ContentStore::Postgres(_) => "postgres",
            ContentStore::Memory(_) => "memory",
        }
    }

    /// One page of live records plus the total matching count.
    pub async fn list(
        &self,
        kind: ContentKind,
        query: &ListQuery,
    ) -> Result<(Vec<ContentItem>, u64), StoreError> {
        match self {
            ContentStore::Postgres(pg) => pg.list(kind, query).await,
            ContentStore::Memory(mem) => Ok(mem.list(kind, query).await),
        }
    }

    pub async fn get(&self, kind: ContentKind, id: &str) -> Result<Option<ContentItem>, StoreError> {
        match self {
            ContentStore::Postgres(pg) => pg.get(kind, id).await,
            ContentStore::Memory(mem) => Ok(mem.get(kind, id).await),
        }
    }

    /// Insert or replace by id.
    pub async fn save(&self, kind: ContentKind, item: &ContentItem) -> Result<(), StoreError> {
        match self {
            ContentStore::Postgres(pg) => pg.save(kind, item).await,
            ContentStore::Memory(mem) => {
                mem.save(kind, item.clone()).await;
                Ok(())
            }
        }
    }

    /// Soft delete for kinds with a lifecycle, hard delete otherwise.
    /// Returns false when no live record matched.
    pub async fn delete(
        &self,
        kind: ContentKind,
        id: &str,
        now: DateTime<Utc>,
    ) -> Result<bool, StoreError> {
        match self {
            ContentStore::Postgres(pg) => pg.delete(kind, id, now).await,
            ContentStore::Memory(mem) => Ok(mem.delete(kind, id, now).await),
        }
    }

    pub async fn slug_taken(
        &self,
        kind: ContentKind,
        slug: &str,
        exclude_id: Option<&str>,
    ) -> Result<bool, StoreError> {
        match self {
            ContentStore::Postgres(pg) => pg.slug_taken(kind, slug, exclude_id).await,
            ContentStore::Memory(mem) => Ok(mem.slug_taken(kind, slug, exclude_id).await),
        }
    }

    pub async fn list_bookings(
        &self,
        query: &BookingQuery,
    ) -> Result<(Vec<MeetingBooking>, u64), StoreError> {
        match self {
            ContentStore::Postgres(pg) => pg.list_bookings(query).await,
            ContentStore::Memory(mem) => Ok(mem.list_bookings(query).await),
        }
    }

    pub async fn get_booking(&self, id: &str) -> Result<Option<MeetingBooking>, StoreError> {
        match self {
            ContentStore::Postgres(pg) => pg.get_booking(id).await,
            ContentStore::Memory(mem) => Ok(mem.get_booking(id).await),
        }
    }

    pub async fn save_booking(&self, booking: &MeetingBooking) -> Result<(), StoreError> {
        match self {
            ContentStore::Postgres(pg) => pg.save_booking(booking).await,
            ContentStore::Memory(mem) => {
                mem.save_booking(booking.clone()).await;
                Ok(())
            }
        }
    }

    /// Case-insensitive lookup by email.
    pub async fn find_admin(&self, email: &str) -> Result<Option<AdminUserRow>, StoreError> {
        match self {
            ContentStore::Postgres(pg) => pg.find_admin(email).await,
            ContentStore::Memory(mem) => Ok(mem.find_admin(email).await),
        }
    }

    /// Login bookkeeping. Failures here never block a login.
    pub async fn record_login(&self, admin_id: &str, ip: Option<&str>, success: bool) {
        if let ContentStore::Postgres(pg) = self {
            if let Err(e) = pg.record_login(admin_id, ip, success).await {
                tracing::warn!(admin_id, "Failed to record login attempt: {}", e);
            }
        }
    }
}

/// Category filter after pinning press releases to PRESS.
pub(crate) fn effective_category(kind: ContentKind, query: &ListQuery) -> Option<String> {
    kind.fixed_category()
        .map(str::to_string)
        .or_else(|| query.category.clone())
}

/// Whether a record stored under `kind.storage_kind()` is visible as `kind`.
pub(crate) fn belongs_to(kind: ContentKind, item: &ContentItem) -> bool {
    match kind.fixed_category() {
        Some(category) => item.category == category,
        None => true,
    }
}

pub(crate) fn matches_query(kind: ContentKind, item: &ContentItem, query: &ListQuery) -> bool {
    if item.deleted_at.is_some() || !belongs_to(kind, item) {
        return false;
    }
    if let Some(category) = effective_category(kind, query) {
        if item.category != category {
            return false;
        }
    }
    if let Some(status) = query.status {
        if item.effective_status() != status {
            return false;
        }
    }
    if let Some(search) = &query.search {
        let needle = search.to_lowercase();
        if !item.title.to_lowercase().contains(&needle)
            && !item.content.to_lowercase().contains(&needle)
        {
            return false;
        }
    }
    true
}

/// `published_at DESC NULLS LAST, created_at DESC`
pub(crate) fn newest_first(a: &ContentItem, b: &ContentItem) -> Ordering {
    let published = match (a.published_at, b.published_at) {
        (Some(x), Some(y)) => y.cmp(&x),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    };
    published.then_with(|| b.created_at.cmp(&a.created_at))
}

pub(crate) fn page_offset(page: u32, per_page: u32) -> u64 {
    (page.max(1) as u64 - 1) * per_page as u64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::ContentStatus;
    use chrono::TimeZone;
    use serde_json::json;

    fn item(id: &str, category: &str, published_day: Option<u32>, created_day: u32) -> ContentItem {
        let mut item: ContentItem = serde_json::from_value(json!({
            "id": id,
            "title": format!("Title {}", id),
            "category": category,
        }))
        .unwrap();
        item.published_at = published_day.map(|d| Utc.with_ymd_and_hms(2025, 1, d, 0, 0, 0).unwrap());
        item.created_at = Some(Utc.with_ymd_and_hms(2025, 1, created_day, 0, 0, 0).unwrap());
        item
    }

    #[test]
    fn test_newest_first_puts_unpublished_last() {
        let mut items = vec![
            item("draft-new", "GENERAL", None, 20),
            item("old", "GENERAL", Some(2), 1),
            item("draft-old", "GENERAL", None, 5),
            item("new", "GENERAL", Some(9), 1),
        ];
        items.sort_by(newest_first);
        let ids: Vec<&str> = items.iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids, vec!["new", "old", "draft-new", "draft-old"]);
    }

    #[test]
    fn test_press_only_sees_press_category() {
        let query = ListQuery {
            category: Some("GENERAL".to_string()),
            ..Default::default()
        };
        assert_eq!(effective_category(ContentKind::Press, &query).as_deref(), Some("PRESS"));
        assert!(matches_query(ContentKind::Press, &item("p", "PRESS", None, 1), &ListQuery::default()));
        assert!(!matches_query(ContentKind::Press, &item("g", "GENERAL", None, 1), &ListQuery::default()));
        assert!(matches_query(ContentKind::Notice, &item("p", "PRESS", None, 1), &ListQuery::default()));
    }

    #[test]
    fn test_status_filter_uses_effective_status() {
        let query = ListQuery {
            status: Some(ContentStatus::Published),
            ..Default::default()
        };
        assert!(matches_query(ContentKind::Blog, &item("b", "GUIDE", None, 1), &query));
    }

    #[test]
    fn test_search_is_case_insensitive_on_title() {
        let query = ListQuery {
            search: Some("TITLE A".to_string()),
            ..Default::default()
        };
        assert!(matches_query(ContentKind::Blog, &item("a", "GUIDE", None, 1), &query));
        assert!(!matches_query(ContentKind::Blog, &item("b", "GUIDE", None, 1), &query));
    }

    #[test]
    fn test_page_offset() {
        assert_eq!(page_offset(1, 20), 0);
        assert_eq!(page_offset(3, 20), 40);
        assert_eq!(page_offset(0, 20), 0);
    }
}
