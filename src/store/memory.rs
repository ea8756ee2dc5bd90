//! In-memory backend, used when no database is configured and in tests.

use chrono::{DateTime, Utc};
use std::sync::Arc;
use tokio::sync::RwLock;

use super::{belongs_to, matches_query, newest_first, page_offset};
use crate::bookings::{BookingQuery, MeetingBooking};
use crate::content::{ContentItem, ContentKind, ListQuery};
use crate::db::models::AdminUserRow;

#[derive(Debug, Default)]
struct MemoryState {
    items: Vec<(ContentKind, ContentItem)>,
    bookings: Vec<MeetingBooking>,
    admins: Vec<AdminUserRow>,
}

#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    state: Arc<RwLock<MemoryState>>,
}

fn paginate<T>(rows: Vec<T>, page: u32, per_page: u32) -> Vec<T> {
    let offset = page_offset(page, per_page) as usize;
    rows.into_iter()
        .skip(offset)
        .take(per_page as usize)
        .collect()
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an admin account. Used for the env-configured fallback
    /// login when there is no database.
    pub async fn add_admin(&self, admin: AdminUserRow) {
        self.state.write().await.admins.push(admin);
    }

    pub async fn list(&self, kind: ContentKind, query: &ListQuery) -> (Vec<ContentItem>, u64) {
        let storage = kind.storage_kind();
        let state = self.state.read().await;
        let mut rows: Vec<ContentItem> = state
            .items
            .iter()
            .filter(|(k, item)| *k == storage && matches_query(kind, item, query))
            .map(|(_, item)| item.clone())
            .collect();
        drop(state);

        rows.sort_by(newest_first);
        let total = rows.len() as u64;
        (paginate(rows, query.page, query.per_page), total)
    }

    pub async fn get(&self, kind: ContentKind, id: &str) -> Option<ContentItem> {
        let storage = kind.storage_kind();
        let state = self.state.read().await;
        state
            .items
            .iter()
            .find(|(k, item)| *k == storage && item.id == id)
            .map(|(_, item)| item)
            .filter(|item| item.deleted_at.is_none() && belongs_to(kind, item))
            .cloned()
    }

    pub async fn save(&self, kind: ContentKind, item: ContentItem) {
        let storage = kind.storage_kind();
        let mut state = self.state.write().await;
        let position = state
            .items
            .iter()
            .position(|(k, existing)| *k == storage && existing.id == item.id);
        match position {
            Some(index) => state.items[index].1 = item,
            None => state.items.push((storage, item)),
        }
    }

    pub async fn delete(&self, kind: ContentKind, id: &str, now: DateTime<Utc>) -> bool {
        let storage = kind.storage_kind();
        let mut state = self.state.write().await;
        let position = state.items.iter().position(|(k, item)| {
            *k == storage && item.id == id && item.deleted_at.is_none() && belongs_to(kind, item)
        });

        match position {
            Some(index) if kind.soft_delete() => {
                let item = &mut state.items[index].1;
                item.deleted_at = Some(now);
                item.updated_at = Some(now);
                true
            }
            Some(index) => {
                state.items.remove(index);
                true
            }
            None => false,
        }
    }

    pub async fn slug_taken(&self, kind: ContentKind, slug: &str, exclude_id: Option<&str>) -> bool {
        let storage = kind.storage_kind();
        let state = self.state.read().await;
        state.items.iter().any(|(k, item)| {
            *k == storage
                && item.deleted_at.is_none()
                && item.slug.as_deref() == Some(slug)
                && Some(item.id.as_str()) != exclude_id
        })
    }

    pub async fn list_bookings(&self, query: &BookingQuery) -> (Vec<MeetingBooking>, u64) {
        let state = self.state.read().await;
        let mut rows: Vec<MeetingBooking> = state
            .bookings
            .iter()
            .filter(|b| query.status.map_or(true, |s| b.booking_status == s))
            .filter(|b| query.search.as_deref().map_or(true, |term| b.matches_search(term)))
            .cloned()
            .collect();
        drop(state);

        rows.sort_by(|a, b| b.meeting.start_time.cmp(&a.meeting.start_time));
        let total = rows.len() as u64;
        (paginate(rows, query.page, query.per_page), total)
    }

    pub async fn get_booking(&self, id: &str) -> Option<MeetingBooking> {
        let state = self.state.read().await;
        state.bookings.iter().find(|b| b.id == id).cloned()
    }

    pub async fn save_booking(&self, booking: MeetingBooking) {
        let mut state = self.state.write().await;
        match state.bookings.iter().position(|b| b.id == booking.id) {
            Some(index) => state.bookings[index] = booking,
            None => state.bookings.push(booking),
        }
    }

    pub async fn find_admin(&self, email: &str) -> Option<AdminUserRow> {
        let state = self.state.read().await;
        state
            .admins
            .iter()
            .find(|a| a.email.eq_ignore_ascii_case(email))
            .cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::ContentStatus;
    use serde_json::json;

    fn item(id: &str, category: &str) -> ContentItem {
        serde_json::from_value(json!({
            "id": id,
            "title": id,
            "slug": id,
            "category": category,
            "status": "PUBLISHED",
        }))
        .unwrap()
    }

    #[tokio::test]
    async fn test_press_and_notice_share_storage() {
        let store = MemoryStore::new();
        store.save(ContentKind::Press, item("p-1", "PRESS")).await;
        store.save(ContentKind::Notice, item("n-1", "GENERAL")).await;

        let (notices, total) = store.list(ContentKind::Notice, &ListQuery::default()).await;
        assert_eq!(total, 2);
        assert_eq!(notices.len(), 2);

        let (press, total) = store.list(ContentKind::Press, &ListQuery::default()).await;
        assert_eq!(total, 1);
        assert_eq!(press[0].id, "p-1");
        assert!(store.get(ContentKind::Press, "n-1").await.is_none());
    }

    #[tokio::test]
    async fn test_soft_delete_hides_record_and_frees_slug() {
        let store = MemoryStore::new();
        store.save(ContentKind::Notice, item("n-1", "GENERAL")).await;
        assert!(store.slug_taken(ContentKind::Notice, "n-1", None).await);
        assert!(!store.slug_taken(ContentKind::Notice, "n-1", Some("n-1")).await);

        assert!(store.delete(ContentKind::Notice, "n-1", Utc::now()).await);
        assert!(store.get(ContentKind::Notice, "n-1").await.is_none());
        assert!(!store.slug_taken(ContentKind::Notice, "n-1", None).await);
        assert!(!store.delete(ContentKind::Notice, "n-1", Utc::now()).await);
    }

    #[tokio::test]
    async fn test_hard_delete_for_knowledge_kinds() {
        let store = MemoryStore::new();
        store.save(ContentKind::Blog, item("b-1", "GUIDE")).await;
        assert!(store.delete(ContentKind::Blog, "b-1", Utc::now()).await);
        assert!(store.state.read().await.items.is_empty());
    }

    #[tokio::test]
    async fn test_list_paginates_and_counts() {
        let store = MemoryStore::new();
        for i in 0..25 {
            store.save(ContentKind::Video, item(&format!("v-{}", i), "WEBINAR")).await;
        }
        let query = ListQuery {
            page: 2,
            ..Default::default()
        };
        let (rows, total) = store.list(ContentKind::Video, &query).await;
        assert_eq!(total, 25);
        assert_eq!(rows.len(), 5);

        let query = ListQuery {
            status: Some(ContentStatus::Draft),
            ..Default::default()
        };
        assert_eq!(store.list(ContentKind::Video, &query).await.1, 0);
    }
}
