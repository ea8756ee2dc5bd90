//! Database Models - rows of the admin tables as read by sqlx.

use chrono::{DateTime, Utc};
use serde_json::{Map, Value};
use sqlx::types::Json;
use sqlx::FromRow;

use crate::bookings::{BookingStatus, CustomerInfo, MeetingBooking, MeetingInfo};
use crate::content::ContentItem;

/// Row of `content_items`. Press releases live here as notices.
#[derive(Debug, Clone, FromRow)]
pub struct ContentRow {
    pub id: String,
    pub kind: String,
    pub title: String,
    pub slug: Option<String>,
    pub content: String,
    pub excerpt: Option<String>,
    pub author: Option<String>,
    pub category: String,
    pub status: Option<String>,
    pub view_count: Option<i64>,
    pub tags: Vec<String>,
    pub thumbnail_url: Option<String>,
    pub attributes: Json<Value>,
    pub published_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl From<ContentRow> for ContentItem {
    fn from(row: ContentRow) -> Self {
        let attributes = match row.attributes.0 {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        ContentItem {
            id: row.id,
            title: row.title,
            slug: row.slug,
            content: row.content,
            excerpt: row.excerpt,
            author: row.author,
            category: row.category,
            status: row.status.and_then(|s| s.parse().ok()),
            view_count: row.view_count.map(|v| v.max(0) as u64),
            tags: row.tags,
            thumbnail_url: row.thumbnail_url,
            published_at: row.published_at,
            created_at: Some(row.created_at),
            updated_at: Some(row.updated_at),
            deleted_at: row.deleted_at,
            attributes,
        }
    }
}

/// Row of `meeting_bookings`, with the slot and lead details denormalized.
#[derive(Debug, Clone, FromRow)]
pub struct BookingRow {
    pub id: String,
    pub booking_status: String,
    pub requested_agenda: Option<String>,
    pub created_at: DateTime<Utc>,
    pub cancelled_at: Option<DateTime<Utc>>,
    pub cancellation_reason: Option<String>,
    pub meeting_id: String,
    pub meeting_title: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub duration_minutes: i32,
    pub meeting_location: String,
    pub meeting_type: String,
    pub meeting_url: Option<String>,
    pub lead_type: String,
    pub lead_id: String,
    pub company_name: Option<String>,
    pub contact_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
}

impl From<BookingRow> for MeetingBooking {
    fn from(row: BookingRow) -> Self {
        let or_na = |v: Option<String>| v.filter(|s| !s.is_empty()).unwrap_or_else(|| "N/A".to_string());
        MeetingBooking {
            id: row.id,
            booking_status: row.booking_status.parse().unwrap_or(BookingStatus::Pending),
            requested_agenda: row.requested_agenda,
            created_at: row.created_at,
            cancelled_at: row.cancelled_at,
            cancellation_reason: row.cancellation_reason,
            meeting: MeetingInfo {
                id: row.meeting_id,
                title: row.meeting_title,
                start_time: row.start_time,
                end_time: row.end_time,
                duration_minutes: row.duration_minutes.max(0) as u32,
                meeting_location: row.meeting_location,
                meeting_type: row.meeting_type,
                meeting_url: row.meeting_url,
            },
            customer: CustomerInfo {
                lead_type: row.lead_type,
                lead_id: row.lead_id,
                company_name: or_na(row.company_name),
                contact_name: or_na(row.contact_name),
                email: or_na(row.email),
                phone: or_na(row.phone),
            },
        }
    }
}

/// Row of `admin_users`.
#[derive(Debug, Clone, FromRow)]
pub struct AdminUserRow {
    pub id: String,
    pub email: String,
    pub password_hash: String,
    pub name: Option<String>,
    pub role: String,
    pub is_active: bool,
    pub locked_until: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::ContentStatus;
    use serde_json::json;

    fn row() -> ContentRow {
        let now = Utc::now();
        ContentRow {
            id: "n-1".to_string(),
            kind: "notice".to_string(),
            title: "Hello".to_string(),
            slug: Some("hello".to_string()),
            content: "<p>Body</p>".to_string(),
            excerpt: None,
            author: None,
            category: "GENERAL".to_string(),
            status: Some("DRAFT".to_string()),
            view_count: Some(-3),
            tags: vec![],
            thumbnail_url: None,
            attributes: Json(json!({ "fileType": "PDF" })),
            published_at: None,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        }
    }

    #[test]
    fn test_content_row_converts_to_item() {
        let item = ContentItem::from(row());
        assert_eq!(item.status, Some(ContentStatus::Draft));
        assert_eq!(item.view_count, Some(0));
        assert_eq!(item.attributes.get("fileType"), Some(&json!("PDF")));
        assert!(item.created_at.is_some());
    }

    #[test]
    fn test_non_object_attributes_are_dropped() {
        let mut r = row();
        r.attributes = Json(Value::Null);
        assert!(ContentItem::from(r).attributes.is_empty());
    }
}
