//! Postgres backend over the shared sqlx pool.

use chrono::{DateTime, Utc};
use sqlx::types::Json;
use sqlx::{PgPool, Postgres, QueryBuilder};
use std::sync::Arc;

use super::{effective_category, page_offset, StoreError};
use crate::bookings::{BookingQuery, MeetingBooking};
use crate::content::{ContentItem, ContentKind, ListQuery};
use crate::db::models::{AdminUserRow, BookingRow, ContentRow};

const CONTENT_COLUMNS: &str = "id, kind, title, slug, content, excerpt, author, category, status, \
     view_count, tags, thumbnail_url, attributes, published_at, created_at, updated_at, deleted_at";

const BOOKING_COLUMNS: &str = "id, booking_status, requested_agenda, created_at, cancelled_at, \
     cancellation_reason, meeting_id, meeting_title, start_time, end_time, duration_minutes, \
     meeting_location, meeting_type, meeting_url, lead_type, lead_id, company_name, contact_name, \
     email, phone";

#[derive(Debug, Clone)]
pub struct PgStore {
    pool: Arc<PgPool>,
}

fn push_content_filters(qb: &mut QueryBuilder<'_, Postgres>, kind: ContentKind, query: &ListQuery) {
    qb.push(" WHERE kind = ")
        .push_bind(kind.storage_kind().as_str())
        .push(" AND deleted_at IS NULL");

    if let Some(category) = effective_category(kind, query) {
        qb.push(" AND category = ").push_bind(category);
    }
    if let Some(status) = query.status {
        qb.push(" AND COALESCE(status, 'PUBLISHED') = ")
            .push_bind(status.as_str());
    }
    if let Some(search) = &query.search {
        let pattern = format!("%{}%", search);
        qb.push(" AND (title ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR content ILIKE ")
            .push_bind(pattern)
            .push(")");
    }
}

fn push_booking_filters(qb: &mut QueryBuilder<'_, Postgres>, query: &BookingQuery) {
    qb.push(" WHERE 1 = 1");
    if let Some(status) = query.status {
        qb.push(" AND booking_status = ").push_bind(status.as_str());
    }
    if let Some(search) = &query.search {
        let pattern = format!("%{}%", search);
        qb.push(" AND (company_name ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR contact_name ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR email ILIKE ")
            .push_bind(pattern)
            .push(")");
    }
}

fn to_i64(value: u64) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}

impl PgStore {
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }

    pub async fn list(
        &self,
        kind: ContentKind,
        query: &ListQuery,
    ) -> Result<(Vec<ContentItem>, u64), StoreError> {
        let mut count = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM content_items");
        push_content_filters(&mut count, kind, query);
        let total: i64 = count
            .build_query_scalar()
            .fetch_one(self.pool.as_ref())
            .await?;

        let mut select =
            QueryBuilder::<Postgres>::new(format!("SELECT {} FROM content_items", CONTENT_COLUMNS));
        push_content_filters(&mut select, kind, query);
        select
            .push(" ORDER BY published_at DESC NULLS LAST, created_at DESC LIMIT ")
            .push_bind(query.per_page as i64)
            .push(" OFFSET ")
            .push_bind(to_i64(page_offset(query.page, query.per_page)));

        let rows: Vec<ContentRow> = select
            .build_query_as()
            .fetch_all(self.pool.as_ref())
            .await?;

        Ok((
            rows.into_iter().map(ContentItem::from).collect(),
            total.max(0) as u64,
        ))
    }

    pub async fn get(&self, kind: ContentKind, id: &str) -> Result<Option<ContentItem>, StoreError> {
        let sql = format!(
            "SELECT {} FROM content_items WHERE id = $1 AND kind = $2 AND deleted_at IS NULL",
            CONTENT_COLUMNS
        );
        let row = sqlx::query_as::<_, ContentRow>(&sql)
            .bind(id)
            .bind(kind.storage_kind().as_str())
            .fetch_optional(self.pool.as_ref())
            .await?;

        Ok(row
            .map(ContentItem::from)
            .filter(|item| super::belongs_to(kind, item)))
    }

    pub async fn save(&self, kind: ContentKind, item: &ContentItem) -> Result<(), StoreError> {
        let now = Utc::now();
        sqlx::query(
            r#"
            INSERT INTO content_items (
                id, kind, title, slug, content, excerpt, author, category, status,
                view_count, tags, thumbnail_url, attributes, published_at,
                created_at, updated_at, deleted_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17)
            ON CONFLICT (id) DO UPDATE SET
                title = EXCLUDED.title,
                slug = EXCLUDED.slug,
                content = EXCLUDED.content,
                excerpt = EXCLUDED.excerpt,
                author = EXCLUDED.author,
                category = EXCLUDED.category,
                status = EXCLUDED.status,
                view_count = EXCLUDED.view_count,
                tags = EXCLUDED.tags,
                thumbnail_url = EXCLUDED.thumbnail_url,
                attributes = EXCLUDED.attributes,
                published_at = EXCLUDED.published_at,
                updated_at = EXCLUDED.updated_at,
                deleted_at = EXCLUDED.deleted_at
            "#,
        )
        .bind(&item.id)
        .bind(kind.storage_kind().as_str())
        .bind(&item.title)
        .bind(&item.slug)
        .bind(&item.content)
        .bind(&item.excerpt)
        .bind(&item.author)
        .bind(&item.category)
        .bind(item.status.map(|s| s.as_str()))
        .bind(item.view_count.map(to_i64))
        .bind(&item.tags)
        .bind(&item.thumbnail_url)
        .bind(Json(&item.attributes))
        .bind(item.published_at)
        .bind(item.created_at.unwrap_or(now))
        .bind(item.updated_at.unwrap_or(now))
        .bind(item.deleted_at)
        .execute(self.pool.as_ref())
        .await?;

        Ok(())
    }

    pub async fn delete(
        &self,
        kind: ContentKind,
        id: &str,
        now: DateTime<Utc>,
    ) -> Result<bool, StoreError> {
        let storage = kind.storage_kind().as_str();
        let fixed = kind.fixed_category();

        let result = if kind.soft_delete() {
            sqlx::query(
                r#"
                UPDATE content_items SET deleted_at = $1, updated_at = $1
                WHERE id = $2 AND kind = $3 AND deleted_at IS NULL
                  AND ($4::TEXT IS NULL OR category = $4)
                "#,
            )
            .bind(now)
            .bind(id)
            .bind(storage)
            .bind(fixed)
            .execute(self.pool.as_ref())
            .await?
        } else {
            sqlx::query(
                r#"
                DELETE FROM content_items
                WHERE id = $1 AND kind = $2 AND ($3::TEXT IS NULL OR category = $3)
                "#,
            )
            .bind(id)
            .bind(storage)
            .bind(fixed)
            .execute(self.pool.as_ref())
            .await?
        };

        Ok(result.rows_affected() > 0)
    }

    pub async fn slug_taken(
        &self,
        kind: ContentKind,
        slug: &str,
        exclude_id: Option<&str>,
    ) -> Result<bool, StoreError> {
        let taken: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS (
                SELECT 1 FROM content_items
                WHERE kind = $1 AND slug = $2 AND deleted_at IS NULL
                  AND ($3::TEXT IS NULL OR id <> $3)
            )
            "#,
        )
        .bind(kind.storage_kind().as_str())
        .bind(slug)
        .bind(exclude_id)
        .fetch_one(self.pool.as_ref())
        .await?;

        Ok(taken)
    }

    pub async fn list_bookings(
        &self,
        query: &BookingQuery,
    ) -> Result<(Vec<MeetingBooking>, u64), StoreError> {
        let mut count = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM meeting_bookings");
        push_booking_filters(&mut count, query);
        let total: i64 = count
            .build_query_scalar()
            .fetch_one(self.pool.as_ref())
            .await?;

        let mut select =
            QueryBuilder::<Postgres>::new(format!("SELECT {} FROM meeting_bookings", BOOKING_COLUMNS));
        push_booking_filters(&mut select, query);
        select
            .push(" ORDER BY start_time DESC LIMIT ")
            .push_bind(query.per_page as i64)
            .push(" OFFSET ")
            .push_bind(to_i64(page_offset(query.page, query.per_page)));

        let rows: Vec<BookingRow> = select
            .build_query_as()
            .fetch_all(self.pool.as_ref())
            .await?;

        Ok((
            rows.into_iter().map(MeetingBooking::from).collect(),
            total.max(0) as u64,
        ))
    }

    pub async fn get_booking(&self, id: &str) -> Result<Option<MeetingBooking>, StoreError> {
        let sql = format!("SELECT {} FROM meeting_bookings WHERE id = $1", BOOKING_COLUMNS);
        let row = sqlx::query_as::<_, BookingRow>(&sql)
            .bind(id)
            .fetch_optional(self.pool.as_ref())
            .await?;
        Ok(row.map(MeetingBooking::from))
    }

    pub async fn save_booking(&self, booking: &MeetingBooking) -> Result<(), StoreError> {
        let meeting = &booking.meeting;
        let customer = &booking.customer;
        sqlx::query(
            r#"
            INSERT INTO meeting_bookings (
                id, booking_status, requested_agenda, created_at, cancelled_at,
                cancellation_reason, meeting_id, meeting_title, start_time, end_time,
                duration_minutes, meeting_location, meeting_type, meeting_url,
                lead_type, lead_id, company_name, contact_name, email, phone
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18, $19, $20)
            ON CONFLICT (id) DO UPDATE SET
                booking_status = EXCLUDED.booking_status,
                requested_agenda = EXCLUDED.requested_agenda,
                cancelled_at = EXCLUDED.cancelled_at,
                cancellation_reason = EXCLUDED.cancellation_reason
            "#,
        )
        .bind(&booking.id)
        .bind(booking.booking_status.as_str())
        .bind(&booking.requested_agenda)
        .bind(booking.created_at)
        .bind(booking.cancelled_at)
        .bind(&booking.cancellation_reason)
        .bind(&meeting.id)
        .bind(&meeting.title)
        .bind(meeting.start_time)
        .bind(meeting.end_time)
        .bind(i32::try_from(meeting.duration_minutes).unwrap_or(i32::MAX))
        .bind(&meeting.meeting_location)
        .bind(&meeting.meeting_type)
        .bind(&meeting.meeting_url)
        .bind(&customer.lead_type)
        .bind(&customer.lead_id)
        .bind(&customer.company_name)
        .bind(&customer.contact_name)
        .bind(&customer.email)
        .bind(&customer.phone)
        .execute(self.pool.as_ref())
        .await?;

        Ok(())
    }

    pub async fn find_admin(&self, email: &str) -> Result<Option<AdminUserRow>, StoreError> {
        let row = sqlx::query_as::<_, AdminUserRow>(
            r#"SELECT id, email, password_hash, name, role, is_active, locked_until
                   FROM admin_users
                   WHERE LOWER(email) = LOWER($1)"#,
        )
        .bind(email)
        .fetch_optional(self.pool.as_ref())
        .await?;
        Ok(row)
    }

    pub async fn record_login(
        &self,
        admin_id: &str,
        ip: Option<&str>,
        success: bool,
    ) -> Result<(), StoreError> {
        if success {
            sqlx::query(
                "UPDATE admin_users \
                     SET last_login_at = now(), last_login_ip = $1, \
                         login_attempts = 0, updated_at = now() \
                     WHERE id = $2",
            )
            .bind(ip)
            .bind(admin_id)
            .execute(self.pool.as_ref())
            .await?;
        } else {
            sqlx::query(
                "UPDATE admin_users \
                     SET login_attempts = login_attempts + 1, updated_at = now() \
                     WHERE id = $1",
            )
            .bind(admin_id)
            .execute(self.pool.as_ref())
            .await?;
        }
        Ok(())
    }
}
