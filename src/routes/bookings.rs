/**
 * Meeting Booking Routes
 * Admin listing and status changes for meeting bookings
 */
use axum::{
    extract::{rejection::JsonRejection, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use chrono::Utc;

use crate::api::{ApiEnvelope, PaginationMeta};
use crate::bookings::{BookingQuery, BookingStatus, BookingUpdate};
use crate::error::{ApiError, ApiResult};
use crate::routes::auth::{AdminRole, AdminUser};
use crate::routes::{json_body, param, parse_page, parse_per_page, required_id, Params};
use crate::AppState;

/// GET /api/admin/meetings/bookings
pub async fn list_bookings(
    State(state): State<AppState>,
    user: AdminUser,
    Query(params): Query<Params>,
) -> ApiResult<impl IntoResponse> {
    user.require(AdminRole::Analyst)?;

    let status = match param(&params, "status") {
        Some(raw) => Some(raw.parse::<BookingStatus>().map_err(ApiError::BadRequest)?),
        None => None,
    };
    let query = BookingQuery {
        page: parse_page(&params)?,
        per_page: parse_per_page(&params),
        status,
        search: param(&params, "search"),
    };

    let (bookings, total) = state.store.list_bookings(&query).await?;
    let meta = PaginationMeta::new(query.page, query.per_page, total);

    Ok((StatusCode::OK, Json(ApiEnvelope::paginated(bookings, meta))))
}

/// PUT /api/admin/meetings/bookings?id=
pub async fn update_booking(
    State(state): State<AppState>,
    user: AdminUser,
    Query(params): Query<Params>,
    payload: Result<Json<BookingUpdate>, JsonRejection>,
) -> ApiResult<impl IntoResponse> {
    user.require(AdminRole::ContentManager)?;

    let id = required_id(&params)?;
    let update = json_body(payload)?;
    update.validate()?;

    let mut booking = state
        .store
        .get_booking(&id)
        .await?
        .ok_or(ApiError::NotFound("Booking"))?;
    booking.apply(&update, Utc::now());
    state.store.save_booking(&booking).await?;

    tracing::info!(
        booking_id = %booking.id,
        status = %booking.booking_status,
        user = %user.0.email,
        "Booking status updated"
    );

    Ok((StatusCode::OK, Json(ApiEnvelope::ok(booking))))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bookings::MeetingBooking;
    use crate::routes::auth::create_access_token;
    use crate::store::{ContentStore, MemoryStore};
    use axum::body::Body;
    use axum::http::Request;
    use axum::routing::get;
    use axum::Router;
    use serde_json::{json, Value};
    use tower::ServiceExt;

    fn booking(id: &str, company: &str, day: u32) -> MeetingBooking {
        serde_json::from_value(json!({
            "id": id,
            "booking_status": "PENDING",
            "created_at": "2025-01-10T01:00:00Z",
            "meeting": {
                "id": format!("slot-{}", id),
                "title": "GLEC DTG 데모",
                "start_time": format!("2025-01-{:02}T05:00:00Z", day),
                "end_time": format!("2025-01-{:02}T06:00:00Z", day),
            },
            "customer": {
                "lead_type": "CONTACT",
                "lead_id": "c-1",
                "company_name": company,
                "contact_name": "Kim",
                "email": "kim@example.com",
                "phone": "N/A"
            }
        }))
        .unwrap()
    }

    async fn app() -> Router {
        let store = MemoryStore::new();
        store.save_booking(booking("b-1", "Hanjin", 15)).await;
        store.save_booking(booking("b-2", "CJ Logistics", 20)).await;
        Router::new()
            .route(
                "/api/admin/meetings/bookings",
                get(list_bookings).put(update_booking),
            )
            .with_state(AppState::new(ContentStore::Memory(store)))
    }

    async fn send(app: Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let token = create_access_token("cm-1", "cm@glec.io", AdminRole::ContentManager).unwrap();
        let req = Request::builder()
            .method(method)
            .uri(uri)
            .header("authorization", format!("Bearer {}", token))
            .header("content-type", "application/json");
        let body = body
            .map(|v| Body::from(serde_json::to_vec(&v).unwrap()))
            .unwrap_or_else(Body::empty);
        let res = app.oneshot(req.body(body).unwrap()).await.unwrap();
        let status = res.status();
        let bytes = axum::body::to_bytes(res.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_list_is_newest_meeting_first_and_searchable() {
        let (status, body) = send(app().await, "GET", "/api/admin/meetings/bookings", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"][0]["id"], "b-2");
        assert_eq!(body["meta"]["total"], 2);

        let (_, body) = send(app().await, "GET", "/api/admin/meetings/bookings?search=hanjin", None).await;
        assert_eq!(body["meta"]["total"], 1);
        assert_eq!(body["data"][0]["customer"]["company_name"], "Hanjin");
    }

    #[tokio::test]
    async fn test_cancel_without_reason_is_rejected() {
        let (status, body) = send(
            app().await,
            "PUT",
            "/api/admin/meetings/bookings?id=b-1",
            Some(json!({ "booking_status": "CANCELLED" })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["details"][0]["field"], "cancellation_reason");
    }

    #[tokio::test]
    async fn test_cancel_stamps_cancelled_at() {
        let (status, body) = send(
            app().await,
            "PUT",
            "/api/admin/meetings/bookings?id=b-1",
            Some(json!({ "booking_status": "CANCELLED", "cancellation_reason": "고객 요청" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["booking_status"], "CANCELLED");
        assert!(body["data"]["cancelled_at"].is_string());
    }

    #[tokio::test]
    async fn test_unknown_booking_is_not_found() {
        let (status, body) = send(
            app().await,
            "PUT",
            "/api/admin/meetings/bookings?id=nope",
            Some(json!({ "booking_status": "CONFIRMED" })),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"]["code"], "NOT_FOUND");
    }
}
