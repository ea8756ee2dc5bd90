/**
 * Content Routes
 * CRUD endpoints shared by the knowledge blog, library, videos, notices
 * and press releases
 */
use axum::{
    extract::{rejection::JsonRejection, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, MethodRouter},
    Json,
};
use chrono::Utc;
use serde_json::Value;
use uuid::Uuid;

use crate::api::{ApiEnvelope, PaginationMeta};
use crate::content::validation::{
    generate_excerpt, generate_slug, validate_create, validate_update, MAX_EXCERPT_CHARS,
};
use crate::content::{ContentInput, ContentItem, ContentKind, ContentStatus, ListQuery};
use crate::error::{ApiError, ApiResult};
use crate::routes::auth::{AdminRole, AdminUser};
use crate::routes::{json_body, param, parse_page, parse_per_page, required_id, Params};
use crate::AppState;

// ============================================================================
// Routing
// ============================================================================

/// GET/POST/PUT/DELETE handlers for one content kind, mounted at
/// `kind.api_path()`.
pub fn kind_routes(kind: ContentKind) -> MethodRouter<AppState> {
    get(
        move |State(state): State<AppState>, user: AdminUser, Query(params): Query<Params>| async move {
            list_or_get(kind, state, user, params).await
        },
    )
    .post(
        move |State(state): State<AppState>,
              user: AdminUser,
              payload: Result<Json<ContentInput>, JsonRejection>| async move {
            create(kind, state, user, payload).await
        },
    )
    .put(
        move |State(state): State<AppState>,
              user: AdminUser,
              Query(params): Query<Params>,
              payload: Result<Json<ContentInput>, JsonRejection>| async move {
            update(kind, state, user, params, payload).await
        },
    )
    .delete(
        move |State(state): State<AppState>, user: AdminUser, Query(params): Query<Params>| async move {
            remove(kind, state, user, params).await
        },
    )
}

fn resource_name(kind: ContentKind) -> &'static str {
    match kind {
        ContentKind::Blog => "Blog post",
        ContentKind::Library => "Library item",
        ContentKind::Video => "Video",
        ContentKind::Notice => "Notice",
        ContentKind::Press => "Press release",
    }
}

fn list_query(kind: ContentKind, params: &Params) -> ApiResult<ListQuery> {
    let status = match param(params, "status") {
        Some(raw) if kind.has_status() => Some(raw.parse::<ContentStatus>().map_err(|_| {
            ApiError::BadRequest("Status must be DRAFT, PUBLISHED or ARCHIVED".to_string())
        })?),
        _ => None,
    };

    Ok(ListQuery {
        page: parse_page(params)?,
        per_page: parse_per_page(params),
        category: param(params, "category"),
        status,
        search: param(params, "search"),
    })
}

/// Suffix `-2`, `-3`, ... until the slug is free among live records.
async fn unique_slug(
    state: &AppState,
    kind: ContentKind,
    base: &str,
    exclude_id: Option<&str>,
) -> ApiResult<String> {
    let mut candidate = base.to_string();
    let mut counter = 2;
    while state.store.slug_taken(kind, &candidate, exclude_id).await? {
        candidate = format!("{}-{}", base, counter);
        counter += 1;
    }
    Ok(candidate)
}

// ============================================================================
// Handlers
// ============================================================================

/// GET {path} lists a page; GET {path}?id= returns one record.
async fn list_or_get(
    kind: ContentKind,
    state: AppState,
    user: AdminUser,
    params: Params,
) -> ApiResult<Response> {
    user.require(AdminRole::Analyst)?;

    if let Some(id) = param(&params, "id") {
        let item = state
            .store
            .get(kind, &id)
            .await?
            .ok_or(ApiError::NotFound(resource_name(kind)))?;
        return Ok((StatusCode::OK, Json(ApiEnvelope::ok(item.to_wire(kind)))).into_response());
    }

    let query = list_query(kind, &params)?;
    let (items, total) = state.store.list(kind, &query).await?;
    let data: Vec<Value> = items.iter().map(|item| item.to_wire(kind)).collect();
    let meta = PaginationMeta::new(query.page, query.per_page, total);

    Ok((StatusCode::OK, Json(ApiEnvelope::paginated(data, meta))).into_response())
}

/// POST {path}
async fn create(
    kind: ContentKind,
    state: AppState,
    user: AdminUser,
    payload: Result<Json<ContentInput>, JsonRejection>,
) -> ApiResult<Response> {
    user.require(AdminRole::ContentManager)?;

    let mut input = json_body(payload)?;
    if let Some(fixed) = kind.fixed_category() {
        input.category = Some(fixed.to_string());
    }
    validate_create(kind, &input)?;

    let now = Utc::now();
    let mut item = ContentItem {
        id: Uuid::new_v4().to_string(),
        title: String::new(),
        slug: None,
        content: String::new(),
        excerpt: None,
        author: None,
        category: String::new(),
        status: None,
        view_count: Some(0),
        tags: Vec::new(),
        thumbnail_url: None,
        published_at: None,
        created_at: Some(now),
        updated_at: Some(now),
        deleted_at: None,
        attributes: Default::default(),
    };
    item.apply(&input);

    if kind.has_status() {
        let status = input.status.unwrap_or(ContentStatus::Draft);
        item.status = Some(status);
        item.content = ammonia::clean(&item.content);

        let base = input
            .slug
            .as_deref()
            .map(generate_slug)
            .unwrap_or_else(|| generate_slug(&item.title));
        let base = if base.is_empty() { item.id.clone() } else { base };
        item.slug = Some(unique_slug(&state, kind, &base, None).await?);

        if item.excerpt.is_none() {
            item.excerpt = Some(generate_excerpt(&item.content, MAX_EXCERPT_CHARS));
        }
        if item.author.is_none() {
            item.author = Some(user.0.email.clone());
        }
        // Derived from the status alone; a client-sent publishedAt is ignored.
        item.published_at = (status == ContentStatus::Published).then_some(now);
    } else {
        item.status = None;
        if item.published_at.is_none() {
            item.published_at = Some(now);
        }
    }

    state.store.save(kind, &item).await?;
    tracing::info!(kind = %kind, id = %item.id, user = %user.0.email, "Content created");

    Ok((StatusCode::CREATED, Json(ApiEnvelope::ok(item.to_wire(kind)))).into_response())
}

/// PUT {path}?id=
async fn update(
    kind: ContentKind,
    state: AppState,
    user: AdminUser,
    params: Params,
    payload: Result<Json<ContentInput>, JsonRejection>,
) -> ApiResult<Response> {
    user.require(AdminRole::ContentManager)?;

    let id = required_id(&params)?;
    let mut input = json_body(payload)?;
    if input.category.is_some() {
        if let Some(fixed) = kind.fixed_category() {
            input.category = Some(fixed.to_string());
        }
    }
    validate_update(kind, &input)?;

    let mut item = state
        .store
        .get(kind, &id)
        .await?
        .ok_or(ApiError::NotFound(resource_name(kind)))?;

    let now = Utc::now();
    let was_draft = item.status == Some(ContentStatus::Draft);
    let published_at = item.published_at;
    item.apply(&input);
    item.updated_at = Some(now);

    if kind.has_status() {
        if input.content.is_some() {
            item.content = ammonia::clean(&item.content);
        }
        if input.title.is_some() || input.slug.is_some() {
            let base = generate_slug(input.slug.as_deref().unwrap_or(&item.title));
            let base = if base.is_empty() { item.id.clone() } else { base };
            item.slug = Some(unique_slug(&state, kind, &base, Some(&item.id)).await?);
        }
        item.published_at = published_at;
        if was_draft && input.status == Some(ContentStatus::Published) {
            item.published_at = Some(now);
        }
    } else {
        item.status = None;
    }

    state.store.save(kind, &item).await?;
    tracing::info!(kind = %kind, id = %item.id, user = %user.0.email, "Content updated");

    Ok((StatusCode::OK, Json(ApiEnvelope::ok(item.to_wire(kind)))).into_response())
}

/// DELETE {path}?id=
async fn remove(
    kind: ContentKind,
    state: AppState,
    user: AdminUser,
    params: Params,
) -> ApiResult<Response> {
    user.require(AdminRole::ContentManager)?;

    let id = required_id(&params)?;
    if !state.store.delete(kind, &id, Utc::now()).await? {
        return Err(ApiError::NotFound(resource_name(kind)));
    }
    tracing::info!(kind = %kind, id = %id, user = %user.0.email, "Content deleted");

    Ok(StatusCode::NO_CONTENT.into_response())
}
