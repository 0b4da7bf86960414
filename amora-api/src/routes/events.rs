use axum::extract::{Path, Query, State};
use axum::Json;
use chrono::{DateTime, Utc};
use diesel::dsl::count_star;
use diesel::prelude::*;
use diesel::upsert::excluded;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use amora_shared::errors::{AppError, AppResult, ErrorCode};
use amora_shared::types::auth::AuthUser;
use amora_shared::types::{ApiResponse, Paginated, PaginationParams};

use crate::models::{
    Event, EventImage, NewEvent, NewEventImage, NewEventMember, NewEventTag, NewTag, Tag,
    UpdateEvent,
};
use crate::schema::{event_images, event_members, event_tags, events, tags};
use crate::AppState;

#[derive(Debug, Serialize)]
pub struct EventDetail {
    #[serde(flatten)]
    pub event: Event,
    pub tags: Vec<Tag>,
    pub images: Vec<EventImage>,
    pub member_count: i64,
}

fn load_event_detail(
    conn: &mut PgConnection,
    event: Event,
) -> Result<EventDetail, diesel::result::Error> {
    let event_tag_list: Vec<Tag> = event_tags::table
        .inner_join(tags::table)
        .filter(event_tags::event_id.eq(event.id))
        .select((tags::id, tags::title))
        .load(conn)?;

    let images: Vec<EventImage> = event_images::table
        .filter(event_images::event_id.eq(event.id))
        .load(conn)?;

    let member_count: i64 = event_members::table
        .filter(event_members::event_id.eq(event.id))
        .select(count_star())
        .first(conn)?;

    Ok(EventDetail {
        event,
        tags: event_tag_list,
        images,
        member_count,
    })
}

/// GET /events - upcoming first
pub async fn list_events(
    _user: AuthUser,
    State(state): State<Arc<AppState>>,
    Query(params): Query<PaginationParams>,
) -> AppResult<Json<ApiResponse<Paginated<Event>>>> {
    let mut conn = state.db.get().map_err(|e| AppError::internal(e.to_string()))?;

    let total: i64 = events::table.select(count_star()).first(&mut conn)?;

    let page: Vec<Event> = events::table
        .order(events::starts_at.asc())
        .limit(params.limit() as i64)
        .offset(params.offset() as i64)
        .load(&mut conn)?;

    Ok(Json(ApiResponse::ok(Paginated::new(page, total as u64, &params))))
}

/// GET /events/:id
pub async fn get_event(
    _user: AuthUser,
    State(state): State<Arc<AppState>>,
    Path(event_id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<EventDetail>>> {
    let mut conn = state.db.get().map_err(|e| AppError::internal(e.to_string()))?;

    let event: Event = events::table
        .filter(events::id.eq(event_id))
        .first(&mut conn)
        .map_err(|_| AppError::new(ErrorCode::EventNotFound, "event not found"))?;

    let detail = load_event_detail(&mut conn, event)?;
    Ok(Json(ApiResponse::ok(detail)))
}

#[derive(Debug, Deserialize)]
pub struct CreateEventRequest {
    pub title: String,
    pub description: String,
    pub place: String,
    pub starts_at: DateTime<Utc>,
    pub tags: Vec<String>,
    #[serde(default)]
    pub images: Vec<String>,
    pub users_limit: Option<i32>,
    #[serde(default)]
    pub is_online: bool,
}

/// POST /events - event, tags, images, and the creator's membership land in
/// one transaction.
pub async fn create_event(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateEventRequest>,
) -> AppResult<Json<ApiResponse<EventDetail>>> {
    if req.title.trim().is_empty() {
        return Err(AppError::new(ErrorCode::ValidationError, "title must not be empty"));
    }

    let mut conn = state.db.get().map_err(|e| AppError::internal(e.to_string()))?;

    let detail = conn.transaction(|conn| {
        let event: Event = diesel::insert_into(events::table)
            .values(&NewEvent {
                title: req.title.clone(),
                description: req.description.clone(),
                place: req.place.clone(),
                starts_at: req.starts_at,
                creator_id: user.id,
                users_limit: req.users_limit,
                is_online: req.is_online,
            })
            .get_result(conn)?;

        for title in &req.tags {
            // Tags are shared across events; unknown titles are created on
            // the fly rather than failing the whole event.
            let tag: Tag = diesel::insert_into(tags::table)
                .values(&NewTag { title: title.clone() })
                .on_conflict(tags::title)
                .do_update()
                .set(tags::title.eq(excluded(tags::title)))
                .get_result(conn)?;

            diesel::insert_into(event_tags::table)
                .values(&NewEventTag { event_id: event.id, tag_id: tag.id })
                .on_conflict_do_nothing()
                .execute(conn)?;
        }

        let image_rows: Vec<NewEventImage> = req
            .images
            .iter()
            .map(|url| NewEventImage { event_id: event.id, url: url.clone() })
            .collect();
        if !image_rows.is_empty() {
            diesel::insert_into(event_images::table)
                .values(&image_rows)
                .execute(conn)?;
        }

        diesel::insert_into(event_members::table)
            .values(&NewEventMember { event_id: event.id, user_id: user.id })
            .execute(conn)?;

        load_event_detail(conn, event)
    })?;

    tracing::info!(event_id = %detail.event.id, creator_id = %user.id, "event created");

    Ok(Json(ApiResponse::ok(detail)))
}

/// PUT /events/:id - creator-only partial update
pub async fn update_event(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
    Path(event_id): Path<Uuid>,
    Json(req): Json<UpdateEvent>,
) -> AppResult<Json<ApiResponse<EventDetail>>> {
    let mut conn = state.db.get().map_err(|e| AppError::internal(e.to_string()))?;

    let event: Event = events::table
        .filter(events::id.eq(event_id))
        .first(&mut conn)
        .map_err(|_| AppError::new(ErrorCode::EventNotFound, "event not found"))?;

    if event.creator_id != user.id {
        return Err(AppError::forbidden("only the creator can edit an event"));
    }

    let updated: Event = diesel::update(events::table.filter(events::id.eq(event_id)))
        .set((&req, events::updated_at.eq(Utc::now())))
        .get_result(&mut conn)?;

    let detail = load_event_detail(&mut conn, updated)?;
    Ok(Json(ApiResponse::ok(detail)))
}

/// DELETE /events/:id - creator-only; joins go with the event
pub async fn delete_event(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
    Path(event_id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<&'static str>>> {
    let mut conn = state.db.get().map_err(|e| AppError::internal(e.to_string()))?;

    let event: Event = events::table
        .filter(events::id.eq(event_id))
        .first(&mut conn)
        .map_err(|_| AppError::new(ErrorCode::EventNotFound, "event not found"))?;

    if event.creator_id != user.id {
        return Err(AppError::forbidden("only the creator can delete an event"));
    }

    conn.transaction(|conn| {
        diesel::delete(event_tags::table.filter(event_tags::event_id.eq(event_id))).execute(conn)?;
        diesel::delete(event_images::table.filter(event_images::event_id.eq(event_id))).execute(conn)?;
        diesel::delete(event_members::table.filter(event_members::event_id.eq(event_id))).execute(conn)?;
        diesel::delete(events::table.filter(events::id.eq(event_id))).execute(conn)?;
        Ok::<_, diesel::result::Error>(())
    })?;

    tracing::info!(event_id = %event_id, user_id = %user.id, "event deleted");

    Ok(Json(ApiResponse::ok("event deleted")))
}

/// POST /events/:id/join
pub async fn join_event(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
    Path(event_id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<&'static str>>> {
    let mut conn = state.db.get().map_err(|e| AppError::internal(e.to_string()))?;

    let event: Event = events::table
        .filter(events::id.eq(event_id))
        .first(&mut conn)
        .map_err(|_| AppError::new(ErrorCode::EventNotFound, "event not found"))?;

    conn.transaction(|conn| {
        if let Some(limit) = event.users_limit {
            let member_count: i64 = event_members::table
                .filter(event_members::event_id.eq(event_id))
                .select(count_star())
                .first(conn)?;
            if member_count >= limit as i64 {
                return Err(diesel::result::Error::RollbackTransaction);
            }
        }

        diesel::insert_into(event_members::table)
            .values(&NewEventMember { event_id, user_id: user.id })
            .execute(conn)?;

        Ok(())
    })
    .map_err(|e| match e {
        diesel::result::Error::RollbackTransaction => {
            AppError::new(ErrorCode::EventFull, "event is full")
        }
        other => {
            let err = AppError::Database(other);
            if err.is_unique_violation() {
                AppError::new(ErrorCode::AlreadyJoinedEvent, "already joined this event")
            } else {
                err
            }
        }
    })?;

    tracing::info!(event_id = %event_id, user_id = %user.id, "joined event");

    Ok(Json(ApiResponse::ok("joined event")))
}
