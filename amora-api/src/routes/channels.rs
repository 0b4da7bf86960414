use axum::extract::{Path, State};
use axum::Json;
use diesel::dsl::count_star;
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use amora_shared::errors::{AppError, AppResult, ErrorCode};
use amora_shared::types::auth::AuthUser;
use amora_shared::types::ApiResponse;

use crate::models::{Channel, NewChannel, NewChannelMember};
use crate::schema::{channel_members, channels};
use crate::AppState;

#[derive(Debug, Serialize)]
pub struct ChannelList {
    pub size: i64,
    pub channels: Vec<Channel>,
}

/// GET /channels
pub async fn list_channels(
    _user: AuthUser,
    State(state): State<Arc<AppState>>,
) -> AppResult<Json<ApiResponse<ChannelList>>> {
    let mut conn = state.db.get().map_err(|e| AppError::internal(e.to_string()))?;

    let all: Vec<Channel> = channels::table
        .order(channels::created_at.asc())
        .load(&mut conn)?;

    Ok(Json(ApiResponse::ok(ChannelList {
        size: all.len() as i64,
        channels: all,
    })))
}

/// GET /channels/:id
pub async fn get_channel(
    _user: AuthUser,
    State(state): State<Arc<AppState>>,
    Path(channel_id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<Channel>>> {
    let mut conn = state.db.get().map_err(|e| AppError::internal(e.to_string()))?;

    let channel: Channel = channels::table
        .filter(channels::id.eq(channel_id))
        .first(&mut conn)
        .map_err(|_| AppError::new(ErrorCode::ChannelNotFound, "channel not found"))?;

    Ok(Json(ApiResponse::ok(channel)))
}

#[derive(Debug, Serialize)]
pub struct ChannelMembers {
    pub size: i64,
    pub users: Vec<Uuid>,
}

/// GET /channels/:id/members
pub async fn get_channel_members(
    _user: AuthUser,
    State(state): State<Arc<AppState>>,
    Path(channel_id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<ChannelMembers>>> {
    let mut conn = state.db.get().map_err(|e| AppError::internal(e.to_string()))?;

    let exists: i64 = channels::table
        .filter(channels::id.eq(channel_id))
        .select(count_star())
        .first(&mut conn)?;
    if exists == 0 {
        return Err(AppError::new(ErrorCode::ChannelNotFound, "channel not found"));
    }

    let users: Vec<Uuid> = channel_members::table
        .filter(channel_members::channel_id.eq(channel_id))
        .order(channel_members::joined_at.asc())
        .select(channel_members::user_id)
        .load(&mut conn)?;

    Ok(Json(ApiResponse::ok(ChannelMembers {
        size: users.len() as i64,
        users,
    })))
}

#[derive(Debug, Deserialize)]
pub struct CreateChannelRequest {
    pub title: String,
}

/// POST /channels - the creator joins automatically
pub async fn create_channel(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateChannelRequest>,
) -> AppResult<Json<ApiResponse<Channel>>> {
    if req.title.trim().is_empty() {
        return Err(AppError::new(ErrorCode::ValidationError, "title must not be empty"));
    }

    let mut conn = state.db.get().map_err(|e| AppError::internal(e.to_string()))?;

    let channel = conn.transaction(|conn| {
        let channel: Channel = diesel::insert_into(channels::table)
            .values(&NewChannel {
                title: req.title.clone(),
                creator_id: user.id,
            })
            .get_result(conn)?;

        diesel::insert_into(channel_members::table)
            .values(&NewChannelMember {
                channel_id: channel.id,
                user_id: user.id,
            })
            .execute(conn)?;

        Ok::<_, diesel::result::Error>(channel)
    })?;

    tracing::info!(channel_id = %channel.id, creator_id = %user.id, "channel created");

    Ok(Json(ApiResponse::ok(channel)))
}

/// POST /channels/:id/join
pub async fn join_channel(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
    Path(channel_id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<ChannelMembers>>> {
    let mut conn = state.db.get().map_err(|e| AppError::internal(e.to_string()))?;

    let exists: i64 = channels::table
        .filter(channels::id.eq(channel_id))
        .select(count_star())
        .first(&mut conn)?;
    if exists == 0 {
        return Err(AppError::new(ErrorCode::ChannelNotFound, "channel not found"));
    }

    diesel::insert_into(channel_members::table)
        .values(&NewChannelMember { channel_id, user_id: user.id })
        .execute(&mut conn)
        .map_err(|e| {
            let err = AppError::Database(e);
            if err.is_unique_violation() {
                AppError::new(ErrorCode::AlreadyJoinedChannel, "already a member of this channel")
            } else {
                err
            }
        })?;

    let users: Vec<Uuid> = channel_members::table
        .filter(channel_members::channel_id.eq(channel_id))
        .order(channel_members::joined_at.asc())
        .select(channel_members::user_id)
        .load(&mut conn)?;

    tracing::info!(channel_id = %channel_id, user_id = %user.id, "joined channel");

    Ok(Json(ApiResponse::ok(ChannelMembers {
        size: users.len() as i64,
        users,
    })))
}
