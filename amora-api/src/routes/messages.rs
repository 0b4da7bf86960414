use axum::extract::{Path, Query, State};
use axum::Json;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use amora_shared::errors::{AppError, AppResult, ErrorCode};
use amora_shared::types::auth::AuthUser;
use amora_shared::types::ApiResponse;

use crate::models::Message;
use crate::routes::dialogues::load_participant_dialogue;
use crate::schema::messages;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct MessagePageParams {
    #[serde(default = "default_limit")]
    pub limit: i64,
    #[serde(default)]
    pub offset: i64,
}

fn default_limit() -> i64 {
    30
}

#[derive(Debug, Serialize)]
pub struct MessageView {
    pub id: Uuid,
    pub dialogue_id: Uuid,
    pub sender_id: Uuid,
    pub content: String,
    pub is_deleted: bool,
    pub edited_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl From<Message> for MessageView {
    fn from(m: Message) -> Self {
        // Deleted messages stay in the history but lose their text.
        let content = if m.is_deleted {
            "message deleted".to_string()
        } else {
            m.content
        };
        Self {
            id: m.id,
            dialogue_id: m.dialogue_id,
            sender_id: m.sender_id,
            content,
            is_deleted: m.is_deleted,
            edited_at: m.edited_at,
            created_at: m.created_at,
        }
    }
}

/// GET /chat/dialogues/:id/messages?limit=30&offset=0 - newest first
pub async fn load_messages(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
    Path(dialogue_id): Path<Uuid>,
    Query(params): Query<MessagePageParams>,
) -> AppResult<Json<ApiResponse<Vec<MessageView>>>> {
    let mut conn = state.db.get().map_err(|e| AppError::internal(e.to_string()))?;

    let dialogue = load_participant_dialogue(&mut conn, dialogue_id, user.id)?;

    let limit = params.limit.clamp(1, 100);
    let offset = params.offset.max(0);

    let page: Vec<Message> = messages::table
        .filter(messages::dialogue_id.eq(dialogue.id))
        .order(messages::created_at.desc())
        .limit(limit)
        .offset(offset)
        .load(&mut conn)?;

    Ok(Json(ApiResponse::ok(page.into_iter().map(MessageView::from).collect())))
}

fn load_own_message(
    conn: &mut PgConnection,
    message_id: Uuid,
    user_id: Uuid,
) -> Result<Message, AppError> {
    let message: Message = messages::table
        .filter(messages::id.eq(message_id))
        .first(conn)
        .map_err(|_| AppError::new(ErrorCode::MessageNotFound, "message not found"))?;

    if message.sender_id != user_id {
        return Err(AppError::new(ErrorCode::NotMessageAuthor, "not the author of this message"));
    }

    Ok(message)
}

#[derive(Debug, Deserialize)]
pub struct EditMessageRequest {
    pub content: String,
}

/// PATCH /chat/messages/:id - author-only edit
pub async fn edit_message(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
    Path(message_id): Path<Uuid>,
    Json(req): Json<EditMessageRequest>,
) -> AppResult<Json<ApiResponse<MessageView>>> {
    if req.content.trim().is_empty() {
        return Err(AppError::new(ErrorCode::ValidationError, "message must not be empty"));
    }

    let mut conn = state.db.get().map_err(|e| AppError::internal(e.to_string()))?;

    let message = load_own_message(&mut conn, message_id, user.id)?;
    if message.is_deleted {
        return Err(AppError::new(ErrorCode::MessageNotFound, "message not found"));
    }

    let updated: Message = diesel::update(messages::table.filter(messages::id.eq(message.id)))
        .set((
            messages::content.eq(req.content),
            messages::edited_at.eq(Some(Utc::now())),
        ))
        .get_result(&mut conn)?;

    Ok(Json(ApiResponse::ok(updated.into())))
}

/// DELETE /chat/messages/:id - author-only soft delete
pub async fn delete_message(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
    Path(message_id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<&'static str>>> {
    let mut conn = state.db.get().map_err(|e| AppError::internal(e.to_string()))?;

    let message = load_own_message(&mut conn, message_id, user.id)?;

    diesel::update(messages::table.filter(messages::id.eq(message.id)))
        .set(messages::is_deleted.eq(true))
        .execute(&mut conn)?;

    tracing::info!(message_id = %message.id, user_id = %user.id, "message soft-deleted");

    Ok(Json(ApiResponse::ok("message deleted")))
}
