use axum::extract::{Path, State};
use axum::Json;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::Serialize;
use std::sync::Arc;
use uuid::Uuid;

use amora_shared::errors::{AppError, AppResult, ErrorCode};
use amora_shared::types::auth::AuthUser;
use amora_shared::types::ApiResponse;

use crate::models::{Dialogue, Message};
use crate::schema::{dialogues, messages};
use crate::AppState;

#[derive(Debug, Serialize)]
pub struct DialoguePreview {
    pub id: Uuid,
    pub partner_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub last_message: Option<String>,
    pub last_message_time: Option<DateTime<Utc>>,
}

/// GET /chat/dialogues - the caller's active dialogues, most recent activity first
pub async fn list_dialogues(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
) -> AppResult<Json<ApiResponse<Vec<DialoguePreview>>>> {
    let mut conn = state.db.get().map_err(|e| AppError::internal(e.to_string()))?;

    let rows: Vec<Dialogue> = dialogues::table
        .filter(dialogues::user_a.eq(user.id).or(dialogues::user_b.eq(user.id)))
        .filter(dialogues::deleted_at.is_null())
        .load(&mut conn)?;

    let mut previews = Vec::with_capacity(rows.len());
    for dialogue in rows {
        let last: Option<Message> = messages::table
            .filter(messages::dialogue_id.eq(dialogue.id))
            .order(messages::created_at.desc())
            .first(&mut conn)
            .optional()?;

        let partner_id = if dialogue.user_a == user.id {
            dialogue.user_b
        } else {
            dialogue.user_a
        };

        let last_message_time = last.as_ref().map(|m| m.created_at);
        let last_message = last.map(|m| {
            if m.is_deleted {
                "message deleted".to_string()
            } else {
                m.content
            }
        });

        previews.push(DialoguePreview {
            id: dialogue.id,
            partner_id,
            created_at: dialogue.created_at,
            last_message,
            last_message_time,
        });
    }

    previews.sort_by(|a, b| {
        let a_time = a.last_message_time.unwrap_or(a.created_at);
        let b_time = b.last_message_time.unwrap_or(b.created_at);
        b_time.cmp(&a_time)
    });

    Ok(Json(ApiResponse::ok(previews)))
}

/// Load a live dialogue and check the caller belongs to it.
pub fn load_participant_dialogue(
    conn: &mut PgConnection,
    dialogue_id: Uuid,
    user_id: Uuid,
) -> Result<Dialogue, AppError> {
    let dialogue: Dialogue = dialogues::table
        .filter(dialogues::id.eq(dialogue_id))
        .filter(dialogues::deleted_at.is_null())
        .first(conn)
        .map_err(|_| AppError::new(ErrorCode::DialogueNotFound, "dialogue not found"))?;

    if dialogue.user_a != user_id && dialogue.user_b != user_id {
        return Err(AppError::new(
            ErrorCode::NotDialogueParticipant,
            "not a participant of this dialogue",
        ));
    }

    Ok(dialogue)
}

/// DELETE /chat/dialogues/:id - participant-only soft delete
pub async fn delete_dialogue(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
    Path(dialogue_id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<&'static str>>> {
    let mut conn = state.db.get().map_err(|e| AppError::internal(e.to_string()))?;

    let dialogue = load_participant_dialogue(&mut conn, dialogue_id, user.id)?;

    diesel::update(dialogues::table.filter(dialogues::id.eq(dialogue.id)))
        .set(dialogues::deleted_at.eq(Some(Utc::now())))
        .execute(&mut conn)?;

    tracing::info!(dialogue_id = %dialogue.id, user_id = %user.id, "dialogue soft-deleted");

    Ok(Json(ApiResponse::ok("dialogue deleted")))
}
