use axum::extract::{Path, State};
use axum::Json;
use diesel::prelude::*;
use serde::Serialize;
use std::collections::HashSet;
use std::sync::Arc;
use uuid::Uuid;

use amora_shared::errors::{AppError, AppResult, ErrorCode};
use amora_shared::types::auth::AuthUser;
use amora_shared::types::ApiResponse;

use crate::matching::detector::{check_and_create_dialogue, MatchOutcome};
use crate::matching::ReactionKind;
use crate::models::NewReaction;
use crate::schema::{reactions, users};
use crate::AppState;

#[derive(Debug, Serialize)]
pub struct ReactionResponse {
    pub user_to: Uuid,
    pub kind: &'static str,
    #[serde(flatten)]
    pub outcome: MatchOutcome,
}

fn record_reaction(
    state: &Arc<AppState>,
    from: AuthUser,
    to: Uuid,
    kind: ReactionKind,
) -> AppResult<ReactionResponse> {
    if from.id == to {
        return Err(AppError::new(ErrorCode::CannotReactToSelf, "cannot react to yourself"));
    }

    let mut conn = state.db.get().map_err(|e| AppError::internal(e.to_string()))?;

    // Target must be a live account
    let target_exists: bool = users::table
        .filter(users::id.eq(to))
        .filter(users::is_deleted.eq(false))
        .count()
        .get_result::<i64>(&mut conn)
        .map(|c| c > 0)?;

    if !target_exists {
        return Err(AppError::new(ErrorCode::UserNotFound, "user not found"));
    }

    let outcome = conn
        .transaction(|conn| {
            diesel::insert_into(reactions::table)
                .values(&NewReaction {
                    user_from: from.id,
                    user_to: to,
                    kind: kind.as_str().to_string(),
                })
                .execute(conn)?;

            match kind {
                ReactionKind::Like => check_and_create_dialogue(conn, from.id, to),
                ReactionKind::Dislike => Ok(MatchOutcome::no_match()),
            }
        })
        .map_err(|e| {
            let err = AppError::Database(e);
            if err.is_unique_violation() {
                AppError::new(
                    ErrorCode::AlreadyReacted,
                    format!("the user has already been {}d", kind.as_str()),
                )
            } else {
                err
            }
        })?;

    tracing::info!(
        user_from = %from.id,
        user_to = %to,
        kind = %kind,
        matched = outcome.matched,
        "reaction recorded"
    );

    Ok(ReactionResponse {
        user_to: to,
        kind: kind.as_str(),
        outcome,
    })
}

/// POST /matching/like/:user_id
pub async fn create_like(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
    Path(user_to): Path<Uuid>,
) -> AppResult<Json<ApiResponse<ReactionResponse>>> {
    let response = record_reaction(&state, user, user_to, ReactionKind::Like)?;
    Ok(Json(ApiResponse::ok(response)))
}

/// POST /matching/dislike/:user_id
pub async fn create_dislike(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
    Path(user_to): Path<Uuid>,
) -> AppResult<Json<ApiResponse<ReactionResponse>>> {
    let response = record_reaction(&state, user, user_to, ReactionKind::Dislike)?;
    Ok(Json(ApiResponse::ok(response)))
}

fn reacted_ids(
    conn: &mut PgConnection,
    user_id: Uuid,
    kind: ReactionKind,
) -> Result<Vec<Uuid>, diesel::result::Error> {
    reactions::table
        .filter(reactions::user_from.eq(user_id))
        .filter(reactions::kind.eq(kind.as_str()))
        .order(reactions::created_at.asc())
        .select(reactions::user_to)
        .load(conn)
}

/// GET /matching/likes - ids the caller has liked
pub async fn get_likes(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
) -> AppResult<Json<ApiResponse<Vec<Uuid>>>> {
    let mut conn = state.db.get().map_err(|e| AppError::internal(e.to_string()))?;
    let ids = reacted_ids(&mut conn, user.id, ReactionKind::Like)?;
    Ok(Json(ApiResponse::ok(ids)))
}

/// GET /matching/dislikes - ids the caller has disliked
pub async fn get_dislikes(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
) -> AppResult<Json<ApiResponse<Vec<Uuid>>>> {
    let mut conn = state.db.get().map_err(|e| AppError::internal(e.to_string()))?;
    let ids = reacted_ids(&mut conn, user.id, ReactionKind::Dislike)?;
    Ok(Json(ApiResponse::ok(ids)))
}

/// GET /matching/matches - ids with a reciprocal like
pub async fn get_matches(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
) -> AppResult<Json<ApiResponse<Vec<Uuid>>>> {
    let mut conn = state.db.get().map_err(|e| AppError::internal(e.to_string()))?;

    let outgoing: Vec<Uuid> = reacted_ids(&mut conn, user.id, ReactionKind::Like)?;

    let incoming: HashSet<Uuid> = reactions::table
        .filter(reactions::user_to.eq(user.id))
        .filter(reactions::kind.eq(ReactionKind::Like.as_str()))
        .select(reactions::user_from)
        .load::<Uuid>(&mut conn)?
        .into_iter()
        .collect();

    let matches: Vec<Uuid> = outgoing
        .into_iter()
        .filter(|id| incoming.contains(id))
        .collect();

    Ok(Json(ApiResponse::ok(matches)))
}
