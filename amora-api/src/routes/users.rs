use axum::extract::{Path, State};
use axum::Json;
use chrono::Utc;
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use amora_shared::errors::{AppError, AppResult, ErrorCode};
use amora_shared::types::auth::AuthUser;
use amora_shared::types::ApiResponse;

use crate::matching::score::derived_age;
use crate::models::{Interest, NewUserInterest, UpdateUser, User};
use crate::schema::{interests, user_interests, users};
use crate::AppState;

#[derive(Debug, Serialize)]
pub struct PublicProfile {
    pub id: Uuid,
    pub name: String,
    pub city: String,
    pub age: i32,
    pub position: String,
    pub height: i32,
    pub gender_id: i32,
    pub target_id: i32,
    pub communication_id: i32,
    pub biography: Option<String>,
    pub interests: Vec<Interest>,
}

/// GET /users/:id - public profile of a live account
pub async fn get_user(
    _viewer: AuthUser,
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<PublicProfile>>> {
    let mut conn = state.db.get().map_err(|e| AppError::internal(e.to_string()))?;

    let user: User = users::table
        .filter(users::id.eq(user_id))
        .filter(users::is_deleted.eq(false))
        .first(&mut conn)
        .map_err(|_| AppError::new(ErrorCode::UserNotFound, "user not found"))?;

    let user_interest_list: Vec<Interest> = user_interests::table
        .inner_join(interests::table)
        .filter(user_interests::user_id.eq(user.id))
        .select((interests::id, interests::title))
        .load::<Interest>(&mut conn)?;

    let today = Utc::now().date_naive();
    Ok(Json(ApiResponse::ok(PublicProfile {
        id: user.id,
        name: user.name,
        city: user.city,
        age: derived_age(user.birthday, today),
        position: user.position,
        height: user.height,
        gender_id: user.gender_id,
        target_id: user.target_id,
        communication_id: user.communication_id,
        biography: user.biography,
        interests: user_interest_list,
    })))
}

#[derive(Debug, Deserialize)]
pub struct UpdateProfileRequest {
    #[serde(flatten)]
    pub fields: UpdateUser,
    pub interests: Option<Vec<Uuid>>,
}

/// PATCH /users/me - partial update; omitted fields keep their stored value,
/// a supplied interest list replaces the previous one wholesale.
pub async fn update_me(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
    Json(req): Json<UpdateProfileRequest>,
) -> AppResult<Json<ApiResponse<crate::routes::auth::MeResponse>>> {
    let mut conn = state.db.get().map_err(|e| AppError::internal(e.to_string()))?;

    let updated: User = conn.transaction(|conn| {
        let updated: User = diesel::update(
            users::table
                .filter(users::id.eq(user.id))
                .filter(users::is_deleted.eq(false)),
        )
        .set((&req.fields, users::updated_at.eq(Utc::now())))
        .get_result(conn)?;

        if let Some(interest_ids) = &req.interests {
            diesel::delete(user_interests::table.filter(user_interests::user_id.eq(user.id)))
                .execute(conn)?;
            let rows: Vec<NewUserInterest> = interest_ids
                .iter()
                .map(|interest_id| NewUserInterest {
                    user_id: user.id,
                    interest_id: *interest_id,
                })
                .collect();
            if !rows.is_empty() {
                diesel::insert_into(user_interests::table)
                    .values(&rows)
                    .execute(conn)?;
            }
        }

        Ok::<_, diesel::result::Error>(updated)
    })
    .map_err(|e| match e {
        diesel::result::Error::NotFound => AppError::new(ErrorCode::UserNotFound, "user not found"),
        other => AppError::Database(other),
    })?;

    tracing::info!(user_id = %user.id, "profile updated");

    Ok(Json(ApiResponse::ok(updated.into())))
}

/// DELETE /users/me - soft delete; the account disappears from candidates,
/// login, and public reads.
pub async fn delete_me(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
) -> AppResult<Json<ApiResponse<&'static str>>> {
    let mut conn = state.db.get().map_err(|e| AppError::internal(e.to_string()))?;

    let affected = diesel::update(
        users::table
            .filter(users::id.eq(user.id))
            .filter(users::is_deleted.eq(false)),
    )
    .set((users::is_deleted.eq(true), users::updated_at.eq(Utc::now())))
    .execute(&mut conn)?;

    if affected == 0 {
        return Err(AppError::new(ErrorCode::UserNotFound, "user not found"));
    }

    tracing::info!(user_id = %user.id, "account soft-deleted");

    Ok(Json(ApiResponse::ok("account deleted")))
}
