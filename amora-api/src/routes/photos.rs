use axum::extract::{Multipart, Path, State};
use axum::Json;
use diesel::dsl::count_star;
use diesel::prelude::*;
use std::sync::Arc;
use uuid::Uuid;

use amora_shared::errors::{AppError, AppResult, ErrorCode};
use amora_shared::types::auth::AuthUser;
use amora_shared::types::ApiResponse;

use crate::models::{NewPhoto, Photo};
use crate::schema::photos;
use crate::AppState;

/// POST /photos - multipart upload; the blob goes to object storage, only
/// the key and URL are recorded. The first photo becomes the profile photo.
pub async fn upload_photo(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> AppResult<Json<ApiResponse<Photo>>> {
    let field = multipart
        .next_field()
        .await
        .map_err(|e| AppError::new(ErrorCode::PhotoUploadFailed, format!("failed to read multipart: {e}")))?
        .ok_or_else(|| AppError::new(ErrorCode::PhotoUploadFailed, "no file provided"))?;

    let content_type = field
        .content_type()
        .unwrap_or("application/octet-stream")
        .to_string();

    let ext = match content_type.as_str() {
        "image/jpeg" | "image/jpg" => "jpg",
        "image/png" => "png",
        "image/webp" => "webp",
        "image/gif" => "gif",
        _ => {
            return Err(AppError::new(
                ErrorCode::PhotoUploadFailed,
                "unsupported image format, accepted: jpeg, png, webp, gif",
            ));
        }
    };

    let data = field
        .bytes()
        .await
        .map_err(|e| AppError::new(ErrorCode::PhotoUploadFailed, format!("failed to read file data: {e}")))?;

    let photo_id = Uuid::now_v7();
    let key = format!("users/{}/{}.{}", user.id, photo_id, ext);

    let url = state
        .minio
        .upload(&key, data.to_vec(), &content_type)
        .await
        .map_err(|e| AppError::new(ErrorCode::PhotoUploadFailed, e))?;

    let mut conn = state.db.get().map_err(|e| AppError::internal(e.to_string()))?;

    let photo = conn.transaction(|conn| {
        let existing: i64 = photos::table
            .filter(photos::user_id.eq(user.id))
            .select(count_star())
            .first(conn)?;

        let photo: Photo = diesel::insert_into(photos::table)
            .values(&NewPhoto {
                user_id: user.id,
                object_key: key.clone(),
                url: url.clone(),
                content_type: content_type.clone(),
                is_profile: existing == 0,
            })
            .get_result(conn)?;

        Ok::<_, diesel::result::Error>(photo)
    })?;

    tracing::info!(user_id = %user.id, photo_id = %photo.id, "photo uploaded");

    Ok(Json(ApiResponse::ok(photo)))
}

/// PATCH /photos/:id/profile - exactly one photo carries the flag
pub async fn set_profile_photo(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
    Path(photo_id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<Photo>>> {
    let mut conn = state.db.get().map_err(|e| AppError::internal(e.to_string()))?;

    let photo = conn.transaction(|conn| {
        diesel::update(photos::table.filter(photos::user_id.eq(user.id)))
            .set(photos::is_profile.eq(false))
            .execute(conn)?;

        let photo: Photo = diesel::update(
            photos::table
                .filter(photos::id.eq(photo_id))
                .filter(photos::user_id.eq(user.id)),
        )
        .set(photos::is_profile.eq(true))
        .get_result(conn)?;

        Ok::<_, diesel::result::Error>(photo)
    })
    .map_err(|e| match e {
        diesel::result::Error::NotFound => {
            AppError::new(ErrorCode::PhotoNotFound, "photo not found or not owned by you")
        }
        other => AppError::Database(other),
    })?;

    tracing::info!(user_id = %user.id, photo_id = %photo.id, "profile photo set");

    Ok(Json(ApiResponse::ok(photo)))
}

/// GET /photos/profile - the caller's profile photo
pub async fn get_profile_photo(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
) -> AppResult<Json<ApiResponse<Photo>>> {
    let mut conn = state.db.get().map_err(|e| AppError::internal(e.to_string()))?;

    let photo: Photo = photos::table
        .filter(photos::user_id.eq(user.id))
        .filter(photos::is_profile.eq(true))
        .first(&mut conn)
        .map_err(|_| AppError::new(ErrorCode::PhotoNotFound, "profile photo not set"))?;

    Ok(Json(ApiResponse::ok(photo)))
}

/// GET /users/:id/photos
pub async fn list_user_photos(
    _viewer: AuthUser,
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<Vec<Photo>>>> {
    let mut conn = state.db.get().map_err(|e| AppError::internal(e.to_string()))?;

    let all: Vec<Photo> = photos::table
        .filter(photos::user_id.eq(user_id))
        .order(photos::created_at.asc())
        .load(&mut conn)?;

    Ok(Json(ApiResponse::ok(all)))
}
