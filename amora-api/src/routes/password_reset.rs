use axum::extract::State;
use axum::Json;
use diesel::prelude::*;
use serde::Deserialize;
use std::sync::Arc;

use amora_shared::errors::{AppError, AppResult, ErrorCode};
use amora_shared::types::ApiResponse;

use crate::models::User;
use crate::schema::users;
use crate::services::{auth_service, token_service};
use crate::AppState;

const RESET_CODE_TTL_SECS: u64 = 15 * 60;

fn reset_key(email: &str) -> String {
    format!("reset:code:{email}")
}

#[derive(Debug, Deserialize)]
pub struct ForgotPasswordRequest {
    pub email: String,
}

pub async fn forgot_password(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ForgotPasswordRequest>,
) -> AppResult<Json<ApiResponse<&'static str>>> {
    let email = req.email.to_lowercase();

    // Rate limit
    let rate_key = format!("reset:rate:{email}");
    let allowed = state.redis.rate_limit_check(&rate_key, 1, 60).await.unwrap_or(true);
    if !allowed {
        return Err(AppError::new(ErrorCode::EmailRateLimited, "please wait before requesting a new code"));
    }

    let mut conn = state.db.get().map_err(|e| AppError::internal(e.to_string()))?;

    // Find user (don't reveal if email exists)
    let user = users::table
        .filter(users::email.eq(&email))
        .filter(users::is_deleted.eq(false))
        .first::<User>(&mut conn);

    if let Ok(user) = user {
        let code = auth_service::generate_verification_code();
        state
            .redis
            .set(&reset_key(&email), &token_service::hash_code(&code), RESET_CODE_TTL_SECS)
            .await
            .map_err(|e| AppError::internal(e.to_string()))?;

        if let Err(e) = state.email.send_password_reset_code(&user.email, &code).await {
            tracing::error!(error = %e, "failed to send reset email");
        }
    }

    // Always return success to prevent email enumeration
    Ok(Json(ApiResponse::ok("if the email exists, a reset code has been sent")))
}

#[derive(Debug, Deserialize)]
pub struct ResetPasswordRequest {
    pub email: String,
    pub code: String,
    pub new_password: String,
}

pub async fn reset_password(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ResetPasswordRequest>,
) -> AppResult<Json<ApiResponse<&'static str>>> {
    auth_service::validate_password(&req.new_password)?;

    let email = req.email.to_lowercase();
    let key = reset_key(&email);

    let stored = state
        .redis
        .get(&key)
        .await
        .map_err(|e| AppError::internal(e.to_string()))?
        .ok_or_else(|| AppError::new(ErrorCode::ResetCodeExpired, "reset code expired"))?;

    if stored != token_service::hash_code(&req.code) {
        return Err(AppError::new(ErrorCode::ResetCodeInvalid, "invalid reset code"));
    }

    let mut conn = state.db.get().map_err(|e| AppError::internal(e.to_string()))?;

    let user: User = users::table
        .filter(users::email.eq(&email))
        .filter(users::is_deleted.eq(false))
        .first(&mut conn)
        .map_err(|_| AppError::new(ErrorCode::ResetCodeInvalid, "invalid reset code"))?;

    let new_hash = auth_service::hash_password(&req.new_password)?;
    diesel::update(users::table.filter(users::id.eq(user.id)))
        .set((
            users::password_hash.eq(new_hash),
            users::updated_at.eq(chrono::Utc::now()),
        ))
        .execute(&mut conn)?;

    // A code is single-use
    let _ = state.redis.del(&key).await;

    tracing::info!(user_id = %user.id, "password reset");

    Ok(Json(ApiResponse::ok("password reset successful")))
}
