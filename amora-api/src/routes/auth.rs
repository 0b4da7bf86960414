use axum::extract::State;
use axum::{Form, Json};
use chrono::NaiveDate;
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

use amora_shared::errors::{AppError, AppResult, ErrorCode};
use amora_shared::types::auth::{AccessToken, AuthUser, UserRole};
use amora_shared::types::ApiResponse;

use crate::models::{NewUser, User};
use crate::schema::users;
use crate::services::{auth_service, token_service};
use crate::AppState;

const VERIFICATION_CODE_TTL_SECS: u64 = 15 * 60;

fn verification_key(user_id: Uuid) -> String {
    format!("verify:code:{user_id}")
}

#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(email(message = "invalid email format"))]
    pub email: String,
    pub password: String,
    pub name: String,
    pub city: String,
    pub birthday: NaiveDate,
    pub position: String,
    #[validate(range(min = 50, max = 250, message = "height must be between 50 and 250 cm"))]
    pub height: i32,
    pub gender_id: i32,
    pub target_id: i32,
    pub communication_id: i32,
    pub biography: Option<String>,
}

pub async fn register(
    State(state): State<Arc<AppState>>,
    Json(req): Json<RegisterRequest>,
) -> AppResult<Json<ApiResponse<AccessToken>>> {
    req.validate()
        .map_err(|e| AppError::new(ErrorCode::ValidationError, e.to_string()))?;

    auth_service::validate_password(&req.password)?;

    let password_hash = auth_service::hash_password(&req.password)?;
    let mut conn = state.db.get().map_err(|e| AppError::internal(e.to_string()))?;

    let email = req.email.to_lowercase();

    // Check if email already exists
    let exists: bool = users::table
        .filter(users::email.eq(&email))
        .count()
        .get_result::<i64>(&mut conn)
        .map(|c| c > 0)
        .unwrap_or(false);

    if exists {
        return Err(AppError::new(ErrorCode::EmailAlreadyExists, "email already registered"));
    }

    let new_user = NewUser {
        email,
        password_hash,
        name: req.name,
        city: req.city,
        birthday: req.birthday,
        position: req.position,
        height: req.height,
        gender_id: req.gender_id,
        target_id: req.target_id,
        communication_id: req.communication_id,
        biography: req.biography,
    };

    let user: User = diesel::insert_into(users::table)
        .values(&new_user)
        .get_result(&mut conn)?;

    // Verification code lives in Redis with a TTL, never in process memory
    let code = auth_service::generate_verification_code();
    if let Err(e) = state
        .redis
        .set(
            &verification_key(user.id),
            &token_service::hash_code(&code),
            VERIFICATION_CODE_TTL_SECS,
        )
        .await
    {
        tracing::error!(error = %e, "failed to store verification code");
    }

    if let Err(e) = state.email.send_verification_code(&user.email, &code).await {
        tracing::error!(error = %e, "failed to send verification email");
    }

    let role = user.role.parse::<UserRole>().unwrap_or(UserRole::User);
    let token = token_service::create_access_token(
        user.id,
        role,
        &state.config.jwt_secret,
        state.config.jwt_access_ttl,
    )?;

    tracing::info!(user_id = %user.id, email = %user.email, "user registered");

    Ok(Json(ApiResponse::ok(token)))
}

/// OAuth2-password-style form login: `username` carries the email.
#[derive(Debug, Deserialize)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
}

pub async fn login(
    State(state): State<Arc<AppState>>,
    Form(form): Form<LoginForm>,
) -> AppResult<Json<ApiResponse<AccessToken>>> {
    let email = form.username.to_lowercase();

    let rate_key = format!("login:rate:{email}");
    let allowed = state
        .redis
        .rate_limit_check(&rate_key, state.config.login_rate_limit, state.config.login_rate_window_secs)
        .await
        .unwrap_or(true);
    if !allowed {
        return Err(AppError::new(ErrorCode::RateLimited, "too many login attempts, try later"));
    }

    let mut conn = state.db.get().map_err(|e| AppError::internal(e.to_string()))?;

    let user: User = users::table
        .filter(users::email.eq(&email))
        .filter(users::is_deleted.eq(false))
        .first(&mut conn)
        .map_err(|_| AppError::new(ErrorCode::InvalidCredentials, "invalid email or password"))?;

    let valid = auth_service::verify_password(&form.password, &user.password_hash)?;
    if !valid {
        return Err(AppError::new(ErrorCode::InvalidCredentials, "invalid email or password"));
    }

    let role = user.role.parse::<UserRole>().unwrap_or(UserRole::User);
    let token = token_service::create_access_token(
        user.id,
        role,
        &state.config.jwt_secret,
        state.config.jwt_access_ttl,
    )?;

    tracing::info!(user_id = %user.id, "user logged in");

    Ok(Json(ApiResponse::ok(token)))
}

#[derive(Debug, Serialize)]
pub struct MeResponse {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    pub city: String,
    pub birthday: NaiveDate,
    pub position: String,
    pub height: i32,
    pub gender_id: i32,
    pub target_id: i32,
    pub communication_id: i32,
    pub biography: Option<String>,
    pub email_verified: bool,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

impl From<User> for MeResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            email: user.email,
            name: user.name,
            city: user.city,
            birthday: user.birthday,
            position: user.position,
            height: user.height,
            gender_id: user.gender_id,
            target_id: user.target_id,
            communication_id: user.communication_id,
            biography: user.biography,
            email_verified: user.email_verified,
            created_at: user.created_at,
        }
    }
}

pub async fn me(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
) -> AppResult<Json<ApiResponse<MeResponse>>> {
    let mut conn = state.db.get().map_err(|e| AppError::internal(e.to_string()))?;

    let record: User = users::table
        .filter(users::id.eq(user.id))
        .filter(users::is_deleted.eq(false))
        .first(&mut conn)
        .map_err(|_| AppError::new(ErrorCode::UserNotFound, "user not found"))?;

    Ok(Json(ApiResponse::ok(record.into())))
}

#[derive(Debug, Deserialize)]
pub struct VerifyEmailRequest {
    pub code: String,
}

pub async fn verify_email(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
    Json(req): Json<VerifyEmailRequest>,
) -> AppResult<Json<ApiResponse<&'static str>>> {
    let key = verification_key(user.id);
    let stored = state
        .redis
        .get(&key)
        .await
        .map_err(|e| AppError::internal(e.to_string()))?
        .ok_or_else(|| AppError::new(ErrorCode::VerificationCodeExpired, "verification code expired"))?;

    if stored != token_service::hash_code(&req.code) {
        return Err(AppError::new(ErrorCode::VerificationCodeInvalid, "invalid verification code"));
    }

    let mut conn = state.db.get().map_err(|e| AppError::internal(e.to_string()))?;
    diesel::update(users::table.filter(users::id.eq(user.id)))
        .set(users::email_verified.eq(true))
        .execute(&mut conn)?;

    let _ = state.redis.del(&key).await;

    tracing::info!(user_id = %user.id, "email verified");

    Ok(Json(ApiResponse::ok("email verified")))
}
