use axum::extract::State;
use axum::Json;
use diesel::prelude::*;
use std::sync::Arc;

use amora_shared::errors::{AppError, AppResult};
use amora_shared::middleware::AdminUser;
use amora_shared::types::ApiResponse;

use crate::schema::reactions;
use crate::AppState;

/// DELETE /admin/reactions - clear the whole reaction table
pub async fn reset_reactions(
    AdminUser(admin): AdminUser,
    State(state): State<Arc<AppState>>,
) -> AppResult<Json<ApiResponse<&'static str>>> {
    let mut conn = state.db.get().map_err(|e| AppError::internal(e.to_string()))?;

    let removed = diesel::delete(reactions::table).execute(&mut conn)?;

    tracing::warn!(admin_id = %admin.id, removed, "reaction table cleared");

    Ok(Json(ApiResponse::ok("reactions cleared")))
}
