use axum::extract::State;
use axum::Json;
use chrono::Utc;
use diesel::prelude::*;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use uuid::Uuid;

use amora_shared::errors::{AppError, AppResult, ErrorCode};
use amora_shared::types::auth::AuthUser;
use amora_shared::types::ApiResponse;

use crate::matching::score::{rank_candidates, CandidateAttrs, SearchFilter};
use crate::models::{Filter, User};
use crate::schema::{filter_interests, filters, reactions, user_interests, users};
use crate::AppState;

/// GET /matching/candidates
///
/// Ranked candidate ids for the caller: everyone else who is live and not
/// yet reacted to, ordered by how many of the caller's filter clauses they
/// satisfy. When nothing matches the filter the whole eligible pool comes
/// back unranked; an empty pool is a 404. Age is derived per call, so the
/// result is never cached.
pub async fn list_candidates(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
) -> AppResult<Json<ApiResponse<Vec<Uuid>>>> {
    let mut conn = state.db.get().map_err(|e| AppError::internal(e.to_string()))?;

    // Everyone the caller already reacted to is out, either kind.
    let reacted: Vec<Uuid> = reactions::table
        .filter(reactions::user_from.eq(user.id))
        .select(reactions::user_to)
        .load(&mut conn)?;

    let mut pool_query = users::table
        .filter(users::id.ne(user.id))
        .filter(users::is_deleted.eq(false))
        .into_boxed();
    if !reacted.is_empty() {
        pool_query = pool_query.filter(users::id.ne_all(reacted));
    }
    let pool: Vec<User> = pool_query.load(&mut conn)?;

    if pool.is_empty() {
        return Err(AppError::new(ErrorCode::NoCandidates, "no candidates found"));
    }

    let pool_ids: Vec<Uuid> = pool.iter().map(|u| u.id).collect();
    let mut interests_by_user: HashMap<Uuid, HashSet<Uuid>> = HashMap::new();
    let interest_rows: Vec<(Uuid, Uuid)> = user_interests::table
        .filter(user_interests::user_id.eq_any(&pool_ids))
        .select((user_interests::user_id, user_interests::interest_id))
        .load(&mut conn)?;
    for (user_id, interest_id) in interest_rows {
        interests_by_user.entry(user_id).or_default().insert(interest_id);
    }

    let filter: Option<Filter> = filters::table
        .filter(filters::user_id.eq(user.id))
        .first(&mut conn)
        .optional()?;

    let search_filter = match filter {
        Some(filter) => {
            let filter_interest_ids: HashSet<Uuid> = filter_interests::table
                .filter(filter_interests::user_id.eq(user.id))
                .select(filter_interests::interest_id)
                .load::<Uuid>(&mut conn)?
                .into_iter()
                .collect();

            Some(SearchFilter {
                age_min: filter.age_min,
                age_max: filter.age_max,
                height_min: filter.height_min,
                height_max: filter.height_max,
                gender_id: filter.gender_id,
                target_id: filter.target_id,
                communication_id: filter.communication_id,
                city: filter.city,
                interests: filter_interest_ids,
            })
        }
        None => None,
    };

    let candidates: Vec<CandidateAttrs> = pool
        .into_iter()
        .map(|u| CandidateAttrs {
            id: u.id,
            city: u.city,
            gender_id: u.gender_id,
            target_id: u.target_id,
            communication_id: u.communication_id,
            height: u.height,
            birthday: u.birthday,
            interests: interests_by_user.remove(&u.id).unwrap_or_default(),
        })
        .collect();

    let today = Utc::now().date_naive();
    let ranked = rank_candidates(search_filter.as_ref(), &candidates, today);

    tracing::debug!(user_id = %user.id, count = ranked.len(), "candidates listed");

    Ok(Json(ApiResponse::ok(ranked)))
}
