use axum::extract::State;
use axum::Json;
use chrono::Utc;
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use amora_shared::errors::{AppError, AppResult, ErrorCode};
use amora_shared::types::auth::AuthUser;
use amora_shared::types::ApiResponse;

use crate::models::{Filter, NewFilter, NewFilterInterest};
use crate::schema::{filter_interests, filters};
use crate::AppState;

#[derive(Debug, Deserialize, Default)]
pub struct FilterRequest {
    pub age_min: Option<i32>,
    pub age_max: Option<i32>,
    pub height_min: Option<i32>,
    pub height_max: Option<i32>,
    pub gender_id: Option<i32>,
    pub target_id: Option<i32>,
    pub communication_id: Option<i32>,
    pub city: Option<String>,
    pub interests: Option<Vec<Uuid>>,
}

#[derive(Debug, Serialize)]
pub struct FilterResponse {
    #[serde(flatten)]
    pub filter: Filter,
    pub interests: Vec<Uuid>,
}

/// Per-field coalesce: a field present in the patch wins, an omitted field
/// keeps its stored value. Explicit zeroes are values, not absences.
fn merge_filters(existing: &Filter, patch: &FilterRequest) -> NewFilter {
    NewFilter {
        user_id: existing.user_id,
        age_min: patch.age_min.or(existing.age_min),
        age_max: patch.age_max.or(existing.age_max),
        height_min: patch.height_min.or(existing.height_min),
        height_max: patch.height_max.or(existing.height_max),
        gender_id: patch.gender_id.or(existing.gender_id),
        target_id: patch.target_id.or(existing.target_id),
        communication_id: patch.communication_id.or(existing.communication_id),
        city: patch.city.clone().or_else(|| existing.city.clone()),
    }
}

fn validate_ranges(req: &FilterRequest) -> Result<(), AppError> {
    if let (Some(min), Some(max)) = (req.age_min, req.age_max) {
        if min > max {
            return Err(AppError::new(ErrorCode::ValidationError, "age_min must not exceed age_max"));
        }
    }
    if let (Some(min), Some(max)) = (req.height_min, req.height_max) {
        if min > max {
            return Err(AppError::new(ErrorCode::ValidationError, "height_min must not exceed height_max"));
        }
    }
    Ok(())
}

fn replace_filter_interests(
    conn: &mut PgConnection,
    user_id: Uuid,
    interest_ids: &[Uuid],
) -> Result<(), diesel::result::Error> {
    diesel::delete(filter_interests::table.filter(filter_interests::user_id.eq(user_id)))
        .execute(conn)?;
    let rows: Vec<NewFilterInterest> = interest_ids
        .iter()
        .map(|interest_id| NewFilterInterest { user_id, interest_id: *interest_id })
        .collect();
    if !rows.is_empty() {
        diesel::insert_into(filter_interests::table)
            .values(&rows)
            .execute(conn)?;
    }
    Ok(())
}

fn load_filter_interests(
    conn: &mut PgConnection,
    user_id: Uuid,
) -> Result<Vec<Uuid>, diesel::result::Error> {
    filter_interests::table
        .filter(filter_interests::user_id.eq(user_id))
        .select(filter_interests::interest_id)
        .load(conn)
}

/// POST /matching/filters - create the caller's search filters
pub async fn create_filters(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
    Json(req): Json<FilterRequest>,
) -> AppResult<Json<ApiResponse<FilterResponse>>> {
    validate_ranges(&req)?;

    let mut conn = state.db.get().map_err(|e| AppError::internal(e.to_string()))?;

    let result = conn.transaction(|conn| {
        let new_filter = NewFilter {
            user_id: user.id,
            age_min: req.age_min,
            age_max: req.age_max,
            height_min: req.height_min,
            height_max: req.height_max,
            gender_id: req.gender_id,
            target_id: req.target_id,
            communication_id: req.communication_id,
            city: req.city.clone(),
        };

        let filter: Filter = diesel::insert_into(filters::table)
            .values(&new_filter)
            .get_result(conn)?;

        if let Some(interest_ids) = &req.interests {
            replace_filter_interests(conn, user.id, interest_ids)?;
        }

        let interest_ids = load_filter_interests(conn, user.id)?;
        Ok::<_, diesel::result::Error>(FilterResponse { filter, interests: interest_ids })
    });

    match result {
        Ok(response) => {
            tracing::info!(user_id = %user.id, "filters created");
            Ok(Json(ApiResponse::ok(response)))
        }
        Err(err) => {
            let err = AppError::Database(err);
            if err.is_unique_violation() {
                Err(AppError::new(ErrorCode::FiltersAlreadyExist, "filters already exist for this user"))
            } else {
                Err(err)
            }
        }
    }
}

/// PATCH /matching/filters - partial update; a supplied interest list
/// replaces the previous one wholesale, an omitted one is untouched.
pub async fn patch_filters(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
    Json(req): Json<FilterRequest>,
) -> AppResult<Json<ApiResponse<FilterResponse>>> {
    validate_ranges(&req)?;

    let mut conn = state.db.get().map_err(|e| AppError::internal(e.to_string()))?;

    let response = conn.transaction(|conn| {
        let existing: Option<Filter> = filters::table
            .filter(filters::user_id.eq(user.id))
            .first(conn)
            .optional()?;

        let Some(existing) = existing else {
            return Err(diesel::result::Error::NotFound);
        };

        let merged = merge_filters(&existing, &req);

        let filter: Filter = diesel::update(filters::table.filter(filters::user_id.eq(user.id)))
            .set((
                filters::age_min.eq(merged.age_min),
                filters::age_max.eq(merged.age_max),
                filters::height_min.eq(merged.height_min),
                filters::height_max.eq(merged.height_max),
                filters::gender_id.eq(merged.gender_id),
                filters::target_id.eq(merged.target_id),
                filters::communication_id.eq(merged.communication_id),
                filters::city.eq(merged.city),
                filters::updated_at.eq(Utc::now()),
            ))
            .get_result(conn)?;

        if let Some(interest_ids) = &req.interests {
            replace_filter_interests(conn, user.id, interest_ids)?;
        }

        let interest_ids = load_filter_interests(conn, user.id)?;
        Ok(FilterResponse { filter, interests: interest_ids })
    })
    .map_err(|e| match e {
        diesel::result::Error::NotFound => {
            AppError::new(ErrorCode::FiltersNotFound, "no filters were found for this user")
        }
        other => AppError::Database(other),
    })?;

    tracing::info!(user_id = %user.id, "filters updated");

    Ok(Json(ApiResponse::ok(response)))
}

/// GET /matching/filters - the caller's stored filters
pub async fn get_filters(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
) -> AppResult<Json<ApiResponse<FilterResponse>>> {
    let mut conn = state.db.get().map_err(|e| AppError::internal(e.to_string()))?;

    let filter: Filter = filters::table
        .filter(filters::user_id.eq(user.id))
        .first(&mut conn)
        .map_err(|_| AppError::new(ErrorCode::FiltersNotFound, "no filters were found for this user"))?;

    let interest_ids = load_filter_interests(&mut conn, user.id)
        .map_err(AppError::Database)?;

    Ok(Json(ApiResponse::ok(FilterResponse { filter, interests: interest_ids })))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stored(user_id: Uuid) -> Filter {
        Filter {
            user_id,
            age_min: Some(0),
            age_max: Some(35),
            height_min: Some(160),
            height_max: Some(190),
            gender_id: Some(1),
            target_id: None,
            communication_id: Some(2),
            city: Some("Berlin".into()),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn omitted_fields_keep_stored_values() {
        let user_id = Uuid::new_v4();
        let patch = FilterRequest {
            city: Some("Hamburg".into()),
            ..Default::default()
        };

        let merged = merge_filters(&stored(user_id), &patch);

        assert_eq!(merged.city.as_deref(), Some("Hamburg"));
        assert_eq!(merged.age_min, Some(0));
        assert_eq!(merged.age_max, Some(35));
        assert_eq!(merged.height_min, Some(160));
        assert_eq!(merged.communication_id, Some(2));
    }

    #[test]
    fn explicit_zero_survives_a_later_patch() {
        // The stored age_min of 0 must not be treated as absent.
        let user_id = Uuid::new_v4();
        let patch = FilterRequest {
            height_max: Some(200),
            ..Default::default()
        };

        let merged = merge_filters(&stored(user_id), &patch);
        assert_eq!(merged.age_min, Some(0));
        assert_eq!(merged.height_max, Some(200));
    }

    #[test]
    fn patched_fields_win() {
        let user_id = Uuid::new_v4();
        let patch = FilterRequest {
            age_min: Some(21),
            age_max: Some(40),
            gender_id: Some(3),
            ..Default::default()
        };

        let merged = merge_filters(&stored(user_id), &patch);
        assert_eq!(merged.age_min, Some(21));
        assert_eq!(merged.age_max, Some(40));
        assert_eq!(merged.gender_id, Some(3));
    }

    #[test]
    fn inverted_ranges_are_rejected() {
        let req = FilterRequest {
            age_min: Some(40),
            age_max: Some(20),
            ..Default::default()
        };
        assert!(validate_ranges(&req).is_err());

        let req = FilterRequest {
            height_min: Some(10),
            height_max: Some(20),
            ..Default::default()
        };
        assert!(validate_ranges(&req).is_ok());
    }
}
