use diesel::prelude::*;
use diesel::PgConnection;
use serde::Serialize;
use uuid::Uuid;

use crate::models::{Dialogue, NewDialogue};
use crate::schema::{dialogues, reactions};

use super::ReactionKind;

/// Outcome of running match detection after a successful like insert.
#[derive(Debug, Serialize)]
pub struct MatchOutcome {
    pub matched: bool,
    pub dialogue_created: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dialogue_id: Option<Uuid>,
}

impl MatchOutcome {
    pub fn no_match() -> Self {
        Self {
            matched: false,
            dialogue_created: false,
            dialogue_id: None,
        }
    }
}

/// Dialogues store the unordered pair normalized: smaller UUID first. The
/// unique index on (user_a, user_b) only works because of this.
pub fn normalize_pair(a: Uuid, b: Uuid) -> (Uuid, Uuid) {
    if a < b {
        (a, b)
    } else {
        (b, a)
    }
}

/// Check for a reciprocal like and ensure exactly one dialogue exists for the
/// unordered pair. Runs inside the caller's transaction, right after the
/// like(from -> to) insert.
///
/// Creation relies on the unique pair constraint, not a preceding SELECT:
/// the insert does nothing on conflict, and the conflict path revives a
/// soft-deleted dialogue instead of inserting a duplicate. Two concurrent
/// mutual likes therefore converge on the same row.
pub fn check_and_create_dialogue(
    conn: &mut PgConnection,
    from: Uuid,
    to: Uuid,
) -> Result<MatchOutcome, diesel::result::Error> {
    let reciprocal: Option<Uuid> = reactions::table
        .filter(reactions::user_from.eq(to))
        .filter(reactions::user_to.eq(from))
        .filter(reactions::kind.eq(ReactionKind::Like.as_str()))
        .select(reactions::id)
        .first(conn)
        .optional()?;

    if reciprocal.is_none() {
        return Ok(MatchOutcome::no_match());
    }

    let (user_a, user_b) = normalize_pair(from, to);

    let inserted: Option<Dialogue> = diesel::insert_into(dialogues::table)
        .values(&NewDialogue { user_a, user_b })
        .on_conflict((dialogues::user_a, dialogues::user_b))
        .do_nothing()
        .get_result(conn)
        .optional()?;

    if let Some(dialogue) = inserted {
        tracing::info!(dialogue_id = %dialogue.id, user_a = %user_a, user_b = %user_b, "dialogue created on mutual like");
        return Ok(MatchOutcome {
            matched: true,
            dialogue_created: true,
            dialogue_id: Some(dialogue.id),
        });
    }

    // The pair already has a dialogue; a soft-deleted one comes back to life.
    let existing: Dialogue = diesel::update(
        dialogues::table
            .filter(dialogues::user_a.eq(user_a))
            .filter(dialogues::user_b.eq(user_b)),
    )
    .set(dialogues::deleted_at.eq(None::<chrono::DateTime<chrono::Utc>>))
    .get_result(conn)?;

    Ok(MatchOutcome {
        matched: true,
        dialogue_created: false,
        dialogue_id: Some(existing.id),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pair_normalization_is_order_insensitive() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        assert_eq!(normalize_pair(a, b), normalize_pair(b, a));
    }

    #[test]
    fn normalized_pair_is_ordered() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let (lo, hi) = normalize_pair(a, b);
        assert!(lo < hi);
    }

    #[test]
    fn no_match_outcome_carries_no_dialogue() {
        let outcome = MatchOutcome::no_match();
        assert!(!outcome.matched);
        assert!(!outcome.dialogue_created);
        assert!(outcome.dialogue_id.is_none());
    }
}
