use std::collections::HashSet;

use chrono::{Datelike, NaiveDate};
use uuid::Uuid;

/// A viewer's stored search preferences, reduced to the fields the ranking
/// looks at. `None` fields match nothing.
#[derive(Debug, Clone, Default)]
pub struct SearchFilter {
    pub age_min: Option<i32>,
    pub age_max: Option<i32>,
    pub height_min: Option<i32>,
    pub height_max: Option<i32>,
    pub gender_id: Option<i32>,
    pub target_id: Option<i32>,
    pub communication_id: Option<i32>,
    pub city: Option<String>,
    pub interests: HashSet<Uuid>,
}

/// Attributes of one eligible candidate. The pool handed to `rank_candidates`
/// must already exclude the viewer, soft-deleted users, and anyone the viewer
/// has reacted to.
#[derive(Debug, Clone)]
pub struct CandidateAttrs {
    pub id: Uuid,
    pub city: String,
    pub gender_id: i32,
    pub target_id: i32,
    pub communication_id: i32,
    pub height: i32,
    pub birthday: NaiveDate,
    pub interests: HashSet<Uuid>,
}

/// Whole-year age at `today`. Derived at query time, never stored.
pub fn derived_age(birthday: NaiveDate, today: NaiveDate) -> i32 {
    let mut age = today.year() - birthday.year();
    if (today.month(), today.day()) < (birthday.month(), birthday.day()) {
        age -= 1;
    }
    age
}

/// Number of filter clauses the candidate satisfies: one point per matched
/// attribute clause, one point per shared interest.
pub fn score(filter: &SearchFilter, candidate: &CandidateAttrs, today: NaiveDate) -> u32 {
    let mut score = 0;

    if filter.city.as_deref() == Some(candidate.city.as_str()) {
        score += 1;
    }
    if filter.gender_id == Some(candidate.gender_id) {
        score += 1;
    }
    if filter.target_id == Some(candidate.target_id) {
        score += 1;
    }
    if filter.communication_id == Some(candidate.communication_id) {
        score += 1;
    }
    if in_range(candidate.height, filter.height_min, filter.height_max) {
        score += 1;
    }
    if in_range(derived_age(candidate.birthday, today), filter.age_min, filter.age_max) {
        score += 1;
    }

    score += candidate.interests.intersection(&filter.interests).count() as u32;

    score
}

// A half-open bound never matches: both ends must be set.
fn in_range(value: i32, min: Option<i32>, max: Option<i32>) -> bool {
    match (min, max) {
        (Some(min), Some(max)) => value >= min && value <= max,
        _ => false,
    }
}

/// Rank the eligible pool against the viewer's filter.
///
/// Candidates matching at least one clause come back ordered by score
/// descending (id as a deterministic tie-break). When nothing matches, or
/// the viewer has no filter at all, the whole pool is returned unranked.
/// An empty pool stays empty; surfacing that as NotFound is the caller's
/// contract.
pub fn rank_candidates(
    filter: Option<&SearchFilter>,
    pool: &[CandidateAttrs],
    today: NaiveDate,
) -> Vec<Uuid> {
    if let Some(filter) = filter {
        let mut scored: Vec<(u32, Uuid)> = pool
            .iter()
            .map(|c| (score(filter, c, today), c.id))
            .filter(|(s, _)| *s > 0)
            .collect();

        if !scored.is_empty() {
            scored.sort_by(|a, b| b.0.cmp(&a.0).then(a.1.cmp(&b.1)));
            return scored.into_iter().map(|(_, id)| id).collect();
        }
    }

    pool.iter().map(|c| c.id).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn candidate(id: Uuid) -> CandidateAttrs {
        CandidateAttrs {
            id,
            city: "Berlin".into(),
            gender_id: 1,
            target_id: 2,
            communication_id: 3,
            height: 175,
            birthday: date(1995, 6, 15),
            interests: HashSet::new(),
        }
    }

    #[rstest]
    #[case(date(1995, 6, 15), date(2025, 6, 15), 30)]
    #[case(date(1995, 6, 15), date(2025, 6, 14), 29)]
    #[case(date(1995, 6, 15), date(2025, 6, 16), 30)]
    #[case(date(2000, 1, 1), date(2025, 12, 31), 25)]
    fn age_is_whole_years(#[case] birthday: NaiveDate, #[case] today: NaiveDate, #[case] expected: i32) {
        assert_eq!(derived_age(birthday, today), expected);
    }

    #[test]
    fn null_filter_fields_contribute_nothing() {
        let filter = SearchFilter::default();
        let c = candidate(Uuid::new_v4());
        assert_eq!(score(&filter, &c, date(2025, 1, 1)), 0);
    }

    #[test]
    fn city_match_scores_one() {
        let filter = SearchFilter {
            city: Some("Berlin".into()),
            ..Default::default()
        };
        let c = candidate(Uuid::new_v4());
        assert_eq!(score(&filter, &c, date(2025, 1, 1)), 1);
    }

    #[test]
    fn every_clause_counts_once() {
        let filter = SearchFilter {
            age_min: Some(25),
            age_max: Some(35),
            height_min: Some(170),
            height_max: Some(180),
            gender_id: Some(1),
            target_id: Some(2),
            communication_id: Some(3),
            city: Some("Berlin".into()),
            interests: HashSet::new(),
        };
        let c = candidate(Uuid::new_v4());
        assert_eq!(score(&filter, &c, date(2025, 1, 1)), 6);
    }

    #[test]
    fn shared_interests_add_one_each() {
        let hiking = Uuid::new_v4();
        let chess = Uuid::new_v4();
        let cooking = Uuid::new_v4();

        let filter = SearchFilter {
            interests: [hiking, chess, cooking].into_iter().collect(),
            ..Default::default()
        };
        let mut c = candidate(Uuid::new_v4());
        c.interests = [hiking, chess].into_iter().collect();

        assert_eq!(score(&filter, &c, date(2025, 1, 1)), 2);
    }

    #[test]
    fn half_open_ranges_do_not_match() {
        let filter = SearchFilter {
            height_min: Some(170),
            ..Default::default()
        };
        let c = candidate(Uuid::new_v4());
        assert_eq!(score(&filter, &c, date(2025, 1, 1)), 0);
    }

    #[test]
    fn ranking_orders_by_score_descending() {
        let filter = SearchFilter {
            city: Some("Berlin".into()),
            gender_id: Some(1),
            ..Default::default()
        };

        let strong = candidate(Uuid::new_v4());
        let mut weak = candidate(Uuid::new_v4());
        weak.gender_id = 9;
        let mut miss = candidate(Uuid::new_v4());
        miss.city = "Hamburg".into();
        miss.gender_id = 9;

        let ranked = rank_candidates(Some(&filter), &[weak.clone(), miss, strong.clone()], date(2025, 1, 1));
        assert_eq!(ranked, vec![strong.id, weak.id]);
    }

    #[test]
    fn empty_ranked_set_falls_back_to_the_whole_pool() {
        let filter = SearchFilter {
            city: Some("Munich".into()),
            ..Default::default()
        };

        let a = candidate(Uuid::new_v4());
        let b = candidate(Uuid::new_v4());
        let ranked = rank_candidates(Some(&filter), &[a.clone(), b.clone()], date(2025, 1, 1));
        assert_eq!(ranked, vec![a.id, b.id]);
    }

    #[test]
    fn missing_filter_returns_pool_unranked() {
        let a = candidate(Uuid::new_v4());
        let ranked = rank_candidates(None, &[a.clone()], date(2025, 1, 1));
        assert_eq!(ranked, vec![a.id]);
    }

    #[test]
    fn empty_pool_stays_empty() {
        let filter = SearchFilter::default();
        assert!(rank_candidates(Some(&filter), &[], date(2025, 1, 1)).is_empty());
    }
}
