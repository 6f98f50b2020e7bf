//! Ranking a pool of candidates by match score

use super::label_for;
use crate::error::Result;
use crate::models::{Candidate, MatchInsight, RankedCandidate};
use tracing::warn;

/// Match score given to a candidate whose features could not be scored
pub const UNSCORED_MATCH_SCORE: f64 = 0.5;
/// Confidence attached to the default entry
pub const UNSCORED_CONFIDENCE: f32 = 0.1;

const UNSCORED_REASONING: &str = "Unable to calculate score - insufficient data";

/// Score every candidate with `score_one` and sort by match score, highest
/// first. A candidate that fails to score keeps its place in the pool with
/// the default entry. Ties keep submission order.
pub fn rank_with<F>(candidates: &[Candidate], mut score_one: F) -> Vec<RankedCandidate>
where
    F: FnMut(&Candidate) -> Result<(f64, Option<MatchInsight>)>,
{
    let mut ranked: Vec<RankedCandidate> = candidates
        .iter()
        .map(|candidate| match score_one(candidate) {
            Ok((match_score, insight)) => RankedCandidate {
                id: candidate.id.clone(),
                match_score,
                label: label_for(match_score),
                scored: true,
                insight,
            },
            Err(e) => {
                warn!(candidate = %candidate.id, error = %e, "Candidate could not be scored");
                unscored(&candidate.id)
            }
        })
        .collect();

    ranked.sort_by(|a, b| b.match_score.total_cmp(&a.match_score));
    ranked
}

fn unscored(id: &str) -> RankedCandidate {
    RankedCandidate {
        id: id.to_string(),
        match_score: UNSCORED_MATCH_SCORE,
        label: label_for(UNSCORED_MATCH_SCORE),
        scored: false,
        insight: Some(MatchInsight {
            confidence: UNSCORED_CONFIDENCE,
            reasoning: UNSCORED_REASONING.to_string(),
            key_strengths: Vec::new(),
            potential_concerns: Vec::new(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::HiringError;
    use crate::models::RawFeatures;

    fn candidate(id: &str) -> Candidate {
        Candidate {
            id: id.to_string(),
            features: RawFeatures::new(),
        }
    }

    #[test]
    fn test_sorted_descending_with_stable_ties() {
        let pool = vec![candidate("a"), candidate("b"), candidate("c"), candidate("d")];
        let ranked = rank_with(&pool, |c| {
            let score = match c.id.as_str() {
                "a" => 0.2,
                "b" => 0.9,
                "c" => 0.6,
                _ => 0.6,
            };
            Ok((score, None))
        });

        let ids: Vec<&str> = ranked.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, ["b", "c", "d", "a"]);
        assert_eq!(ranked[0].label, 1);
        assert_eq!(ranked[3].label, 0);
        assert!(ranked.iter().all(|r| r.scored));
    }

    #[test]
    fn test_failed_candidate_gets_default_entry() {
        let pool = vec![candidate("good"), candidate("broken"), candidate("weak")];
        let ranked = rank_with(&pool, |c| match c.id.as_str() {
            "good" => Ok((0.8, None)),
            "weak" => Ok((0.3, None)),
            _ => Err(HiringError::invalid_input("avg_rating", "not a number")),
        });

        assert_eq!(ranked.len(), 3);
        let broken = &ranked[1];
        assert_eq!(broken.id, "broken");
        assert!(!broken.scored);
        assert_eq!(broken.match_score, UNSCORED_MATCH_SCORE);
        assert_eq!(broken.label, 0);
        let insight = broken.insight.as_ref().unwrap();
        assert_eq!(insight.confidence, UNSCORED_CONFIDENCE);
        assert!(insight.reasoning.contains("insufficient data"));
    }

    #[test]
    fn test_empty_pool() {
        assert!(rank_with(&[], |_| Ok((1.0, None))).is_empty());
    }
}
