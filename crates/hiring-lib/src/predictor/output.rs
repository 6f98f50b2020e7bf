//! Human-readable match explanations
//!
//! Rules only fire for features present in the input; absent features are
//! treated as unknown rather than zero.

use crate::models::{FeatureMap, MatchInsight};

pub const MAX_STRENGTHS: usize = 3;
pub const MAX_CONCERNS: usize = 2;

/// Derives reasoning, strengths, concerns and a confidence level from
/// smart hiring features
pub struct MatchExplainer;

impl MatchExplainer {
    pub fn explain(values: &FeatureMap) -> MatchInsight {
        let f = Lookup(values);
        MatchInsight {
            confidence: Self::confidence(&f),
            reasoning: Self::reasoning(&f),
            key_strengths: Self::strengths(&f),
            potential_concerns: Self::concerns(&f),
        }
    }

    fn confidence(f: &Lookup) -> f32 {
        let mut confidence = 1.0f32;
        // a rating of exactly 3.0 is the default given to new freelancers
        if f.is("avg_rating", |v| v == 3.0) {
            confidence -= 0.2;
        }
        if f.is("category_experience", |v| v == 0.0) {
            confidence -= 0.1;
        }
        if f.is("freelancer_tenure_days", |v| v < 30.0) {
            confidence -= 0.1;
        }
        if f.is("avg_rating", |v| v > 4.0) && f.is("category_experience", |v| v > 3.0) {
            confidence += 0.1;
        }
        confidence.clamp(0.1, 1.0)
    }

    fn reasoning(f: &Lookup) -> String {
        let mut reasons = Vec::new();

        if let Some(skill) = f.get("skill_match_score") {
            if skill > 0.8 {
                reasons.push(format!("Excellent skill match ({})", percent(skill)));
            } else if skill > 0.6 {
                reasons.push(format!("Good skill match ({})", percent(skill)));
            } else if skill < 0.4 {
                reasons.push(format!("Limited skill match ({})", percent(skill)));
            }
        }

        if let Some(rating) = f.get("avg_rating") {
            if rating >= 4.5 {
                reasons.push(format!("Outstanding ratings ({:.1}/5.0)", rating));
            } else if rating >= 4.0 {
                reasons.push(format!("Strong ratings ({:.1}/5.0)", rating));
            }
        }

        if let Some(completion) = f.get("completion_rate") {
            if completion > 0.9 {
                reasons.push(format!("Excellent completion rate ({})", percent(completion)));
            } else if completion < 0.7 {
                reasons.push(format!("Concerning completion rate ({})", percent(completion)));
            }
        }

        if let Some(projects) = f.get("category_experience") {
            if projects > 5.0 {
                reasons.push(format!(
                    "Extensive experience in this category ({} projects)",
                    projects
                ));
            } else if projects == 0.0 {
                reasons.push("New to this project category".to_string());
            }
        }

        if f.is("past_collaboration", |v| v == 1.0) {
            reasons.push("Has successfully worked with you before".to_string());
        }
        if f.is("workload_factor", |v| v > 0.8) {
            reasons.push("Currently has high workload".to_string());
        }

        if reasons.is_empty() {
            return "Balanced profile across all criteria".to_string();
        }
        reasons.join(", ")
    }

    fn strengths(f: &Lookup) -> Vec<String> {
        [
            (f.is("skill_match_score", |v| v > 0.8), "Perfect skill alignment"),
            (f.is("avg_rating", |v| v >= 4.5), "Exceptional client satisfaction"),
            (f.is("completion_rate", |v| v > 0.9), "Reliable project completion"),
            (f.is("category_experience", |v| v > 5.0), "Deep category expertise"),
            (f.is("budget_match_score", |v| v > 0.9), "Competitive pricing"),
            (f.is("past_collaboration", |v| v == 1.0), "Proven collaboration history"),
        ]
        .into_iter()
        .filter(|(fired, _)| *fired)
        .map(|(_, text)| text.to_string())
        .take(MAX_STRENGTHS)
        .collect()
    }

    fn concerns(f: &Lookup) -> Vec<String> {
        [
            (f.is("skill_match_score", |v| v < 0.5), "Limited skill match"),
            (f.is("completion_rate", |v| v < 0.8), "Inconsistent project completion"),
            (f.is("workload_factor", |v| v > 0.8), "High current workload"),
            (f.is("category_experience", |v| v == 0.0), "No experience in this category"),
            (f.is("response_time_hours", |v| v > 48.0), "Slow response time"),
        ]
        .into_iter()
        .filter(|(fired, _)| *fired)
        .map(|(_, text)| text.to_string())
        .take(MAX_CONCERNS)
        .collect()
    }
}

struct Lookup<'a>(&'a FeatureMap);

impl Lookup<'_> {
    fn get(&self, name: &str) -> Option<f64> {
        self.0.get(name).copied()
    }

    fn is(&self, name: &str, predicate: impl Fn(f64) -> bool) -> bool {
        self.get(name).map_or(false, predicate)
    }
}

fn percent(ratio: f64) -> String {
    format!("{:.0}%", ratio * 100.0)
}
