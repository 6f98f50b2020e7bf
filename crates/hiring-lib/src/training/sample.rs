//! Synthetic smart hiring training data
//!
//! Used when too little real hiring history exists. Skill match and rating
//! drive the success probability so a fitted model has signal to find.

use crate::models::{FeatureMap, TrainingRow};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Below this many real rows, exports are padded with synthetic rows
pub const MIN_REAL_ROWS: usize = 50;

/// Generate `count` reproducible rows over the smart hiring schema
pub fn generate_sample_rows(count: usize, seed: u64) -> Vec<TrainingRow> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    (0..count).map(|_| sample_row(&mut rng)).collect()
}

fn sample_row<R: Rng>(rng: &mut R) -> TrainingRow {
    let skill_match_score: f64 = rng.gen();
    let avg_rating = 3.0 + rng.gen::<f64>() * 2.0;
    let has_experience = rng.gen::<f64>() > 0.3;

    let base_success = skill_match_score * 0.4 + (avg_rating - 3.0) / 2.0 * 0.4;

    let recommendation_rate = if has_experience {
        0.7 + rng.gen::<f64>() * 0.3
    } else {
        rng.gen::<f64>() * 0.7
    };
    let completion_rate = if has_experience {
        0.8 + rng.gen::<f64>() * 0.2
    } else {
        0.6 + rng.gen::<f64>() * 0.4
    };
    let bid_success_rate = 0.1 + rng.gen::<f64>() * 0.4;
    let category_experience = if has_experience {
        rng.gen_range(1..15) as f64
    } else {
        rng.gen_range(0..3) as f64
    };
    let response_time_hours = 2.0 + rng.gen::<f64>() * 48.0;
    let portfolio_quality = rng.gen::<f64>() * 10.0;
    let budget_match_score = 0.7 + rng.gen::<f64>() * 0.3;
    let delivery_time_days = 3.0 + rng.gen::<f64>() * 25.0;
    let freelancer_tenure_days = rng.gen_range(30..1000) as f64;
    let project_complexity = rng.gen::<f64>() * 10.0;
    let client_history_score = if rng.gen::<f64>() > 0.8 {
        rng.gen::<f64>()
    } else {
        0.5
    };
    let past_collaboration = if rng.gen::<f64>() > 0.85 { 1.0 } else { 0.0 };
    let skills_count_match = (skill_match_score * 5.0).floor();
    let workload_factor: f64 = rng.gen();
    let successful = rng.gen::<f64>() < base_success + 0.2;

    let features: FeatureMap = [
        ("skill_match_score", skill_match_score),
        ("avg_rating", avg_rating),
        ("recommendation_rate", recommendation_rate),
        ("completion_rate", completion_rate),
        ("bid_success_rate", bid_success_rate),
        ("category_experience", category_experience),
        ("response_time_hours", response_time_hours),
        ("portfolio_quality", portfolio_quality),
        ("budget_match_score", budget_match_score),
        ("delivery_time_days", delivery_time_days),
        ("freelancer_tenure_days", freelancer_tenure_days),
        ("project_complexity", project_complexity),
        ("client_history_score", client_history_score),
        ("past_collaboration", past_collaboration),
        ("skills_count_match", skills_count_match),
        ("workload_factor", workload_factor),
    ]
    .into_iter()
    .map(|(name, value)| (name.to_string(), value))
    .collect();

    TrainingRow::new(features, successful)
}

/// Pad real rows with synthetic ones when the history is too thin to train on
pub fn pad_with_samples(mut rows: Vec<TrainingRow>, sample_count: usize, seed: u64) -> Vec<TrainingRow> {
    if rows.len() < MIN_REAL_ROWS {
        rows.extend(generate_sample_rows(sample_count, seed));
    }
    rows
}
