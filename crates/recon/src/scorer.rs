//! Composite match score.
//!
//! `score = name_sim * w.name + date_score * w.date + service_sim * w.service`
//! where `date_score` is 1.0 inside the tolerance window and
//! `w.date_miss_credit` otherwise. Weights sum to 1, so the score is in [0, 1].

use crate::config::{ReconConfig, ScoreWeights};
use crate::model::{CandidateRecord, ScoreBreakdown, SourceRecord};
use crate::similarity::{date_offset_days, dates_within, label_similarity, name_similarity};

/// Everything the scorer needs from the run configuration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoreContext {
    pub weights: ScoreWeights,
    pub date_tolerance_days: u32,
}

impl ScoreContext {
    pub fn from_config(config: &ReconConfig) -> Self {
        Self {
            weights: config.weights,
            date_tolerance_days: config.date_tolerance_days,
        }
    }
}

impl Default for ScoreContext {
    fn default() -> Self {
        Self::from_config(&ReconConfig::default())
    }
}

/// Similarity of two text fields; a blank side contributes nothing.
fn field_similarity(a: &str, b: &str, compare: fn(&str, &str) -> f64) -> f64 {
    if a.trim().is_empty() || b.trim().is_empty() {
        0.0
    } else {
        compare(a, b)
    }
}

/// Clamp to [0, 1] and drop float noise below 1e-9, so a perfect pair scores
/// exactly 1.0 rather than 0.9999999999999999.
fn round_score(raw: f64) -> f64 {
    ((raw * 1e9).round() / 1e9).clamp(0.0, 1.0)
}

/// Score one source/candidate pair. Component values in the breakdown are
/// unweighted; `total` is the weighted composite.
pub fn score(source: &SourceRecord, candidate: &CandidateRecord, ctx: &ScoreContext) -> ScoreBreakdown {
    let w = &ctx.weights;

    let name = field_similarity(&source.name, &candidate.name, name_similarity);
    let service = field_similarity(&source.service, &candidate.service, label_similarity);
    let date = if dates_within(source.date, candidate.date, ctx.date_tolerance_days) {
        1.0
    } else {
        w.date_miss_credit
    };

    let total = round_score(name * w.name + date * w.date + service * w.service);

    ScoreBreakdown {
        name,
        date,
        service,
        total,
        date_offset_days: date_offset_days(source.date, candidate.date),
    }
}
