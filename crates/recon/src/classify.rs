use crate::config::{LabelBands, Thresholds};
use crate::model::{ConfidenceLabel, MatchType};

/// Classify a composite score against the exact/fuzzy cut-offs.
pub fn classify_score(score: f64, thresholds: &Thresholds) -> MatchType {
    if score >= thresholds.exact {
        MatchType::Exact
    } else if score >= thresholds.fuzzy {
        MatchType::Fuzzy
    } else {
        MatchType::Unmatched
    }
}

pub fn confidence_label(score: f64, bands: &LabelBands) -> ConfidenceLabel {
    if score >= bands.high {
        ConfidenceLabel::High
    } else if score >= bands.medium {
        ConfidenceLabel::Medium
    } else {
        ConfidenceLabel::Low
    }
}
