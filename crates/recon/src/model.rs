use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::Serialize;

use crate::config::MatchStrategy;

// ---------------------------------------------------------------------------
// Input
// ---------------------------------------------------------------------------

/// One POS transaction, resolved to canonical fields at ingestion.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SourceRecord {
    /// 1-based data row index within the source feed.
    pub row: usize,
    pub name: String,
    pub service: String,
    pub amount_cents: Option<i64>,
    pub raw_amount: String,
    pub date: Option<NaiveDate>,
    pub raw_date: String,
    /// Columns not bound to a canonical field, keyed by normalized header.
    pub extra: BTreeMap<String, String>,
}

/// One loyalty/rewards redemption from a candidate feed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CandidateRecord {
    pub row: usize,
    /// Originating rewards program tag (e.g. "alle", "aspire").
    pub program: String,
    pub name: String,
    pub service: String,
    pub amount_cents: Option<i64>,
    pub raw_amount: String,
    pub date: Option<NaiveDate>,
    pub raw_date: String,
    pub extra: BTreeMap<String, String>,
}

/// All records from one rewards program.
#[derive(Debug, Clone)]
pub struct CandidateFeed {
    pub program: String,
    pub records: Vec<CandidateRecord>,
}

/// Pre-loaded records for one reconciliation run.
#[derive(Debug, Clone, Default)]
pub struct ReconInput {
    pub source: Vec<SourceRecord>,
    pub candidate_feeds: Vec<CandidateFeed>,
    pub header_suggestions: Vec<HeaderSuggestion>,
}

/// An input header that bound to no canonical field but closely resembles a known alias.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HeaderSuggestion {
    pub input: String,
    pub header: String,
    pub suggestion: String,
    pub canonical: String,
    pub similarity: f64,
}

// ---------------------------------------------------------------------------
// Match decisions
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchType {
    Exact,
    Fuzzy,
    Unmatched,
}

impl MatchType {
    pub fn is_match(self) -> bool {
        !matches!(self, Self::Unmatched)
    }
}

impl std::fmt::Display for MatchType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Exact => write!(f, "exact"),
            Self::Fuzzy => write!(f, "fuzzy"),
            Self::Unmatched => write!(f, "unmatched"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfidenceLabel {
    High,
    Medium,
    Low,
}

impl std::fmt::Display for ConfidenceLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::High => write!(f, "high"),
            Self::Medium => write!(f, "medium"),
            Self::Low => write!(f, "low"),
        }
    }
}

/// Per-field components of a composite score.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ScoreBreakdown {
    pub name: f64,
    pub date: f64,
    pub service: f64,
    pub total: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date_offset_days: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchResult {
    pub source: SourceRecord,
    /// The consumed candidate; `None` when unmatched.
    pub candidate: Option<CandidateRecord>,
    pub match_type: MatchType,
    pub confidence_score: f64,
    pub confidence_label: ConfidenceLabel,
    /// Breakdown of the best candidate considered, matched or not.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub breakdown: Option<ScoreBreakdown>,
}

// ---------------------------------------------------------------------------
// Summary + Output
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReconSummary {
    pub total_transactions: usize,
    pub exact_matches: usize,
    pub fuzzy_matches: usize,
    pub unmatched: usize,
    /// Percentage of source records matched, rounded to an integer.
    pub match_accuracy: u32,
    pub total_candidates: usize,
    pub unmatched_candidates: usize,
    pub matched_amount_cents: i64,
    pub processing_ms: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReconMeta {
    pub config_name: String,
    pub strategy: MatchStrategy,
    pub engine_version: String,
    pub run_at: String,
    pub exact_threshold: f64,
    pub fuzzy_threshold: f64,
    pub date_tolerance_days: u32,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub header_suggestions: Vec<HeaderSuggestion>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReconResult {
    pub meta: ReconMeta,
    pub summary: ReconSummary,
    pub matches: Vec<MatchResult>,
}
