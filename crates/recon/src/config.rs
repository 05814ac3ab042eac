use serde::{Deserialize, Serialize};

use crate::error::ReconError;

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct ReconConfig {
    #[serde(default = "default_name")]
    pub name: String,
    #[serde(default)]
    pub strategy: MatchStrategy,
    #[serde(default = "default_date_tolerance_days")]
    pub date_tolerance_days: u32,
    #[serde(default)]
    pub thresholds: Thresholds,
    #[serde(default)]
    pub labels: LabelBands,
    #[serde(default)]
    pub weights: ScoreWeights,
    #[serde(default)]
    pub aliases: AliasConfig,
    /// POS feed location, used by the CLI only.
    #[serde(default)]
    pub source: Option<SourceFeedConfig>,
    /// Rewards program feeds, used by the CLI only.
    #[serde(default)]
    pub candidates: Vec<CandidateFeedConfig>,
}

fn default_name() -> String {
    "reconciliation".into()
}

fn default_date_tolerance_days() -> u32 {
    7
}

impl Default for ReconConfig {
    fn default() -> Self {
        Self {
            name: default_name(),
            strategy: MatchStrategy::default(),
            date_tolerance_days: default_date_tolerance_days(),
            thresholds: Thresholds::default(),
            labels: LabelBands::default(),
            weights: ScoreWeights::default(),
            aliases: AliasConfig::default(),
            source: None,
            candidates: Vec::new(),
        }
    }
}

// ---------------------------------------------------------------------------
// Strategy
// ---------------------------------------------------------------------------

/// How source records claim candidates from the pool.
///
/// `Greedy` walks source records in input order and lets each one consume its
/// best remaining candidate. An early record can therefore take a candidate
/// that a later record fits better. `Optimal` solves the whole score matrix as
/// a maximum-weight assignment instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchStrategy {
    #[default]
    Greedy,
    Optimal,
}

impl std::fmt::Display for MatchStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Greedy => write!(f, "greedy"),
            Self::Optimal => write!(f, "optimal"),
        }
    }
}

// ---------------------------------------------------------------------------
// Thresholds, labels, weights
// ---------------------------------------------------------------------------

/// Score cut-offs for match classification. `exact >= fuzzy`.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct Thresholds {
    pub exact: f64,
    pub fuzzy: f64,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self { exact: 0.90, fuzzy: 0.70 }
    }
}

/// Score bands for the human-readable confidence label.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct LabelBands {
    pub high: f64,
    pub medium: f64,
}

impl Default for LabelBands {
    fn default() -> Self {
        Self { high: 0.85, medium: 0.60 }
    }
}

/// Composite score weights. `name + date + service` must equal 1.
///
/// `date_miss_credit` is the date component awarded when the dates are out of
/// tolerance or missing.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct ScoreWeights {
    pub name: f64,
    pub date: f64,
    pub service: f64,
    pub date_miss_credit: f64,
}

impl Default for ScoreWeights {
    fn default() -> Self {
        Self {
            name: 0.6,
            date: 0.3,
            service: 0.1,
            date_miss_credit: 0.3,
        }
    }
}

// ---------------------------------------------------------------------------
// Column aliases
// ---------------------------------------------------------------------------

/// Accepted header spellings per canonical field, in priority order.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct AliasConfig {
    pub name: Vec<String>,
    pub service: Vec<String>,
    pub amount: Vec<String>,
    pub date: Vec<String>,
}

impl Default for AliasConfig {
    fn default() -> Self {
        let list = |items: &[&str]| items.iter().map(|s| s.to_string()).collect();
        Self {
            name: list(&["name", "customer_name", "member_name"]),
            service: list(&["service", "product", "treatment"]),
            amount: list(&["amount", "reward_amount", "points_redeemed"]),
            date: list(&["date", "redemption_date", "transaction_date"]),
        }
    }
}

// ---------------------------------------------------------------------------
// Feeds
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct SourceFeedConfig {
    pub file: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CandidateFeedConfig {
    pub program: String,
    pub file: String,
}

// ---------------------------------------------------------------------------
// Parse + Validate
// ---------------------------------------------------------------------------

const WEIGHT_EPSILON: f64 = 1e-6;

fn unit_range(label: &str, value: f64) -> Result<(), ReconError> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(ReconError::ConfigValidation(format!(
            "{label} must be between 0 and 1, got {value}"
        )))
    }
}

impl ReconConfig {
    pub fn from_toml(input: &str) -> Result<Self, ReconError> {
        let config: ReconConfig =
            toml::from_str(input).map_err(|e| ReconError::ConfigParse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ReconError> {
        unit_range("thresholds.exact", self.thresholds.exact)?;
        unit_range("thresholds.fuzzy", self.thresholds.fuzzy)?;
        if self.thresholds.fuzzy > self.thresholds.exact {
            return Err(ReconError::ConfigValidation(format!(
                "thresholds.fuzzy ({}) must not exceed thresholds.exact ({})",
                self.thresholds.fuzzy, self.thresholds.exact
            )));
        }

        unit_range("labels.high", self.labels.high)?;
        unit_range("labels.medium", self.labels.medium)?;
        if self.labels.medium > self.labels.high {
            return Err(ReconError::ConfigValidation(format!(
                "labels.medium ({}) must not exceed labels.high ({})",
                self.labels.medium, self.labels.high
            )));
        }

        let w = &self.weights;
        unit_range("weights.name", w.name)?;
        unit_range("weights.date", w.date)?;
        unit_range("weights.service", w.service)?;
        unit_range("weights.date_miss_credit", w.date_miss_credit)?;
        let sum = w.name + w.date + w.service;
        if (sum - 1.0).abs() > WEIGHT_EPSILON {
            return Err(ReconError::ConfigValidation(format!(
                "weights.name + weights.date + weights.service must sum to 1, got {sum}"
            )));
        }

        for (field, aliases) in [
            ("name", &self.aliases.name),
            ("service", &self.aliases.service),
            ("amount", &self.aliases.amount),
            ("date", &self.aliases.date),
        ] {
            if aliases.iter().all(|a| a.trim().is_empty()) {
                return Err(ReconError::ConfigValidation(format!(
                    "aliases.{field} needs at least one column name"
                )));
            }
        }

        let mut programs: Vec<&str> = Vec::new();
        for feed in &self.candidates {
            let program = feed.program.trim();
            if program.is_empty() {
                return Err(ReconError::ConfigValidation(format!(
                    "candidate feed '{}' has an empty program tag",
                    feed.file
                )));
            }
            if programs.contains(&program) {
                return Err(ReconError::ConfigValidation(format!(
                    "duplicate candidate program '{program}'"
                )));
            }
            programs.push(program);
        }

        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
