//! Declarative column alias resolution.
//!
//! Each canonical field lists the header spellings it accepts. Headers are
//! bound once per feed, so record construction never has to guess.

use serde::Serialize;

use crate::config::AliasConfig;
use crate::ingest::normalize_header;
use crate::model::HeaderSuggestion;
use crate::similarity::similarity;

/// Minimum header similarity for a rename suggestion.
const SUGGESTION_THRESHOLD: f64 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CanonicalField {
    Name,
    Service,
    Amount,
    Date,
}

impl CanonicalField {
    pub const ALL: [CanonicalField; 4] = [Self::Name, Self::Service, Self::Amount, Self::Date];
}

impl std::fmt::Display for CanonicalField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Name => write!(f, "name"),
            Self::Service => write!(f, "service"),
            Self::Amount => write!(f, "amount"),
            Self::Date => write!(f, "date"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AliasTable {
    entries: Vec<(CanonicalField, Vec<String>)>,
}

/// Header index bound to each canonical field, if any.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ColumnBinding {
    pub name: Option<usize>,
    pub service: Option<usize>,
    pub amount: Option<usize>,
    pub date: Option<usize>,
}

impl ColumnBinding {
    pub fn column(&self, field: CanonicalField) -> Option<usize> {
        match field {
            CanonicalField::Name => self.name,
            CanonicalField::Service => self.service,
            CanonicalField::Amount => self.amount,
            CanonicalField::Date => self.date,
        }
    }

    fn set(&mut self, field: CanonicalField, idx: usize) {
        let slot = match field {
            CanonicalField::Name => &mut self.name,
            CanonicalField::Service => &mut self.service,
            CanonicalField::Amount => &mut self.amount,
            CanonicalField::Date => &mut self.date,
        };
        *slot = Some(idx);
    }

    /// True if the header at `idx` feeds a canonical field.
    pub fn is_bound(&self, idx: usize) -> bool {
        CanonicalField::ALL.iter().any(|f| self.column(*f) == Some(idx))
    }

    pub fn missing(&self) -> Vec<CanonicalField> {
        CanonicalField::ALL
            .into_iter()
            .filter(|f| self.column(*f).is_none())
            .collect()
    }
}

impl AliasTable {
    pub fn from_config(config: &AliasConfig) -> Self {
        let normalize = |list: &[String]| -> Vec<String> {
            list.iter()
                .map(|a| normalize_header(a))
                .filter(|a| !a.is_empty())
                .collect()
        };
        Self {
            entries: vec![
                (CanonicalField::Name, normalize(&config.name)),
                (CanonicalField::Service, normalize(&config.service)),
                (CanonicalField::Amount, normalize(&config.amount)),
                (CanonicalField::Date, normalize(&config.date)),
            ],
        }
    }

    pub fn aliases(&self, field: CanonicalField) -> &[String] {
        self.entries
            .iter()
            .find(|(f, _)| *f == field)
            .map(|(_, list)| list.as_slice())
            .unwrap_or(&[])
    }

    /// Bind normalized headers to canonical fields. The first alias (in list
    /// order) present in the headers wins; a header binds at most one field.
    pub fn resolve(&self, headers: &[String]) -> ColumnBinding {
        let mut binding = ColumnBinding::default();
        for (field, aliases) in &self.entries {
            let hit = aliases.iter().find_map(|alias| {
                headers
                    .iter()
                    .position(|h| h == alias)
                    .filter(|idx| !binding.is_bound(*idx))
            });
            if let Some(idx) = hit {
                binding.set(*field, idx);
            }
        }
        binding
    }

    /// Suggest renames for headers that bound to nothing, restricted to
    /// canonical fields that are still missing.
    pub fn suggest(&self, input: &str, headers: &[String]) -> Vec<HeaderSuggestion> {
        let binding = self.resolve(headers);
        let missing = binding.missing();
        let mut out = Vec::new();

        for (idx, header) in headers.iter().enumerate() {
            if binding.is_bound(idx) || header.is_empty() {
                continue;
            }
            let mut best: Option<(f64, CanonicalField, &str)> = None;
            for (field, aliases) in &self.entries {
                if !missing.contains(field) {
                    continue;
                }
                for alias in aliases {
                    let score = similarity(header, alias);
                    if best.map_or(true, |(s, _, _)| score > s) {
                        best = Some((score, *field, alias));
                    }
                }
            }
            if let Some((score, field, alias)) = best {
                if score > SUGGESTION_THRESHOLD {
                    out.push(HeaderSuggestion {
                        input: input.to_string(),
                        header: header.clone(),
                        suggestion: alias.to_string(),
                        canonical: field.to_string(),
                        similarity: score,
                    });
                }
            }
        }

        out
    }
}

impl Default for AliasTable {
    fn default() -> Self {
        Self::from_config(&AliasConfig::default())
    }
}
