use crate::classify::{classify_score, confidence_label};
use crate::config::{LabelBands, ReconConfig, Thresholds};
use crate::model::{CandidateFeed, CandidateRecord, MatchResult, MatchType, ScoreBreakdown, SourceRecord};
use crate::scorer::{score, ScoreContext};

// ---------------------------------------------------------------------------
// Candidate pool
// ---------------------------------------------------------------------------

/// Owned arena of candidates with a per-entry availability flag.
///
/// Matchers take the pool by value and hand it back, so what was consumed
/// is always visible to the caller. Disjoint pools can be matched
/// independently; a candidate in one pool can never satisfy a source matched
/// against another.
#[derive(Debug, Clone, Default)]
pub struct CandidatePool {
    entries: Vec<CandidateRecord>,
    available: Vec<bool>,
}

impl CandidatePool {
    pub fn new(candidates: Vec<CandidateRecord>) -> Self {
        let available = vec![true; candidates.len()];
        Self {
            entries: candidates,
            available,
        }
    }

    /// Pool every feed's records, in feed order then row order.
    pub fn from_feeds(feeds: &[CandidateFeed]) -> Self {
        Self::new(
            feeds
                .iter()
                .flat_map(|f| f.records.iter().cloned())
                .collect(),
        )
    }

    /// Total entries, consumed or not.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries not yet consumed.
    pub fn remaining(&self) -> usize {
        self.available.iter().filter(|a| **a).count()
    }

    pub fn is_available(&self, idx: usize) -> bool {
        self.available.get(idx).copied().unwrap_or(false)
    }

    pub fn get(&self, idx: usize) -> Option<&CandidateRecord> {
        self.entries.get(idx)
    }

    pub fn available(&self) -> impl Iterator<Item = (usize, &CandidateRecord)> {
        self.entries
            .iter()
            .enumerate()
            .filter(|(i, _)| self.available[*i])
    }

    /// Mark an entry consumed and return a copy of it.
    /// Returns `None` if it was already consumed.
    pub fn take(&mut self, idx: usize) -> Option<CandidateRecord> {
        if !self.is_available(idx) {
            return None;
        }
        self.available[idx] = false;
        Some(self.entries[idx].clone())
    }

    pub fn unconsumed(&self) -> Vec<&CandidateRecord> {
        self.available().map(|(_, c)| c).collect()
    }
}

// ---------------------------------------------------------------------------
// Match context
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MatchContext {
    pub score: ScoreContext,
    pub thresholds: Thresholds,
    pub labels: LabelBands,
}

impl MatchContext {
    pub fn from_config(config: &ReconConfig) -> Self {
        Self {
            score: ScoreContext::from_config(config),
            thresholds: config.thresholds,
            labels: config.labels,
        }
    }
}

impl Default for MatchContext {
    fn default() -> Self {
        Self::from_config(&ReconConfig::default())
    }
}

/// Best available candidate for `source`. Strictly greater wins, so ties go
/// to the earliest candidate in pool order.
fn best_available(
    source: &SourceRecord,
    pool: &CandidatePool,
    ctx: &ScoreContext,
) -> Option<(usize, ScoreBreakdown)> {
    let mut best: Option<(usize, ScoreBreakdown)> = None;
    for (idx, candidate) in pool.available() {
        let b = score(source, candidate, ctx);
        if best.map_or(true, |(_, cur)| b.total > cur.total) {
            best = Some((idx, b));
        }
    }
    best
}

/// Classify `best` and consume its candidate when it is a match.
fn decide(
    source: &SourceRecord,
    best: Option<(usize, ScoreBreakdown)>,
    pool: &mut CandidatePool,
    ctx: &MatchContext,
) -> MatchResult {
    let confidence_score = best.map_or(0.0, |(_, b)| b.total);
    let match_type = classify_score(confidence_score, &ctx.thresholds);

    let candidate = match (match_type.is_match(), best) {
        (true, Some((idx, _))) => pool.take(idx),
        _ => None,
    };

    tracing::trace!(
        source_row = source.row,
        name = %source.name,
        score = confidence_score,
        match_type = %match_type,
        "match decision"
    );

    MatchResult {
        source: source.clone(),
        candidate,
        match_type,
        confidence_score,
        confidence_label: confidence_label(confidence_score, &ctx.labels),
        breakdown: best.map(|(_, b)| b),
    }
}

// ---------------------------------------------------------------------------
// Greedy
// ---------------------------------------------------------------------------

/// One pass in source order. Each source takes its best remaining candidate if
/// the score clears the fuzzy threshold; that candidate is gone for every later
/// source.
pub fn match_greedy(
    sources: &[SourceRecord],
    mut pool: CandidatePool,
    ctx: &MatchContext,
) -> (Vec<MatchResult>, CandidatePool) {
    let mut results = Vec::with_capacity(sources.len());
    for source in sources {
        let best = best_available(source, &pool, &ctx.score);
        results.push(decide(source, best, &mut pool, ctx));
    }
    (results, pool)
}

// ---------------------------------------------------------------------------
// Optimal
// ---------------------------------------------------------------------------

/// Maximum-weight assignment over the full score matrix.
///
/// Pairs scoring below the fuzzy threshold carry zero weight, so the solver
/// maximizes the summed score of accepted matches. A final greedy sweep gives
/// any source the solver left unmatched a chance at leftover candidates, which
/// keeps every unmatched score below the fuzzy threshold.
pub fn match_optimal(
    sources: &[SourceRecord],
    mut pool: CandidatePool,
    ctx: &MatchContext,
) -> (Vec<MatchResult>, CandidatePool) {
    let columns: Vec<usize> = pool.available().map(|(idx, _)| idx).collect();

    let scores: Vec<Vec<ScoreBreakdown>> = sources
        .iter()
        .map(|s| {
            columns
                .iter()
                .filter_map(|idx| pool.get(*idx))
                .map(|c| score(s, c, &ctx.score))
                .collect()
        })
        .collect();

    let weights: Vec<Vec<f64>> = scores
        .iter()
        .map(|row| {
            row.iter()
                .map(|b| {
                    if classify_score(b.total, &ctx.thresholds).is_match() {
                        b.total
                    } else {
                        0.0
                    }
                })
                .collect()
        })
        .collect();

    let size = sources.len().max(columns.len());
    let assignment = if sources.is_empty() || columns.is_empty() {
        vec![None; sources.len()]
    } else {
        max_weight_assignment(&weights, size)
    };

    let mut results: Vec<Option<MatchResult>> = vec![None; sources.len()];

    for (i, source) in sources.iter().enumerate() {
        let Some(col) = assignment.get(i).copied().flatten() else {
            continue;
        };
        let Some(&pool_idx) = columns.get(col) else {
            continue;
        };
        let b = scores[i][col];
        if classify_score(b.total, &ctx.thresholds).is_match() {
            results[i] = Some(decide(source, Some((pool_idx, b)), &mut pool, ctx));
        }
    }

    for (i, source) in sources.iter().enumerate() {
        if results[i].is_none() {
            let best = best_available(source, &pool, &ctx.score);
            results[i] = Some(decide(source, best, &mut pool, ctx));
        }
    }

    (results.into_iter().flatten().collect(), pool)
}

/// Hungarian algorithm (Kuhn-Munkres with potentials) on a `size x size`
/// matrix, maximizing total weight. Cells outside `weights` are zero padding.
/// Returns the assigned column for each row.
fn max_weight_assignment(weights: &[Vec<f64>], size: usize) -> Vec<Option<usize>> {
    let cost = |row: usize, col: usize| -> f64 {
        weights
            .get(row)
            .and_then(|r| r.get(col))
            .map_or(0.0, |w| -w)
    };

    // 1-based; index 0 is the virtual start column.
    let mut u = vec![0.0f64; size + 1];
    let mut v = vec![0.0f64; size + 1];
    let mut owner = vec![0usize; size + 1];
    let mut way = vec![0usize; size + 1];

    for row in 1..=size {
        owner[0] = row;
        let mut col0 = 0usize;
        let mut min_v = vec![f64::INFINITY; size + 1];
        let mut used = vec![false; size + 1];

        loop {
            used[col0] = true;
            let row0 = owner[col0];
            let mut delta = f64::INFINITY;
            let mut col1 = 0usize;

            for col in 1..=size {
                if used[col] {
                    continue;
                }
                let reduced = cost(row0 - 1, col - 1) - u[row0] - v[col];
                if reduced < min_v[col] {
                    min_v[col] = reduced;
                    way[col] = col0;
                }
                if min_v[col] < delta {
                    delta = min_v[col];
                    col1 = col;
                }
            }

            for col in 0..=size {
                if used[col] {
                    u[owner[col]] += delta;
                    v[col] -= delta;
                } else {
                    min_v[col] -= delta;
                }
            }

            col0 = col1;
            if owner[col0] == 0 {
                break;
            }
        }

        loop {
            let prev = way[col0];
            owner[col0] = owner[prev];
            col0 = prev;
            if col0 == 0 {
                break;
            }
        }
    }

    let mut row_to_col = vec![None; size];
    for col in 1..=size {
        if owner[col] != 0 {
            row_to_col[owner[col] - 1] = Some(col - 1);
        }
    }
    row_to_col
}
