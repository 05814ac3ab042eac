//! `rewardsync-recon`: fuzzy reconciliation of point-of-sale transactions
//! against rewards-program redemption feeds.
//!
//! Pure engine crate: parses CSV text, scores and matches records, and
//! builds summaries and exports. No CLI or filesystem dependencies.

pub mod alias;
pub mod classify;
pub mod config;
pub mod engine;
pub mod error;
pub mod ingest;
pub mod matcher;
pub mod model;
pub mod report;
pub mod sample;
pub mod scorer;
pub mod similarity;

pub use config::{MatchStrategy, ReconConfig};
pub use engine::{load_input, reconcile, run, CandidateText};
pub use error::ReconError;
pub use model::{MatchResult, MatchType, ReconInput, ReconResult, ReconSummary};
