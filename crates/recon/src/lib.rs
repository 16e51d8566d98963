//! `stimatrix-recon`: requirement matrix reconciliation engine.
//!
//! Pure engine crate: receives matrices through a [`MatrixLoader`], returns
//! key-set summaries, field divergences and consolidated document
//! divergences. No spreadsheet or CLI dependencies.

pub mod config;
pub mod consolidate;
pub mod divergence;
pub mod documents;
pub mod engine;
pub mod enrich;
pub mod error;
pub mod keyset;
pub mod model;
pub mod normalize;
pub mod summary;

pub use config::{MatrixConfig, MatrixEntry, MatrixPair};
pub use consolidate::ConsolidatedRow;
pub use engine::{run, MatrixLoader, PairReport, RunOutput};
pub use error::{LoadError, ReconError};
pub use model::{Matrix, Record, RecordKey, Table};
pub use summary::{summarize, RunSummary};
