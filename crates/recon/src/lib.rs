//! `taskledger-recon`: Task-ledger reconciliation engine.
//!
//! Pure engine crate: receives already-extracted table rows per snapshot
//! document, rebuilds task records, merges snapshots chronologically into the
//! master ledger and returns the rendered report. No CLI or file IO.

pub mod classify;
pub mod config;
pub mod consolidate;
pub mod engine;
pub mod error;
pub mod evidence;
pub mod header;
pub mod model;
pub mod pipeline;
pub mod reconstruct;
pub mod similarity;

pub use config::LedgerConfig;
pub use engine::{MasterLedger, MergeStats, ReconciliationEngine};
pub use error::{LedgerError, SnapshotError};
pub use model::{
    IdentityKey, LedgerEntry, LedgerReport, LedgerRow, RawRow, SnapshotDocument, Status, UniqueId,
};
pub use pipeline::{run, DocumentInput, Pipeline};
