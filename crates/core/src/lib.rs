//! Core ledger consistency logic for Ledgerwatch.
//!
//! This crate contains pure business logic with ZERO web or database dependencies.
//! Rows are loaded and results persisted by `ledgerwatch-db`.
//!
//! # Modules
//!
//! - `integrity` - Balance integrity checks and validation reports
//! - `equation` - Accounting equation validation and auto-heal planning
//! - `reconciliation` - Snapshots, content hashing, diffing and review workflow
//! - `monitoring` - Sync status, fix planning, alerts and the periodic scheduler

pub mod equation;
pub mod integrity;
pub mod monitoring;
pub mod reconciliation;
