//! # Engine Module
//!
//! The optimization engine: everything that turns an immutable ligand model
//! and read-only potential data into refined low-energy poses.
//!
//! ## Overview
//!
//! The engine owns all per-trial mutable state. Shared inputs (ligand,
//! grids, potential tables) are borrowed immutably, which is what lets the
//! workflow layer run arbitrarily many trials in parallel without
//! synchronization.
//!
//! ## Architecture
//!
//! - **Configuration** ([`config`]) - Docking parameters with validation and
//!   TOML loading
//! - **Evaluation** ([`evaluate`]) - Scalar energy and generalized-coordinate
//!   gradient for one candidate conformation
//! - **Optimization** ([`optimize`]) - Seeded basin-hopping trials around a
//!   BFGS line-search refinement
//! - **Progress Monitoring** ([`progress`]) - Callback-based progress events
//! - **Error Handling** ([`error`]) - Engine-level error types

pub mod config;
pub mod error;
pub mod evaluate;
pub mod optimize;
pub mod progress;
