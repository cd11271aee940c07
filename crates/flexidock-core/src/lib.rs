//! # Flexidock Core Library
//!
//! A library for computing low-energy poses of a flexible small-molecule
//! ligand docked into a rigid receptor's precomputed interaction grids.
//!
//! ## Architectural Philosophy
//!
//! The library is designed with a strict three-layer architecture to ensure a
//! clear separation of concerns, making it modular, testable, and extensible.
//!
//! - **[`core`]: The Foundation.** Contains the immutable ligand model (a
//!   kinematic tree of rigid frames built from a branched atom description),
//!   the read-only receptor grid and pairwise potential tables, and the
//!   quaternion geometry utilities.
//!
//! - **[`engine`]: The Logic Core.** This layer owns the per-trial mutable
//!   state and implements the energy/gradient evaluator and the local
//!   optimizer (a triangular-BFGS line-search refinement inside a
//!   basin-hopping outer loop), along with configuration, progress
//!   reporting, and error types.
//!
//! - **[`workflows`]: The Public API.** The highest-level, user-facing layer.
//!   It fans seeded optimization trials out across threads, merges their
//!   best conformations, and returns an energy-ranked result list.

pub mod core;
pub mod engine;
pub mod workflows;
