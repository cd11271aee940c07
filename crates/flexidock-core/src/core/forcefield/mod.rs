//! # Force Field Module
//!
//! Read-only potential data consumed by the energy evaluator: per-atom-type
//! receptor grid maps and tabulated pairwise intramolecular potentials.
//!
//! ## Overview
//!
//! Both data sets are delivered prebuilt by external collaborators; this
//! module owns their layout and the indexing arithmetic that the topology
//! builder and the evaluator must agree on.
//!
//! ## Key Components
//!
//! - [`grid`] - Dense 3D receptor energy lattices with O(1) probe lookup
//! - [`potentials`] - Energy/derivative tables over squared distance, keyed
//!   by atom-type pair

pub mod grid;
pub mod potentials;
