//! # Core Module
//!
//! This module provides the fundamental building blocks for flexible-ligand
//! docking, serving as the computational foundation of the library.
//!
//! ## Overview
//!
//! The core module implements the data structures and pure algorithms the
//! optimization engine evaluates millions of times per docking run: the
//! ligand's kinematic tree, the receptor's interaction grids, and the
//! tabulated pairwise potentials.
//!
//! ## Architecture
//!
//! The module is organized into specialized submodules:
//!
//! - **Molecular Representation** ([`models`]) - Atoms, rigid frames, the
//!   ligand arena, and the topology builder that assembles them
//! - **Potentials** ([`forcefield`]) - Receptor grid maps and pairwise
//!   potential lookup tables
//! - **Geometry** ([`utils`]) - Quaternion and rotation helpers shared by
//!   the kinematics and optimizer code

pub mod forcefield;
pub mod models;
pub mod utils;
