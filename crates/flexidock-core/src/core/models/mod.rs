//! # Core Models Module
//!
//! Data structures representing a flexible ligand as a kinematic tree of
//! rigid fragments, plus the builder that assembles the tree from a branched
//! atom description.
//!
//! ## Key Components
//!
//! - [`atom`] - Atom records with XScore-style type classification
//! - [`frame`] - A rigid fragment connected to its parent by one rotatable bond
//! - [`ligand`] - The immutable frame/atom arena and pose reconstruction
//! - [`builder`] - Topology construction from a record stream
//!
//! The frame tree is an arena of dense integer indices: frame 0 is the root
//! and every non-root frame's parent index is strictly smaller than its own,
//! so a single forward pass in increasing index order performs kinematics
//! and a single reverse pass aggregates forces.

pub mod atom;
pub mod builder;
pub mod frame;
pub mod ligand;
