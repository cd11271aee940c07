//! # Workflows Module
//!
//! This module provides high-level workflow implementations that orchestrate
//! complete docking runs in FlexiDock.
//!
//! ## Overview
//!
//! Workflows are the top-level entry points for users of FlexiDock. They
//! encapsulate the entire pipeline from input validation through parallel
//! trial execution to ranked result collection, providing a clean API over
//! the engine layer.
//!
//! ## Architecture
//!
//! The module is organized around specific docking workflows:
//!
//! - **Docking Workflow** ([`dock`]) - Multi-trial flexible-ligand docking
//!   against a rigid receptor grid, with result ranking.
//!
//! ## Key Capabilities
//!
//! - **Parallel trial fan-out** with per-trial seeds derived from one base
//!   seed, keeping runs reproducible
//! - **Input validation** of configuration and grid-map coverage before any
//!   trial starts
//! - **Progress monitoring** with phase and per-trial task reporting
//! - **Result ranking** with solutions sorted by energy

pub mod dock;
