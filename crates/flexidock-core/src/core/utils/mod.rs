//! # Core Utilities Module
//!
//! Shared mathematical helpers.
//!
//! - [`geometry`] - Quaternion and rotation utilities used by the forward
//!   kinematics pass and the optimizer's orientation updates

pub mod geometry;
