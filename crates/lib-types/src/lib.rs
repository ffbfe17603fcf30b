//! # lib-types
//!
//! Core type definitions for the filter-bench workbench.
//!
//! This crate provides foundational types used throughout the workspace:
//! - Physical units with compile-time safety
//! - Waveform representation and periodic generators for time-domain signals
//! - Frequency-response and spectrum records handed to output layers

pub mod units;
pub mod waveform;
pub mod response;

pub use units::*;
pub use waveform::*;
pub use response::*;

/// Re-export num_complex for convenience
pub use num_complex::Complex64;
