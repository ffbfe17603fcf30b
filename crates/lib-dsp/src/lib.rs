//! # lib-dsp
//!
//! Numeric core of the filter-design workbench.
//!
//! This crate provides:
//!
//! - **Polynomial algebra**: Horner evaluation, derivatives, roots via the
//!   companion matrix, zero/pole/gain conversion
//! - **Transfer functions**: evaluation, normalisation, Bode sweeps with
//!   analytic group delay, cascade composition, classification
//! - **Time-domain simulation**: state-space realisation with first-order-hold
//!   discretisation
//! - **Spectra**: centred, length-normalised FFT
//! - **Sampling**: sample-and-hold, natural sampling and pass-through stages
//!   with spectral analysis of the sampling clock

pub mod classify;
pub mod error;
pub mod extremum;
pub mod fft;
pub mod lsim;
pub mod poly;
pub mod sampler;
pub mod sweep;
pub mod transfer_function;

pub use classify::{Classification, FilterClass};
pub use error::{DspError, DspResult};
pub use extremum::Extremum;
pub use fft::FftEngine;
pub use lsim::StateSpace;
pub use sampler::{sample_and_hold, Sampler, SamplingAnalysis, SamplingMode};
pub use sweep::FrequencyGrid;
pub use transfer_function::{BodeRequest, GainBand, TransferFunction};
