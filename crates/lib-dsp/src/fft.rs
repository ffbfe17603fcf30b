//! FFT operations using rustfft.
//!
//! This module provides a wrapper around rustfft with:
//! - Planner caching for repeated transforms of any length
//! - The zero-centred, length-normalised spectrum used for signal displays
//! - The matching centred frequency axis
//!
//! Hold on to an [`FftEngine`] when transforming many signals of the same
//! length; the free [`centered_spectrum`] plans from scratch each call.

use crate::error::{DspError, DspResult};
use num_complex::Complex64;
use rustfft::FftPlanner;

/// FFT engine with a cached planner.
pub struct FftEngine {
    planner: FftPlanner<f64>,
}

impl FftEngine {
    /// Create a new FFT engine.
    pub fn new() -> Self {
        Self {
            planner: FftPlanner::new(),
        }
    }

    /// Perform forward FFT on complex data in-place.
    ///
    /// Any length is accepted; rustfft picks a mixed-radix or Bluestein plan
    /// for lengths that are not powers of two.
    pub fn fft_inplace(&mut self, data: &mut [Complex64]) -> DspResult<()> {
        if data.is_empty() {
            return Err(DspError::InsufficientData { needed: 1, got: 0 });
        }
        let fft = self.planner.plan_fft_forward(data.len());
        fft.process(data);
        Ok(())
    }

    /// Centred spectrum of a real signal: `fftshift(fft(x)) / n`.
    ///
    /// Bin `i` of the result corresponds to frequency index `i - n/2`.
    pub fn centered_spectrum(&mut self, signal: &[f64]) -> DspResult<Vec<Complex64>> {
        let n = signal.len();
        let mut buffer: Vec<Complex64> = signal.iter().map(|&x| Complex64::new(x, 0.0)).collect();
        self.fft_inplace(&mut buffer)?;

        let scale = 1.0 / n as f64;
        Ok(fftshift(&buffer).into_iter().map(|c| c * scale).collect())
    }
}

impl Default for FftEngine {
    fn default() -> Self {
        Self::new()
    }
}

/// A clone starts with an empty plan cache.
impl Clone for FftEngine {
    fn clone(&self) -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for FftEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FftEngine").finish_non_exhaustive()
    }
}

/// Rotate a spectrum so the zero-frequency bin sits at index `n/2`.
pub fn fftshift<T: Copy>(data: &[T]) -> Vec<T> {
    let n = data.len();
    let half = n / 2;
    (0..n).map(|i| data[(i + n - half) % n]).collect()
}

/// Frequency axis matching [`FftEngine::centered_spectrum`] for `n` samples
/// spaced `spacing` seconds apart: `f[i] = (i - n/2) / (n·spacing)`.
pub fn centered_frequencies(n: usize, spacing: f64) -> Vec<f64> {
    let half = (n / 2) as f64;
    let scale = 1.0 / (n as f64 * spacing);
    (0..n).map(|i| (i as f64 - half) * scale).collect()
}

/// Centred spectrum with a one-shot engine.
pub fn centered_spectrum(signal: &[f64]) -> DspResult<Vec<Complex64>> {
    FftEngine::new().centered_spectrum(signal)
}
