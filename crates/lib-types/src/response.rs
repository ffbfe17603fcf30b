//! Frequency-domain result records.
//!
//! These are the arrays handed to plotting or file output: a frequency axis
//! and one value per frequency point for every quantity. Every vector in a
//! record has the same length as its frequency axis.

use num_complex::Complex64;
use serde::{Deserialize, Serialize};

/// Magnitude, phase and group delay of a transfer function swept over frequency.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct BodeResponse {
    /// Frequency axis in Hz.
    pub frequency_hz: Vec<f64>,

    /// Gain, in dB when `in_db` is set, otherwise as a linear ratio.
    pub gain: Vec<f64>,

    /// Unwrapped phase in degrees.
    pub phase_deg: Vec<f64>,

    /// Group delay in seconds.
    pub group_delay: Vec<f64>,

    /// Whether `gain` is expressed in decibels.
    pub in_db: bool,
}

impl BodeResponse {
    /// Number of frequency points.
    pub fn len(&self) -> usize {
        self.frequency_hz.len()
    }

    /// Check if empty.
    pub fn is_empty(&self) -> bool {
        self.frequency_hz.is_empty()
    }

    /// Frequency range.
    pub fn frequency_range(&self) -> Option<(f64, f64)> {
        Some((*self.frequency_hz.first()?, *self.frequency_hz.last()?))
    }

    /// Gain converted to decibels regardless of how it is stored.
    pub fn gain_db(&self) -> Vec<f64> {
        if self.in_db {
            self.gain.clone()
        } else {
            self.gain.iter().map(|g| 20.0 * g.log10()).collect()
        }
    }
}

/// Spectral view of a sampled signal on a zero-centred frequency axis.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SpectralView {
    /// Frequency axis in Hz, ascending, zero-centred.
    pub frequency_hz: Vec<f64>,

    /// Spectrum magnitude.
    pub magnitude: Vec<f64>,

    /// Unwrapped phase in degrees.
    pub phase_deg: Vec<f64>,

    /// Finite-difference group delay: `-(φ[i+1] - φ[i]) / (f[i+1] - f[i])`,
    /// with the final entry set to the last phase value.
    pub group_delay: Vec<f64>,
}

impl SpectralView {
    /// Build the view from a centred complex spectrum and its frequency axis.
    ///
    /// # Panics
    ///
    /// Panics if `frequency_hz` and `spectrum` differ in length.
    pub fn from_spectrum(frequency_hz: Vec<f64>, spectrum: &[Complex64]) -> Self {
        assert_eq!(
            frequency_hz.len(),
            spectrum.len(),
            "frequency axis length {} doesn't match spectrum length {}",
            frequency_hz.len(),
            spectrum.len()
        );

        let magnitude = spectrum.iter().map(|c| c.norm()).collect();
        let wrapped: Vec<f64> = spectrum.iter().map(|c| c.arg().to_degrees()).collect();
        let phase_deg = unwrap_phase_deg(&wrapped);

        let mut group_delay: Vec<f64> = frequency_hz
            .windows(2)
            .zip(phase_deg.windows(2))
            .map(|(f, ph)| -(ph[1] - ph[0]) / (f[1] - f[0]))
            .collect();
        if let Some(&last) = phase_deg.last() {
            group_delay.push(last);
        }

        Self {
            frequency_hz,
            magnitude,
            phase_deg,
            group_delay,
        }
    }

    /// Number of frequency points.
    pub fn len(&self) -> usize {
        self.frequency_hz.len()
    }

    /// Check if empty.
    pub fn is_empty(&self) -> bool {
        self.frequency_hz.is_empty()
    }

    /// Frequency and magnitude of the strongest component.
    pub fn peak(&self) -> Option<(f64, f64)> {
        self.magnitude
            .iter()
            .enumerate()
            .filter(|(_, m)| m.is_finite())
            .max_by(|a, b| a.1.total_cmp(b.1))
            .map(|(i, &m)| (self.frequency_hz[i], m))
    }
}

/// Unwrap a phase sequence in degrees (remove 360-degree jumps).
///
/// Any step larger than 180° in magnitude is folded back into (-180°, 180°]
/// by adding a whole number of turns, and the correction accumulates along
/// the sequence.
pub fn unwrap_phase_deg(phases: &[f64]) -> Vec<f64> {
    let mut unwrapped = Vec::with_capacity(phases.len());
    let mut offset = 0.0;

    for (i, &phase) in phases.iter().enumerate() {
        if i > 0 {
            let diff = phase - phases[i - 1];
            if diff.abs() >= 180.0 {
                let mut folded = (diff + 180.0).rem_euclid(360.0) - 180.0;
                if folded == -180.0 && diff > 0.0 {
                    folded = 180.0;
                }
                offset += folded - diff;
            }
        }
        unwrapped.push(phase + offset);
    }

    unwrapped
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unwrap_removes_turns() {
        let wrapped = [170.0, -170.0, -150.0, 175.0, -175.0];
        let unwrapped = unwrap_phase_deg(&wrapped);
        let expected = [170.0, 190.0, 210.0, 175.0, 185.0];
        for (u, e) in unwrapped.iter().zip(expected.iter()) {
            assert!((u - e).abs() < 1e-9, "{} != {}", u, e);
        }
    }

    #[test]
    fn test_unwrap_multi_turn_step() {
        let unwrapped = unwrap_phase_deg(&[0.0, 730.0]);
        assert!((unwrapped[1] - 10.0).abs() < 1e-9);
    }

    #[test]
    fn test_spectral_view_lengths_and_boundary() {
        let freqs = vec![-1.0, 0.0, 1.0];
        let spectrum = [
            Complex64::new(0.0, 1.0),
            Complex64::new(1.0, 0.0),
            Complex64::new(0.0, -1.0),
        ];
        let view = SpectralView::from_spectrum(freqs, &spectrum);

        assert_eq!(view.len(), 3);
        assert_eq!(view.magnitude.len(), 3);
        assert_eq!(view.group_delay.len(), 3);
        assert!((view.phase_deg[0] - 90.0).abs() < 1e-9);
        assert!((view.group_delay[0] - 90.0).abs() < 1e-9);
        assert!((view.group_delay[1] - 90.0).abs() < 1e-9);
        // Final entry mirrors the last phase value
        assert!((view.group_delay[2] - view.phase_deg[2]).abs() < 1e-12);
        assert_eq!(view.peak().map(|p| p.1), Some(1.0));
    }

    #[test]
    fn test_bode_gain_db_conversion() {
        let bode = BodeResponse {
            frequency_hz: vec![1.0, 10.0],
            gain: vec![1.0, 0.1],
            phase_deg: vec![0.0, 0.0],
            group_delay: vec![0.0, 0.0],
            in_db: false,
        };
        let db = bode.gain_db();
        assert!((db[0] - 0.0).abs() < 1e-12);
        assert!((db[1] + 20.0).abs() < 1e-9);
        assert_eq!(bode.frequency_range(), Some((1.0, 10.0)));
    }
}
