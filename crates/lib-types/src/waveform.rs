//! Time-domain waveform representation and periodic generators.
//!
//! Waveforms are the data that flows between pipeline stages: each stage
//! consumes the previous stage's samples on the shared time grid and produces
//! a new sequence of the same length.
//!
//! # Sample Semantics
//!
//! Samples in a `Waveform` represent **point measurements** at discrete time instants.
//! For a waveform with `N` samples, the sample times are:
//!
//! ```text
//! t[i] = t_start + i * dt,  for i = 0, 1, ..., N-1
//! ```
//!
//! `duration()` returns `N * dt`, one step past the last sample time.

use crate::units::Seconds;
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

/// A uniformly-sampled time-domain waveform.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Waveform {
    /// Sample values.
    pub samples: Vec<f64>,

    /// Time step between consecutive samples.
    pub dt: Seconds,

    /// Time of the first sample.
    pub t_start: Seconds,
}

impl Waveform {
    /// Create a new waveform from samples.
    pub fn new(samples: Vec<f64>, dt: Seconds, t_start: Seconds) -> Self {
        Self { samples, dt, t_start }
    }

    /// Create a waveform on the same time grid as `self` with new samples.
    pub fn with_samples(&self, samples: Vec<f64>) -> Self {
        Self {
            samples,
            dt: self.dt,
            t_start: self.t_start,
        }
    }

    /// Number of samples in the waveform.
    #[inline]
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Check if the waveform is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Total duration of the waveform.
    #[inline]
    pub fn duration(&self) -> Seconds {
        Seconds(self.samples.len() as f64 * self.dt.0)
    }

    /// Get the time value for a given sample index.
    #[inline]
    pub fn time_at(&self, index: usize) -> Seconds {
        Seconds(self.t_start.0 + index as f64 * self.dt.0)
    }

    /// Explicit time vector, one entry per sample.
    pub fn times(&self) -> Vec<f64> {
        (0..self.samples.len()).map(|i| self.time_at(i).0).collect()
    }

    /// Peak-to-peak amplitude.
    pub fn peak_to_peak(&self) -> f64 {
        if self.samples.is_empty() {
            return 0.0;
        }
        let (min, max) = self.samples.iter().fold((f64::MAX, f64::MIN), |(min, max), &v| {
            (min.min(v), max.max(v))
        });
        max - min
    }

    /// Root mean square value.
    pub fn rms(&self) -> f64 {
        if self.samples.is_empty() {
            return 0.0;
        }
        let sum_sq: f64 = self.samples.iter().map(|v| v * v).sum();
        (sum_sq / self.samples.len() as f64).sqrt()
    }
}

/// Half-open uniform time grid `[t_start, t_stop)` with spacing `step`.
///
/// Produces `ceil((t_stop - t_start) / step)` points, the same count as a
/// conventional `arange`. Returns an empty grid for a non-positive step or an
/// empty interval.
pub fn time_grid(t_start: Seconds, t_stop: Seconds, step: Seconds) -> Vec<f64> {
    if !(step.0 > 0.0) || !(t_stop.0 > t_start.0) {
        return Vec::new();
    }
    let count = ((t_stop.0 - t_start.0) / step.0).ceil() as usize;
    (0..count).map(|i| t_start.0 + i as f64 * step.0).collect()
}

/// Square wave with period `2π`, value `1` while `phase mod 2π < 2π·duty`, else `-1`.
///
/// `duty = 0` yields a constant `-1`, `duty = 1` a constant `1`.
#[inline]
pub fn square(phase: f64, duty: f64) -> f64 {
    let wrapped = phase.rem_euclid(2.0 * PI);
    if wrapped < 2.0 * PI * duty {
        1.0
    } else {
        -1.0
    }
}

/// Sawtooth wave with period `2π` rising from `-1` to `1` over `2π·width`,
/// then falling back to `-1`.
pub fn sawtooth(phase: f64, width: f64) -> f64 {
    let wrapped = phase.rem_euclid(2.0 * PI);
    let rise = 2.0 * PI * width;
    if wrapped < rise {
        wrapped / (PI * width) - 1.0
    } else if width >= 1.0 {
        1.0
    } else {
        (PI * (width + 1.0) - wrapped) / (PI * (1.0 - width))
    }
}

/// Heaviside step: `0` below zero, `1` above, `h0` exactly at zero.
#[inline]
pub fn heaviside(x: f64, h0: f64) -> f64 {
    if x < 0.0 {
        0.0
    } else if x > 0.0 {
        1.0
    } else {
        h0
    }
}
