//! Time and frequency newtypes.
//!
//! A sampling frequency and a time step are both bare `f64`s in the maths;
//! wrapping them keeps `Sampler::try_new(Hertz(..))` from silently accepting
//! a period. The wrappers stay thin: arithmetic happens on `.0`.

use serde::{Deserialize, Serialize};
use std::f64::consts::PI;
use std::ops::Div;

/// Time in seconds.
#[derive(Clone, Copy, Debug, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
pub struct Seconds(pub f64);

/// Split a duration into equal steps.
impl Div<f64> for Seconds {
    type Output = Self;
    fn div(self, rhs: f64) -> Self {
        Self(self.0 / rhs)
    }
}

/// Cyclic frequency in Hz.
#[derive(Clone, Copy, Debug, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
pub struct Hertz(pub f64);

impl Hertz {
    /// Cyclic frequency of an angular frequency in rad/s.
    #[inline]
    pub fn from_angular(omega: f64) -> Self {
        Self(omega / (2.0 * PI))
    }

    /// Angular frequency `2πf` in rad/s.
    #[inline]
    pub fn angular(&self) -> f64 {
        2.0 * PI * self.0
    }

    /// One period of this frequency.
    #[inline]
    pub fn to_period(&self) -> Seconds {
        Seconds(1.0 / self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_period_of_sampling_clock() {
        // 100 grid points per period of an 8 kHz clock
        let step = Hertz(8000.0).to_period() / 100.0;
        assert!((step.0 - 1.25e-6).abs() < 1e-18);
    }

    #[test]
    fn test_angular_roundtrip() {
        let freq = Hertz(159.154_943_091_895_34);
        assert!((freq.angular() - 1000.0).abs() < 1e-9);
        assert!((Hertz::from_angular(1000.0).0 - freq.0).abs() < 1e-9);
    }
}
