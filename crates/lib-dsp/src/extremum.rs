//! Search for the largest or smallest gain over a frequency band.

use crate::error::{DspError, DspResult};
use crate::sweep::linspace;
use crate::transfer_function::TransferFunction;
use lib_types::units::Hertz;
use num_complex::Complex64;

/// Points in the coarse scan that brackets the extremum.
const COARSE_POINTS: usize = 512;

/// Golden-section iterations (bracket shrinks by 0.618 each).
const REFINE_ITERATIONS: usize = 80;

/// Which extremum to search for.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Extremum {
    Minimum,
    Maximum,
}

impl TransferFunction {
    /// Locate the frequency in `[start_hz, stop_hz]` where `|H(j2πf)|` is
    /// smallest or largest.
    ///
    /// A coarse linear scan picks the best grid point, then golden-section
    /// search refines it within the neighbouring grid cells. Returns
    /// `(f_hz, |H|)`. Non-finite gains are never selected.
    pub fn find_extremum(
        &self,
        start_hz: f64,
        stop_hz: f64,
        kind: Extremum,
    ) -> DspResult<(f64, f64)> {
        if !(start_hz.is_finite() && stop_hz.is_finite() && start_hz >= 0.0 && start_hz < stop_hz) {
            return Err(DspError::InvalidConfig(format!(
                "extremum band [{}, {}] Hz is not a valid interval",
                start_hz, stop_hz
            )));
        }

        // Minimised objective: |H| for a minimum, -|H| for a maximum
        let sign = match kind {
            Extremum::Minimum => 1.0,
            Extremum::Maximum => -1.0,
        };
        let cost = |f: f64| {
            let gain = self.evaluate(Complex64::new(0.0, Hertz(f).angular())).norm();
            if gain.is_finite() {
                sign * gain
            } else {
                f64::INFINITY
            }
        };

        let grid = linspace(start_hz, stop_hz, COARSE_POINTS);
        let (best, _) = grid
            .iter()
            .enumerate()
            .map(|(i, &f)| (i, cost(f)))
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .ok_or(DspError::InsufficientData {
                needed: 1,
                got: 0,
            })?;

        let mut lo = grid[best.saturating_sub(1)];
        let mut hi = grid[(best + 1).min(grid.len() - 1)];

        let ratio = (5f64.sqrt() - 1.0) / 2.0;
        let mut x1 = hi - ratio * (hi - lo);
        let mut x2 = lo + ratio * (hi - lo);
        let mut c1 = cost(x1);
        let mut c2 = cost(x2);

        for _ in 0..REFINE_ITERATIONS {
            if c1 <= c2 {
                hi = x2;
                x2 = x1;
                c2 = c1;
                x1 = hi - ratio * (hi - lo);
                c1 = cost(x1);
            } else {
                lo = x1;
                x1 = x2;
                c1 = c2;
                x2 = lo + ratio * (hi - lo);
                c2 = cost(x2);
            }
        }

        // Never return worse than the coarse grid point
        let refined = 0.5 * (lo + hi);
        let f = if cost(refined) <= cost(grid[best]) {
            refined
        } else {
            grid[best]
        };

        Ok((f, sign * cost(f)))
    }
}
