//! Frequency sweep grids.

use lib_types::units::Hertz;

/// Generates `n` linearly spaced samples in [start, stop].
pub fn linspace(start: f64, stop: f64, n: usize) -> Vec<f64> {
    match n {
        0 => Vec::new(),
        1 => vec![start],
        _ => {
            let step = (stop - start) / (n as f64 - 1.0);
            (0..n).map(|i| start + step * i as f64).collect()
        }
    }
}

/// Generates `n` samples `10^x` with `x` linearly spaced in [start_exp, stop_exp].
pub fn logspace(start_exp: f64, stop_exp: f64, n: usize) -> Vec<f64> {
    linspace(start_exp, stop_exp, n)
        .into_iter()
        .map(|x| 10f64.powf(x))
        .collect()
}

/// How the frequency points of a sweep are chosen.
#[derive(Clone, Debug, PartialEq)]
pub enum FrequencyGrid {
    /// Use these frequencies (Hz) as given.
    Explicit(Vec<f64>),

    /// `points` frequencies linearly spaced from `start_hz` to `stop_hz`.
    Linear {
        start_hz: f64,
        stop_hz: f64,
        points: usize,
    },

    /// `points` frequencies logarithmically spaced from `10^start_decade` to
    /// `10^stop_decade` Hz.
    Log {
        start_decade: f64,
        stop_decade: f64,
        points: usize,
    },
}

impl Default for FrequencyGrid {
    fn default() -> Self {
        Self::Log {
            start_decade: -2.0,
            stop_decade: 6.0,
            points: 10_000,
        }
    }
}

impl FrequencyGrid {
    /// Frequencies of the grid in Hz.
    pub fn frequencies_hz(&self) -> Vec<f64> {
        match self {
            Self::Explicit(f) => f.clone(),
            Self::Linear {
                start_hz,
                stop_hz,
                points,
            } => linspace(*start_hz, *stop_hz, *points),
            Self::Log {
                start_decade,
                stop_decade,
                points,
            } => logspace(*start_decade, *stop_decade, *points),
        }
    }

    /// Angular frequencies of the grid in rad/s.
    pub fn angular(&self) -> Vec<f64> {
        self.frequencies_hz()
            .into_iter()
            .map(|f| Hertz(f).angular())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn linspace_basic() {
        let v = linspace(0.0, 1.0, 5);
        assert_eq!(v, vec![0.0, 0.25, 0.5, 0.75, 1.0]);
        assert!(linspace(0.0, 1.0, 0).is_empty());
        assert_eq!(linspace(3.0, 4.0, 1), vec![3.0]);
    }

    #[test]
    fn logspace_decades() {
        let v = logspace(-1.0, 2.0, 4);
        let expected = [0.1, 1.0, 10.0, 100.0];
        for (a, e) in v.iter().zip(expected.iter()) {
            assert!((a - e).abs() < 1e-12 * e);
        }
    }

    #[test]
    fn default_grid_is_log_sweep() {
        let f = FrequencyGrid::default().frequencies_hz();
        assert_eq!(f.len(), 10_000);
        assert!((f[0] - 0.01).abs() < 1e-15);
        assert!((f[9_999] - 1e6).abs() < 1e-6);
    }
}
