//! Continuous-time linear system simulation.
//!
//! A transfer function `N(s)/D(s)` is realised in controllable canonical
//! form and driven by a sampled input. Between samples the input is taken
//! to vary linearly (first-order hold), which makes the response exact for
//! piecewise-linear inputs.
//!
//! # Discretisation
//!
//! For a step `dt`, the matrix exponential of the augmented block matrix
//!
//! ```text
//! M = | A·dt  B·dt  0 |
//!     |  0     0    1 |
//!     |  0     0    0 |
//! ```
//!
//! yields `Ad = E[0..n, 0..n]`, `Bd1 = E[0..n, n+1]` and
//! `Bd0 = E[0..n, n] - Bd1`, and each step is
//! `x[i] = Ad·x[i-1] + Bd0·u[i-1] + Bd1·u[i]`.

use crate::error::{DspError, DspResult};
use crate::poly::trim_leading_zeros;
use nalgebra::{DMatrix, DVector};
use tracing::{debug, warn};

/// Relative tolerance for treating two time steps as equal.
const STEP_TOLERANCE: f64 = 1e-9;

/// State-space realisation `x' = A x + B u`, `y = C x + D u` of a SISO system.
#[derive(Clone, Debug, PartialEq)]
pub struct StateSpace {
    pub a: DMatrix<f64>,
    pub b: DVector<f64>,
    pub c: DVector<f64>,
    pub d: f64,
}

/// Discrete-time matrices for one step size.
struct Discretized {
    dt: f64,
    ad: DMatrix<f64>,
    bd0: DVector<f64>,
    bd1: DVector<f64>,
}

impl StateSpace {
    /// Controllable canonical realisation of `num(s)/den(s)`.
    ///
    /// The denominator is scaled to be monic and the numerator padded to the
    /// same length. A constant denominator gives a zero-state pure gain.
    pub fn from_transfer_function(num: &[f64], den: &[f64]) -> DspResult<Self> {
        let num = trim_leading_zeros(num);
        let den = trim_leading_zeros(den);
        if den[0] == 0.0 {
            return Err(DspError::InvalidCoefficients(
                "denominator is identically zero".to_string(),
            ));
        }
        if num.len() > den.len() {
            return Err(DspError::ImproperTransferFunction {
                num_degree: num.len() - 1,
                den_degree: den.len() - 1,
            });
        }

        let lead = den[0];
        let den: Vec<f64> = den.iter().map(|c| c / lead).collect();
        let mut padded = vec![0.0; den.len() - num.len()];
        padded.extend(num.iter().map(|c| c / lead));

        let n = den.len() - 1;
        let d = padded[0];

        let mut a = DMatrix::<f64>::zeros(n, n);
        for j in 0..n {
            a[(0, j)] = -den[j + 1];
        }
        for i in 1..n {
            a[(i, i - 1)] = 1.0;
        }

        let mut b = DVector::<f64>::zeros(n);
        if n > 0 {
            b[0] = 1.0;
        }

        let c = DVector::from_iterator(n, (0..n).map(|j| padded[j + 1] - d * den[j + 1]));

        Ok(Self { a, b, c, d })
    }

    /// Number of states.
    pub fn order(&self) -> usize {
        self.b.len()
    }

    /// Simulate the response to `input` sampled at `time`, from zero initial state.
    ///
    /// The output has one sample per time point. The discretisation is
    /// recomputed whenever the step size changes.
    pub fn simulate(&self, input: &[f64], time: &[f64]) -> DspResult<Vec<f64>> {
        if input.len() != time.len() {
            return Err(DspError::LengthMismatch {
                expected: time.len(),
                actual: input.len(),
            });
        }
        if let Some(index) = time.windows(2).position(|w| !(w[1] > w[0])) {
            return Err(DspError::NonMonotonicTime { index: index + 1 });
        }

        let n = self.order();
        if n == 0 {
            return Ok(input.iter().map(|u| self.d * u).collect());
        }
        if time.is_empty() {
            return Ok(Vec::new());
        }

        debug!(states = n, samples = time.len(), "Simulating linear system");

        let mut output = Vec::with_capacity(time.len());
        let mut x = DVector::<f64>::zeros(n);
        output.push(self.d * input[0]);
        if time.len() == 1 {
            return Ok(output);
        }

        let mut disc = self.discretize(time[1] - time[0]);
        let mut rediscretizations = 0usize;

        for i in 1..time.len() {
            let dt = time[i] - time[i - 1];
            if (disc.dt - dt).abs() > STEP_TOLERANCE * disc.dt {
                disc = self.discretize(dt);
                rediscretizations += 1;
            }

            x = &disc.ad * &x + &disc.bd0 * input[i - 1] + &disc.bd1 * input[i];
            output.push(self.c.dot(&x) + self.d * input[i]);
        }

        if rediscretizations > 0 {
            warn!(
                rediscretizations,
                "Non-uniform time grid, discretisation recomputed per step change"
            );
        }

        Ok(output)
    }

    fn discretize(&self, dt: f64) -> Discretized {
        let n = self.order();
        let mut m = DMatrix::<f64>::zeros(n + 2, n + 2);
        m.view_mut((0, 0), (n, n)).copy_from(&(&self.a * dt));
        m.view_mut((0, n), (n, 1)).copy_from(&(&self.b * dt));
        m[(n, n + 1)] = 1.0;

        let e = m.exp();
        let ad = e.view((0, 0), (n, n)).into_owned();
        let bd1 = DVector::from_iterator(n, (0..n).map(|i| e[(i, n + 1)]));
        let bd0 = DVector::from_iterator(n, (0..n).map(|i| e[(i, n)] - e[(i, n + 1)]));

        Discretized { dt, ad, bd0, bd1 }
    }
}
