//! Rational transfer functions `H(s) = N(s) / D(s)`.
//!
//! A [`TransferFunction`] keeps two synchronised descriptions of one linear
//! system: real numerator/denominator coefficients (highest power first) and
//! complex zeros, poles and a formula gain `k`. Setting either description
//! recomputes the other.
//!
//! `k` is the leading-coefficient ratio produced by root finding, which is
//! generally not the value of `H` at DC. [`TransferFunction::normalize`]
//! rescales the numerator so that `H(0)` equals the former `k`, and records
//! that value as `gain`.
//!
//! # Example
//!
//! ```
//! use lib_dsp::TransferFunction;
//! use num_complex::Complex64;
//!
//! let tf = TransferFunction::from_nd(&[1000.0], &[1.0, 1000.0], false).unwrap();
//! assert_eq!(tf.evaluate(Complex64::new(0.0, 0.0)).re, 1.0);
//! assert!((tf.group_delay(0.0) - 1e-3).abs() < 1e-12);
//! ```

use crate::error::{DspError, DspResult};
use crate::fft;
use crate::lsim::StateSpace;
use crate::poly::{derivative, poly_at, tf2zpk, zpk2tf};
use crate::sweep::{linspace, FrequencyGrid};
use lib_types::response::{unwrap_phase_deg, BodeResponse};
use lib_types::units::Hertz;
use num_complex::Complex64;
use rayon::prelude::*;
use std::f64::consts::PI;
use std::sync::OnceLock;
use tracing::{debug, warn};

/// Roots closer to the origin than this (in `|re| + |im|`) are skipped by
/// normalisation.
const ORIGIN_THRESHOLD: f64 = 1e-32;

/// Relative tolerance used to match roots when removing a stage.
const STAGE_MATCH_TOLERANCE: f64 = 1e-6;

/// Frequency points per band in [`TransferFunction::gain_range_in_band`].
const BAND_SWEEP_POINTS: usize = 1000;

/// Lazily computed `(N', D')`, reset by every mutation.
#[derive(Clone, Debug, Default)]
struct DerivativeCache(OnceLock<(Vec<f64>, Vec<f64>)>);

impl DerivativeCache {
    fn get_or_compute(&self, num: &[f64], den: &[f64]) -> &(Vec<f64>, Vec<f64>) {
        self.0.get_or_init(|| (derivative(num), derivative(den)))
    }

    fn is_valid(&self) -> bool {
        self.0.get().is_some()
    }

    fn invalidate(&mut self) {
        self.0 = OnceLock::new();
    }
}

/// Parameters of a Bode sweep.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct BodeRequest {
    /// Frequency points to evaluate.
    pub grid: FrequencyGrid,

    /// Report gain in dB instead of as a linear ratio.
    pub in_db: bool,
}

impl BodeRequest {
    /// Sweep the given frequencies (Hz).
    pub fn explicit(frequency_hz: Vec<f64>) -> Self {
        Self {
            grid: FrequencyGrid::Explicit(frequency_hz),
            ..Self::default()
        }
    }

    /// Return gain in dB.
    pub fn db(mut self) -> Self {
        self.in_db = true;
        self
    }
}

/// Frequency band(s) over which gain extremes are collected.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum GainBand {
    /// A single pass band `[start_hz, stop_hz]`.
    Pass { start_hz: f64, stop_hz: f64 },

    /// The two pass bands either side of a rejected band.
    Reject {
        lower: (f64, f64),
        upper: (f64, f64),
    },
}

/// A linear time-invariant system described by a rational function of `s`.
#[derive(Clone, Debug)]
pub struct TransferFunction {
    num: Vec<f64>,
    den: Vec<f64>,
    zeros: Vec<Complex64>,
    poles: Vec<Complex64>,
    k: f64,
    gain: f64,
    derivatives: DerivativeCache,
}

impl Default for TransferFunction {
    fn default() -> Self {
        Self::identity()
    }
}

impl TransferFunction {
    // ------------------------------------------------------------------
    // Construction
    // ------------------------------------------------------------------

    /// The unit system: no zeros, no poles, `k = 1`.
    pub fn identity() -> Self {
        Self {
            num: vec![1.0],
            den: vec![1.0],
            zeros: Vec::new(),
            poles: Vec::new(),
            k: 1.0,
            gain: 1.0,
            derivatives: DerivativeCache::default(),
        }
    }

    /// Parse a rational expression of `s`, such as `1000/(s + 1000)`.
    pub fn from_expression(text: &str, normalize: bool) -> DspResult<Self> {
        let mut tf = Self::identity();
        tf.try_set_expression(text, normalize)?;
        Ok(tf)
    }

    /// Build from numerator and denominator coefficients, highest power first.
    pub fn from_nd(num: &[f64], den: &[f64], normalize: bool) -> DspResult<Self> {
        let mut tf = Self::identity();
        tf.set_nd(num, den, normalize)?;
        Ok(tf)
    }

    /// Build from zeros, poles and formula gain.
    pub fn from_zpk(zeros: &[Complex64], poles: &[Complex64], k: f64, normalize: bool) -> Self {
        let mut tf = Self::identity();
        tf.set_zpk(zeros, poles, k, normalize);
        tf
    }

    /// Store both descriptions verbatim. The caller guarantees they agree.
    pub fn from_precomputed(
        zeros: Vec<Complex64>,
        poles: Vec<Complex64>,
        k: f64,
        num: Vec<f64>,
        den: Vec<f64>,
    ) -> Self {
        let mut tf = Self::identity();
        tf.set_zpknd(zeros, poles, k, num, den);
        tf
    }

    // ------------------------------------------------------------------
    // Mutation
    // ------------------------------------------------------------------

    /// Replace the system from expression text.
    ///
    /// Returns `false` and leaves the current system untouched when the text
    /// cannot be parsed. Use [`try_set_expression`](Self::try_set_expression)
    /// for the reason.
    pub fn set_expression(&mut self, text: &str, normalize: bool) -> bool {
        match self.try_set_expression(text, normalize) {
            Ok(()) => true,
            Err(e) => {
                debug!(expression = text, error = %e, "Rejected transfer function expression");
                false
            }
        }
    }

    /// Replace the system from expression text, reporting why parsing failed.
    pub fn try_set_expression(&mut self, text: &str, normalize: bool) -> DspResult<()> {
        let (num, den) = lib_expr::parse_rational(text)?;
        self.set_nd(&num, &den, normalize)
    }

    /// Replace the system from numerator/denominator coefficients.
    ///
    /// Zeros, poles and `k` are recomputed. On error the system is unchanged.
    pub fn set_nd(&mut self, num: &[f64], den: &[f64], normalize: bool) -> DspResult<()> {
        if num.is_empty() || den.is_empty() {
            return Err(DspError::InvalidCoefficients(
                "numerator and denominator must be non-empty".to_string(),
            ));
        }
        let (zeros, poles, k) = tf2zpk(num, den)?;

        self.num = num.to_vec();
        self.den = den.to_vec();
        self.zeros = zeros;
        self.poles = poles;
        self.k = k;
        self.derivatives.invalidate();

        if normalize {
            self.normalize();
        }
        Ok(())
    }

    /// Replace the system from zeros, poles and formula gain.
    ///
    /// Numerator and denominator are recomputed.
    pub fn set_zpk(&mut self, zeros: &[Complex64], poles: &[Complex64], k: f64, normalize: bool) {
        let (num, den) = zpk2tf(zeros, poles, k);
        self.num = num;
        self.den = den;
        self.zeros = zeros.to_vec();
        self.poles = poles.to_vec();
        self.k = k;
        self.derivatives.invalidate();

        if normalize {
            self.normalize();
        }
    }

    /// Replace both descriptions verbatim, without recomputation.
    pub fn set_zpknd(
        &mut self,
        zeros: Vec<Complex64>,
        poles: Vec<Complex64>,
        k: f64,
        num: Vec<f64>,
        den: Vec<f64>,
    ) {
        self.zeros = zeros;
        self.poles = poles;
        self.k = k;
        self.num = num;
        self.den = den;
        self.derivatives.invalidate();
    }

    /// Rescale so the product of `-z` over zeros divided by the product of
    /// `-p` over poles is one, skipping roots at the origin.
    ///
    /// `gain` takes the pre-rescale `k`; afterwards `H(0) = gain` for systems
    /// without roots at the origin.
    pub fn normalize(&mut self) {
        let a = self.normalization_factor();
        self.gain = self.k;
        self.k /= a;
        for c in &mut self.num {
            *c /= a;
        }
        self.derivatives.invalidate();
    }

    /// Inverse of [`normalize`](Self::normalize): multiply `k` and `N` by the
    /// same factor.
    pub fn denormalize(&mut self) {
        let a = self.normalization_factor();
        self.k *= a;
        for c in &mut self.num {
            *c *= a;
        }
        self.derivatives.invalidate();
    }

    fn normalization_factor(&self) -> f64 {
        let is_origin = |r: &&Complex64| r.re.abs() + r.im.abs() < ORIGIN_THRESHOLD;

        let mut a = Complex64::new(1.0, 0.0);
        for zero in self.zeros.iter().filter(|r| !is_origin(r)) {
            a *= -zero;
        }
        for pole in self.poles.iter().filter(|r| !is_origin(r)) {
            a /= -pole;
        }

        if a.im.abs() > 1e-9 * a.norm() {
            warn!(
                re = a.re,
                im = a.im,
                "Normalisation factor is not real, roots may not come in conjugate pairs"
            );
        }
        a.re
    }

    /// Cascade `other` after this system: zeros and poles are pooled and the
    /// formula gains multiply.
    pub fn append_stage(&mut self, other: &TransferFunction) {
        let mut zeros = self.zeros.clone();
        zeros.extend_from_slice(&other.zeros);
        let mut poles = self.poles.clone();
        poles.extend_from_slice(&other.poles);
        self.set_zpk(&zeros, &poles, self.k * other.k, false);
    }

    /// Undo [`append_stage`](Self::append_stage).
    ///
    /// Each of `other`'s roots removes the closest remaining root of this
    /// system, which must lie within a relative tolerance of it. If any root
    /// has no match, or `other` has zero gain, nothing is changed.
    pub fn remove_stage(&mut self, other: &TransferFunction) -> DspResult<()> {
        if other.k == 0.0 {
            return Err(DspError::StageMismatch("stage has zero gain".to_string()));
        }
        let zeros = remove_roots(&self.zeros, &other.zeros, "zero")?;
        let poles = remove_roots(&self.poles, &other.poles, "pole")?;
        self.set_zpk(&zeros, &poles, self.k / other.k, false);
        Ok(())
    }

    // ------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------

    /// Numerator coefficients, highest power first.
    pub fn numerator(&self) -> &[f64] {
        &self.num
    }

    /// Denominator coefficients, highest power first.
    pub fn denominator(&self) -> &[f64] {
        &self.den
    }

    pub fn zeros(&self) -> &[Complex64] {
        &self.zeros
    }

    pub fn poles(&self) -> &[Complex64] {
        &self.poles
    }

    /// Formula gain from root finding.
    pub fn k(&self) -> f64 {
        self.k
    }

    /// Reference gain recorded by the last normalisation.
    pub fn gain(&self) -> f64 {
        self.gain
    }

    /// Zeros and poles divided by `2π` (displayed in Hz), with `k`.
    pub fn zpk_hz(&self) -> (Vec<Complex64>, Vec<Complex64>, f64) {
        let scale = 1.0 / (2.0 * PI);
        (
            self.zeros.iter().map(|z| z * scale).collect(),
            self.poles.iter().map(|p| p * scale).collect(),
            self.k,
        )
    }

    /// Whether `(N', D')` are currently cached.
    pub fn derivatives_valid(&self) -> bool {
        self.derivatives.is_valid()
    }

    /// Derivative polynomials `(N', D')`, computed on first use.
    pub fn derivatives(&self) -> (&[f64], &[f64]) {
        let (dn, dd) = self.derivatives.get_or_compute(&self.num, &self.den);
        (dn.as_slice(), dd.as_slice())
    }

    // ------------------------------------------------------------------
    // Analysis
    // ------------------------------------------------------------------

    /// `N(s) / D(s)`. At a pole this is an IEEE infinity or NaN.
    #[inline]
    pub fn evaluate(&self, s: Complex64) -> Complex64 {
        poly_at(&self.num, s) / poly_at(&self.den, s)
    }

    /// Group delay in seconds at angular frequency `w` (rad/s):
    /// `-Im(i·(N'(iw)/N(iw) - D'(iw)/D(iw)))`.
    pub fn group_delay(&self, w: f64) -> f64 {
        let (dn, dd) = self.derivatives();
        let s = Complex64::new(0.0, w);
        let log_derivative =
            poly_at(dn, s) / poly_at(&self.num, s) - poly_at(dd, s) / poly_at(&self.den, s);
        -(Complex64::i() * log_derivative).im
    }

    /// Group delay at each angular frequency.
    pub fn group_delay_many(&self, ws: &[f64]) -> Vec<f64> {
        ws.iter().map(|&w| self.group_delay(w)).collect()
    }

    /// Gain, unwrapped phase and group delay over a frequency grid.
    ///
    /// Points are evaluated in parallel; the phase is unwrapped afterwards in
    /// frequency order.
    pub fn bode(&self, request: &BodeRequest) -> BodeResponse {
        let ws = request.grid.angular();
        debug!(points = ws.len(), in_db = request.in_db, "Bode sweep");

        // Fill the cache before sharing across threads
        self.derivatives();

        let points: Vec<(Complex64, f64)> = ws
            .par_iter()
            .map(|&w| (self.evaluate(Complex64::new(0.0, w)), self.group_delay(w)))
            .collect();

        let gain = points
            .iter()
            .map(|(h, _)| {
                if request.in_db {
                    20.0 * h.norm().log10()
                } else {
                    h.norm()
                }
            })
            .collect();
        let wrapped: Vec<f64> = points.iter().map(|(h, _)| h.arg().to_degrees()).collect();
        let group_delay = points.iter().map(|&(_, gd)| gd).collect();

        BodeResponse {
            frequency_hz: ws.iter().map(|&w| Hertz::from_angular(w).0).collect(),
            gain,
            phase_deg: unwrap_phase_deg(&wrapped),
            group_delay,
            in_db: request.in_db,
        }
    }

    /// Minimum and maximum gain over a band, each band swept linearly with
    /// 1000 points.
    pub fn gain_range_in_band(&self, band: GainBand, in_db: bool) -> (f64, f64) {
        let bands = match band {
            GainBand::Pass { start_hz, stop_hz } => vec![(start_hz, stop_hz)],
            GainBand::Reject { lower, upper } => vec![lower, upper],
        };

        let mut range = (f64::INFINITY, f64::NEG_INFINITY);
        for (start_hz, stop_hz) in bands {
            let request = BodeRequest {
                grid: FrequencyGrid::Explicit(linspace(start_hz, stop_hz, BAND_SWEEP_POINTS)),
                in_db,
            };
            for g in self.bode(&request).gain {
                range = (range.0.min(g), range.1.max(g));
            }
        }
        range
    }

    /// Quality factor `|p0| / (-2·Re p0)` of a two-pole system.
    pub fn pole_q(&self) -> Option<f64> {
        match self.poles.as_slice() {
            [p0, _] => Some(p0.norm() / (-2.0 * p0.re)),
            _ => None,
        }
    }

    /// Controllable canonical state-space realisation of `N/D`.
    pub fn state_space(&self) -> DspResult<StateSpace> {
        StateSpace::from_transfer_function(&self.num, &self.den)
    }

    /// Drive the system with `input` sampled at `time`, from rest.
    ///
    /// The output has the same length as `time`.
    pub fn simulate_input_signal(&self, input: &[f64], time: &[f64]) -> DspResult<Vec<f64>> {
        self.state_space()?.simulate(input, time)
    }

    /// Centred DFT of a sampled signal, normalised by its length.
    pub fn spectrum(signal: &[f64]) -> DspResult<Vec<Complex64>> {
        fft::centered_spectrum(signal)
    }

    /// Render `(N)/(D)` as expression text that parses back to the same
    /// coefficients. Powers use `**` when `asterisk` is set, else `^`.
    pub fn to_expression_text(&self, asterisk: bool) -> String {
        let pow = if asterisk { "**" } else { "^" };
        format!(
            "({})/({})",
            polynomial_text(&self.num, pow),
            polynomial_text(&self.den, pow)
        )
    }
}

/// Remove one closest match per entry of `remove` from `roots`.
fn remove_roots(
    roots: &[Complex64],
    remove: &[Complex64],
    kind: &str,
) -> DspResult<Vec<Complex64>> {
    let mut remaining = roots.to_vec();
    for target in remove {
        let tolerance = (STAGE_MATCH_TOLERANCE * target.norm()).max(1e-12);
        let closest = remaining
            .iter()
            .enumerate()
            .map(|(i, r)| (i, (r - target).norm()))
            .min_by(|a, b| a.1.total_cmp(&b.1));

        match closest {
            Some((i, dist)) if dist <= tolerance => {
                remaining.remove(i);
            }
            _ => {
                return Err(DspError::StageMismatch(format!(
                    "no {} matching {} in cascade",
                    kind, target
                )))
            }
        }
    }
    Ok(remaining)
}

fn polynomial_text(coeffs: &[f64], pow: &str) -> String {
    let degree = coeffs.len().saturating_sub(1);
    let mut text = String::new();

    for (i, &c) in coeffs.iter().enumerate() {
        if c == 0.0 {
            continue;
        }
        let power = degree - i;
        let term = match power {
            0 => format!("{}", c.abs()),
            1 => format!("{}*s", c.abs()),
            _ => format!("{}*s{}{}", c.abs(), pow, power),
        };
        if text.is_empty() {
            if c < 0.0 {
                text.push('-');
            }
        } else {
            text.push_str(if c < 0.0 { " - " } else { " + " });
        }
        text.push_str(&term);
    }

    if text.is_empty() {
        text.push('0');
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::poly::max_root_distance;

    fn c(re: f64, im: f64) -> Complex64 {
        Complex64::new(re, im)
    }

    fn lowpass() -> TransferFunction {
        TransferFunction::from_nd(&[1000.0], &[1.0, 1000.0], false).unwrap()
    }

    #[test]
    fn test_first_order_lowpass_dc_and_group_delay() {
        let tf = lowpass();
        assert_eq!(tf.evaluate(c(0.0, 0.0)), c(1.0, 0.0));
        assert!((tf.group_delay(0.0) - 1.0 / 1000.0).abs() < 1e-6);

        // tau(w) = a / (a^2 + w^2)
        let gd = tf.group_delay_many(&[1000.0, 3000.0]);
        assert!((gd[0] - 5e-4).abs() < 1e-12);
        assert!((gd[1] - 1000.0 / (1e6 + 9e6)).abs() < 1e-12);
    }

    #[test]
    fn test_evaluate_at_pole_is_not_finite() {
        let tf = TransferFunction::from_nd(&[1.0], &[1.0, 0.0], false).unwrap();
        assert!(!tf.evaluate(c(0.0, 0.0)).re.is_finite());
    }

    #[test]
    fn test_zpk_roundtrip_through_nd() {
        let zeros = vec![c(-2.0, 0.0), c(0.0, 30.0), c(0.0, -30.0)];
        let poles = vec![
            c(-5.0, 12.0),
            c(-5.0, -12.0),
            c(-40.0, 0.0),
            c(-1.0, 3.0),
            c(-1.0, -3.0),
            c(-7.0, 0.0),
        ];
        let a = TransferFunction::from_zpk(&zeros, &poles, 3.0, false);
        let b = TransferFunction::from_nd(a.numerator(), a.denominator(), false).unwrap();

        assert!((b.k() - 3.0).abs() < 1e-6 * 3.0);
        assert!(max_root_distance(b.zeros(), &zeros).unwrap() < 1e-6 * 30.0);
        assert!(max_root_distance(b.poles(), &poles).unwrap() < 1e-6 * 40.0);
    }

    #[test]
    fn test_normalize_sets_dc_gain() {
        // 2 (s + 3) / ((s + 1)(s + 2)) has H(0) = 3, k = 2
        let mut tf = TransferFunction::from_nd(&[2.0, 6.0], &[1.0, 3.0, 2.0], false).unwrap();
        tf.normalize();
        assert!((tf.gain() - 2.0).abs() < 1e-12);
        assert!((tf.evaluate(c(0.0, 0.0)).re - 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_normalize_denormalize_roundtrip() {
        let mut tf =
            TransferFunction::from_nd(&[5.0, 7.0, 3.0], &[2.0, 9.0, 4.0, 11.0], false).unwrap();
        let k0 = tf.k();
        let n0 = tf.numerator().to_vec();

        tf.normalize();
        tf.denormalize();

        assert!((tf.k() - k0).abs() < 1e-9 * k0.abs());
        for (a, b) in tf.numerator().iter().zip(n0.iter()) {
            assert!((a - b).abs() < 1e-9 * b.abs());
        }
    }

    #[test]
    fn test_normalize_skips_origin_roots() {
        // Highpass s / (s + 10): the zero at the origin is excluded
        let mut tf = TransferFunction::from_nd(&[1.0, 0.0], &[1.0, 10.0], false).unwrap();
        tf.normalize();
        assert!(tf.numerator().iter().all(|c| c.is_finite()));
        // a = 1 / 10, so N is scaled by 10
        assert!((tf.numerator()[0] - 10.0).abs() < 1e-9);
        tf.denormalize();
        assert!((tf.numerator()[0] - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_derivative_cache_invalidation() {
        let mut tf = lowpass();
        assert!(!tf.derivatives_valid());
        assert!((tf.group_delay(0.0) - 1e-3).abs() < 1e-12);
        assert!(tf.derivatives_valid());

        // Each mutation must drop the cached (N', D') and the next group
        // delay must come from the new polynomials.
        let check = |tf: &TransferFunction, expected_gd0: f64| {
            assert!(!tf.derivatives_valid());
            let gd = tf.group_delay(0.0);
            assert!((gd - expected_gd0).abs() < 1e-9, "gd(0) = {}", gd);
            assert!(tf.derivatives_valid());
        };

        tf.normalize();
        check(&tf, 1e-3);

        tf.set_nd(&[1.0], &[1.0, 2.0, 1.0], false).unwrap();
        assert!(!tf.derivatives_valid());
        let (dn, dd) = tf.derivatives();
        assert_eq!(dn, &[0.0]);
        assert_eq!(dd, &[2.0, 2.0]);
        // 1 / (s + 1)^2 delays by 2 s at DC
        assert!((tf.group_delay(0.0) - 2.0).abs() < 1e-12);

        tf.set_zpk(&[], &[c(-10.0, 0.0)], 10.0, false);
        check(&tf, 0.1);

        tf.denormalize();
        check(&tf, 0.1);
        assert!((tf.numerator()[0] - 1.0).abs() < 1e-12);

        let stage = TransferFunction::from_zpk(&[], &[c(-100.0, 0.0)], 100.0, false);
        tf.append_stage(&stage);
        check(&tf, 0.1 + 0.01);

        tf.remove_stage(&stage).unwrap();
        check(&tf, 0.1);

        tf.set_zpknd(vec![], vec![c(-4.0, 0.0)], 4.0, vec![4.0], vec![1.0, 4.0]);
        check(&tf, 0.25);
    }

    #[test]
    fn test_precomputed_stored_verbatim() {
        // Roots and coefficients deliberately disagree; neither side is
        // rederived from the other.
        let zeros = vec![c(-1.0, 0.0)];
        let poles = vec![c(-2.0, 0.0), c(-3.0, 0.0)];
        let mut tf = TransferFunction::from_precomputed(
            zeros.clone(),
            poles.clone(),
            7.0,
            vec![1000.0],
            vec![1.0, 1000.0],
        );
        assert_eq!(tf.zeros(), zeros.as_slice());
        assert_eq!(tf.poles(), poles.as_slice());
        assert_eq!(tf.k(), 7.0);
        assert_eq!(tf.numerator(), &[1000.0]);
        assert_eq!(tf.denominator(), &[1.0, 1000.0]);
        // Analysis reads N and D
        assert!((tf.group_delay(0.0) - 1e-3).abs() < 1e-12);
        assert!(tf.derivatives_valid());

        tf.set_zpknd(vec![c(-3.0, 0.0)], vec![], 0.5, vec![1.0], vec![1.0, 10.0]);
        assert!(!tf.derivatives_valid());
        assert_eq!(tf.zeros(), &[c(-3.0, 0.0)]);
        assert!(tf.poles().is_empty());
        assert_eq!(tf.k(), 0.5);
        assert_eq!(tf.numerator(), &[1.0]);
        assert_eq!(tf.denominator(), &[1.0, 10.0]);
        assert!((tf.group_delay(0.0) - 0.1).abs() < 1e-12);
    }

    #[test]
    fn test_cascade_identity() {
        let mut tf =
            TransferFunction::from_zpk(&[c(-3.0, 0.0)], &[c(-1.0, 2.0), c(-1.0, -2.0)], 4.0, false);
        let before = (tf.zeros().to_vec(), tf.poles().to_vec(), tf.k());

        tf.append_stage(&TransferFunction::identity());

        assert_eq!(tf.zeros(), before.0.as_slice());
        assert_eq!(tf.poles(), before.1.as_slice());
        assert_eq!(tf.k(), before.2);
    }

    #[test]
    fn test_append_then_remove_restores() {
        let mut tf = TransferFunction::from_zpk(&[c(-3.0, 0.0)], &[c(-1.0, 0.0)], 2.0, false);
        let stage = TransferFunction::from_zpk(&[], &[c(-5.0, 1.0), c(-5.0, -1.0)], 26.0, false);
        let before = (tf.zeros().to_vec(), tf.poles().to_vec(), tf.k());

        tf.append_stage(&stage);
        assert_eq!(tf.poles().len(), 3);
        assert!((tf.k() - 52.0).abs() < 1e-12);

        tf.remove_stage(&stage).unwrap();
        assert_eq!(tf.zeros(), before.0.as_slice());
        assert_eq!(tf.poles(), before.1.as_slice());
        assert!((tf.k() - before.2).abs() < 1e-12);
    }

    #[test]
    fn test_remove_stage_keeps_duplicates() {
        let mut tf = TransferFunction::from_zpk(&[], &[c(-1.0, 0.0), c(-1.0, 0.0)], 1.0, false);
        let stage = TransferFunction::from_zpk(&[], &[c(-1.0, 0.0)], 1.0, false);
        tf.remove_stage(&stage).unwrap();
        assert_eq!(tf.poles(), &[c(-1.0, 0.0)]);
    }

    #[test]
    fn test_remove_stage_mismatch_leaves_state() {
        let mut tf = TransferFunction::from_zpk(&[c(-3.0, 0.0)], &[c(-1.0, 0.0)], 2.0, false);
        let stage = TransferFunction::from_zpk(&[], &[c(-1.0, 0.0), c(-9.0, 0.0)], 1.0, false);

        let result = tf.remove_stage(&stage);
        assert!(matches!(result, Err(DspError::StageMismatch(_))));
        assert_eq!(tf.poles(), &[c(-1.0, 0.0)]);
        assert_eq!(tf.k(), 2.0);
    }

    #[test]
    fn test_set_expression_failure_keeps_state() {
        let mut tf = lowpass();
        assert!(!tf.set_expression("1/(s+", false));
        assert_eq!(tf.numerator(), &[1000.0]);
        assert_eq!(tf.denominator(), &[1.0, 1000.0]);

        assert!(matches!(
            tf.try_set_expression("1/(x+1)", false),
            Err(DspError::Expression(_))
        ));

        assert!(tf.set_expression("1/(s + 10)", false));
        assert_eq!(tf.denominator(), &[1.0, 10.0]);
    }

    #[test]
    fn test_bode_lowpass() {
        let tf = lowpass();
        let corner = 1000.0 / (2.0 * PI);
        let request = BodeRequest::explicit(vec![corner / 100.0, corner, corner * 100.0]).db();
        let bode = tf.bode(&request);

        assert_eq!(bode.len(), 3);
        assert!(bode.in_db);
        assert!(bode.gain[0].abs() < 1e-3);
        assert!((bode.gain[1] + 3.0103).abs() < 1e-3);
        assert!((bode.gain[2] + 40.0).abs() < 1e-2);
        assert!((bode.phase_deg[1] + 45.0).abs() < 1e-9);
        assert!((bode.group_delay[1] - 5e-4).abs() < 1e-12);
        assert!((bode.frequency_hz[1] - corner).abs() < 1e-9);
    }

    #[test]
    fn test_bode_default_grid_and_linear_gain() {
        let tf = lowpass();
        let request = BodeRequest::default();
        assert_eq!(request.grid, FrequencyGrid::default());
        assert!(!request.in_db);
        let bode = tf.bode(&request);
        assert_eq!(bode.len(), 10_000);
        assert_eq!(bode.gain.len(), bode.len());
        assert_eq!(bode.phase_deg.len(), bode.len());
        assert_eq!(bode.group_delay.len(), bode.len());
        assert!(!bode.in_db);
        assert!((bode.gain[0] - 1.0).abs() < 1e-6);
        // Phase is continuous across the sweep
        for w in bode.phase_deg.windows(2) {
            assert!((w[1] - w[0]).abs() < 180.0);
        }
    }

    #[test]
    fn test_bode_phase_unwrapped_past_180() {
        // Third-order lowpass passes through -180 degrees
        let poles = [c(-1.0, 0.0), c(-1.0, 0.0), c(-1.0, 0.0)];
        let tf = TransferFunction::from_zpk(&[], &poles, 1.0, false);
        let request = BodeRequest {
            grid: FrequencyGrid::Log {
                start_decade: -3.0,
                stop_decade: 2.0,
                points: 500,
            },
            in_db: false,
        };
        let bode = tf.bode(&request);
        let last = *bode.phase_deg.last().unwrap();
        assert!(last < -260.0 && last > -270.0, "last phase {}", last);
    }

    #[test]
    fn test_gain_range_in_band() {
        let tf = lowpass();
        let corner = 1000.0 / (2.0 * PI);
        let (min, max) = tf.gain_range_in_band(
            GainBand::Pass {
                start_hz: 0.0,
                stop_hz: corner,
            },
            true,
        );
        assert!(max.abs() < 1e-9);
        assert!((min + 3.0103).abs() < 1e-3);

        let (min, max) = tf.gain_range_in_band(
            GainBand::Reject {
                lower: (0.0, 1.0),
                upper: (corner * 10.0, corner * 100.0),
            },
            false,
        );
        assert!((max - 1.0).abs() < 1e-9);
        assert!((min - 1.0 / (1.0f64 + 1e4).sqrt()).abs() < 1e-9);
    }

    #[test]
    fn test_pole_q() {
        // w0 = 10, Q = 2: poles of s^2 + 5 s + 100
        let tf = TransferFunction::from_nd(&[100.0], &[1.0, 5.0, 100.0], false).unwrap();
        assert!((tf.pole_q().unwrap() - 2.0).abs() < 1e-9);
        assert!(lowpass().pole_q().is_none());
    }

    #[test]
    fn test_zpk_hz() {
        let tf = TransferFunction::from_zpk(&[c(0.0, 2.0 * PI)], &[c(-4.0 * PI, 0.0)], 1.0, false);
        let (z, p, k) = tf.zpk_hz();
        assert!((z[0] - c(0.0, 1.0)).norm() < 1e-12);
        assert!((p[0] - c(-2.0, 0.0)).norm() < 1e-12);
        assert_eq!(k, 1.0);
    }

    #[test]
    fn test_expression_text_roundtrip() {
        let tf = TransferFunction::from_nd(&[2.5, 0.0, -4.0], &[1.0, 0.5, 100.0], false).unwrap();
        for asterisk in [false, true] {
            let text = tf.to_expression_text(asterisk);
            let parsed = TransferFunction::from_expression(&text, false).unwrap();
            assert_eq!(parsed.numerator(), tf.numerator(), "{}", text);
            assert_eq!(parsed.denominator(), tf.denominator(), "{}", text);
        }
        assert_eq!(lowpass().to_expression_text(false), "(1000)/(1*s + 1000)");
    }

    #[test]
    fn test_simulate_matches_lsim() {
        let tf = lowpass();
        let t: Vec<f64> = (0..200).map(|i| i as f64 * 2e-5).collect();
        let u = vec![1.0; t.len()];
        let y = tf.simulate_input_signal(&u, &t).unwrap();
        assert_eq!(y.len(), t.len());
        let last = *y.last().unwrap();
        assert!((last - (1.0 - (-1000.0 * t[199]).exp())).abs() < 1e-9);
    }
}
