//! Polynomial and root algebra.
//!
//! Polynomials are coefficient slices with the highest power first:
//! `[a0, a1, ..., an]` is `a0·sⁿ + a1·sⁿ⁻¹ + ... + an`.

use crate::error::{DspError, DspResult};
use nalgebra::DMatrix;
use num_complex::Complex64;

/// Evaluate a real polynomial at a complex point using Horner's method.
#[inline]
pub fn poly_at(coeffs: &[f64], x: Complex64) -> Complex64 {
    coeffs
        .iter()
        .fold(Complex64::new(0.0, 0.0), |total, &c| total * x + c)
}

/// Term-by-term derivative. The derivative of a constant is `[0]`.
pub fn derivative(coeffs: &[f64]) -> Vec<f64> {
    let n = coeffs.len();
    if n <= 1 {
        return vec![0.0];
    }
    coeffs[..n - 1]
        .iter()
        .enumerate()
        .map(|(i, &c)| c * (n - 1 - i) as f64)
        .collect()
}

/// Drop leading zero coefficients, keeping at least one entry.
pub fn trim_leading_zeros(coeffs: &[f64]) -> Vec<f64> {
    match coeffs.iter().position(|&c| c != 0.0) {
        Some(first) => coeffs[first..].to_vec(),
        None => vec![0.0],
    }
}

/// Expand `(s - r1)(s - r2)...(s - rn)` into monic coefficients.
pub fn poly_from_roots(roots: &[Complex64]) -> Vec<Complex64> {
    let mut coeffs = vec![Complex64::new(1.0, 0.0)];
    for &root in roots {
        let mut next = vec![Complex64::new(0.0, 0.0); coeffs.len() + 1];
        for (i, &c) in coeffs.iter().enumerate() {
            next[i] += c;
            next[i + 1] -= c * root;
        }
        coeffs = next;
    }
    coeffs
}

/// Roots of a real polynomial.
///
/// Leading zeros are stripped and trailing zeros are returned as roots at the
/// origin; the remaining roots are the eigenvalues of the companion matrix.
/// A constant polynomial has no roots.
pub fn roots(coeffs: &[f64]) -> Vec<Complex64> {
    let trimmed = trim_leading_zeros(coeffs);
    if trimmed.len() < 2 {
        return Vec::new();
    }

    let trailing = trimmed.iter().rev().take_while(|&&c| c == 0.0).count();
    let core = &trimmed[..trimmed.len() - trailing];

    let mut result = Vec::with_capacity(trimmed.len() - 1);
    if core.len() >= 2 {
        let n = core.len() - 1;
        let lead = core[0];
        let mut companion = DMatrix::<f64>::zeros(n, n);
        for (j, &c) in core[1..].iter().enumerate() {
            companion[(0, j)] = -c / lead;
        }
        for i in 1..n {
            companion[(i, i - 1)] = 1.0;
        }
        result.extend(companion.complex_eigenvalues().iter().copied());
    }
    result.extend(std::iter::repeat(Complex64::new(0.0, 0.0)).take(trailing));
    result
}

/// Convert numerator/denominator coefficients to zeros, poles and gain.
///
/// `k = N0 / D0` after stripping leading zeros of both polynomials.
pub fn tf2zpk(num: &[f64], den: &[f64]) -> DspResult<(Vec<Complex64>, Vec<Complex64>, f64)> {
    let num = trim_leading_zeros(num);
    let den = trim_leading_zeros(den);
    if den[0] == 0.0 {
        return Err(DspError::InvalidCoefficients(
            "denominator is identically zero".to_string(),
        ));
    }

    let k = num[0] / den[0];
    Ok((roots(&num), roots(&den), k))
}

/// Convert zeros, poles and gain to numerator/denominator coefficients.
///
/// Returns the real parts of `k·poly(z)` and `poly(p)`; conjugate-paired
/// roots give real polynomials up to rounding.
pub fn zpk2tf(zeros: &[Complex64], poles: &[Complex64], k: f64) -> (Vec<f64>, Vec<f64>) {
    let num = poly_from_roots(zeros).iter().map(|c| k * c.re).collect();
    let den = poly_from_roots(poles).iter().map(|c| c.re).collect();
    (num, den)
}

/// Greedily match `a` against `b` as multisets and return the largest
/// pairwise distance, or `None` if lengths differ.
pub fn max_root_distance(a: &[Complex64], b: &[Complex64]) -> Option<f64> {
    if a.len() != b.len() {
        return None;
    }
    let mut remaining: Vec<Complex64> = b.to_vec();
    let mut worst: f64 = 0.0;
    for &x in a {
        let (idx, dist) = remaining
            .iter()
            .enumerate()
            .map(|(i, &y)| (i, (x - y).norm()))
            .min_by(|l, r| l.1.total_cmp(&r.1))?;
        worst = worst.max(dist);
        remaining.swap_remove(idx);
    }
    Some(worst)
}
