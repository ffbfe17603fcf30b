//! Coarse classification of first- and second-order sections.
//!
//! Only the zero/pole counts and a few magnitude comparisons are inspected.
//! Anything that is not a recognised first- or second-order shape is
//! [`FilterClass::Invalid`].

use crate::poly::trim_leading_zeros;
use crate::transfer_function::TransferFunction;
use num_complex::Complex64;

/// Relative tolerance for treating two root magnitudes as equal.
const MAGNITUDE_RTOL: f64 = 1e-5;

/// Absolute tolerance for treating a root magnitude as zero.
const MAGNITUDE_ATOL: f64 = 1e-8;

/// Category of a low-order section.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FilterClass {
    LowPassNotch,
    HighPassNotch,
    LowPass2,
    HighPass2,
    LowPass1,
    HighPass1,
    BandPass,
    BandReject,
    /// One zero and one pole away from the origin (shelving shape).
    SinglePoleZero,
    /// No zeros and no poles: a plain gain.
    Cable,
    Invalid,
}

/// A category with a descriptive label.
#[derive(Clone, Debug, PartialEq)]
pub struct Classification {
    pub class: FilterClass,
    pub label: String,
}

impl Classification {
    fn new(class: FilterClass, label: impl Into<String>) -> Self {
        Self {
            class,
            label: label.into(),
        }
    }
}

fn is_close(a: f64, b: f64) -> bool {
    (a - b).abs() <= MAGNITUDE_ATOL + MAGNITUDE_RTOL * b.abs()
}

impl TransferFunction {
    /// Classify a section of at most two poles.
    ///
    /// Corner and centre frequencies are in rad/s. For second-order sections
    /// `w0` and `Q` come from the monic denominator `s² + (w0/Q)s + w0²`.
    pub fn classify(&self) -> Classification {
        let zeros = self.zeros();
        let poles = self.poles();

        match (zeros.len(), poles.len()) {
            (2, 2) => self.classify_biquad(zeros[0], poles[0]),
            (1, 2) => {
                let (w0, q) = self.second_order_params();
                Classification::new(
                    FilterClass::BandPass,
                    format!("Second order band pass w0={:.2} Q={:.2}", w0, q),
                )
            }
            (0, 2) => Classification::new(
                FilterClass::LowPass2,
                format!("Second order low pass wc={:.2}", poles[0].norm()),
            ),
            (1, 1) => {
                let z = zeros[0].norm();
                let p = poles[0].norm();
                if is_close(z, 0.0) {
                    Classification::new(
                        FilterClass::HighPass1,
                        format!("First order high pass wc={:.2}", p),
                    )
                } else if z > p {
                    Classification::new(
                        FilterClass::SinglePoleZero,
                        "Single pole single zero high pass",
                    )
                } else {
                    Classification::new(
                        FilterClass::SinglePoleZero,
                        "Single pole single zero low pass",
                    )
                }
            }
            (0, 1) => Classification::new(
                FilterClass::LowPass1,
                format!("First order low pass wc={:.2}", poles[0].norm()),
            ),
            (0, 0) => Classification::new(FilterClass::Cable, "Cable"),
            _ => Classification::new(FilterClass::Invalid, "Invalid"),
        }
    }

    fn classify_biquad(&self, zero: Complex64, pole: Complex64) -> Classification {
        let (w0, q) = self.second_order_params();
        let z = zero.norm();
        let p = pole.norm();

        if is_close(z, 0.0) {
            Classification::new(
                FilterClass::HighPass2,
                format!("Second order high pass wc={:.2}", p),
            )
        } else if is_close(z, p) {
            Classification::new(
                FilterClass::BandReject,
                format!("Second order band reject w0={:.2} Q={:.2}", w0, q),
            )
        } else if z > p {
            Classification::new(
                FilterClass::LowPassNotch,
                format!("Second order low pass notch w0={:.2} Q={:.2}", w0, q),
            )
        } else {
            Classification::new(
                FilterClass::HighPassNotch,
                format!("Second order high pass notch w0={:.2} Q={:.2}", w0, q),
            )
        }
    }

    /// `(w0, Q)` of a second-order denominator, after scaling it monic.
    fn second_order_params(&self) -> (f64, f64) {
        let den = trim_leading_zeros(self.denominator());
        match den.as_slice() {
            [a, b, c] => {
                let w0 = (c / a).sqrt();
                (w0, w0 / (b / a))
            }
            _ => (f64::NAN, f64::NAN),
        }
    }
}
