//! Interpretation of an expression as a rational function of `s`.
//!
//! Polynomials are coefficient vectors with the highest power first, the
//! same ordering the transfer-function code uses.

use crate::ast::{named_constant, parse_expression, BinaryOp, Expr};
use crate::error::{ParseError, ParseResult};
use tracing::debug;

/// Name of the free variable in a rational expression.
pub const RATIONAL_VARIABLE: &str = "s";

/// Parse text such as `1000/(s + 1000)` into numerator and denominator
/// coefficients, highest power first.
///
/// Leading zero coefficients are stripped and both polynomials are scaled so
/// the denominator is monic. No common factors are cancelled, so
/// `(s+1)/(s+1)` yields `([1, 1], [1, 1])`.
pub fn parse_rational(text: &str) -> ParseResult<(Vec<f64>, Vec<f64>)> {
    let expr = parse_expression(text)?;
    let rational = Rational::from_expr(&expr)?;

    let num = trim(rational.num);
    let den = trim(rational.den);
    if den[0] == 0.0 {
        return Err(ParseError::DivisionByZero);
    }

    let lead = den[0];
    let num: Vec<f64> = num.iter().map(|c| c / lead).collect();
    let den: Vec<f64> = den.iter().map(|c| c / lead).collect();

    debug!(
        num_degree = num.len() - 1,
        den_degree = den.len() - 1,
        "Parsed rational expression"
    );
    Ok((num, den))
}

/// A ratio of two real polynomials.
#[derive(Clone, Debug, PartialEq)]
struct Rational {
    num: Vec<f64>,
    den: Vec<f64>,
}

impl Rational {
    fn constant(value: f64) -> Self {
        Self {
            num: vec![value],
            den: vec![1.0],
        }
    }

    fn variable() -> Self {
        Self {
            num: vec![1.0, 0.0],
            den: vec![1.0],
        }
    }

    fn from_expr(expr: &Expr) -> ParseResult<Self> {
        match expr {
            Expr::Number(v) => Ok(Self::constant(*v)),
            Expr::Ident(name) if name == RATIONAL_VARIABLE => Ok(Self::variable()),
            Expr::Ident(name) => named_constant(name).map(Self::constant).ok_or_else(|| {
                ParseError::UnknownIdentifier {
                    name: name.clone(),
                    expected: RATIONAL_VARIABLE,
                }
            }),
            Expr::Neg(inner) => Ok(Self::from_expr(inner)?.neg()),
            Expr::Binary { op, lhs, rhs } => {
                let a = Self::from_expr(lhs)?;
                // Only constant integer exponents are accepted
                if *op == BinaryOp::Pow {
                    return a.pow(integer_exponent(rhs)?);
                }
                let b = Self::from_expr(rhs)?;
                match op {
                    BinaryOp::Add => Ok(a.add(&b, 1.0)),
                    BinaryOp::Sub => Ok(a.add(&b, -1.0)),
                    BinaryOp::Mul => Ok(a.mul(&b)),
                    _ => a.div(&b),
                }
            }
            Expr::Call { name, .. } => Err(ParseError::UnknownFunction(name.clone())),
        }
    }

    fn neg(self) -> Self {
        Self {
            num: self.num.iter().map(|c| -c).collect(),
            den: self.den,
        }
    }

    /// `self + sign·other`.
    fn add(&self, other: &Self, sign: f64) -> Self {
        if self.den == other.den {
            let scaled: Vec<f64> = other.num.iter().map(|c| sign * c).collect();
            return Self {
                num: poly_add(&self.num, &scaled),
                den: self.den.clone(),
            };
        }
        let lhs = poly_mul(&self.num, &other.den);
        let rhs: Vec<f64> = poly_mul(&other.num, &self.den)
            .into_iter()
            .map(|c| sign * c)
            .collect();
        Self {
            num: poly_add(&lhs, &rhs),
            den: poly_mul(&self.den, &other.den),
        }
    }

    fn mul(&self, other: &Self) -> Self {
        Self {
            num: poly_mul(&self.num, &other.num),
            den: poly_mul(&self.den, &other.den),
        }
    }

    fn div(&self, other: &Self) -> ParseResult<Self> {
        if other.num.iter().all(|&c| c == 0.0) {
            return Err(ParseError::DivisionByZero);
        }
        Ok(Self {
            num: poly_mul(&self.num, &other.den),
            den: poly_mul(&self.den, &other.num),
        })
    }

    fn pow(self, exponent: i32) -> ParseResult<Self> {
        let base = if exponent < 0 {
            Self::constant(1.0).div(&self)?
        } else {
            self
        };
        let mut result = Self::constant(1.0);
        for _ in 0..exponent.unsigned_abs() {
            result = result.mul(&base);
        }
        Ok(result)
    }
}

/// Exponent of a power, which must be a constant integer.
fn integer_exponent(expr: &Expr) -> ParseResult<i32> {
    let value = expr
        .constant_value()
        .ok_or_else(|| ParseError::InvalidExponent("exponent must be a constant".to_string()))?;
    if value.fract() != 0.0 || value.abs() > 64.0 {
        return Err(ParseError::InvalidExponent(format!(
            "{} is not a small integer",
            value
        )));
    }
    Ok(value as i32)
}

fn poly_add(a: &[f64], b: &[f64]) -> Vec<f64> {
    let len = a.len().max(b.len());
    let mut out = vec![0.0; len];
    for (i, &c) in a.iter().enumerate() {
        out[len - a.len() + i] += c;
    }
    for (i, &c) in b.iter().enumerate() {
        out[len - b.len() + i] += c;
    }
    out
}

fn poly_mul(a: &[f64], b: &[f64]) -> Vec<f64> {
    let mut out = vec![0.0; a.len() + b.len() - 1];
    for (i, &x) in a.iter().enumerate() {
        for (j, &y) in b.iter().enumerate() {
            out[i + j] += x * y;
        }
    }
    out
}

fn trim(coeffs: Vec<f64>) -> Vec<f64> {
    match coeffs.iter().position(|&c| c != 0.0) {
        Some(first) => coeffs[first..].to_vec(),
        None => vec![0.0],
    }
}
