//! Interpretation of an expression as a signal of time `t`.

use crate::ast::{named_constant, parse_expression, BinaryOp, Expr};
use crate::error::{ParseError, ParseResult};
use lib_types::waveform::{heaviside, sawtooth, square};
use tracing::debug;

/// Name of the free variable in a signal expression.
pub const SIGNAL_VARIABLE: &str = "t";

/// Functions available in signal expressions.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Function {
    Sin,
    Cos,
    Tan,
    Exp,
    Log,
    Sqrt,
    Abs,
    Square,
    Sawtooth,
    Heaviside,
}

impl Function {
    fn lookup(name: &str) -> Option<Self> {
        Some(match name {
            "sin" => Self::Sin,
            "cos" => Self::Cos,
            "tan" => Self::Tan,
            "exp" => Self::Exp,
            "log" => Self::Log,
            "sqrt" => Self::Sqrt,
            "abs" => Self::Abs,
            "square" => Self::Square,
            "sawtooth" => Self::Sawtooth,
            "heaviside" => Self::Heaviside,
            _ => return None,
        })
    }

    /// Accepted argument counts as `(min, max, description)`.
    fn arity(self) -> (usize, usize, &'static str) {
        match self {
            Self::Square | Self::Sawtooth | Self::Heaviside => (1, 2, "1 or 2"),
            _ => (1, 1, "1"),
        }
    }

    fn apply(self, args: &[f64]) -> f64 {
        let x = args[0];
        match self {
            Self::Sin => x.sin(),
            Self::Cos => x.cos(),
            Self::Tan => x.tan(),
            Self::Exp => x.exp(),
            Self::Log => x.ln(),
            Self::Sqrt => x.sqrt(),
            Self::Abs => x.abs(),
            Self::Square => square(x, args.get(1).copied().unwrap_or(0.5)),
            Self::Sawtooth => sawtooth(x, args.get(1).copied().unwrap_or(1.0)),
            Self::Heaviside => heaviside(x, args.get(1).copied().unwrap_or(0.5)),
        }
    }
}

/// Evaluate a signal expression such as `sin(2*pi*1000*t)` at every time in `t`.
///
/// The expression is checked once up front, so an unknown name is reported
/// even for an empty time vector.
pub fn evaluate_signal(text: &str, t: &[f64]) -> ParseResult<Vec<f64>> {
    let expr = parse_expression(text)?;
    check(&expr)?;

    debug!(points = t.len(), "Evaluating signal expression");
    Ok(t.iter().map(|&time| eval_at(&expr, time)).collect())
}

fn check(expr: &Expr) -> ParseResult<()> {
    match expr {
        Expr::Number(_) => Ok(()),
        Expr::Ident(name) => {
            if name == SIGNAL_VARIABLE || named_constant(name).is_some() {
                Ok(())
            } else {
                Err(ParseError::UnknownIdentifier {
                    name: name.clone(),
                    expected: SIGNAL_VARIABLE,
                })
            }
        }
        Expr::Neg(inner) => check(inner),
        Expr::Binary { lhs, rhs, .. } => {
            check(lhs)?;
            check(rhs)
        }
        Expr::Call { name, args } => {
            let function =
                Function::lookup(name).ok_or_else(|| ParseError::UnknownFunction(name.clone()))?;
            let (min, max, expected) = function.arity();
            if args.len() < min || args.len() > max {
                return Err(ParseError::Arity {
                    name: name.clone(),
                    expected,
                    got: args.len(),
                });
            }
            args.iter().try_for_each(check)
        }
    }
}

/// Evaluate a checked expression at one time instant.
fn eval_at(expr: &Expr, time: f64) -> f64 {
    match expr {
        Expr::Number(v) => *v,
        Expr::Ident(name) if name == SIGNAL_VARIABLE => time,
        Expr::Ident(name) => named_constant(name).unwrap_or(f64::NAN),
        Expr::Neg(inner) => -eval_at(inner, time),
        Expr::Binary { op, lhs, rhs } => {
            let a = eval_at(lhs, time);
            let b = eval_at(rhs, time);
            match op {
                BinaryOp::Add => a + b,
                BinaryOp::Sub => a - b,
                BinaryOp::Mul => a * b,
                BinaryOp::Div => a / b,
                BinaryOp::Pow => a.powf(b),
            }
        }
        Expr::Call { name, args } => {
            let values: Vec<f64> = args.iter().map(|a| eval_at(a, time)).collect();
            Function::lookup(name).map_or(f64::NAN, |f| f.apply(&values))
        }
    }
}
