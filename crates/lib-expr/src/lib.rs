//! Formula parser for the filter workbench.
//!
//! One grammar, two interpretations:
//!
//! - [`parse_rational`] reads a rational function of `s`, such as
//!   `1000/(s + 1000)`, into numerator and denominator coefficients.
//! - [`evaluate_signal`] reads a signal of `t`, such as
//!   `sin(2*pi*1000*t) + 0.5*square(2*pi*200*t)`, and evaluates it over a time grid.
//!
//! # Example
//!
//! ```
//! use lib_expr::parse_rational;
//!
//! let (num, den) = parse_rational("1000/(s + 1000)").unwrap();
//! assert_eq!(num, vec![1000.0]);
//! assert_eq!(den, vec![1.0, 1000.0]);
//! ```

pub mod ast;
pub mod error;
pub mod rational;
pub mod signal;

pub use ast::{parse_expression, BinaryOp, Expr};
pub use error::{ParseError, ParseResult};
pub use rational::parse_rational;
pub use signal::evaluate_signal;
