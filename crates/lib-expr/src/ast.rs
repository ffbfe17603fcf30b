//! Expression syntax tree and parser.
//!
//! The grammar is shared by both interpretations (rational functions of `s`
//! and signals of `t`):
//!
//! ```text
//! expr   := term (('+' | '-') term)*
//! term   := unary (('*' | '/') unary)*
//! unary  := ('-' | '+') unary | power
//! power  := atom (('^' | '**') unary)?        right-associative
//! atom   := number | ident '(' args ')' | ident | '(' expr ')'
//! ```
//!
//! Built with `nom` combinators (nom 8).

use crate::error::{ParseError, ParseResult};
use nom::{
    branch::alt,
    bytes::complete::{tag, take_while, take_while1},
    character::complete::{char, digit0, digit1, multispace0, one_of},
    combinator::{opt, recognize},
    multi::{fold_many0, separated_list0},
    sequence::{delimited, pair, preceded},
    IResult, Parser,
};

/// Binary operators in precedence order (lowest first).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Pow,
}

/// Parsed expression node.
#[derive(Clone, Debug, PartialEq)]
pub enum Expr {
    /// Numeric literal.
    Number(f64),
    /// Variable or named constant.
    Ident(String),
    /// Unary negation.
    Neg(Box<Expr>),
    /// Binary operation.
    Binary {
        op: BinaryOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
    /// Function call.
    Call { name: String, args: Vec<Expr> },
}

impl Expr {
    fn binary(op: BinaryOp, lhs: Expr, rhs: Expr) -> Self {
        Expr::Binary {
            op,
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
        }
    }

    /// Evaluate a constant sub-expression (no variables, no calls).
    ///
    /// Returns `None` if the expression references anything but literals
    /// and the constants `pi` and `e`.
    pub fn constant_value(&self) -> Option<f64> {
        match self {
            Expr::Number(v) => Some(*v),
            Expr::Ident(name) => named_constant(name),
            Expr::Neg(inner) => inner.constant_value().map(|v| -v),
            Expr::Binary { op, lhs, rhs } => {
                let a = lhs.constant_value()?;
                let b = rhs.constant_value()?;
                Some(match op {
                    BinaryOp::Add => a + b,
                    BinaryOp::Sub => a - b,
                    BinaryOp::Mul => a * b,
                    BinaryOp::Div => a / b,
                    BinaryOp::Pow => a.powf(b),
                })
            }
            Expr::Call { .. } => None,
        }
    }
}

/// Value of a named constant, if `name` is one.
pub fn named_constant(name: &str) -> Option<f64> {
    match name {
        "pi" => Some(std::f64::consts::PI),
        "e" => Some(std::f64::consts::E),
        _ => None,
    }
}

/// Parse expression text into a syntax tree.
pub fn parse_expression(text: &str) -> ParseResult<Expr> {
    if text.trim().is_empty() {
        return Err(ParseError::Empty);
    }

    match parse_expr(text) {
        Ok((rest, expr)) => {
            let rest = rest.trim_start();
            if rest.is_empty() {
                Ok(expr)
            } else {
                let preview: String = rest.chars().take(20).collect();
                Err(ParseError::syntax(
                    text.len() - rest.len(),
                    format!("unexpected input '{}'", preview),
                ))
            }
        }
        Err(nom::Err::Error(e)) | Err(nom::Err::Failure(e)) => {
            let preview: String = e.input.chars().take(20).collect();
            Err(ParseError::syntax(
                text.len() - e.input.len(),
                format!("{:?} at '{}'", e.code, preview),
            ))
        }
        Err(nom::Err::Incomplete(_)) => Err(ParseError::syntax(text.len(), "incomplete input")),
    }
}

// ============================================================================
// Grammar
// ============================================================================

fn parse_expr(input: &str) -> IResult<&str, Expr> {
    let (input, first) = parse_term(input)?;
    fold_many0(
        pair(preceded(multispace0, one_of("+-")), parse_term),
        move || first.clone(),
        |acc, (op, rhs)| {
            let op = if op == '+' { BinaryOp::Add } else { BinaryOp::Sub };
            Expr::binary(op, acc, rhs)
        },
    )
    .parse(input)
}

fn parse_term(input: &str) -> IResult<&str, Expr> {
    let (input, first) = parse_unary(input)?;
    fold_many0(
        pair(preceded(multispace0, parse_mul_op), parse_unary),
        move || first.clone(),
        |acc, (op, rhs)| Expr::binary(op, acc, rhs),
    )
    .parse(input)
}

/// A single `*` or `/`; a `**` is left for the power rule.
fn parse_mul_op(input: &str) -> IResult<&str, BinaryOp> {
    if input.starts_with("**") {
        return Err(nom::Err::Error(nom::error::Error::new(
            input,
            nom::error::ErrorKind::Tag,
        )));
    }
    let (input, op) = one_of("*/").parse(input)?;
    let op = if op == '*' { BinaryOp::Mul } else { BinaryOp::Div };
    Ok((input, op))
}

fn parse_unary(input: &str) -> IResult<&str, Expr> {
    let (input, _) = multispace0.parse(input)?;
    if let Ok((rest, sign)) = one_of::<_, _, nom::error::Error<&str>>("+-").parse(input) {
        let (rest, inner) = parse_unary(rest)?;
        let expr = if sign == '-' {
            Expr::Neg(Box::new(inner))
        } else {
            inner
        };
        return Ok((rest, expr));
    }
    parse_power(input)
}

fn parse_power(input: &str) -> IResult<&str, Expr> {
    let (input, base) = parse_atom(input)?;
    let (input, exponent) = opt(preceded(
        preceded(multispace0, alt((tag("**"), tag("^")))),
        parse_unary,
    ))
    .parse(input)?;

    match exponent {
        Some(exp) => Ok((input, Expr::binary(BinaryOp::Pow, base, exp))),
        None => Ok((input, base)),
    }
}

fn parse_atom(input: &str) -> IResult<&str, Expr> {
    let (input, _) = multispace0.parse(input)?;
    alt((parse_number, parse_call_or_ident, parse_parens)).parse(input)
}

fn parse_parens(input: &str) -> IResult<&str, Expr> {
    delimited(
        char('('),
        parse_expr,
        preceded(multispace0, char(')')),
    )
    .parse(input)
}

fn parse_number(input: &str) -> IResult<&str, Expr> {
    // Digits with optional fraction, or a bare fraction, then an optional exponent
    let (input, num_str) = recognize(pair(
        alt((
            recognize(pair(digit1, opt(pair(char('.'), digit0)))),
            recognize(pair(char('.'), digit1)),
        )),
        opt((one_of("eE"), opt(one_of("+-")), digit1)),
    ))
    .parse(input)?;

    let num: f64 = num_str.parse().map_err(|_| {
        nom::Err::Error(nom::error::Error::new(input, nom::error::ErrorKind::Float))
    })?;

    Ok((input, Expr::Number(num)))
}

fn parse_identifier(input: &str) -> IResult<&str, &str> {
    recognize(pair(
        take_while1(|c: char| c.is_ascii_alphabetic() || c == '_'),
        take_while(|c: char| c.is_ascii_alphanumeric() || c == '_'),
    ))
    .parse(input)
}

fn parse_call_or_ident(input: &str) -> IResult<&str, Expr> {
    let (input, name) = parse_identifier(input)?;
    let (input, args) = opt(preceded(
        preceded(multispace0, char('(')),
        (
            separated_list0(preceded(multispace0, char(',')), parse_expr),
            preceded(multispace0, char(')')),
        ),
    ))
    .parse(input)?;

    let expr = match args {
        Some((args, _)) => Expr::Call {
            name: name.to_string(),
            args,
        },
        None => Expr::Ident(name.to_string()),
    };
    Ok((input, expr))
}
