//! The arithmetic syntax tree behind a formula cell.
//!
//! An [`Expr`] is immutable once parsed. It evaluates against an injected
//! cell-value lookup, prints itself back in canonical form with minimal
//! parentheses, and enumerates the cell references it reads.

use std::fmt;

use super::position::Position;
use super::value::EvalError;

/// Binary arithmetic operators, left-associative.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
}

/// Unary sign operators; bind tighter than any binary operator.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum UnaryOp {
    Plus,
    Neg,
}

/// A node in the parsed formula tree.
#[derive(Clone, Debug, PartialEq)]
pub enum Expr {
    Number(f64),
    Ref(Position),
    Unary {
        op: UnaryOp,
        operand: Box<Expr>,
    },
    Binary {
        op: BinaryOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
}

const PREC_ADDITIVE: u8 = 1;
const PREC_MULTIPLICATIVE: u8 = 2;
const PREC_UNARY: u8 = 3;
const PREC_ATOM: u8 = 4;

impl Expr {
    /// Evaluate the tree. `lookup` supplies the numeric value of a cell
    /// reference and may fail with `Ref` or `Value`; those propagate
    /// unchanged. Division by anything smaller in magnitude than the
    /// smallest normal double, or any non-finite intermediate result, fails
    /// with `Arithm`.
    pub fn evaluate<F>(&self, lookup: &F) -> Result<f64, EvalError>
    where
        F: Fn(Position) -> Result<f64, EvalError>,
    {
        match self {
            Expr::Number(n) => Ok(*n),
            Expr::Ref(pos) => lookup(*pos),
            Expr::Unary { op, operand } => {
                let value = operand.evaluate(lookup)?;
                Ok(match op {
                    UnaryOp::Plus => value,
                    UnaryOp::Neg => -value,
                })
            }
            Expr::Binary { op, lhs, rhs } => {
                let left = lhs.evaluate(lookup)?;
                let right = rhs.evaluate(lookup)?;
                let value = match op {
                    BinaryOp::Add => left + right,
                    BinaryOp::Sub => left - right,
                    BinaryOp::Mul => left * right,
                    BinaryOp::Div => {
                        if right.abs() < f64::MIN_POSITIVE {
                            return Err(EvalError::Arithm);
                        }
                        left / right
                    }
                };
                if value.is_finite() {
                    Ok(value)
                } else {
                    Err(EvalError::Arithm)
                }
            }
        }
    }

    /// Every cell reference in the tree, in traversal order. Duplicates and
    /// out-of-range positions are kept; callers filter for their needs.
    pub fn referenced_cells(&self) -> Vec<Position> {
        let mut cells = Vec::new();
        self.collect_cells(&mut cells);
        cells
    }

    fn collect_cells(&self, out: &mut Vec<Position>) {
        match self {
            Expr::Number(_) => {}
            Expr::Ref(pos) => out.push(*pos),
            Expr::Unary { operand, .. } => operand.collect_cells(out),
            Expr::Binary { lhs, rhs, .. } => {
                lhs.collect_cells(out);
                rhs.collect_cells(out);
            }
        }
    }

    fn precedence(&self) -> u8 {
        match self {
            Expr::Number(_) | Expr::Ref(_) => PREC_ATOM,
            Expr::Unary { .. } => PREC_UNARY,
            Expr::Binary { op: BinaryOp::Mul | BinaryOp::Div, .. } => PREC_MULTIPLICATIVE,
            Expr::Binary { op: BinaryOp::Add | BinaryOp::Sub, .. } => PREC_ADDITIVE,
        }
    }
}

impl fmt::Display for BinaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
        })
    }
}

impl fmt::Display for UnaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            UnaryOp::Plus => "+",
            UnaryOp::Neg => "-",
        })
    }
}

/// Canonical form: minimal parentheses consistent with precedence and
/// left-associativity, no spaces between tokens. A child is grouped iff its
/// precedence is lower than its parent's, or it sits in the right slot of a
/// same-precedence `-` or `/` (where dropping the parens would reassociate).
impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Number(n) => write!(f, "{}", n),
            Expr::Ref(pos) => write!(f, "{}", pos),
            Expr::Unary { op, operand } => {
                write!(f, "{}", op)?;
                if operand.precedence() < self.precedence() {
                    write!(f, "({})", operand)
                } else {
                    write!(f, "{}", operand)
                }
            }
            Expr::Binary { op, lhs, rhs } => {
                let prec = self.precedence();
                if lhs.precedence() < prec {
                    write!(f, "({})", lhs)?;
                } else {
                    write!(f, "{}", lhs)?;
                }
                write!(f, "{}", op)?;
                let grouped = rhs.precedence() < prec
                    || (rhs.precedence() == prec
                        && matches!(op, BinaryOp::Sub | BinaryOp::Div));
                if grouped {
                    write!(f, "({})", rhs)
                } else {
                    write!(f, "{}", rhs)
                }
            }
        }
    }
}
