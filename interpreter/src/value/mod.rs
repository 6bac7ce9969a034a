use std::fmt::Display;

use crate::error::{Error, Result};

mod matrix;
mod rational;
mod reduce;
mod rows;

pub use matrix::{Matrix, Resize, ResizeKind, Shape};
pub use rational::{Decimal, Rational};
pub use reduce::Lu;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operator {
    Add,
    Sub,
    Mul,
    Div,
}

impl Operator {
    pub fn from_char(c: char) -> Option<Self> {
        match c {
            '+' => Some(Operator::Add),
            '-' => Some(Operator::Sub),
            '*' => Some(Operator::Mul),
            '/' => Some(Operator::Div),
            _ => None,
        }
    }

    pub fn precedence(self) -> u8 {
        match self {
            Operator::Add | Operator::Sub => 1,
            Operator::Mul | Operator::Div => 2,
        }
    }
}

impl Display for Operator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let c = match self {
            Operator::Add => '+',
            Operator::Sub => '-',
            Operator::Mul => '*',
            Operator::Div => '/',
        };
        write!(f, "{c}")
    }
}

/// Matrix-only operations written as `x(...)` in an expression.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnaryOp {
    Inverse,
    Transpose,
    Determinant,
    Rank,
}

impl UnaryOp {
    pub fn from_char(c: char) -> Option<Self> {
        match c {
            'i' => Some(UnaryOp::Inverse),
            't' => Some(UnaryOp::Transpose),
            'd' => Some(UnaryOp::Determinant),
            'r' => Some(UnaryOp::Rank),
            _ => None,
        }
    }

    pub fn as_char(self) -> char {
        match self {
            UnaryOp::Inverse => 'i',
            UnaryOp::Transpose => 't',
            UnaryOp::Determinant => 'd',
            UnaryOp::Rank => 'r',
        }
    }

    pub fn apply(self, matrix: &Matrix) -> Result<Value> {
        Ok(match self {
            UnaryOp::Inverse => Value::Matrix(matrix.inverse()?),
            UnaryOp::Transpose => Value::Matrix(matrix.transpose()),
            UnaryOp::Determinant => Value::Scalar(matrix.determinant()?),
            UnaryOp::Rank => Value::Scalar(Rational::from(matrix.rank())),
        })
    }
}

impl Display for UnaryOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_char())
    }
}

/// Result of evaluating an expression or any of its parts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    Scalar(Rational),
    Matrix(Matrix),
}

impl Value {
    pub fn is_scalar(&self) -> bool {
        matches!(self, Value::Scalar(_))
    }

    pub fn as_scalar(&self) -> Option<&Rational> {
        match self {
            Value::Scalar(r) => Some(r),
            Value::Matrix(_) => None,
        }
    }

    pub fn as_matrix(&self) -> Option<&Matrix> {
        match self {
            Value::Scalar(_) => None,
            Value::Matrix(m) => Some(m),
        }
    }

    pub fn into_matrix(self) -> Option<Matrix> {
        match self {
            Value::Scalar(_) => None,
            Value::Matrix(m) => Some(m),
        }
    }

    /// Short description used in error messages, e.g. `scalar` or `2x3 matrix`.
    pub fn describe(&self) -> String {
        match self {
            Value::Scalar(_) => "scalar".to_string(),
            Value::Matrix(m) => format!("{} matrix", m.shape()),
        }
    }

    pub fn unary(&self, op: UnaryOp) -> Result<Value> {
        match self {
            Value::Scalar(_) => Err(Error::NonMatrixOperand(op)),
            Value::Matrix(m) => op.apply(m),
        }
    }

    /// `lhs op rhs` for every supported pairing of scalars and matrices.
    pub fn apply(op: Operator, lhs: &Value, rhs: &Value) -> Result<Value> {
        let incompatible = || Error::IncompatibleOperands {
            op,
            left: lhs.describe(),
            right: rhs.describe(),
        };
        let shapes = |err: Error| match err {
            Error::IncompatibleDimensions { .. } => incompatible(),
            err => err,
        };
        match (lhs, rhs) {
            (Value::Scalar(a), Value::Scalar(b)) => Ok(Value::Scalar(match op {
                Operator::Add => a + b,
                Operator::Sub => a - b,
                Operator::Mul => a * b,
                Operator::Div => a.try_div(b)?,
            })),
            (Value::Matrix(a), Value::Matrix(b)) => match op {
                Operator::Add => a.try_add(b).map(Value::Matrix).map_err(shapes),
                Operator::Sub => a.try_sub(b).map(Value::Matrix).map_err(shapes),
                Operator::Mul => a.try_mul(b).map(Value::Matrix).map_err(shapes),
                Operator::Div => Err(incompatible()),
            },
            (Value::Scalar(s), Value::Matrix(m)) => match op {
                Operator::Mul => Ok(Value::Matrix(m.scale(s))),
                _ => Err(incompatible()),
            },
            (Value::Matrix(m), Value::Scalar(s)) => match op {
                Operator::Mul => Ok(Value::Matrix(m.scale(s))),
                Operator::Div => m.try_div_scalar(s).map(Value::Matrix),
                _ => Err(incompatible()),
            },
        }
    }
}

impl From<Rational> for Value {
    fn from(r: Rational) -> Self {
        Value::Scalar(r)
    }
}

impl From<Matrix> for Value {
    fn from(m: Matrix) -> Self {
        Value::Matrix(m)
    }
}

impl Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Scalar(r) => write!(f, "{r}"),
            Value::Matrix(m) => write!(f, "{m}"),
        }
    }
}
