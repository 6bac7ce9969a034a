use thiserror::Error;

use crate::{
    identifier::MatrixId,
    value::{Operator, Shape, UnaryOp},
    MAX_MATRIX_SIZE,
};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    #[error("Can't assign 0 to denominator")]
    ZeroDenominator,
    #[error("Can't divide by 0")]
    DivideByZero,
    #[error("Can't flip a 0")]
    FlipZero,
    #[error("Invalid row {row} for a matrix with {rows} rows")]
    InvalidRow { row: usize, rows: usize },
    #[error("Incompatible sizes for {op}: {left} and {right}")]
    IncompatibleDimensions {
        op: &'static str,
        left: Shape,
        right: Shape,
    },
    #[error("Can't find least common multiple: list was empty")]
    EmptyList,
    #[error("Matrix {0} isn't defined")]
    UndefinedMatrix(char),
    #[error("Unknown symbol: {0}")]
    UnknownSymbol(char),
    #[error("Input is incorrect. Hint: are you missing a parenthesis?")]
    UnbalancedParens,
    #[error("Can't calculate {0}(number)")]
    NonMatrixOperand(UnaryOp),
    #[error("Can't apply {op} to {left} and {right}")]
    IncompatibleOperands {
        op: Operator,
        left: String,
        right: String,
    },
    #[error("Size {rows}x{columns} is outside of 1x1..{}x{}", MAX_MATRIX_SIZE, MAX_MATRIX_SIZE)]
    SizeLimitExceeded { rows: usize, columns: usize },
    #[error("Operation was too complex")]
    TooComplex,
    #[error("{op} can only be calculated for square matrices")]
    NotSquare { op: &'static str },
    #[error("This matrix is non-invertible")]
    NotInvertible,
    #[error("Invalid number: \"{0}\"")]
    InvalidNumber(String),
    #[error("Incorrect input")]
    MalformedExpression,
    #[error("Expected '(' after {op}")]
    ExpectedParen { op: char },
    #[error("No more available IDs")]
    NoFreeIdentifier,
    #[error("There is no matrix {0}")]
    UnknownMatrix(MatrixId),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
