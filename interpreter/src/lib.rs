//! Exact rational linear algebra with a small equation language over named matrices.

mod error;
pub mod eval;
mod identifier;
pub mod math;
pub mod parser;
mod value;
mod workspace;

pub use error::{Error, Result};
pub use eval::{evaluate, evaluate_all, Session, SymbolTable, MAX_NESTING};
pub use identifier::{Handle, HandleAllocator, Letter, LetterAllocator, MatrixId, HANDLE_RANGE};
pub use value::{
    Decimal, Lu, Matrix, Operator, Rational, Resize, ResizeKind, Shape, UnaryOp, Value,
};
pub use workspace::{Outcome, Workspace};

/// Largest number of rows or columns a matrix may have.
pub const MAX_MATRIX_SIZE: usize = 10;

/// Fractional digits shown by the decimal view of a [`Rational`].
pub const PRECISION: usize = 4;
