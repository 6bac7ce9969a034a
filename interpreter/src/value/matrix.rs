use std::{
    fmt,
    ops::{Index, IndexMut, Mul},
};

use itertools::Itertools;

use crate::{
    error::{Error, Result},
    identifier::MatrixId,
    Rational, MAX_MATRIX_SIZE,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Shape {
    pub rows: usize,
    pub columns: usize,
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.rows, self.columns)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResizeKind {
    NewRow,
    NewColumn,
    RemovedRow,
    RemovedColumn,
    Complex,
}

/// Report of a completed resize, for whoever displays the matrix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Resize {
    pub id: Option<MatrixId>,
    pub old: Shape,
    pub new: Shape,
    pub kind: ResizeKind,
}

impl Resize {
    pub fn new(id: Option<MatrixId>, old: Shape, new: Shape) -> Self {
        let kind = if new.rows == old.rows + 1 && new.columns == old.columns {
            ResizeKind::NewRow
        } else if new.rows == old.rows && new.columns == old.columns + 1 {
            ResizeKind::NewColumn
        } else if new.rows + 1 == old.rows && new.columns == old.columns {
            ResizeKind::RemovedRow
        } else if new.rows == old.rows && new.columns + 1 == old.columns {
            ResizeKind::RemovedColumn
        } else {
            ResizeKind::Complex
        };
        Self { id, old, new, kind }
    }
}

/// Dense row-major grid of [`Rational`], every cell materialized.
#[derive(Debug, Clone)]
pub struct Matrix {
    id: Option<MatrixId>,
    rows: usize,
    columns: usize,
    fields: Vec<Rational>,
}

impl PartialEq for Matrix {
    fn eq(&self, other: &Self) -> bool {
        self.shape() == other.shape() && self.fields == other.fields
    }
}

impl Eq for Matrix {}

fn check_size(rows: usize, columns: usize) -> Result<()> {
    if rows < 1 || columns < 1 || rows > MAX_MATRIX_SIZE || columns > MAX_MATRIX_SIZE {
        Err(Error::SizeLimitExceeded { rows, columns })
    } else {
        Ok(())
    }
}

impl Matrix {
    /// Zero matrix of the given size.
    pub fn new(rows: usize, columns: usize) -> Result<Self> {
        check_size(rows, columns)?;
        Ok(Self::zeros(rows, columns))
    }

    /// Size already validated by the caller.
    pub(crate) fn zeros(rows: usize, columns: usize) -> Self {
        Self {
            id: None,
            rows,
            columns,
            fields: vec![Rational::zero(); rows * columns],
        }
    }

    pub fn identity(size: usize) -> Result<Self> {
        let mut m = Self::new(size, size)?;
        for i in 0..size {
            m[(i, i)] = Rational::one();
        }
        Ok(m)
    }

    pub fn from_rows<I, R, T>(rows: I) -> Result<Self>
    where
        I: IntoIterator<Item = R>,
        R: IntoIterator<Item = T>,
        T: Into<Rational>,
    {
        let rows: Vec<Vec<Rational>> = rows
            .into_iter()
            .map(|row| row.into_iter().map(Into::into).collect())
            .collect();
        let columns = rows.first().map(Vec::len).unwrap_or(0);
        check_size(rows.len(), columns)?;
        if let Some(row) = rows.iter().find(|row| row.len() != columns) {
            return Err(Error::IncompatibleDimensions {
                op: "construction",
                left: Shape {
                    rows: 1,
                    columns,
                },
                right: Shape {
                    rows: 1,
                    columns: row.len(),
                },
            });
        }
        Ok(Self {
            id: None,
            rows: rows.len(),
            columns,
            fields: rows.into_iter().flatten().collect(),
        })
    }

    pub fn with_id(mut self, id: MatrixId) -> Self {
        self.id = Some(id);
        self
    }

    pub fn id(&self) -> Option<MatrixId> {
        self.id
    }

    pub fn set_id(&mut self, id: Option<MatrixId>) {
        self.id = id;
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn columns(&self) -> usize {
        self.columns
    }

    pub fn shape(&self) -> Shape {
        Shape {
            rows: self.rows,
            columns: self.columns,
        }
    }

    pub fn is_square(&self) -> bool {
        self.rows == self.columns
    }

    pub fn get(&self, row: usize, column: usize) -> Option<&Rational> {
        if row < self.rows && column < self.columns {
            self.fields.get(row * self.columns + column)
        } else {
            None
        }
    }

    pub fn set(&mut self, row: usize, column: usize, value: Rational) -> bool {
        if row < self.rows && column < self.columns {
            self.fields[row * self.columns + column] = value;
            true
        } else {
            false
        }
    }

    pub(crate) fn row(&self, row: usize) -> &[Rational] {
        &self.fields[row * self.columns..(row + 1) * self.columns]
    }

    pub(crate) fn row_mut(&mut self, row: usize) -> &mut [Rational] {
        &mut self.fields[row * self.columns..(row + 1) * self.columns]
    }

    pub fn iter_rows(&self) -> impl Iterator<Item = &[Rational]> {
        self.fields.chunks(self.columns)
    }

    pub fn fields(&self) -> &[Rational] {
        &self.fields
    }

    pub(crate) fn fields_mut(&mut self) -> &mut [Rational] {
        &mut self.fields
    }

    pub fn can_add_row(&self) -> bool {
        self.rows < MAX_MATRIX_SIZE
    }

    pub fn can_add_column(&self) -> bool {
        self.columns < MAX_MATRIX_SIZE
    }

    pub fn can_delete_row(&self) -> bool {
        self.rows > 1
    }

    pub fn can_delete_column(&self) -> bool {
        self.columns > 1
    }

    /// Keeps the overlapping region, zero-fills new cells.
    pub fn resize(&mut self, rows: usize, columns: usize) -> Result<Resize> {
        check_size(rows, columns)?;
        let old = self.shape();
        let mut resized = Self::zeros(rows, columns);
        for i in 0..self.rows.min(rows) {
            for j in 0..self.columns.min(columns) {
                resized[(i, j)] = std::mem::take(&mut self[(i, j)]);
            }
        }
        self.rows = rows;
        self.columns = columns;
        self.fields = resized.fields;
        let resize = Resize::new(self.id, old, self.shape());
        tracing::trace!(?resize, "matrix resized");
        Ok(resize)
    }

    pub fn add_row(&mut self) -> Result<Resize> {
        self.resize(self.rows + 1, self.columns)
    }

    pub fn delete_row(&mut self) -> Result<Resize> {
        self.resize(self.rows.saturating_sub(1), self.columns)
    }

    pub fn add_column(&mut self) -> Result<Resize> {
        self.resize(self.rows, self.columns + 1)
    }

    pub fn delete_column(&mut self) -> Result<Resize> {
        self.resize(self.rows, self.columns.saturating_sub(1))
    }

    pub fn clear(&mut self) {
        self.fields.fill(Rational::zero());
    }

    pub fn fill_identity(&mut self) -> Result<()> {
        if !self.is_square() {
            return Err(Error::NotSquare { op: "Identity" });
        }
        self.clear();
        for i in 0..self.rows {
            self[(i, i)] = Rational::one();
        }
        Ok(())
    }

    fn zip_with(
        &self,
        rhs: &Matrix,
        op: &'static str,
        f: impl Fn(&Rational, &Rational) -> Rational,
    ) -> Result<Matrix> {
        if self.shape() != rhs.shape() {
            return Err(Error::IncompatibleDimensions {
                op,
                left: self.shape(),
                right: rhs.shape(),
            });
        }
        Ok(Matrix {
            id: None,
            rows: self.rows,
            columns: self.columns,
            fields: self
                .fields
                .iter()
                .zip(&rhs.fields)
                .map(|(a, b)| f(a, b))
                .collect(),
        })
    }

    pub fn try_add(&self, rhs: &Matrix) -> Result<Matrix> {
        self.zip_with(rhs, "addition", |a, b| a + b)
    }

    pub fn try_sub(&self, rhs: &Matrix) -> Result<Matrix> {
        self.zip_with(rhs, "subtraction", |a, b| a - b)
    }

    /// `[A x B] * [B x C] = [A x C]`
    pub fn try_mul(&self, rhs: &Matrix) -> Result<Matrix> {
        if self.columns != rhs.rows {
            return Err(Error::IncompatibleDimensions {
                op: "multiplication",
                left: self.shape(),
                right: rhs.shape(),
            });
        }
        let mut result = Self::zeros(self.rows, rhs.columns);
        for i in 0..self.rows {
            for j in 0..rhs.columns {
                result[(i, j)] = (0..self.columns)
                    .map(|k| &self[(i, k)] * &rhs[(k, j)])
                    .fold(Rational::zero(), |acc, v| acc + v);
            }
        }
        Ok(result)
    }

    pub fn scale(&self, scalar: &Rational) -> Matrix {
        Matrix {
            id: None,
            rows: self.rows,
            columns: self.columns,
            fields: self.fields.iter().map(|v| scalar * v).collect(),
        }
    }

    pub fn try_div_scalar(&self, scalar: &Rational) -> Result<Matrix> {
        if scalar.is_zero() {
            return Err(Error::DivideByZero);
        }
        Ok(self.scale(&scalar.flip()?))
    }
}

impl Index<(usize, usize)> for Matrix {
    type Output = Rational;

    fn index(&self, (row, column): (usize, usize)) -> &Rational {
        assert!(row < self.rows && column < self.columns);
        &self.fields[row * self.columns + column]
    }
}

impl IndexMut<(usize, usize)> for Matrix {
    fn index_mut(&mut self, (row, column): (usize, usize)) -> &mut Rational {
        assert!(row < self.rows && column < self.columns);
        &mut self.fields[row * self.columns + column]
    }
}

impl Mul<&Rational> for &Matrix {
    type Output = Matrix;

    fn mul(self, rhs: &Rational) -> Matrix {
        self.scale(rhs)
    }
}

impl Mul<&Matrix> for &Rational {
    type Output = Matrix;

    fn mul(self, rhs: &Matrix) -> Matrix {
        rhs.scale(self)
    }
}

impl fmt::Display for Matrix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let cells: Vec<Vec<String>> = self
            .iter_rows()
            .map(|row| row.iter().map(ToString::to_string).collect())
            .collect();
        let widths: Vec<usize> = (0..self.columns)
            .map(|j| cells.iter().map(|row| row[j].len()).max().unwrap_or(0))
            .collect();
        let lines = cells.iter().map(|row| {
            format!(
                "[{}]",
                row.iter()
                    .zip(&widths)
                    .map(|(cell, width)| format!("{cell:>width$}"))
                    .join(" ")
            )
        });
        write!(f, "{}", lines.format("\n"))
    }
}
