use tracing::trace;

use crate::{
    error::{Error, Result},
    Matrix, Rational,
};

/// Factors of `P·A = L·U`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Lu {
    pub lower: Matrix,
    pub upper: Matrix,
    pub permutation: Matrix,
    pub swaps: usize,
}

impl Matrix {
    /// Eliminates `column` below `row` using `row` as pivot row, returning the multipliers
    /// indexed by target row. `mirror` receives the same row operations.
    fn eliminate_below(
        &mut self,
        row: usize,
        column: usize,
        mut mirror: Option<&mut Matrix>,
    ) -> Vec<(usize, Rational)> {
        let pivot = self[(row, column)].clone();
        let mut multipliers = Vec::new();
        for target in row + 1..self.rows() {
            if self[(target, column)].is_zero() {
                continue;
            }
            let scalar = self[(target, column)].div_nonzero(&pivot);
            self.sub_scaled_row(row, target, &scalar);
            if let Some(mirror) = mirror.as_deref_mut() {
                mirror.sub_scaled_row(row, target, &scalar);
            }
            multipliers.push((target, scalar));
        }
        multipliers
    }

    /// Reduces to row echelon form in place and returns the number of row swaps.
    pub fn row_echelon_in_place(&mut self, unity_pivots: bool) -> usize {
        #[cfg(feature = "tracy")]
        profiling::scope!("Matrix::row_echelon_in_place");
        let steps = self.rows().min(self.columns());
        let mut swaps = 0;
        let mut expected = 0;
        let mut i = 0;
        while i < steps && expected < self.columns() {
            if !self.nonzero_at_or_below(i) {
                break;
            }
            if self.leading(i) != Some(expected) {
                match self.row_with_pivot(expected, i) {
                    Some(found) => {
                        trace!(from = found, to = i, "swapping rows");
                        self.swap_unchecked(i, found);
                        swaps += 1;
                    }
                    None => {
                        expected += 1;
                        continue;
                    }
                }
            }
            self.eliminate_below(i, expected, None);
            i += 1;
        }
        if unity_pivots {
            self.divide_rows_by_pivots(None);
        }
        swaps
    }

    /// Reduces a square matrix to upper triangular form in place, applying every row
    /// operation to `augmented` as well. Returns the number of row swaps.
    pub fn triangular_in_place(&mut self, mut augmented: Option<&mut Matrix>) -> Result<usize> {
        #[cfg(feature = "tracy")]
        profiling::scope!("Matrix::triangular_in_place");
        if !self.is_square() {
            return Err(Error::NotSquare { op: "Triangular form" });
        }
        if let Some(aug) = augmented.as_deref() {
            if aug.rows() != self.rows() {
                return Err(Error::IncompatibleDimensions {
                    op: "augmentation",
                    left: self.shape(),
                    right: aug.shape(),
                });
            }
        }
        let size = self.rows();
        let mut swaps = 0;
        let mut expected = 0;
        let mut i = 0;
        while i < size && expected < size {
            if !self.nonzero_at_or_below(i) {
                break;
            }
            if self.leading(i) != Some(expected) {
                match self.row_with_pivot(expected, i + 1) {
                    Some(found) => {
                        trace!(from = found, to = i, "swapping rows");
                        self.swap_unchecked(i, found);
                        if let Some(aug) = augmented.as_deref_mut() {
                            aug.swap_unchecked(i, found);
                        }
                        swaps += 1;
                    }
                    None => {
                        expected += 1;
                        continue;
                    }
                }
            }
            self.eliminate_below(i, expected, augmented.as_deref_mut());
            expected += 1;
            i += 1;
        }
        Ok(swaps)
    }

    pub fn row_echelon(&self) -> Matrix {
        let mut copy = self.clone();
        copy.set_id(None);
        copy.row_echelon_in_place(true);
        copy
    }

    pub fn triangular(&self) -> Result<Matrix> {
        let mut copy = self.clone();
        copy.set_id(None);
        copy.triangular_in_place(None)?;
        Ok(copy)
    }

    pub fn determinant(&self) -> Result<Rational> {
        #[cfg(feature = "tracy")]
        profiling::scope!("Matrix::determinant");
        if !self.is_square() {
            return Err(Error::NotSquare { op: "Determinant" });
        }
        if self.rows() == 1 {
            return Ok(self[(0, 0)].clone());
        }
        let mut copy = self.clone();
        let swaps = copy.row_echelon_in_place(false);
        let product = (0..copy.rows())
            .map(|i| &copy[(i, i)])
            .fold(Rational::one(), |acc, v| acc * v);
        Ok(if swaps % 2 == 1 { -product } else { product })
    }

    pub fn rank(&self) -> usize {
        let mut copy = self.clone();
        copy.row_echelon_in_place(true);
        copy.nonzero_rows()
    }

    pub fn is_invertible(&self) -> bool {
        self.determinant().map_or(false, |det| !det.is_zero())
    }

    pub fn inverse(&self) -> Result<Matrix> {
        #[cfg(feature = "tracy")]
        profiling::scope!("Matrix::inverse");
        if !self.is_square() {
            return Err(Error::NotSquare { op: "Inverse" });
        }
        let size = self.rows();
        let mut upper = self.clone();
        let mut inverse = Matrix::identity(size)?;
        upper.triangular_in_place(Some(&mut inverse))?;
        if (0..size).any(|i| upper[(i, i)].is_zero()) {
            return Err(Error::NotInvertible);
        }
        upper.divide_rows_by_diagonal(Some(&mut inverse));
        for column in (0..size).rev() {
            for row in 0..column {
                let scalar = upper[(row, column)].clone();
                if scalar.is_zero() {
                    continue;
                }
                upper.sub_scaled_row(column, row, &scalar);
                inverse.sub_scaled_row(column, row, &scalar);
            }
        }
        Ok(inverse)
    }

    fn decompose(&self, steps: usize) -> Lu {
        #[cfg(feature = "tracy")]
        profiling::scope!("Matrix::decompose");
        let rows = self.rows();
        let mut upper = self.clone();
        upper.set_id(None);
        let mut lower = Matrix::zeros(rows, rows);
        let mut permutation = Matrix::zeros(rows, rows);
        for k in 0..rows {
            permutation[(k, k)] = Rational::one();
        }
        let mut swaps = 0;
        let mut expected = 0;
        let mut i = 0;
        while i < steps && expected < upper.columns() {
            if !upper.nonzero_at_or_below(i) {
                break;
            }
            if upper.leading(i) != Some(expected) {
                match upper.row_with_pivot(expected, i + 1) {
                    Some(found) => {
                        trace!(from = found, to = i, "swapping rows");
                        upper.swap_unchecked(i, found);
                        lower.swap_unchecked(i, found);
                        permutation.swap_unchecked(i, found);
                        swaps += 1;
                    }
                    None => {
                        expected += 1;
                        continue;
                    }
                }
            }
            for (target, scalar) in upper.eliminate_below(i, expected, None) {
                lower[(target, i)] = scalar;
            }
            expected += 1;
            i += 1;
        }
        for k in 0..rows {
            lower[(k, k)] = Rational::one();
        }
        Lu {
            lower,
            upper,
            permutation,
            swaps,
        }
    }

    /// LU decomposition of a square matrix.
    pub fn lu(&self) -> Result<Lu> {
        if !self.is_square() {
            return Err(Error::NotSquare { op: "LU decomposition" });
        }
        Ok(self.decompose(self.rows()))
    }

    /// LU decomposition of any shape, `lower` is `rows x rows`.
    pub fn lu_rectangular(&self) -> Lu {
        self.decompose(self.rows().min(self.columns()))
    }

    pub fn transpose(&self) -> Matrix {
        let mut result = Matrix::zeros(self.columns(), self.rows());
        for i in 0..self.rows() {
            for j in 0..self.columns() {
                result[(j, i)] = self[(i, j)].clone();
            }
        }
        result
    }
}
