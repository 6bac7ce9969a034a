use crate::{
    error::{Error, Result},
    Matrix, Rational,
};

impl Matrix {
    fn check_row(&self, row: usize) -> Result<()> {
        if row < self.rows() {
            Ok(())
        } else {
            Err(Error::InvalidRow {
                row,
                rows: self.rows(),
            })
        }
    }

    /// Column of the first nonzero entry in `row`.
    pub(crate) fn leading(&self, row: usize) -> Option<usize> {
        self.row(row).iter().position(|v| !v.is_zero())
    }

    /// `dst -= scalar * src`
    pub(crate) fn sub_scaled_row(&mut self, src: usize, dst: usize, scalar: &Rational) {
        let scaled: Vec<Rational> = self.row(src).iter().map(|v| scalar * v).collect();
        for (cell, v) in self.row_mut(dst).iter_mut().zip(scaled) {
            *cell -= v;
        }
    }

    pub(crate) fn swap_unchecked(&mut self, a: usize, b: usize) {
        if a == b {
            return;
        }
        for column in 0..self.columns() {
            let (x, y) = (a * self.columns() + column, b * self.columns() + column);
            self.fields_mut().swap(x, y);
        }
    }

    fn scale_row_unchecked(&mut self, row: usize, scalar: &Rational) {
        for cell in self.row_mut(row) {
            *cell = &*cell * scalar;
        }
    }

    pub fn multiply_row(&mut self, row: usize, scalar: &Rational) -> Result<()> {
        self.check_row(row)?;
        self.scale_row_unchecked(row, scalar);
        Ok(())
    }

    pub fn divide_row(&mut self, row: usize, divisor: &Rational) -> Result<()> {
        self.check_row(row)?;
        let factor = divisor.flip()?;
        self.scale_row_unchecked(row, &factor);
        Ok(())
    }

    /// `dst += scalar * src`, with a scalar of one when omitted.
    pub fn add_row_to_row(&mut self, src: usize, dst: usize, scalar: Option<&Rational>) -> Result<()> {
        self.check_row(src)?;
        self.check_row(dst)?;
        let scalar = scalar.map_or_else(|| -Rational::one(), |s| -s);
        self.sub_scaled_row(src, dst, &scalar);
        Ok(())
    }

    /// `dst -= scalar * src`, with a scalar of one when omitted.
    pub fn subtract_row_from_row(
        &mut self,
        src: usize,
        dst: usize,
        scalar: Option<&Rational>,
    ) -> Result<()> {
        self.check_row(src)?;
        self.check_row(dst)?;
        match scalar {
            Some(scalar) => self.sub_scaled_row(src, dst, scalar),
            None => self.sub_scaled_row(src, dst, &Rational::one()),
        }
        Ok(())
    }

    pub fn swap_rows(&mut self, a: usize, b: usize) -> Result<()> {
        self.check_row(a)?;
        self.check_row(b)?;
        self.swap_unchecked(a, b);
        Ok(())
    }

    pub fn is_row_nonzero(&self, row: usize) -> Result<bool> {
        self.check_row(row)?;
        Ok(self.leading(row).is_some())
    }

    /// Column of the leading nonzero entry, `None` for a zero row.
    pub fn pivot(&self, row: usize) -> Result<Option<usize>> {
        self.check_row(row)?;
        Ok(self.leading(row))
    }

    pub fn nonzero_rows(&self) -> usize {
        (0..self.rows()).filter(|&r| self.leading(r).is_some()).count()
    }

    pub(crate) fn nonzero_at_or_below(&self, row: usize) -> bool {
        (row..self.rows()).any(|r| self.leading(r).is_some())
    }

    /// First row at or after `from` whose leading column is `pivot`.
    pub(crate) fn row_with_pivot(&self, pivot: usize, from: usize) -> Option<usize> {
        (from..self.rows()).find(|&r| self.leading(r) == Some(pivot))
    }

    /// `None` for non-square matrices.
    pub fn product_of_diagonal(&self) -> Option<Rational> {
        if !self.is_square() {
            return None;
        }
        Some(
            (0..self.rows())
                .map(|i| &self[(i, i)])
                .fold(Rational::one(), |acc, v| acc * v),
        )
    }

    /// Scales every nonzero row so its leading entry is one. The same factor is
    /// applied to the matching row of `augmented`.
    pub fn divide_rows_by_pivots(&mut self, mut augmented: Option<&mut Matrix>) {
        for row in 0..self.rows() {
            let Some(pivot) = self.leading(row) else {
                continue;
            };
            let factor = Rational::one().div_nonzero(&self[(row, pivot)]);
            self.scale_row_unchecked(row, &factor);
            if let Some(aug) = augmented.as_deref_mut() {
                aug.scale_row_unchecked(row, &factor);
            }
        }
    }

    /// Scales each row by the inverse of its diagonal entry, skipping zero diagonals.
    pub fn divide_rows_by_diagonal(&mut self, mut augmented: Option<&mut Matrix>) {
        for row in 0..self.rows().min(self.columns()) {
            if self[(row, row)].is_zero() {
                continue;
            }
            let factor = Rational::one().div_nonzero(&self[(row, row)]);
            self.scale_row_unchecked(row, &factor);
            if let Some(aug) = augmented.as_deref_mut() {
                aug.scale_row_unchecked(row, &factor);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rat;

    fn m(rows: &[&[i64]]) -> Matrix {
        Matrix::from_rows(rows.iter().map(|r| r.iter().copied())).unwrap()
    }

    #[test]
    fn row_operations() {
        let mut a = m(&[&[1, 2], &[3, 4]]);
        a.multiply_row(0, &rat!(3)).unwrap();
        assert_eq!(a, m(&[&[3, 6], &[3, 4]]));
        a.subtract_row_from_row(0, 1, None).unwrap();
        assert_eq!(a, m(&[&[3, 6], &[0, -2]]));
        a.add_row_to_row(1, 0, Some(&rat!(3))).unwrap();
        assert_eq!(a, m(&[&[3, 0], &[0, -2]]));
        a.divide_row(1, &rat!(-2)).unwrap();
        assert_eq!(a, m(&[&[3, 0], &[0, 1]]));
        a.swap_rows(0, 1).unwrap();
        assert_eq!(a, m(&[&[0, 1], &[3, 0]]));
        assert_eq!(a.divide_row(0, &rat!()), Err(Error::FlipZero));
    }

    #[test]
    fn invalid_rows() {
        let mut a = m(&[&[1, 2], &[3, 4]]);
        let err = Error::InvalidRow { row: 2, rows: 2 };
        assert_eq!(a.swap_rows(0, 2), Err(err.clone()));
        assert_eq!(a.multiply_row(2, &rat!(1)), Err(err.clone()));
        assert_eq!(a.add_row_to_row(2, 0, None), Err(err.clone()));
        assert_eq!(a.pivot(2), Err(err.clone()));
        assert_eq!(a.is_row_nonzero(2), Err(err));
        assert_eq!(a, m(&[&[1, 2], &[3, 4]]));
    }

    #[test]
    fn pivots() {
        let a = m(&[&[0, 0, 5], &[0, 0, 0], &[0, 2, 1]]);
        assert_eq!(a.pivot(0), Ok(Some(2)));
        assert_eq!(a.pivot(1), Ok(None));
        assert_eq!(a.is_row_nonzero(1), Ok(false));
        assert_eq!(a.nonzero_rows(), 2);
        assert!(a.nonzero_at_or_below(2));
        assert_eq!(a.row_with_pivot(1, 0), Some(2));
        assert_eq!(a.row_with_pivot(2, 1), None);
    }

    #[test]
    fn diagonal() {
        assert_eq!(m(&[&[2, 9], &[9, 3]]).product_of_diagonal(), Some(rat!(6)));
        assert_eq!(m(&[&[2, 9, 1]]).product_of_diagonal(), None);

        let mut a = m(&[&[2, 4], &[0, 3]]);
        let mut aug = Matrix::identity(2).unwrap();
        a.divide_rows_by_diagonal(Some(&mut aug));
        assert_eq!(a, Matrix::from_rows([[rat!(1), rat!(2)], [rat!(0), rat!(1)]]).unwrap());
        assert_eq!(
            aug,
            Matrix::from_rows([[rat!(1 / 2), rat!(0)], [rat!(0), rat!(1 / 3)]]).unwrap()
        );

        let mut b = m(&[&[0, 4, 2], &[0, 0, 0]]);
        b.divide_rows_by_pivots(None);
        assert_eq!(
            b,
            Matrix::from_rows([[rat!(0), rat!(1), rat!(1 / 2)], [rat!(0), rat!(0), rat!(0)]])
                .unwrap()
        );
    }
}
