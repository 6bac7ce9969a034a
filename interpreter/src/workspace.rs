use tracing::debug;

use crate::{
    error::{Error, Result},
    eval::{self, SymbolTable},
    identifier::{LetterAllocator, MatrixId},
    value::Value,
    Matrix, Rational,
};

/// Result of [`Workspace::compute`]. Matrix results are kept as new matrices.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Scalar(Rational),
    Stored(MatrixId),
}

/// The set of named matrices a user works with.
#[derive(Debug, Default)]
pub struct Workspace {
    matrices: SymbolTable,
    letters: LetterAllocator,
}

impl Workspace {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn symbols(&self) -> &SymbolTable {
        &self.matrices
    }

    pub fn iter(&self) -> impl Iterator<Item = (MatrixId, &Matrix)> {
        self.matrices.iter().map(|(id, m)| (*id, m))
    }

    pub fn len(&self) -> usize {
        self.matrices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.matrices.is_empty()
    }

    pub fn can_add(&self) -> bool {
        self.letters.has_free()
    }

    /// Stores `matrix` under the first free letter.
    pub fn add(&mut self, matrix: Matrix) -> Result<MatrixId> {
        let id = self.letters.acquire()?;
        debug!(%id, shape = %matrix.shape(), "matrix added");
        self.matrices.insert(id, matrix.with_id(id));
        Ok(id)
    }

    /// Stores every matrix under consecutive free letters, or none of them.
    pub fn add_all(&mut self, matrices: Vec<Matrix>) -> Result<Vec<MatrixId>> {
        if self.letters.free() < matrices.len() {
            return Err(Error::NoFreeIdentifier);
        }
        matrices.into_iter().map(|m| self.add(m)).collect()
    }

    /// Adds a 1x1 zero matrix.
    pub fn add_empty(&mut self) -> Result<MatrixId> {
        self.add(Matrix::new(1, 1)?)
    }

    /// Stores `matrix` under `id`, returning the matrix it replaced.
    pub fn define(&mut self, id: MatrixId, matrix: Matrix) -> Option<Matrix> {
        self.letters.claim(id);
        debug!(%id, shape = %matrix.shape(), "matrix defined");
        self.matrices.insert(id, matrix.with_id(id))
    }

    pub fn get(&self, id: MatrixId) -> Result<&Matrix> {
        self.matrices.get(&id).ok_or(Error::UnknownMatrix(id))
    }

    pub fn get_mut(&mut self, id: MatrixId) -> Result<&mut Matrix> {
        self.matrices.get_mut(&id).ok_or(Error::UnknownMatrix(id))
    }

    pub fn remove(&mut self, id: MatrixId) -> Result<Matrix> {
        let matrix = self.matrices.remove(&id).ok_or(Error::UnknownMatrix(id))?;
        self.letters.release(id);
        debug!(%id, "matrix removed");
        Ok(matrix)
    }

    /// Closest defined letter to `id`, searching towards `A` first and then towards `Z`.
    pub fn nearest(&self, id: MatrixId) -> Option<MatrixId> {
        let left = std::iter::successors(id.prev(), |id| id.prev());
        let right = std::iter::successors(id.next(), |id| id.next());
        left.chain(right).find(|id| self.matrices.contains_key(id))
    }

    pub fn evaluate(&self, input: &str) -> Result<Value> {
        eval::evaluate(input, &self.matrices)
    }

    /// Evaluates `input`, storing a matrix result under a new letter.
    pub fn compute(&mut self, input: &str) -> Result<Outcome> {
        match self.evaluate(input)? {
            Value::Scalar(r) => Ok(Outcome::Scalar(r)),
            Value::Matrix(m) => self.add(m).map(Outcome::Stored),
        }
    }

    /// Applies `transform` to the matrix at `id` and stores the result under a new letter.
    pub fn derive(
        &mut self,
        id: MatrixId,
        transform: impl FnOnce(&Matrix) -> Result<Matrix>,
    ) -> Result<MatrixId> {
        if !self.can_add() {
            return Err(Error::NoFreeIdentifier);
        }
        let result = transform(self.get(id)?)?;
        self.add(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rat;

    fn id(c: char) -> MatrixId {
        MatrixId::from_char(c).unwrap()
    }

    #[test]
    fn letters_are_reused_lowest_first() {
        let mut ws = Workspace::new();
        assert_eq!(ws.add_empty(), Ok(id('A')));
        assert_eq!(ws.add_empty(), Ok(id('B')));
        assert_eq!(ws.add_empty(), Ok(id('C')));
        ws.remove(id('A')).unwrap();
        assert_eq!(ws.add_empty(), Ok(id('A')));
        assert_eq!(ws.get(id('B')).unwrap().id(), Some(id('B')));
        assert_eq!(ws.remove(id('Q')), Err(Error::UnknownMatrix(id('Q'))));
    }

    #[test]
    fn defined_letters_are_skipped() {
        let mut ws = Workspace::new();
        assert_eq!(ws.define(id('A'), Matrix::identity(2).unwrap()), None);
        assert_eq!(ws.add_empty(), Ok(id('B')));
        assert!(ws.define(id('A'), Matrix::new(1, 1).unwrap()).is_some());
        assert_eq!(ws.len(), 2);
    }

    #[test]
    fn runs_out_of_letters() {
        let mut ws = Workspace::new();
        for _ in 0..26 {
            ws.add_empty().unwrap();
        }
        assert!(!ws.can_add());
        assert_eq!(ws.add_empty(), Err(Error::NoFreeIdentifier));
        assert_eq!(
            ws.derive(id('A'), |m| Ok(m.transpose())),
            Err(Error::NoFreeIdentifier)
        );
    }

    #[test]
    fn add_all_is_atomic() {
        let mut ws = Workspace::new();
        for _ in 0..24 {
            ws.add_empty().unwrap();
        }
        let pair = || vec![Matrix::identity(2).unwrap(), Matrix::new(1, 2).unwrap()];
        let mut triple = pair();
        triple.push(Matrix::new(3, 1).unwrap());
        assert_eq!(ws.add_all(triple), Err(Error::NoFreeIdentifier));
        assert_eq!(ws.len(), 24);
        assert_eq!(ws.add_all(pair()), Ok(vec![id('Y'), id('Z')]));
        assert_eq!(ws.get(id('Z')).unwrap().shape(), Matrix::new(1, 2).unwrap().shape());
        assert_eq!(ws.add_all(Vec::new()), Ok(Vec::new()));
    }

    #[test]
    fn nearest_prefers_left() {
        let mut ws = Workspace::new();
        for c in ['B', 'D', 'F'] {
            ws.define(id(c), Matrix::new(1, 1).unwrap());
        }
        assert_eq!(ws.nearest(id('D')), Some(id('B')));
        assert_eq!(ws.nearest(id('E')), Some(id('D')));
        assert_eq!(ws.nearest(id('B')), Some(id('D')));
        assert_eq!(ws.nearest(id('A')), Some(id('B')));
        ws.remove(id('D')).unwrap();
        ws.remove(id('F')).unwrap();
        assert_eq!(ws.nearest(id('B')), None);
    }

    #[test]
    fn compute_stores_matrices() {
        let mut ws = Workspace::new();
        ws.define(id('A'), Matrix::from_rows([[1, 2], [3, 4]]).unwrap());
        assert_eq!(ws.compute("d(A)"), Ok(Outcome::Scalar(rat!(-2))));
        assert_eq!(ws.compute("A*2"), Ok(Outcome::Stored(id('B'))));
        assert_eq!(
            ws.get(id('B')).unwrap(),
            &Matrix::from_rows([[2, 4], [6, 8]]).unwrap()
        );
        assert_eq!(ws.compute("A+B+C"), Err(Error::UndefinedMatrix('C')));
        assert_eq!(ws.derive(id('A'), Matrix::inverse), Ok(id('C')));
        assert_eq!(ws.evaluate("C*A"), Ok(Value::Matrix(Matrix::identity(2).unwrap())));
        assert_eq!(
            ws.derive(id('Z'), |m| Ok(m.transpose())),
            Err(Error::UnknownMatrix(id('Z')))
        );
    }

    #[test]
    fn edits_through_get_mut() {
        let mut ws = Workspace::new();
        let a = ws.add_empty().unwrap();
        let resize = ws.get_mut(a).unwrap().add_row().unwrap();
        assert_eq!(resize.id, Some(a));
        ws.get_mut(a).unwrap()[(1, 0)] = rat!(5);
        assert_eq!(ws.evaluate("A*2"), Ok(Value::Matrix(Matrix::from_rows([[0], [10]]).unwrap())));
    }
}
