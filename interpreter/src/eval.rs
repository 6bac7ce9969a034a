use std::collections::{BTreeMap, HashMap};

use itertools::Itertools;
use rayon::prelude::*;
use tracing::debug;

use crate::{
    error::{Error, Result},
    identifier::{Handle, MatrixId},
    parser::{Context, Instruction, Registry, RpnParser},
    value::Value,
    Matrix,
};

/// Caller-owned matrices, read but never modified by evaluation.
pub type SymbolTable = BTreeMap<MatrixId, Matrix>;

/// Deepest chain of nested unary operands, e.g. `t(t(A))` is two.
pub const MAX_NESTING: usize = 32;

/// State of one evaluation, including every nested sub-expression it triggers.
pub struct Session<'a> {
    symbols: &'a SymbolTable,
    registry: Registry,
    bound: HashMap<MatrixId, Handle>,
    depth: usize,
}

impl<'a> Session<'a> {
    pub fn new(symbols: &'a SymbolTable) -> Self {
        Session {
            symbols,
            registry: Registry::new(),
            bound: HashMap::new(),
            depth: 0,
        }
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn compile(&mut self, input: &str) -> Result<Vec<Instruction>> {
        let program = RpnParser::new(input, self).parse()?;
        debug!(input, program = %program.iter().join(" "), "compiled");
        Ok(program)
    }

    pub fn execute(&self, program: &[Instruction]) -> Result<Value> {
        #[cfg(feature = "tracy")]
        profiling::scope!("Session::execute");
        let mut stack: Vec<Value> = Vec::new();
        for instruction in program {
            match *instruction {
                Instruction::Push(handle) => {
                    let value = self
                        .registry
                        .get(handle)
                        .ok_or(Error::MalformedExpression)?;
                    stack.push(value.clone());
                }
                Instruction::Apply(op) => {
                    let rhs = stack.pop().ok_or(Error::MalformedExpression)?;
                    let lhs = stack.pop().ok_or(Error::MalformedExpression)?;
                    stack.push(Value::apply(op, &lhs, &rhs)?);
                }
            }
        }
        match (stack.pop(), stack.is_empty()) {
            (Some(value), true) => Ok(value),
            _ => Err(Error::MalformedExpression),
        }
    }

    pub fn evaluate(&mut self, input: &str) -> Result<Value> {
        let program = self.compile(input)?;
        let value = self.execute(&program)?;
        debug!(input, %value, "evaluated");
        Ok(value)
    }
}

impl Context for Session<'_> {
    fn registry(&mut self) -> &mut Registry {
        &mut self.registry
    }

    fn resolve(&mut self, id: MatrixId) -> Result<Handle> {
        if let Some(&handle) = self.bound.get(&id) {
            return Ok(handle);
        }
        let matrix = self
            .symbols
            .get(&id)
            .ok_or(Error::UndefinedMatrix(id.as_char()))?;
        let handle = self.registry.register(Value::Matrix(matrix.clone()))?;
        self.bound.insert(id, handle);
        Ok(handle)
    }

    fn evaluate(&mut self, input: &str) -> Result<Value> {
        if self.depth >= MAX_NESTING {
            return Err(Error::TooComplex);
        }
        self.depth += 1;
        let value = Session::evaluate(self, input);
        self.depth -= 1;
        value
    }
}

/// Evaluates one equation against `symbols`.
pub fn evaluate(input: &str, symbols: &SymbolTable) -> Result<Value> {
    Session::new(symbols).evaluate(input)
}

/// Evaluates independent equations in parallel, one session each. Results keep input order.
pub fn evaluate_all<S>(inputs: &[S], symbols: &SymbolTable) -> Vec<Result<Value>>
where
    S: AsRef<str> + Sync,
{
    inputs
        .par_iter()
        .map(|input| evaluate(input.as_ref(), symbols))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{rat, Operator, UnaryOp};
    use rstest::rstest;

    fn symbols() -> SymbolTable {
        let mut symbols = SymbolTable::new();
        for (c, rows) in [('A', [[1, 2], [3, 4]]), ('B', [[5, 6], [7, 8]])] {
            let id = MatrixId::from_char(c).unwrap();
            symbols.insert(id, Matrix::from_rows(rows).unwrap().with_id(id));
        }
        let c = MatrixId::from_char('C').unwrap();
        symbols.insert(c, Matrix::from_rows([[1, 0, 2]]).unwrap().with_id(c));
        symbols
    }

    fn nested(op: char, depth: usize, operand: &str) -> String {
        format!("{}{operand}{}", format!("{op}(").repeat(depth), ")".repeat(depth))
    }

    fn matrix<const R: usize, const C: usize>(rows: [[i64; C]; R]) -> Value {
        Value::Matrix(Matrix::from_rows(rows).unwrap())
    }

    #[rstest]
    #[case("2+3*4", Value::from(rat!(14)))]
    #[case("(2+3)*4", Value::from(rat!(20)))]
    #[case("10-4-3", Value::from(rat!(3)))]
    #[case("1/2+1\\3", Value::from(rat!(5 / 6)))]
    #[case("0,25*4", Value::from(rat!(1)))]
    #[case("7/2", Value::from(rat!(7 / 2)))]
    #[case("(1+1)/4", Value::from(rat!(1 / 2)))]
    #[case("d(A)", Value::from(rat!(-2)))]
    #[case("r(A) + d(B)", Value::from(rat!(0)))]
    #[case("A+B", matrix([[6, 8], [10, 12]]))]
    #[case("A*B", matrix([[19, 22], [43, 50]]))]
    #[case("2*A-A", matrix([[1, 2], [3, 4]]))]
    #[case("t(C)", matrix([[1], [0], [2]]))]
    #[case("C*t(C)", matrix([[5]]))]
    #[case("A/2*2", matrix([[1, 2], [3, 4]]))]
    #[case("d(i(A)*A)", Value::from(rat!(1)))]
    #[case("t(t(A))", matrix([[1, 2], [3, 4]]))]
    fn evaluates(#[case] input: &str, #[case] expected: Value) {
        assert_eq!(evaluate(input, &symbols()), Ok(expected));
    }

    #[test]
    fn inverse() {
        let expected = Matrix::from_rows([[rat!(-2), rat!(1)], [rat!(3 / 2), rat!(-1 / 2)]]).unwrap();
        assert_eq!(evaluate("i(A)", &symbols()), Ok(Value::Matrix(expected)));
        assert_eq!(
            evaluate("i(A)*A", &symbols()),
            Ok(Value::Matrix(Matrix::identity(2).unwrap()))
        );
    }

    #[rstest]
    #[case("i(5)", Error::NonMatrixOperand(UnaryOp::Inverse))]
    #[case("A+B*(", Error::UnbalancedParens)]
    #[case("Q", Error::UndefinedMatrix('Q'))]
    #[case("", Error::MalformedExpression)]
    #[case("2A", Error::MalformedExpression)]
    #[case("+", Error::MalformedExpression)]
    #[case("()", Error::MalformedExpression)]
    #[case("1/0", Error::ZeroDenominator)]
    #[case("(1)/(1-1)", Error::DivideByZero)]
    #[case("1/(1-1)", Error::InvalidNumber("1/".to_string()))]
    #[case("d(C)", Error::NotSquare { op: "Determinant" })]
    #[case("i(A-A)", Error::NotInvertible)]
    #[case("A/B", Error::IncompatibleOperands {
        op: Operator::Div,
        left: "2x2 matrix".to_string(),
        right: "2x2 matrix".to_string(),
    })]
    #[case("A+C", Error::IncompatibleOperands {
        op: Operator::Add,
        left: "2x2 matrix".to_string(),
        right: "1x3 matrix".to_string(),
    })]
    #[case("1+A", Error::IncompatibleOperands {
        op: Operator::Add,
        left: "scalar".to_string(),
        right: "2x2 matrix".to_string(),
    })]
    fn fails(#[case] input: &str, #[case] expected: Error) {
        assert_eq!(evaluate(input, &symbols()), Err(expected));
    }

    #[test]
    fn repeated_letters_share_a_handle() {
        let symbols = symbols();
        let mut session = Session::new(&symbols);
        let program = session.compile("A+A+A").unwrap();
        let handles: Vec<Handle> = program
            .iter()
            .filter_map(|instruction| match instruction {
                Instruction::Push(handle) => Some(*handle),
                Instruction::Apply(_) => None,
            })
            .collect();
        assert_eq!(handles.len(), 3);
        assert!(handles.iter().all_equal());
        assert_eq!(session.registry().get(handles[0]), Some(&matrix([[1, 2], [3, 4]])));
        assert_eq!(session.execute(&program), Ok(matrix([[3, 6], [9, 12]])));
    }

    #[rstest]
    #[case(nested('t', MAX_NESTING, "A"), Ok(matrix([[1, 2], [3, 4]])))]
    #[case(nested('t', MAX_NESTING - 1, "A"), Ok(matrix([[1, 3], [2, 4]])))]
    #[case(nested('t', MAX_NESTING + 1, "A"), Err(Error::TooComplex))]
    #[case(nested('t', 5000, "A"), Err(Error::TooComplex))]
    #[case(nested('d', 5000, "A"), Err(Error::TooComplex))]
    fn nesting_is_bounded(#[case] input: String, #[case] expected: Result<Value>) {
        assert_eq!(evaluate(&input, &symbols()), expected);
    }

    #[test]
    fn deep_nesting_fails_in_parallel() {
        let inputs = [nested('t', 5000, "A"), "t(t(A))".to_string()];
        let results = evaluate_all(&inputs[..], &symbols());
        assert_eq!(results[0], Err(Error::TooComplex));
        assert_eq!(results[1], Ok(matrix([[1, 2], [3, 4]])));
    }

    #[test]
    fn nesting_depth_resets_between_operands() {
        let sum = vec![nested('t', MAX_NESTING, "A"); 3].join("+");
        assert_eq!(evaluate(&sum, &symbols()), Ok(matrix([[3, 6], [9, 12]])));
    }

    #[test]
    fn evaluation_does_not_touch_symbols() {
        let symbols = symbols();
        let before = symbols.clone();
        evaluate("i(A)*2+t(B)-A*B", &symbols).unwrap();
        assert_eq!(symbols, before);
    }

    #[test]
    fn parallel_evaluation_keeps_order() {
        let inputs = ["2+3*4", "d(A)", "A+", "B-B"];
        let results = evaluate_all(&inputs[..], &symbols());
        assert_eq!(results.len(), 4);
        assert_eq!(results[0], Ok(Value::from(rat!(14))));
        assert_eq!(results[1], Ok(Value::from(rat!(-2))));
        assert_eq!(results[2], Err(Error::MalformedExpression));
        assert_eq!(results[3], Ok(matrix([[0, 0], [0, 0]])));
    }
}
