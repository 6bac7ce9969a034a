use std::{collections::HashMap, fmt::Display};

use crate::{
    error::{Error, Result},
    identifier::{Handle, HandleAllocator, MatrixId},
    value::{Operator, UnaryOp, Value},
    Rational,
};

/// Strips whitespace and maps the alternative separators onto `.` and `/`.
pub fn normalize(input: &str) -> String {
    input
        .chars()
        .filter(|c| !c.is_whitespace())
        .map(|c| match c {
            ',' => '.',
            '\\' => '/',
            c => c,
        })
        .collect()
}

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum Instruction {
    Push(Handle),
    Apply(Operator),
}

impl Display for Instruction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Instruction::Push(handle) => write!(f, "{handle}"),
            Instruction::Apply(op) => write!(f, "{op}"),
        }
    }
}

#[derive(Clone, Copy, Debug)]
enum StackItem {
    Operator(Operator),
    OpenParen,
}

/// Values referenced by the handles of one evaluation session.
#[derive(Debug, Default)]
pub struct Registry {
    values: HashMap<Handle, Value>,
    handles: HandleAllocator,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, value: Value) -> Result<Handle> {
        let handle = self.handles.allocate()?;
        self.values.insert(handle, value);
        Ok(handle)
    }

    pub fn get(&self, handle: Handle) -> Option<&Value> {
        self.values.get(&handle)
    }
}

/// What the parser needs from an evaluation session.
pub trait Context {
    fn registry(&mut self) -> &mut Registry;

    /// Handle of the value bound to a matrix letter.
    fn resolve(&mut self, id: MatrixId) -> Result<Handle>;

    /// Fully evaluates a parenthesized sub-expression.
    fn evaluate(&mut self, input: &str) -> Result<Value>;
}

/// Shunting-yard translation of an equation into an RPN instruction queue.
pub struct RpnParser<'a, C: Context> {
    chars: Vec<char>,
    pos: usize,
    context: &'a mut C,
    output: Vec<Instruction>,
    operators: Vec<StackItem>,
}

impl<'a, C: Context> RpnParser<'a, C> {
    pub fn new(input: &str, context: &'a mut C) -> Self {
        RpnParser {
            chars: normalize(input).chars().collect(),
            pos: 0,
            context,
            output: Vec::new(),
            operators: Vec::new(),
        }
    }

    fn current(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn emit_value(&mut self, value: Value) -> Result<()> {
        let handle = self.context.registry().register(value)?;
        self.output.push(Instruction::Push(handle));
        Ok(())
    }

    fn push_operator(&mut self, op: Operator) {
        while let Some(&StackItem::Operator(top)) = self.operators.last() {
            if top.precedence() < op.precedence() {
                break;
            }
            self.output.push(Instruction::Apply(top));
            self.operators.pop();
        }
        self.operators.push(StackItem::Operator(op));
    }

    fn close_paren(&mut self) -> Result<()> {
        loop {
            match self.operators.pop() {
                Some(StackItem::Operator(op)) => self.output.push(Instruction::Apply(op)),
                Some(StackItem::OpenParen) => return Ok(()),
                None => return Err(Error::UnbalancedParens),
            }
        }
    }

    fn parse_number(&mut self) -> Result<()> {
        let start = self.pos;
        while let Some(c) = self.current() {
            if c.is_ascii_digit() || c == '.' || c == '/' {
                self.pos += 1;
            } else {
                break;
            }
        }
        let text: String = self.chars[start..self.pos].iter().collect();
        let number: Rational = text.parse()?;
        self.emit_value(Value::Scalar(number))
    }

    /// Index of the `)` closing the `(` at `open`.
    fn matching_paren(&self, open: usize) -> Option<usize> {
        let mut depth = 0usize;
        for (i, &c) in self.chars.iter().enumerate().skip(open) {
            match c {
                '(' => depth += 1,
                ')' => {
                    depth -= 1;
                    if depth == 0 {
                        return Some(i);
                    }
                }
                _ => {}
            }
        }
        None
    }

    fn parse_unary(&mut self, op: UnaryOp) -> Result<()> {
        let open = self.pos + 1;
        if self.chars.get(open) != Some(&'(') {
            return Err(Error::ExpectedParen { op: op.as_char() });
        }
        let close = self.matching_paren(open).ok_or(Error::UnbalancedParens)?;
        let inner: String = self.chars[open + 1..close].iter().collect();
        let operand = self.context.evaluate(&inner)?;
        let result = operand.unary(op)?;
        self.emit_value(result)?;
        self.pos = close + 1;
        Ok(())
    }

    pub fn parse(mut self) -> Result<Vec<Instruction>> {
        while let Some(c) = self.current() {
            if c.is_ascii_digit() {
                self.parse_number()?;
                continue;
            }
            if let Some(op) = UnaryOp::from_char(c) {
                self.parse_unary(op)?;
                continue;
            }
            if let Some(op) = Operator::from_char(c) {
                self.push_operator(op);
            } else if let Some(id) = MatrixId::from_char(c) {
                let handle = self.context.resolve(id)?;
                self.output.push(Instruction::Push(handle));
            } else if c == '(' {
                self.operators.push(StackItem::OpenParen);
            } else if c == ')' {
                self.close_paren()?;
            } else {
                return Err(Error::UnknownSymbol(c));
            }
            self.pos += 1;
        }
        while let Some(item) = self.operators.pop() {
            match item {
                StackItem::Operator(op) => self.output.push(Instruction::Apply(op)),
                StackItem::OpenParen => return Err(Error::UnbalancedParens),
            }
        }
        Ok(self.output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{rat, Matrix};
    use itertools::Itertools;
    use rstest::rstest;

    /// Binds letters to 1x1 matrices. Nested digits evaluate to scalars, anything else to a 2x2 identity.
    #[derive(Default)]
    struct Stub {
        registry: Registry,
        nested: Vec<String>,
    }

    impl Context for Stub {
        fn registry(&mut self) -> &mut Registry {
            &mut self.registry
        }

        fn resolve(&mut self, id: MatrixId) -> Result<Handle> {
            if id.as_char() == 'Z' {
                return Err(Error::UndefinedMatrix('Z'));
            }
            let matrix = Matrix::from_rows([[rat!(1)]])?.with_id(id);
            self.registry.register(Value::Matrix(matrix))
        }

        fn evaluate(&mut self, input: &str) -> Result<Value> {
            self.nested.push(input.to_string());
            if input.chars().all(|c| c.is_ascii_digit()) && !input.is_empty() {
                Ok(Value::Scalar(input.parse()?))
            } else {
                Ok(Value::Matrix(Matrix::identity(2)?))
            }
        }
    }

    /// Renders the queue with operands replaced by their values.
    fn rpn(input: &str) -> Result<String> {
        let mut stub = Stub::default();
        let program = RpnParser::new(input, &mut stub).parse()?;
        Ok(program
            .iter()
            .map(|instruction| match instruction {
                Instruction::Push(handle) => match stub.registry.get(*handle) {
                    Some(Value::Scalar(r)) => r.to_string(),
                    Some(Value::Matrix(m)) => m
                        .id()
                        .map(|id| id.to_string())
                        .unwrap_or_else(|| m.shape().to_string()),
                    None => "?".to_string(),
                },
                Instruction::Apply(op) => op.to_string(),
            })
            .join(" "))
    }

    #[test]
    fn normalization() {
        assert_eq!(normalize(" 1,5 + 3\\4 "), "1.5+3/4");
    }

    #[rstest]
    #[case("2+3*4", "2 3 4 * +")]
    #[case("2*3+4", "2 3 * 4 +")]
    #[case("1-2-3", "1 2 - 3 -")]
    #[case("(1+2)*3", "1 2 + 3 *")]
    #[case("A+B*C", "A B C * +")]
    #[case("A/2", "A 2 /")]
    #[case("1/2+0,5", "1/2 1/2 +")]
    #[case("3\\6", "1/2")]
    #[case("((A))", "A")]
    #[case("t(A)*B", "2x2 B *")]
    #[case("d(A)*B", "1 B *")]
    fn shunting_yard(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(rpn(input).unwrap(), expected);
    }

    #[rstest]
    #[case("A+B*(", Error::UnbalancedParens)]
    #[case("(1+2", Error::UnbalancedParens)]
    #[case("1+2)", Error::UnbalancedParens)]
    #[case("d(A", Error::UnbalancedParens)]
    #[case("dA", Error::ExpectedParen { op: 'd' })]
    #[case("Z+1", Error::UndefinedMatrix('Z'))]
    #[case("2^3", Error::UnknownSymbol('^'))]
    #[case("x", Error::UnknownSymbol('x'))]
    #[case("1/2/3", Error::InvalidNumber("1/2/3".to_string()))]
    #[case("i(5)", Error::NonMatrixOperand(UnaryOp::Inverse))]
    fn parse_errors(#[case] input: &str, #[case] expected: Error) {
        assert_eq!(rpn(input), Err(expected));
    }

    #[test]
    fn unary_operand_is_evaluated_separately() {
        let mut stub = Stub::default();
        RpnParser::new("t(A*(B+C))+r(t(A))", &mut stub).parse().unwrap();
        assert_eq!(stub.nested, vec!["A*(B+C)".to_string(), "t(A)".to_string()]);
    }
}
