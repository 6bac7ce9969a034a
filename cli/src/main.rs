use std::io::{self, BufRead};

use clap::Parser;
use matrix_interpreter::{Error, Matrix, MatrixId, Outcome, Rational, Result, Value, Workspace};
use tracing_subscriber::EnvFilter;

/// Exact rational matrix calculator.
///
/// Evaluates each EXPRESSION in order. Without expressions, reads commands from stdin.
#[derive(Parser, Debug)]
#[clap(author, version, about, long_about = None)]
struct CliArgs {
    /// Defines a matrix before evaluating, e.g. `-m "A=[1 2; 3 4]"`.
    #[clap(short, long = "matrix", value_name = "LETTER=[ROWS]")]
    matrices: Vec<String>,
    /// Show results as truncated decimals instead of fractions.
    #[clap(long)]
    decimal: bool,
    /// Log evaluation steps to stderr.
    #[clap(short, long)]
    verbose: bool,
    expressions: Vec<String>,
}

/// Parses `[1 2; 3/4 0,5]` into a matrix. Cells are split on whitespace, rows on `;`.
fn parse_matrix(text: &str) -> Result<Matrix> {
    let inner = text
        .trim()
        .strip_prefix('[')
        .and_then(|s| s.strip_suffix(']'))
        .ok_or(Error::MalformedExpression)?;
    let rows = inner
        .split(';')
        .map(|row| {
            row.split_whitespace()
                .map(str::parse::<Rational>)
                .collect::<Result<Vec<_>>>()
        })
        .collect::<Result<Vec<_>>>()?;
    Matrix::from_rows(rows)
}

/// Splits `A = [..]` into the letter and the matrix, `None` if `line` isn't a definition.
fn parse_definition(line: &str) -> Option<Result<(MatrixId, Matrix)>> {
    let (name, body) = line.split_once('=')?;
    let mut chars = name.trim().chars();
    let (Some(c), None) = (chars.next(), chars.next()) else {
        return None;
    };
    let id = MatrixId::from_char(c)?;
    Some(parse_matrix(body).map(|m| (id, m)))
}

fn parse_id(arg: &str) -> Result<MatrixId> {
    let mut chars = arg.trim().chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => MatrixId::try_from(c),
        (Some(c), Some(_)) => Err(Error::UnknownSymbol(c)),
        (None, _) => Err(Error::MalformedExpression),
    }
}

enum Reply {
    Print(String),
    Quit,
}

struct Repl {
    workspace: Workspace,
    decimal: bool,
}

impl Repl {
    fn new(decimal: bool) -> Self {
        Repl {
            workspace: Workspace::new(),
            decimal,
        }
    }

    fn scalar(&self, r: &Rational) -> String {
        if self.decimal {
            r.decimal().to_string()
        } else {
            r.to_string()
        }
    }

    fn matrix(&self, id: Option<MatrixId>, m: &Matrix) -> String {
        let body = if self.decimal {
            m.iter_rows()
                .map(|row| {
                    let cells: Vec<String> = row.iter().map(|r| self.scalar(r)).collect();
                    format!("[{}]", cells.join(" "))
                })
                .collect::<Vec<_>>()
                .join("\n")
        } else {
            m.to_string()
        };
        match id {
            Some(id) => format!("{id} =\n{body}"),
            None => body,
        }
    }

    fn show(&self, id: MatrixId) -> Result<String> {
        Ok(self.matrix(Some(id), self.workspace.get(id)?))
    }

    fn derive(&mut self, arg: &str, f: impl FnOnce(&Matrix) -> Result<Matrix>) -> Result<String> {
        let id = self.workspace.derive(parse_id(arg)?, f)?;
        self.show(id)
    }

    fn command(&mut self, line: &str) -> Result<Reply> {
        if let Some(definition) = parse_definition(line) {
            let (id, matrix) = definition?;
            self.workspace.define(id, matrix);
            return self.show(id).map(Reply::Print);
        }
        let (name, arg) = line.split_once(' ').unwrap_or((line, ""));
        let text = match name {
            "quit" | "exit" => return Ok(Reply::Quit),
            "decimal" => {
                self.decimal = !self.decimal;
                format!("decimal view {}", if self.decimal { "on" } else { "off" })
            }
            "list" => self
                .workspace
                .iter()
                .map(|(id, m)| format!("{id}: {}", m.shape()))
                .collect::<Vec<_>>()
                .join("\n"),
            "show" => self.show(parse_id(arg)?)?,
            "det" => {
                let det = self.workspace.get(parse_id(arg)?)?.determinant()?;
                format!("= {}", self.scalar(&det))
            }
            "rank" => format!("= {}", self.workspace.get(parse_id(arg)?)?.rank()),
            "inv" => self.derive(arg, Matrix::inverse)?,
            "tr" => self.derive(arg, |m| Ok(m.transpose()))?,
            "tri" => self.derive(arg, Matrix::triangular)?,
            "ref" => self.derive(arg, |m| Ok(m.row_echelon()))?,
            "id" => {
                let id = parse_id(arg)?;
                self.workspace.get_mut(id)?.fill_identity()?;
                self.show(id)?
            }
            "clear" => {
                let id = parse_id(arg)?;
                self.workspace.get_mut(id)?.clear();
                self.show(id)?
            }
            "del" => {
                let id = parse_id(arg)?;
                self.workspace.remove(id)?;
                match self.workspace.nearest(id) {
                    Some(next) => format!("removed {id}, nearest is {next}"),
                    None => format!("removed {id}"),
                }
            }
            "lu" => {
                let lu = self.workspace.get(parse_id(arg)?)?.lu()?;
                let mut factors = vec![lu.lower, lu.upper];
                if lu.swaps > 0 {
                    factors.push(lu.permutation);
                }
                self.workspace
                    .add_all(factors)?
                    .into_iter()
                    .map(|id| self.show(id))
                    .collect::<Result<Vec<_>>>()?
                    .join("\n")
            }
            _ => match self.workspace.compute(line)? {
                Outcome::Scalar(r) => format!("= {}", self.scalar(&r)),
                Outcome::Stored(id) => self.show(id)?,
            },
        };
        Ok(Reply::Print(text))
    }
}

fn main() {
    let args = CliArgs::parse();
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(if args.verbose {
                "matrix_interpreter=debug"
            } else {
                "warn"
            })
        }))
        .init();

    let mut repl = Repl::new(args.decimal);
    for definition in &args.matrices {
        match parse_definition(definition) {
            Some(Ok((id, matrix))) => {
                repl.workspace.define(id, matrix);
            }
            Some(Err(err)) => eprintln!("{definition}: {err}"),
            None => eprintln!("{definition}: expected LETTER=[ROWS]"),
        }
    }

    if !args.expressions.is_empty() {
        for e in &args.expressions {
            println!("{e}");
            match repl.workspace.evaluate(e) {
                Ok(Value::Scalar(r)) => println!("= {}", repl.scalar(&r)),
                Ok(Value::Matrix(m)) => println!("{}", repl.matrix(None, &m)),
                Err(err) => eprintln!("{err}"),
            }
        }
        return;
    }

    for line in io::stdin().lock().lines() {
        let line = match line {
            Ok(line) => line,
            Err(err) => {
                eprintln!("{err}");
                break;
            }
        };
        let input = line.trim();
        if input.is_empty() {
            continue;
        }
        match repl.command(input) {
            Ok(Reply::Print(text)) => println!("{text}"),
            Ok(Reply::Quit) => break,
            Err(err) => eprintln!("{err}"),
        }
    }
}
