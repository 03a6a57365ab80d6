//! Column expressions for filtering and derived columns.
//!
//! Supported syntax: column names (backtick-quoted when they contain spaces
//! or operators), integer/float/quoted text literals, `True`/`False`,
//! `+ - * /`, comparisons (`== != < <= > >=`), `and`/`or`/`not` (also
//! `&`, `|`, `~`) and parentheses. `name = expression` assigns a column.

use std::cmp::Ordering;

use crate::error::{FrameError, Result};

use super::frame::{Series, Table};
use super::ops::CellData;
use super::scalar::Scalar;

/// Result of [`Table::eval`].
#[derive(Debug, Clone, PartialEq)]
pub enum Evaluated {
    /// An assignment produced a new table.
    Table(Table),
    /// A bare expression produced a series.
    Series(Series),
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Ident(String),
    Literal(Scalar),
    Op(&'static str),
    LParen,
    RParen,
    Assign,
}

#[derive(Debug, Clone)]
enum Expr {
    Column(String),
    Literal(Scalar),
    Unary(&'static str, Box<Expr>),
    Binary(&'static str, Box<Expr>, Box<Expr>),
}

const OPERATORS: [&str; 14] = [
    "==", "!=", "<=", ">=", "<", ">", "+", "-", "*", "/", "&", "|", "~", "!",
];

fn tokenize(source: &str) -> Result<Vec<Token>> {
    let chars: Vec<char> = source.chars().collect();
    let mut tokens = Vec::new();
    let mut i = 0;
    while i < chars.len() {
        let c = chars[i];
        if c.is_whitespace() {
            i += 1;
        } else if c == '(' {
            tokens.push(Token::LParen);
            i += 1;
        } else if c == ')' {
            tokens.push(Token::RParen);
            i += 1;
        } else if c == '`' || c == '"' || c == '\'' {
            let end = chars[i + 1..]
                .iter()
                .position(|&x| x == c)
                .map(|p| p + i + 1)
                .ok_or_else(|| FrameError::Expression(format!("unterminated {} quote", c)))?;
            let text: String = chars[i + 1..end].iter().collect();
            tokens.push(if c == '`' {
                Token::Ident(text)
            } else {
                Token::Literal(Scalar::Text(text))
            });
            i = end + 1;
        } else if c.is_ascii_digit() || (c == '.' && chars.get(i + 1).is_some_and(|d| d.is_ascii_digit())) {
            let start = i;
            while i < chars.len() && (chars[i].is_ascii_digit() || chars[i] == '.' || chars[i] == '_') {
                i += 1;
            }
            let raw: String = chars[start..i].iter().filter(|&&ch| ch != '_').collect();
            let value = match raw.parse::<i64>() {
                Ok(v) => Scalar::Int(v),
                Err(_) => Scalar::Float(raw.parse::<f64>().map_err(|_| {
                    FrameError::Expression(format!("invalid number '{}'", raw))
                })?),
            };
            tokens.push(Token::Literal(value));
        } else if c.is_alphabetic() || c == '_' {
            let start = i;
            while i < chars.len() && (chars[i].is_alphanumeric() || chars[i] == '_') {
                i += 1;
            }
            let word: String = chars[start..i].iter().collect();
            tokens.push(match word.as_str() {
                "and" => Token::Op("&"),
                "or" => Token::Op("|"),
                "not" => Token::Op("~"),
                "True" | "true" => Token::Literal(Scalar::Bool(true)),
                "False" | "false" => Token::Literal(Scalar::Bool(false)),
                _ => Token::Ident(word),
            });
        } else {
            let rest: String = chars[i..chars.len().min(i + 2)].iter().collect();
            if let Some(op) = OPERATORS.iter().find(|op| rest.starts_with(**op)) {
                tokens.push(Token::Op(if *op == "!" { "~" } else { *op }));
                i += op.len();
            } else if c == '=' {
                tokens.push(Token::Assign);
                i += 1;
            } else {
                return Err(FrameError::Expression(format!(
                    "unexpected character '{}' in '{}'",
                    c, source
                )));
            }
        }
    }
    Ok(tokens)
}

struct Parser {
    tokens: Vec<Token>,
    position: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.position)
    }

    fn next(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.position).cloned();
        self.position += 1;
        token
    }

    fn eat_op(&mut self, ops: &[&'static str]) -> Option<&'static str> {
        match self.peek() {
            Some(Token::Op(op)) if ops.contains(op) => {
                let op = *op;
                self.position += 1;
                Some(op)
            }
            _ => None,
        }
    }

    fn binary(
        &mut self,
        ops: &[&'static str],
        operand: fn(&mut Parser) -> Result<Expr>,
    ) -> Result<Expr> {
        let mut left = operand(self)?;
        while let Some(op) = self.eat_op(ops) {
            let right = operand(self)?;
            left = Expr::Binary(op, Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn or(&mut self) -> Result<Expr> {
        self.binary(&["|"], Parser::and)
    }

    fn and(&mut self) -> Result<Expr> {
        self.binary(&["&"], Parser::not)
    }

    fn not(&mut self) -> Result<Expr> {
        if self.eat_op(&["~"]).is_some() {
            return Ok(Expr::Unary("~", Box::new(self.not()?)));
        }
        self.comparison()
    }

    fn comparison(&mut self) -> Result<Expr> {
        let left = self.additive()?;
        match self.eat_op(&["==", "!=", "<", "<=", ">", ">="]) {
            Some(op) => Ok(Expr::Binary(op, Box::new(left), Box::new(self.additive()?))),
            None => Ok(left),
        }
    }

    fn additive(&mut self) -> Result<Expr> {
        self.binary(&["+", "-"], Parser::multiplicative)
    }

    fn multiplicative(&mut self) -> Result<Expr> {
        self.binary(&["*", "/"], Parser::unary)
    }

    fn unary(&mut self) -> Result<Expr> {
        if self.eat_op(&["-"]).is_some() {
            return Ok(Expr::Unary("-", Box::new(self.unary()?)));
        }
        self.primary()
    }

    fn primary(&mut self) -> Result<Expr> {
        match self.next() {
            Some(Token::Ident(name)) => Ok(Expr::Column(name)),
            Some(Token::Literal(value)) => Ok(Expr::Literal(value)),
            Some(Token::LParen) => {
                let inner = self.or()?;
                match self.next() {
                    Some(Token::RParen) => Ok(inner),
                    _ => Err(FrameError::Expression("missing closing parenthesis".to_string())),
                }
            }
            other => Err(FrameError::Expression(format!(
                "unexpected token {:?}",
                other
            ))),
        }
    }
}

fn parse(tokens: Vec<Token>) -> Result<Expr> {
    let mut parser = Parser {
        tokens,
        position: 0,
    };
    let expr = parser.or()?;
    if parser.position < parser.tokens.len() {
        return Err(FrameError::Expression(format!(
            "unexpected trailing token {:?}",
            parser.tokens[parser.position]
        )));
    }
    Ok(expr)
}

fn apply_unary(op: &str, value: &Scalar) -> Result<Scalar> {
    match (op, value) {
        (_, v) if v.is_null() => Ok(Scalar::Null),
        ("-", Scalar::Int(i)) => Ok(i
            .checked_neg()
            .map(Scalar::Int)
            .unwrap_or(Scalar::Float(-(*i as f64)))),
        ("-", Scalar::Float(f)) => Ok(Scalar::Float(-f)),
        ("~", Scalar::Bool(b)) => Ok(Scalar::Bool(!b)),
        _ => Err(FrameError::Expression(format!(
            "operator '{}' does not apply to '{}'",
            op, value
        ))),
    }
}

fn apply_binary(op: &str, left: &Scalar, right: &Scalar) -> Result<Scalar> {
    match op {
        "==" | "!=" | "<" | "<=" | ">" | ">=" => Ok(Scalar::Bool(compare(op, left, right))),
        "&" | "|" => {
            let l = left.as_bool().unwrap_or(false);
            let r = right.as_bool().unwrap_or(false);
            Ok(Scalar::Bool(if op == "&" { l && r } else { l || r }))
        }
        _ if left.is_null() || right.is_null() => Ok(Scalar::Null),
        _ => arithmetic(op, left, right),
    }
}

fn compare(op: &str, left: &Scalar, right: &Scalar) -> bool {
    if left.is_null() || right.is_null() {
        return op == "!=";
    }
    let ordering = match (left.as_f64(), right.as_f64()) {
        (Some(a), Some(b)) => a.partial_cmp(&b),
        _ => match (left, right) {
            (Scalar::Text(a), Scalar::Text(b)) => Some(a.cmp(b)),
            (Scalar::Bool(a), Scalar::Bool(b)) => Some(a.cmp(b)),
            (Scalar::Timestamp(a), Scalar::Timestamp(b)) => Some(a.cmp(b)),
            _ => None,
        },
    };
    match (op, ordering) {
        ("==", o) => o == Some(Ordering::Equal),
        ("!=", o) => o != Some(Ordering::Equal),
        (_, None) => false,
        ("<", Some(o)) => o.is_lt(),
        ("<=", Some(o)) => o.is_le(),
        (">", Some(o)) => o.is_gt(),
        (">=", Some(o)) => o.is_ge(),
        _ => false,
    }
}

fn arithmetic(op: &str, left: &Scalar, right: &Scalar) -> Result<Scalar> {
    if let (Scalar::Int(a), Scalar::Int(b)) = (left, right) {
        let checked = match op {
            "+" => a.checked_add(*b),
            "-" => a.checked_sub(*b),
            "*" => a.checked_mul(*b),
            _ => None,
        };
        if let Some(v) = checked {
            return Ok(Scalar::Int(v));
        }
    }
    if let (Scalar::Text(a), Scalar::Text(b), "+") = (left, right, op) {
        return Ok(Scalar::Text(format!("{}{}", a, b)));
    }
    match (left.as_f64(), right.as_f64()) {
        (Some(a), Some(b)) => Ok(Scalar::Float(match op {
            "+" => a + b,
            "-" => a - b,
            "*" => a * b,
            _ => a / b,
        })),
        _ => Err(FrameError::Expression(format!(
            "unsupported operand types for '{}': '{}' and '{}'",
            op, left, right
        ))),
    }
}

enum Operand {
    Cells(Vec<Scalar>),
    Constant(Scalar),
}

impl Operand {
    fn at(&self, row: usize) -> &Scalar {
        match self {
            Operand::Cells(cells) => &cells[row],
            Operand::Constant(value) => value,
        }
    }

    fn into_cells(self, rows: usize) -> Vec<Scalar> {
        match self {
            Operand::Cells(cells) => cells,
            Operand::Constant(value) => vec![value; rows],
        }
    }
}

fn evaluate(expr: &Expr, table: &Table) -> Result<Operand> {
    let rows = table.row_count();
    match expr {
        Expr::Column(name) => Ok(Operand::Cells(table.column(name)?.values().to_vec())),
        Expr::Literal(value) => Ok(Operand::Constant(value.clone())),
        Expr::Unary(op, inner) => match evaluate(inner, table)? {
            Operand::Constant(v) => Ok(Operand::Constant(apply_unary(op, &v)?)),
            Operand::Cells(cells) => Ok(Operand::Cells(
                cells
                    .iter()
                    .map(|v| apply_unary(op, v))
                    .collect::<Result<_>>()?,
            )),
        },
        Expr::Binary(op, left, right) => {
            let left = evaluate(left, table)?;
            let right = evaluate(right, table)?;
            if let (Operand::Constant(l), Operand::Constant(r)) = (&left, &right) {
                return Ok(Operand::Constant(apply_binary(op, l, r)?));
            }
            Ok(Operand::Cells(
                (0..rows)
                    .map(|row| apply_binary(op, left.at(row), right.at(row)))
                    .collect::<Result<_>>()?,
            ))
        }
    }
}

/// Split `target = expression`, leaving comparisons (`==`) alone.
fn split_assignment(tokens: &[Token]) -> Option<(String, usize)> {
    match tokens {
        [Token::Ident(name), Token::Assign, ..] => Some((name.clone(), 2)),
        _ => None,
    }
}

impl Table {
    /// Evaluate an expression: an assignment adds (or replaces) a column,
    /// a bare expression yields an unnamed series.
    pub fn eval(&self, expression: &str) -> Result<Evaluated> {
        let tokens = tokenize(expression)?;
        match split_assignment(&tokens) {
            Some((target, skip)) => {
                let expr = parse(tokens[skip..].to_vec())?;
                let cells = evaluate(&expr, self)?.into_cells(self.row_count());
                Ok(Evaluated::Table(self.set_column(&target, CellData::Values(cells))?))
            }
            None => {
                let expr = parse(tokens)?;
                let cells = evaluate(&expr, self)?.into_cells(self.row_count());
                Ok(Evaluated::Series(Series::new(None, cells, self.index().clone())?))
            }
        }
    }

    /// Keep rows for which a boolean expression holds. Null results drop the row.
    pub fn filter(&self, condition: &str) -> Result<Table> {
        let expr = parse(tokenize(condition)?)?;
        let cells = evaluate(&expr, self)?.into_cells(self.row_count());
        let mask = cells
            .iter()
            .map(|v| match v {
                Scalar::Bool(b) => Ok(*b),
                v if v.is_null() => Ok(false),
                other => Err(FrameError::Expression(format!(
                    "condition '{}' produced non-boolean value '{}'",
                    condition, other
                ))),
            })
            .collect::<Result<Vec<_>>>()?;
        self.mask(&mask)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Table {
        Table::new(
            vec![
                ("A".to_string(), vec![1.into(), 2.into(), 3.into()]),
                ("B".to_string(), vec![4.into(), 5.into(), 6.into()]),
                (
                    "C".to_string(),
                    vec![Scalar::Float(1.1), Scalar::Float(2.2), Scalar::Null],
                ),
            ],
            None,
        )
        .unwrap()
    }

    #[test]
    fn test_filter_greater_than() {
        let filtered = sample().filter("A > 1").unwrap();
        assert_eq!(filtered.index().labels(), &[Scalar::Int(1), Scalar::Int(2)]);
    }

    #[test]
    fn test_filter_compound() {
        let filtered = sample().filter("A >= 2 and not (B == 6)").unwrap();
        assert_eq!(filtered.row_count(), 1);
        assert_eq!(filtered.column("A").unwrap().values(), &[Scalar::Int(2)]);
    }

    #[test]
    fn test_eval_assignment() {
        let Evaluated::Table(table) = sample().eval("D = A + B").unwrap() else {
            panic!("expected a table");
        };
        assert_eq!(
            table.column("D").unwrap().values(),
            &[Scalar::Int(5), Scalar::Int(7), Scalar::Int(9)]
        );
    }

    #[test]
    fn test_eval_series_propagates_null() {
        let Evaluated::Series(series) = sample().eval("A * C").unwrap() else {
            panic!("expected a series");
        };
        assert_eq!(series.name(), None);
        assert!(series.values()[2].is_null());
    }

    #[test]
    fn test_negating_min_integer_widens() {
        let table = Table::new(vec![("v".to_string(), vec![Scalar::Int(i64::MIN)])], None).unwrap();
        let Evaluated::Series(series) = table.eval("-v").unwrap() else {
            panic!("expected a series");
        };
        assert_eq!(series.values(), &[Scalar::Float(-(i64::MIN as f64))]);

        let Evaluated::Series(negated) = sample().eval("-A").unwrap() else {
            panic!("expected a series");
        };
        assert_eq!(negated.values(), &[Scalar::Int(-1), Scalar::Int(-2), Scalar::Int(-3)]);
    }

    #[test]
    fn test_backtick_columns_and_text() {
        let table = Table::new(
            vec![("first name".to_string(), vec!["ann".into(), "bob".into()])],
            None,
        )
        .unwrap();
        let filtered = table.filter("`first name` == 'bob'").unwrap();
        assert_eq!(filtered.row_count(), 1);
    }

    #[test]
    fn test_errors() {
        assert!(matches!(sample().filter("A +"), Err(FrameError::Expression(_))));
        assert!(matches!(sample().filter("A + 1"), Err(FrameError::Expression(_))));
        assert!(matches!(sample().filter("Z > 1"), Err(FrameError::Lookup(_))));
    }
}
