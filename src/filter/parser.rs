use super::lexer::{CompareOp, Token, tokenize};
use crate::core::{Error, Result};
use serde_json::{Number, Value};

/// One parsed `path OP literal` clause.
#[derive(Debug, Clone, PartialEq)]
pub struct Comparison {
    pub path: Vec<String>,
    pub op: CompareOp,
    pub value: Value,
}

pub(crate) fn parse(expression: &str) -> Result<Comparison> {
    let tokens = tokenize(expression)?;
    let mut parser = Parser {
        expression,
        tokens,
        pos: 0,
    };

    let path = parser.path()?;
    let op = parser.operator()?;
    let value = parser.literal()?;
    parser.end()?;

    Ok(Comparison { path, op, value })
}

struct Parser<'a> {
    expression: &'a str,
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser<'_> {
    fn error(&self, reason: impl Into<String>) -> Error {
        Error::compile(self.expression, reason)
    }

    fn next(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn path(&mut self) -> Result<Vec<String>> {
        let mut segments = Vec::new();
        loop {
            match self.next() {
                Some(Token::Ident(name)) => segments.push(name),
                Some(other) => {
                    return Err(self.error(format!("expected field name, found {}", describe(&other))));
                }
                None => return Err(self.error("expected field name")),
            }

            if self.tokens.get(self.pos) == Some(&Token::Dot) {
                self.pos += 1;
            } else {
                return Ok(segments);
            }
        }
    }

    fn operator(&mut self) -> Result<CompareOp> {
        match self.next() {
            Some(Token::Op(op)) => Ok(op),
            Some(other) => Err(self.error(format!(
                "expected comparison operator, found {}",
                describe(&other)
            ))),
            None => Err(self.error("expected comparison operator")),
        }
    }

    fn literal(&mut self) -> Result<Value> {
        match self.next() {
            // Every quote character is dropped, not only the delimiters.
            Some(Token::Str(body)) => Ok(Value::String(body.replace(['"', '\''], ""))),
            Some(Token::Int(text)) => text
                .parse::<i64>()
                .map(Value::from)
                .map_err(|_| self.error(format!("integer literal {} is out of range", text))),
            Some(Token::Float(text)) => text
                .parse::<f64>()
                .ok()
                .and_then(Number::from_f64)
                .map(Value::Number)
                .ok_or_else(|| self.error(format!("invalid float literal {}", text))),
            Some(Token::Variable(variable)) => Ok(Value::String(variable)),
            Some(other) => Err(self.error(format!(
                "right-hand side must be a literal, found {}",
                describe(&other)
            ))),
            None => Err(self.error("missing right-hand literal")),
        }
    }

    fn end(&mut self) -> Result<()> {
        match self.next() {
            None => Ok(()),
            Some(other) => Err(self.error(format!("unexpected trailing {}", describe(&other)))),
        }
    }
}

fn describe(token: &Token) -> String {
    match token {
        Token::Ident(name) => format!("identifier '{}'", name),
        Token::Dot => "'.'".to_string(),
        Token::Op(op) => format!("operator '{}'", op.symbol()),
        Token::Str(body) => format!("string '{}'", body),
        Token::Int(text) | Token::Float(text) => format!("number {}", text),
        Token::Variable(variable) => format!("variable {}", variable),
    }
}
