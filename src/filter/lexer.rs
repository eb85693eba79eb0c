use crate::core::{Error, Result};
use std::iter::Peekable;
use std::str::CharIndices;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Eq,
    NotEq,
    Lt,
    LtEq,
    Gt,
    GtEq,
}

impl CompareOp {
    /// Remote filter operator name.
    pub fn as_operator(self) -> &'static str {
        match self {
            CompareOp::Eq => "_eq",
            CompareOp::NotEq => "_neq",
            CompareOp::Lt => "_lt",
            CompareOp::LtEq => "_lte",
            CompareOp::Gt => "_gt",
            CompareOp::GtEq => "_gte",
        }
    }

    pub fn symbol(self) -> &'static str {
        match self {
            CompareOp::Eq => "==",
            CompareOp::NotEq => "!=",
            CompareOp::Lt => "<",
            CompareOp::LtEq => "<=",
            CompareOp::Gt => ">",
            CompareOp::GtEq => ">=",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Token {
    Ident(String),
    Dot,
    Op(CompareOp),
    /// Body between the delimiters, escapes left untouched.
    Str(String),
    Int(String),
    Float(String),
    /// Dynamic variable including the `$` and any `(...)` adjustment.
    Variable(String),
}

const VARIABLES: &[&str] = &[
    "NOW",
    "CURRENT_USER",
    "CURRENT_ROLE",
    "CURRENT_ROLES",
    "CURRENT_POLICIES",
];

/// Variables that may be followed by a dotted field path.
const FIELD_VARIABLES: &[&str] = &["CURRENT_USER", "CURRENT_ROLE"];

pub(crate) fn tokenize(expression: &str) -> Result<Vec<Token>> {
    Lexer {
        expression,
        chars: expression.char_indices().peekable(),
    }
    .run()
}

struct Lexer<'a> {
    expression: &'a str,
    chars: Peekable<CharIndices<'a>>,
}

impl Lexer<'_> {
    fn run(mut self) -> Result<Vec<Token>> {
        let mut tokens = Vec::new();

        while let Some(&(offset, ch)) = self.chars.peek() {
            let token = match ch {
                c if c.is_whitespace() => {
                    self.chars.next();
                    continue;
                }
                '.' => {
                    self.chars.next();
                    Token::Dot
                }
                '=' | '!' | '<' | '>' => Token::Op(self.operator()?),
                '"' | '\'' => Token::Str(self.string(ch)?),
                '$' => Token::Variable(self.variable()?),
                c if c.is_ascii_digit() => self.number(),
                '-' if self.next_is_digit(offset) => self.number(),
                c if c.is_alphabetic() || c == '_' => Token::Ident(self.ident()),
                other => {
                    return Err(self.error(format!(
                        "unexpected character '{}' at offset {}",
                        other, offset
                    )));
                }
            };
            tokens.push(token);
        }

        Ok(tokens)
    }

    fn error(&self, reason: String) -> Error {
        Error::compile(self.expression, reason)
    }

    fn next_is_digit(&self, offset: usize) -> bool {
        self.expression[offset + 1..]
            .chars()
            .next()
            .is_some_and(|c| c.is_ascii_digit())
    }

    fn take_while(&mut self, out: &mut String, accept: impl Fn(char) -> bool) {
        while let Some(&(_, c)) = self.chars.peek() {
            if !accept(c) {
                break;
            }
            out.push(c);
            self.chars.next();
        }
    }

    fn operator(&mut self) -> Result<CompareOp> {
        let Some((_, first)) = self.chars.next() else {
            return Err(self.error("unexpected end of expression".into()));
        };
        let followed_by_eq = matches!(self.chars.peek(), Some(&(_, '=')));
        if followed_by_eq {
            self.chars.next();
        }

        match (first, followed_by_eq) {
            ('=', true) => Ok(CompareOp::Eq),
            ('!', true) => Ok(CompareOp::NotEq),
            ('<', true) => Ok(CompareOp::LtEq),
            ('>', true) => Ok(CompareOp::GtEq),
            ('<', false) => Ok(CompareOp::Lt),
            ('>', false) => Ok(CompareOp::Gt),
            (other, _) => Err(self.error(format!("unsupported operator '{}'", other))),
        }
    }

    fn string(&mut self, delimiter: char) -> Result<String> {
        self.chars.next();
        let mut body = String::new();

        loop {
            match self.chars.next() {
                Some((_, '\\')) => {
                    body.push('\\');
                    match self.chars.next() {
                        Some((_, escaped)) => body.push(escaped),
                        None => break,
                    }
                }
                Some((_, c)) if c == delimiter => return Ok(body),
                Some((_, c)) => body.push(c),
                None => break,
            }
        }

        Err(self.error("unterminated string literal".into()))
    }

    fn number(&mut self) -> Token {
        let mut text = String::new();
        if let Some(&(_, '-')) = self.chars.peek() {
            text.push('-');
            self.chars.next();
        }
        self.take_while(&mut text, |c| c.is_ascii_digit());

        let mut is_float = false;
        let mut lookahead = self.chars.clone();
        if let (Some((_, '.')), Some((_, d))) = (lookahead.next(), lookahead.next()) {
            if d.is_ascii_digit() {
                is_float = true;
                text.push('.');
                self.chars.next();
                self.take_while(&mut text, |c| c.is_ascii_digit());
            }
        }

        let mut lookahead = self.chars.clone();
        if let Some((_, e)) = lookahead.next() {
            if e == 'e' || e == 'E' {
                let mut exponent = String::from(e);
                if let Some(&(_, sign)) = lookahead.peek() {
                    if sign == '+' || sign == '-' {
                        exponent.push(sign);
                        lookahead.next();
                    }
                }
                if lookahead.peek().is_some_and(|&(_, d)| d.is_ascii_digit()) {
                    is_float = true;
                    self.chars = lookahead;
                    text.push_str(&exponent);
                    self.take_while(&mut text, |c| c.is_ascii_digit());
                }
            }
        }

        if is_float {
            Token::Float(text)
        } else {
            Token::Int(text)
        }
    }

    fn ident(&mut self) -> String {
        let mut name = String::new();
        self.take_while(&mut name, |c| c.is_alphanumeric() || c == '_');
        name
    }

    fn variable(&mut self) -> Result<String> {
        self.chars.next();
        let name = self.ident();
        if !VARIABLES.contains(&name.as_str()) {
            return Err(self.error(format!("unknown variable '${}'", name)));
        }

        let mut variable = format!("${}", name);
        if FIELD_VARIABLES.contains(&name.as_str()) {
            // `$CURRENT_USER.role.name`
            loop {
                let mut lookahead = self.chars.clone();
                match (lookahead.next(), lookahead.next()) {
                    (Some((_, '.')), Some((_, c))) if c.is_alphabetic() || c == '_' => {
                        self.chars.next();
                        variable.push('.');
                        variable.push_str(&self.ident());
                    }
                    _ => break,
                }
            }
        }
        if let Some(&(_, '(')) = self.chars.peek() {
            self.take_while(&mut variable, |c| c != ')');
            match self.chars.next() {
                Some((_, ')')) => variable.push(')'),
                _ => return Err(self.error(format!("unterminated adjustment for ${}", name))),
            }
        }
        Ok(variable)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokenize_dotted_comparison() {
        let tokens = tokenize("user.name>='bob'").unwrap();
        assert_eq!(
            tokens,
            vec![
                Token::Ident("user".into()),
                Token::Dot,
                Token::Ident("name".into()),
                Token::Op(CompareOp::GtEq),
                Token::Str("bob".into()),
            ]
        );
    }

    #[test]
    fn test_tokenize_numbers() {
        assert_eq!(tokenize("10").unwrap(), vec![Token::Int("10".into())]);
        assert_eq!(tokenize("-3").unwrap(), vec![Token::Int("-3".into())]);
        assert_eq!(tokenize("2.5").unwrap(), vec![Token::Float("2.5".into())]);
        assert_eq!(tokenize("1e3").unwrap(), vec![Token::Float("1e3".into())]);
        assert_eq!(tokenize("4E-2").unwrap(), vec![Token::Float("4E-2".into())]);
    }

    #[test]
    fn test_escaped_delimiter_does_not_close_string() {
        let tokens = tokenize(r#""a\"b""#).unwrap();
        assert_eq!(tokens, vec![Token::Str(r#"a\"b"#.into())]);
    }

    #[test]
    fn test_variables() {
        assert_eq!(
            tokenize("$NOW(-1 year)").unwrap(),
            vec![Token::Variable("$NOW(-1 year)".into())]
        );
        assert!(tokenize("$TOMORROW").is_err());
    }

    #[test]
    fn test_user_and_role_variables_take_field_paths() {
        assert_eq!(
            tokenize("owner == $CURRENT_USER.id").unwrap(),
            vec![
                Token::Ident("owner".into()),
                Token::Op(CompareOp::Eq),
                Token::Variable("$CURRENT_USER.id".into()),
            ]
        );
        assert_eq!(
            tokenize("$CURRENT_ROLE.name").unwrap(),
            vec![Token::Variable("$CURRENT_ROLE.name".into())]
        );
        assert_eq!(
            tokenize("$CURRENT_USER.role.name").unwrap(),
            vec![Token::Variable("$CURRENT_USER.role.name".into())]
        );
        assert_eq!(
            tokenize("$CURRENT_USER.").unwrap(),
            vec![Token::Variable("$CURRENT_USER".into()), Token::Dot]
        );
        assert_eq!(
            tokenize("$NOW.id").unwrap(),
            vec![
                Token::Variable("$NOW".into()),
                Token::Dot,
                Token::Ident("id".into()),
            ]
        );
    }

    #[test]
    fn test_rejects_unknown_operators() {
        assert!(tokenize("a = 1").is_err());
        assert!(tokenize("a && b").is_err());
        assert!(tokenize("'open").is_err());
    }
}
