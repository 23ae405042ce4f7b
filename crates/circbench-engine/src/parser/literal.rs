//! Restricted decoder for the literal syntax the solver prints.
//!
//! Accepts integers, finite floats, quoted strings, `True`/`False`/`None`,
//! lists, tuples and dicts. Nothing is ever evaluated.

use thiserror::Error;

/// Nesting limit for lists, tuples and dicts.
pub const MAX_DEPTH: usize = 32;

#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Int(i64),
    Float(f64),
    Str(String),
    Bool(bool),
    None,
    List(Vec<Literal>),
    Tuple(Vec<Literal>),
    Dict(Vec<(Literal, Literal)>),
}

impl Literal {
    #[must_use]
    pub fn as_f64(&self) -> Option<f64> {
        match *self {
            Self::Int(v) => Some(v as f64),
            Self::Float(v) => Some(v),
            _ => None,
        }
    }

    /// Non-negative integer, accepting integral floats such as `3.0`.
    #[must_use]
    pub fn as_u64(&self) -> Option<u64> {
        match *self {
            Self::Int(v) => u64::try_from(v).ok(),
            Self::Float(v) if v >= 0.0 && v.fract() == 0.0 && v <= u64::MAX as f64 => {
                Some(v as u64)
            }
            _ => None,
        }
    }

    /// Elements of a list or tuple.
    #[must_use]
    pub fn as_sequence(&self) -> Option<&[Literal]> {
        match self {
            Self::List(items) | Self::Tuple(items) => Some(items),
            _ => None,
        }
    }

    /// Value stored under string key `key` in a dict.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Literal> {
        match self {
            Self::Dict(entries) => entries
                .iter()
                .find(|(k, _)| matches!(k, Self::Str(s) if s == key))
                .map(|(_, v)| v),
            _ => None,
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LiteralError {
    #[error("unexpected end of input")]
    UnexpectedEnd,

    #[error("unexpected character '{ch}' at offset {offset}")]
    UnexpectedChar { ch: char, offset: usize },

    #[error("unsupported name '{name}' at offset {offset}")]
    UnsupportedName { name: String, offset: usize },

    #[error("invalid number '{text}' at offset {offset}")]
    InvalidNumber { text: String, offset: usize },

    #[error("nesting deeper than {MAX_DEPTH}")]
    TooDeep,

    #[error("trailing input at offset {offset}")]
    TrailingInput { offset: usize },
}

/// Decode exactly one literal from `text` (surrounding whitespace allowed).
pub fn parse_literal(text: &str) -> Result<Literal, LiteralError> {
    let mut parser = Parser { src: text, pos: 0 };
    let value = parser.value(0)?;
    parser.skip_ws();
    if parser.pos < text.len() {
        return Err(LiteralError::TrailingInput { offset: parser.pos });
    }
    Ok(value)
}

struct Parser<'a> {
    src: &'a str,
    pos: usize,
}

impl Parser<'_> {
    fn peek(&self) -> Option<char> {
        self.src[self.pos..].chars().next()
    }

    fn bump(&mut self) -> Option<char> {
        let ch = self.peek()?;
        self.pos += ch.len_utf8();
        Some(ch)
    }

    fn skip_ws(&mut self) {
        while self.peek().is_some_and(char::is_whitespace) {
            self.bump();
        }
    }

    fn expect_any(&mut self) -> Result<char, LiteralError> {
        self.peek().ok_or(LiteralError::UnexpectedEnd)
    }

    fn value(&mut self, depth: usize) -> Result<Literal, LiteralError> {
        self.skip_ws();
        let ch = self.expect_any()?;
        match ch {
            '{' | '[' | '(' if depth >= MAX_DEPTH => Err(LiteralError::TooDeep),
            '{' => self.dict(depth + 1),
            '[' => self
                .sequence(']', depth + 1)
                .map(|(items, _)| Literal::List(items)),
            '(' => {
                let (mut items, trailing_comma) = self.sequence(')', depth + 1)?;
                // `(x)` is just `x`; `(x,)` is a one-element tuple.
                if items.len() == 1 && !trailing_comma {
                    Ok(items.remove(0))
                } else {
                    Ok(Literal::Tuple(items))
                }
            }
            '\'' | '"' => self.string().map(Literal::Str),
            c if c.is_ascii_digit() || c == '-' || c == '+' || c == '.' => self.number(),
            c if c.is_ascii_alphabetic() || c == '_' => self.name(),
            c => Err(LiteralError::UnexpectedChar {
                ch: c,
                offset: self.pos,
            }),
        }
    }

    /// Comma-separated values up to `close`. Returns whether the last item
    /// was followed by a comma.
    fn sequence(
        &mut self,
        close: char,
        depth: usize,
    ) -> Result<(Vec<Literal>, bool), LiteralError> {
        self.bump();
        let mut items = Vec::new();
        let mut trailing_comma = false;
        loop {
            self.skip_ws();
            if self.expect_any()? == close {
                self.bump();
                return Ok((items, trailing_comma));
            }
            items.push(self.value(depth)?);
            self.skip_ws();
            match self.bump() {
                Some(',') => trailing_comma = true,
                Some(c) if c == close => return Ok((items, false)),
                Some(c) => {
                    return Err(LiteralError::UnexpectedChar {
                        ch: c,
                        offset: self.pos - c.len_utf8(),
                    });
                }
                None => return Err(LiteralError::UnexpectedEnd),
            }
        }
    }

    fn dict(&mut self, depth: usize) -> Result<Literal, LiteralError> {
        self.bump();
        let mut entries = Vec::new();
        loop {
            self.skip_ws();
            if self.expect_any()? == '}' {
                self.bump();
                return Ok(Literal::Dict(entries));
            }
            let key = self.value(depth)?;
            self.skip_ws();
            match self.bump() {
                Some(':') => {}
                Some(c) => {
                    return Err(LiteralError::UnexpectedChar {
                        ch: c,
                        offset: self.pos - c.len_utf8(),
                    });
                }
                None => return Err(LiteralError::UnexpectedEnd),
            }
            let value = self.value(depth)?;
            entries.push((key, value));
            self.skip_ws();
            match self.bump() {
                Some(',') => {}
                Some('}') => return Ok(Literal::Dict(entries)),
                Some(c) => {
                    return Err(LiteralError::UnexpectedChar {
                        ch: c,
                        offset: self.pos - c.len_utf8(),
                    });
                }
                None => return Err(LiteralError::UnexpectedEnd),
            }
        }
    }

    fn string(&mut self) -> Result<String, LiteralError> {
        let quote = self.bump().ok_or(LiteralError::UnexpectedEnd)?;
        let mut out = String::new();
        loop {
            match self.bump().ok_or(LiteralError::UnexpectedEnd)? {
                c if c == quote => return Ok(out),
                '\\' => match self.bump().ok_or(LiteralError::UnexpectedEnd)? {
                    'n' => out.push('\n'),
                    't' => out.push('\t'),
                    'r' => out.push('\r'),
                    '0' => out.push('\0'),
                    other => out.push(other),
                },
                c => out.push(c),
            }
        }
    }

    fn number(&mut self) -> Result<Literal, LiteralError> {
        let start = self.pos;
        if matches!(self.peek(), Some('-' | '+')) {
            self.bump();
        }
        let mut is_float = false;
        while let Some(c) = self.peek() {
            match c {
                '0'..='9' | '_' => {}
                '.' => is_float = true,
                'e' | 'E' => {
                    is_float = true;
                    self.bump();
                    if matches!(self.peek(), Some('-' | '+')) {
                        self.bump();
                    }
                    continue;
                }
                _ => break,
            }
            self.bump();
        }

        let text = &self.src[start..self.pos];
        let invalid = || LiteralError::InvalidNumber {
            text: text.to_string(),
            offset: start,
        };
        let cleaned = text.replace('_', "");
        if !cleaned.bytes().any(|b| b.is_ascii_digit()) {
            return Err(invalid());
        }
        if is_float {
            let value: f64 = cleaned.parse().map_err(|_| invalid())?;
            if !value.is_finite() {
                return Err(invalid());
            }
            Ok(Literal::Float(value))
        } else {
            cleaned.parse::<i64>().map(Literal::Int).map_err(|_| invalid())
        }
    }

    fn name(&mut self) -> Result<Literal, LiteralError> {
        let start = self.pos;
        while self
            .peek()
            .is_some_and(|c| c.is_ascii_alphanumeric() || c == '_')
        {
            self.bump();
        }
        match &self.src[start..self.pos] {
            "True" => Ok(Literal::Bool(true)),
            "False" => Ok(Literal::Bool(false)),
            "None" => Ok(Literal::None),
            other => Err(LiteralError::UnsupportedName {
                name: other.to_string(),
                offset: start,
            }),
        }
    }
}
