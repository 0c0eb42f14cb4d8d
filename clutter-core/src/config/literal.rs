// Copyright (c) 2025, Tom Ouellette
// Licensed under the MIT License

use std::fmt;

use serde_json::{Map, Number, Value};

/// A typed configuration value written with Python literal syntax
///
/// Tuples and sets are stored as lists since the task schemas do not
/// distinguish between them.
///
/// # Examples
///
/// ```
/// use clutter_core::config::Literal;
///
/// assert_eq!(Literal::parse("5").unwrap(), Literal::Int(5));
/// assert_eq!(Literal::parse("'data/'").unwrap(), Literal::Str("data/".to_string()));
/// assert_eq!(
///     Literal::parse("[1, 2]").unwrap(),
///     Literal::List(vec![Literal::Int(1), Literal::Int(2)])
/// );
/// assert!(Literal::parse("data/").is_err());
/// ```
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    None,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    List(Vec<Literal>),
    Dict(Vec<(Literal, Literal)>),
}

impl Literal {
    /// Parse a complete string as a single literal
    pub fn parse(text: &str) -> Result<Literal, String> {
        let mut parser = Parser::new(text);
        parser.skip_whitespace();
        let literal = parser.value()?;
        parser.skip_whitespace();

        if !parser.done() {
            return Err(format!(
                "Unexpected trailing input at position {}",
                parser.pos
            ));
        }

        Ok(literal)
    }

    /// Name of the literal type as it would appear in Python
    pub fn type_name(&self) -> &'static str {
        match self {
            Literal::None => "NoneType",
            Literal::Bool(_) => "bool",
            Literal::Int(_) => "int",
            Literal::Float(_) => "float",
            Literal::Str(_) => "str",
            Literal::List(_) => "list",
            Literal::Dict(_) => "dict",
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Literal::Str(s) => Some(s.as_str()),
            _ => None,
        }
    }

    /// Convert into a JSON value so typed schemas can be deserialized with serde
    pub fn to_json(&self) -> Value {
        match self {
            Literal::None => Value::Null,
            Literal::Bool(b) => Value::Bool(*b),
            Literal::Int(i) => Value::Number(Number::from(*i)),
            Literal::Float(f) => Number::from_f64(*f).map_or(Value::Null, Value::Number),
            Literal::Str(s) => Value::String(s.clone()),
            Literal::List(items) => Value::Array(items.iter().map(Literal::to_json).collect()),
            Literal::Dict(entries) => {
                let mut map = Map::with_capacity(entries.len());
                for (key, value) in entries {
                    let key = match key {
                        Literal::Str(s) => s.clone(),
                        other => other.to_string(),
                    };
                    map.insert(key, value.to_json());
                }
                Value::Object(map)
            }
        }
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Literal::None => write!(f, "None"),
            Literal::Bool(true) => write!(f, "True"),
            Literal::Bool(false) => write!(f, "False"),
            Literal::Int(i) => write!(f, "{}", i),
            Literal::Float(x) if x.fract() == 0.0 && x.is_finite() => write!(f, "{:.1}", x),
            Literal::Float(x) => write!(f, "{}", x),
            Literal::Str(s) => write!(f, "'{}'", s.replace('\\', "\\\\").replace('\'', "\\'")),
            Literal::List(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                write!(f, "]")
            }
            Literal::Dict(entries) => {
                write!(f, "{{")?;
                for (i, (key, value)) in entries.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}: {}", key, value)?;
                }
                write!(f, "}}")
            }
        }
    }
}

struct Parser {
    chars: Vec<char>,
    pos: usize,
}

impl Parser {
    fn new(text: &str) -> Self {
        Parser {
            chars: text.chars().collect(),
            pos: 0,
        }
    }

    fn done(&self) -> bool {
        self.pos >= self.chars.len()
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek();
        if c.is_some() {
            self.pos += 1;
        }
        c
    }

    fn skip_whitespace(&mut self) {
        while self.peek().is_some_and(char::is_whitespace) {
            self.pos += 1;
        }
    }

    fn expect(&mut self, expected: char) -> Result<(), String> {
        match self.bump() {
            Some(c) if c == expected => Ok(()),
            Some(c) => Err(format!(
                "Expected '{}' but found '{}' at position {}",
                expected,
                c,
                self.pos - 1
            )),
            None => Err(format!("Expected '{}' but reached end of input", expected)),
        }
    }

    fn value(&mut self) -> Result<Literal, String> {
        match self.peek() {
            None => Err("Empty value".to_string()),
            Some('\'') | Some('"') => self.string().map(Literal::Str),
            Some('[') => {
                self.bump();
                self.sequence(']').map(|(items, _)| Literal::List(items))
            }
            Some('(') => {
                self.bump();
                let (mut items, trailing_comma) = self.sequence(')')?;
                // A parenthesized single value without a comma is not a tuple
                if items.len() == 1 && !trailing_comma {
                    return Ok(items.remove(0));
                }
                Ok(Literal::List(items))
            }
            Some('{') => {
                self.bump();
                self.braces()
            }
            Some(c) if c == '-' || c == '+' || c == '.' || c.is_ascii_digit() => self.number(),
            Some(c) if c.is_alphabetic() || c == '_' => self.name(),
            Some(c) => Err(format!("Unexpected '{}' at position {}", c, self.pos)),
        }
    }

    fn string(&mut self) -> Result<String, String> {
        let start = self.pos;
        let quote = self.bump().ok_or("Unterminated string")?;
        let mut out = String::new();

        loop {
            match self.bump() {
                None => return Err(format!("Unterminated string starting at position {}", start)),
                Some(c) if c == quote => break,
                Some('\\') => match self.bump() {
                    Some('n') => out.push('\n'),
                    Some('t') => out.push('\t'),
                    Some('r') => out.push('\r'),
                    Some('0') => out.push('\0'),
                    Some('\\') => out.push('\\'),
                    Some('\'') => out.push('\''),
                    Some('"') => out.push('"'),
                    // Unknown escapes are kept verbatim, as in Python
                    Some(other) => {
                        out.push('\\');
                        out.push(other);
                    }
                    None => return Err("Unterminated escape sequence".to_string()),
                },
                Some(c) => out.push(c),
            }
        }

        // Adjacent string literals are concatenated
        let checkpoint = self.pos;
        self.skip_whitespace();
        if matches!(self.peek(), Some('\'') | Some('"')) {
            out.push_str(&self.string()?);
        } else {
            self.pos = checkpoint;
        }

        Ok(out)
    }

    fn sequence(&mut self, close: char) -> Result<(Vec<Literal>, bool), String> {
        let mut items = Vec::new();
        let mut trailing_comma = false;

        loop {
            self.skip_whitespace();
            if self.peek() == Some(close) {
                self.bump();
                return Ok((items, trailing_comma));
            }

            items.push(self.value()?);
            trailing_comma = false;
            self.skip_whitespace();

            match self.peek() {
                Some(',') => {
                    self.bump();
                    trailing_comma = true;
                }
                Some(c) if c == close => {}
                Some(c) => {
                    return Err(format!(
                        "Expected ',' or '{}' but found '{}' at position {}",
                        close, c, self.pos
                    ));
                }
                None => return Err(format!("Expected '{}' but reached end of input", close)),
            }
        }
    }

    fn braces(&mut self) -> Result<Literal, String> {
        self.skip_whitespace();
        if self.peek() == Some('}') {
            self.bump();
            return Ok(Literal::Dict(Vec::new()));
        }

        let first = self.value()?;
        self.skip_whitespace();

        if self.peek() != Some(':') {
            // Set literal
            let mut items = vec![first];
            match self.peek() {
                Some(',') => {
                    self.bump();
                    let (rest, _) = self.sequence('}')?;
                    items.extend(rest);
                }
                _ => self.expect('}')?,
            }
            return Ok(Literal::List(items));
        }

        let mut entries = Vec::new();
        let mut key = first;

        loop {
            self.expect(':')?;
            self.skip_whitespace();
            let value = self.value()?;
            entries.push((key, value));
            self.skip_whitespace();

            match self.bump() {
                Some('}') => return Ok(Literal::Dict(entries)),
                Some(',') => {
                    self.skip_whitespace();
                    if self.peek() == Some('}') {
                        self.bump();
                        return Ok(Literal::Dict(entries));
                    }
                    key = self.value()?;
                    self.skip_whitespace();
                }
                Some(c) => {
                    return Err(format!(
                        "Expected ',' or '}}' but found '{}' at position {}",
                        c,
                        self.pos - 1
                    ));
                }
                None => return Err("Expected '}' but reached end of input".to_string()),
            }
        }
    }

    fn number(&mut self) -> Result<Literal, String> {
        let start = self.pos;
        let mut negative = false;

        if let Some(sign) = self.peek().filter(|c| *c == '-' || *c == '+') {
            negative = sign == '-';
            self.bump();
            self.skip_whitespace();
        }

        let body_start = self.pos;
        while self
            .peek()
            .is_some_and(|c| c.is_ascii_alphanumeric() || c == '.' || c == '_')
        {
            // Exponent signs belong to the number (e.g. 1e-3)
            let c = self.bump();
            if matches!(c, Some('e') | Some('E'))
                && matches!(self.peek(), Some('-') | Some('+'))
                && !self.chars[body_start..self.pos].starts_with(&['0', 'x'])
            {
                self.bump();
            }
        }

        let body: String = self.chars[body_start..self.pos]
            .iter()
            .filter(|c| **c != '_')
            .collect();

        if body.is_empty() {
            return Err(format!("Malformed number at position {}", start));
        }

        let lower = body.to_lowercase();
        let radix = if lower.starts_with("0x") {
            Some(16)
        } else if lower.starts_with("0o") {
            Some(8)
        } else if lower.starts_with("0b") {
            Some(2)
        } else {
            None
        };

        if let Some(radix) = radix {
            let magnitude = i128::from_str_radix(&lower[2..], radix)
                .map_err(|_| format!("Malformed integer '{}' at position {}", body, start))?;
            return signed_int(magnitude, negative, &body);
        }

        if lower.chars().all(|c| c.is_ascii_digit()) {
            // Python rejects leading zeros on non-zero decimal integers
            if lower.len() > 1 && lower.starts_with('0') && lower.chars().any(|c| c != '0') {
                return Err(format!(
                    "Leading zeros are not permitted in '{}' at position {}",
                    body, start
                ));
            }

            let magnitude: i128 = lower
                .parse()
                .map_err(|_| format!("Integer '{}' is out of range", body))?;
            return signed_int(magnitude, negative, &body);
        }

        let valid_float = lower
            .chars()
            .all(|c| c.is_ascii_digit() || c == '.' || c == 'e' || c == '-' || c == '+')
            && lower.chars().any(|c| c.is_ascii_digit());

        if valid_float {
            if let Ok(value) = lower.parse::<f64>() {
                return Ok(Literal::Float(if negative { -value } else { value }));
            }
        }

        Err(format!("Malformed number '{}' at position {}", body, start))
    }

    fn name(&mut self) -> Result<Literal, String> {
        let start = self.pos;
        while self
            .peek()
            .is_some_and(|c| c.is_alphanumeric() || c == '_')
        {
            self.bump();
        }

        let name: String = self.chars[start..self.pos].iter().collect();

        match name.as_str() {
            "True" => Ok(Literal::Bool(true)),
            "False" => Ok(Literal::Bool(false)),
            "None" => Ok(Literal::None),
            _ => Err(format!(
                "Malformed node '{}' at position {} (strings must be quoted)",
                name, start
            )),
        }
    }
}

/// Apply the sign before narrowing so `i64::MIN` stays representable
fn signed_int(magnitude: i128, negative: bool, body: &str) -> Result<Literal, String> {
    let value = if negative { -magnitude } else { magnitude };

    i64::try_from(value)
        .map(Literal::Int)
        .map_err(|_| format!("Integer '{}' is out of range", body))
}
