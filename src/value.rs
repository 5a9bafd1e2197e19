//! Runtime values and the coercion of argument tokens into them

use std::fmt;

use crate::error::{Error, Result};

/// A value living on the stack or in a register
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Integer(i64),
    Float(f64),
    Str(String),
}

impl Value {
    /// Turn a raw token into a value. Rules are tried in order:
    ///
    /// 1. `0x` prefix: hexadecimal integer
    /// 2. contains `.`: float
    /// 3. decimal digits with an optional leading `-`: integer
    /// 4. anything else is kept as a string
    pub fn coerce(token: &str) -> Result<Value> {
        if let Some(digits) = token.strip_prefix("0x") {
            if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
                return Err(parse_error(token, "invalid hexadecimal digits"));
            }
            return i64::from_str_radix(digits, 16)
                .map(Value::Integer)
                .map_err(|e| parse_error(token, e));
        }

        if token.contains('.') {
            return token
                .parse::<f64>()
                .map(Value::Float)
                .map_err(|e| parse_error(token, e));
        }

        let digits = token.strip_prefix('-').unwrap_or(token);
        if !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()) {
            return token
                .parse::<i64>()
                .map(Value::Integer)
                .map_err(|e| parse_error(token, e));
        }

        Ok(Value::Str(token.to_string()))
    }

    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Integer(n) => *n != 0,
            Value::Float(x) => *x != 0.0,
            Value::Str(s) => !s.is_empty(),
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Integer(n) => Some(*n as f64),
            Value::Float(x) => Some(*x),
            Value::Str(_) => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Integer(n) => Some(*n),
            _ => None,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Value::Integer(_) => "integer",
            Value::Float(_) => "float",
            Value::Str(_) => "string",
        }
    }
}

fn parse_error(token: &str, err: impl fmt::Display) -> Error {
    Error::Parse {
        token: token.to_string(),
        reason: err.to_string(),
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Integer(n) => write!(f, "{}", n),
            // A finite float always carries a '.' so that it coerces back to a float
            Value::Float(x) if x.is_finite() && x.fract() == 0.0 => write!(f, "{:.1}", x),
            Value::Float(x) => write!(f, "{}", x),
            Value::Str(s) => f.write_str(s),
        }
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Integer(n)
    }
}

impl From<f64> for Value {
    fn from(x: f64) -> Self {
        Value::Float(x)
    }
}
