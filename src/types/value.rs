use std::fmt;

use chrono::NaiveDate;

/// A converted argument value stored on a rule node.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Value {
    /// A 64-bit signed integer.
    Int(i64),
    /// A 64-bit floating-point number.
    Float(f64),
    /// A boolean value.
    Bool(bool),
    /// A UTF-8 string.
    String(String),
    /// A calendar date without timezone.
    Date(NaiveDate),
}

impl Value {
    /// Whether a string can be written into an expression without quoting.
    ///
    /// Bare strings never contain the expression's structural characters
    /// (`.`, `+`, `,`, parentheses, quotes, whitespace).
    fn is_bare(s: &str) -> bool {
        !s.is_empty()
            && s.chars()
                .all(|c| c.is_alphanumeric() || matches!(c, '_' | '-' | '/' | '@' | ':'))
    }
}

/// Write a float without a decimal point, so `.` stays reserved for `and`
/// links: `1.5` becomes `15e-1`, `0.0001` becomes `1e-4`, whole numbers are
/// written as integers.
fn write_float(f: &mut fmt::Formatter<'_>, v: f64) -> fmt::Result {
    if !v.is_finite() {
        return write!(f, "{v}");
    }
    let text = v.to_string();
    let Some((whole, fraction)) = text.split_once('.') else {
        return f.write_str(&text);
    };
    let (sign, whole) = match whole.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", whole),
    };
    let digits = format!("{whole}{fraction}");
    write!(
        f,
        "{sign}{}e-{}",
        digits.trim_start_matches('0'),
        fraction.len()
    )
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(v.to_owned())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::String(v)
    }
}

impl From<NaiveDate> for Value {
    fn from(v: NaiveDate) -> Self {
        Value::Date(v)
    }
}

/// Renders the value as it appears inside a compiled predicate's argument list.
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Int(v) => write!(f, "{v}"),
            Value::Float(v) => write_float(f, *v),
            Value::Bool(v) => write!(f, "{v}"),
            Value::Date(v) => write!(f, "{}", v.format("%Y-%m-%d")),
            Value::String(v) if Value::is_bare(v) => f.write_str(v),
            Value::String(v) => {
                f.write_str("\"")?;
                for ch in v.chars() {
                    match ch {
                        '"' => f.write_str("\\\"")?,
                        '\\' => f.write_str("\\\\")?,
                        '\n' => f.write_str("\\n")?,
                        '\t' => f.write_str("\\t")?,
                        '\r' => f.write_str("\\r")?,
                        // connector characters
                        '.' => f.write_str("\\x2e")?,
                        '+' => f.write_str("\\x2b")?,
                        c => write!(f, "{c}")?,
                    }
                }
                f.write_str("\"")
            }
        }
    }
}
