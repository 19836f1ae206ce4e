use std::fmt;

use chrono::NaiveDate;

use super::error::ConversionError;
use super::value::Value;

/// The kind of value an argument slot accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArgKind {
    String,
    Integer,
    Float,
    Boolean,
    Date,
}

impl ArgKind {
    /// Whether a stored value belongs to this kind.
    #[must_use]
    pub fn accepts(self, value: &Value) -> bool {
        matches!(
            (self, value),
            (ArgKind::String, Value::String(_))
                | (ArgKind::Integer, Value::Int(_))
                | (ArgKind::Float, Value::Float(_))
                | (ArgKind::Boolean, Value::Bool(_))
                | (ArgKind::Date, Value::Date(_))
        )
    }

    fn parse(self, raw: &str) -> Result<Value, ConversionError> {
        let malformed = || ConversionError::Malformed {
            raw: raw.to_owned(),
            kind: self,
        };
        let text = raw.trim();
        match self {
            ArgKind::String => Ok(Value::String(raw.to_owned())),
            ArgKind::Integer => text.parse().map(Value::Int).map_err(|_| malformed()),
            ArgKind::Float => text
                .parse::<f64>()
                .ok()
                .filter(|v| v.is_finite())
                .map(Value::Float)
                .ok_or_else(malformed),
            ArgKind::Boolean => match text.to_ascii_lowercase().as_str() {
                "true" | "yes" | "1" | "on" => Ok(Value::Bool(true)),
                "false" | "no" | "0" | "off" => Ok(Value::Bool(false)),
                _ => Err(malformed()),
            },
            ArgKind::Date => NaiveDate::parse_from_str(text, "%Y-%m-%d")
                .or_else(|_| NaiveDate::parse_from_str(text, "%m/%d/%Y"))
                .map(Value::Date)
                .map_err(|_| malformed()),
        }
    }
}

impl fmt::Display for ArgKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ArgKind::String => "string",
            ArgKind::Integer => "integer",
            ArgKind::Float => "float",
            ArgKind::Boolean => "boolean",
            ArgKind::Date => "date",
        };
        f.write_str(name)
    }
}

/// One entry of an enumerated argument's choice list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Choice {
    pub label: String,
    pub key: String,
}

/// Describes one positional argument of an [`Operation`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArgumentSpec {
    pub name: String,
    pub kind: ArgKind,
    /// When non-empty, raw input must name one of these choices.
    pub choices: Vec<Choice>,
}

impl ArgumentSpec {
    #[must_use]
    pub fn new(name: &str, kind: ArgKind) -> Self {
        Self {
            name: name.to_owned(),
            kind,
            choices: Vec::new(),
        }
    }

    /// Convert raw form input into a value of this slot's kind.
    ///
    /// With a choice list the input may be a choice key (exact match) or a
    /// choice label (case-insensitive); the choice key is what gets converted.
    ///
    /// # Errors
    ///
    /// Returns [`ConversionError`] if the input names no choice or does not
    /// parse as the slot's kind.
    pub fn convert(&self, raw: &str) -> Result<Value, ConversionError> {
        if self.choices.is_empty() {
            return self.kind.parse(raw);
        }
        let choice = self
            .choices
            .iter()
            .find(|c| c.key == raw)
            .or_else(|| {
                self.choices
                    .iter()
                    .find(|c| c.label.eq_ignore_ascii_case(raw.trim()))
            })
            .ok_or_else(|| ConversionError::NotAChoice {
                raw: raw.to_owned(),
            })?;
        self.kind.parse(&choice.key)
    }
}

/// A named predicate test with its ordered argument slots.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Operation {
    pub key: String,
    pub name: String,
    pub arguments: Vec<ArgumentSpec>,
}

impl Operation {
    /// Append a plain argument slot.
    #[must_use]
    pub fn argument(mut self, name: &str, kind: ArgKind) -> Self {
        self.arguments.push(ArgumentSpec::new(name, kind));
        self
    }

    /// Append an argument slot restricted to `(label, key)` choices.
    #[must_use]
    pub fn choice_argument(mut self, name: &str, kind: ArgKind, choices: &[(&str, &str)]) -> Self {
        let mut spec = ArgumentSpec::new(name, kind);
        spec.choices = choices
            .iter()
            .map(|(label, key)| Choice {
                label: (*label).to_owned(),
                key: (*key).to_owned(),
            })
            .collect();
        self.arguments.push(spec);
        self
    }
}

/// Descriptor of a field value type and the operations it supports.
///
/// Operations keep their declaration order. Option lists present them sorted
/// by display name, and the first of that listing is the fallback used when
/// a rule names an operation the type does not support.
///
/// # Example
///
/// ```
/// use segrule::{ArgKind, ValueType};
///
/// let number = ValueType::new("number", "Number")
///     .operation("equals", "Equals", |op| op.argument("value", ArgKind::Integer))
///     .operation("between", "Between", |op| {
///         op.argument("min", ArgKind::Integer).argument("max", ArgKind::Integer)
///     });
///
/// assert_eq!(number.first_operation().unwrap().key, "between");
/// assert_eq!(number.argument_specs("between").len(), 2);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValueType {
    pub key: String,
    pub name: String,
    pub(crate) operations: Vec<Operation>,
}

impl ValueType {
    #[must_use]
    pub fn new(key: &str, name: &str) -> Self {
        Self {
            key: key.to_owned(),
            name: name.to_owned(),
            operations: Vec::new(),
        }
    }

    /// Declare an operation. The closure adds its argument slots.
    #[must_use]
    pub fn operation(
        mut self,
        key: &str,
        name: &str,
        f: impl FnOnce(Operation) -> Operation,
    ) -> Self {
        let op = f(Operation {
            key: key.to_owned(),
            name: name.to_owned(),
            arguments: Vec::new(),
        });
        self.operations.push(op);
        self
    }

    /// All operations in declaration order.
    #[must_use]
    pub fn operations(&self) -> &[Operation] {
        &self.operations
    }

    #[must_use]
    pub fn get_operation(&self, key: &str) -> Option<&Operation> {
        self.operations.iter().find(|op| op.key == key)
    }

    /// Operations sorted by display name; ties keep declaration order.
    #[must_use]
    pub fn operations_by_name(&self) -> Vec<&Operation> {
        let mut ops: Vec<&Operation> = self.operations.iter().collect();
        ops.sort_by(|a, b| a.name.cmp(&b.name));
        ops
    }

    /// The first operation by display name.
    #[must_use]
    pub fn first_operation(&self) -> Option<&Operation> {
        self.operations.iter().min_by(|a, b| a.name.cmp(&b.name))
    }

    /// Argument slots of `operation`, or an empty slice if it is not declared.
    #[must_use]
    pub fn argument_specs(&self, operation: &str) -> &[ArgumentSpec] {
        self.get_operation(operation)
            .map(|op| op.arguments.as_slice())
            .unwrap_or(&[])
    }
}
