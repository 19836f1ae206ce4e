use std::fmt;

use thiserror::Error;

use super::value_type::ArgKind;

/// Errors raised while assembling a [`Registry`](super::Registry).
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("duplicate value type '{key}'")]
    DuplicateValueType { key: String },

    #[error("duplicate operation '{operation}' in value type '{value_type}'")]
    DuplicateOperation {
        value_type: String,
        operation: String,
    },

    #[error("value type '{key}' declares no operations")]
    NoOperations { key: String },

    #[error("duplicate handler '{key}'")]
    DuplicateHandler { key: String },

    #[error("duplicate field '{field}' in handler '{handler}'")]
    DuplicateField { handler: String, field: String },

    #[error("field '{field}' in handler '{handler}' references undefined value type '{value_type}'")]
    UndefinedValueType {
        handler: String,
        field: String,
        value_type: String,
    },

    #[error("invalid {kind} key '{key}': expected a letter or '_' followed by letters, digits or '_'")]
    InvalidKey { kind: &'static str, key: String },
}

/// A raw argument that could not be converted to its slot's kind.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConversionError {
    #[error("'{raw}' is not a valid {kind}")]
    Malformed { raw: String, kind: ArgKind },

    #[error("'{raw}' is not one of the allowed choices")]
    NotAChoice { raw: String },
}

/// The attribute of a rule node a validation error is attached to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Attribute {
    Field,
    Condition,
}

impl fmt::Display for Attribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Attribute::Field => f.write_str("field"),
            Attribute::Condition => f.write_str("condition"),
        }
    }
}

/// A validation failure reported by [`RuleNode::validate`](super::RuleNode::validate).
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{attribute} {message}")]
pub struct ValidationError {
    pub attribute: Attribute,
    pub message: String,
}

impl ValidationError {
    pub(crate) fn invalid(attribute: Attribute) -> Self {
        Self {
            attribute,
            message: "is invalid".to_owned(),
        }
    }
}
