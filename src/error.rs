use thiserror::Error;

use crate::parse::ParseError;
use crate::{ConversionError, RegistryError};

/// Unified error type covering registry assembly, argument conversion and
/// expression parsing.
///
/// Returned by convenience methods like
/// [`RuleNode::from_expr()`](crate::RuleNode::from_expr).
#[derive(Debug, Error)]
pub enum SegruleError {
    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error(transparent)]
    Conversion(#[from] ConversionError),
}
