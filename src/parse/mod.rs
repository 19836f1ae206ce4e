mod error;
mod grammar;

pub use error::ParseError;

use crate::RuleConfig;

/// Parse a compiled expression back into a nested [`RuleConfig`].
///
/// Arguments come back as raw text; building the config against the same
/// registry converts them again. Trailing line breaks are ignored.
///
/// # Errors
///
/// Returns [`ParseError`] if the input is not a well-formed expression.
pub fn parse(input: &str) -> Result<RuleConfig, ParseError> {
    use winnow::Parser;
    grammar::rule
        .parse(input.trim_end_matches(['\r', '\n']))
        .map_err(|e| ParseError::new(e.to_string()))
}
