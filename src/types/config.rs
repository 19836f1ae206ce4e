use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// How a rule node connects to its child.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Condition {
    /// No child.
    #[default]
    None,
    /// The child narrows this node's field within the same handler.
    And,
    /// The child is an alternative on the same rule line.
    Or,
    /// The child starts an independent rule line.
    With,
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown condition '{0}'")]
pub struct UnknownCondition(pub String);

impl Condition {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Condition::None => "",
            Condition::And => "and",
            Condition::Or => "or",
            Condition::With => "with",
        }
    }

    /// Text placed between this node's predicate and its child's.
    #[must_use]
    pub fn connector(self) -> Option<&'static str> {
        match self {
            Condition::None => None,
            Condition::And => Some("."),
            Condition::Or => Some(" + "),
            Condition::With => Some("\n"),
        }
    }

    #[must_use]
    pub fn is_none(self) -> bool {
        self == Condition::None
    }
}

impl FromStr for Condition {
    type Err = UnknownCondition;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "" => Ok(Condition::None),
            "and" => Ok(Condition::And),
            "or" => Ok(Condition::Or),
            "with" => Ok(Condition::With),
            _ => Err(UnknownCondition(s.to_owned())),
        }
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Nested form input for [`RuleNode::build`](super::RuleNode::build).
///
/// Mirrors the form keys `operator`, `field`, `operation`, `condition`,
/// `argument0..argumentN` and `child`. Values are raw text; conversion happens
/// when the node is built.
///
/// # Example
///
/// ```
/// use segrule::RuleConfig;
///
/// let config = RuleConfig::new()
///     .field("country")
///     .operation("equals")
///     .argument(0, "US")
///     .negate()
///     .or(RuleConfig::new().field("browser").operation("contains").argument(0, "Chrome"));
///
/// assert!(config.is_negated());
/// assert_eq!(config.condition.as_deref(), Some("or"));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(from = "form::FormConfig", into = "form::FormConfigOut")
)]
pub struct RuleConfig {
    pub operator: Option<String>,
    pub field: Option<String>,
    pub operation: Option<String>,
    pub condition: Option<String>,
    pub arguments: BTreeMap<usize, String>,
    pub child: Option<Box<RuleConfig>>,
}

impl RuleConfig {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn field(mut self, key: &str) -> Self {
        self.field = Some(key.to_owned());
        self
    }

    #[must_use]
    pub fn operation(mut self, key: &str) -> Self {
        self.operation = Some(key.to_owned());
        self
    }

    #[must_use]
    pub fn argument(mut self, idx: usize, raw: &str) -> Self {
        self.arguments.insert(idx, raw.to_owned());
        self
    }

    #[must_use]
    pub fn negate(mut self) -> Self {
        self.operator = Some("not".to_owned());
        self
    }

    /// Chain `child` under `condition`. `Condition::None` drops any child.
    #[must_use]
    pub fn chain(mut self, condition: Condition, child: RuleConfig) -> Self {
        if condition.is_none() {
            self.condition = None;
            self.child = None;
        } else {
            self.condition = Some(condition.as_str().to_owned());
            self.child = Some(Box::new(child));
        }
        self
    }

    #[must_use]
    pub fn and(self, child: RuleConfig) -> Self {
        self.chain(Condition::And, child)
    }

    #[must_use]
    pub fn or(self, child: RuleConfig) -> Self {
        self.chain(Condition::Or, child)
    }

    #[must_use]
    pub fn with(self, child: RuleConfig) -> Self {
        self.chain(Condition::With, child)
    }

    /// Whether `operator` asks for negation.
    #[must_use]
    pub fn is_negated(&self) -> bool {
        self.operator
            .as_deref()
            .is_some_and(|op| op.trim().eq_ignore_ascii_case("not"))
    }

    /// The parsed condition; blank means none.
    ///
    /// # Errors
    ///
    /// Returns [`UnknownCondition`] for anything other than blank, `and`,
    /// `or` or `with`.
    pub fn parsed_condition(&self) -> Result<Condition, UnknownCondition> {
        self.condition
            .as_deref()
            .map_or(Ok(Condition::None), str::parse)
    }
}

#[cfg(feature = "serde")]
mod form {
    use std::collections::BTreeMap;

    use serde::{Deserialize, Serialize};

    use super::RuleConfig;

    /// Argument values as they arrive from a form payload.
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawArgument {
        Text(String),
        Int(i64),
        Float(f64),
        Bool(bool),
        Other(serde::de::IgnoredAny),
    }

    impl RawArgument {
        fn into_text(self) -> Option<String> {
            match self {
                RawArgument::Text(s) => Some(s),
                RawArgument::Int(v) => Some(v.to_string()),
                RawArgument::Float(v) => Some(v.to_string()),
                RawArgument::Bool(v) => Some(v.to_string()),
                RawArgument::Other(_) => None,
            }
        }
    }

    #[derive(Deserialize)]
    pub(super) struct FormConfig {
        operator: Option<String>,
        field: Option<String>,
        operation: Option<String>,
        condition: Option<String>,
        child: Option<Box<RuleConfig>>,
        #[serde(flatten)]
        rest: BTreeMap<String, RawArgument>,
    }

    impl From<FormConfig> for RuleConfig {
        fn from(form: FormConfig) -> Self {
            let arguments = form
                .rest
                .into_iter()
                .filter_map(|(key, value)| {
                    let idx = key.strip_prefix("argument")?.parse::<usize>().ok()?;
                    Some((idx, value.into_text()?))
                })
                .collect();
            RuleConfig {
                operator: form.operator,
                field: form.field,
                operation: form.operation,
                condition: form.condition,
                arguments,
                child: form.child,
            }
        }
    }

    #[derive(Serialize)]
    pub(super) struct FormConfigOut {
        #[serde(skip_serializing_if = "Option::is_none")]
        operator: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        field: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        operation: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        condition: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        child: Option<Box<RuleConfig>>,
        #[serde(flatten)]
        arguments: BTreeMap<String, String>,
    }

    impl From<RuleConfig> for FormConfigOut {
        fn from(config: RuleConfig) -> Self {
            FormConfigOut {
                operator: config.operator,
                field: config.field,
                operation: config.operation,
                condition: config.condition,
                child: config.child,
                arguments: config
                    .arguments
                    .into_iter()
                    .map(|(idx, raw)| (format!("argument{idx}"), raw))
                    .collect(),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn condition_from_str() {
        assert_eq!("".parse::<Condition>(), Ok(Condition::None));
        assert_eq!("and".parse::<Condition>(), Ok(Condition::And));
        assert_eq!(" OR ".parse::<Condition>(), Ok(Condition::Or));
        assert_eq!("with".parse::<Condition>(), Ok(Condition::With));
        assert_eq!(
            "xor".parse::<Condition>(),
            Err(UnknownCondition("xor".into()))
        );
    }

    #[test]
    fn condition_connectors() {
        assert_eq!(Condition::None.connector(), None);
        assert_eq!(Condition::And.connector(), Some("."));
        assert_eq!(Condition::Or.connector(), Some(" + "));
        assert_eq!(Condition::With.connector(), Some("\n"));
    }

    #[test]
    fn negation_from_operator() {
        assert!(RuleConfig::new().negate().is_negated());
        let mut config = RuleConfig::new();
        config.operator = Some("NOT".into());
        assert!(config.is_negated());
        config.operator = Some(String::new());
        assert!(!config.is_negated());
        assert!(!RuleConfig::new().is_negated());
    }

    #[test]
    fn chain_none_drops_child() {
        let config = RuleConfig::new()
            .and(RuleConfig::new().field("city"))
            .chain(Condition::None, RuleConfig::new().field("ignored"));
        assert!(config.child.is_none());
        assert_eq!(config.parsed_condition(), Ok(Condition::None));
    }

    #[test]
    fn later_arguments_replace_earlier() {
        let config = RuleConfig::new().argument(0, "a").argument(0, "b");
        assert_eq!(config.arguments.get(&0).map(String::as_str), Some("b"));
    }
}
