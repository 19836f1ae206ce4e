//! Builds visitor-segmentation rules from nested form input and compiles them
//! into flat match expressions.
//!
//! A [`Registry`] declares the value types (with their operations and typed
//! argument slots) and the handlers whose fields can be tested. A
//! [`RuleNode`] is built from a nested [`RuleConfig`], validated, and compiled
//! with [`RuleNode::to_expr`]:
//!
//! ```
//! use segrule::{Registry, RuleConfig, RuleNode};
//!
//! let mut rule = RuleNode::new(Registry::builtin());
//! rule.build(
//!     &RuleConfig::new()
//!         .field("country")
//!         .operation("equals")
//!         .argument(0, "FR")
//!         .and(
//!             RuleConfig::new()
//!                 .field("city")
//!                 .operation("equals")
//!                 .argument(0, "Paris")
//!                 .with(RuleConfig::new().field("campaign").operation("contains").argument(0, "spring")),
//!         ),
//! );
//!
//! assert!(rule.is_valid());
//! assert_eq!(
//!     rule.to_expr(),
//!     "country:equals(FR).city:equals(Paris)\ncampaign:contains(spring)"
//! );
//! ```
//!
//! Chaining conditions render as `.` (`and`, narrowing within the same
//! handler), ` + ` (`or`) and a line break (`with`).

pub mod builtin;
mod compile;
mod error;
pub mod parse;
mod types;

pub use error::SegruleError;
pub use types::{
    ArgKind, ArgumentSpec, Attribute, Choice, Condition, ConversionError, FieldDef, FieldHandler,
    FieldScope, Operation, Registry, RegistryBuilder, RegistryError, ResolvedField, RuleConfig,
    RuleNode, UnknownCondition, ValidationError, Value, ValueType,
};
