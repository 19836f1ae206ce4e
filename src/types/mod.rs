mod config;
mod error;
mod handler;
mod node;
mod registry;
mod resolved;
mod value;
mod value_type;

pub use config::{Condition, RuleConfig, UnknownCondition};
pub use error::{Attribute, ConversionError, RegistryError, ValidationError};
pub use handler::{FieldDef, FieldHandler};
pub use node::RuleNode;
pub use registry::{FieldScope, Registry, RegistryBuilder};
pub use resolved::ResolvedField;
pub use value::Value;
pub use value_type::{ArgKind, ArgumentSpec, Choice, Operation, ValueType};
