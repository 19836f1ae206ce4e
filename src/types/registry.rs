use std::collections::{HashMap, HashSet};

use tracing::debug;

use super::error::RegistryError;
use super::handler::{FieldDef, FieldHandler};
use super::resolved::ResolvedField;
use super::value_type::{ArgumentSpec, ValueType};

/// Which handlers a rule node may draw its field from.
///
/// This is the non-owning link from a nested node back to its parent: the
/// child of an `and` node is confined to the parent's handler, every other
/// node sees all handlers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum FieldScope {
    /// Any registered handler.
    #[default]
    Global,
    /// Only the handler with this key.
    Handler(String),
    /// The parent's own field did not resolve, so no handler is available.
    Unresolved,
}

impl FieldScope {
    /// Whether fields of `handler` are selectable in this scope.
    #[must_use]
    pub fn includes(&self, handler: &FieldHandler) -> bool {
        match self {
            FieldScope::Global => true,
            FieldScope::Handler(key) => handler.key == *key,
            FieldScope::Unresolved => false,
        }
    }
}

/// Builder for constructing a [`Registry`].
///
/// # Example
///
/// ```
/// use segrule::{ArgKind, FieldHandler, RegistryBuilder, ValueType};
///
/// let registry = RegistryBuilder::new()
///     .value_type(
///         ValueType::new("string", "String")
///             .operation("equals", "Equals", |op| op.argument("value", ArgKind::String)),
///     )
///     .handler(FieldHandler::new("visitor", "Visitor").field("country", "Country", "string"))
///     .build()
///     .unwrap();
///
/// assert_eq!(registry.fields("visitor").len(), 1);
/// ```
#[derive(Debug, Default)]
pub struct RegistryBuilder {
    value_types: Vec<ValueType>,
    handlers: Vec<FieldHandler>,
}

impl RegistryBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn value_type(mut self, value_type: ValueType) -> Self {
        self.value_types.push(value_type);
        self
    }

    /// Register a handler. Handlers are searched in registration order when a
    /// field key is shared by more than one of them.
    #[must_use]
    pub fn handler(mut self, handler: FieldHandler) -> Self {
        self.handlers.push(handler);
        self
    }

    /// Validate the catalog and freeze it into a `Registry`.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError`] on duplicate keys, field or operation keys
    /// that are not identifiers, value types without operations, or fields
    /// bound to undeclared value types.
    pub fn build(self) -> Result<Registry, RegistryError> {
        check_value_types(&self.value_types)?;
        check_handlers(&self.handlers, &self.value_types)?;
        Ok(self.assemble())
    }

    pub(crate) fn assemble(self) -> Registry {
        let mut value_type_indices = HashMap::new();
        for (idx, vt) in self.value_types.iter().enumerate() {
            value_type_indices.entry(vt.key.clone()).or_insert(idx);
        }

        let mut owners: HashMap<&str, &str> = HashMap::new();
        for handler in &self.handlers {
            for field in &handler.fields {
                if let Some(first) = owners.get(field.key.as_str()) {
                    debug!(
                        field = %field.key,
                        handler = %handler.key,
                        owner = %first,
                        "field key shared across handlers; first registered handler wins"
                    );
                } else {
                    owners.insert(&field.key, &handler.key);
                }
            }
        }

        Registry {
            value_types: self.value_types,
            handlers: self.handlers,
            value_type_indices,
        }
    }
}

/// Field and operation keys appear verbatim in compiled expressions, so they
/// must read back as identifiers.
fn is_identifier(key: &str) -> bool {
    let mut chars = key.chars();
    chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

fn check_key(kind: &'static str, key: &str) -> Result<(), RegistryError> {
    if is_identifier(key) {
        Ok(())
    } else {
        Err(RegistryError::InvalidKey {
            kind,
            key: key.to_owned(),
        })
    }
}

fn check_value_types(value_types: &[ValueType]) -> Result<(), RegistryError> {
    let mut seen = HashSet::new();
    for vt in value_types {
        if !seen.insert(vt.key.as_str()) {
            return Err(RegistryError::DuplicateValueType {
                key: vt.key.clone(),
            });
        }
        if vt.operations.is_empty() {
            return Err(RegistryError::NoOperations {
                key: vt.key.clone(),
            });
        }
        let mut ops = HashSet::new();
        for op in &vt.operations {
            check_key("operation", &op.key)?;
            if !ops.insert(op.key.as_str()) {
                return Err(RegistryError::DuplicateOperation {
                    value_type: vt.key.clone(),
                    operation: op.key.clone(),
                });
            }
        }
    }
    Ok(())
}

fn check_handlers(handlers: &[FieldHandler], value_types: &[ValueType]) -> Result<(), RegistryError> {
    let known: HashSet<&str> = value_types.iter().map(|vt| vt.key.as_str()).collect();
    let mut seen = HashSet::new();
    for handler in handlers {
        if !seen.insert(handler.key.as_str()) {
            return Err(RegistryError::DuplicateHandler {
                key: handler.key.clone(),
            });
        }
        let mut fields = HashSet::new();
        for field in &handler.fields {
            check_key("field", &field.key)?;
            if !fields.insert(field.key.as_str()) {
                return Err(RegistryError::DuplicateField {
                    handler: handler.key.clone(),
                    field: field.key.clone(),
                });
            }
            if !known.contains(field.value_type.as_str()) {
                return Err(RegistryError::UndefinedValueType {
                    handler: handler.key.clone(),
                    field: field.key.clone(),
                    value_type: field.value_type.clone(),
                });
            }
        }
    }
    Ok(())
}

/// Immutable catalog of value types and field handlers.
///
/// Read-only after construction and safe to share across threads; see
/// [`Registry::builtin()`] for the stock catalog.
#[derive(Debug)]
pub struct Registry {
    value_types: Vec<ValueType>,
    handlers: Vec<FieldHandler>,
    value_type_indices: HashMap<String, usize>,
}

impl Registry {
    #[must_use]
    pub fn value_type(&self, key: &str) -> Option<&ValueType> {
        self.value_type_indices
            .get(key)
            .map(|&idx| &self.value_types[idx])
    }

    #[must_use]
    pub fn value_types(&self) -> &[ValueType] {
        &self.value_types
    }

    #[must_use]
    pub fn handler(&self, key: &str) -> Option<&FieldHandler> {
        self.handlers.iter().find(|h| h.key == key)
    }

    /// Handlers in registration order.
    #[must_use]
    pub fn handlers(&self) -> &[FieldHandler] {
        &self.handlers
    }

    /// `(key, name)` of every operation of `value_type`, in declaration order.
    #[must_use]
    pub fn operations(&self, value_type: &str) -> Vec<(&str, &str)> {
        self.value_type(value_type)
            .map(|vt| {
                vt.operations
                    .iter()
                    .map(|op| (op.key.as_str(), op.name.as_str()))
                    .collect()
            })
            .unwrap_or_default()
    }

    #[must_use]
    pub fn argument_specs(&self, value_type: &str, operation: &str) -> &[ArgumentSpec] {
        self.value_type(value_type)
            .map(|vt| vt.argument_specs(operation))
            .unwrap_or(&[])
    }

    #[must_use]
    pub fn fields(&self, handler: &str) -> &[FieldDef] {
        self.handler(handler).map(FieldHandler::fields).unwrap_or(&[])
    }

    /// Find the handler owning `field_key` within `scope`, together with the
    /// field definition and its value type. The first registered handler wins
    /// when several declare the same key.
    #[must_use]
    pub fn lookup_field(
        &self,
        scope: &FieldScope,
        field_key: &str,
    ) -> Option<(&FieldHandler, &FieldDef, &ValueType)> {
        self.handlers
            .iter()
            .filter(|h| scope.includes(h))
            .find_map(|handler| {
                let field = handler.get_field(field_key)?;
                let value_type = self.value_type(&field.value_type)?;
                Some((handler, field, value_type))
            })
    }

    /// `(label, key)` pairs for every field selectable within `scope`, sorted
    /// by label with duplicate keys collapsed to their first occurrence.
    #[must_use]
    pub fn field_options(&self, scope: &FieldScope) -> Vec<(String, String)> {
        let mut seen = HashSet::new();
        let mut options: Vec<(String, String)> = self
            .handlers
            .iter()
            .filter(|h| scope.includes(h))
            .flat_map(|h| h.fields.iter())
            .filter(|f| seen.insert(f.key.as_str()))
            .map(|f| (f.name.clone(), f.key.clone()))
            .collect();
        options.sort_by(|a, b| a.0.cmp(&b.0));
        options
    }

    /// Resolve a field and operation without arguments.
    ///
    /// An absent or unsupported `operation_key` is replaced with the value
    /// type's first operation. Returns `None` only if the field does not
    /// resolve within `scope`.
    #[must_use]
    pub fn resolve_field(
        &self,
        scope: &FieldScope,
        field_key: &str,
        operation_key: Option<&str>,
    ) -> Option<ResolvedField<'_>> {
        let (handler, field, value_type) = self.lookup_field(scope, field_key)?;
        let operation = match operation_key.and_then(|key| value_type.get_operation(key)) {
            Some(op) => op,
            None => {
                let op = value_type.first_operation()?;
                if let Some(requested) = operation_key {
                    debug!(
                        field = field_key,
                        requested,
                        substituted = %op.key,
                        "operation not supported by field type; using first operation"
                    );
                }
                op
            }
        };
        Some(ResolvedField::new(handler, field, value_type, operation))
    }

    /// Resolve a field, operation and raw arguments in one step.
    ///
    /// Arguments are converted slot by slot; a slot that fails conversion is
    /// left unset without affecting the others, and positions past the
    /// operation's declared slots are ignored.
    #[must_use]
    pub fn resolve(
        &self,
        scope: &FieldScope,
        field_key: &str,
        operation_key: Option<&str>,
        raw_arguments: &[Option<&str>],
    ) -> Option<ResolvedField<'_>> {
        let mut resolved = self.resolve_field(scope, field_key, operation_key)?;
        for (idx, raw) in raw_arguments.iter().enumerate() {
            if let Some(raw) = raw {
                resolved.convert_argument(idx, raw);
            }
        }
        Some(resolved)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ArgKind, Value};

    fn registry() -> Registry {
        RegistryBuilder::new()
            .value_type(
                ValueType::new("string", "String")
                    .operation("equals", "Equals", |op| op.argument("value", ArgKind::String))
                    .operation("contains", "Contains", |op| {
                        op.argument("value", ArgKind::String)
                    }),
            )
            .value_type(
                ValueType::new("integer", "Integer")
                    .operation("greater_than", "Greater Than", |op| {
                        op.argument("value", ArgKind::Integer)
                    })
                    .operation("between", "Between", |op| {
                        op.argument("min", ArgKind::Integer)
                            .argument("max", ArgKind::Integer)
                    }),
            )
            .handler(
                FieldHandler::new("visitor", "Visitor")
                    .field("country", "Country", "string")
                    .field("visits", "Visits", "integer"),
            )
            .handler(
                FieldHandler::new("session", "Session")
                    .field("browser", "Browser", "string")
                    .field("country", "Session Country", "string"),
            )
            .build()
            .unwrap()
    }

    #[test]
    fn duplicate_value_type_rejected() {
        let err = RegistryBuilder::new()
            .value_type(ValueType::new("s", "S").operation("eq", "Eq", |op| op))
            .value_type(ValueType::new("s", "S").operation("eq", "Eq", |op| op))
            .build()
            .unwrap_err();
        assert_eq!(err, RegistryError::DuplicateValueType { key: "s".into() });
    }

    #[test]
    fn value_type_without_operations_rejected() {
        let err = RegistryBuilder::new()
            .value_type(ValueType::new("empty", "Empty"))
            .build()
            .unwrap_err();
        assert_eq!(err, RegistryError::NoOperations { key: "empty".into() });
    }

    #[test]
    fn duplicate_operation_rejected() {
        let err = RegistryBuilder::new()
            .value_type(
                ValueType::new("s", "S")
                    .operation("eq", "Eq", |op| op)
                    .operation("eq", "Equal", |op| op),
            )
            .build()
            .unwrap_err();
        assert!(matches!(err, RegistryError::DuplicateOperation { .. }));
    }

    #[test]
    fn undefined_value_type_rejected() {
        let err = RegistryBuilder::new()
            .handler(FieldHandler::new("visitor", "Visitor").field("age", "Age", "integer"))
            .build()
            .unwrap_err();
        assert!(matches!(err, RegistryError::UndefinedValueType { .. }));
    }

    #[test]
    fn duplicate_handler_and_field_rejected() {
        let vt = || ValueType::new("s", "S").operation("eq", "Eq", |op| op);
        let err = RegistryBuilder::new()
            .value_type(vt())
            .handler(FieldHandler::new("h", "H"))
            .handler(FieldHandler::new("h", "H"))
            .build()
            .unwrap_err();
        assert_eq!(err, RegistryError::DuplicateHandler { key: "h".into() });

        let err = RegistryBuilder::new()
            .value_type(vt())
            .handler(FieldHandler::new("h", "H").field("f", "F", "s").field("f", "F", "s"))
            .build()
            .unwrap_err();
        assert!(matches!(err, RegistryError::DuplicateField { .. }));
    }

    #[test]
    fn field_keys_must_be_identifiers() {
        for key in ["page-views", "a.b", "utm:source", "2fa", "", "with space"] {
            let err = RegistryBuilder::new()
                .value_type(ValueType::new("s", "S").operation("eq", "Eq", |op| op))
                .handler(FieldHandler::new("h", "H").field(key, "F", "s"))
                .build()
                .unwrap_err();
            assert_eq!(
                err,
                RegistryError::InvalidKey {
                    kind: "field",
                    key: key.into()
                },
                "accepted {key:?}"
            );
        }
    }

    #[test]
    fn operation_keys_must_be_identifiers() {
        let err = RegistryBuilder::new()
            .value_type(ValueType::new("s", "S").operation("starts.with", "Starts With", |op| op))
            .build()
            .unwrap_err();
        assert_eq!(
            err,
            RegistryError::InvalidKey {
                kind: "operation",
                key: "starts.with".into()
            }
        );
    }

    #[test]
    fn identifier_keys_accepted() {
        let registry = RegistryBuilder::new()
            .value_type(ValueType::new("s", "S").operation("_eq2", "Eq", |op| op))
            .handler(FieldHandler::new("h", "H").field("utm_source_2", "F", "s"))
            .build()
            .unwrap();
        assert!(registry.lookup_field(&FieldScope::Global, "utm_source_2").is_some());
    }

    #[test]
    fn lookups() {
        let reg = registry();
        assert_eq!(
            reg.operations("integer"),
            vec![("greater_than", "Greater Than"), ("between", "Between")]
        );
        assert_eq!(reg.argument_specs("integer", "between").len(), 2);
        assert!(reg.argument_specs("integer", "contains").is_empty());
        assert!(reg.operations("missing").is_empty());
        assert_eq!(reg.fields("session").len(), 2);
        assert!(reg.fields("missing").is_empty());
    }

    #[test]
    fn shared_field_key_first_handler_wins() {
        let reg = registry();
        let (handler, field, _) = reg.lookup_field(&FieldScope::Global, "country").unwrap();
        assert_eq!(handler.key, "visitor");
        assert_eq!(field.name, "Country");

        let scoped = FieldScope::Handler("session".into());
        let (handler, _, _) = reg.lookup_field(&scoped, "country").unwrap();
        assert_eq!(handler.key, "session");
    }

    #[test]
    fn scoped_lookup_excludes_other_handlers() {
        let reg = registry();
        let scope = FieldScope::Handler("visitor".into());
        assert!(reg.lookup_field(&scope, "browser").is_none());
        assert!(reg.lookup_field(&FieldScope::Unresolved, "country").is_none());
    }

    #[test]
    fn field_options_sorted_and_deduplicated() {
        let reg = registry();
        let options = reg.field_options(&FieldScope::Global);
        assert_eq!(
            options,
            vec![
                ("Browser".to_owned(), "browser".to_owned()),
                ("Country".to_owned(), "country".to_owned()),
                ("Visits".to_owned(), "visits".to_owned()),
            ]
        );
        let scoped = reg.field_options(&FieldScope::Handler("session".into()));
        assert_eq!(scoped.len(), 2);
        assert!(reg.field_options(&FieldScope::Unresolved).is_empty());
    }

    #[test]
    fn resolve_substitutes_unsupported_operation() {
        let reg = registry();
        let resolved = reg
            .resolve_field(&FieldScope::Global, "visits", Some("contains"))
            .unwrap();
        assert_eq!(resolved.operation().key, "between");

        let resolved = reg.resolve_field(&FieldScope::Global, "visits", None).unwrap();
        assert_eq!(resolved.operation().key, "between");

        let resolved = reg
            .resolve_field(&FieldScope::Global, "visits", Some("greater_than"))
            .unwrap();
        assert_eq!(resolved.operation().key, "greater_than");
    }

    #[test]
    fn resolve_unknown_field_is_none() {
        let reg = registry();
        assert!(reg.resolve(&FieldScope::Global, "planet", Some("equals"), &[]).is_none());
    }

    #[test]
    fn resolve_converts_arguments_independently() {
        let reg = registry();
        let resolved = reg
            .resolve(
                &FieldScope::Global,
                "visits",
                Some("between"),
                &[Some("ten"), Some("20"), Some("30")],
            )
            .unwrap();
        assert_eq!(resolved.arguments(), &[None, Some(Value::Int(20))]);
    }
}
