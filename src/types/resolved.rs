use std::fmt;

use tracing::debug;

use super::handler::{FieldDef, FieldHandler};
use super::value::Value;
use super::value_type::{ArgumentSpec, Operation, ValueType};

/// A field, its handler, value type and operation resolved against a
/// [`Registry`](super::Registry), plus the converted arguments.
///
/// The operation always belongs to the value type and `arguments` always has
/// exactly one slot per declared [`ArgumentSpec`].
///
/// When the owning rule node narrows into a child with `and`, the child's
/// resolution hangs off this one as its narrowing, so a single value carries
/// the whole dotted path.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedField<'r> {
    handler: &'r FieldHandler,
    field: &'r FieldDef,
    value_type: &'r ValueType,
    operation: &'r Operation,
    arguments: Vec<Option<Value>>,
    narrowing: Option<Box<ResolvedField<'r>>>,
}

impl<'r> ResolvedField<'r> {
    pub(crate) fn new(
        handler: &'r FieldHandler,
        field: &'r FieldDef,
        value_type: &'r ValueType,
        operation: &'r Operation,
    ) -> Self {
        Self {
            handler,
            field,
            value_type,
            operation,
            arguments: vec![None; operation.arguments.len()],
            narrowing: None,
        }
    }

    #[must_use]
    pub fn handler(&self) -> &'r FieldHandler {
        self.handler
    }

    #[must_use]
    pub fn field(&self) -> &'r FieldDef {
        self.field
    }

    #[must_use]
    pub fn value_type(&self) -> &'r ValueType {
        self.value_type
    }

    #[must_use]
    pub fn operation(&self) -> &'r Operation {
        self.operation
    }

    #[must_use]
    pub fn argument_specs(&self) -> &'r [ArgumentSpec] {
        &self.operation.arguments
    }

    #[must_use]
    pub fn arguments(&self) -> &[Option<Value>] {
        &self.arguments
    }

    #[must_use]
    pub fn argument(&self, idx: usize) -> Option<&Value> {
        self.arguments.get(idx)?.as_ref()
    }

    #[must_use]
    pub fn narrowing(&self) -> Option<&ResolvedField<'r>> {
        self.narrowing.as_deref()
    }

    /// Convert `raw` into slot `idx`. Returns whether a value was stored.
    ///
    /// Out-of-range slots are ignored; a failed conversion clears the slot.
    pub(crate) fn convert_argument(&mut self, idx: usize, raw: &str) -> bool {
        let Some(spec) = self.operation.arguments.get(idx) else {
            return false;
        };
        let converted = spec
            .convert(raw)
            .map_err(|err| {
                debug!(field = %self.field.key, slot = idx, %err, "argument left unset");
            })
            .ok();
        let stored = converted.is_some();
        self.arguments[idx] = converted;
        stored
    }

    /// Replace the argument slots, dropping values whose kind no longer
    /// matches the slot.
    pub(crate) fn set_arguments(&mut self, values: &[Option<Value>]) {
        for (idx, spec) in self.operation.arguments.iter().enumerate() {
            self.arguments[idx] = values
                .get(idx)
                .cloned()
                .flatten()
                .filter(|v| spec.kind.accepts(v));
        }
    }

    pub(crate) fn set_narrowing(&mut self, narrowing: Option<ResolvedField<'r>>) {
        self.narrowing = narrowing.map(Box::new);
    }

    /// Write `<field>:<operation>(<args>)` without any narrowing.
    pub fn write_predicate(&self, out: &mut impl fmt::Write) -> fmt::Result {
        write!(out, "{}:{}(", self.field.key, self.operation.key)?;
        for (idx, arg) in self.arguments.iter().enumerate() {
            if idx > 0 {
                out.write_str(", ")?;
            }
            if let Some(value) = arg {
                write!(out, "{value}")?;
            }
        }
        out.write_char(')')
    }

    /// The predicate text alone, ignoring any narrowing.
    #[must_use]
    pub fn predicate(&self) -> String {
        let mut out = String::new();
        // Writing into a String cannot fail.
        let _ = self.write_predicate(&mut out);
        out
    }

    /// The predicate followed by its narrowing chain, joined with `.`.
    #[must_use]
    pub fn to_expr(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for ResolvedField<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.write_predicate(f)?;
        if let Some(narrowing) = &self.narrowing {
            write!(f, ".{narrowing}")?;
        }
        Ok(())
    }
}
