use std::fmt;

use tracing::warn;

use super::config::{Condition, RuleConfig};
use super::error::{Attribute, ValidationError};
use super::registry::{FieldScope, Registry};
use super::resolved::ResolvedField;
use super::value::Value;
use super::value_type::ArgumentSpec;

const FIELD_PROMPT: &str = "Select a field";

/// One node of a rule chain being authored.
///
/// A node tests one handler field with one operation, optionally negated, and
/// links to a child through its [`Condition`]. Nodes are populated with
/// [`build`](Self::build), checked with [`validate`](Self::validate) and
/// compiled with [`to_expr`](Self::to_expr).
///
/// Whenever a field is set, the operation is kept inside that field's value
/// type: an unsupported or missing operation is replaced with the value
/// type's first operation at every mutation point, and the argument slots are
/// resized to match it.
///
/// # Example
///
/// ```
/// use segrule::{Registry, RuleConfig, RuleNode};
///
/// let mut node = RuleNode::new(Registry::builtin());
/// node.build(
///     &RuleConfig::new()
///         .field("country")
///         .operation("equals")
///         .argument(0, "US")
///         .negate()
///         .or(RuleConfig::new().field("browser").operation("contains").argument(0, "Chrome")),
/// );
///
/// assert_eq!(node.to_expr(), "not country:equals(US) + browser:contains(Chrome)");
/// ```
#[derive(Debug, Clone)]
pub struct RuleNode<'r> {
    registry: &'r Registry,
    negate: bool,
    field: Option<String>,
    operation: Option<String>,
    arguments: Vec<Option<Value>>,
    condition: Condition,
    scope: FieldScope,
    child: Option<Box<RuleNode<'r>>>,
    /// Derived from `scope`, `field`, `operation` and `arguments`; refreshed at
    /// every mutation point.
    resolved: Option<ResolvedField<'r>>,
}

impl<'r> RuleNode<'r> {
    /// An empty root node drawing fields from every handler of `registry`.
    #[must_use]
    pub fn new(registry: &'r Registry) -> Self {
        Self::scoped(registry, FieldScope::Global)
    }

    fn scoped(registry: &'r Registry, scope: FieldScope) -> Self {
        Self {
            registry,
            negate: false,
            field: None,
            operation: None,
            arguments: Vec::new(),
            condition: Condition::None,
            scope,
            child: None,
            resolved: None,
        }
    }

    /// Parse a compiled expression and build a node from it.
    ///
    /// # Errors
    ///
    /// Returns [`SegruleError::Parse`](crate::SegruleError::Parse) if `expr`
    /// is not a well-formed expression.
    pub fn from_expr(registry: &'r Registry, expr: &str) -> Result<Self, crate::SegruleError> {
        let config = crate::parse::parse(expr)?;
        let mut node = Self::new(registry);
        node.build(&config);
        Ok(node)
    }

    /// Populate this node and its chain from `config`.
    ///
    /// Never fails: unknown fields surface later through
    /// [`validate`](Self::validate), unsupported operations are replaced,
    /// malformed arguments are left unset, and argument indices past the
    /// operation's slots are ignored. Argument slots the config does not
    /// mention keep their previous value if it still fits the slot.
    pub fn build(&mut self, config: &RuleConfig) {
        self.negate = config.is_negated();
        self.field = config.field.clone().filter(|f| !f.is_empty());
        self.operation = config.operation.clone().filter(|o| !o.is_empty());
        self.condition = config.parsed_condition().unwrap_or_else(|err| {
            warn!(%err, "treating unrecognized condition as none");
            Condition::None
        });
        self.resolve();

        let slots = self.operation_argument_specs().len();
        for (&idx, raw) in &config.arguments {
            if idx < slots {
                self.store_argument(idx, raw);
            }
        }
        self.sync_arguments();

        self.child = if self.condition.is_none() {
            None
        } else {
            let mut child = RuleNode::scoped(self.registry, self.child_scope());
            child.build(config.child.as_deref().unwrap_or(&RuleConfig::default()));
            Some(Box::new(child))
        };
        self.attach_narrowing();
    }

    /// Validation errors for this node and, if chained, its child.
    #[must_use]
    pub fn validate(&self) -> Vec<ValidationError> {
        let mut errors = Vec::new();
        if self.resolved.is_none() {
            errors.push(ValidationError::invalid(Attribute::Field));
        }
        if !self.condition.is_none() && !self.child.as_deref().is_some_and(RuleNode::is_valid) {
            errors.push(ValidationError::invalid(Attribute::Condition));
        }
        errors
    }

    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.validate().is_empty()
    }

    /// Compile the chain into its textual expression, or an empty string if
    /// the chain does not validate.
    #[must_use]
    pub fn to_expr(&self) -> String {
        self.to_string()
    }

    // -- Mutation points ----------------------------------------------------

    pub fn set_negate(&mut self, negate: bool) {
        self.negate = negate;
    }

    /// Select a field, healing the operation and argument slots.
    pub fn set_field(&mut self, field: Option<&str>) {
        self.field = field.filter(|f| !f.is_empty()).map(str::to_owned);
        self.refresh();
    }

    /// Select an operation. An operation the field's type does not support is
    /// replaced with its first operation by label.
    pub fn set_operation(&mut self, operation: Option<&str>) {
        self.operation = operation.filter(|o| !o.is_empty()).map(str::to_owned);
        self.refresh();
    }

    /// Convert and store argument `idx`. Returns whether a value was stored;
    /// indices past the operation's slots are a no-op.
    pub fn set_argument(&mut self, idx: usize, raw: &str) -> bool {
        if idx >= self.operation_argument_specs().len() {
            return false;
        }
        let stored = self.store_argument(idx, raw);
        self.refresh();
        stored
    }

    // -- Accessors ----------------------------------------------------------

    #[must_use]
    pub fn registry(&self) -> &'r Registry {
        self.registry
    }

    #[must_use]
    pub fn negate(&self) -> bool {
        self.negate
    }

    #[must_use]
    pub fn field(&self) -> Option<&str> {
        self.field.as_deref()
    }

    #[must_use]
    pub fn operation(&self) -> Option<&str> {
        self.operation.as_deref()
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
    pub fn condition(&self) -> Condition {
        self.condition
    }

    #[must_use]
    pub fn scope(&self) -> &FieldScope {
        &self.scope
    }

    /// The chained child, present whenever the condition is not none.
    #[must_use]
    pub fn child(&self) -> Option<&RuleNode<'r>> {
        self.child.as_deref()
    }

    #[must_use]
    pub fn resolved_field(&self) -> Option<&ResolvedField<'r>> {
        self.resolved.as_ref()
    }

    /// Number of nodes in the chain, this one included.
    #[must_use]
    pub fn depth(&self) -> usize {
        std::iter::successors(Some(self), |n| n.child()).count()
    }

    // -- Option introspection ----------------------------------------------

    /// `(label, key)` of every field selectable from this node's scope.
    #[must_use]
    pub fn field_options(&self) -> Vec<(String, String)> {
        self.registry.field_options(&self.scope)
    }

    /// [`field_options`](Self::field_options) headed by a `("Select a
    /// field", "")` prompt entry, for rendering a select box. The empty key
    /// stands for "no field", as in [`operator_options`](Self::operator_options).
    #[must_use]
    pub fn field_options_with_prompt(&self) -> Vec<(String, String)> {
        let mut options = vec![(FIELD_PROMPT.to_owned(), String::new())];
        options.extend(self.field_options());
        options
    }

    /// `(label, key)` of every operation of the selected field's value type,
    /// sorted by label. The first entry is the operation a missing or
    /// unsupported request heals to. Empty until the field resolves.
    #[must_use]
    pub fn operation_options(&self) -> Vec<(String, String)> {
        self.resolved
            .as_ref()
            .map(|r| {
                r.value_type()
                    .operations_by_name()
                    .into_iter()
                    .map(|op| (op.name.clone(), op.key.clone()))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Argument slots of the selected operation.
    #[must_use]
    pub fn operation_argument_specs(&self) -> &'r [ArgumentSpec] {
        self.resolved
            .as_ref()
            .map(ResolvedField::argument_specs)
            .unwrap_or(&[])
    }

    #[must_use]
    pub fn operator_options() -> &'static [(&'static str, &'static str)] {
        &[("Not", "not"), ("", "")]
    }

    #[must_use]
    pub fn condition_options() -> &'static [(&'static str, &'static str)] {
        &[("", ""), ("And", "and"), ("Or", "or"), ("With", "with")]
    }

    // -- Derived state ------------------------------------------------------

    /// Recompute this node's resolution, then re-scope and re-resolve the
    /// child, then re-attach the child's narrowing.
    fn refresh(&mut self) {
        self.resolve();
        self.sync_arguments();
        if !self.condition.is_none() {
            let scope = self.child_scope();
            if let Some(child) = self.child.as_deref_mut() {
                if child.scope != scope {
                    child.scope = scope;
                    child.refresh();
                }
            }
        }
        self.attach_narrowing();
    }

    /// Resolve field and operation, healing the operation and sizing the
    /// argument slots to it.
    fn resolve(&mut self) {
        self.resolved = self
            .field
            .as_deref()
            .and_then(|f| self.registry.resolve_field(&self.scope, f, self.operation.as_deref()));

        let Some(resolved) = &self.resolved else {
            self.arguments.clear();
            return;
        };
        let healed = &resolved.operation().key;
        if self.operation.as_ref() != Some(healed) {
            self.operation = Some(healed.clone());
        }
        let specs = resolved.argument_specs();
        self.arguments.resize(specs.len(), None);
        for (slot, spec) in self.arguments.iter_mut().zip(specs) {
            if slot.as_ref().is_some_and(|v| !spec.kind.accepts(v)) {
                *slot = None;
            }
        }
    }

    /// Convert `raw` through the resolved field and mirror the slot back onto
    /// this node.
    fn store_argument(&mut self, idx: usize, raw: &str) -> bool {
        let Some(resolved) = self.resolved.as_mut() else {
            return false;
        };
        let stored = resolved.convert_argument(idx, raw);
        if let Some(slot) = self.arguments.get_mut(idx) {
            *slot = resolved.argument(idx).cloned();
        }
        stored
    }

    fn sync_arguments(&mut self) {
        if let Some(resolved) = &mut self.resolved {
            resolved.set_arguments(&self.arguments);
        }
    }

    fn child_scope(&self) -> FieldScope {
        match self.condition {
            Condition::And => self
                .resolved
                .as_ref()
                .map_or(FieldScope::Unresolved, |r| {
                    FieldScope::Handler(r.handler().key.clone())
                }),
            _ => FieldScope::Global,
        }
    }

    fn attach_narrowing(&mut self) {
        let narrowing = match (self.condition, self.child.as_deref()) {
            (Condition::And, Some(child)) => child.resolved.clone(),
            _ => None,
        };
        if let Some(resolved) = &mut self.resolved {
            resolved.set_narrowing(narrowing);
        }
    }
}

impl fmt::Display for RuleNode<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_valid() {
            crate::compile::write_chain(self, f)?;
        }
        Ok(())
    }
}
