/// A typed attribute exposed by a [`FieldHandler`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDef {
    pub key: String,
    pub name: String,
    /// Key of the [`ValueType`](super::ValueType) this field is bound to.
    pub value_type: String,
}

/// A named category of segmentable data (visitor, session, referrer, ...).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldHandler {
    pub key: String,
    pub name: String,
    pub(crate) fields: Vec<FieldDef>,
}

impl FieldHandler {
    #[must_use]
    pub fn new(key: &str, name: &str) -> Self {
        Self {
            key: key.to_owned(),
            name: name.to_owned(),
            fields: Vec::new(),
        }
    }

    /// Declare a field bound to the value type named `value_type`.
    #[must_use]
    pub fn field(mut self, key: &str, name: &str, value_type: &str) -> Self {
        self.fields.push(FieldDef {
            key: key.to_owned(),
            name: name.to_owned(),
            value_type: value_type.to_owned(),
        });
        self
    }

    /// All fields in declaration order.
    #[must_use]
    pub fn fields(&self) -> &[FieldDef] {
        &self.fields
    }

    #[must_use]
    pub fn get_field(&self, key: &str) -> Option<&FieldDef> {
        self.fields.iter().find(|f| f.key == key)
    }
}
