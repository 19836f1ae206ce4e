//! The stock catalog of value types and visitor-data handlers.

use std::sync::OnceLock;

use crate::{ArgKind, FieldHandler, Registry, RegistryBuilder, ValueType};

static BUILTIN: OnceLock<Registry> = OnceLock::new();

const BOOLEAN_CHOICES: &[(&str, &str)] = &[("Yes", "true"), ("No", "false")];
const PERIOD_CHOICES: &[(&str, &str)] = &[("Days", "days"), ("Weeks", "weeks"), ("Months", "months")];

fn string_type() -> ValueType {
    ValueType::new("string", "Text")
        .operation("equals", "Is", |op| op.argument("value", ArgKind::String))
        .operation("not_equals", "Is Not", |op| op.argument("value", ArgKind::String))
        .operation("contains", "Contains", |op| op.argument("value", ArgKind::String))
        .operation("starts_with", "Starts With", |op| op.argument("value", ArgKind::String))
        .operation("ends_with", "Ends With", |op| op.argument("value", ArgKind::String))
        .operation("blank", "Is Blank", |op| op)
}

fn integer_type() -> ValueType {
    ValueType::new("integer", "Number")
        .operation("equals", "Is", |op| op.argument("value", ArgKind::Integer))
        .operation("greater_than", "Greater Than", |op| op.argument("value", ArgKind::Integer))
        .operation("less_than", "Less Than", |op| op.argument("value", ArgKind::Integer))
        .operation("between", "Between", |op| {
            op.argument("min", ArgKind::Integer)
                .argument("max", ArgKind::Integer)
        })
}

fn float_type() -> ValueType {
    ValueType::new("float", "Decimal")
        .operation("greater_than", "Greater Than", |op| op.argument("value", ArgKind::Float))
        .operation("less_than", "Less Than", |op| op.argument("value", ArgKind::Float))
        .operation("between", "Between", |op| {
            op.argument("min", ArgKind::Float).argument("max", ArgKind::Float)
        })
}

fn boolean_type() -> ValueType {
    ValueType::new("boolean", "Yes/No").operation("is", "Is", |op| {
        op.choice_argument("value", ArgKind::Boolean, BOOLEAN_CHOICES)
    })
}

fn date_type() -> ValueType {
    ValueType::new("date", "Date")
        .operation("before", "Before", |op| op.argument("date", ArgKind::Date))
        .operation("after", "After", |op| op.argument("date", ArgKind::Date))
        .operation("between", "Between", |op| {
            op.argument("from", ArgKind::Date).argument("to", ArgKind::Date)
        })
        .operation("within_last", "Within The Last", |op| {
            op.argument("amount", ArgKind::Integer)
                .choice_argument("unit", ArgKind::String, PERIOD_CHOICES)
        })
}

fn visitor_handler() -> FieldHandler {
    FieldHandler::new("visitor", "Visitor")
        .field("country", "Country", "string")
        .field("region", "Region", "string")
        .field("city", "City", "string")
        .field("language", "Language", "string")
        .field("first_seen", "First Seen", "date")
        .field("visits", "Visit Count", "integer")
        .field("returning", "Returning Visitor", "boolean")
}

fn session_handler() -> FieldHandler {
    FieldHandler::new("session", "Session")
        .field("browser", "Browser", "string")
        .field("platform", "Operating System", "string")
        .field("device", "Device", "string")
        .field("landing_page", "Landing Page", "string")
        .field("page_views", "Page Views", "integer")
        .field("duration", "Duration (minutes)", "float")
        .field("started_at", "Session Start", "date")
}

fn referrer_handler() -> FieldHandler {
    FieldHandler::new("referrer", "Referrer")
        .field("referrer_host", "Referring Host", "string")
        .field("campaign", "Campaign", "string")
        .field("medium", "Medium", "string")
        .field("search_terms", "Search Terms", "string")
}

/// Builder pre-loaded with the stock catalog, for extending it with custom
/// handlers before building.
#[must_use]
pub fn builder() -> RegistryBuilder {
    RegistryBuilder::new()
        .value_type(string_type())
        .value_type(integer_type())
        .value_type(float_type())
        .value_type(boolean_type())
        .value_type(date_type())
        .handler(visitor_handler())
        .handler(session_handler())
        .handler(referrer_handler())
}

impl Registry {
    /// The process-wide stock catalog: `string`, `integer`, `float`,
    /// `boolean` and `date` value types over the `visitor`, `session` and
    /// `referrer` handlers.
    #[must_use]
    pub fn builtin() -> &'static Registry {
        BUILTIN.get_or_init(|| builder().assemble())
    }
}
