use segrule::{Registry, RuleConfig, RuleNode, SegruleError};
use tracing_subscriber::EnvFilter;

fn main() -> Result<(), SegruleError> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let registry = Registry::builtin();

    // Returning French visitors from Paris, or anyone arriving via a spring campaign
    let mut rule = RuleNode::new(registry);
    rule.build(
        &RuleConfig::new()
            .field("country")
            .operation("equals")
            .argument(0, "FR")
            .and(
                RuleConfig::new()
                    .field("city")
                    .operation("equals")
                    .argument(0, "Paris")
                    .and(
                        RuleConfig::new()
                            .field("returning")
                            .argument(0, "Yes")
                            .or(RuleConfig::new()
                                .field("campaign")
                                .operation("starts_with")
                                .argument(0, "spring")),
                    ),
            ),
    );

    let errors = rule.validate();
    if !errors.is_empty() {
        for error in &errors {
            println!("invalid: {error}");
        }
        return Ok(());
    }
    println!("{}", rule.to_expr());

    // Offer the choices a form would show for the next link
    for (label, key) in rule.field_options() {
        println!("  field option: {label} ({key})");
    }

    Ok(())
}
