use segrule::{Registry, RuleNode, SegruleError};
use tracing_subscriber::EnvFilter;

fn main() -> Result<(), SegruleError> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let stored = concat!(
        "not browser:contains(Safari) + visits:between(3, 10)\n",
        r#"referrer_host:equals("news\x2eexample\x2ecom")"#,
    );
    let mut rule = RuleNode::from_expr(Registry::builtin(), stored)?;
    println!("reopened:\n{rule}\n");

    // Edit the root predicate in place; the operation heals to the new field's type
    rule.set_field(Some("duration"));
    rule.set_operation(Some("contains"));
    rule.set_argument(0, "2.5");
    println!("edited:\n{rule}");

    Ok(())
}
