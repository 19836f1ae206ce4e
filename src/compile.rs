use std::fmt;

use crate::RuleNode;

/// Write the chain starting at `node` without checking validity.
///
/// Each node contributes `not ` when negated and its own predicate; the
/// narrowing carried by an `and` node's resolved field is not written here,
/// since the child node writes its own predicate after the connector.
pub(crate) fn write_chain(node: &RuleNode<'_>, out: &mut impl fmt::Write) -> fmt::Result {
    let mut current = Some(node);
    while let Some(n) = current {
        if n.negate() {
            out.write_str("not ")?;
        }
        if let Some(resolved) = n.resolved_field() {
            resolved.write_predicate(out)?;
        }
        current = match n.condition().connector() {
            Some(connector) => {
                out.write_str(connector)?;
                n.child()
            }
            None => None,
        };
    }
    Ok(())
}
