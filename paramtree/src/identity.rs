//! Identifiers of parameter sets.
//!
//! Sibling sets are matched by what they mean (a mode, an activity type),
//! not by position. Kinds with a distinguished identity parameter use its
//! value; everything else falls back to the node name.

use crate::{catalogue::Catalogue, node::Node};

/// Conventional keys tried when a kind has no identity parameter.
const FALLBACK_KEYS: [&str; 2] = ["name", "mode"];

/// Stable identifier of `node`.
pub fn identifier_of(catalogue: &Catalogue, node: &Node) -> String {
    catalogue
        .identity_field(&node.kind)
        .and_then(|field| node.params.get(field))
        .cloned()
        .unwrap_or_else(|| node.name.clone())
}

/// Set the identifier of a freshly created node.
///
/// Writes the kind's identity parameter, or else one of the conventional
/// keys `name`/`mode` if the node already declares it. Returns `false` when
/// no strategy applies; callers report that as a warning and keep the node.
pub fn assign_identifier(catalogue: &Catalogue, node: &mut Node, value: &str) -> bool {
    if let Some(field) = catalogue.identity_field(&node.kind) {
        node.params.insert(field.to_string(), value.to_string());
        return true;
    }
    for key in FALLBACK_KEYS {
        if let Some(slot) = node.params.get_mut(key) {
            *slot = value.to_string();
            return true;
        }
    }
    false
}

/// Sort sets by identifier.
pub fn sort_by_identifier(catalogue: &Catalogue, nodes: &mut [&Node]) {
    nodes.sort_by_cached_key(|n| identifier_of(catalogue, n));
}
