//! Comparison against default instances.
//!
//! A node "has changes" when it differs from a freshly constructed default
//! of its kind. The comparison is structural: parameter maps, then the set
//! types present, then per set type the member count, the identifiers and
//! finally each matched pair recursively. Comments are ignored.
//!
//! The same comparison drives the reduced view, which hides parameters equal
//! to the baseline and sets identical to their baseline counterpart.

use std::collections::HashMap;

use crate::{
    catalogue::Catalogue,
    identity::{identifier_of, sort_by_identifier},
    node::{Node, Tree},
};

/// Baseline comparison over one catalogue.
#[derive(Debug, Clone, Copy)]
pub struct Differ<'a> {
    catalogue: &'a Catalogue,
}

impl<'a> Differ<'a> {
    pub fn new(catalogue: &'a Catalogue) -> Self {
        Self { catalogue }
    }

    /// Whether `node` differs from the default instance of its kind.
    ///
    /// If no default can be built the node is reported as changed: an
    /// unconstructable baseline cannot prove equivalence.
    pub fn has_changes(&self, node: &Node) -> bool {
        match self.catalogue.construct_default(&node.kind) {
            Ok(baseline) => self.differs(node, &baseline),
            Err(e) => {
                warn!("no default for `{}`, assuming it has changes: {e}", node.name);
                true
            }
        }
    }

    /// Recursive structural comparison of `current` against `baseline`.
    pub fn differs(&self, current: &Node, baseline: &Node) -> bool {
        if current.params != baseline.params {
            return true;
        }

        if !current.children.keys().eq(baseline.children.keys()) {
            return true;
        }

        for (set_type, current_sets) in &current.children {
            let baseline_sets = &baseline.children[set_type];
            if current_sets.len() != baseline_sets.len() {
                return true;
            }

            let (Some(current_by_id), Some(baseline_by_id)) = (
                self.by_identifier(current_sets),
                self.by_identifier(baseline_sets),
            ) else {
                if self.sequences_differ(current_sets, baseline_sets) {
                    debug!("`{}` sets `{set_type}` differ", current.name);
                    return true;
                }
                continue;
            };
            if current_by_id.len() != baseline_by_id.len()
                || current_by_id.keys().any(|id| !baseline_by_id.contains_key(id))
            {
                return true;
            }

            for (id, current_child) in &current_by_id {
                if self.differs(current_child, baseline_by_id[id]) {
                    debug!("`{}` set `{set_type}[{id}]` differs", current.name);
                    return true;
                }
            }
        }

        false
    }

    /// Sets keyed by identifier, or `None` if two of them share one.
    fn by_identifier<'n>(&self, nodes: &'n [Node]) -> Option<HashMap<String, &'n Node>> {
        let map: HashMap<_, _> = nodes
            .iter()
            .map(|n| (identifier_of(self.catalogue, n), n))
            .collect();
        (map.len() == nodes.len()).then_some(map)
    }

    /// Pairwise comparison of equally long set lists ordered by identifier,
    /// for sets that cannot be matched by identifier alone.
    fn sequences_differ(&self, current: &[Node], baseline: &[Node]) -> bool {
        let mut current: Vec<&Node> = current.iter().collect();
        let mut baseline: Vec<&Node> = baseline.iter().collect();
        sort_by_identifier(self.catalogue, &mut current);
        sort_by_identifier(self.catalogue, &mut baseline);
        current.iter().zip(&baseline).any(|(c, b)| {
            identifier_of(self.catalogue, c) != identifier_of(self.catalogue, b)
                || self.differs(c, b)
        })
    }

    /// Copy of `node` without what equals `baseline`.
    ///
    /// Parameters with the baseline value are dropped along with their
    /// comments, except the identity parameter, which stays so the set can
    /// still be told apart. Sets that match a baseline set of the same
    /// identifier are dropped entirely. Sets without an unambiguous
    /// counterpart are kept whole. With no baseline the node is returned
    /// unchanged.
    pub fn reduced(&self, node: &Node, baseline: Option<&Node>) -> Node {
        let Some(baseline) = baseline else {
            return node.clone();
        };

        let identity = self.catalogue.identity_field(&node.kind);
        let mut out = Node::new(&node.kind, &node.name);
        for (key, value) in &node.params {
            if baseline.params.get(key) == Some(value) {
                if identity == Some(key.as_str()) {
                    out.params.insert(key.clone(), value.clone());
                }
                continue;
            }
            out.params.insert(key.clone(), value.clone());
            if let Some(c) = node.comments.get(key) {
                out.comments.insert(key.clone(), c.clone());
            }
        }

        for (set_type, sets) in &node.children {
            let baseline_by_id = baseline
                .children
                .get(set_type)
                .and_then(|b| self.by_identifier(b))
                .filter(|_| self.by_identifier(sets).is_some())
                .unwrap_or_default();
            for child in sets {
                let counterpart = baseline_by_id
                    .get(&identifier_of(self.catalogue, child))
                    .copied();
                match counterpart {
                    Some(b) if !self.differs(child, b) => {}
                    _ => out.add_child(self.reduced(child, counterpart)),
                }
            }
        }
        out
    }

    /// Reduced view of a whole tree, one entry per module in presentation
    /// order.
    pub fn reduced_tree(&self, tree: &Tree) -> Vec<ModuleView> {
        tree.module_names()
            .into_iter()
            .map(|name| {
                let module = &tree.modules[name];
                let baseline = match self.catalogue.construct_default(&module.kind) {
                    Ok(b) => Some(b),
                    Err(e) => {
                        debug!("reduced view of `{name}` shows everything: {e}");
                        None
                    }
                };
                let changed = match &baseline {
                    Some(b) => self.differs(module, b),
                    None => true,
                };
                ModuleView {
                    name: name.to_string(),
                    changed,
                    node: self.reduced(module, baseline.as_ref()),
                }
            })
            .collect()
    }
}

/// One module of a reduced view.
#[derive(Debug, Clone)]
pub struct ModuleView {
    pub name: String,
    /// Whether the module differs from its default.
    pub changed: bool,
    /// The module with baseline-equal content removed.
    pub node: Node,
}

/// Convenience wrapper for [`Differ::has_changes`].
pub fn has_changes(catalogue: &Catalogue, node: &Node) -> bool {
    Differ::new(catalogue).has_changes(node)
}

/// Convenience wrapper for [`Differ::differs`].
pub fn differs(catalogue: &Catalogue, current: &Node, baseline: &Node) -> bool {
    Differ::new(catalogue).differs(current, baseline)
}
