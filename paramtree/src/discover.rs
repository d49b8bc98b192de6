//! Discovery of the child sets a node can create.
//!
//! Each kind declares the set types it can add. A declared set type is only
//! offered if creating it actually succeeds and yields a node filed under
//! that set type.

use std::collections::HashSet;

use crate::{catalogue::Catalogue, error::DiscoveryError, node::Node};

/// Set types that can be created below `node`.
///
/// Individual candidates that fail to construct are dropped. An unregistered
/// kind is a systemic failure and is reported as an error rather than an
/// empty set. Generic nodes support no child sets.
pub fn creatable_kinds(catalogue: &Catalogue, node: &Node) -> Result<HashSet<String>, DiscoveryError> {
    if node.is_generic() {
        return Ok(HashSet::new());
    }

    let schema = catalogue.get(&node.kind).ok_or_else(|| {
        warn!("cannot probe `{}`: kind `{}` is not registered", node.name, node.kind);
        DiscoveryError::UnknownKind {
            node: node.name.clone(),
            kind: node.kind.clone(),
        }
    })?;

    let mut creatable = HashSet::new();
    for set_type in schema.declared_child_kinds() {
        match schema.create_child(catalogue, &set_type) {
            Ok(child) if child.name == set_type => {
                creatable.insert(set_type);
            }
            Ok(child) => debug!(
                "`{}` declares `{set_type}` but creates `{}`, not offered",
                node.kind, child.name
            ),
            Err(e) => debug!("`{}` cannot create `{set_type}`: {e}", node.kind),
        }
    }
    Ok(creatable)
}

/// [`creatable_kinds`] sorted case-insensitively for presentation.
pub fn sorted_creatable_kinds(catalogue: &Catalogue, node: &Node) -> Result<Vec<String>, DiscoveryError> {
    let mut kinds: Vec<String> = creatable_kinds(catalogue, node)?.into_iter().collect();
    kinds.sort_by_key(|k| k.to_lowercase());
    Ok(kinds)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        builtin,
        catalogue::{ChildDecl, KindDecl, KindSchema, Origin},
        error::ConstructionError,
    };

    #[test]
    fn test_builtin_scoring_parameters() {
        let catalogue = Catalogue::builtin();
        let node = catalogue
            .construct_default(builtin::SCORING_PARAMETERS)
            .unwrap();
        let kinds = sorted_creatable_kinds(&catalogue, &node).unwrap();
        assert_eq!(kinds, vec![builtin::ACTIVITY_PARAMS, builtin::MODE_PARAMS]);
    }

    #[test]
    fn test_leaf_kind_has_no_children() {
        let catalogue = Catalogue::builtin();
        let node = catalogue.construct_default(builtin::GLOBAL).unwrap();
        assert!(creatable_kinds(&catalogue, &node).unwrap().is_empty());
        assert!(
            creatable_kinds(&catalogue, &Node::generic("custom"))
                .unwrap()
                .is_empty()
        );
    }

    #[test]
    fn test_unconstructable_candidate_excluded() {
        let mut catalogue = Catalogue::new();
        catalogue.register(
            KindDecl::module("parent")
                .child(ChildDecl::new("present"))
                .child(ChildDecl::new("missing")),
            Origin::Extension,
        );
        catalogue.register(KindDecl::set("present"), Origin::Extension);
        let node = catalogue.construct_default("parent").unwrap();
        let kinds = creatable_kinds(&catalogue, &node).unwrap();
        assert_eq!(kinds, HashSet::from(["present".to_string()]));
    }

    struct Misfiled;

    impl KindSchema for Misfiled {
        fn kind(&self) -> &str {
            "misfiled"
        }

        fn is_module(&self) -> bool {
            true
        }

        fn construct_default(&self, _: &Catalogue) -> Result<Node, ConstructionError> {
            Ok(Node::new("misfiled", "misfiled"))
        }

        fn declared_child_kinds(&self) -> Vec<String> {
            vec!["wanted".into()]
        }

        fn create_child(&self, _: &Catalogue, _: &str) -> Result<Node, ConstructionError> {
            Ok(Node::new("other", "other"))
        }
    }

    #[test]
    fn test_incompatible_candidate_excluded() {
        let mut catalogue = Catalogue::new();
        catalogue.register(Misfiled, Origin::Extension);
        let node = catalogue.construct_default("misfiled").unwrap();
        assert!(creatable_kinds(&catalogue, &node).unwrap().is_empty());
    }

    #[test]
    fn test_unknown_kind_is_reported() {
        let catalogue = Catalogue::builtin();
        let node = Node::new("vanished", "vanished");
        assert_eq!(
            creatable_kinds(&catalogue, &node).unwrap_err(),
            DiscoveryError::UnknownKind {
                node: "vanished".into(),
                kind: "vanished".into(),
            }
        );
    }
}
