//! Editing sessions.
//!
//! A [`Session`] owns the live working tree and a pristine backup taken
//! through the text codec when the session opens. Edits go to the working
//! tree only and are validated before they land. The session ends with
//! [`Session::commit`], which hands the working tree over, or
//! [`Session::rollback`], which hands back the backup.

use std::collections::BTreeMap;

use crate::{
    catalogue::Catalogue,
    codec::TreeCodec,
    error::{CodecError, ConstructionError, EditError, EditResult},
    identity::{assign_identifier, identifier_of},
    node::{Node, NodePath, Tree, params_editable},
};

/// Clone a tree by writing it as text and parsing it back.
///
/// The copy shares nothing with the original, but only keeps what the codec
/// keeps.
pub fn deep_clone(codec: &impl TreeCodec, tree: &Tree) -> Result<Tree, CodecError> {
    let text = codec.serialize(tree)?;
    codec.deserialize(&text)
}

/// One pending parameter change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParamEdit {
    pub path: NodePath,
    pub key: String,
    pub value: String,
}

impl ParamEdit {
    pub fn new(path: NodePath, key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            path,
            key: key.into(),
            value: value.into(),
        }
    }
}

/// Result of adding a parameter set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddedSet {
    /// Path of the new set.
    ///
    /// Sets of kinds without an identity field are identified by their set
    /// type, so the path resolves to the first set of that type.
    pub path: NodePath,
    /// Whether the identifier could be written into the set. When `false`
    /// the set is filed under its name and the caller should warn.
    pub identifier_assigned: bool,
}

/// Single-writer editing session over one tree.
pub struct Session<'a, C: TreeCodec> {
    catalogue: &'a Catalogue,
    codec: C,
    working: Tree,
    backup: Tree,
}

impl<'a, C: TreeCodec> Session<'a, C> {
    /// Start editing `tree`. Fails if the backup cannot be taken.
    pub fn open(catalogue: &'a Catalogue, codec: C, tree: Tree) -> Result<Self, CodecError> {
        let backup = deep_clone(&codec, &tree)?;
        debug!(
            "session opened with {} modules ({})",
            tree.modules.len(),
            codec.format_name()
        );
        Ok(Self {
            catalogue,
            codec,
            working: tree,
            backup,
        })
    }

    pub fn catalogue(&self) -> &'a Catalogue {
        self.catalogue
    }

    pub fn codec(&self) -> &C {
        &self.codec
    }

    pub fn working(&self) -> &Tree {
        &self.working
    }

    pub fn backup(&self) -> &Tree {
        &self.backup
    }

    /// Finish the session keeping all edits.
    pub fn commit(self) -> Tree {
        debug!("session committed");
        self.working
    }

    /// Finish the session discarding all edits.
    pub fn rollback(self) -> Tree {
        debug!("session rolled back");
        self.backup
    }

    /// Current working tree as text.
    pub fn to_text(&self) -> Result<String, CodecError> {
        self.codec.serialize(&self.working)
    }

    /// Replace all working modules with those parsed from `text`.
    ///
    /// Comments survive only as far as `text` carries them. On a parse
    /// error the working tree is untouched.
    pub fn merge_from_text(&mut self, text: &str) -> Result<(), CodecError> {
        let parsed = self.codec.deserialize(text)?;
        info!("merged {} modules from text", parsed.modules.len());
        self.working.modules = parsed.modules;
        Ok(())
    }

    /// Overwrite the comments of every working module that has a
    /// counterpart in `defaults` with that counterpart's comments.
    ///
    /// This is a full replacement, so comments dropped by an earlier text
    /// merge come back. Modules without a counterpart keep theirs.
    pub fn reconcile_comments(&mut self, defaults: &BTreeMap<String, Node>) {
        for (name, module) in self.working.modules.iter_mut() {
            if let Some(default) = defaults.get(name) {
                module.comments = default.comments.clone();
            }
        }
    }

    fn node_mut(&mut self, path: &NodePath) -> EditResult<&mut Node> {
        self.working
            .resolve_mut(self.catalogue, path)
            .ok_or_else(|| EditError::NodeNotFound(path.clone()))
    }

    /// Apply a batch of parameter changes, all or nothing.
    ///
    /// Values equal to the current value are skipped. The first rejected
    /// value aborts the batch with the working tree unchanged. Returns the
    /// number of values changed.
    pub fn apply_edits(&mut self, edits: &[ParamEdit]) -> EditResult<usize> {
        let mut scratch = self.working.clone();
        let mut changed = 0;
        for edit in edits {
            let node = scratch
                .resolve_mut(self.catalogue, &edit.path)
                .ok_or_else(|| EditError::NodeNotFound(edit.path.clone()))?;
            if node.param(&edit.key) == Some(edit.value.as_str()) {
                continue;
            }
            node.set_param(self.catalogue, &edit.key, &edit.value)
                .map_err(|e| e.at(edit.path.to_string()))?;
            changed += 1;
        }
        self.working = scratch;
        Ok(changed)
    }

    /// Add a new parameter. Refuses existing keys and nodes whose parameters
    /// are fixed by their kind.
    pub fn add_param(&mut self, path: &NodePath, key: &str, value: &str) -> EditResult<()> {
        let catalogue = self.catalogue;
        let depth = path.depth();
        let node = self.node_mut(path)?;
        if !params_editable(node, depth) {
            return Err(EditError::ParamsNotEditable(path.to_string()));
        }
        if node.params.contains_key(key) {
            return Err(EditError::ParamExists {
                node: path.to_string(),
                key: key.to_string(),
            });
        }
        node.set_param(catalogue, key, value)
            .map_err(|e| e.at(path.to_string()))?;
        Ok(())
    }

    /// Remove a parameter. Its comment stays on the node.
    pub fn remove_param(&mut self, path: &NodePath, key: &str) -> EditResult<bool> {
        let depth = path.depth();
        let node = self.node_mut(path)?;
        if !params_editable(node, depth) {
            return Err(EditError::ParamsNotEditable(path.to_string()));
        }
        Ok(node.remove_param(key))
    }

    /// Add an empty module without a schema.
    pub fn add_module(&mut self, name: &str) -> EditResult<()> {
        let name = name.trim();
        if name.is_empty() {
            return Err(EditError::EmptyIdentifier);
        }
        if self.working.contains(name) {
            return Err(EditError::ModuleExists(name.to_string()));
        }
        self.working.insert(Node::generic(name));
        Ok(())
    }

    /// Add the default instance of a catalogue module.
    pub fn add_known_module(&mut self, name: &str) -> EditResult<()> {
        if self.working.contains(name) {
            return Err(EditError::ModuleExists(name.to_string()));
        }
        let module = self
            .catalogue
            .construct_module(name)
            .map_err(|_| EditError::UnknownModule(name.to_string()))?;
        self.working.insert(module);
        Ok(())
    }

    /// Remove a whole module, returning whether it existed.
    pub fn remove_module(&mut self, name: &str) -> bool {
        self.working.modules.remove(name).is_some()
    }

    /// Create a `set_type` set below `path` identified by `identifier`.
    ///
    /// If the kind offers no way to store the identifier the set is still
    /// added and [`AddedSet::identifier_assigned`] is `false`.
    pub fn add_child(
        &mut self,
        path: &NodePath,
        set_type: &str,
        identifier: &str,
    ) -> EditResult<AddedSet> {
        let identifier = identifier.trim();
        if identifier.is_empty() {
            return Err(EditError::EmptyIdentifier);
        }
        let catalogue = self.catalogue;
        let parent = self.node_mut(path)?;

        let schema = catalogue
            .get(&parent.kind)
            .ok_or_else(|| ConstructionError::Unsupported {
                kind: parent.kind.clone(),
                set_type: set_type.to_string(),
            })?;
        let mut child = schema.create_child(catalogue, set_type)?;

        let identifier_assigned = assign_identifier(catalogue, &mut child, identifier);
        if !identifier_assigned {
            warn!("could not set identifier `{identifier}` on new `{set_type}` set in `{path}`");
        }
        let child_id = identifier_of(catalogue, &child);

        // Without an identity field every set of the kind shares its name
        // as identifier, so only identity fields are kept unique.
        let taken = catalogue.identity_field(&child.kind).is_some()
            && parent
                .children
                .get(set_type)
                .is_some_and(|sets| sets.iter().any(|s| identifier_of(catalogue, s) == child_id));
        if taken {
            return Err(EditError::IdentifierExists {
                node: path.to_string(),
                set_type: set_type.to_string(),
                identifier: child_id,
            });
        }

        if let Some(child_schema) = catalogue.get(&child.kind) {
            child_schema.prepare_new(catalogue, &mut child);
        }
        parent
            .children
            .entry(set_type.to_string())
            .or_default()
            .push(child);

        Ok(AddedSet {
            path: path.child(set_type, child_id),
            identifier_assigned,
        })
    }

    /// Remove the `set_type` set identified by `identifier` below `path`.
    ///
    /// A set type left without members is removed from the node.
    pub fn remove_child(
        &mut self,
        path: &NodePath,
        set_type: &str,
        identifier: &str,
    ) -> EditResult<bool> {
        let catalogue = self.catalogue;
        let parent = self.node_mut(path)?;
        let Some(sets) = parent.children.get_mut(set_type) else {
            return Ok(false);
        };
        let before = sets.len();
        sets.retain(|s| identifier_of(catalogue, s) != identifier);
        let removed = sets.len() != before;
        if sets.is_empty() {
            parent.children.remove(set_type);
        }
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{builtin, codec::TomlCodec, diff::differs, error::RejectedValue};

    fn setup() -> (Catalogue, Tree) {
        let catalogue = Catalogue::builtin();
        let tree = catalogue.default_tree();
        (catalogue, tree)
    }

    #[test]
    fn test_backup_is_independent() {
        let (catalogue, tree) = setup();
        let mut session = Session::open(&catalogue, TomlCodec, tree).unwrap();
        let path = NodePath::module(builtin::GLOBAL);
        session
            .apply_edits(&[ParamEdit::new(path, "randomSeed", "1")])
            .unwrap();
        assert_eq!(
            session.backup().module(builtin::GLOBAL).unwrap().param("randomSeed"),
            Some("4711")
        );
        let restored = session.rollback();
        assert_eq!(
            restored.module(builtin::GLOBAL).unwrap().param("randomSeed"),
            Some("4711")
        );
    }

    #[test]
    fn test_batch_is_atomic() {
        let (catalogue, tree) = setup();
        let mut session = Session::open(&catalogue, TomlCodec, tree).unwrap();
        let global = NodePath::module(builtin::GLOBAL);
        let controller = NodePath::module(builtin::CONTROLLER);
        let err = session
            .apply_edits(&[
                ParamEdit::new(global.clone(), "randomSeed", "42"),
                ParamEdit::new(controller, "lastIteration", "ten"),
            ])
            .unwrap_err();
        match err {
            EditError::Rejected(RejectedValue { node, key, value, .. }) => {
                assert_eq!(node, "controller");
                assert_eq!(key, "lastIteration");
                assert_eq!(value, "ten");
            }
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(
            session.working().module(builtin::GLOBAL).unwrap().param("randomSeed"),
            Some("4711")
        );

        let changed = session
            .apply_edits(&[
                ParamEdit::new(global.clone(), "randomSeed", "42"),
                ParamEdit::new(global, "numberOfThreads", "2"),
            ])
            .unwrap();
        assert_eq!(changed, 1);
    }

    #[test]
    fn test_merge_from_text() {
        let (catalogue, tree) = setup();
        let mut session = Session::open(&catalogue, TomlCodec, tree).unwrap();
        let text = "[custom]\nkind = \"generic\"\nparams = { a = \"1\" }\n";
        session.merge_from_text(text).unwrap();
        assert_eq!(session.working().module_names(), vec!["custom"]);

        let before = session.to_text().unwrap();
        assert!(session.merge_from_text("[custom").is_err());
        assert_eq!(session.to_text().unwrap(), before);
    }

    #[test]
    fn test_reconcile_restores_comments() {
        let (catalogue, tree) = setup();
        let mut session = Session::open(&catalogue, TomlCodec, tree).unwrap();
        let mut stripped = session.working().clone();
        for m in stripped.modules.values_mut() {
            m.comments.clear();
        }
        stripped.insert(Node::generic("custom").with_comment("k", "mine"));
        let text = TomlCodec.serialize(&stripped).unwrap();
        session.merge_from_text(&text).unwrap();
        assert!(session.working().module(builtin::GLOBAL).unwrap().comments.is_empty());

        session.reconcile_comments(&catalogue.comment_catalogue());
        let global = session.working().module(builtin::GLOBAL).unwrap();
        assert!(global.comments.contains_key("randomSeed"));
        let custom = session.working().module("custom").unwrap();
        assert_eq!(custom.comments["k"], "mine");
    }

    #[test]
    fn test_add_child_seeds_and_refuses_duplicates() {
        let (catalogue, tree) = setup();
        let mut session = Session::open(&catalogue, TomlCodec, tree).unwrap();
        let scoring = NodePath::module(builtin::SCORING);
        let added = session
            .add_child(&scoring, builtin::SCORING_PARAMETERS, "freight")
            .unwrap();
        assert!(added.identifier_assigned);
        assert_eq!(added.path.to_string(), "scoring/scoringParameters[freight]");

        let freight = session.working().resolve(&catalogue, &added.path).unwrap();
        assert_eq!(freight.children[builtin::ACTIVITY_PARAMS].len(), 5);
        assert_eq!(freight.children[builtin::MODE_PARAMS].len(), 4);

        assert!(matches!(
            session.add_child(&scoring, builtin::SCORING_PARAMETERS, "freight"),
            Err(EditError::IdentifierExists { .. })
        ));
        assert!(matches!(
            session.add_child(&scoring, builtin::MODE_PARAMS, "car"),
            Err(EditError::Construction(_))
        ));

        assert!(
            session
                .remove_child(&scoring, builtin::SCORING_PARAMETERS, "freight")
                .unwrap()
        );
        assert!(!differs(
            &catalogue,
            session.working().module(builtin::SCORING).unwrap(),
            &catalogue.construct_default(builtin::SCORING).unwrap(),
        ));
    }

    #[test]
    fn test_param_editing_rules() {
        let (catalogue, tree) = setup();
        let mut session = Session::open(&catalogue, TomlCodec, tree).unwrap();
        let global = NodePath::module(builtin::GLOBAL);
        assert!(matches!(
            session.add_param(&global, "extra", "1"),
            Err(EditError::ParamsNotEditable(_))
        ));

        session.add_module("custom").unwrap();
        assert_eq!(
            session.add_module("custom").unwrap_err(),
            EditError::ModuleExists("custom".into())
        );
        let custom = NodePath::module("custom");
        session.add_param(&custom, "extra", "1").unwrap();
        assert!(matches!(
            session.add_param(&custom, "extra", "2"),
            Err(EditError::ParamExists { .. })
        ));
        assert!(session.remove_param(&custom, "extra").unwrap());

        let car = NodePath::module(builtin::SCORING)
            .child(builtin::SCORING_PARAMETERS, "default")
            .child(builtin::MODE_PARAMS, "car");
        session.add_param(&car, "monetaryDistanceRate", "0.0").unwrap();
        let car = session.working().resolve(&catalogue, &car).unwrap();
        assert_eq!(car.param("monetaryDistanceRate"), Some("0.0"));
    }

    #[test]
    fn test_add_known_module() {
        let catalogue = Catalogue::builtin();
        let mut session = Session::open(&catalogue, TomlCodec, Tree::new()).unwrap();
        session.add_known_module(builtin::ROUTING).unwrap();
        assert!(session.working().contains(builtin::ROUTING));
        assert_eq!(
            session.add_known_module("nope").unwrap_err(),
            EditError::UnknownModule("nope".into())
        );
        assert!(session.remove_module(builtin::ROUTING));
    }

    #[test]
    fn test_add_sets_without_identity_field() {
        use crate::catalogue::{ChildDecl, KindDecl, Origin, ParamDecl, ParamType};

        let mut catalogue = Catalogue::builtin();
        catalogue.register(
            KindDecl::module("emissions").child(ChildDecl::new("vehicleClass")),
            Origin::Extension,
        );
        catalogue.register(
            KindDecl::set("vehicleClass").param(ParamDecl::new("name", ParamType::String).default_value("")),
            Origin::Extension,
        );
        let mut session = Session::open(&catalogue, TomlCodec, Tree::new()).unwrap();
        session.add_known_module("emissions").unwrap();

        let emissions = NodePath::module("emissions");
        let first = session.add_child(&emissions, "vehicleClass", "PASSENGER_CAR").unwrap();
        let second = session.add_child(&emissions, "vehicleClass", "HGV").unwrap();
        assert!(first.identifier_assigned && second.identifier_assigned);
        assert_eq!(first.path.to_string(), "emissions/vehicleClass[vehicleClass]");

        let names: Vec<_> = session.working().module("emissions").unwrap().children["vehicleClass"]
            .iter()
            .map(|c| c.param("name").unwrap())
            .collect();
        assert_eq!(names, vec!["PASSENGER_CAR", "HGV"]);
        assert!(session.working().resolve(&catalogue, &first.path).is_some());
    }
}
