use std::{collections::BTreeMap, fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::{
    catalogue::Catalogue,
    error::{CodecError, EditError, RejectedValue},
    identity::identifier_of,
};

/// Kind tag of modules added by name without a schema.
///
/// Generic modules accept any parameter, cannot create child sets and have
/// no default instance.
pub const GENERIC_KIND: &str = "generic";

/// One module or one nested parameter set.
///
/// Parameter and comment maps are ordered so the persisted text is stable;
/// the order carries no meaning. Comments are display-only and never take
/// part in diffing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Node {
    /// Schema tag of this node.
    pub kind: String,
    /// Module name, or the set type this node is filed under.
    #[serde(default)]
    pub name: String,
    /// Parameter values by name.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub params: BTreeMap<String, String>,
    /// Parameter descriptions by name.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub comments: BTreeMap<String, String>,
    /// Nested parameter sets by set type.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub children: BTreeMap<String, Vec<Node>>,
}

impl Node {
    /// Create an empty node.
    pub fn new(kind: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            name: name.into(),
            params: BTreeMap::new(),
            comments: BTreeMap::new(),
            children: BTreeMap::new(),
        }
    }

    /// Create an empty module without a schema.
    pub fn generic(name: impl Into<String>) -> Self {
        Self::new(GENERIC_KIND, name)
    }

    /// Builder-style parameter insertion, bypassing validation.
    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }

    /// Builder-style comment insertion.
    pub fn with_comment(mut self, key: impl Into<String>, comment: impl Into<String>) -> Self {
        self.comments.insert(key.into(), comment.into());
        self
    }

    /// Builder-style child insertion under the child's own name.
    pub fn with_child(mut self, child: Node) -> Self {
        self.add_child(child);
        self
    }

    pub fn is_generic(&self) -> bool {
        self.kind == GENERIC_KIND
    }

    pub fn param(&self, key: &str) -> Option<&str> {
        self.params.get(key).map(String::as_str)
    }

    /// Validate `value` through this node's kind and store it.
    ///
    /// On rejection `params` is untouched. Comments are never modified.
    pub fn set_param(
        &mut self,
        catalogue: &Catalogue,
        key: &str,
        value: &str,
    ) -> Result<(), RejectedValue> {
        catalogue
            .validate(&self.kind, key, value)
            .map_err(|reason| RejectedValue {
                node: self.name.clone(),
                key: key.to_string(),
                value: value.to_string(),
                reason,
            })?;
        self.params.insert(key.to_string(), value.to_string());
        Ok(())
    }

    /// Remove a parameter, returning whether it existed.
    ///
    /// The comment for `key` is kept so comment reconciliation and a later
    /// re-add can show it again; see [`Node::orphan_comments`].
    pub fn remove_param(&mut self, key: &str) -> bool {
        self.params.remove(key).is_some()
    }

    /// Comments whose parameter is not present.
    pub fn orphan_comments(&self) -> impl Iterator<Item = (&str, &str)> {
        self.comments
            .iter()
            .filter(|(k, _)| !self.params.contains_key(*k))
            .map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Append a child under its own name.
    pub fn add_child(&mut self, child: Node) {
        self.children
            .entry(child.name.clone())
            .or_default()
            .push(child);
    }

    /// All children across set types.
    pub fn all_children(&self) -> impl Iterator<Item = &Node> {
        self.children.values().flatten()
    }

    /// Number of nodes in this subtree, including `self`.
    pub fn node_count(&self) -> usize {
        1 + self.all_children().map(Node::node_count).sum::<usize>()
    }

    /// Check that every child is filed under its own name and kind.
    pub(crate) fn check_structure(&self, path: &str) -> Result<(), CodecError> {
        for (set_type, children) in &self.children {
            for child in children {
                if !child.name.is_empty() && &child.name != set_type {
                    return Err(CodecError::Structure(format!(
                        "`{path}` files a `{}` set under `{set_type}`",
                        child.name
                    )));
                }
                if &child.kind != set_type {
                    return Err(CodecError::Structure(format!(
                        "`{path}` files a set of kind `{}` under `{set_type}`",
                        child.kind
                    )));
                }
                child.check_structure(&format!("{path}/{set_type}"))?;
            }
        }
        Ok(())
    }

    /// Fill empty child names from the set type they are filed under.
    pub(crate) fn adopt_names(&mut self) {
        for (set_type, children) in self.children.iter_mut() {
            for child in children {
                if child.name.is_empty() {
                    child.name = set_type.clone();
                }
                child.adopt_names();
            }
        }
    }
}

/// Whether free-form parameter editing is allowed on a node.
///
/// Nested sets always allow it; top-level modules only when they carry no
/// schema.
pub fn params_editable(node: &Node, depth: usize) -> bool {
    depth > 0 || node.is_generic()
}

/// The whole document: root nodes by module name.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Tree {
    pub modules: BTreeMap<String, Node>,
}

impl Tree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a module under its own name, replacing any previous one.
    pub fn insert(&mut self, module: Node) -> Option<Node> {
        self.modules.insert(module.name.clone(), module)
    }

    pub fn module(&self, name: &str) -> Option<&Node> {
        self.modules.get(name)
    }

    pub fn module_mut(&mut self, name: &str) -> Option<&mut Node> {
        self.modules.get_mut(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.modules.contains_key(name)
    }

    /// Module names sorted case-insensitively, the order they are presented in.
    pub fn module_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.modules.keys().map(String::as_str).collect();
        names.sort_by_key(|n| n.to_lowercase());
        names
    }

    /// Find the node addressed by `path`.
    pub fn resolve(&self, catalogue: &Catalogue, path: &NodePath) -> Option<&Node> {
        let mut node = self.modules.get(&path.module)?;
        for step in &path.steps {
            node = node
                .children
                .get(&step.set_type)?
                .iter()
                .find(|c| identifier_of(catalogue, c) == step.identifier)?;
        }
        Some(node)
    }

    /// Mutable variant of [`Tree::resolve`].
    pub fn resolve_mut(&mut self, catalogue: &Catalogue, path: &NodePath) -> Option<&mut Node> {
        let mut node = self.modules.get_mut(&path.module)?;
        for step in &path.steps {
            node = node
                .children
                .get_mut(&step.set_type)?
                .iter_mut()
                .find(|c| identifier_of(catalogue, c) == step.identifier)?;
        }
        Some(node)
    }

    /// Give every root its key as name and every child its set type as
    /// name where missing, then check the names agree.
    pub(crate) fn normalize(&mut self) -> Result<(), CodecError> {
        for (key, module) in self.modules.iter_mut() {
            if module.name.is_empty() {
                module.name = key.clone();
            } else if &module.name != key {
                return Err(CodecError::Structure(format!(
                    "module `{key}` is named `{}`",
                    module.name
                )));
            }
            module.adopt_names();
            module.check_structure(key)?;
        }
        Ok(())
    }
}

/// One step below a module: a set type plus the identifier of one set.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PathStep {
    pub set_type: String,
    pub identifier: String,
}

/// Address of a node in a [`Tree`].
///
/// Written as `module/setType[identifier]/...`, e.g.
/// `scoring/scoringParameters[default]/modeParams[car]`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NodePath {
    pub module: String,
    pub steps: Vec<PathStep>,
}

impl NodePath {
    pub fn module(name: impl Into<String>) -> Self {
        Self {
            module: name.into(),
            steps: Vec::new(),
        }
    }

    /// Path of a child set below `self`.
    pub fn child(&self, set_type: impl Into<String>, identifier: impl Into<String>) -> Self {
        let mut path = self.clone();
        path.steps.push(PathStep {
            set_type: set_type.into(),
            identifier: identifier.into(),
        });
        path
    }

    pub fn depth(&self) -> usize {
        self.steps.len()
    }
}

impl fmt::Display for NodePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.module)?;
        for step in &self.steps {
            write!(f, "/{}[{}]", step.set_type, step.identifier)?;
        }
        Ok(())
    }
}

impl FromStr for NodePath {
    type Err = EditError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = |reason: &str| EditError::InvalidPath {
            path: s.to_string(),
            reason: reason.to_string(),
        };

        let mut parts = s.split('/');
        let module = parts.next().unwrap_or_default().trim();
        if module.is_empty() {
            return Err(invalid("missing module name"));
        }

        let mut path = NodePath::module(module);
        for part in parts {
            let (set_type, rest) = part
                .split_once('[')
                .ok_or_else(|| invalid("expected `setType[identifier]`"))?;
            let identifier = rest
                .strip_suffix(']')
                .ok_or_else(|| invalid("missing closing `]`"))?;
            if set_type.is_empty() {
                return Err(invalid("empty set type"));
            }
            path = path.child(set_type, identifier);
        }
        Ok(path)
    }
}
