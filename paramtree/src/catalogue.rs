//! Kind registry.
//!
//! Every node carries a kind tag; the [`Catalogue`] maps kind names to a
//! [`KindSchema`] which knows how to build a default instance, which
//! parameter holds the node's identifier, how to validate values and which
//! child sets the kind can create.
//!
//! Kinds come from two places: the fixed built-in set (see
//! [`crate::builtin`]) and extension kinds registered at runtime (see
//! [`crate::extension`]). The rest of the crate only talks to the registry
//! and never enumerates kinds itself.

use std::{
    cell::Cell,
    collections::{BTreeMap, HashMap},
    fmt,
};

use serde::{Deserialize, Serialize};

use crate::{
    error::ConstructionError,
    identity::{assign_identifier, identifier_of},
    node::{GENERIC_KIND, Node, Tree},
};

/// Nesting limit for default construction.
const MAX_CONSTRUCT_DEPTH: usize = 32;

/// Where a kind was registered from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Origin {
    /// Part of the fixed built-in set.
    Builtin,
    /// Registered at runtime.
    Extension,
}

impl fmt::Display for Origin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Origin::Builtin => write!(f, "core"),
            Origin::Extension => write!(f, "extension"),
        }
    }
}

/// Schema of one node kind.
///
/// Implementations must be cheap to query; the catalogue calls these on
/// every diff and probe. Schemas are owned by a single-threaded [`Catalogue`].
pub trait KindSchema {
    /// Kind tag this schema describes.
    fn kind(&self) -> &str;

    /// Whether nodes of this kind are top-level modules.
    fn is_module(&self) -> bool;

    /// Build a fresh node with no user edits.
    ///
    /// Child kinds are constructed through `catalogue`.
    fn construct_default(&self, catalogue: &Catalogue) -> Result<Node, ConstructionError>;

    /// Parameter holding the node's identifier, if the kind has one.
    fn identity_field(&self) -> Option<&str> {
        None
    }

    /// Check a value for `key`. The error is a human-readable reason.
    fn validate(&self, _key: &str, _value: &str) -> Result<(), String> {
        Ok(())
    }

    /// Set types this kind declares it can add.
    fn declared_child_kinds(&self) -> Vec<String> {
        Vec::new()
    }

    /// Create a new child of `set_type` on demand.
    ///
    /// The default builds the default instance of the kind named `set_type`,
    /// provided the set type is declared.
    fn create_child(&self, catalogue: &Catalogue, set_type: &str) -> Result<Node, ConstructionError> {
        if !self.declared_child_kinds().iter().any(|k| k == set_type) {
            return Err(ConstructionError::Unsupported {
                kind: self.kind().to_string(),
                set_type: set_type.to_string(),
            });
        }
        catalogue.construct_default(set_type)
    }

    /// Fill a freshly created node after its identifier has been assigned.
    fn prepare_new(&self, _catalogue: &Catalogue, _node: &mut Node) {}
}

/// Value constraint of a declared parameter.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ParamType {
    /// Any string.
    #[default]
    String,
    /// A 64-bit integer, optionally bounded (inclusive).
    Int {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        min: Option<i64>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        max: Option<i64>,
    },
    /// A floating point number.
    Float,
    /// `true` or `false`.
    Bool,
    /// One of a fixed list of words.
    Enum { values: Vec<String> },
}

impl ParamType {
    /// Check `value` against this constraint.
    pub fn check(&self, value: &str) -> Result<(), String> {
        match self {
            ParamType::String => Ok(()),
            ParamType::Int { min, max } => {
                let v: i64 = value
                    .trim()
                    .parse()
                    .map_err(|_| format!("`{value}` is not an integer"))?;
                if let Some(min) = min
                    && v < *min
                {
                    return Err(format!("{v} is below the minimum {min}"));
                }
                if let Some(max) = max
                    && v > *max
                {
                    return Err(format!("{v} is above the maximum {max}"));
                }
                Ok(())
            }
            ParamType::Float => value
                .trim()
                .parse::<f64>()
                .map(|_| ())
                .map_err(|_| format!("`{value}` is not a number")),
            ParamType::Bool => match value.trim() {
                "true" | "false" => Ok(()),
                _ => Err(format!("`{value}` is not `true` or `false`")),
            },
            ParamType::Enum { values } => {
                if values.iter().any(|v| v == value) {
                    Ok(())
                } else {
                    Err(format!("expected one of: {values:?}"))
                }
            }
        }
    }
}

/// A declared parameter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParamDecl {
    pub key: String,
    /// Value in the default instance; absent parameters are not created.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<String>,
    #[serde(default)]
    pub value_type: ParamType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

impl ParamDecl {
    pub fn new(key: impl Into<String>, value_type: ParamType) -> Self {
        Self {
            key: key.into(),
            default: None,
            value_type,
            comment: None,
        }
    }

    pub fn default_value(mut self, v: impl Into<String>) -> Self {
        self.default = Some(v.into());
        self
    }

    pub fn comment(mut self, c: impl Into<String>) -> Self {
        self.comment = Some(c.into());
        self
    }
}

/// A declared child set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChildDecl {
    /// Set type, which is also the kind of its members.
    pub set_type: String,
    /// Identifiers of the sets present in the default instance.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub defaults: Vec<String>,
}

impl ChildDecl {
    pub fn new(set_type: impl Into<String>) -> Self {
        Self {
            set_type: set_type.into(),
            defaults: Vec::new(),
        }
    }

    pub fn with_defaults<I, S>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.defaults = ids.into_iter().map(Into::into).collect();
        self
    }
}

/// Data-driven [`KindSchema`].
///
/// Built-in kinds are written as `KindDecl` values in code; extension kinds
/// are deserialized from descriptor files.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KindDecl {
    pub kind: String,
    /// Module name; defaults to the kind. Ignored for sets.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Top-level module (as opposed to a nested set).
    #[serde(default)]
    pub module: bool,
    /// Parameter holding the identifier.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub identity: Option<String>,
    /// Refuse keys that are not declared.
    #[serde(default)]
    pub strict: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub params: Vec<ParamDecl>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<ChildDecl>,
    /// Sets added when a node of this kind is created on demand, by set type.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub seed: BTreeMap<String, Vec<String>>,
}

impl KindDecl {
    pub fn module(kind: impl Into<String>) -> Self {
        Self::new(kind, true)
    }

    pub fn set(kind: impl Into<String>) -> Self {
        Self::new(kind, false)
    }

    fn new(kind: impl Into<String>, module: bool) -> Self {
        Self {
            kind: kind.into(),
            name: None,
            module,
            identity: None,
            strict: false,
            params: Vec::new(),
            children: Vec::new(),
            seed: BTreeMap::new(),
        }
    }

    pub fn identity(mut self, field: impl Into<String>) -> Self {
        self.identity = Some(field.into());
        self
    }

    pub fn strict(mut self) -> Self {
        self.strict = true;
        self
    }

    pub fn param(mut self, p: ParamDecl) -> Self {
        self.params.push(p);
        self
    }

    pub fn child(mut self, c: ChildDecl) -> Self {
        self.children.push(c);
        self
    }

    pub fn seed<I, S>(mut self, set_type: impl Into<String>, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.seed
            .insert(set_type.into(), ids.into_iter().map(Into::into).collect());
        self
    }

    /// Sets are always filed under their kind; only modules may be renamed.
    fn node_name(&self) -> &str {
        match &self.name {
            Some(name) if self.module => name,
            _ => &self.kind,
        }
    }
}

impl KindSchema for KindDecl {
    fn kind(&self) -> &str {
        &self.kind
    }

    fn is_module(&self) -> bool {
        self.module
    }

    fn construct_default(&self, catalogue: &Catalogue) -> Result<Node, ConstructionError> {
        let mut node = Node::new(&self.kind, self.node_name());
        for p in &self.params {
            if let Some(v) = &p.default {
                node.params.insert(p.key.clone(), v.clone());
            }
            if let Some(c) = &p.comment {
                node.comments.insert(p.key.clone(), c.clone());
            }
        }
        for c in &self.children {
            for id in &c.defaults {
                let mut child = catalogue.construct_default(&c.set_type)?;
                if !assign_identifier(catalogue, &mut child, id) {
                    warn!("default `{}` set of `{}` has no identifier slot", c.set_type, self.kind);
                }
                node.add_child(child);
            }
        }
        Ok(node)
    }

    fn identity_field(&self) -> Option<&str> {
        self.identity.as_deref()
    }

    fn validate(&self, key: &str, value: &str) -> Result<(), String> {
        match self.params.iter().find(|p| p.key == key) {
            Some(p) => p.value_type.check(value),
            None if self.strict => Err(format!("unknown parameter for `{}`", self.kind)),
            None => Ok(()),
        }
    }

    fn declared_child_kinds(&self) -> Vec<String> {
        self.children.iter().map(|c| c.set_type.clone()).collect()
    }

    fn prepare_new(&self, catalogue: &Catalogue, node: &mut Node) {
        for (set_type, ids) in &self.seed {
            for id in ids {
                let present = node
                    .children
                    .get(set_type)
                    .is_some_and(|cs| cs.iter().any(|c| identifier_of(catalogue, c) == *id));
                if present {
                    continue;
                }
                match catalogue.construct_default(set_type) {
                    Ok(mut child) => {
                        assign_identifier(catalogue, &mut child, id);
                        node.add_child(child);
                    }
                    Err(e) => warn!("cannot seed `{set_type}` `{id}` in `{}`: {e}", self.kind),
                }
            }
        }
    }
}

/// A module the catalogue can construct.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KnownModule {
    pub name: String,
    pub kind: String,
    pub origin: Origin,
}

/// Known modules missing from a tree, split by origin.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AvailableModules {
    /// Modules of the default configuration.
    pub core: Vec<String>,
    /// Modules contributed by extensions.
    pub extension: Vec<String>,
}

impl AvailableModules {
    pub fn is_empty(&self) -> bool {
        self.core.is_empty() && self.extension.is_empty()
    }
}

struct Entry {
    schema: Box<dyn KindSchema>,
    origin: Origin,
}

/// Registry of node kinds.
///
/// Not thread-safe; it belongs to the editing thread.
#[derive(Default)]
pub struct Catalogue {
    kinds: HashMap<String, Entry>,
    depth: Cell<usize>,
}

impl fmt::Debug for Catalogue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut kinds: Vec<_> = self.kinds.keys().collect();
        kinds.sort();
        f.debug_struct("Catalogue").field("kinds", &kinds).finish()
    }
}

impl Catalogue {
    /// An empty catalogue.
    pub fn new() -> Self {
        Self::default()
    }

    /// A catalogue holding the built-in kinds.
    pub fn builtin() -> Self {
        let mut catalogue = Self::new();
        for decl in crate::builtin::kinds() {
            catalogue.register(decl, Origin::Builtin);
        }
        catalogue
    }

    /// Register a kind. Returns `false` if the kind name is taken; the
    /// first registration wins.
    pub fn register(&mut self, schema: impl KindSchema + 'static, origin: Origin) -> bool {
        let kind = schema.kind().to_string();
        if kind == GENERIC_KIND || self.kinds.contains_key(&kind) {
            warn!("kind `{kind}` is already registered, ignoring {origin} registration");
            return false;
        }
        debug!("registered {origin} kind `{kind}`");
        self.kinds.insert(
            kind,
            Entry {
                schema: Box::new(schema),
                origin,
            },
        );
        true
    }

    pub fn get(&self, kind: &str) -> Option<&dyn KindSchema> {
        self.kinds.get(kind).map(|e| e.schema.as_ref())
    }

    pub fn contains(&self, kind: &str) -> bool {
        self.kinds.contains_key(kind)
    }

    pub fn origin(&self, kind: &str) -> Option<Origin> {
        self.kinds.get(kind).map(|e| e.origin)
    }

    /// Registered kind names, sorted.
    pub fn kinds(&self) -> Vec<&str> {
        let mut kinds: Vec<&str> = self.kinds.keys().map(String::as_str).collect();
        kinds.sort_unstable();
        kinds
    }

    /// Build the default instance of `kind`.
    pub fn construct_default(&self, kind: &str) -> Result<Node, ConstructionError> {
        if kind == GENERIC_KIND {
            return Err(ConstructionError::NoDefault(kind.to_string()));
        }
        let schema = self
            .get(kind)
            .ok_or_else(|| ConstructionError::UnknownKind(kind.to_string()))?;

        let depth = self.depth.get();
        if depth >= MAX_CONSTRUCT_DEPTH {
            return Err(ConstructionError::TooDeep(kind.to_string()));
        }
        self.depth.set(depth + 1);
        let result = schema.construct_default(self);
        self.depth.set(depth);
        result
    }

    /// Identifier parameter of `kind`, if any.
    pub fn identity_field(&self, kind: &str) -> Option<&str> {
        self.get(kind).and_then(|s| s.identity_field())
    }

    /// Validate a value through the schema of `kind`.
    ///
    /// Kinds without a schema accept everything.
    pub fn validate(&self, kind: &str, key: &str, value: &str) -> Result<(), String> {
        match self.get(kind) {
            Some(schema) => schema.validate(key, value),
            None => Ok(()),
        }
    }

    /// Every module kind that can be constructed, with its module name.
    ///
    /// Kinds whose construction fails are left out.
    pub fn known_modules(&self) -> Vec<KnownModule> {
        let mut modules: Vec<KnownModule> = self
            .kinds
            .iter()
            .filter(|(_, e)| e.schema.is_module())
            .filter_map(|(kind, e)| match self.construct_default(kind) {
                Ok(node) => Some(KnownModule {
                    name: node.name,
                    kind: kind.clone(),
                    origin: e.origin,
                }),
                Err(err) => {
                    debug!("skipping module kind `{kind}`: {err}");
                    None
                }
            })
            .collect();
        modules.sort_by(|a, b| a.name.cmp(&b.name));
        modules
    }

    /// The default configuration: every built-in module.
    pub fn default_tree(&self) -> Tree {
        let mut tree = Tree::new();
        for m in self.known_modules() {
            if m.origin != Origin::Builtin {
                continue;
            }
            match self.construct_default(&m.kind) {
                Ok(node) => {
                    tree.insert(node);
                }
                Err(e) => warn!("default module `{}` unavailable: {e}", m.name),
            }
        }
        tree
    }

    /// Known modules that `tree` does not contain yet.
    pub fn available_modules(&self, tree: &Tree) -> AvailableModules {
        let mut available = AvailableModules::default();
        for m in self.known_modules() {
            if tree.contains(&m.name) {
                continue;
            }
            match m.origin {
                Origin::Builtin => available.core.push(m.name),
                Origin::Extension => available.extension.push(m.name),
            }
        }
        available
    }

    /// Default module instances by module name, for comment reconciliation.
    ///
    /// Built-in modules take precedence over extension modules of the same
    /// name.
    pub fn comment_catalogue(&self) -> BTreeMap<String, Node> {
        let mut defaults = BTreeMap::new();
        let mut known = self.known_modules();
        known.sort_by_key(|m| m.origin != Origin::Builtin);
        for m in known {
            if defaults.contains_key(&m.name) {
                continue;
            }
            if let Ok(node) = self.construct_default(&m.kind) {
                defaults.insert(m.name, node);
            }
        }
        defaults
    }

    /// Construct the default module named `name`.
    pub fn construct_module(&self, name: &str) -> Result<Node, ConstructionError> {
        let kind = self
            .known_modules()
            .into_iter()
            .find(|m| m.name == name)
            .map(|m| m.kind)
            .ok_or_else(|| ConstructionError::UnknownKind(name.to_string()))?;
        self.construct_default(&kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Catalogue {
        let mut c = Catalogue::new();
        c.register(
            KindDecl::module("top")
                .strict()
                .param(
                    ParamDecl::new("count", ParamType::Int { min: Some(0), max: Some(9) })
                        .default_value("1")
                        .comment("how many"),
                )
                .child(ChildDecl::new("item").with_defaults(["a", "b"])),
            Origin::Builtin,
        );
        c.register(KindDecl::set("item").identity("id"), Origin::Builtin);
        c
    }

    #[test]
    fn test_construct_default() {
        let c = sample();
        let top = c.construct_default("top").unwrap();
        assert_eq!(top.name, "top");
        assert_eq!(top.param("count"), Some("1"));
        assert_eq!(top.comments["count"], "how many");
        let ids: Vec<_> = top.children["item"]
            .iter()
            .map(|n| n.param("id").unwrap())
            .collect();
        assert_eq!(ids, vec!["a", "b"]);
    }

    #[test]
    fn test_construct_unknown_and_generic() {
        let c = sample();
        assert_eq!(
            c.construct_default("nope").unwrap_err(),
            ConstructionError::UnknownKind("nope".into())
        );
        assert!(matches!(
            c.construct_default(GENERIC_KIND),
            Err(ConstructionError::NoDefault(_))
        ));
    }

    #[test]
    fn test_cyclic_declarations_fail() {
        let mut c = Catalogue::new();
        c.register(
            KindDecl::set("loop").child(ChildDecl::new("loop").with_defaults(["x"])),
            Origin::Extension,
        );
        assert_eq!(
            c.construct_default("loop").unwrap_err(),
            ConstructionError::TooDeep("loop".into())
        );
        // depth counter is restored after failure
        c.register(KindDecl::set("plain"), Origin::Extension);
        assert!(c.construct_default("plain").is_ok());
    }

    #[test]
    fn test_validate() {
        let c = sample();
        assert!(c.validate("top", "count", "5").is_ok());
        assert!(c.validate("top", "count", "10").is_err());
        assert!(c.validate("top", "count", "five").is_err());
        assert!(c.validate("top", "other", "x").is_err());
        assert!(c.validate("item", "anything", "x").is_ok());
        assert!(c.validate("unregistered", "anything", "x").is_ok());
    }

    #[test]
    fn test_param_types() {
        assert!(ParamType::Float.check("-1.5").is_ok());
        assert!(ParamType::Float.check("abc").is_err());
        assert!(ParamType::Bool.check("true").is_ok());
        assert!(ParamType::Bool.check("yes").is_err());
        let e = ParamType::Enum {
            values: vec!["a".into(), "b".into()],
        };
        assert!(e.check("a").is_ok());
        assert!(e.check("c").is_err());
    }

    #[test]
    fn test_duplicate_registration_ignored() {
        let mut c = sample();
        assert!(!c.register(KindDecl::module("top"), Origin::Extension));
        assert_eq!(c.origin("top"), Some(Origin::Builtin));
        assert!(!c.register(KindDecl::module(GENERIC_KIND), Origin::Extension));
    }

    #[test]
    fn test_available_modules() {
        let mut c = sample();
        c.register(KindDecl::module("contrib"), Origin::Extension);
        let mut tree = Tree::new();
        assert_eq!(
            c.available_modules(&tree),
            AvailableModules {
                core: vec!["top".into()],
                extension: vec!["contrib".into()],
            }
        );
        tree.insert(c.construct_module("contrib").unwrap());
        let available = c.available_modules(&tree);
        assert!(available.extension.is_empty());
        assert_eq!(c.default_tree().module_names(), vec!["top"]);
    }

    struct Counted {
        built: std::rc::Rc<Cell<usize>>,
    }

    impl KindSchema for Counted {
        fn kind(&self) -> &str {
            "counted"
        }

        fn is_module(&self) -> bool {
            true
        }

        fn construct_default(&self, _: &Catalogue) -> Result<Node, ConstructionError> {
            self.built.set(self.built.get() + 1);
            Ok(Node::new("counted", "counted"))
        }
    }

    #[test]
    fn test_single_threaded_schema() {
        let built = std::rc::Rc::new(Cell::new(0));
        let mut c = Catalogue::new();
        assert!(c.register(Counted { built: built.clone() }, Origin::Extension));
        c.construct_default("counted").unwrap();
        c.construct_default("counted").unwrap();
        assert_eq!(built.get(), 2);
    }
}
