//! Text rendering of trees for the terminal.

use colored::Colorize;
use paramtree::{Catalogue, Differ, Node, Tree, identifier_of, identity::sort_by_identifier};

/// What to print.
#[derive(Debug, Clone, Copy, Default)]
pub struct ShowOptions {
    /// Hide what equals the defaults.
    pub reduced: bool,
    /// Print parameter comments.
    pub comments: bool,
}

/// Render every module of `tree`, changed modules highlighted.
pub fn render_tree(catalogue: &Catalogue, tree: &Tree, opts: ShowOptions) -> String {
    let differ = Differ::new(catalogue);
    let mut out = String::new();

    for view in differ.reduced_tree(tree) {
        let node = if opts.reduced {
            &view.node
        } else {
            &tree.modules[&view.name]
        };
        let header = format!("[{}]", view.name);
        if view.changed {
            out.push_str(&format!("{} {}\n", header.yellow().bold(), "(changed)".yellow()));
        } else {
            out.push_str(&format!("{}\n", header.bold()));
        }
        render_node(catalogue, node, opts, 1, &mut out);
    }
    out
}

fn render_node(catalogue: &Catalogue, node: &Node, opts: ShowOptions, depth: usize, out: &mut String) {
    let indent = "  ".repeat(depth);
    for (key, value) in &node.params {
        out.push_str(&format!("{indent}{} = {}", key.cyan(), value));
        if opts.comments
            && let Some(comment) = node.comments.get(key)
        {
            let comment = comment.replace('\n', " ");
            out.push_str(&format!("  {}", format!("# {comment}").dimmed()));
        }
        out.push('\n');
    }

    for (set_type, sets) in &node.children {
        let mut sets: Vec<&Node> = sets.iter().collect();
        sort_by_identifier(catalogue, &mut sets);
        for set in sets {
            let id = identifier_of(catalogue, set);
            out.push_str(&format!("{indent}{}\n", format!("{set_type}[{id}]").green()));
            render_node(catalogue, set, opts, depth + 1, out);
        }
    }
}

/// One line per module: its name and whether it differs from its default.
pub fn render_status(catalogue: &Catalogue, tree: &Tree) -> String {
    let differ = Differ::new(catalogue);
    let mut out = String::new();
    for name in tree.module_names() {
        let module = &tree.modules[name];
        let state = if differ.has_changes(module) {
            "changed".yellow()
        } else {
            "default".normal()
        };
        out.push_str(&format!("{name:<24} {state}\n"));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use paramtree::{NodePath, ParamEdit, Session, TomlCodec};

    fn edited() -> (Catalogue, Tree) {
        colored::control::set_override(false);
        let catalogue = Catalogue::builtin();
        let mut session = Session::open(&catalogue, TomlCodec, catalogue.default_tree()).unwrap();
        session
            .apply_edits(&[ParamEdit::new(
                NodePath::module("routing"),
                "networkModes",
                "car,pt",
            )])
            .unwrap();
        let tree = session.commit();
        (catalogue, tree)
    }

    #[test]
    fn test_full_view() {
        let (catalogue, tree) = edited();
        let text = render_tree(
            &catalogue,
            &tree,
            ShowOptions {
                reduced: false,
                comments: true,
            },
        );
        assert!(text.contains("[routing] (changed)"));
        assert!(text.contains("[global]\n"));
        assert!(text.contains("randomSeed = 4711  # Seed of the random"));
        assert!(text.contains("  teleportedModeParameters[bike]\n    beelineDistanceFactor"));
    }

    #[test]
    fn test_reduced_view() {
        let (catalogue, tree) = edited();
        let text = render_tree(
            &catalogue,
            &tree,
            ShowOptions {
                reduced: true,
                comments: false,
            },
        );
        assert!(text.contains("networkModes = car,pt\n"));
        assert!(!text.contains("randomSeed"));
        assert!(!text.contains("teleportedModeParameters"));
    }

    #[test]
    fn test_reduced_view_names_changed_set() {
        let (catalogue, tree) = edited();
        let mut session = Session::open(&catalogue, TomlCodec, tree).unwrap();
        let bike = NodePath::module("routing").child("teleportedModeParameters", "bike");
        session
            .apply_edits(&[ParamEdit::new(bike, "teleportedModeSpeed", "4.2")])
            .unwrap();
        let tree = session.commit();

        let text = render_tree(
            &catalogue,
            &tree,
            ShowOptions {
                reduced: true,
                comments: false,
            },
        );
        assert!(text.contains(
            "  teleportedModeParameters[bike]\n    mode = bike\n    teleportedModeSpeed = 4.2\n"
        ));
        assert!(!text.contains("teleportedModeParameters[walk]"));
    }

    #[test]
    fn test_status() {
        let (catalogue, tree) = edited();
        let text = render_status(&catalogue, &tree);
        let routing = text.lines().find(|l| l.starts_with("routing")).unwrap();
        assert!(routing.ends_with("changed"));
        let global = text.lines().find(|l| l.starts_with("global")).unwrap();
        assert!(global.ends_with("default"));
    }
}
