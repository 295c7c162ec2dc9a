//! In-memory accessibility tree
//!
//! A scripted stand-in for a running application: a node tree loaded from a
//! YAML fixture, with click and key effects that mutate it. Used by the unit
//! tests and served over the bridge protocol by the `mock-bridge` binary.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::common::{Error, Result};

use super::{Driver, Handle, MouseButton, NodeInfo, Query, Segment};

fn default_showing() -> bool {
    true
}

/// A node of the scripted tree
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TreeNode {
    pub role: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub position: (i32, i32),
    #[serde(default)]
    pub size: (i32, i32),
    #[serde(default = "default_showing")]
    pub showing: bool,
    #[serde(default)]
    pub checked: bool,
    /// Number of reads that see an empty text before `text` shows up
    #[serde(default)]
    pub text_delay: u32,
    /// Applied on a left (or middle) click
    #[serde(default)]
    pub on_click: Vec<Effect>,
    /// Applied on a right click
    #[serde(default)]
    pub on_right_click: Vec<Effect>,
    #[serde(default)]
    pub children: Vec<TreeNode>,
}

impl TreeNode {
    /// Leaf node with a role and a name
    pub fn new(role: &str, name: &str) -> Self {
        Self {
            role: role.to_string(),
            name: name.to_string(),
            showing: true,
            ..Self::default()
        }
    }

    /// Builder: append a child
    pub fn with_child(mut self, child: TreeNode) -> Self {
        self.children.push(child);
        self
    }

    /// Builder: set the text
    pub fn with_text(mut self, text: &str) -> Self {
        self.text = text.to_string();
        self
    }

    /// Builder: set the description
    pub fn with_description(mut self, description: &str) -> Self {
        self.description = description.to_string();
        self
    }

    /// Builder: set the checked state
    pub fn with_checked(mut self, checked: bool) -> Self {
        self.checked = checked;
        self
    }

    /// Builder: set the showing state
    pub fn with_showing(mut self, showing: bool) -> Self {
        self.showing = showing;
        self
    }

    /// Builder: set the position
    pub fn with_position(mut self, x: i32, y: i32) -> Self {
        self.position = (x, y);
        self
    }

    /// Builder: add a left-click effect
    pub fn on_click(mut self, effect: Effect) -> Self {
        self.on_click.push(effect);
        self
    }

    fn label(&self) -> String {
        if self.name.is_empty() {
            self.role.clone()
        } else {
            self.name.clone()
        }
    }
}

/// State change applied to the first node matching `target`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Effect {
    pub target: Query,
    #[serde(default)]
    pub showing: Option<bool>,
    #[serde(default)]
    pub checked: Option<bool>,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub position: Option<(i32, i32)>,
}

impl Effect {
    /// Effect that shows or hides the target
    pub fn show(target: Query, showing: bool) -> Self {
        Self {
            target,
            showing: Some(showing),
            ..Self::default()
        }
    }

    /// Effect that moves the target
    pub fn move_to(target: Query, x: i32, y: i32) -> Self {
        Self {
            target,
            position: Some((x, y)),
            ..Self::default()
        }
    }
}

/// A complete scripted application
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Fixture {
    /// Effects keyed by key combination, e.g. `<Esc>`
    #[serde(default)]
    pub keys: HashMap<String, Vec<Effect>>,
    /// Tree root; applications hang below it
    pub root: TreeNode,
}

impl Fixture {
    /// Parse a YAML fixture
    pub fn from_yaml(text: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(text)?)
    }
}

/// Interaction recorded by the driver, in call order
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Click { node: String, button: MouseButton },
    Point { node: String },
    Focus { node: String },
    Key(String),
    Type(String),
    Launch(String),
    Terminate(String),
}

/// Driver over an in-memory tree
#[derive(Debug, Clone)]
pub struct MemoryDriver {
    initial: Fixture,
    fixture: Fixture,
    journal: Vec<Action>,
}

impl MemoryDriver {
    /// Driver over a bare tree with no key effects
    pub fn new(root: TreeNode) -> Self {
        Self::from_fixture(Fixture {
            keys: HashMap::new(),
            root,
        })
    }

    /// Driver over a full fixture
    pub fn from_fixture(fixture: Fixture) -> Self {
        Self {
            initial: fixture.clone(),
            fixture,
            journal: Vec::new(),
        }
    }

    /// Interactions so far
    pub fn journal(&self) -> &[Action] {
        &self.journal
    }

    /// Mutable access to a node, for tests that change the UI underneath a scenario
    pub fn node_mut(&mut self, handle: &Handle) -> Result<&mut TreeNode> {
        let path = self.resolve(handle)?;
        Ok(self.node_at_mut(&path))
    }

    fn node_at(&self, path: &[usize]) -> &TreeNode {
        path.iter()
            .fold(&self.fixture.root, |node, &i| &node.children[i])
    }

    fn node_at_mut(&mut self, path: &[usize]) -> &mut TreeNode {
        let mut node = &mut self.fixture.root;
        for &i in path {
            node = &mut node.children[i];
        }
        node
    }

    /// Resolve a handle to an index path from the root
    fn resolve(&self, handle: &Handle) -> Result<Vec<usize>> {
        let mut at: Vec<usize> = Vec::new();

        for segment in handle.segments() {
            match segment {
                Segment::Descendant(query) => {
                    let found = find_descendant(self.node_at(&at), query)
                        .ok_or_else(|| Error::NodeNotFound(handle.to_string()))?;
                    at.extend(found);
                }
                Segment::Parent => {
                    if at.pop().is_none() {
                        return Err(Error::NodeNotFound(handle.to_string()));
                    }
                }
                Segment::Child { index } => {
                    let count = self.node_at(&at).children.len() as i64;
                    let i = if *index < 0 { count + index } else { *index };
                    if i < 0 || i >= count {
                        return Err(Error::NodeNotFound(handle.to_string()));
                    }
                    at.push(i as usize);
                }
            }
        }

        Ok(at)
    }

    fn apply(&mut self, effects: &[Effect]) -> Result<()> {
        for effect in effects {
            let target = Handle::root().child(effect.target.clone());
            let node = self.node_mut(&target)?;
            if let Some(showing) = effect.showing {
                node.showing = showing;
            }
            if let Some(checked) = effect.checked {
                node.checked = checked;
            }
            if let Some(text) = &effect.text {
                node.text = text.clone();
            }
            if let Some(position) = effect.position {
                node.position = position;
            }
        }
        Ok(())
    }
}

fn find_descendant(node: &TreeNode, query: &Query) -> Option<Vec<usize>> {
    for (i, child) in node.children.iter().enumerate() {
        if query.matches(&child.role, &child.name, &child.description) {
            return Some(vec![i]);
        }
        if let Some(mut rest) = find_descendant(child, query) {
            rest.insert(0, i);
            return Some(rest);
        }
    }
    None
}

impl Driver for MemoryDriver {
    fn inspect(&mut self, node: &Handle) -> Result<NodeInfo> {
        let path = self.resolve(node)?;
        let node = self.node_at_mut(&path);

        let text = if node.text_delay > 0 {
            node.text_delay -= 1;
            String::new()
        } else {
            node.text.clone()
        };

        Ok(NodeInfo {
            role: node.role.clone(),
            name: node.name.clone(),
            description: node.description.clone(),
            text,
            position: node.position,
            size: node.size,
            showing: node.showing,
            checked: node.checked,
            child_count: node.children.len(),
        })
    }

    fn click(&mut self, node: &Handle, button: MouseButton) -> Result<()> {
        let path = self.resolve(node)?;
        let target = self.node_at(&path);
        let label = target.label();
        let effects = match button {
            MouseButton::Right => target.on_right_click.clone(),
            _ => target.on_click.clone(),
        };
        self.journal.push(Action::Click { node: label, button });
        self.apply(&effects)
    }

    fn point(&mut self, node: &Handle) -> Result<()> {
        let path = self.resolve(node)?;
        let label = self.node_at(&path).label();
        self.journal.push(Action::Point { node: label });
        Ok(())
    }

    fn grab_focus(&mut self, node: &Handle) -> Result<()> {
        let path = self.resolve(node)?;
        let label = self.node_at(&path).label();
        self.journal.push(Action::Focus { node: label });
        Ok(())
    }

    fn key_combo(&mut self, combo: &str) -> Result<()> {
        self.journal.push(Action::Key(combo.to_string()));
        let effects = self.fixture.keys.get(combo).cloned().unwrap_or_default();
        self.apply(&effects)
    }

    fn type_text(&mut self, text: &str) -> Result<()> {
        self.journal.push(Action::Type(text.to_string()));
        Ok(())
    }

    fn launch(&mut self, app: &str) -> Result<()> {
        self.fixture = self.initial.clone();
        self.journal.push(Action::Launch(app.to_string()));
        Ok(())
    }

    fn terminate(&mut self, app: &str) -> Result<()> {
        self.journal.push(Action::Terminate(app.to_string()));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn viewer() -> MemoryDriver {
        let panel = TreeNode::new("page tab list", "")
            .with_child(TreeNode::new("label", "Size"))
            .with_child(TreeNode::new("label", "").with_text("800 × 600 pixels"))
            .with_child(TreeNode::new("label", "Type:"))
            .with_child(TreeNode::new("label", "").with_text("image/png"));

        let app = TreeNode::new("application", "eog").with_child(
            TreeNode::new("frame", "Eye of GNOME")
                .with_child(panel)
                .with_child(
                    TreeNode::new("push button", "Fullscreen").on_click(Effect::move_to(
                        Query::role("drawing area"),
                        0,
                        0,
                    )),
                )
                .with_child(TreeNode::new("drawing area", "").with_position(0, 46)),
        );

        MemoryDriver::new(TreeNode::new("desktop", "").with_child(app))
    }

    #[test]
    fn test_descendant_parent_and_index() {
        let mut driver = viewer();
        let value = Handle::application("eog")
            .child(Query::role("page tab list"))
            .named("Size")
            .parent()
            .nth(1);
        assert_eq!(driver.inspect(&value).unwrap().text, "800 × 600 pixels");

        let last = Handle::application("eog")
            .child(Query::role("page tab list"))
            .nth(-1);
        assert_eq!(driver.inspect(&last).unwrap().text, "image/png");
    }

    #[test]
    fn test_missing_node_is_not_found() {
        let mut driver = viewer();
        let handle = Handle::application("eog").button("Hide");
        match driver.inspect(&handle) {
            Err(Error::NodeNotFound(what)) => assert!(what.contains("Hide")),
            other => panic!("Expected NodeNotFound, got {other:?}"),
        }

        let out_of_range = Handle::application("eog").nth(5);
        assert!(matches!(
            driver.inspect(&out_of_range),
            Err(Error::NodeNotFound(_))
        ));
    }

    #[test]
    fn test_click_applies_effects_and_journals() {
        let mut driver = viewer();
        let area = Handle::application("eog").child(Query::role("drawing area"));
        assert_eq!(driver.inspect(&area).unwrap().position, (0, 46));

        driver
            .click(&Handle::application("eog").button("Fullscreen"), MouseButton::Left)
            .unwrap();
        assert_eq!(driver.inspect(&area).unwrap().position, (0, 0));
        assert_eq!(
            driver.journal(),
            &[Action::Click {
                node: "Fullscreen".to_string(),
                button: MouseButton::Left
            }]
        );
    }

    #[test]
    fn test_text_delay_counts_down() {
        let mut root = TreeNode::new("desktop", "");
        let mut label = TreeNode::new("label", "size").with_text("1 × 1 pixels");
        label.text_delay = 2;
        root.children.push(label);
        let mut driver = MemoryDriver::new(root);

        let handle = Handle::root().named("size");
        assert_eq!(driver.inspect(&handle).unwrap().text, "");
        assert_eq!(driver.inspect(&handle).unwrap().text, "");
        assert_eq!(driver.inspect(&handle).unwrap().text, "1 × 1 pixels");
    }

    #[test]
    fn test_launch_restores_initial_state() {
        let mut driver = viewer();
        let area = Handle::application("eog").child(Query::role("drawing area"));
        driver
            .click(&Handle::application("eog").button("Fullscreen"), MouseButton::Left)
            .unwrap();
        driver.launch("eog").unwrap();
        assert_eq!(driver.inspect(&area).unwrap().position, (0, 46));
    }

    #[test]
    fn test_fixture_from_yaml() {
        let fixture = Fixture::from_yaml(
            r#"
keys:
  "<Esc>":
    - target: { role: dialog }
      showing: false
root:
  role: desktop
  children:
    - role: application
      name: eog
      children:
        - role: dialog
          name: About
"#,
        )
        .unwrap();

        let mut driver = MemoryDriver::from_fixture(fixture);
        let dialog = Handle::application("eog").child(Query::role("dialog"));
        assert!(driver.inspect(&dialog).unwrap().showing);
        driver.key_combo("<Esc>").unwrap();
        assert!(!driver.inspect(&dialog).unwrap().showing);
    }
}
