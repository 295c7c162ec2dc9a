//! Accessibility tree access
//!
//! Steps never hold on to live nodes. A [`Handle`] is a path of queries from
//! the tree root that the [`Driver`] resolves again on every call, so a
//! handle outliving a UI change simply resolves to whatever matches now (or
//! to `NodeNotFound`).

pub mod memory;

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::common::Result;

pub use memory::{Action, MemoryDriver};

/// Attribute filter used to find a node
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Query {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl Query {
    /// Match on accessible name only
    pub fn name(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
    }

    /// Match on role only
    pub fn role(role: impl Into<String>) -> Self {
        Self {
            role: Some(role.into()),
            ..Self::default()
        }
    }

    /// Match on description only
    pub fn description(description: impl Into<String>) -> Self {
        Self {
            description: Some(description.into()),
            ..Self::default()
        }
    }

    /// Match on role and name
    pub fn role_name(role: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            role: Some(role.into()),
            name: Some(name.into()),
            description: None,
        }
    }

    /// Check a node's attributes against this query
    pub fn matches(&self, role: &str, name: &str, description: &str) -> bool {
        self.role.as_deref().map_or(true, |r| r == role)
            && self.name.as_deref().map_or(true, |n| n == name)
            && self.description.as_deref().map_or(true, |d| d == description)
    }
}

impl fmt::Display for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.role.as_deref().unwrap_or("*"))?;
        let mut attrs = Vec::new();
        if let Some(name) = &self.name {
            attrs.push(format!("name=\"{name}\""));
        }
        if let Some(description) = &self.description {
            attrs.push(format!("description=\"{description}\""));
        }
        if !attrs.is_empty() {
            write!(f, "[{}]", attrs.join(" "))?;
        }
        Ok(())
    }
}

/// One step of a handle path
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Segment {
    /// First descendant (depth-first, pre-order) matching the query
    Descendant(Query),
    /// Parent of the current node
    Parent,
    /// Child by index; negative indexes count from the end
    Child { index: i64 },
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Segment::Descendant(query) => write!(f, "{query}"),
            Segment::Parent => f.write_str(".."),
            Segment::Child { index } => write!(f, "[{index}]"),
        }
    }
}

/// Lazily resolved reference to a node in the accessibility tree
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Handle {
    path: Vec<Segment>,
}

impl Handle {
    /// The tree root itself
    pub fn root() -> Self {
        Self::default()
    }

    /// The application node: the first descendant of the root with this name
    pub fn application(name: &str) -> Self {
        Self::root().child(Query::role_name("application", name))
    }

    /// Path segments from the root
    pub fn segments(&self) -> &[Segment] {
        &self.path
    }

    fn push(&self, segment: Segment) -> Self {
        let mut path = self.path.clone();
        path.push(segment);
        Self { path }
    }

    /// First descendant matching the query
    pub fn child(&self, query: Query) -> Self {
        self.push(Segment::Descendant(query))
    }

    /// First descendant with this accessible name
    pub fn named(&self, name: &str) -> Self {
        self.child(Query::name(name))
    }

    /// First descendant with role `menu` and this name
    pub fn menu(&self, name: &str) -> Self {
        self.child(Query::role_name("menu", name))
    }

    /// First descendant with role `menu item` and this name
    pub fn menu_item(&self, name: &str) -> Self {
        self.child(Query::role_name("menu item", name))
    }

    /// First descendant with role `push button` and this name
    pub fn button(&self, name: &str) -> Self {
        self.child(Query::role_name("push button", name))
    }

    /// Parent node
    pub fn parent(&self) -> Self {
        self.push(Segment::Parent)
    }

    /// Child by position; negative counts from the end
    pub fn nth(&self, index: i64) -> Self {
        self.push(Segment::Child { index })
    }
}

impl fmt::Display for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.path.is_empty() {
            return f.write_str("<root>");
        }
        let parts: Vec<String> = self.path.iter().map(ToString::to_string).collect();
        f.write_str(&parts.join(" > "))
    }
}

/// Snapshot of a node's attributes
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeInfo {
    pub role: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub text: String,
    /// Screen position (x, y)
    #[serde(default)]
    pub position: (i32, i32),
    /// Extents (width, height)
    #[serde(default)]
    pub size: (i32, i32),
    #[serde(default)]
    pub showing: bool,
    #[serde(default)]
    pub checked: bool,
    #[serde(default)]
    pub child_count: usize,
}

/// Mouse button for synthetic clicks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MouseButton {
    #[default]
    Left,
    Middle,
    Right,
}

/// Accessibility automation backend
///
/// Every method resolves the handle again. A handle that matches nothing
/// fails with `Error::NodeNotFound`.
pub trait Driver {
    /// Read a node's attributes
    fn inspect(&mut self, node: &Handle) -> Result<NodeInfo>;

    /// Click a node
    fn click(&mut self, node: &Handle, button: MouseButton) -> Result<()>;

    /// Move the pointer over a node without clicking
    fn point(&mut self, node: &Handle) -> Result<()>;

    /// Give keyboard focus to a node
    fn grab_focus(&mut self, node: &Handle) -> Result<()>;

    /// Inject a key combination such as `<Ctrl>O` or `<Esc>`
    fn key_combo(&mut self, combo: &str) -> Result<()>;

    /// Type literal text into the focused widget
    fn type_text(&mut self, text: &str) -> Result<()>;

    /// Start the application under test
    fn launch(&mut self, app: &str) -> Result<()>;

    /// Stop the application under test
    fn terminate(&mut self, app: &str) -> Result<()>;
}
