pub mod memory;

use anyhow::Result;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Selection {
    pub from: usize,
    pub to: usize,
}

impl Selection {
    pub fn caret(pos: usize) -> Self {
        Self { from: pos, to: pos }
    }

    pub fn range(from: usize, to: usize) -> Self {
        Self {
            from: from.min(to),
            to: from.max(to),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.from == self.to
    }
}

/// Direction to search when an offset is not itself a valid caret position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Bias {
    Forward,
    Backward,
}

/// One level of the ancestor path of a resolved position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeInfo {
    pub type_name: String,
    /// Type the node's content expression would create by default, if any.
    pub default_child: Option<String>,
    /// Offset of the node's opening boundary. `None` for the document root.
    pub before: Option<usize>,
    /// Offset where the node's content starts.
    pub start: usize,
    /// Offset where the node's content ends.
    pub end: usize,
    pub child_count: usize,
}

impl NodeInfo {
    pub fn content_size(&self) -> usize {
        self.end - self.start
    }

    /// Offset just past the node's closing boundary. `None` for the document root.
    pub fn after(&self) -> Option<usize> {
        self.before.map(|_| self.end + 1)
    }
}

/// An offset together with the chain of nodes that contain it, root first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedPos {
    pub pos: usize,
    pub path: Vec<NodeInfo>,
}

impl ResolvedPos {
    pub fn depth(&self) -> usize {
        self.path.len().saturating_sub(1)
    }

    pub fn node(&self, depth: usize) -> &NodeInfo {
        &self.path[depth]
    }

    pub fn parent(&self) -> &NodeInfo {
        &self.path[self.depth()]
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Mutation {
    ReplaceWithText { from: usize, to: usize, text: String },
    InsertBlock { pos: usize, block_type: String },
    Delete { from: usize, to: usize },
}

/// Who currently holds input focus from the point of view of the editor surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FocusTarget {
    Editor,
    Keyboard,
    Elsewhere,
    #[default]
    None,
}

/// The mounted document surface: state reads, transactions, focus and scrolling.
pub trait EditorView {
    fn selection(&self) -> Selection;

    fn resolve(&self, pos: usize) -> Option<ResolvedPos>;

    /// Apply a mutation atomically. On error the document is left unchanged.
    fn apply(&mut self, mutation: &Mutation) -> Result<()>;

    /// Select the valid caret position nearest to `pos`, searching in `bias` direction first.
    fn select_near(&mut self, pos: usize, bias: Bias);

    fn scroll_into_view(&mut self);

    fn focus(&mut self);

    fn active_target(&self) -> FocusTarget;

    /// Keep the platform's own keyboard from opening over the surface: no
    /// native input mode, no autocomplete, autocorrect or autocapitalize,
    /// while text selection stays enabled.
    fn suppress_native_keyboard(&mut self);
}
