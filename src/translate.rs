//! Maps on-screen key identifiers to document mutations and caret placement.
//!
//! Translation is pure: it reads the current selection and the ancestor path
//! of its start and returns what should happen. Applying the result is up to
//! the controller.

use crate::config::BlockPolicy;
use crate::document::{Bias, Mutation, ResolvedPos, Selection};
use crate::keyboard::{Key, LayoutName};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CaretTarget {
    pub pos: usize,
    pub bias: Bias,
}

impl CaretTarget {
    pub fn forward(pos: usize) -> Self {
        Self {
            pos,
            bias: Bias::Forward,
        }
    }

    pub fn backward(pos: usize) -> Self {
        Self {
            pos,
            bias: Bias::Backward,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Translation {
    /// Apply `mutation`, then place the caret. `caret: None` keeps the
    /// selection as the document maps it through the mutation.
    Edit {
        mutation: Mutation,
        caret: Option<CaretTarget>,
    },
    Layout {
        layout: LayoutName,
    },
    Ignore,
}

pub fn translate(
    key: &Key,
    layout: LayoutName,
    selection: Selection,
    from: &ResolvedPos,
    policy: &BlockPolicy,
) -> Translation {
    match key {
        Key::Char(_) | Key::Space => {
            let Some(c) = key.text() else {
                return Translation::Ignore;
            };
            Translation::Edit {
                mutation: Mutation::ReplaceWithText {
                    from: selection.from,
                    to: selection.to,
                    text: c.to_string(),
                },
                caret: Some(CaretTarget::forward(selection.from + 1)),
            }
        }
        Key::Enter => enter(from, policy),
        Key::Backspace => backspace(selection, from, policy),
        Key::Shift => Translation::Layout {
            layout: layout.toggled_shift(),
        },
        Key::Numbers => Translation::Layout {
            layout: LayoutName::Numbers,
        },
        Key::Default => Translation::Layout {
            layout: LayoutName::Default,
        },
        Key::Unknown(_) => Translation::Ignore,
    }
}

fn enter(from: &ResolvedPos, policy: &BlockPolicy) -> Translation {
    let mut depth = from.depth();
    while depth > 0 && !policy.enter_anchor.matches(from.node(depth)) {
        depth -= 1;
    }
    if depth == 0 {
        depth = from.depth();
    }

    // A caret directly in the root (empty document) gets its first block in place.
    let insert_pos = from.node(depth).after().unwrap_or(from.pos);

    Translation::Edit {
        mutation: Mutation::InsertBlock {
            pos: insert_pos,
            block_type: policy.paragraph_type.clone(),
        },
        caret: Some(CaretTarget::forward(insert_pos + 1)),
    }
}

fn backspace(selection: Selection, from: &ResolvedPos, policy: &BlockPolicy) -> Translation {
    if !selection.is_empty() {
        return Translation::Edit {
            mutation: Mutation::Delete {
                from: selection.from,
                to: selection.to,
            },
            caret: None,
        };
    }

    let target = (1..=from.depth())
        .rev()
        .find(|&d| from.node(d).type_name == policy.paragraph_type)
        .unwrap_or(from.depth());

    if target > 0 {
        let block = from.node(target);
        if selection.from == block.start && block.content_size() == 0 {
            return remove_empty_block(from, target);
        }
    }

    if selection.from == 0 {
        return Translation::Ignore;
    }

    Translation::Edit {
        mutation: Mutation::Delete {
            from: selection.from - 1,
            to: selection.from,
        },
        caret: None,
    }
}

fn remove_empty_block(from: &ResolvedPos, target: usize) -> Translation {
    let block = from.node(target);
    let parent = from.node(target - 1);
    let (Some(block_start), Some(block_end)) = (block.before, block.after()) else {
        return Translation::Ignore;
    };

    let range = match (parent.before, parent.after()) {
        (Some(start), Some(end)) if parent.child_count == 1 => (start, end),
        // The root cannot be removed, and removing its last block would leave nothing to type into.
        (None, _) if parent.child_count <= 1 => return Translation::Ignore,
        _ => (block_start, block_end),
    };

    Translation::Edit {
        mutation: Mutation::Delete {
            from: range.0,
            to: range.1,
        },
        caret: Some(CaretTarget::backward(block_start.saturating_sub(1))),
    }
}
