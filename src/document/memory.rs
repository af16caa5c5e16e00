//! In-memory document model and editor surface.
//!
//! The document is stored as a flat token stream so offsets line up with the
//! usual rich-text convention: every block boundary and every character
//! occupies exactly one unit, and the root node has no boundaries of its own.

use std::collections::BTreeMap;

use anyhow::{anyhow, ensure, Context, Result};
use serde::{Deserialize, Serialize};

use super::{Bias, EditorView, FocusTarget, Mutation, NodeInfo, ResolvedPos, Selection};

pub const TEXT_TYPE: &str = "text";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Schema {
    pub root: String,
    /// Block type -> type created by default as its child.
    pub default_child: BTreeMap<String, String>,
}

impl Default for Schema {
    fn default() -> Self {
        let pairs = [
            ("doc", "blockGroup"),
            ("blockGroup", "blockContainer"),
            ("blockContainer", "paragraph"),
            ("paragraph", TEXT_TYPE),
            ("heading", TEXT_TYPE),
            ("blockquote", "paragraph"),
            ("bulletList", "listItem"),
            ("listItem", "paragraph"),
        ];
        Self {
            root: "doc".to_string(),
            default_child: pairs
                .into_iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        }
    }
}

impl Schema {
    pub fn default_child(&self, block_type: &str) -> Option<&str> {
        self.default_child.get(block_type).map(String::as_str)
    }

    pub fn is_textblock(&self, block_type: &str) -> bool {
        self.default_child(block_type) == Some(TEXT_TYPE)
    }
}

/// Serializable description of a block and its content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeSpec {
    #[serde(rename = "type")]
    pub block_type: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub text: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub content: Vec<NodeSpec>,
}

impl NodeSpec {
    pub fn text_block(block_type: &str, text: &str) -> Self {
        Self {
            block_type: block_type.to_string(),
            text: text.to_string(),
            content: Vec::new(),
        }
    }

    pub fn paragraph(text: &str) -> Self {
        Self::text_block("paragraph", text)
    }

    pub fn container(block_type: &str, content: Vec<NodeSpec>) -> Self {
        Self {
            block_type: block_type.to_string(),
            text: String::new(),
            content,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Token {
    Open(String),
    Char(char),
    Close,
}

/// Where a mutation touched the token stream, after any boundary joining.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StepMap {
    pub from: usize,
    pub to: usize,
    pub inserted: usize,
}

impl StepMap {
    pub fn map(&self, pos: usize) -> usize {
        if pos <= self.from {
            pos
        } else if pos >= self.to {
            pos - (self.to - self.from) + self.inserted
        } else {
            self.from + self.inserted
        }
    }
}

#[derive(Debug, Clone)]
pub struct MemoryDocument {
    schema: Schema,
    tokens: Vec<Token>,
}

impl MemoryDocument {
    pub fn new(schema: Schema, blocks: &[NodeSpec]) -> Result<Self> {
        let mut tokens = Vec::new();
        for block in blocks {
            push_spec(&mut tokens, block);
        }
        let doc = Self { schema, tokens };
        doc.validate().context("invalid document content")?;
        Ok(doc)
    }

    /// A flat document of paragraphs directly under the root.
    pub fn paragraphs(texts: &[&str]) -> Self {
        let mut tokens = Vec::new();
        for text in texts {
            push_spec(&mut tokens, &NodeSpec::paragraph(text));
        }
        Self {
            schema: Schema::default(),
            tokens,
        }
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn size(&self) -> usize {
        self.tokens.len()
    }

    pub fn resolve(&self, pos: usize) -> Option<ResolvedPos> {
        if pos > self.tokens.len() {
            return None;
        }

        let mut open_stack: Vec<usize> = Vec::new();
        for (idx, token) in self.tokens[..pos].iter().enumerate() {
            match token {
                Token::Open(_) => open_stack.push(idx),
                Token::Close => {
                    open_stack.pop();
                }
                Token::Char(_) => {}
            }
        }

        let mut path = vec![NodeInfo {
            type_name: self.schema.root.clone(),
            default_child: self.schema.default_child(&self.schema.root).map(str::to_string),
            before: None,
            start: 0,
            end: self.tokens.len(),
            child_count: self.count_children(0, self.tokens.len()),
        }];

        for before in open_stack {
            let Token::Open(type_name) = &self.tokens[before] else {
                continue;
            };
            let end = self.matching_close(before)?;
            path.push(NodeInfo {
                type_name: type_name.clone(),
                default_child: self.schema.default_child(type_name).map(str::to_string),
                before: Some(before),
                start: before + 1,
                end,
                child_count: self.count_children(before + 1, end),
            });
        }

        Some(ResolvedPos { pos, path })
    }

    /// Nearest offset inside a textblock, or `None` if the document has no textblocks.
    pub fn near(&self, pos: usize, bias: Bias) -> Option<usize> {
        let pos = pos.min(self.tokens.len());
        let ranges = self.textblock_ranges();

        if ranges.iter().any(|&(start, end)| start <= pos && pos <= end) {
            return Some(pos);
        }

        let forward = ranges
            .iter()
            .find(|&&(start, _)| start >= pos)
            .map(|&(start, _)| start);
        let backward = ranges
            .iter()
            .rev()
            .find(|&&(_, end)| end <= pos)
            .map(|&(_, end)| end);

        match bias {
            Bias::Forward => forward.or(backward),
            Bias::Backward => backward.or(forward),
        }
    }

    pub fn apply(&mut self, mutation: &Mutation) -> Result<StepMap> {
        let snapshot = self.tokens.clone();
        let result = self.apply_unchecked(mutation).and_then(|map| {
            self.validate()?;
            Ok(map)
        });
        if result.is_err() {
            self.tokens = snapshot;
        }
        result
    }

    fn apply_unchecked(&mut self, mutation: &Mutation) -> Result<StepMap> {
        match mutation {
            Mutation::ReplaceWithText { from, to, text } => {
                let removed = self.delete_range(*from, *to)?;
                let at = removed.from;
                ensure!(
                    self.parent_is_textblock(at),
                    "text can only be inserted inside a textblock (offset {at})"
                );
                let chars: Vec<Token> = text.chars().map(Token::Char).collect();
                let inserted = chars.len();
                self.tokens.splice(at..at, chars);
                Ok(StepMap {
                    inserted,
                    ..removed
                })
            }
            Mutation::InsertBlock { pos, block_type } => {
                ensure!(
                    *pos <= self.tokens.len(),
                    "offset {pos} is outside the document"
                );
                ensure!(
                    !self.parent_is_textblock(*pos),
                    "cannot insert a block inside a textblock (offset {pos})"
                );
                self.tokens.splice(
                    *pos..*pos,
                    [Token::Open(block_type.clone()), Token::Close],
                );
                Ok(StepMap {
                    from: *pos,
                    to: *pos,
                    inserted: 2,
                })
            }
            Mutation::Delete { from, to } => self.delete_range(*from, *to),
        }
    }

    /// Remove `[from, to)`. A range that leaves blocks open on one side is widened
    /// over adjacent boundaries until both sides balance, which joins the blocks
    /// on either side of the cut.
    fn delete_range(&mut self, from: usize, to: usize) -> Result<StepMap> {
        ensure!(
            from <= to && to <= self.tokens.len(),
            "invalid range {from}..{to} (document size {})",
            self.tokens.len()
        );

        let (mut from, mut to) = (from, to);
        loop {
            let (closes, opens) = unmatched(&self.tokens[from..to]);
            if closes == opens {
                break;
            }
            if opens > closes {
                ensure!(
                    from > 0 && !matches!(self.tokens[from - 1], Token::Char(_)),
                    "cannot join blocks before offset {from}"
                );
                from -= 1;
            } else {
                ensure!(
                    to < self.tokens.len() && !matches!(self.tokens[to], Token::Char(_)),
                    "cannot join blocks after offset {to}"
                );
                to += 1;
            }
        }

        self.tokens.drain(from..to);
        Ok(StepMap {
            from,
            to,
            inserted: 0,
        })
    }

    fn parent_is_textblock(&self, pos: usize) -> bool {
        self.resolve(pos)
            .map(|rp| self.schema.is_textblock(&rp.parent().type_name))
            .unwrap_or(false)
    }

    fn matching_close(&self, open: usize) -> Option<usize> {
        let mut depth = 0usize;
        for (idx, token) in self.tokens.iter().enumerate().skip(open) {
            match token {
                Token::Open(_) => depth += 1,
                Token::Close => {
                    depth -= 1;
                    if depth == 0 {
                        return Some(idx);
                    }
                }
                Token::Char(_) => {}
            }
        }
        None
    }

    fn count_children(&self, start: usize, end: usize) -> usize {
        let mut depth = 0usize;
        let mut count = 0usize;
        let mut in_text = false;
        for token in &self.tokens[start..end] {
            match token {
                Token::Open(_) => {
                    if depth == 0 {
                        count += 1;
                    }
                    depth += 1;
                    in_text = false;
                }
                Token::Close => {
                    depth = depth.saturating_sub(1);
                    in_text = false;
                }
                Token::Char(_) => {
                    if depth == 0 && !in_text {
                        count += 1;
                        in_text = true;
                    }
                }
            }
        }
        count
    }

    fn textblock_ranges(&self) -> Vec<(usize, usize)> {
        let mut out = Vec::new();
        for (idx, token) in self.tokens.iter().enumerate() {
            if let Token::Open(type_name) = token {
                if self.schema.is_textblock(type_name) {
                    if let Some(end) = self.matching_close(idx) {
                        out.push((idx + 1, end));
                    }
                }
            }
        }
        out
    }

    fn validate(&self) -> Result<()> {
        let mut stack: Vec<&str> = Vec::new();
        for (idx, token) in self.tokens.iter().enumerate() {
            let in_textblock = stack
                .last()
                .map(|t| self.schema.is_textblock(t))
                .unwrap_or(false);
            match token {
                Token::Open(type_name) => {
                    ensure!(
                        !in_textblock,
                        "block {type_name:?} nested inside a textblock at offset {idx}"
                    );
                    stack.push(type_name);
                }
                Token::Close => {
                    stack
                        .pop()
                        .ok_or_else(|| anyhow!("unbalanced block boundary at offset {idx}"))?;
                }
                Token::Char(_) => {
                    ensure!(in_textblock, "text outside a textblock at offset {idx}");
                }
            }
        }
        ensure!(stack.is_empty(), "{} block(s) left open", stack.len());
        Ok(())
    }

    /// Text of every textblock in document order.
    pub fn text_blocks(&self) -> Vec<String> {
        self.textblock_ranges()
            .into_iter()
            .map(|(start, end)| self.text_between(start, end))
            .collect()
    }

    /// Like `text_blocks`, with `|` marking a caret offset.
    pub fn text_blocks_with_caret(&self, caret: usize) -> Vec<String> {
        self.textblock_ranges()
            .into_iter()
            .map(|(start, end)| {
                if (start..=end).contains(&caret) {
                    format!(
                        "{}|{}",
                        self.text_between(start, caret),
                        self.text_between(caret, end)
                    )
                } else {
                    self.text_between(start, end)
                }
            })
            .collect()
    }

    fn text_between(&self, start: usize, end: usize) -> String {
        self.tokens[start..end]
            .iter()
            .filter_map(|t| match t {
                Token::Char(c) => Some(*c),
                _ => None,
            })
            .collect()
    }

    pub fn to_specs(&self) -> Vec<NodeSpec> {
        let mut roots: Vec<NodeSpec> = Vec::new();
        let mut stack: Vec<NodeSpec> = Vec::new();
        for token in &self.tokens {
            match token {
                Token::Open(type_name) => stack.push(NodeSpec::container(type_name, Vec::new())),
                Token::Char(c) => {
                    if let Some(node) = stack.last_mut() {
                        node.text.push(*c);
                    }
                }
                Token::Close => {
                    let Some(node) = stack.pop() else {
                        continue;
                    };
                    match stack.last_mut() {
                        Some(parent) => parent.content.push(node),
                        None => roots.push(node),
                    }
                }
            }
        }
        roots
    }
}

fn push_spec(tokens: &mut Vec<Token>, spec: &NodeSpec) {
    tokens.push(Token::Open(spec.block_type.clone()));
    tokens.extend(spec.text.chars().map(Token::Char));
    for child in &spec.content {
        push_spec(tokens, child);
    }
    tokens.push(Token::Close);
}

/// Closes without a matching open, and opens without a matching close.
fn unmatched(tokens: &[Token]) -> (usize, usize) {
    let mut closes = 0usize;
    let mut opens = 0usize;
    for token in tokens {
        match token {
            Token::Open(_) => opens += 1,
            Token::Close => {
                if opens > 0 {
                    opens -= 1;
                } else {
                    closes += 1;
                }
            }
            Token::Char(_) => {}
        }
    }
    (closes, opens)
}

/// An editor surface backed by `MemoryDocument`, with simulated focus handling.
#[derive(Debug, Clone)]
pub struct MemoryView {
    pub doc: MemoryDocument,
    selection: Selection,
    active: FocusTarget,
    /// Number of upcoming `focus()` calls that will not take effect.
    pub focus_refusals: u32,
    pub focus_grants: u32,
    pub scroll_requests: u32,
    pub native_keyboard_suppressed: bool,
}

impl MemoryView {
    pub fn new(doc: MemoryDocument) -> Self {
        let caret = doc.near(0, Bias::Forward).unwrap_or(0);
        Self {
            doc,
            selection: Selection::caret(caret),
            active: FocusTarget::None,
            focus_refusals: 0,
            focus_grants: 0,
            scroll_requests: 0,
            native_keyboard_suppressed: false,
        }
    }

    pub fn set_selection(&mut self, selection: Selection) {
        let size = self.doc.size();
        self.selection = Selection::range(selection.from.min(size), selection.to.min(size));
    }

    /// Simulate focus moving somewhere without going through the editor.
    pub fn set_active_target(&mut self, target: FocusTarget) {
        self.active = target;
    }

    pub fn text_blocks(&self) -> Vec<String> {
        self.doc.text_blocks()
    }

    pub fn text_blocks_with_caret(&self) -> Vec<String> {
        self.doc.text_blocks_with_caret(self.selection.to)
    }
}

impl EditorView for MemoryView {
    fn selection(&self) -> Selection {
        self.selection
    }

    fn resolve(&self, pos: usize) -> Option<ResolvedPos> {
        self.doc.resolve(pos)
    }

    fn apply(&mut self, mutation: &Mutation) -> Result<()> {
        let map = self.doc.apply(mutation)?;
        self.selection = Selection::range(map.map(self.selection.from), map.map(self.selection.to));
        Ok(())
    }

    fn select_near(&mut self, pos: usize, bias: Bias) {
        let caret = self
            .doc
            .near(pos, bias)
            .unwrap_or_else(|| pos.min(self.doc.size()));
        self.selection = Selection::caret(caret);
    }

    fn scroll_into_view(&mut self) {
        self.scroll_requests += 1;
    }

    fn focus(&mut self) {
        if self.focus_refusals > 0 {
            self.focus_refusals -= 1;
            return;
        }
        self.active = FocusTarget::Editor;
        self.focus_grants += 1;
    }

    fn active_target(&self) -> FocusTarget {
        self.active
    }

    fn suppress_native_keyboard(&mut self) {
        self.native_keyboard_suppressed = true;
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn nested() -> MemoryDocument {
        MemoryDocument::new(
            Schema::default(),
            &[NodeSpec::container(
                "blockGroup",
                vec![
                    NodeSpec::container("blockContainer", vec![NodeSpec::paragraph("ab")]),
                    NodeSpec::container("blockContainer", vec![NodeSpec::paragraph("cd")]),
                ],
            )],
        )
        .expect("valid document")
    }

    #[test]
    fn resolves_ancestor_path() {
        let doc = nested();
        // bg(0) bc(1) p(2) a(3) b(4) /p(5) /bc(6) bc(7) p(8) c(9)
        let rp = doc.resolve(9).expect("in range");
        let names: Vec<&str> = rp.path.iter().map(|n| n.type_name.as_str()).collect();
        assert_eq!(names, vec!["doc", "blockGroup", "blockContainer", "paragraph"]);
        assert_eq!(rp.parent().start, 9);
        assert_eq!(rp.parent().before, Some(8));
        assert_eq!(rp.parent().after(), Some(12));
        assert_eq!(rp.node(1).child_count, 2);
        assert_eq!(rp.node(2).child_count, 1);
    }

    #[test]
    fn near_respects_bias() {
        let doc = nested();
        assert_eq!(doc.near(4, Bias::Backward), Some(4));
        assert_eq!(doc.near(6, Bias::Backward), Some(5));
        assert_eq!(doc.near(6, Bias::Forward), Some(9));
        assert_eq!(doc.near(0, Bias::Backward), Some(3));
    }

    #[test]
    fn deleting_a_boundary_joins_blocks() {
        let mut doc = nested();
        let map = doc
            .apply(&Mutation::Delete { from: 8, to: 9 })
            .expect("join should succeed");
        assert_eq!(doc.text_blocks(), vec!["abcd".to_string()]);
        assert_eq!(map.map(9), 5);
    }

    #[test]
    fn rejected_mutation_leaves_document_untouched() {
        let mut doc = MemoryDocument::paragraphs(&["ab"]);
        let err = doc
            .apply(&Mutation::Delete { from: 0, to: 1 })
            .unwrap_err();
        assert!(format!("{err:#}").contains("cannot join"));
        assert_eq!(doc.text_blocks(), vec!["ab".to_string()]);

        assert!(doc
            .apply(&Mutation::InsertBlock {
                pos: 2,
                block_type: "paragraph".to_string()
            })
            .is_err());
        assert_eq!(doc.size(), 4);
    }

    #[test]
    fn specs_round_trip_through_tokens() {
        let doc = nested();
        let again = MemoryDocument::new(Schema::default(), &doc.to_specs()).expect("valid");
        assert_eq!(again.text_blocks(), doc.text_blocks());
        assert_eq!(again.size(), doc.size());
    }

    #[test]
    fn text_outside_textblocks_is_rejected() {
        let err = MemoryDocument::new(
            Schema::default(),
            &[NodeSpec::text_block("blockGroup", "oops")],
        )
        .unwrap_err();
        assert!(format!("{err:#}").contains("text outside a textblock"));
    }
}
