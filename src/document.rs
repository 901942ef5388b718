// src/document.rs
//! Structured document model and the host-facing document interface.
//!
//! The tree is a closed set of node kinds: text leaves carry literal text and
//! highlight runs, containers (paragraphs, list items, table cells, ...) only
//! carry children. Offsets are character offsets, not byte offsets.

use std::fmt;

use pulldown_cmark::{Event, Options, Parser, Tag, TagEnd};
use serde::{Deserialize, Serialize};

use crate::color::Color;
use crate::error::DocumentError;

/// Identifier of a text leaf, assigned in document order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(pub usize);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ElementKind {
    Body,
    Paragraph,
    Heading,
    List,
    ListItem,
    BlockQuote,
    Table,
    TableRow,
    TableCell,
    CodeBlock,
}

/// A contiguous highlighted character range inside one text node
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HighlightRun {
    pub start: usize,
    pub end_inclusive: usize,
    pub color: Color,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextNode {
    #[serde(default = "unassigned_id")]
    pub id: NodeId,
    pub text: String,
    /// Sorted, non-overlapping, same-color neighbours coalesced
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub highlights: Vec<HighlightRun>,
}

fn unassigned_id() -> NodeId {
    NodeId(usize::MAX)
}

impl TextNode {
    pub fn len_chars(&self) -> usize {
        self.text.chars().count()
    }

    pub fn highlight_at(&self, offset: usize) -> Option<&Color> {
        self.highlights
            .iter()
            .find(|run| run.start <= offset && offset <= run.end_inclusive)
            .map(|run| &run.color)
    }

    /// Drop runs past the end of the text, clip the rest, then sort,
    /// resolve overlaps (later runs win) and coalesce.
    fn normalize_highlights(&mut self) {
        let len = self.len_chars();
        let runs = std::mem::take(&mut self.highlights);
        for run in runs {
            if run.start > run.end_inclusive || run.start >= len {
                continue;
            }
            let end = run.end_inclusive.min(len - 1);
            self.set_highlight(run.start, end, Some(&run.color));
        }
    }

    /// Overwrite `[start, end]` with `color`, or clear it when `color` is `None`.
    fn set_highlight(&mut self, start: usize, end: usize, color: Option<&Color>) {
        let mut runs = Vec::with_capacity(self.highlights.len() + 2);

        for run in self.highlights.drain(..) {
            if run.end_inclusive < start || run.start > end {
                runs.push(run);
                continue;
            }
            if run.start < start {
                runs.push(HighlightRun {
                    start: run.start,
                    end_inclusive: start - 1,
                    color: run.color.clone(),
                });
            }
            if run.end_inclusive > end {
                runs.push(HighlightRun {
                    start: end + 1,
                    end_inclusive: run.end_inclusive,
                    color: run.color,
                });
            }
        }

        if let Some(color) = color {
            runs.push(HighlightRun {
                start,
                end_inclusive: end,
                color: color.clone(),
            });
        }

        runs.sort_by_key(|run| run.start);

        let mut merged: Vec<HighlightRun> = Vec::with_capacity(runs.len());
        for run in runs {
            match merged.last_mut() {
                Some(prev) if prev.end_inclusive + 1 == run.start && prev.color == run.color => {
                    prev.end_inclusive = run.end_inclusive;
                }
                _ => merged.push(run),
            }
        }
        self.highlights = merged;
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContainerNode {
    pub element: ElementKind,
    #[serde(default)]
    pub children: Vec<Node>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Node {
    Text(TextNode),
    Container(ContainerNode),
}

impl Node {
    pub fn text(text: impl Into<String>) -> Self {
        Node::Text(TextNode {
            id: unassigned_id(),
            text: text.into(),
            highlights: Vec::new(),
        })
    }

    pub fn container(element: ElementKind, children: Vec<Node>) -> Self {
        Node::Container(ContainerNode { element, children })
    }

    /// A paragraph holding a single text leaf
    pub fn paragraph(text: impl Into<String>) -> Self {
        Node::container(ElementKind::Paragraph, vec![Node::text(text)])
    }
}

/// Read and mutation interface the highlighting core needs from a host document.
pub trait HighlightDocument {
    /// Root of the structural tree, walked for bulk operations
    fn root(&self) -> &Node;

    /// Full searchable text of the document
    fn full_text(&self) -> String;

    /// Highlight color of one character, `None` when unhighlighted
    fn highlight_at(&self, node: NodeId, offset: usize) -> Option<Color>;

    /// Set or clear the highlight on `[start, end_inclusive]` of one text node.
    fn set_highlight(
        &mut self,
        node: NodeId,
        start: usize,
        end_inclusive: usize,
        color: Option<&Color>,
    ) -> Result<(), DocumentError>;
}

/// In-memory document tree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "DocumentRepr")]
pub struct Document {
    root: Node,
}

/// Wire form of a document; ids and runs are rebuilt on the way in
#[derive(Deserialize)]
struct DocumentRepr {
    root: Node,
}

impl From<DocumentRepr> for Document {
    fn from(repr: DocumentRepr) -> Self {
        Document::new(repr.root)
    }
}

impl Document {
    /// Take ownership of a tree, number its text leaves in document order and
    /// fit every highlight run to its leaf's text.
    pub fn new(mut root: Node) -> Self {
        let mut next = 0;
        prepare_leaves(&mut root, &mut next);
        Self { root }
    }

    /// A body of plain paragraphs
    pub fn from_paragraphs<S: AsRef<str>>(paragraphs: &[S]) -> Self {
        let children = paragraphs.iter().map(|p| Node::paragraph(p.as_ref())).collect();
        Self::new(Node::container(ElementKind::Body, children))
    }

    /// Build a document from markdown. Inline formatting is flattened into the
    /// enclosing block's text.
    pub fn from_markdown(markdown: &str) -> Self {
        let mut options = Options::empty();
        options.insert(Options::ENABLE_TABLES);

        let mut stack: Vec<(ElementKind, Vec<Node>)> = vec![(ElementKind::Body, Vec::new())];
        let mut current_text = String::new();

        let flush = |stack: &mut Vec<(ElementKind, Vec<Node>)>, text: &mut String| {
            if text.is_empty() {
                return;
            }
            if let Some((_, children)) = stack.last_mut() {
                children.push(Node::text(std::mem::take(text)));
            }
        };

        for event in Parser::new_ext(markdown, options) {
            match event {
                Event::Start(tag) => {
                    if let Some(element) = block_element(&tag) {
                        flush(&mut stack, &mut current_text);
                        stack.push((element, Vec::new()));
                    }
                }
                Event::End(tag) => {
                    if is_block_end(&tag) && stack.len() > 1 {
                        flush(&mut stack, &mut current_text);
                        if let Some((element, children)) = stack.pop() {
                            if let Some((_, parent)) = stack.last_mut() {
                                parent.push(Node::container(element, children));
                            }
                        }
                    }
                }
                Event::Text(text) | Event::Code(text) => current_text.push_str(&text),
                Event::SoftBreak | Event::HardBreak => current_text.push(' '),
                _ => {}
            }
        }

        flush(&mut stack, &mut current_text);

        // Unbalanced input leaves frames open; fold them into their parents.
        while stack.len() > 1 {
            if let Some((element, children)) = stack.pop() {
                if let Some((_, parent)) = stack.last_mut() {
                    parent.push(Node::container(element, children));
                }
            }
        }

        let children = stack.pop().map(|(_, children)| children).unwrap_or_default();
        Self::new(Node::container(ElementKind::Body, children))
    }

    pub fn text_node(&self, id: NodeId) -> Option<&TextNode> {
        find_leaf(&self.root, id)
    }

    pub fn highlight_runs(&self, id: NodeId) -> &[HighlightRun] {
        self.text_node(id)
            .map(|node| node.highlights.as_slice())
            .unwrap_or(&[])
    }
}

impl HighlightDocument for Document {
    fn root(&self) -> &Node {
        &self.root
    }

    fn full_text(&self) -> String {
        crate::locator::enumerate_text_leaves(&self.root)
            .map(|leaf| leaf.text.as_str())
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn highlight_at(&self, node: NodeId, offset: usize) -> Option<Color> {
        self.text_node(node)?.highlight_at(offset).cloned()
    }

    fn set_highlight(
        &mut self,
        node: NodeId,
        start: usize,
        end_inclusive: usize,
        color: Option<&Color>,
    ) -> Result<(), DocumentError> {
        let leaf = find_leaf_mut(&mut self.root, node).ok_or(DocumentError::UnknownNode(node))?;
        let len = leaf.len_chars();
        if start > end_inclusive || end_inclusive >= len {
            return Err(DocumentError::OutOfRange {
                node,
                start,
                end: end_inclusive,
                len,
            });
        }
        leaf.set_highlight(start, end_inclusive, color);
        Ok(())
    }
}

fn block_element(tag: &Tag<'_>) -> Option<ElementKind> {
    let element = match tag {
        Tag::Paragraph => ElementKind::Paragraph,
        Tag::Heading { .. } => ElementKind::Heading,
        Tag::List(_) => ElementKind::List,
        Tag::Item => ElementKind::ListItem,
        Tag::BlockQuote(_) => ElementKind::BlockQuote,
        Tag::CodeBlock(_) => ElementKind::CodeBlock,
        Tag::Table(_) => ElementKind::Table,
        Tag::TableHead | Tag::TableRow => ElementKind::TableRow,
        Tag::TableCell => ElementKind::TableCell,
        _ => return None,
    };
    Some(element)
}

fn is_block_end(tag: &TagEnd) -> bool {
    matches!(
        tag,
        TagEnd::Paragraph
            | TagEnd::Heading(_)
            | TagEnd::List(_)
            | TagEnd::Item
            | TagEnd::BlockQuote(_)
            | TagEnd::CodeBlock
            | TagEnd::Table
            | TagEnd::TableHead
            | TagEnd::TableRow
            | TagEnd::TableCell
    )
}

fn prepare_leaves(node: &mut Node, next: &mut usize) {
    match node {
        Node::Text(leaf) => {
            leaf.id = NodeId(*next);
            *next += 1;
            leaf.normalize_highlights();
        }
        Node::Container(container) => {
            for child in &mut container.children {
                prepare_leaves(child, next);
            }
        }
    }
}

fn find_leaf(node: &Node, id: NodeId) -> Option<&TextNode> {
    match node {
        Node::Text(leaf) => (leaf.id == id).then_some(leaf),
        Node::Container(container) => container.children.iter().find_map(|c| find_leaf(c, id)),
    }
}

fn find_leaf_mut(node: &mut Node, id: NodeId) -> Option<&mut TextNode> {
    match node {
        Node::Text(leaf) => (leaf.id == id).then_some(leaf),
        Node::Container(container) => container
            .children
            .iter_mut()
            .find_map(|c| find_leaf_mut(c, id)),
    }
}
