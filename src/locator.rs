// src/locator.rs
//! Finding sentences in a document and walking its text leaves.

use crate::document::{HighlightDocument, Node, TextNode};
use crate::models::TextSpan;

/// Locates sentences within a document's text leaves.
///
/// Matching is literal and first-match only: if a sentence occurs more than
/// once, or inside a longer sentence, the earliest occurrence in document
/// order wins. A sentence that straddles two leaves is not found.
pub struct TextLocator;

impl TextLocator {
    pub fn find<D: HighlightDocument + ?Sized>(doc: &D, sentence: &str) -> Option<TextSpan> {
        if sentence.is_empty() {
            return None;
        }

        enumerate_text_leaves(doc.root()).find_map(|leaf| {
            let byte_start = leaf.text.find(sentence)?;
            let start = leaf.text[..byte_start].chars().count();
            let len = sentence.chars().count();
            Some(TextSpan {
                node: leaf.id,
                start,
                end_inclusive: start + len - 1,
            })
        })
    }
}

/// Depth-first iterator over the text leaves below a node
pub struct TextLeaves<'a> {
    stack: Vec<std::slice::Iter<'a, Node>>,
    pending: Option<&'a TextNode>,
}

impl<'a> Iterator for TextLeaves<'a> {
    type Item = &'a TextNode;

    fn next(&mut self) -> Option<Self::Item> {
        if let Some(leaf) = self.pending.take() {
            return Some(leaf);
        }

        while let Some(children) = self.stack.last_mut() {
            match children.next() {
                Some(Node::Text(leaf)) => return Some(leaf),
                Some(Node::Container(container)) => self.stack.push(container.children.iter()),
                None => {
                    self.stack.pop();
                }
            }
        }
        None
    }
}

/// Every text leaf under `root`, left to right, top to bottom.
pub fn enumerate_text_leaves(root: &Node) -> TextLeaves<'_> {
    match root {
        Node::Text(leaf) => TextLeaves {
            stack: Vec::new(),
            pending: Some(leaf),
        },
        Node::Container(container) => TextLeaves {
            stack: vec![container.children.iter()],
            pending: None,
        },
    }
}

/// A whole-node span for every non-empty text leaf under `root`.
pub fn enumerate_text_spans(root: &Node) -> impl Iterator<Item = TextSpan> + '_ {
    enumerate_text_leaves(root).filter_map(|leaf| {
        let len = leaf.len_chars();
        (len > 0).then(|| TextSpan {
            node: leaf.id,
            start: 0,
            end_inclusive: len - 1,
        })
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{Document, ElementKind, NodeId};

    fn nested_document() -> Document {
        Document::new(Node::container(
            ElementKind::Body,
            vec![
                Node::paragraph("They left Lok."),
                Node::container(
                    ElementKind::Table,
                    vec![
                        Node::container(
                            ElementKind::TableRow,
                            vec![
                                Node::container(
                                    ElementKind::TableCell,
                                    vec![Node::paragraph("Lok")],
                                ),
                                Node::container(ElementKind::TableCell, vec![Node::paragraph("")]),
                            ],
                        ),
                        Node::container(
                            ElementKind::TableRow,
                            vec![Node::container(
                                ElementKind::TableCell,
                                vec![Node::paragraph("Erendale")],
                            )],
                        ),
                    ],
                ),
                Node::container(
                    ElementKind::List,
                    vec![Node::container(
                        ElementKind::ListItem,
                        vec![Node::text("It took two days.")],
                    )],
                ),
            ],
        ))
    }

    #[test]
    fn test_find_returns_first_match() {
        let doc = Document::from_paragraphs(&["Lok is north.", "Lok is south."]);
        let span = TextLocator::find(&doc, "Lok is").unwrap();

        assert_eq!(span.node, NodeId(0));
        assert_eq!((span.start, span.end_inclusive), (0, 5));
    }

    #[test]
    fn test_find_matches_substring_of_longer_sentence() {
        let doc = Document::from_paragraphs(&["They rested. They rested again."]);
        let span = TextLocator::find(&doc, "They rested again.").unwrap();
        assert_eq!((span.start, span.end_inclusive), (13, 30));

        // Shorter sentence lands on the earlier occurrence
        let span = TextLocator::find(&doc, "They rested").unwrap();
        assert_eq!(span.start, 0);
    }

    #[test]
    fn test_find_uses_character_offsets() {
        let doc = Document::from_paragraphs(&["Café in Ærø. Then home."]);
        let span = TextLocator::find(&doc, "Then home.").unwrap();

        assert_eq!((span.start, span.end_inclusive), (13, 22));
    }

    #[test]
    fn test_find_not_found() {
        let doc = Document::from_paragraphs(&["Alice said A.", "Bob said B."]);

        assert!(TextLocator::find(&doc, "Carol said C.").is_none());
        assert!(TextLocator::find(&doc, "").is_none());
        // Does not match across block boundaries
        assert!(TextLocator::find(&doc, "A.\nBob").is_none());
    }

    #[test]
    fn test_enumerate_leaves_in_document_order() {
        let doc = nested_document();
        let texts: Vec<_> = enumerate_text_leaves(doc.root())
            .map(|leaf| leaf.text.as_str())
            .collect();

        assert_eq!(
            texts,
            vec!["They left Lok.", "Lok", "", "Erendale", "It took two days."]
        );
    }

    #[test]
    fn test_enumerate_spans_skips_empty_leaves() {
        let doc = nested_document();
        let spans: Vec<_> = enumerate_text_spans(doc.root()).collect();

        assert_eq!(spans.len(), 4);
        assert_eq!(spans[1], TextSpan { node: NodeId(1), start: 0, end_inclusive: 2 });
        assert_eq!(spans[2].node, NodeId(3));
    }

    #[test]
    fn test_enumerate_from_bare_leaf() {
        let root = Node::text("alone");
        assert_eq!(enumerate_text_leaves(&root).count(), 1);
    }
}
