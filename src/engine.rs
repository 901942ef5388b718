// src/engine.rs
//! Highlighting passes over a document.
//!
//! A pass draws one color per conflict pair, locates both sentences and paints
//! them. When a sentence's first character is already painted by an earlier
//! pair, only the first half of the span is repainted so both memberships stay
//! visible. Only the first character is inspected; a third overlapping pair
//! repaints the same half instead of subdividing further.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::color::{Color, ColorCounter, ColorCycler};
use crate::config::HighlightConfig;
use crate::document::HighlightDocument;
use crate::locator::{enumerate_text_spans, TextLocator};
use crate::models::{parse_conflicts, ConflictPair, TextSpan};

/// Starting hue for a fresh pass; the first color drawn lands on hue 0.
pub const DEFAULT_START_HUE: i64 = -20;

/// What the paint rule did to one span
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaintOutcome {
    /// Span was unhighlighted and is now fully painted
    Full,
    /// Span was already highlighted; its first half was repainted
    Half,
    /// Span was already highlighted and too short to halve
    Empty,
    /// The document rejected the range
    Failed,
}

/// Per-pass counts, including everything that was skipped
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HighlightReport {
    pub pairs_processed: usize,
    pub pairs_malformed: usize,
    pub sentences_not_found: usize,
    pub spans_painted_full: usize,
    pub spans_painted_half: usize,
    pub spans_failed: usize,
    /// Colors in the order they were assigned to pairs
    pub colors: Vec<Color>,
}

impl HighlightReport {
    pub fn skipped(&self) -> usize {
        self.pairs_malformed + self.sentences_not_found + self.spans_failed
    }

    fn record(&mut self, outcome: PaintOutcome) {
        match outcome {
            PaintOutcome::Full => self.spans_painted_full += 1,
            PaintOutcome::Half => self.spans_painted_half += 1,
            PaintOutcome::Empty => {}
            PaintOutcome::Failed => self.spans_failed += 1,
        }
    }
}

pub struct HighlightEngine {
    cycler: ColorCycler,
    start_hue: i64,
}

impl HighlightEngine {
    pub fn new(counter: ColorCounter) -> Self {
        Self {
            cycler: ColorCycler::new(counter),
            start_hue: DEFAULT_START_HUE,
        }
    }

    pub fn from_config(config: &HighlightConfig, counter: ColorCounter) -> Self {
        Self {
            cycler: ColorCycler::with_palette(
                counter,
                config.hue_step,
                config.saturation,
                config.lightness,
            ),
            start_hue: config.start_hue,
        }
    }

    /// Counter to hand back to the host for persistence
    pub fn counter(&self) -> ColorCounter {
        self.cycler.counter()
    }

    /// Reset the palette to the configured start, then highlight `pairs`.
    pub fn highlight_pass<D: HighlightDocument + ?Sized>(
        &mut self,
        doc: &mut D,
        pairs: &[ConflictPair],
    ) -> HighlightReport {
        self.cycler.reset(self.start_hue);
        self.highlight_pairs(doc, pairs)
    }

    /// Highlight `pairs` continuing from the current counter.
    pub fn highlight_pairs<D: HighlightDocument + ?Sized>(
        &mut self,
        doc: &mut D,
        pairs: &[ConflictPair],
    ) -> HighlightReport {
        let mut report = HighlightReport::default();

        for pair in pairs {
            let color = self.cycler.next_color();

            for sentence in pair.sentences() {
                match TextLocator::find(&*doc, sentence) {
                    Some(span) => report.record(Self::paint(&mut *doc, span, &color)),
                    None => {
                        log::debug!("sentence not found, skipping: {:?}", sentence);
                        report.sentences_not_found += 1;
                    }
                }
            }

            report.pairs_processed += 1;
            report.colors.push(color);
        }

        log::debug!(
            "highlighted {} pairs ({} full, {} half, {} skipped)",
            report.pairs_processed,
            report.spans_painted_full,
            report.spans_painted_half,
            report.skipped()
        );
        report
    }

    /// Run a pass over a raw `conflicts` payload. Malformed entries are
    /// skipped without drawing a color; an absent payload is zero pairs.
    pub fn apply_raw<D: HighlightDocument + ?Sized>(
        &mut self,
        doc: &mut D,
        conflicts: Option<&Value>,
    ) -> HighlightReport {
        let (pairs, malformed) = parse_conflicts(conflicts);
        let mut report = self.highlight_pass(doc, &pairs);
        report.pairs_malformed = malformed;
        report
    }

    /// Paint one located span, merging with what is already there.
    ///
    /// Only the span's first character is inspected. Unhighlighted: the whole
    /// span takes `color`. Highlighted: `[start, start + len / 2)` takes
    /// `color` and the rest keeps its previous color.
    pub fn paint<D: HighlightDocument + ?Sized>(
        doc: &mut D,
        span: TextSpan,
        color: &Color,
    ) -> PaintOutcome {
        let (end, outcome) = match doc.highlight_at(span.node, span.start) {
            None => (span.end_inclusive, PaintOutcome::Full),
            Some(_) => {
                let half = span.len() / 2;
                if half == 0 {
                    return PaintOutcome::Empty;
                }
                (span.start + half - 1, PaintOutcome::Half)
            }
        };

        match doc.set_highlight(span.node, span.start, end, Some(color)) {
            Ok(()) => outcome,
            Err(err) => {
                log::warn!("could not paint span: {}", err);
                PaintOutcome::Failed
            }
        }
    }

    /// Remove every highlight in the document. Returns the number of spans
    /// cleared.
    pub fn clear_all<D: HighlightDocument + ?Sized>(doc: &mut D) -> usize {
        let spans: Vec<TextSpan> = enumerate_text_spans(doc.root()).collect();
        let mut cleared = 0;
        for span in spans {
            match doc.set_highlight(span.node, span.start, span.end_inclusive, None) {
                Ok(()) => cleared += 1,
                Err(err) => log::warn!("could not clear span: {}", err),
            }
        }
        cleared
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{Document, NodeId};

    #[test]
    fn test_paint_full_then_half() {
        let mut doc = Document::from_paragraphs(&["abcdefgh"]);
        let span = TextLocator::find(&doc, "abcdefgh").unwrap();
        let red = Color::parse("#ff0000").unwrap();
        let blue = Color::parse("#0000ff").unwrap();

        assert_eq!(HighlightEngine::paint(&mut doc, span, &red), PaintOutcome::Full);
        assert_eq!(HighlightEngine::paint(&mut doc, span, &blue), PaintOutcome::Half);

        assert_eq!(doc.highlight_at(NodeId(0), 0), Some(blue.clone()));
        assert_eq!(doc.highlight_at(NodeId(0), 3), Some(blue));
        assert_eq!(doc.highlight_at(NodeId(0), 4), Some(red.clone()));
        assert_eq!(doc.highlight_at(NodeId(0), 7), Some(red));
    }

    #[test]
    fn test_half_of_odd_length_rounds_down() {
        let mut doc = Document::from_paragraphs(&["abcde"]);
        let span = TextLocator::find(&doc, "abcde").unwrap();
        let red = Color::parse("#ff0000").unwrap();
        let blue = Color::parse("#0000ff").unwrap();

        HighlightEngine::paint(&mut doc, span, &red);
        HighlightEngine::paint(&mut doc, span, &blue);

        assert_eq!(doc.highlight_at(NodeId(0), 1), Some(blue));
        assert_eq!(doc.highlight_at(NodeId(0), 2), Some(red));
    }

    #[test]
    fn test_single_char_overlap_paints_nothing() {
        let mut doc = Document::from_paragraphs(&["x"]);
        let span = TextLocator::find(&doc, "x").unwrap();
        let red = Color::parse("#ff0000").unwrap();
        let blue = Color::parse("#0000ff").unwrap();

        HighlightEngine::paint(&mut doc, span, &red);
        assert_eq!(HighlightEngine::paint(&mut doc, span, &blue), PaintOutcome::Empty);
        assert_eq!(doc.highlight_at(NodeId(0), 0), Some(red));
    }

    #[test]
    fn test_only_first_character_is_inspected() {
        let mut doc = Document::from_paragraphs(&["abcdef"]);
        let red = Color::parse("#ff0000").unwrap();
        let blue = Color::parse("#0000ff").unwrap();
        doc.set_highlight(NodeId(0), 2, 5, Some(&red)).unwrap();

        let span = TextLocator::find(&doc, "abcdef").unwrap();
        assert_eq!(HighlightEngine::paint(&mut doc, span, &blue), PaintOutcome::Full);
        assert_eq!(doc.highlight_runs(NodeId(0)).len(), 1);
    }

    #[test]
    fn test_report_counts_not_found() {
        let mut doc = Document::from_paragraphs(&["Alice said A."]);
        let mut engine = HighlightEngine::new(ColorCounter::default());

        let report = engine.highlight_pass(
            &mut doc,
            &[ConflictPair::new("Alice said A.", "Nobody said it.")],
        );

        assert_eq!(report.pairs_processed, 1);
        assert_eq!(report.spans_painted_full, 1);
        assert_eq!(report.sentences_not_found, 1);
        assert_eq!(report.skipped(), 1);
    }
}
