pub mod color;
pub mod config;
pub mod counter_store;
pub mod document;
pub mod engine;
pub mod error;
pub mod locator;
pub mod models;
pub mod session;

pub use color::{hsl_to_hex, Color, ColorCounter, ColorCycler};
pub use config::HighlightConfig;
pub use counter_store::{CounterStore, MemoryCounterStore, SqliteCounterStore};
pub use document::{Document, ElementKind, HighlightDocument, Node, NodeId};
pub use engine::{HighlightEngine, HighlightReport, PaintOutcome};
pub use error::{ConfigError, DocumentError, HighlightError, StoreError};
pub use locator::{enumerate_text_leaves, enumerate_text_spans, TextLocator};
pub use models::{ConflictPair, GenerationRequest, GenerationResponse, TextSpan};
pub use session::HighlightSession;
