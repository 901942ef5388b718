// src/models.rs
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::document::{HighlightDocument, NodeId};
use crate::error::HighlightError;

/// Two sentences the generation service judged to contradict each other
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConflictPair {
    pub first: String,
    pub second: String,
}

impl ConflictPair {
    pub fn new(first: impl Into<String>, second: impl Into<String>) -> Self {
        Self {
            first: first.into(),
            second: second.into(),
        }
    }

    /// Accepts exactly a two-element array of strings.
    pub fn from_value(value: &Value) -> Result<Self, MalformedPair> {
        let items = value.as_array().ok_or(MalformedPair::NotAnArray)?;
        match items.as_slice() {
            [Value::String(first), Value::String(second)] => Ok(Self::new(first, second)),
            [_, _] => Err(MalformedPair::NonStringElement),
            other => Err(MalformedPair::WrongLength(other.len())),
        }
    }

    pub fn sentences(&self) -> [&str; 2] {
        [&self.first, &self.second]
    }
}

/// Why a raw conflict entry was skipped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MalformedPair {
    NotAnArray,
    WrongLength(usize),
    NonStringElement,
}

/// Parse a raw `conflicts` list. A missing or non-array list is zero pairs;
/// malformed entries are dropped and counted.
pub fn parse_conflicts(conflicts: Option<&Value>) -> (Vec<ConflictPair>, usize) {
    let Some(entries) = conflicts.and_then(Value::as_array) else {
        return (Vec::new(), 0);
    };

    let mut pairs = Vec::with_capacity(entries.len());
    let mut malformed = 0;
    for (index, entry) in entries.iter().enumerate() {
        match ConflictPair::from_value(entry) {
            Ok(pair) => pairs.push(pair),
            Err(reason) => {
                log::debug!("skipping malformed conflict #{}: {:?}", index, reason);
                malformed += 1;
            }
        }
    }
    (pairs, malformed)
}

/// A located character range within one text node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextSpan {
    pub node: NodeId,
    pub start: usize,
    pub end_inclusive: usize,
}

#[allow(clippy::len_without_is_empty)]
impl TextSpan {
    /// Located spans always cover at least one character.
    pub fn len(&self) -> usize {
        self.end_inclusive - self.start + 1
    }
}

/// Body posted to the generation service
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationRequest {
    pub content: String,
}

impl GenerationRequest {
    pub fn for_document<D: HighlightDocument + ?Sized>(doc: &D) -> Self {
        Self {
            content: doc.full_text(),
        }
    }
}

/// Reply from the generation service. Conflicts are kept raw so that a single
/// bad entry does not reject the whole response.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GenerationResponse {
    #[serde(default)]
    pub map_png_base64: Option<String>,
    #[serde(default)]
    pub conflicts: Option<Value>,
}

impl GenerationResponse {
    pub fn from_json(json: &str) -> Result<Self, HighlightError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn conflict_pairs(&self) -> (Vec<ConflictPair>, usize) {
        parse_conflicts(self.conflicts.as_ref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_pair_from_value() {
        let pair = ConflictPair::from_value(&json!(["A.", "B."])).unwrap();
        assert_eq!(pair, ConflictPair::new("A.", "B."));
    }

    #[test]
    fn test_malformed_pairs() {
        assert_eq!(
            ConflictPair::from_value(&json!("A.")),
            Err(MalformedPair::NotAnArray)
        );
        assert_eq!(
            ConflictPair::from_value(&json!(["A.", "B.", "C."])),
            Err(MalformedPair::WrongLength(3))
        );
        assert_eq!(
            ConflictPair::from_value(&json!(["A.", 3])),
            Err(MalformedPair::NonStringElement)
        );
    }

    #[test]
    fn test_parse_conflicts_counts_malformed() {
        let raw = json!([["A.", "B."], ["only one"], null, ["C.", "D."]]);
        let (pairs, malformed) = parse_conflicts(Some(&raw));

        assert_eq!(pairs.len(), 2);
        assert_eq!(pairs[1], ConflictPair::new("C.", "D."));
        assert_eq!(malformed, 2);
    }

    #[test]
    fn test_parse_conflicts_absent_is_empty() {
        assert_eq!(parse_conflicts(None), (Vec::new(), 0));
        assert_eq!(parse_conflicts(Some(&Value::Null)), (Vec::new(), 0));
        assert_eq!(parse_conflicts(Some(&json!({"a": 1}))), (Vec::new(), 0));
    }

    #[test]
    fn test_response_without_conflicts() {
        let response = GenerationResponse::from_json(r#"{"map_png_base64": "iVBOR"}"#).unwrap();
        assert_eq!(response.map_png_base64.as_deref(), Some("iVBOR"));
        assert_eq!(response.conflict_pairs().0.len(), 0);
    }

    #[test]
    fn test_span_len() {
        let span = TextSpan {
            node: NodeId(0),
            start: 4,
            end_inclusive: 9,
        };
        assert_eq!(span.len(), 6);
    }
}
