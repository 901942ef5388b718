// src/error.rs
use std::path::PathBuf;

use thiserror::Error;

use crate::document::NodeId;

/// Errors surfaced by the highlighting core
#[derive(Debug, Error)]
pub enum HighlightError {
    #[error("invalid color {0:?}, expected #rrggbb")]
    InvalidColor(String),

    #[error("invalid generation response: {0}")]
    InvalidResponse(#[from] serde_json::Error),

    #[error(transparent)]
    Document(#[from] DocumentError),
}

/// Rejections from the document mutation interface
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DocumentError {
    #[error("no text node with id {0}")]
    UnknownNode(NodeId),

    #[error("range {start}..={end} is outside node {node} (length {len})")]
    OutOfRange {
        node: NodeId,
        start: usize,
        end: usize,
        len: usize,
    },
}

/// Counter store failures; callers treat these as an absent counter
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("counter store unavailable: {0}")]
    Unavailable(String),

    #[error("sqlite: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("failed to create store directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        source: std::io::Error,
    },
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not determine config directory")]
    NoConfigDir,

    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to write config {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),
}
