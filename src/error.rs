// Error taxonomy for deck loading and rendering

use thiserror::Error;

/// Errors tied to a single input row. Line numbers are 1-based.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RowError {
    #[error("line {line}: expected at least 6 columns, found {columns}")]
    Structural { line: usize, columns: usize },
    #[error("line {line}: empty card text")]
    EmptyText { line: usize },
    #[error("line {line}: unknown category '{key}' in column 4")]
    UnknownCategory { line: usize, key: String },
    #[error("line {line}: malformed interrupt flag '{value}' in column 5 (expected empty or 'Y')")]
    MalformedFlag { line: usize, value: String },
}

impl RowError {
    /// Blank and separator rows are skipped; everything else stops the run.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, RowError::Structural { .. } | RowError::EmptyText { .. })
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
#[error("Malformed color '{0}': expected six hex digits")]
pub struct MalformedColor(pub String);

#[derive(Error, Debug, Clone, PartialEq)]
pub enum AssetError {
    #[error("Asset not found: {0}")]
    NotFound(String),
    #[error("Failed to decode asset {reference}: {message}")]
    Decode { reference: String, message: String },
}

#[derive(Error, Debug)]
pub enum DeckError {
    #[error(transparent)]
    Row(#[from] RowError),
    #[error("{context}: {source}")]
    Color {
        context: String,
        #[source]
        source: MalformedColor,
    },
    #[error("line {line}: {source}")]
    CardAsset {
        line: usize,
        #[source]
        source: AssetError,
    },
    #[error("Failed to load {context}: {source}")]
    StartupAsset {
        context: String,
        #[source]
        source: AssetError,
    },
    #[error("Failed to load font {path}: {message}")]
    Font { path: String, message: String },
    #[error("Grid slot {slot} is {reason}")]
    Slot { slot: usize, reason: &'static str },
    #[error("Failed to read card data: {0}")]
    Input(String),
    #[error("Invalid configuration: {0}")]
    Config(String),
    #[error("Failed to create PDF: {0}")]
    Pdf(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
