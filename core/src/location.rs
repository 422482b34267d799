//! file: core/src/location.rs
//! description: front-end source positions carried by declarations.
//!
//! The lowering pass never reads source text; these positions only flow
//! through so diagnostics can point back at the declaration site.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Default, Hash, Serialize, Deserialize)]
pub struct Location {
    /// The file in which the location is found.
    pub file: String,
    /// The line number of the location.
    pub line: usize,
    /// The column number of the location.
    pub column: usize,
}

impl Location {
    /// Creates a new `Location`.
    pub fn new(file: impl Into<String>, line: usize, column: usize) -> Self {
        Self { file: file.into(), line, column }
    }
}

impl std::fmt::Display for Location {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}:{}", self.file, self.line, self.column)
    }
}

/// Render an optional location the way diagnostics expect it.
pub fn describe(loc: Option<&Location>) -> String {
    match loc {
        Some(l) => l.to_string(),
        None => "unknown location".to_string(),
    }
}
