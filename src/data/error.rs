use std::path::PathBuf;

use thiserror::Error;

// ---------------------------------------------------------------------------
// Load errors
// ---------------------------------------------------------------------------

/// Everything that can go wrong between a file on disk and a cleaned table.
///
/// An empty filter result is *not* an error; see [`crate::data::metrics`].
#[derive(Debug, Error)]
pub enum LoadError {
    /// The source could not be opened or read at all.
    #[error("cannot read {}: {source}", path.display())]
    SourceUnavailable {
        path: PathBuf,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("unsupported file extension .{extension} ({})", path.display())]
    UnsupportedFormat { path: PathBuf, extension: String },

    #[error("required column '{column}' is missing")]
    MissingColumn { column: String },

    /// A row failed to parse. Loading is fail-fast: the first bad row
    /// rejects the whole source. `row` is the 0-based data row index.
    #[error("row {row}: {reason}")]
    MalformedRecord { row: usize, reason: String },
}

impl LoadError {
    pub fn unavailable(
        path: impl Into<PathBuf>,
        source: impl Into<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        LoadError::SourceUnavailable {
            path: path.into(),
            source: source.into(),
        }
    }

    pub fn malformed(row: usize, reason: impl Into<String>) -> Self {
        LoadError::MalformedRecord {
            row,
            reason: reason.into(),
        }
    }
}
