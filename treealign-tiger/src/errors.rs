//! Error types for reading and writing treebank and alignment files.

use thiserror::Error;
use treealign::AlignError;

/// Errors that can occur at the file boundary.
#[derive(Debug, Error)]
pub enum TigerError {
    /// Malformed XML.
    #[error("XML error: {0}")]
    Xml(#[from] quick_xml::Error),

    /// A file could not be read or written.
    #[error("I/O error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// A required attribute is absent.
    #[error("<{element}> is missing required attribute `{attribute}`")]
    MissingAttribute { element: String, attribute: String },

    /// A required child element is absent.
    #[error("<{parent}> is missing required element <{element}>")]
    MissingElement { parent: String, element: String },

    /// Well-formed XML that is not the expected document shape.
    #[error("unexpected document structure: {message}")]
    Structure { message: String },

    /// A treebank referenced by an alignment document does not exist.
    #[error("treebank file `{filename}` not found")]
    TreebankNotFound { filename: String },

    #[error(transparent)]
    Align(#[from] AlignError),
}

/// Result type for file operations.
pub type TigerResult<T> = Result<T, TigerError>;

impl TigerError {
    pub(crate) fn io(path: &std::path::Path, source: std::io::Error) -> Self {
        TigerError::Io {
            path: path.display().to_string(),
            source,
        }
    }
}
