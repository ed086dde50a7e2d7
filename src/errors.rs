//! Error types for reconciliation, linkage and fold assembly.
//!
//! Every variant here is fatal for a run. Data-quality findings that only
//! warrant a warning (ambiguous cross-links, uncovered sentences, alignment
//! references to missing nodes during validation) are reported through
//! [`crate::ValidationReport`] and `tracing` instead.

use thiserror::Error;

use crate::alignment::Side;

/// Errors that abort a treealign run.
#[derive(Debug, Error)]
pub enum AlignError {
    /// A node id that cannot be decomposed into sentence and local number.
    #[error("malformed node id `{id}`: expected a number, an underscore and another number (e.g. `s3_44`)")]
    MalformedId { id: String },

    /// The same node id occurs twice inside one sentence.
    #[error("node id `{id}` occurs more than once in sentence `{sentence}`")]
    DuplicateNodeId { sentence: String, id: String },

    /// An id mapping would stop being one-to-one.
    #[error("cannot map `{old}` to `{new}`: already mapped to `{existing}`")]
    MappingConflict {
        old: String,
        new: String,
        existing: String,
    },

    /// An aligned node id has no entry in the node→sentence linkage.
    #[error("{side}-side node `{node_id}` is not linked to any sentence")]
    UnlinkedNode { side: Side, node_id: String },

    /// Fold count outside `1..=items`.
    #[error("invalid fold count {folds} for {items} sentence pair(s)")]
    InvalidFoldCount { folds: usize, items: usize },

    /// A fold references a sentence that the treebank does not contain.
    #[error("{side}-side sentence `{sentence_id}` referenced by a fold does not exist in the treebank")]
    UnknownSentenceId { side: Side, sentence_id: String },

    /// A fold output's sentence order disagrees with its fold.
    #[error("{side}-side fold output {file} is out of order at position {position}: expected sentence `{expected}`, found `{actual}`")]
    PositionMismatch {
        file: String,
        side: Side,
        position: usize,
        expected: String,
        actual: String,
    },

    /// A configuration file could not be read or parsed.
    #[error("invalid configuration {path}: {message}")]
    Config { path: String, message: String },
}

/// Result type for treealign operations.
pub type AlignResult<T> = Result<T, AlignError>;
