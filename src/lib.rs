//! Node-identifier reconciliation and alignment-preserving cross-validation
//! folds for parallel treebanks.
//!
//! A parallel treebank is two syntax-tree corpora (source and target side)
//! plus an alignment document pairing node ids across them. This crate works
//! on the parsed, in-memory form of those documents; reading and writing
//! TIGER-XML / STA-XML lives in `treealign-tiger`.
//!
//! ## Modules
//!
//! - [`ids`] - Node id grammar and canonical-form rules
//! - [`treebank`] - Sentences, terminals, non-terminals and edges
//! - [`alignment`] - Node-to-node alignment documents
//! - [`mapping`] - Bidirectional old→new id mapping
//! - [`resolver`] - Detects and repairs non-canonical node ids
//! - [`linker`] - Node→sentence linkage and sentence-pair derivation
//! - [`folds`] - k-fold rotation over sentence-pair keys
//! - [`assembler`] - Per-fold treebank and alignment extraction
//! - [`naming`] - Output file naming for fold copies
//! - [`validation`] - Cross-reference checks and their report
//! - [`pipeline`] - Fold generation and normalization runs
//! - [`config`] - TOML run configuration
//! - [`errors`] - Error types
//!
//! ## Example
//!
//! ```
//! use treealign::{partition, SentencePairKey};
//!
//! let keys: Vec<_> = (1..=23)
//!     .map(|n| SentencePairKey::new(format!("s{}", n), format!("t{}", n)))
//!     .collect();
//! let copies = partition(&keys, 10).unwrap();
//! assert_eq!(copies.len(), 10);
//! assert_eq!(copies[0].test.len(), 3);
//! assert_eq!(copies[9].test.len(), 2);
//! ```

pub mod alignment;
pub mod assembler;
pub mod config;
pub mod errors;
pub mod folds;
pub mod ids;
pub mod linker;
pub mod mapping;
pub mod naming;
pub mod pipeline;
pub mod resolver;
pub mod treebank;
pub mod validation;

pub use alignment::{AlignmentDocument, AlignmentPair, Side, TreebankRef};
pub use assembler::{
    extract_alignment_fold, extract_treebank_fold, verify_positional_alignment, PositionIndex,
};
pub use config::{Config, FoldConfig, NormalizeConfig};
pub use errors::{AlignError, AlignResult};
pub use folds::{
    fold_listing, fold_sizes, partition, shuffle_keys, FoldCopy, FoldRole, DEFAULT_FOLD_COUNT,
};
pub use ids::{is_canonical, NodeId};
pub use linker::{
    derive_sentence_pairs, detect_cross_link, link_nodes_to_sentences, uncovered_sentences,
    CrossLinkWarning, NodeLinks, SentencePairKey, SentencePairs,
};
pub use mapping::IdentifierMapping;
pub use naming::{extended_stem, FoldFileNames, FoldStems};
pub use pipeline::{
    generate_folds, normalize_corpus, FoldArtifacts, FoldInputs, FoldRun, NormalizationReport,
    SideNormalization,
};
pub use resolver::{
    non_canonical_sentences, reconcile_sentence, reconcile_treebank, renumber_sentence_ids,
    IdAllocator,
};
pub use treebank::{
    Attributes, Edge, NodeKind, NodeRef, NonTerminal, Sentence, SentenceCensus, Terminal,
    Treebank,
};
pub use validation::{validate_alignment, DanglingEdge, MissingNode, ValidationReport};

#[cfg(test)]
mod tests {
    mod fold_properties;
    mod normalize;
    mod pipeline;
}
