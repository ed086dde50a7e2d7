//! TIGER-XML and STA-XML reading and writing for `treealign`.
//!
//! ## Modules
//!
//! - [`element`] - Generic element tree over quick-xml
//! - [`tiger`] - TIGER-XML treebanks
//! - [`sta`] - Stockholm TreeAligner alignment documents
//! - [`paths`] - Treebank path resolution
//! - [`loader`] - Loading a parallel treebank and writing run outputs
//! - [`errors`] - Error types

pub mod element;
pub mod errors;
pub mod loader;
pub mod paths;
pub mod sta;
pub mod tiger;

pub use element::{parse_document, write_document, Content, Element};
pub use errors::{TigerError, TigerResult};
pub use loader::{
    load_alignment, load_treebank, read_file, write_file, ParallelCorpus, TEST_LISTING,
    TRAIN_LISTING,
};
pub use paths::resolve_treebank_path;
pub use sta::StaDocument;
pub use tiger::TigerDocument;
