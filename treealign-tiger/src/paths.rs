//! Locating treebank files referenced by an alignment document.

use std::path::{Path, PathBuf};

use crate::errors::{TigerError, TigerResult};

/// Resolve a `<treebank filename="...">` reference.
///
/// The reference is used as given when it names an existing file. A bare
/// file name (no `/`) is then looked up next to the alignment file.
pub fn resolve_treebank_path(filename: &str, alignment_path: &Path) -> TigerResult<PathBuf> {
    let given = PathBuf::from(filename);
    if given.is_file() {
        return Ok(given);
    }

    if !filename.contains('/') {
        let alignment_path = alignment_path
            .canonicalize()
            .unwrap_or_else(|_| alignment_path.to_path_buf());
        if let Some(dir) = alignment_path.parent() {
            let candidate = dir.join(filename);
            if candidate.is_file() {
                return Ok(candidate);
            }
        }
    }

    Err(TigerError::TreebankNotFound {
        filename: filename.to_string(),
    })
}
