//! Output file names for fold copies.
//!
//! Copy `i` (1-based) of an input with stem `S` is written as
//! `S.rand<i>.train.xml` and `S.rand<i>.test.xml`, for both treebanks and
//! the alignment file.

use std::path::Path;

use crate::folds::FoldRole;

/// File name without directory and without its final extension.
///
/// `~/corpus/308DE_LIT.xml` → `308DE_LIT`, `a.b.xml` → `a.b`. A name
/// without a `.` is its own stem.
pub fn extended_stem(path: &str) -> String {
    let name = Path::new(path)
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.to_string());
    match name.rfind('.') {
        Some(dot) => name[..dot].to_string(),
        None => name,
    }
}

/// Stems of the three input files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FoldStems {
    pub source: String,
    pub target: String,
    pub alignment: String,
}

impl FoldStems {
    pub fn from_paths(source: &str, target: &str, alignment: &str) -> Self {
        Self {
            source: extended_stem(source),
            target: extended_stem(target),
            alignment: extended_stem(alignment),
        }
    }

    /// Names for copy `index` (1-based) in `role`.
    pub fn names(&self, index: usize, role: FoldRole) -> FoldFileNames {
        let name = |stem: &str| format!("{}.rand{}.{}.xml", stem, index, role);
        FoldFileNames {
            source: name(&self.source),
            target: name(&self.target),
            alignment: name(&self.alignment),
        }
    }
}

/// Output file names of one copy and role.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FoldFileNames {
    pub source: String,
    pub target: String,
    pub alignment: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extended_stem() {
        assert_eq!(extended_stem("/home/a/align/308DE_LIT_LAW.xml"), "308DE_LIT_LAW");
        assert_eq!(extended_stem("ALM-308_normalized.xml"), "ALM-308_normalized");
        assert_eq!(extended_stem("corpus.v2.xml"), "corpus.v2");
        assert_eq!(extended_stem("README"), "README");
    }

    #[test]
    fn test_names() {
        let stems = FoldStems::from_paths("/c/de.xml", "/c/ka.xml", "/c/ALM.xml");
        let train = stems.names(1, FoldRole::Train);
        assert_eq!(train.source, "de.rand1.train.xml");
        assert_eq!(train.target, "ka.rand1.train.xml");
        assert_eq!(train.alignment, "ALM.rand1.train.xml");

        let test = stems.names(10, FoldRole::Test);
        assert_eq!(test.source, "de.rand10.test.xml");
        assert_eq!(test.alignment, "ALM.rand10.test.xml");
    }
}
