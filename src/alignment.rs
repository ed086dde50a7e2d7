//! Node-to-node alignment documents.
//!
//! An alignment document names a source and a target treebank and lists
//! aligned node pairs, one node from each side.

use serde::{Deserialize, Serialize};

use crate::mapping::IdentifierMapping;
use crate::treebank::Attributes;

/// Which treebank of a parallel pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    Source,
    Target,
}

impl Side {
    pub const BOTH: [Side; 2] = [Side::Source, Side::Target];
}

impl std::fmt::Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Side::Source => write!(f, "source"),
            Side::Target => write!(f, "target"),
        }
    }
}

/// Reference to one of the aligned treebanks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreebankRef {
    pub id: String,
    pub filename: String,
    /// Other attributes, e.g. `language`.
    pub attributes: Attributes,
}

impl TreebankRef {
    pub fn new(id: impl Into<String>, filename: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            filename: filename.into(),
            attributes: Vec::new(),
        }
    }
}

/// One aligned node pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlignmentPair {
    pub source: String,
    pub target: String,
    /// Alignment metadata such as `type`, `author`, `last_change`.
    pub attributes: Attributes,
}

impl AlignmentPair {
    pub fn new(source: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
            attributes: Vec::new(),
        }
    }

    pub fn node(&self, side: Side) -> &str {
        match side {
            Side::Source => &self.source,
            Side::Target => &self.target,
        }
    }

    fn node_mut(&mut self, side: Side) -> &mut String {
        match side {
            Side::Source => &mut self.source,
            Side::Target => &mut self.target,
        }
    }
}

/// An ordered list of aligned node pairs between two treebanks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlignmentDocument {
    pub source: TreebankRef,
    pub target: TreebankRef,
    pub pairs: Vec<AlignmentPair>,
}

impl AlignmentDocument {
    pub fn new(source: TreebankRef, target: TreebankRef) -> Self {
        Self {
            source,
            target,
            pairs: Vec::new(),
        }
    }

    pub fn with_pair(mut self, source: &str, target: &str) -> Self {
        self.pairs.push(AlignmentPair::new(source, target));
        self
    }

    pub fn treebank(&self, side: Side) -> &TreebankRef {
        match side {
            Side::Source => &self.source,
            Side::Target => &self.target,
        }
    }

    pub fn treebank_mut(&mut self, side: Side) -> &mut TreebankRef {
        match side {
            Side::Source => &mut self.source,
            Side::Target => &mut self.target,
        }
    }

    /// Aligned node ids of one side, in document order.
    pub fn nodes(&self, side: Side) -> impl Iterator<Item = &str> {
        self.pairs.iter().map(move |p| p.node(side))
    }

    /// Rewrite node ids of `side` through `mapping`.
    ///
    /// Returns the number of references changed.
    pub fn patch_node_ids(&mut self, side: Side, mapping: &IdentifierMapping) -> usize {
        let mut changed = 0;
        for pair in &mut self.pairs {
            let node = pair.node_mut(side);
            if let Some(new_id) = mapping.get(node) {
                *node = new_id.to_string();
                changed += 1;
            }
        }
        changed
    }

    /// Copy of the document header pointing at other treebank files.
    pub fn with_filenames(&self, source: impl Into<String>, target: impl Into<String>) -> Self {
        let mut doc = Self::new(self.source.clone(), self.target.clone());
        doc.source.filename = source.into();
        doc.target.filename = target.into();
        doc
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc() -> AlignmentDocument {
        AlignmentDocument::new(
            TreebankRef::new("de", "de.xml"),
            TreebankRef::new("ka", "ka.xml"),
        )
        .with_pair("s1_1", "s1_1")
        .with_pair("s830_1", "s1_2")
        .with_pair("s830_500", "s1_500")
    }

    #[test]
    fn test_patch_node_ids_one_side() {
        let mut mapping = IdentifierMapping::new();
        mapping.insert("s830_1", "s83_5").unwrap();
        mapping.insert("s830_500", "s83_501").unwrap();
        mapping.insert("s1_2", "never_applied").unwrap();

        let mut doc = doc();
        assert_eq!(doc.patch_node_ids(Side::Source, &mapping), 2);

        let sources: Vec<_> = doc.nodes(Side::Source).collect();
        assert_eq!(sources, vec!["s1_1", "s83_5", "s83_501"]);
        let targets: Vec<_> = doc.nodes(Side::Target).collect();
        assert_eq!(targets, vec!["s1_1", "s1_2", "s1_500"]);
    }

    #[test]
    fn test_with_filenames_drops_pairs() {
        let renamed = doc().with_filenames("de.rand1.train.xml", "ka.rand1.train.xml");
        assert!(renamed.pairs.is_empty());
        assert_eq!(renamed.source.id, "de");
        assert_eq!(renamed.treebank(Side::Target).filename, "ka.rand1.train.xml");
    }

    #[test]
    fn test_side_display() {
        assert_eq!(Side::Source.to_string(), "source");
        assert_eq!(Side::Target.to_string(), "target");
    }
}
