//! Node→sentence linkage and sentence-level alignment.
//!
//! Node alignments are lifted to sentence alignments through the sentence
//! that owns each node, not through the sentence number spelled inside the
//! node id, so sentences whose node ids are not all canonical are still
//! counted once.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::alignment::{AlignmentDocument, Side};
use crate::errors::{AlignError, AlignResult};
use crate::treebank::Treebank;

/// Maps every terminal and non-terminal id to its owning sentence id.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NodeLinks {
    links: HashMap<String, String>,
}

impl NodeLinks {
    pub fn sentence_of(&self, node_id: &str) -> Option<&str> {
        self.links.get(node_id).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.links.len()
    }

    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }

    fn require(&self, side: Side, node_id: &str) -> AlignResult<&str> {
        self.sentence_of(node_id)
            .ok_or_else(|| AlignError::UnlinkedNode {
                side,
                node_id: node_id.to_string(),
            })
    }
}

/// Link each node of `treebank` to the declared id of its sentence.
///
/// When a node id occurs in more than one sentence, the later sentence wins.
pub fn link_nodes_to_sentences(treebank: &Treebank) -> NodeLinks {
    let mut links = HashMap::new();
    for sentence in &treebank.sentences {
        for id in sentence.node_ids() {
            links.insert(id.to_string(), sentence.id.clone());
        }
    }
    NodeLinks { links }
}

/// A (source sentence, target sentence) pair implied by node alignments.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SentencePairKey {
    pub source: String,
    pub target: String,
}

impl SentencePairKey {
    pub fn new(source: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
        }
    }

    pub fn sentence(&self, side: Side) -> &str {
        match side {
            Side::Source => &self.source,
            Side::Target => &self.target,
        }
    }
}

impl std::fmt::Display for SentencePairKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{};{}", self.source, self.target)
    }
}

/// A sentence already linked to one partner is aligned to another.
///
/// Advisory only: it flags ambiguous sentence-level alignment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrossLinkWarning {
    /// Side of the sentence that gained a second partner.
    pub side: Side,
    /// Node on that side whose alignment revealed the conflict.
    pub node_id: String,
    /// The sentence on that side.
    pub sentence: String,
    /// Partner recorded first.
    pub linked_to: String,
    /// Partner implied by the current pair.
    pub also_linked_to: String,
    /// Node on the other side of the current pair.
    pub partner_node: String,
}

impl std::fmt::Display for CrossLinkWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let other = match self.side {
            Side::Source => Side::Target,
            Side::Target => Side::Source,
        };
        write!(
            f,
            "{} node {} in sentence {} (linked to {}) is aligned to {} node {} in sentence {}",
            self.side,
            self.node_id,
            self.sentence,
            self.linked_to,
            other,
            self.partner_node,
            self.also_linked_to
        )
    }
}

/// Sentence pairs derived from an alignment document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SentencePairs {
    /// Distinct keys in first-occurrence order.
    pub keys: Vec<SentencePairKey>,
    /// Number of alignment rows behind each key, parallel to `keys`.
    pub rows: Vec<usize>,
    /// Distinct source sentences that take part in an alignment.
    pub source_count: usize,
    /// Distinct target sentences that take part in an alignment.
    pub target_count: usize,
    pub warnings: Vec<CrossLinkWarning>,
}

impl SentencePairs {
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Total alignment rows, duplicates included.
    pub fn total_rows(&self) -> usize {
        self.rows.iter().sum()
    }
}

/// Lift node alignments to deduplicated sentence pairs.
///
/// Fails with [`AlignError::UnlinkedNode`] when an aligned node is missing
/// from its side's linkage. A sentence aligned to more than one partner
/// produces a [`CrossLinkWarning`], never an error.
pub fn derive_sentence_pairs(
    alignment: &AlignmentDocument,
    source_links: &NodeLinks,
    target_links: &NodeLinks,
) -> AlignResult<SentencePairs> {
    let mut pairs = SentencePairs::default();
    let mut positions: HashMap<SentencePairKey, usize> = HashMap::new();
    let mut source_to_target: HashMap<&str, &str> = HashMap::new();
    let mut target_to_source: HashMap<&str, &str> = HashMap::new();

    for pair in &alignment.pairs {
        let source = source_links.require(Side::Source, &pair.source)?;
        let target = target_links.require(Side::Target, &pair.target)?;

        if let Some(warning) = detect_cross_link(
            &source_to_target,
            Side::Source,
            &pair.source,
            source,
            &pair.target,
            target,
        ) {
            pairs.warnings.push(warning);
        }
        if let Some(warning) = detect_cross_link(
            &target_to_source,
            Side::Target,
            &pair.target,
            target,
            &pair.source,
            source,
        ) {
            pairs.warnings.push(warning);
        }
        source_to_target.entry(source).or_insert(target);
        target_to_source.entry(target).or_insert(source);

        let key = SentencePairKey::new(source, target);
        match positions.get(&key) {
            Some(&idx) => pairs.rows[idx] += 1,
            None => {
                positions.insert(key.clone(), pairs.keys.len());
                pairs.keys.push(key);
                pairs.rows.push(1);
            }
        }
    }

    pairs.source_count = source_to_target.len();
    pairs.target_count = target_to_source.len();
    for warning in &pairs.warnings {
        warn!("ambiguous sentence alignment: {}", warning);
    }
    Ok(pairs)
}

/// Report when `sentence` is already linked to a partner other than `partner`.
pub fn detect_cross_link(
    links: &HashMap<&str, &str>,
    side: Side,
    node_id: &str,
    sentence: &str,
    partner_node: &str,
    partner: &str,
) -> Option<CrossLinkWarning> {
    let linked_to = links.get(sentence)?;
    if *linked_to == partner {
        return None;
    }
    Some(CrossLinkWarning {
        side,
        node_id: node_id.to_string(),
        sentence: sentence.to_string(),
        linked_to: linked_to.to_string(),
        also_linked_to: partner.to_string(),
        partner_node: partner_node.to_string(),
    })
}

/// Sentences of `treebank` none of whose nodes is aligned on `side`.
pub fn uncovered_sentences(
    treebank: &Treebank,
    alignment: &AlignmentDocument,
    side: Side,
) -> Vec<String> {
    let aligned: HashSet<&str> = alignment.nodes(side).collect();
    treebank
        .sentences
        .iter()
        .filter(|s| !s.node_ids().any(|id| aligned.contains(id)))
        .map(|s| s.id.clone())
        .collect()
}
