//! Per-fold extraction of treebanks and alignment documents.
//!
//! Every fold output is a fresh, independently owned document built from
//! deep copies of the source sentences; the source treebank is only read,
//! so folds can be assembled in any order (or concurrently).

use std::collections::{HashMap, HashSet};

use tracing::warn;

use crate::alignment::{AlignmentDocument, Side};
use crate::errors::{AlignError, AlignResult};
use crate::linker::{NodeLinks, SentencePairKey};
use crate::treebank::Treebank;

/// Sentence id → position in the treebank.
#[derive(Debug, Clone)]
pub struct PositionIndex {
    side: Side,
    positions: HashMap<String, usize>,
}

impl PositionIndex {
    /// Index `treebank` as the `side` of the parallel corpus.
    ///
    /// The first occurrence of a repeated sentence id is kept.
    pub fn build(treebank: &Treebank, side: Side) -> Self {
        let mut positions = HashMap::with_capacity(treebank.len());
        for (pos, id) in treebank.sentence_ids().enumerate() {
            if positions.contains_key(id) {
                warn!(%side, sentence = %id, position = pos, "duplicate sentence id ignored in position index");
                continue;
            }
            positions.insert(id.to_string(), pos);
        }
        Self { side, positions }
    }

    pub fn side(&self) -> Side {
        self.side
    }

    pub fn position(&self, sentence_id: &str) -> AlignResult<usize> {
        self.positions
            .get(sentence_id)
            .copied()
            .ok_or_else(|| AlignError::UnknownSentenceId {
                side: self.side,
                sentence_id: sentence_id.to_string(),
            })
    }
}

/// Copy the sentences of one side of `fold` out of `treebank`, in fold order.
pub fn extract_treebank_fold(
    treebank: &Treebank,
    index: &PositionIndex,
    fold: &[SentencePairKey],
) -> AlignResult<Treebank> {
    let side = index.side();
    let mut sentences = Vec::with_capacity(fold.len());
    for key in fold {
        let sentence_id = key.sentence(side);
        let sentence = index
            .position(sentence_id)
            .ok()
            .and_then(|pos| treebank.sentences.get(pos))
            .ok_or_else(|| AlignError::UnknownSentenceId {
                side,
                sentence_id: sentence_id.to_string(),
            })?;
        sentences.push(sentence.clone());
    }
    Ok(Treebank {
        id: treebank.id.clone(),
        sentences,
    })
}

/// Keep the alignment pairs whose sentence pair belongs to `fold`.
///
/// The returned document points at `source_file` and `target_file`.
pub fn extract_alignment_fold(
    alignment: &AlignmentDocument,
    fold: &[SentencePairKey],
    source_links: &NodeLinks,
    target_links: &NodeLinks,
    source_file: &str,
    target_file: &str,
) -> AlignResult<AlignmentDocument> {
    let members: HashSet<(&str, &str)> = fold
        .iter()
        .map(|k| (k.source.as_str(), k.target.as_str()))
        .collect();

    let mut doc = alignment.with_filenames(source_file, target_file);
    for pair in &alignment.pairs {
        let source = source_links
            .sentence_of(&pair.source)
            .ok_or_else(|| AlignError::UnlinkedNode {
                side: Side::Source,
                node_id: pair.source.clone(),
            })?;
        let target = target_links
            .sentence_of(&pair.target)
            .ok_or_else(|| AlignError::UnlinkedNode {
                side: Side::Target,
                node_id: pair.target.clone(),
            })?;
        if members.contains(&(source, target)) {
            doc.pairs.push(pair.clone());
        }
    }
    Ok(doc)
}

/// Check that the sentence at position p of `treebank` is the `side`
/// sentence of the p-th fold key.
///
/// `label` names the output (usually its file name) in the error.
pub fn verify_positional_alignment(
    treebank: &Treebank,
    fold: &[SentencePairKey],
    side: Side,
    label: &str,
) -> AlignResult<()> {
    let mismatch = |position: usize, expected: &str, actual: &str| AlignError::PositionMismatch {
        file: label.to_string(),
        side,
        position,
        expected: expected.to_string(),
        actual: actual.to_string(),
    };

    for (position, sentence) in treebank.sentences.iter().enumerate() {
        let expected = fold
            .get(position)
            .map(|k| k.sentence(side))
            .ok_or_else(|| mismatch(position, "<end of fold>", &sentence.id))?;
        if sentence.id != expected {
            return Err(mismatch(position, expected, &sentence.id));
        }
    }
    if let Some(missing) = fold.get(treebank.len()) {
        return Err(mismatch(
            treebank.len(),
            missing.sentence(side),
            "<end of treebank>",
        ));
    }
    Ok(())
}
