//! End-to-end runs over an in-memory parallel treebank.
//!
//! [`generate_folds`] produces every train/test artifact of a
//! cross-validation run; [`normalize_corpus`] repairs sentence and node ids
//! and keeps the alignment document in step. Neither touches the
//! filesystem.

use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::alignment::{AlignmentDocument, Side};
use crate::assembler::{
    extract_alignment_fold, extract_treebank_fold, verify_positional_alignment, PositionIndex,
};
use crate::config::{FoldConfig, NormalizeConfig};
use crate::errors::AlignResult;
use crate::folds::{fold_listing, partition, shuffle_keys, FoldCopy, FoldRole};
use crate::linker::{
    derive_sentence_pairs, link_nodes_to_sentences, uncovered_sentences, SentencePairKey,
    SentencePairs,
};
use crate::naming::{FoldFileNames, FoldStems};
use crate::resolver::{non_canonical_sentences, reconcile_treebank, renumber_sentence_ids};
use crate::treebank::Treebank;

/// Parsed inputs of a fold run.
#[derive(Debug, Clone, Copy)]
pub struct FoldInputs<'a> {
    pub source: &'a Treebank,
    pub target: &'a Treebank,
    pub alignment: &'a AlignmentDocument,
    pub stems: &'a FoldStems,
}

/// The three documents of one copy and role.
#[derive(Debug, Clone)]
pub struct FoldArtifacts {
    /// Copy number, 1-based.
    pub index: usize,
    pub role: FoldRole,
    pub keys: Vec<SentencePairKey>,
    pub source: Treebank,
    pub target: Treebank,
    pub alignment: AlignmentDocument,
    pub names: FoldFileNames,
}

/// Result of [`generate_folds`].
#[derive(Debug, Clone)]
pub struct FoldRun {
    pub pairs: SentencePairs,
    pub copies: Vec<FoldCopy>,
    /// Train then test artifacts for each copy, in copy order.
    pub artifacts: Vec<FoldArtifacts>,
    pub uncovered_source: Vec<String>,
    pub uncovered_target: Vec<String>,
}

impl FoldRun {
    pub fn listing(&self, role: FoldRole) -> String {
        fold_listing(&self.copies, role)
    }
}

/// Link, derive, shuffle, partition and assemble every fold.
///
/// The sentence pairs are shuffled with `rng` only when `config.shuffle` is
/// set. Each assembled treebank is checked against its fold's sentence order
/// when `config.verify_positions` is set.
pub fn generate_folds<R: Rng + ?Sized>(
    inputs: FoldInputs<'_>,
    config: &FoldConfig,
    rng: &mut R,
) -> AlignResult<FoldRun> {
    let source_links = link_nodes_to_sentences(inputs.source);
    let target_links = link_nodes_to_sentences(inputs.target);

    let pairs = derive_sentence_pairs(inputs.alignment, &source_links, &target_links)?;
    info!(
        pairs = pairs.len(),
        rows = pairs.total_rows(),
        source_sentences = pairs.source_count,
        target_sentences = pairs.target_count,
        "derived sentence pairs"
    );

    let uncovered_source = uncovered_sentences(inputs.source, inputs.alignment, Side::Source);
    let uncovered_target = uncovered_sentences(inputs.target, inputs.alignment, Side::Target);
    for (side, uncovered) in [(Side::Source, &uncovered_source), (Side::Target, &uncovered_target)] {
        for sentence in uncovered {
            warn!(%side, %sentence, "sentence has no alignments and is left out of every fold");
        }
    }

    let mut keys = pairs.keys.clone();
    if config.shuffle {
        shuffle_keys(&mut keys, rng);
    }
    let copies = partition(&keys, config.count)?;

    let source_index = PositionIndex::build(inputs.source, Side::Source);
    let target_index = PositionIndex::build(inputs.target, Side::Target);

    let mut artifacts = Vec::with_capacity(copies.len() * 2);
    for (i, copy) in copies.iter().enumerate() {
        let index = i + 1;
        for role in FoldRole::BOTH {
            let fold = copy.fold(role);
            let names = inputs.stems.names(index, role);

            let source = extract_treebank_fold(inputs.source, &source_index, fold)?;
            let target = extract_treebank_fold(inputs.target, &target_index, fold)?;
            let alignment = extract_alignment_fold(
                inputs.alignment,
                fold,
                &source_links,
                &target_links,
                &names.source,
                &names.target,
            )?;

            if config.verify_positions {
                verify_positional_alignment(&source, fold, Side::Source, &names.source)?;
                verify_positional_alignment(&target, fold, Side::Target, &names.target)?;
            }
            debug!(
                copy = index,
                %role,
                sentences = fold.len(),
                alignments = alignment.pairs.len(),
                "assembled fold"
            );

            artifacts.push(FoldArtifacts {
                index,
                role,
                keys: fold.to_vec(),
                source,
                target,
                alignment,
                names,
            });
        }
    }

    Ok(FoldRun {
        pairs,
        copies,
        artifacts,
        uncovered_source,
        uncovered_target,
    })
}

/// What normalization changed on one side.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SideNormalization {
    /// Sentence ids (before renumbering) moved to new sentence numbers.
    pub renumbered_sentences: Vec<String>,
    /// Sentences whose node ids were reconciled.
    pub reconciled_sentences: Vec<String>,
    /// Node ids renamed by either step.
    pub renamed_nodes: usize,
    /// Alignment references rewritten.
    pub patched_references: usize,
}

impl SideNormalization {
    pub fn is_unchanged(&self) -> bool {
        self.renamed_nodes == 0
            && self.renumbered_sentences.is_empty()
            && self.reconciled_sentences.is_empty()
    }
}

/// Result of [`normalize_corpus`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizationReport {
    pub source: SideNormalization,
    pub target: SideNormalization,
}

impl NormalizationReport {
    pub fn side(&self, side: Side) -> &SideNormalization {
        match side {
            Side::Source => &self.source,
            Side::Target => &self.target,
        }
    }

    fn side_mut(&mut self, side: Side) -> &mut SideNormalization {
        match side {
            Side::Source => &mut self.source,
            Side::Target => &mut self.target,
        }
    }

    pub fn is_unchanged(&self) -> bool {
        self.source.is_unchanged() && self.target.is_unchanged()
    }
}

/// Renumber leading-zero sentences, then reconcile non-canonical node ids,
/// on both sides. Every mapping is applied to `alignment`.
pub fn normalize_corpus(
    source: &mut Treebank,
    target: &mut Treebank,
    alignment: &mut AlignmentDocument,
    config: &NormalizeConfig,
) -> AlignResult<NormalizationReport> {
    let mut report = NormalizationReport::default();

    for (side, treebank) in [(Side::Source, source), (Side::Target, target)] {
        let summary = report.side_mut(side);

        if let Some(start) = config.renumber_from {
            let leading = treebank.sentences_with_leading_zeros();
            if !leading.is_empty() {
                let mapping = renumber_sentence_ids(treebank, start, &leading)?;
                summary.renamed_nodes += mapping.len();
                summary.patched_references += alignment.patch_node_ids(side, &mapping);
                info!(%side, sentences = leading.len(), start, "renumbered leading-zero sentences");
                summary.renumbered_sentences = leading;
            }
        }

        if config.reconcile {
            let flagged = non_canonical_sentences(treebank)?;
            if !flagged.is_empty() {
                let mapping = reconcile_treebank(treebank, &flagged)?;
                summary.renamed_nodes += mapping.len();
                summary.patched_references += alignment.patch_node_ids(side, &mapping);
                info!(%side, sentences = flagged.len(), renamed = mapping.len(), "reconciled node ids");
                summary.reconciled_sentences = flagged;
            }
        }
    }

    Ok(report)
}
