//! Cross-reference validation of a parallel treebank.
//!
//! Unlike the fold pipeline, validation never stops at the first problem:
//! every alignment reference to a node the treebank does not contain, and
//! every edge that does not resolve inside its sentence, is collected into a
//! [`ValidationReport`].

use std::collections::HashSet;
use std::fmt::Write;

use serde::{Deserialize, Serialize};

use crate::alignment::{AlignmentDocument, Side};
use crate::treebank::Treebank;

/// An aligned node id absent from its treebank.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MissingNode {
    pub side: Side,
    pub node_id: String,
    /// Index of the offending pair in the alignment document (0-based).
    pub pair_index: usize,
}

/// An edge idref that does not resolve inside its sentence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DanglingEdge {
    pub side: Side,
    pub sentence: String,
    pub idref: String,
}

/// Everything validation found.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationReport {
    pub missing_nodes: Vec<MissingNode>,
    pub dangling_edges: Vec<DanglingEdge>,
    /// Alignment pairs checked.
    pub pairs_checked: usize,
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.problem_count() == 0
    }

    pub fn problem_count(&self) -> usize {
        self.missing_nodes.len() + self.dangling_edges.len()
    }

    /// Get the exit code (0 = valid, 1 = problems found).
    pub fn exit_code(&self) -> i32 {
        if self.is_valid() {
            0
        } else {
            1
        }
    }

    /// Final pass/fail line.
    pub fn summary(&self) -> String {
        if self.is_valid() {
            "Referenced treebanks exist and all alignments are valid.".to_string()
        } else {
            format!("Validation failed: {} problem(s) found.", self.problem_count())
        }
    }

    /// One diagnostic per line followed by the summary.
    pub fn render(&self) -> String {
        let mut output = String::new();
        for missing in &self.missing_nodes {
            writeln!(
                output,
                "{}-side node {} (alignment #{}) does not occur in the {}-side treebank",
                missing.side,
                missing.node_id,
                missing.pair_index + 1,
                missing.side
            )
            .unwrap();
        }
        for edge in &self.dangling_edges {
            writeln!(
                output,
                "{}-side sentence {} has an edge to {}, which is not a node of that sentence",
                edge.side, edge.sentence, edge.idref
            )
            .unwrap();
        }
        writeln!(output, "{}", self.summary()).unwrap();
        output
    }
}

/// Check that every aligned node exists on its side and that both treebanks
/// are closed under their edges.
pub fn validate_alignment(
    alignment: &AlignmentDocument,
    source: &Treebank,
    target: &Treebank,
) -> ValidationReport {
    let mut report = ValidationReport {
        pairs_checked: alignment.pairs.len(),
        ..Default::default()
    };

    let source_nodes: HashSet<&str> = source.sentences.iter().flat_map(|s| s.node_ids()).collect();
    let target_nodes: HashSet<&str> = target.sentences.iter().flat_map(|s| s.node_ids()).collect();

    for (pair_index, pair) in alignment.pairs.iter().enumerate() {
        for (side, nodes) in [(Side::Source, &source_nodes), (Side::Target, &target_nodes)] {
            let node_id = pair.node(side);
            if !nodes.contains(node_id) {
                report.missing_nodes.push(MissingNode {
                    side,
                    node_id: node_id.to_string(),
                    pair_index,
                });
            }
        }
    }

    for (side, treebank) in [(Side::Source, source), (Side::Target, target)] {
        for (sentence, idref) in treebank.dangling_idrefs() {
            report.dangling_edges.push(DanglingEdge {
                side,
                sentence,
                idref,
            });
        }
    }

    report
}
