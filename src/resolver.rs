//! Detection and repair of inconsistent node ids.
//!
//! Treebanks assembled from several sources sometimes contain sentences like
//!
//! ```text
//! <s id="s83"> ... <t id="s83_4"/> <t id="s830_1"/> ...
//! ```
//!
//! where a node carries a sentence number other than its sentence's, or a
//! local number with a leading zero. [`reconcile_sentence`] renames such
//! nodes to fresh canonical ids (`s830_1` → `s83_5`) and rewrites every edge
//! that pointed at them, returning the old→new mapping so alignment
//! documents can be patched the same way.
//!
//! Terminal and non-terminal ids are drawn from two independent cursors:
//! terminals count up from 1, non-terminals from 500, each starting past
//! the highest canonical local number already used by its kind.
//!
//! [`renumber_sentence_ids`] handles the other common defect, sentence ids
//! with leading zeros, by moving whole sentences to a fresh numeric range.

use std::collections::{HashMap, HashSet};

use tracing::{debug, warn};

use crate::errors::{AlignError, AlignResult};
use crate::ids::{self, NodeId};
use crate::mapping::IdentifierMapping;
use crate::treebank::{NodeKind, Sentence, Treebank};

/// First local number handed out to a renamed terminal.
pub const TERMINAL_FLOOR: u64 = 1;

/// First local number handed out to a renamed non-terminal.
pub const NONTERMINAL_FLOOR: u64 = 500;

/// Hands out unused canonical ids within one sentence.
///
/// Owns the per-kind cursors and the set of ids already present, so nothing
/// leaks from one sentence (or one run) into the next.
#[derive(Debug, Clone)]
pub struct IdAllocator {
    sentence_digits: String,
    taken: HashSet<String>,
    terminal_cursor: u64,
    nonterminal_cursor: u64,
}

impl IdAllocator {
    pub fn new(sentence_digits: impl Into<String>) -> Self {
        Self {
            sentence_digits: sentence_digits.into(),
            taken: HashSet::new(),
            terminal_cursor: TERMINAL_FLOOR,
            nonterminal_cursor: NONTERMINAL_FLOOR,
        }
    }

    /// Mark an id as present in the sentence.
    pub fn reserve(&mut self, id: &str) {
        self.taken.insert(id.to_string());
    }

    /// Account for a canonical id of `kind` with the given local number.
    pub fn observe(&mut self, kind: NodeKind, local: u64) {
        let cursor = match kind {
            NodeKind::Terminal => &mut self.terminal_cursor,
            NodeKind::NonTerminal => &mut self.nonterminal_cursor,
        };
        if local > *cursor {
            *cursor = local;
        }
    }

    /// Next free canonical id for `kind`.
    pub fn allocate(&mut self, kind: NodeKind) -> String {
        let cursor = match kind {
            NodeKind::Terminal => &mut self.terminal_cursor,
            NodeKind::NonTerminal => &mut self.nonterminal_cursor,
        };
        loop {
            let candidate = NodeId::format(&self.sentence_digits, *cursor);
            *cursor += 1;
            if self.taken.insert(candidate.clone()) {
                return candidate;
            }
        }
    }
}

/// Rename every non-canonical node of `sentence` and rewrite its edges.
///
/// `canonical_sentence_id` is the sentence id the nodes should agree with,
/// normally the sentence's own declared id. The sentence is only modified
/// once every node id has been decomposed, so a [`AlignError::MalformedId`]
/// or [`AlignError::DuplicateNodeId`] leaves it untouched.
pub fn reconcile_sentence(
    sentence: &mut Sentence,
    canonical_sentence_id: &str,
) -> AlignResult<IdentifierMapping> {
    let digits = ids::sentence_digits(canonical_sentence_id);
    let mut allocator = IdAllocator::new(digits);

    let mut seen = HashSet::new();
    for id in sentence.node_ids() {
        if !seen.insert(id) {
            return Err(AlignError::DuplicateNodeId {
                sentence: sentence.id.clone(),
                id: id.to_string(),
            });
        }
        allocator.reserve(id);
    }

    let mut renamed_terminals = Vec::new();
    for (idx, terminal) in sentence.terminals.iter().enumerate() {
        let node = NodeId::parse(&terminal.id)?;
        if node.sentence_digits() == digits && !node.has_leading_zero() {
            allocator.observe(NodeKind::Terminal, node.local_number());
        } else {
            renamed_terminals.push(idx);
        }
    }
    let mut renamed_nonterminals = Vec::new();
    for (idx, nonterminal) in sentence.nonterminals.iter().enumerate() {
        let node = NodeId::parse(&nonterminal.id)?;
        if node.sentence_digits() == digits && !node.has_leading_zero() {
            allocator.observe(NodeKind::NonTerminal, node.local_number());
        } else {
            renamed_nonterminals.push(idx);
        }
    }

    let mut mapping = IdentifierMapping::new();
    if renamed_terminals.is_empty() && renamed_nonterminals.is_empty() {
        return Ok(mapping);
    }

    // Child sets keyed by the ids the non-terminals had before renaming.
    let original_children: HashMap<String, HashSet<String>> = sentence
        .nonterminals
        .iter()
        .map(|nt| {
            let children = nt.edges.iter().map(|e| e.idref.clone()).collect();
            (nt.id.clone(), children)
        })
        .collect();

    for idx in renamed_terminals {
        let terminal = &mut sentence.terminals[idx];
        if mapping.is_target(&terminal.id) {
            continue;
        }
        let new_id = allocator.allocate(NodeKind::Terminal);
        mapping.insert(terminal.id.clone(), new_id.clone())?;
        terminal.id = new_id;
    }
    for idx in renamed_nonterminals {
        let nonterminal = &mut sentence.nonterminals[idx];
        if mapping.is_target(&nonterminal.id) {
            continue;
        }
        let new_id = allocator.allocate(NodeKind::NonTerminal);
        mapping.insert(nonterminal.id.clone(), new_id.clone())?;
        nonterminal.id = new_id;
    }

    for nonterminal in &mut sentence.nonterminals {
        let original_id = mapping
            .original_of(&nonterminal.id)
            .unwrap_or(&nonterminal.id);
        let children = original_children.get(original_id);
        for edge in &mut nonterminal.edges {
            if let Some(new_id) = mapping.get(&edge.idref) {
                edge.idref = new_id.to_string();
            } else if !children.map_or(false, |c| c.contains(&edge.idref)) {
                warn!(
                    sentence = %sentence.id,
                    nonterminal = %original_id,
                    idref = %edge.idref,
                    "edge is not among the original children of its non-terminal"
                );
            }
        }
    }
    for terminal in &mut sentence.terminals {
        for edge in &mut terminal.edges {
            if let Some(new_id) = mapping.get(&edge.idref) {
                edge.idref = new_id.to_string();
            }
        }
    }
    if let Some(root) = sentence.root.as_mut() {
        if let Some(new_id) = mapping.get(root) {
            *root = new_id.to_string();
        }
    }

    debug!(sentence = %sentence.id, renamed = mapping.len(), "reconciled node ids");
    Ok(mapping)
}

/// Sentences with at least one node id that is not canonical for them.
pub fn non_canonical_sentences(treebank: &Treebank) -> AlignResult<Vec<String>> {
    let mut flagged = Vec::new();
    for sentence in &treebank.sentences {
        for id in sentence.node_ids() {
            if !ids::is_canonical(id, &sentence.id)? {
                flagged.push(sentence.id.clone());
                break;
            }
        }
    }
    Ok(flagged)
}

/// Reconcile each listed sentence in corpus order against its declared id.
///
/// Returns the union of the per-sentence mappings. The sentences are
/// rewritten on a working copy, so an error (including a
/// [`AlignError::MappingConflict`] between two sentences) leaves `treebank`
/// unchanged.
pub fn reconcile_treebank(
    treebank: &mut Treebank,
    sentence_ids: &[String],
) -> AlignResult<IdentifierMapping> {
    let wanted: HashSet<&str> = sentence_ids.iter().map(String::as_str).collect();
    let mut sentences = treebank.sentences.clone();
    let mut aggregate = IdentifierMapping::new();
    for sentence in &mut sentences {
        if !wanted.contains(sentence.id.as_str()) {
            continue;
        }
        let declared = sentence.id.clone();
        let mapping = reconcile_sentence(sentence, &declared)?;
        aggregate.merge(mapping)?;
    }
    treebank.sentences = sentences;
    Ok(aggregate)
}

/// Move the listed sentences to sequential ids starting at `start_number`.
///
/// Sentences are renumbered in treebank order. Within each one, every node
/// id, edge idref and the root whose sentence component has the old
/// sentence's numeric value (leading zeros allowed) is moved to the new
/// number with its local component unchanged. Returns the node id mapping
/// for all touched sentences.
///
/// All new ids are computed before anything is written; on error the
/// treebank is left as it was.
pub fn renumber_sentence_ids(
    treebank: &mut Treebank,
    start_number: u64,
    target_sentence_ids: &[String],
) -> AlignResult<IdentifierMapping> {
    let targets: HashSet<&str> = target_sentence_ids.iter().map(String::as_str).collect();
    let mut renumbered = Vec::new();
    let mut mapping = IdentifierMapping::new();
    let mut next = start_number;

    for (pos, sentence) in treebank.sentences.iter().enumerate() {
        if !targets.contains(sentence.id.as_str()) {
            continue;
        }
        let moved = renumber_sentence(sentence, next, &mut mapping)?;
        renumbered.push((pos, moved));
        next += 1;
    }

    for (pos, moved) in renumbered {
        let sentence = &mut treebank.sentences[pos];
        debug!(old = %sentence.id, new = %moved.id, "renumbered sentence");
        *sentence = moved;
    }
    Ok(mapping)
}

/// Renumbered copy of `sentence`; renamed node ids are added to `mapping`.
fn renumber_sentence(
    sentence: &Sentence,
    new_number: u64,
    mapping: &mut IdentifierMapping,
) -> AlignResult<Sentence> {
    let old_number = ids::sentence_number(&sentence.id).ok_or_else(|| AlignError::MalformedId {
        id: sentence.id.clone(),
    })?;
    let moved = |id: &str| -> AlignResult<Option<String>> {
        let node = NodeId::parse(id)?;
        Ok(if node.sentence_number() == old_number {
            Some(node.with_sentence(new_number))
        } else {
            None
        })
    };

    let mut out = sentence.clone();
    let mut local = IdentifierMapping::new();
    for terminal in &mut out.terminals {
        if let Some(new_id) = moved(&terminal.id)? {
            if new_id != terminal.id {
                local.insert(terminal.id.clone(), new_id.clone())?;
            }
            terminal.id = new_id;
        }
        for edge in &mut terminal.edges {
            if let Some(new_id) = moved(&edge.idref)? {
                edge.idref = new_id;
            }
        }
    }
    for nonterminal in &mut out.nonterminals {
        if let Some(new_id) = moved(&nonterminal.id)? {
            if new_id != nonterminal.id {
                local.insert(nonterminal.id.clone(), new_id.clone())?;
            }
            nonterminal.id = new_id;
        }
        for edge in &mut nonterminal.edges {
            if let Some(new_id) = moved(&edge.idref)? {
                edge.idref = new_id;
            }
        }
    }

    let new_sentence_id = format!("s{}", new_number);
    out.root = Some(match out.root.take() {
        Some(root) => match NodeId::parse(&root) {
            Ok(node) if node.sentence_number() == old_number => node.with_sentence(new_number),
            Ok(_) => root,
            Err(_) => new_sentence_id.clone(),
        },
        None => new_sentence_id.clone(),
    });
    out.id = new_sentence_id;
    mapping.merge(local)?;
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::treebank::{Edge, NonTerminal, Terminal};

    /// `<s id="s83">` with a terminal and a non-terminal carrying `s830`.
    fn mixed_sentence() -> Sentence {
        Sentence::new("s83")
            .with_root("s83_500")
            .with_terminal(Terminal::new("s83_1", "Der"))
            .with_terminal(Terminal::new("s83_4", "alte"))
            .with_terminal(Terminal::new("s830_1", "Hund"))
            .with_nonterminal(NonTerminal::new("s830_500", &["s83_4", "s830_1"]))
            .with_nonterminal(NonTerminal::new("s83_500", &["s83_1", "s830_500"]))
    }

    fn ids_of(sentence: &Sentence) -> Vec<&str> {
        sentence.node_ids().collect()
    }

    #[test]
    fn test_reconcile_renames_mixed_ids() {
        let mut sentence = mixed_sentence();
        let mapping = reconcile_sentence(&mut sentence, "s83").unwrap();

        assert_eq!(mapping.get("s830_1"), Some("s83_5"));
        assert_eq!(mapping.get("s830_500"), Some("s83_501"));
        assert_eq!(mapping.len(), 2);
        assert_eq!(
            ids_of(&sentence),
            vec!["s83_1", "s83_4", "s83_5", "s83_501", "s83_500"]
        );
    }

    #[test]
    fn test_reconcile_rewrites_edges_when_both_ends_renamed() {
        let mut sentence = mixed_sentence();
        reconcile_sentence(&mut sentence, "s83").unwrap();

        let renamed_nt: Vec<_> = sentence.nonterminals[0].children().collect();
        assert_eq!(renamed_nt, vec!["s83_4", "s83_5"]);
        let root_nt: Vec<_> = sentence.nonterminals[1].children().collect();
        assert_eq!(root_nt, vec!["s83_1", "s83_501"]);
        assert!(sentence.dangling_idrefs().is_empty());
    }

    #[test]
    fn test_reconcile_is_idempotent() {
        let mut sentence = mixed_sentence();
        reconcile_sentence(&mut sentence, "s83").unwrap();
        let after_first = sentence.clone();

        let mapping = reconcile_sentence(&mut sentence, "s83").unwrap();
        assert!(mapping.is_empty());
        assert_eq!(sentence, after_first);
    }

    #[test]
    fn test_reconcile_leading_zero_local_number() {
        let mut sentence = Sentence::new("s7")
            .with_terminal(Terminal::new("s7_1", "a"))
            .with_terminal(Terminal::new("s7_02", "b"))
            .with_nonterminal(NonTerminal::new("s7_500", &["s7_1", "s7_02"]));
        let mapping = reconcile_sentence(&mut sentence, "s7").unwrap();

        assert_eq!(mapping.get("s7_02"), Some("s7_2"));
        let children: Vec<_> = sentence.nonterminals[0].children().collect();
        assert_eq!(children, vec!["s7_1", "s7_2"]);
    }

    #[test]
    fn test_reconcile_without_canonical_nodes_uses_floors() {
        let mut sentence = Sentence::new("s9")
            .with_root("s90_500")
            .with_terminal(Terminal::new("s90_1", "a"))
            .with_terminal(Terminal::new("s90_2", "b"))
            .with_nonterminal(NonTerminal::new("s90_500", &["s90_1", "s90_2"]));
        let mapping = reconcile_sentence(&mut sentence, "s9").unwrap();

        assert_eq!(mapping.get("s90_1"), Some("s9_1"));
        assert_eq!(mapping.get("s90_2"), Some("s9_2"));
        assert_eq!(mapping.get("s90_500"), Some("s9_500"));
        assert_eq!(sentence.root.as_deref(), Some("s9_500"));
    }

    #[test]
    fn test_reconcile_probes_past_taken_ids() {
        // s5_2 belongs to a non-terminal, so the terminal cursor skips it.
        let mut sentence = Sentence::new("s5")
            .with_terminal(Terminal::new("s5_1", "a"))
            .with_terminal(Terminal::new("s5_02", "b"))
            .with_terminal(Terminal::new("s50_3", "c"))
            .with_nonterminal(NonTerminal::new("s5_2", &["s5_1"]));
        let mapping = reconcile_sentence(&mut sentence, "s5").unwrap();

        assert_eq!(mapping.get("s5_02"), Some("s5_3"));
        assert_eq!(mapping.get("s50_3"), Some("s5_4"));
        let unique: HashSet<_> = sentence.node_ids().collect();
        assert_eq!(unique.len(), 4);
    }

    #[test]
    fn test_reconcile_rewrites_secondary_edges() {
        let mut terminal = Terminal::new("s3_1", "er");
        terminal.edges.push(Edge {
            secondary: true,
            ..Edge::labelled("s30_500", "SB")
        });
        let mut sentence = Sentence::new("s3")
            .with_terminal(terminal)
            .with_nonterminal(NonTerminal::new("s30_500", &["s3_1"]));
        reconcile_sentence(&mut sentence, "s3").unwrap();

        assert_eq!(sentence.terminals[0].edges[0].idref, "s3_500");
        assert!(sentence.dangling_idrefs().is_empty());
    }

    #[test]
    fn test_reconcile_malformed_leaves_sentence_untouched() {
        let mut sentence = mixed_sentence();
        sentence.terminals.push(Terminal::new("word7", "x"));
        let before = sentence.clone();

        assert!(matches!(
            reconcile_sentence(&mut sentence, "s83"),
            Err(AlignError::MalformedId { .. })
        ));
        assert_eq!(sentence, before);
    }

    #[test]
    fn test_reconcile_duplicate_node_id() {
        let mut sentence = mixed_sentence();
        sentence.terminals.push(Terminal::new("s830_1", "dup"));
        match reconcile_sentence(&mut sentence, "s83") {
            Err(AlignError::DuplicateNodeId { sentence, id }) => {
                assert_eq!(sentence, "s83");
                assert_eq!(id, "s830_1");
            }
            other => panic!("expected DuplicateNodeId, got {:?}", other),
        }
    }

    #[test]
    fn test_allocator_kinds_are_independent() {
        let mut allocator = IdAllocator::new("4");
        allocator.reserve("s4_1");
        allocator.observe(NodeKind::Terminal, 1);
        assert_eq!(allocator.allocate(NodeKind::Terminal), "s4_2");
        assert_eq!(allocator.allocate(NodeKind::NonTerminal), "s4_500");
        assert_eq!(allocator.allocate(NodeKind::Terminal), "s4_3");
        assert_eq!(allocator.allocate(NodeKind::NonTerminal), "s4_501");
    }

    #[test]
    fn test_reconcile_treebank_only_listed_sentences() {
        let mut treebank = Treebank::new(vec![
            mixed_sentence(),
            Sentence::new("s84").with_terminal(Terminal::new("s840_1", "x")),
        ]);
        let mapping = reconcile_treebank(&mut treebank, &["s83".to_string()]).unwrap();

        assert_eq!(mapping.len(), 2);
        assert_eq!(treebank.sentences[1].terminals[0].id, "s840_1");
    }

    #[test]
    fn test_non_canonical_sentences() {
        let treebank = Treebank::new(vec![
            mixed_sentence(),
            Sentence::new("s84").with_terminal(Terminal::new("s84_1", "x")),
            Sentence::new("s85").with_terminal(Terminal::new("s85_01", "y")),
        ]);
        assert_eq!(
            non_canonical_sentences(&treebank).unwrap(),
            vec!["s83".to_string(), "s85".to_string()]
        );
    }

    #[test]
    fn test_renumber_sentence_ids() {
        let mut treebank = Treebank::new(vec![
            Sentence::new("s0002")
                .with_root("s0002_500")
                .with_terminal(Terminal::new("s0002_1", "a"))
                .with_nonterminal(NonTerminal::new("s0002_500", &["s0002_1"])),
            Sentence::new("s5").with_terminal(Terminal::new("s5_1", "b")),
            Sentence::new("s0001")
                .with_root("s0001_500")
                .with_terminal(Terminal::new("s01_1", "c"))
                .with_nonterminal(NonTerminal::new("s0001_500", &["s01_1"])),
        ]);
        let targets = treebank.sentences_with_leading_zeros();
        let mapping = renumber_sentence_ids(&mut treebank, 2000, &targets).unwrap();

        let sentence_ids: Vec<_> = treebank.sentence_ids().collect();
        assert_eq!(sentence_ids, vec!["s2000", "s5", "s2001"]);
        assert_eq!(mapping.get("s0002_1"), Some("s2000_1"));
        assert_eq!(mapping.get("s0001_500"), Some("s2001_500"));
        assert_eq!(mapping.get("s01_1"), Some("s2001_1"));
        assert_eq!(treebank.sentences[0].root.as_deref(), Some("s2000_500"));
        assert!(treebank.dangling_idrefs().is_empty());
        assert_eq!(mapping.len(), 4);
    }

    #[test]
    fn test_renumber_root_without_node_form() {
        let mut treebank = Treebank::new(vec![Sentence::new("s007")
            .with_root("VROOT")
            .with_terminal(Terminal::new("s007_1", "a"))]);
        renumber_sentence_ids(&mut treebank, 10, &["s007".to_string()]).unwrap();
        assert_eq!(treebank.sentences[0].root.as_deref(), Some("s10"));
        assert_eq!(treebank.sentences[0].terminals[0].id, "s10_1");
    }

    #[test]
    fn test_renumber_malformed_node_leaves_treebank_untouched() {
        let mut treebank = Treebank::new(vec![
            Sentence::new("s0001").with_terminal(Terminal::new("s0001_1", "a")),
            Sentence::new("s007")
                .with_terminal(Terminal::new("s007_1", "b"))
                .with_terminal(Terminal::new("bad", "c")),
        ]);
        let before = treebank.clone();

        match renumber_sentence_ids(
            &mut treebank,
            10,
            &["s0001".to_string(), "s007".to_string()],
        ) {
            Err(AlignError::MalformedId { id }) => assert_eq!(id, "bad"),
            other => panic!("expected MalformedId, got {:?}", other),
        }
        assert_eq!(treebank, before);
    }

    #[test]
    fn test_reconcile_treebank_conflict_leaves_treebank_untouched() {
        // The same stray id in two sentences maps to two different targets.
        let mut treebank = Treebank::new(vec![
            Sentence::new("s1").with_terminal(Terminal::new("s10_1", "a")),
            Sentence::new("s2").with_terminal(Terminal::new("s10_1", "b")),
        ]);
        let before = treebank.clone();

        assert!(matches!(
            reconcile_treebank(&mut treebank, &["s1".to_string(), "s2".to_string()]),
            Err(AlignError::MappingConflict { .. })
        ));
        assert_eq!(treebank, before);
    }
}
