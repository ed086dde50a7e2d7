//! In-memory syntax-tree corpus.
//!
//! A [`Treebank`] is an ordered list of [`Sentence`]s. Each sentence owns its
//! terminals (words) and non-terminals (constituents); non-terminals point to
//! their children through [`Edge`] idrefs, which must resolve inside the same
//! sentence.
//!
//! Attributes the crate does not interpret (part of speech, morphology,
//! category labels, ...) are carried in document order so that a treebank
//! can be written back without losing annotation.

use std::collections::{BTreeSet, HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::ids::{self, NodeId};

/// Unmodelled `(name, value)` attributes in document order.
pub type Attributes = Vec<(String, String)>;

/// Kind of a node within a sentence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NodeKind {
    Terminal,
    NonTerminal,
}

/// A reference from a node to a child (or, for secondary edges, a related) node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Edge {
    pub idref: String,
    pub label: Option<String>,
    /// Secondary edges (`secedge` in TIGER-XML) are not part of the tree proper.
    pub secondary: bool,
    pub attributes: Attributes,
}

impl Edge {
    pub fn new(idref: impl Into<String>) -> Self {
        Self {
            idref: idref.into(),
            label: None,
            secondary: false,
            attributes: Vec::new(),
        }
    }

    pub fn labelled(idref: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            label: Some(label.into()),
            ..Self::new(idref)
        }
    }
}

/// A leaf node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Terminal {
    pub id: String,
    /// Surface form.
    pub word: String,
    pub attributes: Attributes,
    /// Secondary edges only.
    pub edges: Vec<Edge>,
}

impl Terminal {
    pub fn new(id: impl Into<String>, word: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            word: word.into(),
            attributes: Vec::new(),
            edges: Vec::new(),
        }
    }
}

/// An internal node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NonTerminal {
    pub id: String,
    pub attributes: Attributes,
    pub edges: Vec<Edge>,
}

impl NonTerminal {
    pub fn new(id: impl Into<String>, children: &[&str]) -> Self {
        Self {
            id: id.into(),
            attributes: Vec::new(),
            edges: children.iter().map(|c| Edge::new(*c)).collect(),
        }
    }

    /// Child idrefs of the primary edges, in order.
    pub fn children(&self) -> impl Iterator<Item = &str> {
        self.edges
            .iter()
            .filter(|e| !e.secondary)
            .map(|e| e.idref.as_str())
    }
}

/// Borrowed view of either node variant.
#[derive(Debug, Clone, Copy)]
pub enum NodeRef<'a> {
    Terminal(&'a Terminal),
    NonTerminal(&'a NonTerminal),
}

impl<'a> NodeRef<'a> {
    pub fn id(&self) -> &'a str {
        match self {
            NodeRef::Terminal(t) => &t.id,
            NodeRef::NonTerminal(nt) => &nt.id,
        }
    }

    pub fn kind(&self) -> NodeKind {
        match self {
            NodeRef::Terminal(_) => NodeKind::Terminal,
            NodeRef::NonTerminal(_) => NodeKind::NonTerminal,
        }
    }

    pub fn edges(&self) -> &'a [Edge] {
        match self {
            NodeRef::Terminal(t) => &t.edges,
            NodeRef::NonTerminal(nt) => &nt.edges,
        }
    }
}

/// One parsed sentence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sentence {
    /// Declared id, expected to look like `s<number>`.
    pub id: String,
    /// Designated root node.
    pub root: Option<String>,
    pub attributes: Attributes,
    /// Attributes of the graph wrapper other than the root.
    pub graph_attributes: Attributes,
    pub terminals: Vec<Terminal>,
    pub nonterminals: Vec<NonTerminal>,
}

impl Sentence {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            root: None,
            attributes: Vec::new(),
            graph_attributes: Vec::new(),
            terminals: Vec::new(),
            nonterminals: Vec::new(),
        }
    }

    pub fn with_root(mut self, root: impl Into<String>) -> Self {
        self.root = Some(root.into());
        self
    }

    pub fn with_terminal(mut self, terminal: Terminal) -> Self {
        self.terminals.push(terminal);
        self
    }

    pub fn with_nonterminal(mut self, nonterminal: NonTerminal) -> Self {
        self.nonterminals.push(nonterminal);
        self
    }

    /// Terminals then non-terminals, in document order.
    pub fn nodes(&self) -> impl Iterator<Item = NodeRef<'_>> {
        self.terminals
            .iter()
            .map(NodeRef::Terminal)
            .chain(self.nonterminals.iter().map(NodeRef::NonTerminal))
    }

    pub fn node_ids(&self) -> impl Iterator<Item = &str> {
        self.nodes().map(|n| n.id())
    }

    pub fn contains_node(&self, id: &str) -> bool {
        self.node_ids().any(|n| n == id)
    }

    /// All edges of the sentence, primary and secondary.
    pub fn edges(&self) -> impl Iterator<Item = &Edge> {
        self.nodes().flat_map(|n| n.edges().iter())
    }

    /// Idrefs that do not resolve to a node of this sentence.
    pub fn dangling_idrefs(&self) -> Vec<String> {
        let existing: HashSet<&str> = self.node_ids().collect();
        self.edges()
            .map(|e| e.idref.as_str())
            .filter(|idref| !existing.contains(idref))
            .map(str::to_string)
            .collect()
    }

    /// Distinct sentence numbers used by the declared id, the node ids and
    /// the edge idrefs, as written (so `s083` and `s83` count twice).
    ///
    /// Ids that do not decompose are skipped.
    pub fn sentence_ids_in_use(&self) -> BTreeSet<String> {
        let mut in_use = BTreeSet::new();
        in_use.insert(ids::sentence_digits(&self.id).to_string());
        let references = self
            .node_ids()
            .chain(self.edges().map(|e| e.idref.as_str()));
        for id in references {
            if let Ok(node) = NodeId::parse(id) {
                in_use.insert(node.sentence_digits().to_string());
            }
        }
        in_use
    }

    /// Surface forms joined by single spaces.
    pub fn text(&self) -> String {
        self.terminals
            .iter()
            .map(|t| t.word.as_str())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Summary of sentence-id health across a treebank.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SentenceCensus {
    /// Number of sentences.
    pub sentences: usize,
    /// Number of sentences whose id was seen for the first time.
    pub unique: usize,
    /// Repeated sentence ids, once per repetition.
    pub duplicate_ids: Vec<String>,
    /// Sentences whose nodes refer to more than one sentence number.
    pub mixed_id_sentences: Vec<String>,
}

impl SentenceCensus {
    pub fn is_clean(&self) -> bool {
        self.duplicate_ids.is_empty() && self.mixed_id_sentences.is_empty()
    }
}

/// An ordered corpus of sentences.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Treebank {
    pub id: Option<String>,
    pub sentences: Vec<Sentence>,
}

impl Treebank {
    pub fn new(sentences: Vec<Sentence>) -> Self {
        Self { id: None, sentences }
    }

    pub fn len(&self) -> usize {
        self.sentences.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sentences.is_empty()
    }

    pub fn sentence_ids(&self) -> impl Iterator<Item = &str> {
        self.sentences.iter().map(|s| s.id.as_str())
    }

    /// First sentence declared with `id`.
    pub fn sentence(&self, id: &str) -> Option<&Sentence> {
        self.sentences.iter().find(|s| s.id == id)
    }

    /// Every node id of the corpus with its kind.
    pub fn node_kinds(&self) -> HashMap<&str, NodeKind> {
        self.sentences
            .iter()
            .flat_map(|s| s.nodes())
            .map(|n| (n.id(), n.kind()))
            .collect()
    }

    /// Terminal id → surface form.
    pub fn words(&self) -> HashMap<&str, &str> {
        self.sentences
            .iter()
            .flat_map(|s| s.terminals.iter())
            .map(|t| (t.id.as_str(), t.word.as_str()))
            .collect()
    }

    pub fn census(&self) -> SentenceCensus {
        let mut seen = HashSet::new();
        let mut census = SentenceCensus::default();
        for sentence in &self.sentences {
            census.sentences += 1;
            if seen.insert(sentence.id.as_str()) {
                census.unique += 1;
            } else {
                census.duplicate_ids.push(sentence.id.clone());
            }
            if sentence.sentence_ids_in_use().len() > 1 {
                census.mixed_id_sentences.push(sentence.id.clone());
            }
        }
        census
    }

    /// Ids of sentences declared with leading zeros, in corpus order.
    pub fn sentences_with_leading_zeros(&self) -> Vec<String> {
        self.sentence_ids()
            .filter(|id| ids::has_leading_zeros(id))
            .map(str::to_string)
            .collect()
    }

    /// `(sentence id, idref)` for every edge that does not resolve.
    pub fn dangling_idrefs(&self) -> Vec<(String, String)> {
        self.sentences
            .iter()
            .flat_map(|s| {
                s.dangling_idrefs()
                    .into_iter()
                    .map(move |idref| (s.id.clone(), idref))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_sentence() -> Sentence {
        Sentence::new("s83")
            .with_root("s83_500")
            .with_terminal(Terminal::new("s83_1", "Der"))
            .with_terminal(Terminal::new("s830_1", "Hund"))
            .with_nonterminal(NonTerminal::new("s83_500", &["s83_1", "s830_1"]))
    }

    #[test]
    fn test_nodes_in_document_order() {
        let sentence = sample_sentence();
        let ids: Vec<_> = sentence.node_ids().collect();
        assert_eq!(ids, vec!["s83_1", "s830_1", "s83_500"]);
        assert_eq!(sentence.text(), "Der Hund");
    }

    #[test]
    fn test_sentence_ids_in_use() {
        let sentence = sample_sentence();
        let in_use: Vec<_> = sentence.sentence_ids_in_use().into_iter().collect();
        assert_eq!(in_use, vec!["83", "830"]);
    }

    #[test]
    fn test_dangling_idrefs() {
        let mut sentence = sample_sentence();
        assert!(sentence.dangling_idrefs().is_empty());
        sentence.nonterminals[0].edges.push(Edge::new("s83_9"));
        assert_eq!(sentence.dangling_idrefs(), vec!["s83_9".to_string()]);
    }

    #[test]
    fn test_census() {
        let treebank = Treebank::new(vec![
            sample_sentence(),
            Sentence::new("s84").with_terminal(Terminal::new("s84_1", "x")),
            Sentence::new("s84").with_terminal(Terminal::new("s84_2", "y")),
        ]);
        let census = treebank.census();
        assert_eq!(census.sentences, 3);
        assert_eq!(census.unique, 2);
        assert_eq!(census.duplicate_ids, vec!["s84".to_string()]);
        assert_eq!(census.mixed_id_sentences, vec!["s83".to_string()]);
        assert!(!census.is_clean());
    }

    #[test]
    fn test_sentences_with_leading_zeros() {
        let treebank = Treebank::new(vec![
            Sentence::new("s0001"),
            Sentence::new("s2"),
            Sentence::new("s003"),
        ]);
        assert_eq!(
            treebank.sentences_with_leading_zeros(),
            vec!["s0001".to_string(), "s003".to_string()]
        );
    }

    #[test]
    fn test_node_kinds_and_words() {
        let treebank = Treebank::new(vec![sample_sentence()]);
        let kinds = treebank.node_kinds();
        assert_eq!(kinds["s83_1"], NodeKind::Terminal);
        assert_eq!(kinds["s83_500"], NodeKind::NonTerminal);
        assert_eq!(treebank.words()["s830_1"], "Hund");
    }
}
