//! TIGER-XML treebanks.
//!
//! ```xml
//! <corpus id="de">
//!   <head>...</head>
//!   <body>
//!     <s id="s1">
//!       <graph root="s1_500">
//!         <terminals>
//!           <t id="s1_1" word="Hunde" pos="NN"/>
//!         </terminals>
//!         <nonterminals>
//!           <nt id="s1_500" cat="NP">
//!             <edge label="HD" idref="s1_1"/>
//!           </nt>
//!         </nonterminals>
//!       </graph>
//!     </s>
//!   </body>
//! </corpus>
//! ```
//!
//! Everything outside `<body>` is kept verbatim in the document shell and
//! reused whenever a treebank derived from this one is written.

use tracing::debug;
use treealign::{Edge, NonTerminal, Sentence, Terminal, Treebank};

use crate::element::{parse_document, write_document, Content, Element};
use crate::errors::{TigerError, TigerResult};

/// A parsed TIGER-XML file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TigerDocument {
    /// Root element with an empty `<body>`.
    shell: Element,
    pub treebank: Treebank,
}

impl TigerDocument {
    pub fn parse(xml: &str) -> TigerResult<Self> {
        let mut shell = parse_document(xml)?;
        if shell.name != "corpus" {
            return Err(TigerError::Structure {
                message: format!("expected <corpus> as root element, found <{}>", shell.name),
            });
        }
        let id = shell.attr("id").map(str::to_string);
        let body = shell
            .child_mut("body")
            .ok_or_else(|| TigerError::MissingElement {
                parent: "corpus".to_string(),
                element: "body".to_string(),
            })?;
        let content = std::mem::take(&mut body.children);

        let mut sentences = Vec::new();
        for child in &content {
            if let Content::Element(element) = child {
                if element.name == "s" {
                    sentences.push(sentence_from_element(element)?);
                }
            }
        }
        debug!(sentences = sentences.len(), "parsed TIGER-XML treebank");

        Ok(Self {
            shell,
            treebank: Treebank { id, sentences },
        })
    }

    /// Serialize this document's treebank.
    pub fn render(&self) -> TigerResult<String> {
        self.render_treebank(&self.treebank)
    }

    /// Serialize `treebank` inside this document's shell.
    pub fn render_treebank(&self, treebank: &Treebank) -> TigerResult<String> {
        let mut root = self.shell.clone();
        if let Some(id) = &treebank.id {
            root.set_attr("id", id.as_str());
        }
        if let Some(body) = root.child_mut("body") {
            body.children = treebank
                .sentences
                .iter()
                .map(|s| Content::Element(sentence_to_element(s)))
                .collect();
        }
        write_document(&root)
    }
}

fn edge_from_element(element: &Element) -> TigerResult<Edge> {
    Ok(Edge {
        idref: element.require_attr("idref")?.to_string(),
        label: element.attr("label").map(str::to_string),
        secondary: element.name == "secedge",
        attributes: element.other_attrs(&["idref", "label"]),
    })
}

fn sentence_from_element(s: &Element) -> TigerResult<Sentence> {
    let mut sentence = Sentence::new(s.require_attr("id")?);
    sentence.attributes = s.other_attrs(&["id"]);

    let graph = s.require_child("graph")?;
    sentence.root = graph.attr("root").map(str::to_string);
    sentence.graph_attributes = graph.other_attrs(&["root"]);

    if let Some(terminals) = graph.child("terminals") {
        for t in terminals.elements_named("t") {
            let mut terminal = Terminal::new(t.require_attr("id")?, t.require_attr("word")?);
            terminal.attributes = t.other_attrs(&["id", "word"]);
            for edge in t.elements_named("secedge") {
                terminal.edges.push(edge_from_element(edge)?);
            }
            sentence.terminals.push(terminal);
        }
    }

    if let Some(nonterminals) = graph.child("nonterminals") {
        for nt in nonterminals.elements_named("nt") {
            let mut nonterminal = NonTerminal::new(nt.require_attr("id")?, &[]);
            nonterminal.attributes = nt.other_attrs(&["id"]);
            for edge in nt.elements().filter(|e| e.name == "edge" || e.name == "secedge") {
                nonterminal.edges.push(edge_from_element(edge)?);
            }
            sentence.nonterminals.push(nonterminal);
        }
    }

    Ok(sentence)
}

fn edge_to_element(edge: &Edge) -> Element {
    let mut element = Element::new(if edge.secondary { "secedge" } else { "edge" });
    if let Some(label) = &edge.label {
        element.set_attr("label", label.as_str());
    }
    element.set_attr("idref", edge.idref.as_str());
    element.attributes.extend(edge.attributes.iter().cloned());
    element
}

fn sentence_to_element(sentence: &Sentence) -> Element {
    let mut graph = Element::new("graph");
    if let Some(root) = &sentence.root {
        graph.set_attr("root", root.as_str());
    }
    graph.attributes.extend(sentence.graph_attributes.iter().cloned());

    let mut terminals = Element::new("terminals");
    for terminal in &sentence.terminals {
        let mut t = Element::new("t")
            .with_attr("id", terminal.id.as_str())
            .with_attr("word", terminal.word.as_str());
        t.attributes.extend(terminal.attributes.iter().cloned());
        for edge in &terminal.edges {
            t.push(edge_to_element(edge));
        }
        terminals.push(t);
    }

    let mut nonterminals = Element::new("nonterminals");
    for nonterminal in &sentence.nonterminals {
        let mut nt = Element::new("nt").with_attr("id", nonterminal.id.as_str());
        nt.attributes.extend(nonterminal.attributes.iter().cloned());
        for edge in &nonterminal.edges {
            nt.push(edge_to_element(edge));
        }
        nonterminals.push(nt);
    }

    let mut s = Element::new("s").with_attr("id", sentence.id.as_str());
    s.attributes.extend(sentence.attributes.iter().cloned());
    s.with_child(graph.with_child(terminals).with_child(nonterminals))
}
