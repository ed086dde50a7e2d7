//! Stockholm TreeAligner (STA-XML) alignment documents.
//!
//! ```xml
//! <treealign subversion="3">
//!   <head>...</head>
//!   <treebanks>
//!     <treebank id="de" language="de_DE" filename="de.xml"/>
//!     <treebank id="ka" language="ka_GE" filename="ka.xml"/>
//!   </treebanks>
//!   <alignments>
//!     <align type="good" author="OLEG" last_change="2017-08-17">
//!       <node treebank_id="de" node_id="s1_1"/>
//!       <node treebank_id="ka" node_id="s1_1"/>
//!     </align>
//!   </alignments>
//! </treealign>
//! ```
//!
//! The first `<treebank>` is the source side and the second the target
//! side. Within an `<align>`, the first `<node>` is the source node.

use tracing::debug;
use treealign::{AlignmentDocument, AlignmentPair, Side, TreebankRef};

use crate::element::{parse_document, write_document, Content, Element};
use crate::errors::{TigerError, TigerResult};

/// A parsed STA-XML file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StaDocument {
    /// Root element with empty `<treebanks>` and `<alignments>`.
    shell: Element,
    pub alignment: AlignmentDocument,
}

fn structure(message: String) -> TigerError {
    TigerError::Structure { message }
}

fn treebank_ref(element: &Element) -> TigerResult<TreebankRef> {
    let mut reference = TreebankRef::new(
        element.require_attr("id")?,
        element.require_attr("filename")?,
    );
    reference.attributes = element.other_attrs(&["id", "filename"]);
    Ok(reference)
}

fn pair_from_element(align: &Element) -> TigerResult<AlignmentPair> {
    let nodes: Vec<&Element> = align.elements_named("node").collect();
    if nodes.len() != 2 {
        return Err(structure(format!(
            "<align> must contain exactly two <node> elements, found {}",
            nodes.len()
        )));
    }
    let mut pair = AlignmentPair::new(
        nodes[0].require_attr("node_id")?,
        nodes[1].require_attr("node_id")?,
    );
    pair.attributes = align.attributes.clone();
    Ok(pair)
}

impl StaDocument {
    pub fn parse(xml: &str) -> TigerResult<Self> {
        let mut shell = parse_document(xml)?;
        if shell.name != "treealign" {
            return Err(structure(format!(
                "expected <treealign> as root element, found <{}>",
                shell.name
            )));
        }

        let treebanks = take_children(&mut shell, "treebanks")?;
        let refs = treebanks
            .iter()
            .filter_map(|c| match c {
                Content::Element(e) if e.name == "treebank" => Some(treebank_ref(e)),
                _ => None,
            })
            .collect::<TigerResult<Vec<_>>>()?;
        let [source, target]: [TreebankRef; 2] = refs.try_into().map_err(|refs: Vec<_>| {
            structure(format!(
                "expected exactly two <treebank> references, found {}",
                refs.len()
            ))
        })?;

        let mut alignment = AlignmentDocument::new(source, target);
        for child in take_children(&mut shell, "alignments")? {
            if let Content::Element(align) = child {
                if align.name == "align" {
                    alignment.pairs.push(pair_from_element(&align)?);
                }
            }
        }
        debug!(pairs = alignment.pairs.len(), "parsed STA-XML alignment");

        Ok(Self { shell, alignment })
    }

    pub fn render(&self) -> TigerResult<String> {
        self.render_alignment(&self.alignment)
    }

    /// Serialize `alignment` inside this document's shell.
    pub fn render_alignment(&self, alignment: &AlignmentDocument) -> TigerResult<String> {
        let mut root = self.shell.clone();

        if let Some(treebanks) = root.child_mut("treebanks") {
            for side in Side::BOTH {
                let reference = alignment.treebank(side);
                let mut element = Element::new("treebank")
                    .with_attr("id", reference.id.as_str())
                    .with_attr("filename", reference.filename.as_str());
                element.attributes.extend(reference.attributes.iter().cloned());
                treebanks.push(element);
            }
        }

        if let Some(alignments) = root.child_mut("alignments") {
            for pair in &alignment.pairs {
                let mut align = Element::new("align");
                align.attributes = pair.attributes.clone();
                for side in Side::BOTH {
                    align.push(
                        Element::new("node")
                            .with_attr("treebank_id", alignment.treebank(side).id.as_str())
                            .with_attr("node_id", pair.node(side)),
                    );
                }
                alignments.push(align);
            }
        }

        write_document(&root)
    }
}

fn take_children(root: &mut Element, name: &str) -> TigerResult<Vec<Content>> {
    let element = root
        .child_mut(name)
        .ok_or_else(|| TigerError::MissingElement {
            parent: "treealign".to_string(),
            element: name.to_string(),
        })?;
    Ok(std::mem::take(&mut element.children))
}
