//! A small owned XML element tree over quick-xml events.
//!
//! Treebank and alignment documents carry metadata (`<head>`, feature
//! declarations, alignment types) that the model does not interpret. Parsing
//! into a generic tree first keeps that content intact for writing.

use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};
use serde::{Deserialize, Serialize};
use treealign::Attributes;

use crate::errors::{TigerError, TigerResult};

/// An element with its attributes in document order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Element {
    pub name: String,
    pub attributes: Attributes,
    pub children: Vec<Content>,
}

/// Child content of an element.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Content {
    Element(Element),
    Text(String),
}

impl Element {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attributes: Vec::new(),
            children: Vec::new(),
        }
    }

    pub fn with_attr(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.set_attr(key, value);
        self
    }

    pub fn with_child(mut self, child: Element) -> Self {
        self.children.push(Content::Element(child));
        self
    }

    pub fn attr(&self, key: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn require_attr(&self, key: &str) -> TigerResult<&str> {
        self.attr(key).ok_or_else(|| TigerError::MissingAttribute {
            element: self.name.clone(),
            attribute: key.to_string(),
        })
    }

    /// Replace the value of `key`, appending it when absent.
    pub fn set_attr(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        match self.attributes.iter_mut().find(|(k, _)| *k == key) {
            Some((_, v)) => *v = value,
            None => self.attributes.push((key, value)),
        }
    }

    /// Attributes other than `excluded`, in document order.
    pub fn other_attrs(&self, excluded: &[&str]) -> Attributes {
        self.attributes
            .iter()
            .filter(|(k, _)| !excluded.contains(&k.as_str()))
            .cloned()
            .collect()
    }

    pub fn push(&mut self, child: Element) {
        self.children.push(Content::Element(child));
    }

    /// Child elements, skipping text.
    pub fn elements(&self) -> impl Iterator<Item = &Element> {
        self.children.iter().filter_map(|c| match c {
            Content::Element(e) => Some(e),
            Content::Text(_) => None,
        })
    }

    pub fn elements_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Element> + 'a {
        self.elements().filter(move |e| e.name == name)
    }

    pub fn child(&self, name: &str) -> Option<&Element> {
        self.elements().find(|e| e.name == name)
    }

    pub fn child_mut(&mut self, name: &str) -> Option<&mut Element> {
        self.children.iter_mut().find_map(|c| match c {
            Content::Element(e) if e.name == name => Some(e),
            _ => None,
        })
    }

    pub fn require_child(&self, name: &str) -> TigerResult<&Element> {
        self.child(name).ok_or_else(|| TigerError::MissingElement {
            parent: self.name.clone(),
            element: name.to_string(),
        })
    }

    /// Concatenated text content of direct children.
    pub fn text(&self) -> String {
        self.children
            .iter()
            .filter_map(|c| match c {
                Content::Text(t) => Some(t.as_str()),
                Content::Element(_) => None,
            })
            .collect()
    }

    fn from_start(start: &BytesStart<'_>) -> TigerResult<Self> {
        let mut element = Element::new(String::from_utf8_lossy(start.name().as_ref()));
        for attr in start.attributes() {
            let attr = attr.map_err(quick_xml::Error::from)?;
            let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
            let value = attr.unescape_value()?.into_owned();
            element.attributes.push((key, value));
        }
        Ok(element)
    }
}

fn structure(message: impl Into<String>) -> TigerError {
    TigerError::Structure {
        message: message.into(),
    }
}

fn attach(stack: &mut [Element], root: &mut Option<Element>, element: Element) -> TigerResult<()> {
    match stack.last_mut() {
        Some(parent) => parent.push(element),
        None if root.is_none() => *root = Some(element),
        None => {
            return Err(structure(format!(
                "second top-level element <{}>",
                element.name
            )))
        }
    }
    Ok(())
}

/// Parse a complete document into its root element.
///
/// Declarations, comments and processing instructions are dropped;
/// whitespace around text is trimmed.
pub fn parse_document(xml: &str) -> TigerResult<Element> {
    let mut reader = Reader::from_str(xml);
    reader.trim_text(true);

    let mut stack: Vec<Element> = Vec::new();
    let mut root = None;
    loop {
        match reader.read_event()? {
            Event::Start(start) => stack.push(Element::from_start(&start)?),
            Event::Empty(start) => {
                let element = Element::from_start(&start)?;
                attach(&mut stack, &mut root, element)?;
            }
            Event::End(_) => {
                let element = stack
                    .pop()
                    .ok_or_else(|| structure("end tag without a matching start tag"))?;
                attach(&mut stack, &mut root, element)?;
            }
            Event::Text(text) => {
                if let Some(parent) = stack.last_mut() {
                    parent
                        .children
                        .push(Content::Text(text.unescape()?.into_owned()));
                }
            }
            Event::CData(data) => {
                if let Some(parent) = stack.last_mut() {
                    let text = String::from_utf8_lossy(&data.into_inner()).into_owned();
                    parent.children.push(Content::Text(text));
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if let Some(open) = stack.last() {
        return Err(structure(format!("element <{}> is never closed", open.name)));
    }
    root.ok_or_else(|| structure("document has no root element"))
}

/// Serialize `root` with an XML declaration and two-space indentation.
pub fn write_document(root: &Element) -> TigerResult<String> {
    let mut writer = Writer::new_with_indent(Vec::new(), b' ', 2);
    writer
        .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))
        .map_err(quick_xml::Error::from)?;
    write_element(&mut writer, root)?;

    let mut bytes = writer.into_inner();
    bytes.push(b'\n');
    String::from_utf8(bytes).map_err(|e| structure(e.to_string()))
}

fn write_element(writer: &mut Writer<Vec<u8>>, element: &Element) -> TigerResult<()> {
    let mut start = BytesStart::new(element.name.as_str());
    for (key, value) in &element.attributes {
        start.push_attribute((key.as_str(), value.as_str()));
    }

    if element.children.is_empty() {
        writer
            .write_event(Event::Empty(start))
            .map_err(quick_xml::Error::from)?;
        return Ok(());
    }

    writer
        .write_event(Event::Start(start))
        .map_err(quick_xml::Error::from)?;
    for child in &element.children {
        match child {
            Content::Element(e) => write_element(writer, e)?,
            Content::Text(text) => writer
                .write_event(Event::Text(BytesText::new(text)))
                .map_err(quick_xml::Error::from)?,
        }
    }
    writer
        .write_event(Event::End(BytesEnd::new(element.name.as_str())))
        .map_err(quick_xml::Error::from)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_keeps_attribute_order_and_text() {
        let root = parse_document(
            r#"<?xml version="1.0"?>
            <corpus id="c1" version="2">
              <head><meta><name>Test &amp; corpus</name></meta></head>
              <body/>
            </corpus>"#,
        )
        .unwrap();

        assert_eq!(root.name, "corpus");
        assert_eq!(
            root.attributes,
            vec![
                ("id".to_string(), "c1".to_string()),
                ("version".to_string(), "2".to_string())
            ]
        );
        let name = root
            .require_child("head")
            .and_then(|h| h.require_child("meta"))
            .and_then(|m| m.require_child("name"))
            .unwrap();
        assert_eq!(name.text(), "Test & corpus");
        assert!(root.child("body").unwrap().children.is_empty());
    }

    #[test]
    fn test_write_document() {
        let root = Element::new("treealign")
            .with_child(
                Element::new("treebanks")
                    .with_child(Element::new("treebank").with_attr("id", "de").with_attr("filename", "a<b>.xml")),
            )
            .with_child(Element::new("alignments"));

        insta::assert_snapshot!(write_document(&root).unwrap(), @r###"
        <?xml version="1.0" encoding="UTF-8"?>
        <treealign>
          <treebanks>
            <treebank id="de" filename="a&lt;b&gt;.xml"/>
          </treebanks>
          <alignments/>
        </treealign>
        "###);
    }

    #[test]
    fn test_write_then_parse_preserves_tree() {
        let mut head = Element::new("head");
        head.children.push(Content::Text("free text".to_string()));
        let root = Element::new("corpus")
            .with_attr("id", "x")
            .with_child(head)
            .with_child(Element::new("body").with_child(Element::new("s").with_attr("id", "s1")));

        let reparsed = parse_document(&write_document(&root).unwrap()).unwrap();
        assert_eq!(reparsed, root);
    }

    #[test]
    fn test_structure_errors() {
        assert!(matches!(
            parse_document("<a/><b/>"),
            Err(TigerError::Structure { .. })
        ));
        assert!(matches!(
            parse_document(""),
            Err(TigerError::Structure { .. })
        ));
        assert!(parse_document("<a><b></a>").is_err());
    }

    #[test]
    fn test_missing_attribute() {
        let element = Element::new("t").with_attr("id", "s1_1");
        match element.require_attr("word") {
            Err(TigerError::MissingAttribute { element, attribute }) => {
                assert_eq!(element, "t");
                assert_eq!(attribute, "word");
            }
            other => panic!("expected MissingAttribute, got {:?}", other),
        }
    }
}
