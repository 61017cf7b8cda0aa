//! Document model and XML source loader.
//!
//! ```xml
//! <document>
//!   <meta><subject>Report</subject></meta>
//!   <default>
//!     <format>a4</format>
//!     <page-margins><left>15</left><top>10</top><right>15</right><bottom>10</bottom></page-margins>
//!   </default>
//!   <style>title { font-size: 18; font-weight: bold; }</style>
//!   <header><Text class="title">Report</Text></header>
//!   <footer><SetY y="15" from-bottom="true"/><Text>page {cp} of {np}</Text></footer>
//!   <body>...</body>
//! </document>
//! ```
//!
//! The source is read into a lightweight element tree with `quick-xml`,
//! then every section element is decoded bottom-up through a [`Registry`].

use std::collections::BTreeMap;

use quick_xml::events::Event;
use quick_xml::Reader;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::classes::ClassTable;
use crate::error::{ForgeError, Result};
use crate::instruction::{Content, Instruction, Registry};
pub use crate::surface::PageSetup;

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Meta {
    pub author: String,
    pub creator: String,
    pub subject: String,
}

/// A loaded document. Read-only once built.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Document {
    pub meta: Meta,
    pub setup: PageSetup,
    pub classes: ClassTable,
    pub header: Vec<Instruction>,
    pub footer: Vec<Instruction>,
    pub body: Vec<Instruction>,
}

impl Document {
    /// Load with the standard instruction set.
    pub fn load(xml: &str) -> Result<Self> {
        Self::load_with(xml, &Registry::standard())
    }

    pub fn load_with(xml: &str, registry: &Registry) -> Result<Self> {
        let root = parse_tree(xml)?;
        if root.tag != "document" {
            return Err(ForgeError::Structure(format!(
                "expected <document> root, found <{}>",
                root.tag
            )));
        }

        let mut doc = Document::default();
        for child in root.children {
            let node = match child {
                Node::Text(t) if t.trim().is_empty() => continue,
                Node::Text(t) => {
                    return Err(ForgeError::Structure(format!(
                        "unexpected text '{}' in <document>",
                        t.trim()
                    )))
                }
                Node::Element(e) => e,
            };
            match node.tag.as_str() {
                "meta" => doc.meta = read_meta(&node)?,
                "default" => doc.setup = read_setup(&node)?,
                "style" => {
                    doc.classes = ClassTable::parse(&node.text())
                        .map_err(|e| ForgeError::syntax("style block", e))?
                }
                "header" => doc.header = decode_section(registry, node)?,
                "footer" => doc.footer = decode_section(registry, node)?,
                "body" => doc.body = decode_section(registry, node)?,
                other => {
                    return Err(ForgeError::Structure(format!(
                        "unexpected <{other}> in <document>"
                    )))
                }
            }
        }
        log::debug!(
            "loaded document: {} classes, {} header, {} footer, {} body instructions",
            doc.classes.len(),
            doc.header.len(),
            doc.footer.len(),
            doc.body.len()
        );
        Ok(doc)
    }
}

// ---------------------------------------------------------------------------
// Element tree
// ---------------------------------------------------------------------------

#[derive(Debug)]
struct Element {
    tag: String,
    attributes: BTreeMap<String, String>,
    children: Vec<Node>,
}

#[derive(Debug)]
enum Node {
    Text(String),
    Element(Element),
}

impl Element {
    fn new(tag: String, attributes: BTreeMap<String, String>) -> Self {
        Self {
            tag,
            attributes,
            children: Vec::new(),
        }
    }

    fn text(&self) -> String {
        self.children
            .iter()
            .filter_map(|c| match c {
                Node::Text(t) => Some(t.as_str()),
                Node::Element(_) => None,
            })
            .collect()
    }

    fn elements(&self) -> impl Iterator<Item = &Element> {
        self.children.iter().filter_map(|c| match c {
            Node::Element(e) => Some(e),
            Node::Text(_) => None,
        })
    }
}

fn parse_tree(xml: &str) -> Result<Element> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(false);

    let xml_error = |source: quick_xml::Error, position: u64| ForgeError::Xml { source, position };

    // The bottom of the stack collects the root element.
    let mut stack: Vec<Element> = vec![Element::new(String::new(), BTreeMap::new())];
    loop {
        let position = reader.buffer_position() as u64;
        let event = reader.read_event().map_err(|e| xml_error(e, position))?;
        match event {
            Event::Start(e) => {
                let tag = String::from_utf8_lossy(e.name().as_ref()).into_owned();
                let attributes = read_attributes(&e).map_err(|err| xml_error(err, position))?;
                stack.push(Element::new(tag, attributes));
            }
            Event::Empty(e) => {
                let tag = String::from_utf8_lossy(e.name().as_ref()).into_owned();
                let attributes = read_attributes(&e).map_err(|err| xml_error(err, position))?;
                push_child(&mut stack, Node::Element(Element::new(tag, attributes)));
            }
            Event::Text(t) => {
                let text = t.unescape().map_err(|err| xml_error(err, position))?;
                if !text.is_empty() {
                    push_child(&mut stack, Node::Text(text.into_owned()));
                }
            }
            Event::CData(c) => {
                let text = String::from_utf8_lossy(&c).into_owned();
                push_child(&mut stack, Node::Text(text));
            }
            Event::End(_) => {
                if let Some(done) = stack.pop() {
                    push_child(&mut stack, Node::Element(done));
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    let top = stack
        .pop()
        .ok_or_else(|| ForgeError::Structure("empty document".into()))?;
    if !stack.is_empty() {
        return Err(ForgeError::Structure(format!("unclosed <{}>", top.tag)));
    }
    top.children
        .into_iter()
        .find_map(|n| match n {
            Node::Element(e) => Some(e),
            Node::Text(_) => None,
        })
        .ok_or_else(|| ForgeError::Structure("empty document".into()))
}

fn push_child(stack: &mut [Element], node: Node) {
    if let Some(parent) = stack.last_mut() {
        parent.children.push(node);
    }
}

fn read_attributes(
    e: &quick_xml::events::BytesStart<'_>,
) -> std::result::Result<BTreeMap<String, String>, quick_xml::Error> {
    let mut attributes = BTreeMap::new();
    for attr in e.attributes() {
        let attr = attr.map_err(quick_xml::Error::from)?;
        let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
        let value = attr.unescape_value()?.into_owned();
        attributes.insert(key, value);
    }
    Ok(attributes)
}

// ---------------------------------------------------------------------------
// Sections
// ---------------------------------------------------------------------------

fn decode_section(registry: &Registry, section: Element) -> Result<Vec<Instruction>> {
    let mut instructions = Vec::new();
    for child in section.children {
        match child {
            Node::Text(t) if t.trim().is_empty() => {}
            Node::Text(t) => {
                return Err(ForgeError::Structure(format!(
                    "text '{}' outside of an instruction in <{}>",
                    t.trim(),
                    section.tag
                )))
            }
            Node::Element(e) => instructions.push(decode(registry, e)?),
        }
    }
    Ok(instructions)
}

fn decode(registry: &Registry, element: Element) -> Result<Instruction> {
    let mut content = Vec::with_capacity(element.children.len());
    for child in element.children {
        content.push(match child {
            Node::Text(t) => Content::Text(t),
            Node::Element(e) => Content::Child(decode(registry, e)?),
        });
    }
    registry.decode_element(&element.tag, element.attributes, content)
}

fn read_meta(node: &Element) -> Result<Meta> {
    let mut meta = Meta::default();
    for field in node.elements() {
        let value = field.text().trim().to_string();
        match field.tag.as_str() {
            "author" => meta.author = value,
            "creator" => meta.creator = value,
            "subject" => meta.subject = value,
            other => log::warn!("ignoring unknown <meta> field <{other}>"),
        }
    }
    Ok(meta)
}

/// Map the `default` block onto [`PageSetup`] through its serde form.
fn read_setup(node: &Element) -> Result<PageSetup> {
    let mut fields = Map::new();
    for field in node.elements() {
        match field.tag.as_str() {
            "page-margins" => {
                let mut margins = Map::new();
                for side in field.elements() {
                    let raw = side.text();
                    let value: f64 = raw.trim().parse().map_err(|_| {
                        ForgeError::Structure(format!(
                            "page margin <{}> is not a number: '{}'",
                            side.tag,
                            raw.trim()
                        ))
                    })?;
                    margins.insert(side.tag.clone(), Value::from(value));
                }
                fields.insert("margins".into(), Value::Object(margins));
            }
            tag => {
                fields.insert(tag.to_string(), Value::String(field.text().trim().to_string()));
            }
        }
    }
    serde_json::from_value(Value::Object(fields))
        .map_err(|e| ForgeError::Structure(format!("invalid <default> block: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::instruction::InstructionKind;
    use crate::style::Edges;
    use crate::surface::{Orientation, PageBreaks, PageFormat, Unit};

    const SAMPLE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<document>
  <meta>
    <author>A. Writer</author>
    <subject>Quarterly &amp; more</subject>
  </meta>
  <default>
    <orientation>landscape</orientation>
    <unit>pt</unit>
    <format>letter</format>
    <page-breaks>manual</page-breaks>
    <page-margins><left>1</left><top>2</top><right>3</right><bottom>4</bottom></page-margins>
  </default>
  <style>
    title { font-size: 18; }
  </style>
  <header><Text class="title">Head</Text></header>
  <body>
    <Text style="h-align: right">Hello <![CDATA[<world>]]></Text>
    <Lf lines="2"/>
    <table>
      <tr><td>a</td><td style="row-span: 1">b<Box>inner</Box></td></tr>
    </table>
  </body>
</document>"#;

    #[test]
    fn loads_all_sections() {
        let doc = Document::load(SAMPLE).unwrap();
        assert_eq!(doc.meta.author, "A. Writer");
        assert_eq!(doc.meta.subject, "Quarterly & more");
        assert_eq!(doc.setup.orientation, Orientation::Landscape);
        assert_eq!(doc.setup.unit, Unit::Pt);
        assert_eq!(doc.setup.format, PageFormat::Letter);
        assert_eq!(doc.setup.page_breaks, PageBreaks::Manual);
        assert_eq!(
            doc.setup.margins,
            Edges {
                left: 1.0,
                top: 2.0,
                right: 3.0,
                bottom: 4.0
            }
        );
        assert!(doc.classes.get("title").is_some());
        assert_eq!(doc.header.len(), 1);
        assert!(doc.footer.is_empty());
        assert_eq!(doc.body.len(), 3);
        assert_eq!(
            doc.body[0].kind,
            InstructionKind::Text {
                text: "Hello <world>".into()
            }
        );
        assert_eq!(doc.body[1].kind, InstructionKind::LineFeed { lines: 2.0 });
    }

    #[test]
    fn missing_default_block_uses_defaults() {
        let doc = Document::load("<document><body><Text>x</Text></body></document>").unwrap();
        assert_eq!(doc.setup, PageSetup::default());
        assert_eq!(doc.meta, Meta::default());
    }

    #[test]
    fn partial_default_block() {
        let doc = Document::load(
            "<document><default><format>a5</format></default><body/></document>",
        )
        .unwrap();
        assert_eq!(doc.setup.format, PageFormat::A5);
        assert_eq!(doc.setup.unit, Unit::Mm);
        assert_eq!(doc.setup.margins, Edges::uniform(10.0));
    }

    #[test]
    fn load_errors() {
        assert!(matches!(
            Document::load("<document><body><Blink/></body></document>"),
            Err(ForgeError::UnknownReference { .. })
        ));
        assert!(matches!(
            Document::load("<document><style>x { colour: red; }</style></document>"),
            Err(ForgeError::Syntax { .. })
        ));
        assert!(matches!(
            Document::load("<document><body><Text>x</Box></body></document>"),
            Err(ForgeError::Xml { .. })
        ));
        assert!(matches!(
            Document::load("<page/>"),
            Err(ForgeError::Structure(_))
        ));
        assert!(matches!(
            Document::load("<document><default><unit>furlong</unit></default></document>"),
            Err(ForgeError::Structure(_))
        ));
        assert!(matches!(
            Document::load("<document><body>loose text</body></document>"),
            Err(ForgeError::Structure(_))
        ));
    }
}
