//! Arena-backed element tree.
//!
//! Nodes live in a flat `Vec` and refer to each other by index, so parsing
//! and traversal never recurse regardless of document depth.

use std::path::Path;

use quick_xml::{
  Decoder, Reader,
  encoding::detect_encoding,
  events::{BytesStart, Event},
};

use crate::{Error, Result};

pub type NodeId = usize;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
  pub name:  String,
  pub value: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
  /// Qualified tag name as written (`prefix:local` when prefixed).
  pub tag:        String,
  /// Attributes in document order, values unescaped.
  pub attributes: Vec<Attribute>,
  /// Character data between the start tag and the first child element.
  pub text:       String,
  pub parent:     Option<NodeId>,
  pub children:   Vec<NodeId>,
}

impl Node {
  pub fn trimmed_text(&self) -> &str { self.text.trim() }
}

/// A parsed document. Node `0` is the root.
#[derive(Debug, Clone)]
pub struct Document {
  nodes: Vec<Node>,
}

impl Document {
  pub fn parse_file(path: impl AsRef<Path>) -> Result<Self> {
    let bytes = std::fs::read(path)?;
    Self::parse(&bytes)
  }

  /// Parse a complete document. Fails on malformed markup, bytes invalid in
  /// the document encoding, a missing or duplicated root, or elements left
  /// open at end of input.
  ///
  /// The encoding comes from a byte order mark or the XML declaration and
  /// defaults to UTF-8. UTF-16 input is transcoded before parsing.
  pub fn parse(xml: &[u8]) -> Result<Self> {
    match detect_encoding(xml) {
      Some((encoding, _)) if !encoding.is_ascii_compatible() => {
        let (text, had_errors) = encoding.decode_with_bom_removal(xml);
        if had_errors {
          return Err(Error::Undecodable(encoding.name()));
        }
        Self::build(Reader::from_str(&text))
      }
      _ => Self::build(Reader::from_reader(xml)),
    }
  }

  fn build(mut reader: Reader<&[u8]>) -> Result<Self> {
    reader.config_mut().trim_text(true);

    let mut nodes: Vec<Node> = Vec::new();
    let mut open: Vec<NodeId> = Vec::new();
    let mut buf = Vec::new();

    loop {
      // The declaration may switch encodings, so fetch per event.
      let decoder = reader.decoder();
      match reader.read_event_into(&mut buf)? {
        Event::Start(e) => {
          let id = push_node(&mut nodes, &open, &e, decoder)?;
          open.push(id);
        }
        Event::Empty(e) => {
          push_node(&mut nodes, &open, &e, decoder)?;
        }
        Event::End(_) => {
          open.pop().ok_or(Error::UnmatchedEnd)?;
        }
        Event::Text(e) => {
          let text = e.unescape()?;
          push_text(&mut nodes, &open, &text)?;
        }
        Event::CData(e) => {
          let text = e.decode()?;
          push_text(&mut nodes, &open, &text)?;
        }
        Event::Eof => break,
        _ => {}
      }
      buf.clear();
    }

    if let Some(&id) = open.last() {
      return Err(Error::Unclosed(nodes[id].tag.clone()));
    }
    if nodes.is_empty() {
      return Err(Error::NoRoot);
    }
    Ok(Self { nodes })
  }

  pub fn root(&self) -> &Node { &self.nodes[0] }

  pub fn len(&self) -> usize { self.nodes.len() }

  pub fn is_empty(&self) -> bool { self.nodes.is_empty() }

  /// Depth-first, parent before children, children in document order.
  pub fn pre_order(&self) -> PreOrder<'_> { PreOrder { doc: self, stack: vec![0] } }

  /// Tag names from the root down to `id`, joined with `/`.
  pub fn node_path(&self, id: NodeId) -> String {
    let mut tags = Vec::new();
    let mut cursor = Some(id);
    while let Some(current) = cursor {
      let node = &self.nodes[current];
      tags.push(node.tag.as_str());
      cursor = node.parent;
    }
    tags.reverse();
    tags.join("/")
  }
}

pub struct PreOrder<'a> {
  doc:   &'a Document,
  stack: Vec<NodeId>,
}

impl<'a> Iterator for PreOrder<'a> {
  type Item = (NodeId, &'a Node);

  fn next(&mut self) -> Option<Self::Item> {
    let id = self.stack.pop()?;
    let node = &self.doc.nodes[id];
    self.stack.extend(node.children.iter().rev());
    Some((id, node))
  }
}

// ─── Builders ────────────────────────────────────────────────────────────────

fn push_node(
  nodes: &mut Vec<Node>,
  open: &[NodeId],
  start: &BytesStart<'_>,
  decoder: Decoder,
) -> Result<NodeId> {
  let tag = decoder.decode(start.name().as_ref())?.into_owned();
  let parent = open.last().copied();
  if parent.is_none() && !nodes.is_empty() {
    return Err(Error::MultipleRoots(tag));
  }

  let mut attributes = Vec::new();
  for attr in start.attributes() {
    let attr = attr?;
    attributes.push(Attribute {
      name:  decoder.decode(attr.key.as_ref())?.into_owned(),
      value: attr.decode_and_unescape_value(decoder)?.into_owned(),
    });
  }

  let id = nodes.len();
  nodes.push(Node { tag, attributes, text: String::new(), parent, children: Vec::new() });
  if let Some(parent) = parent {
    nodes[parent].children.push(id);
  }
  Ok(id)
}

fn push_text(nodes: &mut [Node], open: &[NodeId], text: &str) -> Result<()> {
  match open.last() {
    // Text after the first child is tail text of that child; not kept.
    Some(&id) if nodes[id].children.is_empty() => nodes[id].text.push_str(text),
    Some(_) => {}
    None if text.trim().is_empty() => {}
    None => return Err(Error::TextOutsideRoot),
  }
  Ok(())
}
