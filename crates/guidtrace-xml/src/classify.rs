//! Heuristic inference of a document's descriptive fields.
//!
//! Each field has an ordered list of keywords. Walking the tree in pre-order,
//! a field takes the first attribute value whose name or value contains one of
//! its keywords, or the first node text containing one, whichever comes first.
//! Matching is a case-insensitive substring test over both attribute names and
//! attribute values, so a value that merely contains a keyword also counts.

use guidtrace_core::{document::DocumentFields, record::MetadataField};
use strum::IntoEnumIterator as _;

use crate::tree::{Document, Node};

/// Ordered `(field, keywords)` pairs driving [`classify`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeywordRules {
  rules: Vec<(MetadataField, Vec<String>)>,
}

impl Default for KeywordRules {
  fn default() -> Self {
    Self::new(MetadataField::iter().map(|field| {
      let keywords: &[&str] = match field {
        MetadataField::PhysicalPort => &["physicalport", "physical_port", "port", "phyport"],
        MetadataField::MessageName => &["message", "msg", "word_name", "messagename"],
        MetadataField::DpName => &["dpname", "dp_name"],
        MetadataField::FullName => &["fullname", "full_name", "全名"],
      };
      (field, keywords.iter().map(|k| k.to_string()).collect())
    }))
  }
}

impl KeywordRules {
  /// Keywords are lowercased; empty keywords are dropped.
  pub fn new(rules: impl IntoIterator<Item = (MetadataField, Vec<String>)>) -> Self {
    let rules = rules
      .into_iter()
      .map(|(field, keywords)| {
        let keywords = keywords
          .into_iter()
          .filter(|k| !k.is_empty())
          .map(|k| k.to_lowercase())
          .collect();
        (field, keywords)
      })
      .collect();
    Self { rules }
  }

  /// Replace the keyword list for `field`, keeping its position.
  pub fn with_keywords(mut self, field: MetadataField, keywords: Vec<String>) -> Self {
    let keywords: Vec<String> = keywords
      .into_iter()
      .filter(|k| !k.is_empty())
      .map(|k| k.to_lowercase())
      .collect();
    match self.rules.iter_mut().find(|(f, _)| *f == field) {
      Some((_, existing)) => *existing = keywords,
      None => self.rules.push((field, keywords)),
    }
    self
  }

  pub fn keywords(&self, field: MetadataField) -> &[String] {
    self
      .rules
      .iter()
      .find(|(f, _)| *f == field)
      .map(|(_, k)| k.as_slice())
      .unwrap_or(&[])
  }

  fn matching<'a>(&'a self, haystacks: &'a [&'a str]) -> impl Iterator<Item = MetadataField> + 'a {
    self
      .rules
      .iter()
      .filter(move |(_, keywords)| {
        keywords.iter().any(|kw| haystacks.iter().any(|h| h.contains(kw.as_str())))
      })
      .map(|(field, _)| *field)
  }
}

/// Infer the four descriptive fields of `doc`. Never fails; fields with no
/// keyword hit stay `None`.
pub fn classify(doc: &Document, rules: &KeywordRules) -> DocumentFields {
  let mut fields = DocumentFields::default();
  for (_, node) in doc.pre_order() {
    fields = classify_node(node, rules, fields);
    if fields.is_complete() {
      break;
    }
  }
  fields
}

fn classify_node(node: &Node, rules: &KeywordRules, mut acc: DocumentFields) -> DocumentFields {
  for attr in &node.attributes {
    let name = attr.name.to_lowercase();
    let value = attr.value.to_lowercase();
    let haystacks = [name.as_str(), value.as_str()];
    for field in rules.matching(&haystacks) {
      acc.fill(field, &attr.value);
    }
  }

  let text = node.trimmed_text();
  if !text.is_empty() {
    let lower = text.to_lowercase();
    let haystacks = [lower.as_str()];
    for field in rules.matching(&haystacks) {
      acc.fill(field, text);
    }
  }
  acc
}

#[cfg(test)]
mod tests {
  use super::*;

  fn fields(xml: &str) -> DocumentFields {
    let doc = Document::parse(xml.as_bytes()).unwrap();
    classify(&doc, &KeywordRules::default())
  }

  #[test]
  fn attribute_names_select_fields() {
    let f = fields(
      r#"<Icd PhysicalPort="A429-RX1" MessageName="ALT_MSG" DP_Name="ALT" FullName="Altitude"/>"#,
    );
    assert_eq!(f.physical_port.as_deref(), Some("A429-RX1"));
    assert_eq!(f.message_name.as_deref(), Some("ALT_MSG"));
    assert_eq!(f.dp_name.as_deref(), Some("ALT"));
    assert_eq!(f.full_name.as_deref(), Some("Altitude"));
  }

  #[test]
  fn first_match_wins_in_traversal_order() {
    let f = fields(r#"<Root><A port="early"/><B><C port="late"/></B></Root>"#);
    assert_eq!(f.physical_port.as_deref(), Some("early"));
  }

  #[test]
  fn parent_is_visited_before_children() {
    let f = fields(r#"<Root><A><B port="child"/></A><A port="sibling"/></Root>"#);
    assert_eq!(f.physical_port.as_deref(), Some("child"));
  }

  #[test]
  fn attribute_values_are_searched_too() {
    let f = fields(r#"<Root><Item kind="Msg_Header"/></Root>"#);
    assert_eq!(f.message_name.as_deref(), Some("Msg_Header"));
  }

  #[test]
  fn node_text_is_searched_after_attributes() {
    let f = fields(r#"<Root><Label>  Full_Name of signal  </Label></Root>"#);
    assert_eq!(f.full_name.as_deref(), Some("Full_Name of signal"));
    assert!(f.physical_port.is_none());
  }

  #[test]
  fn one_attribute_can_fill_several_fields() {
    let f = fields(r#"<Root portmessage="X"/>"#);
    assert_eq!(f.physical_port.as_deref(), Some("X"));
    assert_eq!(f.message_name.as_deref(), Some("X"));
  }

  #[test]
  fn keywords_are_case_insensitive() {
    let f = fields(r#"<Root DPNAME="n1"/>"#);
    assert_eq!(f.dp_name.as_deref(), Some("n1"));
  }

  #[test]
  fn no_keywords_leaves_fields_empty() {
    assert_eq!(fields(r#"<Root a="1"><b>2</b></Root>"#), DocumentFields::default());
  }

  #[test]
  fn overridden_keywords_replace_the_defaults() {
    let rules = KeywordRules::default()
      .with_keywords(MetadataField::PhysicalPort, vec!["Connector".into()]);
    assert_eq!(rules.keywords(MetadataField::PhysicalPort), ["connector"]);

    let doc = Document::parse(br#"<Root port="p" connector="J1"/>"#).unwrap();
    let f = classify(&doc, &rules);
    assert_eq!(f.physical_port.as_deref(), Some("J1"));
  }
}
