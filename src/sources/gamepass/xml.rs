use quick_xml::{Reader, events::Event};

use crate::common::{SourceError, SourceResult};

/// Minimal owned element tree for the small documents the service returns.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Element {
  pub name: String,
  pub attributes: Vec<(String, String)>,
  pub text: String,
  pub children: Vec<Element>,
}

impl Element {
  /// First direct child named `name`.
  pub fn child(&self, name: &str) -> Option<&Element> {
    self.children.iter().find(|c| c.name == name)
  }

  /// All direct children named `name`, in document order.
  pub fn children<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Element> + 'a {
    self.children.iter().filter(move |c| c.name == name)
  }

  pub fn attr(&self, name: &str) -> Option<&str> {
    self
      .attributes
      .iter()
      .find(|(k, _)| k == name)
      .map(|(_, v)| v.as_str())
  }

  /// Trimmed text of the first direct child named `name`, if non-empty.
  pub fn child_text(&self, name: &str) -> Option<&str> {
    self
      .child(name)
      .map(|c| c.text.trim())
      .filter(|t| !t.is_empty())
  }
}

/// Parses `body` and returns its root element.
pub fn parse_document(body: &str, context: &str) -> SourceResult<Element> {
  let mut reader = Reader::from_str(body);
  reader.config_mut().trim_text(true);

  let malformed = |detail: String| SourceError::parse(format!("{}: malformed XML ({})", context, detail));

  let mut stack: Vec<Element> = Vec::new();
  let mut root: Option<Element> = None;

  loop {
    match reader.read_event() {
      Ok(Event::Start(start)) => {
        stack.push(open_element(&start).map_err(malformed)?);
      }
      Ok(Event::Empty(start)) => {
        let element = open_element(&start).map_err(malformed)?;
        attach(&mut stack, &mut root, element);
      }
      Ok(Event::End(_)) => {
        let element = stack
          .pop()
          .ok_or_else(|| malformed("unbalanced closing tag".into()))?;
        attach(&mut stack, &mut root, element);
      }
      Ok(Event::Text(text)) => {
        let text = text.unescape().map_err(|e| malformed(e.to_string()))?;
        if let Some(current) = stack.last_mut() {
          current.text.push_str(&text);
        }
      }
      Ok(Event::CData(data)) => {
        if let Some(current) = stack.last_mut() {
          current.text.push_str(&String::from_utf8_lossy(&data.into_inner()));
        }
      }
      Ok(Event::Eof) => break,
      Ok(_) => {}
      Err(e) => {
        return Err(malformed(format!(
          "at position {}: {}",
          reader.buffer_position(),
          e
        )));
      }
    }
  }

  if !stack.is_empty() {
    return Err(malformed("unclosed element".into()));
  }
  root.ok_or_else(|| malformed("empty document".into()))
}

fn open_element(start: &quick_xml::events::BytesStart<'_>) -> Result<Element, String> {
  let mut element = Element {
    name: String::from_utf8_lossy(start.name().as_ref()).into_owned(),
    ..Element::default()
  };

  for attribute in start.attributes() {
    let attribute = attribute.map_err(|e| e.to_string())?;
    let key = String::from_utf8_lossy(attribute.key.as_ref()).into_owned();
    let value = attribute.unescape_value().map_err(|e| e.to_string())?;
    element.attributes.push((key, value.into_owned()));
  }

  Ok(element)
}

fn attach(stack: &mut [Element], root: &mut Option<Element>, element: Element) {
  match stack.last_mut() {
    Some(parent) => parent.children.push(element),
    None => {
      if root.is_none() {
        *root = Some(element);
      }
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn builds_nested_tree() {
    let root = parse_document(
      r#"<?xml version="1.0" encoding="UTF-8"?>
      <result>
        <path><![CDATA[adaptive://host:443/a?b=1]]></path>
        <streamDatas>
          <streamData url="/x_400"><httpservers><httpserver name="h1" port="80"/></httpservers></streamData>
          <streamData url="/x_800"/>
        </streamDatas>
      </result>"#,
      "test",
    )
    .unwrap();

    assert_eq!(root.name, "result");
    assert_eq!(root.child_text("path"), Some("adaptive://host:443/a?b=1"));

    let urls: Vec<_> = root
      .child("streamDatas")
      .unwrap()
      .children("streamData")
      .filter_map(|s| s.attr("url"))
      .collect();
    assert_eq!(urls, vec!["/x_400", "/x_800"]);
  }

  #[test]
  fn unescapes_entities() {
    let root = parse_document("<r><path>http://h/a?x=1&amp;y=2</path></r>", "test").unwrap();
    assert_eq!(root.child_text("path"), Some("http://h/a?x=1&y=2"));
  }

  #[test]
  fn malformed_documents_are_parse_errors() {
    for body in ["", "<r><path>x</r>", "<r>", "not xml at all"] {
      match parse_document(body, "games list") {
        Err(SourceError::Parse(msg)) => assert!(msg.starts_with("games list")),
        other => panic!("{body:?} should be rejected, got {other:?}"),
      }
    }
  }
}
