use std::borrow::Cow;

use quick_xml::events::{BytesRef, BytesStart, Event};
use quick_xml::reader::Reader;

use crate::error::LayoutError;

pub const BPMN_MODEL_NS: &str = "http://www.omg.org/spec/BPMN/20100524/MODEL";
pub const BPMN_DI_NS: &str = "http://www.omg.org/spec/BPMN/20100524/DI";
pub const DC_NS: &str = "http://www.omg.org/spec/DD/20100524/DC";
pub const DI_NS: &str = "http://www.omg.org/spec/DD/20100524/DI";

/// A well-formed document held as owned `quick-xml` events, so untouched
/// content can be written back exactly as it was read.
#[derive(Debug, Clone)]
pub struct XmlDocument {
    events: Vec<Event<'static>>,
}

impl XmlDocument {
    pub fn parse(source: &str) -> Result<Self, LayoutError> {
        let mut reader = Reader::from_str(source);
        let mut events = Vec::new();
        let mut depth = 0usize;
        let mut saw_root = false;

        loop {
            let event = reader.read_event()?;
            if depth == 0 {
                match &event {
                    Event::Start(_) | Event::Empty(_) if saw_root => {
                        return Err(LayoutError::Malformed(
                            "more than one document element".to_string(),
                        ));
                    }
                    Event::Text(_) if !is_blank_text(&event) => {
                        return Err(LayoutError::Malformed(
                            "text outside the document element".to_string(),
                        ));
                    }
                    Event::CData(_) | Event::GeneralRef(_) => {
                        return Err(LayoutError::Malformed(
                            "text outside the document element".to_string(),
                        ));
                    }
                    _ => {}
                }
            }
            match &event {
                Event::Eof => break,
                Event::Start(_) => {
                    depth += 1;
                    saw_root = true;
                }
                Event::End(_) => depth = depth.saturating_sub(1),
                Event::Empty(_) => saw_root = true,
                _ => {}
            }
            events.push(event.into_owned());
        }

        if depth > 0 {
            return Err(LayoutError::Malformed(format!(
                "{depth} element(s) left unclosed"
            )));
        }
        if !saw_root {
            return Err(LayoutError::Malformed("no root element".to_string()));
        }

        Ok(Self { events })
    }

    /// Wraps events taken from an already parsed document.
    pub(crate) fn from_events(events: Vec<Event<'static>>) -> Self {
        Self { events }
    }

    pub fn events(&self) -> &[Event<'static>] {
        &self.events
    }

    /// The opening tag of the document element.
    pub fn root(&self) -> Option<&BytesStart<'static>> {
        self.events.iter().find_map(|event| match event {
            Event::Start(e) | Event::Empty(e) => Some(e),
            _ => None,
        })
    }
}

pub fn local_name(e: &BytesStart) -> String {
    String::from_utf8_lossy(e.local_name().as_ref()).into_owned()
}

/// Unescaped value of the attribute named exactly `key`; blank values count
/// as absent.
pub fn attribute(e: &BytesStart, key: &str) -> Option<String> {
    e.attributes()
        .filter_map(|a| a.ok())
        .find(|a| a.key.as_ref() == key.as_bytes())
        .map(|a| {
            let raw = String::from_utf8_lossy(&a.value).into_owned();
            match quick_xml::escape::unescape(&raw) {
                Ok(Cow::Owned(unescaped)) => unescaped,
                _ => raw,
            }
        })
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

pub fn has_attribute(e: &BytesStart, key: &str) -> bool {
    e.attributes()
        .filter_map(|a| a.ok())
        .any(|a| a.key.as_ref() == key.as_bytes())
}

/// Text a general reference stands for: a character reference or one of the
/// predefined entities. Custom entities resolve to `None`.
pub fn resolve_reference(e: &BytesRef) -> Option<String> {
    if let Ok(Some(ch)) = e.resolve_char_ref() {
        return Some(ch.to_string());
    }
    let name = e.decode().ok()?;
    quick_xml::escape::resolve_predefined_entity(&name).map(str::to_string)
}

pub fn is_blank_text(event: &Event) -> bool {
    match event {
        Event::Text(text) => text.iter().all(u8::is_ascii_whitespace),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_unclosed_elements() {
        let err = XmlDocument::parse("<definitions><process>").unwrap_err();
        assert!(matches!(err, LayoutError::Malformed(_)));
    }

    #[test]
    fn rejects_mismatched_end_tags() {
        let err = XmlDocument::parse("<a><b></a>").unwrap_err();
        assert!(matches!(err, LayoutError::Parse(_)));
    }

    #[test]
    fn rejects_plain_text() {
        let err = XmlDocument::parse("this is not xml").unwrap_err();
        assert!(matches!(err, LayoutError::Malformed(_)));
    }

    #[test]
    fn rejects_text_around_the_document_element() {
        let err = XmlDocument::parse("```xml\n<definitions/>\n```").unwrap_err();
        assert!(matches!(err, LayoutError::Malformed(_)));

        let err = XmlDocument::parse("<definitions/>trailing").unwrap_err();
        assert!(matches!(err, LayoutError::Malformed(_)));

        let err = XmlDocument::parse("<definitions/><![CDATA[x]]>").unwrap_err();
        assert!(matches!(err, LayoutError::Malformed(_)));
    }

    #[test]
    fn rejects_a_second_document_element() {
        let err = XmlDocument::parse("<definitions></definitions><extra></extra>").unwrap_err();
        assert!(matches!(err, LayoutError::Malformed(_)));

        let err = XmlDocument::parse("<definitions/>\n<extra/>").unwrap_err();
        assert!(matches!(err, LayoutError::Malformed(_)));
    }

    #[test]
    fn accepts_prolog_and_trailing_misc() {
        let doc = XmlDocument::parse(
            "<?xml version=\"1.0\"?>\n<!-- head -->\n<definitions/>\n<!-- tail -->\n",
        )
        .unwrap();
        assert_eq!(local_name(doc.root().unwrap()), "definitions");
    }

    #[test]
    fn resolves_character_and_predefined_references() {
        let doc = XmlDocument::parse("<r>&#95;&#x41;&amp;&custom;</r>").unwrap();
        let resolved: Vec<Option<String>> = doc
            .events()
            .iter()
            .filter_map(|event| match event {
                Event::GeneralRef(e) => Some(resolve_reference(e)),
                _ => None,
            })
            .collect();
        assert_eq!(
            resolved,
            [
                Some("_".to_string()),
                Some("A".to_string()),
                Some("&".to_string()),
                None
            ]
        );
    }

    #[test]
    fn reads_attributes_by_qualified_key() {
        let doc = XmlDocument::parse(
            r#"<bpmn:task id=" Task_1 " name="A &amp; B" xmlns:bpmn="urn:x" empty=""/>"#,
        )
        .unwrap();
        let root = doc.root().unwrap();
        assert_eq!(local_name(root), "task");
        assert_eq!(attribute(root, "id").as_deref(), Some("Task_1"));
        assert_eq!(attribute(root, "name").as_deref(), Some("A & B"));
        assert_eq!(attribute(root, "empty"), None);
        assert!(has_attribute(root, "xmlns:bpmn"));
        assert!(!has_attribute(root, "xmlns:dc"));
    }

    #[test]
    fn blank_text_detection() {
        let doc = XmlDocument::parse("<a>\n  <b/> x </a>").unwrap();
        let events = doc.events();
        assert!(is_blank_text(&events[1]));
        assert!(!is_blank_text(&events[3]));
    }
}
