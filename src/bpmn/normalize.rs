use quick_xml::events::Event;
use quick_xml::writer::Writer;

use crate::xml::{
    BPMN_DI_NS, BPMN_MODEL_NS, DC_NS, DI_NS, XmlDocument, has_attribute, local_name,
};

const XML_DECLARATION: &str = r#"<?xml version="1.0" encoding="UTF-8"?>"#;

const REQUIRED_NAMESPACES: [(&str, &str); 4] = [
    ("xmlns:bpmn", BPMN_MODEL_NS),
    ("xmlns:bpmndi", BPMN_DI_NS),
    ("xmlns:dc", DC_NS),
    ("xmlns:di", DI_NS),
];

/// Makes a generated document importable by modelers: ensures an XML
/// declaration and the BPMN namespace declarations on a `definitions` root.
///
/// Applying it twice gives the same result as applying it once. Documents
/// that do not parse only get the declaration.
pub fn prepare_document(xml: &str) -> String {
    let trimmed = xml.trim_start();
    let body = if trimmed.starts_with("<?xml") {
        trimmed.to_string()
    } else {
        format!("{XML_DECLARATION}\n{xml}")
    };

    match declare_namespaces(&body) {
        Some(with_namespaces) => with_namespaces,
        None => body,
    }
}

/// `None` when nothing needs to change or the document cannot be parsed.
fn declare_namespaces(xml: &str) -> Option<String> {
    let doc = XmlDocument::parse(xml).ok()?;
    let root = doc.root()?;
    if local_name(root) != "definitions" {
        return None;
    }

    let missing: Vec<(&str, &str)> = REQUIRED_NAMESPACES
        .iter()
        .copied()
        .filter(|(key, _)| !has_attribute(root, key))
        .collect();
    if missing.is_empty() {
        return None;
    }

    let mut writer = Writer::new(Vec::new());
    let mut patched = false;
    for event in doc.events() {
        let result = match event {
            Event::Start(e) | Event::Empty(e) if !patched => {
                patched = true;
                let mut start = e.clone();
                for &attr in &missing {
                    start.push_attribute(attr);
                }
                if matches!(event, Event::Start(_)) {
                    writer.write_event(Event::Start(start))
                } else {
                    writer.write_event(Event::Empty(start))
                }
            }
            other => writer.write_event(other.borrow()),
        };
        if let Err(err) = result {
            tracing::warn!(error = %err, "failed to rewrite namespace declarations");
            return None;
        }
    }

    String::from_utf8(writer.into_inner()).ok()
}
