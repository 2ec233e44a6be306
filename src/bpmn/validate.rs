use std::fmt;

use quick_xml::events::Event;
use quick_xml::reader::Reader;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidationIssue {
    Malformed,
    MissingDefinitions,
    MissingProcess,
    MissingStartEvent,
    MissingEndEvent,
    MissingDiagram,
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let message = match self {
            ValidationIssue::Malformed => "document is not well-formed XML",
            ValidationIssue::MissingDefinitions => "missing <definitions> root element",
            ValidationIssue::MissingProcess => "missing <process> element",
            ValidationIssue::MissingStartEvent => "missing start event",
            ValidationIssue::MissingEndEvent => "missing end event",
            ValidationIssue::MissingDiagram => "missing BPMN diagram information (visual layout)",
        };
        f.write_str(message)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationReport {
    pub valid: bool,
    pub issues: Vec<ValidationIssue>,
}

#[derive(Debug, Default)]
struct Seen {
    definitions: bool,
    process: bool,
    start_event: bool,
    end_event: bool,
    diagram: bool,
}

/// Presence checks over the element names of a BPMN document.
pub fn validate_structure(xml: &str) -> ValidationReport {
    let mut reader = Reader::from_str(xml);
    let mut seen = Seen::default();
    let mut is_root = true;
    let mut malformed = false;

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) | Ok(Event::Empty(e)) => {
                let name = e.local_name();
                match name.as_ref() {
                    b"definitions" if is_root => seen.definitions = true,
                    b"process" => seen.process = true,
                    b"startEvent" => seen.start_event = true,
                    b"endEvent" => seen.end_event = true,
                    b"BPMNDiagram" => seen.diagram = true,
                    _ => {}
                }
                is_root = false;
            }
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(err) => {
                tracing::debug!(error = %err, "validation stopped at malformed XML");
                malformed = true;
                break;
            }
        }
    }

    let mut issues = Vec::new();
    if malformed {
        issues.push(ValidationIssue::Malformed);
    }
    let checks = [
        (seen.definitions, ValidationIssue::MissingDefinitions),
        (seen.process, ValidationIssue::MissingProcess),
        (seen.start_event, ValidationIssue::MissingStartEvent),
        (seen.end_event, ValidationIssue::MissingEndEvent),
        (seen.diagram, ValidationIssue::MissingDiagram),
    ];
    issues.extend(
        checks
            .into_iter()
            .filter(|(present, _)| !present)
            .map(|(_, issue)| issue),
    );

    ValidationReport {
        valid: issues.is_empty(),
        issues,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn complete_document_is_valid() {
        let report = validate_structure(
            r#"<?xml version="1.0"?>
<bpmn:definitions xmlns:bpmn="m" xmlns:bpmndi="d">
  <bpmn:process id="P"><bpmn:startEvent id="S"/><bpmn:endEvent id="E"/></bpmn:process>
  <bpmndi:BPMNDiagram id="D"/>
</bpmn:definitions>"#,
        );
        assert!(report.valid);
        assert!(report.issues.is_empty());
    }

    #[test]
    fn reports_missing_elements() {
        let report = validate_structure(r#"<definitions><process id="P"><task id="T"/></process></definitions>"#);
        assert!(!report.valid);
        assert_eq!(
            report.issues,
            [
                ValidationIssue::MissingStartEvent,
                ValidationIssue::MissingEndEvent,
                ValidationIssue::MissingDiagram,
            ]
        );
    }

    #[test]
    fn nested_definitions_is_not_a_root() {
        let report = validate_structure("<wrapper><definitions/></wrapper>");
        assert!(report.issues.contains(&ValidationIssue::MissingDefinitions));
    }

    #[test]
    fn malformed_input_is_reported() {
        let report = validate_structure("<definitions><process></definitions>");
        assert_eq!(report.issues[0], ValidationIssue::Malformed);
    }

    #[test]
    fn report_serializes_as_snake_case() {
        let report = validate_structure("<definitions/>");
        let json = serde_json::to_string(&report).unwrap();
        assert!(json.starts_with(r#"{"valid":false,"issues":["missing_process""#));
    }
}
