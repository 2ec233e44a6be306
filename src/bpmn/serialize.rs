use quick_xml::events::{BytesEnd, BytesStart, BytesText, Event};
use quick_xml::writer::Writer;

use crate::error::LayoutError;
use crate::xml::{BPMN_DI_NS, DC_NS, DI_NS, XmlDocument, has_attribute, is_blank_text, local_name};

use super::layout::{BBox, DiagramLayout};
use super::routing::EdgeRoute;
use super::types::ProcessGraph;

const DIAGRAM_ID: &str = "BPMNDiagram_1";
const PLANE_ID: &str = "BPMNPlane_1";
const INDENT: &str = "  ";

/// Prefixes used by the emitted diagram, declared on the diagram element
/// when the document root does not already declare them.
const DIAGRAM_NAMESPACES: [(&str, &str); 3] = [
    ("xmlns:bpmndi", BPMN_DI_NS),
    ("xmlns:dc", DC_NS),
    ("xmlns:di", DI_NS),
];

/// Writes `doc` back with a diagram built from `layout` as the last child of
/// the document element. `doc` must already be free of diagrams.
pub fn write_document(
    doc: &XmlDocument,
    graph: &ProcessGraph,
    layout: &DiagramLayout,
) -> Result<String, LayoutError> {
    let mut events = doc.events().to_vec();

    let undeclared: Vec<(&str, &str)> = DIAGRAM_NAMESPACES
        .iter()
        .copied()
        .filter(|(key, _)| !doc.root().is_some_and(|root| has_attribute(root, key)))
        .collect();
    let diagram = DiagramBuilder::new().build(graph, layout, &undeclared);

    let at = insertion_point(&events);
    events.splice(at..at, diagram);

    let mut writer = Writer::new(Vec::new());
    for event in &events {
        writer.write_event(event.borrow())?;
    }
    Ok(String::from_utf8(writer.into_inner())?)
}

fn is_diagram(e: &BytesStart) -> bool {
    local_name(e) == "BPMNDiagram"
}

/// Drops every diagram subtree together with the blank text in front of it,
/// which is exactly what [`write_document`] adds.
pub fn strip_diagrams(doc: &XmlDocument) -> XmlDocument {
    let mut kept: Vec<Event<'static>> = Vec::with_capacity(doc.events().len());
    let mut skip_depth = 0usize;

    for event in doc.events() {
        if skip_depth > 0 {
            match event {
                Event::Start(_) => skip_depth += 1,
                Event::End(_) => skip_depth -= 1,
                _ => {}
            }
            continue;
        }

        match event {
            Event::Start(e) | Event::Empty(e) if is_diagram(e) => {
                if kept.last().is_some_and(is_blank_text) {
                    kept.pop();
                }
                if matches!(event, Event::Start(_)) {
                    skip_depth = 1;
                }
            }
            _ => kept.push(event.clone()),
        }
    }

    XmlDocument::from_events(kept)
}

/// Just before the document element closes, ahead of its trailing whitespace.
fn insertion_point(events: &[Event<'static>]) -> usize {
    let Some(root_end) = events.iter().rposition(|e| matches!(e, Event::End(_))) else {
        return events.len();
    };
    if root_end > 0 && is_blank_text(&events[root_end - 1]) {
        root_end - 1
    } else {
        root_end
    }
}

fn num(value: f32) -> String {
    format!("{value}")
}

struct DiagramBuilder {
    events: Vec<Event<'static>>,
}

impl DiagramBuilder {
    fn new() -> Self {
        Self { events: Vec::new() }
    }

    fn indent(&mut self, level: usize) {
        let text = format!("\n{}", INDENT.repeat(level));
        self.events.push(Event::Text(BytesText::new(&text).into_owned()));
    }

    fn open(&mut self, level: usize, start: BytesStart<'static>) {
        self.indent(level);
        self.events.push(Event::Start(start));
    }

    fn close(&mut self, level: usize, name: &'static str) {
        self.indent(level);
        self.events.push(Event::End(BytesEnd::new(name)));
    }

    fn empty(&mut self, level: usize, start: BytesStart<'static>) {
        self.indent(level);
        self.events.push(Event::Empty(start));
    }

    fn build(
        mut self,
        graph: &ProcessGraph,
        layout: &DiagramLayout,
        undeclared: &[(&str, &str)],
    ) -> Vec<Event<'static>> {
        let mut diagram = BytesStart::new("bpmndi:BPMNDiagram");
        diagram.push_attribute(("id", DIAGRAM_ID));
        for &(key, uri) in undeclared {
            diagram.push_attribute((key, uri));
        }
        self.open(1, diagram);

        let mut plane = BytesStart::new("bpmndi:BPMNPlane");
        plane.push_attribute(("id", PLANE_ID));
        let plane_element = graph
            .pool
            .as_ref()
            .and_then(|pool| pool.collaboration_id.as_deref())
            .or(graph.process_id.as_deref());
        if let Some(element) = plane_element {
            plane.push_attribute(("bpmnElement", element));
        }
        self.open(2, plane);

        if let Some(pool) = &graph.pool {
            self.shape(&pool.id, layout.pool, true);
        }
        for (lane, band) in graph.lanes.iter().zip(&layout.lanes) {
            if let Some(id) = &lane.id {
                self.shape(id, *band, true);
            }
        }
        for (id, shape) in &layout.nodes {
            self.shape(id, shape.bounds, false);
        }
        for route in &layout.edges {
            self.edge(route);
        }

        self.close(2, "bpmndi:BPMNPlane");
        self.close(1, "bpmndi:BPMNDiagram");
        self.events
    }

    fn shape(&mut self, element: &str, bounds: BBox, horizontal: bool) {
        let mut start = BytesStart::new("bpmndi:BPMNShape");
        start.push_attribute(("id", format!("{element}_di").as_str()));
        start.push_attribute(("bpmnElement", element));
        if horizontal {
            start.push_attribute(("isHorizontal", "true"));
        }
        self.open(3, start);

        let mut rect = BytesStart::new("dc:Bounds");
        rect.push_attribute(("x", num(bounds.x).as_str()));
        rect.push_attribute(("y", num(bounds.y).as_str()));
        rect.push_attribute(("width", num(bounds.width).as_str()));
        rect.push_attribute(("height", num(bounds.height).as_str()));
        self.empty(4, rect);

        self.close(3, "bpmndi:BPMNShape");
    }

    fn edge(&mut self, route: &EdgeRoute) {
        let mut start = BytesStart::new("bpmndi:BPMNEdge");
        start.push_attribute(("id", format!("{}_di", route.id).as_str()));
        start.push_attribute(("bpmnElement", route.id.as_str()));
        self.open(3, start);

        for point in &route.waypoints {
            let mut waypoint = BytesStart::new("di:waypoint");
            waypoint.push_attribute(("x", num(point.x).as_str()));
            waypoint.push_attribute(("y", num(point.y).as_str()));
            self.empty(4, waypoint);
        }

        self.close(3, "bpmndi:BPMNEdge");
    }
}
