use std::collections::HashSet;

use indexmap::IndexMap;
use quick_xml::events::{BytesStart, Event};

use crate::config::UnassignedLanePolicy;
use crate::error::LayoutError;
use crate::xml::{XmlDocument, attribute, local_name, resolve_reference};

use super::types::*;

/// Direct process children that never become flow nodes.
const NON_FLOW_ELEMENTS: &[&str] = &[
    "sequenceFlow",
    "messageFlow",
    "laneSet",
    "textAnnotation",
    "association",
    "group",
    "documentation",
    "extensionElements",
    "ioSpecification",
    "property",
    "dataObject",
    "dataObjectReference",
    "dataStoreReference",
    "category",
    "BPMNDiagram",
];

#[derive(Debug)]
struct DeclaredLane {
    id: Option<String>,
    name: Option<String>,
    refs: Vec<String>,
}

#[derive(Debug)]
struct DeclaredParticipant {
    id: String,
    process_ref: Option<String>,
    collaboration_id: Option<String>,
}

/// Where the builder currently sits relative to the process element.
#[derive(Debug, Clone, Copy, PartialEq)]
enum Scope {
    Outside,
    Process,
    LaneSet,
    Lane,
    FlowNodeRef,
    Done,
}

#[derive(Debug)]
struct GraphBuilder {
    depth: usize,
    scope: Scope,
    /// Depth of the element that opened the current scope.
    scope_depths: Vec<usize>,
    collaboration: Option<(usize, Option<String>)>,
    process_id: Option<String>,
    nodes: Vec<(String, String)>,
    flows: Vec<SequenceFlow>,
    lanes: Vec<DeclaredLane>,
    participants: Vec<DeclaredParticipant>,
    ref_text: String,
}

impl GraphBuilder {
    fn new() -> Self {
        Self {
            depth: 0,
            scope: Scope::Outside,
            scope_depths: Vec::new(),
            collaboration: None,
            process_id: None,
            nodes: Vec::new(),
            flows: Vec::new(),
            lanes: Vec::new(),
            participants: Vec::new(),
            ref_text: String::new(),
        }
    }

    fn enter(&mut self, scope: Scope) {
        self.scope = scope;
        self.scope_depths.push(self.depth);
    }

    /// Handles an opening tag. `self.depth` is the depth of this element.
    fn open(&mut self, e: &BytesStart, self_closing: bool) {
        let name = local_name(e);

        match name.as_str() {
            "collaboration" if self.collaboration.is_none() && !self_closing => {
                self.collaboration = Some((self.depth, attribute(e, "id")));
            }
            "participant" => {
                if let Some(id) = attribute(e, "id") {
                    self.participants.push(DeclaredParticipant {
                        id,
                        process_ref: attribute(e, "processRef"),
                        collaboration_id: self
                            .collaboration
                            .as_ref()
                            .and_then(|(_, id)| id.clone()),
                    });
                }
            }
            _ => {}
        }

        match self.scope {
            Scope::Outside if name == "process" => {
                self.process_id = attribute(e, "id");
                if self_closing {
                    self.scope = Scope::Done;
                } else {
                    self.enter(Scope::Process);
                }
            }
            Scope::Process if self.is_direct_child() => {
                self.open_process_child(e, &name, self_closing);
            }
            Scope::LaneSet if self.is_direct_child() && name == "lane" => {
                self.lanes.push(DeclaredLane {
                    id: attribute(e, "id"),
                    name: attribute(e, "name"),
                    refs: Vec::new(),
                });
                if !self_closing {
                    self.enter(Scope::Lane);
                }
            }
            Scope::Lane if self.is_direct_child() && name == "flowNodeRef" && !self_closing => {
                self.ref_text.clear();
                self.enter(Scope::FlowNodeRef);
            }
            _ => {}
        }
    }

    fn open_process_child(&mut self, e: &BytesStart, name: &str, self_closing: bool) {
        match name {
            "sequenceFlow" => {
                let id = attribute(e, "id");
                let source = attribute(e, "sourceRef");
                let target = attribute(e, "targetRef");
                match (id, source, target) {
                    (Some(id), Some(source), Some(target)) => {
                        self.flows.push(SequenceFlow { id, source, target });
                    }
                    _ => tracing::debug!("skipping sequence flow without id, source or target"),
                }
            }
            // Only the first lane set of the process defines lanes.
            "laneSet" if self.lanes.is_empty() && !self_closing => self.enter(Scope::LaneSet),
            _ if NON_FLOW_ELEMENTS.contains(&name) => {}
            _ => {
                if let Some(id) = attribute(e, "id") {
                    self.nodes.push((id, name.to_string()));
                }
            }
        }
    }

    fn is_direct_child(&self) -> bool {
        self.scope_depths
            .last()
            .is_some_and(|&parent| parent + 1 == self.depth)
    }

    fn text(&mut self, text: &str) {
        if self.scope == Scope::FlowNodeRef {
            self.ref_text.push_str(text);
        }
    }

    /// Handles a closing tag. `self.depth` is the depth of the closed element.
    fn close(&mut self) {
        if self
            .collaboration
            .as_ref()
            .is_some_and(|(depth, _)| *depth == self.depth)
        {
            self.collaboration = None;
        }

        if self.scope_depths.last() != Some(&self.depth) {
            return;
        }
        self.scope_depths.pop();

        self.scope = match self.scope {
            Scope::FlowNodeRef => {
                let reference = self.ref_text.trim();
                if !reference.is_empty() {
                    if let Some(lane) = self.lanes.last_mut() {
                        lane.refs.push(reference.to_string());
                    }
                }
                Scope::Lane
            }
            Scope::Lane => Scope::LaneSet,
            Scope::LaneSet => Scope::Process,
            Scope::Process => Scope::Done,
            other => other,
        };
    }

    fn finish(self, policy: UnassignedLanePolicy) -> Result<ProcessGraph, LayoutError> {
        if self.scope == Scope::Outside {
            return Err(LayoutError::MissingProcess);
        }

        let mut nodes: IndexMap<String, FlowNode> = IndexMap::new();
        for (id, tag) in self.nodes {
            if nodes.contains_key(&id) {
                tracing::debug!(%id, "duplicate flow node id; keeping the first declaration");
                continue;
            }
            nodes.insert(
                id.clone(),
                FlowNode {
                    id,
                    kind: NodeKind::classify(&tag),
                    tag,
                    lane: 0,
                },
            );
        }

        if nodes.is_empty() {
            return Err(LayoutError::EmptyProcess(
                self.process_id.unwrap_or_default(),
            ));
        }

        let lanes = assign_lanes(&mut nodes, self.lanes, policy);

        let pool = self
            .participants
            .iter()
            .find(|p| p.process_ref.is_some() && p.process_ref == self.process_id)
            .or_else(|| self.participants.first())
            .map(|p| Participant {
                id: p.id.clone(),
                collaboration_id: p.collaboration_id.clone(),
            });

        Ok(ProcessGraph {
            process_id: self.process_id,
            nodes,
            flows: self.flows,
            lanes,
            pool,
        })
    }
}

/// Resolves lane membership so that every node ends up in exactly one lane.
fn assign_lanes(
    nodes: &mut IndexMap<String, FlowNode>,
    declared: Vec<DeclaredLane>,
    policy: UnassignedLanePolicy,
) -> Vec<Lane> {
    if declared.is_empty() {
        return vec![Lane::synthetic(nodes.keys().cloned().collect())];
    }

    let mut claimed: HashSet<String> = HashSet::new();
    let mut lanes: Vec<Lane> = Vec::with_capacity(declared.len() + 1);

    for (index, lane) in declared.into_iter().enumerate() {
        let mut members = Vec::new();
        for reference in lane.refs {
            let Some(node) = nodes.get_mut(&reference) else {
                tracing::debug!(%reference, "lane references an unknown flow node");
                continue;
            };
            if claimed.insert(reference.clone()) {
                node.lane = index;
                members.push(reference);
            }
        }
        lanes.push(Lane {
            id: lane.id,
            name: lane.name,
            members,
        });
    }

    let unassigned: Vec<String> = nodes
        .keys()
        .filter(|id| !claimed.contains(*id))
        .cloned()
        .collect();
    if unassigned.is_empty() {
        return lanes;
    }

    tracing::debug!(
        count = unassigned.len(),
        ?policy,
        "flow nodes without a lane"
    );
    let target = match policy {
        UnassignedLanePolicy::FirstLane => 0,
        UnassignedLanePolicy::Dedicated => {
            lanes.push(Lane::synthetic(Vec::new()));
            lanes.len() - 1
        }
    };
    for id in unassigned {
        if let Some(node) = nodes.get_mut(&id) {
            node.lane = target;
        }
        lanes[target].members.push(id);
    }

    lanes
}

/// Builds the process graph of the first `process` element in `doc`.
pub fn build_graph(
    doc: &XmlDocument,
    policy: UnassignedLanePolicy,
) -> Result<ProcessGraph, LayoutError> {
    let mut builder = GraphBuilder::new();

    for event in doc.events() {
        match event {
            Event::Start(e) => {
                builder.depth += 1;
                builder.open(e, false);
            }
            Event::Empty(e) => {
                builder.depth += 1;
                builder.open(e, true);
                builder.depth -= 1;
            }
            Event::End(_) => {
                builder.close();
                builder.depth -= 1;
            }
            Event::Text(e) => {
                if builder.scope == Scope::FlowNodeRef {
                    let text = e.decode().unwrap_or_default();
                    builder.text(&text);
                }
            }
            Event::CData(e) => {
                if builder.scope == Scope::FlowNodeRef {
                    builder.text(&String::from_utf8_lossy(e));
                }
            }
            Event::GeneralRef(e) => {
                if builder.scope == Scope::FlowNodeRef {
                    match resolve_reference(e) {
                        Some(text) => builder.text(&text),
                        None => tracing::debug!(
                            reference = %String::from_utf8_lossy(e),
                            "unresolved entity in flow node reference"
                        ),
                    }
                }
            }
            _ => {}
        }
    }

    builder.finish(policy)
}
