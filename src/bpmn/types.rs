use indexmap::IndexMap;

/// Sizing class of a flow node, derived from its tag name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    StartEvent,
    EndEvent,
    /// Intermediate and boundary events.
    Event,
    Gateway,
    Task,
}

impl NodeKind {
    /// Substring match on the tag name. Anything unrecognised (tasks,
    /// sub-processes, vendor extensions) is sized as a task.
    pub fn classify(tag: &str) -> Self {
        let lower = tag.to_ascii_lowercase();
        if lower.contains("event") {
            if lower.contains("start") {
                NodeKind::StartEvent
            } else if lower.contains("end") {
                NodeKind::EndEvent
            } else {
                NodeKind::Event
            }
        } else if lower.contains("gateway") {
            NodeKind::Gateway
        } else {
            NodeKind::Task
        }
    }
}

/// A vertex of the process graph
#[derive(Debug, Clone, PartialEq)]
pub struct FlowNode {
    pub id: String,
    /// Local tag name, e.g. `userTask`.
    pub tag: String,
    pub kind: NodeKind,
    /// Index into [`ProcessGraph::lanes`].
    pub lane: usize,
}

/// A directed sequence flow
#[derive(Debug, Clone, PartialEq)]
pub struct SequenceFlow {
    pub id: String,
    pub source: String,
    pub target: String,
}

/// A lane band. Synthetic lanes have no id and are not written back as shapes.
#[derive(Debug, Clone, PartialEq)]
pub struct Lane {
    pub id: Option<String>,
    pub name: Option<String>,
    pub members: Vec<String>,
}

impl Lane {
    pub fn synthetic(members: Vec<String>) -> Self {
        Self {
            id: None,
            name: None,
            members,
        }
    }

    pub fn is_synthetic(&self) -> bool {
        self.id.is_none()
    }
}

/// The participant wrapping the process, when the document declares one.
#[derive(Debug, Clone, PartialEq)]
pub struct Participant {
    pub id: String,
    pub collaboration_id: Option<String>,
}

/// The structural graph of a single process
#[derive(Debug, Clone)]
pub struct ProcessGraph {
    pub process_id: Option<String>,
    /// Flow nodes in declaration order.
    pub nodes: IndexMap<String, FlowNode>,
    /// Sequence flows in declaration order, dangling ones included.
    pub flows: Vec<SequenceFlow>,
    /// Never empty once built.
    pub lanes: Vec<Lane>,
    pub pool: Option<Participant>,
}

impl ProcessGraph {
    /// Flows whose endpoints both name a known node.
    pub fn connected_flows(&self) -> impl Iterator<Item = &SequenceFlow> {
        self.flows.iter().filter(|flow| {
            self.nodes.contains_key(&flow.source) && self.nodes.contains_key(&flow.target)
        })
    }
}
