use indexmap::IndexMap;

use crate::config::LayoutConfig;

use super::routing::{EdgeRoute, route_flows};
use super::sequence::{assign_columns, bfs_order};
use super::types::{NodeKind, ProcessGraph};

/// Bounding box for layout elements
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct BBox {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl BBox {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }

    pub fn center_y(&self) -> f32 {
        self.y + self.height / 2.0
    }
}

/// Placement of one flow node
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NodeShape {
    pub bounds: BBox,
    pub column: usize,
    pub lane: usize,
}

#[derive(Debug, Clone)]
pub struct DiagramLayout {
    /// Keyed by node id, in declaration order.
    pub nodes: IndexMap<String, NodeShape>,
    /// Lane bands right of the lane header, parallel to [`ProcessGraph::lanes`].
    pub lanes: Vec<BBox>,
    pub pool: BBox,
    pub edges: Vec<EdgeRoute>,
}

/// Layout engine for process graphs
pub struct LayoutEngine<'a> {
    config: &'a LayoutConfig,
}

impl<'a> LayoutEngine<'a> {
    pub fn new(config: &'a LayoutConfig) -> Self {
        Self { config }
    }

    pub fn layout(&self, graph: &ProcessGraph) -> DiagramLayout {
        let order = bfs_order(graph);
        let columns = assign_columns(&order);

        let mut nodes: IndexMap<String, NodeShape> = IndexMap::with_capacity(graph.nodes.len());
        for (id, node) in &graph.nodes {
            let Some(&column) = columns.get(id.as_str()) else {
                continue;
            };
            debug_assert!(node.lane < graph.lanes.len());
            nodes.insert(
                id.clone(),
                NodeShape {
                    bounds: self.node_bounds(node.kind, column, node.lane),
                    column,
                    lane: node.lane,
                },
            );
        }

        let right = nodes
            .values()
            .map(|shape| shape.bounds.right())
            .fold(self.config.lane_header_width, f32::max);
        let pool = BBox::new(
            0.0,
            0.0,
            right + self.config.pool_margin,
            graph.lanes.len() as f32 * self.config.lane_height,
        );
        let lanes = self.lane_bands(graph.lanes.len(), pool.width);

        let edges = route_flows(&graph.flows, &nodes, self.config.straight_threshold);

        tracing::debug!(
            nodes = nodes.len(),
            lanes = lanes.len(),
            edges = edges.len(),
            "computed layout"
        );

        DiagramLayout {
            nodes,
            lanes,
            pool,
            edges,
        }
    }

    fn lane_y(&self, lane: usize) -> f32 {
        lane as f32 * self.config.lane_height
    }

    /// Lanes stack from y = 0 in declaration order, all the same height.
    fn lane_bands(&self, count: usize, pool_width: f32) -> Vec<BBox> {
        let header = self.config.lane_header_width;
        (0..count)
            .map(|lane| {
                BBox::new(
                    header,
                    self.lane_y(lane),
                    pool_width - header,
                    self.config.lane_height,
                )
            })
            .collect()
    }

    /// Left-aligned in its column, vertically centred in its lane.
    fn node_bounds(&self, kind: NodeKind, column: usize, lane: usize) -> BBox {
        let size = self.config.size_of(kind);
        let x = self.config.left_margin + column as f32 * self.config.column_pitch();
        let y = self.lane_y(lane) + (self.config.lane_height - size.height) / 2.0;
        BBox::new(x, y, size.width, size.height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bpmn::parser::build_graph;
    use crate::bpmn::routing::RouteStyle;
    use crate::config::UnassignedLanePolicy;
    use crate::xml::XmlDocument;

    fn layout(xml: &str) -> DiagramLayout {
        let config = LayoutConfig::default();
        let graph = build_graph(&XmlDocument::parse(xml).unwrap(), config.unassigned_lane)
            .unwrap();
        LayoutEngine::new(&config).layout(&graph)
    }

    #[test]
    fn test_linear_single_lane() {
        let result = layout(
            r#"<definitions><process id="P">
  <startEvent id="S"/><task id="T"/><endEvent id="E"/>
  <sequenceFlow id="f1" sourceRef="S" targetRef="T"/>
  <sequenceFlow id="f2" sourceRef="T" targetRef="E"/>
</process></definitions>"#,
        );

        assert_eq!(result.nodes["S"].column, 0);
        assert_eq!(result.nodes["T"].column, 1);
        assert_eq!(result.nodes["E"].column, 2);

        assert_eq!(result.nodes["S"].bounds, BBox::new(80.0, 82.0, 36.0, 36.0));
        assert_eq!(result.nodes["T"].bounds, BBox::new(230.0, 60.0, 100.0, 80.0));
        assert_eq!(result.nodes["E"].bounds, BBox::new(380.0, 82.0, 36.0, 36.0));

        assert_eq!(result.lanes, [BBox::new(30.0, 0.0, 436.0, 200.0)]);
        assert_eq!(result.pool, BBox::new(0.0, 0.0, 466.0, 200.0));

        assert_eq!(result.edges.len(), 2);
        for edge in &result.edges {
            assert_eq!(edge.style, RouteStyle::Straight);
            assert_eq!(edge.waypoints.len(), 2);
        }
    }

    #[test]
    fn test_nodes_are_centred_in_their_lane() {
        let result = layout(
            r#"<definitions><process id="P">
  <laneSet>
    <lane id="L1"><flowNodeRef>A</flowNodeRef></lane>
    <lane id="L2"><flowNodeRef>B</flowNodeRef><flowNodeRef>G</flowNodeRef></lane>
  </laneSet>
  <task id="A"/><task id="B"/><parallelGateway id="G"/>
  <sequenceFlow id="f1" sourceRef="A" targetRef="B"/>
  <sequenceFlow id="f2" sourceRef="B" targetRef="G"/>
</process></definitions>"#,
        );

        assert_eq!(
            result.lanes,
            [
                BBox::new(30.0, 0.0, 450.0, 200.0),
                BBox::new(30.0, 200.0, 450.0, 200.0)
            ]
        );
        assert_eq!(result.nodes["A"].bounds.y, 60.0);
        assert_eq!(result.nodes["B"].bounds.y, 260.0);
        assert_eq!(result.nodes["G"].bounds, BBox::new(380.0, 275.0, 50.0, 50.0));
        assert_eq!(
            result.nodes["B"].bounds.center_y(),
            result.nodes["G"].bounds.center_y()
        );
        assert_eq!(result.pool.height, 400.0);
    }

    #[test]
    fn test_disconnected_nodes_get_their_own_columns() {
        let result = layout(
            r#"<definitions><process id="P"><task id="A"/><task id="B"/><task id="C"/></process></definitions>"#,
        );
        let xs: Vec<f32> = result.nodes.values().map(|n| n.bounds.x).collect();
        assert_eq!(xs, [80.0, 230.0, 380.0]);
        assert!(result.edges.is_empty());
    }

    #[test]
    fn test_dedicated_lane_for_unassigned_nodes() {
        let config = LayoutConfig::default();
        assert_eq!(config.unassigned_lane, UnassignedLanePolicy::Dedicated);
        let result = layout(
            r#"<definitions><process id="P">
  <laneSet><lane id="L1"><flowNodeRef>A</flowNodeRef></lane></laneSet>
  <task id="A"/><task id="Loose"/>
</process></definitions>"#,
        );
        assert_eq!(result.lanes.len(), 2);
        assert_eq!(result.nodes["Loose"].lane, 1);
        assert_eq!(result.nodes["Loose"].bounds.y, 260.0);
    }
}
