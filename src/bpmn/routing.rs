use indexmap::IndexMap;

use super::layout::NodeShape;
use super::types::SequenceFlow;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteStyle {
    /// Exit and entry point only.
    Straight,
    /// Two right-angle turns at the horizontal midpoint.
    Orthogonal,
}

/// Polyline of one sequence flow
#[derive(Debug, Clone, PartialEq)]
pub struct EdgeRoute {
    pub id: String,
    pub style: RouteStyle,
    pub waypoints: Vec<Point>,
}

/// Waypoints from the right-middle of `source` to the left-middle of `target`.
pub fn route_edge(
    source: &NodeShape,
    target: &NodeShape,
    straight_threshold: f32,
) -> (RouteStyle, Vec<Point>) {
    let exit = Point::new(source.bounds.right(), source.bounds.center_y());
    let entry = Point::new(target.bounds.x, target.bounds.center_y());

    if source.lane == target.lane || (exit.y - entry.y).abs() < straight_threshold {
        return (RouteStyle::Straight, vec![exit, entry]);
    }

    let mid_x = (exit.x + entry.x) / 2.0;
    (
        RouteStyle::Orthogonal,
        vec![
            exit,
            Point::new(mid_x, exit.y),
            Point::new(mid_x, entry.y),
            entry,
        ],
    )
}

/// Routes every flow whose endpoints were placed, in declaration order.
pub fn route_flows(
    flows: &[SequenceFlow],
    shapes: &IndexMap<String, NodeShape>,
    straight_threshold: f32,
) -> Vec<EdgeRoute> {
    flows
        .iter()
        .filter_map(|flow| {
            let (Some(source), Some(target)) = (shapes.get(&flow.source), shapes.get(&flow.target))
            else {
                tracing::debug!(
                    id = %flow.id,
                    source = %flow.source,
                    target = %flow.target,
                    "dropping sequence flow with an unplaced endpoint"
                );
                return None;
            };
            let (style, waypoints) = route_edge(source, target, straight_threshold);
            Some(EdgeRoute {
                id: flow.id.clone(),
                style,
                waypoints,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bpmn::layout::BBox;

    fn shape(x: f32, y: f32, lane: usize) -> NodeShape {
        NodeShape {
            bounds: BBox::new(x, y, 100.0, 80.0),
            column: 0,
            lane,
        }
    }

    fn flow(id: &str, source: &str, target: &str) -> SequenceFlow {
        SequenceFlow {
            id: id.to_string(),
            source: source.to_string(),
            target: target.to_string(),
        }
    }

    #[test]
    fn test_same_lane_is_straight() {
        let (style, points) = route_edge(&shape(80.0, 60.0, 0), &shape(230.0, 60.0, 0), 5.0);
        assert_eq!(style, RouteStyle::Straight);
        assert_eq!(points, [Point::new(180.0, 100.0), Point::new(230.0, 100.0)]);
    }

    #[test]
    fn test_same_lane_with_offset_is_still_straight() {
        let (style, points) = route_edge(&shape(80.0, 60.0, 0), &shape(230.0, 82.0, 0), 5.0);
        assert_eq!(style, RouteStyle::Straight);
        assert_eq!(points.len(), 2);
    }

    #[test]
    fn test_cross_lane_is_orthogonal() {
        let (style, points) = route_edge(&shape(80.0, 60.0, 0), &shape(230.0, 260.0, 1), 5.0);
        assert_eq!(style, RouteStyle::Orthogonal);
        assert_eq!(
            points,
            [
                Point::new(180.0, 100.0),
                Point::new(205.0, 100.0),
                Point::new(205.0, 300.0),
                Point::new(230.0, 300.0),
            ]
        );
    }

    #[test]
    fn test_cross_lane_within_threshold_is_straight() {
        let (style, _) = route_edge(&shape(80.0, 60.0, 0), &shape(230.0, 63.0, 1), 5.0);
        assert_eq!(style, RouteStyle::Straight);
        let (style, _) = route_edge(&shape(80.0, 60.0, 0), &shape(230.0, 65.0, 1), 5.0);
        assert_eq!(style, RouteStyle::Orthogonal);
    }

    #[test]
    fn test_unplaced_endpoints_are_dropped() {
        let mut shapes = IndexMap::new();
        shapes.insert("A".to_string(), shape(80.0, 60.0, 0));
        shapes.insert("B".to_string(), shape(230.0, 60.0, 0));
        let routes = route_flows(
            &[
                flow("f1", "A", "Ghost"),
                flow("f2", "A", "B"),
                flow("f3", "Ghost", "B"),
            ],
            &shapes,
            5.0,
        );
        assert_eq!(routes.len(), 1);
        assert_eq!(routes[0].id, "f2");
    }
}
