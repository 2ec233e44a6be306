mod layout;
mod normalize;
mod parser;
mod routing;
mod sequence;
mod serialize;
mod types;
mod validate;

pub use layout::{BBox, DiagramLayout, LayoutEngine, NodeShape};
pub use normalize::prepare_document;
pub use parser::build_graph;
pub use routing::{EdgeRoute, Point, RouteStyle};
pub use sequence::{assign_columns, bfs_order};
pub use types::{FlowNode, Lane, NodeKind, Participant, ProcessGraph, SequenceFlow};
pub use validate::{ValidationIssue, ValidationReport, validate_structure};

use crate::config::LayoutConfig;
use crate::error::LayoutError;
use crate::xml::XmlDocument;

/// Lays out `xml` with the default configuration.
///
/// Never fails: a document that cannot be laid out comes back unchanged.
pub fn auto_layout(xml: &str) -> String {
    auto_layout_with(xml, &LayoutConfig::default())
}

pub fn auto_layout_with(xml: &str, config: &LayoutConfig) -> String {
    match try_auto_layout(xml, config) {
        Ok(laid_out) => laid_out,
        Err(err) => {
            tracing::warn!(error = %err, "layout skipped; returning document unchanged");
            xml.to_string()
        }
    }
}

/// Replaces any diagram in `xml` with a freshly computed one.
pub fn try_auto_layout(xml: &str, config: &LayoutConfig) -> Result<String, LayoutError> {
    let doc = serialize::strip_diagrams(&XmlDocument::parse(xml)?);
    let graph = build_graph(&doc, config.unassigned_lane)?;
    let layout = LayoutEngine::new(config).layout(&graph);
    serialize::write_document(&doc, &graph, &layout)
}
