//! Deterministic auto-layout for BPMN 2.0 process diagrams.
//!
//! [`bpmn::auto_layout`] reads a process document, places every flow node on
//! a lane/column grid, routes the sequence flows and writes the result back as
//! a `bpmndi:BPMNDiagram` block.

pub mod bpmn;
pub mod config;
pub mod error;
pub mod xml;

pub use bpmn::{
    auto_layout, auto_layout_with, prepare_document, try_auto_layout, validate_structure,
};
pub use config::{LayoutConfig, UnassignedLanePolicy};
pub use error::{ConfigError, LayoutError};
