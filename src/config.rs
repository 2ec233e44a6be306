use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::bpmn::NodeKind;
use crate::error::ConfigError;

const LANE_HEIGHT: f32 = 200.0;
const LANE_HEADER_WIDTH: f32 = 30.0;
const LEFT_MARGIN: f32 = 80.0;
const COLUMN_GAP: f32 = 50.0;
const POOL_MARGIN: f32 = 50.0;
const STRAIGHT_THRESHOLD: f32 = 5.0;

const TASK_SIZE: ElementSize = ElementSize::new(100.0, 80.0);
const EVENT_SIZE: ElementSize = ElementSize::new(36.0, 36.0);
const GATEWAY_SIZE: ElementSize = ElementSize::new(50.0, 50.0);

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ElementSize {
    pub width: f32,
    pub height: f32,
}

impl ElementSize {
    pub const fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }
}

/// Where nodes go that no declared lane references.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnassignedLanePolicy {
    /// Collect them into a synthetic lane stacked below the declared ones.
    #[default]
    Dedicated,
    /// Put them in the first declared lane.
    FirstLane,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayoutConfig {
    #[serde(default = "default_lane_height")]
    pub lane_height: f32,
    #[serde(default = "default_lane_header_width")]
    pub lane_header_width: f32,
    #[serde(default = "default_left_margin")]
    pub left_margin: f32,
    #[serde(default = "default_column_gap")]
    pub column_gap: f32,
    #[serde(default = "default_pool_margin")]
    pub pool_margin: f32,
    /// Vertical offset below which a cross-lane flow is still drawn straight.
    #[serde(default = "default_straight_threshold")]
    pub straight_threshold: f32,

    #[serde(default = "default_task_size")]
    pub task: ElementSize,
    #[serde(default = "default_event_size")]
    pub event: ElementSize,
    #[serde(default = "default_gateway_size")]
    pub gateway: ElementSize,

    #[serde(default)]
    pub unassigned_lane: UnassignedLanePolicy,
}

fn default_lane_height() -> f32 {
    LANE_HEIGHT
}
fn default_lane_header_width() -> f32 {
    LANE_HEADER_WIDTH
}
fn default_left_margin() -> f32 {
    LEFT_MARGIN
}
fn default_column_gap() -> f32 {
    COLUMN_GAP
}
fn default_pool_margin() -> f32 {
    POOL_MARGIN
}
fn default_straight_threshold() -> f32 {
    STRAIGHT_THRESHOLD
}
fn default_task_size() -> ElementSize {
    TASK_SIZE
}
fn default_event_size() -> ElementSize {
    EVENT_SIZE
}
fn default_gateway_size() -> ElementSize {
    GATEWAY_SIZE
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            lane_height: LANE_HEIGHT,
            lane_header_width: LANE_HEADER_WIDTH,
            left_margin: LEFT_MARGIN,
            column_gap: COLUMN_GAP,
            pool_margin: POOL_MARGIN,
            straight_threshold: STRAIGHT_THRESHOLD,
            task: TASK_SIZE,
            event: EVENT_SIZE,
            gateway: GATEWAY_SIZE,
            unassigned_lane: UnassignedLanePolicy::default(),
        }
    }
}

impl LayoutConfig {
    /// Load a config file, picking the format from the extension and
    /// otherwise trying TOML first, then YAML.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase);
        match ext.as_deref() {
            Some("toml") => Self::from_toml(&content),
            Some("yaml" | "yml") => Self::from_yaml(&content),
            _ => Self::from_toml(&content).or_else(|_| Self::from_yaml(&content)),
        }
    }

    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_yaml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yaml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let positive = [
            ("lane_height", self.lane_height),
            ("task.width", self.task.width),
            ("task.height", self.task.height),
            ("event.width", self.event.width),
            ("event.height", self.event.height),
            ("gateway.width", self.gateway.width),
            ("gateway.height", self.gateway.height),
        ];
        for (name, value) in positive {
            if !value.is_finite() || value <= 0.0 {
                return Err(ConfigError::Invalid(format!(
                    "{name} must be positive, got {value}"
                )));
            }
        }

        let non_negative = [
            ("lane_header_width", self.lane_header_width),
            ("left_margin", self.left_margin),
            ("column_gap", self.column_gap),
            ("pool_margin", self.pool_margin),
            ("straight_threshold", self.straight_threshold),
        ];
        for (name, value) in non_negative {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigError::Invalid(format!(
                    "{name} must not be negative, got {value}"
                )));
            }
        }

        let tallest = self
            .task
            .height
            .max(self.event.height)
            .max(self.gateway.height);
        if tallest > self.lane_height {
            return Err(ConfigError::Invalid(format!(
                "lane_height {} is shorter than the tallest element ({tallest})",
                self.lane_height
            )));
        }
        if self.left_margin < self.lane_header_width {
            return Err(ConfigError::Invalid(format!(
                "left_margin {} overlaps the lane header ({})",
                self.left_margin, self.lane_header_width
            )));
        }

        Ok(())
    }

    pub fn size_of(&self, kind: NodeKind) -> ElementSize {
        match kind {
            NodeKind::StartEvent | NodeKind::EndEvent | NodeKind::Event => self.event,
            NodeKind::Gateway => self.gateway,
            NodeKind::Task => self.task,
        }
    }

    /// Horizontal distance between adjacent columns, sized for a task.
    pub fn column_pitch(&self) -> f32 {
        self.task.width + self.column_gap
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_toml_keeps_defaults() {
        let config = LayoutConfig::from_toml(
            r#"
lane_height = 240.0
unassigned_lane = "first_lane"

[task]
width = 120.0
height = 90.0
"#,
        )
        .expect("valid toml");

        assert_eq!(config.lane_height, 240.0);
        assert_eq!(config.task, ElementSize::new(120.0, 90.0));
        assert_eq!(config.event, EVENT_SIZE);
        assert_eq!(config.unassigned_lane, UnassignedLanePolicy::FirstLane);
        assert_eq!(config.column_pitch(), 170.0);
    }

    #[test]
    fn yaml_config_is_accepted() {
        let config = LayoutConfig::from_yaml("column_gap: 10\nstraight_threshold: 0\n")
            .expect("valid yaml");
        assert_eq!(config.column_gap, 10.0);
        assert_eq!(config.straight_threshold, 0.0);
        assert_eq!(config.lane_height, LANE_HEIGHT);
    }

    #[test]
    fn lane_shorter_than_task_is_rejected() {
        let err = LayoutConfig::from_toml("lane_height = 50.0").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn margin_inside_lane_header_is_rejected() {
        let err = LayoutConfig::from_yaml("left_margin: 10\n").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn sizes_follow_kind() {
        let config = LayoutConfig::default();
        assert_eq!(config.size_of(NodeKind::StartEvent), EVENT_SIZE);
        assert_eq!(config.size_of(NodeKind::Gateway), GATEWAY_SIZE);
        assert_eq!(config.size_of(NodeKind::Task), TASK_SIZE);
        assert!(config.validate().is_ok());
    }
}
