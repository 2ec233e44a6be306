use std::path::PathBuf;

/// Reasons a document could not be laid out.
///
/// None of these reach callers of [`crate::bpmn::auto_layout`], which falls
/// back to returning its input unchanged.
#[derive(Debug, thiserror::Error)]
pub enum LayoutError {
    #[error("document is not well-formed XML: {0}")]
    Parse(#[from] quick_xml::Error),
    #[error("document is not well-formed XML: {0}")]
    Malformed(String),
    #[error("document has no process element")]
    MissingProcess,
    #[error("process `{0}` has no flow nodes")]
    EmptyProcess(String),
    #[error("failed to write diagram: {0}")]
    Write(#[from] std::io::Error),
    #[error("serialized document is not valid UTF-8")]
    Encoding(#[from] std::string::FromUtf8Error),
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read layout config {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse layout config as TOML: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("failed to parse layout config as YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("invalid layout config: {0}")]
    Invalid(String),
}
