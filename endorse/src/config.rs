use std::fs;
use std::path::Path;

use crate::types::{EndorsementRequest, HostError};

/// Load an [`EndorsementRequest`] from JSON or YAML.
pub fn load_request(path: &Path) -> Result<EndorsementRequest, HostError> {
    let content = fs::read_to_string(path)?;
    parse_request(path, &content)
}

fn parse_request(path: &Path, content: &str) -> Result<EndorsementRequest, HostError> {
    let request: EndorsementRequest = if is_json(path, content) {
        serde_json::from_str(content)?
    } else {
        serde_yaml_bw::from_str(content)?
    };

    if request.binary_name.is_empty() {
        return Err(HostError::InvalidRequest("binary_name is empty".into()));
    }
    Ok(request)
}

/// Extension decides when it names a format; otherwise the first
/// non-blank character does.
fn is_json(path: &Path, content: &str) -> bool {
    match path.extension().and_then(|ext| ext.to_str()) {
        Some("json") => true,
        Some("yaml" | "yml") => false,
        _ => content.trim_start().starts_with(['{', '[']),
    }
}
