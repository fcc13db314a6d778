//! Record file I/O with diagnostics

pub mod diagnostics;

pub use diagnostics::{YamlError, YamlSyntaxError};

use serde::{de::DeserializeOwned, Serialize};
use std::path::Path;

/// Parse a record from YAML text
pub fn parse_record<T: DeserializeOwned + 'static>(source: &str, filename: &str) -> Result<T, YamlError> {
    serde_yml::from_str(source)
        .map_err(|e| YamlError::Syntax(YamlSyntaxError::from_serde_error(&e, source, filename)))
}

/// Read and parse a record file
pub fn read_record<T: DeserializeOwned + 'static>(path: &Path) -> Result<T, YamlError> {
    let source = std::fs::read_to_string(path)?;
    let filename = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());
    tracing::debug!(path = %path.display(), "reading record");
    parse_record(&source, &filename)
}

/// Serialize a record and write it to disk
pub fn write_record<T: Serialize>(path: &Path, record: &T) -> Result<(), YamlError> {
    let yaml = serde_yml::to_string(record).map_err(|e| YamlError::Serialize(e.to_string()))?;
    std::fs::write(path, yaml)?;
    tracing::debug!(path = %path.display(), "wrote record");
    Ok(())
}
