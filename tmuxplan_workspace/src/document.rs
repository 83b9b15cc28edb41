//! Reading and writing workspace documents.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde_json::Value;

use crate::config::WorkspaceConfig;
use crate::environment::Environment;
use crate::error::{WorkspaceError, WorkspaceResult};
use crate::expand::expand;
use crate::trickle::trickle;
use crate::validate::validate;

/// Text serialization of a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    Yaml,
    Json,
}

impl DocumentFormat {
    /// `.json` files are JSON; everything else is read as YAML.
    pub fn from_path(path: &Path) -> Self {
        match path.extension() {
            Some(ext) if ext.eq_ignore_ascii_case("json") => Self::Json,
            _ => Self::Yaml,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Yaml => "YAML",
            Self::Json => "JSON",
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            Self::Yaml => "yaml",
            Self::Json => "json",
        }
    }

    /// The format a conversion from `self` produces.
    pub fn other(self) -> Self {
        match self {
            Self::Yaml => Self::Json,
            Self::Json => Self::Yaml,
        }
    }
}

/// Parse text into an untyped document.
pub fn parse_document(text: &str, format: DocumentFormat) -> WorkspaceResult<Value> {
    let parsed: Result<Value, String> = match format {
        DocumentFormat::Json => serde_json::from_str(text).map_err(|err| err.to_string()),
        DocumentFormat::Yaml => serde_yaml::from_str(text).map_err(|err| err.to_string()),
    };
    parsed.map_err(|message| WorkspaceError::Parse { format: format.name(), message })
}

/// Serialize a document; JSON output is pretty-printed.
pub fn render_document<T: Serialize>(
    document: &T,
    format: DocumentFormat,
) -> WorkspaceResult<String> {
    let rendered = match format {
        DocumentFormat::Json => serde_json::to_string_pretty(document)
            .map(|mut json| {
                json.push('\n');
                json
            })
            .map_err(|err| err.to_string()),
        DocumentFormat::Yaml => serde_yaml::to_string(document).map_err(|err| err.to_string()),
    };
    rendered.map_err(|message| WorkspaceError::Parse { format: format.name(), message })
}

/// Parse, expand, trickle, and validate a document.
pub fn parse_workspace(
    text: &str,
    format: DocumentFormat,
    env: &dyn Environment,
) -> WorkspaceResult<WorkspaceConfig> {
    let raw = parse_document(text, format)?;
    validate(&trickle(&expand(&raw, env)))
}

/// Read a workspace file, choosing the format by extension.
pub fn load_workspace(path: &Path, env: &dyn Environment) -> WorkspaceResult<WorkspaceConfig> {
    let text = read(path)?;
    parse_workspace(&text, DocumentFormat::from_path(path), env)
}

/// Re-serialize a document in the other format, without normalizing it.
pub fn convert_document(
    text: &str,
    from: DocumentFormat,
) -> WorkspaceResult<(String, DocumentFormat)> {
    let document = parse_document(text, from)?;
    let to = from.other();
    Ok((render_document(&document, to)?, to))
}

/// Where a converted copy of `input` goes by default.
///
/// `None` when `input` has no recognized document extension.
pub fn converted_path(input: &Path, to: DocumentFormat) -> Option<PathBuf> {
    let ext = input.extension()?.to_str()?.to_ascii_lowercase();
    matches!(ext.as_str(), "yaml" | "yml" | "json").then(|| input.with_extension(to.extension()))
}

/// Read a file, naming it in the error.
pub fn read(path: &Path) -> WorkspaceResult<String> {
    fs::read_to_string(path)
        .map_err(|err| io::Error::new(err.kind(), format!("{}: {err}", path.display())).into())
}
