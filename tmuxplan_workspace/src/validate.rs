//! Structural validation.
//!
//! Checks presence and shape only, failing on the first problem with the
//! path of the offending node. Whether directories exist or commands run is
//! not checked here; those surface when the workspace is built.

use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::config::{PaneConfig, WindowConfig, WorkspaceConfig};
use crate::error::{WorkspaceError, WorkspaceResult};

/// Check an expanded, trickled document and convert it to a [`WorkspaceConfig`].
pub fn validate(doc: &Value) -> WorkspaceResult<WorkspaceConfig> {
    let Value::Object(root) = doc else {
        return Err(WorkspaceError::shape("root", "document must be a mapping"));
    };

    require_name(root, "session_name", "session_name")?;
    // tmux renames sessions whose names contain these.
    if matches!(root.get("session_name"), Some(Value::String(name)) if name.contains(['.', ':'])) {
        return Err(WorkspaceError::shape("session_name", "must not contain '.' or ':'"));
    }
    let windows = require_list(root, "windows", "windows")?;

    for (index, window) in windows.iter().enumerate() {
        check_window(window, &format!("windows[{index}]"))?;
    }

    let mut session = root.clone();
    session.insert("windows".into(), Value::Array(Vec::new()));
    let mut config: WorkspaceConfig = typed(Value::Object(session), "root")?;

    config.windows = windows
        .iter()
        .enumerate()
        .map(|(index, window)| typed_window(window, &format!("windows[{index}]")))
        .collect::<WorkspaceResult<_>>()?;

    Ok(config)
}

fn check_window(window: &Value, path: &str) -> WorkspaceResult<()> {
    let Value::Object(win) = window else {
        return Err(WorkspaceError::shape(path, "window must be a mapping"));
    };

    require_name(win, "window_name", &format!("{path}.window_name"))?;
    let panes = require_list(win, "panes", &format!("{path}.panes"))?;

    for (index, pane) in panes.iter().enumerate() {
        match pane {
            Value::Object(_) | Value::Null => (),
            _ => {
                let path = format!("{path}.panes[{index}]");
                return Err(WorkspaceError::shape(path, "pane must be a mapping or null"));
            },
        }
    }

    Ok(())
}

fn require_name(map: &Map<String, Value>, key: &str, path: &str) -> WorkspaceResult<()> {
    match map.get(key) {
        Some(Value::String(name)) if !name.is_empty() => Ok(()),
        Some(Value::String(_)) => Err(WorkspaceError::shape(path, "must not be empty")),
        None | Some(Value::Null) => Err(WorkspaceError::shape(path, "is required")),
        Some(_) => Err(WorkspaceError::shape(path, "must be a string")),
    }
}

fn require_list<'a>(
    map: &'a Map<String, Value>,
    key: &str,
    path: &str,
) -> WorkspaceResult<&'a Vec<Value>> {
    match map.get(key) {
        Some(Value::Array(items)) if !items.is_empty() => Ok(items),
        Some(Value::Array(_)) => Err(WorkspaceError::shape(path, "must not be empty")),
        None | Some(Value::Null) => Err(WorkspaceError::shape(path, "is required")),
        Some(_) => Err(WorkspaceError::shape(path, "must be a sequence")),
    }
}

fn typed_window(window: &Value, path: &str) -> WorkspaceResult<WindowConfig> {
    let mut fields = window.as_object().cloned().unwrap_or_default();
    let panes = match fields.insert("panes".into(), Value::Array(Vec::new())) {
        Some(Value::Array(panes)) => panes,
        _ => Vec::new(),
    };

    let mut config: WindowConfig = typed(Value::Object(fields), path)?;
    config.panes = panes
        .into_iter()
        .enumerate()
        .map(|(index, pane)| match pane {
            Value::Null => Ok(PaneConfig::default()),
            pane => typed(pane, &format!("{path}.panes[{index}]")),
        })
        .collect::<WorkspaceResult<_>>()?;

    Ok(config)
}

/// Fields of the wrong type, such as `focus: "yes"`, fail at the enclosing node.
fn typed<T: DeserializeOwned>(value: Value, path: &str) -> WorkspaceResult<T> {
    serde_json::from_value(value).map_err(|err| WorkspaceError::shape(path, err.to_string()))
}
