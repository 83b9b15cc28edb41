//! Shorthand normalization.
//!
//! Turns a user-written document into canonical shapes:
//!
//! - a string pane `"make watch"` becomes `{ shell_command: ["make watch"] }`;
//! - a `null` pane becomes an empty record;
//! - a scalar `shell_command` or `shell_command_before` becomes a one-element list;
//! - `~`, `$NAME` and `${NAME}` are resolved in every `start_directory`;
//! - a window without `panes` gets a single empty pane.
//!
//! Expansion is permissive. Anything it does not recognize is passed through
//! untouched and left for [`crate::validate`] to reject. Applying it twice
//! gives the same document as applying it once.

use std::sync::LazyLock;

use regex::{Captures, Regex};
use serde_json::{Map, Value};

use crate::environment::Environment;

static VAR_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$\{(\w+)\}|\$(\w+)").expect("variable pattern is valid"));

/// Expand shorthand forms in a raw document.
pub fn expand(doc: &Value, env: &dyn Environment) -> Value {
    let Value::Object(root) = doc else {
        return doc.clone();
    };
    let mut root = root.clone();

    expand_directory(&mut root, env);
    wrap_scalar(&mut root, "shell_command_before");

    if let Some(Value::Array(windows)) = root.get_mut("windows") {
        for window in windows {
            expand_window(window, env);
        }
    }

    Value::Object(root)
}

/// Resolve `~` and environment references in a path.
///
/// Only a leading `~` followed by `/` (or nothing) means the home directory.
/// Undefined variables expand to the empty string.
pub fn expand_path(path: &str, env: &dyn Environment) -> String {
    let path = match path.strip_prefix('~') {
        Some(rest) if rest.is_empty() || rest.starts_with('/') => {
            format!("{}{rest}", env.home_dir().unwrap_or_default())
        },
        _ => path.to_owned(),
    };

    VAR_PATTERN
        .replace_all(&path, |caps: &Captures<'_>| {
            let name = caps.get(1).or_else(|| caps.get(2)).map_or("", |m| m.as_str());
            env.var(name).unwrap_or_default()
        })
        .into_owned()
}

fn expand_window(window: &mut Value, env: &dyn Environment) {
    let Value::Object(win) = window else {
        return;
    };

    expand_directory(win, env);
    wrap_scalar(win, "shell_command_before");

    match win.get_mut("panes") {
        Some(Value::Array(panes)) => {
            for pane in panes {
                expand_pane(pane, env);
            }
        },
        Some(Value::Null) | None => {
            win.insert("panes".into(), Value::Array(vec![Value::Object(Map::new())]));
        },
        Some(_) => (),
    }
}

fn expand_pane(pane: &mut Value, env: &dyn Environment) {
    match pane {
        Value::String(command) => {
            let command = std::mem::take(command);
            let mut map = Map::new();
            map.insert("shell_command".into(), Value::Array(vec![Value::String(command)]));
            *pane = Value::Object(map);
        },
        Value::Null => *pane = Value::Object(Map::new()),
        Value::Object(map) => {
            wrap_scalar(map, "shell_command");
            expand_directory(map, env);
        },
        _ => (),
    }
}

fn expand_directory(map: &mut Map<String, Value>, env: &dyn Environment) {
    if let Some(Value::String(dir)) = map.get_mut("start_directory") {
        *dir = expand_path(dir, env);
    }
}

fn wrap_scalar(map: &mut Map<String, Value>, key: &str) {
    if let Some(value) = map.get_mut(key) {
        if value.is_string() {
            let scalar = value.take();
            *value = Value::Array(vec![scalar]);
        }
    }
}
