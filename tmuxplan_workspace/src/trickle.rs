//! Top-down inheritance of defaults.
//!
//! | field                  | flows                   |
//! |------------------------|-------------------------|
//! | `start_directory`      | session → window → pane |
//! | `shell_command_before` | session → window        |
//! | `suppress_history`     | session → window → pane |
//!
//! A descendant keeps its own value when it has one (`null` counts as none).
//! Inherited values are copied, so a trickled document shares nothing with
//! its ancestors.

use serde_json::{Map, Value};

const START_DIRECTORY: &str = "start_directory";
const SHELL_COMMAND_BEFORE: &str = "shell_command_before";
const SUPPRESS_HISTORY: &str = "suppress_history";

/// Propagate inheritable fields through an expanded document.
pub fn trickle(doc: &Value) -> Value {
    let Value::Object(root) = doc else {
        return doc.clone();
    };
    let mut root = root.clone();

    let session_dir = own_value(&root, START_DIRECTORY);
    let session_before = own_value(&root, SHELL_COMMAND_BEFORE);
    let session_suppress = own_value(&root, SUPPRESS_HISTORY);

    if let Some(Value::Array(windows)) = root.get_mut("windows") {
        for window in windows {
            let Value::Object(win) = window else {
                continue;
            };

            inherit(win, START_DIRECTORY, session_dir.as_ref());
            inherit(win, SHELL_COMMAND_BEFORE, session_before.as_ref());
            inherit(win, SUPPRESS_HISTORY, session_suppress.as_ref());

            let window_dir = own_value(win, START_DIRECTORY);
            let window_suppress = own_value(win, SUPPRESS_HISTORY);

            if let Some(Value::Array(panes)) = win.get_mut("panes") {
                for pane in panes {
                    let Value::Object(pane) = pane else {
                        continue;
                    };
                    inherit(pane, START_DIRECTORY, window_dir.as_ref());
                    inherit(pane, SUPPRESS_HISTORY, window_suppress.as_ref());
                }
            }
        }
    }

    Value::Object(root)
}

fn own_value(map: &Map<String, Value>, key: &str) -> Option<Value> {
    map.get(key).filter(|value| !value.is_null()).cloned()
}

fn inherit(map: &mut Map<String, Value>, key: &str, value: Option<&Value>) {
    let Some(value) = value else {
        return;
    };
    if map.get(key).is_none_or(Value::is_null) {
        map.insert(key.into(), value.clone());
    }
}
