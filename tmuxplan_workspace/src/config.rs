//! Workspace document schema.
//!
//! These are the canonical, typed shapes a document takes once it has been
//! expanded, trickled, and validated. The same types are produced by the
//! freezer, so they also serialize back into a loadable document.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// String-keyed mapping whose values are passed verbatim to the control plane.
///
/// Iteration follows document insertion order.
pub type OptionMap = Map<String, Value>;

/// Root of a workspace document: one session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkspaceConfig {
    /// Name of the live session; unique on the control plane.
    pub session_name: String,
    /// Default working directory for every window and pane.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_directory: Option<String>,
    /// Session environment variables.
    #[serde(default, deserialize_with = "null_as_default", skip_serializing_if = "Map::is_empty")]
    pub environment: OptionMap,
    /// Server-wide options (`set-option -g`).
    #[serde(default, deserialize_with = "null_as_default", skip_serializing_if = "Map::is_empty")]
    pub global_options: OptionMap,
    /// Session options.
    #[serde(default, deserialize_with = "null_as_default", skip_serializing_if = "Map::is_empty")]
    pub options: OptionMap,
    /// Commands sent to every pane before its own commands.
    #[serde(default, deserialize_with = "null_as_default", skip_serializing_if = "Vec::is_empty")]
    pub shell_command_before: Vec<String>,
    /// Keep sent commands out of shell history.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suppress_history: Option<bool>,
    /// Windows in creation and display order.
    pub windows: Vec<WindowConfig>,
}

impl WorkspaceConfig {
    /// Index of the window to select once the build is done.
    ///
    /// The first window marked `focus` wins; without any mark, window 0.
    pub fn focused_window(&self) -> usize {
        self.windows.iter().position(|w| w.focus).unwrap_or(0)
    }

    /// Total number of panes described by the document.
    pub fn pane_count(&self) -> usize {
        self.windows.iter().map(|w| w.panes.len()).sum()
    }
}

/// A window and its panes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WindowConfig {
    /// User-visible window name.
    pub window_name: String,
    /// Working directory; inherited from the session when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_directory: Option<String>,
    /// Layout name (`tiled`, `main-vertical`, ...) or a raw layout string.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub layout: Option<String>,
    /// Commands sent to each pane of this window before its own commands.
    #[serde(default, deserialize_with = "null_as_default", skip_serializing_if = "Vec::is_empty")]
    pub shell_command_before: Vec<String>,
    /// Window options (`set-option -w`).
    #[serde(default, deserialize_with = "null_as_default", skip_serializing_if = "Map::is_empty")]
    pub options: OptionMap,
    /// Select this window after the build.
    #[serde(default, deserialize_with = "null_as_default", skip_serializing_if = "is_false")]
    pub focus: bool,
    /// Keep sent commands out of shell history.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suppress_history: Option<bool>,
    /// Panes in split order. Never empty once validated.
    #[serde(deserialize_with = "panes_with_nulls")]
    pub panes: Vec<PaneConfig>,
}

impl WindowConfig {
    /// A window with a single empty pane.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            window_name: name.into(),
            start_directory: None,
            layout: None,
            shell_command_before: Vec::new(),
            options: OptionMap::new(),
            focus: false,
            suppress_history: None,
            panes: vec![PaneConfig::default()],
        }
    }

    /// Index of the pane to select, if any pane asks for focus.
    pub fn focused_pane(&self) -> Option<usize> {
        self.panes.iter().position(|p| p.focus)
    }
}

/// A single pane.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaneConfig {
    /// Commands typed into the pane, in order.
    #[serde(default, deserialize_with = "null_as_default", skip_serializing_if = "Vec::is_empty")]
    pub shell_command: Vec<String>,
    /// Working directory; inherited from the window when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_directory: Option<String>,
    /// Select this pane after its window is laid out.
    #[serde(default, deserialize_with = "null_as_default", skip_serializing_if = "is_false")]
    pub focus: bool,
    /// Submit each command with an Enter keystroke.
    #[serde(
        default = "default_enter",
        deserialize_with = "null_as_true",
        skip_serializing_if = "is_true"
    )]
    pub enter: bool,
    /// Seconds to wait before sending anything.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sleep_before: Option<f64>,
    /// Seconds to wait after the last command.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sleep_after: Option<f64>,
    /// Keep sent commands out of shell history.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suppress_history: Option<bool>,
}

impl Default for PaneConfig {
    fn default() -> Self {
        Self {
            shell_command: Vec::new(),
            start_directory: None,
            focus: false,
            enter: true,
            sleep_before: None,
            sleep_after: None,
            suppress_history: None,
        }
    }
}

impl PaneConfig {
    /// A pane running the given commands.
    pub fn with_commands<I, S>(commands: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self { shell_command: commands.into_iter().map(Into::into).collect(), ..Self::default() }
    }
}

/// Render an opaque option value the way tmux expects it on the command line.
pub fn option_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Bool(true) => "on".into(),
        Value::Bool(false) => "off".into(),
        Value::Null => String::new(),
        Value::Number(n) => n.to_string(),
        other => other.to_string(),
    }
}

fn default_enter() -> bool {
    true
}

fn is_true(value: &bool) -> bool {
    *value
}

fn is_false(value: &bool) -> bool {
    !*value
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

fn null_as_true<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<bool>::deserialize(deserializer)?.unwrap_or(true))
}

fn panes_with_nulls<'de, D>(deserializer: D) -> Result<Vec<PaneConfig>, D::Error>
where
    D: Deserializer<'de>,
{
    let panes = Vec::<Option<PaneConfig>>::deserialize(deserializer)?;
    Ok(panes.into_iter().map(Option::unwrap_or_default).collect())
}
