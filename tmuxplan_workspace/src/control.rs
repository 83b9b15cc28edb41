//! The control-plane boundary.
//!
//! Everything the builder and freezer do to a multiplexer goes through
//! [`ControlPlane`]. Calls are synchronous and one call completes before the
//! next begins. A call that fails is reported as an error and never retried.

use serde::{Deserialize, Serialize};

use crate::error::WorkspaceResult;
use crate::format::Record;

/// Direction of a pane split.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SplitDirection {
    /// New pane below the target (tmux default).
    #[default]
    Vertical,
    /// New pane to the right of the target.
    Horizontal,
}

/// Where an option is set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OptionScope {
    /// Server-wide (`-g`).
    Global,
    /// One session, by id or name.
    Session(String),
    /// One window, by id.
    Window(String),
}

/// Arguments for creating a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewSessionOptions {
    /// Name of the session.
    pub session_name: String,
    /// Name of the session's first window.
    pub window_name: Option<String>,
    /// Working directory of the first pane.
    pub start_directory: Option<String>,
    /// Create without attaching a client.
    pub detached: bool,
}

impl NewSessionOptions {
    /// Detached session with the given name.
    pub fn new(session_name: impl Into<String>) -> Self {
        Self {
            session_name: session_name.into(),
            window_name: None,
            start_directory: None,
            detached: true,
        }
    }
}

/// Arguments for creating a window.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct NewWindowOptions {
    /// Name of the window.
    pub window_name: Option<String>,
    /// Working directory of the window's first pane.
    pub start_directory: Option<String>,
    /// Do not make the new window current.
    pub detached: bool,
}

/// Arguments for splitting a pane.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SplitOptions {
    /// Split direction; `None` leaves the choice to the control plane.
    pub direction: Option<SplitDirection>,
    /// Working directory of the new pane.
    pub start_directory: Option<String>,
    /// Keep focus on the pane that was split.
    pub detached: bool,
}

/// How text is delivered by [`ControlPlane::send_keys`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SendKeys {
    /// Follow the text with an Enter keystroke.
    pub enter: bool,
    /// Send the text as literal characters rather than key names.
    pub literal: bool,
}

impl SendKeys {
    /// Literal text followed by Enter: a submitted command line.
    pub const SUBMIT: SendKeys = SendKeys { enter: true, literal: true };
    /// Literal text left unsubmitted at the prompt.
    pub const TYPE: SendKeys = SendKeys { enter: false, literal: true };
}

/// Primitive operations of a terminal multiplexer.
///
/// Query calls return records keyed by the field names in
/// [`crate::format`]; create calls return the record of the created object.
pub trait ControlPlane {
    /// All sessions on the server.
    fn list_sessions(&mut self) -> WorkspaceResult<Vec<Record>>;

    /// Windows of a session, in index order.
    fn list_windows(&mut self, session: &str) -> WorkspaceResult<Vec<Record>>;

    /// Panes of a window, in index order.
    fn list_panes(&mut self, window: &str) -> WorkspaceResult<Vec<Record>>;

    /// Create a session together with its first window and pane.
    fn create_session(&mut self, opts: &NewSessionOptions) -> WorkspaceResult<Record>;

    /// Add a window to an existing session.
    fn create_window(&mut self, session: &str, opts: &NewWindowOptions) -> WorkspaceResult<Record>;

    /// Split a pane (or a window's active pane) and return the new pane.
    fn split_pane(&mut self, target: &str, opts: &SplitOptions) -> WorkspaceResult<Record>;

    /// Set an option.
    fn set_option(&mut self, scope: &OptionScope, key: &str, value: &str) -> WorkspaceResult<()>;

    /// Set a session environment variable.
    fn set_environment(&mut self, session: &str, key: &str, value: &str) -> WorkspaceResult<()>;

    /// Type text into a pane.
    fn send_keys(&mut self, pane: &str, text: &str, keys: SendKeys) -> WorkspaceResult<()>;

    /// Arrange a window's panes.
    fn select_layout(&mut self, window: &str, layout: &str) -> WorkspaceResult<()>;

    /// Make a window current in its session.
    fn select_window(&mut self, target: &str) -> WorkspaceResult<()>;

    /// Make a pane current in its window.
    fn select_pane(&mut self, target: &str) -> WorkspaceResult<()>;

    /// Destroy a session.
    fn kill_session(&mut self, target: &str) -> WorkspaceResult<()>;

    /// Whether a session with this name exists.
    fn has_session(&mut self, name: &str) -> bool;
}
