//! Error types for the workspace crate.

use std::io;
use std::time::Duration;

/// Errors that can occur while loading, building, or freezing a workspace.
#[derive(Debug, thiserror::Error)]
pub enum WorkspaceError {
    /// The document failed a structural check.
    #[error("{path}: {message}")]
    Shape {
        /// Dotted/indexed location of the offending node, e.g. `windows[1].panes[0]`.
        path: String,
        /// What is wrong with the node.
        message: String,
    },

    /// A control-plane call reported a non-zero status.
    #[error("{command} failed: {stderr}")]
    ControlPlane {
        /// The tmux subcommand that failed.
        command: String,
        /// Error text exactly as reported by the control plane.
        stderr: String,
    },

    /// A control-plane call did not answer in time.
    #[error("{command} timed out after {}ms", .timeout.as_millis())]
    Timeout {
        /// The tmux subcommand that was abandoned.
        command: String,
        /// The bound that was exceeded.
        timeout: Duration,
    },

    /// A control-plane reply could not be turned into the expected record.
    #[error("unexpected reply to {command}: {message}")]
    Malformed {
        /// The tmux subcommand whose reply was unusable.
        command: String,
        /// Description of the problem.
        message: String,
    },

    /// A plugin hook aborted the build.
    #[error("plugin {plugin}: {message}")]
    Plugin {
        /// Name reported by the plugin.
        plugin: String,
        /// Reason given by the hook.
        message: String,
    },

    /// A YAML or JSON document could not be parsed.
    #[error("invalid {format} document: {message}")]
    Parse {
        /// Human readable format name.
        format: &'static str,
        /// Parser message.
        message: String,
    },

    /// An I/O error occurred.
    #[error("io error: {0}")]
    Io(#[from] io::Error),
}

impl WorkspaceError {
    /// Build a shape error at `path`.
    pub fn shape(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Shape { path: path.into(), message: message.into() }
    }

    /// Whether this error came from the control plane rather than the document.
    pub fn is_control_plane(&self) -> bool {
        matches!(self, Self::ControlPlane { .. } | Self::Timeout { .. } | Self::Malformed { .. })
    }
}

/// Convenience type alias for workspace results.
pub type WorkspaceResult<T> = Result<T, WorkspaceError>;
