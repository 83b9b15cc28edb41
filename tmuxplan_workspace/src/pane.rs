//! Live pane handles.

use serde::{Deserialize, Serialize};

use crate::format::{self, Record};

/// A pane as reported by the control plane.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LivePane {
    /// Server-assigned id, e.g. `%12`.
    pub id: String,
    /// Position within the window.
    pub index: u32,
    /// Width in cells.
    pub width: u16,
    /// Height in cells.
    pub height: u16,
    /// Whether this is the window's current pane.
    pub active: bool,
    /// Working directory of the foreground process.
    pub current_path: String,
    /// Name of the foreground process.
    pub current_command: String,
    /// Owning window id.
    pub window_id: String,
    /// Owning session id.
    pub session_id: String,
}

impl LivePane {
    /// Build a handle from a pane record.
    pub fn from_record(record: &Record) -> Self {
        Self {
            id: format::field(record, "pane_id").to_owned(),
            index: format::number(record, "pane_index"),
            width: format::number(record, "pane_width"),
            height: format::number(record, "pane_height"),
            active: format::flag(record, "pane_active"),
            current_path: format::field(record, "pane_current_path").to_owned(),
            current_command: format::field(record, "pane_current_command").to_owned(),
            window_id: format::field(record, "window_id").to_owned(),
            session_id: format::field(record, "session_id").to_owned(),
        }
    }
}
