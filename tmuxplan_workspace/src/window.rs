//! Live window handles.

use serde::{Deserialize, Serialize};

use crate::control::ControlPlane;
use crate::error::WorkspaceResult;
use crate::format::{self, Record};
use crate::pane::LivePane;

/// A window as reported by the control plane.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LiveWindow {
    /// Server-assigned id, e.g. `@7`.
    pub id: String,
    /// Window name.
    pub name: String,
    /// Position in the session's window list.
    pub index: u32,
    /// Compact layout descriptor; opaque.
    pub layout: String,
    /// Whether this is the session's current window.
    pub active: bool,
    /// Number of panes when observed.
    pub pane_count: usize,
    /// Owning session id.
    pub session_id: String,
    /// Owning session name.
    pub session_name: String,
}

impl LiveWindow {
    /// Build a handle from a window record.
    pub fn from_record(record: &Record) -> Self {
        Self {
            id: format::field(record, "window_id").to_owned(),
            name: format::field(record, "window_name").to_owned(),
            index: format::number(record, "window_index"),
            layout: format::field(record, "window_layout").to_owned(),
            active: format::flag(record, "window_active"),
            pane_count: format::number(record, "window_panes"),
            session_id: format::field(record, "session_id").to_owned(),
            session_name: format::field(record, "session_name").to_owned(),
        }
    }

    /// Current panes of this window, in index order.
    pub fn panes(&self, client: &mut dyn ControlPlane) -> WorkspaceResult<Vec<LivePane>> {
        let records = client.list_panes(&self.id)?;
        Ok(records.iter().map(LivePane::from_record).collect())
    }
}
