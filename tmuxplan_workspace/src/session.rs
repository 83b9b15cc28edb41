//! Live session handles.

use serde::{Deserialize, Serialize};

use crate::control::ControlPlane;
use crate::error::WorkspaceResult;
use crate::format::{self, Record};
use crate::window::LiveWindow;

/// A session as reported by the control plane.
///
/// Holds only identifiers and the last observed attributes; it stays valid
/// only while the session exists on the server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LiveSession {
    /// Server-assigned id, e.g. `$3`.
    pub id: String,
    /// Session name.
    pub name: String,
    /// Number of windows when observed.
    pub window_count: usize,
    /// Whether a client is attached.
    pub attached: bool,
    /// Session working directory.
    pub path: String,
}

impl LiveSession {
    /// Build a handle from a session record.
    pub fn from_record(record: &Record) -> Self {
        Self {
            id: format::field(record, "session_id").to_owned(),
            name: format::field(record, "session_name").to_owned(),
            window_count: format::number(record, "session_windows"),
            attached: format::number::<u32>(record, "session_attached") > 0,
            path: format::field(record, "session_path").to_owned(),
        }
    }

    /// Current windows of this session, in index order.
    pub fn windows(&self, client: &mut dyn ControlPlane) -> WorkspaceResult<Vec<LiveWindow>> {
        let records = client.list_windows(&self.id)?;
        Ok(records.iter().map(LiveWindow::from_record).collect())
    }
}

/// All sessions on the server.
pub fn list_sessions(client: &mut dyn ControlPlane) -> WorkspaceResult<Vec<LiveSession>> {
    let records = client.list_sessions()?;
    Ok(records.iter().map(LiveSession::from_record).collect())
}

/// Look up a session by name.
///
/// A missing session is an ordinary outcome and yields `None`.
pub fn find_session(
    client: &mut dyn ControlPlane,
    name: &str,
) -> WorkspaceResult<Option<LiveSession>> {
    Ok(list_sessions(client)?.into_iter().find(|session| session.name == name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::control::NewSessionOptions;
    use crate::memory::InMemoryControlPlane;

    #[test]
    fn record_fields_map_onto_handle() {
        let record: Record = [
            ("session_id", "$2"),
            ("session_name", "work"),
            ("session_windows", "3"),
            ("session_attached", "1"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
        let session = LiveSession::from_record(&record);
        assert_eq!(session.id, "$2");
        assert_eq!(session.name, "work");
        assert_eq!(session.window_count, 3);
        assert!(session.attached);
        assert_eq!(session.path, "");
    }

    #[test]
    fn find_session_by_name() {
        let mut client = InMemoryControlPlane::new();
        client.create_session(&NewSessionOptions::new("alpha")).unwrap();
        client.create_session(&NewSessionOptions::new("beta")).unwrap();

        let found = find_session(&mut client, "beta").unwrap().unwrap();
        assert_eq!(found.name, "beta");
        assert_eq!(found.windows(&mut client).unwrap().len(), 1);

        assert!(find_session(&mut client, "gamma").unwrap().is_none());
    }
}
