//! Build lifecycle hooks.
//!
//! Plugins are passed to the builder as an ordered list and each hook is
//! called on every plugin in that order. A hook returns only once its work is
//! done, and an error from any hook aborts the build.

use crate::control::ControlPlane;
use crate::error::WorkspaceResult;
use crate::session::LiveSession;
use crate::window::LiveWindow;

/// Optional hooks invoked while a workspace is built.
pub trait Plugin {
    /// Name used in logs and in errors raised by this plugin.
    fn name(&self) -> &str;

    /// After the session exists and its options are set, before any window
    /// is configured.
    fn before_workspace_build(
        &self,
        _client: &mut dyn ControlPlane,
        _session: &LiveSession,
    ) -> WorkspaceResult<()> {
        Ok(())
    }

    /// When a window is about to be configured.
    fn on_window_create(
        &self,
        _client: &mut dyn ControlPlane,
        _window: &LiveWindow,
    ) -> WorkspaceResult<()> {
        Ok(())
    }

    /// When a window's panes, layout and focus are in place.
    fn after_window_finished(
        &self,
        _client: &mut dyn ControlPlane,
        _window: &LiveWindow,
    ) -> WorkspaceResult<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::control::{NewSessionOptions, OptionScope};
    use crate::memory::InMemoryControlPlane;

    struct Quiet;

    impl Plugin for Quiet {
        fn name(&self) -> &str {
            "quiet"
        }
    }

    struct Status;

    impl Plugin for Status {
        fn name(&self) -> &str {
            "status"
        }

        fn before_workspace_build(
            &self,
            client: &mut dyn ControlPlane,
            session: &LiveSession,
        ) -> WorkspaceResult<()> {
            client.set_option(&OptionScope::Session(session.id.clone()), "status", "off")
        }
    }

    #[test]
    fn default_hooks_do_nothing() {
        let mut client = InMemoryControlPlane::new();
        let record = client.create_session(&NewSessionOptions::new("work")).unwrap();
        let session = LiveSession::from_record(&record);
        let window = session.windows(&mut client).unwrap().remove(0);
        let before = client.calls().len();

        let plugin = Quiet;
        plugin.before_workspace_build(&mut client, &session).unwrap();
        plugin.on_window_create(&mut client, &window).unwrap();
        plugin.after_window_finished(&mut client, &window).unwrap();
        assert_eq!(client.calls().len(), before);
    }

    #[test]
    fn hooks_can_drive_the_client() {
        let mut client = InMemoryControlPlane::new();
        let record = client.create_session(&NewSessionOptions::new("work")).unwrap();
        let session = LiveSession::from_record(&record);

        Status.before_workspace_build(&mut client, &session).unwrap();
        let options = client.options(&OptionScope::Session("work".into()));
        assert_eq!(options, [("status".to_string(), "off".to_string())]);
    }
}
