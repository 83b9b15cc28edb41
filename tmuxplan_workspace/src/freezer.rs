//! Captures a live session as a workspace document.
//!
//! Only query calls are issued. Fields the control plane leaves out are
//! treated as empty instead of failing the capture.

use log::{debug, warn};

use crate::config::{OptionMap, PaneConfig, WindowConfig, WorkspaceConfig};
use crate::control::ControlPlane;
use crate::error::WorkspaceResult;
use crate::pane::LivePane;
use crate::session::LiveSession;
use crate::window::LiveWindow;

/// Foreground programs that mean "idle at a prompt".
pub const SHELLS: &[&str] = &["bash", "zsh", "sh", "fish", "ksh", "csh", "tcsh", "dash"];

/// Describe `session` as it currently is.
pub fn freeze_session(
    client: &mut dyn ControlPlane,
    session: &LiveSession,
) -> WorkspaceResult<WorkspaceConfig> {
    debug!("Freezing session {} ({})", session.name, session.id);

    let mut windows = Vec::new();
    for window in session.windows(client)? {
        windows.push(freeze_window(client, &window)?);
    }

    let start_directory = hoist(windows.iter_mut().map(|window| &mut window.start_directory));

    Ok(WorkspaceConfig {
        session_name: session.name.clone(),
        start_directory,
        environment: OptionMap::new(),
        global_options: OptionMap::new(),
        options: OptionMap::new(),
        shell_command_before: Vec::new(),
        suppress_history: None,
        windows,
    })
}

fn freeze_window(
    client: &mut dyn ControlPlane,
    window: &LiveWindow,
) -> WorkspaceResult<WindowConfig> {
    let mut panes: Vec<PaneConfig> = if window.id.is_empty() {
        warn!("Window {:?} reported no id; capturing one empty pane", window.name);
        vec![PaneConfig::default()]
    } else {
        window.panes(client)?.iter().map(freeze_pane).collect()
    };

    let start_directory = hoist(panes.iter_mut().map(|pane| &mut pane.start_directory));

    Ok(WindowConfig {
        start_directory,
        layout: (!window.layout.is_empty()).then(|| window.layout.clone()),
        focus: window.active,
        panes,
        ..WindowConfig::new(window.name.clone())
    })
}

fn freeze_pane(pane: &LivePane) -> PaneConfig {
    if pane.current_path.is_empty() {
        warn!("Pane {} reported no working directory", pane.id);
    }

    let command = pane.current_command.as_str();
    let shell_command = if command.is_empty() || SHELLS.contains(&command) {
        Vec::new()
    } else {
        vec![command.to_owned()]
    };

    PaneConfig {
        shell_command,
        start_directory: (!pane.current_path.is_empty()).then(|| pane.current_path.clone()),
        focus: pane.active,
        ..PaneConfig::default()
    }
}

/// Move a directory shared by every child up to the parent.
///
/// Returns the shared value and clears it from the children; leaves them
/// untouched when any child differs or has none.
fn hoist<'a>(dirs: impl Iterator<Item = &'a mut Option<String>>) -> Option<String> {
    let mut dirs: Vec<&mut Option<String>> = dirs.collect();
    let shared = match dirs.first() {
        Some(Some(dir)) => dir.clone(),
        _ => return None,
    };
    if !dirs.iter().all(|dir| dir.as_deref() == Some(shared.as_str())) {
        return None;
    }

    for dir in &mut dirs {
        **dir = None;
    }
    Some(shared)
}
