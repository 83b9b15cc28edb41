//! Replays a validated workspace against a control plane.
//!
//! The build is a fixed sequence of control-plane calls. The first failing
//! call aborts it, and whatever was created up to that point is left in place
//! for the caller to clean up, usually by building again with
//! [`BuildOptions::kill_existing`].

use std::thread;
use std::time::Duration;

use log::{debug, info, warn};

use crate::config::{PaneConfig, WindowConfig, WorkspaceConfig, option_value};
use crate::control::{
    ControlPlane, NewSessionOptions, NewWindowOptions, OptionScope, SendKeys, SplitOptions,
};
use crate::error::{WorkspaceError, WorkspaceResult};
use crate::pane::LivePane;
use crate::plugin::Plugin;
use crate::session::{self, LiveSession};
use crate::window::LiveWindow;

/// Knobs for [`build_workspace`].
#[derive(Default)]
pub struct BuildOptions {
    /// Hooks run at fixed points of the build, in list order.
    pub plugins: Vec<Box<dyn Plugin>>,
    /// Kill a session with the same name before creating the new one.
    pub kill_existing: bool,
}

/// Create the session described by `config`.
pub fn build_workspace(
    client: &mut dyn ControlPlane,
    config: &WorkspaceConfig,
    options: &BuildOptions,
) -> WorkspaceResult<LiveSession> {
    let name = config.session_name.as_str();
    if options.kill_existing && client.has_session(name) {
        // A failure here resurfaces as a duplicate session on create.
        match client.kill_session(&format!("={name}")) {
            Ok(()) => info!("Killed existing session {name}"),
            Err(err) => warn!("Could not kill existing session {name}: {err}"),
        }
    }

    let first = config
        .windows
        .first()
        .ok_or_else(|| WorkspaceError::shape("windows", "must not be empty"))?;
    let opts = NewSessionOptions {
        window_name: Some(first.window_name.clone()),
        start_directory: start_directory(config, first, first.panes.first()),
        ..NewSessionOptions::new(name)
    };
    let session = LiveSession::from_record(&client.create_session(&opts)?);
    if session.id.is_empty() {
        return Err(malformed("new-session", "reply has no session id"));
    }
    info!("Created session {} ({})", session.name, session.id);

    let scope = OptionScope::Session(session.id.clone());
    for (key, value) in &config.options {
        client.set_option(&scope, key, &option_value(value))?;
    }
    for (key, value) in &config.global_options {
        client.set_option(&OptionScope::Global, key, &option_value(value))?;
    }
    for (key, value) in &config.environment {
        client.set_environment(&session.id, key, &option_value(value))?;
    }

    for plugin in &options.plugins {
        debug!("Plugin {}: before_workspace_build", plugin.name());
        plugin.before_workspace_build(client, &session)?;
    }

    let mut windows = Vec::with_capacity(config.windows.len());

    let live = session
        .windows(client)?
        .into_iter()
        .next()
        .ok_or_else(|| malformed("list-windows", "new session has no window"))?;
    if live.id.is_empty() {
        return Err(malformed("list-windows", "reply has no window id"));
    }
    configure_window(client, config, first, &live, &options.plugins)?;
    windows.push(live);

    for window in &config.windows[1..] {
        let opts = NewWindowOptions {
            window_name: Some(window.window_name.clone()),
            start_directory: start_directory(config, window, window.panes.first()),
            detached: true,
        };
        let live = LiveWindow::from_record(&client.create_window(&session.id, &opts)?);
        if live.id.is_empty() {
            return Err(malformed("new-window", "reply has no window id"));
        }
        info!("Created window {} ({})", live.name, live.id);
        configure_window(client, config, window, &live, &options.plugins)?;
        windows.push(live);
    }

    if let Some(window) = windows.get(config.focused_window()) {
        if let Err(err) = client.select_window(&window.id) {
            warn!("Could not focus window {}: {err}", window.name);
        }
    }

    let session = session::list_sessions(client)?
        .into_iter()
        .find(|live| live.id == session.id)
        .unwrap_or(session);
    info!("Built session {} with {} windows", session.name, windows.len());
    Ok(session)
}

/// Options, panes, layout, and focus of one window.
fn configure_window(
    client: &mut dyn ControlPlane,
    config: &WorkspaceConfig,
    window: &WindowConfig,
    live: &LiveWindow,
    plugins: &[Box<dyn Plugin>],
) -> WorkspaceResult<()> {
    for plugin in plugins {
        debug!("Plugin {}: on_window_create {}", plugin.name(), live.id);
        plugin.on_window_create(client, live)?;
    }

    let scope = OptionScope::Window(live.id.clone());
    for (key, value) in &window.options {
        client.set_option(&scope, key, &option_value(value))?;
    }

    let mut pane = live
        .panes(client)?
        .into_iter()
        .next()
        .ok_or_else(|| malformed("list-panes", "new window has no pane"))?;
    if pane.id.is_empty() {
        return Err(malformed("list-panes", "reply has no pane id"));
    }
    let mut pane_ids = Vec::with_capacity(window.panes.len());
    for (index, pane_config) in window.panes.iter().enumerate() {
        if index > 0 {
            // Splitting the previous pane keeps panes in document order.
            let opts = SplitOptions {
                direction: None,
                start_directory: start_directory(config, window, Some(pane_config)),
                detached: true,
            };
            pane = LivePane::from_record(&client.split_pane(&pane.id, &opts)?);
            if pane.id.is_empty() {
                return Err(malformed("split-window", "reply has no pane id"));
            }
        }
        configure_pane(client, config, window, pane_config, &pane)?;
        pane_ids.push(pane.id.clone());
    }

    if let Some(layout) = &window.layout {
        client.select_layout(&live.id, layout)?;
    }

    if let Some(id) = window.focused_pane().and_then(|index| pane_ids.get(index)) {
        if let Err(err) = client.select_pane(id) {
            warn!("Could not focus pane {id}: {err}");
        }
    }

    for plugin in plugins {
        debug!("Plugin {}: after_window_finished {}", plugin.name(), live.id);
        plugin.after_window_finished(client, live)?;
    }

    Ok(())
}

/// Type the window's prelude and the pane's own commands.
fn configure_pane(
    client: &mut dyn ControlPlane,
    config: &WorkspaceConfig,
    window: &WindowConfig,
    pane: &PaneConfig,
    live: &LivePane,
) -> WorkspaceResult<()> {
    debug!("Configuring pane {} of window {}", live.id, window.window_name);

    pause(pane.sleep_before);

    let suppress = pane
        .suppress_history
        .or(window.suppress_history)
        .or(config.suppress_history)
        .unwrap_or(false);
    let line = |command: &str| if suppress { format!(" {command}") } else { command.to_owned() };

    for command in &window.shell_command_before {
        client.send_keys(&live.id, &line(command), SendKeys::SUBMIT)?;
    }

    let keys = if pane.enter { SendKeys::SUBMIT } else { SendKeys::TYPE };
    for command in &pane.shell_command {
        client.send_keys(&live.id, &line(command), keys)?;
    }

    pause(pane.sleep_after);

    Ok(())
}

/// Nearest working directory for a pane: its own, its window's, the session's.
fn start_directory(
    config: &WorkspaceConfig,
    window: &WindowConfig,
    pane: Option<&PaneConfig>,
) -> Option<String> {
    pane.and_then(|pane| pane.start_directory.as_ref())
        .or(window.start_directory.as_ref())
        .or(config.start_directory.as_ref())
        .cloned()
}

fn pause(seconds: Option<f64>) {
    let Some(seconds) = seconds else {
        return;
    };

    match Duration::try_from_secs_f64(seconds) {
        Ok(duration) if !duration.is_zero() => thread::sleep(duration),
        Ok(_) => (),
        Err(_) => warn!("Ignoring invalid sleep of {seconds} seconds"),
    }
}

fn malformed(command: &str, message: &str) -> WorkspaceError {
    WorkspaceError::Malformed { command: command.to_owned(), message: message.to_owned() }
}
