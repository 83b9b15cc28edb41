//! In-memory control plane.
//!
//! Simulates a tmux server closely enough to build and freeze workspaces
//! without spawning processes. Every operation is logged as the tmux command
//! line it stands for, which doubles as the output of a dry run.

use std::collections::HashSet;

use crate::command::TmuxCommand;
use crate::control::{
    ControlPlane, NewSessionOptions, NewWindowOptions, OptionScope, SendKeys, SplitOptions,
};
use crate::error::{WorkspaceError, WorkspaceResult};
use crate::format::Record;

/// Foreground process of a freshly created pane.
pub const DEFAULT_SHELL: &str = "bash";

/// Working directory used when none is requested.
const DEFAULT_PATH: &str = "/";

const PANE_WIDTH: u16 = 80;
const PANE_HEIGHT: u16 = 24;

/// A simulated pane.
#[derive(Debug, Clone)]
struct SimPane {
    id: u32,
    path: String,
    command: String,
    submitted: Vec<String>,
    pending: String,
}

impl SimPane {
    fn submit(&mut self) {
        let line = std::mem::take(&mut self.pending);
        self.submitted.push(line);
    }
}

/// A simulated window.
#[derive(Debug, Clone)]
struct SimWindow {
    id: u32,
    name: String,
    layout: String,
    panes: Vec<SimPane>,
    active_pane: usize,
    options: Vec<(String, String)>,
}

/// A simulated session.
#[derive(Debug, Clone)]
struct SimSession {
    id: u32,
    name: String,
    path: String,
    windows: Vec<SimWindow>,
    active_window: usize,
    options: Vec<(String, String)>,
    environment: Vec<(String, String)>,
}

/// Control plane backed by process-local state.
#[derive(Debug, Default)]
pub struct InMemoryControlPlane {
    sessions: Vec<SimSession>,
    global_options: Vec<(String, String)>,
    next_session_id: u32,
    next_window_id: u32,
    next_pane_id: u32,
    calls: Vec<TmuxCommand>,
    failing: HashSet<String>,
}

impl InMemoryControlPlane {
    /// An empty server.
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every later call to the tmux subcommand `command` fail.
    pub fn fail_on(&mut self, command: impl Into<String>) {
        self.failing.insert(command.into());
    }

    /// Every command issued so far, in order.
    pub fn calls(&self) -> &[TmuxCommand] {
        &self.calls
    }

    /// Commands issued so far with the given subcommand name.
    pub fn calls_to(&self, command: &str) -> Vec<&TmuxCommand> {
        self.calls.iter().filter(|call| call.name == command).collect()
    }

    /// Lines submitted to a pane with Enter.
    pub fn submitted(&self, pane: &str) -> Vec<String> {
        self.find_pane(pane).map(|pane| pane.submitted.clone()).unwrap_or_default()
    }

    /// Text typed into a pane but not yet submitted.
    pub fn pending_input(&self, pane: &str) -> Option<&str> {
        self.find_pane(pane).map(|pane| pane.pending.as_str())
    }

    /// Replace the foreground process and working directory of a pane.
    ///
    /// Returns `false` when the pane does not exist.
    pub fn set_foreground(&mut self, pane: &str, command: &str, path: &str) -> bool {
        let Some((si, wi, pi)) = self.pane_position(pane) else {
            return false;
        };
        let pane = &mut self.sessions[si].windows[wi].panes[pi];
        pane.command = command.to_owned();
        pane.path = path.to_owned();
        true
    }

    /// Environment variables set on a session, in the order they were set.
    pub fn session_environment(&self, session: &str) -> Vec<(String, String)> {
        self.session_index(session)
            .map(|si| self.sessions[si].environment.clone())
            .unwrap_or_default()
    }

    /// Options set in a scope, in the order they were set.
    pub fn options(&self, scope: &OptionScope) -> Vec<(String, String)> {
        match scope {
            OptionScope::Global => self.global_options.clone(),
            OptionScope::Session(target) => self
                .session_index(target)
                .map(|si| self.sessions[si].options.clone())
                .unwrap_or_default(),
            OptionScope::Window(target) => self
                .window_position(target)
                .map(|(si, wi)| self.sessions[si].windows[wi].options.clone())
                .unwrap_or_default(),
        }
    }

    fn issue(&mut self, command: TmuxCommand) -> WorkspaceResult<()> {
        let name = command.name;
        self.calls.push(command);
        if self.failing.contains(name) {
            return Err(WorkspaceError::ControlPlane {
                command: name.to_owned(),
                stderr: "injected failure".into(),
            });
        }
        Ok(())
    }

    /// Session by `$id` or by name; a leading `=` asks for an exact name.
    fn session_index(&self, target: &str) -> Option<usize> {
        let target = target.strip_prefix('=').unwrap_or(target);
        self.sessions.iter().position(|s| format!("${}", s.id) == target || s.name == target)
    }

    /// `@id` names a window; any session target names its current window.
    fn window_position(&self, target: &str) -> Option<(usize, usize)> {
        if let Some(id) = target.strip_prefix('@') {
            let id: u32 = id.parse().ok()?;
            return self.sessions.iter().enumerate().find_map(|(si, session)| {
                session.windows.iter().position(|w| w.id == id).map(|wi| (si, wi))
            });
        }
        let si = self.session_index(target)?;
        Some((si, self.sessions[si].active_window))
    }

    /// `%id` names a pane; any window target names its current pane.
    fn pane_position(&self, target: &str) -> Option<(usize, usize, usize)> {
        if let Some(id) = target.strip_prefix('%') {
            let id: u32 = id.parse().ok()?;
            return self.sessions.iter().enumerate().find_map(|(si, session)| {
                session.windows.iter().enumerate().find_map(|(wi, window)| {
                    window.panes.iter().position(|p| p.id == id).map(|pi| (si, wi, pi))
                })
            });
        }
        let (si, wi) = self.window_position(target)?;
        Some((si, wi, self.sessions[si].windows[wi].active_pane))
    }

    fn find_pane(&self, target: &str) -> Option<&SimPane> {
        let (si, wi, pi) = self.pane_position(target)?;
        Some(&self.sessions[si].windows[wi].panes[pi])
    }

    fn new_pane(&mut self, path: String) -> SimPane {
        let id = self.next_pane_id;
        self.next_pane_id += 1;
        SimPane {
            id,
            path,
            command: DEFAULT_SHELL.into(),
            submitted: Vec::new(),
            pending: String::new(),
        }
    }

    fn new_window(&mut self, name: Option<&str>, path: String) -> SimWindow {
        let id = self.next_window_id;
        self.next_window_id += 1;
        let pane = self.new_pane(path);
        SimWindow {
            id,
            name: name.unwrap_or(DEFAULT_SHELL).to_owned(),
            layout: String::new(),
            panes: vec![pane],
            active_pane: 0,
            options: Vec::new(),
        }
    }

    fn session_record(&self, si: usize) -> Record {
        let session = &self.sessions[si];
        to_record([
            ("session_id", format!("${}", session.id)),
            ("session_name", session.name.clone()),
            ("session_windows", session.windows.len().to_string()),
            ("session_attached", "0".into()),
            ("session_path", session.path.clone()),
        ])
    }

    fn window_record(&self, si: usize, wi: usize) -> Record {
        let session = &self.sessions[si];
        let window = &session.windows[wi];
        to_record([
            ("window_id", format!("@{}", window.id)),
            ("window_name", window.name.clone()),
            ("window_index", wi.to_string()),
            ("window_layout", window.layout.clone()),
            ("window_active", flag(session.active_window == wi)),
            ("window_panes", window.panes.len().to_string()),
            ("session_id", format!("${}", session.id)),
            ("session_name", session.name.clone()),
        ])
    }

    fn pane_record(&self, si: usize, wi: usize, pi: usize) -> Record {
        let session = &self.sessions[si];
        let window = &session.windows[wi];
        let pane = &window.panes[pi];
        to_record([
            ("pane_id", format!("%{}", pane.id)),
            ("pane_index", pi.to_string()),
            ("pane_width", PANE_WIDTH.to_string()),
            ("pane_height", PANE_HEIGHT.to_string()),
            ("pane_active", flag(window.active_pane == pi)),
            ("pane_current_path", pane.path.clone()),
            ("pane_current_command", pane.command.clone()),
            ("window_id", format!("@{}", window.id)),
            ("window_index", wi.to_string()),
            ("session_id", format!("${}", session.id)),
            ("session_name", session.name.clone()),
        ])
    }
}

fn to_record<const N: usize>(pairs: [(&str, String); N]) -> Record {
    pairs.into_iter().map(|(key, value)| (key.to_owned(), value)).collect()
}

fn flag(set: bool) -> String {
    if set { "1".into() } else { "0".into() }
}

fn not_found(command: &str, what: &str, target: &str) -> WorkspaceError {
    WorkspaceError::ControlPlane {
        command: command.to_owned(),
        stderr: format!("can't find {what}: {target}"),
    }
}

fn set_entry(entries: &mut Vec<(String, String)>, key: &str, value: &str) {
    match entries.iter_mut().find(|(k, _)| k == key) {
        Some(entry) => entry.1 = value.to_owned(),
        None => entries.push((key.to_owned(), value.to_owned())),
    }
}

impl ControlPlane for InMemoryControlPlane {
    fn list_sessions(&mut self) -> WorkspaceResult<Vec<Record>> {
        self.issue(TmuxCommand::list_sessions())?;
        Ok((0..self.sessions.len()).map(|si| self.session_record(si)).collect())
    }

    fn list_windows(&mut self, session: &str) -> WorkspaceResult<Vec<Record>> {
        self.issue(TmuxCommand::list_windows(session))?;
        let si = self
            .session_index(session)
            .ok_or_else(|| not_found("list-windows", "session", session))?;
        Ok((0..self.sessions[si].windows.len()).map(|wi| self.window_record(si, wi)).collect())
    }

    fn list_panes(&mut self, window: &str) -> WorkspaceResult<Vec<Record>> {
        self.issue(TmuxCommand::list_panes(window))?;
        let (si, wi) = self
            .window_position(window)
            .ok_or_else(|| not_found("list-panes", "window", window))?;
        let count = self.sessions[si].windows[wi].panes.len();
        Ok((0..count).map(|pi| self.pane_record(si, wi, pi)).collect())
    }

    fn create_session(&mut self, opts: &NewSessionOptions) -> WorkspaceResult<Record> {
        self.issue(TmuxCommand::new_session(opts))?;
        if self.session_index(&opts.session_name).is_some() {
            return Err(WorkspaceError::ControlPlane {
                command: "new-session".into(),
                stderr: format!("duplicate session: {}", opts.session_name),
            });
        }

        let path = opts.start_directory.clone().unwrap_or_else(|| DEFAULT_PATH.into());
        let window = self.new_window(opts.window_name.as_deref(), path.clone());
        let id = self.next_session_id;
        self.next_session_id += 1;
        self.sessions.push(SimSession {
            id,
            name: opts.session_name.clone(),
            path,
            windows: vec![window],
            active_window: 0,
            options: Vec::new(),
            environment: Vec::new(),
        });
        Ok(self.session_record(self.sessions.len() - 1))
    }

    fn create_window(&mut self, session: &str, opts: &NewWindowOptions) -> WorkspaceResult<Record> {
        self.issue(TmuxCommand::new_window(session, opts))?;
        let si = self
            .session_index(session)
            .ok_or_else(|| not_found("new-window", "session", session))?;
        let path = opts.start_directory.clone().unwrap_or_else(|| self.sessions[si].path.clone());
        let window = self.new_window(opts.window_name.as_deref(), path);

        let session = &mut self.sessions[si];
        session.windows.push(window);
        let wi = session.windows.len() - 1;
        if !opts.detached {
            session.active_window = wi;
        }
        Ok(self.window_record(si, wi))
    }

    fn split_pane(&mut self, target: &str, opts: &SplitOptions) -> WorkspaceResult<Record> {
        self.issue(TmuxCommand::split_window(target, opts))?;
        let (si, wi, pi) = self
            .pane_position(target)
            .ok_or_else(|| not_found("split-window", "pane", target))?;
        let path = opts
            .start_directory
            .clone()
            .unwrap_or_else(|| self.sessions[si].windows[wi].panes[pi].path.clone());
        let pane = self.new_pane(path);

        // The new pane goes directly after the one that was split.
        let window = &mut self.sessions[si].windows[wi];
        let new_index = pi + 1;
        window.panes.insert(new_index, pane);
        if !opts.detached {
            window.active_pane = new_index;
        } else if window.active_pane >= new_index {
            window.active_pane += 1;
        }
        Ok(self.pane_record(si, wi, new_index))
    }

    fn set_option(&mut self, scope: &OptionScope, key: &str, value: &str) -> WorkspaceResult<()> {
        self.issue(TmuxCommand::set_option(scope, key, value))?;
        match scope {
            OptionScope::Global => set_entry(&mut self.global_options, key, value),
            OptionScope::Session(target) => {
                let si = self
                    .session_index(target)
                    .ok_or_else(|| not_found("set-option", "session", target))?;
                set_entry(&mut self.sessions[si].options, key, value);
            },
            OptionScope::Window(target) => {
                let (si, wi) = self
                    .window_position(target)
                    .ok_or_else(|| not_found("set-option", "window", target))?;
                set_entry(&mut self.sessions[si].windows[wi].options, key, value);
            },
        }
        Ok(())
    }

    fn set_environment(&mut self, session: &str, key: &str, value: &str) -> WorkspaceResult<()> {
        self.issue(TmuxCommand::set_environment(session, key, value))?;
        let si = self
            .session_index(session)
            .ok_or_else(|| not_found("set-environment", "session", session))?;
        set_entry(&mut self.sessions[si].environment, key, value);
        Ok(())
    }

    fn send_keys(&mut self, pane: &str, text: &str, keys: SendKeys) -> WorkspaceResult<()> {
        self.issue(TmuxCommand::send_keys(pane, text, keys.literal))?;
        let (si, wi, pi) = self
            .pane_position(pane)
            .ok_or_else(|| not_found("send-keys", "pane", pane))?;
        if keys.literal || text != "Enter" {
            self.sessions[si].windows[wi].panes[pi].pending.push_str(text);
        } else {
            self.sessions[si].windows[wi].panes[pi].submit();
        }

        if keys.enter {
            self.issue(TmuxCommand::send_enter(pane))?;
            self.sessions[si].windows[wi].panes[pi].submit();
        }
        Ok(())
    }

    fn select_layout(&mut self, window: &str, layout: &str) -> WorkspaceResult<()> {
        self.issue(TmuxCommand::select_layout(window, layout))?;
        let (si, wi) = self
            .window_position(window)
            .ok_or_else(|| not_found("select-layout", "window", window))?;
        self.sessions[si].windows[wi].layout = layout.to_owned();
        Ok(())
    }

    fn select_window(&mut self, target: &str) -> WorkspaceResult<()> {
        self.issue(TmuxCommand::select_window(target))?;
        let (si, wi) = self
            .window_position(target)
            .ok_or_else(|| not_found("select-window", "window", target))?;
        self.sessions[si].active_window = wi;
        Ok(())
    }

    fn select_pane(&mut self, target: &str) -> WorkspaceResult<()> {
        self.issue(TmuxCommand::select_pane(target))?;
        let (si, wi, pi) = self
            .pane_position(target)
            .ok_or_else(|| not_found("select-pane", "pane", target))?;
        self.sessions[si].windows[wi].active_pane = pi;
        Ok(())
    }

    fn kill_session(&mut self, target: &str) -> WorkspaceResult<()> {
        self.issue(TmuxCommand::kill_session(target))?;
        let si = self
            .session_index(target)
            .ok_or_else(|| not_found("kill-session", "session", target))?;
        self.sessions.remove(si);
        Ok(())
    }

    fn has_session(&mut self, name: &str) -> bool {
        self.issue(TmuxCommand::has_session(name)).is_ok() && self.session_index(name).is_some()
    }
}
