//! Control plane backed by a tmux server process.

use std::ffi::OsString;
use std::io::{self, Read};
use std::path::PathBuf;
use std::process::{Command, Stdio};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use log::debug;

use crate::command::TmuxCommand;
use crate::control::{
    ControlPlane, NewSessionOptions, NewWindowOptions, OptionScope, SendKeys, SplitOptions,
};
use crate::error::{WorkspaceError, WorkspaceResult};
use crate::format::{self, PANE_FIELDS, Record, SESSION_FIELDS, WINDOW_FIELDS};

/// Bound on a single tmux invocation.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(5000);

const POLL_INTERVAL: Duration = Duration::from_millis(5);

/// Messages tmux prints when there is nothing to list.
const NO_SERVER: &[&str] = &["no server running", "no sessions", "error connecting to"];

/// How to reach the tmux server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TmuxOptions {
    /// tmux executable.
    pub binary: PathBuf,
    /// Socket name (`-L`).
    pub socket_name: Option<String>,
    /// Socket path (`-S`); takes precedence over the name in tmux.
    pub socket_path: Option<PathBuf>,
    /// Server configuration file (`-f`).
    pub config_file: Option<PathBuf>,
    /// Per-call timeout.
    pub timeout: Duration,
}

impl Default for TmuxOptions {
    fn default() -> Self {
        Self {
            binary: PathBuf::from("tmux"),
            socket_name: None,
            socket_path: None,
            config_file: None,
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl TmuxOptions {
    /// Arguments placed before every subcommand.
    pub fn server_args(&self) -> Vec<OsString> {
        let mut args = Vec::new();
        if let Some(name) = &self.socket_name {
            args.push("-L".into());
            args.push(name.into());
        }
        if let Some(path) = &self.socket_path {
            args.push("-S".into());
            args.push(path.into());
        }
        if let Some(file) = &self.config_file {
            args.push("-f".into());
            args.push(file.into());
        }
        args
    }
}

/// Result of one tmux invocation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    /// Standard output, one entry per line.
    pub stdout: Vec<String>,
    /// Standard error, one entry per line.
    pub stderr: Vec<String>,
    /// Exit status; `-1` when the process was terminated by a signal.
    pub status: i32,
}

impl CommandOutput {
    /// Whether tmux exited with status zero.
    pub fn success(&self) -> bool {
        self.status == 0
    }
}

/// A tmux server reached by spawning the tmux client binary.
#[derive(Debug, Clone, Default)]
pub struct TmuxServer {
    options: TmuxOptions,
}

impl TmuxServer {
    /// Client for the server selected by `options`.
    pub fn new(options: TmuxOptions) -> Self {
        Self { options }
    }

    /// Run a command and collect its output regardless of exit status.
    ///
    /// Only a failure to start or wait for the process, or running past the
    /// timeout, is an error here.
    pub fn execute(&self, command: &TmuxCommand) -> WorkspaceResult<CommandOutput> {
        debug!("{command}");

        let transport = |err: io::Error| WorkspaceError::ControlPlane {
            command: command.name.to_owned(),
            stderr: format!("failed to run {}: {err}", self.options.binary.display()),
        };

        let mut child = Command::new(&self.options.binary)
            .args(self.options.server_args())
            .arg(command.name)
            .args(&command.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(transport)?;

        let stdout = child.stdout.take().map(drain);
        let stderr = child.stderr.take().map(drain);

        let deadline = Instant::now() + self.options.timeout;
        let status = loop {
            if let Some(status) = child.try_wait().map_err(transport)? {
                break status;
            }
            if Instant::now() >= deadline {
                let _ = child.kill();
                let _ = child.wait();
                return Err(WorkspaceError::Timeout {
                    command: command.name.to_owned(),
                    timeout: self.options.timeout,
                });
            }
            thread::sleep(POLL_INTERVAL);
        };

        Ok(CommandOutput {
            stdout: lines(stdout),
            stderr: lines(stderr),
            status: status.code().unwrap_or(-1),
        })
    }

    /// Run a command, turning a non-zero status into an error.
    fn run(&self, command: TmuxCommand) -> WorkspaceResult<CommandOutput> {
        let output = self.execute(&command)?;
        if output.success() {
            Ok(output)
        } else {
            Err(WorkspaceError::ControlPlane {
                command: command.name.to_owned(),
                stderr: output.stderr.join("\n"),
            })
        }
    }

    fn run_records(&self, command: TmuxCommand, fields: &[&str]) -> WorkspaceResult<Vec<Record>> {
        let output = self.run(command)?;
        Ok(format::parse_records(&output.stdout, fields))
    }

    /// Run a create command printing the new object, and parse the reply.
    fn run_created(&self, command: TmuxCommand, fields: &[&str]) -> WorkspaceResult<Record> {
        let name = command.name;
        self.run_records(command, fields)?.into_iter().next().ok_or_else(|| {
            let message = "no record printed".into();
            WorkspaceError::Malformed { command: name.to_owned(), message }
        })
    }
}

fn drain<R: Read + Send + 'static>(mut reader: R) -> JoinHandle<Vec<u8>> {
    thread::spawn(move || {
        let mut buf = Vec::new();
        let _ = reader.read_to_end(&mut buf);
        buf
    })
}

fn lines(handle: Option<JoinHandle<Vec<u8>>>) -> Vec<String> {
    let bytes = handle.and_then(|handle| handle.join().ok()).unwrap_or_default();
    String::from_utf8_lossy(&bytes).lines().map(str::to_owned).collect()
}

impl ControlPlane for TmuxServer {
    fn list_sessions(&mut self) -> WorkspaceResult<Vec<Record>> {
        let output = self.execute(&TmuxCommand::list_sessions())?;
        if output.success() {
            return Ok(format::parse_records(&output.stdout, SESSION_FIELDS));
        }

        let stderr = output.stderr.join("\n");
        if NO_SERVER.iter().any(|marker| stderr.contains(marker)) {
            return Ok(Vec::new());
        }
        Err(WorkspaceError::ControlPlane { command: "list-sessions".into(), stderr })
    }

    fn list_windows(&mut self, session: &str) -> WorkspaceResult<Vec<Record>> {
        self.run_records(TmuxCommand::list_windows(session), WINDOW_FIELDS)
    }

    fn list_panes(&mut self, window: &str) -> WorkspaceResult<Vec<Record>> {
        self.run_records(TmuxCommand::list_panes(window), PANE_FIELDS)
    }

    fn create_session(&mut self, opts: &NewSessionOptions) -> WorkspaceResult<Record> {
        self.run_created(TmuxCommand::new_session(opts), SESSION_FIELDS)
    }

    fn create_window(&mut self, session: &str, opts: &NewWindowOptions) -> WorkspaceResult<Record> {
        self.run_created(TmuxCommand::new_window(session, opts), WINDOW_FIELDS)
    }

    fn split_pane(&mut self, target: &str, opts: &SplitOptions) -> WorkspaceResult<Record> {
        self.run_created(TmuxCommand::split_window(target, opts), PANE_FIELDS)
    }

    fn set_option(&mut self, scope: &OptionScope, key: &str, value: &str) -> WorkspaceResult<()> {
        self.run(TmuxCommand::set_option(scope, key, value)).map(drop)
    }

    fn set_environment(&mut self, session: &str, key: &str, value: &str) -> WorkspaceResult<()> {
        self.run(TmuxCommand::set_environment(session, key, value)).map(drop)
    }

    fn send_keys(&mut self, pane: &str, text: &str, keys: SendKeys) -> WorkspaceResult<()> {
        self.run(TmuxCommand::send_keys(pane, text, keys.literal))?;
        if keys.enter {
            self.run(TmuxCommand::send_enter(pane))?;
        }
        Ok(())
    }

    fn select_layout(&mut self, window: &str, layout: &str) -> WorkspaceResult<()> {
        self.run(TmuxCommand::select_layout(window, layout)).map(drop)
    }

    fn select_window(&mut self, target: &str) -> WorkspaceResult<()> {
        self.run(TmuxCommand::select_window(target)).map(drop)
    }

    fn select_pane(&mut self, target: &str) -> WorkspaceResult<()> {
        self.run(TmuxCommand::select_pane(target)).map(drop)
    }

    fn kill_session(&mut self, target: &str) -> WorkspaceResult<()> {
        self.run(TmuxCommand::kill_session(target)).map(drop)
    }

    fn has_session(&mut self, name: &str) -> bool {
        self.run(TmuxCommand::has_session(name)).is_ok()
    }
}
