//! tmux command lines.
//!
//! Each control-plane operation maps to one (or, for submitted literal text,
//! two) tmux invocations. Both the process-backed client and the in-memory
//! control plane build their argument vectors here, so a dry run logs exactly
//! what would have been executed.

use std::borrow::Cow;
use std::fmt::{self, Write as _};

use crate::control::{
    NewSessionOptions, NewWindowOptions, OptionScope, SplitDirection, SplitOptions,
};
use crate::format::{self, PANE_FIELDS, SESSION_FIELDS, WINDOW_FIELDS};

/// A single tmux subcommand with its arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TmuxCommand {
    /// Subcommand name, e.g. `new-window`.
    pub name: &'static str,
    /// Arguments following the subcommand.
    pub args: Vec<String>,
}

impl TmuxCommand {
    fn new(name: &'static str) -> Self {
        Self { name, args: Vec::new() }
    }

    fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    fn flag(self, flag: &str, enabled: bool) -> Self {
        if enabled { self.arg(flag) } else { self }
    }

    fn opt(self, flag: &str, value: Option<&str>) -> Self {
        match value {
            Some(value) => self.arg(flag).arg(value),
            None => self,
        }
    }

    fn printing(self, fields: &[&str]) -> Self {
        self.arg("-P").arg("-F").arg(format::format_string(fields))
    }

    /// `list-sessions`.
    pub fn list_sessions() -> Self {
        Self::new("list-sessions").arg("-F").arg(format::format_string(SESSION_FIELDS))
    }

    /// `list-windows` for one session.
    pub fn list_windows(session: &str) -> Self {
        Self::new("list-windows")
            .arg("-t")
            .arg(session)
            .arg("-F")
            .arg(format::format_string(WINDOW_FIELDS))
    }

    /// `list-panes` for one window.
    pub fn list_panes(window: &str) -> Self {
        Self::new("list-panes")
            .arg("-t")
            .arg(window)
            .arg("-F")
            .arg(format::format_string(PANE_FIELDS))
    }

    /// `new-session`, printing the created session.
    pub fn new_session(opts: &NewSessionOptions) -> Self {
        Self::new("new-session")
            .flag("-d", opts.detached)
            .arg("-s")
            .arg(opts.session_name.as_str())
            .opt("-n", opts.window_name.as_deref())
            .opt("-c", opts.start_directory.as_deref())
            .printing(SESSION_FIELDS)
    }

    /// `new-window`, printing the created window.
    pub fn new_window(session: &str, opts: &NewWindowOptions) -> Self {
        Self::new("new-window")
            .arg("-t")
            .arg(session)
            .flag("-d", opts.detached)
            .opt("-n", opts.window_name.as_deref())
            .opt("-c", opts.start_directory.as_deref())
            .printing(WINDOW_FIELDS)
    }

    /// `split-window`, printing the created pane.
    pub fn split_window(target: &str, opts: &SplitOptions) -> Self {
        let direction = match opts.direction {
            Some(SplitDirection::Horizontal) => Some("-h"),
            Some(SplitDirection::Vertical) => Some("-v"),
            None => None,
        };
        Self::new("split-window")
            .arg("-t")
            .arg(target)
            .flag(direction.unwrap_or_default(), direction.is_some())
            .opt("-c", opts.start_directory.as_deref())
            .flag("-d", opts.detached)
            .printing(PANE_FIELDS)
    }

    /// `set-option` in the given scope.
    pub fn set_option(scope: &OptionScope, key: &str, value: &str) -> Self {
        let cmd = Self::new("set-option");
        let cmd = match scope {
            OptionScope::Global => cmd.arg("-g"),
            OptionScope::Session(target) => cmd.arg("-t").arg(target.as_str()),
            OptionScope::Window(target) => cmd.arg("-w").arg("-t").arg(target.as_str()),
        };
        cmd.arg("--").arg(key).arg(verbatim(value))
    }

    /// `set-environment` on a session.
    pub fn set_environment(session: &str, key: &str, value: &str) -> Self {
        Self::new("set-environment")
            .arg("-t")
            .arg(session)
            .arg("--")
            .arg(key)
            .arg(verbatim(value))
    }

    /// `send-keys` with text; `-l` stops tmux from reading key names.
    ///
    /// Text after `--` is never read as flags.
    pub fn send_keys(pane: &str, text: &str, literal: bool) -> Self {
        Self::new("send-keys")
            .arg("-t")
            .arg(pane)
            .flag("-l", literal)
            .arg("--")
            .arg(verbatim(text))
    }

    /// `send-keys Enter`.
    pub fn send_enter(pane: &str) -> Self {
        Self::send_keys(pane, "Enter", false)
    }

    /// `select-layout`.
    pub fn select_layout(window: &str, layout: &str) -> Self {
        Self::new("select-layout").arg("-t").arg(window).arg(layout)
    }

    /// `select-window`.
    pub fn select_window(target: &str) -> Self {
        Self::new("select-window").arg("-t").arg(target)
    }

    /// `select-pane`.
    pub fn select_pane(target: &str) -> Self {
        Self::new("select-pane").arg("-t").arg(target)
    }

    /// `kill-session`.
    pub fn kill_session(target: &str) -> Self {
        Self::new("kill-session").arg("-t").arg(target)
    }

    /// `has-session`, matching the name exactly rather than as a prefix.
    pub fn has_session(name: &str) -> Self {
        Self::new("has-session").arg("-t").arg(format!("={name}"))
    }

    /// Value following `flag`, if present.
    pub fn flag_value(&self, flag: &str) -> Option<&str> {
        let pos = self.args.iter().position(|arg| arg == flag)?;
        self.args.get(pos + 1).map(String::as_str)
    }

    /// Whether a bare `flag` is present.
    pub fn has_flag(&self, flag: &str) -> bool {
        self.args.iter().any(|arg| arg == flag)
    }
}

impl fmt::Display for TmuxCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "tmux {}", self.name)?;
        for arg in &self.args {
            write!(f, " {}", shell_quote(arg))?;
        }
        Ok(())
    }
}

/// Protect an argument from tmux's own command parsing.
///
/// tmux reads a trailing `;` as a command separator and turns a trailing
/// `\;` into `;`, so the final `;` is escaped once more.
pub fn verbatim(arg: &str) -> Cow<'_, str> {
    match arg.strip_suffix(';') {
        Some(head) => Cow::Owned(format!("{head}\\;")),
        None => Cow::Borrowed(arg),
    }
}

/// Quote an argument for display as a POSIX shell word.
pub fn shell_quote(arg: &str) -> Cow<'_, str> {
    let safe = |c: char| c.is_ascii_alphanumeric() || "_-./=:@%#+,{}".contains(c);
    if !arg.is_empty() && arg.chars().all(safe) {
        return Cow::Borrowed(arg);
    }

    if arg.chars().any(char::is_control) {
        let mut quoted = String::from("$'");
        for c in arg.chars() {
            match c {
                '\'' => quoted.push_str("\\'"),
                '\\' => quoted.push_str("\\\\"),
                c if c.is_control() => {
                    let _ = write!(quoted, "\\x{:02x}", c as u32);
                },
                c => quoted.push(c),
            }
        }
        quoted.push('\'');
        return Cow::Owned(quoted);
    }

    Cow::Owned(format!("'{}'", arg.replace('\'', r"'\''")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_session_arguments() {
        let opts = NewSessionOptions {
            window_name: Some("editor".into()),
            start_directory: Some("/srv/app".into()),
            ..NewSessionOptions::new("work")
        };
        let cmd = TmuxCommand::new_session(&opts);
        assert_eq!(cmd.name, "new-session");
        assert!(cmd.has_flag("-d"));
        assert_eq!(cmd.flag_value("-s"), Some("work"));
        assert_eq!(cmd.flag_value("-n"), Some("editor"));
        assert_eq!(cmd.flag_value("-c"), Some("/srv/app"));
        assert!(cmd.has_flag("-P"));
    }

    #[test]
    fn split_direction_flags() {
        let default = TmuxCommand::split_window("%1", &SplitOptions::default());
        assert!(!default.has_flag("-h") && !default.has_flag("-v"));

        let opts =
            SplitOptions { direction: Some(SplitDirection::Horizontal), ..Default::default() };
        assert!(TmuxCommand::split_window("%1", &opts).has_flag("-h"));
    }

    #[test]
    fn option_scopes() {
        let global = TmuxCommand::set_option(&OptionScope::Global, "mouse", "on");
        assert_eq!(global.args, ["-g", "--", "mouse", "on"]);

        let scope = OptionScope::Window("@2".into());
        let window = TmuxCommand::set_option(&scope, "synchronize-panes", "on");
        assert_eq!(window.args, ["-w", "-t", "@2", "--", "synchronize-panes", "on"]);
    }

    #[test]
    fn literal_send_keys() {
        let cmd = TmuxCommand::send_keys("%3", "echo $HOME", true);
        assert_eq!(cmd.args, ["-t", "%3", "-l", "--", "echo $HOME"]);
        assert_eq!(TmuxCommand::send_enter("%3").args, ["-t", "%3", "--", "Enter"]);
    }

    #[test]
    fn leading_dash_and_trailing_semicolon_stay_text() {
        let cmd = TmuxCommand::send_keys("%3", "-x foo", true);
        assert_eq!(cmd.args, ["-t", "%3", "-l", "--", "-x foo"]);

        let cmd = TmuxCommand::send_keys("%3", "echo hi;", true);
        assert_eq!(cmd.args.last().map(String::as_str), Some(r"echo hi\;"));

        let cmd = TmuxCommand::send_keys("%3", r"find . -exec rm {} \;", true);
        assert_eq!(cmd.args.last().map(String::as_str), Some(r"find . -exec rm {} \\;"));

        let cmd = TmuxCommand::set_environment("$0", "PS1", "$ ;");
        assert_eq!(cmd.args, ["-t", "$0", "--", "PS1", r"$ \;"]);
        assert_eq!(verbatim("a;b"), "a;b");
    }

    #[test]
    fn has_session_matches_exactly() {
        assert_eq!(TmuxCommand::has_session("work").args, ["-t", "=work"]);
    }

    #[test]
    fn display_quotes_arguments() {
        let cmd = TmuxCommand::send_keys("%3", "echo 'hi there'", true);
        assert_eq!(cmd.to_string(), r"tmux send-keys -t %3 -l -- 'echo '\''hi there'\'''");

        let cmd = TmuxCommand::select_window("$1");
        assert_eq!(cmd.to_string(), "tmux select-window -t '$1'");
    }

    #[test]
    fn display_escapes_separator() {
        assert_eq!(shell_quote("#{a}\x1e#{b}"), r"$'#{a}\x1e#{b}'");
        assert_eq!(shell_quote(""), "''");
    }
}
