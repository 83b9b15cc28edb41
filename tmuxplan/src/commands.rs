//! Subcommand implementations.
//!
//! Each command writes its report to `out` so it can run against any
//! control plane and be checked without a terminal.

use std::error::Error;
use std::fs;
use std::io::Write;

use log::info;

use tmuxplan_workspace::control::ControlPlane;
use tmuxplan_workspace::document::{self, DocumentFormat};
use tmuxplan_workspace::environment::Environment;
use tmuxplan_workspace::memory::InMemoryControlPlane;
use tmuxplan_workspace::session;
use tmuxplan_workspace::{BuildOptions, build_workspace, freeze_session};

use crate::cli::{ConvertArgs, FreezeArgs, LoadArgs};

pub type CommandResult = Result<(), Box<dyn Error>>;

/// Subcommands that only read server state.
const QUERIES: &[&str] = &["list-sessions", "list-windows", "list-panes", "has-session"];

/// `tmuxplan load`.
pub fn load(
    client: &mut dyn ControlPlane,
    args: &LoadArgs,
    env: &dyn Environment,
    out: &mut dyn Write,
) -> CommandResult {
    let config = document::load_workspace(&args.config, env)?;
    info!(
        "Loaded {} from {} ({} windows, {} panes)",
        config.session_name,
        args.config.display(),
        config.windows.len(),
        config.pane_count()
    );

    let options = BuildOptions { kill_existing: args.kill_existing, ..BuildOptions::default() };
    let session = build_workspace(client, &config, &options)?;

    writeln!(out, "Session '{}' created with {} windows.", session.name, session.window_count)?;
    writeln!(out, "Attach with: tmux attach -t {}", session.name)?;
    Ok(())
}

/// `tmuxplan load --dry-run`: build against a simulated server and print
/// the commands that change state.
pub fn dry_run(args: &LoadArgs, env: &dyn Environment, out: &mut dyn Write) -> CommandResult {
    let mut client = InMemoryControlPlane::new();
    let config = document::load_workspace(&args.config, env)?;
    build_workspace(&mut client, &config, &BuildOptions::default())?;

    for call in client.calls().iter().filter(|call| !QUERIES.contains(&call.name)) {
        writeln!(out, "{call}")?;
    }
    Ok(())
}

/// `tmuxplan freeze`.
pub fn freeze(
    client: &mut dyn ControlPlane,
    args: &FreezeArgs,
    out: &mut dyn Write,
) -> CommandResult {
    let session = session::find_session(client, &args.session)?
        .ok_or_else(|| format!("session '{}' not found", args.session))?;
    let config = freeze_session(client, &session)?;
    let text = document::render_document(&config, args.document_format())?;

    match &args.output {
        Some(path) => {
            fs::write(path, text)?;
            writeln!(out, "Session '{}' frozen to {}", session.name, path.display())?;
        },
        None => out.write_all(text.as_bytes())?,
    }
    Ok(())
}

/// `tmuxplan ls`.
pub fn list(client: &mut dyn ControlPlane, out: &mut dyn Write) -> CommandResult {
    let sessions = session::list_sessions(client)?;
    if sessions.is_empty() {
        writeln!(out, "No sessions found.")?;
        return Ok(());
    }

    for session in &sessions {
        writeln!(out, "{} ({})", session.name, session.id)?;
        for window in session.windows(client)? {
            let active = marker(window.active);
            writeln!(out, "  {}: {} ({}){}", window.index, window.name, window.id, active)?;
            for pane in window.panes(client)? {
                let mut line = format!("    {} ({}x{})", pane.id, pane.width, pane.height);
                if !pane.current_command.is_empty() {
                    line.push_str(&format!(" [{}]", pane.current_command));
                }
                if !pane.current_path.is_empty() {
                    line.push(' ');
                    line.push_str(&pane.current_path);
                }
                writeln!(out, "{line}{}", marker(pane.active))?;
            }
        }
        writeln!(out)?;
    }
    Ok(())
}

/// `tmuxplan convert`.
pub fn convert(args: &ConvertArgs, out: &mut dyn Write) -> CommandResult {
    let text = document::read(&args.file)?;
    let (converted, to) = document::convert_document(&text, DocumentFormat::from_path(&args.file))?;

    match args.output.clone().or_else(|| document::converted_path(&args.file, to)) {
        Some(path) => {
            fs::write(&path, converted)?;
            writeln!(out, "Converted {} to {}", args.file.display(), path.display())?;
        },
        None => out.write_all(converted.as_bytes())?,
    }
    Ok(())
}

fn marker(active: bool) -> &'static str {
    if active { " *" } else { "" }
}
