//! Command line options.

use std::path::PathBuf;
use std::time::Duration;

use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum};
use log::LevelFilter;

use tmuxplan_workspace::document::DocumentFormat;
use tmuxplan_workspace::tmux::TmuxOptions;

/// Load, freeze, and convert declarative tmux workspaces.
#[derive(Parser, Debug)]
#[command(name = "tmuxplan", version, about, long_about = None)]
pub struct Options {
    /// Increase log verbosity (`-v` info, `-vv` debug, `-vvv` trace).
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(flatten)]
    pub tmux: TmuxArgs,

    #[command(subcommand)]
    pub command: Command,
}

impl Options {
    /// Log level requested on the command line.
    pub fn log_level(&self) -> LevelFilter {
        match self.verbose {
            0 => LevelFilter::Warn,
            1 => LevelFilter::Info,
            2 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        }
    }
}

/// How to reach the tmux server.
#[derive(Args, Debug, Clone, PartialEq, Eq)]
pub struct TmuxArgs {
    /// tmux socket name.
    #[arg(short = 'L', long, global = true, value_name = "NAME")]
    pub socket_name: Option<String>,

    /// tmux socket path.
    #[arg(short = 'S', long, global = true, value_name = "PATH")]
    pub socket_path: Option<PathBuf>,

    /// tmux configuration file, passed to the server as `-f`.
    #[arg(long, global = true, value_name = "FILE")]
    pub tmux_config: Option<PathBuf>,

    /// tmux executable.
    #[arg(
        long,
        global = true,
        env = "TMUXPLAN_TMUX_BIN",
        default_value = "tmux",
        value_name = "PATH"
    )]
    pub tmux_bin: PathBuf,

    /// Give up on a tmux call after this many milliseconds.
    #[arg(long, global = true, default_value_t = 5000, value_name = "MS")]
    pub timeout_ms: u64,
}

impl TmuxArgs {
    /// Server options for the tmux client.
    pub fn options(&self) -> TmuxOptions {
        TmuxOptions {
            binary: self.tmux_bin.clone(),
            socket_name: self.socket_name.clone(),
            socket_path: self.socket_path.clone(),
            config_file: self.tmux_config.clone(),
            timeout: Duration::from_millis(self.timeout_ms),
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Build a session from a YAML or JSON workspace file.
    Load(LoadArgs),
    /// Write a running session out as a workspace document.
    Freeze(FreezeArgs),
    /// List sessions, windows, and panes.
    #[command(alias = "list")]
    Ls,
    /// Convert a workspace file between YAML and JSON.
    Convert(ConvertArgs),
}

#[derive(Args, Debug, Clone, PartialEq, Eq)]
pub struct LoadArgs {
    /// Workspace file.
    pub config: PathBuf,

    /// Kill a session with the same name first.
    #[arg(short, long)]
    pub kill_existing: bool,

    /// Print the tmux commands instead of running them.
    #[arg(long)]
    pub dry_run: bool,
}

#[derive(Args, Debug, Clone, PartialEq, Eq)]
pub struct FreezeArgs {
    /// Session to capture.
    pub session: String,

    /// Output file; stdout when absent.
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Output format; guessed from the output file name when absent.
    #[arg(short, long, value_enum)]
    pub format: Option<Format>,
}

impl FreezeArgs {
    /// Explicit format, else JSON for `.json` output files, else YAML.
    pub fn document_format(&self) -> DocumentFormat {
        match (self.format, &self.output) {
            (Some(format), _) => format.into(),
            (None, Some(path)) => DocumentFormat::from_path(path),
            (None, None) => DocumentFormat::Yaml,
        }
    }
}

#[derive(Args, Debug, Clone, PartialEq, Eq)]
pub struct ConvertArgs {
    /// YAML or JSON workspace file.
    pub file: PathBuf,

    /// Output file; defaults to the input with its extension swapped.
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,
}

/// Document format accepted on the command line.
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Yaml,
    Json,
}

impl From<Format> for DocumentFormat {
    fn from(format: Format) -> Self {
        match format {
            Format::Yaml => DocumentFormat::Yaml,
            Format::Json => DocumentFormat::Json,
        }
    }
}
