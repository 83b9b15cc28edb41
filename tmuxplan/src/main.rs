//! Declarative tmux workspaces from the command line.

use std::error::Error;
use std::io::{self, Write};
use std::process;

use clap::Parser;
use log::LevelFilter;

use tmuxplan_workspace::environment::ProcessEnvironment;
use tmuxplan_workspace::tmux::TmuxServer;

mod cli;
mod commands;

use crate::cli::{Command, Options};

fn main() {
    let options = Options::parse();
    init_logging(options.log_level());

    if let Err(err) = run(options) {
        eprintln!("tmuxplan: {err}");
        process::exit(1);
    }
}

fn run(options: Options) -> Result<(), Box<dyn Error>> {
    let mut stdout = io::stdout().lock();
    let env = ProcessEnvironment;
    let mut server = TmuxServer::new(options.tmux.options());

    match &options.command {
        Command::Load(args) if args.dry_run => commands::dry_run(args, &env, &mut stdout),
        Command::Load(args) => commands::load(&mut server, args, &env, &mut stdout),
        Command::Freeze(args) => commands::freeze(&mut server, args, &mut stdout),
        Command::Ls => commands::list(&mut server, &mut stdout),
        Command::Convert(args) => commands::convert(args, &mut stdout),
    }?;

    stdout.flush()?;
    Ok(())
}

/// Log to stderr at `level`; `RUST_LOG` takes precedence when set.
fn init_logging(level: LevelFilter) {
    let mut builder = env_logger::Builder::new();
    builder.filter_level(level).format_timestamp(None);
    if let Ok(filters) = std::env::var("RUST_LOG") {
        builder.parse_filters(&filters);
    }
    let _ = builder.try_init();
}
