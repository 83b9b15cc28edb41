//! Declarative tmux workspaces.
//!
//! A workspace document names a session, its windows, and their panes. This
//! crate normalizes such documents ([`expand`], [`trickle`], [`validate`]),
//! replays them against a multiplexer through the [`control::ControlPlane`]
//! trait ([`builder`]), and captures a running session back into a document
//! ([`freezer`]). It does not render anything or own any terminal, so every
//! stage can be tested against [`memory::InMemoryControlPlane`].

pub mod builder;
pub mod command;
pub mod config;
pub mod control;
pub mod document;
pub mod environment;
pub mod error;
pub mod expand;
pub mod format;
pub mod freezer;
pub mod memory;
pub mod pane;
pub mod plugin;
pub mod session;
pub mod tmux;
pub mod trickle;
pub mod validate;
pub mod window;

pub use builder::{BuildOptions, build_workspace};
pub use config::{PaneConfig, WindowConfig, WorkspaceConfig};
pub use error::{WorkspaceError, WorkspaceResult};
pub use freezer::freeze_session;
