//! DKN CLI - terminal front end for the knowledge platform
//!
//! - [`cli`]: the `dkn` command tree
//! - [`app`]: hydration, access checks and command execution
//! - [`render`]: plain-text views of records and status lines
//!
//! The binary only parses arguments, sets up logging and prints what
//! [`app::run`] returns, so every command can be driven from tests with a
//! scripted client.

#![warn(unreachable_pub)]

pub mod app;
pub mod cli;
pub mod render;

pub use app::{load_config, parse_id, run, App, SESSION_EXPIRED};
pub use cli::command;

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
