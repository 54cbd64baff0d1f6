//! Interactive channels that drive a funnel outside the HTTP server.

pub mod cli;

pub use cli::{Command, TerminalSession};
