//! Line-oriented command shell driving the filesystem tree.

mod command;
mod command_registry;
mod listing;
#[allow(clippy::module_inception)]
mod shell;

pub use shell::{DEFAULT_TERMINATOR, Shell, ShellConfig, ShellError};
