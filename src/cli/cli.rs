use std::path::PathBuf;

use clap::Parser;

use crate::application::data::{ColorChoice, LogLevel};
use crate::shell::DEFAULT_TERMINATOR;
use crate::snapshot::get_standard_snapshot_file_path;

/// Interactive shell over an in-memory tree of directories and text files
#[derive(Parser, Debug, Clone)]
#[command(version)]
pub struct Cli {
    #[clap(long, short, default_value = "warn", value_enum)]
    pub log_level: LogLevel,

    /// File the tree is loaded from on start and saved to on exit
    #[clap(long, short, default_value_os_t = get_standard_snapshot_file_path())]
    pub snapshot: PathBuf,

    /// Start from an empty tree and discard it on exit
    #[clap(long, short)]
    pub ephemeral: bool,

    /// Line that ends the text entered after `appendtxt`
    #[clap(long, short, default_value = DEFAULT_TERMINATOR)]
    pub terminator: String,

    #[clap(long, default_value = "auto", value_enum)]
    pub color: ColorChoice,
}
