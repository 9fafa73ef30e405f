use std::path::PathBuf;

use crate::cli::Cli;
use crate::shell::ShellConfig;

#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    pub snapshot_path: PathBuf,
    /// Skip reading and writing the snapshot entirely
    pub ephemeral: bool,
    pub shell: ShellConfig,
}

impl From<Cli> for RuntimeConfig {
    fn from(cli: Cli) -> Self {
        Self {
            snapshot_path: cli.snapshot,
            ephemeral: cli.ephemeral,
            shell: ShellConfig {
                terminator: cli.terminator,
                color: cli.color.enabled(),
            },
        }
    }
}
