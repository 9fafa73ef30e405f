use snafu::Snafu;
use snafu::prelude::*;
use tracing::debug;
use tracing::info;
use tracing::warn;

use crate::application::RuntimeConfig;
use crate::ext::BestEffortPathExt;
use crate::filesystem::FilesystemError;
use crate::filesystem::FilesystemTree;
use crate::shell::Shell;
use crate::shell::ShellError;
use crate::snapshot::SnapshotError;
use crate::snapshot::SnapshotStore;

pub struct Application;

impl Application {
    pub async fn run(runtime_config: impl Into<RuntimeConfig>) -> Result<(), ApplicationError> {
        let runtime_config: RuntimeConfig = runtime_config.into();
        debug!("Runtime config: {:?}", runtime_config);
        colored::control::set_override(runtime_config.shell.color);

        let store = SnapshotStore::new(&runtime_config.snapshot_path);
        let tree = Self::load_tree(&store, runtime_config.ephemeral).await?;

        let stdin = std::io::stdin().lock();
        let stdout = std::io::stdout().lock();
        let (tree, outcome) = Shell::new(tree, runtime_config.shell, stdin, stdout).run();
        if let Err(error) = &outcome {
            warn!("Shell stopped early: {}", error);
        }

        Self::save_tree(&store, tree, runtime_config.ephemeral).await?;
        outcome.context(ShellSnafu)
    }

    async fn save_tree(
        store: &SnapshotStore,
        tree: FilesystemTree,
        ephemeral: bool,
    ) -> Result<(), ApplicationError> {
        if ephemeral {
            info!("Ephemeral session, the tree is not saved");
            return Ok(());
        }

        let root = tree.into_root();
        store.save(&root).await.context(SnapshotSaveSnafu)
    }

    async fn load_tree(
        store: &SnapshotStore,
        ephemeral: bool,
    ) -> Result<FilesystemTree, ApplicationError> {
        if ephemeral {
            info!("Ephemeral session, starting with an empty tree");
            return Ok(FilesystemTree::new());
        }

        match store.load().await.context(SnapshotLoadSnafu)? {
            Some(root) => FilesystemTree::from_root(root).context(InconsistentSnapshotSnafu {
                file_path: store.path().best_effort_path_display(),
            }),
            None => Ok(FilesystemTree::new()),
        }
    }
}

#[derive(Debug, Snafu)]
pub enum ApplicationError {
    #[snafu(display("Critical failure encountered while loading the snapshot"))]
    SnapshotLoadError { source: SnapshotError },
    #[snafu(display("Snapshot {} holds an inconsistent tree", file_path))]
    InconsistentSnapshotError {
        file_path: String,
        source: FilesystemError,
    },
    #[snafu(display("Critical failure encountered in the shell"))]
    ShellError { source: ShellError },
    #[snafu(display("Critical failure encountered while saving the snapshot"))]
    SnapshotSaveError { source: SnapshotError },
}
