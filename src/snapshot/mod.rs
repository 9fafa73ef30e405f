mod snapshot_store;

pub use snapshot_store::{SnapshotError, SnapshotStore, get_standard_snapshot_file_path};
