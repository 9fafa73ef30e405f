use std::hash::Hasher;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use compio::fs;
use metrohash::MetroHash64;
use snafu::{ResultExt, Snafu, ensure};
use tracing::{debug, info};

use crate::ext::BestEffortPathExt;
use crate::filesystem::Directory;

const STANDARD_SNAPSHOT_FILE_PATH: &str = ".vfsh/tree.snapshot";

const MAGIC: &[u8; 4] = b"VFSH";
const FORMAT_VERSION: u8 = 1;
const CHECKSUM_LEN: usize = 8;
const HEADER_LEN: usize = MAGIC.len() + 1 + CHECKSUM_LEN;
const COMPRESSION_LEVEL: i32 = 3;

pub fn get_standard_snapshot_file_path() -> PathBuf {
    PathBuf::from(STANDARD_SNAPSHOT_FILE_PATH)
}

/// Reads and writes the single file holding the whole tree between sessions.
///
/// Layout: `VFSH`, a format version byte, the MetroHash64 of the payload
/// (little endian), then the payload itself: the root directory encoded with
/// bincode and compressed with zstd.
#[derive(Debug, Clone)]
pub struct SnapshotStore {
    path: PathBuf,
}

impl SnapshotStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads the persisted root, or `None` when nothing was saved yet.
    pub async fn load(&self) -> Result<Option<Directory>, SnapshotError> {
        debug!(
            "Reading snapshot from {}",
            self.path.best_effort_path_display()
        );
        let bytes = match fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(error) if error.kind() == ErrorKind::NotFound => {
                info!("No existing snapshot found, starting fresh");
                return Ok(None);
            }
            Err(error) => {
                return Err(error).context(ReadSnafu {
                    file_path: self.path.best_effort_path_display(),
                });
            }
        };

        let root = decode_snapshot(&bytes)?;
        info!(
            "Loaded snapshot with {} nodes ({} bytes)",
            root.node_count(),
            bytes.len()
        );
        Ok(Some(root))
    }

    /// Replaces the snapshot file with the given tree
    pub async fn save(&self, root: &Directory) -> Result<(), SnapshotError> {
        let bytes = encode_snapshot(root)?;

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).await.context(CreateDirSnafu {
                    dir_path: parent.best_effort_path_display(),
                })?;
            }
        }

        let written = bytes.len();
        fs::write(&self.path, bytes).await.0.context(WriteSnafu {
            file_path: self.path.best_effort_path_display(),
        })?;
        info!(
            "Saved snapshot with {} nodes ({} bytes) to {}",
            root.node_count(),
            written,
            self.path.best_effort_path_display()
        );
        Ok(())
    }
}

pub fn encode_snapshot(root: &Directory) -> Result<Vec<u8>, SnapshotError> {
    let encoded = bincode::encode_to_vec(root, bincode::config::standard()).context(EncodeSnafu)?;
    let payload = zstd::encode_all(encoded.as_slice(), COMPRESSION_LEVEL).context(CompressSnafu)?;

    let mut bytes = Vec::with_capacity(HEADER_LEN + payload.len());
    bytes.extend_from_slice(MAGIC);
    bytes.push(FORMAT_VERSION);
    bytes.extend_from_slice(&checksum(&payload).to_le_bytes());
    bytes.extend_from_slice(&payload);
    Ok(bytes)
}

pub fn decode_snapshot(bytes: &[u8]) -> Result<Directory, SnapshotError> {
    ensure!(
        bytes.len() >= HEADER_LEN,
        TruncatedSnafu {
            length: bytes.len()
        }
    );
    let (magic, rest) = bytes.split_at(MAGIC.len());
    ensure!(magic == MAGIC, BadMagicSnafu);

    let (version, rest) = rest.split_at(1);
    let version = version[0];
    ensure!(version == FORMAT_VERSION, UnsupportedVersionSnafu { version });

    let (checksum_bytes, payload) = rest.split_at(CHECKSUM_LEN);
    let mut expected = [0u8; CHECKSUM_LEN];
    expected.copy_from_slice(checksum_bytes);
    let expected = u64::from_le_bytes(expected);
    let actual = checksum(payload);
    ensure!(expected == actual, ChecksumMismatchSnafu { expected, actual });

    let encoded = zstd::decode_all(payload).context(DecompressSnafu)?;
    let (root, _) = bincode::decode_from_slice::<Directory, _>(&encoded, bincode::config::standard())
        .context(DecodeSnafu)?;
    Ok(root)
}

fn checksum(payload: &[u8]) -> u64 {
    let mut hasher = MetroHash64::default();
    hasher.write(payload);
    hasher.finish()
}

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum SnapshotError {
    #[snafu(display("Failed to read the snapshot file: {}", file_path))]
    ReadError {
        file_path: String,
        source: std::io::Error,
    },
    #[snafu(display("Failed to create the snapshot directory: {}", dir_path))]
    CreateDirError {
        dir_path: String,
        source: std::io::Error,
    },
    #[snafu(display("Failed to write the snapshot file: {}", file_path))]
    WriteError {
        file_path: String,
        source: std::io::Error,
    },
    #[snafu(display("Snapshot is truncated ({} bytes)", length))]
    TruncatedError { length: usize },
    #[snafu(display("File is not a snapshot"))]
    BadMagicError,
    #[snafu(display("Unsupported snapshot format version {}", version))]
    UnsupportedVersionError { version: u8 },
    #[snafu(display(
        "Snapshot checksum mismatch (expected {:016x}, got {:016x}), the file is corrupted",
        expected,
        actual
    ))]
    ChecksumMismatchError { expected: u64, actual: u64 },
    #[snafu(display("Failed to compress the snapshot"))]
    CompressError { source: std::io::Error },
    #[snafu(display("Failed to decompress the snapshot"))]
    DecompressError { source: std::io::Error },
    #[snafu(display("Failed to encode the tree"))]
    EncodeError { source: bincode::error::EncodeError },
    #[snafu(display("Failed to decode the tree"))]
    DecodeError { source: bincode::error::DecodeError },
}
