//! In-memory filesystem tree made of directories and text files.
//!
//! Directories own their children by value, so dropping a directory drops its
//! whole subtree. Nodes are addressed by [`NodeLocation`](resolver::NodeLocation)s
//! produced by the [`PathResolver`](resolver::PathResolver), and all mutation goes
//! through [`FilesystemTree`].

mod error;
mod node;
mod resolver;
mod tree;

pub use error::FilesystemError;
pub use node::Directory;
pub use tree::{ChildEntry, FilesystemTree};
