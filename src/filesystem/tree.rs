use std::collections::HashSet;

use snafu::{OptionExt, ResultExt, ensure};
use tracing::{debug, info};

use crate::filesystem::error::{
    AlreadyExistsSnafu, CycleSnafu, FilesystemError, InvalidLineSnafu, InvalidNameSnafu,
    NotADirectorySnafu, NotAFileSnafu, NotFoundSnafu, RootRemovalSnafu,
};
use crate::filesystem::node::{Directory, Node, TextFile, is_valid_name};
use crate::filesystem::resolver::{NodeLocation, PathResolver};

/// What the root reports as its working directory
const ROOT_DISPLAY: &str = "root";
const PARENT_PATH: &str = "..";

/// One row of a directory listing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChildEntry {
    pub name: String,
    pub is_directory: bool,
}

/// The whole filesystem: the root directory and the current working directory.
///
/// Every operation resolves its paths against the tree as it is at call time and
/// checks everything it needs before mutating, so a failed operation leaves the
/// tree unchanged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilesystemTree {
    root: Directory,
    cursor: NodeLocation,
}

impl Default for FilesystemTree {
    fn default() -> Self {
        Self::new()
    }
}

impl FilesystemTree {
    pub fn new() -> Self {
        Self {
            root: Directory::root(),
            cursor: NodeLocation::root(),
        }
    }

    /// Builds a tree around an existing root, typically one read from a snapshot.
    ///
    /// Fails if any directory holds two children with the same name or a child
    /// whose name could not be addressed by a path.
    pub fn from_root(root: Directory) -> Result<Self, FilesystemError> {
        Self::check_directory(&root, &NodeLocation::root())?;
        debug!("Accepted root holding {} nodes", root.node_count());
        Ok(Self {
            root,
            cursor: NodeLocation::root(),
        })
    }

    pub fn root(&self) -> &Directory {
        &self.root
    }

    pub fn into_root(self) -> Directory {
        self.root
    }

    pub fn cursor(&self) -> &NodeLocation {
        &self.cursor
    }

    /// Total number of nodes, the root excluded
    pub fn node_count(&self) -> usize {
        self.root.node_count()
    }

    /// Resolves `path` relative to the current directory
    pub fn resolve(&self, path: Option<&str>) -> Result<NodeLocation, FilesystemError> {
        PathResolver::new(&self.root).resolve(path, &self.cursor)
    }

    pub fn make_directory(
        &mut self,
        name: &str,
        path: Option<&str>,
    ) -> Result<NodeLocation, FilesystemError> {
        self.insert(Node::Directory(Directory::new(name)), path)
    }

    pub fn make_file(
        &mut self,
        name: &str,
        path: Option<&str>,
    ) -> Result<NodeLocation, FilesystemError> {
        self.insert(Node::File(TextFile::new(name)), path)
    }

    /// Removes the node at `path` together with everything below it.
    ///
    /// If the current directory was inside the removed subtree it falls back to
    /// the parent of the removed node.
    pub fn remove(&mut self, path: &str) -> Result<Node, FilesystemError> {
        let target = self.resolve(Some(path))?;
        let parent = target.parent().context(RootRemovalSnafu)?;

        let removed = self.detach(&target)?;
        if self.cursor.is_within(&target) {
            debug!("Current directory was removed, moving to {}", parent);
            self.cursor = parent;
        }

        info!("Removed {} ({} nodes)", target, removed.subtree_size());
        Ok(removed)
    }

    /// Moves the node at `path` into the directory at `new_path`.
    pub fn move_node(
        &mut self,
        path: &str,
        new_path: &str,
    ) -> Result<NodeLocation, FilesystemError> {
        let source = self.resolve(Some(path))?;
        let destination = self.resolve(Some(new_path))?;
        let destination_dir = self.directory(&destination)?;

        // Also covers the root, which contains every destination.
        ensure!(
            !destination.is_within(&source),
            CycleSnafu {
                from: source.to_string(),
                to: destination.to_string(),
            }
        );
        let (Some(old_parent), Some(name)) = (source.parent(), source.name()) else {
            return CycleSnafu {
                from: source.to_string(),
                to: destination.to_string(),
            }
            .fail();
        };
        ensure!(
            old_parent == destination || !destination_dir.contains(name),
            AlreadyExistsSnafu {
                name,
                directory: destination.to_string(),
            }
        );

        let node = self.detach(&source)?;
        self.directory_mut(&destination)?.push_child(node);

        let moved_to = destination.child(name);
        if let Some(cursor) = self.cursor.rebase(&source, &moved_to) {
            debug!("Current directory moved along to {}", cursor);
            self.cursor = cursor;
        }

        info!("Moved {} to {}", source, moved_to);
        Ok(moved_to)
    }

    /// Deep-copies the node at `path` into the directory at `dest_path`.
    ///
    /// The copy shares nothing with the original. Copying a directory into one
    /// of its own descendants is fine: the subtree is cloned before it is
    /// inserted.
    pub fn copy(&mut self, path: &str, dest_path: &str) -> Result<NodeLocation, FilesystemError> {
        let source = self.resolve(Some(path))?;
        let destination = self.resolve(Some(dest_path))?;

        ensure!(
            !source.is_root(),
            InvalidNameSnafu {
                name: Directory::ROOT_NAME,
            }
        );
        let copy = self.node(&source)?.clone();
        let name = copy.name().to_string();

        let directory = self.directory_mut(&destination)?;
        ensure!(
            !directory.contains(&name),
            AlreadyExistsSnafu {
                name: name.as_str(),
                directory: destination.to_string(),
            }
        );
        let copied_nodes = copy.subtree_size();
        directory.push_child(copy);

        let copied_to = destination.child(name);
        info!("Copied {} to {} ({} nodes)", source, copied_to, copied_nodes);
        Ok(copied_to)
    }

    /// Changes the current directory. No path means the root.
    pub fn change_directory(&mut self, path: Option<&str>) -> Result<(), FilesystemError> {
        let target = match path {
            None => NodeLocation::root(),
            Some(PARENT_PATH) => self
                .cursor
                .parent()
                .context(NotFoundSnafu { path: PARENT_PATH })?,
            Some(path) => self.resolve(Some(path))?,
        };
        self.directory(&target)?;

        debug!("Changing directory to {}", target);
        self.cursor = target;
        Ok(())
    }

    /// Path of the current directory, `root` for the root itself
    pub fn where_am_i(&self) -> String {
        if self.cursor.is_root() {
            ROOT_DISPLAY.to_string()
        } else {
            self.cursor.path()
        }
    }

    pub fn list_children(&self, path: Option<&str>) -> Result<Vec<ChildEntry>, FilesystemError> {
        let location = self.resolve(path)?;
        let entries = self
            .directory(&location)?
            .children()
            .iter()
            .map(|child| ChildEntry {
                name: child.name().to_string(),
                is_directory: child.is_directory(),
            })
            .collect();
        Ok(entries)
    }

    pub fn read_file(&self, path: &str) -> Result<String, FilesystemError> {
        let location = self.resolve(Some(path))?;
        Ok(self.file(&location)?.read())
    }

    /// Resolves `path` and makes sure it is a text file
    pub fn check_file(&self, path: &str) -> Result<NodeLocation, FilesystemError> {
        let location = self.resolve(Some(path))?;
        self.file(&location)?;
        Ok(location)
    }

    /// Makes sure `line` can be edited in the file at `path`
    pub fn check_line(&self, path: &str, line: usize) -> Result<(), FilesystemError> {
        let location = self.resolve(Some(path))?;
        self.file(&location)?
            .check_line(line)
            .context(InvalidLineSnafu {
                path: location.to_string(),
            })
    }

    /// Appends every line of `lines` to the file, returning how many were added.
    pub fn append_lines<I, S>(&mut self, path: &str, lines: I) -> Result<usize, FilesystemError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let location = self.resolve(Some(path))?;
        let file = self.file_mut(&location)?;
        let before = file.line_count();
        for line in lines {
            file.append_line(line);
        }

        let appended = file.line_count() - before;
        debug!("Appended {} lines to {}", appended, location);
        Ok(appended)
    }

    pub fn extend_last_line(&mut self, path: &str, text: &str) -> Result<(), FilesystemError> {
        let location = self.resolve(Some(path))?;
        self.file_mut(&location)?.write_extend(text);
        Ok(())
    }

    pub fn edit_line(
        &mut self,
        path: &str,
        line: usize,
        text: impl Into<String>,
    ) -> Result<(), FilesystemError> {
        let location = self.resolve(Some(path))?;
        self.file_mut(&location)?
            .edit_line(line, text)
            .context(InvalidLineSnafu {
                path: location.to_string(),
            })
    }

    /// Deletes a line and returns what it contained
    pub fn delete_line(&mut self, path: &str, line: usize) -> Result<String, FilesystemError> {
        let location = self.resolve(Some(path))?;
        self.file_mut(&location)?
            .delete_line(line)
            .context(InvalidLineSnafu {
                path: location.to_string(),
            })
    }

    fn insert(&mut self, node: Node, path: Option<&str>) -> Result<NodeLocation, FilesystemError> {
        let name = node.name().to_string();
        ensure!(is_valid_name(&name), InvalidNameSnafu { name });

        let target = self.resolve(path)?;
        let directory = self.directory_mut(&target)?;
        ensure!(
            !directory.contains(&name),
            AlreadyExistsSnafu {
                name: name.as_str(),
                directory: target.to_string(),
            }
        );
        directory.push_child(node);

        let location = target.child(name);
        debug!("Created {}", location);
        Ok(location)
    }

    fn detach(&mut self, location: &NodeLocation) -> Result<Node, FilesystemError> {
        let (Some(parent), Some(name)) = (location.parent(), location.name()) else {
            return RootRemovalSnafu.fail();
        };
        self.directory_mut(&parent)?
            .take_child(name)
            .context(NotFoundSnafu {
                path: location.to_string(),
            })
    }

    fn node(&self, location: &NodeLocation) -> Result<&Node, FilesystemError> {
        let not_found = || NotFoundSnafu {
            path: location.to_string(),
        };
        let parent = location.parent().with_context(not_found)?;
        let name = location.name().with_context(not_found)?;
        self.directory(&parent)?.child(name).with_context(not_found)
    }

    fn directory(&self, location: &NodeLocation) -> Result<&Directory, FilesystemError> {
        let mut current = &self.root;
        for segment in location.segments() {
            current = match current.child(segment) {
                Some(Node::Directory(directory)) => directory,
                Some(Node::File(_)) => {
                    return NotADirectorySnafu {
                        path: location.to_string(),
                    }
                    .fail();
                }
                None => {
                    return NotFoundSnafu {
                        path: location.to_string(),
                    }
                    .fail();
                }
            };
        }
        Ok(current)
    }

    fn directory_mut(&mut self, location: &NodeLocation) -> Result<&mut Directory, FilesystemError> {
        let mut current = &mut self.root;
        for segment in location.segments() {
            current = match current.child_mut(segment) {
                Some(Node::Directory(directory)) => directory,
                Some(Node::File(_)) => {
                    return NotADirectorySnafu {
                        path: location.to_string(),
                    }
                    .fail();
                }
                None => {
                    return NotFoundSnafu {
                        path: location.to_string(),
                    }
                    .fail();
                }
            };
        }
        Ok(current)
    }

    fn file(&self, location: &NodeLocation) -> Result<&TextFile, FilesystemError> {
        if location.is_root() {
            return NotAFileSnafu {
                path: location.to_string(),
            }
            .fail();
        }
        self.node(location)?.as_file().context(NotAFileSnafu {
            path: location.to_string(),
        })
    }

    fn file_mut(&mut self, location: &NodeLocation) -> Result<&mut TextFile, FilesystemError> {
        let (Some(parent), Some(name)) = (location.parent(), location.name()) else {
            return NotAFileSnafu {
                path: location.to_string(),
            }
            .fail();
        };
        match self.directory_mut(&parent)?.child_mut(name) {
            Some(Node::File(file)) => Ok(file),
            Some(Node::Directory(_)) => NotAFileSnafu {
                path: location.to_string(),
            }
            .fail(),
            None => NotFoundSnafu {
                path: location.to_string(),
            }
            .fail(),
        }
    }

    fn check_directory(
        directory: &Directory,
        location: &NodeLocation,
    ) -> Result<(), FilesystemError> {
        let mut seen = HashSet::new();
        for child in directory.children() {
            let name = child.name();
            ensure!(is_valid_name(name), InvalidNameSnafu { name });
            ensure!(
                seen.insert(name),
                AlreadyExistsSnafu {
                    name,
                    directory: location.to_string(),
                }
            );
            if let Node::Directory(subdirectory) = child {
                Self::check_directory(subdirectory, &location.child(name))?;
            }
        }
        Ok(())
    }
}
