use std::fmt;

use tracing::debug;

use crate::filesystem::error::{FilesystemError, NotADirectorySnafu, NotFoundSnafu};
use crate::filesystem::node::{Directory, Node};

const SEPARATOR: char = '/';
const PARENT_SEGMENT: &str = "..";

/// Position of a node in the tree, as the names leading to it from the root.
///
/// The location is the only link between a node and its parent: the parent of
/// `/a/b` is `/a`. Locations are never cached inside nodes, so a path computed
/// from a location always matches the current shape of the tree.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct NodeLocation {
    segments: Vec<String>,
}

impl NodeLocation {
    pub fn root() -> Self {
        Self::default()
    }

    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// Name of the node this location points to, `None` for the root
    pub fn name(&self) -> Option<&str> {
        self.segments.last().map(String::as_str)
    }

    pub fn parent(&self) -> Option<NodeLocation> {
        let (_, parent) = self.segments.split_last()?;
        Some(Self {
            segments: parent.to_vec(),
        })
    }

    pub fn child(&self, name: impl Into<String>) -> NodeLocation {
        let mut segments = self.segments.clone();
        segments.push(name.into());
        Self { segments }
    }

    /// Returns whether `self` is `ancestor` or lies somewhere below it.
    pub fn is_within(&self, ancestor: &NodeLocation) -> bool {
        self.segments.starts_with(&ancestor.segments)
    }

    /// Absolute path of the location. The root has an empty path.
    pub fn path(&self) -> String {
        self.segments
            .iter()
            .fold(String::new(), |mut path, segment| {
                path.push(SEPARATOR);
                path.push_str(segment);
                path
            })
    }

    /// Moves the part of `self` below `from` so that it lies below `to` instead.
    pub(crate) fn rebase(&self, from: &NodeLocation, to: &NodeLocation) -> Option<NodeLocation> {
        let rest = self.segments.strip_prefix(from.segments.as_slice())?;
        let mut segments = to.segments.clone();
        segments.extend(rest.iter().cloned());
        Some(Self { segments })
    }
}

impl fmt::Display for NodeLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_root() {
            write!(f, "{SEPARATOR}")
        } else {
            write!(f, "{}", self.path())
        }
    }
}

/// Walks path expressions over a tree.
///
/// Only `..` is treated specially. Every other segment must be the name of a
/// child of the current directory, matched in insertion order.
pub struct PathResolver<'a> {
    root: &'a Directory,
}

impl<'a> PathResolver<'a> {
    pub fn new(root: &'a Directory) -> Self {
        Self { root }
    }

    /// Resolves `path` starting at the directory `start`.
    ///
    /// An absent or empty path resolves to `start` itself, absolute paths ignore
    /// `start` entirely. Fails with `NotFoundError` when a segment does not match
    /// or when `..` is applied to the root.
    pub fn resolve(
        &self,
        path: Option<&str>,
        start: &NodeLocation,
    ) -> Result<NodeLocation, FilesystemError> {
        let path = match path {
            Some(path) if !path.is_empty() => path,
            _ => return Ok(start.clone()),
        };

        let (mut location, mut trail) = if path.starts_with(SEPARATOR) {
            (NodeLocation::root(), vec![self.root])
        } else {
            (start.clone(), self.trail_to(start)?)
        };
        // Set while the walk stands on a file: files are not pushed onto the trail.
        let mut at_file = false;

        for segment in path.split(SEPARATOR).filter(|segment| !segment.is_empty()) {
            if segment == PARENT_SEGMENT {
                if location.segments.pop().is_none() {
                    return NotFoundSnafu { path }.fail();
                }
                if at_file {
                    at_file = false;
                } else {
                    trail.pop();
                }
                continue;
            }

            let current = match trail.last() {
                Some(current) if !at_file => *current,
                _ => return NotFoundSnafu { path }.fail(),
            };
            match current.child(segment) {
                Some(Node::Directory(directory)) => trail.push(directory),
                Some(Node::File(_)) => at_file = true,
                None => return NotFoundSnafu { path }.fail(),
            }
            location.segments.push(segment.to_string());
        }

        debug!("Resolved '{}' to {}", path, location);
        Ok(location)
    }

    /// Directories from the root down to `location`, both ends included.
    fn trail_to(&self, location: &NodeLocation) -> Result<Vec<&'a Directory>, FilesystemError> {
        let mut trail = Vec::with_capacity(location.segments.len() + 1);
        let mut current = self.root;
        trail.push(current);

        for segment in &location.segments {
            current = match current.child(segment) {
                Some(Node::Directory(directory)) => directory,
                Some(Node::File(_)) => {
                    return NotADirectorySnafu {
                        path: location.path(),
                    }
                    .fail();
                }
                None => {
                    return NotFoundSnafu {
                        path: location.path(),
                    }
                    .fail();
                }
            };
            trail.push(current);
        }

        Ok(trail)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filesystem::node::TextFile;
    use rstest::*;

    /// /pictures/camera, /pictures/screenshots/shot.png, /documents, /readme.txt
    #[fixture]
    fn sample_root() -> Directory {
        let mut screenshots = Directory::new("screenshots");
        screenshots.push_child(Node::File(TextFile::new("shot.png")));

        let mut pictures = Directory::new("pictures");
        pictures.push_child(Node::Directory(Directory::new("camera")));
        pictures.push_child(Node::Directory(screenshots));

        let mut root = Directory::root();
        root.push_child(Node::Directory(pictures));
        root.push_child(Node::Directory(Directory::new("documents")));
        root.push_child(Node::File(TextFile::new("readme.txt")));
        root
    }

    fn location(path: &str) -> NodeLocation {
        NodeLocation {
            segments: path
                .split('/')
                .filter(|segment| !segment.is_empty())
                .map(str::to_string)
                .collect(),
        }
    }

    #[rstest]
    #[case(None, "/pictures", "/pictures")]
    #[case(Some(""), "/pictures", "/pictures")]
    #[case(Some("/"), "/pictures/camera", "/")]
    #[case(Some("camera"), "/pictures", "/pictures/camera")]
    #[case(Some("camera/"), "/pictures", "/pictures/camera")]
    #[case(Some(".."), "/pictures/camera", "/pictures")]
    #[case(Some("../screenshots/shot.png"), "/pictures/camera", "/pictures/screenshots/shot.png")]
    #[case(Some("../../documents"), "/pictures/camera", "/documents")]
    #[case(Some("/pictures//camera"), "/", "/pictures/camera")]
    #[case(Some("readme.txt/.."), "/", "/")]
    fn resolves_paths(
        sample_root: Directory,
        #[case] path: Option<&str>,
        #[case] start: &str,
        #[case] expected: &str,
    ) {
        let resolver = PathResolver::new(&sample_root);
        let resolved = resolver.resolve(path, &location(start)).unwrap();
        assert_eq!(resolved, location(expected));
    }

    #[rstest]
    #[case("/pictures/camera")]
    #[case("/documents")]
    #[case("/pictures/screenshots/shot.png")]
    fn absolute_paths_ignore_the_start(sample_root: Directory, #[case] path: &str) {
        let resolver = PathResolver::new(&sample_root);
        let from_root = resolver.resolve(Some(path), &NodeLocation::root()).unwrap();

        for start in ["/pictures", "/pictures/camera", "/documents"] {
            let resolved = resolver.resolve(Some(path), &location(start)).unwrap();
            assert_eq!(resolved, from_root);
        }
    }

    #[rstest]
    #[case("missing", "/")]
    #[case("/pictures/missing", "/documents")]
    #[case("..", "/")]
    #[case("../..", "/pictures")]
    #[case("readme.txt/anything", "/")]
    #[case(".", "/")]
    #[case("Pictures", "/")]
    fn unresolvable_paths_are_not_found(
        sample_root: Directory,
        #[case] path: &str,
        #[case] start: &str,
    ) {
        let resolver = PathResolver::new(&sample_root);
        let result = resolver.resolve(Some(path), &location(start));
        assert!(matches!(
            result,
            Err(FilesystemError::NotFoundError { .. })
        ));
    }

    #[rstest]
    fn parent_of_non_root_is_its_parent(sample_root: Directory) {
        let resolver = PathResolver::new(&sample_root);
        let start = location("/pictures/screenshots");
        let resolved = resolver.resolve(Some(".."), &start).unwrap();
        assert_eq!(Some(resolved), start.parent());
    }

    #[rstest]
    fn start_inside_a_file_is_rejected(sample_root: Directory) {
        let resolver = PathResolver::new(&sample_root);
        let result = resolver.resolve(Some("x"), &location("/readme.txt"));
        assert!(matches!(
            result,
            Err(FilesystemError::NotADirectoryError { .. })
        ));
    }

    #[test]
    fn location_paths() {
        assert_eq!(NodeLocation::root().path(), "");
        assert_eq!(NodeLocation::root().to_string(), "/");
        assert_eq!(location("/a/b").path(), "/a/b");
        assert_eq!(location("/a/b").name(), Some("b"));
        assert_eq!(location("/a/b").parent(), Some(location("/a")));
        assert_eq!(NodeLocation::root().parent(), None);
    }

    #[test]
    fn location_containment_and_rebase() {
        let moved = location("/a/b");
        assert!(location("/a/b/c").is_within(&moved));
        assert!(moved.is_within(&moved));
        assert!(!location("/a/bc").is_within(&moved));
        assert!(moved.is_within(&NodeLocation::root()));

        let rebased = location("/a/b/c").rebase(&moved, &location("/x/b"));
        assert_eq!(rebased, Some(location("/x/b/c")));
        assert_eq!(location("/d").rebase(&moved, &location("/x")), None);
    }
}
