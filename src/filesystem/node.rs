use bincode::{Decode, Encode};
use derive_more::IsVariant;

use crate::filesystem::error::LineOutOfRangeError;

/// A single entry of the tree: either a directory or a text file.
///
/// A node is owned by exactly one parent directory. There is no pointer back to
/// the parent; the parent of a node is the prefix of its
/// [`NodeLocation`](crate::filesystem::resolver::NodeLocation).
#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode, IsVariant)]
pub enum Node {
    Directory(Directory),
    File(TextFile),
}

impl Node {
    pub fn name(&self) -> &str {
        match self {
            Node::Directory(directory) => directory.name(),
            Node::File(file) => file.name(),
        }
    }

    pub fn as_file(&self) -> Option<&TextFile> {
        match self {
            Node::File(file) => Some(file),
            Node::Directory(_) => None,
        }
    }

    /// Number of nodes in this subtree, the node itself included
    pub fn subtree_size(&self) -> usize {
        match self {
            Node::Directory(directory) => 1 + directory.node_count(),
            Node::File(_) => 1,
        }
    }
}

/// Returns whether `name` can be used for a node.
///
/// Names must stay addressable by a path, so they cannot be empty, contain a
/// separator, or shadow the `.`/`..` segments.
pub fn is_valid_name(name: &str) -> bool {
    !name.is_empty() && !name.contains('/') && name != "." && name != ".."
}

#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode)]
pub struct Directory {
    name: String,
    children: Vec<Node>,
}

impl Directory {
    pub const ROOT_NAME: &'static str = "/";

    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            children: Vec::new(),
        }
    }

    pub fn root() -> Self {
        Self::new(Self::ROOT_NAME)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Children in insertion order
    pub fn children(&self) -> &[Node] {
        &self.children
    }

    pub fn child(&self, name: &str) -> Option<&Node> {
        self.children.iter().find(|child| child.name() == name)
    }

    pub fn child_mut(&mut self, name: &str) -> Option<&mut Node> {
        self.children.iter_mut().find(|child| child.name() == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.child(name).is_some()
    }

    /// Number of nodes below this directory
    pub fn node_count(&self) -> usize {
        self.children.iter().map(Node::subtree_size).sum()
    }

    pub(crate) fn push_child(&mut self, node: Node) {
        self.children.push(node);
    }

    /// Detaches the named child, keeping the order of its siblings.
    pub(crate) fn take_child(&mut self, name: &str) -> Option<Node> {
        let index = self.children.iter().position(|child| child.name() == name)?;
        Some(self.children.remove(index))
    }
}

/// A text file stored as a sequence of lines.
///
/// Line numbers taken by the editing methods are 1-indexed.
#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode)]
pub struct TextFile {
    name: String,
    lines: Vec<String>,
}

impl TextFile {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            lines: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    pub fn read(&self) -> String {
        self.lines.join("\n")
    }

    pub fn append_line(&mut self, text: impl Into<String>) {
        self.lines.push(text.into());
    }

    /// Continues the last line with `text`. An empty file gets `text` as its first line.
    pub fn write_extend(&mut self, text: &str) {
        match self.lines.last_mut() {
            Some(last) => last.push_str(text),
            None => self.lines.push(text.to_string()),
        }
    }

    pub fn edit_line(
        &mut self,
        line: usize,
        text: impl Into<String>,
    ) -> Result<(), LineOutOfRangeError> {
        let index = self.index_of(line)?;
        self.lines[index] = text.into();
        Ok(())
    }

    /// Removes a line and returns its previous contents
    pub fn delete_line(&mut self, line: usize) -> Result<String, LineOutOfRangeError> {
        let index = self.index_of(line)?;
        Ok(self.lines.remove(index))
    }

    pub fn check_line(&self, line: usize) -> Result<(), LineOutOfRangeError> {
        self.index_of(line).map(|_| ())
    }

    fn index_of(&self, line: usize) -> Result<usize, LineOutOfRangeError> {
        if line == 0 || line > self.lines.len() {
            return Err(LineOutOfRangeError {
                line,
                line_count: self.lines.len(),
            });
        }
        Ok(line - 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::*;

    fn file_with(lines: &[&str]) -> TextFile {
        let mut file = TextFile::new("note.txt");
        for line in lines {
            file.append_line(*line);
        }
        file
    }

    #[test]
    fn read_joins_lines_with_newlines() {
        assert_eq!(file_with(&["a", "b", "c"]).read(), "a\nb\nc");
        assert_eq!(TextFile::new("empty").read(), "");
    }

    #[test]
    fn write_extend_continues_last_line() {
        let mut file = file_with(&["first", "sec"]);
        file.write_extend("ond");
        assert_eq!(file.lines(), ["first", "second"]);
    }

    #[test]
    fn write_extend_on_empty_file_starts_a_line() {
        let mut file = TextFile::new("empty");
        file.write_extend("hello");
        assert_eq!(file.lines(), ["hello"]);
    }

    #[test]
    fn edit_line_replaces_only_that_line() {
        let mut file = file_with(&["a", "b", "c"]);
        file.edit_line(2, "x").unwrap();
        assert_eq!(file.lines(), ["a", "x", "c"]);
    }

    #[test]
    fn edit_line_is_idempotent() {
        let mut file = file_with(&["a", "b"]);
        file.edit_line(1, "z").unwrap();
        let once = file.clone();
        file.edit_line(1, "z").unwrap();
        assert_eq!(file, once);
    }

    #[test]
    fn delete_line_shifts_following_lines_up() {
        let mut file = file_with(&["a", "b", "c"]);
        assert_eq!(file.delete_line(1).unwrap(), "a");
        assert_eq!(file.lines(), ["b", "c"]);
    }

    #[rstest]
    #[case(0)]
    #[case(4)]
    #[case(100)]
    fn line_operations_reject_out_of_range_lines(#[case] line: usize) {
        let mut file = file_with(&["a", "b", "c"]);
        let expected = LineOutOfRangeError {
            line,
            line_count: 3,
        };

        assert_eq!(file.edit_line(line, "x"), Err(expected));
        assert_eq!(
            file.delete_line(line),
            Err(LineOutOfRangeError {
                line,
                line_count: 3
            })
        );
        assert_eq!(file.lines(), ["a", "b", "c"]);
    }

    #[test]
    fn line_operations_on_empty_file_always_fail() {
        let mut file = TextFile::new("empty");
        assert!(file.edit_line(1, "x").is_err());
        assert!(file.delete_line(1).is_err());
    }

    #[rstest]
    #[case("notes", true)]
    #[case("file.txt", true)]
    #[case("...", true)]
    #[case("", false)]
    #[case(".", false)]
    #[case("..", false)]
    #[case("a/b", false)]
    fn name_validation(#[case] name: &str, #[case] valid: bool) {
        assert_eq!(is_valid_name(name), valid);
    }

    #[test]
    fn node_count_includes_nested_nodes() {
        let mut inner = Directory::new("inner");
        inner.push_child(Node::File(TextFile::new("a.txt")));
        let mut root = Directory::root();
        root.push_child(Node::Directory(inner));
        root.push_child(Node::File(TextFile::new("b.txt")));

        assert_eq!(root.node_count(), 3);
        assert!(root.child("inner").unwrap().is_directory());
        assert!(root.child("b.txt").unwrap().is_file());
    }

    #[test]
    fn take_child_keeps_sibling_order() {
        let mut root = Directory::root();
        for name in ["a", "b", "c"] {
            root.push_child(Node::Directory(Directory::new(name)));
        }

        let taken = root.take_child("b").unwrap();

        assert_eq!(taken.name(), "b");
        let names: Vec<_> = root.children().iter().map(Node::name).collect();
        assert_eq!(names, ["a", "c"]);
        assert!(root.take_child("b").is_none());
    }
}
