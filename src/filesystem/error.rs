use snafu::Snafu;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum FilesystemError {
    #[snafu(display("No such file or directory: '{}'", path))]
    NotFoundError { path: String },
    #[snafu(display("'{}' is not a directory", path))]
    NotADirectoryError { path: String },
    #[snafu(display("'{}' is not a file", path))]
    NotAFileError { path: String },
    #[snafu(display("Invalid line for '{}'", path))]
    InvalidLineError {
        path: String,
        source: LineOutOfRangeError,
    },
    #[snafu(display("The root directory cannot be removed"))]
    RootRemovalError,
    #[snafu(display("Cannot move '{}' into '{}', which lies inside it", from, to))]
    CycleError { from: String, to: String },
    #[snafu(display("'{}' already exists in '{}'", name, directory))]
    AlreadyExistsError { name: String, directory: String },
    #[snafu(display("'{}' is not a valid name", name))]
    InvalidNameError { name: String },
}

/// A 1-indexed line number that falls outside of a file's lines.
#[derive(Debug, Snafu, PartialEq, Eq)]
#[snafu(display("line {} is out of range, the file has {} line(s)", line, line_count))]
pub struct LineOutOfRangeError {
    pub line: usize,
    pub line_count: usize,
}
