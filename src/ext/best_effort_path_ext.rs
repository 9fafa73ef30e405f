use std::path::{Path, PathBuf};

/// Renders `path` as absolute as it can, for log lines and error messages.
///
/// The snapshot file usually does not exist before the first save, so when the
/// path itself cannot be canonicalized its parent is tried instead.
pub fn best_effort_path_display(path: &Path) -> String {
    if let Ok(canonical) = path.canonicalize() {
        return canonical.display().to_string();
    }

    let parent = path.parent().filter(|parent| !parent.as_os_str().is_empty());
    let canonical_parent = match parent {
        Some(parent) => parent.canonicalize().ok(),
        None => std::env::current_dir().ok(),
    };

    match (canonical_parent, path.file_name()) {
        (Some(parent), Some(file_name)) => parent.join(file_name).display().to_string(),
        _ => path.display().to_string(),
    }
}

pub trait BestEffortPathExt {
    fn best_effort_path_display(&self) -> String;
}

impl BestEffortPathExt for Path {
    fn best_effort_path_display(&self) -> String {
        best_effort_path_display(self)
    }
}

impl BestEffortPathExt for PathBuf {
    fn best_effort_path_display(&self) -> String {
        best_effort_path_display(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn missing_file_in_existing_directory_is_made_absolute() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let path = temp_dir.path().join("tree.snapshot");

        let displayed = path.best_effort_path_display();

        let expected = temp_dir
            .path()
            .canonicalize()
            .expect("Failed to canonicalize temp directory")
            .join("tree.snapshot");
        assert_eq!(displayed, expected.display().to_string());
    }

    #[test]
    fn unresolvable_path_is_shown_as_given() {
        let path = Path::new("/this/path/does/not/exist/tree.snapshot");
        assert_eq!(
            path.best_effort_path_display(),
            "/this/path/does/not/exist/tree.snapshot"
        );
    }
}
