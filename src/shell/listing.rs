use colored::Colorize;

use crate::filesystem::ChildEntry;

const ENTRY_SEPARATOR: &str = "  ";

/// Formats a directory listing on a single line, directories highlighted when
/// `color` is set.
pub fn format_listing(entries: &[ChildEntry], color: bool) -> String {
    entries
        .iter()
        .map(|entry| {
            if color && entry.is_directory {
                entry.name.blue().bold().to_string()
            } else {
                entry.name.clone()
            }
        })
        .collect::<Vec<_>>()
        .join(ENTRY_SEPARATOR)
}
