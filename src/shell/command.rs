use snafu::ResultExt;

use crate::shell::shell::{InvalidLineNumberSnafu, ShellError, UnknownCommandSnafu};

/// A parsed shell command, one variant per entry of the command registry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    MakeDirectory { name: String, path: Option<String> },
    ChangeDirectory { path: Option<String> },
    MakeFile { name: String, path: Option<String> },
    Remove { path: String },
    List { path: Option<String> },
    Move { path: String, new_path: String },
    Copy { path: String, dest_path: String },
    PrintWorkingDirectory,
    Cat { path: String },
    AppendText { path: String },
    ExtendText { path: String, text: String },
    EditLine {
        path: String,
        line: usize,
        text: Option<String>,
    },
    DeleteLine { path: String, line: usize },
    Help,
    Exit,
}

impl Command {
    /// Builds a command from its name, its positional arguments and the free
    /// text that follows them.
    ///
    /// Argument counts are checked by the registry, so a missing argument only
    /// shows up here as an empty string.
    pub fn from_arguments(name: &str, args: &[&str], text: Option<&str>) -> Result<Self, ShellError> {
        let mut args = Arguments(args.iter());
        let command = match name {
            "mkdir" => Command::MakeDirectory {
                name: args.required(),
                path: args.optional(),
            },
            "cd" => Command::ChangeDirectory {
                path: args.optional(),
            },
            "touch" => Command::MakeFile {
                name: args.required(),
                path: args.optional(),
            },
            "rm" => Command::Remove {
                path: args.required(),
            },
            "ls" => Command::List {
                path: args.optional(),
            },
            "mv" => Command::Move {
                path: args.required(),
                new_path: args.required(),
            },
            "cp" => Command::Copy {
                path: args.required(),
                dest_path: args.required(),
            },
            "pwd" => Command::PrintWorkingDirectory,
            "cat" => Command::Cat {
                path: args.required(),
            },
            "appendtxt" => Command::AppendText {
                path: args.required(),
            },
            "extendtxt" => Command::ExtendText {
                path: args.required(),
                text: text.unwrap_or_default().to_string(),
            },
            "editline" => Command::EditLine {
                path: args.required(),
                line: parse_line_number(&args.required())?,
                text: text.map(str::to_string),
            },
            "deline" => Command::DeleteLine {
                path: args.required(),
                line: parse_line_number(&args.required())?,
            },
            "help" => Command::Help,
            "exit" => Command::Exit,
            _ => return UnknownCommandSnafu { name }.fail(),
        };
        Ok(command)
    }
}

struct Arguments<'a, 'b>(std::slice::Iter<'a, &'b str>);

impl Arguments<'_, '_> {
    fn required(&mut self) -> String {
        self.optional().unwrap_or_default()
    }

    fn optional(&mut self) -> Option<String> {
        self.0.next().map(|arg| arg.to_string())
    }
}

fn parse_line_number(value: &str) -> Result<usize, ShellError> {
    value
        .parse::<usize>()
        .context(InvalidLineNumberSnafu { value })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::*;

    #[rstest]
    #[case("mkdir", &["docs"], Command::MakeDirectory { name: "docs".into(), path: None })]
    #[case("mkdir", &["docs", "/home"], Command::MakeDirectory { name: "docs".into(), path: Some("/home".into()) })]
    #[case("cd", &[], Command::ChangeDirectory { path: None })]
    #[case("cd", &[".."], Command::ChangeDirectory { path: Some("..".into()) })]
    #[case("touch", &["a.txt", "/docs"], Command::MakeFile { name: "a.txt".into(), path: Some("/docs".into()) })]
    #[case("ls", &[], Command::List { path: None })]
    #[case("mv", &["/a", "/b"], Command::Move { path: "/a".into(), new_path: "/b".into() })]
    #[case("cp", &["/a", "/b"], Command::Copy { path: "/a".into(), dest_path: "/b".into() })]
    #[case("deline", &["/a", "0"], Command::DeleteLine { path: "/a".into(), line: 0 })]
    #[case("exit", &[], Command::Exit)]
    fn parses_commands(#[case] name: &str, #[case] args: &[&str], #[case] expected: Command) {
        assert_eq!(Command::from_arguments(name, args, None).unwrap(), expected);
    }

    #[rstest]
    #[case("extendtxt", &["/a"], Some(" world"), Command::ExtendText { path: "/a".into(), text: " world".into() })]
    #[case("editline", &["/a", "2"], None, Command::EditLine { path: "/a".into(), line: 2, text: None })]
    #[case("editline", &["/a", "2"], Some("a   b"), Command::EditLine { path: "/a".into(), line: 2, text: Some("a   b".into()) })]
    fn free_text_is_kept_verbatim(
        #[case] name: &str,
        #[case] args: &[&str],
        #[case] text: Option<&str>,
        #[case] expected: Command,
    ) {
        assert_eq!(Command::from_arguments(name, args, text).unwrap(), expected);
    }

    #[rstest]
    #[case("-1")]
    #[case("two")]
    #[case("1.5")]
    fn rejects_malformed_line_numbers(#[case] line: &str) {
        let result = Command::from_arguments("deline", &["/a", line], None);
        assert!(matches!(
            result,
            Err(ShellError::InvalidLineNumberError { .. })
        ));
    }

    #[test]
    fn unknown_names_are_unknown_commands() {
        assert!(matches!(
            Command::from_arguments("format", &["c:"], None),
            Err(ShellError::UnknownCommandError { ref name }) if name == "format"
        ));
    }
}
