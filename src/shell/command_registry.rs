use hashlink::LinkedHashMap;
use snafu::ensure;
use tracing::debug;

use crate::shell::command::Command;
use crate::shell::shell::{
    MissingArgumentSnafu, ShellError, UnexpectedArgumentSnafu, UnknownCommandSnafu,
};

/// Whether a command takes free text after its positional arguments
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextArgument {
    None,
    Optional,
    Required,
}

/// Usage line, one-line summary and accepted arguments of a command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommandSpec {
    pub usage: &'static str,
    pub summary: &'static str,
    pub min_args: usize,
    pub max_args: usize,
    /// Text taken verbatim from the rest of the line, after `max_args` arguments
    pub text: TextArgument,
}

impl CommandSpec {
    const fn new(usage: &'static str, summary: &'static str, min_args: usize, max_args: usize) -> Self {
        Self {
            usage,
            summary,
            min_args,
            max_args,
            text: TextArgument::None,
        }
    }

    const fn with_text(self, text: TextArgument) -> Self {
        Self { text, ..self }
    }
}

/// Commands known to the shell, kept in registration order for `help`.
#[derive(Debug, Clone)]
pub struct CommandRegistry {
    commands: LinkedHashMap<&'static str, CommandSpec>,
}

impl Default for CommandRegistry {
    fn default() -> Self {
        Self::standard()
    }
}

impl CommandRegistry {
    pub fn empty() -> Self {
        Self {
            commands: LinkedHashMap::new(),
        }
    }

    pub fn standard() -> Self {
        let mut registry = Self::empty();
        registry.register(
            "mkdir",
            CommandSpec::new("mkdir <name> [path]", "Create a directory", 1, 2),
        );
        registry.register(
            "cd",
            CommandSpec::new("cd [path]", "Change directory (root when omitted)", 0, 1),
        );
        registry.register(
            "touch",
            CommandSpec::new("touch <name> [path]", "Create an empty text file", 1, 2),
        );
        registry.register(
            "rm",
            CommandSpec::new("rm <path>", "Remove a file or a directory tree", 1, 1),
        );
        registry.register(
            "ls",
            CommandSpec::new("ls [path]", "List a directory", 0, 1),
        );
        registry.register(
            "mv",
            CommandSpec::new("mv <path> <new_path>", "Move a node into a directory", 2, 2),
        );
        registry.register(
            "cp",
            CommandSpec::new("cp <path> <dest_path>", "Copy a node into a directory", 2, 2),
        );
        registry.register(
            "pwd",
            CommandSpec::new("pwd", "Print the current directory", 0, 0),
        );
        registry.register(
            "cat",
            CommandSpec::new("cat <path>", "Print a text file", 1, 1),
        );
        registry.register(
            "appendtxt",
            CommandSpec::new(
                "appendtxt <path>",
                "Append lines until the terminator line",
                1,
                1,
            ),
        );
        registry.register(
            "extendtxt",
            CommandSpec::new(
                "extendtxt <path> <text...>",
                "Continue the last line of a file",
                1,
                1,
            )
            .with_text(TextArgument::Required),
        );
        registry.register(
            "editline",
            CommandSpec::new(
                "editline <path> <line> [text...]",
                "Replace a line, asking for the text when omitted",
                2,
                2,
            )
            .with_text(TextArgument::Optional),
        );
        registry.register(
            "deline",
            CommandSpec::new("deline <path> <line>", "Delete a line", 2, 2),
        );
        registry.register(
            "help",
            CommandSpec::new("help", "Show this help", 0, 0),
        );
        registry.register(
            "exit",
            CommandSpec::new("exit", "Save and leave", 0, 0),
        );
        registry
    }

    pub fn register(&mut self, name: &'static str, spec: CommandSpec) {
        if self.commands.insert(name, spec).is_some() {
            debug!("Command '{}' registered again, replacing it", name);
        }
    }

    pub fn get(&self, name: &str) -> Option<&CommandSpec> {
        self.commands.get(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &CommandSpec)> {
        self.commands.iter().map(|(name, spec)| (*name, spec))
    }

    /// Parses one input line. Blank lines give `None`.
    ///
    /// Free text starts after the single whitespace character that follows the
    /// last positional argument, so leading and repeated spaces survive.
    pub fn parse(&self, line: &str) -> Result<Option<Command>, ShellError> {
        let Some((name, mut rest)) = next_token(line) else {
            return Ok(None);
        };

        let spec = self
            .get(name)
            .ok_or_else(|| UnknownCommandSnafu { name }.build())?;
        let mut args = Vec::with_capacity(spec.max_args);
        while args.len() < spec.max_args {
            let Some((arg, remaining)) = next_token(rest) else {
                break;
            };
            args.push(arg);
            rest = remaining;
        }
        ensure!(
            args.len() >= spec.min_args,
            MissingArgumentSnafu {
                command: name,
                usage: spec.usage,
            }
        );

        let text = match spec.text {
            TextArgument::None => {
                ensure!(
                    rest.trim().is_empty(),
                    UnexpectedArgumentSnafu {
                        command: name,
                        usage: spec.usage,
                    }
                );
                None
            }
            TextArgument::Optional | TextArgument::Required => rest
                .strip_prefix(char::is_whitespace)
                .filter(|text| !text.is_empty()),
        };
        ensure!(
            text.is_some() || spec.text != TextArgument::Required,
            MissingArgumentSnafu {
                command: name,
                usage: spec.usage,
            }
        );

        Command::from_arguments(name, &args, text).map(Some)
    }
}

/// Splits the next whitespace separated token off `input`, returning it with
/// everything after it.
fn next_token(input: &str) -> Option<(&str, &str)> {
    let input = input.trim_start();
    if input.is_empty() {
        return None;
    }
    let end = input.find(char::is_whitespace).unwrap_or(input.len());
    Some(input.split_at(end))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::*;

    #[test]
    fn blank_lines_parse_to_nothing() {
        let registry = CommandRegistry::standard();
        assert_eq!(registry.parse("").unwrap(), None);
        assert_eq!(registry.parse("   \t ").unwrap(), None);
    }

    #[test]
    fn extra_whitespace_between_tokens_is_ignored() {
        let registry = CommandRegistry::standard();
        assert_eq!(
            registry.parse("  mv   /a\t/b  ").unwrap(),
            Some(Command::Move {
                path: "/a".into(),
                new_path: "/b".into()
            })
        );
    }

    #[rstest]
    #[case("mkdir")]
    #[case("touch")]
    #[case("rm")]
    #[case("mv /a")]
    #[case("cp")]
    #[case("cat")]
    #[case("appendtxt")]
    #[case("extendtxt /a")]
    #[case("extendtxt /a ")]
    #[case("editline /a")]
    #[case("deline /a")]
    fn too_few_arguments_are_reported(#[case] line: &str) {
        let registry = CommandRegistry::standard();
        assert!(matches!(
            registry.parse(line),
            Err(ShellError::MissingArgumentError { .. })
        ));
    }

    #[rstest]
    #[case("pwd now")]
    #[case("cd a b")]
    #[case("rm a b")]
    #[case("mkdir a b c")]
    #[case("exit 0")]
    fn too_many_arguments_are_reported(#[case] line: &str) {
        let registry = CommandRegistry::standard();
        assert!(matches!(
            registry.parse(line),
            Err(ShellError::UnexpectedArgumentError { .. })
        ));
    }

    #[test]
    fn unknown_commands_are_reported_by_name() {
        let registry = CommandRegistry::standard();
        let error = registry.parse("dir /").unwrap_err();
        assert!(matches!(error, ShellError::UnknownCommandError { ref name } if name == "dir"));
        assert!(error.to_string().contains("command not found"));
    }

    #[test]
    fn missing_argument_message_shows_usage() {
        let registry = CommandRegistry::standard();
        let error = registry.parse("mv /a").unwrap_err();
        assert!(error.to_string().contains("mv <path> <new_path>"));
    }

    #[test]
    fn commands_keep_registration_order() {
        let registry = CommandRegistry::standard();
        let names = registry.iter().map(|(name, _)| name).collect::<Vec<_>>();
        assert_eq!(names.first(), Some(&"mkdir"));
        assert_eq!(names.last(), Some(&"exit"));
        assert_eq!(names.len(), 15);
    }

    #[test]
    fn every_registered_command_parses_with_minimal_arguments() {
        let registry = CommandRegistry::standard();
        for (name, spec) in registry.iter() {
            let args = ["x", "1"].iter().cycle().take(spec.min_args);
            let text = (spec.text == TextArgument::Required).then_some("text");
            let line = std::iter::once(name)
                .chain(args.copied())
                .chain(text)
                .collect::<Vec<_>>()
                .join(" ");
            assert!(
                registry.parse(&line).is_ok(),
                "'{line}' should parse with {} argument(s)",
                spec.min_args
            );
        }
    }

    #[rstest]
    #[case("extendtxt /f.txt  world", " world")]
    #[case("extendtxt /f.txt a   b ", "a   b ")]
    #[case("extendtxt\t/f.txt\t\tx", "\tx")]
    fn extendtxt_keeps_the_text_verbatim(#[case] line: &str, #[case] text: &str) {
        let registry = CommandRegistry::standard();
        assert_eq!(
            registry.parse(line).unwrap(),
            Some(Command::ExtendText {
                path: "/f.txt".into(),
                text: text.into()
            })
        );
    }

    #[rstest]
    #[case("editline /f 1 a   b", Some("a   b"))]
    #[case("editline /f 1  indented", Some(" indented"))]
    #[case("editline /f 1", None)]
    #[case("editline /f 1 ", None)]
    fn editline_keeps_inline_text_verbatim(#[case] line: &str, #[case] text: Option<&str>) {
        let registry = CommandRegistry::standard();
        assert_eq!(
            registry.parse(line).unwrap(),
            Some(Command::EditLine {
                path: "/f".into(),
                line: 1,
                text: text.map(String::from)
            })
        );
    }

    #[test]
    fn free_text_does_not_count_as_extra_arguments() {
        let registry = CommandRegistry::standard();
        assert!(registry.parse("extendtxt /f one two three").is_ok());
        assert!(matches!(
            registry.parse("deline /f 1 2"),
            Err(ShellError::UnexpectedArgumentError { .. })
        ));
    }
}
