use std::borrow::Cow;
use std::error::Error;
use std::io::{BufRead, Write};

use snafu::{ResultExt, Snafu};
use tracing::{debug, info, warn};

use crate::filesystem::{FilesystemError, FilesystemTree};
use crate::shell::command::Command;
use crate::shell::command_registry::CommandRegistry;
use crate::shell::listing::format_listing;

pub const DEFAULT_TERMINATOR: &str = "EOF";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShellConfig {
    /// Line that ends the text read by `appendtxt`
    pub terminator: String,
    pub color: bool,
}

impl Default for ShellConfig {
    fn default() -> Self {
        Self {
            terminator: DEFAULT_TERMINATOR.to_string(),
            color: false,
        }
    }
}

/// Interactive command loop over a [`FilesystemTree`].
///
/// The shell owns the tree while it runs and hands it back from [`Shell::run`]
/// once the user exits or the input ends. A failing command is reported on the
/// output and the loop carries on. A broken terminal stops the loop early, but
/// the tree is still handed back along with the error.
pub struct Shell<R, W> {
    tree: FilesystemTree,
    registry: CommandRegistry,
    config: ShellConfig,
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> Shell<R, W> {
    pub fn new(tree: FilesystemTree, config: ShellConfig, input: R, output: W) -> Self {
        Self {
            tree,
            registry: CommandRegistry::standard(),
            config,
            input,
            output,
        }
    }

    pub fn run(mut self) -> (FilesystemTree, Result<(), ShellError>) {
        info!("Shell started with {} nodes", self.tree.node_count());
        let outcome = self.run_loop();
        (self.tree, outcome)
    }

    fn run_loop(&mut self) -> Result<(), ShellError> {
        loop {
            self.prompt()?;
            let Some(line) = self.read_line()? else {
                info!("Input ended, leaving the shell");
                break;
            };

            let outcome = match self.registry.parse(&line) {
                Ok(None) => Ok(()),
                Ok(Some(Command::Exit)) => break,
                Ok(Some(command)) => self.execute(command),
                Err(error) => Err(error),
            };
            if let Err(error) = outcome {
                self.report(error)?;
            }
        }
        Ok(())
    }

    fn execute(&mut self, command: Command) -> Result<(), ShellError> {
        debug!("Executing {:?}", command);
        match command {
            Command::MakeDirectory { name, path } => {
                self.tree.make_directory(&name, path.as_deref())?;
            }
            Command::ChangeDirectory { path } => {
                self.tree.change_directory(path.as_deref())?;
            }
            Command::MakeFile { name, path } => {
                self.tree.make_file(&name, path.as_deref())?;
            }
            Command::Remove { path } => {
                self.tree.remove(&path)?;
            }
            Command::List { path } => {
                let entries = self.tree.list_children(path.as_deref())?;
                if !entries.is_empty() {
                    let listing = format_listing(&entries, self.config.color);
                    self.write_line(&listing)?;
                }
            }
            Command::Move { path, new_path } => {
                self.tree.move_node(&path, &new_path)?;
            }
            Command::Copy { path, dest_path } => {
                self.tree.copy(&path, &dest_path)?;
            }
            Command::PrintWorkingDirectory => {
                let cwd = self.tree.where_am_i();
                self.write_line(&cwd)?;
            }
            Command::Cat { path } => {
                let contents = self.tree.read_file(&path)?;
                if !contents.is_empty() {
                    self.write_line(&contents)?;
                }
            }
            Command::AppendText { path } => self.append_text(&path)?,
            Command::ExtendText { path, text } => {
                self.tree.extend_last_line(&path, &text)?;
            }
            Command::EditLine { path, line, text } => self.edit_line(&path, line, text)?,
            Command::DeleteLine { path, line } => {
                self.tree.delete_line(&path, line)?;
            }
            Command::Help => self.help()?,
            Command::Exit => {}
        }
        Ok(())
    }

    fn append_text(&mut self, path: &str) -> Result<(), ShellError> {
        self.tree.check_file(path)?;
        let hint = format!("Enter text, end with a line containing '{}'", self.config.terminator);
        self.write_line(&hint)?;

        let mut lines = Vec::new();
        while let Some(line) = self.read_line()? {
            if line.trim() == self.config.terminator {
                break;
            }
            lines.push(line);
        }

        self.tree.append_lines(path, lines)?;
        Ok(())
    }

    fn edit_line(&mut self, path: &str, line: usize, text: Option<String>) -> Result<(), ShellError> {
        self.tree.check_line(path, line)?;
        let text = match text {
            Some(text) => text,
            None => {
                self.write_line(&format!("New text for line {line}:"))?;
                self.read_line()?
                    .ok_or_else(|| InputEndedSnafu { command: "editline" }.build())?
            }
        };

        self.tree.edit_line(path, line, text)?;
        Ok(())
    }

    fn help(&mut self) -> Result<(), ShellError> {
        let lines = self
            .registry
            .iter()
            .map(|(_, spec)| format!("{:<34}{}", spec.usage, spec.summary))
            .collect::<Vec<_>>();
        for line in lines {
            self.write_line(&line)?;
        }
        Ok(())
    }

    fn report(&mut self, error: ShellError) -> Result<(), ShellError> {
        if !error.is_recoverable() {
            return Err(error);
        }
        debug!("Command failed: {:?}", error);
        self.write_line(&describe(&error))
    }

    fn prompt(&mut self) -> Result<(), ShellError> {
        write!(self.output, "{}> ", self.tree.where_am_i()).context(TerminalSnafu)?;
        self.output.flush().context(TerminalSnafu)
    }

    fn write_line(&mut self, text: &str) -> Result<(), ShellError> {
        writeln!(self.output, "{text}").context(TerminalSnafu)
    }

    /// Next input line without its line ending, `None` once the input is exhausted
    ///
    /// Bytes that are not valid UTF-8 are replaced rather than rejected.
    fn read_line(&mut self) -> Result<Option<String>, ShellError> {
        let mut buffer = Vec::new();
        let read = self
            .input
            .read_until(b'\n', &mut buffer)
            .context(TerminalSnafu)?;
        if read == 0 {
            return Ok(None);
        }

        let line = String::from_utf8_lossy(&buffer);
        if let Cow::Owned(_) = line {
            warn!("Input line is not valid UTF-8, invalid bytes were replaced");
        }
        Ok(Some(line.trim_end_matches(['\n', '\r']).to_string()))
    }
}

/// Error message followed by all of its causes
fn describe(error: &dyn Error) -> String {
    let mut message = error.to_string();
    let mut source = error.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum ShellError {
    #[snafu(display("{}: command not found", name))]
    UnknownCommandError { name: String },
    #[snafu(display("{}: missing argument, usage: {}", command, usage))]
    MissingArgumentError { command: String, usage: String },
    #[snafu(display("{}: too many arguments, usage: {}", command, usage))]
    UnexpectedArgumentError { command: String, usage: String },
    #[snafu(display("'{}' is not a valid line number", value))]
    InvalidLineNumberError {
        value: String,
        source: std::num::ParseIntError,
    },
    #[snafu(display("Input ended before {} was complete", command))]
    InputEndedError { command: String },
    #[snafu(transparent)]
    FilesystemError { source: FilesystemError },
    #[snafu(display("Failed to use the terminal"))]
    TerminalError { source: std::io::Error },
}

impl ShellError {
    /// Whether the shell can report this error and keep reading commands
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, ShellError::TerminalError { .. })
    }
}
