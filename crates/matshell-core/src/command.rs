//! Command words and their positional arguments.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CommandError {
    #[error("not a command in this application: {name:?}")]
    UnknownCommand { name: String },
    #[error("{command} expects {expected} argument(s), got {got}")]
    WrongArity {
        command: CommandKind,
        expected: usize,
        got: usize,
    },
}

impl CommandError {
    pub fn code(&self) -> &'static str {
        match self {
            CommandError::UnknownCommand { .. } => "unknown_command",
            CommandError::WrongArity { .. } => "wrong_arity",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommandKind {
    Create,
    Display,
    Add,
    Duplicate,
    Equal,
    Shift,
    Read,
    Write,
    Random,
}

impl CommandKind {
    pub const ALL: [CommandKind; 9] = [
        CommandKind::Create,
        CommandKind::Display,
        CommandKind::Add,
        CommandKind::Duplicate,
        CommandKind::Equal,
        CommandKind::Shift,
        CommandKind::Read,
        CommandKind::Write,
        CommandKind::Random,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            CommandKind::Create => "create",
            CommandKind::Display => "display",
            CommandKind::Add => "add",
            CommandKind::Duplicate => "duplicate",
            CommandKind::Equal => "equal",
            CommandKind::Shift => "shift",
            CommandKind::Read => "read",
            CommandKind::Write => "write",
            CommandKind::Random => "random",
        }
    }

    /// Number of arguments after the command word.
    pub fn arity(self) -> usize {
        match self {
            CommandKind::Display | CommandKind::Read | CommandKind::Write => 1,
            CommandKind::Duplicate | CommandKind::Equal => 2,
            CommandKind::Create | CommandKind::Add | CommandKind::Shift | CommandKind::Random => 3,
        }
    }
}

impl fmt::Display for CommandKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CommandKind {
    type Err = CommandError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        CommandKind::ALL
            .into_iter()
            .find(|k| k.as_str() == s)
            .ok_or_else(|| CommandError::UnknownCommand {
                name: s.to_string(),
            })
    }
}

/// A command with its arguments bound by position.
///
/// Names and the shift direction stay raw strings; they are validated when
/// the command runs so every failure surfaces as a matrix error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Create { name: String, rows: u32, cols: u32 },
    Display { name: String },
    Add { left: String, right: String, out: String },
    Duplicate { src: String, dest: String },
    Equal { left: String, right: String },
    Shift { name: String, direction: String, amount: u32 },
    Read { file: String },
    Write { name: String },
    Random { name: String, low: u32, high: u32 },
}

impl Command {
    pub fn kind(&self) -> CommandKind {
        match self {
            Command::Create { .. } => CommandKind::Create,
            Command::Display { .. } => CommandKind::Display,
            Command::Add { .. } => CommandKind::Add,
            Command::Duplicate { .. } => CommandKind::Duplicate,
            Command::Equal { .. } => CommandKind::Equal,
            Command::Shift { .. } => CommandKind::Shift,
            Command::Read { .. } => CommandKind::Read,
            Command::Write { .. } => CommandKind::Write,
            Command::Random { .. } => CommandKind::Random,
        }
    }

    /// Binds `tokens` (command word first) to a command, checking the exact
    /// argument count.
    pub fn parse<S: AsRef<str>>(tokens: &[S]) -> Result<Self, CommandError> {
        let Some((word, args)) = tokens.split_first() else {
            return Err(CommandError::UnknownCommand {
                name: String::new(),
            });
        };
        let kind: CommandKind = word.as_ref().parse()?;
        if args.len() != kind.arity() {
            return Err(CommandError::WrongArity {
                command: kind,
                expected: kind.arity(),
                got: args.len(),
            });
        }
        let arg = |i: usize| args[i].as_ref().to_string();
        let num = |i: usize| lenient_u32(args[i].as_ref());

        Ok(match kind {
            CommandKind::Create => Command::Create {
                name: arg(0),
                rows: num(1),
                cols: num(2),
            },
            CommandKind::Display => Command::Display { name: arg(0) },
            CommandKind::Add => Command::Add {
                left: arg(0),
                right: arg(1),
                out: arg(2),
            },
            CommandKind::Duplicate => Command::Duplicate {
                src: arg(0),
                dest: arg(1),
            },
            CommandKind::Equal => Command::Equal {
                left: arg(0),
                right: arg(1),
            },
            CommandKind::Shift => Command::Shift {
                name: arg(0),
                direction: arg(1),
                amount: num(2),
            },
            CommandKind::Read => Command::Read { file: arg(0) },
            CommandKind::Write => Command::Write { name: arg(0) },
            CommandKind::Random => Command::Random {
                name: arg(0),
                low: num(1),
                high: num(2),
            },
        })
    }
}

/// Splits a raw line on spaces, tabs and newlines.
pub fn tokenize(line: &str) -> Vec<&str> {
    line.split_whitespace().collect()
}

/// Decimal parse that degrades to 0 on any failure.
pub fn lenient_u32(token: &str) -> u32 {
    token.parse().unwrap_or(0)
}
