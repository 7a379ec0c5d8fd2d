//! Command parsing and execution errors.

/// Specific command error conditions.
#[derive(Debug, Clone, PartialEq, Eq, Hash, derive_more::Display)]
pub enum CommandErrorKind {
    /// Input did not name a known command.
    #[display("Unknown command: {}", _0)]
    UnknownCommand(String),

    /// Missing required argument.
    #[display("Missing required argument '{}' for command '{}'", arg_name, command)]
    MissingArgument {
        /// Command being parsed
        command: String,
        /// Name of the missing argument
        arg_name: String,
    },

    /// Argument could not be parsed.
    #[display("Invalid argument '{}' for command '{}': {}", arg_name, command, reason)]
    InvalidArgument {
        /// Command being parsed
        command: String,
        /// Name of the argument
        arg_name: String,
        /// Why it was rejected
        reason: String,
    },

    /// Invoker lacks the permission the command needs.
    #[display("Permission denied for '{}'", _0)]
    PermissionDenied(String),

    /// Command was refused by role policy.
    #[display("{}", _0)]
    Rejected(String),

    /// Guild is cooling down after a bulk operation.
    #[display("This command is on cooldown for another {}s", _0)]
    Cooldown(u64),

    /// Command was used outside a guild.
    #[display("This command only works inside a server")]
    NotInGuild,
}

/// Command error with location tracking.
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Command Error: {} at line {} in {}", kind, line, file)]
pub struct CommandError {
    kind: CommandErrorKind,
    line: u32,
    file: &'static str,
}

impl CommandError {
    /// Create a new command error with caller location tracking.
    #[track_caller]
    pub fn new(kind: CommandErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            line: location.line(),
            file: location.file(),
        }
    }

    /// Get the error kind.
    pub fn kind(&self) -> &CommandErrorKind {
        &self.kind
    }
}
