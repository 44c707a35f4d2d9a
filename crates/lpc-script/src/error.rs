use std::fmt;

use lpc_program::ProgramError;

/// 1-based source position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Pos {
    pub line: u32,
    pub col: u32,
}

impl Pos {
    pub const fn new(line: u32, col: u32) -> Self {
        Self { line, col }
    }
}

impl fmt::Display for Pos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.col)
    }
}

/// Errors raised while parsing or running a show script.
#[derive(Debug, thiserror::Error)]
pub enum ScriptError {
    /// The source could not be tokenized or parsed.
    #[error("{pos}: syntax error: {message}")]
    Syntax { pos: Pos, message: String },

    /// A well-formed script faulted while running.
    #[error("{pos}: {message}")]
    Runtime { pos: Pos, message: String },

    /// A sandbox limit was exceeded.
    #[error("{pos}: limit exceeded: {message}")]
    Limit { pos: Pos, message: String },

    /// The program host rejected an emission or output designation.
    #[error("{pos}: {source}")]
    Program {
        pos: Pos,
        #[source]
        source: ProgramError,
    },
}

impl ScriptError {
    pub(crate) fn syntax(pos: Pos, message: impl Into<String>) -> Self {
        Self::Syntax {
            pos,
            message: message.into(),
        }
    }

    pub(crate) fn runtime(pos: Pos, message: impl Into<String>) -> Self {
        Self::Runtime {
            pos,
            message: message.into(),
        }
    }

    pub(crate) fn limit(pos: Pos, message: impl Into<String>) -> Self {
        Self::Limit {
            pos,
            message: message.into(),
        }
    }

    pub(crate) fn program(pos: Pos, source: impl Into<ProgramError>) -> Self {
        Self::Program {
            pos,
            source: source.into(),
        }
    }

    /// Where in the script the error was raised.
    pub fn pos(&self) -> Pos {
        match self {
            Self::Syntax { pos, .. }
            | Self::Runtime { pos, .. }
            | Self::Limit { pos, .. }
            | Self::Program { pos, .. } => *pos,
        }
    }

    /// The underlying host error, if the script faulted inside an emission.
    pub fn program_error(&self) -> Option<&ProgramError> {
        match self {
            Self::Program { source, .. } => Some(source),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, ScriptError>;
