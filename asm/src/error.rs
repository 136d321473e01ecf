use arch::op::Mnemonic;
use color_print::cprintln;
use std::fmt;
use thiserror::Error;

use crate::source::{Pos, Source};

#[derive(Error, Debug)]
pub enum Error {
    // Syntax errors
    #[error("Unknown instruction: '{0}'")]
    UnknownInstruction(String),

    #[error("Unknown directive: '.{0}'")]
    UnknownDirective(String),

    #[error("'{0}' not a valid label")]
    InvalidLabel(String),

    #[error("Invalid number literal: '{0}'")]
    InvalidNumber(String),

    #[error("Expected immediate value")]
    ExpectedImmediate,

    #[error("Expected indirect address")]
    ExpectedIndirect,

    #[error("Expected ')'")]
    MissingParen,

    #[error("Only one index level supported")]
    DoubleIndex,

    #[error("Unterminated string literal")]
    UnterminatedString,

    #[error("Invalid literal: '{0}'")]
    InvalidLiteral(String),

    #[error("Unexpected trailing characters '{0}'")]
    TrailingChars(String),

    // Semantic errors
    #[error("Operand must be in range 0-255")]
    ByteRange,

    #[error("Operand must be in range 0-65535")]
    WordRange,

    #[error("Multiple declarations of '{0}'")]
    MultipleDeclarations(String),

    #[error("Label not defined: {0}")]
    UndefinedLabel(String),

    #[error("Entry label not defined: {0}")]
    UndefinedEntry(String),

    #[error("{0} only allows ABSOLUTE and INDIRECT addressing")]
    JumpAddressing(Mnemonic),

    #[error("Address space overflow at label '{0}'")]
    AddressOverflow(String),

    #[error("Code runs past the end of the address space")]
    CodeOverflow,

    // Resource errors
    #[error("Code unable to fit in ROM: {0} bytes of code and 2 bytes of reset vector exceed {1} bytes")]
    RomOverflow(usize, usize),

    #[error("Invalid ROM size: '{0}'")]
    InvalidSize(String),

    #[error("Invalid load offset: '{0}'")]
    InvalidOffset(String),

    #[error("Template is missing placeholder {0}")]
    Template(&'static str),

    #[error("Input file given more than once: {0}")]
    DuplicateInput(String),

    #[error("Failed to open file: {0}")]
    FileOpen(String, #[source] std::io::Error),

    #[error("Failed to write file: {0}")]
    FileWrite(String, #[source] std::io::Error),

    #[error("Invalid config file: {0}")]
    Config(String, #[source] serde_yaml::Error),

    #[error("Failed to serialize symbols")]
    Symbols(#[source] serde_yaml::Error),
}

impl Error {
    pub fn at(self, pos: &Pos) -> Diag {
        Diag {
            error: self,
            pos: Some(pos.clone()),
        }
    }
}

/// A fatal error, located in the source when the location is known.
#[derive(Debug)]
pub struct Diag {
    pub error: Error,
    pub pos: Option<Pos>,
}

impl From<Error> for Diag {
    fn from(error: Error) -> Self {
        Diag { error, pos: None }
    }
}

impl fmt::Display for Diag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.pos {
            Some(pos) => write!(f, "{}: {}", pos, self.error),
            None => write!(f, "{}", self.error),
        }
    }
}

impl std::error::Error for Diag {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.error)
    }
}

impl Diag {
    /// Print error with diagnostic information showing file location and line content
    pub fn print(&self, source: &Source) {
        cprintln!("<red,bold>error</>: {}", self.error);
        if let Some(cause) = std::error::Error::source(&self.error) {
            cprintln!("     <blue>=</> {}", cause);
        }

        let Some(pos) = &self.pos else {
            return;
        };
        cprintln!("     <blue>--></> <underline>{}</>", pos);
        cprintln!("      <blue>|</>");
        cprintln!(
            " <blue>{:>4} |</> {}",
            pos.idx + 1,
            source.line(pos).unwrap_or("")
        );
        cprintln!("      <blue>|</>");
    }
}
