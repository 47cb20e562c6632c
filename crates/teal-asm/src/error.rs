use thiserror::Error;

/// A single assembly problem, without position.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AsmError {
    #[error("unknown opcode: {0}")]
    UnknownOpcode(String),
    #[error("{op} expects {expected} immediate arguments")]
    ImmediateCount { op: String, expected: String },
    #[error("unable to parse {0:?} as integer")]
    InvalidInteger(String),
    #[error("{value} is larger than max={max}")]
    OutOfRange { value: i128, max: u64 },
    #[error("{value} is outside of range {min}..={max}")]
    SignedOutOfRange { value: i128, min: i64, max: i64 },
    #[error("unable to parse byte constant {0:?}")]
    InvalidByteConstant(String),
    #[error("{0} byte constants are not supported")]
    UnsupportedEncoding(String),
    #[error("invalid address {0:?}")]
    InvalidAddress(String),
    #[error("invalid field name {0:?}")]
    InvalidField(String),
    #[error("unterminated string literal")]
    UnterminatedString,
    #[error("reference to undefined label {0:?}")]
    UndefinedLabel(String),
    #[error("duplicate label {0:?}")]
    DuplicateLabel(String),
    #[error("invalid label name {0:?}")]
    InvalidLabel(String),
    #[error("unsupported version: {0}")]
    UnsupportedVersion(String),
    #[error("#pragma version is only allowed before instructions")]
    PragmaAfterInstructions,
    #[error("unknown pragma: {0}")]
    UnknownPragma(String),
    #[error("branch target {0:?} is too far away")]
    BranchTooFar(String),
}

/// An [`AsmError`] located at a 1-based source position.
///
/// A `line` or `column` of `0` means the position is unknown.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("{line}:{column}: {cause}")]
pub struct LineError {
    pub line: usize,
    pub column: usize,
    #[source]
    pub cause: AsmError,
}

impl LineError {
    pub fn new(line: usize, column: usize, cause: AsmError) -> Self {
        Self { line, column, cause }
    }

    /// The wrapped error, without the position prefix.
    pub fn cause(&self) -> &AsmError {
        &self.cause
    }
}

/// Top-level outcome of a failed assembly.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AssembleError {
    #[error("{0} errors")]
    LineErrors(usize),
    #[error("program size {size} exceeds maximum of {max} bytes")]
    ProgramTooLarge { size: usize, max: usize },
}

/// Non-fatal assembly findings.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Warning {
    #[error("#pragma version is not set, assembling for version {0}")]
    MissingVersion(u64),
    #[error("label {0:?} is never referenced")]
    UnusedLabel(String),
}
