use std::io;
use std::path::PathBuf;

use dap::prelude::Command;
use miette::Diagnostic;
use thiserror::Error;

/// Failures while constructing or running a debug session.
#[derive(Error, Diagnostic, Debug)]
pub enum SetupError {
    #[error("failed to open debug log {}", path.display())]
    #[diagnostic(code(tealsp::debug_sink))]
    DebugSink {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to read debug config {}", path.display())]
    #[diagnostic(code(tealsp::config))]
    ReadConfig {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to parse debug config {}", path.display())]
    #[diagnostic(code(tealsp::config))]
    ParseConfig {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to read replay file {}", path.display())]
    #[diagnostic(code(tealsp::replay))]
    ReadReplay {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to parse replay file {}", path.display())]
    #[diagnostic(code(tealsp::replay), help("expected an algod simulate response in JSON format"))]
    ParseReplay {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("invalid algod endpoint {address:?}: {reason}")]
    #[diagnostic(code(tealsp::endpoint))]
    Endpoint { address: String, reason: String },
    #[error("invalid debug session options: {0}")]
    #[diagnostic(code(tealsp::session))]
    Session(String),
    #[error("debug session failed: {0}")]
    #[diagnostic(code(tealsp::runtime))]
    Runtime(String),
}

impl SetupError {
    /// Process exit code for the phase this error belongs to.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::DebugSink { .. } => -2,
            Self::Session(_) => -3,
            Self::ReadConfig { .. } | Self::ParseConfig { .. } => -4,
            Self::ReadReplay { .. } | Self::ParseReplay { .. } => -5,
            Self::Endpoint { .. } => -6,
            Self::Runtime(_) => -7,
        }
    }
}

#[derive(Error, Debug)]
pub enum AlgodError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("algod responded with status {status}: {message}")]
    Status { status: u16, message: String },
    #[error("simulate request must be a JSON object")]
    InvalidRequest,
}

#[derive(Error, Debug)]
pub enum AdapterError {
    #[error("Unhandled command: {0:?}")]
    UnhandledCommand(Command),
    #[error("Failed to deserialize launch arguments: {0}")]
    LaunchArgumentsError(serde_json::Error),
    #[error("Failed to read program {}: {source}", path.display())]
    ProgramError {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("No execution trace available: {0}")]
    TraceUnavailable(String),
    #[error("Simulate request failed: {0}")]
    Algod(#[from] AlgodError),
    #[error("Not launched")]
    NotLaunched,
    #[error("Evaluation error: {0}")]
    EvaluationError(String),
}
