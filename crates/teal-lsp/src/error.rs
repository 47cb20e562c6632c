use std::io;
use std::path::PathBuf;

use miette::Diagnostic;
use thiserror::Error;

/// Failures while constructing or running an editor-protocol session.
#[derive(Error, Diagnostic, Debug)]
pub enum LspError {
    #[error("failed to connect to {network} address {address}")]
    #[diagnostic(code(tealsp::transport))]
    Dial {
        network: String,
        address: String,
        #[source]
        source: io::Error,
    },
    #[error("unsupported network {0:?}")]
    #[diagnostic(code(tealsp::transport), help("use one of tcp, tcp4, tcp6 or unix"))]
    UnsupportedNetwork(String),
    #[error("transport failed")]
    #[diagnostic(code(tealsp::transport))]
    Transport(#[source] io::Error),
    #[error("failed to open debug log {}", path.display())]
    #[diagnostic(code(tealsp::debug_sink))]
    DebugSink {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("invalid session options: {0}")]
    #[diagnostic(code(tealsp::session))]
    Options(String),
    #[error("failed to start the async runtime")]
    #[diagnostic(code(tealsp::session))]
    Runtime(#[source] io::Error),
}

impl LspError {
    /// Process exit code for the phase this error belongs to.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Dial { .. } | Self::UnsupportedNetwork(_) | Self::Transport(_) => -1,
            Self::DebugSink { .. } => -2,
            Self::Options(_) | Self::Runtime(_) => -3,
        }
    }
}
