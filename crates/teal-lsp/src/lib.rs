//! Editor-protocol (LSP) bridge that reports TEAL assembler diagnostics.
//!
//! ```no_run
//! let config = teal_lsp::LspConfig::new("tcp", "", None);
//! teal_lsp::start(config).unwrap();
//! ```
use std::path::PathBuf;

pub mod capabilities;
pub mod diagnostics;
pub mod error;
pub mod mirror;
mod server;
pub mod session;
pub mod transport;

pub use diagnostics::{DiagnosticsHandler, translate};
pub use error::LspError;
pub use session::{Session, SessionBuilder, SessionOption, serve};
pub use transport::Transport;

#[derive(Debug, Clone, Default)]
pub struct LspConfig {
    network: String,
    address: String,
    debug_log: Option<PathBuf>,
}

impl LspConfig {
    /// Creates a new LspConfig.
    ///
    /// An empty `address` serves over standard input/output. `debug_log`, when
    /// set, receives a copy of all protocol traffic.
    pub fn new(network: impl Into<String>, address: impl Into<String>, debug_log: Option<PathBuf>) -> Self {
        Self {
            network: network.into(),
            address: address.into(),
            debug_log,
        }
    }
}

/// Selects the transport, builds the session and serves until it closes.
pub fn start(config: LspConfig) -> Result<(), LspError> {
    let transport = transport::select(&config.network, &config.address)?;
    let session = Session::build(transport, translate, config.debug_log.as_deref())?;
    session.run()
}
