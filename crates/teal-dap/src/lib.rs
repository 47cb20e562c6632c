//! Debug Adapter Protocol bridge that replays TEAL execution traces.
//!
//! Traces come from a recorded algod simulate response (`--replay`) or from a
//! live node's simulate endpoint, optionally merged with a static JSON config.
//!
//! ```no_run
//! let sources = teal_dap::DebugSources {
//!     replay: Some("trace.json".into()),
//!     ..Default::default()
//! };
//! teal_dap::start(&sources).unwrap();
//! ```
pub mod adapter;
pub mod algod;
pub mod error;
pub mod log;
pub mod mirror;
pub mod protocol;
pub mod replay;
pub mod server;
pub mod session;
pub mod source;

pub use error::SetupError;
pub use session::DebugSession;
pub use source::{DebugOption, DebugSources, resolve};

/// Resolves the debug sources, builds the session and serves it on stdio.
pub fn start(sources: &DebugSources) -> Result<(), SetupError> {
    let options = resolve(sources)?;
    let session = DebugSession::build(options)?;
    session.run()
}
