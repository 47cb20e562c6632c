use std::io;

use tracing::info;

use crate::adapter::TealAdapter;
use crate::error::SetupError;
use crate::log::DebugConsoleWriter;
use crate::mirror::Mirror;
use crate::server;
use crate::source::DebugOption;

/// A debug session served over standard input/output.
#[derive(Debug)]
pub struct DebugSession {
    adapter: TealAdapter,
    mirror: Option<Mirror>,
}

impl DebugSession {
    /// Applies `options` in order. Each kind may appear at most once and the
    /// config must come before any live endpoint or replay.
    pub fn build(options: Vec<DebugOption>) -> Result<Self, SetupError> {
        let mut adapter = TealAdapter::default();
        let mut mirror = None;
        let (mut config, mut live, mut replay) = (false, false, false);

        for option in options {
            match option {
                DebugOption::Mirror(m) => {
                    if mirror.replace(m).is_some() {
                        return Err(SetupError::Session("more than one debug log".to_string()));
                    }
                }
                DebugOption::Config(c) => {
                    if live || replay {
                        return Err(SetupError::Session(
                            "debug config must be applied before live or replay sources".to_string(),
                        ));
                    }
                    if std::mem::replace(&mut config, true) {
                        return Err(SetupError::Session("more than one debug config".to_string()));
                    }
                    adapter.set_config(c);
                }
                DebugOption::Live(endpoint) => {
                    if std::mem::replace(&mut live, true) {
                        return Err(SetupError::Session("more than one algod endpoint".to_string()));
                    }
                    adapter.set_live(endpoint);
                }
                DebugOption::Replay(response) => {
                    if std::mem::replace(&mut replay, true) {
                        return Err(SetupError::Session("more than one replay file".to_string()));
                    }
                    adapter.set_replay(response);
                }
            }
        }

        Ok(Self { adapter, mirror })
    }

    /// Serves the session until the client disconnects.
    pub fn run(mut self) -> Result<(), SetupError> {
        let (debug_writer, log_rx) = DebugConsoleWriter::new();

        #[cfg(debug_assertions)]
        let log_level = tracing::Level::DEBUG;
        #[cfg(not(debug_assertions))]
        let log_level = tracing::Level::INFO;

        // a global subscriber may already be installed when embedded
        let _ = tracing_subscriber::fmt()
            .with_max_level(log_level)
            .with_ansi(false)
            .with_writer(debug_writer)
            .try_init();

        info!("Starting tealsp debug adapter");

        let result = match &self.mirror {
            Some(mirror) => server::serve(
                &mut self.adapter,
                mirror.reader(io::stdin()),
                mirror.writer(io::stdout()),
                &log_rx,
            ),
            None => server::serve(&mut self.adapter, io::stdin(), io::stdout(), &log_rx),
        };

        result.map_err(|e| SetupError::Runtime(e.to_string()))
    }
}
