use std::path::Path;

use tokio::io::{AsyncRead, AsyncWrite};
use tower_lsp_server::{LspService, Server};
use tracing::{debug, info};

use crate::diagnostics::DiagnosticsHandler;
use crate::error::LspError;
use crate::mirror::{Direction, Mirror};
use crate::server::Backend;
use crate::transport::Transport;

/// One configuration effect applied to a session under construction.
#[derive(Debug, Clone)]
pub enum SessionOption {
    Diagnostics(DiagnosticsHandler),
    Mirror(Mirror),
}

/// Accumulates options for an editor-protocol session.
///
/// The option set is validated by [`SessionBuilder::build`]: it must contain
/// exactly one diagnostics handler and at most one mirror.
#[derive(Debug)]
pub struct SessionBuilder {
    transport: Transport,
    options: Vec<SessionOption>,
}

impl SessionBuilder {
    pub fn new(transport: Transport) -> Self {
        Self {
            transport,
            options: Vec::new(),
        }
    }

    pub fn option(mut self, option: SessionOption) -> Self {
        self.options.push(option);
        self
    }

    pub fn diagnostics(self, handler: DiagnosticsHandler) -> Self {
        self.option(SessionOption::Diagnostics(handler))
    }

    /// Opens `path` for writing and mirrors protocol traffic into it.
    pub fn debug_sink(self, path: &Path) -> Result<Self, LspError> {
        let mirror = Mirror::create(path).map_err(|source| LspError::DebugSink {
            path: path.to_path_buf(),
            source,
        })?;
        debug!(path = %path.display(), "Mirroring protocol traffic");
        Ok(self.option(SessionOption::Mirror(mirror)))
    }

    pub fn options(&self) -> &[SessionOption] {
        &self.options
    }

    pub fn build(self) -> Result<Session, LspError> {
        let mut handler = None;
        let mut mirror = None;

        for option in self.options {
            match option {
                SessionOption::Diagnostics(h) => {
                    if handler.replace(h).is_some() {
                        return Err(LspError::Options("more than one diagnostics handler".to_string()));
                    }
                }
                SessionOption::Mirror(m) => {
                    if mirror.replace(m).is_some() {
                        return Err(LspError::Options("more than one debug log".to_string()));
                    }
                }
            }
        }

        let handler = handler.ok_or_else(|| LspError::Options("no diagnostics handler".to_string()))?;
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .build()
            .map_err(LspError::Runtime)?;

        Ok(Session {
            runtime,
            transport: self.transport,
            handler,
            mirror,
        })
    }
}

/// A constructed editor-protocol session, ready to [`run`](Session::run).
#[derive(Debug)]
pub struct Session {
    runtime: tokio::runtime::Runtime,
    transport: Transport,
    handler: DiagnosticsHandler,
    mirror: Option<Mirror>,
}

impl Session {
    pub fn build(
        transport: Transport,
        handler: DiagnosticsHandler,
        debug_sink: Option<&Path>,
    ) -> Result<Self, LspError> {
        let mut builder = SessionBuilder::new(transport).diagnostics(handler);
        if let Some(path) = debug_sink {
            builder = builder.debug_sink(path)?;
        }
        builder.build()
    }

    /// Serves until the transport closes or the editor asks the server to exit.
    pub fn run(self) -> Result<(), LspError> {
        let Session {
            runtime,
            transport,
            handler,
            mirror,
        } = self;

        let result = runtime.block_on(async move {
            match transport {
                Transport::Stdio => serve(tokio::io::stdin(), tokio::io::stdout(), handler, mirror).await,
                Transport::Tcp(stream) => {
                    stream.set_nonblocking(true).map_err(LspError::Transport)?;
                    let stream = tokio::net::TcpStream::from_std(stream).map_err(LspError::Transport)?;
                    let (read, write) = stream.into_split();
                    serve(read, write, handler, mirror).await
                }
                #[cfg(unix)]
                Transport::Unix(stream) => {
                    stream.set_nonblocking(true).map_err(LspError::Transport)?;
                    let stream = tokio::net::UnixStream::from_std(stream).map_err(LspError::Transport)?;
                    let (read, write) = stream.into_split();
                    serve(read, write, handler, mirror).await
                }
            }
            Ok::<_, LspError>(())
        });

        // A pending stdin read would otherwise keep the runtime alive.
        runtime.shutdown_background();
        result
    }
}

/// Runs the language server over an arbitrary duplex.
pub async fn serve<I, O>(input: I, output: O, handler: DiagnosticsHandler, mirror: Option<Mirror>)
where
    I: AsyncRead + Unpin,
    O: AsyncWrite + Unpin,
{
    let (service, socket) = LspService::new(|client| Backend::new(client, handler));
    info!("Starting tealsp language server");

    match mirror {
        Some(mirror) => {
            Server::new(
                mirror.wrap(input, Direction::Incoming),
                mirror.wrap(output, Direction::Outgoing),
                socket,
            )
            .serve(service)
            .await
        }
        None => Server::new(input, output, socket).serve(service).await,
    }

    info!("Language server stopped");
}
