use std::io;
use std::net::{TcpStream, ToSocketAddrs};
#[cfg(unix)]
use std::os::unix::net::UnixStream;

use tracing::debug;

use crate::error::LspError;

/// The byte stream an editor-protocol session runs over.
#[derive(Debug)]
pub enum Transport {
    Stdio,
    Tcp(TcpStream),
    #[cfg(unix)]
    Unix(UnixStream),
}

impl Transport {
    pub fn is_stdio(&self) -> bool {
        matches!(self, Transport::Stdio)
    }
}

/// Dials `address` on `network` when both are non-empty; otherwise falls back to
/// standard input/output. A single connection attempt is made.
pub fn select(network: &str, address: &str) -> Result<Transport, LspError> {
    if network.is_empty() || address.is_empty() {
        debug!("Using stdio transport");
        return Ok(Transport::Stdio);
    }

    debug!(network, address, "Dialing editor");
    dial(network, address)
}

fn dial(network: &str, address: &str) -> Result<Transport, LspError> {
    let dial_error = |source: io::Error| LspError::Dial {
        network: network.to_string(),
        address: address.to_string(),
        source,
    };

    match network {
        "tcp" => TcpStream::connect(address)
            .map(Transport::Tcp)
            .map_err(dial_error),
        "tcp4" | "tcp6" => {
            let want_v4 = network == "tcp4";
            let candidates = address
                .to_socket_addrs()
                .map_err(dial_error)?
                .filter(|addr| addr.is_ipv4() == want_v4)
                .collect::<Vec<_>>();

            if candidates.is_empty() {
                return Err(dial_error(io::Error::new(
                    io::ErrorKind::AddrNotAvailable,
                    format!("no {} address found", network),
                )));
            }

            TcpStream::connect(candidates.as_slice())
                .map(Transport::Tcp)
                .map_err(dial_error)
        }
        #[cfg(unix)]
        "unix" => UnixStream::connect(address)
            .map(Transport::Unix)
            .map_err(dial_error),
        other => Err(LspError::UnsupportedNetwork(other.to_string())),
    }
}
