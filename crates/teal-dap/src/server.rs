use std::io::{BufReader, BufWriter, Read, Write};

use crossbeam_channel::Receiver;
use dap::prelude::*;
use tracing::{debug, info};

use crate::adapter::{DynResult, TealAdapter};

/// Runs the request loop until the client disconnects or the input ends.
///
/// Log lines queued on `log_rx` are forwarded to the client as `output` events
/// before and after every request.
pub fn serve<R: Read, W: Write>(
    adapter: &mut TealAdapter,
    input: R,
    output: W,
    log_rx: &Receiver<String>,
) -> DynResult<()> {
    let mut server = Server::new(BufReader::new(input), BufWriter::new(output));

    loop {
        forward_logs(adapter, &mut server, log_rx);

        let Some(req) = server.poll_request()? else {
            info!("Client disconnected or stream ended");
            break;
        };

        debug!(seq = req.seq, "Received request");
        let flow = adapter.handle_request(req, &mut server)?;
        forward_logs(adapter, &mut server, log_rx);

        if flow.is_break() {
            break;
        }
    }

    Ok(())
}

fn forward_logs(adapter: &TealAdapter, server: &mut Server<impl Read, impl Write>, log_rx: &Receiver<String>) {
    while let Ok(line) = log_rx.try_recv() {
        if let Err(e) = adapter.send_log_output(&line, server) {
            eprintln!("Failed to send log output: {}", e);
        }
    }
}
