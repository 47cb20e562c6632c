use std::io::{self, Write};

use crossbeam_channel::{Receiver, Sender};
use tracing_subscriber::fmt::MakeWriter;

/// Forwards formatted log lines to the adapter loop, which turns them into
/// `output` events on the client's debug console.
#[derive(Clone)]
pub struct DebugConsoleWriter {
    sender: Sender<String>,
}

impl DebugConsoleWriter {
    pub fn new() -> (Self, Receiver<String>) {
        let (tx, rx) = crossbeam_channel::unbounded();
        (Self { sender: tx }, rx)
    }
}

impl Write for DebugConsoleWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        // a closed channel means the session is over; dropping the line is fine
        let _ = self.sender.send(String::from_utf8_lossy(buf).into_owned());
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for DebugConsoleWriter {
    type Writer = Self;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_writer_forwards_lines() {
        let (writer, rx) = DebugConsoleWriter::new();
        let mut w = writer.make_writer();
        write!(w, "hello").unwrap();

        assert_eq!(rx.try_recv().unwrap(), "hello");
    }

    #[test]
    fn test_writer_survives_closed_channel() {
        let (mut writer, rx) = DebugConsoleWriter::new();
        drop(rx);

        assert_eq!(writer.write(b"lost").unwrap(), 4);
    }
}
