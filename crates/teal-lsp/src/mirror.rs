use std::fs::File;
use std::io::{self, Write};
use std::path::Path;
use std::pin::Pin;
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll};

use tokio::io::{AsyncRead, AsyncWrite, ReadBuf};
use tracing::warn;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Editor to server.
    Incoming,
    /// Server to editor.
    Outgoing,
}

impl Direction {
    fn marker(self) -> &'static str {
        match self {
            Direction::Incoming => "<--",
            Direction::Outgoing => "-->",
        }
    }
}

/// A debug log that receives a copy of all protocol traffic. The first failed
/// write closes it.
#[derive(Debug, Clone)]
pub struct Mirror {
    file: Arc<Mutex<Option<File>>>,
}

impl Mirror {
    pub fn create(path: &Path) -> io::Result<Self> {
        File::create(path).map(Self::new)
    }

    fn new(file: File) -> Self {
        Self {
            file: Arc::new(Mutex::new(Some(file))),
        }
    }

    pub fn record(&self, direction: Direction, bytes: &[u8]) {
        if bytes.is_empty() {
            return;
        }

        let Ok(mut slot) = self.file.lock() else {
            return;
        };
        let Some(file) = slot.as_mut() else {
            return;
        };

        if let Err(e) = write_entry(file, direction, bytes) {
            warn!(error = %e, "Failed to write debug log, closing it");
            *slot = None;
        }
    }

    pub fn wrap<S>(&self, inner: S, direction: Direction) -> Mirrored<S> {
        Mirrored {
            inner,
            mirror: self.clone(),
            direction,
        }
    }
}

fn write_entry(file: &mut File, direction: Direction, bytes: &[u8]) -> io::Result<()> {
    write!(file, "{} ", direction.marker())?;
    file.write_all(bytes)?;
    file.write_all(b"\n")?;
    file.flush()
}

/// A stream half whose traffic is copied into a [`Mirror`].
#[derive(Debug)]
pub struct Mirrored<S> {
    inner: S,
    mirror: Mirror,
    direction: Direction,
}

impl<S: AsyncRead + Unpin> AsyncRead for Mirrored<S> {
    fn poll_read(mut self: Pin<&mut Self>, cx: &mut Context<'_>, buf: &mut ReadBuf<'_>) -> Poll<io::Result<()>> {
        let before = buf.filled().len();
        let poll = Pin::new(&mut self.inner).poll_read(cx, buf);

        if let Poll::Ready(Ok(())) = poll {
            self.mirror
                .record(self.direction, buf.filled().get(before..).unwrap_or_default());
        }

        poll
    }
}

impl<S: AsyncWrite + Unpin> AsyncWrite for Mirrored<S> {
    fn poll_write(mut self: Pin<&mut Self>, cx: &mut Context<'_>, buf: &[u8]) -> Poll<io::Result<usize>> {
        let poll = Pin::new(&mut self.inner).poll_write(cx, buf);

        if let Poll::Ready(Ok(written)) = poll {
            self.mirror
                .record(self.direction, buf.get(..written).unwrap_or_default());
        }

        poll
    }

    fn poll_flush(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Pin::new(&mut self.inner).poll_flush(cx)
    }

    fn poll_shutdown(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Pin::new(&mut self.inner).poll_shutdown(cx)
    }
}

#[cfg(test)]
mod tests {
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    use super::*;

    #[tokio::test]
    async fn test_mirror_records_both_directions() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("debug.log");
        let mirror = Mirror::create(&path).unwrap();

        let (client, server) = tokio::io::duplex(64);
        let mut writer = mirror.wrap(client, Direction::Outgoing);
        let mut reader = mirror.wrap(server, Direction::Incoming);

        writer.write_all(b"ping").await.unwrap();
        let mut buf = [0u8; 4];
        reader.read_exact(&mut buf).await.unwrap();

        assert_eq!(&buf, b"ping");
        let log = std::fs::read_to_string(&path).unwrap();
        assert_eq!(log, "--> ping\n<-- ping\n");
    }

    #[tokio::test]
    async fn test_mirror_closes_after_failed_write() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("debug.log");
        std::fs::write(&path, "").unwrap();
        let mirror = Mirror::new(File::open(&path).unwrap());

        let (client, mut server) = tokio::io::duplex(64);
        let mut writer = mirror.wrap(client, Direction::Outgoing);
        writer.write_all(b"one").await.unwrap();
        writer.write_all(b"two").await.unwrap();

        let mut buf = [0u8; 6];
        server.read_exact(&mut buf).await.unwrap();
        assert_eq!(&buf, b"onetwo");
        assert!(mirror.file.lock().unwrap().is_none());
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "");
    }

    #[test]
    fn test_mirror_create_fails_for_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        assert!(Mirror::create(&dir.path().join("missing").join("x.log")).is_err());
    }
}
