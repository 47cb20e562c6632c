use std::fs::File;
use std::io::{self, Read, Write};
use std::path::Path;
use std::sync::{Arc, Mutex};

/// A debug log that receives a copy of all debug adapter traffic.
///
/// Client requests are recorded as `<-- ` lines and adapter output as `--> `
/// lines, in the order the bytes pass through. The first failed write closes
/// the log; traffic keeps flowing without it.
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

    fn record(&self, marker: &str, bytes: &[u8]) {
        if bytes.is_empty() {
            return;
        }

        let Ok(mut slot) = self.file.lock() else {
            return;
        };
        let Some(file) = slot.as_mut() else {
            return;
        };

        let written = write!(file, "{} ", marker)
            .and_then(|_| file.write_all(bytes))
            .and_then(|_| file.write_all(b"\n"))
            .and_then(|_| file.flush());
        if let Err(e) = written {
            // tracing output is mirrored as output events, so report straight to stderr.
            eprintln!("Failed to write debug log, closing it: {}", e);
            *slot = None;
        }
    }

    pub fn reader<R: Read>(&self, inner: R) -> MirroredReader<R> {
        MirroredReader {
            inner,
            mirror: self.clone(),
        }
    }

    pub fn writer<W: Write>(&self, inner: W) -> MirroredWriter<W> {
        MirroredWriter {
            inner,
            mirror: self.clone(),
        }
    }
}

#[derive(Debug)]
pub struct MirroredReader<R> {
    inner: R,
    mirror: Mirror,
}

impl<R: Read> Read for MirroredReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let read = self.inner.read(buf)?;
        self.mirror.record("<--", buf.get(..read).unwrap_or_default());
        Ok(read)
    }
}

#[derive(Debug)]
pub struct MirroredWriter<W> {
    inner: W,
    mirror: Mirror,
}

impl<W: Write> Write for MirroredWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let written = self.inner.write(buf)?;
        self.mirror.record("-->", buf.get(..written).unwrap_or_default());
        Ok(written)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}
