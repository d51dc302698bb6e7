//! Replayable sources for trial decryption.
//!
//! Trying a key consumes bytes from the source. The next key has to see the
//! same bytes again, so the source is wrapped in something that can go back
//! to where the first attempt started:
//!
//! - [`RewindableReader`] records what attempts pull from a plain reader and
//!   replays it.
//! - [`SeekRewinder`] seeks back on sources that support it and buffers
//!   nothing.
//!
//! Once a key is chosen the source is committed: rewinding is no longer
//! possible and the replay buffer drains away as it is read.

use std::io::{self, Read, Seek, SeekFrom};
use std::sync::{Arc, Mutex};

use bytes::{Buf, BytesMut};

/// A source that decryption attempts can restart from the beginning.
pub trait TrialSource: Read {
    /// Go back to the position the first attempt started from.
    ///
    /// Fails after [`TrialSource::commit`].
    fn restart(&mut self) -> io::Result<()>;

    /// Stop recording; no more restarts will be requested.
    fn commit(&mut self);
}

/// Records bytes read from a plain reader so they can be replayed.
///
/// Reads first drain the recorded prefix from the replay position, then fall
/// through to the inner reader. While rewinding is enabled everything read
/// from the inner reader is appended to the prefix, up to `limit` bytes.
pub struct RewindableReader<R> {
    inner: R,
    buffer: BytesMut,
    pos: usize,
    rewindable: bool,
    limit: usize,
}

impl<R: Read> RewindableReader<R> {
    /// Wrap `inner`, buffering at most `limit` bytes for replay.
    pub fn new(inner: R, limit: usize) -> Self {
        Self {
            inner,
            buffer: BytesMut::new(),
            pos: 0,
            rewindable: true,
            limit,
        }
    }

    /// Bytes currently held for replay.
    pub fn buffered_len(&self) -> usize {
        self.buffer.len()
    }

    /// Whether [`TrialSource::restart`] is still allowed.
    pub fn is_rewindable(&self) -> bool {
        self.rewindable
    }

    fn read_buffered(&mut self, buf: &mut [u8]) -> usize {
        let available = &self.buffer[self.pos..];
        let n = available.len().min(buf.len());
        buf[..n].copy_from_slice(&available[..n]);
        if self.rewindable {
            self.pos += n;
        } else {
            self.buffer.advance(n);
        }
        n
    }
}

impl<R: Read> Read for RewindableReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }
        if self.pos < self.buffer.len() {
            return Ok(self.read_buffered(buf));
        }
        if !self.rewindable {
            return self.inner.read(buf);
        }

        let room = self.limit.saturating_sub(self.buffer.len());
        if room == 0 {
            return Err(io::Error::new(
                io::ErrorKind::Other,
                "rewind buffer limit exceeded",
            ));
        }
        let want = buf.len().min(room);
        let n = self.inner.read(&mut buf[..want])?;
        self.buffer.extend_from_slice(&buf[..n]);
        self.pos += n;
        Ok(n)
    }
}

impl<R: Read> TrialSource for RewindableReader<R> {
    fn restart(&mut self) -> io::Result<()> {
        if !self.rewindable {
            return Err(io::Error::new(
                io::ErrorKind::Other,
                "source already committed",
            ));
        }
        self.pos = 0;
        Ok(())
    }

    fn commit(&mut self) {
        if !self.rewindable {
            return;
        }
        self.rewindable = false;
        // From here on the buffer only holds bytes not yet replayed
        self.buffer.advance(self.pos);
        self.pos = 0;
        if self.buffer.is_empty() {
            self.buffer = BytesMut::new();
        }
    }
}

/// Restarts a seekable source by seeking back to its starting position.
pub struct SeekRewinder<R> {
    inner: R,
    start: u64,
    rewindable: bool,
}

impl<R: Read + Seek> SeekRewinder<R> {
    /// Remember the current position of `inner` as the restart point.
    pub fn new(mut inner: R) -> io::Result<Self> {
        let start = inner.stream_position()?;
        Ok(Self {
            inner,
            start,
            rewindable: true,
        })
    }

    /// The restart position.
    pub fn start(&self) -> u64 {
        self.start
    }
}

impl<R: Read> Read for SeekRewinder<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.inner.read(buf)
    }
}

impl<R: Read + Seek> TrialSource for SeekRewinder<R> {
    fn restart(&mut self) -> io::Result<()> {
        if !self.rewindable {
            return Err(io::Error::new(
                io::ErrorKind::Other,
                "source already committed",
            ));
        }
        self.inner.seek(SeekFrom::Start(self.start))?;
        Ok(())
    }

    fn commit(&mut self) {
        self.rewindable = false;
    }
}

/// A cloneable handle to one trial source.
///
/// Every decryption attempt reads through its own handle while the trial
/// keeps another one to restart and commit. Attempts run one after another,
/// so the lock is never contended.
pub struct SharedSource<S> {
    inner: Arc<Mutex<S>>,
}

impl<S> SharedSource<S> {
    /// Share `source`.
    pub fn new(source: S) -> Self {
        Self {
            inner: Arc::new(Mutex::new(source)),
        }
    }

    /// Run `f` with exclusive access to the source.
    ///
    /// Fails once a holder of the lock has panicked.
    pub fn with<T>(&self, f: impl FnOnce(&mut S) -> io::Result<T>) -> io::Result<T> {
        let mut guard = self
            .inner
            .lock()
            .map_err(|_| io::Error::new(io::ErrorKind::Other, "trial source lock poisoned"))?;
        f(&mut *guard)
    }
}

impl<S: TrialSource> SharedSource<S> {
    /// Restart the shared source.
    pub fn restart(&self) -> io::Result<()> {
        self.with(TrialSource::restart)
    }

    /// Commit the shared source.
    pub fn commit(&self) -> io::Result<()> {
        self.with(|source| {
            source.commit();
            Ok(())
        })
    }
}

impl<S> Clone for SharedSource<S> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<S: Read> Read for SharedSource<S> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.with(|source| source.read(buf))
    }
}
