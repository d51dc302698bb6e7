//! Ordered trial decryption.
//!
//! RAW ciphertexts carry no key id, so the only way to find the right key is
//! to try them. The trial walks the candidates in order and, for each one,
//! opens a decrypting reader over a replay of the source and reads once.
//! Segmented ciphers authenticate a whole segment before returning anything,
//! so that single read either yields authenticated plaintext (commit) or
//! fails (next candidate). A wrong key therefore costs at most one segment
//! of input, never the whole stream.
//!
//! ```text
//! Trying(0) -> Trying(1) -> ... -> Trying(n) -> Failed
//!     |            |
//!     +------------+------> Committed(key)
//! ```
//!
//! After commit the source stops buffering and every later error is final.

use std::fmt;
use std::io::{self, Read};
use std::sync::Arc;

use bytes::{Buf, Bytes};
use streamset_core::{
    BoxedRead, FramingType, KeyEntry, KeyId, Result, StreamError, StreamingAead,
};

use crate::rewind::{SharedSource, TrialSource};

/// One key the trial may pick.
#[derive(Clone)]
pub(crate) struct Candidate {
    pub key_id: KeyId,
    pub primitive: Arc<dyn StreamingAead>,
    pub framing: FramingType,
}

impl Candidate {
    pub fn from_entry(entry: &KeyEntry<dyn StreamingAead>) -> Self {
        Self {
            key_id: entry.key_id(),
            primitive: Arc::clone(entry.primitive()),
            framing: entry.framing(),
        }
    }
}

impl fmt::Debug for Candidate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Candidate")
            .field("key_id", &self.key_id)
            .field("framing", &self.framing)
            .finish_non_exhaustive()
    }
}

enum TrialState<'a> {
    Trying(usize),
    Committed(Commit<'a>),
    Failed,
}

struct Commit<'a> {
    key_id: KeyId,
    reader: BoxedRead<'a>,
    probe: Vec<u8>,
}

/// State of one decryption call. Never shared between calls.
pub(crate) struct StreamTrial<'c, S> {
    candidates: &'c [Candidate],
    source: SharedSource<S>,
    associated_data: &'c [u8],
    probe_len: usize,
    attempted: Vec<KeyId>,
}

impl<'c, S: TrialSource + Send> StreamTrial<'c, S> {
    pub fn new(
        candidates: &'c [Candidate],
        source: S,
        associated_data: &'c [u8],
        probe_len: usize,
    ) -> Self {
        Self {
            candidates,
            source: SharedSource::new(source),
            associated_data,
            probe_len,
            attempted: Vec::with_capacity(candidates.len()),
        }
    }

    /// Try candidates until one authenticates the first segment.
    pub fn run<'a>(mut self) -> Result<DecryptingReader<'a>>
    where
        S: 'a,
    {
        let mut state = TrialState::Trying(0);
        loop {
            state = match state {
                TrialState::Trying(index) => self.step(index),
                TrialState::Committed(commit) => return self.commit(commit),
                TrialState::Failed => {
                    tracing::debug!(
                        candidates = self.candidates.len(),
                        "no candidate key authenticated the stream"
                    );
                    return Err(StreamError::NoMatchingKey);
                }
            };
        }
    }

    fn step<'a>(&mut self, index: usize) -> TrialState<'a>
    where
        S: 'a,
    {
        let Some(candidate) = self.candidates.get(index) else {
            return TrialState::Failed;
        };

        match self.attempt(candidate) {
            Some((reader, probe)) => TrialState::Committed(Commit {
                key_id: candidate.key_id,
                reader,
                probe,
            }),
            None => {
                tracing::trace!(key_id = %candidate.key_id, "candidate rejected stream");
                self.attempted.push(candidate.key_id);
                TrialState::Trying(index + 1)
            }
        }
    }

    /// Every failure is folded into `None`; the caller only learns that
    /// this candidate did not match.
    fn attempt<'a>(&self, candidate: &Candidate) -> Option<(BoxedRead<'a>, Vec<u8>)>
    where
        S: 'a,
    {
        self.source.restart().ok()?;

        let mut reader = candidate
            .primitive
            .new_decrypting_reader(Box::new(self.source.clone()), self.associated_data)
            .ok()?;

        let mut probe = vec![0u8; self.probe_len];
        loop {
            match reader.read(&mut probe) {
                Ok(n) => {
                    probe.truncate(n);
                    return Some((reader, probe));
                }
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(_) => return None,
            }
        }
    }

    fn commit<'a>(self, commit: Commit<'a>) -> Result<DecryptingReader<'a>> {
        self.source.commit()?;
        tracing::debug!(
            key_id = %commit.key_id,
            rejected = self.attempted.len(),
            "committed to candidate key"
        );
        Ok(DecryptingReader {
            key_id: commit.key_id,
            pending: Bytes::from(commit.probe),
            inner: commit.reader,
            failed: false,
        })
    }
}

/// Plaintext reader returned by the keyset primitive.
///
/// Bound to the key that authenticated the first segment. Any error after
/// that is reported as [`StreamError::Decryption`] and is final; no other
/// key is tried.
pub struct DecryptingReader<'a> {
    key_id: KeyId,
    pending: Bytes,
    inner: BoxedRead<'a>,
    failed: bool,
}

impl DecryptingReader<'_> {
    /// The key that decrypts this stream.
    pub fn key_id(&self) -> KeyId {
        self.key_id
    }
}

impl Read for DecryptingReader<'_> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }
        if self.failed {
            return Err(StreamError::Decryption("stream already failed".to_string()).into());
        }
        if self.pending.has_remaining() {
            let n = self.pending.remaining().min(buf.len());
            self.pending.copy_to_slice(&mut buf[..n]);
            return Ok(n);
        }

        match self.inner.read(buf) {
            Ok(n) => Ok(n),
            Err(e) if e.kind() == io::ErrorKind::Interrupted => Err(e),
            Err(e) => {
                self.failed = true;
                tracing::debug!(key_id = %self.key_id, error = %e, "decryption failed after key selection");
                Err(into_terminal(e))
            }
        }
    }
}

impl fmt::Debug for DecryptingReader<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DecryptingReader")
            .field("key_id", &self.key_id)
            .field("pending", &self.pending.len())
            .field("failed", &self.failed)
            .finish_non_exhaustive()
    }
}

fn into_terminal(err: io::Error) -> io::Error {
    match StreamError::from_io(&err) {
        Some(StreamError::Decryption(_)) => err,
        _ => StreamError::Decryption(err.to_string()).into(),
    }
}
