//! Decrypting reader.

use std::io::{self, Read};

use streamset_core::{Result, StreamError};

use crate::crypto::{SegmentCipher, SegmentedKey, StreamHeader, HEADER_LEN, TAG_LEN};
use crate::params::SegmentedParams;

/// Decrypts a segmented stream read from an inner source.
///
/// The header is read when the reader is created. Segments are then loaded
/// one at a time; a segment's plaintext is only handed out after its tag
/// verified. To tell the last segment apart from a full one, the reader
/// looks one byte past each full segment.
///
/// After an authentication failure every further read fails.
pub struct DecryptingReader<R: Read> {
    source: R,
    cipher: SegmentCipher,
    params: SegmentedParams,
    /// Ciphertext of the segment being loaded, plus a lookahead byte.
    ciphertext: Vec<u8>,
    plaintext: Vec<u8>,
    plaintext_pos: usize,
    counter: u32,
    reached_end: bool,
    failed: bool,
}

impl<R: Read> DecryptingReader<R> {
    /// Read the stream header from `source` and prepare to decrypt.
    pub fn new(
        mut source: R,
        key: &SegmentedKey,
        params: SegmentedParams,
        associated_data: &[u8],
    ) -> Result<Self> {
        params.validate()?;

        let mut header_bytes = [0u8; HEADER_LEN];
        source.read_exact(&mut header_bytes).map_err(|e| match e.kind() {
            io::ErrorKind::UnexpectedEof => {
                StreamError::Decryption("stream shorter than header".to_string())
            }
            _ => StreamError::from(e),
        })?;
        let header = StreamHeader::from_bytes(&header_bytes)?;

        Ok(Self {
            source,
            cipher: key.segment_cipher(&header, associated_data),
            params,
            ciphertext: Vec::with_capacity(params.segment_size + 1),
            plaintext: Vec::with_capacity(params.segment_size),
            plaintext_pos: 0,
            counter: 0,
            reached_end: false,
            failed: false,
        })
    }

    /// Whether the final segment has been authenticated.
    pub fn is_complete(&self) -> bool {
        self.reached_end
    }

    /// Give back the source.
    pub fn into_inner(self) -> R {
        self.source
    }

    /// Fill the ciphertext buffer up to one segment plus lookahead, or EOF.
    fn fill_ciphertext(&mut self) -> io::Result<()> {
        let want = self.params.segment_size + 1;
        while self.ciphertext.len() < want {
            let start = self.ciphertext.len();
            self.ciphertext.resize(want, 0);
            match self.source.read(&mut self.ciphertext[start..]) {
                Ok(0) => {
                    self.ciphertext.truncate(start);
                    break;
                }
                Ok(n) => self.ciphertext.truncate(start + n),
                Err(e) if e.kind() == io::ErrorKind::Interrupted => {
                    self.ciphertext.truncate(start);
                }
                Err(e) => {
                    self.ciphertext.truncate(start);
                    return Err(e);
                }
            }
        }
        Ok(())
    }

    fn load_segment(&mut self) -> io::Result<()> {
        self.fill_ciphertext()?;

        let last = self.ciphertext.len() <= self.params.segment_size;
        let lookahead = if last { None } else { self.ciphertext.pop() };

        if self.ciphertext.len() < TAG_LEN {
            return Err(self.fail(StreamError::Decryption(format!(
                "segment {} is truncated",
                self.counter
            ))));
        }
        if !last && self.counter == u32::MAX {
            return Err(self.fail(StreamError::Decryption("too many segments".to_string())));
        }
        if let Err(e) = self
            .cipher
            .open_in_place(self.counter, last, &mut self.ciphertext)
        {
            return Err(self.fail(e));
        }

        std::mem::swap(&mut self.plaintext, &mut self.ciphertext);
        self.plaintext_pos = 0;
        self.ciphertext.clear();
        self.ciphertext.extend(lookahead);

        if last {
            self.reached_end = true;
        } else {
            self.counter += 1;
        }
        Ok(())
    }

    fn fail(&mut self, err: StreamError) -> io::Error {
        self.failed = true;
        self.plaintext.clear();
        self.plaintext_pos = 0;
        err.into()
    }
}

impl<R: Read> Read for DecryptingReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }
        loop {
            if self.failed {
                return Err(StreamError::Decryption("stream already failed".to_string()).into());
            }
            let available = &self.plaintext[self.plaintext_pos..];
            if !available.is_empty() {
                let n = available.len().min(buf.len());
                buf[..n].copy_from_slice(&available[..n]);
                self.plaintext_pos += n;
                return Ok(n);
            }
            if self.reached_end {
                return Ok(0);
            }
            self.load_segment()?;
        }
    }
}
