//! Encrypting writer.

use std::io::{self, Write};

use streamset_core::{EncryptingWrite, Result, StreamError};

use crate::crypto::{SegmentCipher, SegmentedKey, StreamHeader};
use crate::params::SegmentedParams;

/// Encrypts everything written to it into an inner sink.
///
/// The header is written when the writer is created. A full plaintext
/// segment is held back until more data arrives, because only then is it
/// known not to be the last one. [`EncryptingWriter::finish`] seals the
/// final segment; dropping an unfinished writer tries to do the same and
/// ignores any error.
///
/// After a sealing or sink error every further call fails.
pub struct EncryptingWriter<W: Write> {
    sink: Option<W>,
    cipher: SegmentCipher,
    params: SegmentedParams,
    buffer: Vec<u8>,
    counter: u32,
    finished: bool,
    failed: bool,
}

impl<W: Write> EncryptingWriter<W> {
    /// Start a new stream, writing its header to `sink`.
    pub fn new(
        mut sink: W,
        key: &SegmentedKey,
        params: SegmentedParams,
        associated_data: &[u8],
    ) -> Result<Self> {
        params.validate()?;

        let header = StreamHeader::generate();
        sink.write_all(&header.to_bytes())
            .map_err(|e| StreamError::Encryption(format!("failed to write header: {e}")))?;

        Ok(Self {
            sink: Some(sink),
            cipher: key.segment_cipher(&header, associated_data),
            params,
            buffer: Vec::with_capacity(params.segment_size),
            counter: 0,
            finished: false,
            failed: false,
        })
    }

    /// Seal the final segment, flush, and return the sink.
    pub fn finish(mut self) -> io::Result<W> {
        self.finalize()?;
        self.sink
            .take()
            .ok_or_else(|| StreamError::Encryption("writer has no sink".to_string()).into())
    }

    /// Number of segments sealed so far.
    pub fn segments_written(&self) -> u32 {
        self.counter
    }

    fn seal_segment(&mut self, last: bool) -> io::Result<()> {
        if self.failed {
            return Err(StreamError::Encryption("stream already failed".to_string()).into());
        }
        let result = self.try_seal_segment(last);
        if result.is_err() {
            // The buffer may already hold ciphertext
            self.failed = true;
            self.buffer.clear();
        }
        result
    }

    fn try_seal_segment(&mut self, last: bool) -> io::Result<()> {
        if !last && self.counter == u32::MAX {
            return Err(StreamError::Encryption("too many segments".to_string()).into());
        }
        let sink = self
            .sink
            .as_mut()
            .ok_or_else(|| StreamError::Encryption("writer has no sink".to_string()))?;

        self.cipher
            .seal_in_place(self.counter, last, &mut self.buffer)?;
        sink.write_all(&self.buffer)?;
        self.buffer.clear();

        if !last {
            self.counter += 1;
        }
        Ok(())
    }

    fn finalize(&mut self) -> io::Result<()> {
        if self.finished {
            return Ok(());
        }
        self.finished = true;
        self.seal_segment(true)?;
        if let Some(sink) = self.sink.as_mut() {
            sink.flush()?;
        }
        Ok(())
    }
}

impl<W: Write> Write for EncryptingWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if self.finished {
            return Err(StreamError::Encryption("write after finish".to_string()).into());
        }
        if self.failed {
            return Err(StreamError::Encryption("stream already failed".to_string()).into());
        }

        let segment_len = self.params.plaintext_segment_size();
        let mut written = 0;
        while written < buf.len() {
            if self.buffer.len() == segment_len {
                self.seal_segment(false)?;
            }
            let take = (segment_len - self.buffer.len()).min(buf.len() - written);
            self.buffer.extend_from_slice(&buf[written..written + take]);
            written += take;
        }
        Ok(written)
    }

    /// Flushes the sink. Buffered plaintext stays buffered: a partial
    /// segment cannot be sealed without ending the stream.
    fn flush(&mut self) -> io::Result<()> {
        match self.sink.as_mut() {
            Some(sink) => sink.flush(),
            None => Ok(()),
        }
    }
}

impl<W: Write + Send> EncryptingWrite for EncryptingWriter<W> {
    fn finish(self: Box<Self>) -> io::Result<()> {
        EncryptingWriter::finish(*self).map(|_| ())
    }
}

impl<W: Write> Drop for EncryptingWriter<W> {
    fn drop(&mut self) {
        if !self.finished && !self.failed && self.sink.is_some() {
            let _ = self.finalize();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::{HEADER_LEN, TAG_LEN};

    fn small_params() -> SegmentedParams {
        SegmentedParams::new(64).unwrap()
    }

    #[test]
    fn test_header_written_on_creation() {
        let key = SegmentedKey::generate();
        let writer = EncryptingWriter::new(Vec::new(), &key, small_params(), b"").unwrap();

        let sink = writer.sink.as_ref().unwrap();
        assert_eq!(sink.len(), HEADER_LEN);
        assert_eq!(sink[0] as usize, HEADER_LEN);
    }

    #[test]
    fn test_full_segment_held_until_more_data() {
        let key = SegmentedKey::generate();
        let params = small_params();
        let mut writer = EncryptingWriter::new(Vec::new(), &key, params, b"").unwrap();

        writer
            .write_all(&vec![1u8; params.plaintext_segment_size()])
            .unwrap();
        assert_eq!(writer.segments_written(), 0);

        writer.write_all(&[2u8]).unwrap();
        assert_eq!(writer.segments_written(), 1);

        let out = writer.finish().unwrap();
        assert_eq!(out.len(), HEADER_LEN + params.segment_size + 1 + TAG_LEN);
    }

    #[test]
    fn test_empty_stream_has_final_segment() {
        let key = SegmentedKey::generate();
        let writer = EncryptingWriter::new(Vec::new(), &key, small_params(), b"").unwrap();
        let out = writer.finish().unwrap();
        assert_eq!(out.len(), HEADER_LEN + TAG_LEN);
    }

    #[test]
    fn test_drop_seals_final_segment() {
        let key = SegmentedKey::generate();
        let mut sink = Vec::new();
        {
            let mut writer = EncryptingWriter::new(&mut sink, &key, small_params(), b"").unwrap();
            writer.write_all(b"abc").unwrap();
        }
        assert_eq!(sink.len(), HEADER_LEN + 3 + TAG_LEN);
    }

    #[test]
    fn test_header_failure_is_encryption_error() {
        struct ClosedSink;
        impl Write for ClosedSink {
            fn write(&mut self, _: &[u8]) -> io::Result<usize> {
                Err(io::Error::new(io::ErrorKind::BrokenPipe, "closed"))
            }
            fn flush(&mut self) -> io::Result<()> {
                Ok(())
            }
        }

        let key = SegmentedKey::generate();
        let result = EncryptingWriter::new(ClosedSink, &key, small_params(), b"");
        assert!(matches!(result, Err(StreamError::Encryption(_))));
    }

    #[test]
    fn test_invalid_params_rejected() {
        let key = SegmentedKey::generate();
        let params = SegmentedParams { segment_size: 8 };
        let result = EncryptingWriter::new(Vec::new(), &key, params, b"");
        assert!(matches!(result, Err(StreamError::InvalidParameters(_))));
    }

    /// Accepts the header, rejects the first segment, then accepts again.
    struct FlakySink {
        written: Vec<u8>,
        writes: usize,
    }

    impl Write for FlakySink {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.writes += 1;
            if self.writes == 2 {
                return Err(io::Error::from(io::ErrorKind::WouldBlock));
            }
            self.written.extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_sink_error_poisons_writer() {
        let key = SegmentedKey::generate();
        let params = small_params();
        let sink = FlakySink {
            written: Vec::new(),
            writes: 0,
        };
        let mut writer = EncryptingWriter::new(sink, &key, params, b"").unwrap();

        writer
            .write_all(&vec![1u8; params.plaintext_segment_size()])
            .unwrap();
        let err = writer.write(&[2u8; 10]).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::WouldBlock);

        let err = writer.write(&[3u8; 10]).unwrap_err();
        assert!(matches!(
            StreamError::from_io(&err),
            Some(StreamError::Encryption(_))
        ));
        assert_eq!(writer.segments_written(), 0);
        assert!(writer.finish().is_err());
    }

    #[test]
    fn test_drop_after_sink_error_writes_nothing_more() {
        let key = SegmentedKey::generate();
        let params = small_params();
        let mut sink = FlakySink {
            written: Vec::new(),
            writes: 0,
        };
        {
            let mut writer = EncryptingWriter::new(&mut sink, &key, params, b"").unwrap();
            writer
                .write_all(&vec![1u8; params.plaintext_segment_size() + 1])
                .unwrap_err();
        }
        assert_eq!(sink.written.len(), HEADER_LEN);
    }
}
