use std::io;

use super::{Encoding, Error, ErrorMode, IncrementalEncoder, IntoEncoding, Result};

/// A writer wrapper that encodes an input UTF-8 byte stream into the specified encoding.
///
/// This wrapper accepts bytes through [`std::io::Write`] methods, encodes them through an
/// [`IncrementalEncoder`], and writes the encoded bytes into the underlying writer. A character
/// split across two `write` calls is withheld until its remaining bytes arrive; invalid UTF-8 is
/// encoded as U+FFFD, which is then subject to the error mode.
///
/// Encoded bytes that the underlying writer does not accept are kept in an internal buffer and
/// written first by the next call. To meet the requirements of [`std::io::Write`], a `write`
/// call that has consumed its input returns `Ok` even if the underlying writer then fails, and
/// the error is _deferred_ to the beginning of the subsequent call. A call that returns `Err`
/// has not consumed any input.
///
/// An unmappable character in [`ErrorMode::Strict`] is reported as [`std::io::Error`] of kind
/// `InvalidData` wrapping [`Error::UnmappableCodepoint`], and an underlying writer that stops
/// accepting bytes is reported as `WriteZero` wrapping [`Error::ShortWrite`].
/// [`Error::wrapped_in`] recovers either.
///
/// Call [`finish`](Self::finish) at the end of the input to flush a withheld trailing fragment.
///
/// # Examples
///
/// ```rust
/// use std::io::Write as _;
///
/// use webencodings::EncodingWriter;
///
/// let mut writer = EncodingWriter::new(Vec::new(), "x-user-defined", None)?;
/// write!(writer, "a\u{f7d9}")?;
/// writer.write_all(&"\u{f780}".as_bytes()[..1])?;
/// writer.write_all(&"\u{f780}".as_bytes()[1..])?;
/// let (sink, unwritten, ret) = writer.finish();
/// ret?;
/// assert_eq!(sink, b"a\xD9\x80");
/// assert!(unwritten.is_empty());
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[derive(Debug)]
pub struct EncodingWriter<W: io::Write> {
    writer: W,
    encoder: IncrementalEncoder,
    /// Encoded bytes not yet accepted by the underlying writer.
    buffer: Vec<u8>,
    /// Storage to carry an error from one write call to the next, used to return `Ok` after
    /// consuming the input and report the error at the beginning of the subsequent call.
    deferred_error: Option<io::Error>,
}

impl<W: io::Write> EncodingWriter<W> {
    /// Creates a new encoding writer from a writer and an encoding.
    ///
    /// `errors` defaults to [`ErrorMode::Strict`].
    pub fn new(writer: W, encoding: impl IntoEncoding, errors: Option<ErrorMode>) -> Result<Self> {
        Ok(Self {
            writer,
            encoder: IncrementalEncoder::new(encoding, errors)?,
            buffer: Vec::new(),
            deferred_error: None,
        })
    }

    /// Returns a reference to the underlying writer.
    pub fn writer_ref(&self) -> &W {
        &self.writer
    }

    /// Returns the destination encoding.
    pub fn encoding(&self) -> &'static Encoding {
        self.encoder.encoding()
    }

    /// Notifies the encoder of the end of input stream, writing out the internal buffer and any
    /// withheld fragment and flushing the underlying writer. Returns the underlying writer, the
    /// encoded bytes it did not accept, and any error reported in doing so.
    ///
    /// A deferred error is not reported if retrying the write of the internal buffer succeeds.
    pub fn finish(mut self) -> (W, Vec<u8>, io::Result<()>) {
        let ret = self.finish_inner();
        (self.writer, self.buffer, ret)
    }

    fn finish_inner(&mut self) -> io::Result<()> {
        self.deferred_error = None;
        self.flush_buffer()?;
        let encoded = self.encoder.encode_bytes(&[], true)?;
        self.buffer.extend_from_slice(&encoded);
        self.flush_buffer()?;
        self.writer.flush()
    }

    /// Writes the buffered data into the underlying writer, removing what it accepted.
    fn flush_buffer(&mut self) -> io::Result<()> {
        let expected = self.buffer.len();
        let mut written = 0;
        let ret = loop {
            if written == expected {
                break Ok(());
            }
            match self.writer.write(&self.buffer[written..]) {
                Ok(0) => break Err(Error::ShortWrite { written, expected }.into()),
                Ok(n) => written += n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
                Err(e) => break Err(e),
            }
        };
        self.buffer.drain(..written);
        ret
    }

    /// Consumes `self.deferred_error` and reports it (if any).
    fn realize_deferred_error(&mut self) -> io::Result<()> {
        match self.deferred_error.take() {
            None => Ok(()),
            Some(e) => Err(e),
        }
    }
}

impl<W: io::Write> io::Write for EncodingWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.realize_deferred_error()?;
        if buf.is_empty() {
            return Ok(0);
        }
        // nothing is consumed if the leftovers of a previous call cannot be written
        self.flush_buffer()?;

        let encoded = self.encoder.encode_bytes(buf, false)?;
        self.buffer.extend_from_slice(&encoded);
        if let Err(e) = self.flush_buffer() {
            // `buf` has been consumed; report the error in the next call
            self.deferred_error = Some(e);
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.realize_deferred_error()?;
        self.flush_buffer()?;
        self.writer.flush()
    }
}
