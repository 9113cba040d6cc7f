use std::io;

use super::{Encoding, ErrorMode, IncrementalDecoder, IntoEncoding, Result};

// As of Rust 1.73.0: https://github.com/rust-lang/rust/blob/1.73.0/library/std/src/sys_common/io.rs#L3
const DEFAULT_BUF_SIZE: usize = 8 * 1024;

/// A reader wrapper that decodes an input byte stream into UTF-8.
///
/// This wrapper reads bytes from the underlying reader, decodes them through an
/// [`IncrementalDecoder`] (so a byte order mark at the beginning of the stream overrides the
/// fallback encoding), and allows callers to access the decoded string through
/// [`std::io::Read`] methods.
///
/// Decoded bytes that do not fit the buffer supplied by the caller are kept and returned by
/// subsequent calls, so the buffer may be of any non-zero length. A single call may therefore
/// return a character fragment, but the byte sequence read until EOF, as a whole, is valid UTF-8.
///
/// When the underlying reader indicates EOF, this wrapper lets the decoder know the end of the
/// stream, returns whatever the decoder flushes, and then keeps returning `Ok(0)`.
///
/// Errors from the decoder are reported as [`std::io::Error`] wrapping an [`Error`], which
/// [`Error::wrapped_in`] recovers.
///
/// [`Error`]: crate::Error
/// [`Error::wrapped_in`]: crate::Error::wrapped_in
///
/// # Examples
///
/// ```rust
/// use std::io::Read as _;
///
/// use webencodings::DecodingReader;
///
/// let src: &[u8] = &[0xef, 0xbb, 0xbf, b'c', b'a', b'f', 0xc3, 0xa9];
/// let mut reader = DecodingReader::new(src, "x-user-defined", None)?;
///
/// let mut dst = String::new();
/// reader.read_to_string(&mut dst)?;
/// assert_eq!(dst, "caf\u{e9}");
/// assert_eq!(reader.encoding().map(|e| e.name()), Some("utf-8"));
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[derive(Debug)]
pub struct DecodingReader<R> {
    reader: R,
    decoder: IncrementalDecoder,
    /// Storage for raw bytes read from the underlying reader.
    chunk: Box<[u8]>,
    /// Decoded bytes not yet returned to the caller, starting at `pos`.
    decoded: Vec<u8>,
    pos: usize,
    eof: bool,
}

impl<R: io::Read> DecodingReader<R> {
    /// Creates a new decoding reader from a reader and a fallback encoding.
    ///
    /// `errors` defaults to [`ErrorMode::Replace`].
    pub fn new(
        reader: R,
        fallback_encoding: impl IntoEncoding,
        errors: Option<ErrorMode>,
    ) -> Result<Self> {
        Self::with_capacity(DEFAULT_BUF_SIZE, reader, fallback_encoding, errors)
    }

    /// Creates a new decoding reader that reads at most `capacity` bytes from the underlying
    /// reader at a time.
    pub fn with_capacity(
        capacity: usize,
        reader: R,
        fallback_encoding: impl IntoEncoding,
        errors: Option<ErrorMode>,
    ) -> Result<Self> {
        Ok(Self {
            reader,
            decoder: IncrementalDecoder::new(fallback_encoding, errors)?,
            chunk: vec![0; capacity.max(1)].into_boxed_slice(),
            decoded: Vec::new(),
            pos: 0,
            eof: false,
        })
    }

    /// Returns a reference to the underlying reader.
    pub fn reader_ref(&self) -> &R {
        &self.reader
    }

    /// Returns the encoding in use, or `None` if not enough bytes have been read to decide it.
    pub fn encoding(&self) -> Option<&'static Encoding> {
        self.decoder.encoding()
    }

    /// Drops the decoder and returns the underlying reader.
    ///
    /// Decoded bytes not yet read from `self` are discarded.
    pub fn into_inner(self) -> R {
        self.reader
    }

    /// Reads the next chunk from the underlying reader and decodes it into `self.decoded`.
    fn fill_decoded(&mut self) -> io::Result<()> {
        debug_assert!(self.pos == self.decoded.len());
        debug_assert!(!self.eof);

        let n = loop {
            match self.reader.read(&mut self.chunk) {
                Ok(n) => break n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
                Err(e) => return Err(e),
            }
        };
        let text = if n == 0 {
            self.eof = true;
            self.decoder.decode(&[], true)?
        } else {
            self.decoder.decode(&self.chunk[..n], false)?
        };
        self.decoded = text.into_bytes();
        self.pos = 0;
        Ok(())
    }
}

impl<R: io::Read> io::Read for DecodingReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if buf.is_empty() {
            // `io::Read` may return `Ok(0)` if output buffer is 0 bytes in length
            return Ok(0);
        }
        // the decoder may return nothing for a non-empty chunk, so loop until it does or EOF
        while self.pos == self.decoded.len() {
            if self.eof {
                return Ok(0);
            }
            self.fill_decoded()?;
        }
        let rest = &self.decoded[self.pos..];
        let n = rest.len().min(buf.len());
        buf[..n].copy_from_slice(&rest[..n]);
        self.pos += n;
        Ok(n)
    }
}
