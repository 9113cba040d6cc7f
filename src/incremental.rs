use std::fmt;

use log::debug;

use super::{
    codec::passthrough, detect_bom, util, CodecDecoder, CodecEncoder, Encoding, ErrorMode,
    IntoEncoding, Result,
};

/// The number of bytes needed to rule out every byte order mark.
const BOM_SNIFF_LEN: usize = 3;

/// A push-based decoder that determines the encoding from a byte order mark, if any, before
/// decoding.
///
/// Input is buffered until at least three bytes are seen (or the last chunk is pushed), so that
/// a BOM split across chunks is still detected. Feeding a byte sequence in chunks of any size
/// yields the same text as [`decode`](crate::decode) on the whole sequence.
///
/// A decoder serves one stream: after a call with `last` set to `true`, create a new one.
///
/// # Examples
///
/// ```rust
/// use webencodings::IncrementalDecoder;
///
/// let mut decoder = IncrementalDecoder::new("x-user-defined", None)?;
/// assert_eq!(decoder.decode(b"\xEF", false)?, "");
/// assert!(decoder.encoding().is_none());
/// assert_eq!(decoder.decode(b"\xBB\xBF\xC3", false)?, "");
/// assert_eq!(decoder.decode(b"\xA9", true)?, "\u{e9}");
/// assert_eq!(decoder.encoding().map(|e| e.name()), Some("utf-8"));
/// # Ok::<(), webencodings::Error>(())
/// ```
pub struct IncrementalDecoder {
    fallback_encoding: &'static Encoding,
    errors: ErrorMode,
    state: DecoderState,
}

enum DecoderState {
    /// Bytes seen so far, too few to tell whether they start with a BOM.
    Undetermined(Vec<u8>),
    Determined {
        encoding: &'static Encoding,
        decoder: Box<dyn CodecDecoder>,
    },
}

impl IncrementalDecoder {
    /// Creates a decoder that uses `fallback_encoding` unless the input starts with a BOM.
    ///
    /// `errors` defaults to [`ErrorMode::Replace`].
    pub fn new(fallback_encoding: impl IntoEncoding, errors: Option<ErrorMode>) -> Result<Self> {
        Ok(Self {
            fallback_encoding: fallback_encoding.into_encoding()?,
            errors: errors.unwrap_or(ErrorMode::Replace),
            state: DecoderState::Undetermined(Vec::new()),
        })
    }

    /// Returns the encoding being used, or `None` if it is not determined yet.
    pub fn encoding(&self) -> Option<&'static Encoding> {
        match self.state {
            DecoderState::Undetermined(..) => None,
            DecoderState::Determined { encoding, .. } => Some(encoding),
        }
    }

    /// Decodes one chunk of input. Set `last` to `true` for the final call.
    pub fn decode(&mut self, input: &[u8], last: bool) -> Result<String> {
        let buffer = match &mut self.state {
            DecoderState::Determined { decoder, .. } => return decoder.decode(input, last),
            DecoderState::Undetermined(buffer) => buffer,
        };
        let old_len = buffer.len();
        buffer.extend_from_slice(input);
        if buffer.len() < BOM_SNIFF_LEN && !last {
            // not enough data yet
            return Ok(String::new());
        }

        let (encoding, rest) = match detect_bom(buffer) {
            (Some(encoding), rest) => (encoding, rest),
            (None, rest) => (self.fallback_encoding, rest),
        };
        let mut decoder: Box<dyn CodecDecoder> = match encoding.codec() {
            Some(codec) => codec.new_decoder(self.errors),
            None => {
                debug!("no codec for {}, passing bytes through", encoding);
                Box::<passthrough::Decoder>::default()
            }
        };
        let text = match decoder.decode(rest, last) {
            Ok(text) => text,
            Err(e) => {
                // stay undetermined, as if this call never happened
                buffer.truncate(old_len);
                return Err(e);
            }
        };
        debug!("incremental decoder settled on {}", encoding);
        self.state = DecoderState::Determined { encoding, decoder };
        Ok(text)
    }
}

/// A push-based encoder that accepts UTF-8 input split at arbitrary byte positions.
///
/// [`encode_bytes`](Self::encode_bytes) holds back a character fragment at the end of a chunk
/// until the bytes completing it arrive, so chunked input yields the same bytes as
/// [`encode`](crate::encode) on the whole text.
///
/// # Examples
///
/// ```rust
/// use webencodings::IncrementalEncoder;
///
/// let mut encoder = IncrementalEncoder::new("x-user-defined", None)?;
/// let src = "a\u{f7d9}".as_bytes(); // 61 ef 9f 99
/// assert_eq!(encoder.encode_bytes(&src[..2], false)?, b"a");
/// assert_eq!(encoder.encode_bytes(&src[2..], false)?, b"\xD9");
/// assert_eq!(encoder.encode("", true)?, b"");
/// # Ok::<(), webencodings::Error>(())
/// ```
pub struct IncrementalEncoder {
    encoding: &'static Encoding,
    encoder: Box<dyn CodecEncoder>,
    /// A character fragment withheld from the previous call.
    pending: util::MiniBuffer,
}

impl IncrementalEncoder {
    /// Creates an encoder for `encoding`.
    ///
    /// `errors` defaults to [`ErrorMode::Strict`].
    pub fn new(encoding: impl IntoEncoding, errors: Option<ErrorMode>) -> Result<Self> {
        let encoding = encoding.into_encoding()?;
        let errors = errors.unwrap_or(ErrorMode::Strict);
        let encoder: Box<dyn CodecEncoder> = match encoding.codec() {
            Some(codec) => codec.new_encoder(errors),
            None => {
                debug!("no codec for {}, passing text through", encoding);
                Box::new(passthrough::Encoder)
            }
        };
        Ok(Self {
            encoding,
            encoder,
            pending: Default::default(),
        })
    }

    /// Returns the destination encoding.
    pub fn encoding(&self) -> &'static Encoding {
        self.encoding
    }

    /// Encodes one chunk of text. Set `last` to `true` for the final call.
    pub fn encode(&mut self, input: &str, last: bool) -> Result<Vec<u8>> {
        self.encode_bytes(input.as_bytes(), last)
    }

    /// Encodes one chunk of UTF-8 bytes. Set `last` to `true` for the final call.
    ///
    /// An unfinished character at the end of a non-final chunk is withheld until the next call.
    /// Other invalid bytes, and an unfinished character in the final chunk, are encoded as
    /// U+FFFD, whose fate is decided by the error mode.
    ///
    /// If this method returns `Err`, `input` is not consumed and the encoder keeps its state.
    pub fn encode_bytes(&mut self, input: &[u8], last: bool) -> Result<Vec<u8>> {
        let pending = self.pending;
        let data = util::prepend(&pending, input);
        let split = if last {
            data.len()
        } else {
            data.len() - util::incomplete_utf8_tail(&data)
        };
        let (head, tail) = data.split_at(split);
        let encoded = self.encoder.encode(&String::from_utf8_lossy(head), last)?;
        self.pending = util::MiniBuffer::from_slice(tail);
        Ok(encoded)
    }
}

impl fmt::Debug for IncrementalDecoder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IncrementalDecoder")
            .field("fallback_encoding", &self.fallback_encoding)
            .field("errors", &self.errors)
            .field("encoding", &self.encoding())
            .finish_non_exhaustive()
    }
}

impl fmt::Debug for IncrementalEncoder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IncrementalEncoder")
            .field("encoding", &self.encoding)
            .field("pending", &self.pending)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use std::io;

    use super::{IncrementalDecoder, IncrementalEncoder};
    use crate::{
        codec::{passthrough, sealed::Sealed},
        decode, encode, lookup, Codec, CodecDecoder, CodecEncoder, Encoding, Error, ErrorMode,
        Result,
    };

    /// A codec that reads ASCII and rejects `0xFF`.
    struct Picky;

    impl Sealed for Picky {}

    impl Codec for Picky {
        fn encode(&self, input: &str, _errors: ErrorMode) -> Result<Vec<u8>> {
            Ok(input.as_bytes().to_vec())
        }

        fn decode(&self, input: &[u8], _errors: ErrorMode) -> Result<String> {
            if input.contains(&0xff) {
                return Err(Error::Io(io::ErrorKind::InvalidData.into()));
            }
            Ok(input.iter().map(|&b| char::from(b)).collect())
        }

        fn new_decoder(&self, errors: ErrorMode) -> Box<dyn CodecDecoder> {
            Box::new(PickyDecoder(errors))
        }

        fn new_encoder(&self, _errors: ErrorMode) -> Box<dyn CodecEncoder> {
            Box::new(passthrough::Encoder)
        }
    }

    struct PickyDecoder(ErrorMode);

    impl Sealed for PickyDecoder {}

    impl CodecDecoder for PickyDecoder {
        fn decode(&mut self, input: &[u8], _last: bool) -> Result<String> {
            Picky.decode(input, self.0)
        }
    }

    fn decode_in_chunks(src: &[u8], fallback: &str, n: usize) -> (String, &'static str) {
        let mut decoder = IncrementalDecoder::new(fallback, None).unwrap();
        let mut dst = String::new();
        for chunk in src.chunks(n) {
            dst.push_str(&decoder.decode(chunk, false).unwrap());
        }
        dst.push_str(&decoder.decode(&[], true).unwrap());
        (dst, decoder.encoding().unwrap().name())
    }

    #[test]
    fn empty_input() {
        let mut decoder = IncrementalDecoder::new("x-user-defined", None).unwrap();
        assert_eq!(decoder.decode(&[], false).unwrap(), "");
        assert!(decoder.encoding().is_none());
        assert_eq!(decoder.decode(&[], true).unwrap(), "");
        assert_eq!(decoder.encoding().map(|e| e.name()), Some("x-user-defined"));

        let mut encoder = IncrementalEncoder::new("x-user-defined", None).unwrap();
        assert_eq!(encoder.encode("", false).unwrap(), b"");
        assert_eq!(encoder.encode("", true).unwrap(), b"");
    }

    #[test]
    fn decode_at_every_split_point() {
        let src: Vec<u8> = (0..=u8::MAX).rev().collect();
        let (expected, _) = decode(&src, "x-user-defined", None).unwrap();

        for n in 1..=src.len() {
            assert_eq!(
                decode_in_chunks(&src, "x-user-defined", n),
                (expected.clone(), "x-user-defined")
            );
        }

        for i in 0..=src.len() {
            let mut decoder = IncrementalDecoder::new("x-user-defined", None).unwrap();
            let mut dst = decoder.decode(&src[..i], false).unwrap();
            dst.push_str(&decoder.decode(&src[i..], true).unwrap());
            assert_eq!(dst, expected);
        }
    }

    #[test]
    fn bom_split_across_chunks() {
        let src = b"\xEF\xBB\xBFcaf\xC3\xA9 \xE2\x82\xAC";
        for n in 1..=src.len() {
            assert_eq!(
                decode_in_chunks(src, "x-user-defined", n),
                ("caf\u{e9} \u{20ac}".to_owned(), "utf-8")
            );
        }

        let mut decoder = IncrementalDecoder::new("x-user-defined", None).unwrap();
        assert_eq!(decoder.decode(b"\xFF", false).unwrap(), "");
        assert_eq!(decoder.decode(b"\xFE", false).unwrap(), "");
        assert!(decoder.encoding().is_none());
        decoder.decode(b"\x41", false).unwrap();
        assert_eq!(decoder.encoding().map(|e| e.name()), Some("utf-16le"));
    }

    #[test]
    fn short_input_without_bom() {
        // fewer than three bytes are decoded with the fallback at the end
        let mut decoder = IncrementalDecoder::new("x-user-defined", None).unwrap();
        assert_eq!(decoder.decode(b"\xEF\xBB", false).unwrap(), "");
        assert_eq!(decoder.decode(&[], true).unwrap(), "\u{f7ef}\u{f7bb}");
        assert_eq!(decoder.encoding().map(|e| e.name()), Some("x-user-defined"));

        // the fallback settles the encoding as soon as a BOM is ruled out
        let mut decoder = IncrementalDecoder::new("x-user-defined", None).unwrap();
        assert_eq!(decoder.decode(b"abc", false).unwrap(), "abc");
        assert_eq!(decoder.decode(b"\xEF\xBB\xBF", false).unwrap(), "\u{f7ef}\u{f7bb}\u{f7bf}");
    }

    #[test]
    fn unknown_labels() {
        assert!(matches!(
            IncrementalDecoder::new("invalid", None),
            Err(Error::UnknownEncoding(_))
        ));
        assert!(matches!(
            IncrementalEncoder::new("invalid", None),
            Err(Error::UnknownEncoding(_))
        ));
    }

    #[test]
    fn encode_at_every_split_point() {
        let text: String = "2,\x0c\x0b\x1aO\u{f7d9}#\u{f7cb}\x0f\u{f7c9}\u{f7bb}t\u{f7cf}".into();
        let expected = encode(&text, "x-user-defined", None).unwrap();
        let src = text.as_bytes();

        for n in 1..=src.len() {
            let mut encoder = IncrementalEncoder::new("x-user-defined", None).unwrap();
            let mut dst = Vec::new();
            for chunk in src.chunks(n) {
                dst.extend(encoder.encode_bytes(chunk, false).unwrap());
            }
            dst.extend(encoder.encode_bytes(&[], true).unwrap());
            assert_eq!(dst, expected, "chunk size {}", n);
        }
    }

    #[test]
    fn trailing_fragment_at_end() {
        let src = "\u{f7d9}".as_bytes();

        let mut encoder = IncrementalEncoder::new("x-user-defined", None).unwrap();
        assert_eq!(encoder.encode_bytes(&src[..2], false).unwrap(), b"");
        assert!(matches!(
            encoder.encode_bytes(&[], true),
            Err(Error::UnmappableCodepoint {
                character: '\u{fffd}',
                ..
            })
        ));

        let mut encoder =
            IncrementalEncoder::new("x-user-defined", Some(ErrorMode::Replace)).unwrap();
        assert_eq!(encoder.encode_bytes(&src[..2], false).unwrap(), b"");
        assert_eq!(encoder.encode_bytes(b"a", true).unwrap(), b"?a");
    }

    #[test]
    fn failed_call_keeps_state() {
        let src = "\u{f7d9}".as_bytes();
        let mut encoder = IncrementalEncoder::new("x-user-defined", None).unwrap();
        assert_eq!(encoder.encode_bytes(&src[..1], false).unwrap(), b"");
        assert!(matches!(
            encoder.encode("\u{e9}", false),
            Err(Error::UnmappableCodepoint { .. })
        ));
        // the withheld fragment survives the failed call
        assert_eq!(encoder.encode_bytes(&src[1..], true).unwrap(), b"\xD9");
    }

    #[test]
    fn passthrough_without_codec() {
        let mut decoder = IncrementalDecoder::new("latin1", None).unwrap();
        let src = "caf\u{e9}".as_bytes();
        let mut dst = String::new();
        for b in src {
            dst.push_str(&decoder.decode(std::slice::from_ref(b), false).unwrap());
        }
        dst.push_str(&decoder.decode(&[], true).unwrap());
        assert_eq!(dst, "caf\u{e9}");
        assert!(!decoder.encoding().unwrap().is_supported());

        let mut encoder = IncrementalEncoder::new(lookup("utf8").unwrap(), None).unwrap();
        assert_eq!(encoder.encode("caf\u{e9}", true).unwrap(), src);
        assert_eq!(encoder.encoding().name(), "utf-8");
    }

    #[test]
    fn failed_decode_keeps_state() {
        let picky: &'static Encoding = Box::leak(Box::new(Encoding::with_codec("picky", &Picky)));
        let mut decoder = IncrementalDecoder::new(picky, None).unwrap();
        assert_eq!(decoder.decode(b"ab", false).unwrap(), "");
        assert!(matches!(decoder.decode(b"\xFF", false), Err(Error::Io(_))));
        // the bytes of the failed call are dropped and those before it are kept
        assert!(decoder.encoding().is_none());
        assert_eq!(decoder.decode(b"c", false).unwrap(), "abc");
        assert_eq!(decoder.encoding().map(|e| e.name()), Some("picky"));
    }
}
