use std::{fmt, str};

use super::{Error, Result};

/// The policy applied to input that the destination encoding cannot represent.
///
/// Decoding through the codecs of this crate is total, so the mode only affects encoding in
/// practice. The one-shot and incremental decoders default to [`Replace`](Self::Replace),
/// whereas the encoders default to [`Strict`](Self::Strict).
///
/// # Examples
///
/// ```rust
/// use webencodings::{Error, ErrorMode};
///
/// assert_eq!("ignore".parse::<ErrorMode>()?, ErrorMode::Ignore);
/// assert!(matches!(
///     "surrogateescape".parse::<ErrorMode>(),
///     Err(Error::InvalidErrorMode(_))
/// ));
/// # Ok::<(), webencodings::Error>(())
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorMode {
    /// Fails the whole call on the first unconvertible character.
    Strict,
    /// Drops unconvertible characters.
    Ignore,
    /// Substitutes `?` for unconvertible characters.
    Replace,
}

impl ErrorMode {
    /// Returns the configuration string of this mode.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Strict => "strict",
            Self::Ignore => "ignore",
            Self::Replace => "replace",
        }
    }
}

impl str::FromStr for ErrorMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "strict" => Ok(Self::Strict),
            "ignore" => Ok(Self::Ignore),
            "replace" => Ok(Self::Replace),
            _ => Err(Error::InvalidErrorMode(s.to_owned())),
        }
    }
}

impl fmt::Display for ErrorMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The integration point of a concrete character encoding.
///
/// An [`Encoding`](crate::Encoding) either holds a `&'static dyn Codec` or holds none, in which
/// case conversions fall back to passing the data through unchanged. The binding is fixed when
/// the encoding is first looked up, so this trait and the coder traits below are sealed: only
/// the codecs of this crate implement them. Callers use them through
/// [`Encoding::codec`](crate::Encoding::codec).
pub trait Codec: Send + Sync + sealed::Sealed {
    /// Encodes a whole string.
    fn encode(&self, input: &str, errors: ErrorMode) -> Result<Vec<u8>>;

    /// Decodes a whole byte sequence.
    fn decode(&self, input: &[u8], errors: ErrorMode) -> Result<String>;

    /// Creates a stateful decoder for chunked input.
    fn new_decoder(&self, errors: ErrorMode) -> Box<dyn CodecDecoder>;

    /// Creates a stateful encoder for chunked input.
    fn new_encoder(&self, errors: ErrorMode) -> Box<dyn CodecEncoder>;
}

/// A push-based decoder created by [`Codec::new_decoder`].
pub trait CodecDecoder: Send + sealed::Sealed {
    /// Decodes one chunk of input. `last` is `true` for the final call of a stream.
    fn decode(&mut self, input: &[u8], last: bool) -> Result<String>;
}

/// A push-based encoder created by [`Codec::new_encoder`].
pub trait CodecEncoder: Send + sealed::Sealed {
    /// Encodes one chunk of input. `last` is `true` for the final call of a stream.
    fn encode(&mut self, input: &str, last: bool) -> Result<Vec<u8>>;
}

pub(crate) mod sealed {
    pub trait Sealed {}
}

/// Identity conversions used for encodings that are recognized but have no codec.
pub(crate) mod passthrough {
    use super::{sealed::Sealed, CodecDecoder, CodecEncoder, Result};
    use crate::util;

    pub fn decode(input: &[u8]) -> String {
        String::from_utf8_lossy(input).into_owned()
    }

    pub fn encode(input: &str) -> Vec<u8> {
        input.as_bytes().to_vec()
    }

    /// Passes bytes through as text, holding back a UTF-8 fragment split across chunks.
    #[derive(Debug, Default)]
    pub struct Decoder {
        pending: util::MiniBuffer,
    }

    impl Sealed for Decoder {}

    impl CodecDecoder for Decoder {
        fn decode(&mut self, input: &[u8], last: bool) -> Result<String> {
            let pending = self.pending;
            let data = util::prepend(&pending, input);
            let split = if last {
                data.len()
            } else {
                data.len() - util::incomplete_utf8_tail(&data)
            };
            let (head, tail) = data.split_at(split);
            let text = decode(head);
            self.pending = util::MiniBuffer::from_slice(tail);
            Ok(text)
        }
    }

    #[derive(Debug, Default)]
    pub struct Encoder;

    impl Sealed for Encoder {}

    impl CodecEncoder for Encoder {
        fn encode(&mut self, input: &str, _last: bool) -> Result<Vec<u8>> {
            Ok(encode(input))
        }
    }
}
