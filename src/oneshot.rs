use log::debug;

use super::{codec::passthrough, detect_bom, Encoding, ErrorMode, IntoEncoding, Result};

/// Decodes a whole byte sequence, returning the text and the encoding actually used.
///
/// The fallback encoding is used unless the input starts with a byte order mark, in which case
/// the BOM is stripped and the encoding it indicates wins. `errors` defaults to
/// [`ErrorMode::Replace`].
///
/// An unknown fallback label is reported as [`Error::UnknownEncoding`] even if the input is empty
/// or starts with a BOM. If the encoding has no codec (see [`Encoding::is_supported`]), the bytes
/// are passed through as UTF-8, with invalid sequences replaced by U+FFFD.
///
/// [`Error::UnknownEncoding`]: crate::Error::UnknownEncoding
///
/// # Examples
///
/// ```rust
/// use webencodings::decode;
///
/// let (text, encoding) = decode(b"\xEF\xBB\xBF\xC3\xA9", "ascii", None)?;
/// assert_eq!(text, "\u{e9}");
/// assert_eq!(encoding.name(), "utf-8");
///
/// let (text, encoding) = decode(b"a\xD9", "x-user-defined", None)?;
/// assert_eq!(text, "a\u{f7d9}");
/// assert_eq!(encoding.name(), "x-user-defined");
/// # Ok::<(), webencodings::Error>(())
/// ```
pub fn decode(
    input: &[u8],
    fallback_encoding: impl IntoEncoding,
    errors: Option<ErrorMode>,
) -> Result<(String, &'static Encoding)> {
    let errors = errors.unwrap_or(ErrorMode::Replace);
    // fail early if the fallback is invalid
    let fallback_encoding = fallback_encoding.into_encoding()?;

    let (encoding, input) = match detect_bom(input) {
        (Some(encoding), rest) => {
            debug!("BOM overrides {} with {}", fallback_encoding, encoding);
            (encoding, rest)
        }
        (None, input) => (fallback_encoding, input),
    };

    let text = match encoding.codec() {
        Some(codec) => codec.decode(input, errors)?,
        None => {
            debug!("no codec for {}, passing bytes through", encoding);
            passthrough::decode(input)
        }
    };
    Ok((text, encoding))
}

/// Encodes a whole string.
///
/// `errors` defaults to [`ErrorMode::Strict`]. If the encoding has no codec (see
/// [`Encoding::is_supported`]), the UTF-8 bytes of `input` are returned as they are.
///
/// # Examples
///
/// ```rust
/// use webencodings::{encode, ErrorMode};
///
/// assert_eq!(encode("aa", "x-user-defined", None)?, b"aa");
/// assert_eq!(encode("a\u{e9}", "x-user-defined", Some(ErrorMode::Replace))?, b"a?");
/// # Ok::<(), webencodings::Error>(())
/// ```
pub fn encode(
    input: &str,
    encoding: impl IntoEncoding,
    errors: Option<ErrorMode>,
) -> Result<Vec<u8>> {
    let errors = errors.unwrap_or(ErrorMode::Strict);
    let encoding = encoding.into_encoding()?;
    match encoding.codec() {
        Some(codec) => codec.encode(input, errors),
        None => {
            debug!("no codec for {}, passing text through", encoding);
            Ok(passthrough::encode(input))
        }
    }
}
