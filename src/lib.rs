//! Character encoding labels and conversions for the Web
//!
//! This crate resolves encoding labels to the canonical encodings of the [WHATWG Encoding
//! Standard], detects byte order marks, and converts between bytes and text in four styles:
//! one-shot ([`decode`], [`encode`]), push-based ([`IncrementalDecoder`],
//! [`IncrementalEncoder`]), pull-based ([`iter_decode`], [`iter_encode`]), and
//! [`std::io::Read`] and [`std::io::Write`] adapters ([`DecodingReader`], [`EncodingWriter`]).
//!
//! Every encoding of the standard is recognized, but only `x-user-defined` carries a codec of
//! its own. Data in any other encoding is passed through as UTF-8; see
//! [`Encoding::is_supported`].
//!
//! ```rust
//! use webencodings::{decode, encode, lookup};
//!
//! let encoding = lookup(" Latin1\n").unwrap();
//! assert_eq!(encoding.name(), "windows-1252");
//!
//! // a byte order mark wins over the fallback encoding
//! let (text, encoding) = decode(b"\xEF\xBB\xBFhi", "x-user-defined", None)?;
//! assert_eq!((text.as_str(), encoding.name()), ("hi", "utf-8"));
//!
//! assert_eq!(encode("\u{f7d9}", "x-user-defined", None)?, b"\xD9");
//! # Ok::<(), webencodings::Error>(())
//! ```
//!
//! The streaming adapters compose with the standard I/O traits:
//!
//! ```no_run
//! use std::{fs, io, io::prelude::*};
//!
//! use webencodings::{DecodingReader, EncodingWriter};
//!
//! let file_r = io::BufReader::new(fs::File::open("foo.txt")?);
//! let mut reader = DecodingReader::new(file_r, "x-user-defined", None)?;
//! let mut utf8 = String::new();
//! reader.read_to_string(&mut utf8)?;
//!
//! let file_w = fs::File::create("bar.txt")?;
//! let mut writer = EncodingWriter::new(file_w, "x-user-defined", None)?;
//! write!(writer, "{}", utf8)?;
//! writer.finish().2?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! [WHATWG Encoding Standard]: https://encoding.spec.whatwg.org/

#![cfg_attr(docsrs, feature(doc_cfg))]

mod bom;
mod codec;
mod encoding;
mod error;
mod incremental;
mod iter;
mod label;
mod oneshot;
mod reader;
mod writer;

mod util;
mod x_user_defined;

pub use bom::detect_bom;
pub use codec::{Codec, CodecDecoder, CodecEncoder, ErrorMode};
pub use encoding::{Encoding, IntoEncoding};
pub use error::{Error, Result};
pub use incremental::{IncrementalDecoder, IncrementalEncoder};
pub use iter::{iter_decode, iter_encode, IterDecode, IterEncode};
pub use label::{lookup, CANONICAL_NAMES};
pub use oneshot::{decode, encode};
pub use reader::DecodingReader;
pub use writer::EncodingWriter;
pub use x_user_defined::XUserDefined;

/// Returns the UTF-8 encoding.
///
/// # Examples
///
/// ```rust
/// assert_eq!(webencodings::utf_8(), webencodings::lookup("utf8").unwrap());
/// ```
pub fn utf_8() -> &'static Encoding {
    label::cached(label::UTF_8)
}

#[cfg(test)]
mod tests;
