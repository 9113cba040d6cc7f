//! The `x-user-defined` encoding: ASCII bytes map to themselves and every other byte to the
//! Private Use Area range U+F780 to U+F7FF.

use std::{collections::HashMap, sync::LazyLock};

use super::{
    codec::sealed::Sealed, Codec, CodecDecoder, CodecEncoder, Error, ErrorMode, Result,
};

pub(crate) const NAME: &str = "x-user-defined";

/// The byte-to-character table, taken from the `encoding_rs` implementation of the encoding.
static DECODING_TABLE: LazyLock<[char; 256]> = LazyLock::new(|| {
    let bytes: Vec<u8> = (0..=u8::MAX).collect();
    let (text, _) = encoding_rs::X_USER_DEFINED.decode_without_bom_handling(&bytes);
    let mut table = ['\0'; 256];
    for (slot, c) in table.iter_mut().zip(text.chars()) {
        *slot = c;
    }
    table
});

/// The inverse of [`DECODING_TABLE`].
static ENCODING_TABLE: LazyLock<HashMap<char, u8>> = LazyLock::new(|| {
    DECODING_TABLE
        .iter()
        .zip(0..=u8::MAX)
        .map(|(&c, b)| (c, b))
        .collect()
});

/// The codec bound to the `x-user-defined` [`Encoding`](crate::Encoding).
#[derive(Clone, Copy, Debug, Default)]
pub struct XUserDefined;

impl Sealed for XUserDefined {}

impl Codec for XUserDefined {
    fn encode(&self, input: &str, errors: ErrorMode) -> Result<Vec<u8>> {
        let mut dst = Vec::with_capacity(input.len());
        for c in input.chars() {
            match ENCODING_TABLE.get(&c) {
                Some(&b) => dst.push(b),
                None => match errors {
                    ErrorMode::Strict => {
                        return Err(Error::UnmappableCodepoint {
                            encoding: NAME,
                            character: c,
                        })
                    }
                    ErrorMode::Ignore => {}
                    ErrorMode::Replace => dst.push(b'?'),
                },
            }
        }
        Ok(dst)
    }

    fn decode(&self, input: &[u8], _errors: ErrorMode) -> Result<String> {
        // every byte has a mapping, so the error mode never applies
        Ok(input.iter().map(|&b| DECODING_TABLE[usize::from(b)]).collect())
    }

    fn new_decoder(&self, errors: ErrorMode) -> Box<dyn CodecDecoder> {
        Box::new(Decoder(errors))
    }

    fn new_encoder(&self, errors: ErrorMode) -> Box<dyn CodecEncoder> {
        Box::new(Encoder(errors))
    }
}

/// Single-byte decoding carries no state between chunks.
#[derive(Debug)]
struct Decoder(ErrorMode);

impl Sealed for Decoder {}

impl CodecDecoder for Decoder {
    fn decode(&mut self, input: &[u8], _last: bool) -> Result<String> {
        XUserDefined.decode(input, self.0)
    }
}

#[derive(Debug)]
struct Encoder(ErrorMode);

impl Sealed for Encoder {}

impl CodecEncoder for Encoder {
    fn encode(&mut self, input: &str, _last: bool) -> Result<Vec<u8>> {
        XUserDefined.encode(input, self.0)
    }
}
