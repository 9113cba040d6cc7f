use std::{borrow::Cow, str};

/// The longest UTF-8 sequence, and so the farthest an incomplete tail can start from the end.
const MAX_UTF8_LEN: usize = 4;

/// A `Vec`-like struct that handles a tiny stack-allocated byte array.
///
/// Holds the UTF-8 fragment withheld at a chunk boundary, which is at most three bytes long.
#[derive(Clone, Copy, Debug, Default)]
pub(crate) struct MiniBuffer {
    len: u8,
    buf: [u8; MAX_UTF8_LEN - 1],
}

impl AsRef<[u8]> for MiniBuffer {
    fn as_ref(&self) -> &[u8] {
        &self.buf[..self.len()]
    }
}

impl MiniBuffer {
    /// Creates a buffer holding a copy of `bytes`.
    pub fn from_slice(bytes: &[u8]) -> Self {
        let mut b = Self::default();
        let n = b.fill_from_slice(bytes);
        debug_assert_eq!(n, bytes.len(), "withheld fragment too long");
        b
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn len(&self) -> usize {
        self.len.into()
    }

    /// Writes as many bytes as possible copied from a slice into the spare capacity, returning the
    /// number of bytes consumed.
    pub fn fill_from_slice(&mut self, bytes: &[u8]) -> usize {
        let start = self.len();
        let n = (self.buf.len() - start).min(bytes.len());
        self.buf[start..start + n].copy_from_slice(&bytes[..n]);
        self.len += n as u8;
        n
    }
}

/// Returns `input` preceded by the withheld bytes, copying only when there is something to
/// prepend.
pub(crate) fn prepend<'a>(pending: &MiniBuffer, input: &'a [u8]) -> Cow<'a, [u8]> {
    if pending.is_empty() {
        Cow::Borrowed(input)
    } else {
        let mut v = Vec::with_capacity(pending.len() + input.len());
        v.extend_from_slice(pending.as_ref());
        v.extend_from_slice(input);
        Cow::Owned(v)
    }
}

/// Returns the length of a trailing UTF-8 sequence that is a valid but unfinished prefix of a
/// character, or `0` if the bytes end at a character boundary or with invalid bytes.
///
/// Only the last four bytes are examined.
pub(crate) fn incomplete_utf8_tail(bytes: &[u8]) -> usize {
    let lower = bytes.len().saturating_sub(MAX_UTF8_LEN);
    for i in (lower..bytes.len()).rev() {
        if is_continuation_byte(bytes[i]) {
            continue;
        }
        // the nearest byte that can start a sequence decides the outcome
        return match str::from_utf8(&bytes[i..]) {
            Err(e) if e.valid_up_to() == 0 && e.error_len().is_none() => bytes.len() - i,
            _ => 0,
        };
    }
    0
}

fn is_continuation_byte(b: u8) -> bool {
    b & 0xc0 == 0x80
}
