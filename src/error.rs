use std::io;

use thiserror::Error;

/// The error type for every fallible operation of this crate.
///
/// The [`Read`] and [`Write`] adapters report these errors in the form of [`std::io::Error`]
/// wrapping an instance of this type. Callers need to unwrap and downcast the inner error of a
/// reported error, which can be shortcut by [`Error::wrapped_in`].
///
/// [`Read`]: std::io::Read
/// [`Write`]: std::io::Write
///
/// # Examples
///
/// ```rust
/// use webencodings::{encode, Error, ErrorMode};
///
/// match encode("\u{263a}", "x-user-defined", Some(ErrorMode::Strict)) {
///     Err(Error::UnmappableCodepoint { character, .. }) => assert_eq!(character, '\u{263a}'),
///     other => panic!("unexpected result: {:?}", other),
/// }
/// ```
#[derive(Debug, Error)]
pub enum Error {
    /// The label does not name any encoding known to the label table.
    #[error("unknown encoding label: {0:?}")]
    UnknownEncoding(String),

    /// The error mode string is none of `strict`, `ignore` and `replace`.
    #[error("invalid error mode: {0:?}")]
    InvalidErrorMode(String),

    /// A character has no representation in the destination encoding and the error mode is
    /// `strict`.
    #[error("{encoding} cannot encode character {character:?}")]
    UnmappableCodepoint {
        encoding: &'static str,
        character: char,
    },

    /// The underlying writer stopped accepting bytes before all the encoded output was written.
    #[error("short write: {written} of {expected} encoded bytes accepted")]
    ShortWrite { written: usize, expected: usize },

    /// The producer thread of an iterator ended without reporting a result.
    #[error("conversion task terminated unexpectedly")]
    Disconnected,

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

/// A convenience `Result` type alias using the crate's [`Error`] type.
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Returns a reference to the `Error` value wrapped by a [`std::io::Error`] if it contains an
    /// inner error whose type is `Error`, or returns `None` otherwise.
    #[inline]
    pub fn wrapped_in(io_error: &io::Error) -> Option<&Self> {
        match io_error.get_ref() {
            Some(e) => e.downcast_ref::<Self>(),
            None => None,
        }
    }
}

impl From<Error> for io::Error {
    fn from(error: Error) -> Self {
        match error {
            Error::Io(e) => e,
            e @ Error::ShortWrite { .. } => io::Error::new(io::ErrorKind::WriteZero, e),
            e => io::Error::new(io::ErrorKind::InvalidData, e),
        }
    }
}
