use std::fmt;

use super::{label, x_user_defined, Codec, Error, Result};

/// A character encoding identified by its canonical name, such as `utf-8`.
///
/// Values are obtained from [`lookup`](crate::lookup) and live for the whole process; every
/// label resolving to the same canonical name yields the same `&'static Encoding`.
///
/// An encoding may be recognized without being [supported](Self::is_supported): conversions
/// through such an encoding pass the data through unchanged.
pub struct Encoding {
    name: &'static str,
    codec: Option<&'static dyn Codec>,
}

impl Encoding {
    pub(crate) fn new(name: &'static str) -> Self {
        let codec: Option<&'static dyn Codec> = match name {
            x_user_defined::NAME => Some(&x_user_defined::XUserDefined),
            _ => None,
        };
        Self { name, codec }
    }

    /// Creates an encoding bound to an arbitrary codec, for exercising the generic code paths.
    #[cfg(test)]
    pub(crate) fn with_codec(name: &'static str, codec: &'static dyn Codec) -> Self {
        Self {
            name,
            codec: Some(codec),
        }
    }

    /// Returns the canonical name of this encoding.
    #[inline]
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Returns the codec implementing this encoding, if any.
    #[inline]
    pub fn codec(&self) -> Option<&'static dyn Codec> {
        self.codec
    }

    /// Returns `true` if conversions through this encoding actually transcode the data, or
    /// `false` if they fall back to passing it through.
    #[inline]
    pub fn is_supported(&self) -> bool {
        self.codec.is_some()
    }
}

impl PartialEq for Encoding {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl Eq for Encoding {}

impl fmt::Debug for Encoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Encoding")
            .field("name", &self.name)
            .field("supported", &self.is_supported())
            .finish()
    }
}

impl fmt::Display for Encoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<Encoding {}>", self.name)
    }
}

/// A value that names an encoding: either a label to be looked up or an [`Encoding`] itself.
pub trait IntoEncoding {
    /// Resolves `self`, failing with [`Error::UnknownEncoding`] for an unknown label.
    fn into_encoding(self) -> Result<&'static Encoding>;
}

impl IntoEncoding for &'static Encoding {
    fn into_encoding(self) -> Result<&'static Encoding> {
        Ok(self)
    }
}

impl IntoEncoding for &str {
    fn into_encoding(self) -> Result<&'static Encoding> {
        label::lookup(self).ok_or_else(|| Error::UnknownEncoding(self.to_owned()))
    }
}

impl IntoEncoding for &String {
    fn into_encoding(self) -> Result<&'static Encoding> {
        self.as_str().into_encoding()
    }
}

impl IntoEncoding for String {
    fn into_encoding(self) -> Result<&'static Encoding> {
        label::lookup(&self).ok_or(Error::UnknownEncoding(self))
    }
}
