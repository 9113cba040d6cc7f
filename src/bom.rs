use super::{label, Encoding};

/// Detects a byte order mark at the start of `input`, returning the encoding it indicates and
/// the bytes that follow it.
///
/// UTF-16LE (`FF FE`), UTF-16BE (`FE FF`) and UTF-8 (`EF BB BF`) are checked in this order. If
/// there is no BOM, this function returns `None` and `input` as is.
///
/// # Examples
///
/// ```rust
/// use webencodings::detect_bom;
///
/// let (encoding, rest) = detect_bom(b"\xEF\xBB\xBFhello");
/// assert_eq!(encoding.map(|e| e.name()), Some("utf-8"));
/// assert_eq!(rest, b"hello");
///
/// assert!(matches!(detect_bom(b"hello"), (None, b"hello")));
/// ```
pub fn detect_bom(input: &[u8]) -> (Option<&'static Encoding>, &[u8]) {
    if let Some(rest) = input.strip_prefix(b"\xFF\xFE") {
        (Some(label::cached(label::UTF_16LE)), rest)
    } else if let Some(rest) = input.strip_prefix(b"\xFE\xFF") {
        (Some(label::cached(label::UTF_16BE)), rest)
    } else if let Some(rest) = input.strip_prefix(b"\xEF\xBB\xBF") {
        (Some(label::cached(label::UTF_8)), rest)
    } else {
        (None, input)
    }
}
