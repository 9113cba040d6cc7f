//! Resolution of encoding labels, implementing the "get an encoding" algorithm of the WHATWG
//! Encoding Standard on top of the `encoding_rs` label table.

use std::sync::OnceLock;

use log::trace;

use super::Encoding;

/// The characters stripped from both ends of a label: TAB, LF, FF, CR and SPACE.
const ASCII_WHITESPACE: [char; 5] = ['\t', '\n', '\x0C', '\r', ' '];

/// The canonical names of all the encodings a label can resolve to.
///
/// These are the lower-cased encoding names of the WHATWG Encoding Standard, `replacement`
/// included. The entries at [`UTF_8`], [`UTF_16LE`] and [`UTF_16BE`] are the encodings a byte
/// order mark can select.
pub const CANONICAL_NAMES: [&str; 40] = [
    "utf-8",
    "utf-16le",
    "utf-16be",
    "ibm866",
    "iso-8859-2",
    "iso-8859-3",
    "iso-8859-4",
    "iso-8859-5",
    "iso-8859-6",
    "iso-8859-7",
    "iso-8859-8",
    "iso-8859-8-i",
    "iso-8859-10",
    "iso-8859-13",
    "iso-8859-14",
    "iso-8859-15",
    "iso-8859-16",
    "koi8-r",
    "koi8-u",
    "macintosh",
    "windows-874",
    "windows-1250",
    "windows-1251",
    "windows-1252",
    "windows-1253",
    "windows-1254",
    "windows-1255",
    "windows-1256",
    "windows-1257",
    "windows-1258",
    "x-mac-cyrillic",
    "gbk",
    "gb18030",
    "big5",
    "euc-jp",
    "iso-2022-jp",
    "shift_jis",
    "euc-kr",
    "replacement",
    "x-user-defined",
];

pub(crate) const UTF_8: usize = 0;
pub(crate) const UTF_16LE: usize = 1;
pub(crate) const UTF_16BE: usize = 2;

/// One `Encoding` per canonical name, built on first use.
static CACHE: [OnceLock<Encoding>; CANONICAL_NAMES.len()] =
    [const { OnceLock::new() }; CANONICAL_NAMES.len()];

/// Looks for an encoding by its label.
///
/// Leading and trailing ASCII whitespace is ignored and ASCII letters match case-insensitively;
/// any other character must match exactly. Returns `None` if the label is unknown.
///
/// # Examples
///
/// ```rust
/// use webencodings::lookup;
///
/// assert_eq!(lookup(" \t UTF8 \n").map(|e| e.name()), Some("utf-8"));
/// assert_eq!(lookup("latin1").map(|e| e.name()), Some("windows-1252"));
/// assert!(lookup("latin-1").is_none());
/// ```
pub fn lookup(label: &str) -> Option<&'static Encoding> {
    let label = normalize(label);
    let encoding = encoding_rs::Encoding::for_label(label.as_bytes())?;
    let index = CANONICAL_NAMES
        .iter()
        .position(|name| name.eq_ignore_ascii_case(encoding.name()))?;
    Some(cached(index))
}

/// Returns the cached `Encoding` of the canonical name at `index` in [`CANONICAL_NAMES`].
pub(crate) fn cached(index: usize) -> &'static Encoding {
    CACHE[index].get_or_init(|| {
        let name = CANONICAL_NAMES[index];
        trace!("caching encoding {}", name);
        Encoding::new(name)
    })
}

/// Strips ASCII whitespace from both ends and maps (only) `A`-`Z` to `a`-`z`.
pub(crate) fn normalize(label: &str) -> String {
    label
        .trim_matches(&ASCII_WHITESPACE[..])
        .to_ascii_lowercase()
}
