use std::{
    fmt,
    sync::mpsc::{self, Receiver, SyncSender},
    thread,
};

use log::debug;

use super::{
    Encoding, Error, ErrorMode, IncrementalDecoder, IncrementalEncoder, IntoEncoding, Result,
};

/// A message from a producer thread to the consuming iterator.
enum Event<T> {
    /// The decoder settled on an encoding; sent once, before any chunk.
    Determined(&'static Encoding),
    Chunk(T),
    /// Terminal failure; nothing follows.
    Failed(Error),
}

/// Decodes a sequence of byte chunks on a background thread, returning a pull-based iterator
/// over the decoded text and the encoding actually used.
///
/// This function blocks until the encoding is determined, which takes the first three bytes
/// of input (or the whole input if it is shorter). Chunks are handed over one at a time: the
/// producer thread waits until the previous chunk is taken before decoding the next one. Only
/// non-empty text is yielded. An error ends the iteration after it is yielded as `Err`.
///
/// Dropping the returned iterator stops the producer after at most one more chunk.
///
/// `errors` defaults to [`ErrorMode::Replace`].
///
/// # Examples
///
/// ```rust
/// use webencodings::iter_decode;
///
/// let chunks = vec![b"\xEF\xBB".to_vec(), b"\xBFcaf\xC3".to_vec(), b"\xA9".to_vec()];
/// let (text, encoding) = iter_decode(chunks, "x-user-defined", None)?;
/// assert_eq!(encoding.name(), "utf-8");
/// assert_eq!(text.collect::<Result<String, _>>()?, "caf\u{e9}");
/// # Ok::<(), webencodings::Error>(())
/// ```
pub fn iter_decode<I>(
    input: I,
    fallback_encoding: impl IntoEncoding,
    errors: Option<ErrorMode>,
) -> Result<(IterDecode, &'static Encoding)>
where
    I: IntoIterator,
    I::Item: AsRef<[u8]>,
    I::IntoIter: Send + 'static,
{
    let decoder = IncrementalDecoder::new(fallback_encoding, errors)?;
    let chunks = input.into_iter();
    let (tx, rx) = mpsc::sync_channel(0);
    thread::Builder::new()
        .name("webencodings-iter-decode".into())
        .spawn(move || produce_decoded(chunks, decoder, tx))?;

    match rx.recv() {
        Ok(Event::Determined(encoding)) => Ok((IterDecode { rx }, encoding)),
        Ok(Event::Failed(e)) => Err(e),
        Ok(Event::Chunk(..)) | Err(..) => {
            debug_assert!(false, "producer sent no encoding");
            Err(Error::Disconnected)
        }
    }
}

fn produce_decoded(
    chunks: impl Iterator<Item = impl AsRef<[u8]>>,
    mut decoder: IncrementalDecoder,
    tx: SyncSender<Event<String>>,
) {
    let mut announced = false;
    for chunk in chunks {
        let ret = decoder.decode(chunk.as_ref(), false);
        if !forward_decoded(&tx, &decoder, &mut announced, ret) {
            return;
        }
    }
    let ret = decoder.decode(&[], true);
    forward_decoded(&tx, &decoder, &mut announced, ret);
}

/// Sends the outcome of one decoder call, announcing the encoding first if it has just been
/// determined. Returns `false` if the producer should stop.
fn forward_decoded(
    tx: &SyncSender<Event<String>>,
    decoder: &IncrementalDecoder,
    announced: &mut bool,
    ret: Result<String>,
) -> bool {
    let text = match ret {
        Ok(text) => text,
        Err(e) => {
            let _ = tx.send(Event::Failed(e));
            return false;
        }
    };
    if !*announced {
        if let Some(encoding) = decoder.encoding() {
            if tx.send(Event::Determined(encoding)).is_err() {
                return false;
            }
            *announced = true;
        }
    }
    send_chunk(tx, text)
}

/// Encodes a sequence of text chunks on a background thread, returning a pull-based iterator
/// over the encoded bytes.
///
/// Only non-empty byte chunks are yielded. An error ends the iteration after it is yielded as
/// `Err`. Dropping the returned iterator stops the producer after at most one more chunk.
///
/// `errors` defaults to [`ErrorMode::Strict`].
///
/// # Examples
///
/// ```rust
/// use webencodings::iter_encode;
///
/// let bytes = iter_encode(["a", "", "\u{f7d9}"], "x-user-defined", None)?;
/// assert_eq!(bytes.collect::<Result<Vec<_>, _>>()?, [b"a".to_vec(), b"\xD9".to_vec()]);
/// # Ok::<(), webencodings::Error>(())
/// ```
pub fn iter_encode<I>(
    input: I,
    encoding: impl IntoEncoding,
    errors: Option<ErrorMode>,
) -> Result<IterEncode>
where
    I: IntoIterator,
    I::Item: AsRef<str>,
    I::IntoIter: Send + 'static,
{
    let encoder = IncrementalEncoder::new(encoding, errors)?;
    let chunks = input.into_iter();
    let (tx, rx) = mpsc::sync_channel(0);
    thread::Builder::new()
        .name("webencodings-iter-encode".into())
        .spawn(move || produce_encoded(chunks, encoder, tx))?;
    Ok(IterEncode { rx })
}

fn produce_encoded(
    chunks: impl Iterator<Item = impl AsRef<str>>,
    mut encoder: IncrementalEncoder,
    tx: SyncSender<Event<Vec<u8>>>,
) {
    for chunk in chunks {
        let ret = encoder.encode(chunk.as_ref(), false);
        if !forward_encoded(&tx, ret) {
            return;
        }
    }
    let ret = encoder.encode("", true);
    forward_encoded(&tx, ret);
}

fn forward_encoded(tx: &SyncSender<Event<Vec<u8>>>, ret: Result<Vec<u8>>) -> bool {
    match ret {
        Ok(bytes) => send_chunk(tx, bytes),
        Err(e) => {
            let _ = tx.send(Event::Failed(e));
            false
        }
    }
}

/// Sends a non-empty chunk, returning `false` if the consumer has gone away.
fn send_chunk<T: Chunk>(tx: &SyncSender<Event<T>>, chunk: T) -> bool {
    if chunk.is_empty() {
        return true;
    }
    let ok = tx.send(Event::Chunk(chunk)).is_ok();
    if !ok {
        debug!("iterator dropped, stopping producer");
    }
    ok
}

trait Chunk {
    fn is_empty(&self) -> bool;
}

impl Chunk for String {
    fn is_empty(&self) -> bool {
        String::is_empty(self)
    }
}

impl Chunk for Vec<u8> {
    fn is_empty(&self) -> bool {
        Vec::is_empty(self)
    }
}

fn next_chunk<T>(rx: &Receiver<Event<T>>) -> Option<Result<T>> {
    loop {
        match rx.recv() {
            Ok(Event::Chunk(chunk)) => return Some(Ok(chunk)),
            Ok(Event::Failed(e)) => return Some(Err(e)),
            Ok(Event::Determined(..)) => {}
            // the producer has finished
            Err(..) => return None,
        }
    }
}

/// The iterator returned by [`iter_decode`].
pub struct IterDecode {
    rx: Receiver<Event<String>>,
}

impl Iterator for IterDecode {
    type Item = Result<String>;

    fn next(&mut self) -> Option<Self::Item> {
        next_chunk(&self.rx)
    }
}

impl fmt::Debug for IterDecode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IterDecode").finish_non_exhaustive()
    }
}

/// The iterator returned by [`iter_encode`].
pub struct IterEncode {
    rx: Receiver<Event<Vec<u8>>>,
}

impl Iterator for IterEncode {
    type Item = Result<Vec<u8>>;

    fn next(&mut self) -> Option<Self::Item> {
        next_chunk(&self.rx)
    }
}

impl fmt::Debug for IterEncode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IterEncode").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use std::{
        sync::{
            atomic::{AtomicUsize, Ordering},
            mpsc, Arc,
        },
        time::Duration,
    };

    use super::{iter_decode, iter_encode};
    use crate::{Error, ErrorMode};

    #[test]
    fn decode_chunks_in_order() {
        let chunks: Vec<Vec<u8>> = vec![b"a".to_vec(), b"".to_vec(), b"bc".to_vec(), b"\xD9".to_vec()];
        let (text, encoding) = iter_decode(chunks, "x-user-defined", None).unwrap();
        assert_eq!(encoding.name(), "x-user-defined");
        // the first three bytes are decoded together once the encoding is known
        let text: Vec<String> = text.map(Result::unwrap).collect();
        assert_eq!(text, ["abc", "\u{f7d9}"]);
    }

    #[test]
    fn decode_empty_source() {
        let (text, encoding) = iter_decode(Vec::<Vec<u8>>::new(), "x-user-defined", None).unwrap();
        assert_eq!(encoding.name(), "x-user-defined");
        assert_eq!(text.count(), 0);

        let (mut text, encoding) =
            iter_decode(vec![vec![0xfe, 0xff]], "x-user-defined", None).unwrap();
        assert_eq!(encoding.name(), "utf-16be");
        assert!(text.next().is_none());
    }

    #[test]
    fn decode_with_bom() {
        let chunks = vec![vec![0xef], vec![0xbb], vec![0xbf], b"\xC3\xA9".to_vec()];
        let (text, encoding) = iter_decode(chunks, "x-user-defined", None).unwrap();
        assert_eq!(encoding.name(), "utf-8");
        assert_eq!(text.collect::<Result<String, _>>().unwrap(), "\u{e9}");
    }

    #[test]
    fn unknown_labels() {
        assert!(matches!(
            iter_decode(Vec::<Vec<u8>>::new(), "invalid", None),
            Err(Error::UnknownEncoding(_))
        ));
        assert!(matches!(
            iter_encode(Vec::<String>::new(), "invalid", None),
            Err(Error::UnknownEncoding(_))
        ));
    }

    #[test]
    fn encode_chunks_in_order() {
        let chunks = vec!["ab".to_owned(), String::new(), "\u{f780}c".to_owned()];
        let bytes = iter_encode(chunks, "x-user-defined", None).unwrap();
        let bytes: Vec<Vec<u8>> = bytes.map(Result::unwrap).collect();
        assert_eq!(bytes, [b"ab".to_vec(), b"\x80c".to_vec()]);

        assert_eq!(iter_encode([""; 0], "x-user-defined", None).unwrap().count(), 0);
    }

    #[test]
    fn encode_error_ends_iteration() {
        let mut bytes = iter_encode(["a", "\u{e9}", "b"], "x-user-defined", None).unwrap();
        assert_eq!(bytes.next().unwrap().unwrap(), b"a");
        assert!(matches!(
            bytes.next(),
            Some(Err(Error::UnmappableCodepoint {
                character: '\u{e9}',
                ..
            }))
        ));
        assert!(bytes.next().is_none());

        let bytes = iter_encode(["a", "\u{e9}", "b"], "x-user-defined", Some(ErrorMode::Ignore));
        let bytes: Vec<Vec<u8>> = bytes.unwrap().map(Result::unwrap).collect();
        assert_eq!(bytes, [b"a".to_vec(), b"b".to_vec()]);
    }

    #[test]
    fn dropping_iterator_stops_producer() {
        let pulled = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&pulled);
        // disconnected once the producer thread drops the source
        let (alive_tx, alive_rx) = mpsc::channel::<()>();
        let source = (0..1000).map(move |_| {
            let _alive = &alive_tx;
            counter.fetch_add(1, Ordering::SeqCst);
            "x"
        });

        let mut bytes = iter_encode(source, "x-user-defined", None).unwrap();
        assert_eq!(bytes.next().unwrap().unwrap(), b"x");
        drop(bytes);

        assert_eq!(
            alive_rx.recv_timeout(Duration::from_secs(10)),
            Err(mpsc::RecvTimeoutError::Disconnected)
        );
        assert!(pulled.load(Ordering::SeqCst) <= 3);
    }
}
