
#[test]
fn ex_readme_examples() -> Result<(), Box<dyn std::error::Error>> {
    use std::io::prelude::*;

    use super::{DecodingReader, EncodingWriter};

    let src: &[u8] = &[0xef, 0xbb, 0xbf, b'H', b'i', b' ', 0xe2, 0x98, 0xba];
    let dst: &[u8] = &[b'H', b'i', b' ', 0xd9, 0x80];

    let mut reader = DecodingReader::new(src, "x-user-defined", None)?;
    let mut writer = EncodingWriter::new(Vec::new(), "x-user-defined", None)?;

    let mut utf8 = String::new();
    reader.read_to_string(&mut utf8)?;
    assert_eq!(utf8, "Hi \u{263a}");
    assert_eq!(reader.encoding().map(|e| e.name()), Some("utf-8"));

    write!(writer, "Hi \u{f7d9}\u{f780}")?;
    let (sink, _, ret) = writer.finish();
    ret?;
    assert_eq!(sink, dst);

    Ok(())
}
