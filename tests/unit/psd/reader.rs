use super::*;

#[test]
fn reads_big_endian_integers_in_sequence() {
    let data = [0x01, 0x02, 0xFF, 0xFE, 0x00, 0x00, 0x01, 0x00, 0x80];
    let mut r = Reader::new(&data);
    assert_eq!(r.u16("a").unwrap(), 0x0102);
    assert_eq!(r.i16("b").unwrap(), -2);
    assert_eq!(r.u32("c").unwrap(), 256);
    assert_eq!(r.u8("d").unwrap(), 0x80);
    assert!(r.is_empty());
}

#[test]
fn truncated_read_names_the_field() {
    let mut r = Reader::new(&[0, 1, 2]);
    let err = r.u32("layer count").unwrap_err();
    assert!(matches!(err, TemplateError::Parse(_)));
    assert!(err.to_string().contains("layer count"));
    // A failed read does not advance.
    assert_eq!(r.remaining(), 3);
}

#[test]
fn length_switches_width_for_large_documents() {
    let narrow = [0, 0, 0, 7];
    assert_eq!(Reader::new(&narrow).length(false, "len").unwrap(), 7);

    let wide = [0, 0, 0, 0, 0, 0, 0, 9];
    assert_eq!(Reader::new(&wide).length(true, "len").unwrap(), 9);
}

#[test]
fn pascal_string_consumes_padding() {
    // Length 3 + "abc" = 4 bytes, already aligned to 4; then length 1 + "x" padded to 4.
    let data = [3, b'a', b'b', b'c', 1, b'x', 0, 0, 0xAA];
    let mut r = Reader::new(&data);
    assert_eq!(r.pascal_string(4, "name").unwrap(), "abc");
    assert_eq!(r.pascal_string(4, "name").unwrap(), "x");
    assert_eq!(r.u8("tail").unwrap(), 0xAA);
}

#[test]
fn unicode_string_drops_trailing_nul() {
    let data = [0, 0, 0, 3, 0, b'H', 0, b'i', 0, 0];
    let mut r = Reader::new(&data);
    assert_eq!(r.unicode_string("name").unwrap(), "Hi");
}

#[test]
fn sub_reader_is_bounded() {
    let data = [1, 2, 3, 4, 5];
    let mut r = Reader::new(&data);
    let mut sub = r.sub(2, "block").unwrap();
    assert_eq!(sub.u16("inner").unwrap(), 0x0102);
    assert!(sub.u8("inner").is_err());
    assert_eq!(r.u8("outer").unwrap(), 3);
}

#[test]
fn utf16_decoding_replaces_lone_surrogates() {
    let raw = [0xD8, 0x00, 0x00, b'A'];
    assert_eq!(decode_utf16be(&raw), "\u{FFFD}A");
}
