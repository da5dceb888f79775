use super::*;

#[test]
fn parses_nested_dicts_arrays_and_scalars() {
    let src = b"\n\n<<\n\t/EngineDict\n\t<<\n\t\t/Sizes [ 12.0 -3 .5 ]\n\t\t/On true\n\t\t/Off false\n\t\t/Kind /Roman\n\t>>\n>>";
    let root = parse_engine_data(src).unwrap();
    let dict = root.get("EngineDict").unwrap();
    let sizes: Vec<f64> = dict
        .get("Sizes")
        .and_then(EngineValue::as_array)
        .unwrap()
        .iter()
        .filter_map(EngineValue::as_f64)
        .collect();
    assert_eq!(sizes, vec![12.0, -3.0, 0.5]);
    assert_eq!(dict.get("On"), Some(&EngineValue::Bool(true)));
    assert_eq!(dict.get("Off"), Some(&EngineValue::Bool(false)));
    assert_eq!(dict.get("Kind").and_then(EngineValue::as_str), Some("Roman"));
}

#[test]
fn decodes_utf16_strings_with_bom_and_escapes() {
    // "a(" as UTF-16BE: 00 61 00 28, with the paren escaped.
    let mut src = b"<< /Text (".to_vec();
    src.extend_from_slice(&[0xFE, 0xFF, 0x00, b'a', 0x00, b'\\', b'(']);
    src.extend_from_slice(b") >>");
    let root = parse_engine_data(&src).unwrap();
    assert_eq!(root.get("Text").and_then(EngineValue::as_str), Some("a("));
}

#[test]
fn plain_strings_decode_as_latin1() {
    let root = parse_engine_data(b"<< /Name (Caf\xe9) >>").unwrap();
    assert_eq!(root.get("Name").and_then(EngineValue::as_str), Some("Café"));
}

#[test]
fn path_follows_nested_keys() {
    let root = parse_engine_data(b"<< /A << /B << /C 4 >> >> >>").unwrap();
    assert_eq!(root.path(&["A", "B", "C"]).and_then(EngineValue::as_f64), Some(4.0));
    assert!(root.path(&["A", "X"]).is_none());
}

#[test]
fn malformed_input_is_a_parse_error() {
    for src in [&b"<< /A [ 1 2 "[..], b"<< /A (abc", b"<< 12 >>", b"<< /A 1 >> junk"] {
        let err = parse_engine_data(src).unwrap_err();
        assert!(matches!(err, TemplateError::Parse(_)), "{err}");
    }
}

#[test]
fn nesting_is_bounded() {
    let mut src = Vec::new();
    for _ in 0..200 {
        src.extend_from_slice(b"[ ");
    }
    assert!(parse_engine_data(&src).is_err());
}
