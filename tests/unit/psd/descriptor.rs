use super::*;

fn id(out: &mut Vec<u8>, key: &str) {
    let len = if key.len() == 4 { 0 } else { key.len() as u32 };
    out.extend_from_slice(&len.to_be_bytes());
    out.extend_from_slice(key.as_bytes());
}

fn unicode(out: &mut Vec<u8>, s: &str) {
    let units: Vec<u16> = s.encode_utf16().chain(std::iter::once(0)).collect();
    out.extend_from_slice(&(units.len() as u32).to_be_bytes());
    for u in units {
        out.extend_from_slice(&u.to_be_bytes());
    }
}

fn header(out: &mut Vec<u8>, class: &str, count: u32) {
    unicode(out, "");
    id(out, class);
    out.extend_from_slice(&count.to_be_bytes());
}

#[test]
fn reads_scalar_items_in_order() {
    let mut d = Vec::new();
    header(&mut d, "TxLr", 5);
    id(&mut d, "Txt ");
    d.extend_from_slice(b"TEXT");
    unicode(&mut d, "Hello");
    id(&mut d, "long");
    d.extend_from_slice(b"long");
    d.extend_from_slice(&(-7i32).to_be_bytes());
    id(&mut d, "Scl ");
    d.extend_from_slice(b"UntF");
    d.extend_from_slice(b"#Prc");
    d.extend_from_slice(&50.0f64.to_be_bytes());
    id(&mut d, "antiAlias");
    d.extend_from_slice(b"enum");
    id(&mut d, "Annt");
    id(&mut d, "antiAliasSharp");
    id(&mut d, "flag");
    d.extend_from_slice(b"bool");
    d.push(1);

    let desc = read_descriptor(&mut Reader::new(&d)).unwrap();
    assert_eq!(desc.class_id, "TxLr");
    assert_eq!(desc.items.len(), 5);
    assert_eq!(desc.get("Txt ").and_then(DescValue::as_text), Some("Hello"));
    assert_eq!(desc.get("long"), Some(&DescValue::Integer(-7)));
    assert_eq!(
        desc.get("Scl "),
        Some(&DescValue::UnitFloat {
            unit: "#Prc".to_string(),
            value: 50.0
        })
    );
    assert_eq!(
        desc.get("antiAlias"),
        Some(&DescValue::Enum {
            type_id: "Annt".to_string(),
            value: "antiAliasSharp".to_string()
        })
    );
    assert_eq!(desc.get("flag"), Some(&DescValue::Bool(true)));
}

#[test]
fn reads_nested_descriptor_list_and_raw_data() {
    let mut d = Vec::new();
    header(&mut d, "null", 2);
    id(&mut d, "bounds");
    d.extend_from_slice(b"Objc");
    header(&mut d, "bounds", 1);
    id(&mut d, "Left");
    d.extend_from_slice(b"doub");
    d.extend_from_slice(&12.5f64.to_be_bytes());
    id(&mut d, "EngineData");
    d.extend_from_slice(b"tdta");
    d.extend_from_slice(&3u32.to_be_bytes());
    d.extend_from_slice(b"<<>");

    let desc = read_descriptor(&mut Reader::new(&d)).unwrap();
    let Some(DescValue::Descriptor(inner)) = desc.get("bounds") else {
        panic!("expected nested descriptor");
    };
    assert_eq!(inner.get("Left"), Some(&DescValue::Double(12.5)));
    assert_eq!(
        desc.get("EngineData").and_then(DescValue::as_raw),
        Some(&b"<<>"[..])
    );
}

#[test]
fn reads_value_lists() {
    let mut d = Vec::new();
    header(&mut d, "null", 1);
    id(&mut d, "list");
    d.extend_from_slice(b"VlLs");
    d.extend_from_slice(&2u32.to_be_bytes());
    d.extend_from_slice(b"long");
    d.extend_from_slice(&1i32.to_be_bytes());
    d.extend_from_slice(b"doub");
    d.extend_from_slice(&2.0f64.to_be_bytes());

    let desc = read_descriptor(&mut Reader::new(&d)).unwrap();
    assert_eq!(
        desc.get("list"),
        Some(&DescValue::List(vec![
            DescValue::Integer(1),
            DescValue::Double(2.0)
        ]))
    );
}

#[test]
fn unknown_value_type_is_a_parse_error() {
    let mut d = Vec::new();
    header(&mut d, "null", 1);
    id(&mut d, "what");
    d.extend_from_slice(b"zzzz");
    let err = read_descriptor(&mut Reader::new(&d)).unwrap_err();
    assert!(matches!(err, TemplateError::Parse(_)));
    assert!(err.to_string().contains("zzzz"));
}

#[test]
fn truncated_descriptor_is_a_parse_error() {
    let mut d = Vec::new();
    header(&mut d, "null", 3);
    id(&mut d, "long");
    d.extend_from_slice(b"long");
    d.extend_from_slice(&1i32.to_be_bytes());
    assert!(matches!(
        read_descriptor(&mut Reader::new(&d)),
        Err(TemplateError::Parse(_))
    ));
}
