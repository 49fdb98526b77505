use charset::{UTF_16LE, WINDOWS_1252};
use html::{Converter, ConverterConfig};

fn fragment_converter() -> Converter {
    let mut converter = Converter::new();
    converter.set_fragment(true).expect("configure");
    converter
}

fn utf16le_with_bom(text: &str) -> Vec<u8> {
    let mut bytes = vec![0xFF, 0xFE];
    for unit in text.encode_utf16() {
        bytes.extend_from_slice(&unit.to_le_bytes());
    }
    bytes
}

#[test]
fn byte_order_mark_overrides_the_declared_encoding() {
    let converter = fragment_converter();
    let input = utf16le_with_bom("<b>\u{e9}t\u{e9}</b>");
    let mut out = Vec::new();
    converter.convert(input.as_slice(), &mut out).expect("convert");
    assert_eq!(
        String::from_utf8(out).expect("utf-8"),
        "<div><b>\u{e9}t\u{e9}</b></div>\r\n"
    );
}

#[test]
fn meta_http_equiv_declares_the_encoding() {
    let converter = fragment_converter();
    let input: &[u8] =
        b"<meta http-equiv=\"Content-Type\" content=\"text/html; charset=windows-1252\"><p>\xE9";
    let mut out = Vec::new();
    converter.convert(input, &mut out).expect("convert");
    assert_eq!(
        String::from_utf8(out).expect("utf-8"),
        "<div><p>\u{e9}</p></div>\r\n"
    );
}

#[test]
fn meta_is_ignored_when_detection_is_off() {
    let mut converter = fragment_converter();
    converter.set_detect_encoding_from_meta(false).expect("configure");
    let input: &[u8] = b"<meta charset=windows-1252><p>\xE9";
    let mut out = Vec::new();
    converter.convert(input, &mut out).expect("convert");
    assert_eq!(
        String::from_utf8(out).expect("utf-8"),
        "<div><p>\u{FFFD}</p></div>\r\n"
    );
}

#[test]
fn characters_the_output_encoding_lacks_become_entities() {
    let mut converter = fragment_converter();
    converter.set_output_encoding(WINDOWS_1252).expect("configure");
    let mut out = Vec::new();
    converter
        .convert("<p>\u{e9} \u{3b1}</p>".as_bytes(), &mut out)
        .expect("convert");
    assert_eq!(out, b"<div><p>\xE9 &#x3B1;</p></div>\r\n");
}

#[test]
fn utf16_output_starts_with_a_byte_order_mark() {
    let mut config = ConverterConfig::default();
    config.normalizer.fragment = true;
    config.output_encoding = UTF_16LE;
    config.output_bom = true;
    let converter = Converter::with_config(config);
    let mut out = Vec::new();
    converter.convert(&b"x"[..], &mut out).expect("convert");
    assert_eq!(out, utf16le_with_bom("<div>x</div>\r\n"));
}

#[test]
fn utf16_code_units_convert_with_lone_surrogates_replaced() {
    let mut units: Vec<u16> = "<b>caf\u{e9}".encode_utf16().collect();
    units.push(0xD800);
    units.extend("</b>".encode_utf16());
    let converter = fragment_converter();
    assert_eq!(
        converter.convert_utf16(&units).expect("convert"),
        "<div><b>caf\u{e9}\u{FFFD}</b></div>\r\n"
    );
}
