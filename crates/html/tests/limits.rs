use html::{ConvertError, Converter};

fn fragment_converter(configure: impl FnOnce(&mut Converter)) -> Converter {
    let mut converter = Converter::new();
    converter.set_fragment(true).expect("configure");
    configure(&mut converter);
    converter
}

#[test]
fn tag_longer_than_the_limit_degrades_to_text() {
    let converter = fragment_converter(|c| {
        c.set_max_tag_size(3).expect("configure");
    });
    assert_eq!(converter.convert_str("<b>x").expect("fits"), "<div><b>x</b></div>\r\n");

    let converter = fragment_converter(|c| {
        c.set_max_tag_size(3).expect("configure");
    });
    assert_eq!(
        converter.convert_str("<br>x").expect("too long"),
        "<div>&lt;br&gt;x</div>\r\n"
    );
    assert_eq!(converter.counters().tags_too_long, 1);
}

#[test]
fn nesting_one_past_the_limit_is_fatal() {
    let depth = 16;
    let converter = fragment_converter(|c| {
        c.set_max_nesting_depth(depth).expect("configure");
    });
    let fits = "<div>".repeat(depth);
    converter.convert_str(&fits).expect("within the limit");
    assert_eq!(converter.counters().max_nesting_depth, depth as u64);

    let converter = fragment_converter(|c| {
        c.set_max_nesting_depth(depth).expect("configure");
    });
    let too_deep = "<div>".repeat(depth + 1);
    let err = converter.convert_str(&too_deep).expect_err("too deep");
    assert!(matches!(
        err,
        ConvertError::DocumentTooComplex { depth: 17, limit: 16 }
    ));
}

#[test]
fn deep_nesting_fails_through_the_stream_adapters_too() {
    let converter = fragment_converter(|c| {
        c.set_max_nesting_depth(8).expect("configure");
    });
    let input = "<span>".repeat(64);
    let mut reader = converter.reader(input.as_bytes()).expect("reader");
    let mut out = Vec::new();
    let err = std::io::Read::read_to_end(&mut reader, &mut out).expect_err("too deep");
    assert_eq!(err.kind(), std::io::ErrorKind::Other);
    let mut buf = [0u8; 4];
    assert!(matches!(
        reader.read_range(&mut buf, 0, 4),
        Err(ConvertError::Poisoned)
    ));
}

#[test]
fn attributes_past_the_cap_are_dropped() {
    let converter = fragment_converter(|c| {
        c.set_max_attributes_per_tag(2).expect("configure");
    });
    assert_eq!(
        converter
            .convert_str("<p id=a class=b title=c>x</p>")
            .expect("convert"),
        "<div><p id=\"a\" class=\"b\">x</p></div>\r\n"
    );
    assert_eq!(converter.counters().attributes_dropped, 1);
}

#[test]
fn invalid_limits_are_rejected() {
    for configure in [
        (|c: &mut Converter| {
            c.set_max_tag_size(0).expect("configure");
        }) as fn(&mut Converter),
        |c| {
            c.set_buffer_size(0).expect("configure");
        },
        |c| {
            c.set_wrap(Some(0)).expect("configure");
        },
    ] {
        let converter = fragment_converter(configure);
        assert!(matches!(
            converter.convert_str("x"),
            Err(ConvertError::InvalidConfiguration(_))
        ));
    }
}

#[test]
fn oversized_tags_are_recorded_as_parse_errors() {
    let converter = fragment_converter(|c| {
        c.set_max_tag_size(8).expect("configure");
    });
    let mut reader = converter
        .str_reader("<a href=\"http://example.com\">x</a>")
        .expect("reader");
    let mut out = String::new();
    std::io::Read::read_to_string(&mut reader, &mut out).expect("read");
    assert_eq!(
        out,
        "<div>&lt;a href=\"http://example.com\"&gt;x</div>\r\n"
    );
    let counters = reader.counters().expect("open");
    assert_eq!(counters.tags_too_long, 1);
    assert!(counters.parse_errors >= 1);
}
