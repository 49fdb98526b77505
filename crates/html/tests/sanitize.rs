use html::{
    ConvertError, Converter, Injection, SafeList, sanitize_document, sanitize_document_to,
    sanitize_fragment, strip_fragment_wrapper,
};

fn fragment(input: &str) -> String {
    sanitize_fragment(input).unwrap_or_else(|err| panic!("sanitize {input:?}: {err}"))
}

#[test]
fn script_is_removed_and_anchor_kept() {
    assert_eq!(
        fragment("<a><script>alert('XSS')</script>XSS</a>"),
        "<a>XSS</a>"
    );
}

#[test]
fn unclosed_formatting_is_closed() {
    assert_eq!(fragment("<b><i>unclosed"), "<b><i>unclosed</i></b>");
}

#[test]
fn fragment_output_has_no_wrapper() {
    assert_eq!(fragment("<p>hi</p>"), "<p>hi</p>");
    assert_eq!(fragment("plain"), "plain");
}

#[test]
fn empty_input_is_empty_output() {
    assert_eq!(sanitize_document("").expect("document"), "");
    assert_eq!(sanitize_fragment("").expect("fragment"), "");
    let mut out = Vec::new();
    sanitize_document_to(&b""[..], &mut out).expect("stream");
    assert!(out.is_empty());
}

#[test]
fn document_output_is_wrapped_in_html_and_body() {
    assert_eq!(
        sanitize_document("<p>x").expect("document"),
        "<html><body><p>x</p></body></html>\r\n"
    );
    assert_eq!(
        sanitize_document("<html><head><title>t</title></head><body><b>y</b></body></html>")
            .expect("document"),
        "<html><body><b>y</b></body></html>\r\n"
    );
}

#[test]
fn dangerous_attributes_and_urls_are_removed() {
    assert_eq!(
        fragment("<a href=\"javascript:alert(1)\" onclick=\"x()\" title=t>l</a>"),
        "<a title=\"t\">l</a>"
    );
    assert_eq!(
        fragment("<a href=\" java\tscript:x\">l</a>"),
        "<a>l</a>"
    );
    assert_eq!(
        fragment("<a href=\"https://example.com/?a=1&amp;b=2\">l</a>"),
        "<a href=\"https://example.com/?a=1&amp;b=2\">l</a>"
    );
    assert_eq!(
        fragment("<img src=\"pic.png\" style=\"x\" alt=\"\">"),
        "<img src=\"pic.png\" alt=\"\">"
    );
}

#[test]
fn disallowed_tags_never_appear_verbatim() {
    let inputs = [
        "<iframe src=\"http://x\">f</iframe>ok",
        "<object><param name=a>o</object>ok",
        "<svg><script>x</script></svg>ok",
        "<form><input value=v>f</form>ok",
        "<style>b{}</style>ok",
    ];
    for input in inputs {
        let out = fragment(input);
        assert_eq!(out, "ok", "input {input:?}");
    }
    assert_eq!(fragment("<blink>kept</blink>"), "kept");
}

#[test]
fn comments_are_dropped_when_filtering() {
    assert_eq!(fragment("a<!-- secret -->b"), "ab");
}

#[test]
fn normalizing_without_the_filter_keeps_markup() {
    let mut converter = Converter::new();
    converter
        .set_filter_html(false)
        .and_then(|c| c.set_fragment(true))
        .expect("configure");
    assert_eq!(
        converter
            .convert_str("<blink>b<!--c-->")
            .expect("convert"),
        "<div><blink>b<!--c--></blink></div>\r\n"
    );
}

#[test]
fn sanitizing_twice_changes_nothing() {
    let inputs = [
        "<b><i>x</b>y</i>",
        "<p>a<div>b<ul><li>c<li>d</ul></div>",
        "<table><tr><td><b>x</td><td>y</table>",
        "<a href=\"javascript:x\" name=n>l</a> &amp; &lt;tag&gt; caf\u{e9}",
        "<p>one<p>two<blockquote>three",
        "<font color=red><p>a</font>b",
    ];
    for input in inputs {
        let once = fragment(input);
        assert_eq!(fragment(&once), once, "input {input:?}");
    }
}

#[test]
fn normalizing_twice_changes_nothing_without_the_filter() {
    let inputs = [
        "<b><i>x</b>y</i>",
        "<p>one<p>two<ul><li>a<li>b</ul>",
        "a<!-- note -->b<blink>c</blink>",
        "<xmp><i>raw</i> & </xmp>after",
        "<textarea><b>t</b> &amp; &lt;</textarea>after",
        "<script>if (a < b) {}</script>tail",
        "<plaintext><b>x</b> &amp; y",
        "<i>lead<plaintext></i><!--c-->",
    ];
    for fragment in [false, true] {
        let mut converter = Converter::new();
        converter
            .set_filter_html(false)
            .and_then(|c| c.set_fragment(fragment))
            .expect("configure");
        let pass = |input: &str| {
            let out = converter
                .convert_str(input)
                .unwrap_or_else(|err| panic!("convert {input:?}: {err}"));
            if fragment {
                strip_fragment_wrapper(out)
            } else {
                out
            }
        };
        for input in inputs {
            let once = pass(input);
            assert_eq!(pass(&once), once, "input {input:?} fragment {fragment}");
        }
    }
}

#[test]
fn plaintext_content_stays_literal_without_the_filter() {
    let mut converter = Converter::new();
    converter.set_filter_html(false).expect("configure");
    assert_eq!(
        converter.convert_str("<plaintext><b>x").expect("convert"),
        "<html><body><plaintext><b>x"
    );
}

#[test]
fn custom_safe_list_is_an_allow_list() {
    let mut safe_list = SafeList::empty();
    safe_list
        .allow_tag("b")
        .and_then(|list| list.allow_attribute("span", "class"))
        .expect("safe list");
    let mut converter = Converter::new();
    converter
        .set_fragment(true)
        .and_then(|c| c.set_safe_list(safe_list))
        .expect("configure");
    assert_eq!(
        converter
            .convert_str("<b id=x>1</b><i>2</i><span class=c title=t>3</span>")
            .expect("convert"),
        "<div><b>1</b>2<span class=\"c\">3</span></div>\r\n"
    );
    assert_eq!(converter.counters().elements_filtered, 1);
    assert_eq!(converter.counters().attributes_filtered, 2);
}

#[test]
fn header_and_footer_are_injected() {
    let mut converter = Converter::new();
    converter
        .set_fragment(true)
        .and_then(|c| c.set_header(Some(Injection::html("<b>top<script>x</script>"))))
        .and_then(|c| c.set_footer(Some(Injection::text("<bottom>"))))
        .expect("configure");
    assert_eq!(
        converter.convert_str("<i>body").expect("convert"),
        "<div><b>top</b><i>body</i>&lt;bottom&gt;</div>\r\n"
    );
}

#[test]
fn configuration_is_locked_after_first_use() {
    let mut converter = Converter::new();
    converter.convert_str("x").expect("convert");
    assert!(matches!(
        converter.set_fragment(true),
        Err(ConvertError::ConfigurationLocked)
    ));
}
