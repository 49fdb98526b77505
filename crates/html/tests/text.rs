use html::{Converter, InputFormat, OutputFormat};

fn converter(from: InputFormat, to: OutputFormat, wrap: Option<usize>) -> Converter {
    let mut converter = Converter::new();
    converter
        .set_input_format(from)
        .and_then(|c| c.set_output_format(to))
        .and_then(|c| c.set_wrap(wrap))
        .expect("configure");
    converter
}

#[test]
fn html_renders_as_text_with_block_breaks() {
    let converter = converter(InputFormat::Html, OutputFormat::Text, Some(72));
    assert_eq!(
        converter
            .convert_str("<p>Hello <b>world</b></p><p>second<br>line</p><script>x()</script>")
            .expect("convert"),
        "Hello world\r\n\r\nsecond\r\nline\r\n"
    );
}

#[test]
fn html_lists_and_quotes_render_as_text() {
    let converter = converter(InputFormat::Html, OutputFormat::Text, Some(72));
    assert_eq!(
        converter
            .convert_str("<ol><li>first<li>second</ol><blockquote>quoted</blockquote>after")
            .expect("convert"),
        "1. first\r\n2. second\r\n\r\n> quoted\r\n\r\nafter\r\n"
    );
}

#[test]
fn rendered_text_wraps_at_the_width() {
    let converter = converter(InputFormat::Html, OutputFormat::Text, Some(20));
    assert_eq!(
        converter
            .convert_str("<p>one two three four five six</p>")
            .expect("convert"),
        "one two three four\r\nfive six\r\n"
    );
}

#[test]
fn a_word_longer_than_the_width_is_not_split() {
    let converter = converter(InputFormat::Text, OutputFormat::Text, Some(5));
    assert_eq!(
        converter.convert_str("a abcdefghij b").expect("convert"),
        "a\r\nabcdefghij\r\nb\r\n"
    );
}

#[test]
fn text_input_is_copied_without_markup() {
    let converter = converter(InputFormat::Text, OutputFormat::Text, None);
    assert_eq!(
        converter
            .convert_str("x <b>not a tag</b> & more\nnext")
            .expect("convert"),
        "x <b>not a tag</b> & more\r\nnext\r\n"
    );
}

#[test]
fn text_converts_to_escaped_html() {
    let mut converter = converter(InputFormat::Text, OutputFormat::Html, None);
    converter.set_fragment(true).expect("configure");
    assert_eq!(
        converter.convert_str("a  b\nc < d").expect("convert"),
        "<div>a &nbsp;b<br>\r\nc &lt; d</div>\r\n"
    );
}

#[test]
fn image_alt_text_is_kept() {
    let converter = converter(InputFormat::Html, OutputFormat::Text, None);
    assert_eq!(
        converter
            .convert_str("see <img src=\"a.png\" alt=\"the chart\"> here")
            .expect("convert"),
        "see the chart here\r\n"
    );
}
