use super::*;
use crate::shared::DocumentParseContext;
use crate::tokenizer::HtmlTokenizer;

fn normalize_with(
    config: NormalizerConfig,
    html: &str,
) -> (Result<Vec<NormalizedEvent>, ConvertError>, DocumentParseContext) {
    let mut ctx = DocumentParseContext::new();
    let mut tokenizer = HtmlTokenizer::new(TokenizerConfig::default(), &mut ctx);
    let mut normalizer = Normalizer::new(config, &mut ctx);
    let mut input = Input::new();
    let mut events = Vec::new();
    let _ = tokenizer.push_str(&mut input, html, &mut ctx);
    tokenizer.finish(&input, &mut ctx);
    let batch = tokenizer.next_batch(&mut input);
    let result = normalizer
        .process_batch(&batch, &mut ctx, &mut events)
        .map(|()| events);
    (result, ctx)
}

fn fragment_config() -> NormalizerConfig {
    NormalizerConfig {
        fragment: true,
        ..NormalizerConfig::default()
    }
}

fn render(events: &[NormalizedEvent]) -> String {
    let mut out = String::new();
    for event in events {
        match event {
            NormalizedEvent::Start { name, attrs, .. } => {
                out.push('<');
                out.push_str(name);
                for (attr, value) in attrs {
                    out.push(' ');
                    out.push_str(attr);
                    if let Some(value) = value {
                        out.push_str(&format!("=\"{value}\""));
                    }
                }
                out.push('>');
            }
            NormalizedEvent::End { name, .. } => {
                out.push_str(&format!("</{name}>"));
            }
            NormalizedEvent::Text(text) => out.push_str(text),
            NormalizedEvent::Comment(text) => out.push_str(&format!("<!--{text}-->")),
            NormalizedEvent::Doctype { name, .. } => {
                out.push_str(&format!("<!DOCTYPE {}>", name.as_deref().unwrap_or("")));
            }
            NormalizedEvent::EndOfDocument => out.push('$'),
        }
    }
    out
}

fn fragment(html: &str) -> String {
    let (events, _) = normalize_with(fragment_config(), html);
    render(&events.expect("normalize"))
}

#[test]
fn unclosed_formatting_is_closed_at_end() {
    assert_eq!(fragment("<b><i>unclosed"), "<div><b><i>unclosed</i></b></div>$");
}

#[test]
fn script_subtree_is_dropped_and_anchor_kept() {
    assert_eq!(
        fragment("<a><script>alert('XSS')</script>XSS</a>"),
        "<div><a>XSS</a></div>$"
    );
}

#[test]
fn misnested_formatting_is_reopened() {
    let (events, ctx) = normalize_with(fragment_config(), "<b><i>x</b>y</i>");
    let events = events.expect("normalize");
    assert_eq!(render(&events), "<div><b><i>x</i></b><i>y</i></div>$");
    assert!(events.contains(&NormalizedEvent::End {
        name: "i".to_string(),
        origin: TagOrigin::Implied,
    }));
    assert!(events.iter().any(|event| matches!(
        event,
        NormalizedEvent::Start { name, origin: TagOrigin::Reopened, .. } if name == "i"
    )));
    assert_eq!(ctx.counters.elements_reopened, 1);
}

#[test]
fn formatting_still_in_effect_is_not_reopened() {
    assert_eq!(
        fragment("<i><b><i>x</b>y</i>"),
        "<div><i><b><i>x</i></b>y</i></div>$"
    );
}

#[test]
fn reopened_elements_keep_their_attributes() {
    assert_eq!(
        fragment("<p><font color=red>a</p>b"),
        "<div><p><font color=\"red\">a</font></p><font color=\"red\">b</font></div>$"
    );
}

#[test]
fn reopening_is_bounded_per_end_tag() {
    let (events, ctx) = normalize_with(
        fragment_config(),
        "<div><b><i><u><s><sub><sup><tt><small><big><blink>x</div>y",
    );
    events.expect("normalize");
    assert_eq!(ctx.counters.elements_reopened, MAX_REOPENED_PER_END_TAG as u64);
}

#[test]
fn block_start_closes_open_paragraph() {
    assert_eq!(
        fragment("<p>one<div>two</div>"),
        "<div><p>one</p><div>two</div></div>$"
    );
    assert_eq!(
        fragment("<p>a<button><p>b</button>"),
        "<div><p>a<button><p>b</p></button></p></div>$"
    );
}

#[test]
fn list_items_close_their_siblings() {
    assert_eq!(
        fragment("<ul><li>a<li>b</ul>"),
        "<div><ul><li>a</li><li>b</li></ul></div>$"
    );
    assert_eq!(
        fragment("<dl><dt>t<dd>d<dt>u</dl>"),
        "<div><dl><dt>t</dt><dd>d</dd><dt>u</dt></dl></div>$"
    );
}

#[test]
fn table_parts_close_their_siblings() {
    assert_eq!(
        fragment("<table><tr><td>1<td>2<tr><td>3</table>"),
        "<div><table><tr><td>1</td><td>2</td></tr><tr><td>3</td></tr></table></div>$"
    );
}

#[test]
fn formatting_does_not_leak_out_of_cells() {
    assert_eq!(
        fragment("<table><tr><td><b>x</td><td>y</table>"),
        "<div><table><tr><td><b>x</b></td><td>y</td></tr></table></div>$"
    );
}

#[test]
fn heading_end_tag_closes_any_heading() {
    assert_eq!(
        fragment("<h1>a<h2>b</h1>c"),
        "<div><h1>a</h1><h2>b</h2>c</div>$"
    );
}

#[test]
fn unmatched_end_tags_are_ignored() {
    let (events, ctx) = normalize_with(fragment_config(), "a</span>b</div>");
    assert_eq!(render(&events.expect("normalize")), "<div>ab</div>$");
    assert_eq!(ctx.counters.end_tags_ignored, 2);
}

#[test]
fn end_br_becomes_a_line_break() {
    assert_eq!(fragment("a</br>b"), "<div>a<br>b</div>$");
}

#[test]
fn disallowed_tags_keep_their_content() {
    let (events, ctx) = normalize_with(fragment_config(), "<blink>hi</blink>");
    assert_eq!(render(&events.expect("normalize")), "<div>hi</div>$");
    assert_eq!(ctx.counters.elements_filtered, 1);
}

#[test]
fn nested_dropped_elements_track_depth() {
    assert_eq!(
        fragment("<object><object>a</object>b</object>c"),
        "<div>c</div>$"
    );
}

#[test]
fn unsafe_attributes_are_removed() {
    let (events, ctx) = normalize_with(
        fragment_config(),
        "<a href=\"javascript:alert(1)\" title=t onclick=\"x()\">l</a><img src=\"http://x/y.png\" alt=\"\" style=\"a\">",
    );
    assert_eq!(
        render(&events.expect("normalize")),
        "<div><a title=\"t\">l</a><img src=\"http://x/y.png\" alt=\"\"></div>$"
    );
    assert_eq!(ctx.counters.attributes_filtered, 3);
}

#[test]
fn unfiltered_mode_keeps_everything_balanced() {
    let config = NormalizerConfig {
        filter: false,
        ..fragment_config()
    };
    let (events, _) = normalize_with(config, "<script>x</script><!--c--><blink>b");
    assert_eq!(
        render(&events.expect("normalize")),
        "<div><script>x</script><!--c--><blink>b</blink></div>$"
    );
}

#[test]
fn document_structure_absorbs_input_wrappers() {
    let (events, _) = normalize_with(
        NormalizerConfig::default(),
        "<html><head><title>t</title></head>\n<body class=x><p>x</p></body></html>\n",
    );
    assert_eq!(
        render(&events.expect("normalize")),
        "<html><body><p>x</p></body></html>$"
    );
}

#[test]
fn doctype_is_kept_only_unfiltered() {
    let unfiltered = NormalizerConfig {
        filter: false,
        ..NormalizerConfig::default()
    };
    let (events, _) = normalize_with(unfiltered, "<!DOCTYPE html><p>x");
    assert_eq!(
        render(&events.expect("normalize")),
        "<!DOCTYPE html><html><body><p>x</p></body></html>$"
    );
    let (events, _) = normalize_with(NormalizerConfig::default(), "<!DOCTYPE html><p>x");
    assert_eq!(
        render(&events.expect("normalize")),
        "<html><body><p>x</p></body></html>$"
    );
}

#[test]
fn empty_input_produces_no_markup() {
    for config in [NormalizerConfig::default(), fragment_config()] {
        let (events, _) = normalize_with(config, "");
        assert_eq!(events.expect("normalize"), vec![NormalizedEvent::EndOfDocument]);
    }
}

#[test]
fn nesting_past_the_limit_is_fatal() {
    let config = NormalizerConfig {
        max_nesting_depth: 3,
        ..fragment_config()
    };
    let (events, _) = normalize_with(config.clone(), "<div><div><div>x");
    events.expect("three levels fit");
    let (events, _) = normalize_with(config, "<div><div><div><div>x");
    assert!(matches!(
        events,
        Err(ConvertError::DocumentTooComplex { depth: 4, limit: 3 })
    ));
}

#[test]
fn void_elements_do_not_count_towards_depth() {
    let config = NormalizerConfig {
        max_nesting_depth: 1,
        ..fragment_config()
    };
    let (events, _) = normalize_with(config, "<p>a<br><img src=a.png>b</p>");
    assert_eq!(
        render(&events.expect("normalize")),
        "<div><p>a<br><img src=\"a.png\">b</p></div>$"
    );
}

#[test]
fn header_and_footer_are_injected_inside_the_wrapper() {
    let config = NormalizerConfig {
        header: Some(Injection::html("<b>head<script>x</script>")),
        footer: Some(Injection::text("foot")),
        ..fragment_config()
    };
    let (events, _) = normalize_with(config, "<i>x");
    assert_eq!(
        render(&events.expect("normalize")),
        "<div><b>head</b><i>x</i>foot</div>$"
    );
}

#[test]
fn finish_is_idempotent() {
    let mut ctx = DocumentParseContext::new();
    let mut normalizer = Normalizer::new(fragment_config(), &mut ctx);
    let mut events = Vec::new();
    normalizer.finish(&mut ctx, &mut events).expect("finish");
    normalizer.finish(&mut ctx, &mut events).expect("finish again");
    assert_eq!(events, vec![NormalizedEvent::EndOfDocument]);
    assert!(normalizer.is_finished());
    normalizer.reset();
    assert!(!normalizer.is_finished());
}

#[test]
fn output_is_stable_under_renormalization() {
    let inputs = [
        "<b><i>x</b>y</i>",
        "<p>a<div>b<ul><li>c<li>d</ul></div>",
        "<table><tr><td><b>x</td><td>y</table>",
        "<font color=red><p>a</font>b",
    ];
    for input in inputs {
        let once = fragment(input);
        let inner = once
            .strip_prefix("<div>")
            .and_then(|rest| rest.strip_suffix("</div>$"))
            .expect("wrapped");
        assert_eq!(fragment(inner), once, "input {input:?}");
    }
}
