use super::{HtmlTokenizer, TextTokenizer, TokenBatch, TokenFmt, TokenizeResult, TokenizerConfig};
use crate::shared::{DocumentParseContext, Input, ParseErrorCode};

fn drain_all_fmt(batch: TokenBatch<'_>, ctx: &DocumentParseContext, out: &mut Vec<String>) {
    let resolver = batch.resolver();
    let fmt = TokenFmt::new(&ctx.atoms, &resolver);
    for token in batch.iter() {
        out.push(
            fmt.format_token(token)
                .expect("token formatting in tests must be deterministic"),
        );
    }
}

fn assert_push_ok(res: TokenizeResult) {
    assert!(
        matches!(
            res,
            TokenizeResult::NeedMoreInput | TokenizeResult::Progress
        ),
        "unexpected push_input result: {res:?}"
    );
}

fn run_with(config: TokenizerConfig, chunks: &[&str]) -> (Vec<String>, DocumentParseContext) {
    let mut ctx = DocumentParseContext::new();
    let mut tokenizer = HtmlTokenizer::new(config, &mut ctx);
    let mut input = Input::new();
    let mut out = Vec::new();
    for chunk in chunks {
        assert_push_ok(tokenizer.push_str(&mut input, chunk, &mut ctx));
        drain_all_fmt(tokenizer.next_batch(&mut input), &ctx, &mut out);
    }
    assert_eq!(tokenizer.finish(&input, &mut ctx), TokenizeResult::EmittedEof);
    drain_all_fmt(tokenizer.next_batch(&mut input), &ctx, &mut out);
    (out, ctx)
}

fn run(chunks: &[&str]) -> Vec<String> {
    run_with(TokenizerConfig::default(), chunks).0
}

fn char_chunks(text: &str, size: usize) -> Vec<&str> {
    let mut chunks = Vec::new();
    let mut start = 0;
    let mut count = 0;
    for (idx, _) in text.char_indices() {
        if count == size {
            chunks.push(&text[start..idx]);
            start = idx;
            count = 0;
        }
        count += 1;
    }
    chunks.push(&text[start..]);
    chunks
}

const MIXED: &str = "<!DOCTYPE html><P title='x &amp; y' hidden>a&lt;b &copy 2024 caf&eacute;</p>\
<!-- note -- here --><script>if (a</b) { x = \"</scr\"; }</script ><br/><?pi x?>\
<textarea>&lt;keep&gt;</textarea><a href=\"/q?a=1&copy=2\">t</a>";

#[test]
fn basic_tag_states_emit_expected_tokens() {
    assert_eq!(
        run(&["<div class=\"a\">Hello</div>"]),
        vec!["START div class=\"a\"", "TEXT \"Hello\"", "END div", "EOF"]
    );
}

#[test]
fn tag_and_attribute_names_are_ascii_folded() {
    assert_eq!(
        run(&["<DIV ID=Main>x</Div>"]),
        vec!["START div id=\"Main\"", "TEXT \"x\"", "END div", "EOF"]
    );
}

#[test]
fn every_two_chunk_split_matches_single_chunk() {
    let whole = run(&[MIXED]);
    for (idx, _) in MIXED.char_indices().skip(1) {
        let (a, b) = MIXED.split_at(idx);
        assert_eq!(run(&[a, b]), whole, "split at byte {idx}");
    }
}

#[test]
fn single_char_chunks_match_single_chunk() {
    let whole = run(&[MIXED]);
    for size in [1, 2, 3, 7] {
        assert_eq!(run(&char_chunks(MIXED, size)), whole, "chunk size {size}");
    }
}

#[test]
fn mixed_document_tokens() {
    assert_eq!(
        run(&[MIXED]),
        vec![
            "DOCTYPE html",
            "START p title=\"x & y\" hidden",
            "TEXT \"a<b \u{a9} 2024 caf\u{e9}\"",
            "END p",
            "COMMENT \" note -- here \"",
            "START script",
            "TEXT \"if (a</b) { x = \\\"</scr\\\"; }\"",
            "END script",
            "START br /",
            "COMMENT \"?pi x?\"",
            "START textarea",
            "TEXT \"<keep>\"",
            "END textarea",
            "START a href=\"/q?a=1&copy=2\"",
            "TEXT \"t\"",
            "END a",
            "EOF",
        ]
    );
}

#[test]
fn lonely_lt_is_text_and_merges_with_neighbours() {
    assert_eq!(run(&["a < b"]), vec!["TEXT \"a < b\"", "EOF"]);
    assert_eq!(run(&["a <", " b"]), vec!["TEXT \"a < b\"", "EOF"]);
    assert_eq!(run(&["x<"]), vec!["TEXT \"x<\"", "EOF"]);
    assert_eq!(run(&["x</"]), vec!["TEXT \"x</\"", "EOF"]);
}

#[test]
fn empty_end_tag_is_dropped_and_odd_end_tags_become_comments() {
    assert_eq!(run(&["a</>b"]), vec!["TEXT \"ab\"", "EOF"]);
    assert_eq!(run(&["</ x>"]), vec!["COMMENT \" x\"", "EOF"]);
}

#[test]
fn raw_text_ends_only_at_matching_end_tag() {
    assert_eq!(
        run(&["<STYLE>p{}</b></Style>z"]),
        vec![
            "START style",
            "TEXT \"p{}</b>\"",
            "END style",
            "TEXT \"z\"",
            "EOF"
        ]
    );
    assert_eq!(
        run(&["<script>a &amp; b</scriptx></script>"]),
        vec![
            "START script",
            "TEXT \"a &amp; b</scriptx>\"",
            "END script",
            "EOF"
        ]
    );
}

#[test]
fn raw_text_end_tag_split_across_chunks() {
    let whole = run(&["<xmp><b></xmp>"]);
    assert_eq!(whole, vec!["START xmp", "TEXT \"<b>\"", "END xmp", "EOF"]);
    assert_eq!(run(&["<xmp><b></x", "mp>"]), whole);
    assert_eq!(run(&["<xmp><b></xmp", ">"]), whole);
}

#[test]
fn plaintext_swallows_the_rest() {
    assert_eq!(
        run(&["<plaintext><b>&amp;"]),
        vec!["START plaintext", "TEXT \"<b>&amp;\"", "EOF"]
    );
}

#[test]
fn duplicate_attributes_keep_first_position_and_last_value() {
    let (tokens, ctx) = run_with(TokenizerConfig::default(), &["<p x=1 y=2 X=3>"]);
    assert_eq!(tokens, vec!["START p x=\"3\" y=\"2\"", "EOF"]);
    assert!(
        ctx.errors
            .iter()
            .any(|e| e.code == ParseErrorCode::DuplicateAttribute)
    );
}

#[test]
fn attributes_beyond_the_cap_are_dropped() {
    let config = TokenizerConfig {
        max_attributes_per_tag: 2,
        ..TokenizerConfig::default()
    };
    let (tokens, ctx) = run_with(config, &["<p a=1 b=2 c=3 a=4>"]);
    assert_eq!(tokens, vec!["START p a=\"4\" b=\"2\"", "EOF"]);
    assert_eq!(ctx.counters.attributes_dropped, 1);
}

#[test]
fn attribute_value_forms() {
    assert_eq!(
        run(&["<input disabled value=\"a&amp;b\" x= y='q\"r' z=>"]),
        vec!["START input disabled value=\"a&b\" x=\"y='q\\\"r'\" z=\"\" /", "EOF"]
    );
    assert_eq!(
        run(&["<a b=\"1\"c=2>"]),
        vec!["START a b=\"1\" c=\"2\"", "EOF"]
    );
}

#[test]
fn tag_at_size_limit_is_markup_and_longer_is_text() {
    let config = TokenizerConfig {
        max_tag_size: 3,
        ..TokenizerConfig::default()
    };
    let (tokens, _) = run_with(config.clone(), &["<b>"]);
    assert_eq!(tokens, vec!["START b", "EOF"]);

    let (tokens, ctx) = run_with(config, &["<br>x"]);
    assert_eq!(tokens, vec!["TEXT \"<br>x\"", "EOF"]);
    assert_eq!(ctx.counters.tags_too_long, 1);
}

#[test]
fn oversized_tag_resumes_as_text_deterministically() {
    let config = TokenizerConfig {
        max_tag_size: 10,
        ..TokenizerConfig::default()
    };
    let doc = "<a href=\"0123456789\">x</a>";
    let (whole, ctx) = run_with(config.clone(), &[doc]);
    assert_eq!(
        whole,
        vec!["TEXT \"<a href=\\\"0123456789\\\">x\"", "END a", "EOF"]
    );
    assert!(
        ctx.errors
            .iter()
            .any(|e| e.code == ParseErrorCode::TagTooLong)
    );
    for size in 1..6 {
        let (chunked, _) = run_with(config.clone(), &char_chunks(doc, size));
        assert_eq!(chunked, whole, "chunk size {size}");
    }
}

#[test]
fn long_comments_are_truncated() {
    let config = TokenizerConfig {
        max_tag_size: 8,
        ..TokenizerConfig::default()
    };
    let doc = "<!--0123456789abc-->x";
    let (whole, _) = run_with(config.clone(), &[doc]);
    assert_eq!(whole, vec!["COMMENT \"01234567\"", "TEXT \"x\"", "EOF"]);
    let (chunked, _) = run_with(config, &char_chunks(doc, 2));
    assert_eq!(chunked, whole);
}

#[test]
fn comment_forms() {
    assert_eq!(
        run(&["<!---->a<!--->b<!-->c<!--x--!>d"]),
        vec![
            "COMMENT \"\"",
            "TEXT \"a\"",
            "COMMENT \"\"",
            "TEXT \"b\"",
            "COMMENT \"\"",
            "TEXT \"c\"",
            "COMMENT \"x\"",
            "TEXT \"d\"",
            "EOF"
        ]
    );
    assert_eq!(
        run(&["<![CDATA[x]]>"]),
        vec!["COMMENT \"[CDATA[x]]\"", "EOF"]
    );
}

#[test]
fn doctype_public_and_system_ids() {
    assert_eq!(
        run(&[
            "<!doctype HTML PUBLIC \"-//W3C//DTD HTML 4.01//EN\" 'http://www.w3.org/TR/html4/strict.dtd'>"
        ]),
        vec![
            "DOCTYPE html public=\"-//W3C//DTD HTML 4.01//EN\" system=\"http://www.w3.org/TR/html4/strict.dtd\"",
            "EOF"
        ]
    );
    assert_eq!(
        run(&["<!DOCTYPE html SYSTEM \"about:legacy-compat\">"]),
        vec!["DOCTYPE html system=\"about:legacy-compat\"", "EOF"]
    );
}

#[test]
fn unterminated_quote_closes_at_first_gt_at_eof() {
    assert_eq!(
        run(&["<a title=\"x>y"]),
        vec!["START a title=\"x\"", "TEXT \"y\"", "EOF"]
    );
    assert_eq!(
        run(&["<a title='x", ">y"]),
        vec!["START a title=\"x\"", "TEXT \"y\"", "EOF"]
    );
}

#[test]
fn unterminated_tag_at_eof_is_dropped() {
    let (tokens, ctx) = run_with(TokenizerConfig::default(), &["text<div class=a"]);
    assert_eq!(tokens, vec!["TEXT \"text\"", "EOF"]);
    assert!(
        ctx.errors
            .iter()
            .any(|e| e.code == ParseErrorCode::UnexpectedEof)
    );
}

#[test]
fn unterminated_comment_is_emitted_at_eof() {
    assert_eq!(run(&["<!-- open"]), vec!["COMMENT \" open\"", "EOF"]);
    assert_eq!(run(&["<!-"]), vec!["COMMENT \"-\"", "EOF"]);
}

#[test]
fn character_reference_split_across_chunks() {
    let whole = run(&["<p>caf&eacute;&#x41;</p>"]);
    assert_eq!(whole[1], "TEXT \"caf\u{e9}A\"");
    assert_eq!(run(&["<p>caf&ea", "cute;&#x", "41;</p>"]), whole);
}

#[test]
fn malformed_numeric_reference_is_recorded() {
    let (tokens, ctx) = run_with(TokenizerConfig::default(), &["&#65x"]);
    assert_eq!(tokens, vec!["TEXT \"Ax\"", "EOF"]);
    assert_eq!(
        ctx.errors.first().map(|e| e.code),
        Some(ParseErrorCode::InvalidCharacterReference)
    );
}

#[test]
fn text_runs_are_cut_at_fixed_offsets() {
    let config = TokenizerConfig {
        max_restart_offset: 8,
        ..TokenizerConfig::default()
    };
    let doc = "abcdefghijkl<b>";
    let (whole, _) = run_with(config.clone(), &[doc]);
    assert_eq!(
        whole,
        vec!["TEXT \"abcdefgh\"", "TEXT \"ijkl\"", "START b", "EOF"]
    );
    for size in 1..5 {
        let (chunked, _) = run_with(config.clone(), &char_chunks(doc, size));
        assert_eq!(chunked, whole, "chunk size {size}");
    }
}

#[test]
fn consumed_input_is_compacted() {
    let config = TokenizerConfig {
        max_restart_offset: 16,
        ..TokenizerConfig::default()
    };
    let doc = "<p class=x>hello world</p>".repeat(20);
    let (whole, _) = run_with(config.clone(), &[&doc]);

    let mut ctx = DocumentParseContext::new();
    let mut tokenizer = HtmlTokenizer::new(config, &mut ctx);
    let mut input = Input::new();
    let mut out = Vec::new();
    for chunk in char_chunks(&doc, 5) {
        assert_push_ok(tokenizer.push_str(&mut input, chunk, &mut ctx));
        drain_all_fmt(tokenizer.next_batch(&mut input), &ctx, &mut out);
    }
    tokenizer.finish(&input, &mut ctx);
    drain_all_fmt(tokenizer.next_batch(&mut input), &ctx, &mut out);

    assert_eq!(out, whole);
    assert!(tokenizer.stats().compactions > 0);
    assert!(input.base() > 0);
    assert!(input.buffered_len() < 64);
}

#[test]
fn finish_is_idempotent() {
    let mut ctx = DocumentParseContext::new();
    let mut tokenizer = HtmlTokenizer::new(TokenizerConfig::default(), &mut ctx);
    let mut input = Input::new();
    tokenizer.push_str(&mut input, "x", &mut ctx);
    assert_eq!(tokenizer.finish(&input, &mut ctx), TokenizeResult::EmittedEof);
    assert_eq!(tokenizer.finish(&input, &mut ctx), TokenizeResult::EmittedEof);
    let batch = tokenizer.next_batch(&mut input);
    assert_eq!(batch.tokens().len(), 2);
}

#[test]
#[should_panic(expected = "push_input called after finish()")]
fn push_input_after_finish_panics() {
    let mut ctx = DocumentParseContext::new();
    let mut tokenizer = HtmlTokenizer::new(TokenizerConfig::default(), &mut ctx);
    let mut input = Input::new();
    tokenizer.finish(&input, &mut ctx);
    tokenizer.push_str(&mut input, "x", &mut ctx);
}

#[test]
fn reset_allows_a_new_input() {
    let mut ctx = DocumentParseContext::new();
    let mut tokenizer = HtmlTokenizer::new(TokenizerConfig::default(), &mut ctx);
    let mut first = Input::new();
    tokenizer.push_str(&mut first, "<b>", &mut ctx);
    tokenizer.finish(&first, &mut ctx);
    tokenizer.reset();

    let mut second = Input::new();
    tokenizer.push_str(&mut second, "<i>", &mut ctx);
    tokenizer.finish(&second, &mut ctx);
    let mut out = Vec::new();
    drain_all_fmt(tokenizer.next_batch(&mut second), &ctx, &mut out);
    assert_eq!(out, vec!["START i", "EOF"]);
}

#[test]
fn text_tokenizer_treats_markup_as_text() {
    let mut ctx = DocumentParseContext::new();
    let config = TokenizerConfig {
        max_restart_offset: 4,
        ..TokenizerConfig::default()
    };
    let mut tokenizer = TextTokenizer::new(config);
    let mut input = Input::new();
    let mut out = Vec::new();
    for chunk in ["a<b", ">&amp;"] {
        tokenizer.push_str(&mut input, chunk, &mut ctx);
        drain_all_fmt(tokenizer.next_batch(&mut input), &ctx, &mut out);
    }
    tokenizer.finish(&input);
    drain_all_fmt(tokenizer.next_batch(&mut input), &ctx, &mut out);
    assert_eq!(
        out,
        vec!["TEXT \"a<b>\"", "TEXT \"&amp\"", "TEXT \";\"", "EOF"]
    );
}
