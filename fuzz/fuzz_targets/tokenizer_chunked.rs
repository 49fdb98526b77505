#![no_main]

use html::shared::{DocumentParseContext, Input, Token};
use html::{HtmlTokenizer, TokenFmt, TokenizerConfig};
use libfuzzer_sys::fuzz_target;

fn collect(
    tokenizer: &mut HtmlTokenizer,
    input: &mut Input,
    ctx: &DocumentParseContext,
    out: &mut Vec<String>,
) {
    let batch = tokenizer.next_batch(input);
    let resolver = batch.resolver();
    let fmt = TokenFmt::new(&ctx.atoms, &resolver);
    for token in batch.iter() {
        // Text runs may split at chunk boundaries; compare their content only.
        let line = match token {
            Token::Text { text } => format!("TEXT {}", fmt.text(text).unwrap_or_default()),
            other => fmt.format_token(other).unwrap_or_default(),
        };
        out.push(line);
    }
}

fn tokenize(chunks: &[&str]) -> Vec<String> {
    let mut ctx = DocumentParseContext::new();
    let mut tokenizer = HtmlTokenizer::new(TokenizerConfig::default(), &mut ctx);
    let mut input = Input::new();
    let mut out = Vec::new();
    for chunk in chunks {
        tokenizer.push_str(&mut input, chunk, &mut ctx);
        collect(&mut tokenizer, &mut input, &ctx, &mut out);
    }
    tokenizer.finish(&input, &mut ctx);
    collect(&mut tokenizer, &mut input, &ctx, &mut out);
    out
}

/// Merge adjacent text tokens so chunk-dependent text splits compare equal.
fn coalesce(tokens: Vec<String>) -> Vec<String> {
    let mut merged: Vec<String> = Vec::with_capacity(tokens.len());
    for token in tokens {
        if let (Some(last), Some(rest)) = (merged.last_mut(), token.strip_prefix("TEXT ")) {
            if last.starts_with("TEXT ") {
                last.push_str(rest);
                continue;
            }
        }
        merged.push(token);
    }
    merged
}

fuzz_target!(|data: &[u8]| {
    let Some((&step, rest)) = data.split_first() else {
        return;
    };
    let text = String::from_utf8_lossy(rest);
    let step = usize::from(step % 17) + 1;

    let mut chunks = Vec::new();
    let mut start = 0;
    while start < text.len() {
        let mut end = (start + step).min(text.len());
        while !text.is_char_boundary(end) {
            end += 1;
        }
        chunks.push(&text[start..end]);
        start = end;
    }

    let whole = coalesce(tokenize(&[&text]));
    let chunked = coalesce(tokenize(&chunks));
    assert_eq!(whole, chunked);
});
