//! `--dump-tokens`: one tokenizer token per line.

use std::io::{Read, Write};

use anyhow::{Result, bail};
use html::chain::{ByteSource, CharSource, SourceRead};
use html::shared::{DocumentParseContext, Input};
use html::tokenizer::TokenBatch;
use html::{Converter, HtmlTokenizer, InputFormat, TokenFmt};

fn write_batch<W: Write>(
    batch: TokenBatch<'_>,
    ctx: &DocumentParseContext,
    out: &mut W,
) -> Result<()> {
    let resolver = batch.resolver();
    let fmt = TokenFmt::new(&ctx.atoms, &resolver);
    for token in batch.iter() {
        writeln!(out, "{}", fmt.format_token(token)?)?;
    }
    Ok(())
}

pub fn dump_tokens<R: Read, W: Write>(converter: &Converter, input: R, out: &mut W) -> Result<()> {
    let config = converter.config();
    if config.input_format != InputFormat::Html {
        bail!("--dump-tokens needs HTML input");
    }
    let mut source = ByteSource::new(input, config.decoder_config())?;
    let mut ctx = DocumentParseContext::new();
    let mut tokenizer = HtmlTokenizer::new(config.tokenizer.clone(), &mut ctx);
    let mut buffer = Input::new();
    let mut chunk = String::new();
    loop {
        chunk.clear();
        match source.read_chars(&mut chunk, config.chain.buffer_size)? {
            SourceRead::Data(_) => {
                tokenizer.push_str(&mut buffer, &chunk, &mut ctx);
            }
            SourceRead::Pending => continue,
            SourceRead::Eof => break,
        }
        write_batch(tokenizer.next_batch(&mut buffer), &ctx, out)?;
    }
    tokenizer.finish(&buffer, &mut ctx);
    write_batch(tokenizer.next_batch(&mut buffer), &ctx, out)?;
    log::info!(
        target: "scrub",
        "{} parse errors, {} tags too long",
        ctx.counters.parse_errors,
        ctx.counters.tags_too_long
    );
    Ok(())
}
