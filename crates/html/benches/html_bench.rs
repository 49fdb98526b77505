use std::io::Write;

use criterion::{BatchSize, Criterion, black_box, criterion_group, criterion_main};
use html::shared::{DocumentParseContext, Input};
use html::{Converter, HtmlTokenizer, OutputFormat, TokenizerConfig, sanitize_fragment};

const SMALL_BLOCKS: usize = 64;
const LARGE_BLOCKS: usize = 20_000;

const BLOCK_TEMPLATE: &str = "<div class=box onclick=\"go()\"><span>hello &amp; caf\u{e9}</span>\
<img src=x.png alt=pic><script>var a = 1 < 2;</script><a href=\"javascript:x\">l</a></div>\n";

fn make_blocks(blocks: usize) -> String {
    let mut html = String::with_capacity(BLOCK_TEMPLATE.len() * blocks);
    for _ in 0..blocks {
        html.push_str(BLOCK_TEMPLATE);
    }
    html
}

fn make_rawtext_adversarial(bytes: usize) -> String {
    let mut body = String::with_capacity(bytes + 32);
    body.push_str("<script>");
    while body.len() < bytes {
        body.push_str("</scri");
        body.push('<');
        body.push_str("pt");
    }
    body.push_str("</script>");
    body
}

fn tokenize(input: &str) -> usize {
    let mut ctx = DocumentParseContext::new();
    let mut tokenizer = HtmlTokenizer::new(TokenizerConfig::default(), &mut ctx);
    let mut buffer = Input::new();
    let _ = tokenizer.push_str(&mut buffer, input, &mut ctx);
    tokenizer.finish(&buffer, &mut ctx);
    tokenizer.next_batch(&mut buffer).tokens().len()
}

fn bench_tokenize_small(c: &mut Criterion) {
    let input = make_blocks(SMALL_BLOCKS);
    c.bench_function("bench_tokenize_small", |b| {
        b.iter(|| black_box(tokenize(black_box(&input))));
    });
}

fn bench_tokenize_large(c: &mut Criterion) {
    let input = make_blocks(LARGE_BLOCKS);
    c.bench_function("bench_tokenize_large", |b| {
        b.iter(|| black_box(tokenize(black_box(&input))));
    });
}

fn bench_sanitize_large(c: &mut Criterion) {
    let input = make_blocks(LARGE_BLOCKS);
    c.bench_function("bench_sanitize_large", |b| {
        b.iter(|| {
            let out = sanitize_fragment(black_box(&input)).expect("sanitize");
            black_box(out.len());
        });
    });
}

fn bench_streaming_chunked(c: &mut Criterion) {
    let input = make_blocks(LARGE_BLOCKS);
    let bytes = input.as_bytes();
    let chunk_sizes = [1usize, 2, 3, 7, 64, 128, 256, 1024];
    c.bench_function("bench_streaming_chunked", |b| {
        b.iter_batched(
            || {
                let mut converter = Converter::new();
                converter.set_fragment(true).expect("configure");
                converter
            },
            |converter| {
                let mut writer = converter
                    .writer(Vec::with_capacity(bytes.len()))
                    .expect("writer");
                let mut offset = 0usize;
                let mut size_idx = 0usize;
                while offset < bytes.len() {
                    let size = chunk_sizes[size_idx % chunk_sizes.len()];
                    let end = (offset + size).min(bytes.len());
                    writer.write_all(&bytes[offset..end]).expect("write");
                    offset = end;
                    size_idx += 1;
                }
                let out = writer.into_inner().expect("finish");
                black_box(out.len());
            },
            BatchSize::LargeInput,
        );
    });
}

fn bench_render_text_large(c: &mut Criterion) {
    let input = make_blocks(LARGE_BLOCKS);
    let mut converter = Converter::new();
    converter
        .set_output_format(OutputFormat::Text)
        .expect("configure");
    c.bench_function("bench_render_text_large", |b| {
        b.iter(|| {
            let out = converter.convert_str(black_box(&input)).expect("render");
            black_box(out.len());
        });
    });
}

fn bench_tokenize_rawtext_adversarial(c: &mut Criterion) {
    let input = make_rawtext_adversarial(512 * 1024);
    c.bench_function("bench_tokenize_rawtext_adversarial", |b| {
        b.iter(|| black_box(tokenize(black_box(&input))));
    });
}

criterion_group!(
    benches,
    bench_tokenize_small,
    bench_tokenize_large,
    bench_sanitize_large,
    bench_streaming_chunked,
    bench_render_text_large,
    bench_tokenize_rawtext_adversarial
);
criterion_main!(benches);
