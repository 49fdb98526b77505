//! `scrub`: sanitize HTML or convert between HTML and plain text.

mod config;
mod dump;
mod logger;

use std::fs::File;
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{ArgAction, Parser};
use html::Converter;
use mimalloc::MiMalloc;

use crate::config::{FileConfig, Format};

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Cli {
    /// Treat the input as a fragment: no html/body structure in the output
    #[arg(long, action = ArgAction::SetTrue)]
    fragment: bool,

    /// Input format
    #[arg(long, value_enum)]
    from: Option<Format>,

    /// Output format
    #[arg(long, value_enum)]
    to: Option<Format>,

    /// Only re-balance the markup; keep tags and attributes outside the safe-list
    #[arg(long = "no-filter", action = ArgAction::SetTrue)]
    no_filter: bool,

    /// Wrap text output at N characters (0 disables wrapping)
    #[arg(long, value_name = "N")]
    wrap: Option<usize>,

    /// TOML configuration file; flags override its settings
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Declared input encoding (a BOM or meta declaration still wins)
    #[arg(long, value_name = "LABEL")]
    input_encoding: Option<String>,

    #[arg(long, value_name = "LABEL")]
    output_encoding: Option<String>,

    /// Print the tokenizer output, one token per line, instead of converting
    #[arg(long, action = ArgAction::SetTrue)]
    dump_tokens: bool,

    /// More diagnostics on stderr (-v, -vv, -vvv); SCRUB_LOG overrides
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,

    /// Output file (default: stdout)
    #[arg(short, long, value_name = "OUTPUT")]
    output: Option<PathBuf>,

    /// Input file (default or `-`: stdin)
    input: Option<PathBuf>,
}

impl Cli {
    fn apply(&self, converter: &mut Converter) -> Result<()> {
        if let Some(from) = self.from {
            converter.set_input_format(from.input())?;
        }
        if let Some(to) = self.to {
            converter.set_output_format(to.output())?;
        }
        if self.fragment {
            converter.set_fragment(true)?;
        }
        if self.no_filter {
            converter.set_filter_html(false)?;
        }
        if let Some(wrap) = self.wrap {
            converter.set_wrap((wrap > 0).then_some(wrap))?;
        }
        if let Some(label) = &self.input_encoding {
            let encoding = charset::lookup(label).context("--input-encoding")?;
            converter.set_input_encoding(Some(encoding))?;
        }
        if let Some(label) = &self.output_encoding {
            let encoding = charset::lookup(label).context("--output-encoding")?;
            converter.set_output_encoding(encoding)?;
        }
        Ok(())
    }
}

fn build_converter(cli: &Cli) -> Result<Converter> {
    let mut converter = Converter::new();
    if let Some(path) = &cli.config {
        FileConfig::load(path)?.apply(&mut converter)?;
    }
    cli.apply(&mut converter)?;
    Ok(converter)
}

fn open_input(path: Option<&Path>) -> Result<Box<dyn Read>> {
    match path {
        Some(path) if path != Path::new("-") => {
            let file = File::open(path)
                .with_context(|| format!("failed to open {}", path.display()))?;
            Ok(Box::new(BufReader::new(file)))
        }
        _ => Ok(Box::new(io::stdin().lock())),
    }
}

fn open_output(path: Option<&Path>) -> Result<Box<dyn Write>> {
    match path {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("failed to create {}", path.display()))?;
            Ok(Box::new(BufWriter::new(file)))
        }
        None => Ok(Box::new(BufWriter::new(io::stdout().lock()))),
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    logger::init(cli.verbose);

    let converter = build_converter(&cli)?;
    let input = open_input(cli.input.as_deref())?;
    let mut output = open_output(cli.output.as_deref())?;

    if cli.dump_tokens {
        dump::dump_tokens(&converter, input, &mut output)?;
    } else {
        converter
            .convert(input, &mut output)
            .context("conversion failed")?;
        let counters = converter.counters();
        log::info!(
            target: "scrub",
            "{} chars in, {} chars out, {} elements and {} attributes filtered",
            counters.chars_in,
            counters.chars_out,
            counters.elements_filtered,
            counters.attributes_filtered
        );
        log::debug!(target: "scrub", "{counters:?}");
    }
    output.flush()?;
    Ok(())
}
