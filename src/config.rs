//! `scrub.toml`: conversion settings that command-line flags override.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use html::{Converter, InputFormat, Injection, OutputFormat, SafeList};
use serde::Deserialize;

#[derive(Clone, Copy, Debug, Deserialize, PartialEq, Eq, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Format {
    Html,
    Text,
}

impl Format {
    pub fn input(self) -> InputFormat {
        match self {
            Format::Html => InputFormat::Html,
            Format::Text => InputFormat::Text,
        }
    }

    pub fn output(self) -> OutputFormat {
        match self {
            Format::Html => OutputFormat::Html,
            Format::Text => OutputFormat::Text,
        }
    }
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    pub from: Option<Format>,
    pub to: Option<Format>,
    pub fragment: Option<bool>,
    pub filter: Option<bool>,
    /// Wrap width for text output; 0 disables wrapping.
    pub wrap: Option<usize>,
    pub preserve_space: Option<bool>,
    pub input_encoding: Option<String>,
    pub output_encoding: Option<String>,
    pub detect_bom: Option<bool>,
    pub detect_meta: Option<bool>,
    pub buffer_size: Option<usize>,
    pub max_tag_size: Option<usize>,
    pub max_attributes_per_tag: Option<usize>,
    pub max_nesting_depth: Option<usize>,
    pub header: Option<InjectionConfig>,
    pub footer: Option<InjectionConfig>,
    pub safe_list: Option<SafeListConfig>,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct InjectionConfig {
    pub content: String,
    #[serde(default)]
    pub html: bool,
}

impl InjectionConfig {
    fn injection(&self) -> Injection {
        if self.html {
            Injection::html(self.content.clone())
        } else {
            Injection::text(self.content.clone())
        }
    }
}

/// Additions to the default safe-list, or a replacement when `replace` is
/// set.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SafeListConfig {
    pub replace: bool,
    pub tags: Vec<String>,
    /// Tag name to allowed attributes.
    pub attributes: BTreeMap<String, Vec<String>>,
    pub global_attributes: Vec<String>,
    pub drop_content: Vec<String>,
    pub url_schemes: Vec<String>,
}

impl SafeListConfig {
    pub fn build(&self) -> Result<SafeList> {
        let mut list = if self.replace {
            SafeList::empty()
        } else {
            SafeList::default()
        };
        for tag in &self.tags {
            list.allow_tag(tag)?;
        }
        for (tag, attributes) in &self.attributes {
            for attribute in attributes {
                list.allow_attribute(tag, attribute)?;
            }
        }
        for attribute in &self.global_attributes {
            list.allow_global_attribute(attribute)?;
        }
        for tag in &self.drop_content {
            list.drop_content_of(tag)?;
        }
        for scheme in &self.url_schemes {
            list.allow_url_scheme(scheme)?;
        }
        Ok(list)
    }
}

impl FileConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        Self::parse(&content).with_context(|| format!("invalid config {}", path.display()))
    }

    pub fn parse(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Apply every setting present in the file to `converter`.
    pub fn apply(&self, converter: &mut Converter) -> Result<()> {
        if let Some(from) = self.from {
            converter.set_input_format(from.input())?;
        }
        if let Some(to) = self.to {
            converter.set_output_format(to.output())?;
        }
        if let Some(fragment) = self.fragment {
            converter.set_fragment(fragment)?;
        }
        if let Some(filter) = self.filter {
            converter.set_filter_html(filter)?;
        }
        if let Some(wrap) = self.wrap {
            converter.set_wrap((wrap > 0).then_some(wrap))?;
        }
        if let Some(preserve) = self.preserve_space {
            converter.set_preserve_space(preserve)?;
        }
        if let Some(label) = &self.input_encoding {
            converter.set_input_encoding(Some(charset::lookup(label)?))?;
        }
        if let Some(label) = &self.output_encoding {
            converter.set_output_encoding(charset::lookup(label)?)?;
        }
        if let Some(detect) = self.detect_bom {
            converter.set_detect_encoding_from_bom(detect)?;
        }
        if let Some(detect) = self.detect_meta {
            converter.set_detect_encoding_from_meta(detect)?;
        }
        if let Some(size) = self.buffer_size {
            converter.set_buffer_size(size)?;
        }
        if let Some(size) = self.max_tag_size {
            converter.set_max_tag_size(size)?;
        }
        if let Some(count) = self.max_attributes_per_tag {
            converter.set_max_attributes_per_tag(count)?;
        }
        if let Some(depth) = self.max_nesting_depth {
            converter.set_max_nesting_depth(depth)?;
        }
        if let Some(header) = &self.header {
            converter.set_header(Some(header.injection()))?;
        }
        if let Some(footer) = &self.footer {
            converter.set_footer(Some(footer.injection()))?;
        }
        if let Some(safe_list) = &self.safe_list {
            converter.set_safe_list(safe_list.build()?)?;
        }
        Ok(())
    }
}
