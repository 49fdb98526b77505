//! Tag and attribute allow-list.
//!
//! [`SafeList`] is plain configuration data. The normalizer compiles it
//! against the conversion's atom table into a [`CompiledSafeList`] so that
//! per-token checks are indexed lookups instead of string hashing.

use std::collections::{HashMap, HashSet};

use crate::error::ConvertError;
use crate::normalizer::url::{DEFAULT_URL_SCHEMES, URL_ATTRIBUTES};
use crate::shared::{AtomId, AtomTable};

const DEFAULT_TAGS: &[&str] = &[
    "a", "abbr", "acronym", "address", "area", "b", "bdo", "big", "blockquote", "br", "caption",
    "center", "cite", "code", "col", "colgroup", "dd", "del", "dfn", "dir", "div", "dl", "dt",
    "em", "font", "h1", "h2", "h3", "h4", "h5", "h6", "hr", "i", "img", "ins", "kbd", "li", "map",
    "menu", "nobr", "ol", "p", "pre", "q", "s", "samp", "small", "span", "strike", "strong", "sub",
    "sup", "table", "tbody", "td", "tfoot", "th", "thead", "tr", "tt", "u", "ul", "var", "wbr",
];

const DEFAULT_GLOBAL_ATTRIBUTES: &[&str] = &["align", "class", "dir", "id", "lang", "title"];

const DEFAULT_TAG_ATTRIBUTES: &[(&str, &[&str])] = &[
    ("a", &["href", "name", "rel"]),
    ("area", &["alt", "coords", "href", "shape"]),
    ("blockquote", &["cite"]),
    ("col", &["span", "width"]),
    ("colgroup", &["span", "width"]),
    ("del", &["cite", "datetime"]),
    ("font", &["color", "face", "size"]),
    ("hr", &["noshade", "size", "width"]),
    (
        "img",
        &["alt", "border", "height", "hspace", "src", "usemap", "vspace", "width"],
    ),
    ("ins", &["cite", "datetime"]),
    ("li", &["type", "value"]),
    ("map", &["name"]),
    ("ol", &["start", "type"]),
    ("pre", &["width"]),
    ("q", &["cite"]),
    (
        "table",
        &["bgcolor", "border", "cellpadding", "cellspacing", "summary", "width"],
    ),
    (
        "td",
        &["bgcolor", "colspan", "height", "nowrap", "rowspan", "valign", "width"],
    ),
    (
        "th",
        &["bgcolor", "colspan", "height", "nowrap", "rowspan", "valign", "width"],
    ),
    ("tr", &["bgcolor", "valign"]),
    ("ul", &["type"]),
];

const DEFAULT_DROP_CONTENT: &[&str] = &[
    "applet", "base", "embed", "form", "frame", "frameset", "head", "iframe", "link", "math",
    "meta", "noembed", "noframes", "noscript", "object", "script", "select", "style", "svg",
    "template", "textarea", "title", "xml",
];

/// Allow-list of tags and attributes.
///
/// Everything not listed is removed. Elements listed under
/// [`SafeList::drop_content_of`] lose their whole subtree unless they are
/// also allowed; other removed elements keep their content.
#[derive(Clone, Debug)]
pub struct SafeList {
    tags: HashMap<Box<str>, HashSet<Box<str>>>,
    global_attributes: HashSet<Box<str>>,
    drop_content: HashSet<Box<str>>,
    url_attributes: HashSet<Box<str>>,
    url_schemes: Vec<Box<str>>,
}

impl SafeList {
    /// A list that allows nothing; content-dropping and URL rules still
    /// apply.
    pub fn empty() -> Self {
        Self {
            tags: HashMap::new(),
            global_attributes: HashSet::new(),
            drop_content: DEFAULT_DROP_CONTENT.iter().map(|t| Box::from(*t)).collect(),
            url_attributes: URL_ATTRIBUTES.iter().map(|a| Box::from(*a)).collect(),
            url_schemes: DEFAULT_URL_SCHEMES.iter().map(|s| Box::from(*s)).collect(),
        }
    }

    pub fn allow_tag(&mut self, tag: &str) -> Result<&mut Self, ConvertError> {
        let tag = checked_name(tag, "tag")?;
        self.tags.entry(tag).or_default();
        Ok(self)
    }

    /// Allow `attribute` on `tag`, allowing the tag as well.
    pub fn allow_attribute(&mut self, tag: &str, attribute: &str) -> Result<&mut Self, ConvertError> {
        let tag = checked_name(tag, "tag")?;
        let attribute = checked_attribute(attribute)?;
        self.tags.entry(tag).or_default().insert(attribute);
        Ok(self)
    }

    /// Allow `attribute` on every allowed tag.
    pub fn allow_global_attribute(&mut self, attribute: &str) -> Result<&mut Self, ConvertError> {
        let attribute = checked_attribute(attribute)?;
        self.global_attributes.insert(attribute);
        Ok(self)
    }

    pub fn drop_content_of(&mut self, tag: &str) -> Result<&mut Self, ConvertError> {
        let tag = checked_name(tag, "tag")?;
        self.drop_content.insert(tag);
        Ok(self)
    }

    pub fn allow_url_scheme(&mut self, scheme: &str) -> Result<&mut Self, ConvertError> {
        let scheme = checked_name(scheme, "URL scheme")?;
        if !self.url_schemes.contains(&scheme) {
            self.url_schemes.push(scheme);
        }
        Ok(self)
    }

    pub fn is_tag_allowed(&self, tag: &str) -> bool {
        self.tags.contains_key(tag.to_ascii_lowercase().as_str())
    }

    pub fn is_attribute_allowed(&self, tag: &str, attribute: &str) -> bool {
        let tag = tag.to_ascii_lowercase();
        let attribute = attribute.to_ascii_lowercase();
        self.tags.get(tag.as_str()).is_some_and(|attrs| {
            attrs.contains(attribute.as_str()) || self.global_attributes.contains(attribute.as_str())
        })
    }

    pub fn drops_content_of(&self, tag: &str) -> bool {
        let tag = tag.to_ascii_lowercase();
        !self.tags.contains_key(tag.as_str()) && self.drop_content.contains(tag.as_str())
    }

    pub fn url_schemes(&self) -> &[Box<str>] {
        &self.url_schemes
    }

    /// Resolve every name against `atoms`.
    pub(crate) fn compile(&self, atoms: &mut AtomTable) -> CompiledSafeList {
        let mut compiled = CompiledSafeList {
            atoms_id: atoms.id(),
            tags: Vec::new(),
            attributes: Vec::new(),
            tag_attributes: Vec::new(),
            url_schemes: self.url_schemes.clone(),
        };
        for tag in &self.drop_content {
            if let Ok(id) = atoms.intern_ascii_folded(tag) {
                compiled.set_tag(id, TagPolicy::DropContent);
            }
        }
        for (tag, attrs) in &self.tags {
            let Ok(tag_id) = atoms.intern_ascii_folded(tag) else {
                continue;
            };
            compiled.set_tag(tag_id, TagPolicy::Allow);
            for attr in attrs {
                if let Ok(attr_id) = atoms.intern_ascii_folded(attr) {
                    compiled.tag_attributes.push((tag_id, attr_id));
                }
            }
        }
        compiled.tag_attributes.sort_unstable();
        for attr in &self.global_attributes {
            if let Ok(id) = atoms.intern_ascii_folded(attr) {
                compiled.add_attribute_flag(id, CompiledSafeList::GLOBAL);
            }
        }
        for attr in &self.url_attributes {
            if let Ok(id) = atoms.intern_ascii_folded(attr) {
                compiled.add_attribute_flag(id, CompiledSafeList::URL);
            }
        }
        compiled
    }
}

impl Default for SafeList {
    fn default() -> Self {
        let mut list = Self::empty();
        for tag in DEFAULT_TAGS {
            list.tags.entry(Box::from(*tag)).or_default();
        }
        for (tag, attrs) in DEFAULT_TAG_ATTRIBUTES {
            let entry = list.tags.entry(Box::from(*tag)).or_default();
            entry.extend(attrs.iter().map(|a| Box::from(*a)));
        }
        list.global_attributes = DEFAULT_GLOBAL_ATTRIBUTES.iter().map(|a| Box::from(*a)).collect();
        list
    }
}

fn checked_name(name: &str, what: &str) -> Result<Box<str>, ConvertError> {
    let name = name.trim();
    let valid = !name.is_empty()
        && name
            .chars()
            .all(|ch| !ch.is_whitespace() && !matches!(ch, '<' | '>' | '/' | '=' | '"' | '\''));
    if !valid {
        return Err(ConvertError::InvalidConfiguration(format!(
            "invalid {what} name `{name}`"
        )));
    }
    Ok(name.to_ascii_lowercase().into_boxed_str())
}

fn checked_attribute(attribute: &str) -> Result<Box<str>, ConvertError> {
    let attribute = checked_name(attribute, "attribute")?;
    if is_event_handler(&attribute) {
        return Err(ConvertError::InvalidConfiguration(format!(
            "event handler attribute `{attribute}` cannot be allowed"
        )));
    }
    Ok(attribute)
}

pub(crate) fn is_event_handler(attribute: &str) -> bool {
    attribute.len() > 2 && attribute.as_bytes()[..2].eq_ignore_ascii_case(b"on")
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub(crate) enum TagPolicy {
    /// Removed; content kept.
    #[default]
    Remove,
    Allow,
    /// Removed with its subtree.
    DropContent,
}

/// A [`SafeList`] resolved against one atom table.
#[derive(Clone, Debug)]
pub(crate) struct CompiledSafeList {
    atoms_id: u64,
    tags: Vec<TagPolicy>,
    attributes: Vec<u8>,
    tag_attributes: Vec<(AtomId, AtomId)>,
    url_schemes: Vec<Box<str>>,
}

impl CompiledSafeList {
    const GLOBAL: u8 = 1 << 0;
    const URL: u8 = 1 << 1;

    pub(crate) fn is_compiled_for(&self, atoms: &AtomTable) -> bool {
        self.atoms_id == atoms.id()
    }

    fn set_tag(&mut self, id: AtomId, policy: TagPolicy) {
        let index = id.0 as usize;
        if index >= self.tags.len() {
            self.tags.resize(index + 1, TagPolicy::Remove);
        }
        self.tags[index] = policy;
    }

    fn add_attribute_flag(&mut self, id: AtomId, flag: u8) {
        let index = id.0 as usize;
        if index >= self.attributes.len() {
            self.attributes.resize(index + 1, 0);
        }
        self.attributes[index] |= flag;
    }

    fn attribute_flags(&self, id: AtomId) -> u8 {
        self.attributes.get(id.0 as usize).copied().unwrap_or(0)
    }

    pub(crate) fn tag_policy(&self, tag: AtomId) -> TagPolicy {
        self.tags.get(tag.0 as usize).copied().unwrap_or_default()
    }

    pub(crate) fn is_attribute_allowed(&self, tag: AtomId, attribute: AtomId) -> bool {
        self.attribute_flags(attribute) & Self::GLOBAL != 0
            || self.tag_attributes.binary_search(&(tag, attribute)).is_ok()
    }

    pub(crate) fn is_url_attribute(&self, attribute: AtomId) -> bool {
        self.attribute_flags(attribute) & Self::URL != 0
    }

    pub(crate) fn url_schemes(&self) -> &[Box<str>] {
        &self.url_schemes
    }
}
