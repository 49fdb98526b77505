//! Element classification and presentational properties.
//!
//! Classification drives implied end tags, scope boundaries and formatting
//! reopen; it is computed once per tag atom and cached by the normalizer.

use std::rc::Rc;

use crate::normalizer::stack::OwnedAttribute;
use crate::props::{PropertyFlag, PropertyId, PropertySet, PropertyType, PropertyValue};
use crate::shared::{AtomId, AtomTable};
use crate::tokenizer::is_html_void_tag;

/// Elements with implied-end-tag or scope behavior of their own.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum ElementKind {
    Other,
    /// `html`, `head`, `body`: absorbed into the synthetic structure.
    Document,
    Paragraph,
    /// `ol`, `ul`, `dl`.
    List,
    ListItem,
    /// `dd`, `dt`.
    DefinitionItem,
    Option,
    OptGroup,
    Table,
    /// `thead`, `tbody`, `tfoot`.
    TableSection,
    Row,
    /// `td`, `th`.
    Cell,
    Heading,
    Anchor,
    Button,
    NoBr,
    LineBreak,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct ElementInfo {
    pub(crate) kind: ElementKind,
    flags: u8,
}

impl ElementInfo {
    const VOID: u8 = 1 << 0;
    /// A start tag closes an open `p` in button scope.
    const CLOSES_P: u8 = 1 << 1;
    const FORMATTING: u8 = 1 << 2;
    /// Boundary of the baseline "in scope" search, and a formatting marker.
    const SCOPE: u8 = 1 << 3;
    /// Boundary of the table scope search.
    const TABLE_SCOPE: u8 = 1 << 4;

    pub(crate) fn classify(name: &str) -> Self {
        let kind = match name {
            "html" | "head" | "body" => ElementKind::Document,
            "p" => ElementKind::Paragraph,
            "ol" | "ul" | "dl" => ElementKind::List,
            "li" => ElementKind::ListItem,
            "dd" | "dt" => ElementKind::DefinitionItem,
            "option" => ElementKind::Option,
            "optgroup" => ElementKind::OptGroup,
            "table" => ElementKind::Table,
            "thead" | "tbody" | "tfoot" => ElementKind::TableSection,
            "tr" => ElementKind::Row,
            "td" | "th" => ElementKind::Cell,
            "h1" | "h2" | "h3" | "h4" | "h5" | "h6" => ElementKind::Heading,
            "a" => ElementKind::Anchor,
            "button" => ElementKind::Button,
            "nobr" => ElementKind::NoBr,
            "br" => ElementKind::LineBreak,
            _ => ElementKind::Other,
        };

        let mut flags = 0;
        if is_html_void_tag(name) {
            flags |= Self::VOID;
        }
        if closes_paragraph(name) {
            flags |= Self::CLOSES_P;
        }
        if is_formatting(name) {
            flags |= Self::FORMATTING;
        }
        if matches!(
            name,
            "applet" | "caption" | "html" | "table" | "td" | "th" | "marquee" | "object" | "template"
        ) {
            flags |= Self::SCOPE;
        }
        if matches!(name, "html" | "table" | "template") {
            flags |= Self::TABLE_SCOPE;
        }
        Self { kind, flags }
    }

    pub(crate) fn is_void(self) -> bool {
        self.flags & Self::VOID != 0
    }

    pub(crate) fn closes_paragraph(self) -> bool {
        self.flags & Self::CLOSES_P != 0
    }

    pub(crate) fn is_formatting(self) -> bool {
        self.flags & Self::FORMATTING != 0
    }

    pub(crate) fn is_scope(self) -> bool {
        self.flags & Self::SCOPE != 0
    }

    pub(crate) fn is_table_scope(self) -> bool {
        self.flags & Self::TABLE_SCOPE != 0
    }

    pub(crate) fn is_table_part(self) -> bool {
        matches!(
            self.kind,
            ElementKind::Table | ElementKind::TableSection | ElementKind::Row | ElementKind::Cell
        )
    }
}

fn closes_paragraph(name: &str) -> bool {
    matches!(
        name,
        "address"
            | "article"
            | "aside"
            | "blockquote"
            | "center"
            | "details"
            | "dialog"
            | "dir"
            | "div"
            | "dl"
            | "fieldset"
            | "figcaption"
            | "figure"
            | "footer"
            | "form"
            | "h1"
            | "h2"
            | "h3"
            | "h4"
            | "h5"
            | "h6"
            | "header"
            | "hgroup"
            | "hr"
            | "li"
            | "dd"
            | "dt"
            | "listing"
            | "main"
            | "menu"
            | "nav"
            | "ol"
            | "p"
            | "plaintext"
            | "pre"
            | "section"
            | "summary"
            | "table"
            | "ul"
            | "xmp"
    )
}

fn is_formatting(name: &str) -> bool {
    matches!(
        name,
        "a" | "b"
            | "big"
            | "blink"
            | "code"
            | "em"
            | "font"
            | "i"
            | "nobr"
            | "s"
            | "small"
            | "strike"
            | "strong"
            | "sub"
            | "sup"
            | "tt"
            | "u"
    )
}

/// Interned element name plus its classification.
#[derive(Clone, Debug)]
pub(crate) struct ElementEntry {
    pub(crate) name: Rc<str>,
    pub(crate) info: ElementInfo,
}

/// Per-atom cache of [`ElementEntry`] values.
#[derive(Debug, Default)]
pub(crate) struct ElementCache {
    entries: Vec<Option<ElementEntry>>,
}

impl ElementCache {
    pub(crate) fn get(&mut self, id: AtomId, atoms: &AtomTable) -> Option<&ElementEntry> {
        let index = id.0 as usize;
        if index >= self.entries.len() {
            self.entries.resize(index + 1, None);
        }
        if self.entries[index].is_none() {
            let name = atoms.resolve(id)?;
            self.entries[index] = Some(ElementEntry {
                name: Rc::from(name),
                info: ElementInfo::classify(name),
            });
        }
        self.entries[index].as_ref()
    }

    pub(crate) fn clear(&mut self) {
        self.entries.clear();
    }
}

/// Properties an element contributes on its own, from its name and its
/// (already filtered) attributes. Font faces are interned into `strings`.
pub(crate) fn element_properties(
    name: &str,
    attrs: &[OwnedAttribute],
    strings: &mut AtomTable,
) -> PropertySet {
    let mut props = PropertySet::new();
    let flag = match name {
        "b" | "strong" => Some(PropertyFlag::Bold),
        "i" | "em" | "cite" | "var" | "dfn" | "address" => Some(PropertyFlag::Italic),
        "u" | "ins" => Some(PropertyFlag::Underline),
        "s" | "strike" | "del" => Some(PropertyFlag::Strikethrough),
        "sub" => Some(PropertyFlag::Subscript),
        "sup" => Some(PropertyFlag::Superscript),
        "tt" | "code" | "kbd" | "samp" => Some(PropertyFlag::Fixed),
        "small" => Some(PropertyFlag::Small),
        "big" => Some(PropertyFlag::Big),
        "nobr" => Some(PropertyFlag::NoWrap),
        "pre" | "listing" | "xmp" | "plaintext" => Some(PropertyFlag::Preformatted),
        "blink" => Some(PropertyFlag::Blink),
        _ => None,
    };
    if let Some(flag) = flag {
        props.flags.set(flag, true);
    }

    for (attr, value) in attrs {
        let Some(value) = value.as_deref().map(str::trim) else {
            if attr.as_ref() == "nowrap" {
                props.flags.set(PropertyFlag::NoWrap, true);
            }
            continue;
        };
        let parsed = match (name, attr.as_ref()) {
            ("font", "color") => parse_color(value).map(|c| (PropertyId::FontColor, c)),
            ("font", "size") => parse_font_size(value).map(|v| (PropertyId::FontSize, v)),
            ("font", "face") if !value.is_empty() => strings
                .intern_ascii_folded(value)
                .ok()
                .map(|id| (PropertyId::FontFace, PropertyValue::string_handle(id.0))),
            (_, "bgcolor") => parse_color(value).map(|c| (PropertyId::BackgroundColor, c)),
            (_, "align") => parse_alignment(value).map(|v| (PropertyId::TextAlignment, v)),
            (_, "dir") => parse_direction(value).map(|v| (PropertyId::Direction, v)),
            (_, "width") => parse_length(value).map(|v| (PropertyId::Width, v)),
            (_, "height") => parse_length(value).map(|v| (PropertyId::Height, v)),
            (_, "border") => parse_length(value).map(|v| (PropertyId::BorderWidth, v)),
            (_, "cellpadding") => parse_length(value).map(|v| (PropertyId::CellPadding, v)),
            (_, "cellspacing") => parse_length(value).map(|v| (PropertyId::CellSpacing, v)),
            _ => None,
        };
        if let Some((id, value)) = parsed {
            props.set(id, value);
        }
    }
    props
}

const NAMED_COLORS: &[(&str, u32)] = &[
    ("black", 0x000000),
    ("silver", 0xC0C0C0),
    ("gray", 0x808080),
    ("grey", 0x808080),
    ("white", 0xFFFFFF),
    ("maroon", 0x800000),
    ("red", 0xFF0000),
    ("purple", 0x800080),
    ("fuchsia", 0xFF00FF),
    ("green", 0x008000),
    ("lime", 0x00FF00),
    ("olive", 0x808000),
    ("yellow", 0xFFFF00),
    ("navy", 0x000080),
    ("blue", 0x0000FF),
    ("teal", 0x008080),
    ("aqua", 0x00FFFF),
];

pub(crate) fn parse_color(value: &str) -> Option<PropertyValue> {
    if let Some(&(_, rgb)) = NAMED_COLORS
        .iter()
        .find(|(color, _)| color.eq_ignore_ascii_case(value))
    {
        return Some(PropertyValue::color(rgb));
    }
    let hex = value.strip_prefix('#').unwrap_or(value);
    if !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
        return None;
    }
    let rgb = match hex.len() {
        6 => u32::from_str_radix(hex, 16).ok()?,
        3 => {
            let short = u32::from_str_radix(hex, 16).ok()?;
            let (r, g, b) = ((short >> 8) & 0xF, (short >> 4) & 0xF, short & 0xF);
            (r * 0x11) << 16 | (g * 0x11) << 8 | (b * 0x11)
        }
        _ => return None,
    };
    Some(PropertyValue::color(rgb))
}

fn parse_font_size(value: &str) -> Option<PropertyValue> {
    let relative = value.starts_with(['+', '-']);
    let number: i64 = value.parse().ok()?;
    if relative {
        PropertyValue::checked(PropertyType::RelHtmlFontUnits, number)
    } else {
        PropertyValue::checked(PropertyType::HtmlFontUnits, number)
    }
}

fn parse_alignment(value: &str) -> Option<PropertyValue> {
    ["left", "center", "right", "justify"]
        .iter()
        .position(|a| a.eq_ignore_ascii_case(value))
        .map(|index| PropertyValue::enumeration(index as u32))
}

fn parse_direction(value: &str) -> Option<PropertyValue> {
    ["ltr", "rtl"]
        .iter()
        .position(|d| d.eq_ignore_ascii_case(value))
        .map(|index| PropertyValue::enumeration(index as u32))
}

fn parse_length(value: &str) -> Option<PropertyValue> {
    if let Some(percent) = value.strip_suffix('%') {
        return percent.trim().parse::<i32>().ok().map(PropertyValue::percentage);
    }
    let digits = value.strip_suffix("px").unwrap_or(value).trim();
    digits.parse::<i32>().ok().map(PropertyValue::pixels)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn attrs(pairs: &[(&str, &str)]) -> Vec<OwnedAttribute> {
        pairs
            .iter()
            .map(|(n, v)| (Box::from(*n), Some(Box::from(*v))))
            .collect()
    }

    #[test]
    fn classification_covers_scope_and_formatting_sets() {
        let td = ElementInfo::classify("td");
        assert_eq!(td.kind, ElementKind::Cell);
        assert!(td.is_scope());
        assert!(!td.is_table_scope());
        assert!(ElementInfo::classify("table").is_table_scope());
        assert!(ElementInfo::classify("b").is_formatting());
        assert!(ElementInfo::classify("div").closes_paragraph());
        assert!(!ElementInfo::classify("span").closes_paragraph());
        assert!(ElementInfo::classify("br").is_void());
        assert_eq!(ElementInfo::classify("h3").kind, ElementKind::Heading);
    }

    #[test]
    fn font_attributes_become_valued_properties() {
        let mut strings = AtomTable::new();
        let props = element_properties(
            "font",
            &attrs(&[("color", "#f00"), ("size", "+2"), ("face", "Arial")]),
            &mut strings,
        );
        assert_eq!(props.get(PropertyId::FontColor), Some(PropertyValue::color(0xFF0000)));
        assert_eq!(
            props.get(PropertyId::FontSize),
            Some(PropertyValue::new(PropertyType::RelHtmlFontUnits, 2))
        );
        let face = props.get(PropertyId::FontFace).expect("face");
        assert_eq!(strings.resolve(AtomId(face.payload() as u32)), Some("arial"));
    }

    #[test]
    fn unparsable_values_are_ignored() {
        let mut strings = AtomTable::new();
        let props = element_properties(
            "font",
            &attrs(&[("color", "not-a-color"), ("size", "9")]),
            &mut strings,
        );
        assert!(props.is_empty());

        let cell = element_properties("td", &attrs(&[("width", "50%"), ("align", "Center")]), &mut strings);
        assert_eq!(cell.get(PropertyId::Width), Some(PropertyValue::percentage(50)));
        assert_eq!(cell.get(PropertyId::TextAlignment), Some(PropertyValue::enumeration(1)));
    }

    #[test]
    fn phrase_elements_set_flags() {
        let mut strings = AtomTable::new();
        let bold = element_properties("strong", &[], &mut strings);
        assert!(bold.flags.is_on(PropertyFlag::Bold));
        assert!(element_properties("span", &[], &mut strings).is_empty());
    }
}
