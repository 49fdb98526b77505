//! Character reference decoding and the named-entity table.
//!
//! Decoding covers numeric references and the HTML 4 named entity set
//! (Latin-1, symbols, Greek, and special characters). Names are
//! case-sensitive. The Latin-1 names and `amp`/`lt`/`gt`/`quot` (plus their
//! legacy uppercase forms) are also recognized without a trailing `;`.

use std::borrow::Cow;

/// Longest run of name or digit characters examined after `&`.
pub(crate) const MAX_REFERENCE_LEN: usize = 32;

const REPLACEMENT: char = '\u{FFFD}';

/// Outcome of matching a character reference at the start of `rest`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum CharRef {
    /// The `&` is literal text.
    NotAReference,
    /// The buffered input ends before the reference can be decided.
    Incomplete,
    /// `consumed` bytes (including the `&`) decode to `ch`. `malformed` is set
    /// for references accepted through error recovery (missing `;`,
    /// out-of-range code point).
    Decoded {
        consumed: usize,
        ch: char,
        malformed: bool,
    },
}

/// Match a character reference at the start of `rest`, which must begin with
/// `&`.
///
/// With `at_eof` unset, a reference that runs into the end of `rest` yields
/// `Incomplete` so the caller can wait for more input. In attribute values a
/// semicolon-less legacy name followed by an alphanumeric or `=` is left as
/// text.
pub(crate) fn match_char_ref(rest: &str, at_eof: bool, in_attribute: bool) -> CharRef {
    let bytes = rest.as_bytes();
    debug_assert_eq!(bytes.first(), Some(&b'&'));
    match bytes.get(1) {
        None if at_eof => CharRef::NotAReference,
        None => CharRef::Incomplete,
        Some(b'#') => match_numeric(bytes, at_eof),
        Some(b) if b.is_ascii_alphanumeric() => match_named(rest, at_eof, in_attribute),
        Some(_) => CharRef::NotAReference,
    }
}

fn match_numeric(bytes: &[u8], at_eof: bool) -> CharRef {
    let mut idx = 2;
    let hex = match bytes.get(idx) {
        None if at_eof => return CharRef::NotAReference,
        None => return CharRef::Incomplete,
        Some(b'x' | b'X') => {
            idx += 1;
            true
        }
        Some(_) => false,
    };
    let digits_start = idx;
    let mut value: u32 = 0;
    while idx < bytes.len() && idx - digits_start < MAX_REFERENCE_LEN {
        let digit = if hex {
            (bytes[idx] as char).to_digit(16)
        } else {
            (bytes[idx] as char).to_digit(10)
        };
        let Some(digit) = digit else {
            break;
        };
        let radix = if hex { 16 } else { 10 };
        value = value.saturating_mul(radix).saturating_add(digit);
        idx += 1;
    }
    let digits = idx - digits_start;
    let capped = digits == MAX_REFERENCE_LEN;
    if idx == bytes.len() && !at_eof && !capped {
        return CharRef::Incomplete;
    }
    if digits == 0 {
        return CharRef::NotAReference;
    }
    let mut malformed = true;
    if bytes.get(idx) == Some(&b';') {
        idx += 1;
        malformed = false;
    }
    let ch = match value {
        0 => None,
        0x80..=0x9F => Some(windows_1252_remap(value)),
        _ => char::from_u32(value),
    };
    match ch {
        Some(ch) => CharRef::Decoded {
            consumed: idx,
            ch,
            malformed,
        },
        None => CharRef::Decoded {
            consumed: idx,
            ch: REPLACEMENT,
            malformed: true,
        },
    }
}

fn match_named(rest: &str, at_eof: bool, in_attribute: bool) -> CharRef {
    let bytes = rest.as_bytes();
    let mut end = 1;
    while end < bytes.len() && end - 1 < MAX_REFERENCE_LEN && bytes[end].is_ascii_alphanumeric() {
        end += 1;
    }
    let capped = end - 1 == MAX_REFERENCE_LEN;
    if end == bytes.len() && !at_eof && !capped {
        return CharRef::Incomplete;
    }
    let name = &rest[1..end];
    if bytes.get(end) == Some(&b';')
        && let Some(ch) = lookup_entity(name)
    {
        return CharRef::Decoded {
            consumed: end + 1,
            ch,
            malformed: false,
        };
    }
    for len in (2..=name.len()).rev() {
        let Some(ch) = lookup_legacy(&name[..len]) else {
            continue;
        };
        let next = bytes.get(1 + len).copied();
        if in_attribute && next.is_some_and(|b| b.is_ascii_alphanumeric() || b == b'=') {
            return CharRef::NotAReference;
        }
        return CharRef::Decoded {
            consumed: 1 + len,
            ch,
            malformed: true,
        };
    }
    CharRef::NotAReference
}

/// Decode every character reference in a complete string (attribute values,
/// injected text).
pub(crate) fn decode_entities(s: &str, in_attribute: bool) -> Cow<'_, str> {
    let Some(first) = memchr::memchr(b'&', s.as_bytes()) else {
        return Cow::Borrowed(s);
    };
    let mut out = String::with_capacity(s.len());
    out.push_str(&s[..first]);
    let mut i = first;
    while i < s.len() {
        let rel = match memchr::memchr(b'&', &s.as_bytes()[i..]) {
            Some(rel) => rel,
            None => {
                out.push_str(&s[i..]);
                break;
            }
        };
        out.push_str(&s[i..i + rel]);
        i += rel;
        match match_char_ref(&s[i..], true, in_attribute) {
            CharRef::Decoded { consumed, ch, .. } => {
                out.push(ch);
                i += consumed;
            }
            CharRef::NotAReference | CharRef::Incomplete => {
                out.push('&');
                i += 1;
            }
        }
    }
    Cow::Owned(out)
}

/// Preferred entity name for a Latin-1 supplement character (U+00A0..=U+00FF).
pub(crate) fn latin1_entity_name(ch: char) -> Option<&'static str> {
    let cp = ch as u32;
    if (0xA0..=0xFF).contains(&cp) {
        Some(LATIN1_NAMES[(cp - 0xA0) as usize])
    } else {
        None
    }
}

fn lookup_latin1(name: &str) -> Option<char> {
    LATIN1_NAMES
        .iter()
        .position(|candidate| *candidate == name)
        .and_then(|idx| char::from_u32(0xA0 + idx as u32))
}

fn lookup_legacy(name: &str) -> Option<char> {
    match name {
        "amp" | "AMP" => Some('&'),
        "lt" | "LT" => Some('<'),
        "gt" | "GT" => Some('>'),
        "quot" | "QUOT" => Some('"'),
        "COPY" => Some('\u{A9}'),
        "REG" => Some('\u{AE}'),
        _ => lookup_latin1(name),
    }
}

fn lookup_entity(name: &str) -> Option<char> {
    if let Some(ch) = lookup_legacy(name) {
        return Some(ch);
    }
    let cp: u32 = match name {
        "apos" => 0x27,
        "OElig" => 0x152,
        "oelig" => 0x153,
        "Scaron" => 0x160,
        "scaron" => 0x161,
        "Yuml" => 0x178,
        "fnof" => 0x192,
        "circ" => 0x2C6,
        "tilde" => 0x2DC,
        "Alpha" => 0x391,
        "Beta" => 0x392,
        "Gamma" => 0x393,
        "Delta" => 0x394,
        "Epsilon" => 0x395,
        "Zeta" => 0x396,
        "Eta" => 0x397,
        "Theta" => 0x398,
        "Iota" => 0x399,
        "Kappa" => 0x39A,
        "Lambda" => 0x39B,
        "Mu" => 0x39C,
        "Nu" => 0x39D,
        "Xi" => 0x39E,
        "Omicron" => 0x39F,
        "Pi" => 0x3A0,
        "Rho" => 0x3A1,
        "Sigma" => 0x3A3,
        "Tau" => 0x3A4,
        "Upsilon" => 0x3A5,
        "Phi" => 0x3A6,
        "Chi" => 0x3A7,
        "Psi" => 0x3A8,
        "Omega" => 0x3A9,
        "alpha" => 0x3B1,
        "beta" => 0x3B2,
        "gamma" => 0x3B3,
        "delta" => 0x3B4,
        "epsilon" => 0x3B5,
        "zeta" => 0x3B6,
        "eta" => 0x3B7,
        "theta" => 0x3B8,
        "iota" => 0x3B9,
        "kappa" => 0x3BA,
        "lambda" => 0x3BB,
        "mu" => 0x3BC,
        "nu" => 0x3BD,
        "xi" => 0x3BE,
        "omicron" => 0x3BF,
        "pi" => 0x3C0,
        "rho" => 0x3C1,
        "sigmaf" => 0x3C2,
        "sigma" => 0x3C3,
        "tau" => 0x3C4,
        "upsilon" => 0x3C5,
        "phi" => 0x3C6,
        "chi" => 0x3C7,
        "psi" => 0x3C8,
        "omega" => 0x3C9,
        "thetasym" => 0x3D1,
        "upsih" => 0x3D2,
        "piv" => 0x3D6,
        "ensp" => 0x2002,
        "emsp" => 0x2003,
        "thinsp" => 0x2009,
        "zwnj" => 0x200C,
        "zwj" => 0x200D,
        "lrm" => 0x200E,
        "rlm" => 0x200F,
        "ndash" => 0x2013,
        "mdash" => 0x2014,
        "lsquo" => 0x2018,
        "rsquo" => 0x2019,
        "sbquo" => 0x201A,
        "ldquo" => 0x201C,
        "rdquo" => 0x201D,
        "bdquo" => 0x201E,
        "dagger" => 0x2020,
        "Dagger" => 0x2021,
        "bull" => 0x2022,
        "hellip" => 0x2026,
        "permil" => 0x2030,
        "prime" => 0x2032,
        "Prime" => 0x2033,
        "lsaquo" => 0x2039,
        "rsaquo" => 0x203A,
        "oline" => 0x203E,
        "frasl" => 0x2044,
        "euro" => 0x20AC,
        "image" => 0x2111,
        "weierp" => 0x2118,
        "real" => 0x211C,
        "trade" => 0x2122,
        "alefsym" => 0x2135,
        "larr" => 0x2190,
        "uarr" => 0x2191,
        "rarr" => 0x2192,
        "darr" => 0x2193,
        "harr" => 0x2194,
        "crarr" => 0x21B5,
        "lArr" => 0x21D0,
        "uArr" => 0x21D1,
        "rArr" => 0x21D2,
        "dArr" => 0x21D3,
        "hArr" => 0x21D4,
        "forall" => 0x2200,
        "part" => 0x2202,
        "exist" => 0x2203,
        "empty" => 0x2205,
        "nabla" => 0x2207,
        "isin" => 0x2208,
        "notin" => 0x2209,
        "ni" => 0x220B,
        "prod" => 0x220F,
        "sum" => 0x2211,
        "minus" => 0x2212,
        "lowast" => 0x2217,
        "radic" => 0x221A,
        "prop" => 0x221D,
        "infin" => 0x221E,
        "ang" => 0x2220,
        "and" => 0x2227,
        "or" => 0x2228,
        "cap" => 0x2229,
        "cup" => 0x222A,
        "int" => 0x222B,
        "there4" => 0x2234,
        "sim" => 0x223C,
        "cong" => 0x2245,
        "asymp" => 0x2248,
        "ne" => 0x2260,
        "equiv" => 0x2261,
        "le" => 0x2264,
        "ge" => 0x2265,
        "sub" => 0x2282,
        "sup" => 0x2283,
        "nsub" => 0x2284,
        "sube" => 0x2286,
        "supe" => 0x2287,
        "oplus" => 0x2295,
        "otimes" => 0x2297,
        "perp" => 0x22A5,
        "sdot" => 0x22C5,
        "lceil" => 0x2308,
        "rceil" => 0x2309,
        "lfloor" => 0x230A,
        "rfloor" => 0x230B,
        "lang" => 0x27E8,
        "rang" => 0x27E9,
        "loz" => 0x25CA,
        "spades" => 0x2660,
        "clubs" => 0x2663,
        "hearts" => 0x2665,
        "diams" => 0x2666,
        _ => return None,
    };
    char::from_u32(cp)
}

fn windows_1252_remap(value: u32) -> char {
    let mapped = match value {
        0x80 => 0x20AC,
        0x82 => 0x201A,
        0x83 => 0x0192,
        0x84 => 0x201E,
        0x85 => 0x2026,
        0x86 => 0x2020,
        0x87 => 0x2021,
        0x88 => 0x02C6,
        0x89 => 0x2030,
        0x8A => 0x0160,
        0x8B => 0x2039,
        0x8C => 0x0152,
        0x8E => 0x017D,
        0x91 => 0x2018,
        0x92 => 0x2019,
        0x93 => 0x201C,
        0x94 => 0x201D,
        0x95 => 0x2022,
        0x96 => 0x2013,
        0x97 => 0x2014,
        0x98 => 0x02DC,
        0x99 => 0x2122,
        0x9A => 0x0161,
        0x9B => 0x203A,
        0x9C => 0x0153,
        0x9E => 0x017E,
        0x9F => 0x0178,
        other => other,
    };
    char::from_u32(mapped).unwrap_or(REPLACEMENT)
}

/// Entity names for U+00A0..=U+00FF, indexed by `code point - 0xA0`.
const LATIN1_NAMES: [&str; 96] = [
    "nbsp", "iexcl", "cent", "pound", "curren", "yen", "brvbar", "sect", "uml", "copy", "ordf",
    "laquo", "not", "shy", "reg", "macr", "deg", "plusmn", "sup2", "sup3", "acute", "micro",
    "para", "middot", "cedil", "sup1", "ordm", "raquo", "frac14", "frac12", "frac34", "iquest",
    "Agrave", "Aacute", "Acirc", "Atilde", "Auml", "Aring", "AElig", "Ccedil", "Egrave", "Eacute",
    "Ecirc", "Euml", "Igrave", "Iacute", "Icirc", "Iuml", "ETH", "Ntilde", "Ograve", "Oacute",
    "Ocirc", "Otilde", "Ouml", "times", "Oslash", "Ugrave", "Uacute", "Ucirc", "Uuml", "Yacute",
    "THORN", "szlig", "agrave", "aacute", "acirc", "atilde", "auml", "aring", "aelig", "ccedil",
    "egrave", "eacute", "ecirc", "euml", "igrave", "iacute", "icirc", "iuml", "eth", "ntilde",
    "ograve", "oacute", "ocirc", "otilde", "ouml", "divide", "oslash", "ugrave", "uacute", "ucirc",
    "uuml", "yacute", "thorn", "yuml",
];

#[cfg(test)]
mod tests {
    use super::*;

    fn decode(s: &str) -> String {
        decode_entities(s, false).into_owned()
    }

    #[test]
    fn decode_entities_preserves_utf8() {
        assert_eq!(decode("120\u{D7}32"), "120\u{D7}32");
        assert!(matches!(decode_entities("plain", false), Cow::Borrowed(_)));
    }

    #[test]
    fn decodes_named_and_numeric_references() {
        assert_eq!(decode("a &amp; b"), "a & b");
        assert_eq!(decode("&lt;tag&gt;"), "<tag>");
        assert_eq!(decode("&quot;hi&apos;"), "\"hi'");
        assert_eq!(decode("&eacute;&Eacute;"), "\u{e9}\u{c9}");
        assert_eq!(decode("&mdash;&hellip;&euro;"), "\u{2014}\u{2026}\u{20AC}");
        assert_eq!(decode("&#215;&#xD7;&#XD7;"), "\u{D7}\u{D7}\u{D7}");
    }

    #[test]
    fn legacy_names_decode_without_semicolon() {
        assert_eq!(decode("&amp b"), "& b");
        assert_eq!(decode("&copy2024"), "\u{A9}2024");
        assert_eq!(decode("&notit;"), "\u{AC}it;");
        // Not a legacy name: left alone without its semicolon.
        assert_eq!(decode("&hellip more"), "&hellip more");
    }

    #[test]
    fn attribute_values_keep_ambiguous_ampersands() {
        assert_eq!(
            decode_entities("/q?a=1&copy=2&amp;x", true),
            "/q?a=1&copy=2&x"
        );
        assert_eq!(decode_entities("&copy!", true), "\u{A9}!");
    }

    #[test]
    fn numeric_references_recover_from_bad_code_points() {
        assert_eq!(decode("&#0;"), "\u{FFFD}");
        assert_eq!(decode("&#xD800;"), "\u{FFFD}");
        assert_eq!(decode("&#x110000;"), "\u{FFFD}");
        assert_eq!(decode("&#99999999999999;"), "\u{FFFD}");
        assert_eq!(decode("&#x80;&#150;"), "\u{20AC}\u{2013}");
        assert_eq!(decode("&#65x"), "Ax");
        assert_eq!(decode("&#;&#x;"), "&#;&#x;");
    }

    #[test]
    fn streaming_match_waits_for_terminator() {
        assert_eq!(match_char_ref("&", false, false), CharRef::Incomplete);
        assert_eq!(match_char_ref("&am", false, false), CharRef::Incomplete);
        assert_eq!(match_char_ref("&#12", false, false), CharRef::Incomplete);
        assert_eq!(
            match_char_ref("&am", true, false),
            CharRef::NotAReference
        );
        assert_eq!(
            match_char_ref("&amp;x", false, false),
            CharRef::Decoded {
                consumed: 5,
                ch: '&',
                malformed: false
            }
        );
        assert_eq!(match_char_ref("& x", false, false), CharRef::NotAReference);
    }

    #[test]
    fn long_reference_runs_are_bounded() {
        let long = format!("&{}", "a".repeat(MAX_REFERENCE_LEN + 8));
        assert_eq!(match_char_ref(&long, false, false), CharRef::NotAReference);
        let digits = format!("&#{}", "1".repeat(MAX_REFERENCE_LEN + 8));
        assert!(matches!(
            match_char_ref(&digits, false, false),
            CharRef::Decoded {
                ch: REPLACEMENT,
                ..
            }
        ));
    }

    #[test]
    fn latin1_names_cover_the_whole_range() {
        assert_eq!(latin1_entity_name('\u{A0}'), Some("nbsp"));
        assert_eq!(latin1_entity_name('\u{E9}'), Some("eacute"));
        assert_eq!(latin1_entity_name('\u{FF}'), Some("yuml"));
        assert_eq!(latin1_entity_name('\u{100}'), None);
        for cp in 0xA0u32..=0xFF {
            let ch = char::from_u32(cp).expect("latin-1 scalar");
            let name = latin1_entity_name(ch).expect("latin-1 name");
            assert_eq!(decode(&format!("&{name};")), ch.to_string());
        }
    }
}
