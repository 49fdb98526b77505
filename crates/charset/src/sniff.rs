//! Encoding detection from the first bytes of a document.
//!
//! Two detectors are provided, mirroring the HTML encoding sniffing
//! algorithm: a byte order mark check (certain) and a bounded prescan for
//! `<meta charset>` / `<meta http-equiv=content-type>` declarations
//! (tentative).

use encoding_rs::{Encoding, UTF_8, UTF_16BE, UTF_16LE, WINDOWS_1252, X_USER_DEFINED};

/// Bytes examined by the `<meta>` prescan.
pub const MAX_PRESCAN_LENGTH: usize = 1024;

const UTF8_BOM: &[u8] = &[0xEF, 0xBB, 0xBF];
const UTF16BE_BOM: &[u8] = &[0xFE, 0xFF];
const UTF16LE_BOM: &[u8] = &[0xFF, 0xFE];

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BomSniff {
    /// A complete byte order mark of `len` bytes selects `encoding`.
    Found {
        encoding: &'static Encoding,
        len: usize,
    },
    /// The available bytes are a strict prefix of some byte order mark.
    NeedMoreInput,
    NotFound,
}

pub fn sniff_bom(bytes: &[u8]) -> BomSniff {
    for (bom, encoding) in [
        (UTF8_BOM, UTF_8),
        (UTF16BE_BOM, UTF_16BE),
        (UTF16LE_BOM, UTF_16LE),
    ] {
        if bytes.starts_with(bom) {
            return BomSniff::Found {
                encoding,
                len: bom.len(),
            };
        }
    }
    let partial = !bytes.is_empty()
        && (UTF8_BOM.starts_with(bytes)
            || UTF16BE_BOM.starts_with(bytes)
            || UTF16LE_BOM.starts_with(bytes));
    if partial {
        BomSniff::NeedMoreInput
    } else {
        BomSniff::NotFound
    }
}

/// Prescan at most `MAX_PRESCAN_LENGTH` bytes for a `<meta>` charset.
///
/// Comments and the attributes of other tags are skipped so that a charset
/// mentioned inside them is not picked up. UTF-16 declarations resolve to
/// UTF-8 and `x-user-defined` to windows-1252, since a document that could
/// be prescanned as ASCII cannot really be either.
pub fn prescan_meta_charset(bytes: &[u8]) -> Option<&'static Encoding> {
    let bytes = clamped(bytes, 0, MAX_PRESCAN_LENGTH);
    let mut position = 0usize;

    while position < bytes.len() {
        if clamped(bytes, position, position + 4) == b"<!--" {
            let body = position + 4;
            let close = bytes[body..].windows(3).position(|w| w == b"-->")?;
            position = body + close + 3;
            continue;
        }

        if is_meta_open(clamped(bytes, position, position + 6)) {
            position += 5;
            if let Some(encoding) = scan_meta_attributes(bytes, &mut position) {
                return Some(encoding);
            }
            position += 1;
            continue;
        }

        match clamped(bytes, position, position + 3) {
            [b'<', b'/', a, ..] | [b'<', a, ..] if a.is_ascii_alphabetic() => {
                let rel = bytes[position..]
                    .iter()
                    .position(|&b| b.is_ascii_whitespace() || b == b'>')?;
                position += rel;
                while read_attribute(bytes, &mut position).is_some() {}
                position += 1;
                continue;
            }
            _ => {}
        }

        if matches!(clamped(bytes, position, position + 2), b"<!" | b"</" | b"<?") {
            let rel = bytes[position..].iter().position(|&b| b == b'>')?;
            position += rel + 1;
            continue;
        }

        position += 1;
    }
    None
}

fn is_meta_open(window: &[u8]) -> bool {
    match window {
        [b'<', m, e, t, a, x] => {
            m.eq_ignore_ascii_case(&b'm')
                && e.eq_ignore_ascii_case(&b'e')
                && t.eq_ignore_ascii_case(&b't')
                && a.eq_ignore_ascii_case(&b'a')
                && (x.is_ascii_whitespace() || *x == b'/')
        }
        _ => false,
    }
}

fn scan_meta_attributes(bytes: &[u8], position: &mut usize) -> Option<&'static Encoding> {
    let mut seen_http_equiv = false;
    let mut seen_content = false;
    let mut seen_charset = false;
    let mut got_pragma = false;
    let mut need_pragma: Option<bool> = None;
    let mut charset: Option<&'static Encoding> = None;

    while let Some((name, value)) = read_attribute(bytes, position) {
        if name.eq_ignore_ascii_case(b"http-equiv") {
            if !seen_http_equiv {
                seen_http_equiv = true;
                got_pragma = value.eq_ignore_ascii_case(b"content-type");
            }
        } else if name.eq_ignore_ascii_case(b"content") {
            if !seen_content {
                seen_content = true;
                if charset.is_none()
                    && let Some(encoding) = charset_from_content(value)
                {
                    charset = Some(encoding);
                    need_pragma = Some(true);
                }
            }
        } else if name.eq_ignore_ascii_case(b"charset") && !seen_charset {
            seen_charset = true;
            charset = Encoding::for_label(value);
            need_pragma = Some(false);
        }
    }

    match (need_pragma, got_pragma) {
        (Some(false), _) | (Some(true), true) => charset.map(|encoding| {
            if encoding == UTF_16BE || encoding == UTF_16LE {
                UTF_8
            } else if encoding == X_USER_DEFINED {
                WINDOWS_1252
            } else {
                encoding
            }
        }),
        _ => None,
    }
}

/// Extract `charset=...` from a `content` attribute value.
fn charset_from_content(value: &[u8]) -> Option<&'static Encoding> {
    let mut position = 0usize;
    loop {
        let rel = value[position..]
            .windows(7)
            .position(|w| w.eq_ignore_ascii_case(b"charset"))?;
        position += rel + 7;
        while position < value.len() && value[position].is_ascii_whitespace() {
            position += 1;
        }
        if position < value.len() && value[position] == b'=' {
            position += 1;
            break;
        }
    }
    while position < value.len() && value[position].is_ascii_whitespace() {
        position += 1;
    }
    let rest = &value[position..];
    match rest.first() {
        Some(&quote @ (b'"' | b'\'')) => {
            let end = rest[1..].iter().position(|&b| b == quote)?;
            Encoding::for_label(&rest[1..1 + end])
        }
        Some(_) => {
            let end = rest
                .iter()
                .position(|&b| b.is_ascii_whitespace() || b == b';')
                .unwrap_or(rest.len());
            Encoding::for_label(&rest[..end])
        }
        None => None,
    }
}

/// The prescan "get an attribute" step. Returns `None` at `>` or when the
/// bytes run out mid-attribute.
fn read_attribute<'a>(bytes: &'a [u8], position: &mut usize) -> Option<(&'a [u8], &'a [u8])> {
    let empty: &[u8] = &[];
    let rel = bytes[(*position).min(bytes.len())..]
        .iter()
        .position(|&b| !b.is_ascii_whitespace() && b != b'/');
    match rel {
        Some(rel) => *position += rel,
        None => {
            *position = bytes.len();
            return None;
        }
    }
    if bytes[*position] == b'>' {
        return None;
    }

    let name_start = *position;
    while *position < bytes.len() {
        match bytes[*position] {
            b'=' if *position > name_start => break,
            b if b.is_ascii_whitespace() => break,
            b'/' | b'>' => return Some((&bytes[name_start..*position], empty)),
            _ => *position += 1,
        }
    }
    let name = &bytes[name_start..*position];

    while *position < bytes.len() && bytes[*position].is_ascii_whitespace() {
        *position += 1;
    }
    if *position >= bytes.len() || bytes[*position] != b'=' {
        return Some((name, empty));
    }
    *position += 1;
    while *position < bytes.len() && bytes[*position].is_ascii_whitespace() {
        *position += 1;
    }
    if *position >= bytes.len() {
        return Some((name, empty));
    }

    match bytes[*position] {
        quote @ (b'"' | b'\'') => {
            let value_start = *position + 1;
            let rel = bytes[value_start..].iter().position(|&b| b == quote)?;
            *position = value_start + rel + 1;
            Some((name, &bytes[value_start..value_start + rel]))
        }
        b'>' => Some((name, empty)),
        _ => {
            let value_start = *position;
            let rel = bytes[value_start..]
                .iter()
                .position(|&b| b.is_ascii_whitespace() || b == b'>')?;
            *position = value_start + rel;
            Some((name, &bytes[value_start..*position]))
        }
    }
}

fn clamped(src: &[u8], start: usize, end: usize) -> &[u8] {
    let len = src.len();
    &src[start.min(len)..end.min(len)]
}
