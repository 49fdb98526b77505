//! URL-valued attribute checks.

/// Attributes whose value is dereferenced as a URL.
pub const URL_ATTRIBUTES: &[&str] = &[
    "href",
    "src",
    "cite",
    "background",
    "longdesc",
    "action",
    "usemap",
    "dynsrc",
    "lowsrc",
];

pub const DEFAULT_URL_SCHEMES: &[&str] = &["http", "https", "mailto", "ftp", "news", "file"];

/// Whether `value` is a relative reference or uses one of `schemes`.
///
/// Control characters and whitespace are ignored while looking for the
/// scheme, so `java\tscript:` and ` javascript:` are both seen as the
/// `javascript` scheme. A `:` after the first `/`, `?` or `#` belongs to
/// the path, which makes the reference relative.
pub fn is_safe_url<S: AsRef<str>>(value: &str, schemes: &[S]) -> bool {
    let mut scheme = String::new();
    for ch in value.chars() {
        if ch.is_control() || ch.is_whitespace() {
            continue;
        }
        match ch {
            ':' => {
                return !scheme.is_empty()
                    && schemes
                        .iter()
                        .any(|allowed| allowed.as_ref().eq_ignore_ascii_case(&scheme));
            }
            '/' | '?' | '#' => return true,
            _ => scheme.push(ch),
        }
    }
    true
}
