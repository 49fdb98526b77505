//! Golden sanitizer fixtures stored as TOML.
//!
//! ```toml
//! format = "sanitize-v1"
//!
//! [[cases]]
//! id = "script-removed"
//! input = "<a><script>x</script>y</a>"
//! expected = "<a>y</a>"
//! ```

use serde::Deserialize;
use std::collections::BTreeSet;
use std::fs;
use std::path::Path;

pub const SANITIZE_FIXTURES_FORMAT_V1: &str = "sanitize-v1";

#[derive(Clone, Copy, Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum FixtureFormat {
    #[default]
    Html,
    Text,
}

#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
pub struct SanitizeCase {
    pub id: String,
    pub input: String,
    pub expected: String,
    /// Convert as a fragment and strip the wrapper.
    #[serde(default = "default_true")]
    pub fragment: bool,
    #[serde(default = "default_true")]
    pub filter: bool,
    #[serde(default)]
    pub from: FixtureFormat,
    #[serde(default)]
    pub to: FixtureFormat,
    pub wrap: Option<usize>,
}

#[derive(Clone, Debug, Deserialize)]
struct SanitizeManifest {
    format: String,
    cases: Vec<SanitizeCase>,
}

fn default_true() -> bool {
    true
}

pub fn parse_sanitize_cases(content: &str, origin: &str) -> Vec<SanitizeCase> {
    let manifest: SanitizeManifest = toml::from_str(content)
        .unwrap_or_else(|err| panic!("failed to parse sanitize fixtures {origin}: {err}"));
    assert_eq!(
        manifest.format, SANITIZE_FIXTURES_FORMAT_V1,
        "unsupported sanitize fixture format in {origin}"
    );
    let mut seen = BTreeSet::new();
    for case in &manifest.cases {
        assert!(
            seen.insert(case.id.as_str()),
            "duplicate sanitize fixture id in {origin}: {}",
            case.id
        );
    }
    manifest.cases
}

pub fn load_sanitize_cases(path: &Path) -> Vec<SanitizeCase> {
    let content = fs::read_to_string(path)
        .unwrap_or_else(|err| panic!("failed to read sanitize fixtures {path:?}: {err}"));
    parse_sanitize_cases(&content, &format!("{path:?}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_apply_to_missing_keys() {
        let cases = parse_sanitize_cases(
            r#"
format = "sanitize-v1"

[[cases]]
id = "a"
input = "<b>x"
expected = "<b>x</b>"

[[cases]]
id = "b"
input = "x"
expected = "x\r\n"
to = "text"
fragment = false
wrap = 20
"#,
            "inline",
        );
        assert_eq!(cases.len(), 2);
        assert!(cases[0].fragment && cases[0].filter);
        assert_eq!(cases[0].to, FixtureFormat::Html);
        assert_eq!(cases[1].to, FixtureFormat::Text);
        assert_eq!(cases[1].wrap, Some(20));
        assert!(!cases[1].fragment);
    }

    #[test]
    #[should_panic(expected = "duplicate sanitize fixture id")]
    fn duplicate_ids_are_rejected() {
        parse_sanitize_cases(
            r#"
format = "sanitize-v1"

[[cases]]
id = "a"
input = ""
expected = ""

[[cases]]
id = "a"
input = ""
expected = ""
"#,
            "inline",
        );
    }
}
