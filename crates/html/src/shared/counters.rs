//! Conversion counters.

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Counters {
    pub tokens_emitted: u64,
    pub parse_errors: u64,
    pub tags_too_long: u64,
    /// Attributes dropped by the per-tag cap.
    pub attributes_dropped: u64,
    /// Attributes removed by the safe-list.
    pub attributes_filtered: u64,
    /// Elements removed by the safe-list (content kept or dropped).
    pub elements_filtered: u64,
    /// End tags synthesized to re-balance the document.
    pub elements_auto_closed: u64,
    pub elements_reopened: u64,
    /// End tags with no matching open element.
    pub end_tags_ignored: u64,
    /// Deepest content nesting reached; wrapper elements do not count.
    pub max_nesting_depth: u64,
    pub chars_in: u64,
    pub chars_out: u64,
}
