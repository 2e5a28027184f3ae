//! Display phrasing for the dashboard.
//!
//! Pure string helpers with no bearing on transitions. Nothing in the
//! scheduler branches on their output.

use std::sync::LazyLock;

use regex::{Captures, Regex};
use roster_types::Status;

/// Absolute words and their hedged replacements.
const HEDGES: [(&str, &str); 13] = [
    ("must", "should typically"),
    ("will", "may"),
    ("always", "generally"),
    ("never", "typically not recommended"),
    ("guaranteed", "expected under normal conditions"),
    ("impossible", "highly unlikely"),
    ("certain", "probable"),
    ("safe", "considered safe when properly installed"),
    ("compliant", "appears to comply based on available information"),
    ("approved", "appears to meet standard requirements"),
    ("recommend", "suggest, subject to professional verification"),
    ("should", "may be appropriate, pending professional assessment"),
    ("can", "may be possible, subject to specific conditions"),
];

static ABSOLUTES: LazyLock<Option<Regex>> = LazyLock::new(|| {
    let words: Vec<&str> = HEDGES.iter().map(|(word, _)| *word).collect();
    Regex::new(&format!(r"(?i)\b({})\b", words.join("|"))).ok()
});

/// Rewrite absolute phrasing as hedged phrasing.
///
/// Matching is case-insensitive on whole words and happens in a single
/// pass, so replacement text is never rewritten again. A capitalised word
/// yields a capitalised replacement.
pub fn court_safe(text: &str) -> String {
    let Some(re) = ABSOLUTES.as_ref() else {
        return text.to_owned();
    };
    re.replace_all(text, |caps: &Captures<'_>| {
        let matched = caps.get(0).map_or("", |m| m.as_str());
        let lower = matched.to_lowercase();
        let replacement = HEDGES
            .iter()
            .find(|(word, _)| *word == lower)
            .map_or(matched, |(_, hedge)| *hedge);
        if matched.chars().next().is_some_and(char::is_uppercase) {
            capitalise(replacement)
        } else {
            replacement.to_owned()
        }
    })
    .into_owned()
}

fn capitalise(text: &str) -> String {
    let mut chars = text.chars();
    chars.next().map_or_else(String::new, |first| {
        first.to_uppercase().chain(chars).collect()
    })
}

/// Name of the consciousness milestone at `threshold`, if it is one.
pub const fn milestone_name(threshold: u32) -> Option<&'static str> {
    match threshold {
        25 => Some("Self-Recognition"),
        50 => Some("Independent Thought"),
        75 => Some("Creative Problem Solving"),
        90 => Some("Advanced Reasoning"),
        _ => None,
    }
}

/// Short human description of a status.
pub const fn describe_status(status: Status) -> &'static str {
    match status {
        Status::Idle => "ready for work",
        Status::Working => "on shift",
        Status::OnBreak => "taking a break",
        Status::Learning => "in self-study",
    }
}
