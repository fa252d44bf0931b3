//! Restaurant slug normalization
//!
//! Pipeline order is fixed: lower-case, strip diacritics, drop characters
//! outside the ASCII word/digit/hyphen set, then handle whitespace.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use unicode_normalization::UnicodeNormalization;
use unicode_normalization::char::is_combining_mark;

/// How whitespace (and hyphens) are treated in the last pipeline step
///
/// `Hyphenated` is the default and yields slugs like `pizza-hut2`.
/// `Compact` removes whitespace entirely, matching the older slug generator.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SlugStyle {
    /// Whitespace/hyphen runs become a single `-`; ends are trimmed.
    /// `"Café Olé"` -> `"cafe-ole"`
    #[default]
    Hyphenated,
    /// Whitespace and hyphens are removed.
    /// `"Café Olé"` -> `"cafeole"`
    Compact,
}

impl SlugStyle {
    pub fn as_str(&self) -> &'static str {
        match self {
            SlugStyle::Hyphenated => "hyphenated",
            SlugStyle::Compact => "compact",
        }
    }
}

impl fmt::Display for SlugStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for SlugStyle {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "hyphenated" => Ok(SlugStyle::Hyphenated),
            "compact" => Ok(SlugStyle::Compact),
            other => Err(format!("unknown slug style: {other}")),
        }
    }
}

/// Characters allowed in a slug: ASCII word characters, digits and `-`
pub fn is_slug_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '-'
}

/// Normalize a human-entered name into a slug base
///
/// A name made only of disallowed characters yields an empty string.
pub fn slugify(name: &str, style: SlugStyle) -> String {
    let lowered = name.to_lowercase();

    let without_marks: String = lowered.nfd().filter(|c| !is_combining_mark(*c)).collect();

    let allowed: String = without_marks
        .chars()
        .filter(|c| is_slug_char(*c) || c.is_whitespace())
        .collect();

    match style {
        SlugStyle::Hyphenated => allowed
            .split(|c: char| c.is_whitespace() || c == '-')
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join("-"),
        SlugStyle::Compact => allowed
            .chars()
            .filter(|c| !c.is_whitespace() && *c != '-')
            .collect(),
    }
}

/// `true` when `candidate` is already in normalized form for `style`
pub fn is_valid_slug(candidate: &str, style: SlugStyle) -> bool {
    slugify(candidate, style) == candidate
}

/// Answer of the backend availability check
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlugAvailability {
    pub exists: bool,
    pub owned_by_requester: bool,
}

impl SlugAvailability {
    pub fn status(&self) -> SlugStatus {
        match (self.exists, self.owned_by_requester) {
            (false, _) => SlugStatus::Free,
            (true, true) => SlugStatus::OwnedByRequester,
            (true, false) => SlugStatus::OwnedByOther,
        }
    }
}

/// Availability of a candidate slug from the requester's point of view
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SlugStatus {
    Free,
    OwnedByRequester,
    OwnedByOther,
}
