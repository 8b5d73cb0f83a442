use crate::error::CorpusError;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

// ---------------------------------------------------------------------------
// ContextId
// ---------------------------------------------------------------------------

/// A context identifier: uppercase project prefix plus a sequence number,
/// rendered as `PREFIX_NNN` (zero-padded to three digits, wider when the
/// sequence outgrows them).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ContextId {
    prefix: String,
    seq: u32,
}

static ID_RE: OnceLock<Regex> = OnceLock::new();
static PREFIX_RE: OnceLock<Regex> = OnceLock::new();

/// Matches a full ID token greedily: all adjacent digits belong to the
/// token, so `NEX_005` never matches inside `NEX_0050`.
pub(crate) fn id_token_re() -> &'static Regex {
    ID_RE.get_or_init(|| Regex::new(r"[A-Z][A-Z0-9]*_[0-9]+").unwrap())
}

fn prefix_re() -> &'static Regex {
    PREFIX_RE.get_or_init(|| Regex::new(r"^[A-Z][A-Z0-9]{1,7}$").unwrap())
}

impl ContextId {
    pub fn new(prefix: impl Into<String>, seq: u32) -> std::result::Result<Self, CorpusError> {
        let prefix = prefix.into();
        if !prefix_re().is_match(&prefix) {
            return Err(CorpusError::InvalidId(format!("{prefix}_{seq:03}")));
        }
        Ok(Self { prefix, seq })
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn seq(&self) -> u32 {
        self.seq
    }

    pub fn with_seq(&self, seq: u32) -> Self {
        Self {
            prefix: self.prefix.clone(),
            seq,
        }
    }

    /// Filename for this context given its title slug: `PREFIX_NNN-slug.md`.
    pub fn filename(&self, slug: &str) -> String {
        format!("{self}-{slug}.md")
    }

    /// Extract `(id, slug)` from a context filename (`PREFIX_NNN-slug.md`).
    /// Returns `None` for files that don't follow the convention, including
    /// `index.md`.
    pub fn parse_filename(filename: &str) -> Option<(Self, String)> {
        let stem = filename.strip_suffix(".md")?;
        let (id_part, slug) = stem.split_once('-')?;
        let id = id_part.parse().ok()?;
        Some((id, slug.to_string()))
    }
}

impl fmt::Display for ContextId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{:03}", self.prefix, self.seq)
    }
}

impl FromStr for ContextId {
    type Err = CorpusError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let (prefix, digits) = s
            .split_once('_')
            .ok_or_else(|| CorpusError::InvalidId(s.to_string()))?;
        if digits.len() < 3 || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(CorpusError::InvalidId(s.to_string()));
        }
        let seq: u32 = digits
            .parse()
            .map_err(|_| CorpusError::InvalidId(s.to_string()))?;
        if !prefix_re().is_match(prefix) {
            return Err(CorpusError::InvalidId(s.to_string()));
        }
        Ok(Self {
            prefix: prefix.to_string(),
            seq,
        })
    }
}

impl Serialize for ContextId {
    fn serialize<S: serde::Serializer>(&self, s: S) -> std::result::Result<S::Ok, S::Error> {
        s.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for ContextId {
    fn deserialize<D: serde::Deserializer<'de>>(d: D) -> std::result::Result<Self, D::Error> {
        let raw = String::deserialize(d)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

// ---------------------------------------------------------------------------
// Slugs
// ---------------------------------------------------------------------------

/// Reduce a title to a filename slug: lowercase alphanumeric runs joined by
/// hyphens. Empty titles slug to "untitled".
pub fn slugify(title: &str) -> String {
    let mut out = String::with_capacity(title.len());
    let mut last_dash = true;
    for ch in title.chars() {
        if ch.is_ascii_alphanumeric() {
            out.push(ch.to_ascii_lowercase());
            last_dash = false;
        } else if !last_dash {
            out.push('-');
            last_dash = true;
        }
    }
    while out.ends_with('-') {
        out.pop();
    }
    if out.is_empty() {
        "untitled".to_string()
    } else {
        out
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
