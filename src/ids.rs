//! Node id grammar.
//!
//! Node ids have the shape `s<sentence>_<local>` (the `s` is optional), e.g.
//! `s158_506`. A node id is canonical inside a sentence when its sentence
//! component spells the sentence's declared number and its local component
//! has no leading zero.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::errors::{AlignError, AlignResult};

static NODE_ID: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^s?([0-9]+)_([0-9]+)$").expect("node id pattern is valid")
});

static LEADING_ZERO_SENTENCE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^s?0+[0-9]+").expect("sentence id pattern is valid")
});

/// A decomposed node id.
///
/// The digit strings are kept verbatim so that `s083_4` and `s83_4` stay
/// distinguishable; the numeric values are available for arithmetic.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NodeId {
    sentence_digits: String,
    local_digits: String,
    sentence_number: u64,
    local_number: u64,
}

impl NodeId {
    /// Decompose `id` into sentence and local number.
    pub fn parse(id: &str) -> AlignResult<Self> {
        let malformed = || AlignError::MalformedId { id: id.to_string() };
        let caps = NODE_ID.captures(id).ok_or_else(malformed)?;
        let sentence_digits = caps[1].to_string();
        let local_digits = caps[2].to_string();
        let sentence_number = sentence_digits.parse().map_err(|_| malformed())?;
        let local_number = local_digits.parse().map_err(|_| malformed())?;
        Ok(Self {
            sentence_digits,
            local_digits,
            sentence_number,
            local_number,
        })
    }

    pub fn sentence_number(&self) -> u64 {
        self.sentence_number
    }

    pub fn local_number(&self) -> u64 {
        self.local_number
    }

    /// Sentence component as written, e.g. `083` for `s083_4`.
    pub fn sentence_digits(&self) -> &str {
        &self.sentence_digits
    }

    /// Local component as written, e.g. `05` for `s83_05`.
    pub fn local_digits(&self) -> &str {
        &self.local_digits
    }

    /// True when the local component starts with `0`.
    pub fn has_leading_zero(&self) -> bool {
        self.local_digits.starts_with('0')
    }

    /// The same local component placed in another sentence.
    pub fn with_sentence(&self, sentence: u64) -> String {
        format!("s{}_{}", sentence, self.local_digits)
    }

    /// Render the canonical text form `s<sentence>_<local>`.
    pub fn format(sentence_digits: &str, local: u64) -> String {
        format!("s{}_{}", sentence_digits, local)
    }
}

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "s{}_{}", self.sentence_digits, self.local_digits)
    }
}

/// Sentence id without its `s` prefix (`s83` → `83`).
pub fn sentence_digits(sentence_id: &str) -> &str {
    sentence_id.strip_prefix('s').unwrap_or(sentence_id)
}

/// Numeric value of a declared sentence id, ignoring leading zeros.
pub fn sentence_number(sentence_id: &str) -> Option<u64> {
    sentence_digits(sentence_id).parse().ok()
}

/// Whether `id` is canonical for the sentence declared as `declared_sentence_id`.
///
/// Fails with [`AlignError::MalformedId`] when `id` does not decompose.
pub fn is_canonical(id: &str, declared_sentence_id: &str) -> AlignResult<bool> {
    let node = NodeId::parse(id)?;
    Ok(node.sentence_digits() == sentence_digits(declared_sentence_id) && !node.has_leading_zero())
}

/// Whether a sentence id carries leading zeros (`s0012`, `007`).
pub fn has_leading_zeros(sentence_id: &str) -> bool {
    LEADING_ZERO_SENTENCE.is_match(sentence_id)
}
