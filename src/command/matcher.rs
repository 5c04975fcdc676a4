//! Transcript-to-intent matching
//!
//! Three rules, in order, any success short-circuits: exact equality;
//! substring containment for multi-word patterns; whole-word regex
//! containment for single-token patterns. Bare containment alone would
//! false-positive on word fragments ("context" contains "next"), while
//! phrase containment still lets variably-worded utterances through
//! ("please go ahead now").

use std::collections::HashMap;
use std::sync::LazyLock;

use regex::Regex;

use super::patterns::{CommandIntent, TABLE_INTENTS, surface_forms};

/// Word-boundary regex per single-token pattern, compiled once
static WORD_REGEXES: LazyLock<HashMap<&'static str, Regex>> = LazyLock::new(|| {
    let mut map = HashMap::new();
    for intent in TABLE_INTENTS {
        for pattern in surface_forms(intent) {
            if !pattern.contains(' ') {
                let re = Regex::new(&format!(r"(?i)\b{}\b", regex::escape(pattern)))
                    .expect("valid regex");
                map.insert(*pattern, re);
            }
        }
    }
    map
});

/// Decide whether a transcript expresses the given intent
///
/// Case- and trim-insensitive. Pure; no side effects.
#[must_use]
pub fn matches(transcript: &str, intent: CommandIntent) -> bool {
    let transcript = transcript.trim().to_lowercase();
    let patterns = surface_forms(intent);

    // Exact phrase
    if patterns.iter().any(|p| *p == transcript) {
        return true;
    }

    // Multi-word phrases may appear anywhere in the utterance
    if patterns
        .iter()
        .any(|p| p.contains(' ') && transcript.contains(p))
    {
        return true;
    }

    // Single tokens must land on a word boundary
    patterns
        .iter()
        .filter_map(|p| WORD_REGEXES.get(*p))
        .any(|re| re.is_match(&transcript))
}
