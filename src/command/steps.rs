//! Step reference extraction
//!
//! Parses an explicit step number out of a transcript. Numbers are
//! 1-based as spoken.

use std::sync::LazyLock;

use regex::Regex;

/// Numeric reference patterns, tried in order
static STEP_PATTERNS: LazyLock<[Regex; 3]> = LazyLock::new(|| {
    [
        // "go to step 3", "jump to step 3", "step 3"
        Regex::new(r"(?:(?:go|jump)\s+to\s+)?step\s+(\d+)").expect("valid regex"),
        // "step number 12"
        Regex::new(r"step\s+number\s+(\d+)").expect("valid regex"),
        // "3rd step", "1st step"
        Regex::new(r"(\d+)\s*(?:st|nd|rd|th)\s+step").expect("valid regex"),
    ]
});

/// Extract an explicit step number from a transcript
///
/// Returns the first pattern's captured integer, or `None` if no
/// pattern matches. Pure; no side effects.
#[must_use]
pub fn extract_step_number(transcript: &str) -> Option<u32> {
    let transcript = transcript.trim().to_lowercase();

    STEP_PATTERNS.iter().find_map(|re| {
        re.captures(&transcript)
            .and_then(|caps| caps.get(1))
            .and_then(|m| m.as_str().parse().ok())
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_go_to_step() {
        assert_eq!(extract_step_number("go to step 3"), Some(3));
        assert_eq!(extract_step_number("jump to step 7"), Some(7));
    }

    #[test]
    fn test_bare_step() {
        assert_eq!(extract_step_number("step 5"), Some(5));
        assert_eq!(extract_step_number("repeat step 2"), Some(2));
    }

    #[test]
    fn test_step_number_form() {
        assert_eq!(extract_step_number("step number 12"), Some(12));
    }

    #[test]
    fn test_ordinal_form() {
        assert_eq!(extract_step_number("3rd step"), Some(3));
        assert_eq!(extract_step_number("1st step"), Some(1));
        assert_eq!(extract_step_number("go to the 2nd step"), Some(2));
        assert_eq!(extract_step_number("the 4th step please"), Some(4));
    }

    #[test]
    fn test_no_reference() {
        assert_eq!(extract_step_number("go forward"), None);
        assert_eq!(extract_step_number("step"), None);
        assert_eq!(extract_step_number(""), None);
    }

    #[test]
    fn test_case_insensitive() {
        assert_eq!(extract_step_number("GO TO STEP 3"), Some(3));
    }
}
