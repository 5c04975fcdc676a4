//! Recipe data model
//!
//! A [`Recipe`] is immutable once loaded. Local recipes come from the
//! catalog file; remote ones are synthesized by the search client. The
//! title is the unique key within a catalog.

use serde::{Deserialize, Serialize};

/// Step text substituted when a source provides no instructions.
///
/// Guarantees the invariant that a selected recipe always has at least
/// one step to narrate.
pub const PLACEHOLDER_STEP: &str = "View full recipe instructions on the source website.";

/// Recipe difficulty rating
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    #[default]
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    /// Parse from a filter string ("easy", "medium", "hard")
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "easy" => Some(Self::Easy),
            "medium" => Some(Self::Medium),
            "hard" => Some(Self::Hard),
            _ => None,
        }
    }

    /// Lowercase label as shown to users
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Easy => "easy",
            Self::Medium => "medium",
            Self::Hard => "hard",
        }
    }
}

impl std::fmt::Display for Difficulty {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A recipe with an ordered sequence of cooking steps
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recipe {
    /// Remote catalog identifier, absent for local recipes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,

    /// Display title; unique key within a catalog
    pub title: String,

    /// Human-readable preparation time (e.g., "25 mins")
    pub time: String,

    #[serde(default)]
    pub difficulty: Difficulty,

    #[serde(default)]
    pub category: String,

    /// Image URI
    #[serde(default)]
    pub image: String,

    /// Ordered cooking steps, 1-based as spoken
    pub steps: Vec<String>,

    /// Link back to the recipe's source page (remote recipes)
    #[serde(default, rename = "sourceUrl", skip_serializing_if = "Option::is_none")]
    pub source_url: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub servings: Option<u32>,
}

impl Recipe {
    /// Number of steps
    #[must_use]
    pub fn step_count(&self) -> usize {
        self.steps.len()
    }

    /// Substitute the placeholder step if the source had no instructions
    pub fn ensure_steps(&mut self) {
        if self.steps.is_empty() {
            self.steps.push(PLACEHOLDER_STEP.to_string());
        }
    }

    /// Parse the leading minute count out of the time string, if any
    ///
    /// Used by the quick-recipes filter ("25 mins" → 25).
    #[must_use]
    pub fn time_minutes(&self) -> Option<u32> {
        let digits: String = self
            .time
            .trim()
            .chars()
            .take_while(char::is_ascii_digit)
            .collect();
        digits.parse().ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn recipe(steps: Vec<&str>) -> Recipe {
        Recipe {
            id: None,
            title: "Test".to_string(),
            time: "25 mins".to_string(),
            difficulty: Difficulty::Easy,
            category: "Test".to_string(),
            image: String::new(),
            steps: steps.into_iter().map(String::from).collect(),
            source_url: None,
            servings: None,
        }
    }

    #[test]
    fn test_ensure_steps_substitutes_placeholder() {
        let mut r = recipe(vec![]);
        r.ensure_steps();
        assert_eq!(r.steps, vec![PLACEHOLDER_STEP]);
    }

    #[test]
    fn test_ensure_steps_keeps_existing() {
        let mut r = recipe(vec!["Boil water"]);
        r.ensure_steps();
        assert_eq!(r.steps, vec!["Boil water"]);
    }

    #[test]
    fn test_time_minutes() {
        assert_eq!(recipe(vec!["x"]).time_minutes(), Some(25));

        let mut r = recipe(vec!["x"]);
        r.time = "about an hour".to_string();
        assert_eq!(r.time_minutes(), None);
    }

    #[test]
    fn test_difficulty_serde_lowercase() {
        let json = r#"{"title":"T","time":"5 mins","difficulty":"hard","steps":["s"]}"#;
        let r: Recipe = serde_json::from_str(json).unwrap();
        assert_eq!(r.difficulty, Difficulty::Hard);
        assert_eq!(r.category, "");
    }
}
