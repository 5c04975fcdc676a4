//! Cooking session state
//!
//! Holds the active recipe, the current step index, and the voice-mode
//! flags. Navigation primitives are bounds-checked; the step index is
//! always valid while a recipe is set, and `listening_active` implies
//! `voice_mode_enabled`.

use serde::{Deserialize, Serialize};

use crate::recipe::Recipe;

/// Durable snapshot of a cooking session
///
/// Stores the whole recipe, not just its title, so a restored session
/// works for remote recipes that are absent from the local catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub recipe: Recipe,
    pub step: usize,
}

/// The single cooking session driven by voice commands
#[derive(Debug, Default)]
pub struct CookingSession {
    active_recipe: Option<Recipe>,
    current_step: usize,
    voice_mode_enabled: bool,
    listening_active: bool,
}

impl CookingSession {
    /// Create an empty session
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Select a recipe, resetting to step 0 and clearing voice flags
    ///
    /// Returns the spoken selection confirmation; guests are told to
    /// sign in before voice features work.
    pub fn select_recipe(&mut self, mut recipe: Recipe, authenticated: bool) -> String {
        recipe.ensure_steps();

        let confirmation = if authenticated {
            format!(
                "You selected {}. Click start voice to begin cooking.",
                recipe.title
            )
        } else {
            format!(
                "You selected {}. Please sign in to use voice features.",
                recipe.title
            )
        };

        tracing::info!(recipe = %recipe.title, steps = recipe.step_count(), "recipe selected");

        self.active_recipe = Some(recipe);
        self.current_step = 0;
        self.voice_mode_enabled = false;
        self.listening_active = false;

        confirmation
    }

    /// The active recipe, if one is selected
    #[must_use]
    pub const fn active_recipe(&self) -> Option<&Recipe> {
        self.active_recipe.as_ref()
    }

    /// Current 0-based step index
    #[must_use]
    pub const fn current_step(&self) -> usize {
        self.current_step
    }

    /// Number of steps in the active recipe (0 when none selected)
    #[must_use]
    pub fn step_count(&self) -> usize {
        self.active_recipe.as_ref().map_or(0, Recipe::step_count)
    }

    /// Text of the current step, if a recipe is selected
    #[must_use]
    pub fn current_step_text(&self) -> Option<&str> {
        self.step_text(self.current_step)
    }

    /// Text of a 0-based step index
    #[must_use]
    pub fn step_text(&self, index: usize) -> Option<&str> {
        self.active_recipe
            .as_ref()
            .and_then(|r| r.steps.get(index))
            .map(String::as_str)
    }

    /// Advance one step; false when already at the last step
    pub fn advance(&mut self) -> bool {
        if self.current_step + 1 < self.step_count() {
            self.current_step += 1;
            true
        } else {
            false
        }
    }

    /// Go back one step; false when already at the first step
    pub fn retreat(&mut self) -> bool {
        if self.current_step > 0 {
            self.current_step -= 1;
            true
        } else {
            false
        }
    }

    /// Jump to a 1-based spoken step number; false when out of range
    pub fn jump_to(&mut self, spoken: u32) -> bool {
        let count = self.step_count();
        match usize::try_from(spoken) {
            Ok(s) if s >= 1 && s <= count => {
                self.current_step = s - 1;
                true
            }
            _ => false,
        }
    }

    /// Whether a 1-based spoken step number is in range
    #[must_use]
    pub fn step_in_range(&self, spoken: u32) -> bool {
        usize::try_from(spoken).is_ok_and(|s| s >= 1 && s <= self.step_count())
    }

    /// Return to the first step
    pub const fn restart_steps(&mut self) {
        self.current_step = 0;
    }

    /// Whether continuous listening is desired by the user
    #[must_use]
    pub const fn voice_mode_enabled(&self) -> bool {
        self.voice_mode_enabled
    }

    /// Whether the capture engine is actually delivering transcripts
    #[must_use]
    pub const fn listening_active(&self) -> bool {
        self.listening_active
    }

    /// Enter voice mode and mark listening active
    pub const fn start_voice(&mut self) {
        self.voice_mode_enabled = true;
        self.listening_active = true;
    }

    /// Leave voice mode, clearing both flags
    pub const fn stop_voice(&mut self) {
        self.voice_mode_enabled = false;
        self.listening_active = false;
    }

    /// Reflect actual engine state; ignored unless voice mode is on
    ///
    /// Keeps the `listening_active` ⇒ `voice_mode_enabled` invariant.
    pub const fn mark_listening(&mut self, active: bool) {
        if active {
            if self.voice_mode_enabled {
                self.listening_active = true;
            }
        } else {
            self.listening_active = false;
        }
    }

    /// Snapshot for persistence; None when no recipe is selected
    #[must_use]
    pub fn snapshot(&self) -> Option<SessionSnapshot> {
        self.active_recipe.as_ref().map(|recipe| SessionSnapshot {
            recipe: recipe.clone(),
            step: self.current_step,
        })
    }

    /// Restore from a prior snapshot; false (and no change) if the
    /// saved step index is out of range for the saved recipe
    pub fn restore(&mut self, snapshot: SessionSnapshot) -> bool {
        if snapshot.step >= snapshot.recipe.step_count() {
            tracing::warn!(
                recipe = %snapshot.recipe.title,
                step = snapshot.step,
                "ignoring snapshot with out-of-range step"
            );
            return false;
        }

        tracing::info!(recipe = %snapshot.recipe.title, step = snapshot.step, "session restored");
        self.active_recipe = Some(snapshot.recipe);
        self.current_step = snapshot.step;
        self.voice_mode_enabled = false;
        self.listening_active = false;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recipe::Difficulty;

    fn pasta() -> Recipe {
        Recipe {
            id: None,
            title: "Pasta".to_string(),
            time: "20 mins".to_string(),
            difficulty: Difficulty::Easy,
            category: "Italian".to_string(),
            image: String::new(),
            steps: vec![
                "Boil water".to_string(),
                "Add pasta".to_string(),
                "Drain".to_string(),
            ],
            source_url: None,
            servings: None,
        }
    }

    #[test]
    fn test_select_resets_state() {
        let mut session = CookingSession::new();
        session.select_recipe(pasta(), true);
        session.start_voice();
        session.advance();

        session.select_recipe(pasta(), true);
        assert_eq!(session.current_step(), 0);
        assert!(!session.voice_mode_enabled());
        assert!(!session.listening_active());
    }

    #[test]
    fn test_selection_wording_depends_on_auth() {
        let mut session = CookingSession::new();
        let guest = session.select_recipe(pasta(), false);
        assert!(guest.contains("sign in"));

        let signed_in = session.select_recipe(pasta(), true);
        assert!(signed_in.contains("start voice"));
    }

    #[test]
    fn test_advance_and_retreat_bounds() {
        let mut session = CookingSession::new();
        session.select_recipe(pasta(), true);

        assert!(!session.retreat());
        assert!(session.advance());
        assert!(session.advance());
        assert!(!session.advance());
        assert_eq!(session.current_step(), 2);
        assert!(session.retreat());
        assert_eq!(session.current_step(), 1);
    }

    #[test]
    fn test_jump_bounds() {
        let mut session = CookingSession::new();
        session.select_recipe(pasta(), true);

        assert!(session.jump_to(3));
        assert_eq!(session.current_step(), 2);
        assert!(!session.jump_to(0));
        assert!(!session.jump_to(4));
        assert_eq!(session.current_step(), 2);
    }

    #[test]
    fn test_listening_implies_voice_mode() {
        let mut session = CookingSession::new();
        session.select_recipe(pasta(), true);

        // Cannot become listening outside voice mode
        session.mark_listening(true);
        assert!(!session.listening_active());

        session.start_voice();
        assert!(session.listening_active());

        session.stop_voice();
        assert!(!session.listening_active());
        assert!(!session.voice_mode_enabled());
    }

    #[test]
    fn test_snapshot_roundtrip() {
        let mut session = CookingSession::new();
        session.select_recipe(pasta(), true);
        session.advance();

        let snapshot = session.snapshot().unwrap();
        assert_eq!(snapshot.step, 1);

        let mut restored = CookingSession::new();
        assert!(restored.restore(snapshot));
        assert_eq!(restored.current_step(), 1);
        assert_eq!(restored.active_recipe().unwrap().title, "Pasta");
        assert!(!restored.voice_mode_enabled());
    }

    #[test]
    fn test_restore_rejects_out_of_range_step() {
        let snapshot = SessionSnapshot {
            recipe: pasta(),
            step: 9,
        };

        let mut session = CookingSession::new();
        assert!(!session.restore(snapshot));
        assert!(session.active_recipe().is_none());
    }

    #[test]
    fn test_empty_session_has_no_snapshot() {
        assert!(CookingSession::new().snapshot().is_none());
    }
}
