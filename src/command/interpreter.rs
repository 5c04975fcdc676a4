//! Transcript classification and the resulting state transition
//!
//! Fixed precedence, first matching rule wins, exactly one action per
//! utterance. The interpreter mutates the session and returns the
//! narration request plus a status line; speaking and any visual
//! update are the caller's concern.

use crate::session::CookingSession;

use super::matcher::matches;
use super::patterns::CommandIntent;
use super::steps::extract_step_number;

/// The outcome of interpreting one utterance
///
/// `utterance` is the narration request; `status` is the
/// human-readable "assistant executed X" line for UI display,
/// independent of narration.
#[derive(Debug, Clone)]
pub struct Interpretation {
    pub intent: CommandIntent,
    pub utterance: String,
    pub status: String,
    /// The step index changed; persist the session if authenticated
    pub step_changed: bool,
    /// Voice mode transitioned to stopped; shut the capture down
    pub voice_stopped: bool,
    /// The recipe was finished (last step acknowledged)
    pub completed: bool,
}

impl Interpretation {
    fn new(
        intent: CommandIntent,
        utterance: impl Into<String>,
        status: impl Into<String>,
    ) -> Self {
        Self {
            intent,
            utterance: utterance.into(),
            status: status.into(),
            step_changed: false,
            voice_stopped: false,
            completed: false,
        }
    }
}

/// Classify a transcript and apply the transition to the session
///
/// Returns `None` (a complete no-op) when no recipe is selected or
/// listening is not active.
pub fn interpret(
    raw_transcript: &str,
    session: &mut CookingSession,
) -> Option<Interpretation> {
    if session.active_recipe().is_none() || !session.listening_active() {
        tracing::debug!(
            transcript = raw_transcript,
            "ignoring transcript outside an active voice session"
        );
        return None;
    }

    let transcript = raw_transcript.trim().to_lowercase();

    // Explicit step references win over bare navigation words
    if transcript.contains("step") {
        if let Some(n) = extract_step_number(&transcript) {
            if transcript.contains("go to") || transcript.contains("jump to") {
                return Some(goto_step(session, n));
            }
            if transcript.contains("repeat") {
                return Some(repeat_step(session, n));
            }
        }
    }

    let interpretation = if matches(&transcript, CommandIntent::Next) {
        next(session)
    } else if matches(&transcript, CommandIntent::Repeat) {
        repeat(session)
    } else if matches(&transcript, CommandIntent::Previous) {
        previous(session)
    } else if matches(&transcript, CommandIntent::StartOver) {
        start_over(session)
    } else if matches(&transcript, CommandIntent::Stop) {
        stop(session)
    } else if matches(&transcript, CommandIntent::Help) {
        help()
    } else {
        unrecognized(&transcript)
    };

    tracing::debug!(
        intent = %interpretation.intent,
        status = %interpretation.status,
        "command interpreted"
    );

    Some(interpretation)
}

fn current_step_utterance(session: &CookingSession) -> String {
    session.current_step_text().unwrap_or_default().to_string()
}

fn goto_step(session: &mut CookingSession, spoken: u32) -> Interpretation {
    if session.jump_to(spoken) {
        let mut outcome = Interpretation::new(
            CommandIntent::GotoStep(spoken),
            current_step_utterance(session),
            format!("Jumped to step {spoken}"),
        );
        outcome.step_changed = true;
        outcome
    } else {
        let count = session.step_count();
        Interpretation::new(
            CommandIntent::GotoStep(spoken),
            format!("Step number out of range. Please pick a step between 1 and {count}."),
            format!("Step {spoken} is out of range"),
        )
    }
}

fn repeat_step(session: &CookingSession, spoken: u32) -> Interpretation {
    if session.step_in_range(spoken) {
        let text = usize::try_from(spoken)
            .ok()
            .and_then(|s| session.step_text(s - 1))
            .unwrap_or_default()
            .to_string();
        Interpretation::new(
            CommandIntent::RepeatStep(spoken),
            text,
            format!("Repeated step {spoken}"),
        )
    } else {
        Interpretation::new(
            CommandIntent::RepeatStep(spoken),
            "Cannot repeat that step.",
            format!("Cannot repeat step {spoken}"),
        )
    }
}

fn next(session: &mut CookingSession) -> Interpretation {
    if session.advance() {
        let mut outcome = Interpretation::new(
            CommandIntent::Next,
            current_step_utterance(session),
            format!("Moved to step {}", session.current_step() + 1),
        );
        outcome.step_changed = true;
        outcome
    } else {
        // Last step acknowledged: the session is complete and voice
        // mode winds down
        session.stop_voice();
        let mut outcome = Interpretation::new(
            CommandIntent::Next,
            "You're done! Bon app\u{e9}tit!",
            "Recipe complete",
        );
        outcome.voice_stopped = true;
        outcome.completed = true;
        outcome
    }
}

fn repeat(session: &CookingSession) -> Interpretation {
    Interpretation::new(
        CommandIntent::Repeat,
        current_step_utterance(session),
        format!("Repeated step {}", session.current_step() + 1),
    )
}

fn previous(session: &mut CookingSession) -> Interpretation {
    if session.retreat() {
        let mut outcome = Interpretation::new(
            CommandIntent::Previous,
            current_step_utterance(session),
            format!("Moved back to step {}", session.current_step() + 1),
        );
        outcome.step_changed = true;
        outcome
    } else {
        Interpretation::new(
            CommandIntent::Previous,
            "You're already at the first step.",
            "Already at the first step",
        )
    }
}

fn start_over(session: &mut CookingSession) -> Interpretation {
    session.restart_steps();
    let mut outcome = Interpretation::new(
        CommandIntent::StartOver,
        current_step_utterance(session),
        "Started over from step 1",
    );
    outcome.step_changed = true;
    outcome
}

fn stop(session: &mut CookingSession) -> Interpretation {
    session.stop_voice();
    let mut outcome = Interpretation::new(
        CommandIntent::Stop,
        "Voice mode stopped.",
        "Voice mode stopped",
    );
    outcome.voice_stopped = true;
    outcome
}

fn help() -> Interpretation {
    Interpretation::new(
        CommandIntent::Help,
        "Say next, repeat, back, go to step 2, or start over.",
        "Read the command list",
    )
}

fn unrecognized(transcript: &str) -> Interpretation {
    Interpretation::new(
        CommandIntent::Unrecognized,
        "Command not understood. Say help for options.",
        format!("Command not understood: {transcript}"),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recipe::{Difficulty, Recipe};

    fn session() -> CookingSession {
        let recipe = Recipe {
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
        };
        let mut s = CookingSession::new();
        s.select_recipe(recipe, true);
        s.start_voice();
        s
    }

    #[test]
    fn test_noop_without_recipe() {
        let mut s = CookingSession::new();
        assert!(interpret("next", &mut s).is_none());
    }

    #[test]
    fn test_noop_when_not_listening() {
        let mut s = session();
        s.stop_voice();
        assert!(interpret("next", &mut s).is_none());
        assert_eq!(s.current_step(), 0);
    }

    #[test]
    fn test_goto_takes_precedence_over_next() {
        // "next" never fires when an explicit jump is present
        let mut s = session();
        let outcome = interpret("go to the next step, no, go to step 3", &mut s).unwrap();
        assert_eq!(outcome.intent, CommandIntent::GotoStep(3));
        assert_eq!(s.current_step(), 2);
    }

    #[test]
    fn test_repeat_step_does_not_move() {
        let mut s = session();
        let outcome = interpret("repeat step 3", &mut s).unwrap();
        assert_eq!(outcome.intent, CommandIntent::RepeatStep(3));
        assert_eq!(outcome.utterance, "Drain");
        assert!(!outcome.step_changed);
        assert_eq!(s.current_step(), 0);
    }

    #[test]
    fn test_unrecognized_prompts_help() {
        let mut s = session();
        let outcome = interpret("turn on the oven", &mut s).unwrap();
        assert_eq!(outcome.intent, CommandIntent::Unrecognized);
        assert!(outcome.utterance.contains("help"));
        assert_eq!(s.current_step(), 0);
    }

    #[test]
    fn test_stop_clears_voice_mode() {
        let mut s = session();
        let outcome = interpret("stop", &mut s).unwrap();
        assert!(outcome.voice_stopped);
        assert!(!s.voice_mode_enabled());
        assert!(!s.listening_active());
    }
}
