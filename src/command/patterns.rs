//! Command intents and their spoken surface forms

/// Classified meaning of one utterance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommandIntent {
    /// Advance to the next step
    Next,
    /// Go back one step
    Previous,
    /// Read the current step again
    Repeat,
    /// Return to the first step
    StartOver,
    /// End voice mode
    Stop,
    /// Read the command summary
    Help,
    /// Jump to an explicitly numbered step (1-based as spoken)
    GotoStep(u32),
    /// Read an explicitly numbered step without moving
    RepeatStep(u32),
    /// No command recognized
    Unrecognized,
}

impl CommandIntent {
    /// Short label for status lines and logs
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Next => "next",
            Self::Previous => "previous",
            Self::Repeat => "repeat",
            Self::StartOver => "start over",
            Self::Stop => "stop",
            Self::Help => "help",
            Self::GotoStep(_) => "go to step",
            Self::RepeatStep(_) => "repeat step",
            Self::Unrecognized => "unrecognized",
        }
    }
}

impl std::fmt::Display for CommandIntent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Spoken surface forms for a table intent
///
/// Membership is what matters, not order. Intents carrying a step
/// number have no surface forms; they are recognized by the step
/// reference extractor instead.
pub(crate) const fn surface_forms(intent: CommandIntent) -> &'static [&'static str] {
    match intent {
        CommandIntent::Next => &[
            "next",
            "next step",
            "continue",
            "go on",
            "go ahead",
            "keep going",
        ],
        CommandIntent::Previous => &[
            "previous",
            "back",
            "go back",
            "previous step",
            "last step",
        ],
        CommandIntent::Repeat => &["repeat", "repeat that", "say that again", "one more time"],
        CommandIntent::StartOver => &[
            "start over",
            "restart",
            "start again",
            "from the beginning",
        ],
        CommandIntent::Stop => &["stop", "pause", "quit", "exit", "stop cooking"],
        CommandIntent::Help => &["help", "what can i say", "commands", "options"],
        CommandIntent::GotoStep(_) | CommandIntent::RepeatStep(_) | CommandIntent::Unrecognized => {
            &[]
        }
    }
}

/// All intents that have entries in the pattern table
pub(crate) const TABLE_INTENTS: [CommandIntent; 6] = [
    CommandIntent::Next,
    CommandIntent::Previous,
    CommandIntent::Repeat,
    CommandIntent::StartOver,
    CommandIntent::Stop,
    CommandIntent::Help,
];
