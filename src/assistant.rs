//! The assistant orchestrator
//!
//! Owns the cooking session and wires capture, interpretation,
//! narration, identity, and persistence together. All state mutation
//! happens inside this object's event handlers, run to completion one
//! event at a time; UI shells observe through the [`UiEvent`] stream
//! instead of reaching into the session.

use std::sync::Arc;

use tokio::sync::{broadcast, mpsc};

use crate::command::interpret;
use crate::db::{DbPool, HistoryRepo, SessionStateRepo, UserRepo};
use crate::identity::{AuthState, IdentityProvider};
use crate::recipe::Recipe;
use crate::session::CookingSession;
use crate::voice::{CaptureController, CaptureEngine, CaptureEvent, Narrator};

/// Capacity of the UI notification stream
const UI_EVENT_CAPACITY: usize = 64;

/// State-change notification for UI shells
#[derive(Debug, Clone)]
pub enum UiEvent {
    /// A recipe became the active one
    RecipeSelected { title: String },
    /// A finalized transcript arrived from the capture engine
    TranscriptHeard(String),
    /// Human-readable description of the action the assistant executed
    Status(String),
    /// The current step changed (or was re-read)
    StepChanged { index: usize, text: String },
    /// Listening started or stopped
    ListeningChanged(bool),
    /// The active recipe was cooked to completion
    Completed { title: String },
}

/// The voice-guided cooking assistant
pub struct Assistant<E: CaptureEngine> {
    session: CookingSession,
    controller: CaptureController<E>,
    narrator: Narrator,
    identity: Arc<dyn IdentityProvider>,
    capture_events: mpsc::Receiver<CaptureEvent>,
    snapshots: SessionStateRepo,
    history: HistoryRepo,
    users: UserRepo,
    ui_tx: broadcast::Sender<UiEvent>,
}

impl<E: CaptureEngine> Assistant<E> {
    /// Create an assistant over its collaborators
    #[must_use]
    pub fn new(
        db: DbPool,
        engine: Arc<E>,
        capture_events: mpsc::Receiver<CaptureEvent>,
        narrator: Narrator,
        identity: Arc<dyn IdentityProvider>,
    ) -> Self {
        let (ui_tx, _) = broadcast::channel(UI_EVENT_CAPACITY);

        Self {
            session: CookingSession::new(),
            controller: CaptureController::new(engine),
            narrator,
            identity,
            capture_events,
            snapshots: SessionStateRepo::new(db.clone()),
            history: HistoryRepo::new(db.clone()),
            users: UserRepo::new(db),
            ui_tx,
        }
    }

    /// Subscribe to state-change notifications
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<UiEvent> {
        self.ui_tx.subscribe()
    }

    /// The cooking session (read-only view for shells)
    #[must_use]
    pub const fn session(&self) -> &CookingSession {
        &self.session
    }

    /// Restore a prior cooking session for the signed-in user, if any
    ///
    /// Missing or malformed snapshots are treated as no prior session.
    pub fn restore_session(&mut self) {
        let auth = self.identity.current();
        let Some(user_id) = auth.user_id.filter(|_| auth.authenticated) else {
            return;
        };

        match self.snapshots.load(&user_id) {
            Ok(Some(snapshot)) => {
                let title = snapshot.recipe.title.clone();
                if self.session.restore(snapshot) {
                    self.emit(UiEvent::RecipeSelected { title });
                    self.emit_step_changed();
                }
            }
            Ok(None) => {}
            Err(e) => {
                tracing::warn!(error = %e, "failed to read saved session, starting fresh");
            }
        }
    }

    /// Select a recipe, narrating the confirmation
    pub fn select_recipe(&mut self, recipe: Recipe) {
        let title = recipe.title.clone();
        let authenticated = self.identity.current().authenticated;

        let confirmation = self.session.select_recipe(recipe, authenticated);
        self.narrator.speak(&confirmation);

        self.persist_if_authenticated();
        self.emit(UiEvent::RecipeSelected { title });
    }

    /// Begin voice-guided cooking
    ///
    /// Refusals (no recipe, guest user) are narrated, not errors.
    pub async fn start_voice(&mut self) {
        if self.session.active_recipe().is_none() {
            self.narrator
                .speak("Please select a recipe first to use the voice assistant.");
            return;
        }

        if !self.identity.current().authenticated {
            self.narrator.speak("Please sign in to use voice features.");
            return;
        }

        self.session.start_voice();
        self.controller.start().await;
        self.emit(UiEvent::ListeningChanged(true));

        // Read the current step so the user knows where they are
        if let Some(text) = self.session.current_step_text() {
            let text = text.to_string();
            self.narrator.speak(&text);
            self.emit_step_changed();
        }
    }

    /// End voice-guided cooking
    pub async fn stop_voice(&mut self) {
        self.controller.stop().await;
        self.session.stop_voice();
        self.narrator
            .speak("Voice assistant stopped. Click start voice to resume.");
        self.emit(UiEvent::ListeningChanged(false));
    }

    /// Run the event loop until the capture channel closes
    pub async fn run(&mut self) {
        let mut auth_rx = self.identity.subscribe();

        loop {
            tokio::select! {
                event = self.capture_events.recv() => {
                    let Some(event) = event else { break };

                    // listening_active tracks actual engine state
                    match &event {
                        CaptureEvent::Started => self.session.mark_listening(true),
                        CaptureEvent::Ended => self.session.mark_listening(false),
                        _ => {}
                    }

                    if let Some(transcript) = self.controller.handle_event(event).await {
                        self.handle_transcript(&transcript).await;
                    }
                }
                changed = auth_rx.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    let state = auth_rx.borrow_and_update().clone();
                    self.handle_auth_change(state).await;
                }
            }
        }

        tracing::debug!("assistant event loop finished");
    }

    /// Process one finalized transcript
    pub async fn handle_transcript(&mut self, transcript: &str) {
        self.emit(UiEvent::TranscriptHeard(transcript.to_string()));

        let Some(outcome) = interpret(transcript, &mut self.session) else {
            return;
        };

        self.narrator.speak(&outcome.utterance);
        self.emit(UiEvent::Status(outcome.status.clone()));

        if outcome.step_changed {
            self.persist_if_authenticated();
            self.emit_step_changed();
        }

        if outcome.completed {
            self.record_completion();
        }

        if outcome.voice_stopped {
            self.controller.stop().await;
            self.emit(UiEvent::ListeningChanged(false));
        }
    }

    /// React to a sign-in or sign-out
    async fn handle_auth_change(&mut self, state: AuthState) {
        if state.authenticated {
            if let Some(user_id) = &state.user_id {
                if let Err(e) = self
                    .users
                    .find_or_create(user_id, state.display_name.as_deref())
                {
                    tracing::warn!(error = %e, "failed to register user");
                }
            }
            self.restore_session();
        } else if self.session.voice_mode_enabled() {
            // Voice requires a signed-in user
            self.stop_voice().await;
        }
    }

    /// Save the session snapshot for signed-in users; guests are not
    /// persisted
    fn persist_if_authenticated(&self) {
        let auth = self.identity.current();
        let Some(user_id) = auth.user_id.filter(|_| auth.authenticated) else {
            return;
        };

        let Some(snapshot) = self.session.snapshot() else {
            return;
        };

        if let Err(e) = self.snapshots.save(&user_id, &snapshot) {
            tracing::warn!(error = %e, "failed to persist session");
        }
    }

    /// Record the finished recipe in the cooking history
    fn record_completion(&self) {
        let auth = self.identity.current();
        let (Some(user_id), Some(recipe)) = (
            auth.user_id.filter(|_| auth.authenticated),
            self.session.active_recipe(),
        ) else {
            return;
        };

        if let Err(e) = self.history.record(&user_id, recipe) {
            tracing::warn!(error = %e, "failed to record cooking history");
        }

        self.emit(UiEvent::Completed {
            title: recipe.title.clone(),
        });
    }

    fn emit_step_changed(&self) {
        if let Some(text) = self.session.current_step_text() {
            self.emit(UiEvent::StepChanged {
                index: self.session.current_step(),
                text: text.to_string(),
            });
        }
    }

    /// Best-effort notification; shells that lag or never subscribed
    /// are not an error
    fn emit(&self, event: UiEvent) {
        let _ = self.ui_tx.send(event);
    }
}
