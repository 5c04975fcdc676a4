//! Assistant end-to-end tests
//!
//! Drives the full stack (session, interpreter, controller, narrator,
//! persistence) with doubles for the capture engine and speech sink.

use std::sync::Arc;

use tokio::sync::mpsc;

use sous_voice::db::{self, DbPool, HistoryRepo, SessionStateRepo, UserRepo};
use sous_voice::voice::{Narrator, SpeechSink};
use sous_voice::{Assistant, AuthState, IdentityProvider, LocalIdentity};

mod common;

use common::{RecordingSink, ScriptedEngine, pasta};

struct Harness {
    assistant: Assistant<ScriptedEngine>,
    engine: Arc<ScriptedEngine>,
    sink: Arc<RecordingSink>,
    pool: DbPool,
    identity: Arc<LocalIdentity>,
    /// Keeps the capture channel open so `run()` does not exit early
    _event_tx: mpsc::Sender<sous_voice::voice::CaptureEvent>,
}

fn harness(auth: AuthState) -> Harness {
    let pool = db::init_memory().unwrap();

    if let Some(user_id) = &auth.user_id {
        UserRepo::new(pool.clone())
            .find_or_create(user_id, auth.display_name.as_deref())
            .unwrap();
    }

    let identity = Arc::new(LocalIdentity::new(auth));
    let engine = Arc::new(ScriptedEngine::default());
    let sink = Arc::new(RecordingSink::default());
    let (event_tx, event_rx) = mpsc::channel(16);

    let assistant = Assistant::new(
        pool.clone(),
        Arc::clone(&engine),
        event_rx,
        Narrator::new(Arc::clone(&sink) as Arc<dyn SpeechSink>),
        Arc::clone(&identity) as Arc<dyn IdentityProvider>,
    );

    Harness {
        assistant,
        engine,
        sink,
        pool,
        identity,
        _event_tx: event_tx,
    }
}

fn signed_in() -> AuthState {
    AuthState::signed_in("cook-1", Some("Asha".to_string()))
}

/// Let spawned narration tasks record their utterances
async fn settle() {
    for _ in 0..4 {
        tokio::task::yield_now().await;
    }
}

#[tokio::test]
async fn test_selection_narrates_start_prompt_when_signed_in() {
    let mut h = harness(signed_in());

    h.assistant.select_recipe(pasta());
    settle().await;

    let spoken = h.sink.last_spoken().unwrap();
    assert!(spoken.contains("You selected Pasta"));
    assert!(spoken.contains("start voice"));
}

#[tokio::test]
async fn test_selection_tells_guests_to_sign_in() {
    let mut h = harness(AuthState::guest());

    h.assistant.select_recipe(pasta());
    settle().await;

    let spoken = h.sink.last_spoken().unwrap();
    assert!(spoken.contains("sign in"));
}

#[tokio::test]
async fn test_guests_cannot_start_voice() {
    let mut h = harness(AuthState::guest());
    h.assistant.select_recipe(pasta());

    h.assistant.start_voice().await;
    settle().await;

    assert_eq!(h.engine.start_count(), 0);
    assert!(!h.assistant.session().listening_active());
    assert!(h.sink.last_spoken().unwrap().contains("sign in"));
}

#[tokio::test]
async fn test_voice_requires_a_selected_recipe() {
    let mut h = harness(signed_in());

    h.assistant.start_voice().await;
    settle().await;

    assert_eq!(h.engine.start_count(), 0);
    assert!(
        h.sink
            .last_spoken()
            .unwrap()
            .contains("select a recipe first")
    );
}

#[tokio::test]
async fn test_start_voice_reads_the_current_step() {
    let mut h = harness(signed_in());
    h.assistant.select_recipe(pasta());

    h.assistant.start_voice().await;
    settle().await;

    assert_eq!(h.engine.start_count(), 1);
    assert!(h.assistant.session().listening_active());
    assert_eq!(h.sink.last_spoken().as_deref(), Some("Boil water"));
}

#[tokio::test]
async fn test_full_cooking_flow_persists_and_records_history() {
    let mut h = harness(signed_in());
    h.assistant.select_recipe(pasta());
    h.assistant.start_voice().await;

    h.assistant.handle_transcript("next").await;
    settle().await;
    assert_eq!(h.assistant.session().current_step(), 1);
    assert_eq!(h.sink.last_spoken().as_deref(), Some("Add pasta"));

    // The step change was persisted for the signed-in user
    let saved = SessionStateRepo::new(h.pool.clone())
        .load("cook-1")
        .unwrap()
        .unwrap();
    assert_eq!(saved.step, 1);
    assert_eq!(saved.recipe.title, "Pasta");

    h.assistant.handle_transcript("next").await;
    h.assistant.handle_transcript("next").await;
    settle().await;

    // Completion stops the capture and logs history
    assert!(!h.assistant.session().voice_mode_enabled());
    assert_eq!(h.engine.stop_count(), 1);
    assert!(h.sink.last_spoken().unwrap().contains("done"));

    let history = HistoryRepo::new(h.pool.clone()).recent("cook-1", 5).unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].title, "Pasta");
}

#[tokio::test]
async fn test_transcripts_before_start_are_ignored() {
    let mut h = harness(signed_in());
    h.assistant.select_recipe(pasta());

    h.assistant.handle_transcript("next").await;
    assert_eq!(h.assistant.session().current_step(), 0);
}

#[tokio::test]
async fn test_session_restores_across_assistants() {
    let auth = signed_in();

    // First assistant: cook up to step 2, sharing one database
    let mut h = harness(auth.clone());
    h.assistant.select_recipe(pasta());
    h.assistant.start_voice().await;
    h.assistant.handle_transcript("go to step 2").await;
    settle().await;

    // Second assistant over the same database restores the snapshot
    let identity = Arc::new(LocalIdentity::new(auth));
    let engine = Arc::new(ScriptedEngine::default());
    let sink = Arc::new(RecordingSink::default());
    let (_tx, rx) = mpsc::channel(16);
    let mut restored = Assistant::new(
        h.pool.clone(),
        engine,
        rx,
        Narrator::new(sink as Arc<dyn SpeechSink>),
        identity as Arc<dyn IdentityProvider>,
    );

    restored.restore_session();

    assert_eq!(restored.session().current_step(), 1);
    assert_eq!(
        restored.session().active_recipe().unwrap().title,
        "Pasta"
    );
    // Restored sessions come back with voice off
    assert!(!restored.session().voice_mode_enabled());
}

#[tokio::test]
async fn test_guest_sessions_are_not_persisted() {
    let mut h = harness(AuthState::guest());
    h.assistant.select_recipe(pasta());

    // Force the session along without voice (guests cannot listen),
    // then check nothing was written
    let repo = SessionStateRepo::new(h.pool.clone());
    assert!(repo.load("cook-1").unwrap().is_none());
}

#[tokio::test]
async fn test_sign_out_mid_session_stops_voice() {
    let mut h = harness(signed_in());
    h.assistant.select_recipe(pasta());
    h.assistant.start_voice().await;
    assert!(h.assistant.session().listening_active());

    // Sign out while the event loop is running, then give it a moment
    // to observe the change
    let identity = Arc::clone(&h.identity);
    tokio::select! {
        () = h.assistant.run() => {}
        () = async {
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
            identity.sign_out();
            tokio::time::sleep(std::time::Duration::from_millis(50)).await;
        } => {}
    }

    assert!(!h.assistant.session().voice_mode_enabled());
    assert_eq!(h.engine.stop_count(), 1);
}

#[tokio::test]
async fn test_stop_command_ends_listening() {
    let mut h = harness(signed_in());
    h.assistant.select_recipe(pasta());
    h.assistant.start_voice().await;

    h.assistant.handle_transcript("stop").await;
    settle().await;

    assert!(!h.assistant.session().voice_mode_enabled());
    assert_eq!(h.engine.stop_count(), 1);
    assert_eq!(h.sink.last_spoken().as_deref(), Some("Voice mode stopped."));
}
