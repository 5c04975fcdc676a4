//! Sous Voice - voice-guided cooking assistant
//!
//! This library provides the core of the assistant:
//! - Voice command interpretation over recipe steps
//! - The cooking session state machine and its persistence
//! - Continuous speech capture with auto-restart
//! - Narration with interrupt-and-replace
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────┐
//! │                    UI Shells                         │
//! │        CLI  │  Web  │  ...  (UiEvent subscribers)   │
//! └────────────────────┬────────────────────────────────┘
//!                      │
//! ┌────────────────────▼────────────────────────────────┐
//! │                   Assistant                          │
//! │  Session  │  Interpreter  │  Controller  │ Narrator │
//! └────────────────────┬────────────────────────────────┘
//!                      │
//! ┌────────────────────▼────────────────────────────────┐
//! │             External collaborators                   │
//! │  Mic/STT  │  TTS  │  Catalog  │  Search  │  SQLite  │
//! └─────────────────────────────────────────────────────┘
//! ```

pub mod assistant;
pub mod catalog;
pub mod command;
pub mod config;
pub mod db;
pub mod error;
pub mod identity;
pub mod recipe;
pub mod search;
pub mod session;
pub mod voice;

pub use assistant::{Assistant, UiEvent};
pub use command::{CommandIntent, Interpretation, extract_step_number, interpret, matches};
pub use config::Config;
pub use db::{DbConn, DbPool};
pub use error::{Error, Result};
pub use identity::{AuthState, IdentityProvider, LocalIdentity};
pub use recipe::{Difficulty, PLACEHOLDER_STEP, Recipe};
pub use search::{CatalogFilter, RecipeSearch, filter_catalog};
pub use session::{CookingSession, SessionSnapshot};
