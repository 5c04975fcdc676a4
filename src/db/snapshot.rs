//! Saved cooking session repository
//!
//! One snapshot per user, overwritten on every step change. A missing
//! or malformed row loads as "no prior session"; it is never an error
//! the caller has to handle.

use chrono::Utc;

use super::DbPool;
use crate::session::SessionSnapshot;
use crate::{Error, Result};

/// Saved cooking session repository
#[derive(Clone)]
pub struct SessionStateRepo {
    pool: DbPool,
}

impl SessionStateRepo {
    /// Create a new session state repository
    #[must_use]
    #[allow(clippy::missing_const_for_fn)]
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Save (or replace) the user's cooking session snapshot
    ///
    /// # Errors
    ///
    /// Returns error if serialization or the database write fails
    pub fn save(&self, user_id: &str, snapshot: &SessionSnapshot) -> Result<()> {
        let conn = self
            .pool
            .get()
            .map_err(|e| Error::Database(e.to_string()))?;

        let recipe_json = serde_json::to_string(&snapshot.recipe)?;
        let step = i64::try_from(snapshot.step).unwrap_or(0);

        conn.execute(
            "INSERT INTO cooking_sessions (user_id, recipe_json, step_index, updated_at)
             VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT(user_id) DO UPDATE SET
                recipe_json = excluded.recipe_json,
                step_index = excluded.step_index,
                updated_at = excluded.updated_at",
            rusqlite::params![user_id, recipe_json, step, Utc::now().to_rfc3339()],
        )?;

        tracing::debug!(user = user_id, step = snapshot.step, "session snapshot saved");
        Ok(())
    }

    /// Load the user's saved cooking session, if any
    ///
    /// Malformed rows are treated as absence of a prior session:
    /// logged, cleared from the store, and reported as `Ok(None)`.
    ///
    /// # Errors
    ///
    /// Returns error only if the database read itself fails
    pub fn load(&self, user_id: &str) -> Result<Option<SessionSnapshot>> {
        let conn = self
            .pool
            .get()
            .map_err(|e| Error::Database(e.to_string()))?;

        let row: Option<(String, i64)> = conn
            .query_row(
                "SELECT recipe_json, step_index FROM cooking_sessions WHERE user_id = ?1",
                [user_id],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .ok();

        // Release the connection before `clear` checks one out again
        drop(conn);

        let Some((recipe_json, step)) = row else {
            return Ok(None);
        };

        let recipe = match serde_json::from_str(&recipe_json) {
            Ok(recipe) => recipe,
            Err(e) => {
                tracing::warn!(user = user_id, error = %e, "discarding malformed session snapshot");
                self.clear(user_id)?;
                return Ok(None);
            }
        };

        let Ok(step) = usize::try_from(step) else {
            tracing::warn!(user = user_id, step, "discarding snapshot with negative step index");
            self.clear(user_id)?;
            return Ok(None);
        };

        Ok(Some(SessionSnapshot { recipe, step }))
    }

    /// Delete the user's saved session
    ///
    /// # Errors
    ///
    /// Returns error if the database write fails
    pub fn clear(&self, user_id: &str) -> Result<()> {
        let conn = self
            .pool
            .get()
            .map_err(|e| Error::Database(e.to_string()))?;

        conn.execute("DELETE FROM cooking_sessions WHERE user_id = ?1", [user_id])?;
        Ok(())
    }
}
