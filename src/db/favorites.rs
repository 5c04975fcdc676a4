//! Favorite recipes repository
//!
//! Favorites are keyed by recipe title within a user, matching the
//! catalog's uniqueness key.

use chrono::Utc;
use uuid::Uuid;

use super::DbPool;
use crate::recipe::Recipe;
use crate::{Error, Result};

/// Favorite recipes repository
#[derive(Clone)]
pub struct FavoriteRepo {
    pool: DbPool,
}

impl FavoriteRepo {
    /// Create a new favorites repository
    #[must_use]
    #[allow(clippy::missing_const_for_fn)]
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Add a recipe to the user's favorites (no-op if already present)
    ///
    /// # Errors
    ///
    /// Returns error if serialization or the database write fails
    pub fn add(&self, user_id: &str, recipe: &Recipe) -> Result<()> {
        let conn = self
            .pool
            .get()
            .map_err(|e| Error::Database(e.to_string()))?;

        let recipe_json = serde_json::to_string(recipe)?;

        conn.execute(
            "INSERT OR IGNORE INTO favorites (id, user_id, title, recipe_json, added_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            rusqlite::params![
                Uuid::new_v4().to_string(),
                user_id,
                recipe.title,
                recipe_json,
                Utc::now().to_rfc3339()
            ],
        )?;

        tracing::debug!(user = user_id, recipe = %recipe.title, "favorite added");
        Ok(())
    }

    /// Remove a recipe from the user's favorites
    ///
    /// # Errors
    ///
    /// Returns error if the database write fails
    pub fn remove(&self, user_id: &str, title: &str) -> Result<()> {
        let conn = self
            .pool
            .get()
            .map_err(|e| Error::Database(e.to_string()))?;

        conn.execute(
            "DELETE FROM favorites WHERE user_id = ?1 AND title = ?2",
            [user_id, title],
        )?;

        tracing::debug!(user = user_id, recipe = title, "favorite removed");
        Ok(())
    }

    /// Whether the user has favorited a recipe title
    ///
    /// # Errors
    ///
    /// Returns error if the database read fails
    pub fn is_favorite(&self, user_id: &str, title: &str) -> Result<bool> {
        let conn = self
            .pool
            .get()
            .map_err(|e| Error::Database(e.to_string()))?;

        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM favorites WHERE user_id = ?1 AND title = ?2",
            [user_id, title],
            |row| row.get(0),
        )?;

        Ok(count > 0)
    }

    /// Toggle a recipe's favorite status; returns true if now favorited
    ///
    /// # Errors
    ///
    /// Returns error if a database operation fails
    pub fn toggle(&self, user_id: &str, recipe: &Recipe) -> Result<bool> {
        if self.is_favorite(user_id, &recipe.title)? {
            self.remove(user_id, &recipe.title)?;
            Ok(false)
        } else {
            self.add(user_id, recipe)?;
            Ok(true)
        }
    }

    /// List the user's favorites, most recently added first
    ///
    /// Rows whose stored recipe no longer parses are skipped.
    ///
    /// # Errors
    ///
    /// Returns error if the database read fails
    pub fn list(&self, user_id: &str) -> Result<Vec<Recipe>> {
        let conn = self
            .pool
            .get()
            .map_err(|e| Error::Database(e.to_string()))?;

        let mut stmt = conn.prepare(
            "SELECT recipe_json FROM favorites WHERE user_id = ?1 ORDER BY added_at DESC",
        )?;

        let recipes = stmt
            .query_map([user_id], |row| row.get::<_, String>(0))?
            .filter_map(std::result::Result::ok)
            .filter_map(|json| match serde_json::from_str(&json) {
                Ok(recipe) => Some(recipe),
                Err(e) => {
                    tracing::warn!(user = user_id, error = %e, "skipping malformed favorite");
                    None
                }
            })
            .collect();

        Ok(recipes)
    }
}
