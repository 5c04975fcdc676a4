//! Cooking history repository
//!
//! A completed-recipe log, written when the user acknowledges the
//! final step.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::DbPool;
use crate::recipe::Recipe;
use crate::{Error, Result};

/// One completed cooking session
#[derive(Debug, Clone)]
pub struct HistoryEntry {
    pub title: String,
    pub time: String,
    pub image: Option<String>,
    pub completed_at: DateTime<Utc>,
}

/// Cooking history repository
#[derive(Clone)]
pub struct HistoryRepo {
    pool: DbPool,
}

impl HistoryRepo {
    /// Create a new history repository
    #[must_use]
    #[allow(clippy::missing_const_for_fn)]
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Record a completed recipe
    ///
    /// # Errors
    ///
    /// Returns error if the database write fails
    pub fn record(&self, user_id: &str, recipe: &Recipe) -> Result<()> {
        let conn = self
            .pool
            .get()
            .map_err(|e| Error::Database(e.to_string()))?;

        let image = if recipe.image.is_empty() {
            None
        } else {
            Some(recipe.image.as_str())
        };

        conn.execute(
            "INSERT INTO cooking_history (id, user_id, title, time, image, completed_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            rusqlite::params![
                Uuid::new_v4().to_string(),
                user_id,
                recipe.title,
                recipe.time,
                image,
                Utc::now().to_rfc3339()
            ],
        )?;

        tracing::info!(user = user_id, recipe = %recipe.title, "cooking history recorded");
        Ok(())
    }

    /// Most recent completed recipes, newest first
    ///
    /// # Errors
    ///
    /// Returns error if the database read fails
    pub fn recent(&self, user_id: &str, limit: usize) -> Result<Vec<HistoryEntry>> {
        let conn = self
            .pool
            .get()
            .map_err(|e| Error::Database(e.to_string()))?;

        let mut stmt = conn.prepare(
            "SELECT title, time, image, completed_at FROM cooking_history
             WHERE user_id = ?1 ORDER BY completed_at DESC LIMIT ?2",
        )?;

        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let entries = stmt
            .query_map(rusqlite::params![user_id, limit], |row| {
                Ok(HistoryEntry {
                    title: row.get(0)?,
                    time: row.get(1)?,
                    image: row.get(2)?,
                    completed_at: parse_datetime(&row.get::<_, String>(3)?),
                })
            })?
            .filter_map(std::result::Result::ok)
            .collect();

        Ok(entries)
    }
}

fn parse_datetime(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s).map_or_else(|_| Utc::now(), |dt| dt.with_timezone(&Utc))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{UserRepo, init_memory};
    use crate::recipe::Difficulty;

    fn setup() -> HistoryRepo {
        let pool = init_memory().unwrap();
        UserRepo::new(pool.clone())
            .find_or_create("test-user", None)
            .unwrap();
        HistoryRepo::new(pool)
    }

    fn recipe(title: &str) -> Recipe {
        Recipe {
            id: None,
            title: title.to_string(),
            time: "30 mins".to_string(),
            difficulty: Difficulty::Easy,
            category: "Dinner".to_string(),
            image: "pot.jpg".to_string(),
            steps: vec!["Cook".to_string()],
            source_url: None,
            servings: None,
        }
    }

    #[test]
    fn test_record_and_recent() {
        let repo = setup();

        repo.record("test-user", &recipe("Khichdi")).unwrap();
        repo.record("test-user", &recipe("Upma")).unwrap();

        let recent = repo.recent("test-user", 5).unwrap();
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].image.as_deref(), Some("pot.jpg"));
    }

    #[test]
    fn test_recent_respects_limit() {
        let repo = setup();

        for i in 0..4 {
            repo.record("test-user", &recipe(&format!("Dish {i}"))).unwrap();
        }

        assert_eq!(repo.recent("test-user", 2).unwrap().len(), 2);
    }
}
