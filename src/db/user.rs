//! User repository

use chrono::Utc;

use super::DbPool;
use crate::{Error, Result};

/// A known user
#[derive(Debug, Clone)]
pub struct User {
    pub id: String,
    pub display_name: Option<String>,
}

/// User repository
#[derive(Clone)]
pub struct UserRepo {
    pool: DbPool,
}

impl UserRepo {
    /// Create a new user repository
    #[must_use]
    #[allow(clippy::missing_const_for_fn)]
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Find a user by id, creating the row if needed
    ///
    /// # Errors
    ///
    /// Returns error if database operation fails
    pub fn find_or_create(&self, user_id: &str, display_name: Option<&str>) -> Result<User> {
        let conn = self
            .pool
            .get()
            .map_err(|e| Error::Database(e.to_string()))?;

        let existing: Option<User> = conn
            .query_row(
                "SELECT id, display_name FROM users WHERE id = ?1",
                [user_id],
                |row| {
                    Ok(User {
                        id: row.get(0)?,
                        display_name: row.get(1)?,
                    })
                },
            )
            .ok();

        if let Some(user) = existing {
            return Ok(user);
        }

        conn.execute(
            "INSERT INTO users (id, display_name, created_at) VALUES (?1, ?2, ?3)",
            rusqlite::params![user_id, display_name, Utc::now().to_rfc3339()],
        )?;

        Ok(User {
            id: user_id.to_string(),
            display_name: display_name.map(String::from),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::init_memory;

    #[test]
    fn test_find_or_create() {
        let repo = UserRepo::new(init_memory().unwrap());

        let user = repo.find_or_create("u-1", Some("Asha")).unwrap();
        assert_eq!(user.id, "u-1");
        assert_eq!(user.display_name.as_deref(), Some("Asha"));

        // Second call returns the same row
        let again = repo.find_or_create("u-1", None).unwrap();
        assert_eq!(again.display_name.as_deref(), Some("Asha"));
    }
}
