//! The active session: at most one API token is current at a time.

use rusqlite::{params, OptionalExtension};

use crate::database::Database;
use crate::error::Result;

impl Database {
    pub fn current_api_token(&self) -> Result<Option<String>> {
        let token = self
            .conn()?
            .query_row(
                "SELECT api_token FROM sessions WHERE active = 1 LIMIT 1",
                [],
                |row| row.get(0),
            )
            .optional()?;
        Ok(token)
    }

    /// Make `api_token` the current session, replacing any other.
    pub fn set_current_api_token(&self, api_token: &str) -> Result<()> {
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;
        tx.execute("DELETE FROM sessions", [])?;
        tx.execute(
            "INSERT INTO sessions (api_token, active) VALUES (?1, 1)",
            params![api_token],
        )?;
        tx.commit()?;
        Ok(())
    }

    pub fn clear_current_api_token(&self) -> Result<()> {
        self.conn()?.execute("DELETE FROM sessions", [])?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_round_trip_and_clear() {
        let db = Database::open_in_memory().unwrap();
        assert_eq!(db.current_api_token().unwrap(), None);

        db.set_current_api_token("first").unwrap();
        db.set_current_api_token("second").unwrap();
        assert_eq!(db.current_api_token().unwrap().as_deref(), Some("second"));

        db.clear_current_api_token().unwrap();
        assert_eq!(db.current_api_token().unwrap(), None);
    }
}
