//! The single-row `settings` table.

use punchclock_shared::constants::UPDATE_CHANNELS;
use rusqlite::params;

use crate::database::Database;
use crate::error::{Result, StoreError};
use crate::models::{Proxy, Settings};
use crate::records::{flag, int, text};

impl Database {
    pub fn load_settings(&self) -> Result<Settings> {
        self.conn()?
            .query_row(
                "SELECT use_proxy, proxy_host, proxy_port, proxy_username, proxy_password,
                        use_idle_detection
                 FROM settings
                 ORDER BY local_id
                 LIMIT 1",
                [],
                |row| {
                    Ok(Settings {
                        use_proxy: flag(row, 0)?,
                        proxy: Proxy {
                            host: text(row, 1)?,
                            port: u16::try_from(int(row, 2)?).unwrap_or(0),
                            username: text(row, 3)?,
                            password: text(row, 4)?,
                        },
                        use_idle_detection: flag(row, 5)?,
                    })
                },
            )
            .map_err(|e| match e {
                rusqlite::Error::QueryReturnedNoRows => StoreError::NotFound,
                other => StoreError::Sqlite(other),
            })
    }

    pub fn save_settings(&self, settings: &Settings) -> Result<()> {
        self.conn()?.execute(
            "UPDATE settings
             SET use_proxy = ?1, proxy_host = ?2, proxy_port = ?3, proxy_username = ?4,
                 proxy_password = ?5, use_idle_detection = ?6",
            params![
                settings.use_proxy,
                settings.proxy.host,
                settings.proxy.port,
                settings.proxy.username,
                settings.proxy.password,
                settings.use_idle_detection,
            ],
        )?;
        Ok(())
    }

    pub fn load_update_channel(&self) -> Result<String> {
        self.conn()?
            .query_row(
                "SELECT update_channel FROM settings ORDER BY local_id LIMIT 1",
                [],
                |row| row.get(0),
            )
            .map_err(|e| match e {
                rusqlite::Error::QueryReturnedNoRows => StoreError::NotFound,
                other => StoreError::Sqlite(other),
            })
    }

    /// Accepts only the channels in [`UPDATE_CHANNELS`].
    pub fn save_update_channel(&self, channel: &str) -> Result<()> {
        if !UPDATE_CHANNELS.contains(&channel) {
            return Err(StoreError::InvalidUpdateChannel(channel.to_string()));
        }
        self.conn()?
            .execute("UPDATE settings SET update_channel = ?1", params![channel])?;
        tracing::info!(channel, "update channel changed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_seeded() {
        let db = Database::open_in_memory().unwrap();

        assert_eq!(db.load_settings().unwrap(), Settings::default());
        assert_eq!(db.load_update_channel().unwrap(), "stable");
    }

    #[test]
    fn settings_round_trip() {
        let db = Database::open_in_memory().unwrap();
        let settings = Settings {
            use_proxy: true,
            proxy: Proxy {
                host: "proxy.local".into(),
                port: 3128,
                username: "me".into(),
                password: "secret".into(),
            },
            use_idle_detection: false,
        };

        db.save_settings(&settings).unwrap();
        assert_eq!(db.load_settings().unwrap(), settings);
    }

    #[test]
    fn update_channel_is_validated() {
        let db = Database::open_in_memory().unwrap();

        db.save_update_channel("beta").unwrap();
        assert_eq!(db.load_update_channel().unwrap(), "beta");

        let err = db.save_update_channel("nightly").unwrap_err();
        assert!(matches!(err, StoreError::InvalidUpdateChannel(_)));
        assert_eq!(db.load_update_channel().unwrap(), "beta");
    }
}
