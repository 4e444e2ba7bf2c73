use std::path::Path;

use anyhow::{Context, Result};
use chrono::Local;
use rusqlite::{Connection, OptionalExtension, params};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::warn;

use crate::logbook::LogBook;
use crate::models::{BodyEntry, ExerciseEntry, FoodEntry, WaterEntry};
use crate::profile::{Profile, validate_profile_settings};

pub const PROFILE_KEY: &str = "profile";
pub const FOOD_LOGS_KEY: &str = "food_logs";
pub const EXERCISE_LOGS_KEY: &str = "exercise_logs";
pub const WEIGHT_LOGS_KEY: &str = "weight_logs";
pub const WATER_LOGS_KEY: &str = "water_logs";

/// SQLite-backed key/value store holding the profile and the four log
/// collections as JSON documents.
pub struct Store {
    conn: Connection,
}

impl Store {
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)
            .with_context(|| format!("Failed to open database: {}", path.display()))?;
        let store = Store { conn };
        store.migrate()?;
        Ok(store)
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let store = Store { conn };
        store.migrate()?;
        Ok(store)
    }

    fn migrate(&self) -> Result<()> {
        let version: i64 = self
            .conn
            .pragma_query_value(None, "user_version", |row| row.get(0))?;

        if version < 1 {
            self.conn.execute_batch(
                "CREATE TABLE IF NOT EXISTS collections (
                    key TEXT PRIMARY KEY,
                    value TEXT NOT NULL,
                    updated_at TEXT NOT NULL
                );

                PRAGMA user_version = 1;",
            )?;
        }

        Ok(())
    }

    pub fn get_raw(&self, key: &str) -> Result<Option<String>> {
        let value = self
            .conn
            .query_row(
                "SELECT value FROM collections WHERE key = ?1",
                params![key],
                |row| row.get(0),
            )
            .optional()?;
        Ok(value)
    }

    pub fn put_raw(&self, key: &str, value: &str) -> Result<()> {
        let now = Local::now().to_rfc3339();
        self.conn.execute(
            "INSERT INTO collections (key, value, updated_at) VALUES (?1, ?2, ?3)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
            params![key, value, now],
        )?;
        Ok(())
    }

    fn put<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<()> {
        let json = serde_json::to_string(value)
            .with_context(|| format!("Failed to serialize {key}"))?;
        self.put_raw(key, &json)
    }

    /// Load one collection. A missing key gives the default; a value that does
    /// not parse is logged and also replaced by the default, so one corrupt
    /// collection never blocks the others.
    fn load_or_default<T: DeserializeOwned + Default>(&self, key: &str) -> Result<T> {
        let Some(raw) = self.get_raw(key)? else {
            return Ok(T::default());
        };
        match serde_json::from_str(&raw) {
            Ok(value) => Ok(value),
            Err(e) => {
                warn!(key, error = %e, "stored collection is malformed, using default");
                Ok(T::default())
            }
        }
    }

    pub fn load_profile(&self) -> Result<Profile> {
        let profile: Profile = self.load_or_default(PROFILE_KEY)?;
        if let Err(e) = validate_profile_settings(profile.settings()) {
            warn!(error = %e, "stored profile has invalid values, using default");
            return Ok(Profile::default());
        }
        Ok(profile)
    }

    /// Load the profile and all four logs, each independently.
    pub fn load_state(&self) -> Result<(Profile, LogBook)> {
        let profile = self.load_profile()?;
        let logs = LogBook {
            food: self.load_or_default(FOOD_LOGS_KEY)?,
            exercise: self.load_or_default(EXERCISE_LOGS_KEY)?,
            water: self.load_or_default(WATER_LOGS_KEY)?,
            body: self.load_or_default(WEIGHT_LOGS_KEY)?,
        };
        Ok((profile, logs))
    }

    pub fn save_profile(&self, profile: &Profile) -> Result<()> {
        self.put(PROFILE_KEY, profile)
    }

    pub fn save_food(&self, entries: &[FoodEntry]) -> Result<()> {
        self.put(FOOD_LOGS_KEY, entries)
    }

    pub fn save_exercise(&self, entries: &[ExerciseEntry]) -> Result<()> {
        self.put(EXERCISE_LOGS_KEY, entries)
    }

    pub fn save_water(&self, entries: &[WaterEntry]) -> Result<()> {
        self.put(WATER_LOGS_KEY, entries)
    }

    pub fn save_body(&self, entries: &[BodyEntry]) -> Result<()> {
        self.put(WEIGHT_LOGS_KEY, entries)
    }

    pub fn save_logs(&self, logs: &LogBook) -> Result<()> {
        self.save_food(&logs.food)?;
        self.save_exercise(&logs.exercise)?;
        self.save_water(&logs.water)?;
        self.save_body(&logs.body)
    }
}
