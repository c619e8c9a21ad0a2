//! SQLite-based break history and statistics.
//!
//! Provides persistent storage for:
//! - Completed breaks (kind, actual length, timestamps)
//! - Daily and all-time statistics
//! - Key-value store for application state (the planner snapshot
//!   between CLI invocations lives here)

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection};
use serde::{Deserialize, Serialize};

use crate::error::StoreError;
use crate::events::Event;
use crate::settings::BreakKind;

use super::data_dir;

/// kv marker holding the kind and start time of the break currently
/// open, consumed by the matching finish event.
const BREAK_STARTED_KEY: &str = "break_started";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BreakRecord {
    pub id: i64,
    pub kind: String,
    pub duration_sec: u64,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Stats {
    pub total_breaks: u64,
    pub total_microbreaks: u64,
    pub total_long_breaks: u64,
    pub total_break_sec: u64,
    pub today_breaks: u64,
    pub today_break_sec: u64,
}

/// SQLite database for break history.
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open the database at `~/.config/breakroom/breakroom.db`.
    ///
    /// Creates the database file and schema if they don't exist.
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened or migrated.
    pub fn open() -> Result<Self, StoreError> {
        let path = data_dir()?.join("breakroom.db");
        let conn = Connection::open(&path)
            .map_err(|source| StoreError::OpenFailed { path, source })?;
        let db = Self { conn };
        db.migrate()?;
        Ok(db)
    }

    /// Open an in-memory database (for tests).
    pub fn open_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()?;
        let db = Self { conn };
        db.migrate()?;
        Ok(db)
    }

    fn migrate(&self) -> Result<(), StoreError> {
        self.conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS breaks (
                id           INTEGER PRIMARY KEY AUTOINCREMENT,
                kind         TEXT NOT NULL,
                duration_sec INTEGER NOT NULL,
                started_at   TEXT NOT NULL,
                finished_at  TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS kv (
                key   TEXT PRIMARY KEY,
                value TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_breaks_finished_at ON breaks(finished_at);
            CREATE INDEX IF NOT EXISTS idx_breaks_kind ON breaks(kind);",
        )?;
        Ok(())
    }

    /// Record a completed break.
    ///
    /// # Errors
    /// Returns an error if the insert fails.
    pub fn record_break(
        &self,
        kind: BreakKind,
        duration_sec: u64,
        started_at: DateTime<Utc>,
        finished_at: DateTime<Utc>,
    ) -> Result<i64, StoreError> {
        self.conn.execute(
            "INSERT INTO breaks (kind, duration_sec, started_at, finished_at)
             VALUES (?1, ?2, ?3, ?4)",
            params![
                kind_str(kind),
                duration_sec,
                started_at.to_rfc3339(),
                finished_at.to_rfc3339(),
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    /// Feed a drained lifecycle event into the break history: a start
    /// stamps the kv marker, the matching finish turns it into a
    /// `breaks` row. Other events are ignored.
    pub fn record_break_event(&self, event: &Event) -> Result<(), StoreError> {
        match event {
            Event::StartMicrobreak { at, .. } => self.note_break_started(BreakKind::Mini, *at),
            Event::StartBreak { at, .. } => self.note_break_started(BreakKind::Long, *at),
            Event::FinishMicrobreak { at, .. } => self.finish_started_break(BreakKind::Mini, *at),
            Event::FinishBreak { at, .. } => self.finish_started_break(BreakKind::Long, *at),
            _ => Ok(()),
        }
    }

    fn note_break_started(
        &self,
        kind: BreakKind,
        at: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        self.kv_set(
            BREAK_STARTED_KEY,
            &format!("{} {}", kind_str(kind), at.to_rfc3339()),
        )
    }

    fn finish_started_break(
        &self,
        kind: BreakKind,
        finished_at: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        let Some(marker) = self.kv_get(BREAK_STARTED_KEY)? else {
            tracing::warn!(?kind, "finish event without a recorded start");
            return Ok(());
        };
        self.kv_delete(BREAK_STARTED_KEY)?;
        let Some((started_kind, started_at)) = marker.split_once(' ') else {
            return Err(StoreError::InvalidValue(marker));
        };
        if started_kind != kind_str(kind) {
            tracing::warn!(?kind, started_kind, "finish event for a different break kind");
            return Ok(());
        }
        let started_at = DateTime::parse_from_rfc3339(started_at)
            .map_err(|e| StoreError::InvalidValue(e.to_string()))?
            .with_timezone(&Utc);
        let duration_sec = (finished_at - started_at).num_seconds().max(0) as u64;
        self.record_break(kind, duration_sec, started_at, finished_at)?;
        Ok(())
    }

    pub fn stats_all(&self) -> Result<Stats, StoreError> {
        let mut stmt = self.conn.prepare(
            "SELECT kind, COUNT(*), COALESCE(SUM(duration_sec), 0)
             FROM breaks
             GROUP BY kind",
        )?;

        let mut stats = Stats::default();
        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, u64>(1)?,
                row.get::<_, u64>(2)?,
            ))
        })?;

        for row in rows {
            let (kind, count, seconds) = row?;
            stats.total_breaks += count;
            stats.total_break_sec += seconds;
            match kind.as_str() {
                "mini" => stats.total_microbreaks += count,
                "long" => stats.total_long_breaks += count,
                _ => {}
            }
        }

        let today = Utc::now().format("%Y-%m-%d").to_string();
        let mut stmt2 = self.conn.prepare(
            "SELECT COUNT(*), COALESCE(SUM(duration_sec), 0)
             FROM breaks
             WHERE finished_at >= ?1",
        )?;
        let row = stmt2.query_row(params![format!("{today}T00:00:00+00:00")], |row| {
            Ok((row.get::<_, u64>(0)?, row.get::<_, u64>(1)?))
        })?;
        stats.today_breaks = row.0;
        stats.today_break_sec = row.1;

        Ok(stats)
    }

    /// Most recent breaks, newest first.
    pub fn recent_breaks(&self, limit: u32) -> Result<Vec<BreakRecord>, StoreError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, kind, duration_sec, started_at, finished_at
             FROM breaks
             ORDER BY finished_at DESC
             LIMIT ?1",
        )?;
        let rows = stmt.query_map(params![limit], |row| {
            Ok((
                row.get::<_, i64>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, u64>(2)?,
                row.get::<_, String>(3)?,
                row.get::<_, String>(4)?,
            ))
        })?;

        let mut records = Vec::new();
        for row in rows {
            let (id, kind, duration_sec, started_at, finished_at) = row?;
            let parse = |s: &str| {
                DateTime::parse_from_rfc3339(s)
                    .map(|dt| dt.with_timezone(&Utc))
                    .map_err(|e| StoreError::InvalidValue(e.to_string()))
            };
            records.push(BreakRecord {
                id,
                kind,
                duration_sec,
                started_at: parse(&started_at)?,
                finished_at: parse(&finished_at)?,
            });
        }
        Ok(records)
    }

    /// Get a value from the kv store.
    pub fn kv_get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let mut stmt = self.conn.prepare("SELECT value FROM kv WHERE key = ?1")?;
        let result = stmt.query_row(params![key], |row| row.get::<_, String>(0));
        match result {
            Ok(v) => Ok(Some(v)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Set a value in the kv store.
    pub fn kv_set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.conn.execute(
            "INSERT OR REPLACE INTO kv (key, value) VALUES (?1, ?2)",
            params![key, value],
        )?;
        Ok(())
    }

    /// Remove a key from the kv store. No-op if absent.
    pub fn kv_delete(&self, key: &str) -> Result<(), StoreError> {
        self.conn
            .execute("DELETE FROM kv WHERE key = ?1", params![key])?;
        Ok(())
    }
}

fn kind_str(kind: BreakKind) -> &'static str {
    match kind {
        BreakKind::Mini => "mini",
        BreakKind::Long => "long",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn record_and_query() {
        let db = Database::open_memory().unwrap();
        let now = Utc::now();
        db.record_break(BreakKind::Mini, 20, now, now).unwrap();
        db.record_break(BreakKind::Long, 300, now, now).unwrap();
        let stats = db.stats_all().unwrap();
        assert_eq!(stats.total_breaks, 2);
        assert_eq!(stats.total_microbreaks, 1);
        assert_eq!(stats.total_long_breaks, 1);
        assert_eq!(stats.total_break_sec, 320);
        assert_eq!(stats.today_breaks, 2);
    }

    #[test]
    fn start_and_finish_events_produce_a_row() {
        let db = Database::open_memory().unwrap();
        let started = Utc::now();
        let finished = started + Duration::seconds(18);
        db.record_break_event(&Event::StartMicrobreak {
            duration_ms: 20_000,
            postponable: true,
            strict: false,
            at: started,
        })
        .unwrap();
        db.record_break_event(&Event::FinishMicrobreak {
            should_play_sound: true,
            should_plan_next: true,
            at: finished,
        })
        .unwrap();

        let records = db.recent_breaks(10).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].kind, "mini");
        assert_eq!(records[0].duration_sec, 18);
        // Marker consumed; a lone finish records nothing more.
        db.record_break_event(&Event::FinishMicrobreak {
            should_play_sound: true,
            should_plan_next: true,
            at: finished,
        })
        .unwrap();
        assert_eq!(db.recent_breaks(10).unwrap().len(), 1);
    }

    #[test]
    fn non_lifecycle_events_are_ignored() {
        let db = Database::open_memory().unwrap();
        db.record_break_event(&Event::UpdateStatus { at: Utc::now() })
            .unwrap();
        db.record_break_event(&Event::ResumeBreaks { at: Utc::now() })
            .unwrap();
        assert_eq!(db.stats_all().unwrap().total_breaks, 0);
    }

    #[test]
    fn recent_breaks_newest_first() {
        let db = Database::open_memory().unwrap();
        let now = Utc::now();
        let earlier = now - Duration::hours(1);
        db.record_break(BreakKind::Mini, 20, earlier, earlier).unwrap();
        db.record_break(BreakKind::Long, 300, now, now).unwrap();
        let records = db.recent_breaks(10).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].kind, "long");
        assert_eq!(records[1].kind, "mini");
    }

    #[test]
    fn kv_store() {
        let db = Database::open_memory().unwrap();
        assert!(db.kv_get("test").unwrap().is_none());
        db.kv_set("test", "hello").unwrap();
        assert_eq!(db.kv_get("test").unwrap().unwrap(), "hello");
        db.kv_delete("test").unwrap();
        assert!(db.kv_get("test").unwrap().is_none());
    }
}
