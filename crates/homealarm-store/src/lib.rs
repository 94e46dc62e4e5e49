//! SQLite persistence for alarm state, sensors and the alarm history journal.

use std::path::Path;

use chrono::{DateTime, Utc};
use homealarm_core::{
    AlarmStatus, ArmingStatus, ParseEnumError, RepositoryError, SecurityRepository, Sensor, SensorId,
};
use rusqlite::{params, Connection, OptionalExtension};
use serde::Serialize;
use thiserror::Error;

const KEY_ALARM_STATUS: &str = "alarm_status";
const KEY_ARMING_STATUS: &str = "arming_status";
const KEY_CAT_DETECTED: &str = "cat_detected";

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS sensors (
    id TEXT PRIMARY KEY,
    name TEXT NOT NULL,
    sensor_type TEXT NOT NULL,
    active INTEGER NOT NULL DEFAULT 0
);
CREATE TABLE IF NOT EXISTS settings (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL
);
CREATE TABLE IF NOT EXISTS alarm_history (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    ts TEXT NOT NULL,
    from_status TEXT NOT NULL,
    to_status TEXT NOT NULL
);
";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("corrupt row: {0}")]
    Corrupt(String),
}

impl From<ParseEnumError> for StoreError {
    fn from(e: ParseEnumError) -> Self { StoreError::Corrupt(e.to_string()) }
}

impl From<StoreError> for RepositoryError {
    fn from(e: StoreError) -> Self { RepositoryError::Backend(e.to_string()) }
}

/// One alarm status transition.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistoryEntry {
    pub ts: DateTime<Utc>,
    pub from: AlarmStatus,
    pub to: AlarmStatus,
}

pub struct SqliteSecurityRepository {
    conn: Connection,
}

impl SqliteSecurityRepository {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref();
        log::debug!("opening store at {}", path.display());
        Self::init(Connection::open(path)?)
    }

    pub fn open_in_memory() -> Result<Self, StoreError> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self, StoreError> {
        conn.execute_batch(SCHEMA)?;
        Ok(Self { conn })
    }

    /// Most recent transitions first.
    pub fn history(&self, limit: usize) -> Result<Vec<HistoryEntry>, StoreError> {
        let mut stmt = self.conn.prepare(
            "SELECT ts, from_status, to_status FROM alarm_history ORDER BY id DESC LIMIT ?1",
        )?;
        let rows = stmt.query_map(params![i64::try_from(limit).unwrap_or(i64::MAX)], |r| {
            Ok((r.get::<_, String>(0)?, r.get::<_, String>(1)?, r.get::<_, String>(2)?))
        })?;
        let mut out = Vec::new();
        for row in rows {
            let (ts, from, to) = row?;
            let ts = DateTime::parse_from_rfc3339(&ts)
                .map_err(|e| StoreError::Corrupt(format!("timestamp {ts}: {e}")))?
                .with_timezone(&Utc);
            out.push(HistoryEntry { ts, from: from.parse()?, to: to.parse()? });
        }
        Ok(out)
    }

    fn setting(conn: &Connection, key: &str) -> Result<Option<String>, StoreError> {
        Ok(conn
            .query_row("SELECT value FROM settings WHERE key = ?1", params![key], |r| r.get(0))
            .optional()?)
    }

    fn put_setting(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.conn.execute(
            "INSERT OR REPLACE INTO settings (key, value) VALUES (?1, ?2)",
            params![key, value],
        )?;
        Ok(())
    }

    fn alarm_status_in(conn: &Connection) -> Result<AlarmStatus, StoreError> {
        match Self::setting(conn, KEY_ALARM_STATUS)? {
            Some(v) => Ok(v.parse()?),
            None => Ok(AlarmStatus::default()),
        }
    }

    fn current_arming_status(&self) -> Result<ArmingStatus, StoreError> {
        match Self::setting(&self.conn, KEY_ARMING_STATUS)? {
            Some(v) => Ok(v.parse()?),
            None => Ok(ArmingStatus::default()),
        }
    }

    fn write_alarm_status(&mut self, status: AlarmStatus) -> Result<(), StoreError> {
        let tx = self.conn.transaction()?;
        let previous = Self::alarm_status_in(&tx)?;
        tx.execute(
            "INSERT OR REPLACE INTO settings (key, value) VALUES (?1, ?2)",
            params![KEY_ALARM_STATUS, status.as_str()],
        )?;
        if previous != status {
            tx.execute(
                "INSERT INTO alarm_history (ts, from_status, to_status) VALUES (?1, ?2, ?3)",
                params![Utc::now().to_rfc3339(), previous.as_str(), status.as_str()],
            )?;
        }
        tx.commit()?;
        Ok(())
    }

    fn load_sensors(&self) -> Result<Vec<Sensor>, StoreError> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, name, sensor_type, active FROM sensors ORDER BY name, id")?;
        let rows = stmt.query_map([], |r| {
            Ok((
                r.get::<_, String>(0)?,
                r.get::<_, String>(1)?,
                r.get::<_, String>(2)?,
                r.get::<_, bool>(3)?,
            ))
        })?;
        let mut out = Vec::new();
        for row in rows {
            let (id, name, sensor_type, active) = row?;
            let id: SensorId = id
                .parse()
                .map_err(|e| StoreError::Corrupt(format!("sensor id {id}: {e}")))?;
            out.push(Sensor { id, name, sensor_type: sensor_type.parse()?, active });
        }
        Ok(out)
    }
}

impl SecurityRepository for SqliteSecurityRepository {
    fn alarm_status(&self) -> Result<AlarmStatus, RepositoryError> {
        Ok(Self::alarm_status_in(&self.conn)?)
    }

    fn set_alarm_status(&mut self, status: AlarmStatus) -> Result<(), RepositoryError> {
        Ok(self.write_alarm_status(status)?)
    }

    fn arming_status(&self) -> Result<ArmingStatus, RepositoryError> {
        Ok(self.current_arming_status()?)
    }

    fn set_arming_status(&mut self, status: ArmingStatus) -> Result<(), RepositoryError> {
        Ok(self.put_setting(KEY_ARMING_STATUS, status.as_str())?)
    }

    fn sensors(&self) -> Result<Vec<Sensor>, RepositoryError> {
        Ok(self.load_sensors()?)
    }

    fn add_sensor(&mut self, sensor: Sensor) -> Result<(), RepositoryError> {
        self.conn
            .execute(
                "INSERT INTO sensors (id, name, sensor_type, active) VALUES (?1, ?2, ?3, ?4)",
                params![sensor.id.to_string(), sensor.name, sensor.sensor_type.as_str(), sensor.active],
            )
            .map_err(StoreError::from)?;
        Ok(())
    }

    fn remove_sensor(&mut self, id: &SensorId) -> Result<(), RepositoryError> {
        let n = self
            .conn
            .execute("DELETE FROM sensors WHERE id = ?1", params![id.to_string()])
            .map_err(StoreError::from)?;
        if n == 0 { return Err(RepositoryError::SensorNotFound(*id)); }
        Ok(())
    }

    fn update_sensor(&mut self, sensor: &Sensor) -> Result<(), RepositoryError> {
        let n = self
            .conn
            .execute(
                "UPDATE sensors SET name = ?2, sensor_type = ?3, active = ?4 WHERE id = ?1",
                params![sensor.id.to_string(), sensor.name, sensor.sensor_type.as_str(), sensor.active],
            )
            .map_err(StoreError::from)?;
        if n == 0 { return Err(RepositoryError::SensorNotFound(sensor.id)); }
        Ok(())
    }

    fn cat_detected(&self) -> Result<bool, RepositoryError> {
        match Self::setting(&self.conn, KEY_CAT_DETECTED)? {
            Some(v) => v
                .parse::<bool>()
                .map_err(|_| StoreError::Corrupt(format!("cat_detected {v}")).into()),
            None => Ok(false),
        }
    }

    fn set_cat_detected(&mut self, cat: bool) -> Result<(), RepositoryError> {
        Ok(self.put_setting(KEY_CAT_DETECTED, if cat { "true" } else { "false" })?)
    }
}
