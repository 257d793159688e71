//! Database operations

use std::path::PathBuf;
use std::str::FromStr;

use anyhow::anyhow;
use async_trait::async_trait;
use sitesensor_core::store::{ActionRequest, DeviceId, DeviceInfo, Host, StateStore};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use time::OffsetDateTime;

use crate::{Result, StorageError};

const SCHEMA: &[&str] = &[
    "CREATE TABLE IF NOT EXISTS devices (
        id INTEGER PRIMARY KEY,
        name TEXT NOT NULL,
        device_type TEXT NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS state (
        device_id INTEGER NOT NULL,
        service TEXT NOT NULL,
        name TEXT NOT NULL,
        value TEXT NOT NULL,
        persistent INTEGER NOT NULL,
        updated_at INTEGER NOT NULL,
        PRIMARY KEY (device_id, service, name)
    )",
    "CREATE TABLE IF NOT EXISTS actions (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        device_id INTEGER NOT NULL,
        service TEXT NOT NULL,
        action TEXT NOT NULL,
        args TEXT NOT NULL,
        requested_at INTEGER NOT NULL
    )",
];

/// A state variable row
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StateEntry {
    pub service: String,
    pub name: String,
    pub value: String,
    pub persistent: bool,
}

/// SQLite-backed host: devices, state variables and an action log
#[derive(Debug, Clone)]
pub struct Storage {
    pool: SqlitePool,
}

impl Storage {
    /// Open (creating if needed) the database and run migrations
    ///
    /// Transient values from a previous run are discarded, as a host restart would.
    pub async fn new(db_path: Option<PathBuf>) -> Result<Self> {
        let path = match db_path {
            Some(path) => path,
            None => Self::default_path()?,
        };
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let options = SqliteConnectOptions::from_str(&format!("sqlite://{}", path.display()))?
            .create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await?;

        for statement in SCHEMA {
            sqlx::query(statement).execute(&pool).await?;
        }
        let discarded = sqlx::query("DELETE FROM state WHERE persistent = 0")
            .execute(&pool)
            .await?
            .rows_affected();

        tracing::debug!(path = %path.display(), discarded, "storage ready");
        Ok(Self { pool })
    }

    fn default_path() -> Result<PathBuf> {
        directories::ProjectDirs::from("com", "sitesensor", "sitesensor")
            .map(|dirs| dirs.data_dir().join("sitesensor.db"))
            .ok_or_else(|| StorageError::Other(anyhow!("no home directory for the database")))
    }

    pub async fn add_device(&self, device: &DeviceInfo) -> Result<()> {
        sqlx::query(
            "INSERT INTO devices (id, name, device_type) VALUES (?, ?, ?)
             ON CONFLICT(id) DO UPDATE SET name = excluded.name, device_type = excluded.device_type",
        )
        .bind(i64::from(device.id))
        .bind(&device.name)
        .bind(&device.device_type)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn get_device(&self, id: DeviceId) -> Result<DeviceInfo> {
        self.list_devices()
            .await?
            .into_iter()
            .find(|d| d.id == id)
            .ok_or(StorageError::DeviceNotFound(id))
    }

    pub async fn list_devices(&self) -> Result<Vec<DeviceInfo>> {
        let rows: Vec<(i64, String, String)> =
            sqlx::query_as("SELECT id, name, device_type FROM devices ORDER BY id")
                .fetch_all(&self.pool)
                .await?;
        rows.into_iter()
            .map(|(id, name, device_type)| {
                Ok(DeviceInfo {
                    id: device_id(id)?,
                    name,
                    device_type,
                })
            })
            .collect()
    }

    /// All state variables of a device, ordered by service and name
    pub async fn list_state(&self, device: DeviceId) -> Result<Vec<StateEntry>> {
        let rows: Vec<(String, String, String, bool)> = sqlx::query_as(
            "SELECT service, name, value, persistent FROM state
             WHERE device_id = ? ORDER BY service, name",
        )
        .bind(i64::from(device))
        .fetch_all(&self.pool)
        .await?;
        Ok(rows
            .into_iter()
            .map(|(service, name, value, persistent)| StateEntry {
                service,
                name,
                value,
                persistent,
            })
            .collect())
    }

    /// Actions requested so far, oldest first
    pub async fn list_actions(&self) -> Result<Vec<ActionRequest>> {
        let rows: Vec<(i64, String, String, String)> = sqlx::query_as(
            "SELECT device_id, service, action, args FROM actions ORDER BY id",
        )
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter()
            .map(|(device, service, action, args)| {
                Ok(ActionRequest {
                    device: device_id(device)?,
                    service,
                    action,
                    args: serde_json::from_str(&args)?,
                })
            })
            .collect()
    }

    pub async fn get_value(&self, device: DeviceId, service: &str, name: &str) -> Result<Option<String>> {
        let value = sqlx::query_scalar(
            "SELECT value FROM state WHERE device_id = ? AND service = ? AND name = ?",
        )
        .bind(i64::from(device))
        .bind(service)
        .bind(name)
        .fetch_optional(&self.pool)
        .await?;
        Ok(value)
    }

    pub async fn put_value(
        &self,
        device: DeviceId,
        service: &str,
        name: &str,
        value: &str,
        persistent: bool,
    ) -> Result<()> {
        sqlx::query(
            "INSERT INTO state (device_id, service, name, value, persistent, updated_at)
             VALUES (?, ?, ?, ?, ?, ?)
             ON CONFLICT(device_id, service, name) DO UPDATE SET
                value = excluded.value,
                persistent = excluded.persistent,
                updated_at = excluded.updated_at",
        )
        .bind(i64::from(device))
        .bind(service)
        .bind(name)
        .bind(value)
        .bind(persistent)
        .bind(OffsetDateTime::now_utc().unix_timestamp())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn record_action(&self, request: &ActionRequest) -> Result<()> {
        sqlx::query(
            "INSERT INTO actions (device_id, service, action, args, requested_at)
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(i64::from(request.device))
        .bind(&request.service)
        .bind(&request.action)
        .bind(serde_json::to_string(&request.args)?)
        .bind(OffsetDateTime::now_utc().unix_timestamp())
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

fn device_id(id: i64) -> Result<DeviceId> {
    DeviceId::try_from(id).map_err(|_| StorageError::Other(anyhow!("bad device id {}", id)))
}

#[async_trait]
impl StateStore for Storage {
    async fn get(
        &self,
        device: DeviceId,
        service: &str,
        name: &str,
    ) -> sitesensor_core::Result<Option<String>> {
        Ok(self.get_value(device, service, name).await?)
    }

    async fn set(
        &self,
        device: DeviceId,
        service: &str,
        name: &str,
        value: &str,
    ) -> sitesensor_core::Result<()> {
        Ok(self.put_value(device, service, name, value, false).await?)
    }

    async fn set_persistent(
        &self,
        device: DeviceId,
        service: &str,
        name: &str,
        value: &str,
    ) -> sitesensor_core::Result<()> {
        Ok(self.put_value(device, service, name, value, true).await?)
    }
}

#[async_trait]
impl Host for Storage {
    async fn devices(&self) -> sitesensor_core::Result<Vec<DeviceInfo>> {
        Ok(self.list_devices().await?)
    }

    async fn invoke_action(&self, request: &ActionRequest) -> sitesensor_core::Result<()> {
        tracing::info!(device = request.device, action = %request.action, "recording action");
        Ok(self.record_action(request).await?)
    }

    async fn ping(&self) -> sitesensor_core::Result<()> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(StorageError::from)?;
        Ok(())
    }
}
