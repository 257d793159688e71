//! Host state store interfaces
//!
//! The host keeps device state variables keyed by (device, service, name).
//! Writes are best-effort; failures surface as [`CoreError::Store`].

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU32, Ordering};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use crate::{CoreError, Result};

pub type DeviceId = u32;

/// Host gateway service and the action that reloads its configuration
pub const GATEWAY_SERVICE_ID: &str = "urn:micasaverde-com:serviceId:HomeAutomationGateway1";
pub const RELOAD_ACTION: &str = "Reload";
pub const GATEWAY_DEVICE: DeviceId = 0;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceInfo {
    pub id: DeviceId,
    pub name: String,
    pub device_type: String,
}

/// An action invocation sent to the host
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionRequest {
    pub device: DeviceId,
    pub service: String,
    pub action: String,
    pub args: Vec<(String, String)>,
}

impl ActionRequest {
    pub fn reload() -> Self {
        Self {
            device: GATEWAY_DEVICE,
            service: GATEWAY_SERVICE_ID.to_string(),
            action: RELOAD_ACTION.to_string(),
            args: Vec::new(),
        }
    }
}

/// Device state variables
#[async_trait]
pub trait StateStore: Send + Sync {
    async fn get(&self, device: DeviceId, service: &str, name: &str) -> Result<Option<String>>;

    /// Set a value the host may discard on restart
    async fn set(&self, device: DeviceId, service: &str, name: &str, value: &str) -> Result<()>;

    /// Set a value that survives host restarts
    async fn set_persistent(
        &self,
        device: DeviceId,
        service: &str,
        name: &str,
        value: &str,
    ) -> Result<()>;
}

/// Device enumeration, action invocation and liveness
#[async_trait]
pub trait Host: StateStore {
    async fn devices(&self) -> Result<Vec<DeviceInfo>>;

    async fn device(&self, id: DeviceId) -> Result<Option<DeviceInfo>> {
        Ok(self.devices().await?.into_iter().find(|d| d.id == id))
    }

    async fn invoke_action(&self, request: &ActionRequest) -> Result<()>;

    /// Succeeds once the host answers requests
    async fn ping(&self) -> Result<()>;
}

#[derive(Debug, Clone)]
struct StoredValue {
    value: String,
    persistent: bool,
}

/// In-process store for embedding and tests
#[derive(Debug, Default)]
pub struct MemoryStore {
    values: RwLock<HashMap<(DeviceId, String, String), StoredValue>>,
    devices: RwLock<Vec<DeviceInfo>>,
    actions: RwLock<Vec<ActionRequest>>,
    unready_pings: AtomicU32,
    refused: RwLock<HashSet<String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn add_device(&self, device: DeviceInfo) {
        let mut devices = self.devices.write().await;
        devices.retain(|d| d.id != device.id);
        devices.push(device);
    }

    /// Actions invoked so far, oldest first
    pub async fn actions(&self) -> Vec<ActionRequest> {
        self.actions.read().await.clone()
    }

    /// Make the next `count` pings fail
    pub fn fail_pings(&self, count: u32) {
        self.unready_pings.store(count, Ordering::SeqCst);
    }

    /// Refuse every later write to the variable `name`
    pub async fn fail_writes(&self, name: &str) {
        self.refused.write().await.insert(name.to_string());
    }

    pub async fn is_persistent(&self, device: DeviceId, service: &str, name: &str) -> bool {
        self.values
            .read()
            .await
            .get(&(device, service.to_string(), name.to_string()))
            .is_some_and(|v| v.persistent)
    }

    async fn write(
        &self,
        device: DeviceId,
        service: &str,
        name: &str,
        value: &str,
        persistent: bool,
    ) -> Result<()> {
        if self.refused.read().await.contains(name) {
            return Err(CoreError::Store(format!("write to {} refused", name)));
        }
        self.values.write().await.insert(
            (device, service.to_string(), name.to_string()),
            StoredValue {
                value: value.to_string(),
                persistent,
            },
        );
        Ok(())
    }
}

#[async_trait]
impl StateStore for MemoryStore {
    async fn get(&self, device: DeviceId, service: &str, name: &str) -> Result<Option<String>> {
        Ok(self
            .values
            .read()
            .await
            .get(&(device, service.to_string(), name.to_string()))
            .map(|v| v.value.clone()))
    }

    async fn set(&self, device: DeviceId, service: &str, name: &str, value: &str) -> Result<()> {
        self.write(device, service, name, value, false).await
    }

    async fn set_persistent(
        &self,
        device: DeviceId,
        service: &str,
        name: &str,
        value: &str,
    ) -> Result<()> {
        self.write(device, service, name, value, true).await
    }
}

#[async_trait]
impl Host for MemoryStore {
    async fn devices(&self) -> Result<Vec<DeviceInfo>> {
        let mut devices = self.devices.read().await.clone();
        devices.sort_by_key(|d| d.id);
        Ok(devices)
    }

    async fn invoke_action(&self, request: &ActionRequest) -> Result<()> {
        self.actions.write().await.push(request.clone());
        Ok(())
    }

    async fn ping(&self) -> Result<()> {
        let remaining = self.unready_pings.load(Ordering::SeqCst);
        if remaining > 0 {
            self.unready_pings.store(remaining - 1, Ordering::SeqCst);
            return Err(CoreError::Store("host is restarting".to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_get_set() {
        let store = MemoryStore::new();
        assert_eq!(store.get(1, "svc", "A").await.unwrap(), None);

        store.set(1, "svc", "A", "x").await.unwrap();
        assert_eq!(store.get(1, "svc", "A").await.unwrap().as_deref(), Some("x"));
        assert!(!store.is_persistent(1, "svc", "A").await);

        store.set_persistent(1, "svc", "A", "y").await.unwrap();
        assert_eq!(store.get(1, "svc", "A").await.unwrap().as_deref(), Some("y"));
        assert!(store.is_persistent(1, "svc", "A").await);

        assert_eq!(store.get(2, "svc", "A").await.unwrap(), None);
        assert_eq!(store.get(1, "other", "A").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_devices_and_actions() {
        let store = MemoryStore::new();
        store
            .add_device(DeviceInfo {
                id: 7,
                name: "Weather".to_string(),
                device_type: "urn:schemas-toggledbits-com:device:SiteSensor:1".to_string(),
            })
            .await;
        assert_eq!(store.devices().await.unwrap().len(), 1);
        assert_eq!(store.device(7).await.unwrap().unwrap().name, "Weather");
        assert!(store.device(8).await.unwrap().is_none());

        store.invoke_action(&ActionRequest::reload()).await.unwrap();
        assert_eq!(store.actions().await, vec![ActionRequest::reload()]);
    }

    #[tokio::test]
    async fn test_failing_pings() {
        let store = MemoryStore::new();
        store.fail_pings(2);
        assert!(store.ping().await.is_err());
        assert!(store.ping().await.is_err());
        assert!(store.ping().await.is_ok());
    }

    #[tokio::test]
    async fn test_refused_writes() {
        let store = MemoryStore::new();
        store.fail_writes("Pattern").await;
        assert!(store.set_persistent(1, "svc", "Pattern", "OK").await.is_err());
        assert!(store.set(1, "svc", "Pattern", "OK").await.is_err());
        assert_eq!(store.get(1, "svc", "Pattern").await.unwrap(), None);
        store.set_persistent(1, "svc", "Other", "x").await.unwrap();
    }
}
