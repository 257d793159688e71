//! Status indicators shown on the device control panel

use serde::Serialize;

use crate::fields::{SECURITY_SERVICE_ID, SERVICE_ID, runtime};
use crate::store::{DeviceId, StateStore};
use crate::Result;

/// Poll period of the control panel indicators
pub const REFRESH_INTERVAL_MS: u64 = 1000;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusIndicators {
    pub failed: bool,
    pub armed: bool,
    pub tripped: bool,
    pub message: String,
    /// Captured request log lines, when request logging is on
    pub log: Option<Vec<String>>,
    /// The device asked not to show indicators at all
    pub hidden: bool,
}

/// Read indicator state; a lamp is lit unless its variable is exactly "0"
pub async fn read_status(store: &dyn StateStore, device: DeviceId) -> Result<StatusIndicators> {
    let sensor = |name: &'static str| store.get(device, SERVICE_ID, name);
    let security = |name: &'static str| store.get(device, SECURITY_SERVICE_ID, name);

    let hidden = matches!(
        sensor(runtime::HIDE_STATUS_INDICATOR).await?.as_deref(),
        Some("1") | Some("true")
    );
    let failed = lit(sensor(runtime::FAILED).await?);
    let armed = lit(security(runtime::ARMED).await?);
    let tripped = lit(security(runtime::TRIPPED).await?);
    let message = sensor(runtime::MESSAGE).await?.unwrap_or_default();

    let log = if sensor(runtime::LOG_REQUESTS).await?.as_deref() == Some("0") {
        None
    } else {
        let capture = sensor(runtime::LOG_CAPTURE).await?.unwrap_or_default();
        Some(
            capture
                .split('|')
                .filter(|l| !l.is_empty())
                .map(str::to_string)
                .collect(),
        )
    };

    Ok(StatusIndicators {
        failed,
        armed,
        tripped,
        message,
        log,
        hidden,
    })
}

fn lit(value: Option<String>) -> bool {
    value.as_deref() != Some("0")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    #[tokio::test]
    async fn test_indicators() {
        let store = MemoryStore::new();
        store.set(4, SERVICE_ID, "Failed", "0").await.unwrap();
        store.set(4, SECURITY_SERVICE_ID, "Armed", "1").await.unwrap();
        store.set(4, SECURITY_SERVICE_ID, "Tripped", "0").await.unwrap();
        store.set(4, SERVICE_ID, "Message", "Last query OK").await.unwrap();
        store.set(4, SERVICE_ID, "LogCapture", "GET /a|200 OK|").await.unwrap();

        let status = read_status(&store, 4).await.unwrap();
        assert!(!status.failed);
        assert!(status.armed);
        assert!(!status.tripped);
        assert!(!status.hidden);
        assert_eq!(status.message, "Last query OK");
        assert_eq!(
            status.log,
            Some(vec!["GET /a".to_string(), "200 OK".to_string()])
        );
    }

    #[tokio::test]
    async fn test_log_off_and_hidden() {
        let store = MemoryStore::new();
        store.set(4, SERVICE_ID, "LogRequests", "0").await.unwrap();
        store.set(4, SERVICE_ID, "HideStatusIndicator", "true").await.unwrap();

        let status = read_status(&store, 4).await.unwrap();
        assert!(status.hidden);
        assert_eq!(status.log, None);
        // Unset lamps read as lit
        assert!(status.failed);
    }
}
