//! Core domain models and logic for SiteSensor configuration
//!
//! This crate contains:
//! - Domain models (ConfigSnapshot, Settings, managed fields)
//! - Recipe codec (portable, checksummed text blocks)
//! - Field sync controller (enablement rules, per-panel session)
//! - Apply/capture against a host state store

pub mod apply;
pub mod child_types;
pub mod error;
pub mod fields;
pub mod headers;
pub mod ready;
pub mod recipe;
pub mod settings;
pub mod snapshot;
pub mod stamp;
pub mod status;
pub mod store;
pub mod sync;

pub use apply::{ApplyOptions, ApplyPlan, ApplyReport, SlotSweep, StateWrite, apply, capture};
pub use child_types::ChildType;
pub use error::{CoreError, Result};
pub use fields::{ManagedField, SERVICE_ID, SlotField};
pub use ready::{ReadinessPolicy, request_reload, wait_for_ready};
pub use recipe::{DecodedRecipe, RecipeCodec, RecipeWarning};
pub use settings::{ResponseType, Settings, TriggerType};
pub use snapshot::{ConfigSnapshot, ExpressionEntry};
pub use status::{StatusIndicators, read_status};
pub use store::{ActionRequest, DeviceId, DeviceInfo, Host, MemoryStore, StateStore};
pub use sync::{Enablement, FieldEdit, PanelSession, compute_enablement};
