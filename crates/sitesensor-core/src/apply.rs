//! Moving snapshots between a device's state and memory
//!
//! [`capture`] reads live state into a sparse snapshot for export.
//! [`apply`] writes a decoded snapshot back with exact-overwrite semantics:
//! every managed field and every swept slot is written, absent values as "".

use std::ops::RangeInclusive;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::fields::{self, ManagedField, SERVICE_ID, SlotField, applied, runtime};
use crate::settings::Settings;
use crate::snapshot::{ConfigSnapshot, ExpressionEntry};
use crate::store::{DeviceId, StateStore};
use crate::Result;

/// Which slots an apply clears or rewrites
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SlotSweep {
    /// Slots `1..max(old, new)`, leaving the highest index untouched
    #[default]
    Observed,
    /// Slots `1..=max(old, new)`
    Inclusive,
}

impl SlotSweep {
    pub fn slots(self, old_count: usize, new_count: usize) -> RangeInclusive<usize> {
        let upper = old_count.max(new_count);
        match self {
            SlotSweep::Observed => 1..=upper.saturating_sub(1),
            SlotSweep::Inclusive => 1..=upper,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ApplyOptions {
    pub sweep: SlotSweep,
}

/// One state variable write
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StateWrite {
    pub name: String,
    pub value: String,
}

impl StateWrite {
    fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }

    pub fn is_clear(&self) -> bool {
        self.value.is_empty()
    }
}

/// Every write an apply performs, in order
#[derive(Debug, Clone, Serialize)]
pub struct ApplyPlan {
    pub old_slot_count: usize,
    pub new_slot_count: usize,
    pub slots: Vec<usize>,
    pub writes: Vec<StateWrite>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ApplyReport {
    pub fields_written: usize,
    pub fields_cleared: usize,
    pub slots_swept: usize,
    /// Writes the store refused, as (name, error)
    pub failed_writes: Vec<(String, String)>,
    /// The host should reload so the engine picks up the new configuration
    pub reload_recommended: bool,
}

/// Compute the writes for applying `snapshot` over a device with `old_slot_count` slots
pub fn plan(
    snapshot: &ConfigSnapshot,
    old_slot_count: usize,
    options: ApplyOptions,
    now: OffsetDateTime,
) -> ApplyPlan {
    let new_slot_count = snapshot.slot_count();
    let slots: Vec<usize> = options.sweep.slots(old_slot_count, new_slot_count).collect();
    let mut writes = Vec::new();

    for &slot in &slots {
        let entry = snapshot.expression(slot).filter(|e| !e.is_unused());
        let expr = entry.map(|e| e.expr.trim()).unwrap_or_default();
        let description = entry.and_then(|e| e.description.as_deref()).unwrap_or_default();
        let child = entry.and_then(|e| e.child_type.as_deref()).unwrap_or_default();
        writes.push(StateWrite::new(SlotField::Expr.name(slot), expr));
        writes.push(StateWrite::new(SlotField::Desc.name(slot), description));
        writes.push(StateWrite::new(SlotField::Child.name(slot), child));
        writes.push(StateWrite::new(SlotField::Value.name(slot), ""));
    }

    for field in ManagedField::ALL {
        let value = snapshot.settings.get(field).unwrap_or_default();
        writes.push(StateWrite::new(field.name(), value));
    }

    writes.push(StateWrite::new(applied::RECIPE_NAME, snapshot.name.as_str()));
    writes.push(StateWrite::new(applied::RECIPE_AUTHOR, snapshot.author.as_str()));
    writes.push(StateWrite::new(applied::RECIPE_VERSION, snapshot.version.as_str()));
    writes.push(StateWrite::new(
        applied::RECIPE_SOURCE,
        snapshot.source_version.to_string(),
    ));
    writes.push(StateWrite::new(
        applied::RECIPE_APPLIED,
        now.unix_timestamp().to_string(),
    ));

    for name in [runtime::LAST_QUERY, runtime::LAST_EVAL, runtime::LAST_RUN] {
        writes.push(StateWrite::new(name, "0"));
    }
    writes.push(StateWrite::new(runtime::FAILED, "0"));
    writes.push(StateWrite::new(runtime::FAILED_SINCE, "0"));
    writes.push(StateWrite::new(runtime::LOG_CAPTURE, ""));

    ApplyPlan {
        old_slot_count,
        new_slot_count,
        slots,
        writes,
    }
}

/// Current slot count of a device
pub async fn device_slot_count(store: &dyn StateStore, device: DeviceId) -> Result<usize> {
    let value = store
        .get(device, SERVICE_ID, ManagedField::NumExp.name())
        .await?;
    Ok(fields::parse_slot_count(value.as_deref()))
}

/// Write a snapshot onto a device
///
/// Store failures do not stop the apply; they are collected in the report.
pub async fn apply(
    store: &dyn StateStore,
    device: DeviceId,
    snapshot: &ConfigSnapshot,
    options: ApplyOptions,
    now: OffsetDateTime,
) -> Result<ApplyReport> {
    let old_slot_count = device_slot_count(store, device).await?;
    let plan = plan(snapshot, old_slot_count, options, now);

    let mut report = ApplyReport {
        slots_swept: plan.slots.len(),
        ..Default::default()
    };
    for write in &plan.writes {
        match store
            .set_persistent(device, SERVICE_ID, &write.name, &write.value)
            .await
        {
            Ok(()) if write.is_clear() => report.fields_cleared += 1,
            Ok(()) => report.fields_written += 1,
            Err(e) => {
                tracing::warn!(device, field = %write.name, error = %e, "state write failed");
                report.failed_writes.push((write.name.clone(), e.to_string()));
            }
        }
    }
    report.reload_recommended = report.fields_written + report.fields_cleared > 0;

    tracing::info!(
        device,
        recipe = %snapshot.name,
        old_slots = plan.old_slot_count,
        new_slots = plan.new_slot_count,
        written = report.fields_written,
        cleared = report.fields_cleared,
        failed = report.failed_writes.len(),
        "applied recipe"
    );
    Ok(report)
}

/// Read a device's configuration into a sparse snapshot
///
/// Name and author are taken from the last applied recipe, if any.
pub async fn capture(store: &dyn StateStore, device: DeviceId) -> Result<ConfigSnapshot> {
    let get = |name: String| async move {
        store
            .get(device, SERVICE_ID, &name)
            .await
            .map(|v| v.unwrap_or_default())
    };

    let mut settings = Settings::new();
    for field in ManagedField::ALL {
        settings.set(field, get(field.name().to_string()).await?);
    }

    let mut snapshot = ConfigSnapshot::new(
        get(applied::RECIPE_NAME.to_string()).await?,
        get(applied::RECIPE_AUTHOR.to_string()).await?,
    )
    .with_settings(settings);

    for slot in 1..=snapshot.slot_count() {
        let expr = get(SlotField::Expr.name(slot)).await?;
        if expr.trim().is_empty() {
            continue;
        }
        snapshot.push_expression(
            ExpressionEntry::new(slot, expr.trim())
                .with_child_type(get(SlotField::Child.name(slot)).await?)
                .with_description(get(SlotField::Desc.name(slot)).await?),
        );
    }
    Ok(snapshot)
}
