//! Field sync controller - keeps an edit form consistent with device state
//!
//! Enablement is a pure function of the response and trigger selectors; the
//! session applies its result. Every accepted edit is written to the store
//! immediately, one field at a time.

use std::collections::BTreeMap;

use serde::Serialize;
use time::OffsetDateTime;

use crate::apply::{self, ApplyOptions, ApplyReport, StateWrite};
use crate::fields::{self, ManagedField, SERVICE_ID, SlotField};
use crate::headers::{decode_headers, encode_headers};
use crate::settings::{ResponseType, Settings, TriggerType};
use crate::snapshot::{ConfigSnapshot, ExpressionEntry};
use crate::store::{DeviceId, StateStore};
use crate::Result;

/// Which controls are live for a response/trigger selection
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Enablement {
    pub selectable_triggers: Vec<TriggerType>,
    /// Trigger after enablement; differs from the input when that was not selectable
    pub trigger: TriggerType,
    pub trigger_reassigned: bool,
    pub pattern_enabled: bool,
    pub trip_expression_enabled: bool,
    pub text_controls_visible: bool,
    pub json_controls_visible: bool,
}

pub fn is_selectable(response: ResponseType, trigger: TriggerType) -> bool {
    match trigger {
        TriggerType::Error => true,
        TriggerType::Match | TriggerType::NegatedMatch => response == ResponseType::Text,
        TriggerType::Expression => response == ResponseType::Json,
    }
}

/// Compute control enablement; a missing or unselectable trigger falls back
/// to the first selectable option.
pub fn compute_enablement(response: ResponseType, trigger: Option<TriggerType>) -> Enablement {
    let selectable_triggers: Vec<TriggerType> = TriggerType::ALL
        .into_iter()
        .filter(|t| is_selectable(response, *t))
        .collect();

    let effective = match trigger {
        Some(t) if selectable_triggers.contains(&t) => t,
        _ => selectable_triggers
            .first()
            .copied()
            .unwrap_or(TriggerType::Error),
    };

    Enablement {
        trigger: effective,
        trigger_reassigned: trigger.is_some_and(|t| t != effective),
        pattern_enabled: matches!(effective, TriggerType::Match | TriggerType::NegatedMatch),
        trip_expression_enabled: effective == TriggerType::Expression,
        text_controls_visible: response == ResponseType::Text,
        json_controls_visible: response == ResponseType::Json,
        selectable_triggers,
    }
}

/// Child type and description are editable only for a slot with an expression
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SlotEnablement {
    pub child_enabled: bool,
    pub description_enabled: bool,
}

pub fn slot_enablement(expr: &str) -> SlotEnablement {
    let used = !expr.trim().is_empty();
    SlotEnablement {
        child_enabled: used,
        description_enabled: used,
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SlotForm {
    pub expr: String,
    pub child_type: String,
    pub description: String,
}

/// A single user edit
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldEdit {
    /// Header text, one header per line
    Headers(String),
    QueryArmed(bool),
    ResponseType(ResponseType),
    Trigger(TriggerType),
    SlotExpr(usize, String),
    SlotChild(usize, String),
    SlotDescription(usize, String),
    /// Any other managed field, stored as given
    Field(ManagedField, String),
}

#[derive(Debug, Clone, Serialize)]
pub struct EditOutcome {
    pub writes: Vec<StateWrite>,
    /// Why the edit was not persisted
    pub rejected: Option<String>,
    pub enablement: Enablement,
}

/// One open configuration panel for one device
pub struct PanelSession<'a> {
    store: &'a dyn StateStore,
    device: DeviceId,
    settings: Settings,
    slots: BTreeMap<usize, SlotForm>,
    needs_reload: bool,
    visible: bool,
}

impl<'a> PanelSession<'a> {
    /// Open a panel, loading the form from the device's current state
    pub async fn open(store: &'a dyn StateStore, device: DeviceId) -> Result<Self> {
        let mut session = Self {
            store,
            device,
            settings: Settings::new(),
            slots: BTreeMap::new(),
            needs_reload: false,
            visible: true,
        };
        session.reload_form().await?;
        Ok(session)
    }

    /// Close the panel; returns whether a host reload is advisable
    pub fn close(&mut self) -> bool {
        self.visible = false;
        self.needs_reload
    }

    pub fn device(&self) -> DeviceId {
        self.device
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn needs_reload(&self) -> bool {
        self.needs_reload
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Stored headers decoded to one per line
    pub fn headers_text(&self) -> String {
        self.settings
            .get(ManagedField::Headers)
            .map(decode_headers)
            .unwrap_or_default()
    }

    pub fn slots(&self) -> impl Iterator<Item = (usize, &SlotForm)> {
        self.slots.iter().map(|(i, s)| (*i, s))
    }

    pub fn slot(&self, index: usize) -> Option<&SlotForm> {
        self.slots.get(&index)
    }

    pub fn enablement(&self) -> Enablement {
        compute_enablement(self.settings.response_type(), self.stored_trigger())
    }

    pub fn slot_enablement(&self, index: usize) -> Option<SlotEnablement> {
        self.slots.get(&index).map(|s| slot_enablement(&s.expr))
    }

    /// Form contents as a snapshot, ready for export
    pub fn snapshot(&self, name: &str, author: &str, description: &str) -> ConfigSnapshot {
        let mut snapshot = ConfigSnapshot::new(name, author)
            .with_description(description)
            .with_settings(self.settings.clone());
        for (index, slot) in &self.slots {
            if slot.expr.trim().is_empty() {
                continue;
            }
            snapshot.push_expression(
                ExpressionEntry::new(*index, slot.expr.clone())
                    .with_child_type(slot.child_type.clone())
                    .with_description(slot.description.clone()),
            );
        }
        snapshot
    }

    /// Apply a decoded recipe to the device and refresh the form
    pub async fn apply_recipe(
        &mut self,
        snapshot: &ConfigSnapshot,
        options: ApplyOptions,
    ) -> Result<ApplyReport> {
        let report = apply::apply(
            self.store,
            self.device,
            snapshot,
            options,
            OffsetDateTime::now_utc(),
        )
        .await?;
        self.needs_reload |= report.reload_recommended;
        self.reload_form().await?;
        Ok(report)
    }

    /// Validate, persist and cascade a single edit
    pub async fn edit(&mut self, edit: FieldEdit) -> Result<EditOutcome> {
        let mut writes = Vec::new();
        let rejected = self.stage(edit, &mut writes);

        for write in &writes {
            if let Err(e) = self
                .store
                .set_persistent(self.device, SERVICE_ID, &write.name, &write.value)
                .await
            {
                tracing::warn!(
                    device = self.device,
                    field = %write.name,
                    error = %e,
                    "edit not persisted"
                );
                // Resync the form with whatever did reach the store
                self.reload_form().await?;
                return Err(e);
            }
        }
        if let Some(reason) = &rejected {
            tracing::debug!(device = self.device, reason = %reason, "edit rejected");
        }

        Ok(EditOutcome {
            writes,
            rejected,
            enablement: self.enablement(),
        })
    }

    /// Update the form and collect writes; returns a rejection reason
    fn stage(&mut self, edit: FieldEdit, writes: &mut Vec<StateWrite>) -> Option<String> {
        match edit {
            FieldEdit::Headers(text) => {
                self.set_field(ManagedField::Headers, encode_headers(&text), writes);
            }
            FieldEdit::QueryArmed(armed) => {
                self.set_field(ManagedField::QueryArmed, if armed { "1" } else { "0" }, writes);
            }
            FieldEdit::ResponseType(response) => {
                self.set_field(ManagedField::ResponseType, response.as_str(), writes);
                self.settle_trigger(writes);
            }
            FieldEdit::Trigger(trigger) => {
                self.set_field(ManagedField::Trigger, trigger.as_str(), writes);
                self.settle_trigger(writes);
            }
            FieldEdit::SlotExpr(index, expr) => {
                let Some(slot) = self.slots.get_mut(&index) else {
                    return Some(format!("No expression slot {}", index));
                };
                let expr = expr.trim().to_string();
                slot.expr = expr.clone();
                writes.push(write(SlotField::Expr.name(index), expr.as_str()));
                if expr.is_empty() {
                    // Unused slots keep no child or description
                    let child_was_set = !slot.child_type.is_empty();
                    slot.child_type.clear();
                    slot.description.clear();
                    writes.push(write(SlotField::Child.name(index), ""));
                    writes.push(write(SlotField::Desc.name(index), ""));
                    self.needs_reload |= child_was_set;
                }
            }
            FieldEdit::SlotChild(index, child_type) => {
                let Some(slot) = self.slots.get_mut(&index) else {
                    return Some(format!("No expression slot {}", index));
                };
                if !slot_enablement(&slot.expr).child_enabled {
                    return Some(format!("Slot {} has no expression", index));
                }
                let child_type = child_type.trim().to_string();
                if slot.child_type != child_type {
                    self.needs_reload = true;
                }
                slot.child_type = child_type.clone();
                writes.push(write(SlotField::Child.name(index), child_type));
            }
            FieldEdit::SlotDescription(index, description) => {
                let Some(slot) = self.slots.get_mut(&index) else {
                    return Some(format!("No expression slot {}", index));
                };
                if !slot_enablement(&slot.expr).description_enabled {
                    return Some(format!("Slot {} has no expression", index));
                }
                slot.description = description.clone();
                writes.push(write(SlotField::Desc.name(index), description));
            }
            FieldEdit::Field(field @ (ManagedField::Interval | ManagedField::Timeout), value) => {
                let value = value.trim();
                if !is_positive_integer(value) {
                    return Some(format!("{} must be a positive whole number of seconds", field));
                }
                self.set_field(field, value, writes);
            }
            FieldEdit::Field(ManagedField::EvalInterval, value) => {
                let value = value.trim();
                if !value.is_empty() && !is_positive_integer(value) {
                    return Some(
                        "EvalInterval must be empty or a positive whole number of seconds"
                            .to_string(),
                    );
                }
                self.set_field(ManagedField::EvalInterval, value, writes);
            }
            FieldEdit::Field(ManagedField::NumExp, value) => {
                let value = value.trim();
                if value.parse::<usize>().is_err() {
                    return Some("Expression count must be a whole number".to_string());
                }
                if fields::exceeds_slot_limit(value) {
                    return Some(format!(
                        "Expression count must be at most {}",
                        fields::MAX_SLOT_COUNT
                    ));
                }
                self.set_field(ManagedField::NumExp, value, writes);
                self.needs_reload = true;
                self.resize_slots();
            }
            FieldEdit::Field(ManagedField::Headers, text) => {
                return self.stage(FieldEdit::Headers(text), writes);
            }
            FieldEdit::Field(ManagedField::ResponseType, value) => match value.parse() {
                Ok(response) => return self.stage(FieldEdit::ResponseType(response), writes),
                Err(e) => return Some(e),
            },
            FieldEdit::Field(ManagedField::Trigger, value) => match value.parse() {
                Ok(trigger) => return self.stage(FieldEdit::Trigger(trigger), writes),
                Err(e) => return Some(e),
            },
            FieldEdit::Field(field, value) => {
                self.set_field(field, value, writes);
            }
        }
        None
    }

    fn set_field(&mut self, field: ManagedField, value: impl Into<String>, writes: &mut Vec<StateWrite>) {
        let value = value.into();
        writes.push(write(field.name(), value.as_str()));
        self.settings.set(field, value);
    }

    /// Persist the fallback trigger when the stored one is no longer selectable
    fn settle_trigger(&mut self, writes: &mut Vec<StateWrite>) {
        let enablement = self.enablement();
        if self.stored_trigger() != Some(enablement.trigger) {
            self.set_field(ManagedField::Trigger, enablement.trigger.as_str(), writes);
        }
    }

    fn stored_trigger(&self) -> Option<TriggerType> {
        self.settings
            .get(ManagedField::Trigger)
            .and_then(|t| t.parse().ok())
    }

    /// Grow or shrink the slot list to the configured count
    fn resize_slots(&mut self) {
        let count = self.settings.slot_count();
        self.slots.retain(|index, _| *index <= count);
        for index in 1..=count {
            self.slots.entry(index).or_default();
        }
    }

    async fn reload_form(&mut self) -> Result<()> {
        let snapshot = apply::capture(self.store, self.device).await?;
        self.settings = snapshot.settings;
        self.slots = (1..=self.settings.slot_count())
            .map(|index| (index, SlotForm::default()))
            .collect();
        for entry in snapshot.expressions {
            if let Some(slot) = self.slots.get_mut(&entry.index) {
                slot.expr = entry.expr;
                slot.child_type = entry.child_type.unwrap_or_default();
                slot.description = entry.description.unwrap_or_default();
            }
        }
        Ok(())
    }
}

fn write(name: impl Into<String>, value: impl Into<String>) -> StateWrite {
    StateWrite {
        name: name.into(),
        value: value.into(),
    }
}

fn is_positive_integer(value: &str) -> bool {
    !value.is_empty()
        && value.bytes().all(|b| b.is_ascii_digit())
        && value.bytes().any(|b| b != b'0')
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    const DEV: DeviceId = 3;

    async fn stored(store: &MemoryStore, name: &str) -> Option<String> {
        store.get(DEV, SERVICE_ID, name).await.unwrap()
    }

    #[test]
    fn test_text_response_enablement() {
        let e = compute_enablement(ResponseType::Text, Some(TriggerType::Match));
        assert_eq!(
            e.selectable_triggers,
            vec![TriggerType::Error, TriggerType::Match, TriggerType::NegatedMatch]
        );
        assert_eq!(e.trigger, TriggerType::Match);
        assert!(!e.trigger_reassigned);
        assert!(e.pattern_enabled);
        assert!(!e.trip_expression_enabled);
        assert!(e.text_controls_visible);
        assert!(!e.json_controls_visible);
    }

    #[test]
    fn test_json_response_enablement() {
        let e = compute_enablement(ResponseType::Json, Some(TriggerType::Expression));
        assert_eq!(
            e.selectable_triggers,
            vec![TriggerType::Error, TriggerType::Expression]
        );
        assert!(e.trip_expression_enabled);
        assert!(!e.pattern_enabled);
    }

    #[test]
    fn test_invalid_combination_falls_back() {
        let e = compute_enablement(ResponseType::Text, Some(TriggerType::Expression));
        assert_eq!(e.trigger, TriggerType::Error);
        assert!(e.trigger_reassigned);
        assert!(!e.trip_expression_enabled);
        assert!(!e.pattern_enabled);

        let e = compute_enablement(ResponseType::Json, Some(TriggerType::NegatedMatch));
        assert_eq!(e.trigger, TriggerType::Error);

        let e = compute_enablement(ResponseType::Json, None);
        assert_eq!(e.trigger, TriggerType::Error);
        assert!(!e.trigger_reassigned);
    }

    #[test]
    fn test_slot_enablement() {
        assert!(slot_enablement("response.x").child_enabled);
        assert!(!slot_enablement("   ").child_enabled);
        assert!(!slot_enablement("").description_enabled);
    }

    #[test]
    fn test_positive_integer() {
        assert!(is_positive_integer("60"));
        assert!(is_positive_integer("007"));
        assert!(!is_positive_integer("0"));
        assert!(!is_positive_integer("-5"));
        assert!(!is_positive_integer("1.5"));
        assert!(!is_positive_integer(""));
    }

    #[tokio::test]
    async fn test_open_and_close_lifecycle() {
        let store = MemoryStore::new();
        let mut session = PanelSession::open(&store, DEV).await.unwrap();
        assert!(session.is_visible());
        assert_eq!(session.slots().count(), 8);
        assert!(!session.close());
        assert!(!session.is_visible());
    }

    #[tokio::test]
    async fn test_response_change_reassigns_and_persists_trigger() {
        let store = MemoryStore::new();
        store.set_persistent(DEV, SERVICE_ID, "ResponseType", "json").await.unwrap();
        store.set_persistent(DEV, SERVICE_ID, "Trigger", "expr").await.unwrap();
        let mut session = PanelSession::open(&store, DEV).await.unwrap();
        assert!(session.enablement().trip_expression_enabled);

        let outcome = session
            .edit(FieldEdit::ResponseType(ResponseType::Text))
            .await
            .unwrap();
        assert_eq!(outcome.enablement.trigger, TriggerType::Error);
        assert!(!outcome.enablement.trip_expression_enabled);
        assert_eq!(stored(&store, "ResponseType").await.as_deref(), Some("text"));
        assert_eq!(stored(&store, "Trigger").await.as_deref(), Some("err"));
    }

    #[tokio::test]
    async fn test_unselectable_trigger_edit_is_corrected() {
        let store = MemoryStore::new();
        let mut session = PanelSession::open(&store, DEV).await.unwrap();
        let outcome = session
            .edit(FieldEdit::Trigger(TriggerType::Expression))
            .await
            .unwrap();
        assert_eq!(outcome.enablement.trigger, TriggerType::Error);
        assert_eq!(stored(&store, "Trigger").await.as_deref(), Some("err"));
    }

    #[tokio::test]
    async fn test_interval_validation() {
        let store = MemoryStore::new();
        let mut session = PanelSession::open(&store, DEV).await.unwrap();

        let outcome = session
            .edit(FieldEdit::Field(ManagedField::Interval, "abc".to_string()))
            .await
            .unwrap();
        assert!(outcome.rejected.is_some());
        assert!(outcome.writes.is_empty());
        assert_eq!(stored(&store, "Interval").await, None);

        let outcome = session
            .edit(FieldEdit::Field(ManagedField::Timeout, " 30 ".to_string()))
            .await
            .unwrap();
        assert!(outcome.rejected.is_none());
        assert_eq!(stored(&store, "Timeout").await.as_deref(), Some("30"));
        assert_eq!(session.settings().timeout(), 30);
    }

    #[tokio::test]
    async fn test_headers_are_escaped_on_store() {
        let store = MemoryStore::new();
        let mut session = PanelSession::open(&store, DEV).await.unwrap();
        session
            .edit(FieldEdit::Headers("A: 1|2\nB: 3\n".to_string()))
            .await
            .unwrap();
        assert_eq!(stored(&store, "Headers").await.as_deref(), Some("A: 1%7c2|B: 3"));
        assert_eq!(session.headers_text(), "A: 1|2\nB: 3");
    }

    #[tokio::test]
    async fn test_clearing_expression_cascades() {
        let store = MemoryStore::new();
        for (name, value) in [("Expr2", "response.x"), ("Child2", "urn:c"), ("Desc2", "X")] {
            store.set_persistent(DEV, SERVICE_ID, name, value).await.unwrap();
        }
        let mut session = PanelSession::open(&store, DEV).await.unwrap();
        assert_eq!(session.slot(2).unwrap().child_type, "urn:c");
        assert!(session.slot_enablement(2).unwrap().child_enabled);

        session.edit(FieldEdit::SlotExpr(2, "  ".to_string())).await.unwrap();
        assert_eq!(stored(&store, "Expr2").await.as_deref(), Some(""));
        assert_eq!(stored(&store, "Child2").await.as_deref(), Some(""));
        assert_eq!(stored(&store, "Desc2").await.as_deref(), Some(""));
        assert!(!session.slot_enablement(2).unwrap().child_enabled);
        assert!(session.needs_reload());

        let outcome = session
            .edit(FieldEdit::SlotChild(2, "urn:c".to_string()))
            .await
            .unwrap();
        assert!(outcome.rejected.is_some());
        assert_eq!(stored(&store, "Child2").await.as_deref(), Some(""));
    }

    #[tokio::test]
    async fn test_expression_count_resizes_slots() {
        let store = MemoryStore::new();
        let mut session = PanelSession::open(&store, DEV).await.unwrap();
        session
            .edit(FieldEdit::Field(ManagedField::NumExp, "3".to_string()))
            .await
            .unwrap();
        assert_eq!(session.slots().count(), 3);
        let outcome = session
            .edit(FieldEdit::SlotExpr(5, "x".to_string()))
            .await
            .unwrap();
        assert!(outcome.rejected.is_some());

        session
            .edit(FieldEdit::Field(ManagedField::NumExp, "12".to_string()))
            .await
            .unwrap();
        assert_eq!(session.slots().count(), 12);
        assert!(session.needs_reload());
    }

    #[tokio::test]
    async fn test_snapshot_and_apply_recipe() {
        let store = MemoryStore::new();
        let mut session = PanelSession::open(&store, DEV).await.unwrap();
        session
            .edit(FieldEdit::Field(ManagedField::RequestUrl, "http://a".to_string()))
            .await
            .unwrap();
        session.edit(FieldEdit::SlotExpr(1, "response.a".to_string())).await.unwrap();
        let snapshot = session.snapshot("Mine", "me", "");
        assert_eq!(snapshot.expressions.len(), 1);
        assert_eq!(snapshot.settings.request_url(), Some("http://a"));

        let other = ConfigSnapshot::new("Other", "them")
            .with_settings(Settings::new().with(ManagedField::Pattern, "OK"));
        let report = session
            .apply_recipe(&other, ApplyOptions::default())
            .await
            .unwrap();
        assert!(report.reload_recommended);
        assert!(session.needs_reload());
        assert_eq!(session.settings().request_url(), None);
        assert_eq!(session.settings().get(ManagedField::Pattern), Some("OK"));
        assert_eq!(session.slot(1).unwrap().expr, "");
    }

    #[tokio::test]
    async fn test_eval_interval_validation() {
        let store = MemoryStore::new();
        let mut session = PanelSession::open(&store, DEV).await.unwrap();

        let outcome = session
            .edit(FieldEdit::Field(ManagedField::EvalInterval, "banana".to_string()))
            .await
            .unwrap();
        assert!(outcome.rejected.is_some());
        assert!(outcome.writes.is_empty());
        assert_eq!(stored(&store, "EvalInterval").await, None);

        let outcome = session
            .edit(FieldEdit::Field(ManagedField::EvalInterval, "0".to_string()))
            .await
            .unwrap();
        assert!(outcome.rejected.is_some());

        let outcome = session
            .edit(FieldEdit::Field(ManagedField::EvalInterval, "90".to_string()))
            .await
            .unwrap();
        assert!(outcome.rejected.is_none());
        assert_eq!(session.settings().eval_interval(), Some(90));

        session
            .edit(FieldEdit::Field(ManagedField::EvalInterval, String::new()))
            .await
            .unwrap();
        assert_eq!(stored(&store, "EvalInterval").await.as_deref(), Some(""));
        assert_eq!(session.settings().eval_interval(), None);
    }

    #[tokio::test]
    async fn test_expression_count_above_limit_rejected() {
        let store = MemoryStore::new();
        let mut session = PanelSession::open(&store, DEV).await.unwrap();
        let outcome = session
            .edit(FieldEdit::Field(ManagedField::NumExp, "3000000".to_string()))
            .await
            .unwrap();
        assert!(outcome.rejected.is_some());
        assert_eq!(stored(&store, "NumExp").await, None);
        assert_eq!(session.slots().count(), 8);

        session
            .edit(FieldEdit::Field(
                ManagedField::NumExp,
                fields::MAX_SLOT_COUNT.to_string(),
            ))
            .await
            .unwrap();
        assert_eq!(session.slots().count(), fields::MAX_SLOT_COUNT);
    }

    #[tokio::test]
    async fn test_stored_oversized_count_is_capped_on_open() {
        let store = MemoryStore::new();
        store.set_persistent(DEV, SERVICE_ID, "NumExp", "3000000").await.unwrap();
        let session = PanelSession::open(&store, DEV).await.unwrap();
        assert_eq!(session.slots().count(), fields::MAX_SLOT_COUNT);
    }

    #[tokio::test]
    async fn test_failed_write_resyncs_form() {
        let store = MemoryStore::new();
        store.set_persistent(DEV, SERVICE_ID, "ResponseType", "text").await.unwrap();
        store.set_persistent(DEV, SERVICE_ID, "Trigger", "match").await.unwrap();
        store.fail_writes("Trigger").await;
        let mut session = PanelSession::open(&store, DEV).await.unwrap();

        let result = session.edit(FieldEdit::ResponseType(ResponseType::Json)).await;
        assert!(result.is_err());

        // ResponseType reached the store, the reassigned trigger did not
        assert_eq!(stored(&store, "ResponseType").await.as_deref(), Some("json"));
        assert_eq!(stored(&store, "Trigger").await.as_deref(), Some("match"));
        assert_eq!(session.settings().response_type(), ResponseType::Json);
        assert_eq!(session.settings().get(ManagedField::Trigger), Some("match"));
    }
}
