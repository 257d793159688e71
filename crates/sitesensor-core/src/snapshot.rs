//! Configuration snapshot domain model

use serde::{Deserialize, Serialize};

use crate::settings::Settings;

/// One indexed expression slot
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpressionEntry {
    /// 1-based slot index
    pub index: usize,
    pub expr: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub child_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl ExpressionEntry {
    pub fn new(index: usize, expr: impl Into<String>) -> Self {
        Self {
            index,
            expr: expr.into(),
            child_type: None,
            description: None,
        }
    }

    pub fn with_child_type(mut self, child_type: impl Into<String>) -> Self {
        self.child_type = non_blank(child_type.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = non_blank(description.into());
        self
    }

    pub fn is_unused(&self) -> bool {
        self.expr.trim().is_empty()
    }
}

/// A recipe: named, attributed device configuration
///
/// Built transiently at export (from live state) or import (from a block),
/// then written field by field into the state store.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigSnapshot {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub author: String,
    #[serde(default)]
    pub description: String,
    /// `YYDDD.HHMM` stamp assigned at export
    #[serde(default)]
    pub version: String,
    /// Codec version that produced the block this snapshot came from
    #[serde(skip)]
    pub source_version: u32,
    /// Export time, milliseconds since the epoch
    #[serde(default)]
    pub timestamp: i64,
    #[serde(default)]
    pub settings: Settings,
    #[serde(default)]
    pub expressions: Vec<ExpressionEntry>,
}

impl ConfigSnapshot {
    pub fn new(name: impl Into<String>, author: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            author: author.into(),
            ..Default::default()
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_settings(mut self, settings: Settings) -> Self {
        self.settings = settings;
        self
    }

    /// Insert or replace a slot, keeping slots ordered by index
    pub fn push_expression(&mut self, entry: ExpressionEntry) {
        match self
            .expressions
            .binary_search_by_key(&entry.index, |e| e.index)
        {
            Ok(pos) => self.expressions[pos] = entry,
            Err(pos) => self.expressions.insert(pos, entry),
        }
    }

    pub fn with_expression(mut self, entry: ExpressionEntry) -> Self {
        self.push_expression(entry);
        self
    }

    pub fn expression(&self, index: usize) -> Option<&ExpressionEntry> {
        self.expressions.iter().find(|e| e.index == index)
    }

    pub fn slot_count(&self) -> usize {
        self.settings.slot_count()
    }

    /// Drop unused slots and order the rest; the exported form is sparse
    pub fn normalize(&mut self) {
        self.expressions.retain(|e| e.index > 0 && !e.is_unused());
        self.expressions.sort_by_key(|e| e.index);
        self.expressions.dedup_by_key(|e| e.index);
    }
}

fn non_blank(s: String) -> Option<String> {
    if s.trim().is_empty() { None } else { Some(s) }
}
