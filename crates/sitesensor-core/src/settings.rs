//! Typed view over the managed configuration fields

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};

use crate::fields::{self, ManagedField};

pub const DEFAULT_INTERVAL_SECS: u32 = 1800;
pub const DEFAULT_TIMEOUT_SECS: u32 = 60;

/// How the server response is handled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseType {
    #[default]
    Text,
    Json,
}

impl ResponseType {
    pub fn as_str(self) -> &'static str {
        match self {
            ResponseType::Text => "text",
            ResponseType::Json => "json",
        }
    }
}

impl fmt::Display for ResponseType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ResponseType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "text" => Ok(ResponseType::Text),
            "json" => Ok(ResponseType::Json),
            other => Err(format!("Unknown response type: {}", other)),
        }
    }
}

/// When the sensor trips
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TriggerType {
    /// URL unreachable or server replies with an error
    #[default]
    #[serde(rename = "err")]
    Error,
    /// Response contains the pattern
    #[serde(rename = "match")]
    Match,
    /// Response does not contain the pattern
    #[serde(rename = "neg")]
    NegatedMatch,
    /// Trip expression evaluates true
    #[serde(rename = "expr")]
    Expression,
}

impl TriggerType {
    /// Selector order; the first selectable entry is the fallback
    pub const ALL: [TriggerType; 4] = [
        TriggerType::Error,
        TriggerType::Match,
        TriggerType::NegatedMatch,
        TriggerType::Expression,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            TriggerType::Error => "err",
            TriggerType::Match => "match",
            TriggerType::NegatedMatch => "neg",
            TriggerType::Expression => "expr",
        }
    }
}

impl fmt::Display for TriggerType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TriggerType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TriggerType::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| format!("Unknown trigger type: {}", s))
    }
}

/// Managed field values; a field is either present with a value or absent
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Settings {
    values: BTreeMap<ManagedField, String>,
}

impl Settings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, field: ManagedField) -> Option<&str> {
        self.values.get(&field).map(String::as_str)
    }

    /// Store a value; blank values make the field absent
    pub fn set(&mut self, field: ManagedField, value: impl Into<String>) {
        let value = value.into();
        if value.trim().is_empty() {
            self.values.remove(&field);
        } else {
            self.values.insert(field, value);
        }
    }

    pub fn with(mut self, field: ManagedField, value: impl Into<String>) -> Self {
        self.set(field, value);
        self
    }

    pub fn remove(&mut self, field: ManagedField) -> Option<String> {
        self.values.remove(&field)
    }

    pub fn contains(&self, field: ManagedField) -> bool {
        self.values.contains_key(&field)
    }

    pub fn iter(&self) -> impl Iterator<Item = (ManagedField, &str)> {
        self.values.iter().map(|(k, v)| (*k, v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn request_url(&self) -> Option<&str> {
        self.get(ManagedField::RequestUrl)
    }

    /// Poll interval in seconds (default 1800)
    pub fn interval(&self) -> u32 {
        parse_positive(self.get(ManagedField::Interval)).unwrap_or(DEFAULT_INTERVAL_SECS)
    }

    /// Request timeout in seconds (default 60)
    pub fn timeout(&self) -> u32 {
        parse_positive(self.get(ManagedField::Timeout)).unwrap_or(DEFAULT_TIMEOUT_SECS)
    }

    /// Query only while armed (default on)
    pub fn query_armed(&self) -> bool {
        match self.get(ManagedField::QueryArmed).map(|v| v.trim().parse::<i64>()) {
            Some(Ok(n)) => n != 0,
            _ => true,
        }
    }

    pub fn response_type(&self) -> ResponseType {
        self.get(ManagedField::ResponseType)
            .and_then(|v| v.parse().ok())
            .unwrap_or_default()
    }

    pub fn trigger(&self) -> TriggerType {
        self.get(ManagedField::Trigger)
            .and_then(|v| v.parse().ok())
            .unwrap_or_default()
    }

    /// Number of expression slots (default 8)
    pub fn slot_count(&self) -> usize {
        fields::parse_slot_count(self.get(ManagedField::NumExp))
    }

    /// Seconds between re-evaluations; `None` means only after each request
    pub fn eval_interval(&self) -> Option<u32> {
        parse_positive(self.get(ManagedField::EvalInterval))
    }
}

fn parse_positive(value: Option<&str>) -> Option<u32> {
    value
        .and_then(|v| v.trim().parse::<u32>().ok())
        .filter(|n| *n > 0)
}

impl<'de> Deserialize<'de> for Settings {
    /// Unknown keys are dropped; scalar values are kept as their string form.
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = BTreeMap::<String, serde_json::Value>::deserialize(deserializer)?;
        let mut settings = Settings::new();
        for (key, value) in raw {
            let Ok(field) = key.parse::<ManagedField>() else {
                tracing::debug!(key = %key, "ignoring unmanaged setting");
                continue;
            };
            let value = match value {
                serde_json::Value::String(s) => s,
                serde_json::Value::Number(n) => n.to_string(),
                serde_json::Value::Bool(b) => if b { "1" } else { "0" }.to_string(),
                _ => continue,
            };
            settings.set(field, value);
        }
        Ok(settings)
    }
}
