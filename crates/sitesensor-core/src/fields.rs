//! State variable names a SiteSensor device persists
//!
//! The managed field set is closed: applying a recipe writes every member,
//! clearing the ones the recipe does not carry.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Service namespace for the sensor's own state variables
pub const SERVICE_ID: &str = "urn:toggledbits-com:serviceId:SiteSensor1";

/// Service namespace for arm/trip state
pub const SECURITY_SERVICE_ID: &str = "urn:micasaverde-com:serviceId:SecuritySensor1";

/// Expression slot count used when `NumExp` is absent or unparseable
pub const DEFAULT_SLOT_COUNT: usize = 8;

/// Largest expression count a device may be configured with
pub const MAX_SLOT_COUNT: usize = 64;

/// A configuration field subject to exact-overwrite on apply
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ManagedField {
    #[serde(rename = "RequestURL")]
    RequestUrl,
    Headers,
    Interval,
    Timeout,
    QueryArmed,
    ResponseType,
    Trigger,
    NumExp,
    TripExpression,
    Pattern,
    ArmedInterval,
    EvalInterval,
    FailMasterOnExprError,
    FailChildOnExprError,
    BlankChildOnExprError,
    MaxResponseSize,
    MessageExpr,
}

impl ManagedField {
    pub const ALL: [ManagedField; 17] = [
        ManagedField::RequestUrl,
        ManagedField::Headers,
        ManagedField::Interval,
        ManagedField::Timeout,
        ManagedField::QueryArmed,
        ManagedField::ResponseType,
        ManagedField::Trigger,
        ManagedField::NumExp,
        ManagedField::TripExpression,
        ManagedField::Pattern,
        ManagedField::ArmedInterval,
        ManagedField::EvalInterval,
        ManagedField::FailMasterOnExprError,
        ManagedField::FailChildOnExprError,
        ManagedField::BlankChildOnExprError,
        ManagedField::MaxResponseSize,
        ManagedField::MessageExpr,
    ];

    /// State variable name on the device
    pub fn name(self) -> &'static str {
        match self {
            ManagedField::RequestUrl => "RequestURL",
            ManagedField::Headers => "Headers",
            ManagedField::Interval => "Interval",
            ManagedField::Timeout => "Timeout",
            ManagedField::QueryArmed => "QueryArmed",
            ManagedField::ResponseType => "ResponseType",
            ManagedField::Trigger => "Trigger",
            ManagedField::NumExp => "NumExp",
            ManagedField::TripExpression => "TripExpression",
            ManagedField::Pattern => "Pattern",
            ManagedField::ArmedInterval => "ArmedInterval",
            ManagedField::EvalInterval => "EvalInterval",
            ManagedField::FailMasterOnExprError => "FailMasterOnExprError",
            ManagedField::FailChildOnExprError => "FailChildOnExprError",
            ManagedField::BlankChildOnExprError => "BlankChildOnExprError",
            ManagedField::MaxResponseSize => "MaxResponseSize",
            ManagedField::MessageExpr => "MessageExpr",
        }
    }
}

impl fmt::Display for ManagedField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ManagedField {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ManagedField::ALL
            .into_iter()
            .find(|f| f.name() == s)
            .ok_or_else(|| format!("Not a managed field: {}", s))
    }
}

/// Per-slot state variables, suffixed with the 1-based slot index
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotField {
    Expr,
    Desc,
    Child,
    Value,
}

impl SlotField {
    pub fn prefix(self) -> &'static str {
        match self {
            SlotField::Expr => "Expr",
            SlotField::Desc => "Desc",
            SlotField::Child => "Child",
            SlotField::Value => "Value",
        }
    }

    pub fn name(self, slot: usize) -> String {
        format!("{}{}", self.prefix(), slot)
    }

    /// Split a name like `Expr12` into its field and slot index
    pub fn parse(name: &str) -> Option<(SlotField, usize)> {
        [SlotField::Expr, SlotField::Desc, SlotField::Child, SlotField::Value]
            .into_iter()
            .find_map(|field| {
                let digits = name.strip_prefix(field.prefix())?;
                if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
                    return None;
                }
                match digits.parse::<usize>() {
                    Ok(slot) if slot > 0 => Some((field, slot)),
                    _ => None,
                }
            })
    }
}

/// Bookkeeping written after a recipe is applied
pub mod applied {
    pub const RECIPE_NAME: &str = "RecipeName";
    pub const RECIPE_AUTHOR: &str = "RecipeAuthor";
    pub const RECIPE_VERSION: &str = "RecipeVersion";
    pub const RECIPE_SOURCE: &str = "RecipeSource";
    pub const RECIPE_APPLIED: &str = "RecipeApplied";
}

/// Runtime status fields reset when the configuration is replaced
pub mod runtime {
    pub const LAST_QUERY: &str = "LastQuery";
    pub const LAST_EVAL: &str = "LastEval";
    pub const LAST_RUN: &str = "LastRun";
    pub const FAILED: &str = "Failed";
    pub const FAILED_SINCE: &str = "FailedSince";
    pub const LOG_CAPTURE: &str = "LogCapture";
    pub const LOG_REQUESTS: &str = "LogRequests";
    pub const MESSAGE: &str = "Message";
    pub const HIDE_STATUS_INDICATOR: &str = "HideStatusIndicator";
    pub const ARMED: &str = "Armed";
    pub const TRIPPED: &str = "Tripped";
}

/// Parse an expression count the lenient way the panel does, capped at [`MAX_SLOT_COUNT`]
pub fn parse_slot_count(value: Option<&str>) -> usize {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty() && v.bytes().all(|b| b.is_ascii_digit()))
        .map(|v| v.parse::<usize>().map_or(MAX_SLOT_COUNT, |n| n.min(MAX_SLOT_COUNT)))
        .unwrap_or(DEFAULT_SLOT_COUNT)
}

/// A numeric expression count above [`MAX_SLOT_COUNT`]
pub fn exceeds_slot_limit(value: &str) -> bool {
    let value = value.trim();
    !value.is_empty()
        && value.bytes().all(|b| b.is_ascii_digit())
        && value.parse::<usize>().map_or(true, |n| n > MAX_SLOT_COUNT)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_managed_field_names_round_trip() {
        for field in ManagedField::ALL {
            assert_eq!(field.name().parse::<ManagedField>().unwrap(), field);
        }
        assert!("Expr1".parse::<ManagedField>().is_err());
    }

    #[test]
    fn test_serde_name_matches_state_name() {
        let json = serde_json::to_string(&ManagedField::RequestUrl).unwrap();
        assert_eq!(json, "\"RequestURL\"");
        let json = serde_json::to_string(&ManagedField::NumExp).unwrap();
        assert_eq!(json, "\"NumExp\"");
    }

    #[test]
    fn test_slot_field_parse() {
        assert_eq!(SlotField::parse("Expr12"), Some((SlotField::Expr, 12)));
        assert_eq!(SlotField::parse("Child3"), Some((SlotField::Child, 3)));
        assert_eq!(SlotField::parse("Expr"), None);
        assert_eq!(SlotField::parse("Expr0"), None);
        assert_eq!(SlotField::parse("Exprx"), None);
        assert_eq!(SlotField::Desc.name(4), "Desc4");
    }

    #[test]
    fn test_parse_slot_count() {
        assert_eq!(parse_slot_count(None), 8);
        assert_eq!(parse_slot_count(Some("")), 8);
        assert_eq!(parse_slot_count(Some("abc")), 8);
        assert_eq!(parse_slot_count(Some(" 12 ")), 12);
        assert_eq!(parse_slot_count(Some("0")), 0);
        assert_eq!(parse_slot_count(Some("-3")), 8);
    }

    #[test]
    fn test_slot_count_is_capped() {
        assert_eq!(parse_slot_count(Some("64")), MAX_SLOT_COUNT);
        assert_eq!(parse_slot_count(Some("3000000")), MAX_SLOT_COUNT);
        assert_eq!(
            parse_slot_count(Some("99999999999999999999999999")),
            MAX_SLOT_COUNT
        );
        assert!(!exceeds_slot_limit("64"));
        assert!(!exceeds_slot_limit("abc"));
        assert!(exceeds_slot_limit("65"));
        assert!(exceeds_slot_limit(" 3000000 "));
    }
}
