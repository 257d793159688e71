//! Recipe codec - portable text blocks for sharing a sensor configuration
//!
//! A block is a one-line ident header, a begin marker, the base64 payload
//! wrapped at 76 columns, and an end marker:
//!
//! ```text
//! === Ident: <name> version <version> by <author>; <description>
//! === BEGIN SITESENSOR RECIPE ===
//! <base64>
//! === END SITESENSOR RECIPE ===
//! ```
//!
//! The payload is a JSON envelope carrying a format tag, schema version,
//! codec version and a BLAKE3 checksum of the recipe body.

use std::sync::LazyLock;

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use regex::Regex;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::fields::{self, MAX_SLOT_COUNT, ManagedField};
use crate::snapshot::ConfigSnapshot;
use crate::stamp::{epoch_millis, version_stamp};
use crate::{CoreError, Result};

/// Version of this codec, stamped into every block as `source`
pub const CODEC_VERSION: u32 = 1;

/// Envelope layout version
pub const SCHEMA_VERSION: u32 = 1;

pub const FORMAT_TAG: &str = "sitesensor-recipe";
pub const BEGIN_MARKER: &str = "=== BEGIN SITESENSOR RECIPE ===";
pub const END_MARKER: &str = "=== END SITESENSOR RECIPE ===";
pub const IDENT_PREFIX: &str = "=== Ident: ";
pub const WRAP_WIDTH: usize = 76;

/// First line of a diagnostic shown in place of a block
pub const DIAGNOSTIC_BANNER: &str = "*** RECIPE EXPORT FAILED ***";

const EXCERPT_RADIUS: usize = 16;

static BLOCK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        "(?i){}(.*?){}",
        regex::escape(BEGIN_MARKER),
        regex::escape(END_MARKER)
    ))
    .unwrap()
});

#[derive(Debug, Serialize, Deserialize)]
struct Envelope {
    format: String,
    schema: u32,
    #[serde(default)]
    source: serde_json::Value,
    checksum: String,
    recipe: serde_json::Value,
}

/// Non-fatal findings while decoding
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecipeWarning {
    /// Block was written by a newer codec than this one
    ForwardVersion { found: u32, supported: u32 },
}

impl std::fmt::Display for RecipeWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RecipeWarning::ForwardVersion { found, supported } => write!(
                f,
                "Recipe was created by a newer version of SiteSensor ({} > {}); some settings may not apply",
                found, supported
            ),
        }
    }
}

/// Result of a successful decode
#[derive(Debug, Clone)]
pub struct DecodedRecipe {
    pub snapshot: ConfigSnapshot,
    pub warnings: Vec<RecipeWarning>,
}

/// Encodes snapshots to portable blocks and back
#[derive(Debug, Clone, Default)]
pub struct RecipeCodec {}

impl RecipeCodec {
    pub fn new() -> Self {
        Self {}
    }

    /// Encode using the current time for the version stamp
    pub fn encode(&self, snapshot: &ConfigSnapshot) -> Result<String> {
        self.encode_at(snapshot, OffsetDateTime::now_utc())
    }

    /// Encode a snapshot into a portable block
    ///
    /// Fails with [`CoreError::Validation`] when name or author is blank.
    pub fn encode_at(&self, snapshot: &ConfigSnapshot, now: OffsetDateTime) -> Result<String> {
        if snapshot.name.trim().is_empty() {
            return Err(CoreError::Validation { field: "name" });
        }
        if snapshot.author.trim().is_empty() {
            return Err(CoreError::Validation { field: "author" });
        }

        let mut recipe = snapshot.clone();
        recipe.version = version_stamp(now);
        recipe.timestamp = epoch_millis(now);
        recipe.normalize();

        let body = serde_json::to_value(&recipe)?;
        let envelope = Envelope {
            format: FORMAT_TAG.to_string(),
            schema: SCHEMA_VERSION,
            source: serde_json::Value::from(CODEC_VERSION),
            checksum: checksum(&body)?,
            recipe: body,
        };
        let payload = BASE64_STANDARD.encode(serde_json::to_vec(&envelope)?);

        let mut lines = Vec::new();
        lines.push(format!(
            "{}{} version {} by {}; {}",
            IDENT_PREFIX,
            strip_control(&recipe.name),
            recipe.version,
            strip_control(&recipe.author),
            strip_control(&recipe.description)
        ));
        lines.push(BEGIN_MARKER.to_string());
        lines.extend(wrap_lines(&payload).into_iter().map(str::to_string));
        lines.push(END_MARKER.to_string());

        tracing::debug!(
            name = %recipe.name,
            version = %recipe.version,
            settings = recipe.settings.len(),
            expressions = recipe.expressions.len(),
            "encoded recipe"
        );
        Ok(lines.join("\n"))
    }

    /// Encode for display: a block, or a diagnostic when encoding fails
    pub fn export(&self, snapshot: &ConfigSnapshot) -> String {
        self.export_at(snapshot, OffsetDateTime::now_utc())
    }

    pub fn export_at(&self, snapshot: &ConfigSnapshot, now: OffsetDateTime) -> String {
        match self.encode_at(snapshot, now) {
            Ok(block) => block,
            Err(e) => {
                tracing::warn!(error = %e, "recipe export failed");
                let input = serde_json::to_string(snapshot).unwrap_or_default();
                diagnostic_block(&e, &input)
            }
        }
    }

    /// Parse pasted text into a snapshot. Never touches device state.
    pub fn decode(&self, text: &str) -> Result<DecodedRecipe> {
        if text.trim().is_empty() {
            return Err(CoreError::NotARecipe { blank: true });
        }

        let flattened: String = text.chars().filter(|c| *c != '\r' && *c != '\n').collect();
        let payload: String = BLOCK
            .captures(&flattened)
            .and_then(|caps| caps.get(1))
            .ok_or(CoreError::NotARecipe { blank: false })?
            .as_str()
            .chars()
            .filter(|c| !c.is_whitespace())
            .collect();

        let bytes = BASE64_STANDARD
            .decode(payload.as_bytes())
            .map_err(|e| CoreError::CorruptBlock(format!("invalid base64: {}", e)))?;
        let value: serde_json::Value = serde_json::from_slice(&bytes)
            .map_err(|e| CoreError::CorruptBlock(format!("invalid payload: {}", e)))?;
        if !value.is_object() {
            return Err(CoreError::CorruptBlock("payload is not an object".to_string()));
        }

        let (body, source_version) = if value.get("format").is_some() {
            open_envelope(value)?
        } else {
            // Flat recipes predate the envelope
            let source = lenient_u32(value.get("source"));
            (value, source)
        };

        for key in ["name", "author"] {
            if body.get(key).is_none() {
                tracing::debug!(key, "recipe has no {} key", key);
            }
        }

        let mut snapshot: ConfigSnapshot = serde_json::from_value(body)
            .map_err(|e| CoreError::CorruptBlock(format!("invalid recipe: {}", e)))?;
        if let Some(count) = snapshot.settings.get(ManagedField::NumExp)
            && fields::exceeds_slot_limit(count)
        {
            return Err(CoreError::CorruptBlock(format!(
                "expression count {} exceeds {}",
                count.trim(),
                MAX_SLOT_COUNT
            )));
        }
        snapshot.source_version = source_version;
        snapshot.normalize();

        let mut warnings = Vec::new();
        if source_version > CODEC_VERSION {
            tracing::warn!(
                found = source_version,
                supported = CODEC_VERSION,
                "recipe comes from a newer codec"
            );
            warnings.push(RecipeWarning::ForwardVersion {
                found: source_version,
                supported: CODEC_VERSION,
            });
        }

        tracing::debug!(name = %snapshot.name, source_version, "decoded recipe");
        Ok(DecodedRecipe { snapshot, warnings })
    }
}

fn open_envelope(value: serde_json::Value) -> Result<(serde_json::Value, u32)> {
    let envelope: Envelope = serde_json::from_value(value)
        .map_err(|e| CoreError::CorruptBlock(format!("invalid envelope: {}", e)))?;
    if envelope.format != FORMAT_TAG {
        return Err(CoreError::CorruptBlock(format!(
            "unknown format tag: {}",
            envelope.format
        )));
    }
    if checksum(&envelope.recipe)? != envelope.checksum {
        return Err(CoreError::CorruptBlock("checksum mismatch".to_string()));
    }
    Ok((envelope.recipe, lenient_u32(Some(&envelope.source))))
}

/// BLAKE3 over the compact JSON of `body` with object keys in sorted order
fn checksum(body: &serde_json::Value) -> Result<String> {
    let canonical = serde_json::to_string(&canonicalize(body))?;
    Ok(blake3::hash(canonical.as_bytes()).to_hex().to_string())
}

fn canonicalize(value: &serde_json::Value) -> serde_json::Value {
    match value {
        serde_json::Value::Object(map) => {
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();
            let mut sorted = serde_json::Map::new();
            for key in keys {
                sorted.insert(key.clone(), canonicalize(&map[key.as_str()]));
            }
            serde_json::Value::Object(sorted)
        }
        serde_json::Value::Array(items) => {
            serde_json::Value::Array(items.iter().map(canonicalize).collect())
        }
        other => other.clone(),
    }
}

fn lenient_u32(value: Option<&serde_json::Value>) -> u32 {
    match value {
        Some(serde_json::Value::Number(n)) => n
            .as_u64()
            .and_then(|n| u32::try_from(n).ok())
            .unwrap_or(0),
        Some(serde_json::Value::String(s)) => s.trim().parse().unwrap_or(0),
        _ => 0,
    }
}

/// Split a payload into lines of at most [`WRAP_WIDTH`] characters
pub fn wrap_lines(payload: &str) -> Vec<&str> {
    let mut lines = Vec::new();
    let mut rest = payload;
    while !rest.is_empty() {
        let cut = rest
            .char_indices()
            .nth(WRAP_WIDTH)
            .map(|(i, _)| i)
            .unwrap_or(rest.len());
        let (line, tail) = rest.split_at(cut);
        lines.push(line);
        rest = tail;
    }
    lines
}

/// Remove C0/C1 controls and line/paragraph separators
pub fn strip_control(s: &str) -> String {
    s.chars()
        .filter(|c| !c.is_control() && *c != '\u{2028}' && *c != '\u{2029}')
        .collect()
}

/// Display-only text shown instead of a block when encoding fails
///
/// Contains no block markers, so it can never decode as a recipe.
pub fn diagnostic_block(err: &CoreError, input: &str) -> String {
    let mut lines = vec![DIAGNOSTIC_BANNER.to_string(), err.to_string()];
    if let Some(offset) = err.offset() {
        let chars: Vec<char> = input.chars().collect();
        let start = offset.saturating_sub(EXCERPT_RADIUS).min(chars.len());
        let end = (offset + EXCERPT_RADIUS).min(chars.len());
        let excerpt: String = chars[start..end].iter().collect();
        lines.push(format!("near: {}", strip_control(&excerpt)));
    }
    lines.join("\n")
}
