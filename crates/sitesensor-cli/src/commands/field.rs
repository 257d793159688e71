use anyhow::Result;
use serde::Serialize;
use sitesensor_config::Config;
use sitesensor_core::child_types::display_name;
use sitesensor_core::sync::{SlotEnablement, SlotForm, slot_enablement};
use sitesensor_core::{Enablement, FieldEdit, ManagedField, PanelSession, Settings, SlotField};
use sitesensor_storage::Storage;

use super::child_types::load_catalog;
use super::{maybe_reload, require_device};
use crate::cli::FieldCommands;

pub async fn handle(cmd: FieldCommands, storage: &Storage, config: &Config) -> Result<()> {
    match cmd {
        FieldCommands::Show { device, format } => show(storage, config, device, &format).await,
        FieldCommands::Set {
            device,
            field,
            value,
            reload,
            no_reload,
        } => {
            if set(storage, device, &field, value).await? {
                maybe_reload(storage, config, reload, no_reload).await?;
            }
            Ok(())
        }
    }
}

#[derive(Serialize)]
struct FormView<'a> {
    device: u32,
    settings: &'a Settings,
    enablement: Enablement,
    slots: Vec<SlotView<'a>>,
}

#[derive(Serialize)]
struct SlotView<'a> {
    index: usize,
    #[serde(flatten)]
    form: &'a SlotForm,
    #[serde(flatten)]
    enablement: SlotEnablement,
}

async fn show(storage: &Storage, config: &Config, device: u32, format: &str) -> Result<()> {
    let info = require_device(storage, device).await?;
    let session = PanelSession::open(storage, device).await?;
    let enablement = session.enablement();

    if format == "json" {
        let view = FormView {
            device,
            settings: session.settings(),
            enablement,
            slots: session
                .slots()
                .map(|(index, form)| SlotView {
                    index,
                    form,
                    enablement: slot_enablement(&form.expr),
                })
                .collect(),
        };
        println!("{}", serde_json::to_string_pretty(&view)?);
        return Ok(());
    }

    let catalog = load_catalog(config).await;
    println!("Device {}: {}", device, info.name);
    for field in ManagedField::ALL {
        let note = match field {
            ManagedField::Pattern if !enablement.pattern_enabled => " (disabled)",
            ManagedField::TripExpression if !enablement.trip_expression_enabled => " (disabled)",
            _ => "",
        };
        if field == ManagedField::Headers {
            let text = session.headers_text();
            println!("  {:<16} {}", field.name(), text.replace('\n', " | "));
        } else {
            let value = session.settings().get(field).unwrap_or_default();
            println!("  {:<16} {}{}", field.name(), value, note);
        }
    }

    let selectable: Vec<&str> = enablement
        .selectable_triggers
        .iter()
        .map(|t| t.as_str())
        .collect();
    println!("\nTrigger: {} (selectable: {})", enablement.trigger, selectable.join(", "));
    if enablement.trigger_reassigned {
        println!("  stored trigger is not available for this response type");
    }

    println!("\nExpressions:");
    for (index, slot) in session.slots() {
        if slot.expr.trim().is_empty() {
            println!("  {:>2}. (unused)", index);
            continue;
        }
        println!("  {:>2}. {}", index, slot.expr);
        if !slot.description.is_empty() {
            println!("      desc:  {}", slot.description);
        }
        if !slot.child_type.is_empty() {
            println!("      child: {}", display_name(&catalog, &slot.child_type));
        }
    }

    Ok(())
}

/// Apply one edit; returns whether the host should reload
async fn set(storage: &Storage, device: u32, field: &str, value: String) -> Result<bool> {
    require_device(storage, device).await?;
    let edit = parse_edit(field, value)?;
    let mut session = PanelSession::open(storage, device).await?;
    let outcome = session.edit(edit).await?;

    if let Some(reason) = outcome.rejected {
        anyhow::bail!("Rejected: {}", reason);
    }
    for write in &outcome.writes {
        println!("✓ {} = {}", write.name, write.value);
    }
    if outcome.enablement.trigger_reassigned {
        println!("  trigger changed to {}", outcome.enablement.trigger);
    }

    let needs_reload = session.needs_reload();
    session.close();
    Ok(needs_reload)
}

fn parse_edit(field: &str, value: String) -> Result<FieldEdit> {
    if let Some((slot_field, index)) = SlotField::parse(field) {
        return match slot_field {
            SlotField::Expr => Ok(FieldEdit::SlotExpr(index, value)),
            SlotField::Child => Ok(FieldEdit::SlotChild(index, value)),
            SlotField::Desc => Ok(FieldEdit::SlotDescription(index, value)),
            SlotField::Value => anyhow::bail!("{} is written by the sensor, not editable", field),
        };
    }

    let field: ManagedField = field.parse().map_err(anyhow::Error::msg)?;
    Ok(match field {
        ManagedField::Headers => FieldEdit::Headers(value.replace("\\n", "\n")),
        ManagedField::QueryArmed => FieldEdit::QueryArmed(matches!(
            value.trim().to_ascii_lowercase().as_str(),
            "1" | "true" | "yes" | "on"
        )),
        other => FieldEdit::Field(other, value),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_slot_edits() {
        assert_eq!(
            parse_edit("Expr3", "response.x".to_string()).unwrap(),
            FieldEdit::SlotExpr(3, "response.x".to_string())
        );
        assert_eq!(
            parse_edit("Desc1", "Temp".to_string()).unwrap(),
            FieldEdit::SlotDescription(1, "Temp".to_string())
        );
        assert!(parse_edit("Value2", "1".to_string()).is_err());
    }

    #[test]
    fn test_parse_field_edits() {
        assert_eq!(
            parse_edit("Headers", "A: 1\\nB: 2".to_string()).unwrap(),
            FieldEdit::Headers("A: 1\nB: 2".to_string())
        );
        assert_eq!(
            parse_edit("QueryArmed", "on".to_string()).unwrap(),
            FieldEdit::QueryArmed(true)
        );
        assert_eq!(
            parse_edit("Interval", "60".to_string()).unwrap(),
            FieldEdit::Field(ManagedField::Interval, "60".to_string())
        );
        assert!(parse_edit("Bogus", String::new()).is_err());
    }
}
