use anyhow::Result;
use sitesensor_core::{SERVICE_ID, StateStore};
use sitesensor_storage::Storage;

use crate::cli::StateCommands;

pub async fn handle(cmd: StateCommands, storage: &Storage) -> Result<()> {
    match cmd {
        StateCommands::Get {
            device,
            name,
            service,
        } => {
            let service = service.as_deref().unwrap_or(SERVICE_ID);
            match storage.get(device, service, &name).await? {
                Some(value) => println!("{}", value),
                None => anyhow::bail!("{} is not set on device {}", name, device),
            }
            Ok(())
        }
        StateCommands::Set {
            device,
            name,
            value,
            service,
            transient,
        } => {
            let service = service.as_deref().unwrap_or(SERVICE_ID);
            if transient {
                storage.set(device, service, &name, &value).await?;
            } else {
                storage.set_persistent(device, service, &name, &value).await?;
            }
            println!("✓ {} = {}", name, value);
            Ok(())
        }
        StateCommands::List { device } => {
            let entries = storage.list_state(device).await?;
            if entries.is_empty() {
                println!("No state for device {}.", device);
                return Ok(());
            }

            let mut service = "";
            for entry in &entries {
                if entry.service != service {
                    service = &entry.service;
                    println!("{}:", service);
                }
                let marker = if entry.persistent { "" } else { " (transient)" };
                println!("  {} = {}{}", entry.name, entry.value, marker);
            }
            Ok(())
        }
    }
}
