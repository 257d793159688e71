use anyhow::Result;
use sitesensor_core::DeviceInfo;
use sitesensor_storage::Storage;

use crate::cli::DeviceCommands;

pub async fn handle(cmd: DeviceCommands, storage: &Storage) -> Result<()> {
    match cmd {
        DeviceCommands::Add {
            id,
            name,
            device_type,
        } => add(storage, id, name, device_type).await,
        DeviceCommands::List => list(storage).await,
    }
}

async fn add(storage: &Storage, id: u32, name: String, device_type: String) -> Result<()> {
    let device = DeviceInfo {
        id,
        name,
        device_type,
    };
    storage.add_device(&device).await?;

    println!("✓ Device {}: {}", device.id, device.name);
    println!("  Type: {}", device.device_type);

    Ok(())
}

async fn list(storage: &Storage) -> Result<()> {
    let devices = storage.list_devices().await?;

    if devices.is_empty() {
        println!("No devices found.");
        return Ok(());
    }

    println!("Devices:");
    for device in devices {
        println!("  {:>4}  {} ({})", device.id, device.name, device.device_type);
    }

    Ok(())
}
