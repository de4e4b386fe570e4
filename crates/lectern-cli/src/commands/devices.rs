use anyhow::Result;
use lectern_core::audio::list_audio_devices;

pub fn run() -> Result<()> {
    let devices = list_audio_devices()?;

    println!("Audio input devices:");
    for device in devices {
        if device.is_default {
            println!("  * {} (default)", device.name);
        } else {
            println!("    {}", device.name);
        }
    }
    println!("\nSelect one with: lectern config --device <name>");

    Ok(())
}
