use anyhow::Result;
use clap::Args;
use lectern_core::Settings;

use crate::app;

#[derive(Args)]
pub struct ConfigArgs {
    /// Base URL of the lecture backend
    #[arg(long)]
    backend_url: Option<String>,

    /// API key for the backend
    #[arg(long)]
    api_key: Option<String>,

    /// Audio input device name (see `lectern devices`)
    #[arg(long)]
    device: Option<String>,

    /// Print the current configuration
    #[arg(long)]
    show: bool,
}

pub fn run(args: ConfigArgs) -> Result<()> {
    let mut settings = Settings::load();

    let changed = args.backend_url.is_some() || args.api_key.is_some() || args.device.is_some();

    if let Some(url) = args.backend_url {
        settings.backend_url = Some(url);
    }
    if let Some(key) = args.api_key {
        settings.api_key = Some(key);
    }
    if let Some(device) = args.device {
        settings.device = Some(device);
    }

    if changed {
        settings.save()?;
        app::print_ok("Configuration saved.");
    }

    if args.show || !changed {
        println!(
            "backend-url: {}",
            settings.backend_url.as_deref().unwrap_or("(not set)")
        );
        println!(
            "api-key:     {}",
            settings.api_key.as_deref().map(mask).unwrap_or_else(|| "(not set)".to_string())
        );
        println!(
            "device:      {}",
            settings.device.as_deref().unwrap_or("(system default)")
        );
        if let Some(path) = Settings::path() {
            println!("file:        {}", path.display());
        }
    }

    Ok(())
}

fn mask(key: &str) -> String {
    if key.len() <= 8 {
        "*".repeat(key.len())
    } else {
        format!("{}…{}", &key[..4], &key[key.len() - 4..])
    }
}
