//! Interactive first-run setup.

use anyhow::Result;
use dialoguer::{Input, Password, Select, theme::ColorfulTheme};
use lectern_core::Settings;
use lectern_core::audio::list_audio_devices;

use crate::app;

pub fn run() -> Result<()> {
    app::print_heading("lectern setup");
    println!();

    let mut settings = Settings::load();
    let theme = ColorfulTheme::default();

    let backend_url: String = Input::with_theme(&theme)
        .with_prompt("Lecture backend URL")
        .with_initial_text(settings.backend_url.clone().unwrap_or_default())
        .interact_text()?;
    settings.backend_url = Some(backend_url.trim().trim_end_matches('/').to_string());

    let api_key: String = Password::with_theme(&theme)
        .with_prompt("API key (leave empty if the backend is open)")
        .allow_empty_password(true)
        .interact()?;
    if !api_key.trim().is_empty() {
        settings.api_key = Some(api_key.trim().to_string());
    }

    match list_audio_devices() {
        Ok(devices) => {
            let mut names: Vec<String> = vec!["System default".to_string()];
            names.extend(devices.iter().map(|d| d.name.clone()));

            let selection = Select::with_theme(&theme)
                .with_prompt("Microphone")
                .items(&names)
                .default(0)
                .interact()?;
            settings.device = if selection == 0 {
                None
            } else {
                Some(names[selection].clone())
            };
        }
        Err(e) => {
            app::print_warn(&format!("Could not list audio devices: {e}"));
            app::print_dim("You can set one later with: lectern config --device <name>");
        }
    }

    settings.save()?;
    println!();
    app::print_ok("Configuration saved! Run 'lectern' to start recording.");

    Ok(())
}
