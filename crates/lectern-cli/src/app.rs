use anyhow::Result;
use console::style;
use lectern_core::{HttpBackend, Settings};

/// Resolved configuration for a recording session.
pub struct RecordConfig {
    pub backend: HttpBackend,
    pub device: Option<String>,
    pub settings: Settings,
}

/// Load settings and build the backend client, applying CLI overrides.
///
/// Exits with guidance when no backend URL is configured anywhere.
pub fn load_record_config(
    backend_url_flag: Option<String>,
    device_flag: Option<String>,
) -> Result<RecordConfig> {
    let settings = Settings::load();

    let backend_url = match backend_url_flag.or_else(|| settings.resolve_backend_url()) {
        Some(url) => url,
        None => {
            eprintln!("Error: No lecture backend configured.");
            eprintln!("\nSet the backend URL with:");
            eprintln!("  lectern config --backend-url https://your-backend.example\n");
            eprintln!(
                "Or set the {} environment variable.",
                lectern_core::settings::BACKEND_URL_ENV_VAR
            );
            std::process::exit(1);
        }
    };

    let backend = HttpBackend::new(backend_url, settings.resolve_api_key())?;
    let device = device_flag.or_else(|| settings.device.clone());

    Ok(RecordConfig {
        backend,
        device,
        settings,
    })
}

pub fn print_heading(text: &str) {
    println!("{}", style(text).bold());
}

pub fn print_ok(text: &str) {
    println!("{} {text}", style("✓").green());
}

pub fn print_warn(text: &str) {
    println!("{} {text}", style("!").yellow().bold());
}

pub fn print_dim(text: &str) {
    println!("{}", style(text).dim());
}
