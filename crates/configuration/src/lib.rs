use crate::error::ConfigError;

// Declare the modules that make up this crate.
pub mod error;
pub mod settings;

// Re-export the core types to provide a clean public API.
pub use settings::{DatabaseSettings, Settings};

/// Loads the application settings.
///
/// Sources are layered, later ones overriding earlier ones:
/// 1. built-in defaults (a developer workstation talking to localhost),
/// 2. an optional `config.toml` next to the running program,
/// 3. `KHARID_*` environment variables (e.g. `KHARID_DATABASE__HOST`).
pub fn load_settings() -> Result<Settings, ConfigError> {
    let builder = config::Config::builder()
        .set_default("database.host", "localhost")?
        .set_default("database.port", 5432)?
        .set_default("database.database", "purchase_requests")?
        .set_default("database.user", "postgres")?
        .set_default("database.password", "")?
        .set_default("database.min_connections", 1)?
        .set_default("database.max_connections", 5)?
        .set_default("database.acquire_timeout_secs", 5)?
        // Missing file is fine; the defaults and environment carry it.
        .add_source(config::File::with_name("config").required(false))
        .add_source(config::Environment::with_prefix("KHARID").separator("__"))
        .build()?;

    let settings = builder.try_deserialize::<Settings>()?;
    settings.database.validate()?;

    Ok(settings)
}
