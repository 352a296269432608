//! Handles settings for the application. Configuration is written in
//! `pocketbook.toml`, with `POCKETBOOK_*` environment overrides.

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct Sqlite {
    pub path: String,
}

#[derive(Debug, Deserialize)]
pub struct App {
    pub level: String,
}

#[derive(Debug, Deserialize)]
pub struct Settings {
    pub sqlite: Sqlite,
    pub app: App,
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .set_default("sqlite.path", "./pocketbook.db")?
            .set_default("app.level", "info")?
            .add_source(File::with_name("pocketbook").required(false))
            .add_source(Environment::with_prefix("POCKETBOOK").separator("__"))
            .build()?;

        settings.try_deserialize()
    }
}
