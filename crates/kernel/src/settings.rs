use std::path::PathBuf;

use anyhow::{anyhow, Context};
use serde::{Deserialize, Serialize};

const DEFAULT_ENV: &str = "local";
const ENV_VAR_NAME: &str = "LOCALLIB_ENV";
const CONFIG_DIR_ENV: &str = "LOCALLIB_CONFIG_DIR";
const ENV_PREFIX: &str = "LOCALLIB";

/// Deployment environment the application is running in.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Local,
    Staging,
    Production,
}

impl std::str::FromStr for Environment {
    type Err = anyhow::Error;

    fn from_str(value: &str) -> anyhow::Result<Self> {
        match value {
            "local" => Ok(Environment::Local),
            "staging" => Ok(Environment::Staging),
            "production" => Ok(Environment::Production),
            other => Err(anyhow!(
                "unsupported environment '{}'; expected local/staging/production",
                other
            )),
        }
    }
}

/// Top-level configuration structure loaded from layered sources.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Settings {
    #[serde(default)]
    pub environment: Environment,
    #[serde(default)]
    pub server: ServerSettings,
    #[serde(default)]
    pub database: DatabaseSettings,
    #[serde(default)]
    pub telemetry: TelemetrySettings,
}

impl Settings {
    /// Load configuration by layering `.env`, base file, and environment overlay.
    pub fn load() -> anyhow::Result<Self> {
        // Allow missing `.env` files without failing.
        let _ = dotenvy::dotenv();

        let environment = std::env::var(ENV_VAR_NAME).unwrap_or_else(|_| DEFAULT_ENV.to_string());
        let config_dir = match std::env::var(CONFIG_DIR_ENV) {
            Ok(dir) => PathBuf::from(dir),
            Err(_) => std::env::current_dir()
                .map(|cwd| cwd.join("config"))
                .with_context(|| "unable to resolve current directory")?,
        };

        Self::load_from(&config_dir, &environment)
    }

    /// Load configuration from `config_dir` for the named environment.
    pub fn load_from(config_dir: &std::path::Path, environment: &str) -> anyhow::Result<Self> {
        let environment: Environment = environment.parse()?;

        let base_path = config_dir.join("base.toml");
        let environment_path = config_dir.join(format!("{}.toml", environment_name(&environment)));

        let builder = config::Config::builder()
            .add_source(config::File::from(base_path).required(false))
            .add_source(config::File::from(environment_path).required(false))
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__"),
            );

        let cfg = builder
            .build()
            .with_context(|| "failed to build configuration")?;

        let mut settings: Settings = cfg
            .try_deserialize()
            .with_context(|| "failed to deserialize configuration")?;

        // The selected environment wins over anything the files declare.
        settings.environment = environment;

        Ok(settings)
    }
}

fn environment_name(environment: &Environment) -> &'static str {
    match environment {
        Environment::Local => "local",
        Environment::Staging => "staging",
        Environment::Production => "production",
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerSettings {
    #[serde(default = "ServerSettings::default_host")]
    pub host: String,
    #[serde(default = "ServerSettings::default_port")]
    pub port: u16,
    #[serde(default = "ServerSettings::default_request_timeout_ms")]
    pub request_timeout_ms: u64,
}

impl ServerSettings {
    fn default_host() -> String {
        "0.0.0.0".to_string()
    }

    fn default_port() -> u16 {
        3000
    }

    fn default_request_timeout_ms() -> u64 {
        15000
    }
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: Self::default_host(),
            port: Self::default_port(),
            request_timeout_ms: Self::default_request_timeout_ms(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseSettings {
    #[serde(default = "DatabaseSettings::default_name")]
    pub name: String,
    /// Populate a small demo catalog when the catalog module starts.
    #[serde(default)]
    pub seed_demo_data: bool,
}

impl DatabaseSettings {
    fn default_name() -> String {
        "local_library".to_string()
    }
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        Self {
            name: Self::default_name(),
            seed_demo_data: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelemetrySettings {
    #[serde(default)]
    pub log_format: LogFormat,
    /// Default directive set; `RUST_LOG` takes precedence when present.
    #[serde(default = "TelemetrySettings::default_filter")]
    pub filter: String,
}

impl TelemetrySettings {
    fn default_filter() -> String {
        "info,tower_http=debug".to_string()
    }
}

impl Default for TelemetrySettings {
    fn default() -> Self {
        Self {
            log_format: LogFormat::Pretty,
            filter: Self::default_filter(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_environment_is_local() {
        let settings = Settings::default();
        assert_eq!(settings.environment, Environment::Local);
    }

    #[test]
    fn default_server_listens_on_3000() {
        let settings = Settings::default();
        assert_eq!(settings.server.port, 3000);
        assert!(!settings.database.seed_demo_data);
    }

    #[test]
    fn unknown_environment_is_rejected() {
        assert!("qa".parse::<Environment>().is_err());
        assert_eq!(
            "staging".parse::<Environment>().unwrap(),
            Environment::Staging
        );
    }

    #[test]
    fn layered_files_override_defaults() {
        let dir = std::env::temp_dir().join(format!("locallib-settings-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(
            dir.join("base.toml"),
            "[server]\nport = 4000\n[database]\nseed_demo_data = true\n",
        )
        .unwrap();
        std::fs::write(dir.join("staging.toml"), "[server]\nport = 4100\n").unwrap();

        let settings = Settings::load_from(&dir, "staging").unwrap();
        assert_eq!(settings.environment, Environment::Staging);
        assert_eq!(settings.server.port, 4100);
        assert!(settings.database.seed_demo_data);
        assert_eq!(settings.telemetry.log_format, LogFormat::Pretty);

        std::fs::remove_dir_all(&dir).ok();
    }
}
