use lettre::message::Mailbox;
use serde::{Deserialize, Deserializer};

use std::{env, fs, path::Path, time::Duration};

const DEFAULT_LISTEN_PORT: u16 = 8080;
const CONFIG_PATH_VAR: &str = "NOTIFICATION_SERVICE_CONFIG";
const DEFAULT_CONFIG_FILE: &str = "config.yaml";
const ENV_FILE: &str = ".env";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },

    #[error("Failed to parse YAML config: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Failed to load config from environment variables: {0}")]
    Env(#[from] envy::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Clone, Deserialize)]
pub struct Config {
    pub jwt_verify_url: String,
    pub smtp_host: String,
    pub smtp_port: u16,
    #[serde(default)]
    pub smtp_user: String,
    #[serde(default)]
    pub smtp_pass: String,
    #[serde(default = "default_listen_port", deserialize_with = "listen_port")]
    pub port: u16,
    #[serde(default, with = "humantime_serde")]
    pub verify_timeout: Option<Duration>,
    #[serde(default, with = "humantime_serde")]
    pub smtp_timeout: Option<Duration>,
}

// Hand-written so the SMTP password never ends up in a log line.
impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("jwt_verify_url", &self.jwt_verify_url)
            .field("smtp_host", &self.smtp_host)
            .field("smtp_port", &self.smtp_port)
            .field("smtp_user", &self.smtp_user)
            .field("smtp_pass", &"<redacted>")
            .field("port", &self.port)
            .field("verify_timeout", &self.verify_timeout)
            .field("smtp_timeout", &self.smtp_timeout)
            .finish()
    }
}

const fn default_listen_port() -> u16 {
    DEFAULT_LISTEN_PORT
}

/// Accepts both `8080` and the `:8080` address form.
fn listen_port<'de, D>(deserializer: D) -> Result<u16, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Port {
        Number(u16),
        Text(String),
    }

    match Port::deserialize(deserializer)? {
        Port::Number(port) => Ok(port),
        Port::Text(text) => {
            let text = text.trim();
            let text = text.strip_prefix(':').unwrap_or(text);
            if text.is_empty() {
                return Ok(DEFAULT_LISTEN_PORT);
            }
            text.parse::<u16>()
                .map_err(|e| serde::de::Error::custom(format!("invalid port '{text}': {e}")))
        }
    }
}

impl Config {
    pub fn from_yaml_str(contents: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yaml::from_str(contents)?;
        config.validate()
    }

    pub fn from_env_vars<I>(vars: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let config: Self = envy::from_iter(vars)?;
        config.validate()
    }

    fn validate(self) -> Result<Self, ConfigError> {
        if self.smtp_host.trim().is_empty() {
            return Err(ConfigError::Invalid("smtp_host must not be empty".into()));
        }

        // Every message is sent from the SMTP user
        if let Err(e) = self.smtp_user.parse::<Mailbox>() {
            return Err(ConfigError::Invalid(format!(
                "smtp_user '{}' is not a valid sender address: {e}",
                self.smtp_user
            )));
        }

        let url = reqwest::Url::parse(&self.jwt_verify_url).map_err(|e| {
            ConfigError::Invalid(format!(
                "jwt_verify_url '{}' is not a valid URL: {e}",
                self.jwt_verify_url
            ))
        })?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(ConfigError::Invalid(format!(
                "jwt_verify_url must use http or https, got '{}'",
                url.scheme()
            )));
        }

        Ok(self)
    }
}

fn read_yaml(path: &str) -> Result<Config, ConfigError> {
    let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_string(),
        source,
    })?;
    Config::from_yaml_str(&contents)
}

#[derive(Debug, PartialEq, Eq)]
enum ConfigSource {
    File(String),
    Environment,
}

/// A config file, when one is found, replaces the environment entirely.
fn select_source(explicit: Option<String>, exists: impl Fn(&str) -> bool) -> ConfigSource {
    if let Some(config_path) = explicit {
        if exists(&config_path) {
            return ConfigSource::File(config_path);
        }
        tracing::warn!("Config file '{}' not found", config_path);
    }

    if exists(DEFAULT_CONFIG_FILE) {
        return ConfigSource::File(DEFAULT_CONFIG_FILE.to_string());
    }

    ConfigSource::Environment
}

/// Loads variables from an env file, keeping values that are already set.
fn load_env_file(path: &Path) -> bool {
    match dotenvy::from_path(path) {
        Ok(()) => true,
        Err(e) => {
            tracing::info!(
                "No {} file loaded ({e}), continuing without it",
                path.display()
            );
            false
        }
    }
}

pub fn load_config() -> Result<Config, ConfigError> {
    load_env_file(Path::new(ENV_FILE));

    match select_source(env::var(CONFIG_PATH_VAR).ok(), |p| Path::new(p).exists()) {
        ConfigSource::File(path) => {
            tracing::info!(
                "Loading configuration from '{}', environment variables are ignored",
                path
            );
            read_yaml(&path)
        }
        ConfigSource::Environment => {
            tracing::info!(
                "No config file found, loading configuration from environment variables"
            );
            Config::from_env_vars(env::vars())
        }
    }
}
