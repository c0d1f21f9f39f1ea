use chrono::{Datelike, Utc};
use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use dotenv::dotenv;
use std::{env, fmt, str::FromStr};
use url::Url;

use crate::{date_codec::DateRange, entities::profile::OwnerMode, use_cases::fallback::StatusFallbackPolicy};

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum AppEnvironment {
    Development,
    Production,
    Testing,
}

impl FromStr for AppEnvironment {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "development" => Ok(AppEnvironment::Development),
            "production" => Ok(AppEnvironment::Production),
            "testing" => Ok(AppEnvironment::Testing),
            _ => Err(ConfigError::Message(format!("Invalid environment: {}", s))),
        }
    }
}

#[derive(Deserialize, Clone)]
#[serde(rename_all = "snake_case")]
pub struct AppConfig {
    #[serde(default = "default_env")]
    pub env: AppEnvironment,

    #[serde(default = "default_name")]
    pub name: String,

    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_worker_count")]
    pub worker_count: usize,

    #[serde(default = "default_cors_origins")]
    pub cors_allowed_origins: Vec<String>,

    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,

    #[serde(default)]
    pub api_token: Option<String>,

    #[serde(default = "default_api_timeout")]
    pub api_timeout_secs: u64,

    #[serde(default = "default_storage_path")]
    pub storage_path: String,

    #[serde(default = "default_storage_quota")]
    pub storage_quota_bytes: usize,

    /// Explicit owner toggle; unset defers to the stored toggle, then the profile.
    #[serde(default)]
    pub owner_mode: Option<bool>,

    #[serde(default = "default_min_year")]
    pub min_year: i32,

    #[serde(default = "default_years_ahead")]
    pub years_ahead: i32,

    #[serde(default)]
    pub fallback_on_server_error: bool,
}

fn default_env() -> AppEnvironment {
    AppEnvironment::Development
}
fn default_name() -> String {
    "Portfolio-Education".to_string()
}
fn default_port() -> u16 {
    8080
}
fn default_host() -> String {
    "127.0.0.1".to_string()
}
fn default_worker_count() -> usize {
    num_cpus::get()
}
fn default_cors_origins() -> Vec<String> {
    vec!["*".to_string()]
}
fn default_api_base_url() -> String {
    "http://127.0.0.1:5202/".to_string()
}
fn default_api_timeout() -> u64 {
    20
}
fn default_storage_path() -> String {
    "data/local_storage.json".to_string()
}
fn default_storage_quota() -> usize {
    5 * 1024 * 1024
}
fn default_min_year() -> i32 {
    1970
}
fn default_years_ahead() -> i32 {
    10
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            env: default_env(),
            name: default_name(),
            port: default_port(),
            host: default_host(),
            worker_count: default_worker_count(),
            cors_allowed_origins: default_cors_origins(),
            api_base_url: default_api_base_url(),
            api_token: None,
            api_timeout_secs: default_api_timeout(),
            storage_path: default_storage_path(),
            storage_quota_bytes: default_storage_quota(),
            owner_mode: None,
            min_year: default_min_year(),
            years_ahead: default_years_ahead(),
            fallback_on_server_error: false,
        }
    }
}

impl AppConfig {
    pub fn new() -> Result<Self, ConfigError> {
        dotenv().ok();

        let raw_env = env::var("APP_ENV").unwrap_or_else(|_| "development".into());
        let env_name = AppEnvironment::from_str(&raw_env)
            .map_err(|_| ConfigError::Message(format!("Invalid APP_ENV value: {}", raw_env)))?;

        let builder = Config::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", env_name.to_string().to_lowercase())).required(false))
            .add_source(
                Environment::with_prefix("APP")
                    .prefix_separator("_")
                    .try_parsing(true)
                    .list_separator(",")
                    .with_list_parse_key("cors_allowed_origins")
                    .ignore_empty(true),
            );

        let mut config: Self = builder.build()?.try_deserialize()?;

        config.env = env_name;

        if config.api_token.is_none() {
            config.api_token = env::var("APP_API_TOKEN").ok().filter(|t| !t.trim().is_empty());
        }

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut errors = Vec::new();

        if Url::parse(&self.api_base_url).is_err() {
            errors.push("API_BASE_URL must be an absolute URL".to_string());
        }
        if self.api_timeout_secs == 0 {
            errors.push("API_TIMEOUT_SECS must be greater than zero".to_string());
        }
        if self.storage_path.trim().is_empty() {
            errors.push("STORAGE_PATH cannot be empty".to_string());
        }
        if self.min_year > Utc::now().year() {
            errors.push(format!("MIN_YEAR cannot be in the future ({})", self.min_year));
        }
        if self.years_ahead < 0 {
            errors.push("YEARS_AHEAD cannot be negative".to_string());
        }
        if self.is_production() && self.cors_origins().iter().any(|o| o == "*") {
            errors.push("Wildcard CORS (*) is not allowed in production".to_string());
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Message(errors.join(", ")))
        }
    }

    pub fn is_production(&self) -> bool {
        self.env == AppEnvironment::Production
    }

    pub fn cors_origins(&self) -> Vec<String> {
        self.cors_allowed_origins
            .iter()
            .flat_map(|origin| origin.split(','))
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect()
    }

    /// Base URL with a trailing slash so relative API paths join beneath it.
    pub fn api_base(&self) -> Result<Url, url::ParseError> {
        let mut raw = self.api_base_url.trim().to_string();
        if !raw.ends_with('/') {
            raw.push('/');
        }
        Url::parse(&raw)
    }

    pub fn date_range(&self) -> DateRange {
        DateRange::from_now(self.min_year, self.years_ahead)
    }

    pub fn fallback_policy(&self) -> StatusFallbackPolicy {
        StatusFallbackPolicy::new(self.fallback_on_server_error)
    }

    /// The configured toggle, or the stored one when the config leaves it unset.
    pub fn owner_mode(&self, stored: Option<&str>) -> OwnerMode {
        match self.owner_mode {
            Some(flag) => OwnerMode::from(Some(flag)),
            None => OwnerMode::from_stored(stored),
        }
    }
}

impl fmt::Display for AppEnvironment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            AppEnvironment::Development => "development",
            AppEnvironment::Production => "production",
            AppEnvironment::Testing => "testing",
        };
        write!(f, "{s}")
    }
}

trait Redact {
    fn redact(&self) -> &str;
}

impl Redact for Option<String> {
    fn redact(&self) -> &str {
        match self.as_deref() {
            None | Some("") => "[MISSING]",
            Some(_) => "[REDACTED]",
        }
    }
}

impl fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppConfig")
            .field("env", &self.env)
            .field("name", &self.name)
            .field("port", &self.port)
            .field("host", &self.host)
            .field("worker_count", &self.worker_count)
            .field("cors_allowed_origins", &self.cors_allowed_origins)
            .field("api_base_url", &self.api_base_url)
            .field("api_token", &self.api_token.redact())
            .field("api_timeout_secs", &self.api_timeout_secs)
            .field("storage_path", &self.storage_path)
            .field("storage_quota_bytes", &self.storage_quota_bytes)
            .field("owner_mode", &self.owner_mode)
            .field("min_year", &self.min_year)
            .field("years_ahead", &self.years_ahead)
            .field("fallback_on_server_error", &self.fallback_on_server_error)
            .finish()
    }
}
