use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{collections::HashMap, env, fs, path::Path};

use crate::compiler::PAGERDUTY_EVENTS_URL;

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub host: String,
    pub port: u16,
    pub username: Option<String>,
    pub password: Option<String>,
    pub max_connections: u32,
    pub acquire_timeout_secs: u64,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 3306,
            username: Some("mapper".to_string()),
            password: Some("mapper".to_string()),
            max_connections: 10,
            acquire_timeout_secs: 5,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct DeliveryConfig {
    pub timeout_secs: u64,
    pub pagerduty_events_url: String,
}

impl Default for DeliveryConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 10,
            pagerduty_events_url: PAGERDUTY_EVENTS_URL.to_string(),
        }
    }
}

/// A named destination in the static mapping document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct NotificationConfig {
    pub name: String,
    #[serde(default)]
    pub teams: Option<String>,
    #[serde(default)]
    pub pagerduty: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct AppConfig {
    /// Selects the MySQL store; otherwise `notifications` is served read-only.
    pub enable_mysql: bool,
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub delivery: DeliveryConfig,
    pub notifications: Vec<NotificationConfig>,
}

impl AppConfig {
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Could not read config file {}", path.display()))?;
        Self::from_toml(&contents)
    }

    pub fn from_toml(contents: &str) -> Result<Self> {
        let config: AppConfig = toml::from_str(contents).context("Invalid config document")?;
        Ok(config)
    }

    /// Applies process environment overrides: `PORT` for the listener and the
    /// database credential lookup described on [`DatabaseConfig::resolve`].
    pub fn apply_env(&mut self) -> Result<()> {
        if let Ok(port) = env::var("PORT") {
            self.server.port = port
                .parse()
                .with_context(|| format!("PORT is not a valid port number: {}", port))?;
        }

        let vcap_services = env::var("VCAP_SERVICES").ok();
        self.database = self.database.clone().resolve(vcap_services.as_deref(), |key| env::var(key).ok())?;
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
struct ServiceBinding {
    credentials: BindingCredentials,
}

#[derive(Debug, Deserialize)]
struct BindingCredentials {
    hostname: String,
    port: u16,
    username: Option<String>,
    password: Option<String>,
}

const MYSQL_SERVICE_LABEL: &str = "p.mysql";

impl DatabaseConfig {
    /// Resolves connection credentials. A platform service binding
    /// (`VCAP_SERVICES`, label `p.mysql`) wins; otherwise `DB_HOST`,
    /// `DB_PORT`, `DB_USER` and `DB_PASSWORD` override the file values.
    pub fn resolve(
        mut self,
        vcap_services: Option<&str>,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self> {
        if let Some(services) = vcap_services {
            let credentials = Self::binding_credentials(services)?;
            self.host = credentials.hostname;
            self.port = credentials.port;
            self.username = credentials.username;
            self.password = credentials.password;
            return Ok(self);
        }

        if let Some(host) = lookup("DB_HOST") {
            self.host = host;
        }
        if let Some(port) = lookup("DB_PORT") {
            self.port = port
                .parse()
                .with_context(|| format!("DB_PORT is not a valid port number: {}", port))?;
        }
        if let Some(username) = lookup("DB_USER") {
            self.username = Some(username);
        }
        if let Some(password) = lookup("DB_PASSWORD") {
            self.password = Some(password);
        }
        Ok(self)
    }

    fn binding_credentials(services: &str) -> Result<BindingCredentials> {
        let mut bindings: HashMap<String, serde_json::Value> =
            serde_json::from_str(services).context("Could not parse VCAP_SERVICES")?;

        let instances: Vec<ServiceBinding> = match bindings.remove(MYSQL_SERVICE_LABEL) {
            Some(value) => serde_json::from_value(value)
                .with_context(|| format!("Invalid {} service binding", MYSQL_SERVICE_LABEL))?,
            None => Vec::new(),
        };

        // Only a single bound MySQL instance is supported.
        let binding = instances
            .into_iter()
            .next()
            .with_context(|| format!("No {} service is bound to this application", MYSQL_SERVICE_LABEL))?;
        Ok(binding.credentials)
    }
}
