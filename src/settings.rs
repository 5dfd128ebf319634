use std::env;

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct Postgres {
    pub url: String,
    pub max_connections: u32,
}

#[derive(Debug, Deserialize)]
pub struct Http {
    pub host: String,
    pub port: u16,
    pub allowed_origins: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct Mail {
    pub host: String,
    pub port: Option<u16>,
    pub user: String,
    pub password: String,
    pub sender: Option<String>,
}

impl Mail {
    /// Address used in the `from` field; the provider account unless overridden.
    pub fn sender_address(&self) -> &str {
        self.sender.as_deref().unwrap_or(&self.user)
    }
}

#[derive(Debug, Deserialize)]
pub struct Settings {
    pub postgres: Postgres,
    pub http: Http,
    pub mail: Mail,
}

/// Plain process variables honoured on top of the layered configuration.
const ENV_OVERRIDES: [(&str, &str); 5] = [
    ("postgres.url", "DATABASE_URL"),
    ("http.port", "PORT"),
    ("mail.user", "EMAIL_HOST_USER"),
    ("mail.password", "EMAIL_HOST_PASSWORD"),
    ("mail.sender", "GMAIL_USER"),
];

impl Settings {
    pub fn new(path: &str) -> Result<Self, ConfigError> {
        Self::load(path, |key| env::var(key).ok())
    }

    fn load(path: &str, lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut builder = Config::builder()
            .set_default("postgres.max_connections", 5)?
            .set_default("http.host", "0.0.0.0")?
            .set_default("mail.host", "smtp.gmail.com")?
            .set_default("http.port", 5001)?
            .set_default(
                "http.allowed_origins",
                vec!["http://localhost:5173", "http://localhost:5001"],
            )?
            .add_source(File::with_name(path).required(false))
            .add_source(
                Environment::with_prefix("REFERRAL")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("http.allowed_origins")
                    .try_parsing(true),
            );

        for (key, variable) in ENV_OVERRIDES {
            builder = builder.set_override_option(key, lookup(variable))?;
        }

        builder.build()?.try_deserialize()
    }
}
