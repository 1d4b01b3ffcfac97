use crate::translation::memo::DEFAULT_MEMO_CAPACITY;
use crate::translation::provider::{DEFAULT_API_URL, DEFAULT_BATCH_SIZE};
use crate::translation::writer::DEFAULT_WRITE_QUEUE_CAPACITY;
use anyhow::{bail, Context, Result};

#[derive(Debug, Clone)]
pub struct Config {
    // Translation provider
    pub translate_api_key: String,
    pub translate_api_url: String,
    pub translate_timeout_secs: u64,
    pub translate_batch_size: usize,

    // Persistent cache (in-memory store when unset)
    pub database_url: Option<String>,

    // Caching
    pub memo_cache_capacity: usize,
    pub write_queue_capacity: usize,
    pub single_flight: bool,

    // Web server
    pub port: u16,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let config = Self {
            // Translation provider
            translate_api_key: std::env::var("TRANSLATE_API_KEY")
                .context("TRANSLATE_API_KEY not set")?,
            translate_api_url: std::env::var("TRANSLATE_API_URL")
                .unwrap_or_else(|_| DEFAULT_API_URL.to_string()),
            translate_timeout_secs: parse_env("TRANSLATE_TIMEOUT_SECS", 10)?,
            translate_batch_size: parse_env("TRANSLATE_BATCH_SIZE", DEFAULT_BATCH_SIZE)?,

            // Persistent cache
            database_url: std::env::var("DATABASE_URL")
                .ok()
                .filter(|url| !url.trim().is_empty()),

            // Caching
            memo_cache_capacity: parse_env("MEMO_CACHE_CAPACITY", DEFAULT_MEMO_CAPACITY)?,
            write_queue_capacity: parse_env("WRITE_QUEUE_CAPACITY", DEFAULT_WRITE_QUEUE_CAPACITY)?,
            single_flight: parse_bool_env("TRANSLATION_SINGLE_FLIGHT", true)?,

            // Web server
            port: parse_env("PORT", 8080)?,
        };

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.translate_api_key.trim().is_empty() {
            bail!("TRANSLATE_API_KEY must not be empty");
        }
        if self.translate_batch_size == 0 {
            bail!("TRANSLATE_BATCH_SIZE must be greater than 0");
        }
        if self.translate_timeout_secs == 0 {
            bail!("TRANSLATE_TIMEOUT_SECS must be greater than 0");
        }
        if self.memo_cache_capacity == 0 {
            bail!("MEMO_CACHE_CAPACITY must be greater than 0");
        }
        if self.write_queue_capacity == 0 {
            bail!("WRITE_QUEUE_CAPACITY must be greater than 0");
        }
        Ok(())
    }
}

/// Read a numeric variable, falling back to `default` when unset.
fn parse_env<T>(name: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(name) {
        Ok(value) => value
            .trim()
            .parse()
            .with_context(|| format!("{} has invalid value '{}'", name, value)),
        Err(_) => Ok(default),
    }
}

fn parse_bool_env(name: &str, default: bool) -> Result<bool> {
    match std::env::var(name) {
        Ok(value) => match value.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Ok(true),
            "0" | "false" | "no" | "off" => Ok(false),
            _ => bail!("{} has invalid value '{}'", name, value),
        },
        Err(_) => Ok(default),
    }
}
