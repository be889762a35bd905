//! Application configuration.
//!
//! Defaults suit local development. `Config::from_env` reads the `MONO_*`
//! variables; anything the builder sets afterwards wins.
//!
//! | Variable              | Field            | Default          |
//! |-----------------------|------------------|------------------|
//! | `MONO_ADDR`           | `addr`           | `127.0.0.1:8080` |
//! | `MONO_DEBUG`          | `debug`          | `false`          |
//! | `MONO_TEMPLATES`      | `templates`      | unset            |
//! | `MONO_MAP_ATTRIBUTES` | `map_attributes` | `true`           |
//! | `MONO_MAX_BODY_BYTES` | `max_body_bytes` | `2097152` (2 MiB) |

use std::net::SocketAddr;
use std::path::PathBuf;

use serde::Deserialize;

use crate::error::Error;

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Address [`Mono::run`](crate::Mono::run) binds to.
    pub addr: SocketAddr,
    /// Re-raise pipeline errors instead of answering a generic 500.
    pub debug: bool,
    /// Template folder. Templates stay disabled when unset or missing.
    pub templates: Option<PathBuf>,
    /// Run the attribute-mapping stage. When off, `MapTo` arguments are
    /// mapped just before the handler is called, after user middleware.
    pub map_attributes: bool,
    /// Largest request body the server buffers. Longer bodies get `413`.
    pub max_body_bytes: usize,
}

const DEFAULT_MAX_BODY_BYTES: usize = 2 * 1024 * 1024;

impl Default for Config {
    fn default() -> Self {
        Self {
            addr: SocketAddr::from(([127, 0, 0, 1], 8080)),
            debug: false,
            templates: None,
            map_attributes: true,
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, Error> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, Error> {
        let mut config = Self::default();

        if let Some(addr) = lookup("MONO_ADDR") {
            config.addr = addr
                .parse()
                .map_err(|e| Error::Config(format!("MONO_ADDR `{addr}`: {e}")))?;
        }
        if let Some(debug) = lookup("MONO_DEBUG") {
            config.debug = parse_flag("MONO_DEBUG", &debug)?;
        }
        if let Some(folder) = lookup("MONO_TEMPLATES").filter(|f| !f.is_empty()) {
            config.templates = Some(folder.into());
        }
        if let Some(map) = lookup("MONO_MAP_ATTRIBUTES") {
            config.map_attributes = parse_flag("MONO_MAP_ATTRIBUTES", &map)?;
        }
        if let Some(limit) = lookup("MONO_MAX_BODY_BYTES") {
            config.max_body_bytes = limit
                .trim()
                .parse()
                .map_err(|e| Error::Config(format!("MONO_MAX_BODY_BYTES `{limit}`: {e}")))?;
        }

        Ok(config)
    }
}

fn parse_flag(key: &str, value: &str) -> Result<bool, Error> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        other => Err(Error::Config(format!("{key} `{other}` is not a boolean"))),
    }
}
