//! Runtime settings read from the environment (optionally seeded from `.env`).

use crate::config::validate_identifier;
use crate::error::ConfigError;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};

pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_SCHEMA: &str = "crop_planner";
pub const DEFAULT_MAX_CONNECTIONS: u32 = 5;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StoreBackend {
    Memory,
    Postgres { database_url: String },
}

#[derive(Clone, Debug)]
pub struct Settings {
    pub port: u16,
    /// Bind 127.0.0.1 instead of every interface.
    pub localhost_only: bool,
    pub store: StoreBackend,
    /// Postgres schema holding the document tables.
    pub schema: String,
    pub max_connections: u32,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            port: DEFAULT_PORT,
            localhost_only: false,
            store: StoreBackend::Memory,
            schema: DEFAULT_SCHEMA.into(),
            max_connections: DEFAULT_MAX_CONNECTIONS,
        }
    }
}

impl Settings {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build settings from any key lookup; `from_env` passes the process environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let port = match get("PORT") {
            Some(v) => v.parse().map_err(|_| ConfigError::InvalidValue {
                key: "PORT",
                reason: format!("{} is not a port number", v),
            })?,
            None => DEFAULT_PORT,
        };
        let localhost_only = get("LOCALHOST_ONLY").map(|v| is_truthy(&v)).unwrap_or(false);
        let database_url = get("DATABASE_URL").or_else(|| get("DATABASEURL"));
        let store = match get("STORE").map(|s| s.to_lowercase()).as_deref() {
            Some("memory") => StoreBackend::Memory,
            Some("postgres") => StoreBackend::Postgres {
                database_url: database_url.ok_or(ConfigError::MissingDatabaseUrl("STORE=postgres"))?,
            },
            Some(other) => return Err(ConfigError::UnknownStore(other.to_string())),
            None => match database_url {
                Some(database_url) => StoreBackend::Postgres { database_url },
                None => StoreBackend::Memory,
            },
        };
        let schema = get("CROP_PLANNER_SCHEMA").unwrap_or_else(|| DEFAULT_SCHEMA.into());
        validate_identifier("CROP_PLANNER_SCHEMA", &schema)?;
        let max_connections = match get("DB_MAX_CONNECTIONS") {
            Some(v) => match v.parse::<u32>() {
                Ok(n) if n > 0 => n,
                _ => {
                    return Err(ConfigError::InvalidValue {
                        key: "DB_MAX_CONNECTIONS",
                        reason: format!("{} is not a positive integer", v),
                    })
                }
            },
            None => DEFAULT_MAX_CONNECTIONS,
        };

        Ok(Settings {
            port,
            localhost_only,
            store,
            schema,
            max_connections,
        })
    }

    pub fn bind_addr(&self) -> SocketAddr {
        let ip = if self.localhost_only {
            IpAddr::V4(Ipv4Addr::LOCALHOST)
        } else {
            IpAddr::V4(Ipv4Addr::UNSPECIFIED)
        };
        SocketAddr::new(ip, self.port)
    }
}

fn is_truthy(v: &str) -> bool {
    !matches!(v.to_lowercase().as_str(), "0" | "false" | "no" | "off")
}
