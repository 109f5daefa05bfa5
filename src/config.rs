//! Configuration Module
//!
//! Handles loading and validating process configuration from environment
//! variables.

use std::env;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use crate::cache::{DeleteKeyMode, DEFAULT_CONCURRENCY};
use crate::error::{CacheError, Result};
use crate::store::{RedisOptions, ValueCodec};

// == Environment ==
/// Deployment environment the process runs in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Environment {
    Prod,
    Uat,
    Qa,
    Dev,
    Local,
}

impl Environment {
    /// Every environment with its canonical name.
    pub const ALL: [(&'static str, Environment); 5] = [
        ("PROD", Environment::Prod),
        ("UAT", Environment::Uat),
        ("QA", Environment::Qa),
        ("DEV", Environment::Dev),
        ("LOCAL", Environment::Local),
    ];

    pub fn name(self) -> &'static str {
        Self::ALL
            .iter()
            .find(|(_, env)| *env == self)
            .map(|(name, _)| *name)
            .unwrap_or("UNKNOWN")
    }

    pub fn is_local(self) -> bool {
        self == Environment::Local
    }
}

impl FromStr for Environment {
    type Err = CacheError;

    /// Case-insensitive lookup by name.
    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(s.trim()))
            .map(|(_, env)| *env)
            .ok_or_else(|| CacheError::Config(format!("Unknown environment provided: [{}]", s)))
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// == Store Backend ==
/// Which store binding backs the cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    /// In-process store
    Memory,
    /// Redis-compatible nodes over TCP
    Redis,
}

impl StoreBackend {
    /// Local runs default to the in-process store.
    pub fn default_for(environment: Environment) -> Self {
        if environment.is_local() {
            StoreBackend::Memory
        } else {
            StoreBackend::Redis
        }
    }
}

impl FromStr for StoreBackend {
    type Err = CacheError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "memory" => Ok(StoreBackend::Memory),
            "redis" => Ok(StoreBackend::Redis),
            other => Err(CacheError::Config(format!("unknown store backend: {}", other))),
        }
    }
}

// == Port Mappings ==
/// Which service of the deployment listens on which port.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortMapping {
    pub name: String,
    pub port: u16,
}

/// Parses `name=port` pairs separated by commas, e.g. `fix=9001,ui=9002`.
pub fn parse_port_mappings(raw: &str) -> Result<Vec<PortMapping>> {
    raw.split(',')
        .map(str::trim)
        .filter(|pair| !pair.is_empty())
        .map(|pair| {
            let (name, port) = pair.split_once('=').ok_or_else(|| {
                CacheError::Config(format!("port mapping '{}' must look like name=port", pair))
            })?;
            let port = port.trim().parse().map_err(|_| {
                CacheError::Config(format!("port mapping '{}' has an invalid port", pair))
            })?;
            Ok(PortMapping {
                name: name.trim().to_string(),
                port,
            })
        })
        .collect()
}

// == Config ==
/// Process configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub environment: Environment,
    /// Prefix isolating this process's keys in the shared store
    pub namespace: String,
    /// HTTP server host
    pub server_host: String,
    /// HTTP server port
    pub server_port: u16,
    pub backend: StoreBackend,
    /// Redis connection settings (ignored for the memory backend)
    pub redis: RedisOptions,
    /// Per-key store calls kept in flight by bulk operations
    pub concurrency: usize,
    pub delete_key_mode: DeleteKeyMode,
    /// Expired entry purge interval in seconds (memory backend)
    pub purge_interval: u64,
    pub port_mappings: Vec<PortMapping>,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `APP_ENV` - One of PROD, UAT, QA, DEV, LOCAL (required)
    /// - `CACHE_NAMESPACE` - Key prefix (default: "Testing_")
    /// - `SERVER_HOST` - HTTP host (default: 0.0.0.0)
    /// - `SERVER_PORT` - HTTP port (default: 3000)
    /// - `STORE_BACKEND` - memory or redis (default: memory for LOCAL, redis otherwise)
    /// - `REDIS_NODES` - Comma separated `redis://host:port` list
    /// - `REDIS_DATABASE` - Database index (default: 0)
    /// - `REDIS_POOL_SIZE` - Pooled connections (default: 4)
    /// - `REDIS_TIMEOUT_MS` - Per-call timeout (default: 5000)
    /// - `REDIS_CODEC` - json or raw (default: json)
    /// - `REDIS_USERNAME`, `REDIS_PASSWORD` - AUTH credentials (optional)
    /// - `PORT_MAPPINGS` - `name=port` pairs, comma separated (optional)
    /// - `CACHE_CONCURRENCY` - Bulk operation fan-out (default: 16)
    /// - `DELETE_KEY_MODE` - physical or logical (default: physical)
    /// - `PURGE_INTERVAL` - Expired entry purge in seconds (default: 1)
    pub fn from_env() -> Result<Self> {
        let raw_env = env::var("APP_ENV")
            .map_err(|_| CacheError::Config("APP_ENV is not set".to_string()))?;
        let environment: Environment = raw_env.parse()?;
        let defaults = Self::for_environment(environment);

        let backend = match env::var("STORE_BACKEND") {
            Ok(value) => value.parse()?,
            Err(_) => defaults.backend,
        };

        let nodes = env::var("REDIS_NODES")
            .map(|value| {
                value
                    .split(',')
                    .map(str::trim)
                    .filter(|node| !node.is_empty())
                    .map(String::from)
                    .collect()
            })
            .unwrap_or(defaults.redis.nodes);

        let codec = match env::var("REDIS_CODEC") {
            Ok(value) => value.parse::<ValueCodec>()?,
            Err(_) => defaults.redis.codec,
        };

        let delete_key_mode = match env::var("DELETE_KEY_MODE") {
            Ok(value) => value.parse()?,
            Err(_) => defaults.delete_key_mode,
        };

        let port_mappings = match env::var("PORT_MAPPINGS") {
            Ok(value) => parse_port_mappings(&value)?,
            Err(_) => defaults.port_mappings,
        };

        let config = Self {
            environment,
            namespace: env::var("CACHE_NAMESPACE").unwrap_or(defaults.namespace),
            server_host: env::var("SERVER_HOST").unwrap_or(defaults.server_host),
            server_port: parse_var("SERVER_PORT")?.unwrap_or(defaults.server_port),
            backend,
            redis: RedisOptions {
                nodes,
                database: parse_var("REDIS_DATABASE")?.unwrap_or(defaults.redis.database),
                pool_size: parse_var("REDIS_POOL_SIZE")?.unwrap_or(defaults.redis.pool_size),
                command_timeout: parse_var("REDIS_TIMEOUT_MS")?
                    .map(Duration::from_millis)
                    .unwrap_or(defaults.redis.command_timeout),
                username: env::var("REDIS_USERNAME").ok(),
                password: env::var("REDIS_PASSWORD").ok(),
                codec,
                scan_count: defaults.redis.scan_count,
            },
            concurrency: parse_var("CACHE_CONCURRENCY")?.unwrap_or(defaults.concurrency),
            delete_key_mode,
            purge_interval: parse_var("PURGE_INTERVAL")?.unwrap_or(defaults.purge_interval),
            port_mappings,
        };

        config.validate()?;
        Ok(config)
    }

    /// Defaults for `environment`, before any variable overrides.
    pub fn for_environment(environment: Environment) -> Self {
        Self {
            environment,
            namespace: "Testing_".to_string(),
            server_host: "0.0.0.0".to_string(),
            server_port: 3000,
            backend: StoreBackend::default_for(environment),
            redis: RedisOptions {
                nodes: Vec::new(),
                ..RedisOptions::default()
            },
            concurrency: DEFAULT_CONCURRENCY,
            delete_key_mode: DeleteKeyMode::default(),
            purge_interval: 1,
            port_mappings: Vec::new(),
        }
    }

    /// Rejects configurations the cache cannot start with.
    pub fn validate(&self) -> Result<()> {
        if self.namespace.is_empty() {
            return Err(CacheError::Config("CACHE_NAMESPACE cannot be empty".into()));
        }
        if self.concurrency == 0 {
            return Err(CacheError::Config("CACHE_CONCURRENCY must be at least 1".into()));
        }
        if self.purge_interval == 0 {
            return Err(CacheError::Config("PURGE_INTERVAL must be at least 1".into()));
        }
        for (i, mapping) in self.port_mappings.iter().enumerate() {
            if mapping.name.is_empty() {
                return Err(CacheError::Config("port mapping name cannot be empty".into()));
            }
            if self.port_mappings[..i].iter().any(|m| m.name == mapping.name) {
                return Err(CacheError::Config(format!(
                    "port mapping '{}' is declared twice",
                    mapping.name
                )));
            }
        }

        if self.backend == StoreBackend::Redis {
            if self.redis.nodes.is_empty() {
                return Err(CacheError::Config(
                    "REDIS_NODES is required for the redis backend".into(),
                ));
            }
            if self.redis.pool_size == 0 {
                return Err(CacheError::Config("REDIS_POOL_SIZE must be at least 1".into()));
            }
            if self.redis.command_timeout.is_zero() {
                return Err(CacheError::Config("REDIS_TIMEOUT_MS must be positive".into()));
            }
            for node in &self.redis.nodes {
                crate::store::parse_node_address(node)?;
            }
        }
        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::for_environment(Environment::Local)
    }
}

/// Reads and parses an optional variable; a present but unparsable value is an error.
fn parse_var<T: FromStr>(name: &str) -> Result<Option<T>> {
    match env::var(name) {
        Ok(value) => value
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| CacheError::Config(format!("{} has an invalid value: {}", name, value))),
        Err(_) => Ok(None),
    }
}
