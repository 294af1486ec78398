use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;

const DEFAULT_ADDR: &str = "127.0.0.1:5000";

#[derive(Clone, Debug, PartialEq)]
pub struct ServerConfig {
    pub addr: SocketAddr,
    /// Directory served under `/static` (the wasm bundle and page assets).
    pub static_root: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    InvalidAddr(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::InvalidAddr(raw) => write!(f, "invalid BUSFLOW_ADDR: {raw:?}"),
        }
    }
}

impl std::error::Error for ConfigError {}

impl ServerConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the config from an arbitrary key lookup. Blank values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let raw_addr = get("BUSFLOW_ADDR").unwrap_or_else(|| DEFAULT_ADDR.to_string());
        let addr = raw_addr
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidAddr(raw_addr.clone()))?;

        Ok(Self {
            addr,
            static_root: get("BUSFLOW_STATIC_ROOT").map(PathBuf::from),
        })
    }
}
