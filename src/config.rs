//! Driver configuration
//!
//! Sources, lowest priority first:
//! 1. Built-in defaults
//! 2. An optional TOML file
//! 3. `CLICKPLC_`-prefixed environment variables (`CLICKPLC_LIMITS__MAX_READ_COILS=500`)
//!
//! ```toml
//! address = "192.168.1.10"
//! timeout_ms = 2000
//! tag_file = "plc_tags.csv"
//!
//! [limits]
//! max_read_registers = 60
//! ```

use std::net::{IpAddr, SocketAddr};
use std::path::{Path, PathBuf};
use std::time::Duration;

use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};

use crate::constants::{DEFAULT_TCP_PORT, DEFAULT_TIMEOUT_MS, DEFAULT_UNIT_ID};
use crate::device_limits::DeviceLimits;
use crate::error::{PlcError, PlcResult};
use crate::protocol::UnitId;

/// Prefix of environment variables read by [`DriverConfig::load`].
pub const ENV_PREFIX: &str = "CLICKPLC_";

/// Connection and request settings for a [`ClickPlc`](crate::ClickPlc).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DriverConfig {
    /// `host`, `host:port`, or `ip:port`. Port 502 when omitted.
    pub address: String,
    pub unit_id: UnitId,
    /// Per-request timeout in milliseconds.
    pub timeout_ms: u64,
    /// Nickname CSV export to load tags from.
    pub tag_file: Option<PathBuf>,
    pub limits: DeviceLimits,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            address: String::new(),
            unit_id: DEFAULT_UNIT_ID,
            timeout_ms: DEFAULT_TIMEOUT_MS,
            tag_file: None,
            limits: DeviceLimits::default(),
        }
    }
}

impl DriverConfig {
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            ..Self::default()
        }
    }

    pub fn with_unit_id(mut self, unit_id: UnitId) -> Self {
        self.unit_id = unit_id;
        self
    }

    pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    pub fn with_tag_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.tag_file = Some(path.into());
        self
    }

    pub fn with_limits(mut self, limits: DeviceLimits) -> Self {
        self.limits = limits;
        self
    }

    /// Load from defaults, an optional TOML file, then the environment.
    pub fn load(path: Option<&Path>) -> PlcResult<Self> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));
        if let Some(path) = path {
            if !path.exists() {
                return Err(PlcError::configuration(format!(
                    "Config file not found: {}",
                    path.display()
                )));
            }
            figment = figment.merge(Toml::file(path));
        }
        figment
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .extract()
            .map_err(|e| PlcError::configuration(format!("Failed to load configuration: {}", e)))
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn validate(&self) -> PlcResult<()> {
        if self.address.trim().is_empty() {
            return Err(PlcError::configuration("PLC address is required"));
        }
        if self.timeout_ms == 0 {
            return Err(PlcError::configuration("timeout_ms must be greater than 0"));
        }
        self.limits.validate()
    }

    /// Resolve `address` to a socket address, adding port 502 when missing.
    pub async fn resolve_addr(&self) -> PlcResult<SocketAddr> {
        let address = self.address.trim();
        if let Ok(addr) = address.parse::<SocketAddr>() {
            return Ok(addr);
        }
        if let Ok(ip) = address.parse::<IpAddr>() {
            return Ok(SocketAddr::new(ip, DEFAULT_TCP_PORT));
        }

        let host = if address.contains(':') {
            address.to_string()
        } else {
            format!("{}:{}", address, DEFAULT_TCP_PORT)
        };
        let resolved = tokio::net::lookup_host(host.as_str())
            .await?
            .next()
            .ok_or_else(|| PlcError::connection(format!("Cannot resolve {}", address)));
        resolved
    }
}
