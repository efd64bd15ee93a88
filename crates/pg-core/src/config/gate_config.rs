//! # Gate configuration DTO / 门控配置
//!
//! Maps the `[access]`, `[network]`, `[activation]` and `[storage]` TOML
//! sections onto typed values. Missing keys take the v1 defaults; present but
//! malformed values are errors.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::bail;

use super::backoff::BackoffSchedule;
use crate::access::{AccessConfig, FreeWindow, MissingContentPolicy, DEFAULT_FREE_WINDOW_DAYS};

/// Independent timeout for each call across a port boundary.
pub const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 10_000;

#[derive(Debug, Clone, PartialEq)]
pub struct GateConfig {
    pub access: AccessConfig,
    pub request_timeout: Duration,
    pub activation: BackoffSchedule,
    /// App data directory override. `None` means the platform default.
    pub data_dir: Option<PathBuf>,
}

impl GateConfig {
    pub fn defaults() -> Self {
        Self {
            access: AccessConfig::default(),
            request_timeout: Duration::from_millis(DEFAULT_REQUEST_TIMEOUT_MS),
            activation: BackoffSchedule::defaults(),
            data_dir: None,
        }
    }

    /// Create GateConfig from a TOML value.
    /// 从 TOML 值创建 GateConfig
    pub fn from_toml(toml_value: &toml::Value) -> anyhow::Result<Self> {
        let defaults = Self::defaults();
        let access = toml_value.get("access");
        let free_window_days = match access.and_then(|a| a.get("free_window_days")) {
            Some(value) => read_u32(value, "access.free_window_days")?,
            None => DEFAULT_FREE_WINDOW_DAYS,
        };
        let missing_content = match access.and_then(|a| a.get("missing_content_policy")) {
            Some(value) => parse_missing_content_policy(value)?,
            None => defaults.access.missing_content,
        };

        let network = toml_value.get("network");
        let request_timeout = match network.and_then(|n| n.get("request_timeout_ms")) {
            Some(value) => Duration::from_millis(read_u64(value, "network.request_timeout_ms")?),
            None => defaults.request_timeout,
        };

        let activation_section = toml_value.get("activation");
        let mut activation = defaults.activation.clone();
        if let Some(value) = activation_section.and_then(|a| a.get("initial_delay_ms")) {
            activation.initial_delay_ms = read_u64(value, "activation.initial_delay_ms")?;
        }
        if let Some(value) = activation_section.and_then(|a| a.get("multiplier")) {
            activation.multiplier = value
                .as_float()
                .or_else(|| value.as_integer().map(|i| i as f64))
                .ok_or_else(|| anyhow::anyhow!("activation.multiplier must be a number"))?;
        }
        if let Some(value) = activation_section.and_then(|a| a.get("max_delay_ms")) {
            activation.max_delay_ms = read_u64(value, "activation.max_delay_ms")?;
        }
        if let Some(value) = activation_section.and_then(|a| a.get("max_attempts")) {
            activation.max_attempts = read_u32(value, "activation.max_attempts")?;
        }

        let data_dir = toml_value
            .get("storage")
            .and_then(|s| s.get("data_dir"))
            .and_then(|v| v.as_str())
            .filter(|s| !s.is_empty())
            .map(PathBuf::from);

        Ok(Self {
            access: AccessConfig {
                free_window: FreeWindow::new(free_window_days),
                missing_content,
            },
            request_timeout,
            activation,
            data_dir,
        })
    }
}

impl Default for GateConfig {
    fn default() -> Self {
        Self::defaults()
    }
}

fn parse_missing_content_policy(value: &toml::Value) -> anyhow::Result<MissingContentPolicy> {
    match value.as_str() {
        Some("fail_open") => Ok(MissingContentPolicy::FailOpen),
        Some("fail_closed") => Ok(MissingContentPolicy::FailClosed),
        Some(other) => bail!("unknown access.missing_content_policy: {other}"),
        None => bail!("access.missing_content_policy must be a string"),
    }
}

fn read_u64(value: &toml::Value, key: &str) -> anyhow::Result<u64> {
    let raw = value
        .as_integer()
        .ok_or_else(|| anyhow::anyhow!("{key} must be an integer"))?;
    u64::try_from(raw).map_err(|_| anyhow::anyhow!("{key} must not be negative"))
}

fn read_u32(value: &toml::Value, key: &str) -> anyhow::Result<u32> {
    let raw = read_u64(value, key)?;
    u32::try_from(raw).map_err(|_| anyhow::anyhow!("{key} is out of range"))
}
