//! # Configuration Loader / 配置加载器
//!
//! Reads the TOML file and hands the parsed value to
//! `GateConfig::from_toml`. Defaults and range checks live in the DTO.

use anyhow::Context;
use std::path::PathBuf;
use pg_core::config::GateConfig;

/// Load configuration from a TOML file
/// 从 TOML 文件加载配置
///
/// # Errors / 错误
///
/// Returns error if:
/// - File cannot be read (I/O error)
/// - Content is not valid TOML (parse error)
/// - A value is out of range or an unknown policy name
pub fn load_config(config_path: PathBuf) -> anyhow::Result<GateConfig> {
    let content = std::fs::read_to_string(&config_path)
        .with_context(|| format!("Failed to read config file: {}", config_path.display()))?;
    let toml_value: toml::Value = toml::from_str(&content)
        .context("Failed to parse config as TOML")?;
    GateConfig::from_toml(&toml_value)
        .with_context(|| format!("Invalid config file: {}", config_path.display()))
}
