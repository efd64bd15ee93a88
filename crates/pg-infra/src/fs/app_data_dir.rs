use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

const APP_DIR_NAME: &str = "PremiumGate";

/// Get the Premium Gate application data root directory.
///
/// 获取应用数据根目录。
///
/// # Platform-specific Paths / 平台特定路径
/// - macOS: ~/Library/Application Support/PremiumGate
/// - Windows: %APPDATA%\PremiumGate
/// - Linux: $XDG_DATA_HOME/PremiumGate or ~/.local/share/PremiumGate
///
/// The directory is not created here; callers create it when they write.
pub fn app_data_dir() -> Result<PathBuf> {
    let base_dir =
        get_platform_data_dir().context("Failed to get platform-specific data directory")?;

    Ok(base_dir.join(APP_DIR_NAME))
}

/// Configured data directory if any, platform default otherwise.
pub fn resolve_data_dir(configured: Option<&Path>) -> Result<PathBuf> {
    match configured {
        Some(dir) => Ok(dir.to_path_buf()),
        None => app_data_dir(),
    }
}

fn get_platform_data_dir() -> Result<PathBuf> {
    // 优先使用 XDG_DATA_HOME
    #[cfg(target_os = "linux")]
    if let Some(xdg_data_home) = std::env::var_os("XDG_DATA_HOME") {
        return Ok(PathBuf::from(xdg_data_home));
    }

    dirs::data_dir().ok_or_else(|| anyhow::anyhow!("Unable to get platform data directory"))
}
