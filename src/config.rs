use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// brew 可执行文件，可为绝对路径
    pub brew_command: String,
    pub show_formulae: bool,
    pub show_casks: bool,
    /// 选中变化后等待多久才加载详情
    pub debounce_ms: u64,
    /// 操作日志最多保留的条数
    pub log_capacity: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            brew_command: "brew".to_string(),
            show_formulae: true,
            show_casks: true,
            debounce_ms: 200,
            log_capacity: 1000,
        }
    }
}

/// ~/.config/brewdash
pub fn config_dir() -> PathBuf {
    let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
    PathBuf::from(home).join(".config/brewdash")
}

impl Config {
    pub fn path() -> PathBuf {
        config_dir().join("config.toml")
    }

    /// 读取配置；首次运行时写入默认配置，文件损坏时退回默认值
    pub fn load_or_default() -> Self {
        let path = Self::path();
        match Self::load_from(&path) {
            Ok(Some(config)) => config,
            Ok(None) => {
                let config = Self::default();
                if let Err(e) = config.save_to(&path) {
                    log::warn!("写入默认配置失败: {:#}", e);
                }
                config
            }
            Err(e) => {
                log::warn!("读取配置失败，使用默认值: {:#}", e);
                Self::default()
            }
        }
    }

    /// 文件不存在时返回 `Ok(None)`
    pub fn load_from(path: &Path) -> Result<Option<Self>> {
        if !path.exists() {
            return Ok(None);
        }
        let content = fs::read_to_string(path)
            .with_context(|| format!("读取 {} 失败", path.display()))?;
        let config: Config = toml::from_str(&content)
            .with_context(|| format!("解析 {} 失败", path.display()))?;
        Ok(Some(config))
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir)?;
        }
        fs::write(path, toml::to_string_pretty(self)?)?;
        Ok(())
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    pub fn log_capacity(&self) -> usize {
        self.log_capacity.max(1)
    }
}

// ===== 收藏 =====

pub fn favorites_path() -> PathBuf {
    config_dir().join("favorites.json")
}

/// 读取收藏列表，文件不存在时为空
pub fn load_favorites(path: &Path) -> Result<Vec<String>> {
    if !path.exists() {
        return Ok(Vec::new());
    }
    let content = fs::read_to_string(path)?;
    let favorites: Vec<String> = serde_json::from_str(&content)
        .with_context(|| format!("解析 {} 失败", path.display()))?;
    Ok(favorites)
}

pub fn save_favorites(path: &Path, favorites: &[String]) -> Result<()> {
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir)?;
    }
    fs::write(path, serde_json::to_string_pretty(favorites)?)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_config_is_none() {
        let dir = tempfile::tempdir().unwrap();
        assert!(Config::load_from(&dir.path().join("config.toml")).unwrap().is_none());
    }

    #[test]
    fn test_config_roundtrip_creates_parent() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/config.toml");
        let config = Config {
            debounce_ms: 50,
            show_casks: false,
            ..Config::default()
        };
        config.save_to(&path).unwrap();
        assert_eq!(Config::load_from(&path).unwrap(), Some(config));
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "log_capacity = 0\n").unwrap();
        let config = Config::load_from(&path).unwrap().unwrap();
        assert_eq!(config.brew_command, "brew");
        assert_eq!(config.debounce(), Duration::from_millis(200));
        assert_eq!(config.log_capacity(), 1);
    }

    #[test]
    fn test_malformed_config_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "debounce_ms = \"soon\"").unwrap();
        assert!(Config::load_from(&path).is_err());
    }

    #[test]
    fn test_favorites_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("favorites.json");
        assert!(load_favorites(&path).unwrap().is_empty());
        save_favorites(&path, &["wget".to_string(), "git".to_string()]).unwrap();
        assert_eq!(load_favorites(&path).unwrap(), vec!["wget", "git"]);
    }
}
