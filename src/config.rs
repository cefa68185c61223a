//! Application configuration module / 应用配置模块
//!
//! Manages application configuration loaded from config.json
//! Creates default config file on first run / 首次运行时创建默认配置文件
//!
//! `SOLR_URL` and `THESIS_SEARCH_PORT` override the file at load time and are never
//! written back.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::solr::{ConnectionSettings, DEFAULT_TIMEOUT, QUEUE_THRESHOLD};

/// Environment override for the Solr base URL / Solr 地址环境变量
pub const ENV_SOLR_URL: &str = "SOLR_URL";
/// Environment override for the listen port / 端口环境变量
pub const ENV_PORT: &str = "THESIS_SEARCH_PORT";

/// Application configuration / 应用配置
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    /// Server configuration / 服务器配置
    #[serde(default)]
    pub server: ServerConfig,
    /// Solr configuration / Solr 配置
    #[serde(default)]
    pub solr: SolrConfig,
}

/// Server configuration / 服务器配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Server host address / 服务器监听地址
    pub host: String,
    /// Server port / 服务器端口
    pub port: u16,
}

/// Solr configuration / Solr 配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SolrConfig {
    /// Base URL, e.g. `http://localhost:8983/solr` / Solr 基础地址
    pub url: String,
    /// Request timeout in seconds / 请求超时（秒）
    pub timeout_secs: u64,
    /// Documents queued per core before submission / 每个核心的提交阈值
    pub queue_threshold: usize,
    /// Commit with every batch / 每批提交后 commit
    pub commit: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
        }
    }
}

impl Default for SolrConfig {
    fn default() -> Self {
        Self {
            url: "http://localhost:8983/solr".to_string(),
            timeout_secs: DEFAULT_TIMEOUT.as_secs(),
            queue_threshold: QUEUE_THRESHOLD,
            commit: true,
        }
    }
}

impl SolrConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.max(1))
    }

    pub fn connection_settings(&self) -> ConnectionSettings {
        ConnectionSettings {
            queue_threshold: self.queue_threshold,
            commit: self.commit,
        }
    }
}

impl AppConfig {
    /// Get the server bind address / 获取服务器绑定地址
    pub fn get_bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    /// Apply environment overrides / 应用环境变量覆盖
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup(ENV_SOLR_URL).filter(|v| !v.trim().is_empty()) {
            self.solr.url = url;
        }
        if let Some(port) = lookup(ENV_PORT).filter(|v| !v.trim().is_empty()) {
            self.server.port = port
                .trim()
                .parse()
                .with_context(|| format!("{} is not a valid port: {}", ENV_PORT, port))?;
        }
        Ok(())
    }
}

/// Get the config file path / 获取配置文件路径
fn get_config_path() -> PathBuf {
    std::env::current_dir()
        .unwrap_or_else(|_| PathBuf::from("."))
        .join("config.json")
}

/// Load configuration from file, or create default if not exists / 加载配置文件，不存在则创建默认配置
pub fn load_config() -> Result<AppConfig> {
    let mut config = load_config_from(&get_config_path())?;
    config.apply_env(|key| std::env::var(key).ok())?;
    Ok(config)
}

/// Load (or create) the configuration at a given path, without env overrides / 从指定路径加载
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    if path.exists() {
        // Load existing config / 加载现有配置
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {:?}", path))?;

        let config: AppConfig = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config file {:?}", path))?;

        tracing::info!("Loaded configuration from {:?}", path);
        Ok(config)
    } else {
        // Create default config / 创建默认配置
        let config = AppConfig::default();
        save_config_to(&config, path)?;
        tracing::info!("Created default configuration at {:?}", path);
        Ok(config)
    }
}

/// Save configuration to file / 保存配置到文件
fn save_config_to(config: &AppConfig, path: &Path) -> Result<()> {
    let content = serde_json::to_string_pretty(config).context("Failed to serialize config")?;

    std::fs::write(path, content)
        .with_context(|| format!("Failed to write config file {:?}", path))?;

    Ok(())
}
