// 配置管理模块

pub mod path_validator;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use tokio::fs;

pub use path_validator::{PathValidationResult, PathValidator};

/// 应用配置
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppConfig {
    /// 服务器配置
    #[serde(default)]
    pub server: ServerConfig,
    /// 文件系统配置
    #[serde(default)]
    pub filesystem: FilesystemConfig,
    /// 缩略图配置
    #[serde(default)]
    pub thumbnail: ThumbnailConfig,
    /// 日志配置
    #[serde(default)]
    pub log: LogConfig,
}

/// 日志配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogConfig {
    /// 是否启用日志文件持久化
    #[serde(default = "default_log_enabled")]
    pub enabled: bool,
    /// 日志文件保存目录
    #[serde(default = "default_log_dir")]
    pub log_dir: PathBuf,
    /// 日志保留天数（默认 7 天）
    #[serde(default = "default_log_retention_days")]
    pub retention_days: u32,
    /// 日志级别（默认 info）
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_log_enabled() -> bool {
    false
}

fn default_log_dir() -> PathBuf {
    PathBuf::from("logs")
}

fn default_log_retention_days() -> u32 {
    7
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            enabled: default_log_enabled(),
            log_dir: default_log_dir(),
            retention_days: default_log_retention_days(),
            level: default_log_level(),
        }
    }
}

/// 服务器配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// 监听地址（局域网访问需要 0.0.0.0）
    #[serde(default = "default_host")]
    pub host: String,
    /// 监听端口
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    3000
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl ServerConfig {
    /// 监听地址字符串，形如 `0.0.0.0:3000`
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// 文件系统配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FilesystemConfig {
    /// 对外暴露的根目录，进程生命周期内不可变
    #[serde(default = "default_root_dir")]
    pub root_dir: PathBuf,
}

/// 默认根目录：用户主目录，取不到时退回当前目录
fn default_root_dir() -> PathBuf {
    dirs::home_dir()
        .or_else(|| std::env::current_dir().ok())
        .unwrap_or_else(|| PathBuf::from("."))
}

impl Default for FilesystemConfig {
    fn default() -> Self {
        Self {
            root_dir: default_root_dir(),
        }
    }
}

/// 缩略图配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThumbnailConfig {
    /// 缩略图边长（像素），按 cover 方式裁剪到正方形
    #[serde(default = "default_thumbnail_size")]
    pub size: u32,
    /// JPEG 压缩质量（1-100）
    #[serde(default = "default_thumbnail_quality")]
    pub quality: u8,
    /// 视频截帧时间点（秒）
    #[serde(default = "default_video_offset_secs")]
    pub video_offset_secs: f64,
    /// 单次截帧超时（秒）
    #[serde(default = "default_extract_timeout_secs")]
    pub extract_timeout_secs: u64,
    /// ffmpeg 可执行文件路径
    #[serde(default = "default_ffmpeg_path")]
    pub ffmpeg_path: PathBuf,
    /// 截帧临时目录（为空时使用系统临时目录）
    #[serde(default)]
    pub temp_dir: Option<PathBuf>,
}

fn default_thumbnail_size() -> u32 {
    200
}

fn default_thumbnail_quality() -> u8 {
    80
}

fn default_video_offset_secs() -> f64 {
    1.0
}

fn default_extract_timeout_secs() -> u64 {
    15
}

fn default_ffmpeg_path() -> PathBuf {
    PathBuf::from("ffmpeg")
}

impl Default for ThumbnailConfig {
    fn default() -> Self {
        Self {
            size: default_thumbnail_size(),
            quality: default_thumbnail_quality(),
            video_offset_secs: default_video_offset_secs(),
            extract_timeout_secs: default_extract_timeout_secs(),
            ffmpeg_path: default_ffmpeg_path(),
            temp_dir: None,
        }
    }
}

impl ThumbnailConfig {
    /// 截帧超时
    pub fn extract_timeout(&self) -> Duration {
        Duration::from_secs(self.extract_timeout_secs.max(1))
    }

    /// 实际使用的临时目录
    pub fn resolved_temp_dir(&self) -> PathBuf {
        self.temp_dir.clone().unwrap_or_else(std::env::temp_dir)
    }

    /// 质量限制在 1-100
    pub fn clamped_quality(&self) -> u8 {
        self.quality.clamp(1, 100)
    }
}

impl AppConfig {
    /// 从文件加载配置
    pub async fn load_from_file(path: &str) -> Result<Self> {
        let content = fs::read_to_string(path)
            .await
            .context("Failed to read config file")?;

        let config: AppConfig = toml::from_str(&content).context("Failed to parse config file")?;

        Ok(config)
    }

    /// 保存配置到文件
    pub async fn save_to_file(&self, path: &str) -> Result<()> {
        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;

        // 确保父目录存在
        if let Some(parent) = std::path::Path::new(path).parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)
                    .await
                    .context("Failed to create config directory")?;
            }
        }

        fs::write(path, content)
            .await
            .context("Failed to write config file")?;

        tracing::info!("✓ 配置已保存: {}", path);

        Ok(())
    }

    /// 加载配置，文件不存在或解析失败时使用默认配置（不回写文件）
    pub async fn load_or_default(path: &str) -> Self {
        match Self::load_from_file(path).await {
            Ok(config) => {
                tracing::info!("配置文件加载成功: {}", path);
                config
            }
            Err(e) => {
                tracing::warn!("配置文件加载失败，使用默认配置: {:#}", e);
                Self::default()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.thumbnail.size, 200);
        assert_eq!(config.thumbnail.quality, 80);
        assert_eq!(config.thumbnail.extract_timeout(), Duration::from_secs(15));
        assert!(!config.log.enabled);
    }

    #[tokio::test]
    async fn test_save_and_load() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config/app.toml");
        let path = path.to_str().unwrap();

        let mut config = AppConfig::default();
        config.server.port = 8080;
        config.thumbnail.size = 128;
        config.filesystem.root_dir = temp_dir.path().to_path_buf();
        config.save_to_file(path).await.unwrap();

        let loaded = AppConfig::load_from_file(path).await.unwrap();
        assert_eq!(loaded.server.port, 8080);
        assert_eq!(loaded.thumbnail.size, 128);
        assert_eq!(loaded.filesystem.root_dir, temp_dir.path());
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config: AppConfig = toml::from_str(
            r#"
            [server]
            port = 9000

            [thumbnail]
            quality = 0
            "#,
        )
        .unwrap();

        assert_eq!(config.server.port, 9000);
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.thumbnail.size, 200);
        assert_eq!(config.thumbnail.clamped_quality(), 1);
        assert!(config.thumbnail.temp_dir.is_none());
    }

    #[tokio::test]
    async fn test_load_or_default_missing_file() {
        let config = AppConfig::load_or_default("/nonexistent/finderfi/app.toml").await;
        assert_eq!(config.server.port, 3000);
    }
}
