// 应用状态

use std::sync::Arc;

use crate::config::AppConfig;
use crate::filesystem::{FilesystemService, PathGuard};
use crate::thumbnail::ThumbnailGenerator;

/// 应用全局状态
///
/// 启动后只读，请求之间不共享可变数据
#[derive(Clone)]
pub struct AppState {
    /// 应用配置
    pub config: Arc<AppConfig>,
    /// 文件系统服务（含路径沙箱）
    pub fs: Arc<FilesystemService>,
    /// 缩略图生成器
    pub thumbnails: Arc<ThumbnailGenerator>,
}

impl AppState {
    /// 创建新的应用状态
    ///
    /// 根目录在这里规范化，之后所有请求都以它为边界
    pub fn new(config: AppConfig) -> anyhow::Result<Self> {
        let guard = PathGuard::new(&config.filesystem.root_dir).map_err(|e| {
            anyhow::anyhow!("根目录无效: {:?}, {}", config.filesystem.root_dir, e)
        })?;
        let thumbnails = ThumbnailGenerator::new(config.thumbnail.clone());

        Ok(Self::with_parts(config, FilesystemService::new(guard), thumbnails))
    }

    /// 使用现成的组件组装状态
    pub fn with_parts(
        config: AppConfig,
        fs: FilesystemService,
        thumbnails: ThumbnailGenerator,
    ) -> Self {
        Self {
            config: Arc::new(config),
            fs: Arc::new(fs),
            thumbnails: Arc::new(thumbnails),
        }
    }
}
