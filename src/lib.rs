// FinderFI Rust Library
// 局域网文件浏览服务核心库

// 启动横幅
pub mod banner;

// 配置管理模块
pub mod config;

// 本地文件系统浏览模块
pub mod filesystem;

// 日志模块
pub mod logging;

// Web服务器模块
pub mod server;

// 缩略图模块
pub mod thumbnail;

// 导出常用类型
pub use config::AppConfig;
pub use filesystem::{FileEntry, FilesystemService, FsError, FsErrorCode, MediaKind, PathGuard};
pub use server::AppState;
pub use thumbnail::{Thumbnail, ThumbnailError, ThumbnailGenerator};
