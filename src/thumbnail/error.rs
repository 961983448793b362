//! 缩略图错误类型

use thiserror::Error;

use crate::filesystem::MediaKind;

/// 缩略图生成失败的原因
///
/// 所有变体都是普通失败：调用方回退为通用图标，不会中断目录列表
#[derive(Error, Debug)]
pub enum ThumbnailError {
    #[error("不支持为该类型生成缩略图: {kind:?}")]
    Unsupported { kind: MediaKind },

    #[error("读取文件失败: {0}")]
    Io(#[from] std::io::Error),

    #[error("图片解码失败: {reason}")]
    Decode { reason: String },

    #[error("缩略图编码失败: {reason}")]
    Encode { reason: String },

    #[error("视频截帧失败: {reason}")]
    Extraction { reason: String },

    #[error("视频截帧超时 ({secs}s)")]
    TimedOut { secs: u64 },

    #[error("后台任务异常退出: {reason}")]
    Join { reason: String },
}

impl ThumbnailError {
    pub fn extraction(reason: impl Into<String>) -> Self {
        Self::Extraction {
            reason: reason.into(),
        }
    }

    /// 超时单独统计，便于排查卡死的转码进程
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::TimedOut { .. })
    }
}
