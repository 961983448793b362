// 文件系统模块数据类型定义

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// 文件系统错误码
/// 错误码范围：50001 - 50099
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FsErrorCode {
    /// 路径编码无效（百分号转义错误）
    BadRequest = 50001,
    /// 路径解析到根目录之外
    Forbidden = 50002,
    /// 路径不存在（或为隐藏条目）
    NotFound = 50003,
    /// 不是目录
    NotADirectory = 50004,
    /// 不是文件
    NotAFile = 50005,
    /// 其他内部错误
    Internal = 50099,
}

impl FsErrorCode {
    pub fn code(&self) -> i32 {
        *self as i32
    }

    pub fn message(&self) -> &'static str {
        match self {
            Self::BadRequest => "Bad Request: Malformed URI",
            Self::Forbidden => "Forbidden: Access outside of designated root directory.",
            Self::NotFound => "File not found",
            Self::NotADirectory => "Bad Request: Not a directory",
            Self::NotAFile => "Bad Request: Not a file",
            Self::Internal => "Internal Server Error",
        }
    }
}

/// 文件系统错误
///
/// `path` 只记录客户端提交的请求路径，不包含服务器上的绝对路径
#[derive(Debug)]
pub struct FsError {
    pub code: FsErrorCode,
    pub message: String,
    pub path: Option<String>,
}

impl FsError {
    pub fn new(code: FsErrorCode) -> Self {
        Self {
            message: code.message().to_string(),
            code,
            path: None,
        }
    }

    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    /// 把 IO 错误归类为 NotFound 或 Internal
    pub fn from_io(err: &std::io::Error) -> Self {
        match err.kind() {
            std::io::ErrorKind::NotFound => Self::new(FsErrorCode::NotFound),
            _ => Self::new(FsErrorCode::Internal),
        }
    }
}

impl std::fmt::Display for FsError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if let Some(ref path) = self.path {
            write!(f, "{}: {}", self.message, path)
        } else {
            write!(f, "{}", self.message)
        }
    }
}

impl std::error::Error for FsError {}

/// 沙箱校验通过的路径
///
/// 只能由 `PathGuard` 构造，持有该值即保证路径位于根目录之内
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedPath {
    absolute: PathBuf,
    /// 已解码的路径段
    segments: Vec<String>,
    /// 逐段百分号编码后的相对路径
    relative: String,
}

impl ResolvedPath {
    pub(super) fn new(absolute: PathBuf, segments: Vec<String>) -> Self {
        let relative = encode_segments(&segments);
        Self {
            absolute,
            segments,
            relative,
        }
    }

    /// 规范化后的绝对路径
    pub fn as_path(&self) -> &Path {
        &self.absolute
    }

    /// 以 `/` 开头的相对路径，每段百分号编码，根目录为 `/`
    ///
    /// 可以原样交回 `PathGuard::resolve`，得到同一个路径
    pub fn relative(&self) -> &str {
        &self.relative
    }

    /// 解码后的相对路径，仅用于展示
    pub fn display_relative(&self) -> String {
        format!("/{}", self.segments.join("/"))
    }

    pub(super) fn segments(&self) -> &[String] {
        &self.segments
    }

    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    /// 最后一段名称（已解码），根目录返回 None
    pub fn file_name(&self) -> Option<&str> {
        self.segments.last().map(String::as_str)
    }

    /// 父目录的相对路径（编码形式），根目录返回 None
    pub fn parent_relative(&self) -> Option<String> {
        let (_, parent) = self.segments.split_last()?;
        Some(encode_segments(parent))
    }
}

/// 逐段百分号编码并以 `/` 连接
pub fn encode_segments<S: AsRef<str>>(segments: &[S]) -> String {
    let encoded: Vec<String> = segments
        .iter()
        .map(|segment| urlencoding::encode(segment.as_ref()).into_owned())
        .collect();
    format!("/{}", encoded.join("/"))
}

/// 条目类型
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum EntryType {
    File,
    Directory,
}

/// 媒体分类（按扩展名，不区分大小写）
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Image,
    Video,
    Other,
}

impl MediaKind {
    pub fn from_path(path: &Path) -> Self {
        let ext = match path.extension().and_then(|e| e.to_str()) {
            Some(ext) => ext.to_lowercase(),
            None => return Self::Other,
        };
        match ext.as_str() {
            "jpg" | "jpeg" | "png" | "gif" | "webp" => Self::Image,
            "mp4" | "mov" | "avi" | "mkv" | "webm" => Self::Video,
            _ => Self::Other,
        }
    }

    pub fn from_name(name: &str) -> Self {
        Self::from_path(Path::new(name))
    }

    /// 是否可以生成缩略图
    pub fn is_media(&self) -> bool {
        !matches!(self, Self::Other)
    }
}

/// 文件条目
#[derive(Debug, Clone, Serialize)]
pub struct FileEntry {
    /// 文件名
    pub name: String,
    /// 条目类型
    #[serde(rename = "entryType")]
    pub entry_type: EntryType,
    /// 媒体分类
    #[serde(rename = "mediaKind")]
    pub media_kind: MediaKind,
    /// 文件大小（文件夹为 None）
    pub size: Option<u64>,
    /// 创建时间（平台不支持时退回修改时间）
    #[serde(rename = "createdAt")]
    pub created_at: Option<DateTime<Utc>>,
    /// 修改时间
    #[serde(rename = "updatedAt")]
    pub updated_at: Option<DateTime<Utc>>,
    /// 相对根目录的路径（`/` 分隔）
    pub path: String,
    /// 缩略图 data URL（仅在预生成模式下填充）
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<String>,
}

impl FileEntry {
    pub fn is_dir(&self) -> bool {
        self.entry_type == EntryType::Directory
    }
}

/// 列目录响应
#[derive(Debug, Serialize)]
pub struct ListResponse {
    /// 文件条目列表
    pub entries: Vec<FileEntry>,
    /// 当前路径
    #[serde(rename = "currentPath")]
    pub current_path: String,
    /// 父目录路径
    #[serde(rename = "parentPath")]
    pub parent_path: Option<String>,
    /// 总条目数
    pub total: usize,
}
