// 路径安全守卫
//
// 把客户端提交的不可信路径解析为根目录之内的规范化绝对路径，防止路径穿越

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use super::types::{FsError, FsErrorCode, ResolvedPath};

/// 路径安全守卫
///
/// 持有启动时规范化过的根目录，本身不可变，可在并发请求间共享
#[derive(Debug, Clone)]
pub struct PathGuard {
    root: PathBuf,
}

impl PathGuard {
    /// 创建新的路径守卫，根目录必须存在
    pub fn new(root: impl AsRef<Path>) -> Result<Self, FsError> {
        let root = dunce::canonicalize(root.as_ref()).map_err(|e| {
            tracing::error!("根目录规范化失败: {:?}, 错误: {}", root.as_ref(), e);
            FsError::from_io(&e)
        })?;
        Ok(Self { root })
    }

    /// 规范化后的根目录
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// 解析请求路径
    ///
    /// 1. 百分号解码，转义非法时返回 BadRequest
    /// 2. 按分隔符切分，丢弃空段和 `.`；`..` 回退上一段，试图越过根目录时返回 Forbidden
    /// 3. 拼接到根目录后规范化（解析符号链接）
    /// 4. 规范化结果必须等于根目录或以根目录为前缀（按路径段比较）
    pub fn resolve(&self, raw: &str) -> Result<ResolvedPath, FsError> {
        let decoded = decode_request_path(raw).map_err(|e| e.with_path(raw))?;
        let segments = split_segments(&decoded).ok_or_else(|| {
            tracing::warn!("路径穿越被拒绝: 请求 {:?} 越过根目录", raw);
            FsError::new(FsErrorCode::Forbidden).with_path(raw)
        })?;

        // 隐藏条目对外不可见
        if segments.iter().any(|s| Self::is_hidden(s)) {
            tracing::debug!("拒绝访问隐藏路径: {}", raw);
            return Err(FsError::new(FsErrorCode::NotFound).with_path(raw));
        }

        self.resolve_segments(&segments, raw)
    }

    /// 解析目录下的单个子条目
    ///
    /// 子条目可能是指向根目录之外的符号链接，因此同样要经过规范化和边界检查。
    /// 请求路径把 `\` 当作分隔符，名称中含 `\` 的条目无法被再次请求，直接拒绝
    pub fn resolve_child(&self, parent: &ResolvedPath, name: &str) -> Result<ResolvedPath, FsError> {
        if name.is_empty() || name == "." || name == ".." || name.contains(['/', '\\']) {
            return Err(FsError::new(FsErrorCode::BadRequest).with_path(name));
        }
        if Self::is_hidden(name) {
            return Err(FsError::new(FsErrorCode::NotFound).with_path(name));
        }

        let mut segments: Vec<&str> = parent.segments().iter().map(String::as_str).collect();
        segments.push(name);
        self.resolve_segments(&segments, name)
    }

    /// 以 `.` 开头的名称视为隐藏
    pub fn is_hidden(name: &str) -> bool {
        name.starts_with('.')
    }

    fn resolve_segments(&self, segments: &[&str], shown: &str) -> Result<ResolvedPath, FsError> {
        let mut candidate = self.root.clone();
        for segment in segments {
            candidate.push(segment);
        }

        let canonical = dunce::canonicalize(&candidate)
            .map_err(|e| canonicalize_error(&e).with_path(shown))?;

        // strip_prefix 按路径段比较，/home/user_docs 不会被当作 /home/user 的子路径
        let Ok(inside) = canonical.strip_prefix(&self.root) else {
            tracing::warn!(
                "路径穿越被拒绝: 请求 {:?} 解析到根目录之外: {:?}",
                shown,
                canonical
            );
            return Err(FsError::new(FsErrorCode::Forbidden).with_path(shown));
        };

        // 符号链接指向根目录内的隐藏条目时同样不可见
        let hidden_target = inside
            .components()
            .any(|c| c.as_os_str().to_string_lossy().starts_with('.'));
        if hidden_target {
            tracing::debug!("拒绝访问隐藏路径: {:?} -> {:?}", shown, canonical);
            return Err(FsError::new(FsErrorCode::NotFound).with_path(shown));
        }

        let segments = segments.iter().map(|s| s.to_string()).collect();
        Ok(ResolvedPath::new(canonical, segments))
    }
}

/// 百分号解码
///
/// `urlencoding::decode` 会原样保留非法转义，这里先逐个检查 `%XX`
fn decode_request_path(raw: &str) -> Result<String, FsError> {
    let bytes = raw.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' {
            let valid = i + 2 < bytes.len()
                && bytes[i + 1].is_ascii_hexdigit()
                && bytes[i + 2].is_ascii_hexdigit();
            if !valid {
                return Err(FsError::new(FsErrorCode::BadRequest));
            }
            i += 3;
        } else {
            i += 1;
        }
    }

    urlencoding::decode(raw)
        .map(|decoded| decoded.into_owned())
        .map_err(|_| FsError::new(FsErrorCode::BadRequest))
}

/// 切分路径段；`\` 同样视为分隔符
///
/// `..` 回退上一段，没有可回退的段（试图越过根目录）时返回 None
fn split_segments(decoded: &str) -> Option<Vec<&str>> {
    let mut segments = Vec::new();
    for segment in decoded.split(['/', '\\']) {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop()?;
            }
            _ => segments.push(segment),
        }
    }
    Some(segments)
}

fn canonicalize_error(err: &std::io::Error) -> FsError {
    match err.kind() {
        // 路径中含 NUL 等非法字符
        ErrorKind::InvalidInput => FsError::new(FsErrorCode::BadRequest),
        ErrorKind::PermissionDenied => FsError::new(FsErrorCode::Internal),
        // 不存在、中间段不是目录、链接循环、名称过长
        _ => FsError::new(FsErrorCode::NotFound),
    }
}
