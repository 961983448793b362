// HTTP 处理器模块

pub mod browse;
pub mod file;
pub mod filesystem;
pub mod health;
pub mod thumbnail;

pub use browse::browse;
pub use file::download_file;
pub use filesystem::list_directory;
pub use health::health_check;
pub use thumbnail::get_thumbnail;

use serde::Serialize;

/// 统一API响应格式
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    /// 状态码 (0: 成功, 其他: 错误码)
    pub code: i32,
    /// 消息
    pub message: String,
    /// 数据
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            code: 0,
            message: "Success".to_string(),
            data: Some(data),
        }
    }
}

/// 从原始查询串中取参数值，不做解码
///
/// 路径参数统一交给 PathGuard 解码一次
pub(crate) fn query_param<'a>(query: Option<&'a str>, name: &str) -> Option<&'a str> {
    query?
        .split('&')
        .filter_map(|pair| match pair.split_once('=') {
            Some((key, value)) => Some((key, value)),
            None if !pair.is_empty() => Some((pair, "")),
            None => None,
        })
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value)
}

/// 布尔型查询参数：`1`、`true`、`yes` 为真
pub(crate) fn flag_param(query: Option<&str>, name: &str) -> bool {
    matches!(
        query_param(query, name).map(str::to_ascii_lowercase).as_deref(),
        Some("1" | "true" | "yes")
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_param() {
        let query = Some("path=pics%2Fcat.jpg&thumbnails=true&empty=&bare");
        assert_eq!(query_param(query, "path"), Some("pics%2Fcat.jpg"));
        assert_eq!(query_param(query, "thumbnails"), Some("true"));
        assert_eq!(query_param(query, "empty"), Some(""));
        assert_eq!(query_param(query, "bare"), Some(""));
        assert_eq!(query_param(query, "missing"), None);
        assert_eq!(query_param(None, "path"), None);
    }

    #[test]
    fn test_flag_param() {
        assert!(flag_param(Some("thumbnails=1"), "thumbnails"));
        assert!(flag_param(Some("thumbnails=TRUE"), "thumbnails"));
        assert!(!flag_param(Some("thumbnails=0"), "thumbnails"));
        assert!(!flag_param(Some("path=/"), "thumbnails"));
        assert!(!flag_param(None, "thumbnails"));
    }
}
