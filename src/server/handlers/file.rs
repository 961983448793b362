// 文件下载处理器

use axum::{
    body::Body,
    extract::State,
    http::{header, HeaderMap, HeaderValue, StatusCode, Uri},
    response::{IntoResponse, Response},
};
use mime_guess::mime;
use tokio_util::io::ReaderStream;

use crate::filesystem::FsError;
use crate::server::AppState;

/// 路由前缀
pub const FILE_ROUTE_PREFIX: &str = "/file";

/// 读取缓冲大小
const STREAM_CAPACITY: usize = 1 << 18;

/// 下载或内联展示文件
///
/// GET /file/*path
///
/// 图片和视频内联展示，其他类型作为附件下载
pub async fn download_file(
    State(state): State<AppState>,
    uri: Uri,
) -> Result<Response, FsError> {
    let raw = uri.path().strip_prefix(FILE_ROUTE_PREFIX).unwrap_or("/");
    let resolved = state.fs.resolve(raw)?;
    let (file, metadata) = state.fs.open_file(&resolved).await?;

    let name = resolved.file_name().unwrap_or("download");
    let mime_type = mime_guess::from_path(name).first_or_octet_stream();
    let inline = mime_type.type_() == mime::IMAGE || mime_type.type_() == mime::VIDEO;

    tracing::debug!("发送文件: {} ({})", resolved.relative(), mime_type);

    let mut headers = HeaderMap::new();
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_str(mime_type.as_ref())
            .unwrap_or_else(|_| HeaderValue::from_static("application/octet-stream")),
    );
    headers.insert(header::CONTENT_LENGTH, HeaderValue::from(metadata.len()));
    headers.insert(header::CONTENT_DISPOSITION, content_disposition(name, inline));

    let body = Body::from_stream(ReaderStream::with_capacity(file, STREAM_CAPACITY));
    Ok((StatusCode::OK, headers, body).into_response())
}

/// `inline`，或带 ASCII 回退名和 RFC 5987 编码名的 `attachment`
fn content_disposition(name: &str, inline: bool) -> HeaderValue {
    if inline {
        return HeaderValue::from_static("inline");
    }

    let fallback: String = name
        .chars()
        .map(|c| match c {
            '"' | '\\' => '_',
            c if c == ' ' || c.is_ascii_graphic() => c,
            _ => '_',
        })
        .collect();
    let value = format!(
        "attachment; filename=\"{}\"; filename*=UTF-8''{}",
        fallback,
        urlencoding::encode(name)
    );

    HeaderValue::from_str(&value)
        .unwrap_or_else(|_| HeaderValue::from_static("attachment; filename=\"download\""))
}
