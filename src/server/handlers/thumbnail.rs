// 缩略图处理器

use axum::{
    extract::{RawQuery, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};

use super::query_param;
use crate::filesystem::{EntryType, FsError, MediaKind};
use crate::server::AppState;

/// 按需生成缩略图
///
/// GET /thumbnail?path=<相对路径>
///
/// 成功时返回 `text/plain` 的 data URL；生成失败返回 204，页面保留默认图标
pub async fn get_thumbnail(
    State(state): State<AppState>,
    RawQuery(query): RawQuery,
) -> Result<Response, FsError> {
    let raw = match query_param(query.as_deref(), "path") {
        Some(raw) if !raw.is_empty() => raw,
        _ => {
            return Ok((
                StatusCode::BAD_REQUEST,
                "Bad Request: Missing file path for thumbnail.",
            )
                .into_response())
        }
    };

    let resolved = state.fs.resolve(raw)?;
    if resolved.is_root() {
        return Ok((
            StatusCode::FORBIDDEN,
            "Forbidden: Cannot generate thumbnail for the root directory.",
        )
            .into_response());
    }

    if state.fs.entry_type(&resolved).await? == EntryType::Directory {
        return Ok((
            StatusCode::BAD_REQUEST,
            "Bad Request: Cannot generate thumbnail for a directory.",
        )
            .into_response());
    }

    let kind = resolved
        .file_name()
        .map(MediaKind::from_name)
        .unwrap_or(MediaKind::Other);
    if !kind.is_media() {
        return Ok((
            StatusCode::BAD_REQUEST,
            "Bad Request: File type not supported for thumbnails.",
        )
            .into_response());
    }

    match state.thumbnails.generate_optional(&resolved, kind).await {
        Some(thumbnail) => Ok((
            [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
            thumbnail.to_data_url(),
        )
            .into_response()),
        None => Ok(StatusCode::NO_CONTENT.into_response()),
    }
}
