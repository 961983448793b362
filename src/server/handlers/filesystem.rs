// 文件系统 API 处理器

use axum::{
    extract::{RawQuery, State},
    Json,
};

use super::{flag_param, query_param, ApiResponse};
use crate::filesystem::ListResponse;
use crate::server::{AppState, ApiResult};

/// GET /api/v1/fs/list?path=/pics&thumbnails=true
/// 列出目录内容，thumbnails 为真时同时内联缩略图
pub async fn list_directory(
    State(state): State<AppState>,
    RawQuery(query): RawQuery,
) -> ApiResult<ListResponse> {
    let raw = query_param(query.as_deref(), "path").unwrap_or("/");
    let dir = state.fs.resolve(raw)?;

    let listing = if flag_param(query.as_deref(), "thumbnails") {
        state
            .fs
            .list_with_thumbnails(&dir, &state.thumbnails)
            .await?
    } else {
        state.fs.list_directory(&dir).await?
    };

    Ok(Json(ApiResponse::success(listing)))
}
