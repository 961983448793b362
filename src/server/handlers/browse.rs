// 目录浏览处理器

use axum::{
    extract::State,
    http::Uri,
    response::{IntoResponse, Redirect, Response},
};

use crate::filesystem::{EntryType, FsError};
use crate::server::render;
use crate::server::AppState;

/// 浏览目录
///
/// GET / 和 GET /*path
///
/// 目录返回 HTML 列表页，文件重定向到 /file 下载地址
pub async fn browse(State(state): State<AppState>, uri: Uri) -> Result<Response, FsError> {
    // 使用原始路径，只让 PathGuard 解码一次
    let resolved = state.fs.resolve(uri.path())?;

    match state.fs.entry_type(&resolved).await? {
        EntryType::File => {
            let target = render::file_href(resolved.relative());
            Ok(Redirect::to(&target).into_response())
        }
        EntryType::Directory => {
            let listing = state.fs.list_directory(&resolved).await?;
            tracing::debug!(
                "浏览目录: {} ({} 项)",
                listing.current_path,
                listing.total
            );
            Ok(render::directory_page(&listing).into_response())
        }
    }
}
