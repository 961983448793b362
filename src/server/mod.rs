// Web服务器模块

pub mod error;
pub mod handlers;
pub mod render;
pub mod state;

use std::path::Path;

use axum::{routing::get, Router};
use tower_http::{services::ServeDir, trace::TraceLayer};

pub use error::{ApiError, ApiResult};
pub use state::AppState;

/// 组装全部路由
///
/// `/file`、`/thumbnail`、`/public`、`/health`、`/api` 优先于同名的根目录子文件夹
pub fn router(state: AppState, public_dir: &Path) -> Router {
    // API 路由
    let api_routes = Router::new().route("/fs/list", get(handlers::list_directory));

    Router::new()
        .route("/health", get(handlers::health_check))
        .route("/thumbnail", get(handlers::get_thumbnail))
        .route("/file/*path", get(handlers::download_file))
        .nest("/api/v1", api_routes)
        .nest_service("/public", ServeDir::new(public_dir))
        .route("/", get(handlers::browse))
        .route("/*path", get(handlers::browse))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
