// HTTP 错误映射

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use super::handlers::ApiResponse;
use crate::filesystem::{FsError, FsErrorCode};

/// 错误码对应的 HTTP 状态
pub fn status_for(code: FsErrorCode) -> StatusCode {
    match code {
        FsErrorCode::BadRequest => StatusCode::BAD_REQUEST,
        FsErrorCode::Forbidden => StatusCode::FORBIDDEN,
        FsErrorCode::NotFound => StatusCode::NOT_FOUND,
        FsErrorCode::NotADirectory => StatusCode::BAD_REQUEST,
        FsErrorCode::NotAFile => StatusCode::BAD_REQUEST,
        FsErrorCode::Internal => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn log_error(err: &FsError) {
    match err.code {
        FsErrorCode::Internal => tracing::error!("请求处理失败: {}", err),
        FsErrorCode::Forbidden => tracing::warn!("拒绝越界访问: {:?}", err.path),
        _ => tracing::debug!("请求被拒绝: {}", err),
    }
}

/// 页面路由直接返回纯文本错误
impl IntoResponse for FsError {
    fn into_response(self) -> Response {
        log_error(&self);
        let status = status_for(self.code);
        // 内部错误的细节只写日志
        let body = match self.code {
            FsErrorCode::Internal => FsErrorCode::Internal.message().to_string(),
            _ => self.message,
        };
        (status, body).into_response()
    }
}

/// 错误响应
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub code: i32,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
}

/// JSON API 使用的错误包装
#[derive(Debug)]
pub struct ApiError(pub FsError);

impl From<FsError> for ApiError {
    fn from(err: FsError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let err = self.0;
        log_error(&err);
        let status = status_for(err.code);
        let body = match err.code {
            FsErrorCode::Internal => ErrorResponse {
                code: err.code.code(),
                message: FsErrorCode::Internal.message().to_string(),
                path: None,
            },
            _ => ErrorResponse {
                code: err.code.code(),
                message: err.message,
                path: err.path,
            },
        };
        (status, Json(body)).into_response()
    }
}

pub type ApiResult<T> = Result<Json<ApiResponse<T>>, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(status_for(FsErrorCode::BadRequest), StatusCode::BAD_REQUEST);
        assert_eq!(status_for(FsErrorCode::Forbidden), StatusCode::FORBIDDEN);
        assert_eq!(status_for(FsErrorCode::NotFound), StatusCode::NOT_FOUND);
        assert_eq!(status_for(FsErrorCode::NotAFile), StatusCode::BAD_REQUEST);
        assert_eq!(
            status_for(FsErrorCode::Internal),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[tokio::test]
    async fn test_internal_error_hides_details() {
        let err = FsError::new(FsErrorCode::Internal).with_message("/srv/secret: EIO");
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        assert_eq!(&body[..], b"Internal Server Error");
    }

    #[tokio::test]
    async fn test_api_error_body() {
        let response = ApiError(FsError::new(FsErrorCode::NotFound).with_path("/a/b"))
            .into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["code"], 50003);
        assert_eq!(json["message"], "File not found");
        assert_eq!(json["path"], "/a/b");
    }
}
