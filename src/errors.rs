use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

use crate::services::thumbnail::ImageError;

/// API 错误响应模型，用于 OpenAPI 文档
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ApiErrorResponse {
    /// 错误信息
    #[schema(example = "相册不存在")]
    pub error: String,
    /// HTTP 状态码
    #[schema(example = 404)]
    pub status: u16,
}

/// 业务错误，统一转换为 `{"error": ..., "status": ...}` 响应
#[derive(Error, Debug, ToSchema, Serialize, Deserialize)]
#[serde(tag = "type", content = "message")]
pub enum ApiError {
    #[error("数据库错误: {0}")]
    Database(String),

    #[error("参数验证失败: {0}")]
    Validation(String),

    #[error("资源不存在: {0}")]
    NotFound(String),

    #[error("服务器内部错误: {0}")]
    Internal(String),

    #[error("请求无效: {0}")]
    BadRequest(String),

    #[error("未认证: {0}")]
    Unauthorized(String),

    #[error("禁止访问: {0}")]
    Forbidden(String),
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Database(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Validation(_) | Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
        }
    }

    /// 返回给客户端的信息，服务端错误只记录日志不外泄细节
    fn public_message(self) -> String {
        match self {
            Self::Database(detail) => {
                tracing::error!("数据库操作失败: {}", detail);
                "数据库错误".to_string()
            }
            Self::Internal(detail) => {
                tracing::error!("内部错误: {}", detail);
                "服务器内部错误".to_string()
            }
            Self::Validation(msg)
            | Self::NotFound(msg)
            | Self::BadRequest(msg)
            | Self::Unauthorized(msg)
            | Self::Forbidden(msg) => msg,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = ApiErrorResponse {
            error: self.public_message(),
            status: status.as_u16(),
        };

        (status, Json(body)).into_response()
    }
}

impl From<sea_orm::DbErr> for ApiError {
    fn from(err: sea_orm::DbErr) -> Self {
        match err {
            sea_orm::DbErr::RecordNotFound(what) => Self::NotFound(what),
            other => Self::Database(other.to_string()),
        }
    }
}

impl From<std::io::Error> for ApiError {
    fn from(err: std::io::Error) -> Self {
        Self::Internal(format!("文件操作失败: {err}"))
    }
}

impl From<ImageError> for ApiError {
    fn from(err: ImageError) -> Self {
        match err {
            ImageError::UndeterminedType
            | ImageError::UnsupportedType(_)
            | ImageError::GifTeaser
            | ImageError::TooLarge { .. } => Self::BadRequest(err.to_string()),
            ImageError::Decode(_) | ImageError::Encode(_) | ImageError::Io(_) => {
                Self::Internal(err.to_string())
            }
        }
    }
}

impl From<validator::ValidationErrors> for ApiError {
    fn from(err: validator::ValidationErrors) -> Self {
        Self::Validation(err.to_string())
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(format!("{err:#}"))
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
