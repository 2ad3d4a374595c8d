//! 错误到 HTTP 响应的映射

use crate::error::{FieldError, RegistryError};
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

/// 错误响应体
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub kind: &'static str,
    pub message: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<FieldError>,
}

/// 处理器统一使用的错误类型
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    body: ErrorBody,
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        self.status
    }

    fn malformed(message: String) -> Self {
        Self {
            status: StatusCode::UNPROCESSABLE_ENTITY,
            body: ErrorBody {
                kind: "validation",
                message,
                fields: Vec::new(),
            },
        }
    }
}

impl From<RegistryError> for ApiError {
    fn from(error: RegistryError) -> Self {
        let status = match &error {
            RegistryError::Validation { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            RegistryError::Conflict { .. } => StatusCode::CONFLICT,
            RegistryError::NotFound { .. } => StatusCode::NOT_FOUND,
            RegistryError::InvalidArgument { .. } => StatusCode::BAD_REQUEST,
            RegistryError::Io(_) | RegistryError::Serialization(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        if status.is_server_error() {
            tracing::error!("请求处理失败: {}", error);
        } else {
            tracing::warn!(kind = error.kind(), "请求被拒绝: {}", error);
        }

        let kind = error.kind();
        let message = error.to_string();
        let fields = match error {
            RegistryError::Validation { fields } => fields,
            _ => Vec::new(),
        };

        Self {
            status,
            body: ErrorBody {
                kind,
                message,
                fields,
            },
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        tracing::warn!("请求体无法解析: {}", rejection.body_text());
        Self::malformed(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        Self::from(RegistryError::invalid_argument(rejection.body_text()))
    }
}

impl From<tokio::task::JoinError> for ApiError {
    fn from(error: tokio::task::JoinError) -> Self {
        tracing::error!("后台任务失败: {}", error);
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            body: ErrorBody {
                kind: "internal",
                message: "internal task failure".to_string(),
                fields: Vec::new(),
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        let cases = [
            (
                RegistryError::Validation { fields: vec![] },
                StatusCode::UNPROCESSABLE_ENTITY,
            ),
            (
                RegistryError::Conflict { id: "P1".into() },
                StatusCode::CONFLICT,
            ),
            (RegistryError::not_found("P1"), StatusCode::NOT_FOUND),
            (
                RegistryError::invalid_argument("bad"),
                StatusCode::BAD_REQUEST,
            ),
        ];
        for (error, status) in cases {
            assert_eq!(ApiError::from(error).status(), status);
        }
    }

    #[test]
    fn test_validation_body_carries_fields() {
        let error = ApiError::from(RegistryError::Validation {
            fields: vec![FieldError::new("age", "must be greater than 0")],
        });
        let body = serde_json::to_value(&error.body).unwrap();
        assert_eq!(body["kind"], "validation");
        assert_eq!(body["fields"][0]["field"], "age");
    }
}
