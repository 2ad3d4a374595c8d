//! 错误处理
//!
//! 统一的领域错误类型，每个变体都有稳定的 `kind` 编码

use thiserror::Error;

/// 患者档案错误类型
#[derive(Error, Debug)]
pub enum RegistryError {
    /// 输入字段格式或取值范围错误
    #[error("Invalid patient data: {}", describe(.fields))]
    Validation { fields: Vec<FieldError> },

    /// 创建时 ID 已存在
    #[error("Patient ID already exists: {id}")]
    Conflict { id: String },

    /// ID 不存在
    #[error("Patient ID not found: {id}")]
    NotFound { id: String },

    /// 排序字段或顺序非法
    #[error("{message}")]
    InvalidArgument { message: String },

    /// 文件读写错误
    #[error("Storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// 序列化错误
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// 单个字段的校验失败信息
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct FieldError {
    pub field: &'static str,
    pub reason: String,
}

impl FieldError {
    pub fn new(field: &'static str, reason: impl Into<String>) -> Self {
        Self {
            field,
            reason: reason.into(),
        }
    }
}

impl std::fmt::Display for FieldError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.reason)
    }
}

fn describe(fields: &[FieldError]) -> String {
    fields
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

impl RegistryError {
    /// 稳定的错误编码，对外暴露给调用方
    pub fn kind(&self) -> &'static str {
        match self {
            RegistryError::Validation { .. } => "validation",
            RegistryError::Conflict { .. } => "conflict",
            RegistryError::NotFound { .. } => "not_found",
            RegistryError::InvalidArgument { .. } => "invalid_argument",
            RegistryError::Io(_) | RegistryError::Serialization(_) => "internal",
        }
    }

    pub fn not_found(id: &str) -> Self {
        RegistryError::NotFound { id: id.to_string() }
    }

    pub fn invalid_argument(message: impl Into<String>) -> Self {
        RegistryError::InvalidArgument {
            message: message.into(),
        }
    }
}

/// 档案操作结果类型
pub type RegistryResult<T> = Result<T, RegistryError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_message_lists_every_field() {
        let error = RegistryError::Validation {
            fields: vec![
                FieldError::new("age", "must be greater than 0 and less than 120"),
                FieldError::new("height", "must be greater than 0"),
            ],
        };
        let message = error.to_string();
        assert!(message.contains("age: must be greater than 0"));
        assert!(message.contains("height: must be greater than 0"));
        assert_eq!(error.kind(), "validation");
    }

    #[test]
    fn test_error_kinds() {
        assert_eq!(RegistryError::not_found("P001").kind(), "not_found");
        assert_eq!(
            RegistryError::Conflict { id: "P001".into() }.kind(),
            "conflict"
        );
        assert_eq!(RegistryError::invalid_argument("bad").kind(), "invalid_argument");
        let io = std::io::Error::new(std::io::ErrorKind::Other, "disk");
        assert_eq!(RegistryError::from(io).kind(), "internal");
    }
}
