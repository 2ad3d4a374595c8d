//! 字段校验
//!
//! 每个校验函数只检查一个字段，由 [`FieldChecker`] 汇总所有失败项。

use super::model::Gender;
use crate::error::{FieldError, RegistryError, RegistryResult};

/// 年龄上限（不含）
pub const MAX_AGE: i64 = 120;

/// 汇总多个字段的校验结果
#[derive(Debug, Default)]
pub struct FieldChecker {
    errors: Vec<FieldError>,
}

impl FieldChecker {
    pub fn new() -> Self {
        Self::default()
    }

    /// 记录失败并返回 `None`，成功时返回值
    pub fn check<T>(&mut self, result: Result<T, FieldError>) -> Option<T> {
        match result {
            Ok(value) => Some(value),
            Err(error) => {
                self.errors.push(error);
                None
            }
        }
    }

    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn into_error(self) -> RegistryError {
        RegistryError::Validation {
            fields: self.errors,
        }
    }

    /// 有任何失败时返回 `Validation` 错误
    pub fn finish(self) -> RegistryResult<()> {
        if self.is_clean() {
            Ok(())
        } else {
            Err(self.into_error())
        }
    }
}

pub fn non_empty(field: &'static str, value: &str) -> Result<String, FieldError> {
    if value.trim().is_empty() {
        Err(FieldError::new(field, "must not be empty"))
    } else {
        Ok(value.to_string())
    }
}

pub fn age(value: i64) -> Result<u32, FieldError> {
    if value > 0 && value < MAX_AGE {
        // 范围已保证可以无损转换
        Ok(value as u32)
    } else {
        Err(FieldError::new(
            "age",
            format!("must be greater than 0 and less than {MAX_AGE}, got {value}"),
        ))
    }
}

pub fn gender(value: &str) -> Result<Gender, FieldError> {
    value
        .parse::<Gender>()
        .map_err(|reason| FieldError::new("gender", reason))
}

/// 正的有限数（身高、体重）
pub fn positive(field: &'static str, value: f64) -> Result<f64, FieldError> {
    if value.is_finite() && value > 0.0 {
        Ok(value)
    } else {
        Err(FieldError::new(
            field,
            format!("must be a finite number greater than 0, got {value}"),
        ))
    }
}
