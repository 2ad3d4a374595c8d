//! 按数值字段排序

use super::model::PatientRecord;
use crate::error::{RegistryError, RegistryResult};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

/// 可排序字段
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortField {
    Age,
    Height,
    Weight,
}

/// 排序方向
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

impl SortField {
    pub const ACCEPTED: [&'static str; 3] = ["age", "height", "weight"];

    fn key(&self, record: &PatientRecord) -> f64 {
        match self {
            SortField::Age => f64::from(record.age()),
            SortField::Height => record.height(),
            SortField::Weight => record.weight(),
        }
    }
}

impl SortOrder {
    pub const ACCEPTED: [&'static str; 2] = ["asc", "desc"];
}

impl FromStr for SortField {
    type Err = RegistryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "age" => Ok(SortField::Age),
            "height" => Ok(SortField::Height),
            "weight" => Ok(SortField::Weight),
            other => Err(RegistryError::invalid_argument(format!(
                "Invalid field {other}. Please choose from {}",
                SortField::ACCEPTED.join(", ")
            ))),
        }
    }
}

impl FromStr for SortOrder {
    type Err = RegistryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "asc" => Ok(SortOrder::Asc),
            "desc" => Ok(SortOrder::Desc),
            other => Err(RegistryError::invalid_argument(format!(
                "Invalid order {other}. Please choose from {}",
                SortOrder::ACCEPTED.join(", ")
            ))),
        }
    }
}

impl fmt::Display for SortField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SortField::Age => "age",
            SortField::Height => "height",
            SortField::Weight => "weight",
        };
        f.write_str(name)
    }
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SortOrder::Asc => "asc",
            SortOrder::Desc => "desc",
        })
    }
}

/// 解析原始查询参数，缺省方向为升序
pub fn parse_sort(field: &str, order: Option<&str>) -> RegistryResult<(SortField, SortOrder)> {
    let field = field.parse()?;
    let order = order.map(str::parse).transpose()?.unwrap_or_default();
    Ok((field, order))
}

/// 稳定排序：相同键保持插入顺序（降序时也一样）
pub fn sort_records(records: &mut [PatientRecord], field: SortField, order: SortOrder) {
    records.sort_by(|a, b| {
        let ordering = field
            .key(a)
            .partial_cmp(&field.key(b))
            .unwrap_or(Ordering::Equal);
        match order {
            SortOrder::Asc => ordering,
            SortOrder::Desc => ordering.reverse(),
        }
    });
}
