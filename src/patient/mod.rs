//! 患者领域逻辑
//!
//! 校验、BMI 计算、部分更新合并与排序

pub mod bmi;
pub mod model;
pub mod sort;
pub mod validation;

pub use bmi::Verdict;
pub use model::{Gender, NewPatient, PatientRecord, PatientUpdate};
pub use sort::{parse_sort, sort_records, SortField, SortOrder};
