//! Patient Registry - 患者档案服务
//!
//! 患者基本信息与身高体重管理，自动计算 BMI 与健康判定

pub mod api;
pub mod config;
pub mod error;
pub mod patient;
pub mod registry;
pub mod server;
pub mod storage;

pub use error::{RegistryError, RegistryResult};
pub use registry::Registry;
