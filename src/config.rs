//! 配置系统模块
//!
//! 统一处理 TOML 配置文件、环境变量、命令行参数

use anyhow::{anyhow, Result};
use clap::{Parser, Subcommand};
use config::{Config as ConfigBuilder, Environment, File};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::Level;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

const APP_NAME: &str = "patient-registry";

/// 命令行参数
#[derive(Parser, Debug, Clone)]
#[command(name = "patient-registry")]
#[command(about = "患者档案服务 - 患者信息与 BMI 管理")]
#[command(version)]
pub struct Cli {
    /// 配置文件路径
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// 日志级别
    #[arg(short, long, value_enum)]
    pub log_level: Option<LogLevel>,

    /// 档案存储文件
    #[arg(short, long)]
    pub store_path: Option<PathBuf>,

    /// 监听端口
    #[arg(short, long)]
    pub port: Option<u16>,

    /// 子命令
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// 支持的命令
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// 启动 HTTP 服务
    Serve,
    /// 列出所有档案
    List,
    /// 查看单个档案
    Show {
        /// 患者 ID
        id: String,
    },
    /// 按字段排序输出
    Sort {
        /// 排序字段（age、height、weight）
        field: String,
        /// 排序方向（asc、desc）
        #[arg(short, long)]
        order: Option<String>,
    },
    /// 删除档案
    Delete {
        /// 患者 ID
        id: String,
    },
    /// 重置配置
    ResetConfig,
}

/// 日志级别
#[derive(clap::ValueEnum, Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<LogLevel> for Level {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Error => Level::ERROR,
            LogLevel::Warn => Level::WARN,
            LogLevel::Info => Level::INFO,
            LogLevel::Debug => Level::DEBUG,
            LogLevel::Trace => Level::TRACE,
        }
    }
}

/// 主配置结构
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    /// 存储配置
    pub store: StoreConfig,
    /// 服务配置
    pub server: ServerConfig,
    /// 日志配置
    pub logging: LoggingConfig,
}

/// 存储配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// 档案文件路径
    pub path: PathBuf,
    /// 是否缩进输出
    pub pretty: bool,
}

/// 服务配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// 监听地址
    pub host: String,
    /// 监听端口
    pub port: u16,
}

/// 日志配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// 日志级别
    pub level: LogLevel,
    /// 日志格式
    pub format: LogFormat,
    /// 日志输出目录
    pub directory: Option<PathBuf>,
}

/// 日志格式
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// 简洁格式
    Compact,
    /// 详细格式
    Full,
    /// JSON 格式
    Json,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("patients.json"),
            pretty: true,
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8000,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: LogLevel::Info,
            format: LogFormat::Compact,
            directory: None,
        }
    }
}

impl Config {
    /// 使用指定的 CLI 参数加载配置
    pub fn load_with_cli(cli: Cli) -> Result<Self> {
        let mut builder = ConfigBuilder::builder();

        // 1. 首先加载默认配置
        builder = builder.add_source(config::Config::try_from(&Config::default())?);

        // 2. 加载系统配置文件
        if let Some(system_config) = Self::get_system_config_path() {
            if system_config.exists() {
                builder = builder.add_source(File::from(system_config));
            }
        }

        // 3. 加载用户配置文件
        if let Some(user_config) = Self::get_user_config_path() {
            if user_config.exists() {
                builder = builder.add_source(File::from(user_config));
            }
        }

        // 4. 加载指定的配置文件
        if let Some(config_path) = cli.config {
            if config_path.exists() {
                builder = builder.add_source(File::from(config_path));
            } else {
                return Err(anyhow!("配置文件不存在: {}", config_path.display()));
            }
        }

        // 5. 加载环境变量（前缀 PATIENT_REGISTRY_）
        builder = builder.add_source(
            Environment::with_prefix("PATIENT_REGISTRY")
                .prefix_separator("_")
                .separator("__"),
        );

        // 6. 构建配置
        let mut config: Config = builder.build()?.try_deserialize()?;

        // 7. 应用命令行参数覆盖
        if let Some(log_level) = cli.log_level {
            config.logging.level = log_level;
        }

        if let Some(store_path) = cli.store_path {
            config.store.path = store_path;
        }

        if let Some(port) = cli.port {
            config.server.port = port;
        }

        // 8. 验证配置
        config.validate()?;

        Ok(config)
    }

    /// 获取系统配置文件路径
    pub fn get_system_config_path() -> Option<PathBuf> {
        Some(PathBuf::from("/etc/patient-registry/config.toml"))
    }

    /// 获取用户配置文件路径
    pub fn get_user_config_path() -> Option<PathBuf> {
        ProjectDirs::from("", "", APP_NAME).map(|dirs| dirs.config_dir().join("config.toml"))
    }

    /// 生成默认配置文件
    pub fn generate_default_config() -> Result<String> {
        let config = Config::default();
        toml::to_string_pretty(&config).map_err(|e| anyhow!("生成默认配置失败: {}", e))
    }

    /// 保存配置到文件
    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self).map_err(|e| anyhow!("序列化配置失败: {}", e))?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        std::fs::write(path, content)?;
        Ok(())
    }

    /// 验证配置
    fn validate(&self) -> Result<()> {
        // 验证存储路径
        if self.store.path.as_os_str().is_empty() {
            return Err(anyhow!("存储文件路径不能为空"));
        }

        // 验证存储目录
        if let Some(parent) = self.store.path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                tracing::warn!("存储目录不存在，将自动创建: {}", parent.display());
                std::fs::create_dir_all(parent)?;
            }
        }

        // 验证日志目录
        if let Some(log_dir) = &self.logging.directory {
            if !log_dir.exists() {
                std::fs::create_dir_all(log_dir)?;
            }
        }

        // 验证网络配置
        if self.server.port == 0 {
            return Err(anyhow!("监听端口不能为 0"));
        }

        Ok(())
    }

    /// 初始化日志系统
    ///
    /// 配置了日志目录时返回文件写入器的 guard，调用方需持有到进程退出。
    pub fn init_logging(&self) -> Result<Option<WorkerGuard>> {
        let level_filter = EnvFilter::builder()
            .with_default_directive(Level::from(self.logging.level.clone()).into())
            .from_env_lossy();

        let (file_writer, guard) = match &self.logging.directory {
            Some(log_dir) => {
                std::fs::create_dir_all(log_dir)?;
                let file_appender = tracing_appender::rolling::daily(log_dir, "patient-registry.log");
                let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
                (Some(non_blocking), Some(guard))
            }
            None => (None, None),
        };

        let registry = tracing_subscriber::registry().with(level_filter);

        // 根据格式选择不同的输出层
        match self.logging.format {
            LogFormat::Compact => registry
                .with(fmt::layer().compact())
                .with(file_writer.map(|w| fmt::layer().compact().with_ansi(false).with_writer(w)))
                .try_init()?,
            LogFormat::Full => registry
                .with(fmt::layer())
                .with(file_writer.map(|w| fmt::layer().with_ansi(false).with_writer(w)))
                .try_init()?,
            LogFormat::Json => registry
                .with(fmt::layer().json().with_target(true).with_level(true))
                .with(file_writer.map(|w| fmt::layer().json().with_writer(w)))
                .try_init()?,
        }

        tracing::info!("日志系统已初始化，级别: {:?}", self.logging.level);
        Ok(guard)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn bare_cli() -> Cli {
        Cli {
            config: None,
            log_level: None,
            store_path: None,
            port: None,
            command: None,
        }
    }

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.store.path, PathBuf::from("patients.json"));
        assert_eq!(config.server.port, 8000);
        assert!(matches!(config.logging.level, LogLevel::Info));
    }

    #[test]
    fn test_config_serialization() {
        let toml_str = Config::generate_default_config().unwrap();
        assert!(toml_str.contains("[store]"));
        assert!(toml_str.contains("[server]"));
        assert!(toml_str.contains("[logging]"));
    }

    #[test]
    fn test_config_file_loading() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.toml");

        let test_config = r#"
[store]
path = "data/test-patients.json"
pretty = false

[server]
port = 9100

[logging]
level = "debug"
format = "json"
        "#;

        std::fs::write(&config_path, test_config).unwrap();

        let builder = ConfigBuilder::builder()
            .add_source(File::from(config_path))
            .build()
            .unwrap();

        let config: Config = builder.try_deserialize().unwrap();
        assert_eq!(config.store.path, PathBuf::from("data/test-patients.json"));
        assert!(!config.store.pretty);
        assert_eq!(config.server.port, 9100);
        assert_eq!(config.server.host, "127.0.0.1");
        assert!(matches!(config.logging.level, LogLevel::Debug));
        assert!(matches!(config.logging.format, LogFormat::Json));
    }

    #[test]
    fn test_cli_overrides() {
        let temp_dir = TempDir::new().unwrap();
        let store_path = temp_dir.path().join("nested").join("patients.json");

        let mut cli = bare_cli();
        cli.store_path = Some(store_path.clone());
        cli.port = Some(9200);
        cli.log_level = Some(LogLevel::Warn);

        let config = Config::load_with_cli(cli).unwrap();
        assert_eq!(config.store.path, store_path);
        assert_eq!(config.server.port, 9200);
        assert!(matches!(config.logging.level, LogLevel::Warn));
        // 存储目录由校验步骤创建
        assert!(temp_dir.path().join("nested").exists());
    }

    #[test]
    fn test_missing_config_file_is_error() {
        let mut cli = bare_cli();
        cli.config = Some(PathBuf::from("/nonexistent/patient-registry.toml"));
        assert!(Config::load_with_cli(cli).is_err());
    }

    #[test]
    fn test_save_and_reload() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("conf").join("config.toml");
        let mut config = Config::default();
        config.server.port = 9300;
        config.save_to_file(&path).unwrap();

        let mut cli = bare_cli();
        cli.config = Some(path);
        let loaded = Config::load_with_cli(cli).unwrap();
        assert_eq!(loaded.server.port, 9300);
    }

    #[test]
    fn test_log_level_conversion() {
        assert_eq!(Level::from(LogLevel::Error), Level::ERROR);
        assert_eq!(Level::from(LogLevel::Warn), Level::WARN);
        assert_eq!(Level::from(LogLevel::Info), Level::INFO);
        assert_eq!(Level::from(LogLevel::Debug), Level::DEBUG);
        assert_eq!(Level::from(LogLevel::Trace), Level::TRACE);
    }
}
