use anyhow::Result;
use clap::Parser;
use patient_registry::config::{Cli, Commands, Config};
use patient_registry::patient::PatientRecord;
use patient_registry::registry::Registry;
use patient_registry::server::Server;
use patient_registry::storage::RecordStore;

#[tokio::main]
async fn main() -> Result<()> {
    // 解析命令行参数
    let cli = Cli::parse();

    // 加载配置
    let config = Config::load_with_cli(cli.clone())?;

    // 初始化日志系统，guard 需要活到进程结束
    let _log_guard = config.init_logging()?;

    tracing::info!("Patient Registry Starting...");

    // 未指定子命令时默认启动服务
    handle_command(cli.command.unwrap_or(Commands::Serve), &config).await
}

/// 除 serve 外的子命令直接操作存储文件
async fn handle_command(command: Commands, config: &Config) -> Result<()> {
    let open_registry = || -> Result<Registry> {
        let store = RecordStore::open(&config.store.path)?.with_pretty(config.store.pretty);
        Ok(Registry::new(store))
    };

    match command {
        Commands::Serve => {
            let server = Server::new(config)?;
            server.run().await?;
        }
        Commands::List => {
            let registry = open_registry()?;
            println!("共 {} 条档案:", registry.len());
            for record in registry.list() {
                print_record(&record);
            }
        }
        Commands::Show { id } => {
            let record = open_registry()?.get(&id)?;
            println!("{}", serde_json::to_string_pretty(&record)?);
        }
        Commands::Sort { field, order } => {
            let records = open_registry()?.sorted(&field, order.as_deref())?;
            for record in records {
                print_record(&record);
            }
        }
        Commands::Delete { id } => {
            open_registry()?.delete(&id)?;
            println!("已删除患者档案: {id}");
        }
        Commands::ResetConfig => {
            // 重置配置
            let default_config = Config::default();
            if let Some(config_path) = Config::get_user_config_path() {
                default_config.save_to_file(&config_path)?;
                println!("配置已重置到: {}", config_path.display());
            } else {
                println!("无法确定配置文件路径");
            }
        }
    }

    Ok(())
}

fn print_record(record: &PatientRecord) {
    println!(
        "  {} - {} ({}, {} 岁, {}) 身高 {:.2}m 体重 {:.1}kg BMI {:.2} [{}]",
        record.id(),
        record.name(),
        record.city(),
        record.age(),
        record.gender(),
        record.height(),
        record.weight(),
        record.bmi(),
        record.verdict()
    );
}
