//! 存储模块
//!
//! 基于单个 JSON 文件的患者档案存储，每次修改整体重写文件

pub mod table;

pub use table::PatientTable;

use crate::error::RegistryResult;
use serde::Serialize;
use std::path::{Path, PathBuf};

/// 存储管理器
///
/// 内存中持有完整映射，`persist` 写回文件，`reload` 从文件重新读取。
#[derive(Debug)]
pub struct RecordStore {
    path: PathBuf,
    pretty: bool,
    table: PatientTable,
}

impl RecordStore {
    /// 打开存储文件；文件不存在时视为空库，首次写入时创建
    pub fn open(path: impl Into<PathBuf>) -> RegistryResult<Self> {
        let mut store = Self {
            path: path.into(),
            pretty: true,
            table: PatientTable::new(),
        };
        store.reload()?;
        Ok(store)
    }

    /// 设置是否以缩进格式写入
    pub fn with_pretty(mut self, pretty: bool) -> Self {
        self.pretty = pretty;
        self
    }

    /// 仅在内存中使用的存储（不会读取文件）
    pub fn in_memory(path: impl Into<PathBuf>, table: PatientTable) -> Self {
        Self {
            path: path.into(),
            pretty: true,
            table,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn table(&self) -> &PatientTable {
        &self.table
    }

    /// 从文件重新加载映射
    pub fn reload(&mut self) -> RegistryResult<()> {
        if !self.path.exists() {
            tracing::info!("存储文件不存在，使用空档案库: {}", self.path.display());
            self.table = PatientTable::new();
            return Ok(());
        }

        let content = std::fs::read_to_string(&self.path)?;
        self.table = if content.trim().is_empty() {
            PatientTable::new()
        } else {
            serde_json::from_str(&content)?
        };

        tracing::info!(
            "已加载 {} 条患者档案: {}",
            self.table.len(),
            self.path.display()
        );
        Ok(())
    }

    /// 将当前映射写回文件
    pub fn persist(&self) -> RegistryResult<()> {
        write_table(&self.path, &self.table, self.pretty)
    }

    /// 替换内存映射并落盘；写入失败时恢复原映射，文件保持原状
    pub fn commit(&mut self, table: PatientTable) -> RegistryResult<()> {
        let previous = std::mem::replace(&mut self.table, table);
        if let Err(e) = self.persist() {
            self.table = previous;
            return Err(e);
        }
        Ok(())
    }
}

/// 写入临时文件后重命名，保证整体替换
fn write_table(path: &Path, table: &PatientTable, pretty: bool) -> RegistryResult<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            tracing::debug!("创建存储目录: {:?}", parent);
            std::fs::create_dir_all(parent)?;
        }
    }

    let bytes = if pretty {
        let mut buf = Vec::new();
        let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
        let mut serializer = serde_json::Serializer::with_formatter(&mut buf, formatter);
        table.serialize(&mut serializer)?;
        buf
    } else {
        serde_json::to_vec(table)?
    };

    let mut tmp_name = path.file_name().unwrap_or_default().to_os_string();
    tmp_name.push(".tmp");
    let tmp_path = path.with_file_name(tmp_name);

    if let Err(e) = std::fs::write(&tmp_path, bytes).and_then(|_| std::fs::rename(&tmp_path, path)) {
        // 失败时清理临时文件，忽略清理本身的错误
        let _ = std::fs::remove_file(&tmp_path);
        return Err(e.into());
    }

    tracing::debug!("已写入 {} 条患者档案: {}", table.len(), path.display());
    Ok(())
}
