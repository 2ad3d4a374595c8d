//! 档案服务
//!
//! 在存储外加一把互斥锁，保证 读取 -> 修改 -> 落盘 整体串行

use crate::error::{RegistryError, RegistryResult};
use crate::patient::{self, NewPatient, PatientRecord, PatientUpdate};
use crate::storage::{PatientTable, RecordStore};
use parking_lot::Mutex;

/// 患者档案服务
pub struct Registry {
    store: Mutex<RecordStore>,
}

impl Registry {
    pub fn new(store: RecordStore) -> Self {
        Self {
            store: Mutex::new(store),
        }
    }

    /// 当前映射的副本
    pub fn snapshot(&self) -> PatientTable {
        self.store.lock().table().clone()
    }

    /// 按插入顺序返回所有档案
    pub fn list(&self) -> Vec<PatientRecord> {
        self.store.lock().table().to_vec()
    }

    pub fn len(&self) -> usize {
        self.store.lock().table().len()
    }

    pub fn is_empty(&self) -> bool {
        self.store.lock().table().is_empty()
    }

    pub fn get(&self, id: &str) -> RegistryResult<PatientRecord> {
        tracing::debug!(patient_id = %id, "查询患者档案");
        self.store
            .lock()
            .table()
            .get(id)
            .cloned()
            .ok_or_else(|| RegistryError::not_found(id))
    }

    /// 按字段排序返回所有档案，参数为原始字符串
    pub fn sorted(&self, field: &str, order: Option<&str>) -> RegistryResult<Vec<PatientRecord>> {
        let (field, order) = patient::parse_sort(field, order)?;
        let mut records = self.list();
        patient::sort_records(&mut records, field, order);
        tracing::debug!(%field, %order, count = records.len(), "排序患者档案");
        Ok(records)
    }

    /// 校验并创建档案
    pub fn create(&self, candidate: NewPatient) -> RegistryResult<PatientRecord> {
        let record = PatientRecord::create(candidate)?;

        let mut store = self.store.lock();
        if store.table().contains(record.id()) {
            return Err(RegistryError::Conflict {
                id: record.id().to_string(),
            });
        }

        let mut table = store.table().clone();
        table.upsert(record.clone());
        store.commit(table)?;

        tracing::info!(patient_id = %record.id(), verdict = %record.verdict(), "已创建患者档案");
        Ok(record)
    }

    /// 合并部分更新，bmi/verdict 总是重新计算
    pub fn update(&self, id: &str, update: PatientUpdate) -> RegistryResult<PatientRecord> {
        let mut store = self.store.lock();
        let existing = store
            .table()
            .get(id)
            .ok_or_else(|| RegistryError::not_found(id))?;

        if update.is_empty() {
            tracing::debug!(patient_id = %id, "空更新，档案保持不变");
            return Ok(existing.clone());
        }

        let merged = existing.merge(update)?;
        let mut table = store.table().clone();
        table.upsert(merged.clone());
        store.commit(table)?;

        tracing::info!(patient_id = %id, bmi = merged.bmi(), "已更新患者档案");
        Ok(merged)
    }

    /// 删除档案，不可恢复
    pub fn delete(&self, id: &str) -> RegistryResult<PatientRecord> {
        let mut store = self.store.lock();
        let mut table = store.table().clone();
        let removed = table
            .remove(id)
            .ok_or_else(|| RegistryError::not_found(id))?;
        store.commit(table)?;

        tracing::info!(patient_id = %id, "已删除患者档案");
        Ok(removed)
    }

    /// 丢弃内存状态，从文件重新加载
    pub fn reload(&self) -> RegistryResult<()> {
        self.store.lock().reload()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::patient::Verdict;
    use tempfile::TempDir;

    fn setup_registry() -> (Registry, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let store = RecordStore::open(temp_dir.path().join("patients.json")).unwrap();
        (Registry::new(store), temp_dir)
    }

    fn candidate(id: &str, age: i64, weight: f64) -> NewPatient {
        NewPatient {
            id: id.into(),
            name: "Priya Nair".into(),
            city: "Chennai".into(),
            age,
            gender: "female".into(),
            height: 1.70,
            weight,
        }
    }

    #[test]
    fn test_create_and_get() {
        let (registry, _temp_dir) = setup_registry();
        let created = registry.create(candidate("P001", 34, 70.0)).unwrap();
        assert_eq!(created.bmi(), 24.22);
        assert_eq!(created.verdict(), Verdict::Normal);

        assert_eq!(registry.get("P001").unwrap(), created);
        assert_eq!(registry.get("P404").unwrap_err().kind(), "not_found");
    }

    #[test]
    fn test_duplicate_create_leaves_store_unchanged() {
        let (registry, _temp_dir) = setup_registry();
        let original = registry.create(candidate("P001", 34, 70.0)).unwrap();

        let err = registry.create(candidate("P001", 50, 90.0)).unwrap_err();
        assert!(matches!(err, RegistryError::Conflict { ref id } if id == "P001"));
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.get("P001").unwrap(), original);
    }

    #[test]
    fn test_invalid_create_is_not_stored() {
        let (registry, _temp_dir) = setup_registry();
        let err = registry.create(candidate("P001", 0, 70.0)).unwrap_err();
        assert_eq!(err.kind(), "validation");
        assert!(registry.is_empty());
    }

    #[test]
    fn test_update_weight_recomputes_and_persists() {
        let (registry, temp_dir) = setup_registry();
        registry.create(candidate("P001", 34, 70.0)).unwrap();

        let updated = registry
            .update(
                "P001",
                PatientUpdate {
                    weight: Some(90.0),
                    ..Default::default()
                },
            )
            .unwrap();
        assert_eq!(updated.bmi(), 31.14);
        assert_eq!(updated.verdict(), Verdict::Obese);
        assert_eq!(updated.height(), 1.70);

        let reopened = RecordStore::open(temp_dir.path().join("patients.json")).unwrap();
        assert_eq!(reopened.table().get("P001"), Some(&updated));
    }

    #[test]
    fn test_update_unknown_id() {
        let (registry, _temp_dir) = setup_registry();
        let err = registry.update("P404", PatientUpdate::default()).unwrap_err();
        assert_eq!(err.kind(), "not_found");
    }

    #[test]
    fn test_empty_update_returns_unchanged_record() {
        let (registry, _temp_dir) = setup_registry();
        let created = registry.create(candidate("P001", 34, 70.0)).unwrap();
        let updated = registry.update("P001", PatientUpdate::default()).unwrap();
        assert_eq!(updated, created);
    }

    #[test]
    fn test_invalid_update_keeps_record() {
        let (registry, _temp_dir) = setup_registry();
        let created = registry.create(candidate("P001", 34, 70.0)).unwrap();
        let err = registry
            .update(
                "P001",
                PatientUpdate {
                    age: Some(200),
                    ..Default::default()
                },
            )
            .unwrap_err();
        assert_eq!(err.kind(), "validation");
        assert_eq!(registry.get("P001").unwrap(), created);
    }

    #[test]
    fn test_delete() {
        let (registry, _temp_dir) = setup_registry();
        registry.create(candidate("P001", 34, 70.0)).unwrap();
        registry.create(candidate("P002", 40, 60.0)).unwrap();

        let err = registry.delete("P404").unwrap_err();
        assert_eq!(err.kind(), "not_found");
        assert_eq!(registry.len(), 2);

        registry.delete("P001").unwrap();
        assert_eq!(registry.len(), 1);
        assert!(registry.get("P001").is_err());
    }

    #[test]
    fn test_sorted_age_desc_keeps_ties_in_insertion_order() {
        let (registry, _temp_dir) = setup_registry();
        registry.create(candidate("P1", 30, 70.0)).unwrap();
        registry.create(candidate("P2", 50, 70.0)).unwrap();
        registry.create(candidate("P3", 30, 70.0)).unwrap();

        let sorted = registry.sorted("age", Some("desc")).unwrap();
        let ids: Vec<_> = sorted.iter().map(PatientRecord::id).collect();
        assert_eq!(ids, vec!["P2", "P1", "P3"]);

        assert_eq!(
            registry.sorted("name", None).unwrap_err().kind(),
            "invalid_argument"
        );
    }

    #[test]
    fn test_failed_persist_keeps_memory_state() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("occupied");
        std::fs::create_dir_all(path.join("child")).unwrap();
        let registry = Registry::new(RecordStore::in_memory(&path, PatientTable::new()));

        let err = registry.create(candidate("P001", 34, 70.0)).unwrap_err();
        assert_eq!(err.kind(), "internal");
        assert!(registry.is_empty());
    }
}
