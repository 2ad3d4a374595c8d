//! 按插入顺序保存的患者映射表

use crate::patient::{Gender, NewPatient, PatientRecord, Verdict};
use serde::de::{Error as _, MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::HashMap;
use std::fmt;

/// id -> 档案 的映射，迭代顺序即插入顺序
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PatientTable {
    order: Vec<String>,
    records: HashMap<String, PatientRecord>,
}

impl PatientTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.records.contains_key(id)
    }

    pub fn get(&self, id: &str) -> Option<&PatientRecord> {
        self.records.get(id)
    }

    /// 新 id 追加到末尾，已有 id 原位替换
    pub fn upsert(&mut self, record: PatientRecord) {
        let id = record.id().to_string();
        if self.records.insert(id.clone(), record).is_none() {
            self.order.push(id);
        }
    }

    pub fn remove(&mut self, id: &str) -> Option<PatientRecord> {
        let removed = self.records.remove(id)?;
        self.order.retain(|existing| existing != id);
        Some(removed)
    }

    pub fn iter(&self) -> impl Iterator<Item = &PatientRecord> + '_ {
        self.order.iter().filter_map(|id| self.records.get(id))
    }

    /// 按插入顺序复制所有档案
    pub fn to_vec(&self) -> Vec<PatientRecord> {
        self.iter().cloned().collect()
    }
}

/// 落盘格式：id 作为键，不在值中重复
#[derive(Serialize)]
struct StoredPatientRef<'a> {
    name: &'a str,
    city: &'a str,
    age: u32,
    gender: Gender,
    height: f64,
    weight: f64,
    bmi: f64,
    verdict: Verdict,
}

/// 读取时忽略文件中的 bmi/verdict，加载后校验并按身高体重重算
#[derive(Deserialize)]
struct StoredPatient {
    name: String,
    city: String,
    age: u32,
    gender: Gender,
    height: f64,
    weight: f64,
}

impl<'a> From<&'a PatientRecord> for StoredPatientRef<'a> {
    fn from(record: &'a PatientRecord) -> Self {
        Self {
            name: record.name(),
            city: record.city(),
            age: record.age(),
            gender: record.gender(),
            height: record.height(),
            weight: record.weight(),
            bmi: record.bmi(),
            verdict: record.verdict(),
        }
    }
}

impl Serialize for PatientTable {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.len()))?;
        for record in self.iter() {
            map.serialize_entry(record.id(), &StoredPatientRef::from(record))?;
        }
        map.end()
    }
}

struct PatientTableVisitor;

impl<'de> Visitor<'de> for PatientTableVisitor {
    type Value = PatientTable;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("a map from patient id to patient record")
    }

    fn visit_map<M: MapAccess<'de>>(self, mut access: M) -> Result<Self::Value, M::Error> {
        let mut table = PatientTable::new();
        while let Some((id, stored)) = access.next_entry::<String, StoredPatient>()? {
            // 与创建时走同一套校验，拒绝文件中被篡改或损坏的档案
            let record = PatientRecord::create(NewPatient {
                id: id.clone(),
                name: stored.name,
                city: stored.city,
                age: i64::from(stored.age),
                gender: stored.gender.as_str().to_string(),
                height: stored.height,
                weight: stored.weight,
            })
            .map_err(|e| M::Error::custom(format!("patient {id}: {e}")))?;
            table.upsert(record);
        }
        Ok(table)
    }
}

impl<'de> Deserialize<'de> for PatientTable {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_map(PatientTableVisitor)
    }
}
