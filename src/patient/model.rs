//! 患者档案数据模型

use super::bmi::{self, Verdict};
use super::validation::{self, FieldChecker};
use crate::error::RegistryResult;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// 性别
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Male,
    Female,
    Others,
}

impl Gender {
    pub const ACCEPTED: [&'static str; 3] = ["male", "female", "others"];

    pub fn as_str(&self) -> &'static str {
        match self {
            Gender::Male => "male",
            Gender::Female => "female",
            Gender::Others => "others",
        }
    }
}

impl FromStr for Gender {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "male" => Ok(Gender::Male),
            "female" => Ok(Gender::Female),
            "others" => Ok(Gender::Others),
            other => Err(format!(
                "'{other}' is not one of {}",
                Gender::ACCEPTED.join(", ")
            )),
        }
    }
}

impl fmt::Display for Gender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 创建请求：所有字段必填，bmi/verdict 由服务端计算
///
/// 数值和性别保留原始类型，交给校验器统一报告所有出错字段。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NewPatient {
    pub id: String,
    pub name: String,
    pub city: String,
    pub age: i64,
    pub gender: String,
    pub height: f64,
    pub weight: f64,
}

/// 部分更新：`None` 表示不修改该字段
///
/// 不接受 id、bmi、verdict 等未知字段。
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct PatientUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub age: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gender: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weight: Option<f64>,
}

impl PatientUpdate {
    /// 是否没有设置任何字段
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.city.is_none()
            && self.age.is_none()
            && self.gender.is_none()
            && self.height.is_none()
            && self.weight.is_none()
    }
}

/// 已校验的患者档案
///
/// 字段只读；`bmi` 与 `verdict` 只能由身高体重推导。
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct PatientRecord {
    id: String,
    name: String,
    city: String,
    age: u32,
    gender: Gender,
    height: f64,
    weight: f64,
    bmi: f64,
    verdict: Verdict,
}

impl PatientRecord {
    /// 校验创建请求并计算派生字段
    pub fn create(candidate: NewPatient) -> RegistryResult<Self> {
        let mut checker = FieldChecker::new();
        let id = checker.check(validation::non_empty("id", &candidate.id));
        let name = checker.check(validation::non_empty("name", &candidate.name));
        let city = checker.check(validation::non_empty("city", &candidate.city));
        let age = checker.check(validation::age(candidate.age));
        let gender = checker.check(validation::gender(&candidate.gender));
        let height = checker.check(validation::positive("height", candidate.height));
        let weight = checker.check(validation::positive("weight", candidate.weight));

        match (id, name, city, age, gender, height, weight) {
            (
                Some(id),
                Some(name),
                Some(city),
                Some(age),
                Some(gender),
                Some(height),
                Some(weight),
            ) if checker.is_clean() => Ok(Self::assemble(id, name, city, age, gender, height, weight)),
            _ => Err(checker.into_error()),
        }
    }

    /// 合并部分更新，返回新档案；id 不变，bmi/verdict 总是重新计算
    pub fn merge(&self, update: PatientUpdate) -> RegistryResult<Self> {
        let mut checker = FieldChecker::new();
        let name = update
            .name
            .and_then(|v| checker.check(validation::non_empty("name", &v)));
        let city = update
            .city
            .and_then(|v| checker.check(validation::non_empty("city", &v)));
        let age = update.age.and_then(|v| checker.check(validation::age(v)));
        let gender = update
            .gender
            .and_then(|v| checker.check(validation::gender(&v)));
        let height = update
            .height
            .and_then(|v| checker.check(validation::positive("height", v)));
        let weight = update
            .weight
            .and_then(|v| checker.check(validation::positive("weight", v)));
        checker.finish()?;

        Ok(Self::assemble(
            self.id.clone(),
            name.unwrap_or_else(|| self.name.clone()),
            city.unwrap_or_else(|| self.city.clone()),
            age.unwrap_or(self.age),
            gender.unwrap_or(self.gender),
            height.unwrap_or(self.height),
            weight.unwrap_or(self.weight),
        ))
    }

    fn assemble(
        id: String,
        name: String,
        city: String,
        age: u32,
        gender: Gender,
        height: f64,
        weight: f64,
    ) -> Self {
        let (bmi, verdict) = bmi::assess(height, weight);
        Self {
            id,
            name,
            city,
            age,
            gender,
            height,
            weight,
            bmi,
            verdict,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn city(&self) -> &str {
        &self.city
    }

    pub fn age(&self) -> u32 {
        self.age
    }

    pub fn gender(&self) -> Gender {
        self.gender
    }

    /// 身高（米）
    pub fn height(&self) -> f64 {
        self.height
    }

    /// 体重（千克）
    pub fn weight(&self) -> f64 {
        self.weight
    }

    pub fn bmi(&self) -> f64 {
        self.bmi
    }

    pub fn verdict(&self) -> Verdict {
        self.verdict
    }
}
