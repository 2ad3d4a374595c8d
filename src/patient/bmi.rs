//! BMI 计算与健康判定

use serde::{Deserialize, Serialize};
use std::fmt;

/// 判定区间下界（闭区间）
const NORMAL_FLOOR: f64 = 18.5;
const OVERWEIGHT_FLOOR: f64 = 25.0;
const OBESE_FLOOR: f64 = 30.0;

/// 基于 BMI 的健康判定
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Verdict {
    Underweight,
    Normal,
    Overweight,
    Obese,
}

impl Verdict {
    /// 按 BMI 分级：每个区间下闭上开
    pub fn classify(bmi: f64) -> Self {
        if bmi < NORMAL_FLOOR {
            Verdict::Underweight
        } else if bmi < OVERWEIGHT_FLOOR {
            Verdict::Normal
        } else if bmi < OBESE_FLOOR {
            Verdict::Overweight
        } else {
            Verdict::Obese
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Verdict::Underweight => "Underweight",
            Verdict::Normal => "Normal",
            Verdict::Overweight => "Overweight",
            Verdict::Obese => "Obese",
        }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 计算 BMI，保留两位小数
///
/// 调用方保证 `height_m > 0` 且 `weight_kg > 0`。
pub fn bmi(height_m: f64, weight_kg: f64) -> f64 {
    round2(weight_kg / (height_m * height_m))
}

/// 同时返回 BMI 与判定；判定基于取整后的 BMI
pub fn assess(height_m: f64, weight_kg: f64) -> (f64, Verdict) {
    let bmi = bmi(height_m, weight_kg);
    (bmi, Verdict::classify(bmi))
}

/// 按精确二进制值保留两位小数，恰好居中时取偶数
fn round2(value: f64) -> f64 {
    format!("{value:.2}").parse().unwrap_or(value)
}
