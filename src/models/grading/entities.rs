use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// 量规等级
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/grading.ts")]
pub struct RubricLevel {
    pub grade: f64,
    pub definition: String,
}

/// 评分表单中的一个维度
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/grading.ts")]
pub struct Criterion {
    pub id: i64,
    pub sort_order: i32,
    pub description: String,
    // 累计策略的满分；错误计数策略固定为 1
    pub max_grade: f64,
    pub weight: i32,
    // 仅量规策略使用
    pub levels: Vec<RubricLevel>,
}

/// 某工作坊在某评分策略下的表单
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/grading.ts")]
pub struct GradingForm {
    pub strategy: String,
    pub criteria: Vec<Criterion>,
    #[ts(type = "unknown")]
    pub settings: serde_json::Value,
}

/// 错误数到成绩的映射
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/grading.ts")]
pub struct ErrorMapping {
    pub errors: i32,
    pub grade: f64,
}

/// 错误计数策略的设置
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[serde(default)]
#[ts(export, export_to = "../frontend/src/types/generated/grading.ts")]
pub struct NumErrorsSettings {
    pub mappings: Vec<ErrorMapping>,
}

/// 评价策略使用的维度信息
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/grading.ts")]
pub struct Dimension {
    pub dimension_id: i64,
    pub min: f64,
    pub max: f64,
    pub weight: f64,
}
