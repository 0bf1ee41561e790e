use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/submission.ts")]
pub struct Submission {
    // 唯一 ID
    pub id: i64,
    pub workshop_id: i64,
    // 作者 ID，示例提交为空
    pub author_id: Option<i64>,
    // 是否为示例提交
    pub example: bool,
    pub title: String,
    pub content: String,
    pub published: bool,
    // 是否在截止后提交
    pub late: bool,
    // 汇总得到的成绩 (0-100)
    pub grade: Option<f64>,
    // 教师覆盖的成绩 (0-100)
    pub grade_over: Option<f64>,
    pub grade_over_by: Option<i64>,
    pub feedback_author: Option<String>,
    pub created_at: DateTime<Utc>,
    pub modified_at: DateTime<Utc>,
}

impl Submission {
    /// 覆盖成绩优先
    pub fn final_grade(&self) -> Option<f64> {
        self.grade_over.or(self.grade)
    }
}
