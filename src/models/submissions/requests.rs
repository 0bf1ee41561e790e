use serde::Deserialize;
use ts_rs::TS;

/// 创建提交（正式提交与示例提交共用）
#[derive(Debug, Clone, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/submission.ts")]
pub struct CreateSubmissionRequest {
    pub title: String,
    pub content: String,
}

/// 覆盖提交成绩，grade_over 为空表示撤销覆盖
#[derive(Debug, Clone, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/submission.ts")]
pub struct OverrideSubmissionGradeRequest {
    pub grade_over: Option<f64>,
    pub feedback_author: Option<String>,
}

/// 发布或撤回提交
#[derive(Debug, Clone, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/submission.ts")]
pub struct PublishSubmissionRequest {
    pub published: bool,
}
