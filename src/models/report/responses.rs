use chrono::{DateTime, Utc};
use serde::Serialize;
use ts_rs::TS;

use crate::models::PaginationInfo;

/// 报表中的提交摘要，成绩已换算到工作坊满分
#[derive(Debug, Clone, PartialEq, Serialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/report.ts")]
pub struct ReportSubmission {
    pub id: i64,
    pub title: String,
    pub modified_at: DateTime<Utc>,
    pub published: bool,
    pub late: bool,
    pub grade: Option<f64>,
    pub grade_over: Option<f64>,
}

/// 报表中的一条评审，counterpart_id 为对方用户
#[derive(Debug, Clone, PartialEq, Serialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/report.ts")]
pub struct ReportAssessment {
    pub assessment_id: i64,
    pub submission_id: i64,
    pub counterpart_id: Option<i64>,
    pub weight: i32,
    pub grade: Option<f64>,
    pub grading_grade: Option<f64>,
    pub grading_grade_over: Option<f64>,
}

/// 每位参与者一行
#[derive(Debug, Clone, PartialEq, Serialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/report.ts")]
pub struct GradingReportRow {
    pub user_id: i64,
    pub firstname: String,
    pub lastname: String,
    pub submission: Option<ReportSubmission>,
    // 收到的评审
    pub reviewed_by: Vec<ReportAssessment>,
    // 给出的评审
    pub reviewer_of: Vec<ReportAssessment>,
    // 汇总后的评审成绩
    pub grading_grade: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/report.ts")]
pub struct GradingReport {
    pub total_count: i64,
    pub max_grade: f64,
    pub max_grading_grade: f64,
    pub pagination: PaginationInfo,
    pub rows: Vec<GradingReportRow>,
}
