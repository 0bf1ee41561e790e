use serde::Serialize;
use ts_rs::TS;

/// 一次成绩汇总的统计
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/evaluation.ts")]
pub struct AggregationSummary {
    pub submissions_evaluated: i64,
    pub grading_grades_written: i64,
    pub reviewers_aggregated: i64,
}

/// 清理操作影响的行数
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/evaluation.ts")]
pub struct ClearSummary {
    pub submissions_reset: i64,
    pub assessments_reset: i64,
    pub scores_deleted: i64,
    pub aggregations_deleted: i64,
}
