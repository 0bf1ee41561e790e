use serde::Deserialize;
use ts_rs::TS;

use crate::models::common::pagination::deserialize_string_to_i64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "../frontend/src/types/generated/report.ts")]
pub enum ReportSortKey {
    Lastname,
    Firstname,
    SubmissionTitle,
    SubmissionModified,
    SubmissionGrade,
    GradingGrade,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "../frontend/src/types/generated/report.ts")]
pub enum SortDirection {
    Asc,
    Desc,
}

/// 成绩报表查询参数
#[derive(Debug, Clone, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/report.ts")]
pub struct GradingReportQuery {
    pub group_id: Option<i64>,
    #[serde(
        default = "default_page",
        deserialize_with = "deserialize_string_to_i64"
    )]
    pub page: i64,
    #[serde(
        default = "default_per_page",
        deserialize_with = "deserialize_string_to_i64"
    )]
    pub per_page: i64,
    #[serde(default = "default_sort_by")]
    pub sort_by: ReportSortKey,
    #[serde(default = "default_sort_dir")]
    pub sort_dir: SortDirection,
}

impl GradingReportQuery {
    pub const MAX_PER_PAGE: i64 = 1000;

    /// 页码从 1 开始，每页 1..=1000
    pub fn normalized(&self) -> (i64, i64) {
        (self.page.max(1), self.per_page.clamp(1, Self::MAX_PER_PAGE))
    }
}

impl Default for GradingReportQuery {
    fn default() -> Self {
        Self {
            group_id: None,
            page: default_page(),
            per_page: default_per_page(),
            sort_by: default_sort_by(),
            sort_dir: default_sort_dir(),
        }
    }
}

fn default_page() -> i64 {
    1
}

fn default_per_page() -> i64 {
    10
}

fn default_sort_by() -> ReportSortKey {
    ReportSortKey::Lastname
}

fn default_sort_dir() -> SortDirection {
    SortDirection::Asc
}
