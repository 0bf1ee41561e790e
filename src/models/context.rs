//! 请求上下文
//!
//! 每次核心调用显式携带当前用户与能力快照，能力判定由调用方完成。

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use ts_rs::TS;

/// 能力标识，与 LMS 侧的 capability 一一对应
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "../frontend/src/types/generated/context.ts")]
pub enum Capability {
    /// 修改活动设置、切换阶段
    ManageActivity,
    /// 提交作品
    Submit,
    /// 评审同伴
    PeerAssess,
    /// 管理示例提交
    ManageExamples,
    /// 分配评审
    Allocate,
    /// 覆盖成绩
    OverrideGrades,
    /// 查看全部提交
    ViewAllSubmissions,
    /// 查看全部评审
    ViewAllAssessments,
    /// 查看评审者姓名
    ViewReviewerNames,
    /// 不受分组隔离限制
    AccessAllGroups,
}

impl std::fmt::Display for Capability {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Capability::ManageActivity => "manage_activity",
            Capability::Submit => "submit",
            Capability::PeerAssess => "peer_assess",
            Capability::ManageExamples => "manage_examples",
            Capability::Allocate => "allocate",
            Capability::OverrideGrades => "override_grades",
            Capability::ViewAllSubmissions => "view_all_submissions",
            Capability::ViewAllAssessments => "view_all_assessments",
            Capability::ViewReviewerNames => "view_reviewer_names",
            Capability::AccessAllGroups => "access_all_groups",
        };
        write!(f, "{name}")
    }
}

/// 当前请求的用户与能力快照
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestContext {
    pub user_id: i64,
    pub capabilities: HashSet<Capability>,
}

impl RequestContext {
    pub fn new(user_id: i64, capabilities: impl IntoIterator<Item = Capability>) -> Self {
        Self {
            user_id,
            capabilities: capabilities.into_iter().collect(),
        }
    }

    /// 后台任务使用的系统上下文，user_id 为 0
    pub fn system() -> Self {
        Self::new(
            0,
            [
                Capability::ManageActivity,
                Capability::Allocate,
                Capability::AccessAllGroups,
            ],
        )
    }

    pub fn has(&self, capability: Capability) -> bool {
        self.capabilities.contains(&capability)
    }

    pub fn has_any(&self, capabilities: &[Capability]) -> bool {
        capabilities.iter().any(|c| self.has(*c))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capability_serde_names() {
        let json = serde_json::to_string(&Capability::AccessAllGroups).unwrap();
        assert_eq!(json, "\"access_all_groups\"");
        let parsed: Capability = serde_json::from_str("\"manage_examples\"").unwrap();
        assert_eq!(parsed, Capability::ManageExamples);
        assert_eq!(Capability::ManageExamples.to_string(), "manage_examples");
    }

    #[test]
    fn test_has_any() {
        let ctx = RequestContext::new(7, [Capability::Submit]);
        assert!(ctx.has(Capability::Submit));
        assert!(!ctx.has(Capability::Allocate));
        assert!(ctx.has_any(&[Capability::Allocate, Capability::Submit]));
    }
}
