//! 阶段状态机
//!
//! SETUP → SUBMISSION → ASSESSMENT → EVALUATION → CLOSED，只能逐级前进。
//! 本模块只包含纯函数，持久化与 CAS 更新在 `services::workshops::phase` 中完成。

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::models::workshops::entities::Workshop;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "../frontend/src/types/generated/workshop.ts")]
pub enum Phase {
    Setup,
    Submission,
    Assessment,
    Evaluation,
    Closed,
}

impl Phase {
    pub const SETUP: i32 = 10;
    pub const SUBMISSION: i32 = 20;
    pub const ASSESSMENT: i32 = 30;
    pub const EVALUATION: i32 = 40;
    pub const CLOSED: i32 = 50;

    pub fn all() -> &'static [Phase] {
        &[
            Phase::Setup,
            Phase::Submission,
            Phase::Assessment,
            Phase::Evaluation,
            Phase::Closed,
        ]
    }

    pub fn code(self) -> i32 {
        match self {
            Phase::Setup => Self::SETUP,
            Phase::Submission => Self::SUBMISSION,
            Phase::Assessment => Self::ASSESSMENT,
            Phase::Evaluation => Self::EVALUATION,
            Phase::Closed => Self::CLOSED,
        }
    }

    pub fn from_code(code: i32) -> Option<Self> {
        match code {
            Self::SETUP => Some(Phase::Setup),
            Self::SUBMISSION => Some(Phase::Submission),
            Self::ASSESSMENT => Some(Phase::Assessment),
            Self::EVALUATION => Some(Phase::Evaluation),
            Self::CLOSED => Some(Phase::Closed),
            _ => None,
        }
    }

    /// 下一阶段，CLOSED 没有下一阶段
    pub fn next(self) -> Option<Self> {
        match self {
            Phase::Setup => Some(Phase::Submission),
            Phase::Submission => Some(Phase::Assessment),
            Phase::Assessment => Some(Phase::Evaluation),
            Phase::Evaluation => Some(Phase::Closed),
            Phase::Closed => None,
        }
    }
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Phase::Setup => write!(f, "setup"),
            Phase::Submission => write!(f, "submission"),
            Phase::Assessment => write!(f, "assessment"),
            Phase::Evaluation => write!(f, "evaluation"),
            Phase::Closed => write!(f, "closed"),
        }
    }
}

/// 受阶段约束的操作
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "../frontend/src/types/generated/workshop.ts")]
pub enum WorkshopOperation {
    EditSettings,
    ManageGradingForm,
    ManageExamples,
    CreateSubmission,
    EditSubmission,
    AssessExample,
    Allocate,
    Assess,
    AggregateGrades,
    OverrideGrades,
    SetEvaluationMethod,
    ClearAggregatedGrades,
    ClearAssessments,
    PublishSubmission,
    SwitchPhase,
}

impl WorkshopOperation {
    pub fn all() -> &'static [WorkshopOperation] {
        use WorkshopOperation::*;
        &[
            EditSettings,
            ManageGradingForm,
            ManageExamples,
            CreateSubmission,
            EditSubmission,
            AssessExample,
            Allocate,
            Assess,
            AggregateGrades,
            OverrideGrades,
            SetEvaluationMethod,
            ClearAggregatedGrades,
            ClearAssessments,
            PublishSubmission,
            SwitchPhase,
        ]
    }
}

/// 阶段对操作的准入判断，对所有 (操作, 阶段) 组合都有定义
pub fn can(op: WorkshopOperation, phase: Phase) -> bool {
    use Phase::*;
    use WorkshopOperation::*;

    match op {
        EditSettings => true,
        ManageGradingForm | ManageExamples => matches!(phase, Setup | Submission),
        CreateSubmission | EditSubmission => phase == Submission,
        AssessExample | Allocate => matches!(phase, Setup | Submission | Assessment),
        Assess => phase == Assessment,
        AggregateGrades | OverrideGrades | ClearAggregatedGrades => phase == Evaluation,
        ClearAssessments => matches!(phase, Assessment | Evaluation),
        SetEvaluationMethod | PublishSubmission => matches!(phase, Evaluation | Closed),
        SwitchPhase => phase != Closed,
    }
}

impl Workshop {
    /// 在阶段准入之上叠加活动自身的开关
    pub fn permits(&self, op: WorkshopOperation) -> bool {
        use WorkshopOperation::*;

        match op {
            Assess => {
                can(op, self.phase) || (self.assess_as_soon_submitted && self.phase == Phase::Submission)
            }
            CreateSubmission | EditSubmission => self.allow_submission && can(op, self.phase),
            ManageExamples | AssessExample => self.use_examples && can(op, self.phase),
            Allocate => self.assessment_type.includes_peers() && can(op, self.phase),
            _ => can(op, self.phase),
        }
    }

    /// 当前允许的全部操作
    pub fn permitted_operations(&self) -> Vec<WorkshopOperation> {
        WorkshopOperation::all()
            .iter()
            .copied()
            .filter(|op| self.permits(*op))
            .collect()
    }
}

/// 自动切换是否到期：提交阶段、开关打开、提交截止时间已过
pub fn auto_switch_due(workshop: &Workshop, now: DateTime<Utc>) -> bool {
    workshop.phase == Phase::Submission
        && workshop.phase_switch_assessment
        && workshop.submission_end.is_some_and(|end| end < now)
}

/// `advance_if_due` 的结果
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "../frontend/src/types/generated/workshop.ts")]
pub enum AdvanceOutcome {
    /// 条件不满足，未做任何事
    NotDue,
    /// 本次调用完成了切换
    Advanced,
    /// 条件满足但已被并发请求切换
    AlreadyAdvanced,
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::models::workshops::entities::{AssessmentType, ExamplesMode, GroupMode};

    pub(crate) fn sample_workshop(phase: Phase) -> Workshop {
        let now = Utc::now();
        Workshop {
            id: 1,
            course_id: 1,
            name: "Essay review".to_string(),
            phase,
            assessment_type: AssessmentType::Peer,
            use_self_assessment: false,
            allow_submission: true,
            assess_without_submission: false,
            assess_as_soon_submitted: false,
            use_examples: false,
            examples_mode: ExamplesMode::Voluntary,
            grade: 80.0,
            grading_grade: 20.0,
            grade_decimals: 0,
            strategy: "accumulative".to_string(),
            strategy_settings: serde_json::Value::Null,
            evaluation: "best".to_string(),
            evaluation_settings: serde_json::Value::Null,
            submission_start: None,
            submission_end: None,
            assessment_start: None,
            assessment_end: None,
            phase_switch_assessment: false,
            late_submissions: false,
            group_mode: GroupMode::NoGroups,
            submission_grade_pass: None,
            grading_grade_pass: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_phase_codes_round_trip() {
        for phase in Phase::all() {
            assert_eq!(Phase::from_code(phase.code()), Some(*phase));
        }
        assert_eq!(Phase::from_code(15), None);
    }

    #[test]
    fn test_next_is_forward_by_one() {
        let all = Phase::all();
        for pair in all.windows(2) {
            assert_eq!(pair[0].next(), Some(pair[1]));
            assert!(pair[0] < pair[1]);
        }
        assert_eq!(Phase::Closed.next(), None);
    }

    #[test]
    fn test_can_is_total() {
        // 每个操作至少在一个阶段可用
        for op in WorkshopOperation::all() {
            let allowed = Phase::all().iter().filter(|p| can(*op, **p)).count();
            assert!(allowed >= 1, "{op:?} is never allowed");
        }
        assert!(can(WorkshopOperation::CreateSubmission, Phase::Submission));
        assert!(!can(WorkshopOperation::CreateSubmission, Phase::Assessment));
        assert!(can(WorkshopOperation::Assess, Phase::Assessment));
        assert!(!can(WorkshopOperation::SetEvaluationMethod, Phase::Assessment));
        assert!(can(WorkshopOperation::SetEvaluationMethod, Phase::Closed));
        assert!(!can(WorkshopOperation::SwitchPhase, Phase::Closed));
    }

    #[test]
    fn test_permits_assess_as_soon_submitted() {
        let mut workshop = sample_workshop(Phase::Submission);
        assert!(!workshop.permits(WorkshopOperation::Assess));
        workshop.assess_as_soon_submitted = true;
        assert!(workshop.permits(WorkshopOperation::Assess));
    }

    #[test]
    fn test_permits_respects_flags() {
        let mut workshop = sample_workshop(Phase::Submission);
        assert!(!workshop.permits(WorkshopOperation::AssessExample));
        workshop.use_examples = true;
        assert!(workshop.permits(WorkshopOperation::AssessExample));

        workshop.allow_submission = false;
        assert!(!workshop.permits(WorkshopOperation::CreateSubmission));

        workshop.assessment_type = AssessmentType::SelfOnly;
        assert!(!workshop.permits(WorkshopOperation::Allocate));
    }

    #[test]
    fn test_auto_switch_due() {
        let now = Utc::now();
        let mut workshop = sample_workshop(Phase::Submission);
        workshop.submission_end = Some(now - chrono::Duration::minutes(5));
        assert!(!auto_switch_due(&workshop, now));

        workshop.phase_switch_assessment = true;
        assert!(auto_switch_due(&workshop, now));

        workshop.submission_end = Some(now + chrono::Duration::minutes(5));
        assert!(!auto_switch_due(&workshop, now));

        workshop.submission_end = None;
        assert!(!auto_switch_due(&workshop, now));

        workshop.submission_end = Some(now - chrono::Duration::minutes(5));
        workshop.phase = Phase::Assessment;
        assert!(!auto_switch_due(&workshop, now));
    }

    #[test]
    fn test_examples_gating() {
        let mut workshop = sample_workshop(Phase::Submission);
        workshop.use_examples = true;
        workshop.examples_mode = ExamplesMode::BeforeSubmission;
        assert!(workshop.assessing_examples_allowed());
        assert!(workshop.examples_must());

        workshop.phase = Phase::Assessment;
        assert!(!workshop.assessing_examples_allowed());

        workshop.examples_mode = ExamplesMode::BeforeAssessment;
        assert!(workshop.assessing_examples_allowed());

        workshop.examples_mode = ExamplesMode::Voluntary;
        assert!(workshop.assessing_examples_allowed());
        assert!(!workshop.examples_must());
    }
}
