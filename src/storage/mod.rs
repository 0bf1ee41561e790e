use std::collections::HashMap;
use std::sync::Arc;

use crate::models::{
    allocation::entities::{
        AllocatedPair, AllocationRow, AllocationSchedule, AllocationStatus,
        RandomAllocationSettings,
    },
    assessments::{
        entities::{Assessment, CriterionScore},
        requests::CriterionScoreInput,
    },
    evaluation::responses::ClearSummary,
    grading::{entities::Criterion, requests::CriterionInput},
    participants::{entities::Participant, requests::ParticipantInput},
    submissions::entities::Submission,
    workshops::entities::Workshop,
};
use crate::workflow::phase::Phase;

use crate::errors::Result;

pub mod sea_orm_storage;

/// 新建提交
#[derive(Debug, Clone)]
pub struct NewSubmission {
    pub workshop_id: i64,
    // 示例提交没有作者
    pub author_id: Option<i64>,
    pub example: bool,
    pub title: String,
    pub content: String,
    pub late: bool,
}

/// 在同一事务内读出的评价快照
#[derive(Debug, Clone, Default)]
pub struct EvaluationSnapshot {
    pub submissions: Vec<Submission>,
    pub assessments: Vec<Assessment>,
    pub scores: Vec<CriterionScore>,
}

/// 一次汇总要写回的全部成绩
#[derive(Debug, Clone, Default)]
pub struct EvaluationWrite {
    // (submission_id, grade)
    pub submission_grades: Vec<(i64, Option<f64>)>,
    // (assessment_id, grading_grade)
    pub grading_grades: Vec<(i64, Option<f64>)>,
    // (user_id, aggregated grading grade)
    pub aggregations: Vec<(i64, Option<f64>)>,
}

#[async_trait::async_trait]
pub trait Storage: Send + Sync {
    /// 工作坊管理方法
    // 创建工作坊，忽略 draft 中的 id 与时间戳
    async fn create_workshop(&self, draft: Workshop) -> Result<Workshop>;
    // 通过ID获取工作坊
    async fn get_workshop(&self, id: i64) -> Result<Option<Workshop>>;
    // 保存设置字段，不修改阶段
    async fn update_workshop(&self, workshop: &Workshop) -> Result<Workshop>;
    // 提交阶段内截止时间已过的工作坊
    async fn list_workshops_past_submission_end(&self, now: i64) -> Result<Vec<i64>>;
    // 阶段比较并交换，失败返回 None；成功时返回新建的自评分配
    async fn transition_phase(
        &self,
        workshop_id: i64,
        from: Phase,
        to: Phase,
        require_auto_switch: bool,
        create_self_assessments: bool,
    ) -> Result<Option<Vec<AllocatedPair>>>;

    /// 参与者管理方法
    // 以宿主推送的名单为准同步参与者
    async fn sync_participants(
        &self,
        workshop_id: i64,
        participants: Vec<ParticipantInput>,
    ) -> Result<Vec<Participant>>;
    async fn list_participants(&self, workshop_id: i64) -> Result<Vec<Participant>>;
    async fn get_participant(&self, workshop_id: i64, user_id: i64)
    -> Result<Option<Participant>>;

    /// 提交管理方法
    async fn create_submission(&self, submission: NewSubmission) -> Result<Submission>;
    async fn update_submission_content(
        &self,
        id: i64,
        title: String,
        content: String,
        late: bool,
    ) -> Result<Option<Submission>>;
    async fn get_submission(&self, id: i64) -> Result<Option<Submission>>;
    async fn get_author_submission(
        &self,
        workshop_id: i64,
        author_id: i64,
    ) -> Result<Option<Submission>>;
    // examples 为 true 时只列示例提交，否则只列正式提交
    async fn list_submissions(&self, workshop_id: i64, examples: bool) -> Result<Vec<Submission>>;
    async fn override_submission_grade(
        &self,
        id: i64,
        grade_over: Option<f64>,
        by: i64,
        feedback_author: Option<String>,
    ) -> Result<Option<Submission>>;
    async fn set_submission_published(&self, id: i64, published: bool)
    -> Result<Option<Submission>>;

    /// 评审与分配方法
    // 幂等地创建分配，返回 (记录, 是否新建)
    async fn add_allocation(
        &self,
        submission_id: i64,
        reviewer_id: i64,
        weight: i32,
    ) -> Result<(Assessment, bool)>;
    async fn get_assessment(&self, id: i64) -> Result<Option<Assessment>>;
    async fn delete_allocation(&self, id: i64) -> Result<bool>;
    // 删除尚未评分的同伴分配，自评与示例不动
    async fn delete_ungraded_peer_allocations(&self, workshop_id: i64) -> Result<u64>;
    async fn list_submission_assessments(&self, submission_id: i64) -> Result<Vec<Assessment>>;
    async fn list_reviewer_assessments(
        &self,
        workshop_id: i64,
        reviewer_id: i64,
    ) -> Result<Vec<Assessment>>;
    // 正式提交上的全部评审
    async fn list_workshop_assessments(&self, workshop_id: i64) -> Result<Vec<Assessment>>;
    async fn allocation_table(&self, workshop_id: i64) -> Result<Vec<AllocationRow>>;
    // 同一事务内写入维度得分与评审成绩
    async fn save_assessment(
        &self,
        assessment_id: i64,
        strategy: &str,
        scores: &[CriterionScoreInput],
        grade: Option<f64>,
        feedback_author: Option<String>,
    ) -> Result<(Assessment, Vec<CriterionScore>)>;
    async fn list_criterion_scores(
        &self,
        assessment_id: i64,
        strategy: &str,
    ) -> Result<Vec<CriterionScore>>;
    async fn override_grading_grade(
        &self,
        id: i64,
        grading_grade_over: Option<f64>,
        feedback_reviewer: Option<String>,
    ) -> Result<Option<Assessment>>;

    /// 评价方法
    async fn evaluation_snapshot(
        &self,
        workshop_id: i64,
        strategy: &str,
    ) -> Result<EvaluationSnapshot>;
    async fn write_evaluation(&self, workshop_id: i64, write: EvaluationWrite) -> Result<()>;
    async fn upsert_aggregation(
        &self,
        workshop_id: i64,
        user_id: i64,
        grading_grade: Option<f64>,
    ) -> Result<()>;
    async fn list_aggregations(&self, workshop_id: i64) -> Result<HashMap<i64, Option<f64>>>;
    async fn clear_aggregated_grades(&self, workshop_id: i64) -> Result<ClearSummary>;
    async fn clear_assessments(&self, workshop_id: i64) -> Result<ClearSummary>;

    /// 评分表单方法
    async fn list_criteria(&self, workshop_id: i64, strategy: &str) -> Result<Vec<Criterion>>;
    async fn replace_criteria(
        &self,
        workshop_id: i64,
        strategy: &str,
        criteria: Vec<CriterionInput>,
    ) -> Result<Vec<Criterion>>;

    /// 定时分配方法
    async fn get_allocation_schedule(&self, workshop_id: i64)
    -> Result<Option<AllocationSchedule>>;
    async fn save_allocation_schedule(
        &self,
        workshop_id: i64,
        enabled: bool,
        settings: &RandomAllocationSettings,
    ) -> Result<AllocationSchedule>;
    // 抢占一次执行权，只有第一个调用者返回 true
    async fn claim_allocation_schedule(&self, schedule_id: i64, now: i64) -> Result<bool>;
    async fn record_allocation_schedule_result(
        &self,
        schedule_id: i64,
        status: AllocationStatus,
        message: Option<String>,
    ) -> Result<()>;
}

/// 创建存储实例（SeaORM，支持 SQLite/PostgreSQL/MySQL）
pub async fn create_storage() -> Result<Arc<dyn Storage>> {
    let storage = sea_orm_storage::SeaOrmStorage::new_async().await?;
    Ok(Arc::new(storage))
}
