//! 工作坊存储操作

use super::{SeaOrmStorage, allocations::insert_allocation_if_missing, commit, db_err};
use crate::entity::allocation_schedules::{Column as ScheduleColumn, Entity as AllocationSchedules};
use crate::entity::submissions::{Column as SubmissionColumn, Entity as Submissions};
use crate::entity::workshops::{ActiveModel, Column, Entity as Workshops};
use crate::errors::{Result, WorkshopError};
use crate::models::allocation::entities::AllocatedPair;
use crate::models::workshops::entities::Workshop;
use crate::workflow::phase::Phase;
use sea_orm::sea_query::Expr;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QuerySelect, Set};

fn ts(value: Option<chrono::DateTime<chrono::Utc>>) -> i64 {
    value.map(|t| t.timestamp()).unwrap_or(0)
}

fn json_text(value: &serde_json::Value) -> Option<String> {
    if value.is_null() {
        None
    } else {
        Some(value.to_string())
    }
}

/// 设置字段，阶段与主键之外的全部列
fn settings_model(workshop: &Workshop, now: i64) -> ActiveModel {
    ActiveModel {
        course_id: Set(workshop.course_id),
        name: Set(workshop.name.clone()),
        assessment_type: Set(workshop.assessment_type.code()),
        use_self_assessment: Set(workshop.use_self_assessment),
        allow_submission: Set(workshop.allow_submission),
        assess_without_submission: Set(workshop.assess_without_submission),
        assess_as_soon_submitted: Set(workshop.assess_as_soon_submitted),
        use_examples: Set(workshop.use_examples),
        examples_mode: Set(workshop.examples_mode.code()),
        grade: Set(workshop.grade),
        grading_grade: Set(workshop.grading_grade),
        grade_decimals: Set(workshop.grade_decimals),
        strategy: Set(workshop.strategy.clone()),
        strategy_settings: Set(json_text(&workshop.strategy_settings)),
        evaluation: Set(workshop.evaluation.clone()),
        evaluation_settings: Set(json_text(&workshop.evaluation_settings)),
        submission_start: Set(ts(workshop.submission_start)),
        submission_end: Set(ts(workshop.submission_end)),
        assessment_start: Set(ts(workshop.assessment_start)),
        assessment_end: Set(ts(workshop.assessment_end)),
        phase_switch_assessment: Set(workshop.phase_switch_assessment),
        late_submissions: Set(workshop.late_submissions),
        group_mode: Set(workshop.group_mode.code()),
        submission_grade_pass: Set(workshop.submission_grade_pass),
        grading_grade_pass: Set(workshop.grading_grade_pass),
        updated_at: Set(now),
        ..Default::default()
    }
}

impl SeaOrmStorage {
    /// 创建工作坊
    pub async fn create_workshop_impl(&self, draft: Workshop) -> Result<Workshop> {
        let now = chrono::Utc::now().timestamp();
        let mut model = settings_model(&draft, now);
        model.phase = Set(draft.phase.code());
        model.created_at = Set(now);

        let result = model.insert(&self.db).await.map_err(db_err("创建工作坊"))?;
        Ok(result.into_workshop())
    }

    /// 通过 ID 获取工作坊
    pub async fn get_workshop_impl(&self, id: i64) -> Result<Option<Workshop>> {
        let result = Workshops::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(db_err("查询工作坊"))?;
        Ok(result.map(|m| m.into_workshop()))
    }

    /// 保存设置，阶段只能经由 transition_phase 修改
    pub async fn update_workshop_impl(&self, workshop: &Workshop) -> Result<Workshop> {
        let now = chrono::Utc::now().timestamp();
        let mut model = settings_model(workshop, now);
        model.id = Set(workshop.id);

        let result = model.update(&self.db).await.map_err(|e| match e {
            sea_orm::DbErr::RecordNotUpdated => {
                WorkshopError::not_found(format!("工作坊 {} 不存在", workshop.id))
            }
            e => WorkshopError::database_operation(format!("更新工作坊失败: {e}")),
        })?;
        Ok(result.into_workshop())
    }

    /// 提交阶段内截止时间已过，且开启了自动切换或有待执行定时分配的工作坊
    pub async fn list_workshops_past_submission_end_impl(&self, now: i64) -> Result<Vec<i64>> {
        let scheduled: Vec<i64> = AllocationSchedules::find()
            .select_only()
            .column(ScheduleColumn::WorkshopId)
            .filter(ScheduleColumn::Enabled.eq(true))
            .filter(ScheduleColumn::TimeAllocated.is_null())
            .into_tuple()
            .all(&self.db)
            .await
            .map_err(db_err("查询定时分配"))?;

        let mut ids: Vec<i64> = Workshops::find()
            .select_only()
            .column(Column::Id)
            .filter(Column::Phase.eq(Phase::SUBMISSION))
            .filter(Column::SubmissionEnd.gt(0))
            .filter(Column::SubmissionEnd.lt(now))
            .filter(
                Column::PhaseSwitchAssessment
                    .eq(true)
                    .or(Column::Id.is_in(scheduled)),
            )
            .into_tuple()
            .all(&self.db)
            .await
            .map_err(db_err("查询到期工作坊"))?;

        ids.sort_unstable();
        Ok(ids)
    }

    /// 阶段比较并交换
    ///
    /// 只有当前阶段仍为 `from` 时才更新；自评分配与阶段更新在同一事务中提交。
    pub async fn transition_phase_impl(
        &self,
        workshop_id: i64,
        from: Phase,
        to: Phase,
        require_auto_switch: bool,
        create_self_assessments: bool,
    ) -> Result<Option<Vec<AllocatedPair>>> {
        let now = chrono::Utc::now().timestamp();
        let txn = self.begin().await?;

        let mut update = Workshops::update_many()
            .col_expr(Column::Phase, Expr::value(to.code()))
            .col_expr(Column::UpdatedAt, Expr::value(now))
            .filter(Column::Id.eq(workshop_id))
            .filter(Column::Phase.eq(from.code()));
        if require_auto_switch {
            // 自动切换同时清除开关
            update = update
                .col_expr(Column::PhaseSwitchAssessment, Expr::value(false))
                .filter(Column::PhaseSwitchAssessment.eq(true))
                .filter(Column::SubmissionEnd.gt(0))
                .filter(Column::SubmissionEnd.lt(now));
        }

        let result = update.exec(&txn).await.map_err(db_err("切换阶段"))?;
        if result.rows_affected == 0 {
            // 事务随 txn 丢弃回滚
            return Ok(None);
        }

        let mut created = vec![];
        if create_self_assessments && to == Phase::Assessment {
            let use_self = Workshops::find_by_id(workshop_id)
                .one(&txn)
                .await
                .map_err(db_err("查询工作坊"))?
                .is_some_and(|w| w.use_self_assessment);

            if use_self {
                let submissions = Submissions::find()
                    .filter(SubmissionColumn::WorkshopId.eq(workshop_id))
                    .filter(SubmissionColumn::Example.eq(false))
                    .filter(SubmissionColumn::AuthorId.is_not_null())
                    .all(&txn)
                    .await
                    .map_err(db_err("查询提交"))?;

                for submission in submissions {
                    let Some(author_id) = submission.author_id else {
                        continue;
                    };
                    let (assessment, inserted) =
                        insert_allocation_if_missing(&txn, submission.id, author_id, 1, now)
                            .await?;
                    if inserted {
                        created.push(AllocatedPair {
                            assessment_id: assessment.id,
                            submission_id: submission.id,
                            reviewer_id: author_id,
                        });
                    }
                }
            }
        }

        commit(txn).await?;
        Ok(Some(created))
    }
}

#[cfg(test)]
mod tests {
    use super::super::tests::{memory_storage, seed_workshop, submit};
    use super::*;
    use crate::workflow::phase::tests::sample_workshop;

    #[tokio::test]
    async fn test_create_and_update_keeps_phase() {
        let storage = memory_storage().await;
        let created = storage
            .create_workshop_impl(sample_workshop(Phase::Setup))
            .await
            .unwrap();
        assert_eq!(created.phase, Phase::Setup);

        let mut changed = created.clone();
        changed.name = "Renamed".to_string();
        changed.phase = Phase::Closed;
        changed.evaluation_settings = serde_json::json!({"comparison": 3});
        let updated = storage.update_workshop_impl(&changed).await.unwrap();

        assert_eq!(updated.name, "Renamed");
        assert_eq!(updated.phase, Phase::Setup);
        assert_eq!(updated.evaluation_settings["comparison"], 3);
    }

    #[tokio::test]
    async fn test_transition_phase_is_compare_and_swap() {
        let (storage, workshop) = seed_workshop(&[1, 2]).await;

        let first = storage
            .transition_phase_impl(workshop.id, Phase::Submission, Phase::Assessment, false, false)
            .await
            .unwrap();
        assert_eq!(first, Some(vec![]));

        // 第二次从同一阶段出发失败
        let second = storage
            .transition_phase_impl(workshop.id, Phase::Submission, Phase::Assessment, false, false)
            .await
            .unwrap();
        assert_eq!(second, None);

        let current = storage.get_workshop_impl(workshop.id).await.unwrap().unwrap();
        assert_eq!(current.phase, Phase::Assessment);
    }

    #[tokio::test]
    async fn test_auto_switch_requires_deadline() {
        let (storage, mut workshop) = seed_workshop(&[1]).await;
        workshop.phase_switch_assessment = true;
        workshop.submission_end = Some(chrono::Utc::now() + chrono::Duration::hours(1));
        storage.update_workshop_impl(&workshop).await.unwrap();

        let result = storage
            .transition_phase_impl(workshop.id, Phase::Submission, Phase::Assessment, true, false)
            .await
            .unwrap();
        assert_eq!(result, None);

        workshop.submission_end = Some(chrono::Utc::now() - chrono::Duration::hours(1));
        storage.update_workshop_impl(&workshop).await.unwrap();
        let now = chrono::Utc::now().timestamp();
        assert_eq!(
            storage.list_workshops_past_submission_end_impl(now).await.unwrap(),
            vec![workshop.id]
        );

        let result = storage
            .transition_phase_impl(workshop.id, Phase::Submission, Phase::Assessment, true, false)
            .await
            .unwrap();
        assert!(result.is_some());
    }

    #[tokio::test]
    async fn test_self_assessments_created_with_transition() {
        let (storage, mut workshop) = seed_workshop(&[1, 2]).await;
        workshop.use_self_assessment = true;
        storage.update_workshop_impl(&workshop).await.unwrap();
        let s1 = submit(&storage, &workshop, 1).await;
        let s2 = submit(&storage, &workshop, 2).await;

        let created = storage
            .transition_phase_impl(workshop.id, Phase::Submission, Phase::Assessment, false, true)
            .await
            .unwrap()
            .unwrap();

        let mut pairs: Vec<(i64, i64)> = created
            .iter()
            .map(|p| (p.submission_id, p.reviewer_id))
            .collect();
        pairs.sort_unstable();
        assert_eq!(pairs, vec![(s1.id, 1), (s2.id, 2)]);
    }
}
