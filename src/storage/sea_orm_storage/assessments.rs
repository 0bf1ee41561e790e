//! 评审存储操作

use super::{SeaOrmStorage, commit, db_err};
use crate::entity::assessments::{ActiveModel, Entity as Assessments};
use crate::entity::criterion_scores::{
    ActiveModel as ScoreActiveModel, Column as ScoreColumn, Entity as CriterionScores,
};
use crate::errors::{Result, WorkshopError};
use crate::models::assessments::{
    entities::{Assessment, CriterionScore},
    requests::CriterionScoreInput,
};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DbErr, EntityTrait, NotSet, QueryFilter, QueryOrder, Set,
};

impl SeaOrmStorage {
    /// 保存评审：逐维度写入得分并更新总分，在同一事务内完成
    pub async fn save_assessment_impl(
        &self,
        assessment_id: i64,
        strategy: &str,
        scores: &[CriterionScoreInput],
        grade: Option<f64>,
        feedback_author: Option<String>,
    ) -> Result<(Assessment, Vec<CriterionScore>)> {
        let now = chrono::Utc::now().timestamp();
        let txn = self.begin().await?;

        let exists = Assessments::find_by_id(assessment_id)
            .one(&txn)
            .await
            .map_err(db_err("查询评审"))?
            .is_some();
        if !exists {
            return Err(WorkshopError::not_found(format!("评审 {assessment_id} 不存在")));
        }

        let existing = CriterionScores::find()
            .filter(ScoreColumn::AssessmentId.eq(assessment_id))
            .filter(ScoreColumn::Strategy.eq(strategy))
            .all(&txn)
            .await
            .map_err(db_err("查询维度得分"))?;

        for input in scores {
            let mut model = ScoreActiveModel {
                assessment_id: Set(assessment_id),
                strategy: Set(strategy.to_string()),
                dimension_id: Set(input.dimension_id),
                // 评语策略没有分数
                grade: Set(input.grade.unwrap_or(0.0)),
                peer_comment: Set(input.peer_comment.clone()),
                ..Default::default()
            };
            match existing.iter().find(|s| s.dimension_id == input.dimension_id) {
                Some(current) => {
                    model.id = Set(current.id);
                    model.update(&txn).await.map_err(db_err("更新维度得分"))?;
                }
                None => {
                    model.insert(&txn).await.map_err(db_err("保存维度得分"))?;
                }
            }
        }

        let assessment = ActiveModel {
            id: Set(assessment_id),
            grade: Set(grade),
            feedback_author: Set(feedback_author),
            modified_at: Set(now),
            ..Default::default()
        }
        .update(&txn)
        .await
        .map_err(db_err("保存评审"))?;

        let saved = CriterionScores::find()
            .filter(ScoreColumn::AssessmentId.eq(assessment_id))
            .filter(ScoreColumn::Strategy.eq(strategy))
            .order_by_asc(ScoreColumn::DimensionId)
            .all(&txn)
            .await
            .map_err(db_err("查询维度得分"))?;
        commit(txn).await?;

        Ok((
            assessment.into_assessment(),
            saved.into_iter().map(|m| m.into_criterion_score()).collect(),
        ))
    }

    pub async fn list_criterion_scores_impl(
        &self,
        assessment_id: i64,
        strategy: &str,
    ) -> Result<Vec<CriterionScore>> {
        let result = CriterionScores::find()
            .filter(ScoreColumn::AssessmentId.eq(assessment_id))
            .filter(ScoreColumn::Strategy.eq(strategy))
            .order_by_asc(ScoreColumn::DimensionId)
            .all(&self.db)
            .await
            .map_err(db_err("查询维度得分"))?;
        Ok(result.into_iter().map(|m| m.into_criterion_score()).collect())
    }

    /// 覆盖评审成绩，None 撤销覆盖；未给出反馈时保留原有反馈
    pub async fn override_grading_grade_impl(
        &self,
        id: i64,
        grading_grade_over: Option<f64>,
        feedback_reviewer: Option<String>,
    ) -> Result<Option<Assessment>> {
        let model = ActiveModel {
            id: Set(id),
            grading_grade_over: Set(grading_grade_over),
            feedback_reviewer: feedback_reviewer.map_or(NotSet, |f| Set(Some(f))),
            ..Default::default()
        };
        match model.update(&self.db).await {
            Ok(model) => Ok(Some(model.into_assessment())),
            Err(DbErr::RecordNotUpdated) => Ok(None),
            Err(e) => Err(WorkshopError::database_operation(format!(
                "覆盖评审成绩失败: {e}"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::tests::{seed_workshop, submit};
    use super::*;

    fn input(dimension_id: i64, grade: f64) -> CriterionScoreInput {
        CriterionScoreInput {
            dimension_id,
            grade: Some(grade),
            peer_comment: None,
        }
    }

    #[tokio::test]
    async fn test_save_assessment_upserts_scores() {
        let (storage, workshop) = seed_workshop(&[1, 2]).await;
        let submission = submit(&storage, &workshop, 1).await;
        let (allocation, _) = storage.add_allocation_impl(submission.id, 2, 1).await.unwrap();
        assert!(!allocation.is_graded());

        storage
            .save_assessment_impl(allocation.id, "accumulative", &[input(1, 3.0), input(2, 5.0)], Some(80.0), None)
            .await
            .unwrap();
        let (assessment, scores) = storage
            .save_assessment_impl(
                allocation.id,
                "accumulative",
                &[input(1, 4.0)],
                Some(90.0),
                Some("nice".to_string()),
            )
            .await
            .unwrap();

        assert_eq!(assessment.grade, Some(90.0));
        assert_eq!(assessment.feedback_author.as_deref(), Some("nice"));
        let grades: Vec<(i64, f64)> = scores.iter().map(|s| (s.dimension_id, s.grade)).collect();
        assert_eq!(grades, vec![(1, 4.0), (2, 5.0)]);

        // 其他策略的得分互不可见
        assert!(
            storage
                .list_criterion_scores_impl(allocation.id, "rubric")
                .await
                .unwrap()
                .is_empty()
        );
    }

    #[tokio::test]
    async fn test_save_missing_assessment() {
        let (storage, _) = seed_workshop(&[1]).await;
        let result = storage
            .save_assessment_impl(404, "accumulative", &[], Some(1.0), None)
            .await;
        assert!(matches!(result, Err(WorkshopError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_override_grading_grade() {
        let (storage, workshop) = seed_workshop(&[1, 2]).await;
        let submission = submit(&storage, &workshop, 1).await;
        let (allocation, _) = storage.add_allocation_impl(submission.id, 2, 1).await.unwrap();

        let updated = storage
            .override_grading_grade_impl(allocation.id, Some(42.0), None)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.final_grading_grade(), Some(42.0));
    }

    #[tokio::test]
    async fn test_override_keeps_reviewer_feedback() {
        let (storage, workshop) = seed_workshop(&[1, 2]).await;
        let submission = submit(&storage, &workshop, 1).await;
        let (allocation, _) = storage.add_allocation_impl(submission.id, 2, 1).await.unwrap();

        storage
            .override_grading_grade_impl(allocation.id, Some(42.0), Some("too harsh".to_string()))
            .await
            .unwrap();
        let updated = storage
            .override_grading_grade_impl(allocation.id, Some(60.0), None)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.final_grading_grade(), Some(60.0));
        assert_eq!(updated.feedback_reviewer.as_deref(), Some("too harsh"));
    }
}
