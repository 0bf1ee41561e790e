//! 成绩汇总存储操作

use super::{SeaOrmStorage, commit, db_err};
use crate::entity::aggregations::{ActiveModel, Column, Entity as Aggregations};
use crate::entity::assessments::{Column as AssessmentColumn, Entity as Assessments};
use crate::entity::criterion_scores::{Column as ScoreColumn, Entity as CriterionScores};
use crate::entity::submissions::{Column as SubmissionColumn, Entity as Submissions};
use crate::errors::Result;
use crate::models::evaluation::responses::ClearSummary;
use crate::storage::{EvaluationSnapshot, EvaluationWrite};
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder,
    QuerySelect, Set,
};
use std::collections::HashMap;

async fn upsert_aggregation<C: ConnectionTrait>(
    conn: &C,
    workshop_id: i64,
    user_id: i64,
    grading_grade: Option<f64>,
    now: i64,
) -> Result<()> {
    let existing = Aggregations::find()
        .filter(Column::WorkshopId.eq(workshop_id))
        .filter(Column::UserId.eq(user_id))
        .one(conn)
        .await
        .map_err(db_err("查询评审汇总"))?;

    let mut model = ActiveModel {
        workshop_id: Set(workshop_id),
        user_id: Set(user_id),
        grading_grade: Set(grading_grade),
        time_graded: Set(Some(now)),
        ..Default::default()
    };
    match existing {
        Some(current) => {
            model.id = Set(current.id);
            model.update(conn).await.map_err(db_err("更新评审汇总"))?;
        }
        None => {
            model.insert(conn).await.map_err(db_err("创建评审汇总"))?;
        }
    }
    Ok(())
}

/// 正式提交的 ID
async fn real_submission_ids<C: ConnectionTrait>(conn: &C, workshop_id: i64) -> Result<Vec<i64>> {
    Submissions::find()
        .select_only()
        .column(SubmissionColumn::Id)
        .filter(SubmissionColumn::WorkshopId.eq(workshop_id))
        .filter(SubmissionColumn::Example.eq(false))
        .into_tuple()
        .all(conn)
        .await
        .map_err(db_err("查询提交"))
}

impl SeaOrmStorage {
    /// 在一个事务内读取正式提交、其评审与维度得分
    pub async fn evaluation_snapshot_impl(
        &self,
        workshop_id: i64,
        strategy: &str,
    ) -> Result<EvaluationSnapshot> {
        let txn = self.begin().await?;

        let submissions = Submissions::find()
            .filter(SubmissionColumn::WorkshopId.eq(workshop_id))
            .filter(SubmissionColumn::Example.eq(false))
            .order_by_asc(SubmissionColumn::Id)
            .all(&txn)
            .await
            .map_err(db_err("查询提交"))?;
        let submission_ids: Vec<i64> = submissions.iter().map(|s| s.id).collect();

        let assessments = Assessments::find()
            .filter(AssessmentColumn::SubmissionId.is_in(submission_ids))
            .order_by_asc(AssessmentColumn::Id)
            .all(&txn)
            .await
            .map_err(db_err("查询评审"))?;
        let assessment_ids: Vec<i64> = assessments.iter().map(|a| a.id).collect();

        let scores = CriterionScores::find()
            .filter(ScoreColumn::AssessmentId.is_in(assessment_ids))
            .filter(ScoreColumn::Strategy.eq(strategy))
            .all(&txn)
            .await
            .map_err(db_err("查询维度得分"))?;
        commit(txn).await?;

        Ok(EvaluationSnapshot {
            submissions: submissions.into_iter().map(|m| m.into_submission()).collect(),
            assessments: assessments.into_iter().map(|m| m.into_assessment()).collect(),
            scores: scores.into_iter().map(|m| m.into_criterion_score()).collect(),
        })
    }

    /// 一次性写回提交成绩、评审成绩与评审者汇总
    pub async fn write_evaluation_impl(&self, workshop_id: i64, write: EvaluationWrite) -> Result<()> {
        let now = chrono::Utc::now().timestamp();
        let txn = self.begin().await?;

        for (submission_id, grade) in write.submission_grades {
            Submissions::update_many()
                .col_expr(SubmissionColumn::Grade, Expr::value(grade))
                .filter(SubmissionColumn::Id.eq(submission_id))
                .filter(SubmissionColumn::WorkshopId.eq(workshop_id))
                .exec(&txn)
                .await
                .map_err(db_err("写入提交成绩"))?;
        }

        for (assessment_id, grading_grade) in write.grading_grades {
            Assessments::update_many()
                .col_expr(AssessmentColumn::GradingGrade, Expr::value(grading_grade))
                .filter(AssessmentColumn::Id.eq(assessment_id))
                .exec(&txn)
                .await
                .map_err(db_err("写入评审成绩"))?;
        }

        for (user_id, grading_grade) in write.aggregations {
            upsert_aggregation(&txn, workshop_id, user_id, grading_grade, now).await?;
        }

        commit(txn).await
    }

    pub async fn upsert_aggregation_impl(
        &self,
        workshop_id: i64,
        user_id: i64,
        grading_grade: Option<f64>,
    ) -> Result<()> {
        let now = chrono::Utc::now().timestamp();
        upsert_aggregation(&self.db, workshop_id, user_id, grading_grade, now).await
    }

    pub async fn list_aggregations_impl(&self, workshop_id: i64) -> Result<HashMap<i64, Option<f64>>> {
        let rows: Vec<(i64, Option<f64>)> = Aggregations::find()
            .select_only()
            .column(Column::UserId)
            .column(Column::GradingGrade)
            .filter(Column::WorkshopId.eq(workshop_id))
            .into_tuple()
            .all(&self.db)
            .await
            .map_err(db_err("查询评审汇总"))?;
        Ok(rows.into_iter().collect())
    }

    /// 清空提交成绩、评审成绩与汇总
    pub async fn clear_aggregated_grades_impl(&self, workshop_id: i64) -> Result<ClearSummary> {
        let txn = self.begin().await?;
        let summary = clear_aggregates(&txn, workshop_id).await?;
        commit(txn).await?;
        Ok(summary)
    }

    /// 删除维度得分并清空评审总分，分配本身保留
    pub async fn clear_assessments_impl(&self, workshop_id: i64) -> Result<ClearSummary> {
        let txn = self.begin().await?;
        let mut summary = clear_aggregates(&txn, workshop_id).await?;

        let submission_ids = real_submission_ids(&txn, workshop_id).await?;
        let assessment_ids: Vec<i64> = Assessments::find()
            .select_only()
            .column(AssessmentColumn::Id)
            .filter(AssessmentColumn::SubmissionId.is_in(submission_ids.clone()))
            .into_tuple()
            .all(&txn)
            .await
            .map_err(db_err("查询评审"))?;

        let deleted = CriterionScores::delete_many()
            .filter(ScoreColumn::AssessmentId.is_in(assessment_ids))
            .exec(&txn)
            .await
            .map_err(db_err("删除维度得分"))?;
        let reset = Assessments::update_many()
            .col_expr(AssessmentColumn::Grade, Expr::value(Option::<f64>::None))
            .col_expr(AssessmentColumn::GradingGrade, Expr::value(Option::<f64>::None))
            .col_expr(AssessmentColumn::GradingGradeOver, Expr::value(Option::<f64>::None))
            .filter(AssessmentColumn::SubmissionId.is_in(submission_ids))
            .exec(&txn)
            .await
            .map_err(db_err("清空评审"))?;
        commit(txn).await?;

        summary.scores_deleted = deleted.rows_affected as i64;
        summary.assessments_reset = reset.rows_affected as i64;
        Ok(summary)
    }
}

async fn clear_aggregates<C: ConnectionTrait>(conn: &C, workshop_id: i64) -> Result<ClearSummary> {
    let submission_ids = real_submission_ids(conn, workshop_id).await?;

    let submissions = Submissions::update_many()
        .col_expr(SubmissionColumn::Grade, Expr::value(Option::<f64>::None))
        .filter(SubmissionColumn::Id.is_in(submission_ids.clone()))
        .exec(conn)
        .await
        .map_err(db_err("清空提交成绩"))?;
    let assessments = Assessments::update_many()
        .col_expr(AssessmentColumn::GradingGrade, Expr::value(Option::<f64>::None))
        .filter(AssessmentColumn::SubmissionId.is_in(submission_ids))
        .exec(conn)
        .await
        .map_err(db_err("清空评审成绩"))?;
    let aggregations = Aggregations::delete_many()
        .filter(Column::WorkshopId.eq(workshop_id))
        .exec(conn)
        .await
        .map_err(db_err("删除评审汇总"))?;

    Ok(ClearSummary {
        submissions_reset: submissions.rows_affected as i64,
        assessments_reset: assessments.rows_affected as i64,
        scores_deleted: 0,
        aggregations_deleted: aggregations.rows_affected as i64,
    })
}

#[cfg(test)]
mod tests {
    use super::super::tests::{seed_workshop, submit};
    use super::*;
    use crate::models::assessments::requests::CriterionScoreInput;

    #[tokio::test]
    async fn test_write_and_clear_evaluation() {
        let (storage, workshop) = seed_workshop(&[1, 2]).await;
        let submission = submit(&storage, &workshop, 1).await;
        let (allocation, _) = storage.add_allocation_impl(submission.id, 2, 1).await.unwrap();
        let score = CriterionScoreInput {
            dimension_id: 1,
            grade: Some(4.0),
            peer_comment: None,
        };
        storage
            .save_assessment_impl(allocation.id, "accumulative", &[score], Some(80.0), None)
            .await
            .unwrap();

        let snapshot = storage
            .evaluation_snapshot_impl(workshop.id, "accumulative")
            .await
            .unwrap();
        assert_eq!(snapshot.submissions.len(), 1);
        assert_eq!(snapshot.assessments.len(), 1);
        assert_eq!(snapshot.scores.len(), 1);

        storage
            .write_evaluation_impl(
                workshop.id,
                EvaluationWrite {
                    submission_grades: vec![(submission.id, Some(80.0))],
                    grading_grades: vec![(allocation.id, Some(100.0))],
                    aggregations: vec![(2, Some(100.0))],
                },
            )
            .await
            .unwrap();
        let graded = storage.get_submission_impl(submission.id).await.unwrap().unwrap();
        assert_eq!(graded.grade, Some(80.0));
        assert_eq!(
            storage.list_aggregations_impl(workshop.id).await.unwrap().get(&2),
            Some(&Some(100.0))
        );

        let summary = storage.clear_assessments_impl(workshop.id).await.unwrap();
        assert_eq!(summary.scores_deleted, 1);
        assert_eq!(summary.aggregations_deleted, 1);

        // 分配仍在，但已无分数
        let left = storage.get_assessment_impl(allocation.id).await.unwrap().unwrap();
        assert_eq!(left.grade, None);
        assert_eq!(left.grading_grade, None);
        let graded = storage.get_submission_impl(submission.id).await.unwrap().unwrap();
        assert_eq!(graded.grade, None);
    }
}
