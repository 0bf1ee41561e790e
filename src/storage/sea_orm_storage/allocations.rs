//! 分配表存储操作
//!
//! 一条分配就是一行 grade 为空的评审记录，(submission, reviewer) 唯一。

use super::{SeaOrmStorage, commit, db_err};
use crate::entity::assessments::{ActiveModel, Column, Entity as Assessments};
use crate::entity::criterion_scores::{Column as ScoreColumn, Entity as CriterionScores};
use crate::entity::submissions::{Column as SubmissionColumn, Entity as Submissions};
use crate::errors::Result;
use crate::models::allocation::entities::AllocationRow;
use crate::models::assessments::entities::Assessment;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder,
    QuerySelect, Set, TransactionTrait,
};

/// 不存在则插入，返回 (评审记录, 是否新建)
pub(super) async fn insert_allocation_if_missing<C: ConnectionTrait>(
    conn: &C,
    submission_id: i64,
    reviewer_id: i64,
    weight: i32,
    now: i64,
) -> Result<(Assessment, bool)> {
    let existing = Assessments::find()
        .filter(Column::SubmissionId.eq(submission_id))
        .filter(Column::ReviewerId.eq(reviewer_id))
        .one(conn)
        .await
        .map_err(db_err("查询分配"))?;
    if let Some(model) = existing {
        return Ok((model.into_assessment(), false));
    }

    let model = ActiveModel {
        submission_id: Set(submission_id),
        reviewer_id: Set(reviewer_id),
        weight: Set(weight),
        grade: Set(None),
        grading_grade: Set(None),
        grading_grade_over: Set(None),
        feedback_author: Set(None),
        feedback_reviewer: Set(None),
        created_at: Set(now),
        modified_at: Set(now),
        ..Default::default()
    };
    let inserted = model.insert(conn).await.map_err(db_err("创建分配"))?;
    Ok((inserted.into_assessment(), true))
}

impl SeaOrmStorage {
    /// 幂等添加分配
    ///
    /// 检查与插入在同一事务内；并发插入撞上唯一索引时重新读取已有记录。
    pub async fn add_allocation_impl(
        &self,
        submission_id: i64,
        reviewer_id: i64,
        weight: i32,
    ) -> Result<(Assessment, bool)> {
        let now = chrono::Utc::now().timestamp();
        let txn = self.db.begin().await.map_err(db_err("开启事务"))?;

        match insert_allocation_if_missing(&txn, submission_id, reviewer_id, weight, now).await {
            Ok(result) => {
                commit(txn).await?;
                Ok(result)
            }
            Err(e) => {
                txn.rollback().await.map_err(db_err("回滚事务"))?;
                let existing = Assessments::find()
                    .filter(Column::SubmissionId.eq(submission_id))
                    .filter(Column::ReviewerId.eq(reviewer_id))
                    .one(&self.db)
                    .await
                    .map_err(db_err("查询分配"))?;
                match existing {
                    Some(model) => Ok((model.into_assessment(), false)),
                    None => Err(e),
                }
            }
        }
    }

    pub async fn get_assessment_impl(&self, id: i64) -> Result<Option<Assessment>> {
        let result = Assessments::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(db_err("查询评审"))?;
        Ok(result.map(|m| m.into_assessment()))
    }

    /// 删除分配及其维度得分
    pub async fn delete_allocation_impl(&self, id: i64) -> Result<bool> {
        let txn = self.begin().await?;
        CriterionScores::delete_many()
            .filter(ScoreColumn::AssessmentId.eq(id))
            .exec(&txn)
            .await
            .map_err(db_err("删除维度得分"))?;
        let result = Assessments::delete_by_id(id)
            .exec(&txn)
            .await
            .map_err(db_err("删除分配"))?;
        commit(txn).await?;
        Ok(result.rows_affected > 0)
    }

    /// 删除尚未评分的同伴分配，自评与已评分记录保留
    pub async fn delete_ungraded_peer_allocations_impl(&self, workshop_id: i64) -> Result<u64> {
        let txn = self.begin().await?;

        let authors: Vec<(i64, Option<i64>)> = Submissions::find()
            .select_only()
            .column(SubmissionColumn::Id)
            .column(SubmissionColumn::AuthorId)
            .filter(SubmissionColumn::WorkshopId.eq(workshop_id))
            .filter(SubmissionColumn::Example.eq(false))
            .into_tuple()
            .all(&txn)
            .await
            .map_err(db_err("查询提交"))?;
        let authors: std::collections::HashMap<i64, Option<i64>> = authors.into_iter().collect();

        let ungraded = Assessments::find()
            .filter(Column::SubmissionId.is_in(authors.keys().copied()))
            .filter(Column::Grade.is_null())
            .all(&txn)
            .await
            .map_err(db_err("查询分配"))?;
        let ids: Vec<i64> = ungraded
            .into_iter()
            .filter(|a| authors.get(&a.submission_id).copied().flatten() != Some(a.reviewer_id))
            .map(|a| a.id)
            .collect();

        if ids.is_empty() {
            commit(txn).await?;
            return Ok(0);
        }

        CriterionScores::delete_many()
            .filter(ScoreColumn::AssessmentId.is_in(ids.clone()))
            .exec(&txn)
            .await
            .map_err(db_err("删除维度得分"))?;
        let result = Assessments::delete_many()
            .filter(Column::Id.is_in(ids))
            .exec(&txn)
            .await
            .map_err(db_err("删除分配"))?;
        commit(txn).await?;

        Ok(result.rows_affected)
    }

    pub async fn list_submission_assessments_impl(
        &self,
        submission_id: i64,
    ) -> Result<Vec<Assessment>> {
        let result = Assessments::find()
            .filter(Column::SubmissionId.eq(submission_id))
            .order_by_asc(Column::Id)
            .all(&self.db)
            .await
            .map_err(db_err("查询评审"))?;
        Ok(result.into_iter().map(|m| m.into_assessment()).collect())
    }

    /// 评审者在工作坊中的全部评审，包括示例评审
    pub async fn list_reviewer_assessments_impl(
        &self,
        workshop_id: i64,
        reviewer_id: i64,
    ) -> Result<Vec<Assessment>> {
        let result = Assessments::find()
            .inner_join(Submissions)
            .filter(SubmissionColumn::WorkshopId.eq(workshop_id))
            .filter(Column::ReviewerId.eq(reviewer_id))
            .order_by_asc(Column::Id)
            .all(&self.db)
            .await
            .map_err(db_err("查询评审"))?;
        Ok(result.into_iter().map(|m| m.into_assessment()).collect())
    }

    /// 正式提交上的全部评审
    pub async fn list_workshop_assessments_impl(&self, workshop_id: i64) -> Result<Vec<Assessment>> {
        let result = Assessments::find()
            .inner_join(Submissions)
            .filter(SubmissionColumn::WorkshopId.eq(workshop_id))
            .filter(SubmissionColumn::Example.eq(false))
            .order_by_asc(Column::Id)
            .all(&self.db)
            .await
            .map_err(db_err("查询评审"))?;
        Ok(result.into_iter().map(|m| m.into_assessment()).collect())
    }

    pub async fn allocation_table_impl(&self, workshop_id: i64) -> Result<Vec<AllocationRow>> {
        let result = Assessments::find()
            .find_also_related(Submissions)
            .filter(SubmissionColumn::WorkshopId.eq(workshop_id))
            .filter(SubmissionColumn::Example.eq(false))
            .order_by_asc(Column::SubmissionId)
            .order_by_asc(Column::ReviewerId)
            .all(&self.db)
            .await
            .map_err(db_err("查询分配表"))?;

        Ok(result
            .into_iter()
            .map(|(assessment, submission)| AllocationRow {
                assessment_id: assessment.id,
                submission_id: assessment.submission_id,
                author_id: submission.and_then(|s| s.author_id),
                reviewer_id: assessment.reviewer_id,
                weight: assessment.weight,
                grade: assessment.grade,
            })
            .collect())
    }
}
