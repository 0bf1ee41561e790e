//! 提交存储操作

use super::{SeaOrmStorage, db_err};
use crate::entity::submissions::{ActiveModel, Column, Entity as Submissions};
use crate::errors::{Result, WorkshopError};
use crate::models::submissions::entities::Submission;
use crate::storage::NewSubmission;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DbErr, EntityTrait, NotSet, QueryFilter, QueryOrder, Set,
};

/// 更新不存在的行时返回 None
fn updated(result: std::result::Result<crate::entity::submissions::Model, DbErr>, action: &str) -> Result<Option<Submission>> {
    match result {
        Ok(model) => Ok(Some(model.into_submission())),
        Err(DbErr::RecordNotUpdated) => Ok(None),
        Err(e) => Err(WorkshopError::database_operation(format!("{action}失败: {e}"))),
    }
}

impl SeaOrmStorage {
    /// 创建提交，同一作者重复提交由唯一索引拒绝
    pub async fn create_submission_impl(&self, submission: NewSubmission) -> Result<Submission> {
        let now = chrono::Utc::now().timestamp();
        let model = ActiveModel {
            workshop_id: Set(submission.workshop_id),
            author_id: Set(submission.author_id),
            example: Set(submission.example),
            title: Set(submission.title),
            content: Set(submission.content),
            published: Set(false),
            late: Set(submission.late),
            grade: Set(None),
            grade_over: Set(None),
            grade_over_by: Set(None),
            feedback_author: Set(None),
            created_at: Set(now),
            modified_at: Set(now),
            ..Default::default()
        };

        let result = model.insert(&self.db).await.map_err(|e| {
            if e.to_string().to_lowercase().contains("unique") {
                WorkshopError::conflict("该作者已有提交".to_string())
            } else {
                WorkshopError::database_operation(format!("创建提交失败: {e}"))
            }
        })?;
        Ok(result.into_submission())
    }

    pub async fn update_submission_content_impl(
        &self,
        id: i64,
        title: String,
        content: String,
        late: bool,
    ) -> Result<Option<Submission>> {
        let model = ActiveModel {
            id: Set(id),
            title: Set(title),
            content: Set(content),
            late: Set(late),
            modified_at: Set(chrono::Utc::now().timestamp()),
            ..Default::default()
        };
        updated(model.update(&self.db).await, "更新提交")
    }

    pub async fn get_submission_impl(&self, id: i64) -> Result<Option<Submission>> {
        let result = Submissions::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(db_err("查询提交"))?;
        Ok(result.map(|m| m.into_submission()))
    }

    /// 作者在工作坊中的正式提交
    pub async fn get_author_submission_impl(
        &self,
        workshop_id: i64,
        author_id: i64,
    ) -> Result<Option<Submission>> {
        let result = Submissions::find()
            .filter(Column::WorkshopId.eq(workshop_id))
            .filter(Column::AuthorId.eq(author_id))
            .filter(Column::Example.eq(false))
            .one(&self.db)
            .await
            .map_err(db_err("查询提交"))?;
        Ok(result.map(|m| m.into_submission()))
    }

    /// 列出正式提交或示例提交
    pub async fn list_submissions_impl(
        &self,
        workshop_id: i64,
        examples: bool,
    ) -> Result<Vec<Submission>> {
        let result = Submissions::find()
            .filter(Column::WorkshopId.eq(workshop_id))
            .filter(Column::Example.eq(examples))
            .order_by_asc(Column::Id)
            .all(&self.db)
            .await
            .map_err(db_err("查询提交列表"))?;
        Ok(result.into_iter().map(|m| m.into_submission()).collect())
    }

    /// 覆盖提交成绩，None 撤销覆盖；未给出反馈时保留原有反馈
    pub async fn override_submission_grade_impl(
        &self,
        id: i64,
        grade_over: Option<f64>,
        by: i64,
        feedback_author: Option<String>,
    ) -> Result<Option<Submission>> {
        let model = ActiveModel {
            id: Set(id),
            grade_over: Set(grade_over),
            grade_over_by: Set(grade_over.map(|_| by)),
            feedback_author: feedback_author.map_or(NotSet, |f| Set(Some(f))),
            ..Default::default()
        };
        updated(model.update(&self.db).await, "覆盖提交成绩")
    }

    pub async fn set_submission_published_impl(
        &self,
        id: i64,
        published: bool,
    ) -> Result<Option<Submission>> {
        let model = ActiveModel {
            id: Set(id),
            published: Set(published),
            ..Default::default()
        };
        updated(model.update(&self.db).await, "发布提交")
    }
}
