//! SeaORM 存储实现
//!
//! 统一的数据库存储层，支持 SQLite、PostgreSQL 和 MySQL。
//! 事务内的所有查询都必须走事务连接，SQLite 连接池可能只有一个连接。

mod aggregations;
mod allocations;
mod assessments;
mod criteria;
mod participants;
mod schedules;
mod submissions;
mod workshops;

use crate::config::AppConfig;
use crate::errors::{Result, WorkshopError};
use migration::{Migrator, MigratorTrait};
use sea_orm::{ConnectOptions, Database, DatabaseConnection, DatabaseTransaction, TransactionTrait};
use std::time::Duration;
use tracing::info;

/// SeaORM 存储实现
#[derive(Clone)]
pub struct SeaOrmStorage {
    pub(crate) db: DatabaseConnection,
}

impl SeaOrmStorage {
    /// 创建新的 SeaORM 存储实例
    pub async fn new_async() -> Result<Self> {
        let config = AppConfig::get();
        let db_url = Self::build_database_url(&config.database.url)?;

        // 根据数据库类型选择连接方式
        let db = if db_url.starts_with("sqlite://") {
            Self::connect_sqlite(&db_url, config).await?
        } else {
            Self::connect_generic(&db_url, config).await?
        };

        let storage = Self::from_connection(db).await?;
        info!("SeaORM 存储初始化完成，数据库: {}", db_url);
        Ok(storage)
    }

    /// 使用已有连接并运行迁移
    pub async fn from_connection(db: DatabaseConnection) -> Result<Self> {
        Migrator::up(&db, None)
            .await
            .map_err(|e| WorkshopError::database_operation(format!("数据库迁移失败: {e}")))?;
        Ok(Self { db })
    }

    /// SQLite 专用连接（WAL + pragma 优化）
    async fn connect_sqlite(url: &str, config: &AppConfig) -> Result<DatabaseConnection> {
        use sea_orm::SqlxSqliteConnector;
        use sea_orm::sqlx::sqlite::{
            SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous,
        };
        use std::str::FromStr;

        let opt = SqliteConnectOptions::from_str(url)
            .map_err(|e| WorkshopError::database_config(format!("SQLite URL 解析失败: {e}")))?
            .create_if_missing(true)
            .foreign_keys(true)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal)
            .busy_timeout(Duration::from_secs(5))
            .pragma("cache_size", "-64000")
            .pragma("temp_store", "memory");

        let pool = SqlitePoolOptions::new()
            .max_connections(config.database.pool_size)
            .min_connections(1)
            .test_before_acquire(true)
            .acquire_timeout(Duration::from_secs(config.database.timeout))
            .idle_timeout(Duration::from_secs(300))
            .connect_with(opt)
            .await
            .map_err(|e| WorkshopError::database_connection(format!("SQLite 连接失败: {e}")))?;

        Ok(SqlxSqliteConnector::from_sqlx_sqlite_pool(pool))
    }

    /// 通用连接（PostgreSQL、MySQL 等）
    async fn connect_generic(url: &str, config: &AppConfig) -> Result<DatabaseConnection> {
        let mut opt = ConnectOptions::new(url);
        opt.max_connections(config.database.pool_size)
            .min_connections(1)
            .connect_timeout(Duration::from_secs(config.database.timeout))
            .acquire_timeout(Duration::from_secs(config.database.timeout))
            .idle_timeout(Duration::from_secs(600))
            .max_lifetime(Duration::from_secs(1800))
            .sqlx_logging(false)
            .sqlx_logging_level(tracing::log::LevelFilter::Debug);

        Database::connect(opt)
            .await
            .map_err(|e| WorkshopError::database_connection(format!("无法连接到数据库: {e}")))
    }

    /// 从 URL 自动推断数据库类型并构建连接 URL
    fn build_database_url(url: &str) -> Result<String> {
        if url.starts_with("sqlite:") {
            Ok(url.to_string())
        } else if url.ends_with(".db") || url.ends_with(".sqlite") {
            Ok(format!("sqlite://{url}?mode=rwc"))
        } else if url == ":memory:" {
            Ok("sqlite::memory:".to_string())
        } else if url.starts_with("postgres://")
            || url.starts_with("postgresql://")
            || url.starts_with("mysql://")
            || url.starts_with("mariadb://")
        {
            Ok(url.to_string())
        } else {
            Err(WorkshopError::database_config(format!(
                "无法从 URL 推断数据库类型: {url}. 支持: sqlite://, postgres://, mysql://, 或 .db/.sqlite 文件路径"
            )))
        }
    }

    /// 开启事务
    pub(crate) async fn begin(&self) -> Result<DatabaseTransaction> {
        self.db
            .begin()
            .await
            .map_err(|e| WorkshopError::database_operation(format!("开启事务失败: {e}")))
    }
}

/// 提交事务
pub(crate) async fn commit(txn: DatabaseTransaction) -> Result<()> {
    txn.commit()
        .await
        .map_err(|e| WorkshopError::database_operation(format!("提交事务失败: {e}")))
}

/// 把 DbErr 包装为带上下文的数据库错误
pub(crate) fn db_err(context: &'static str) -> impl Fn(sea_orm::DbErr) -> WorkshopError {
    move |e| WorkshopError::database_operation(format!("{context}失败: {e}"))
}

// Storage trait 实现
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
use crate::storage::{EvaluationSnapshot, EvaluationWrite, NewSubmission, Storage};
use crate::workflow::phase::Phase;
use async_trait::async_trait;
use std::collections::HashMap;

#[async_trait]
impl Storage for SeaOrmStorage {
    // 工作坊模块
    async fn create_workshop(&self, draft: Workshop) -> Result<Workshop> {
        self.create_workshop_impl(draft).await
    }

    async fn get_workshop(&self, id: i64) -> Result<Option<Workshop>> {
        self.get_workshop_impl(id).await
    }

    async fn update_workshop(&self, workshop: &Workshop) -> Result<Workshop> {
        self.update_workshop_impl(workshop).await
    }

    async fn list_workshops_past_submission_end(&self, now: i64) -> Result<Vec<i64>> {
        self.list_workshops_past_submission_end_impl(now).await
    }

    async fn transition_phase(
        &self,
        workshop_id: i64,
        from: Phase,
        to: Phase,
        require_auto_switch: bool,
        create_self_assessments: bool,
    ) -> Result<Option<Vec<AllocatedPair>>> {
        self.transition_phase_impl(
            workshop_id,
            from,
            to,
            require_auto_switch,
            create_self_assessments,
        )
        .await
    }

    // 参与者模块
    async fn sync_participants(
        &self,
        workshop_id: i64,
        participants: Vec<ParticipantInput>,
    ) -> Result<Vec<Participant>> {
        self.sync_participants_impl(workshop_id, participants).await
    }

    async fn list_participants(&self, workshop_id: i64) -> Result<Vec<Participant>> {
        self.list_participants_impl(workshop_id).await
    }

    async fn get_participant(
        &self,
        workshop_id: i64,
        user_id: i64,
    ) -> Result<Option<Participant>> {
        self.get_participant_impl(workshop_id, user_id).await
    }

    // 提交模块
    async fn create_submission(&self, submission: NewSubmission) -> Result<Submission> {
        self.create_submission_impl(submission).await
    }

    async fn update_submission_content(
        &self,
        id: i64,
        title: String,
        content: String,
        late: bool,
    ) -> Result<Option<Submission>> {
        self.update_submission_content_impl(id, title, content, late)
            .await
    }

    async fn get_submission(&self, id: i64) -> Result<Option<Submission>> {
        self.get_submission_impl(id).await
    }

    async fn get_author_submission(
        &self,
        workshop_id: i64,
        author_id: i64,
    ) -> Result<Option<Submission>> {
        self.get_author_submission_impl(workshop_id, author_id).await
    }

    async fn list_submissions(&self, workshop_id: i64, examples: bool) -> Result<Vec<Submission>> {
        self.list_submissions_impl(workshop_id, examples).await
    }

    async fn override_submission_grade(
        &self,
        id: i64,
        grade_over: Option<f64>,
        by: i64,
        feedback_author: Option<String>,
    ) -> Result<Option<Submission>> {
        self.override_submission_grade_impl(id, grade_over, by, feedback_author)
            .await
    }

    async fn set_submission_published(
        &self,
        id: i64,
        published: bool,
    ) -> Result<Option<Submission>> {
        self.set_submission_published_impl(id, published).await
    }

    // 评审与分配模块
    async fn add_allocation(
        &self,
        submission_id: i64,
        reviewer_id: i64,
        weight: i32,
    ) -> Result<(Assessment, bool)> {
        self.add_allocation_impl(submission_id, reviewer_id, weight)
            .await
    }

    async fn get_assessment(&self, id: i64) -> Result<Option<Assessment>> {
        self.get_assessment_impl(id).await
    }

    async fn delete_allocation(&self, id: i64) -> Result<bool> {
        self.delete_allocation_impl(id).await
    }

    async fn delete_ungraded_peer_allocations(&self, workshop_id: i64) -> Result<u64> {
        self.delete_ungraded_peer_allocations_impl(workshop_id).await
    }

    async fn list_submission_assessments(&self, submission_id: i64) -> Result<Vec<Assessment>> {
        self.list_submission_assessments_impl(submission_id).await
    }

    async fn list_reviewer_assessments(
        &self,
        workshop_id: i64,
        reviewer_id: i64,
    ) -> Result<Vec<Assessment>> {
        self.list_reviewer_assessments_impl(workshop_id, reviewer_id)
            .await
    }

    async fn list_workshop_assessments(&self, workshop_id: i64) -> Result<Vec<Assessment>> {
        self.list_workshop_assessments_impl(workshop_id).await
    }

    async fn allocation_table(&self, workshop_id: i64) -> Result<Vec<AllocationRow>> {
        self.allocation_table_impl(workshop_id).await
    }

    async fn save_assessment(
        &self,
        assessment_id: i64,
        strategy: &str,
        scores: &[CriterionScoreInput],
        grade: Option<f64>,
        feedback_author: Option<String>,
    ) -> Result<(Assessment, Vec<CriterionScore>)> {
        self.save_assessment_impl(assessment_id, strategy, scores, grade, feedback_author)
            .await
    }

    async fn list_criterion_scores(
        &self,
        assessment_id: i64,
        strategy: &str,
    ) -> Result<Vec<CriterionScore>> {
        self.list_criterion_scores_impl(assessment_id, strategy)
            .await
    }

    async fn override_grading_grade(
        &self,
        id: i64,
        grading_grade_over: Option<f64>,
        feedback_reviewer: Option<String>,
    ) -> Result<Option<Assessment>> {
        self.override_grading_grade_impl(id, grading_grade_over, feedback_reviewer)
            .await
    }

    // 评价模块
    async fn evaluation_snapshot(
        &self,
        workshop_id: i64,
        strategy: &str,
    ) -> Result<EvaluationSnapshot> {
        self.evaluation_snapshot_impl(workshop_id, strategy).await
    }

    async fn write_evaluation(&self, workshop_id: i64, write: EvaluationWrite) -> Result<()> {
        self.write_evaluation_impl(workshop_id, write).await
    }

    async fn upsert_aggregation(
        &self,
        workshop_id: i64,
        user_id: i64,
        grading_grade: Option<f64>,
    ) -> Result<()> {
        self.upsert_aggregation_impl(workshop_id, user_id, grading_grade)
            .await
    }

    async fn list_aggregations(&self, workshop_id: i64) -> Result<HashMap<i64, Option<f64>>> {
        self.list_aggregations_impl(workshop_id).await
    }

    async fn clear_aggregated_grades(&self, workshop_id: i64) -> Result<ClearSummary> {
        self.clear_aggregated_grades_impl(workshop_id).await
    }

    async fn clear_assessments(&self, workshop_id: i64) -> Result<ClearSummary> {
        self.clear_assessments_impl(workshop_id).await
    }

    // 评分表单模块
    async fn list_criteria(&self, workshop_id: i64, strategy: &str) -> Result<Vec<Criterion>> {
        self.list_criteria_impl(workshop_id, strategy).await
    }

    async fn replace_criteria(
        &self,
        workshop_id: i64,
        strategy: &str,
        criteria: Vec<CriterionInput>,
    ) -> Result<Vec<Criterion>> {
        self.replace_criteria_impl(workshop_id, strategy, criteria)
            .await
    }

    // 定时分配模块
    async fn get_allocation_schedule(
        &self,
        workshop_id: i64,
    ) -> Result<Option<AllocationSchedule>> {
        self.get_allocation_schedule_impl(workshop_id).await
    }

    async fn save_allocation_schedule(
        &self,
        workshop_id: i64,
        enabled: bool,
        settings: &RandomAllocationSettings,
    ) -> Result<AllocationSchedule> {
        self.save_allocation_schedule_impl(workshop_id, enabled, settings)
            .await
    }

    async fn claim_allocation_schedule(&self, schedule_id: i64, now: i64) -> Result<bool> {
        self.claim_allocation_schedule_impl(schedule_id, now).await
    }

    async fn record_allocation_schedule_result(
        &self,
        schedule_id: i64,
        status: AllocationStatus,
        message: Option<String>,
    ) -> Result<()> {
        self.record_allocation_schedule_result_impl(schedule_id, status, message)
            .await
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::models::participants::entities::ParticipantRole;
    use crate::workflow::phase::tests::sample_workshop;

    /// 内存 SQLite，单连接
    pub(crate) async fn memory_storage() -> SeaOrmStorage {
        let db = Database::connect("sqlite::memory:")
            .await
            .expect("connect in-memory sqlite");
        SeaOrmStorage::from_connection(db)
            .await
            .expect("run migrations")
    }

    pub(crate) fn student(user_id: i64, group_id: Option<i64>) -> ParticipantInput {
        ParticipantInput {
            user_id,
            username: format!("user{user_id}"),
            firstname: format!("First{user_id}"),
            lastname: format!("Last{user_id}"),
            group_id,
            role: ParticipantRole::Student,
        }
    }

    /// 提交阶段的工作坊与一批学生
    pub(crate) async fn seed_workshop(students: &[i64]) -> (SeaOrmStorage, Workshop) {
        let storage = memory_storage().await;
        let workshop = storage
            .create_workshop_impl(sample_workshop(Phase::Submission))
            .await
            .expect("create workshop");
        let participants = students.iter().map(|id| student(*id, None)).collect();
        storage
            .sync_participants_impl(workshop.id, participants)
            .await
            .expect("sync participants");
        (storage, workshop)
    }

    pub(crate) async fn submit(
        storage: &SeaOrmStorage,
        workshop: &Workshop,
        author_id: i64,
    ) -> Submission {
        storage
            .create_submission_impl(NewSubmission {
                workshop_id: workshop.id,
                author_id: Some(author_id),
                example: false,
                title: format!("Essay by {author_id}"),
                content: "Lorem ipsum".to_string(),
                late: false,
            })
            .await
            .expect("create submission")
    }

    #[test]
    fn test_build_database_url() {
        assert_eq!(
            SeaOrmStorage::build_database_url("workshop.db").unwrap(),
            "sqlite://workshop.db?mode=rwc"
        );
        assert_eq!(
            SeaOrmStorage::build_database_url(":memory:").unwrap(),
            "sqlite::memory:"
        );
        assert!(SeaOrmStorage::build_database_url("postgres://u@h/db").is_ok());
        assert!(SeaOrmStorage::build_database_url("ftp://nope").is_err());
    }

    #[tokio::test]
    async fn test_migrations_run_on_memory_db() {
        let storage = memory_storage().await;
        assert!(storage.get_workshop_impl(1).await.unwrap().is_none());
    }
}
