//! 评分表单存储操作

use super::{SeaOrmStorage, commit, db_err};
use crate::entity::criteria::{ActiveModel, Column, Entity as Criteria};
use crate::entity::criterion_scores::{Column as ScoreColumn, Entity as CriterionScores};
use crate::errors::Result;
use crate::models::grading::{entities::Criterion, requests::CriterionInput};
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set};

const DEFAULT_MAX_GRADE: f64 = 10.0;
const DEFAULT_WEIGHT: i32 = 1;

impl SeaOrmStorage {
    pub async fn list_criteria_impl(&self, workshop_id: i64, strategy: &str) -> Result<Vec<Criterion>> {
        let result = Criteria::find()
            .filter(Column::WorkshopId.eq(workshop_id))
            .filter(Column::Strategy.eq(strategy))
            .order_by_asc(Column::SortOrder)
            .order_by_asc(Column::Id)
            .all(&self.db)
            .await
            .map_err(db_err("查询评分维度"))?;
        Ok(result.into_iter().map(|m| m.into_criterion()).collect())
    }

    /// 按位置整体替换表单
    ///
    /// 同一位置的维度保留 ID，已有得分继续指向它；多出的旧维度连同得分一并删除。
    pub async fn replace_criteria_impl(
        &self,
        workshop_id: i64,
        strategy: &str,
        criteria: Vec<CriterionInput>,
    ) -> Result<Vec<Criterion>> {
        let txn = self.begin().await?;

        let existing = Criteria::find()
            .filter(Column::WorkshopId.eq(workshop_id))
            .filter(Column::Strategy.eq(strategy))
            .order_by_asc(Column::SortOrder)
            .order_by_asc(Column::Id)
            .all(&txn)
            .await
            .map_err(db_err("查询评分维度"))?;

        let keep = criteria.len();
        for (position, input) in criteria.into_iter().enumerate() {
            let levels = if input.levels.is_empty() {
                None
            } else {
                Some(serde_json::to_string(&input.levels)?)
            };
            let mut model = ActiveModel {
                workshop_id: Set(workshop_id),
                strategy: Set(strategy.to_string()),
                sort_order: Set(position as i32 + 1),
                description: Set(input.description),
                max_grade: Set(input.max_grade.unwrap_or(DEFAULT_MAX_GRADE)),
                weight: Set(input.weight.unwrap_or(DEFAULT_WEIGHT)),
                levels: Set(levels),
                ..Default::default()
            };
            match existing.get(position) {
                Some(current) => {
                    model.id = Set(current.id);
                    model.update(&txn).await.map_err(db_err("更新评分维度"))?;
                }
                None => {
                    model.insert(&txn).await.map_err(db_err("创建评分维度"))?;
                }
            }
        }

        let removed: Vec<i64> = existing.iter().skip(keep).map(|m| m.id).collect();
        if !removed.is_empty() {
            CriterionScores::delete_many()
                .filter(ScoreColumn::Strategy.eq(strategy))
                .filter(ScoreColumn::DimensionId.is_in(removed.clone()))
                .exec(&txn)
                .await
                .map_err(db_err("删除维度得分"))?;
            Criteria::delete_many()
                .filter(Column::Id.is_in(removed))
                .exec(&txn)
                .await
                .map_err(db_err("删除评分维度"))?;
        }

        let result = Criteria::find()
            .filter(Column::WorkshopId.eq(workshop_id))
            .filter(Column::Strategy.eq(strategy))
            .order_by_asc(Column::SortOrder)
            .all(&txn)
            .await
            .map_err(db_err("查询评分维度"))?;
        commit(txn).await?;

        Ok(result.into_iter().map(|m| m.into_criterion()).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::super::tests::seed_workshop;
    use super::*;
    use crate::models::grading::entities::RubricLevel;

    fn input(description: &str) -> CriterionInput {
        CriterionInput {
            description: description.to_string(),
            max_grade: None,
            weight: None,
            levels: vec![],
        }
    }

    #[tokio::test]
    async fn test_replace_keeps_ids_by_position() {
        let (storage, workshop) = seed_workshop(&[]).await;
        let first = storage
            .replace_criteria_impl(workshop.id, "accumulative", vec![input("A"), input("B")])
            .await
            .unwrap();
        assert_eq!(first.len(), 2);
        assert_eq!(first[0].max_grade, DEFAULT_MAX_GRADE);

        let second = storage
            .replace_criteria_impl(workshop.id, "accumulative", vec![input("A2")])
            .await
            .unwrap();
        assert_eq!(second.len(), 1);
        assert_eq!(second[0].id, first[0].id);
        assert_eq!(second[0].description, "A2");
    }

    #[tokio::test]
    async fn test_forms_are_per_strategy() {
        let (storage, workshop) = seed_workshop(&[]).await;
        let mut level = input("Clarity");
        level.levels = vec![
            RubricLevel { grade: 0.0, definition: "poor".to_string() },
            RubricLevel { grade: 4.0, definition: "good".to_string() },
        ];
        storage
            .replace_criteria_impl(workshop.id, "rubric", vec![level])
            .await
            .unwrap();

        assert!(storage.list_criteria_impl(workshop.id, "accumulative").await.unwrap().is_empty());
        let rubric = storage.list_criteria_impl(workshop.id, "rubric").await.unwrap();
        assert_eq!(rubric[0].levels.len(), 2);
    }
}
