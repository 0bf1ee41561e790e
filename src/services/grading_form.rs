//! 评分表单的读取与整体替换

use chrono::Utc;
use tracing::info;

use super::{WorkshopService, ensure_permitted, validation_error};
use crate::errors::{Result, WorkshopError};
use crate::models::assessments::entities::FieldError;
use crate::models::context::RequestContext;
use crate::models::grading::{
    entities::{Criterion, GradingForm},
    requests::UpdateGradingFormRequest,
    responses::GradingFormResponse,
};
use crate::strategies::grading::NumErrorsStrategy;
use crate::strategies::registry;
use crate::workflow::phase::WorkshopOperation;

pub async fn get_grading_form(
    service: &WorkshopService,
    _ctx: &RequestContext,
    workshop_id: i64,
) -> Result<GradingFormResponse> {
    let workshop = service.load_workshop(workshop_id).await?;
    let strategy = service.grading_strategy(&workshop).await?;
    Ok(GradingFormResponse {
        ready: strategy.form_ready(),
        form: strategy.form().clone(),
    })
}

/// 替换当前策略的全部维度，可同时更新策略设置
pub async fn update_grading_form(
    service: &WorkshopService,
    ctx: &RequestContext,
    workshop_id: i64,
    mut req: UpdateGradingFormRequest,
) -> Result<GradingFormResponse> {
    let mut workshop = service.current_workshop(workshop_id, Utc::now()).await?;
    ensure_permitted(&workshop, WorkshopOperation::ManageGradingForm)?;

    let mut errors = Vec::new();
    for (index, input) in req.criteria.iter_mut().enumerate() {
        if input.description.trim().is_empty() {
            errors.push(FieldError::new(format!("criterion_{index}"), "Description is required"));
        }
        // 错误计数的每个维度只有通过与出错两种取值
        if workshop.strategy == NumErrorsStrategy::ID {
            input.max_grade = Some(1.0);
        }
    }
    if !errors.is_empty() {
        return Err(validation_error(&errors));
    }

    // 先用候选表单校验，通过后再落库
    let settings = req
        .settings
        .clone()
        .unwrap_or_else(|| workshop.strategy_settings.clone());
    let candidate = GradingForm {
        strategy: workshop.strategy.clone(),
        criteria: req
            .criteria
            .iter()
            .enumerate()
            .map(|(index, input)| Criterion {
                id: index as i64 + 1,
                sort_order: index as i32,
                description: input.description.clone(),
                max_grade: input.max_grade.unwrap_or(10.0),
                weight: input.weight.unwrap_or(1),
                levels: input.levels.clone(),
            })
            .collect(),
        settings: settings.clone(),
    };
    let strategy = registry::get_grading_strategy(&workshop.strategy, candidate).ok_or_else(|| {
        WorkshopError::strategy_not_found(format!("评分策略 {} 未注册", workshop.strategy))
    })?;
    let errors = strategy.validate_form();
    if !errors.is_empty() {
        return Err(validation_error(&errors));
    }

    let storage = service.storage();
    storage
        .replace_criteria(workshop_id, &workshop.strategy, req.criteria)
        .await?;
    if req.settings.is_some() {
        workshop.strategy_settings = settings;
        workshop = storage.update_workshop(&workshop).await?;
    }
    info!(
        "Grading form of workshop {} ({}) replaced by user {}",
        workshop_id, workshop.strategy, ctx.user_id
    );

    get_grading_form(service, ctx, workshop_id).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::grading::requests::CriterionInput;
    use crate::services::tests::{seeded, teacher};
    use crate::workflow::phase::Phase;
    use serde_json::json;

    fn input(description: &str, max_grade: Option<f64>) -> CriterionInput {
        CriterionInput {
            description: description.to_string(),
            max_grade,
            weight: None,
            levels: vec![],
        }
    }

    #[tokio::test]
    async fn test_replace_form_then_ready() {
        let (service, workshop) = seeded(&[]).await;
        let before = service.get_grading_form(&teacher(), workshop.id).await.unwrap();
        assert!(!before.ready);

        let req = UpdateGradingFormRequest {
            criteria: vec![input("Structure", Some(20.0)), input("Style", None)],
            settings: None,
        };
        let after = service
            .update_grading_form(&teacher(), workshop.id, req)
            .await
            .unwrap();
        assert!(after.ready);
        assert_eq!(after.form.criteria.len(), 2);
        assert_eq!(after.form.criteria[0].max_grade, 20.0);
    }

    #[tokio::test]
    async fn test_invalid_form_not_stored() {
        let (service, workshop) = seeded(&[]).await;
        let req = UpdateGradingFormRequest {
            criteria: vec![input("Structure", Some(0.0))],
            settings: None,
        };
        let result = service.update_grading_form(&teacher(), workshop.id, req).await;
        assert!(matches!(result, Err(WorkshopError::Validation(_))));

        let form = service.get_grading_form(&teacher(), workshop.id).await.unwrap();
        assert!(form.form.criteria.is_empty());
    }

    #[tokio::test]
    async fn test_numerrors_settings_saved() {
        let (service, mut workshop) = seeded(&[]).await;
        workshop.strategy = "numerrors".to_string();
        service.storage().update_workshop(&workshop).await.unwrap();

        let req = UpdateGradingFormRequest {
            criteria: vec![input("Has a thesis", Some(5.0))],
            settings: Some(json!({ "mappings": [{ "errors": 1, "grade": 60.0 }] })),
        };
        let response = service
            .update_grading_form(&teacher(), workshop.id, req)
            .await
            .unwrap();
        assert_eq!(response.form.criteria[0].max_grade, 1.0);
        assert_eq!(response.form.settings["mappings"][0]["grade"], json!(60.0));
    }

    #[tokio::test]
    async fn test_form_locked_after_submission_phase() {
        let (service, workshop) = seeded(&[]).await;
        service.switch_phase(&teacher(), workshop.id, Phase::Assessment).await.unwrap();
        let req = UpdateGradingFormRequest {
            criteria: vec![input("Late change", None)],
            settings: None,
        };
        let result = service.update_grading_form(&teacher(), workshop.id, req).await;
        assert!(matches!(result, Err(WorkshopError::PhaseViolation(_))));
    }
}
