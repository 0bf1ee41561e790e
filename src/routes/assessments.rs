use actix_web::{HttpRequest, HttpResponse, Result as ActixResult, web};

use super::{require_context, respond};
use crate::middlewares::RequireCapability;
use crate::models::assessments::{
    requests::{OverrideGradingGradeRequest, SaveAssessmentRequest},
    responses::SaveAssessmentOutcome,
};
use crate::models::context::Capability;
use crate::models::{ApiResponse, ErrorCode};
use crate::routes::error_response;
use crate::services::WorkshopService;

// 保存评审，校验失败时返回逐字段错误
pub async fn save_assessment(
    req: HttpRequest,
    service: web::Data<WorkshopService>,
    path: web::Path<(i64, i64)>,
    body: web::Json<SaveAssessmentRequest>,
) -> ActixResult<HttpResponse> {
    let ctx = require_context!(req);
    let (_, assessment_id) = path.into_inner();
    match service
        .save_assessment(&ctx, assessment_id, body.into_inner())
        .await
    {
        Ok(outcome @ SaveAssessmentOutcome::Saved { .. }) => {
            Ok(HttpResponse::Ok().json(ApiResponse::success(outcome, "评审已保存")))
        }
        Ok(outcome @ SaveAssessmentOutcome::Invalid { .. }) => Ok(HttpResponse::BadRequest()
            .json(ApiResponse::error(ErrorCode::ValidationFailed, outcome, "评审内容不合法"))),
        Err(err) => Ok(error_response(&err)),
    }
}

// 覆盖评审成绩
pub async fn override_grading_grade(
    req: HttpRequest,
    service: web::Data<WorkshopService>,
    path: web::Path<(i64, i64)>,
    body: web::Json<OverrideGradingGradeRequest>,
) -> ActixResult<HttpResponse> {
    let ctx = require_context!(req);
    let (_, assessment_id) = path.into_inner();
    respond(
        service
            .override_grading_grade(&ctx, assessment_id, body.into_inner())
            .await,
        "评审成绩已覆盖",
    )
}

// 配置路由，挂在工作坊 scope 下
pub fn configure_assessment_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::resource("/{id}/assessments/{aid}").route(
            web::put().to(save_assessment).wrap(RequireCapability::new_any(&[
                Capability::PeerAssess,
                Capability::Submit,
                Capability::ManageExamples,
            ])),
        ),
    )
    .service(
        web::resource("/{id}/assessments/{aid}/grading-grade")
            .route(web::put().to(override_grading_grade))
            .wrap(RequireCapability::new(Capability::OverrideGrades)),
    );
}
