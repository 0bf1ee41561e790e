use actix_web::{HttpRequest, HttpResponse, Result as ActixResult, web};

use super::{require_context, respond};
use crate::middlewares::RequireCapability;
use crate::models::context::Capability;
use crate::models::submissions::requests::{
    OverrideSubmissionGradeRequest, PublishSubmissionRequest,
};
use crate::services::WorkshopService;

// 覆盖提交成绩
pub async fn override_submission_grade(
    req: HttpRequest,
    service: web::Data<WorkshopService>,
    path: web::Path<(i64, i64)>,
    body: web::Json<OverrideSubmissionGradeRequest>,
) -> ActixResult<HttpResponse> {
    let ctx = require_context!(req);
    let (_, submission_id) = path.into_inner();
    respond(
        service
            .override_submission_grade(&ctx, submission_id, body.into_inner())
            .await,
        "成绩已覆盖",
    )
}

// 发布或撤回提交
pub async fn set_submission_published(
    req: HttpRequest,
    service: web::Data<WorkshopService>,
    path: web::Path<(i64, i64)>,
    body: web::Json<PublishSubmissionRequest>,
) -> ActixResult<HttpResponse> {
    let ctx = require_context!(req);
    let (_, submission_id) = path.into_inner();
    respond(
        service
            .set_submission_published(&ctx, submission_id, body.published)
            .await,
        "发布状态已更新",
    )
}

// 配置路由，挂在工作坊 scope 下
pub fn configure_submission_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::resource("/{id}/submissions/{sid}/grade")
            .route(web::put().to(override_submission_grade))
            .wrap(RequireCapability::new(Capability::OverrideGrades)),
    )
    .service(
        web::resource("/{id}/submissions/{sid}/published")
            .route(web::put().to(set_submission_published))
            .wrap(RequireCapability::new(Capability::OverrideGrades)),
    );
}
