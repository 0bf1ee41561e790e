use actix_web::{HttpRequest, HttpResponse, Result as ActixResult, web};
use chrono::Utc;

use super::{
    assessments::configure_assessment_routes, require_context, respond,
    submissions::configure_submission_routes,
};
use crate::middlewares::{RequireCapability, RequireContext};
use crate::models::allocation::requests::AllocationRequest;
use crate::models::context::Capability;
use crate::models::evaluation::requests::{
    SetEvaluationMethodRequest, ToolboxAction, ToolboxRequest, UpdateEvaluationSettingsRequest,
};
use crate::models::grading::requests::UpdateGradingFormRequest;
use crate::models::participants::requests::SyncParticipantsRequest;
use crate::models::report::requests::GradingReportQuery;
use crate::models::submissions::requests::CreateSubmissionRequest;
use crate::models::workshops::requests::{
    AssessmentTypeStepRequest, CreateWorkshopRequest, SwitchPhaseRequest,
    UpdateWorkshopSettingsRequest,
};
use crate::services::WorkshopService;

// 创建工作坊
pub async fn create_workshop(
    req: HttpRequest,
    service: web::Data<WorkshopService>,
    body: web::Json<CreateWorkshopRequest>,
) -> ActixResult<HttpResponse> {
    let ctx = require_context!(req);
    respond(service.create_workshop(&ctx, body.into_inner()).await, "工作坊创建成功")
}

// 获取工作坊详情，读取前检查自动切换
pub async fn get_workshop(
    req: HttpRequest,
    service: web::Data<WorkshopService>,
    path: web::Path<i64>,
) -> ActixResult<HttpResponse> {
    let ctx = require_context!(req);
    respond(
        service.get_workshop(&ctx, path.into_inner(), Utc::now()).await,
        "获取成功",
    )
}

// 更新活动设置
pub async fn update_settings(
    req: HttpRequest,
    service: web::Data<WorkshopService>,
    path: web::Path<i64>,
    body: web::Json<UpdateWorkshopSettingsRequest>,
) -> ActixResult<HttpResponse> {
    let ctx = require_context!(req);
    respond(
        service.update_settings(&ctx, path.into_inner(), body.into_inner()).await,
        "设置已保存",
    )
}

// 同步参与者名单
pub async fn sync_participants(
    req: HttpRequest,
    service: web::Data<WorkshopService>,
    path: web::Path<i64>,
    body: web::Json<SyncParticipantsRequest>,
) -> ActixResult<HttpResponse> {
    let ctx = require_context!(req);
    respond(
        service.sync_participants(&ctx, path.into_inner(), body.into_inner()).await,
        "名单已同步",
    )
}

// 向导导航
pub async fn wizard_page(
    req: HttpRequest,
    service: web::Data<WorkshopService>,
    path: web::Path<i64>,
) -> ActixResult<HttpResponse> {
    let ctx = require_context!(req);
    respond(service.wizard_page(&ctx, path.into_inner()).await, "获取成功")
}

// 向导第一步
pub async fn save_assessment_type(
    req: HttpRequest,
    service: web::Data<WorkshopService>,
    path: web::Path<i64>,
    body: web::Json<AssessmentTypeStepRequest>,
) -> ActixResult<HttpResponse> {
    let ctx = require_context!(req);
    respond(
        service
            .save_assessment_type(&ctx, path.into_inner(), body.into_inner().assessment_type)
            .await,
        "评审方式已保存",
    )
}

// 手动切换阶段
pub async fn switch_phase(
    req: HttpRequest,
    service: web::Data<WorkshopService>,
    path: web::Path<i64>,
    body: web::Json<SwitchPhaseRequest>,
) -> ActixResult<HttpResponse> {
    let ctx = require_context!(req);
    respond(
        service.switch_phase(&ctx, path.into_inner(), body.into_inner().phase).await,
        "阶段已切换",
    )
}

// 当前用户的计划
pub async fn user_plan(
    req: HttpRequest,
    service: web::Data<WorkshopService>,
    path: web::Path<i64>,
) -> ActixResult<HttpResponse> {
    let ctx = require_context!(req);
    respond(service.user_plan(&ctx, path.into_inner()).await, "获取成功")
}

// 成绩报表
pub async fn grading_report(
    req: HttpRequest,
    service: web::Data<WorkshopService>,
    path: web::Path<i64>,
    query: web::Query<GradingReportQuery>,
) -> ActixResult<HttpResponse> {
    let ctx = require_context!(req);
    respond(
        service.grading_report(&ctx, path.into_inner(), query.into_inner()).await,
        "获取成功",
    )
}

// 查看分配表
pub async fn allocation_page(
    req: HttpRequest,
    service: web::Data<WorkshopService>,
    path: web::Path<i64>,
) -> ActixResult<HttpResponse> {
    let ctx = require_context!(req);
    respond(
        service
            .run_allocation_pass(&ctx, path.into_inner(), AllocationRequest::default())
            .await,
        "获取成功",
    )
}

// 执行分配
pub async fn run_allocation(
    req: HttpRequest,
    service: web::Data<WorkshopService>,
    path: web::Path<i64>,
    body: web::Json<AllocationRequest>,
) -> ActixResult<HttpResponse> {
    let ctx = require_context!(req);
    respond(
        service.run_allocation_pass(&ctx, path.into_inner(), body.into_inner()).await,
        "分配完成",
    )
}

// 创建或更新自己的提交
pub async fn save_submission(
    req: HttpRequest,
    service: web::Data<WorkshopService>,
    path: web::Path<i64>,
    body: web::Json<CreateSubmissionRequest>,
) -> ActixResult<HttpResponse> {
    let ctx = require_context!(req);
    respond(
        service
            .save_submission(&ctx, path.into_inner(), body.into_inner(), Utc::now())
            .await,
        "提交已保存",
    )
}

// 创建示例提交
pub async fn create_example(
    req: HttpRequest,
    service: web::Data<WorkshopService>,
    path: web::Path<i64>,
    body: web::Json<CreateSubmissionRequest>,
) -> ActixResult<HttpResponse> {
    let ctx = require_context!(req);
    respond(
        service.create_example(&ctx, path.into_inner(), body.into_inner()).await,
        "示例提交已创建",
    )
}

// 获取评分表单
pub async fn get_grading_form(
    req: HttpRequest,
    service: web::Data<WorkshopService>,
    path: web::Path<i64>,
) -> ActixResult<HttpResponse> {
    let ctx = require_context!(req);
    respond(service.get_grading_form(&ctx, path.into_inner()).await, "获取成功")
}

// 替换评分表单
pub async fn update_grading_form(
    req: HttpRequest,
    service: web::Data<WorkshopService>,
    path: web::Path<i64>,
    body: web::Json<UpdateGradingFormRequest>,
) -> ActixResult<HttpResponse> {
    let ctx = require_context!(req);
    respond(
        service.update_grading_form(&ctx, path.into_inner(), body.into_inner()).await,
        "评分表单已保存",
    )
}

// 选择评价方法
pub async fn set_evaluation_method(
    req: HttpRequest,
    service: web::Data<WorkshopService>,
    path: web::Path<i64>,
    body: web::Json<SetEvaluationMethodRequest>,
) -> ActixResult<HttpResponse> {
    let ctx = require_context!(req);
    respond(
        service
            .set_evaluation_method(&ctx, path.into_inner(), &body.method)
            .await,
        "评价方法已保存",
    )
}

// 更新评价设置
pub async fn update_evaluation_settings(
    req: HttpRequest,
    service: web::Data<WorkshopService>,
    path: web::Path<i64>,
    body: web::Json<UpdateEvaluationSettingsRequest>,
) -> ActixResult<HttpResponse> {
    let ctx = require_context!(req);
    respond(
        service
            .update_evaluation_settings(&ctx, path.into_inner(), body.into_inner().settings)
            .await,
        "评价设置已保存",
    )
}

// 汇总成绩
pub async fn aggregate(
    req: HttpRequest,
    service: web::Data<WorkshopService>,
    path: web::Path<i64>,
) -> ActixResult<HttpResponse> {
    let ctx = require_context!(req);
    respond(service.aggregate(&ctx, path.into_inner()).await, "成绩汇总完成")
}

// 工具箱清理操作
pub async fn run_toolbox_action(
    req: HttpRequest,
    service: web::Data<WorkshopService>,
    path: web::Path<(i64, ToolboxAction)>,
    body: web::Json<ToolboxRequest>,
) -> ActixResult<HttpResponse> {
    let ctx = require_context!(req);
    let (workshop_id, action) = path.into_inner();
    respond(
        service
            .run_toolbox_action(&ctx, workshop_id, action, body.confirm.as_deref())
            .await,
        "清理完成",
    )
}

// 配置路由
pub fn configure_workshop_routes(cfg: &mut web::ServiceConfig) {
    let manage = || RequireCapability::new(Capability::ManageActivity);

    cfg.service(
        web::scope("/api/v1/workshops")
            .wrap(RequireContext)
            // 创建工作坊 - 仅管理者
            .service(web::resource("").route(web::post().to(create_workshop).wrap(manage())))
            // 工作坊详情 - 所有登录用户
            .service(web::resource("/{id}").route(web::get().to(get_workshop)))
            .service(web::resource("/{id}/settings").route(web::put().to(update_settings).wrap(manage())))
            .service(
                web::resource("/{id}/participants")
                    .route(web::put().to(sync_participants).wrap(manage())),
            )
            .service(web::resource("/{id}/wizard").route(web::get().to(wizard_page).wrap(manage())))
            .service(
                web::resource("/{id}/wizard/assessment-type")
                    .route(web::put().to(save_assessment_type).wrap(manage())),
            )
            .service(web::resource("/{id}/phase").route(web::post().to(switch_phase).wrap(manage())))
            // 计划 - 所有登录用户，内容按能力裁剪
            .service(web::resource("/{id}/plan").route(web::get().to(user_plan)))
            .service(
                web::resource("/{id}/report").route(
                    web::get().to(grading_report).wrap(RequireCapability::new_any(&[
                        Capability::ViewAllAssessments,
                        Capability::OverrideGrades,
                    ])),
                ),
            )
            .service(
                web::resource("/{id}/allocation")
                    .route(web::get().to(allocation_page))
                    .route(web::post().to(run_allocation))
                    .wrap(RequireCapability::new(Capability::Allocate)),
            )
            .service(
                web::resource("/{id}/submissions").route(
                    web::post()
                        .to(save_submission)
                        .wrap(RequireCapability::new(Capability::Submit)),
                ),
            )
            .service(
                web::resource("/{id}/examples").route(
                    web::post()
                        .to(create_example)
                        .wrap(RequireCapability::new(Capability::ManageExamples)),
                ),
            )
            .service(
                web::resource("/{id}/form")
                    .route(web::get().to(get_grading_form))
                    .route(web::put().to(update_grading_form).wrap(manage())),
            )
            .service(
                web::resource("/{id}/evaluation/method")
                    .route(web::post().to(set_evaluation_method).wrap(manage())),
            )
            .service(
                web::resource("/{id}/evaluation/settings")
                    .route(web::put().to(update_evaluation_settings).wrap(manage())),
            )
            .service(
                web::resource("/{id}/evaluation/aggregate").route(
                    web::post()
                        .to(aggregate)
                        .wrap(RequireCapability::new(Capability::OverrideGrades)),
                ),
            )
            .service(
                web::resource("/{id}/toolbox/{action}")
                    .route(web::post().to(run_toolbox_action).wrap(manage())),
            )
            .configure(configure_submission_routes)
            .configure(configure_assessment_routes),
    );
}
