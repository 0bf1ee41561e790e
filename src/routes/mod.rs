pub mod assessments;

pub mod submissions;

pub mod workshops;

pub use workshops::configure_workshop_routes;

use actix_web::{HttpRequest, HttpResponse, Result as ActixResult, http::StatusCode};
use serde::Serialize;
use tracing::{debug, error};
use ts_rs::TS;

use crate::errors::{Result, WorkshopError};
use crate::middlewares::RequireContext;
use crate::models::context::RequestContext;
use crate::models::{ApiResponse, ErrorCode};

/// 业务错误对应的 HTTP 状态
pub(crate) fn error_status(err: &WorkshopError) -> StatusCode {
    match err {
        WorkshopError::Validation(_) => StatusCode::BAD_REQUEST,
        WorkshopError::PhaseViolation(_) | WorkshopError::Conflict(_) => StatusCode::CONFLICT,
        WorkshopError::ConfirmationRequired(_) => StatusCode::PRECONDITION_REQUIRED,
        WorkshopError::NotFound(_) => StatusCode::NOT_FOUND,
        WorkshopError::Configuration(_) | WorkshopError::StrategyNotFound(_) => {
            StatusCode::UNPROCESSABLE_ENTITY
        }
        WorkshopError::Authentication(_) => StatusCode::UNAUTHORIZED,
        WorkshopError::Authorization(_) => StatusCode::FORBIDDEN,
        WorkshopError::DatabaseConfig(_)
        | WorkshopError::DatabaseConnection(_)
        | WorkshopError::DatabaseOperation(_)
        | WorkshopError::Serialization(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

pub(crate) fn error_response(err: &WorkshopError) -> HttpResponse {
    let status = error_status(err);
    if status.is_server_error() {
        error!("Request failed: {}", err.format_simple());
    } else {
        debug!("Request rejected: {}", err.format_simple());
    }
    HttpResponse::build(status).json(ApiResponse::from_error(err))
}

/// 把服务结果包装为统一响应
pub(crate) fn respond<T: Serialize + TS>(result: Result<T>, message: &str) -> ActixResult<HttpResponse> {
    Ok(match result {
        Ok(data) => HttpResponse::Ok().json(ApiResponse::success(data, message)),
        Err(err) => error_response(&err),
    })
}

/// 取出上下文，缺失时直接返回 401 响应
macro_rules! require_context {
    ($req:expr) => {
        match $crate::routes::request_context(&$req) {
            Ok(ctx) => ctx,
            Err(response) => return Ok(response),
        }
    };
}
pub(crate) use require_context;

/// 取出中间件写入的上下文
pub(crate) fn request_context(req: &HttpRequest) -> std::result::Result<RequestContext, HttpResponse> {
    RequireContext::extract(req).ok_or_else(|| {
        HttpResponse::Unauthorized().json(ApiResponse::error_empty(
            ErrorCode::Unauthorized,
            "无法获取用户信息",
        ))
    })
}
