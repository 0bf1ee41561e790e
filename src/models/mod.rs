//! 业务模型
//!
//! 与 entity 模块中的数据库行分离，所有对外 DTO 通过 ts-rs 导出 TypeScript 类型。

pub mod allocation;
pub mod assessments;
pub mod common;
pub mod context;
pub mod evaluation;
pub mod grading;
pub mod participants;
pub mod plan;
pub mod report;
pub mod submissions;
pub mod wizard;
pub mod workshops;

pub use common::pagination::PaginationInfo;
pub use common::response::ApiResponse;

use crate::errors::WorkshopError;

/// 程序启动时间
#[derive(Debug, Clone)]
pub struct AppStartTime {
    pub start_datetime: chrono::DateTime<chrono::Utc>,
}

/// 响应业务码
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ErrorCode {
    Success = 0,

    // 通用错误
    BadRequest = 1000,
    Unauthorized = 1001,
    Forbidden = 1003,
    NotFound = 1004,
    InternalServerError = 1005,

    // 工作坊业务错误
    ValidationFailed = 2001,
    PhaseViolation = 2002,
    ConfirmationRequired = 2003,
    Conflict = 2004,

    // 策略插件错误
    StrategyConfiguration = 3001,
    StrategyNotFound = 3002,
}

impl From<&WorkshopError> for ErrorCode {
    fn from(err: &WorkshopError) -> Self {
        match err {
            WorkshopError::Configuration(_) => ErrorCode::StrategyConfiguration,
            WorkshopError::PhaseViolation(_) => ErrorCode::PhaseViolation,
            WorkshopError::Validation(_) => ErrorCode::ValidationFailed,
            WorkshopError::ConfirmationRequired(_) => ErrorCode::ConfirmationRequired,
            WorkshopError::NotFound(_) => ErrorCode::NotFound,
            WorkshopError::Conflict(_) => ErrorCode::Conflict,
            WorkshopError::StrategyNotFound(_) => ErrorCode::StrategyNotFound,
            WorkshopError::Authentication(_) => ErrorCode::Unauthorized,
            WorkshopError::Authorization(_) => ErrorCode::Forbidden,
            WorkshopError::DatabaseConfig(_)
            | WorkshopError::DatabaseConnection(_)
            | WorkshopError::DatabaseOperation(_)
            | WorkshopError::Serialization(_) => ErrorCode::InternalServerError,
        }
    }
}
