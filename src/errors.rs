//! 统一错误处理模块
//!
//! 使用宏自动生成错误类型，支持错误代码和类型名称。
//! 策略层的分配结果、评分校验结果不走这里，它们是结构化返回值。

use std::fmt;

/// 定义错误类型的宏
///
/// 自动生成：
/// - enum 定义
/// - code() 方法 - 返回错误代码
/// - error_type() 方法 - 返回错误类型名称
/// - message() 方法 - 返回错误详情
/// - 便捷构造函数
macro_rules! define_workshop_errors {
    ($(
        $variant:ident($code:literal, $type_name:literal)
    ),* $(,)?) => {
        #[derive(Debug, Clone)]
        pub enum WorkshopError {
            $($variant(String),)*
        }

        impl WorkshopError {
            /// 获取错误代码
            pub fn code(&self) -> &'static str {
                match self {
                    $(WorkshopError::$variant(_) => $code,)*
                }
            }

            /// 获取错误类型名称
            pub fn error_type(&self) -> &'static str {
                match self {
                    $(WorkshopError::$variant(_) => $type_name,)*
                }
            }

            /// 获取错误详情
            pub fn message(&self) -> &str {
                match self {
                    $(WorkshopError::$variant(msg) => msg,)*
                }
            }
        }

        // 生成便捷构造函数
        paste::paste! {
            impl WorkshopError {
                $(
                    pub fn [<$variant:snake>]<T: Into<String>>(msg: T) -> Self {
                        WorkshopError::$variant(msg.into())
                    }
                )*
            }
        }
    };
}

define_workshop_errors! {
    Configuration("E001", "Configuration Error"),
    PhaseViolation("E002", "Phase Violation"),
    Validation("E003", "Validation Error"),
    ConfirmationRequired("E004", "Confirmation Required"),
    NotFound("E005", "Resource Not Found"),
    Conflict("E006", "Conflict"),
    DatabaseConfig("E007", "Database Configuration Error"),
    DatabaseConnection("E008", "Database Connection Error"),
    DatabaseOperation("E009", "Database Operation Error"),
    Serialization("E010", "Serialization Error"),
    StrategyNotFound("E011", "Strategy Plugin Not Found"),
    Authentication("E012", "Authentication Error"),
    Authorization("E013", "Authorization Error"),
}

impl WorkshopError {
    /// 格式化为彩色输出（用于开发环境）
    #[cfg(debug_assertions)]
    pub fn format_colored(&self) -> String {
        format!(
            "\x1b[1;31m[ERROR]\x1b[0m \x1b[33m{}\x1b[0m \x1b[31m{}\x1b[0m\n  {}",
            self.code(),
            self.error_type(),
            self.message()
        )
    }

    /// 格式化为简洁输出
    pub fn format_simple(&self) -> String {
        format!("{}: {}", self.error_type(), self.message())
    }
}

impl fmt::Display for WorkshopError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format_simple())
    }
}

impl std::error::Error for WorkshopError {}

// 为常见的错误类型实现 From trait
impl From<sea_orm::DbErr> for WorkshopError {
    fn from(err: sea_orm::DbErr) -> Self {
        WorkshopError::DatabaseOperation(err.to_string())
    }
}

impl From<serde_json::Error> for WorkshopError {
    fn from(err: serde_json::Error) -> Self {
        WorkshopError::Serialization(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, WorkshopError>;
