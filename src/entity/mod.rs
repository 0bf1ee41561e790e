//! SeaORM 实体定义
//!
//! 这些实体用于数据库操作，与 models 模块中的业务实体分离。
//! Storage 层使用这些实体进行 CRUD 操作，然后转换为 models 中的业务实体。

pub mod prelude;

pub mod aggregations;
pub mod allocation_schedules;
pub mod assessments;
pub mod criteria;
pub mod criterion_scores;
pub mod participants;
pub mod submissions;
pub mod workshops;

use chrono::{DateTime, Utc};

/// 0 表示未设置的时间戳
pub(crate) fn optional_timestamp(ts: i64) -> Option<DateTime<Utc>> {
    if ts > 0 {
        DateTime::<Utc>::from_timestamp(ts, 0)
    } else {
        None
    }
}

pub(crate) fn timestamp(ts: i64) -> DateTime<Utc> {
    DateTime::<Utc>::from_timestamp(ts, 0).unwrap_or_default()
}

/// JSON 文本列，解析失败按空值处理
pub(crate) fn json_column(raw: Option<String>) -> serde_json::Value {
    raw.and_then(|s| serde_json::from_str(&s).ok())
        .unwrap_or(serde_json::Value::Null)
}
