//! 可插拔的评分、分配与评价策略

pub mod allocation;
pub mod evaluation;
pub mod grading;
pub mod registry;
