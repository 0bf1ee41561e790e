//! Peer Workshop - 同伴互评工作坊引擎
//!
//! 基于 Actix Web 构建，按阶段推进的同伴互评活动后端。
//!
//! # 架构
//! - `config`: 配置管理
//! - `entity`: SeaORM 数据库实体
//! - `errors`: 统一错误处理
//! - `events`: 工作坊事件总线
//! - `middlewares`: 上下文解码与能力校验中间件
//! - `models`: 数据模型定义
//! - `routes`: API 路由层
//! - `runtime`: 运行时生命周期与后台巡检
//! - `services`: 核心业务操作
//! - `storage`: 数据存储层（SeaORM）
//! - `strategies`: 评分、分配与评价策略插件
//! - `utils`: 工具函数
//! - `workflow`: 阶段状态机

pub mod config;
pub mod entity;
pub mod errors;
pub mod events;
pub mod middlewares;
pub mod models;
pub mod routes;
pub mod runtime;
pub mod services;
pub mod storage;
pub mod strategies;
pub mod utils;
pub mod workflow;
