//! 策略注册表
//!
//! 内置策略在注册表初始化时注册，其余插件通过 `register_*` 追加。

use crate::errors::{Result, WorkshopError};
use crate::models::grading::entities::GradingForm;
use crate::utils::validate::validate_plugin_id;
use once_cell::sync::Lazy;
use std::{
    collections::HashMap,
    sync::{Arc, RwLock},
};

use super::allocation::{Allocator, ManualAllocator, RandomAllocator, ScheduledAllocator};
use super::evaluation::{BestEvaluator, CommentsEvaluator, Evaluator};
use super::grading::{
    AccumulativeStrategy, CommentsStrategy, GradingStrategy, NumErrorsStrategy, RubricStrategy,
};

pub type GradingStrategyConstructor =
    Arc<dyn Fn(GradingForm) -> Box<dyn GradingStrategy> + Send + Sync>;
pub type AllocatorConstructor = Arc<dyn Fn() -> Box<dyn Allocator> + Send + Sync>;
pub type EvaluatorConstructor =
    Arc<dyn Fn(&serde_json::Value) -> Result<Box<dyn Evaluator>> + Send + Sync>;

static GRADING_REGISTRY: Lazy<RwLock<HashMap<String, GradingStrategyConstructor>>> =
    Lazy::new(|| {
        let mut registry: HashMap<String, GradingStrategyConstructor> = HashMap::new();
        registry.insert(
            AccumulativeStrategy::ID.to_string(),
            Arc::new(|form: GradingForm| -> Box<dyn GradingStrategy> { Box::new(AccumulativeStrategy::new(form)) }),
        );
        registry.insert(
            CommentsStrategy::ID.to_string(),
            Arc::new(|form: GradingForm| -> Box<dyn GradingStrategy> { Box::new(CommentsStrategy::new(form)) }),
        );
        registry.insert(
            NumErrorsStrategy::ID.to_string(),
            Arc::new(|form: GradingForm| -> Box<dyn GradingStrategy> { Box::new(NumErrorsStrategy::new(form)) }),
        );
        registry.insert(
            RubricStrategy::ID.to_string(),
            Arc::new(|form: GradingForm| -> Box<dyn GradingStrategy> { Box::new(RubricStrategy::new(form)) }),
        );
        RwLock::new(registry)
    });

static ALLOCATOR_REGISTRY: Lazy<RwLock<HashMap<String, AllocatorConstructor>>> =
    Lazy::new(|| {
        let mut registry: HashMap<String, AllocatorConstructor> = HashMap::new();
        registry.insert(
            ManualAllocator::ID.to_string(),
            Arc::new(|| -> Box<dyn Allocator> { Box::new(ManualAllocator) }),
        );
        registry.insert(
            RandomAllocator::ID.to_string(),
            Arc::new(|| -> Box<dyn Allocator> { Box::new(RandomAllocator) }),
        );
        registry.insert(
            ScheduledAllocator::ID.to_string(),
            Arc::new(|| -> Box<dyn Allocator> { Box::new(ScheduledAllocator) }),
        );
        RwLock::new(registry)
    });

static EVALUATOR_REGISTRY: Lazy<RwLock<HashMap<String, EvaluatorConstructor>>> =
    Lazy::new(|| {
        let mut registry: HashMap<String, EvaluatorConstructor> = HashMap::new();
        registry.insert(
            BestEvaluator::ID.to_string(),
            Arc::new(|settings: &serde_json::Value| -> Result<Box<dyn Evaluator>> {
                Ok(Box::new(BestEvaluator::from_settings(settings)?))
            }),
        );
        registry.insert(
            CommentsEvaluator::ID.to_string(),
            Arc::new(|_: &serde_json::Value| -> Result<Box<dyn Evaluator>> {
                Ok(Box::new(CommentsEvaluator))
            }),
        );
        RwLock::new(registry)
    });

fn checked_id<S: Into<String>>(id: S) -> Result<String> {
    let id = id.into();
    validate_plugin_id(&id).map_err(|e| WorkshopError::configuration(format!("{id}: {e}")))?;
    Ok(id)
}

pub fn register_grading_strategy<S: Into<String>>(
    id: S,
    constructor: GradingStrategyConstructor,
) -> Result<()> {
    let id = checked_id(id)?;
    GRADING_REGISTRY
        .write()
        .expect("Grading registry lock poisoned")
        .insert(id, constructor);
    Ok(())
}

pub fn register_allocator<S: Into<String>>(id: S, constructor: AllocatorConstructor) -> Result<()> {
    let id = checked_id(id)?;
    ALLOCATOR_REGISTRY
        .write()
        .expect("Allocator registry lock poisoned")
        .insert(id, constructor);
    Ok(())
}

pub fn register_evaluator<S: Into<String>>(id: S, constructor: EvaluatorConstructor) -> Result<()> {
    let id = checked_id(id)?;
    EVALUATOR_REGISTRY
        .write()
        .expect("Evaluator registry lock poisoned")
        .insert(id, constructor);
    Ok(())
}

/// 用给定表单构造评分策略
pub fn get_grading_strategy(id: &str, form: GradingForm) -> Option<Box<dyn GradingStrategy>> {
    let constructor = GRADING_REGISTRY
        .read()
        .expect("Grading registry lock poisoned")
        .get(id)
        .cloned()?;
    Some(constructor(form))
}

pub fn has_grading_strategy(id: &str) -> bool {
    GRADING_REGISTRY
        .read()
        .expect("Grading registry lock poisoned")
        .contains_key(id)
}

/// 全部分配器，手动分配排在最后
pub fn allocators() -> Vec<Box<dyn Allocator>> {
    let registry = ALLOCATOR_REGISTRY
        .read()
        .expect("Allocator registry lock poisoned");
    let mut ids: Vec<&String> = registry.keys().collect();
    ids.sort_by_key(|id| (id.as_str() == ManualAllocator::ID, id.as_str()));
    ids.into_iter().map(|id| registry[id]()).collect()
}

/// 用评价设置构造评价策略
pub fn create_evaluator(id: &str, settings: &serde_json::Value) -> Result<Box<dyn Evaluator>> {
    let constructor = EVALUATOR_REGISTRY
        .read()
        .expect("Evaluator registry lock poisoned")
        .get(id)
        .cloned()
        .ok_or_else(|| WorkshopError::strategy_not_found(format!("Evaluation method {id}")))?;
    constructor(settings)
}

pub fn has_evaluator(id: &str) -> bool {
    EVALUATOR_REGISTRY
        .read()
        .expect("Evaluator registry lock poisoned")
        .contains_key(id)
}

pub fn debug_strategy_registry() {
    fn dump<V>(kind: &str, registry: &RwLock<HashMap<String, V>>) {
        let registry = registry.read().expect("Strategy registry lock poisoned");
        let mut ids: Vec<&String> = registry.keys().collect();
        ids.sort();
        tracing::debug!("Registered {} plugins:", kind);
        for id in ids {
            tracing::debug!(" - {}", id);
        }
    }

    dump("grading", &GRADING_REGISTRY);
    dump("allocation", &ALLOCATOR_REGISTRY);
    dump("evaluation", &EVALUATOR_REGISTRY);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::allocation::entities::AllocationResult;
    use crate::models::workshops::entities::Workshop;
    use crate::storage::Storage;

    struct NoopAllocator;

    #[async_trait::async_trait]
    impl Allocator for NoopAllocator {
        fn id(&self) -> &'static str {
            "noop"
        }

        async fn init(
            &self,
            _storage: &dyn Storage,
            _workshop: &Workshop,
            _options: Option<&serde_json::Value>,
        ) -> Result<AllocationResult> {
            Ok(AllocationResult::void("noop"))
        }
    }

    #[test]
    fn test_builtins_registered() {
        for id in ["accumulative", "comments", "numerrors", "rubric"] {
            assert!(has_grading_strategy(id), "{id}");
        }
        assert!(has_evaluator("best"));
        assert!(has_evaluator("comments"));
        assert!(create_evaluator("median", &serde_json::Value::Null).is_err());
    }

    #[test]
    fn test_manual_runs_last() {
        register_allocator("noop", Arc::new(|| -> Box<dyn Allocator> { Box::new(NoopAllocator) })).unwrap();
        let ids: Vec<&str> = allocators().iter().map(|a| a.id()).collect();
        assert_eq!(ids.last(), Some(&"manual"));
        assert!(ids.contains(&"noop"));
        assert!(ids.contains(&"random"));
    }

    #[test]
    fn test_register_rejects_bad_id() {
        let result = register_allocator("Bad Id", Arc::new(|| -> Box<dyn Allocator> { Box::new(NoopAllocator) }));
        assert!(result.is_err());
    }

    #[test]
    fn test_grading_strategy_built_with_form() {
        let form = GradingForm {
            strategy: "rubric".to_string(),
            criteria: vec![],
            settings: serde_json::Value::Null,
        };
        let strategy = get_grading_strategy("rubric", form).unwrap();
        assert_eq!(strategy.id(), "rubric");
        assert!(!strategy.form_ready());
        assert!(get_grading_strategy("unknown", GradingForm {
            strategy: "unknown".to_string(),
            criteria: vec![],
            settings: serde_json::Value::Null,
        })
        .is_none());
    }
}
