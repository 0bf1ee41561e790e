//! 工作坊事件总线
//!
//! 核心操作完成后发布事件，订阅者（日志、抄袭检测等）自行消费。
//! 发布失败只记录日志，不影响操作本身。

use serde::Serialize;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use crate::models::allocation::entities::AllocationStatus;
use crate::models::evaluation::responses::AggregationSummary;
use crate::workflow::phase::Phase;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WorkshopEvent {
    PhaseChanged {
        workshop_id: i64,
        from: Phase,
        to: Phase,
        // 由截止时间触发
        automatic: bool,
        self_assessments_created: usize,
    },
    /// 同时作为抄袭检测的接入点
    SubmissionCreated {
        workshop_id: i64,
        submission_id: i64,
        author_id: Option<i64>,
        example: bool,
    },
    AssessmentGraded {
        workshop_id: i64,
        assessment_id: i64,
        submission_id: i64,
        reviewer_id: i64,
        grade: Option<f64>,
    },
    AllocationExecuted {
        workshop_id: i64,
        allocator: String,
        status: AllocationStatus,
        created: usize,
    },
    GradesAggregated {
        workshop_id: i64,
        summary: AggregationSummary,
    },
}

impl WorkshopEvent {
    pub fn workshop_id(&self) -> i64 {
        match self {
            WorkshopEvent::PhaseChanged { workshop_id, .. }
            | WorkshopEvent::SubmissionCreated { workshop_id, .. }
            | WorkshopEvent::AssessmentGraded { workshop_id, .. }
            | WorkshopEvent::AllocationExecuted { workshop_id, .. }
            | WorkshopEvent::GradesAggregated { workshop_id, .. } => *workshop_id,
        }
    }
}

#[derive(Clone)]
pub struct EventBus {
    sender: broadcast::Sender<WorkshopEvent>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<WorkshopEvent> {
        self.sender.subscribe()
    }

    pub fn receiver_count(&self) -> usize {
        self.sender.receiver_count()
    }

    pub fn publish(&self, event: WorkshopEvent) {
        debug!("Publishing workshop event: {:?}", event);
        if let Err(e) = self.sender.send(event) {
            // 没有订阅者
            debug!("Workshop event dropped: {:?}", e.0);
        }
    }
}

/// 把事件写入日志的后台订阅者
pub fn spawn_event_logger(bus: &EventBus) -> tokio::task::JoinHandle<()> {
    let mut receiver = bus.subscribe();
    tokio::spawn(async move {
        loop {
            match receiver.recv().await {
                Ok(event) => match serde_json::to_string(&event) {
                    Ok(json) => info!(workshop_id = event.workshop_id(), "workshop event: {json}"),
                    Err(e) => warn!("Failed to serialize workshop event: {e}"),
                },
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    warn!("Event logger lagged, {} event(s) skipped", n);
                }
                Err(broadcast::error::RecvError::Closed) => {
                    debug!("Event bus closed");
                    break;
                }
            }
        }
    })
}
