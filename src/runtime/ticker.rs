//! 截止时间巡检
//!
//! 定期找出提交截止已过、仍停留在提交阶段的工作坊并调用 `advance_if_due`，
//! 让定时分配与自动切换不依赖页面访问。

use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::errors::Result;
use crate::services::WorkshopService;
use crate::workflow::phase::AdvanceOutcome;

/// 执行一轮巡检，返回本轮完成切换的工作坊数
pub async fn tick(service: &WorkshopService) -> Result<usize> {
    let now = Utc::now();
    let due = service
        .storage()
        .list_workshops_past_submission_end(now.timestamp())
        .await?;
    debug!("Ticker found {} workshop(s) past submission end", due.len());

    let mut advanced = 0;
    for workshop_id in due {
        match service.advance_if_due(workshop_id, now).await {
            Ok(AdvanceOutcome::Advanced) => {
                info!("Workshop {} advanced by ticker", workshop_id);
                advanced += 1;
            }
            Ok(_) => {}
            Err(err) => warn!("Ticker failed on workshop {}: {}", workshop_id, err.format_simple()),
        }
    }
    Ok(advanced)
}

pub fn spawn_ticker(service: Arc<WorkshopService>, interval: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut timer = tokio::time::interval(interval);
        timer.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        loop {
            timer.tick().await;
            if let Err(err) = tick(&service).await {
                warn!("Ticker round failed: {}", err.format_simple());
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::tests::{seeded, submit_all};
    use crate::workflow::phase::Phase;

    #[tokio::test]
    async fn test_tick_advances_due_workshop() {
        let (service, mut workshop) = seeded(&[1, 2]).await;
        submit_all(&service, &workshop, &[1, 2]).await;
        workshop.submission_end = Some(Utc::now() - chrono::Duration::minutes(1));
        workshop.phase_switch_assessment = true;
        service.storage().update_workshop(&workshop).await.unwrap();

        assert_eq!(tick(&service).await.unwrap(), 1);
        let reloaded = service.storage().get_workshop(workshop.id).await.unwrap().unwrap();
        assert_eq!(reloaded.phase, Phase::Assessment);

        // 第二轮无事可做
        assert_eq!(tick(&service).await.unwrap(), 0);
    }
}
