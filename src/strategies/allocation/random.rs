//! 随机分配
//!
//! 按负载最小优先、同负载随机的方式为提交挑选评审者（或为评审者挑选提交），
//! 不会把作者分配给自己的提交，也不会重复已有的配对。

use std::collections::{HashMap, HashSet};

use rand::{SeedableRng, rngs::StdRng, seq::SliceRandom};
use tracing::info;

use super::{Allocator, parse_options};
use crate::errors::Result;
use crate::models::allocation::entities::{
    AllocatedPair, AllocationResult, AllocationStatus, NumPer, RandomAllocationSettings,
};
use crate::models::participants::entities::ParticipantRole;
use crate::models::workshops::entities::Workshop;
use crate::storage::Storage;

pub struct RandomAllocator;

/// 待分配的提交
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubmissionSlot {
    pub submission_id: i64,
    pub author_id: i64,
    pub group_id: Option<i64>,
}

/// 候选评审者
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReviewerSlot {
    pub user_id: i64,
    pub group_id: Option<i64>,
}

fn same_group(a: Option<i64>, b: Option<i64>) -> bool {
    a.is_some() && a == b
}

/// 计算新配对 (submission_id, reviewer_id)
///
/// `existing` 为已有配对，已有的同伴配对计入负载。
pub fn plan_allocations(
    settings: &RandomAllocationSettings,
    submissions: &[SubmissionSlot],
    reviewers: &[ReviewerSlot],
    existing: &HashSet<(i64, i64)>,
    rng: &mut StdRng,
) -> Vec<(i64, i64)> {
    let target = settings.num_of_reviews.max(0) as usize;
    let mut taken: HashSet<(i64, i64)> = existing.clone();
    let mut submission_load: HashMap<i64, usize> = HashMap::new();
    let mut reviewer_load: HashMap<i64, usize> = HashMap::new();

    let authors: HashMap<i64, i64> = submissions
        .iter()
        .map(|s| (s.submission_id, s.author_id))
        .collect();
    for (submission_id, reviewer_id) in existing {
        if authors.get(submission_id).is_some_and(|a| a != reviewer_id) {
            *submission_load.entry(*submission_id).or_default() += 1;
            *reviewer_load.entry(*reviewer_id).or_default() += 1;
        }
    }

    let allowed = |s: &SubmissionSlot, r: &ReviewerSlot, taken: &HashSet<(i64, i64)>| {
        r.user_id != s.author_id
            && !taken.contains(&(s.submission_id, r.user_id))
            && !(settings.exclude_same_group && same_group(s.group_id, r.group_id))
    };

    let mut planned = Vec::new();

    match settings.num_per {
        NumPer::PerSubmission => {
            let mut order = submissions.to_vec();
            order.shuffle(rng);
            for _ in 0..target {
                for slot in &order {
                    if submission_load.get(&slot.submission_id).copied().unwrap_or(0) >= target {
                        continue;
                    }
                    let mut candidates: Vec<&ReviewerSlot> =
                        reviewers.iter().filter(|r| allowed(slot, r, &taken)).collect();
                    candidates.shuffle(rng);
                    let Some(reviewer) = candidates
                        .into_iter()
                        .min_by_key(|r| reviewer_load.get(&r.user_id).copied().unwrap_or(0))
                    else {
                        continue;
                    };
                    taken.insert((slot.submission_id, reviewer.user_id));
                    *submission_load.entry(slot.submission_id).or_default() += 1;
                    *reviewer_load.entry(reviewer.user_id).or_default() += 1;
                    planned.push((slot.submission_id, reviewer.user_id));
                }
            }
        }
        NumPer::PerReviewer => {
            let mut order = reviewers.to_vec();
            order.shuffle(rng);
            for _ in 0..target {
                for reviewer in &order {
                    if reviewer_load.get(&reviewer.user_id).copied().unwrap_or(0) >= target {
                        continue;
                    }
                    let mut candidates: Vec<&SubmissionSlot> = submissions
                        .iter()
                        .filter(|s| allowed(s, reviewer, &taken))
                        .collect();
                    candidates.shuffle(rng);
                    let Some(slot) = candidates.into_iter().min_by_key(|s| {
                        submission_load.get(&s.submission_id).copied().unwrap_or(0)
                    }) else {
                        continue;
                    };
                    taken.insert((slot.submission_id, reviewer.user_id));
                    *submission_load.entry(slot.submission_id).or_default() += 1;
                    *reviewer_load.entry(reviewer.user_id).or_default() += 1;
                    planned.push((slot.submission_id, reviewer.user_id));
                }
            }
        }
    }

    if settings.add_self_assessment {
        for slot in submissions {
            if taken.insert((slot.submission_id, slot.author_id)) {
                planned.push((slot.submission_id, slot.author_id));
            }
        }
    }

    planned
}

impl RandomAllocator {
    pub const ID: &'static str = "random";

    fn error(message: impl Into<String>) -> AllocationResult {
        AllocationResult::new(Self::ID, AllocationStatus::Error).with_message(message)
    }

    /// 按给定设置执行一次随机分配，定时分配也复用这里
    pub async fn allocate(
        storage: &dyn Storage,
        workshop: &Workshop,
        settings: &RandomAllocationSettings,
        allocator: &str,
    ) -> Result<AllocationResult> {
        if !workshop.assessment_type.includes_peers() {
            return Ok(Self::error("Peer assessment is not used in this workshop"));
        }
        if settings.num_of_reviews < 1 {
            return Ok(Self::error("Number of reviews must be at least 1"));
        }

        let submissions = storage.list_submissions(workshop.id, false).await?;
        if submissions.is_empty() {
            return Ok(Self::error("There are no submissions to allocate"));
        }

        let mut result = AllocationResult::new(allocator, AllocationStatus::Ok);

        if settings.remove_current {
            let removed = storage.delete_ungraded_peer_allocations(workshop.id).await?;
            result
                .log
                .push(format!("Removed {removed} ungraded allocation(s)"));
        }

        let participants = storage.list_participants(workshop.id).await?;
        let groups: HashMap<i64, Option<i64>> =
            participants.iter().map(|p| (p.user_id, p.group_id)).collect();
        let authors: HashSet<i64> = submissions.iter().filter_map(|s| s.author_id).collect();

        let slots: Vec<SubmissionSlot> = submissions
            .iter()
            .filter_map(|s| {
                let author_id = s.author_id?;
                Some(SubmissionSlot {
                    submission_id: s.id,
                    author_id,
                    group_id: groups.get(&author_id).copied().flatten(),
                })
            })
            .collect();
        let assess_without_submission =
            settings.assess_without_submission || workshop.assess_without_submission;
        let reviewers: Vec<ReviewerSlot> = participants
            .iter()
            .filter(|p| p.role == ParticipantRole::Student)
            .filter(|p| assess_without_submission || authors.contains(&p.user_id))
            .map(|p| ReviewerSlot {
                user_id: p.user_id,
                group_id: p.group_id,
            })
            .collect();

        let existing: HashSet<(i64, i64)> = storage
            .list_workshop_assessments(workshop.id)
            .await?
            .into_iter()
            .map(|a| (a.submission_id, a.reviewer_id))
            .collect();

        let planned = {
            let mut rng = match settings.seed {
                Some(seed) => StdRng::seed_from_u64(seed),
                None => StdRng::from_os_rng(),
            };
            plan_allocations(settings, &slots, &reviewers, &existing, &mut rng)
        };

        for (submission_id, reviewer_id) in planned {
            let (assessment, created) = storage
                .add_allocation(submission_id, reviewer_id, 1)
                .await?;
            if created {
                result.log.push(format!(
                    "Reviewer {reviewer_id} allocated to submission {submission_id}"
                ));
                result.created.push(AllocatedPair {
                    assessment_id: assessment.id,
                    submission_id,
                    reviewer_id,
                });
            }
        }

        // 未达到目标数量的提交
        if settings.num_per == NumPer::PerSubmission {
            let mut load: HashMap<i64, usize> = HashMap::new();
            let pairs = existing
                .iter()
                .copied()
                .chain(result.created.iter().map(|p| (p.submission_id, p.reviewer_id)));
            for (submission_id, reviewer_id) in pairs {
                if slots
                    .iter()
                    .any(|s| s.submission_id == submission_id && s.author_id != reviewer_id)
                {
                    *load.entry(submission_id).or_default() += 1;
                }
            }
            let short = slots
                .iter()
                .filter(|s| {
                    load.get(&s.submission_id).copied().unwrap_or(0)
                        < settings.num_of_reviews as usize
                })
                .count();
            if short > 0 {
                result
                    .log
                    .push(format!("{short} submission(s) could not get enough reviewers"));
            }
        }

        let created = result.created.len();
        info!(
            "Random allocation for workshop {} created {} allocation(s)",
            workshop.id, created
        );
        Ok(result.with_message(format!("{created} allocation(s) created")))
    }
}

#[async_trait::async_trait]
impl Allocator for RandomAllocator {
    fn id(&self) -> &'static str {
        Self::ID
    }

    async fn init(
        &self,
        storage: &dyn Storage,
        workshop: &Workshop,
        options: Option<&serde_json::Value>,
    ) -> Result<AllocationResult> {
        let Some(options) = options else {
            return Ok(AllocationResult::void(Self::ID));
        };
        let settings = match parse_options::<RandomAllocationSettings>(Self::ID, options) {
            Ok(settings) => settings,
            Err(result) => return Ok(result),
        };
        Self::allocate(storage, workshop, &settings, Self::ID).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings(num_of_reviews: i32, num_per: NumPer) -> RandomAllocationSettings {
        RandomAllocationSettings {
            num_of_reviews,
            num_per,
            exclude_same_group: false,
            remove_current: false,
            assess_without_submission: false,
            add_self_assessment: false,
            seed: Some(7),
        }
    }

    fn slots(authors: &[(i64, Option<i64>)]) -> (Vec<SubmissionSlot>, Vec<ReviewerSlot>) {
        let submissions = authors
            .iter()
            .map(|(author, group)| SubmissionSlot {
                submission_id: author * 100,
                author_id: *author,
                group_id: *group,
            })
            .collect();
        let reviewers = authors
            .iter()
            .map(|(author, group)| ReviewerSlot {
                user_id: *author,
                group_id: *group,
            })
            .collect();
        (submissions, reviewers)
    }

    fn plan(
        settings: &RandomAllocationSettings,
        submissions: &[SubmissionSlot],
        reviewers: &[ReviewerSlot],
        existing: &HashSet<(i64, i64)>,
    ) -> Vec<(i64, i64)> {
        let mut rng = StdRng::seed_from_u64(settings.seed.unwrap_or(0));
        plan_allocations(settings, submissions, reviewers, existing, &mut rng)
    }

    #[test]
    fn test_per_submission_balanced_and_no_self() {
        let (submissions, reviewers) = slots(&[(1, None), (2, None), (3, None), (4, None)]);
        let pairs = plan(&settings(2, NumPer::PerSubmission), &submissions, &reviewers, &HashSet::new());

        assert_eq!(pairs.len(), 8);
        for s in &submissions {
            let count = pairs.iter().filter(|(sid, _)| *sid == s.submission_id).count();
            assert_eq!(count, 2);
        }
        // 负载最小优先，每位评审者至少分到一份
        for r in &reviewers {
            let count = pairs.iter().filter(|(_, rid)| *rid == r.user_id).count();
            assert!((1..=3).contains(&count));
        }
        assert!(pairs.iter().all(|(sid, rid)| sid / 100 != *rid));
        let unique: HashSet<_> = pairs.iter().collect();
        assert_eq!(unique.len(), pairs.len());
    }

    #[test]
    fn test_per_reviewer() {
        let (submissions, reviewers) = slots(&[(1, None), (2, None), (3, None)]);
        let pairs = plan(&settings(1, NumPer::PerReviewer), &submissions, &reviewers, &HashSet::new());
        assert_eq!(pairs.len(), 3);
        for r in &reviewers {
            assert_eq!(pairs.iter().filter(|(_, rid)| *rid == r.user_id).count(), 1);
        }
    }

    #[test]
    fn test_existing_pairs_count_and_are_not_repeated() {
        let (submissions, reviewers) = slots(&[(1, None), (2, None), (3, None)]);
        let existing: HashSet<(i64, i64)> = [(100, 2)].into_iter().collect();
        let pairs = plan(&settings(1, NumPer::PerSubmission), &submissions, &reviewers, &existing);
        assert!(!pairs.contains(&(100, 2)));
        // 提交 100 已经有一位评审者
        assert!(pairs.iter().all(|(sid, _)| *sid != 100));
        assert_eq!(pairs.len(), 2);
    }

    #[test]
    fn test_exclude_same_group() {
        let (submissions, reviewers) =
            slots(&[(1, Some(10)), (2, Some(10)), (3, Some(20)), (4, Some(20))]);
        let mut s = settings(2, NumPer::PerSubmission);
        s.exclude_same_group = true;
        let pairs = plan(&s, &submissions, &reviewers, &HashSet::new());
        let group = |user: i64| if user <= 2 { 10 } else { 20 };
        assert!(pairs.iter().all(|(sid, rid)| group(sid / 100) != group(*rid)));
        assert_eq!(pairs.len(), 8);
    }

    #[test]
    fn test_add_self_assessment() {
        let (submissions, reviewers) = slots(&[(1, None), (2, None)]);
        let mut s = settings(1, NumPer::PerSubmission);
        s.add_self_assessment = true;
        let pairs = plan(&s, &submissions, &reviewers, &HashSet::new());
        assert!(pairs.contains(&(100, 1)));
        assert!(pairs.contains(&(200, 2)));
        assert_eq!(pairs.len(), 4);
    }

    #[test]
    fn test_seed_is_reproducible() {
        let (submissions, reviewers) = slots(&[(1, None), (2, None), (3, None), (4, None), (5, None)]);
        let s = settings(2, NumPer::PerSubmission);
        assert_eq!(
            plan(&s, &submissions, &reviewers, &HashSet::new()),
            plan(&s, &submissions, &reviewers, &HashSet::new())
        );
    }
}
