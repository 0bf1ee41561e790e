//! 成绩报表
//!
//! 每位学生一行，列出其提交、收到与给出的评审。分组隔离模式下，
//! 没有跨组权限的用户只能看到自己所在分组。

use chrono::Utc;
use std::cmp::Ordering;
use std::collections::HashMap;

use super::WorkshopService;
use crate::errors::Result;
use crate::models::PaginationInfo;
use crate::models::assessments::entities::Assessment;
use crate::models::context::{Capability, RequestContext};
use crate::models::participants::entities::{Participant, ParticipantRole};
use crate::models::report::{
    requests::{GradingReportQuery, ReportSortKey, SortDirection},
    responses::{GradingReport, GradingReportRow, ReportAssessment, ReportSubmission},
};
use crate::models::submissions::entities::Submission;
use crate::models::workshops::entities::{GroupMode, Workshop};
use crate::utils::grades::rescale_grade;

/// 请求者在报表中可见的范围
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Visibility {
    /// 按分组过滤，`None` 表示全部参与者
    Group(Option<i64>),
    Nothing,
}

fn visible_group(
    workshop: &Workshop,
    ctx: &RequestContext,
    participants: &[Participant],
    requested: Option<i64>,
) -> Visibility {
    if workshop.group_mode != GroupMode::SeparateGroups || ctx.has(Capability::AccessAllGroups) {
        return Visibility::Group(requested);
    }
    let own = participants
        .iter()
        .find(|p| p.user_id == ctx.user_id)
        .and_then(|p| p.group_id);
    match (own, requested) {
        (None, _) => Visibility::Nothing,
        (Some(own), Some(group)) if group != own => Visibility::Nothing,
        (Some(own), _) => Visibility::Group(Some(own)),
    }
}

fn compare_options<T: PartialOrd>(a: Option<T>, b: Option<T>) -> Ordering {
    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
        (Some(a), Some(b)) => a.partial_cmp(&b).unwrap_or(Ordering::Equal),
    }
}

fn compare_rows(key: ReportSortKey, a: &GradingReportRow, b: &GradingReportRow) -> Ordering {
    match key {
        ReportSortKey::Lastname => a.lastname.to_lowercase().cmp(&b.lastname.to_lowercase()),
        ReportSortKey::Firstname => a.firstname.to_lowercase().cmp(&b.firstname.to_lowercase()),
        ReportSortKey::SubmissionTitle => compare_options(
            a.submission.as_ref().map(|s| s.title.to_lowercase()),
            b.submission.as_ref().map(|s| s.title.to_lowercase()),
        ),
        ReportSortKey::SubmissionModified => compare_options(
            a.submission.as_ref().map(|s| s.modified_at),
            b.submission.as_ref().map(|s| s.modified_at),
        ),
        ReportSortKey::SubmissionGrade => compare_options(
            a.submission.as_ref().and_then(|s| s.grade_over.or(s.grade)),
            b.submission.as_ref().and_then(|s| s.grade_over.or(s.grade)),
        ),
        ReportSortKey::GradingGrade => compare_options(a.grading_grade, b.grading_grade),
    }
}

pub async fn grading_report(
    service: &WorkshopService,
    ctx: &RequestContext,
    workshop_id: i64,
    query: GradingReportQuery,
) -> Result<GradingReport> {
    let workshop = service.current_workshop(workshop_id, Utc::now()).await?;
    let storage = service.storage();
    let (page, per_page) = query.normalized();

    let participants = storage.list_participants(workshop_id).await?;
    let Visibility::Group(group) = visible_group(&workshop, ctx, &participants, query.group_id) else {
        return Ok(GradingReport {
            total_count: 0,
            max_grade: workshop.grade,
            max_grading_grade: workshop.grading_grade,
            pagination: PaginationInfo::new(page, per_page, 0),
            rows: vec![],
        });
    };

    let submissions = storage.list_submissions(workshop_id, false).await?;
    let assessments = storage.list_workshop_assessments(workshop_id).await?;
    let aggregations = storage.list_aggregations(workshop_id).await?;
    let by_author: HashMap<i64, &Submission> = submissions
        .iter()
        .filter_map(|s| s.author_id.map(|author| (author, s)))
        .collect();
    let by_id: HashMap<i64, &Submission> = submissions.iter().map(|s| (s.id, s)).collect();
    let show_reviewers = ctx.has(Capability::ViewReviewerNames);

    let report_assessment = |a: &Assessment, counterpart_id: Option<i64>| ReportAssessment {
        assessment_id: a.id,
        submission_id: a.submission_id,
        counterpart_id,
        weight: a.weight,
        grade: rescale_grade(a.grade, workshop.grade, workshop.grade_decimals),
        grading_grade: rescale_grade(
            a.grading_grade,
            workshop.grading_grade,
            workshop.grade_decimals,
        ),
        grading_grade_over: rescale_grade(
            a.grading_grade_over,
            workshop.grading_grade,
            workshop.grade_decimals,
        ),
    };

    let mut rows: Vec<GradingReportRow> = participants
        .iter()
        .filter(|p| p.role == ParticipantRole::Student)
        .filter(|p| group.is_none_or(|g| p.group_id == Some(g)))
        .map(|p| {
            let submission = by_author.get(&p.user_id).copied();
            let reviewed_by = submission
                .map(|s| {
                    assessments
                        .iter()
                        .filter(|a| a.submission_id == s.id)
                        .map(|a| report_assessment(a, show_reviewers.then_some(a.reviewer_id)))
                        .collect()
                })
                .unwrap_or_default();
            let reviewer_of = assessments
                .iter()
                .filter(|a| a.reviewer_id == p.user_id)
                .map(|a| {
                    let author = by_id.get(&a.submission_id).and_then(|s| s.author_id);
                    report_assessment(a, author)
                })
                .collect();
            GradingReportRow {
                user_id: p.user_id,
                firstname: p.firstname.clone(),
                lastname: p.lastname.clone(),
                submission: submission.map(|s| ReportSubmission {
                    id: s.id,
                    title: s.title.clone(),
                    modified_at: s.modified_at,
                    published: s.published,
                    late: s.late,
                    grade: rescale_grade(s.grade, workshop.grade, workshop.grade_decimals),
                    grade_over: rescale_grade(s.grade_over, workshop.grade, workshop.grade_decimals),
                }),
                reviewed_by,
                reviewer_of,
                grading_grade: rescale_grade(
                    aggregations.get(&p.user_id).copied().flatten(),
                    workshop.grading_grade,
                    workshop.grade_decimals,
                ),
            }
        })
        .collect();

    rows.sort_by(|a, b| {
        let ordering = compare_rows(query.sort_by, a, b);
        let ordering = match query.sort_dir {
            SortDirection::Asc => ordering,
            SortDirection::Desc => ordering.reverse(),
        };
        ordering.then(a.user_id.cmp(&b.user_id))
    });

    let total_count = rows.len() as i64;
    // 超大页码直接越过末尾
    let offset = usize::try_from((page - 1).saturating_mul(per_page)).unwrap_or(usize::MAX);
    let rows: Vec<GradingReportRow> = rows.into_iter().skip(offset).take(per_page as usize).collect();

    Ok(GradingReport {
        total_count,
        max_grade: workshop.grade,
        max_grading_grade: workshop.grading_grade,
        pagination: PaginationInfo::new(page, per_page, total_count),
        rows,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::participants::requests::SyncParticipantsRequest;
    use crate::services::tests::{seeded, submit_all, teacher};
    use crate::storage::sea_orm_storage::tests::student as roster_entry;

    async fn grouped() -> (WorkshopService, Workshop) {
        let (service, mut workshop) = seeded(&[]).await;
        workshop.group_mode = GroupMode::SeparateGroups;
        service.storage().update_workshop(&workshop).await.unwrap();
        let req = SyncParticipantsRequest {
            participants: vec![
                roster_entry(1, Some(10)),
                roster_entry(2, Some(10)),
                roster_entry(3, Some(20)),
                roster_entry(4, None),
            ],
        };
        service.sync_participants(&teacher(), workshop.id, req).await.unwrap();
        (service, workshop)
    }

    fn query(group_id: Option<i64>) -> GradingReportQuery {
        GradingReportQuery {
            group_id,
            ..GradingReportQuery::default()
        }
    }

    fn user_ids(report: &GradingReport) -> Vec<i64> {
        report.rows.iter().map(|r| r.user_id).collect()
    }

    #[tokio::test]
    async fn test_separate_groups_limit_visibility() {
        let (service, workshop) = grouped().await;
        let member = RequestContext::new(1, [Capability::Submit]);

        let own = service.grading_report(&member, workshop.id, query(None)).await.unwrap();
        assert_eq!(user_ids(&own), vec![1, 2]);

        let other = service.grading_report(&member, workshop.id, query(Some(20))).await.unwrap();
        assert_eq!(other.total_count, 0);
        assert!(other.rows.is_empty());

        // 未分组的用户什么都看不到
        let loner = RequestContext::new(4, [Capability::Submit]);
        let nothing = service.grading_report(&loner, workshop.id, query(None)).await.unwrap();
        assert_eq!(nothing.total_count, 0);

        let all = service.grading_report(&teacher(), workshop.id, query(None)).await.unwrap();
        assert_eq!(user_ids(&all), vec![1, 2, 3, 4]);
        let filtered = service.grading_report(&teacher(), workshop.id, query(Some(20))).await.unwrap();
        assert_eq!(user_ids(&filtered), vec![3]);
    }

    #[tokio::test]
    async fn test_reviewer_names_hidden_without_capability() {
        let (service, workshop) = seeded(&[1, 2]).await;
        let submissions = submit_all(&service, &workshop, &[1]).await;
        service.storage().add_allocation(submissions[0].id, 2, 1).await.unwrap();

        let student = RequestContext::new(1, [Capability::Submit]);
        let report = service.grading_report(&student, workshop.id, query(None)).await.unwrap();
        let row = report.rows.iter().find(|r| r.user_id == 1).unwrap();
        assert_eq!(row.reviewed_by[0].counterpart_id, None);
        let reviewer = report.rows.iter().find(|r| r.user_id == 2).unwrap();
        assert_eq!(reviewer.reviewer_of[0].counterpart_id, Some(1));

        let report = service.grading_report(&teacher(), workshop.id, query(None)).await.unwrap();
        let row = report.rows.iter().find(|r| r.user_id == 1).unwrap();
        assert_eq!(row.reviewed_by[0].counterpart_id, Some(2));
    }

    #[tokio::test]
    async fn test_sort_and_paginate() {
        let (service, workshop) = seeded(&[1, 2, 3]).await;
        submit_all(&service, &workshop, &[2]).await;

        let req = GradingReportQuery {
            sort_by: ReportSortKey::SubmissionTitle,
            sort_dir: SortDirection::Desc,
            per_page: 2,
            ..GradingReportQuery::default()
        };
        let first = service.grading_report(&teacher(), workshop.id, req.clone()).await.unwrap();
        // 有提交的排在前面，其余按用户 ID
        assert_eq!(user_ids(&first), vec![2, 1]);
        assert_eq!(first.total_count, 3);
        assert_eq!(first.pagination.total_pages, 2);

        let second = service
            .grading_report(&teacher(), workshop.id, GradingReportQuery { page: 2, ..req })
            .await
            .unwrap();
        assert_eq!(user_ids(&second), vec![3]);
    }

    #[tokio::test]
    async fn test_page_past_the_end_is_empty() {
        let (service, workshop) = seeded(&[1, 2]).await;
        let req = GradingReportQuery {
            page: i64::MAX,
            per_page: GradingReportQuery::MAX_PER_PAGE,
            ..GradingReportQuery::default()
        };
        let report = service.grading_report(&teacher(), workshop.id, req).await.unwrap();
        assert_eq!(report.total_count, 2);
        assert!(report.rows.is_empty());
        assert_eq!(report.pagination.page, i64::MAX);
    }

    #[tokio::test]
    async fn test_visible_group_scopes() {
        let (service, workshop) = grouped().await;
        let workshop = service.load_workshop(workshop.id).await.unwrap();
        let participants = service.storage().list_participants(workshop.id).await.unwrap();
        let member = RequestContext::new(1, [Capability::Submit]);
        let loner = RequestContext::new(4, [Capability::Submit]);

        assert_eq!(
            visible_group(&workshop, &member, &participants, None),
            Visibility::Group(Some(10))
        );
        assert_eq!(
            visible_group(&workshop, &member, &participants, Some(20)),
            Visibility::Nothing
        );
        assert_eq!(visible_group(&workshop, &loner, &participants, None), Visibility::Nothing);
        assert_eq!(
            visible_group(&workshop, &teacher(), &participants, None),
            Visibility::Group(None)
        );
    }
}
