//! 评语评价：每条已评分评审的评审成绩均为满分

use super::{EvaluationInput, Evaluator, submission_grade};
use crate::models::evaluation::entities::{ReviewerGradingGrade, SubmissionEvaluation};

pub struct CommentsEvaluator;

impl CommentsEvaluator {
    pub const ID: &'static str = "comments";
}

impl Evaluator for CommentsEvaluator {
    fn id(&self) -> &'static str {
        Self::ID
    }

    fn evaluate(&self, input: &EvaluationInput<'_>) -> SubmissionEvaluation {
        let grading_grades = input
            .assessments
            .iter()
            .filter(|a| a.is_graded())
            .map(|a| ReviewerGradingGrade {
                assessment_id: a.assessment_id,
                reviewer_id: a.reviewer_id,
                grading_grade: 100.0,
            })
            .collect();

        SubmissionEvaluation {
            submission_grade: submission_grade(input.assessments),
            grading_grades,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::strategies::evaluation::tests::snapshot;

    #[test]
    fn test_graded_reviewers_get_full_grade() {
        let mut ungraded = snapshot(2, 11, 1, &[]);
        ungraded.grade = None;
        let assessments = [snapshot(1, 10, 1, &[]), ungraded];
        let result = CommentsEvaluator.evaluate(&EvaluationInput {
            dimensions: &[],
            assessments: &assessments,
        });
        assert_eq!(result.submission_grade, Some(50.0));
        assert_eq!(result.grading_grades.len(), 1);
        assert_eq!(result.grading_grades[0].reviewer_id, 10);
        assert_eq!(result.grading_grades[0].grading_grade, 100.0);
    }

    #[test]
    fn test_nothing_graded() {
        let mut ungraded = snapshot(1, 10, 1, &[]);
        ungraded.grade = None;
        let result = CommentsEvaluator.evaluate(&EvaluationInput {
            dimensions: &[],
            assessments: &[ungraded],
        });
        assert_eq!(result, SubmissionEvaluation::default());
    }
}
