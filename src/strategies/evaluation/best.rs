//! best 评价策略
//!
//! 先把各维度得分归一到 0-100，求加权平均评审与各维度的加权方差，
//! 距离平均评审最近的评审视为最佳评审，其余评审按与最佳评审的最小距离扣分。

use std::collections::HashMap;

use super::{AssessmentSnapshot, EvaluationInput, Evaluator, submission_grade};
use crate::errors::{Result, WorkshopError};
use crate::models::evaluation::entities::{
    BestEvaluationSettings, ReviewerGradingGrade, SubmissionEvaluation,
};
use crate::models::grading::entities::Dimension;
use crate::utils::grades::{clamp_grade, round_grade};

// 方差的下限，避免接近 0 的方差放大微小差异
const MIN_VARIANCE: f64 = 0.01;

type DimensionGrades = HashMap<i64, f64>;

pub struct BestEvaluator {
    settings: BestEvaluationSettings,
}

impl BestEvaluator {
    pub const ID: &'static str = "best";

    pub fn new(settings: BestEvaluationSettings) -> Self {
        Self { settings }
    }

    /// 从工作坊的评价设置构造，空设置取默认值
    pub fn from_settings(raw: &serde_json::Value) -> Result<Self> {
        let settings = if raw.is_null() {
            BestEvaluationSettings::default()
        } else {
            serde_json::from_value::<BestEvaluationSettings>(raw.clone()).map_err(|e| {
                WorkshopError::configuration(format!("Invalid best evaluation settings: {e}"))
            })?
        };
        if !BestEvaluationSettings::LEVELS.contains(&settings.comparison) {
            return Err(WorkshopError::configuration(format!(
                "Comparison level must be one of {:?}, got {}",
                BestEvaluationSettings::LEVELS,
                settings.comparison
            )));
        }
        Ok(Self::new(settings))
    }

    fn normalize(assessment: &AssessmentSnapshot, dimensions: &[Dimension]) -> DimensionGrades {
        dimensions
            .iter()
            .filter_map(|dim| {
                let raw = *assessment.scores.get(&dim.dimension_id)?;
                let value = if dim.max == dim.min {
                    100.0
                } else {
                    (raw - dim.min) / (dim.max - dim.min) * 100.0
                };
                Some((dim.dimension_id, value))
            })
            .collect()
    }

    /// 按评审权重求平均评审，总权重为 0 时返回 None
    fn average(
        assessments: &[&AssessmentSnapshot],
        grades: &[DimensionGrades],
        dimensions: &[Dimension],
    ) -> Option<DimensionGrades> {
        let total_weight: i64 = assessments.iter().map(|a| i64::from(a.weight.max(0))).sum();
        if total_weight == 0 {
            return None;
        }

        let mut average = DimensionGrades::new();
        for dim in dimensions {
            let (sum, weights) = assessments.iter().zip(grades).fold(
                (0.0, 0.0),
                |(sum, weights), (assessment, grades)| match grades.get(&dim.dimension_id) {
                    Some(value) if assessment.weight > 0 => {
                        let w = f64::from(assessment.weight);
                        (sum + value * w, weights + w)
                    }
                    _ => (sum, weights),
                },
            );
            if weights > 0.0 {
                average.insert(dim.dimension_id, sum / weights);
            }
        }
        Some(average)
    }

    /// 各维度的加权总体方差
    fn variances(
        assessments: &[&AssessmentSnapshot],
        grades: &[DimensionGrades],
        average: &DimensionGrades,
    ) -> DimensionGrades {
        average
            .iter()
            .map(|(dimension_id, mean)| {
                let (sum, weights) = assessments.iter().zip(grades).fold(
                    (0.0, 0.0),
                    |(sum, weights), (assessment, grades)| match grades.get(dimension_id) {
                        Some(value) if assessment.weight > 0 => {
                            let w = f64::from(assessment.weight);
                            (sum + w * (value - mean).powi(2), weights + w)
                        }
                        _ => (sum, weights),
                    },
                );
                let variance = if weights > 0.0 { sum / weights } else { 0.0 };
                (*dimension_id, variance)
            })
            .collect()
    }

    /// 两份评审的距离，保留 4 位小数；没有可比较的维度时返回 None
    fn distance(
        &self,
        assessment: &DimensionGrades,
        reference: &DimensionGrades,
        dimensions: &[Dimension],
        variances: &DimensionGrades,
    ) -> Option<f64> {
        let comparison = f64::from(self.settings.comparison);
        let mut distance = 0.0;
        let mut weights = 0.0;

        for dim in dimensions {
            let (Some(a), Some(r)) = (
                assessment.get(&dim.dimension_id),
                reference.get(&dim.dimension_id),
            ) else {
                continue;
            };
            weights += dim.weight;
            if a != r {
                let variance = variances
                    .get(&dim.dimension_id)
                    .copied()
                    .unwrap_or(0.0)
                    .max(MIN_VARIANCE);
                let delta = a - r;
                let relative = delta.powi(2) / (comparison * variance);
                distance += delta.abs() * relative * dim.weight;
            }
        }

        if weights > 0.0 {
            Some((distance / weights * 10_000.0).round() / 10_000.0)
        } else {
            None
        }
    }
}

impl Evaluator for BestEvaluator {
    fn id(&self) -> &'static str {
        Self::ID
    }

    fn evaluate(&self, input: &EvaluationInput<'_>) -> SubmissionEvaluation {
        let mut evaluation = SubmissionEvaluation {
            submission_grade: submission_grade(input.assessments),
            grading_grades: Vec::new(),
        };

        let graded: Vec<&AssessmentSnapshot> =
            input.assessments.iter().filter(|a| a.is_graded()).collect();
        if graded.is_empty() {
            return evaluation;
        }

        let grades: Vec<DimensionGrades> = graded
            .iter()
            .map(|a| Self::normalize(a, input.dimensions))
            .collect();
        let Some(average) = Self::average(&graded, &grades, input.dimensions) else {
            return evaluation;
        };
        let variances = Self::variances(&graded, &grades, &average);

        // 没有可比较维度时距离按 0 处理
        let distances: Vec<f64> = grades
            .iter()
            .map(|g| {
                self.distance(g, &average, input.dimensions, &variances)
                    .unwrap_or(0.0)
            })
            .collect();
        let best_distance = distances.iter().copied().fold(f64::INFINITY, f64::min);
        let best: Vec<usize> = distances
            .iter()
            .enumerate()
            .filter(|(_, d)| **d == best_distance)
            .map(|(i, _)| i)
            .collect();

        for (i, assessment) in graded.iter().enumerate() {
            let grading_grade = if best.contains(&i) {
                100.0
            } else {
                let nearest = best
                    .iter()
                    .map(|b| {
                        self.distance(&grades[i], &grades[*b], input.dimensions, &variances)
                            .unwrap_or(0.0)
                    })
                    .fold(f64::INFINITY, f64::min);
                clamp_grade(100.0 - nearest)
            };
            evaluation.grading_grades.push(ReviewerGradingGrade {
                assessment_id: assessment.assessment_id,
                reviewer_id: assessment.reviewer_id,
                grading_grade: round_grade(grading_grade),
            });
        }

        evaluation
    }
}
