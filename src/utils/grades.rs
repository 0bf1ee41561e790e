//! 成绩数值工具
//!
//! 内部成绩统一为 0-100、保留 5 位小数，仅在展示时按工作坊满分换算。

/// 内部存储精度
pub const GRADE_PRECISION: i32 = 5;

fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

/// 保留 5 位小数
pub fn round_grade(value: f64) -> f64 {
    round_to(value, GRADE_PRECISION)
}

/// 四舍五入到指定小数位
pub fn round_decimals(value: f64, decimals: i32) -> f64 {
    round_to(value, decimals.clamp(0, GRADE_PRECISION))
}

/// 把 0-100 的内部成绩换算到 `max`，并按展示精度取整
pub fn rescale_grade(value: Option<f64>, max: f64, decimals: i32) -> Option<f64> {
    value.map(|v| round_decimals(v / 100.0 * max, decimals))
}

/// 限制在 [0, 100]
pub fn clamp_grade(value: f64) -> f64 {
    value.clamp(0.0, 100.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_grade_keeps_five_decimals() {
        assert_eq!(round_grade(66.666666666), 66.66667);
        assert_eq!(round_grade(50.0), 50.0);
    }

    #[test]
    fn test_rescale_grade() {
        assert_eq!(rescale_grade(Some(75.0), 80.0, 0), Some(60.0));
        assert_eq!(rescale_grade(Some(66.66667), 20.0, 2), Some(13.33));
        assert_eq!(rescale_grade(None, 80.0, 2), None);
    }

    #[test]
    fn test_clamp_grade() {
        assert_eq!(clamp_grade(-3.0), 0.0);
        assert_eq!(clamp_grade(103.0), 100.0);
        assert_eq!(clamp_grade(42.5), 42.5);
    }
}
