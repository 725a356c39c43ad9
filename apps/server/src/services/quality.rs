//! Test-quality scoring.
//!
//! Every quality figure the server reports (API, CSV export, offline
//! recompute) goes through [`score_cases`], so the weights live in one place.

use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::models::{TestCase, TestCaseStatus};

/// Reported instead of a score when there are no cases.
pub const NOT_APPLICABLE: f64 = -1.0;

const COVERAGE_WEIGHT: f64 = 0.35;
const EFFECTIVENESS_WEIGHT: f64 = 0.35;
const DEFECT_WEIGHT: f64 = 0.20;
const DIVERSITY_WEIGHT: f64 = 0.10;
/// Diversity points per distinct test type; saturates at five types.
const POINTS_PER_TEST_TYPE: f64 = 20.0;

/// The inputs the score needs from one test case.
#[derive(Debug, Clone, PartialEq)]
pub struct CaseSummary {
    pub executed: bool,
    pub successful: bool,
    pub defect_count: usize,
    pub test_type: String,
}

impl From<&TestCase> for CaseSummary {
    fn from(case: &TestCase) -> Self {
        Self {
            executed: case.status.is_executed(),
            successful: case.status == TestCaseStatus::Successful,
            defect_count: case.defect_ids.len(),
            test_type: case.test_type.clone(),
        }
    }
}

/// Score with its components, all percentages in [0, 100].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct QualityBreakdown {
    pub total_cases: usize,
    pub executed_cases: usize,
    pub successful_cases: usize,
    pub total_defects: usize,
    pub distinct_test_types: usize,
    pub coverage: f64,
    pub effectiveness: f64,
    pub defect_score: f64,
    pub diversity: f64,
    /// Weighted score rounded to 2 decimals, or -1 when there are no cases.
    pub score: f64,
}

impl QualityBreakdown {
    fn not_applicable() -> Self {
        Self {
            total_cases: 0,
            executed_cases: 0,
            successful_cases: 0,
            total_defects: 0,
            distinct_test_types: 0,
            coverage: 0.0,
            effectiveness: 0.0,
            defect_score: 0.0,
            diversity: 0.0,
            score: NOT_APPLICABLE,
        }
    }

    pub fn is_applicable(&self) -> bool {
        self.total_cases > 0
    }
}

/// Score a set of cases.
pub fn score_cases(cases: &[CaseSummary]) -> QualityBreakdown {
    if cases.is_empty() {
        return QualityBreakdown::not_applicable();
    }

    let total = cases.len();
    let executed = cases.iter().filter(|c| c.executed).count();
    let successful = cases.iter().filter(|c| c.successful).count();
    let defects: usize = cases.iter().map(|c| c.defect_count).sum();

    let mut types: Vec<&str> = cases
        .iter()
        .map(|c| c.test_type.trim())
        .filter(|t| !t.is_empty())
        .collect();
    types.sort_unstable();
    types.dedup();

    let coverage = executed as f64 / total as f64 * 100.0;
    let effectiveness = if executed == 0 {
        100.0
    } else {
        successful as f64 / executed as f64 * 100.0
    };
    let defect_score = 100.0 * (-(defects as f64 / total as f64)).exp();
    let diversity = (POINTS_PER_TEST_TYPE * types.len() as f64).min(100.0);

    let score = COVERAGE_WEIGHT * coverage
        + EFFECTIVENESS_WEIGHT * effectiveness
        + DEFECT_WEIGHT * defect_score
        + DIVERSITY_WEIGHT * diversity;

    QualityBreakdown {
        total_cases: total,
        executed_cases: executed,
        successful_cases: successful,
        total_defects: defects,
        distinct_test_types: types.len(),
        coverage,
        effectiveness,
        defect_score,
        diversity,
        score: round2(score),
    }
}

/// Score test cases directly.
pub fn score_test_cases<'a, I>(cases: I) -> QualityBreakdown
where
    I: IntoIterator<Item = &'a TestCase>,
{
    let summaries: Vec<CaseSummary> = cases.into_iter().map(CaseSummary::from).collect();
    score_cases(&summaries)
}

pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Optional filters narrowing the cases that are scored.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct QualityScope {
    pub project_id: Option<String>,
    pub test_plan_id: Option<String>,
    pub cycle: Option<u32>,
}

impl QualityScope {
    pub fn matches(&self, case: &TestCase) -> bool {
        if let Some(ref project_id) = self.project_id
            && case.project_id.as_deref() != Some(project_id.as_str())
        {
            return false;
        }
        if let Some(ref plan_id) = self.test_plan_id
            && case.test_plan_id.as_deref() != Some(plan_id.as_str())
        {
            return false;
        }
        if let Some(cycle) = self.cycle
            && case.cycle != cycle
        {
            return false;
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn case(executed: bool, successful: bool, defects: usize, test_type: &str) -> CaseSummary {
        CaseSummary {
            executed,
            successful,
            defect_count: defects,
            test_type: test_type.to_string(),
        }
    }

    #[test]
    fn test_empty_set_is_not_applicable() {
        let result = score_cases(&[]);
        assert_eq!(result.score, NOT_APPLICABLE);
        assert!(!result.is_applicable());
    }

    #[test]
    fn test_nothing_executed() {
        // coverage 0, effectiveness 100, defect 100, diversity 20
        let result = score_cases(&[case(false, false, 0, "Funcional"), case(false, false, 0, "")]);
        assert_eq!(result.coverage, 0.0);
        assert_eq!(result.effectiveness, 100.0);
        assert_eq!(result.score, 57.0);
    }

    #[test]
    fn test_known_mixed_set() {
        let cases = [
            case(true, true, 0, "Funcional"),
            case(true, false, 2, "Regresion"),
            case(true, true, 0, "Funcional"),
            case(false, false, 0, "UI"),
        ];
        let result = score_cases(&cases);

        assert_eq!(result.coverage, 75.0);
        assert!((result.effectiveness - 200.0 / 3.0).abs() < 1e-9);
        assert!((result.defect_score - 100.0 * (-0.5f64).exp()).abs() < 1e-9);
        assert_eq!(result.diversity, 60.0);
        // 26.25 + 23.333.. + 12.130.. + 6
        assert_eq!(result.score, 67.71);
    }

    #[test]
    fn test_perfect_set_scores_100() {
        let cases: Vec<CaseSummary> = ["A", "B", "C", "D", "E", "F"]
            .iter()
            .map(|t| case(true, true, 0, t))
            .collect();
        let result = score_cases(&cases);
        assert_eq!(result.diversity, 100.0);
        assert_eq!(result.score, 100.0);
    }

    #[test]
    fn test_score_stays_in_bounds() {
        for executed in 0..=4 {
            for successful in 0..=executed {
                for defects in [0, 1, 5, 50] {
                    let mut cases = Vec::new();
                    for i in 0..4 {
                        cases.push(case(i < executed, i < successful, defects, "T"));
                    }
                    let score = score_cases(&cases).score;
                    assert!((0.0..=100.0).contains(&score), "score {} out of range", score);
                }
            }
        }
    }

    #[test]
    fn test_more_defects_never_raise_defect_score() {
        let mut previous = f64::INFINITY;
        for defects in 0..20 {
            let cases = [case(true, true, defects, "T"), case(true, false, 0, "T")];
            let result = score_cases(&cases);
            assert!(result.defect_score <= previous);
            previous = result.defect_score;
        }
    }

    #[test]
    fn test_test_types_trimmed_and_deduplicated() {
        let cases = [
            case(true, true, 0, "Funcional"),
            case(true, true, 0, " Funcional "),
            case(true, true, 0, "  "),
        ];
        assert_eq!(score_cases(&cases).distinct_test_types, 1);
    }
}
