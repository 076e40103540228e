//! Score aggregation over one report. The only kind-aware step is obtaining
//! the flat criterion list; the arithmetic is shared so new evaluation kinds
//! only have to say how they flatten.

use crate::model::{Report, MAX_CRITERION_SCORE};

/// Percentage for a single criterion, `100 * score / 4`.
pub fn criterion_percentage(score: u8) -> f64 {
    100.0 * f64::from(score) / f64::from(MAX_CRITERION_SCORE)
}

/// Final percentage for a report, in `[0, 100]`. A report with no criteria
/// scores 0 rather than dividing by zero.
pub fn report_percentage(report: &Report) -> f64 {
    let scores = flatten_scores(report);
    if scores.is_empty() {
        return 0.0;
    }
    let total: u32 = scores.iter().map(|&s| u32::from(s)).sum();
    let max_possible = scores.len() as u32 * u32::from(MAX_CRITERION_SCORE);
    100.0 * f64::from(total) / f64::from(max_possible)
}

/// All criterion scores of a report in document order, regardless of how the
/// variant nests them.
pub fn flatten_scores(report: &Report) -> Vec<u8> {
    match report {
        Report::General(r) => r.criteria.iter().map(|c| c.score).collect(),
        Report::ClassSession(r) => r
            .criterion_groups
            .iter()
            .flat_map(|g| g.criteria.iter())
            .map(|c| c.score)
            .collect(),
    }
}
