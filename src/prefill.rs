//! Pre-fill resolver: builds a new draft report for a teacher from their
//! history. Pure over its inputs; the draft is returned, never persisted
//! here.

use chrono::NaiveDate;
use uuid::Uuid;

use crate::model::{
    ClassNumber, ClassSessionReport, Criterion, CustomCriterion, EvaluationKind, GeneralReport,
    Report, ReportBase, Section, Semester, SessionSubType, Teacher, VisitType,
};
use crate::templates;

/// Resolve a new draft of the requested kind for `teacher`.
///
/// `reports` is that teacher's full report history. Shared location fields
/// fall back independently per field: most recent report of the requested
/// kind, then most recent report of any kind, then the teacher record, then
/// empty (branch bottoms out at `"main"`).
pub fn new_report_draft(
    teacher: &Teacher,
    kind: EvaluationKind,
    reports: &[Report],
    custom_criteria: &[CustomCriterion],
    today: NaiveDate,
) -> Report {
    let latest_of_kind = latest_report(reports.iter().filter(|r| r.kind() == kind));
    let latest_overall = latest_report(reports.iter());
    let source = latest_of_kind.or(latest_overall);

    let school = pick_field(source.map(|r| r.base().school.as_str()), &teacher.school, "");
    let subject = pick_field(
        source.map(|r| r.base().subject.as_str()),
        &teacher.subject,
        "",
    );
    let grades = pick_field(source.map(|r| r.base().grades.as_str()), &teacher.grades, "");
    let branch = pick_field(
        source.map(|r| r.base().branch.as_str()),
        &teacher.branch,
        "main",
    );

    let base = ReportBase {
        id: Uuid::new_v4().to_string(),
        teacher_id: teacher.id.clone(),
        date: today,
        school,
        subject,
        grades,
        branch,
    };

    match kind {
        EvaluationKind::General => {
            let mut criteria = templates::general_criteria_template();
            criteria.extend(
                custom_criteria
                    .iter()
                    .filter(|c| {
                        c.school == base.school && c.evaluation_type == EvaluationKind::General
                    })
                    .map(|c| Criterion::new(&c.criterion.id, &c.criterion.label)),
            );
            Report::General(GeneralReport {
                base,
                criteria,
                strategies: String::new(),
                tools: String::new(),
                programs: String::new(),
                sources: String::new(),
            })
        }
        EvaluationKind::ClassSession => {
            let latest_session = latest_report(
                reports
                    .iter()
                    .filter(|r| r.kind() == EvaluationKind::ClassSession),
            )
            .and_then(|r| match r {
                Report::ClassSession(s) => Some(s),
                Report::General(_) => None,
            });

            Report::ClassSession(ClassSessionReport {
                base,
                sub_type: SessionSubType::Brief,
                supervisor_name: latest_session
                    .map(|s| s.supervisor_name.clone())
                    .unwrap_or_default(),
                semester: latest_session.map(|s| s.semester).unwrap_or(Semester::First),
                visit_type: latest_session
                    .map(|s| s.visit_type)
                    .unwrap_or(VisitType::Exploratory),
                class: latest_session.map(|s| s.class).unwrap_or(ClassNumber::First),
                section: latest_session.map(|s| s.section).unwrap_or(Section::A),
                lesson_number: latest_session
                    .map(|s| s.lesson_number.clone())
                    .unwrap_or_default(),
                lesson_name: latest_session
                    .map(|s| s.lesson_name.clone())
                    .unwrap_or_default(),
                criterion_groups: templates::class_session_brief_template(),
                positives: String::new(),
                notes_for_improvement: String::new(),
                recommendations: String::new(),
                employee_comment: String::new(),
            })
        }
    }
}

/// Most recent report by date; the first seen wins a date tie so the result
/// is stable for a given input order.
fn latest_report<'a, I>(reports: I) -> Option<&'a Report>
where
    I: IntoIterator<Item = &'a Report>,
{
    reports.into_iter().fold(None, |best, r| match best {
        Some(b) if r.base().date <= b.base().date => Some(b),
        _ => Some(r),
    })
}

fn pick_field(from_report: Option<&str>, from_teacher: &Option<String>, default: &str) -> String {
    if let Some(v) = from_report {
        if !v.is_empty() {
            return v.to_string();
        }
    }
    if let Some(v) = from_teacher {
        if !v.is_empty() {
            return v.clone();
        }
    }
    default.to_string()
}
