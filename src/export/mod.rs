//! Multi-format export of evaluation reports. All four targets (plain text,
//! paginated PDF, spreadsheet, share link) are fed by one content model so
//! they cannot drift apart; each target only decides how to map blocks to
//! its medium.

pub mod doc;
pub mod sheet;

use std::collections::HashMap;

use chrono::NaiveDate;

use crate::model::{Report, Teacher};
use crate::score;

pub const AGGREGATED_TEXT_HEADER: &str = "--- تقارير مجمعة ---";
pub const AGGREGATED_TEXT_SEPARATOR: &str = "================================";
const WHATSAPP_SEND_URL: &str = "https://api.whatsapp.com/send?text=";

/// One logical row of a criteria table.
#[derive(Debug, Clone, PartialEq)]
pub struct CriterionRow {
    pub label: String,
    pub score: u8,
    pub percentage: f64,
}

/// Medium-independent content of one rendered report, in display order.
#[derive(Debug, Clone, PartialEq)]
pub enum Block {
    /// Labeled header field, e.g. teacher name or school.
    Field(String, String),
    /// Evaluation-kind heading.
    Heading(String),
    /// Flat criteria table (general evaluation).
    CriteriaTable(Vec<CriterionRow>),
    /// Titled criterion group (class-session evaluation).
    GroupTable {
        title: String,
        rows: Vec<(String, u8)>,
    },
    /// Computed final percentage.
    FinalPercentage(f64),
    /// Free-text narrative field.
    Narrative(String, String),
    /// Vertical spacer.
    Blank,
}

/// How many reports an aggregated export rendered and how many it skipped
/// because their teacher could not be resolved. The skip is deliberate and
/// silent; the count is the observable hook for callers that care.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AggregateStats {
    pub rendered: usize,
    pub skipped: usize,
}

/// Build the shared content model for one (report, teacher) pair. The caller
/// is responsible for passing the teacher the report actually references.
pub fn report_content(report: &Report, teacher: &Teacher) -> Vec<Block> {
    let base = report.base();
    let mut blocks = vec![
        Block::Field("المعلم".to_string(), teacher.name.clone()),
        Block::Field("التاريخ".to_string(), base.date.to_string()),
        Block::Field("المدرسة".to_string(), base.school.clone()),
        Block::Field("المادة".to_string(), base.subject.clone()),
        Block::Field("الصفوف".to_string(), base.grades.clone()),
        Block::Field("الفرع".to_string(), base.branch.clone()),
        Block::Blank,
    ];

    match report {
        Report::General(r) => {
            blocks.push(Block::Heading("تقييم عام".to_string()));
            blocks.push(Block::CriteriaTable(
                r.criteria
                    .iter()
                    .map(|c| CriterionRow {
                        label: c.label.clone(),
                        score: c.score,
                        percentage: score::criterion_percentage(c.score),
                    })
                    .collect(),
            ));
            blocks.push(Block::FinalPercentage(score::report_percentage(report)));
            blocks.push(Block::Blank);
            blocks.push(narrative("أهم الاستراتيجيات المنفذة", &r.strategies));
            blocks.push(narrative("أهم الوسائل المستخدمة", &r.tools));
            blocks.push(narrative("أهم البرامج المنفذة", &r.programs));
            blocks.push(narrative("أهم المصادر المستخدمة", &r.sources));
        }
        Report::ClassSession(r) => {
            blocks.push(Block::Heading(format!(
                "تقييم حصة دراسية ({})",
                r.sub_type.as_str()
            )));
            blocks.push(Block::Field(
                "اسم المشرف".to_string(),
                r.supervisor_name.clone(),
            ));
            blocks.push(Block::Field(
                "الفصل الدراسي".to_string(),
                r.semester.as_str().to_string(),
            ));
            blocks.push(Block::Field(
                "نوع الزيارة".to_string(),
                r.visit_type.as_str().to_string(),
            ));
            blocks.push(Block::Field(
                "الصف".to_string(),
                format!("{} / {}", r.class.as_str(), r.section.as_str()),
            ));
            blocks.push(Block::Field(
                "عنوان الدرس".to_string(),
                r.lesson_name.clone(),
            ));
            blocks.push(Block::Blank);
            for g in &r.criterion_groups {
                blocks.push(Block::GroupTable {
                    title: g.title.clone(),
                    rows: g
                        .criteria
                        .iter()
                        .map(|c| (c.label.clone(), c.score))
                        .collect(),
                });
            }
            blocks.push(Block::FinalPercentage(score::report_percentage(report)));
            blocks.push(Block::Blank);
            blocks.push(narrative("الإيجابيات", &r.positives));
            blocks.push(narrative("ملاحظات للتحسين", &r.notes_for_improvement));
            blocks.push(narrative("التوصيات", &r.recommendations));
            blocks.push(narrative("تعليق الموظف", &r.employee_comment));
        }
    }

    blocks
}

fn narrative(label: &str, text: &str) -> Block {
    Block::Narrative(label.to_string(), text.to_string())
}

/// Plain-text rendering. RTL text is passed through untouched; a text stream
/// has no layout direction of its own.
pub fn render_text(report: &Report, teacher: &Teacher) -> String {
    let mut out = String::new();
    for block in report_content(report, teacher) {
        match block {
            Block::Field(label, value) => {
                out.push_str(&format!("{label}: {value}\n"));
            }
            Block::Heading(title) => {
                out.push_str(&format!("--- {title} ---\n"));
            }
            Block::CriteriaTable(rows) => {
                for row in rows {
                    out.push_str(&format!(
                        "{}: {} / 4 ({:.0}%)\n",
                        row.label, row.score, row.percentage
                    ));
                }
            }
            Block::GroupTable { title, rows } => {
                out.push_str(&format!("{title}:\n"));
                for (label, score) in rows {
                    out.push_str(&format!(
                        "  - {}: {} / 4 ({:.0}%)\n",
                        label,
                        score,
                        score::criterion_percentage(score)
                    ));
                }
            }
            Block::FinalPercentage(pct) => {
                out.push_str(&format!("النسبة المئوية النهائية: {pct:.2}%\n"));
            }
            Block::Narrative(label, text) => {
                out.push_str(&format!("{label}: {text}\n"));
            }
            Block::Blank => out.push('\n'),
        }
    }
    out
}

/// Aggregated plain-text rendering over reports in caller order. Reports
/// whose teacher is missing from `teachers` are skipped and counted.
pub fn render_aggregated_text(reports: &[Report], teachers: &[Teacher]) -> (String, AggregateStats) {
    let by_id = teacher_map(teachers);
    let mut out = format!("{AGGREGATED_TEXT_HEADER}\n\n");
    let mut stats = AggregateStats::default();
    for report in reports {
        let Some(teacher) = by_id.get(report.base().teacher_id.as_str()) else {
            stats.skipped += 1;
            continue;
        };
        out.push_str(&render_text(report, teacher));
        out.push_str(&format!("\n{AGGREGATED_TEXT_SEPARATOR}\n\n"));
        stats.rendered += 1;
    }
    (out, stats)
}

/// WhatsApp compose deep link carrying `content`. The recipient is chosen in
/// the messaging application, not here.
pub fn share_link(content: &str) -> String {
    format!("{WHATSAPP_SEND_URL}{}", encode_uri_component(content))
}

/// Percent-encoding with `encodeURIComponent` semantics: ASCII letters,
/// digits and `-_.!~*'()` pass through, everything else is encoded per
/// UTF-8 byte.
fn encode_uri_component(s: &str) -> String {
    let mut out = String::with_capacity(s.len() * 3);
    for b in s.bytes() {
        match b {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' => out.push(b as char),
            b'-' | b'_' | b'.' | b'!' | b'~' | b'*' | b'\'' | b'(' | b')' => out.push(b as char),
            _ => out.push_str(&format!("%{b:02X}")),
        }
    }
    out
}

pub fn report_filename(teacher: &Teacher, report: &Report, ext: &str) -> String {
    format!("report_{}_{}.{ext}", teacher.name, report.base().date)
}

pub fn aggregated_filename(today: NaiveDate, ext: &str) -> String {
    format!("aggregated_reports_{today}.{ext}")
}

pub(crate) fn teacher_map(teachers: &[Teacher]) -> HashMap<&str, &Teacher> {
    teachers.iter().map(|t| (t.id.as_str(), t)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Criterion, GeneralReport, Report, ReportBase};

    fn teacher(id: &str, name: &str) -> Teacher {
        Teacher {
            id: id.to_string(),
            name: name.to_string(),
            school: None,
            subject: None,
            grades: None,
            branch: None,
        }
    }

    fn general_report(id: &str, teacher_id: &str, scores: &[u8]) -> Report {
        Report::General(GeneralReport {
            base: ReportBase {
                id: id.to_string(),
                teacher_id: teacher_id.to_string(),
                date: "2025-01-10".parse().expect("date"),
                school: "مدرسة النور".to_string(),
                subject: "رياضيات".to_string(),
                grades: "7".to_string(),
                branch: "main".to_string(),
            },
            criteria: scores
                .iter()
                .enumerate()
                .map(|(i, &s)| {
                    let mut c = Criterion::new(&format!("c{i}"), &format!("معيار {i}"));
                    c.score = s;
                    c
                })
                .collect(),
            strategies: "تعلم تعاوني".to_string(),
            tools: String::new(),
            programs: String::new(),
            sources: String::new(),
        })
    }

    #[test]
    fn text_rendering_carries_scores_and_percentage() {
        let t = teacher("t1", "أحمد");
        let text = render_text(&general_report("r1", "t1", &[4, 0, 2]), &t);
        assert!(text.contains("المعلم: أحمد"));
        assert!(text.contains("التاريخ: 2025-01-10"));
        assert!(text.contains("--- تقييم عام ---"));
        assert!(text.contains("معيار 0: 4 / 4 (100%)"));
        assert!(text.contains("معيار 1: 0 / 4 (0%)"));
        assert!(text.contains("معيار 2: 2 / 4 (50%)"));
        assert!(text.contains("النسبة المئوية النهائية: 50.00%"));
        assert!(text.contains("أهم الاستراتيجيات المنفذة: تعلم تعاوني"));
    }

    #[test]
    fn aggregated_text_skips_unresolved_teachers_silently() {
        let teachers = vec![teacher("t1", "أحمد")];
        let reports = vec![
            general_report("r1", "t1", &[4]),
            general_report("r2", "no-such-teacher", &[4]),
        ];
        let (text, stats) = render_aggregated_text(&reports, &teachers);
        assert_eq!(stats.rendered, 1);
        assert_eq!(stats.skipped, 1);
        assert!(text.starts_with(AGGREGATED_TEXT_HEADER));
        assert_eq!(text.matches(AGGREGATED_TEXT_SEPARATOR).count(), 1);
        assert!(!text.contains("no-such-teacher"));
    }

    #[test]
    fn share_link_percent_encodes_the_payload() {
        let url = share_link("نسبة 50% (a_b)");
        assert!(url.starts_with("https://api.whatsapp.com/send?text="));
        // Unreserved characters survive, spaces and percent signs do not.
        assert!(url.contains("(a_b)"));
        assert!(url.contains("%20"));
        assert!(url.contains("%25"));
        assert!(!url[WHATSAPP_SEND_URL.len()..].contains(' '));
    }

    #[test]
    fn filenames_follow_the_export_pattern() {
        let t = teacher("t1", "أحمد");
        let r = general_report("r1", "t1", &[]);
        assert_eq!(report_filename(&t, &r, "txt"), "report_أحمد_2025-01-10.txt");
        assert_eq!(
            aggregated_filename("2025-02-01".parse().expect("date"), "xlsx"),
            "aggregated_reports_2025-02-01.xlsx"
        );
    }
}
