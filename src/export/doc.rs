//! Paginated PDF rendering. The document is assembled by hand: catalog,
//! page tree, one content stream per page, built-in Helvetica.
//!
//! The page composes text left-to-right, so every RTL string is word-order
//! reversed and right-aligned before placement. This approximates
//! bidirectional shaping rather than implementing it.

use super::{report_content, teacher_map, AggregateStats, Block};
use crate::model::{Report, Teacher};

const PAGE_WIDTH: f64 = 595.28;
const PAGE_HEIGHT: f64 = 841.89;
const RIGHT_EDGE: f64 = 559.0;
const LEFT_EDGE: f64 = 36.0;
const TOP_Y: f64 = 800.0;
const BOTTOM_Y: f64 = 48.0;
const BODY_SIZE: f64 = 11.0;
const LINE_STEP: f64 = 16.0;

// Column anchors for the score tables.
const COL_SCORE_X: f64 = 150.0;
const COL_PERCENT_X: f64 = 70.0;

/// Word-order reversal used before writing RTL text onto an LTR surface.
pub fn rtl(text: &str) -> String {
    let mut words: Vec<&str> = text.split(' ').collect();
    words.reverse();
    words.join(" ")
}

/// Render one report into a single-page-or-more PDF document.
pub fn render_report(report: &Report, teacher: &Teacher) -> Vec<u8> {
    let mut doc = DocWriter::new();
    write_blocks(&mut doc, &report_content(report, teacher));
    doc.finish()
}

/// Render many reports, one logical page run per report, skipping (and
/// counting) reports whose teacher cannot be resolved.
pub fn render_aggregated(reports: &[Report], teachers: &[Teacher]) -> (Vec<u8>, AggregateStats) {
    let by_id = teacher_map(teachers);
    let mut doc = DocWriter::new();
    let mut stats = AggregateStats::default();
    for report in reports {
        let Some(teacher) = by_id.get(report.base().teacher_id.as_str()) else {
            stats.skipped += 1;
            continue;
        };
        if stats.rendered > 0 {
            doc.start_page();
        }
        write_blocks(&mut doc, &report_content(report, teacher));
        stats.rendered += 1;
    }
    (doc.finish(), stats)
}

fn write_blocks(doc: &mut DocWriter, blocks: &[Block]) {
    for block in blocks {
        match block {
            Block::Field(label, value) => doc.line_rtl(&format!("{label}: {value}")),
            Block::Heading(title) => {
                doc.spacer();
                doc.line_rtl(&format!("--- {title} ---"));
            }
            Block::CriteriaTable(rows) => {
                doc.table_header(&["النسبة", "الدرجة", "المعيار"]);
                for row in rows {
                    doc.table_row(
                        &row.label,
                        &row.score.to_string(),
                        Some(&format!("{:.0}%", row.percentage)),
                    );
                }
                doc.spacer();
            }
            Block::GroupTable { title, rows } => {
                doc.table_header(&[title]);
                for (label, score) in rows {
                    doc.table_row(label, &score.to_string(), None);
                }
                doc.spacer();
            }
            Block::FinalPercentage(pct) => doc.line_rtl(&format!("النسبة النهائية: {pct:.2}%")),
            Block::Narrative(label, text) => doc.line_rtl(&format!("{label}: {text}")),
            Block::Blank => doc.spacer(),
        }
    }
}

/// Top-down page layout with a descending y cursor; a new page begins when
/// the cursor runs out of room.
struct DocWriter {
    pages: Vec<Vec<u8>>,
    y: f64,
}

impl DocWriter {
    fn new() -> Self {
        DocWriter {
            pages: vec![Vec::new()],
            y: TOP_Y,
        }
    }

    fn start_page(&mut self) {
        self.pages.push(Vec::new());
        self.y = TOP_Y;
    }

    fn ensure_room(&mut self) {
        if self.y < BOTTOM_Y {
            self.start_page();
        }
    }

    fn spacer(&mut self) {
        self.y -= LINE_STEP / 2.0;
        self.ensure_room();
    }

    /// Right-aligned RTL text line.
    fn line_rtl(&mut self, text: &str) {
        let shaped = rtl(text);
        let x = RIGHT_EDGE - approx_width(&shaped, BODY_SIZE);
        self.text_at(x.max(LEFT_EDGE), self.y, &shaped);
        self.advance_line();
    }

    fn table_header(&mut self, columns: &[&str]) {
        match columns {
            [title] => {
                let shaped = rtl(title);
                let x = RIGHT_EDGE - approx_width(&shaped, BODY_SIZE);
                self.text_at(x.max(LEFT_EDGE), self.y, &shaped);
            }
            [percent, score, label] => {
                let shaped = rtl(label);
                let x = RIGHT_EDGE - approx_width(&shaped, BODY_SIZE);
                self.text_at(x.max(LEFT_EDGE), self.y, &shaped);
                self.text_at(COL_SCORE_X, self.y, &rtl(score));
                self.text_at(COL_PERCENT_X, self.y, &rtl(percent));
            }
            _ => {}
        }
        self.rule(self.y - 4.0);
        self.advance_line();
    }

    fn table_row(&mut self, label: &str, score: &str, percent: Option<&str>) {
        let shaped = rtl(label);
        let x = RIGHT_EDGE - approx_width(&shaped, BODY_SIZE);
        self.text_at(x.max(LEFT_EDGE), self.y, &shaped);
        self.text_at(COL_SCORE_X, self.y, score);
        if let Some(p) = percent {
            self.text_at(COL_PERCENT_X, self.y, p);
        }
        self.advance_line();
    }

    fn advance_line(&mut self) {
        self.y -= LINE_STEP;
        self.ensure_room();
    }

    fn text_at(&mut self, x: f64, y: f64, text: &str) {
        let page = self.pages.last_mut().expect("at least one page");
        page.extend_from_slice(
            format!("BT /F1 {BODY_SIZE} Tf 1 0 0 1 {x:.2} {y:.2} Tm (").as_bytes(),
        );
        for b in text.bytes() {
            match b {
                b'(' => page.extend_from_slice(b"\\("),
                b')' => page.extend_from_slice(b"\\)"),
                b'\\' => page.extend_from_slice(b"\\\\"),
                _ => page.push(b),
            }
        }
        page.extend_from_slice(b") Tj ET\n");
    }

    fn rule(&mut self, y: f64) {
        let page = self.pages.last_mut().expect("at least one page");
        page.extend_from_slice(
            format!("{LEFT_EDGE:.2} {y:.2} m {RIGHT_EDGE:.2} {y:.2} l S\n").as_bytes(),
        );
    }

    /// Assemble the final PDF: catalog, page tree, font, then one page and
    /// one content-stream object per page, followed by the xref table.
    fn finish(self) -> Vec<u8> {
        let page_count = self.pages.len();
        let object_count = 3 + 2 * page_count;
        let mut out: Vec<u8> = b"%PDF-1.4\n".to_vec();
        let mut offsets: Vec<usize> = vec![0; object_count + 1];

        let kids: Vec<String> = (0..page_count).map(|i| format!("{} 0 R", 4 + 2 * i)).collect();
        write_dict_object(
            &mut out,
            &mut offsets,
            1,
            "<< /Type /Catalog /Pages 2 0 R >>".to_string(),
        );
        write_dict_object(
            &mut out,
            &mut offsets,
            2,
            format!(
                "<< /Type /Pages /Kids [{}] /Count {page_count} >>",
                kids.join(" ")
            ),
        );
        write_dict_object(
            &mut out,
            &mut offsets,
            3,
            "<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica /Encoding /WinAnsiEncoding >>"
                .to_string(),
        );

        for (i, content) in self.pages.iter().enumerate() {
            let page_id = 4 + 2 * i;
            let content_id = page_id + 1;
            write_dict_object(
                &mut out,
                &mut offsets,
                page_id,
                format!(
                    "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 {PAGE_WIDTH} {PAGE_HEIGHT}] \
                     /Resources << /Font << /F1 3 0 R >> >> /Contents {content_id} 0 R >>"
                ),
            );
            offsets[content_id] = out.len();
            out.extend_from_slice(
                format!("{content_id} 0 obj\n<< /Length {} >>\nstream\n", content.len()).as_bytes(),
            );
            out.extend_from_slice(content);
            out.extend_from_slice(b"\nendstream\nendobj\n");
        }

        let xref_offset = out.len();
        out.extend_from_slice(format!("xref\n0 {}\n", object_count + 1).as_bytes());
        out.extend_from_slice(b"0000000000 65535 f \n");
        for id in 1..=object_count {
            out.extend_from_slice(format!("{:010} 00000 n \n", offsets[id]).as_bytes());
        }
        out.extend_from_slice(
            format!(
                "trailer\n<< /Size {} /Root 1 0 R >>\nstartxref\n{xref_offset}\n%%EOF\n",
                object_count + 1
            )
            .as_bytes(),
        );
        out
    }
}

fn write_dict_object(out: &mut Vec<u8>, offsets: &mut [usize], id: usize, body: String) {
    offsets[id] = out.len();
    out.extend_from_slice(format!("{id} 0 obj\n{body}\nendobj\n").as_bytes());
}

/// Coarse width estimate for right alignment; Helvetica metrics are not
/// meaningful for the Arabic glyphs anyway.
fn approx_width(text: &str, size: f64) -> f64 {
    text.chars().count() as f64 * size * 0.5
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Criterion, GeneralReport, ReportBase};

    fn teacher(id: &str) -> Teacher {
        Teacher {
            id: id.to_string(),
            name: "أحمد".to_string(),
            school: None,
            subject: None,
            grades: None,
            branch: None,
        }
    }

    fn report(id: &str, teacher_id: &str) -> Report {
        Report::General(GeneralReport {
            base: ReportBase {
                id: id.to_string(),
                teacher_id: teacher_id.to_string(),
                date: "2025-01-10".parse().expect("date"),
                school: String::new(),
                subject: String::new(),
                grades: String::new(),
                branch: "main".to_string(),
            },
            criteria: vec![Criterion::new("c1", "إدارة الصف")],
            strategies: String::new(),
            tools: String::new(),
            programs: String::new(),
            sources: String::new(),
        })
    }

    fn count_pages(pdf: &[u8]) -> usize {
        let needle = b"/Type /Page /Parent";
        pdf.windows(needle.len()).filter(|w| *w == needle).count()
    }

    #[test]
    fn rtl_reverses_word_order_only() {
        assert_eq!(rtl("مرحبا بالعالم الجميل"), "الجميل بالعالم مرحبا");
        assert_eq!(rtl("واحد"), "واحد");
        assert_eq!(rtl(""), "");
    }

    #[test]
    fn single_report_renders_a_wellformed_single_page_pdf() {
        let pdf = render_report(&report("r1", "t1"), &teacher("t1"));
        assert!(pdf.starts_with(b"%PDF-1.4"));
        assert!(pdf.ends_with(b"%%EOF\n"));
        assert_eq!(count_pages(&pdf), 1);
    }

    #[test]
    fn aggregated_pdf_starts_a_page_per_resolved_report() {
        let teachers = vec![teacher("t1")];
        let reports = vec![
            report("r1", "t1"),
            report("r2", "missing"),
            report("r3", "t1"),
        ];
        let (pdf, stats) = render_aggregated(&reports, &teachers);
        assert_eq!(stats.rendered, 2);
        assert_eq!(stats.skipped, 1);
        assert_eq!(count_pages(&pdf), 2);
    }

    #[test]
    fn parentheses_in_labels_are_escaped() {
        let mut r = report("r1", "t1");
        if let Report::General(g) = &mut r {
            g.criteria[0].label = "معيار (خاص)".to_string();
        }
        let pdf = render_report(&r, &teacher("t1"));
        let needle = b"\\(".as_slice();
        assert!(pdf.windows(needle.len()).any(|w| w == needle));
    }
}
