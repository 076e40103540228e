//! Spreadsheet rendering. The workbook is a minimal single-sheet XLSX:
//! an OOXML zip container with inline strings and no shared-strings part.

use std::io::{Cursor, Write};

use anyhow::Context;
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipWriter};

use super::{report_content, teacher_map, AggregateStats, Block};
use crate::model::{EvaluationKind, Report, Teacher};
use crate::score;

pub const SINGLE_SHEET_NAME: &str = "Report";
pub const AGGREGATED_SHEET_NAME: &str = "Aggregated Reports";

#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Text(String),
    Number(f64),
}

fn text(value: impl Into<String>) -> Cell {
    Cell::Text(value.into())
}

/// Detail rows for one report: one row per logical fact, a single flat
/// sheet rather than a normalized multi-table layout.
pub fn report_rows(report: &Report, teacher: &Teacher) -> Vec<Vec<Cell>> {
    let mut rows: Vec<Vec<Cell>> = Vec::new();
    for block in report_content(report, teacher) {
        match block {
            Block::Field(label, value) => rows.push(vec![text(label), text(value)]),
            Block::Heading(title) => {
                rows.push(vec![text("نوع التقييم"), text(title)]);
                rows.push(Vec::new());
            }
            Block::CriteriaTable(table) => {
                rows.push(vec![text("المعيار"), text("الدرجة"), text("النسبة")]);
                for row in table {
                    rows.push(vec![
                        text(row.label),
                        Cell::Number(f64::from(row.score)),
                        text(format!("{:.0}%", row.percentage)),
                    ]);
                }
            }
            Block::GroupTable { title, rows: table } => {
                rows.push(vec![text(title), text("الدرجة")]);
                for (label, score) in table {
                    rows.push(vec![
                        text(format!("  - {label}")),
                        Cell::Number(f64::from(score)),
                    ]);
                }
            }
            Block::FinalPercentage(pct) => {
                rows.push(Vec::new());
                rows.push(vec![text("النسبة النهائية"), text(format!("{pct:.2}%"))]);
            }
            Block::Narrative(label, value) => rows.push(vec![text(label), text(value)]),
            Block::Blank => rows.push(Vec::new()),
        }
    }
    rows
}

/// Summary table for aggregated export: header plus one row per resolvable
/// report. Deliberately a different shape from the single-report sheet.
pub fn aggregated_rows(
    reports: &[Report],
    teachers: &[Teacher],
) -> (Vec<Vec<Cell>>, AggregateStats) {
    let by_id = teacher_map(teachers);
    let mut rows = vec![vec![
        text("المعلم"),
        text("التاريخ"),
        text("المدرسة"),
        text("نوع التقييم"),
        text("النسبة المئوية"),
    ]];
    let mut stats = AggregateStats::default();
    for report in reports {
        let Some(teacher) = by_id.get(report.base().teacher_id.as_str()) else {
            stats.skipped += 1;
            continue;
        };
        let kind = match report.kind() {
            EvaluationKind::General => "عام",
            EvaluationKind::ClassSession => "حصة دراسية",
        };
        rows.push(vec![
            text(teacher.name.clone()),
            text(report.base().date.to_string()),
            text(report.base().school.clone()),
            text(kind),
            text(format!("{:.2}%", score::report_percentage(report))),
        ]);
        stats.rendered += 1;
    }
    (rows, stats)
}

/// Serialize rows into a single-sheet XLSX workbook.
pub fn write_workbook(sheet_name: &str, rows: &[Vec<Cell>]) -> anyhow::Result<Vec<u8>> {
    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    let opts = FileOptions::default().compression_method(CompressionMethod::Deflated);

    let entries: [(&str, String); 5] = [
        (
            "[Content_Types].xml",
            concat!(
                r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
                r#"<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">"#,
                r#"<Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>"#,
                r#"<Default Extension="xml" ContentType="application/xml"/>"#,
                r#"<Override PartName="/xl/workbook.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml"/>"#,
                r#"<Override PartName="/xl/worksheets/sheet1.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml"/>"#,
                r#"</Types>"#
            )
            .to_string(),
        ),
        (
            "_rels/.rels",
            concat!(
                r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
                r#"<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">"#,
                r#"<Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="xl/workbook.xml"/>"#,
                r#"</Relationships>"#
            )
            .to_string(),
        ),
        (
            "xl/workbook.xml",
            format!(
                concat!(
                    r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
                    r#"<workbook xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" "#,
                    r#"xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships">"#,
                    r#"<sheets><sheet name="{}" sheetId="1" r:id="rId1"/></sheets>"#,
                    r#"</workbook>"#
                ),
                xml_escape(sheet_name)
            ),
        ),
        (
            "xl/_rels/workbook.xml.rels",
            concat!(
                r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
                r#"<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">"#,
                r#"<Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet" Target="worksheets/sheet1.xml"/>"#,
                r#"</Relationships>"#
            )
            .to_string(),
        ),
        ("xl/worksheets/sheet1.xml", worksheet_xml(rows)),
    ];

    for (name, body) in entries {
        zip.start_file(name, opts)
            .with_context(|| format!("failed to start workbook entry {name}"))?;
        zip.write_all(body.as_bytes())
            .with_context(|| format!("failed to write workbook entry {name}"))?;
    }

    let cursor = zip.finish().context("failed to finalize workbook")?;
    Ok(cursor.into_inner())
}

fn worksheet_xml(rows: &[Vec<Cell>]) -> String {
    let mut xml = String::from(concat!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
        r#"<worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main">"#,
        r#"<sheetData>"#
    ));
    for (row_idx, row) in rows.iter().enumerate() {
        let r = row_idx + 1;
        if row.is_empty() {
            xml.push_str(&format!(r#"<row r="{r}"/>"#));
            continue;
        }
        xml.push_str(&format!(r#"<row r="{r}">"#));
        for (col_idx, cell) in row.iter().enumerate() {
            let cell_ref = format!("{}{r}", column_name(col_idx));
            match cell {
                Cell::Text(s) => xml.push_str(&format!(
                    r#"<c r="{cell_ref}" t="inlineStr"><is><t xml:space="preserve">{}</t></is></c>"#,
                    xml_escape(s)
                )),
                Cell::Number(n) => {
                    xml.push_str(&format!(r#"<c r="{cell_ref}"><v>{n}</v></c>"#));
                }
            }
        }
        xml.push_str("</row>");
    }
    xml.push_str("</sheetData></worksheet>");
    xml
}

fn column_name(mut index: usize) -> String {
    let mut name = String::new();
    loop {
        name.insert(0, (b'A' + (index % 26) as u8) as char);
        if index < 26 {
            break;
        }
        index = index / 26 - 1;
    }
    name
}

fn xml_escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(c),
        }
    }
    out
}
