use anyhow::Context;
use rusqlite::{Connection, OptionalExtension};
use std::path::Path;

use crate::model::{CriterionSeed, CustomCriterion, EvaluationKind, Report, SessionSubType, Teacher};

pub fn open_db(workspace: &Path) -> anyhow::Result<Connection> {
    std::fs::create_dir_all(workspace)?;
    let db_path = workspace.join("taqyeem.sqlite3");
    let conn = Connection::open(db_path)?;
    conn.execute("PRAGMA foreign_keys = ON", [])?;
    init_schema(&conn)?;
    Ok(conn)
}

fn init_schema(conn: &Connection) -> anyhow::Result<()> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS teachers(
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            school TEXT,
            subject TEXT,
            grades TEXT,
            branch TEXT
        )",
        [],
    )?;

    // Variant-specific fields live in the JSON payload; base columns are
    // duplicated for querying and ordering.
    conn.execute(
        "CREATE TABLE IF NOT EXISTS reports(
            id TEXT PRIMARY KEY,
            teacher_id TEXT NOT NULL,
            date TEXT NOT NULL,
            evaluation_type TEXT NOT NULL,
            payload TEXT NOT NULL,
            FOREIGN KEY(teacher_id) REFERENCES teachers(id)
        )",
        [],
    )?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_reports_teacher ON reports(teacher_id)",
        [],
    )?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_reports_date ON reports(date)",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS custom_criteria(
            id TEXT PRIMARY KEY,
            school TEXT NOT NULL,
            evaluation_type TEXT NOT NULL,
            sub_type TEXT,
            group_title TEXT,
            criterion_id TEXT NOT NULL,
            criterion_label TEXT NOT NULL
        )",
        [],
    )?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_custom_criteria_school ON custom_criteria(school)",
        [],
    )?;

    Ok(())
}

pub fn count_teachers(conn: &Connection) -> anyhow::Result<usize> {
    let n: i64 = conn.query_row("SELECT COUNT(*) FROM teachers", [], |r| r.get(0))?;
    Ok(n as usize)
}

pub fn count_reports(conn: &Connection) -> anyhow::Result<usize> {
    let n: i64 = conn.query_row("SELECT COUNT(*) FROM reports", [], |r| r.get(0))?;
    Ok(n as usize)
}

pub fn load_teachers(conn: &Connection) -> anyhow::Result<Vec<Teacher>> {
    let mut stmt = conn
        .prepare("SELECT id, name, school, subject, grades, branch FROM teachers ORDER BY rowid")?;
    let teachers = stmt
        .query_map([], |r| {
            Ok(Teacher {
                id: r.get(0)?,
                name: r.get(1)?,
                school: r.get(2)?,
                subject: r.get(3)?,
                grades: r.get(4)?,
                branch: r.get(5)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(teachers)
}

pub fn get_teacher(conn: &Connection, id: &str) -> anyhow::Result<Option<Teacher>> {
    let teacher = conn
        .query_row(
            "SELECT id, name, school, subject, grades, branch FROM teachers WHERE id = ?",
            [id],
            |r| {
                Ok(Teacher {
                    id: r.get(0)?,
                    name: r.get(1)?,
                    school: r.get(2)?,
                    subject: r.get(3)?,
                    grades: r.get(4)?,
                    branch: r.get(5)?,
                })
            },
        )
        .optional()?;
    Ok(teacher)
}

pub fn upsert_teacher(conn: &Connection, teacher: &Teacher) -> anyhow::Result<()> {
    conn.execute(
        "INSERT INTO teachers(id, name, school, subject, grades, branch)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)
         ON CONFLICT(id) DO UPDATE SET
            name = excluded.name,
            school = excluded.school,
            subject = excluded.subject,
            grades = excluded.grades,
            branch = excluded.branch",
        (
            &teacher.id,
            &teacher.name,
            &teacher.school,
            &teacher.subject,
            &teacher.grades,
            &teacher.branch,
        ),
    )?;
    Ok(())
}

/// Delete a teacher and every report referencing them. Returns
/// `(teacher_existed, deleted_report_count)`; orphaned reports are never
/// left behind.
pub fn delete_teacher_cascade(conn: &Connection, id: &str) -> anyhow::Result<(bool, usize)> {
    let deleted_reports = conn.execute("DELETE FROM reports WHERE teacher_id = ?", [id])?;
    let deleted_teachers = conn.execute("DELETE FROM teachers WHERE id = ?", [id])?;
    Ok((deleted_teachers > 0, deleted_reports))
}

fn report_from_payload(payload: &str) -> anyhow::Result<Report> {
    serde_json::from_str(payload).context("stored report payload is invalid")
}

pub fn load_reports(conn: &Connection, teacher_id: Option<&str>) -> anyhow::Result<Vec<Report>> {
    let mut out = Vec::new();
    match teacher_id {
        Some(tid) => {
            let mut stmt =
                conn.prepare("SELECT payload FROM reports WHERE teacher_id = ? ORDER BY rowid")?;
            let payloads = stmt
                .query_map([tid], |r| r.get::<_, String>(0))?
                .collect::<Result<Vec<_>, _>>()?;
            for p in payloads {
                out.push(report_from_payload(&p)?);
            }
        }
        None => {
            let mut stmt = conn.prepare("SELECT payload FROM reports ORDER BY rowid")?;
            let payloads = stmt
                .query_map([], |r| r.get::<_, String>(0))?
                .collect::<Result<Vec<_>, _>>()?;
            for p in payloads {
                out.push(report_from_payload(&p)?);
            }
        }
    }
    Ok(out)
}

pub fn get_report(conn: &Connection, id: &str) -> anyhow::Result<Option<Report>> {
    let payload: Option<String> = conn
        .query_row("SELECT payload FROM reports WHERE id = ?", [id], |r| {
            r.get(0)
        })
        .optional()?;
    match payload {
        Some(p) => Ok(Some(report_from_payload(&p)?)),
        None => Ok(None),
    }
}

/// Insert or replace by id. Callers check the referenced teacher exists
/// before saving; the FK guards the rest.
pub fn upsert_report(conn: &Connection, report: &Report) -> anyhow::Result<()> {
    let base = report.base();
    let payload = serde_json::to_string(report).context("failed to serialize report")?;
    conn.execute(
        "INSERT INTO reports(id, teacher_id, date, evaluation_type, payload)
         VALUES (?1, ?2, ?3, ?4, ?5)
         ON CONFLICT(id) DO UPDATE SET
            teacher_id = excluded.teacher_id,
            date = excluded.date,
            evaluation_type = excluded.evaluation_type,
            payload = excluded.payload",
        (
            &base.id,
            &base.teacher_id,
            base.date.to_string(),
            report.kind().as_str(),
            payload,
        ),
    )?;
    Ok(())
}

pub fn delete_report(conn: &Connection, id: &str) -> anyhow::Result<bool> {
    let n = conn.execute("DELETE FROM reports WHERE id = ?", [id])?;
    Ok(n > 0)
}

pub fn load_custom_criteria(conn: &Connection) -> anyhow::Result<Vec<CustomCriterion>> {
    let mut stmt = conn.prepare(
        "SELECT id, school, evaluation_type, sub_type, group_title, criterion_id, criterion_label
         FROM custom_criteria ORDER BY rowid",
    )?;
    let rows = stmt
        .query_map([], |r| {
            Ok((
                r.get::<_, String>(0)?,
                r.get::<_, String>(1)?,
                r.get::<_, String>(2)?,
                r.get::<_, Option<String>>(3)?,
                r.get::<_, Option<String>>(4)?,
                r.get::<_, String>(5)?,
                r.get::<_, String>(6)?,
            ))
        })?
        .collect::<Result<Vec<_>, _>>()?;

    let mut out = Vec::with_capacity(rows.len());
    for (id, school, kind, sub_type, group_title, criterion_id, criterion_label) in rows {
        let evaluation_type = EvaluationKind::parse(&kind)
            .with_context(|| format!("unknown evaluation type in custom criterion: {kind}"))?;
        let sub_type = match sub_type.as_deref() {
            None => None,
            Some(s) => Some(parse_sub_type(s)?),
        };
        out.push(CustomCriterion {
            id,
            school,
            evaluation_type,
            sub_type,
            group_title,
            criterion: CriterionSeed {
                id: criterion_id,
                label: criterion_label,
            },
        });
    }
    Ok(out)
}

pub fn insert_custom_criterion(conn: &Connection, c: &CustomCriterion) -> anyhow::Result<()> {
    conn.execute(
        "INSERT INTO custom_criteria(
            id, school, evaluation_type, sub_type, group_title, criterion_id, criterion_label)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        (
            &c.id,
            &c.school,
            c.evaluation_type.as_str(),
            c.sub_type.map(|s| s.as_str()),
            &c.group_title,
            &c.criterion.id,
            &c.criterion.label,
        ),
    )?;
    Ok(())
}

fn parse_sub_type(s: &str) -> anyhow::Result<SessionSubType> {
    match s {
        "brief" => Ok(SessionSubType::Brief),
        "extended" => Ok(SessionSubType::Extended),
        "subject_specific" => Ok(SessionSubType::SubjectSpecific),
        other => anyhow::bail!("unknown session sub type: {other}"),
    }
}
