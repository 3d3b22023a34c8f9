//! Exchange with a standalone SQLite file holding a single, minimal
//! `schedule` table.

use crate::db;
use crate::error::{RosterError, RosterResult};
use crate::model::{self, ScheduleEntry, TimeSlot};
use crate::reconcile::{GridRow, RowCheck, RowRules};
use crate::store;
use rusqlite::types::Value;
use rusqlite::{Connection, OpenFlags};
use std::path::{Path, PathBuf};

const EXCHANGE_COLUMNS: [&str; 5] = [
    "student_name",
    "course_name",
    "credit",
    "time_slot",
    "classroom",
];

/// True when `path` names the file `conn` has open.
fn is_store_file(conn: &Connection, path: &Path) -> bool {
    let Some(store_path) = conn.path().filter(|p| !p.is_empty()) else {
        return false;
    };
    match (std::fs::canonicalize(store_path), std::fs::canonicalize(path)) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}

fn partial_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(".partial");
    PathBuf::from(name)
}

fn write_exchange_file(path: &Path, entries: &[ScheduleEntry]) -> rusqlite::Result<()> {
    let out = Connection::open(path)?;
    out.execute_batch(
        "CREATE TABLE schedule(
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            student_name TEXT,
            course_name TEXT,
            credit REAL,
            time_slot TEXT,
            classroom TEXT
        );",
    )?;
    let tx = out.unchecked_transaction()?;
    {
        let mut stmt = tx.prepare(
            "INSERT INTO schedule(student_name, course_name, credit, time_slot, classroom)
             VALUES(?, ?, ?, ?, ?)",
        )?;
        for e in entries {
            stmt.execute((
                &e.student_name,
                &e.course_name,
                e.credit,
                e.time_slot.map(TimeSlot::code),
                &e.classroom,
            ))?;
        }
    }
    tx.commit()
}

/// Writes every stored entry to a new file at `path`. An existing file is
/// replaced only once the new one is complete. The workspace store itself is
/// refused.
pub fn export_db(conn: &Connection, path: &Path) -> RosterResult<usize> {
    if is_store_file(conn, path) {
        return Err(RosterError::Precondition(format!(
            "{} is the open workspace store",
            path.display()
        )));
    }
    let entries = store::list_schedule(conn)?;

    let partial = partial_path(path);
    if partial.exists() {
        std::fs::remove_file(&partial)?;
    }
    if let Err(e) = write_exchange_file(&partial, &entries) {
        let _ = std::fs::remove_file(&partial);
        return Err(e.into());
    }
    std::fs::rename(&partial, path)?;
    tracing::info!(path = %path.display(), rows = entries.len(), "schedule exported to db file");
    Ok(entries.len())
}

fn cell_text(v: Value) -> String {
    match v {
        Value::Null => String::new(),
        Value::Integer(i) => i.to_string(),
        Value::Real(f) => model::format_credit(f),
        Value::Text(s) => s,
        Value::Blob(_) => String::new(),
    }
}

fn read_exchange_rows(path: &Path) -> RosterResult<Vec<GridRow>> {
    let source = path.display().to_string();
    if !path.is_file() {
        return Err(RosterError::source_file(source, "file not found"));
    }
    let invalid = |e: rusqlite::Error| RosterError::source_file(source.as_str(), e.to_string());

    let src = Connection::open_with_flags(path, OpenFlags::SQLITE_OPEN_READ_ONLY)
        .map_err(invalid)?;
    for col in EXCHANGE_COLUMNS {
        let present = db::table_has_column(&src, "schedule", col)
            .map_err(|e| RosterError::source_file(source.as_str(), e.to_string()))?;
        if !present {
            return Err(RosterError::source_file(
                source.as_str(),
                format!("schedule table lacks column {col}"),
            ));
        }
    }

    let mut stmt = src
        .prepare(
            "SELECT student_name, course_name, credit, time_slot, classroom
             FROM schedule ORDER BY id",
        )
        .map_err(invalid)?;
    let rows = stmt
        .query_map([], |r| {
            Ok(GridRow {
                student: cell_text(r.get(0)?),
                course: cell_text(r.get(1)?),
                credit: cell_text(r.get(2)?),
                time_slot: cell_text(r.get(3)?),
                classroom: cell_text(r.get(4)?),
                ..GridRow::default()
            })
        })
        .and_then(|it| it.collect::<Result<Vec<_>, _>>())
        .map_err(invalid)?;
    Ok(rows)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DbImport {
    pub imported: usize,
    pub skipped: usize,
}

/// Validates every row of the file first, then replaces the stored schedule.
/// Rows without a student or course are skipped.
pub fn import_db(conn: &Connection, path: &Path, rules: &RowRules) -> RosterResult<DbImport> {
    let rows = read_exchange_rows(path)?;
    let mut entries = Vec::with_capacity(rows.len());
    let mut skipped = 0usize;
    for (idx, row) in rows.iter().enumerate() {
        match rules.check(idx, row) {
            RowCheck::Valid { entry, .. } => entries.push(entry),
            RowCheck::Skip => skipped += 1,
            RowCheck::Invalid(e) => {
                return Err(RosterError::source_file(
                    path.display().to_string(),
                    format!("row {}: {e}", idx + 1),
                ))
            }
        }
    }
    let imported = store::bulk_replace_schedule(conn, &entries)?;
    tracing::info!(path = %path.display(), imported, skipped, "schedule imported from db file");
    Ok(DbImport { imported, skipped })
}
