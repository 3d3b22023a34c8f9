use crate::config::ScheduleStartup;
use crate::model::TIME_SLOTS;
use anyhow::Context;
use rusqlite::Connection;
use std::path::{Path, PathBuf};

pub const DB_FILE_NAME: &str = "schedule.sqlite3";
/// File name used by the older desktop tool.
pub const LEGACY_DB_FILE_NAME: &str = "schedule.db";

/// The store file for `workspace`. A legacy `schedule.db` is used in place
/// when no `schedule.sqlite3` exists yet.
pub fn db_path(workspace: &Path) -> PathBuf {
    let current = workspace.join(DB_FILE_NAME);
    let legacy = workspace.join(LEGACY_DB_FILE_NAME);
    if !current.exists() && legacy.is_file() {
        legacy
    } else {
        current
    }
}

pub fn open_db(workspace: &Path, startup: ScheduleStartup) -> anyhow::Result<Connection> {
    std::fs::create_dir_all(workspace)
        .with_context(|| format!("failed to create workspace {}", workspace.to_string_lossy()))?;
    let db_path = db_path(workspace);
    if db_path.ends_with(LEGACY_DB_FILE_NAME) {
        tracing::info!(path = %db_path.display(), "opening legacy store file");
    }
    let conn = Connection::open(&db_path)
        .with_context(|| format!("failed to open {}", db_path.to_string_lossy()))?;
    init_schema(&conn, startup)?;
    Ok(conn)
}

pub fn init_schema(conn: &Connection, startup: ScheduleStartup) -> anyhow::Result<()> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS students(
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            student_name TEXT NOT NULL UNIQUE,
            class_name TEXT
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS courses(
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            course_name TEXT NOT NULL UNIQUE,
            credit REAL NOT NULL DEFAULT 0,
            week_range TEXT
        )",
        [],
    )?;
    // Workspaces written by the older desktop tool kept the week range in `semester`.
    ensure_courses_week_range(conn)?;

    if startup == ScheduleStartup::Recreate {
        tracing::warn!("dropping schedule table at startup (recreate policy)");
        conn.execute("DROP TABLE IF EXISTS schedule", [])?;
    }

    conn.execute(
        "CREATE TABLE IF NOT EXISTS schedule(
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            student_name TEXT NOT NULL,
            class_name TEXT,
            course_name TEXT NOT NULL,
            credit REAL NOT NULL DEFAULT 0,
            weekday TEXT,
            time_slot TEXT,
            week_range TEXT,
            classroom TEXT NOT NULL,
            created_at TEXT
        )",
        [],
    )?;
    ensure_schedule_columns(conn)?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_schedule_student ON schedule(student_name)",
        [],
    )?;

    migrate_time_slot_labels(conn)?;

    Ok(())
}

fn ensure_courses_week_range(conn: &Connection) -> anyhow::Result<()> {
    if table_has_column(conn, "courses", "week_range")? {
        return Ok(());
    }
    if table_has_column(conn, "courses", "semester")? {
        conn.execute("ALTER TABLE courses RENAME COLUMN semester TO week_range", [])?;
    } else {
        conn.execute("ALTER TABLE courses ADD COLUMN week_range TEXT", [])?;
    }
    Ok(())
}

fn ensure_schedule_columns(conn: &Connection) -> anyhow::Result<()> {
    for column in ["class_name", "weekday", "week_range", "created_at"] {
        if !table_has_column(conn, "schedule", column)? {
            tracing::info!(column, "adding missing schedule column");
            conn.execute(&format!("ALTER TABLE schedule ADD COLUMN {} TEXT", column), [])?;
        }
    }
    Ok(())
}

fn migrate_time_slot_labels(conn: &Connection) -> anyhow::Result<()> {
    // Older files stored the display label instead of the slot code.
    for slot in TIME_SLOTS {
        conn.execute(
            "UPDATE schedule SET time_slot = ? WHERE time_slot = ?",
            (slot.code(), slot.legacy_label()),
        )?;
    }
    Ok(())
}

pub fn table_has_column(conn: &Connection, table: &str, column: &str) -> anyhow::Result<bool> {
    let sql = format!("PRAGMA table_info({})", table);
    let mut stmt = conn.prepare(&sql)?;
    let mut rows = stmt.query([])?;
    while let Some(row) = rows.next()? {
        let name: String = row.get(1)?;
        if name == column {
            return Ok(true);
        }
    }
    Ok(false)
}

#[cfg(test)]
pub fn open_memory() -> Connection {
    let conn = Connection::open_in_memory().expect("open in-memory db");
    init_schema(&conn, ScheduleStartup::Migrate).expect("init schema");
    conn
}
