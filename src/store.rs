//! Relational store adapter over the workspace SQLite file.
//!
//! Functions named `*_in` run on whatever connection or transaction they are
//! handed; the public wrappers open their own transaction so a failed batch
//! leaves the store untouched.

use crate::error::{map_unique, RosterError, RosterResult};
use crate::model::{format_credit, Course, ScheduleEntry, Student, TimeSlot, Weekday};
use rusqlite::types::Value;
use rusqlite::{Connection, Row};
use serde::Serialize;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Counts {
    pub students: i64,
    pub courses: i64,
    pub entries: i64,
}

pub fn counts(conn: &Connection) -> RosterResult<Counts> {
    let count = |table: &str| -> RosterResult<i64> {
        Ok(conn.query_row(&format!("SELECT COUNT(*) FROM {}", table), [], |r| {
            r.get(0)
        })?)
    };
    Ok(Counts {
        students: count("students")?,
        courses: count("courses")?,
        entries: count("schedule")?,
    })
}

// Students

pub fn list_students(conn: &Connection) -> RosterResult<Vec<Student>> {
    let mut stmt = conn.prepare("SELECT student_name, class_name FROM students ORDER BY id")?;
    let rows = stmt
        .query_map([], |row| {
            Ok(Student {
                name: row.get(0)?,
                class_name: row.get::<_, Option<String>>(1)?.unwrap_or_default(),
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

fn insert_student_in(conn: &Connection, student: &Student) -> RosterResult<()> {
    conn.execute(
        "INSERT INTO students(student_name, class_name) VALUES(?, ?)",
        (&student.name, &student.class_name),
    )
    .map_err(|e| map_unique(e, "student", &student.name))?;
    Ok(())
}

pub fn insert_student(conn: &Connection, student: &Student) -> RosterResult<()> {
    insert_student_in(conn, student)
}

/// Inserts every student or none; a name already present (or repeated in
/// the batch) fails the whole batch with `DuplicateKey`.
pub fn insert_students(conn: &Connection, students: &[Student]) -> RosterResult<usize> {
    let tx = conn.unchecked_transaction()?;
    for s in students {
        insert_student_in(&tx, s)?;
    }
    tx.commit()?;
    Ok(students.len())
}

/// Renames and/or reclasses `old_name`. Schedule entries keep the old name.
pub fn update_student(conn: &Connection, old_name: &str, student: &Student) -> RosterResult<()> {
    let changed = conn
        .execute(
            "UPDATE students SET student_name = ?, class_name = ? WHERE student_name = ?",
            (&student.name, &student.class_name, old_name),
        )
        .map_err(|e| map_unique(e, "student", &student.name))?;
    if changed == 0 {
        return Err(RosterError::NotFound {
            entity: "student",
            name: old_name.to_string(),
        });
    }
    Ok(())
}

pub fn delete_student(conn: &Connection, name: &str) -> RosterResult<()> {
    let changed = conn.execute("DELETE FROM students WHERE student_name = ?", [name])?;
    if changed == 0 {
        return Err(RosterError::NotFound {
            entity: "student",
            name: name.to_string(),
        });
    }
    Ok(())
}

// Courses

fn course_from_row(row: &Row<'_>) -> rusqlite::Result<Course> {
    Ok(Course {
        name: row.get(0)?,
        credit: row.get::<_, Option<f64>>(1)?.unwrap_or(0.0),
        week_range: row.get::<_, Option<String>>(2)?.unwrap_or_default(),
    })
}

pub fn list_courses(conn: &Connection) -> RosterResult<Vec<Course>> {
    let mut stmt =
        conn.prepare("SELECT course_name, credit, week_range FROM courses ORDER BY id")?;
    let rows = stmt
        .query_map([], course_from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

fn insert_course_in(conn: &Connection, course: &Course) -> RosterResult<()> {
    conn.execute(
        "INSERT INTO courses(course_name, credit, week_range) VALUES(?, ?, ?)",
        (&course.name, course.credit, &course.week_range),
    )
    .map_err(|e| map_unique(e, "course", &course.name))?;
    Ok(())
}

pub fn insert_course(conn: &Connection, course: &Course) -> RosterResult<()> {
    insert_course_in(conn, course)
}

pub fn insert_courses(conn: &Connection, courses: &[Course]) -> RosterResult<usize> {
    let tx = conn.unchecked_transaction()?;
    for c in courses {
        insert_course_in(&tx, c)?;
    }
    tx.commit()?;
    Ok(courses.len())
}

pub fn update_course(conn: &Connection, old_name: &str, course: &Course) -> RosterResult<()> {
    let changed = conn
        .execute(
            "UPDATE courses SET course_name = ?, credit = ?, week_range = ? WHERE course_name = ?",
            (&course.name, course.credit, &course.week_range, old_name),
        )
        .map_err(|e| map_unique(e, "course", &course.name))?;
    if changed == 0 {
        return Err(RosterError::NotFound {
            entity: "course",
            name: old_name.to_string(),
        });
    }
    Ok(())
}

pub fn delete_course(conn: &Connection, name: &str) -> RosterResult<()> {
    let changed = conn.execute("DELETE FROM courses WHERE course_name = ?", [name])?;
    if changed == 0 {
        return Err(RosterError::NotFound {
            entity: "course",
            name: name.to_string(),
        });
    }
    Ok(())
}

// Schedule

// Older workspaces kept raw grid text: blank credits stay TEXT and missing
// names are NULL. Both decode to their empty values.
fn text_at(row: &Row<'_>, idx: usize) -> rusqlite::Result<String> {
    Ok(match row.get::<_, Value>(idx)? {
        Value::Text(s) => s,
        Value::Integer(i) => i.to_string(),
        Value::Real(f) => format_credit(f),
        Value::Null | Value::Blob(_) => String::new(),
    })
}

fn credit_at(row: &Row<'_>, idx: usize) -> rusqlite::Result<f64> {
    Ok(match row.get::<_, Value>(idx)? {
        Value::Integer(i) => i as f64,
        Value::Real(f) => f,
        Value::Text(s) => s.trim().parse().unwrap_or(0.0),
        Value::Null | Value::Blob(_) => 0.0,
    })
}

fn entry_from_row(row: &Row<'_>) -> rusqlite::Result<ScheduleEntry> {
    let weekday: Option<String> = row.get(5)?;
    let time_slot: Option<String> = row.get(6)?;
    Ok(ScheduleEntry {
        id: Some(row.get(0)?),
        student_name: text_at(row, 1)?,
        class_name: row.get(2)?,
        course_name: text_at(row, 3)?,
        credit: credit_at(row, 4)?,
        weekday: weekday.as_deref().and_then(Weekday::parse),
        time_slot: time_slot.as_deref().and_then(TimeSlot::parse),
        week_range: row.get(7)?,
        classroom: text_at(row, 8)?,
    })
}

pub fn list_schedule(conn: &Connection) -> RosterResult<Vec<ScheduleEntry>> {
    let mut stmt = conn.prepare(
        "SELECT id, student_name, class_name, course_name, credit, weekday, time_slot,
                week_range, classroom
         FROM schedule
         ORDER BY id",
    )?;
    let rows = stmt
        .query_map([], entry_from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

/// Appends one entry on the given connection and returns its row id.
pub fn insert_entry(conn: &Connection, entry: &ScheduleEntry) -> RosterResult<i64> {
    let created_at = chrono::Utc::now().to_rfc3339();
    conn.execute(
        "INSERT INTO schedule(student_name, class_name, course_name, credit, weekday,
                              time_slot, week_range, classroom, created_at)
         VALUES(?, ?, ?, ?, ?, ?, ?, ?, ?)",
        (
            &entry.student_name,
            &entry.class_name,
            &entry.course_name,
            entry.credit,
            entry.weekday.map(Weekday::code),
            entry.time_slot.map(TimeSlot::code),
            &entry.week_range,
            &entry.classroom,
            &created_at,
        ),
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn clear_schedule_in(conn: &Connection) -> RosterResult<usize> {
    Ok(conn.execute("DELETE FROM schedule", [])?)
}

pub fn clear_schedule(conn: &Connection) -> RosterResult<usize> {
    clear_schedule_in(conn)
}

/// Deletes every entry and inserts `entries` in one transaction.
pub fn bulk_replace_schedule(conn: &Connection, entries: &[ScheduleEntry]) -> RosterResult<usize> {
    let tx = conn.unchecked_transaction()?;
    let removed = clear_schedule_in(&tx)?;
    for e in entries {
        insert_entry(&tx, e)?;
    }
    tx.commit()?;
    tracing::info!(removed, inserted = entries.len(), "schedule replaced");
    Ok(entries.len())
}

pub fn delete_entry(conn: &Connection, id: i64) -> RosterResult<()> {
    let changed = conn.execute("DELETE FROM schedule WHERE id = ?", [id])?;
    if changed == 0 {
        return Err(RosterError::NotFound {
            entity: "schedule entry",
            name: id.to_string(),
        });
    }
    Ok(())
}

pub fn delete_entries_for_student(conn: &Connection, student_name: &str) -> RosterResult<usize> {
    Ok(conn.execute(
        "DELETE FROM schedule WHERE student_name = ?",
        [student_name],
    )?)
}

// Whole-store operations

fn clear_all_in(conn: &Connection) -> RosterResult<()> {
    conn.execute("DELETE FROM schedule", [])?;
    conn.execute("DELETE FROM students", [])?;
    conn.execute("DELETE FROM courses", [])?;
    conn.execute(
        "DELETE FROM sqlite_sequence WHERE name IN ('students', 'courses', 'schedule')",
        [],
    )?;
    Ok(())
}

/// Empties all three tables and resets their id counters. All or nothing.
pub fn clear_all(conn: &Connection) -> RosterResult<()> {
    let tx = conn.unchecked_transaction()?;
    clear_all_in(&tx)?;
    tx.commit()?;
    tracing::info!("store cleared");
    Ok(())
}

/// `clear_all` followed by the given students and courses, in one transaction.
pub fn reinitialize(
    conn: &Connection,
    students: &[Student],
    courses: &[Course],
) -> RosterResult<Counts> {
    let tx = conn.unchecked_transaction()?;
    clear_all_in(&tx)?;
    for s in students {
        insert_student_in(&tx, s)?;
    }
    for c in courses {
        insert_course_in(&tx, c)?;
    }
    tx.commit()?;
    tracing::info!(
        students = students.len(),
        courses = courses.len(),
        "store reinitialized"
    );
    counts(conn)
}
