//! Grid-to-store reconciliation: turns the editable grid into the persisted
//! schedule.

use crate::config::{ClassroomPolicy, FailurePolicy};
use crate::error::{RosterError, RosterResult};
use crate::lookup::Lookups;
use crate::model::{self, ScheduleEntry};
use crate::store;
use rusqlite::Connection;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::HashMap;

/// One grid row as the forms layer sees it. Every field is raw text and may be empty.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GridRow {
    #[serde(deserialize_with = "lenient_text")]
    pub student: String,
    #[serde(deserialize_with = "lenient_text")]
    pub class_name: String,
    #[serde(deserialize_with = "lenient_text")]
    pub course: String,
    #[serde(deserialize_with = "lenient_text")]
    pub credit: String,
    #[serde(deserialize_with = "lenient_text")]
    pub weekday: String,
    #[serde(deserialize_with = "lenient_text")]
    pub time_slot: String,
    #[serde(deserialize_with = "lenient_text")]
    pub week_range: String,
    #[serde(deserialize_with = "lenient_text")]
    pub classroom: String,
}

/// Accepts strings, numbers and null for grid cells.
fn lenient_text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let v = serde_json::Value::deserialize(deserializer)?;
    Ok(match v {
        serde_json::Value::Null => String::new(),
        serde_json::Value::String(s) => s,
        other => other.to_string(),
    })
}

impl GridRow {
    pub fn from_entry(entry: &ScheduleEntry) -> Self {
        Self {
            student: entry.student_name.clone(),
            class_name: entry.class_name.clone().unwrap_or_default(),
            course: entry.course_name.clone(),
            credit: model::format_credit(entry.credit),
            weekday: entry.weekday.map(|d| d.code().to_string()).unwrap_or_default(),
            time_slot: entry
                .time_slot
                .map(|t| t.code().to_string())
                .unwrap_or_default(),
            week_range: entry.week_range.clone().unwrap_or_default(),
            classroom: entry.classroom.clone(),
        }
    }

    fn is_incomplete(&self) -> bool {
        self.student.trim().is_empty() || self.course.trim().is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RowIssue {
    /// 0-based position in the submitted grid.
    pub row: usize,
    pub code: &'static str,
    pub message: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReconcileReport {
    pub total: usize,
    pub inserted: usize,
    pub skipped: usize,
    pub rejected: usize,
    pub failed: usize,
    pub issues: Vec<RowIssue>,
    pub warnings: Vec<RowIssue>,
}

#[derive(Debug, Clone, Copy)]
pub struct ReconcileOptions {
    pub classroom_policy: ClassroomPolicy,
    pub failure_policy: FailurePolicy,
}

#[derive(Debug)]
pub enum RowCheck {
    Skip,
    Valid {
        entry: ScheduleEntry,
        warnings: Vec<RowIssue>,
    },
    Invalid(RosterError),
}

/// Validates one row. `credit_for` supplies the stored course credit used
/// when the credit cell is blank.
pub fn check_row(
    idx: usize,
    row: &GridRow,
    classroom_policy: ClassroomPolicy,
    lookups: &Lookups,
    credit_for: impl Fn(&str) -> Option<f64>,
) -> RowCheck {
    if row.is_incomplete() {
        return RowCheck::Skip;
    }
    let student_name = row.student.trim().to_string();
    let course_name = row.course.trim().to_string();
    let mut warnings = Vec::new();

    let credit = if row.credit.trim().is_empty() {
        match credit_for(&course_name) {
            Some(c) => c,
            None => {
                return RowCheck::Invalid(RosterError::validation(
                    "credit",
                    "missing and the course has no stored credit",
                ))
            }
        }
    } else {
        match model::parse_credit(&row.credit) {
            Ok(c) => c,
            Err(e) => return RowCheck::Invalid(e),
        }
    };

    let weekday = match model::parse_weekday(&row.weekday) {
        Ok(v) => v,
        Err(e) => return RowCheck::Invalid(e),
    };
    let time_slot = match model::parse_time_slot(&row.time_slot) {
        Ok(v) => v,
        Err(e) => return RowCheck::Invalid(e),
    };

    let classroom = match model::validate_classroom(&row.classroom) {
        Ok(c) => c,
        Err(e) => match classroom_policy {
            ClassroomPolicy::Reject => return RowCheck::Invalid(e),
            ClassroomPolicy::Warn => {
                warnings.push(RowIssue {
                    row: idx,
                    code: "classroom_pattern",
                    message: e.to_string(),
                });
                model::normalize_classroom(&row.classroom)
            }
        },
    };

    if !lookups.has_student(&student_name) {
        warnings.push(RowIssue {
            row: idx,
            code: "unknown_student",
            message: format!("student not in roster: {student_name}"),
        });
    }
    if !lookups.has_course(&course_name) {
        warnings.push(RowIssue {
            row: idx,
            code: "unknown_course",
            message: format!("course not in catalog: {course_name}"),
        });
    }

    let optional = |s: &str| {
        let t = s.trim();
        (!t.is_empty()).then(|| t.to_string())
    };

    RowCheck::Valid {
        entry: ScheduleEntry {
            id: None,
            student_name,
            class_name: optional(&row.class_name),
            course_name,
            credit,
            weekday,
            time_slot,
            week_range: optional(&model::normalize_week_range(&row.week_range)),
            classroom,
        },
        warnings,
    }
}

/// `check_row` bound to the current store: classroom policy, known names and
/// stored course credits. Shared by grid saves and file imports.
pub struct RowRules<'a> {
    classroom_policy: ClassroomPolicy,
    lookups: &'a Lookups,
    credits: HashMap<String, f64>,
}

impl<'a> RowRules<'a> {
    pub fn load(
        conn: &Connection,
        classroom_policy: ClassroomPolicy,
        lookups: &'a Lookups,
    ) -> RosterResult<Self> {
        let credits = store::list_courses(conn)?
            .into_iter()
            .map(|c| (c.name, c.credit))
            .collect();
        Ok(Self {
            classroom_policy,
            lookups,
            credits,
        })
    }

    pub fn check(&self, idx: usize, row: &GridRow) -> RowCheck {
        check_row(idx, row, self.classroom_policy, self.lookups, |name| {
            self.credits.get(name).copied()
        })
    }
}

/// Replaces the persisted schedule with the valid rows of `rows`.
///
/// Incomplete rows are skipped. With `ContinueOnError` each insert runs under
/// its own savepoint, so a failing row is dropped alone and the rest commit.
/// With `Strict` the first invalid or failing row aborts and rolls back
/// everything.
pub fn reconcile(
    conn: &Connection,
    rows: &[GridRow],
    opts: ReconcileOptions,
    lookups: &Lookups,
) -> RosterResult<ReconcileReport> {
    let rules = RowRules::load(conn, opts.classroom_policy, lookups)?;
    let strict = opts.failure_policy == FailurePolicy::Strict;

    let mut report = ReconcileReport {
        total: rows.len(),
        ..ReconcileReport::default()
    };

    let mut tx = conn.unchecked_transaction()?;
    store::clear_schedule_in(&tx)?;

    for (idx, row) in rows.iter().enumerate() {
        let (entry, warnings) = match rules.check(idx, row) {
            RowCheck::Skip => {
                report.skipped += 1;
                continue;
            }
            RowCheck::Invalid(e) => {
                tracing::warn!(row = idx, error = %e, "grid row rejected");
                if strict {
                    return Err(e);
                }
                report.rejected += 1;
                report.issues.push(RowIssue {
                    row: idx,
                    code: e.code(),
                    message: e.to_string(),
                });
                continue;
            }
            RowCheck::Valid { entry, warnings } => (entry, warnings),
        };
        for w in &warnings {
            tracing::warn!(row = w.row, code = w.code, "{}", w.message);
        }
        report.warnings.extend(warnings);

        if strict {
            if let Err(e) = store::insert_entry(&tx, &entry) {
                tracing::warn!(row = idx, error = %e, "grid row failed, rolling back");
                return Err(e);
            }
            report.inserted += 1;
            continue;
        }

        let sp = tx.savepoint()?;
        match store::insert_entry(&sp, &entry) {
            Ok(_) => {
                sp.commit()?;
                report.inserted += 1;
            }
            Err(e) => {
                // Dropping the savepoint rolls back this row only.
                drop(sp);
                tracing::warn!(row = idx, error = %e, "grid row failed to persist");
                report.failed += 1;
                report.issues.push(RowIssue {
                    row: idx,
                    code: e.code(),
                    message: e.to_string(),
                });
            }
        }
    }

    tx.commit()?;
    tracing::info!(
        total = report.total,
        inserted = report.inserted,
        skipped = report.skipped,
        rejected = report.rejected,
        failed = report.failed,
        "grid reconciled"
    );
    Ok(report)
}
