//! Unconstrained assignment generator.
//!
//! Every (student, course) pair gets a weekday and time slot by round-robin
//! over the fixed orders and a random classroom. Nothing checks for two
//! entries landing in the same room at the same time.

use crate::error::{RosterError, RosterResult};
use crate::model::{Course, ScheduleEntry, Student, CLASSROOM_PREFIX, TIME_SLOTS, WEEKDAYS};
use crate::store;
use rand::seq::SliceRandom;
use rand::Rng;
use rusqlite::Connection;
use serde::Serialize;
use std::ops::RangeInclusive;

pub const BUILDINGS: [char; 3] = ['1', '2', '4'];
pub const ROOM_NUMBERS: RangeInclusive<u32> = 1..=20;

pub fn random_classroom<R: Rng>(rng: &mut R) -> String {
    let building = BUILDINGS.choose(rng).copied().unwrap_or(BUILDINGS[0]);
    let room = rng.gen_range(ROOM_NUMBERS);
    format!("{CLASSROOM_PREFIX}{building}{room:02}")
}

/// Students outer, courses inner; the k-th entry takes `WEEKDAYS[k % 6]` and
/// `TIME_SLOTS[k % 5]` with one counter shared across the whole product.
pub fn generate<R: Rng>(
    students: &[Student],
    courses: &[Course],
    rng: &mut R,
) -> Vec<ScheduleEntry> {
    let mut out = Vec::with_capacity(students.len() * courses.len());
    for student in students {
        for course in courses {
            let k = out.len();
            out.push(ScheduleEntry {
                id: None,
                student_name: student.name.clone(),
                class_name: (!student.class_name.is_empty()).then(|| student.class_name.clone()),
                course_name: course.name.clone(),
                credit: course.credit,
                weekday: Some(WEEKDAYS[k % WEEKDAYS.len()]),
                time_slot: Some(TIME_SLOTS[k % TIME_SLOTS.len()]),
                week_range: (!course.week_range.is_empty()).then(|| course.week_range.clone()),
                classroom: random_classroom(rng),
            });
        }
    }
    out
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateSummary {
    pub students: usize,
    pub courses: usize,
    pub generated: usize,
}

/// Regenerates the whole schedule from the stored roster.
///
/// Fails with `Precondition` before touching the store when either the
/// student or the course list is empty.
pub fn regenerate<R: Rng>(conn: &Connection, rng: &mut R) -> RosterResult<GenerateSummary> {
    let students = store::list_students(conn)?;
    let courses = store::list_courses(conn)?;
    if students.is_empty() {
        return Err(RosterError::Precondition(
            "no students; add or initialize students first".to_string(),
        ));
    }
    if courses.is_empty() {
        return Err(RosterError::Precondition(
            "no courses; add or initialize courses first".to_string(),
        ));
    }

    let entries = generate(&students, &courses, rng);
    let generated = store::bulk_replace_schedule(conn, &entries)?;
    tracing::info!(
        students = students.len(),
        courses = courses.len(),
        generated,
        "schedule generated"
    );
    Ok(GenerateSummary {
        students: students.len(),
        courses: courses.len(),
        generated,
    })
}
