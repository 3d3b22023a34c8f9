use crate::error::RosterResult;
use rusqlite::Connection;
use serde::{Deserialize, Serialize};

/// Column the schedule is grouped by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum FrequencyKey {
    Course,
    Student,
    Weekday,
    TimeSlot,
    Classroom,
}

impl FrequencyKey {
    fn column(self) -> &'static str {
        match self {
            Self::Course => "course_name",
            Self::Student => "student_name",
            Self::Weekday => "weekday",
            Self::TimeSlot => "time_slot",
            Self::Classroom => "classroom",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Bucket {
    pub label: String,
    pub count: i64,
}

/// Entry counts per distinct value, most frequent first; ties by label.
/// Entries with no value for the key are grouped under an empty label.
pub fn frequency(conn: &Connection, key: FrequencyKey) -> RosterResult<Vec<Bucket>> {
    let col = key.column();
    let sql = format!(
        "SELECT COALESCE({col}, '') AS label, COUNT(*) AS n
         FROM schedule
         GROUP BY label
         ORDER BY n DESC, label ASC"
    );
    let mut stmt = conn.prepare(&sql)?;
    let buckets = stmt
        .query_map([], |r| {
            Ok(Bucket {
                label: r.get(0)?,
                count: r.get(1)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(buckets)
}
