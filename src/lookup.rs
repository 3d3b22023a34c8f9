use crate::error::RosterResult;
use crate::store;
use rusqlite::Connection;
use serde::Serialize;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Lookups {
    pub students: Vec<String>,
    pub courses: Vec<String>,
}

impl Lookups {
    pub fn has_student(&self, name: &str) -> bool {
        self.students.iter().any(|s| s == name)
    }

    pub fn has_course(&self, name: &str) -> bool {
        self.courses.iter().any(|c| c == name)
    }
}

/// Student and course names for pickers and soft-reference checks.
///
/// Loaded on first use after an invalidation. Every student/course mutation
/// and every workspace switch must call `invalidate`.
#[derive(Debug, Default)]
pub struct LookupCache {
    cached: Option<Lookups>,
}

impl LookupCache {
    pub fn get(&mut self, conn: &Connection) -> RosterResult<&Lookups> {
        if self.cached.is_none() {
            let students = store::list_students(conn)?
                .into_iter()
                .map(|s| s.name)
                .collect();
            let courses = store::list_courses(conn)?
                .into_iter()
                .map(|c| c.name)
                .collect();
            tracing::debug!("lookup cache refreshed");
            self.cached = Some(Lookups { students, courses });
        }
        Ok(self.cached.get_or_insert_with(Lookups::default))
    }

    pub fn invalidate(&mut self) {
        self.cached = None;
    }
}
