//! Entities plus the field-level validation shared by manual entry,
//! grid reconciliation, file import and generation.

use crate::error::{RosterError, RosterResult};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::OnceLock;

pub const CLASSROOM_PREFIX: char = 'H';

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Weekday {
    Mon,
    Tue,
    Wed,
    Thu,
    Fri,
    Sat,
}

pub const WEEKDAYS: [Weekday; 6] = [
    Weekday::Mon,
    Weekday::Tue,
    Weekday::Wed,
    Weekday::Thu,
    Weekday::Fri,
    Weekday::Sat,
];

impl Weekday {
    pub fn code(self) -> &'static str {
        match self {
            Self::Mon => "Mon",
            Self::Tue => "Tue",
            Self::Wed => "Wed",
            Self::Thu => "Thu",
            Self::Fri => "Fri",
            Self::Sat => "Sat",
        }
    }

    fn long_name(self) -> &'static str {
        match self {
            Self::Mon => "monday",
            Self::Tue => "tuesday",
            Self::Wed => "wednesday",
            Self::Thu => "thursday",
            Self::Fri => "friday",
            Self::Sat => "saturday",
        }
    }

    fn legacy_label(self) -> &'static str {
        match self {
            Self::Mon => "周一",
            Self::Tue => "周二",
            Self::Wed => "周三",
            Self::Thu => "周四",
            Self::Fri => "周五",
            Self::Sat => "周六",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        let t = s.trim();
        let lower = t.to_ascii_lowercase();
        WEEKDAYS.iter().copied().find(|d| {
            lower == d.code().to_ascii_lowercase() || lower == d.long_name() || t == d.legacy_label()
        })
    }
}

impl fmt::Display for Weekday {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TimeSlot {
    AM1,
    AM2,
    PM1,
    PM2,
    Evening,
}

pub const TIME_SLOTS: [TimeSlot; 5] = [
    TimeSlot::AM1,
    TimeSlot::AM2,
    TimeSlot::PM1,
    TimeSlot::PM2,
    TimeSlot::Evening,
];

impl TimeSlot {
    pub fn code(self) -> &'static str {
        match self {
            Self::AM1 => "AM1",
            Self::AM2 => "AM2",
            Self::PM1 => "PM1",
            Self::PM2 => "PM2",
            Self::Evening => "Evening",
        }
    }

    pub(crate) fn legacy_label(self) -> &'static str {
        match self {
            Self::AM1 => "上午一段",
            Self::AM2 => "上午二段",
            Self::PM1 => "下午一段",
            Self::PM2 => "下午二段",
            Self::Evening => "晚修",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        let t = s.trim();
        let lower = t.to_ascii_lowercase();
        TIME_SLOTS
            .iter()
            .copied()
            .find(|ts| lower == ts.code().to_ascii_lowercase() || t == ts.legacy_label())
    }
}

impl fmt::Display for TimeSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Student {
    pub name: String,
    #[serde(default)]
    pub class_name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Course {
    pub name: String,
    pub credit: f64,
    #[serde(default)]
    pub week_range: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleEntry {
    /// Row id once persisted; `None` for entries not yet written.
    pub id: Option<i64>,
    pub student_name: String,
    pub class_name: Option<String>,
    pub course_name: String,
    pub credit: f64,
    pub weekday: Option<Weekday>,
    pub time_slot: Option<TimeSlot>,
    pub week_range: Option<String>,
    pub classroom: String,
}

pub fn required_name(field: &'static str, raw: &str) -> RosterResult<String> {
    let name = raw.trim();
    if name.is_empty() {
        return Err(RosterError::validation(field, "must not be empty"));
    }
    Ok(name.to_string())
}

impl Student {
    /// Builds a student from form input: trimmed, non-empty name.
    pub fn from_input(name: &str, class_name: &str) -> RosterResult<Self> {
        Ok(Self {
            name: required_name("name", name)?,
            class_name: class_name.trim().to_string(),
        })
    }
}

impl Course {
    /// Builds a course from form input. A trailing `周` on the week range is dropped.
    pub fn from_input(name: &str, credit: &str, week_range: &str) -> RosterResult<Self> {
        Ok(Self {
            name: required_name("name", name)?,
            credit: parse_credit(credit)?,
            week_range: normalize_week_range(week_range),
        })
    }
}

/// Parses a credit value. Halves and other decimals are allowed; negatives are not.
pub fn parse_credit(raw: &str) -> RosterResult<f64> {
    let t = raw.trim();
    let v = t
        .parse::<f64>()
        .map_err(|_| RosterError::validation("credit", format!("not a number: {t:?}")))?;
    if !v.is_finite() || v < 0.0 {
        return Err(RosterError::validation(
            "credit",
            format!("must be a non-negative number: {t:?}"),
        ));
    }
    Ok(v)
}

pub fn format_credit(v: f64) -> String {
    if v.fract() == 0.0 {
        format!("{v:.0}")
    } else {
        v.to_string()
    }
}

pub fn parse_weekday(raw: &str) -> RosterResult<Option<Weekday>> {
    if raw.trim().is_empty() {
        return Ok(None);
    }
    Weekday::parse(raw)
        .map(Some)
        .ok_or_else(|| RosterError::validation("weekday", format!("unknown weekday: {:?}", raw.trim())))
}

pub fn parse_time_slot(raw: &str) -> RosterResult<Option<TimeSlot>> {
    if raw.trim().is_empty() {
        return Ok(None);
    }
    TimeSlot::parse(raw).map(Some).ok_or_else(|| {
        RosterError::validation("timeSlot", format!("unknown time slot: {:?}", raw.trim()))
    })
}

/// Week ranges are stored without the trailing week marker, e.g. "3-16周" -> "3-16".
pub fn normalize_week_range(raw: &str) -> String {
    raw.trim().trim_end_matches('周').trim_end().to_string()
}

/// Ensures the classroom carries the `H` prefix. Idempotent.
pub fn normalize_classroom(raw: &str) -> String {
    let t = raw.trim();
    if t.starts_with(CLASSROOM_PREFIX) {
        t.to_string()
    } else {
        format!("{CLASSROOM_PREFIX}{t}")
    }
}

/// Inverse of `normalize_classroom` for spreadsheet write-out.
pub fn strip_classroom_prefix(classroom: &str) -> &str {
    classroom.strip_prefix(CLASSROOM_PREFIX).unwrap_or(classroom)
}

static CLASSROOM_RE: OnceLock<Regex> = OnceLock::new();

fn classroom_regex() -> &'static Regex {
    CLASSROOM_RE.get_or_init(|| {
        // Building 1/2/4, two-digit room, optional section digit.
        Regex::new(r"^H[124]\d{2}[1-9]?$")
            .unwrap_or_else(|error| panic!("classroom regex failed to compile: {error}"))
    })
}

pub fn is_valid_classroom(classroom: &str) -> bool {
    classroom_regex().is_match(classroom)
}

/// Normalizes then validates a classroom code.
pub fn validate_classroom(raw: &str) -> RosterResult<String> {
    let normalized = normalize_classroom(raw);
    if is_valid_classroom(&normalized) {
        Ok(normalized)
    } else {
        Err(RosterError::validation(
            "classroom",
            format!("{normalized:?} does not match H<building 1|2|4><room 00-99>[section 1-9]"),
        ))
    }
}
