//! Spreadsheet exchange in CSV form.
//!
//! Two layouts are read: the basic five columns and the extended eight. Export
//! always writes the extended layout. Columns are found by header name, so
//! their order does not matter.

use crate::error::{RosterError, RosterResult};
use crate::model;
use crate::reconcile::{GridRow, RowCheck, RowIssue, RowRules};
use crate::store;
use rusqlite::Connection;
use serde::Serialize;
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Column {
    Student,
    ClassName,
    Course,
    Credit,
    Weekday,
    TimeSlot,
    WeekRange,
    Classroom,
}

const REQUIRED: [(Column, &str); 5] = [
    (Column::Student, "学生姓名"),
    (Column::Course, "课程名称"),
    (Column::Credit, "学分"),
    (Column::TimeSlot, "行课时间"),
    (Column::Classroom, "教室"),
];

pub const EXTENDED_HEADER: [&str; 8] = [
    "学生姓名", "班级", "课程名称", "学分", "星期", "行课时间", "周数", "教室",
];

fn column_for_header(h: &str) -> Option<Column> {
    match h.trim() {
        "学生姓名" | "student_name" => Some(Column::Student),
        "班级" | "class_name" => Some(Column::ClassName),
        "课程名称" | "course_name" => Some(Column::Course),
        "学分" | "credit" => Some(Column::Credit),
        "星期" | "weekday" => Some(Column::Weekday),
        "行课时间" | "time_slot" => Some(Column::TimeSlot),
        "周数" | "week_range" => Some(Column::WeekRange),
        "教室" | "classroom" => Some(Column::Classroom),
        _ => None,
    }
}

fn csv_quote(s: &str) -> String {
    if s.contains(',') || s.contains('"') || s.contains('\n') || s.contains('\r') {
        format!("\"{}\"", s.replace('"', "\"\""))
    } else {
        s.to_string()
    }
}

/// Splits CSV text into records, each tagged with the 1-based line it starts
/// on. Quoted cells may span lines.
fn parse_csv_records(text: &str) -> Vec<(usize, Vec<String>)> {
    let mut records = Vec::new();
    let mut cells: Vec<String> = Vec::new();
    let mut buf = String::new();
    let mut in_quotes = false;
    let mut line = 1usize;
    let mut start = 1usize;
    let mut chars = text.chars().peekable();
    while let Some(ch) = chars.next() {
        match ch {
            '"' if in_quotes && chars.peek() == Some(&'"') => {
                buf.push('"');
                chars.next();
            }
            '"' => in_quotes = !in_quotes,
            ',' if !in_quotes => cells.push(std::mem::take(&mut buf)),
            '\r' if !in_quotes && chars.peek() == Some(&'\n') => {}
            '\n' if !in_quotes => {
                cells.push(std::mem::take(&mut buf));
                records.push((start, std::mem::take(&mut cells)));
                line += 1;
                start = line;
            }
            '\n' => {
                buf.push(ch);
                line += 1;
            }
            _ => buf.push(ch),
        }
    }
    if !buf.is_empty() || !cells.is_empty() {
        cells.push(buf);
        records.push((start, cells));
    }
    records
}

fn csv_line(cells: &[&str]) -> String {
    cells
        .iter()
        .map(|c| csv_quote(c))
        .collect::<Vec<_>>()
        .join(",")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum SheetLayout {
    Basic,
    Extended,
}

/// A fully validated sheet. Nothing has been written yet.
#[derive(Debug)]
pub struct ParsedSheet {
    pub layout: SheetLayout,
    pub rows: Vec<GridRow>,
}

/// Parses CSV text into grid rows. Blank lines and rows with every cell empty
/// are dropped.
pub fn parse_sheet(text: &str, source: &str) -> RosterResult<ParsedSheet> {
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);
    let mut records = parse_csv_records(text)
        .into_iter()
        .filter(|(_, cells)| cells.iter().any(|c| !c.trim().is_empty()));

    let Some((_, header_cells)) = records.next() else {
        return Err(RosterError::source_file(source, "empty file"));
    };
    let header: Vec<Option<Column>> = header_cells
        .iter()
        .map(|h| column_for_header(h))
        .collect();
    for (col, label) in REQUIRED {
        if !header.contains(&Some(col)) {
            return Err(RosterError::source_file(
                source,
                format!("missing column {label}"),
            ));
        }
    }
    let layout = if header.contains(&Some(Column::ClassName))
        || header.contains(&Some(Column::Weekday))
        || header.contains(&Some(Column::WeekRange))
    {
        SheetLayout::Extended
    } else {
        SheetLayout::Basic
    };

    let mut rows = Vec::new();
    for (line_no, cells) in records {
        if cells.len() < header.len() {
            return Err(RosterError::source_file(
                source,
                format!(
                    "line {}: expected {} cells, found {}",
                    line_no,
                    header.len(),
                    cells.len()
                ),
            ));
        }
        let mut row = GridRow::default();
        for (col, cell) in header.iter().zip(cells) {
            let slot = match col {
                Some(Column::Student) => &mut row.student,
                Some(Column::ClassName) => &mut row.class_name,
                Some(Column::Course) => &mut row.course,
                Some(Column::Credit) => &mut row.credit,
                Some(Column::Weekday) => &mut row.weekday,
                Some(Column::TimeSlot) => &mut row.time_slot,
                Some(Column::WeekRange) => &mut row.week_range,
                Some(Column::Classroom) => &mut row.classroom,
                None => continue,
            };
            *slot = cell.trim().to_string();
        }
        rows.push(row);
    }
    Ok(ParsedSheet { layout, rows })
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SheetImport {
    pub layout: SheetLayout,
    pub imported: usize,
    pub skipped: usize,
    pub warnings: Vec<RowIssue>,
}

/// Reads, validates and then replaces the schedule with the sheet's rows.
///
/// Rows without a student or course are counted as skipped. Any invalid row
/// fails the whole import with `SourceFile` and the store is left untouched.
pub fn import_sheet(conn: &Connection, path: &Path, rules: &RowRules) -> RosterResult<SheetImport> {
    let source = path.to_string_lossy().to_string();
    let text = std::fs::read_to_string(path)
        .map_err(|e| RosterError::source_file(source.as_str(), e.to_string()))?;
    let parsed = parse_sheet(&text, &source)?;

    let mut entries = Vec::with_capacity(parsed.rows.len());
    let mut warnings = Vec::new();
    let mut skipped = 0usize;
    for (idx, row) in parsed.rows.iter().enumerate() {
        match rules.check(idx, row) {
            RowCheck::Valid { entry, warnings: w } => {
                entries.push(entry);
                warnings.extend(w);
            }
            RowCheck::Skip => skipped += 1,
            RowCheck::Invalid(e) => {
                return Err(RosterError::source_file(
                    source,
                    format!("row {}: {e}", idx + 1),
                ))
            }
        }
    }

    let imported = store::bulk_replace_schedule(conn, &entries)?;
    tracing::info!(path = %source, imported, skipped, "sheet imported");
    Ok(SheetImport {
        layout: parsed.layout,
        imported,
        skipped,
        warnings,
    })
}

/// Writes `rows` in the extended layout. Classrooms lose their `H` prefix.
pub fn export_sheet(path: &Path, rows: &[GridRow]) -> RosterResult<usize> {
    let mut out = String::from('\u{feff}');
    out.push_str(&csv_line(&EXTENDED_HEADER));
    out.push('\n');
    let mut written = 0usize;
    for row in rows {
        if row.student.trim().is_empty() && row.course.trim().is_empty() {
            continue;
        }
        out.push_str(&csv_line(&[
            row.student.trim(),
            row.class_name.trim(),
            row.course.trim(),
            row.credit.trim(),
            row.weekday.trim(),
            row.time_slot.trim(),
            row.week_range.trim(),
            model::strip_classroom_prefix(row.classroom.trim()),
        ]));
        out.push('\n');
        written += 1;
    }
    std::fs::write(path, out)?;
    tracing::info!(path = %path.display(), rows = written, "sheet exported");
    Ok(written)
}

/// Extended header plus one empty row, for filling in by hand.
pub fn export_template(path: &Path) -> RosterResult<()> {
    let mut out = String::from('\u{feff}');
    out.push_str(&csv_line(&EXTENDED_HEADER));
    out.push('\n');
    out.push_str(&",".repeat(EXTENDED_HEADER.len() - 1));
    out.push('\n');
    std::fs::write(path, out)?;
    tracing::info!(path = %path.display(), "sheet template written");
    Ok(())
}

/// Grid rows for the stored schedule, in store order.
pub fn stored_rows(conn: &Connection) -> RosterResult<Vec<GridRow>> {
    Ok(store::list_schedule(conn)?
        .iter()
        .map(GridRow::from_entry)
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ClassroomPolicy;
    use crate::db::open_memory;
    use crate::lookup::Lookups;
    use crate::model::{Course, ScheduleEntry, TimeSlot, Weekday};

    fn entry(student: &str, course: &str, classroom: &str) -> ScheduleEntry {
        ScheduleEntry {
            id: None,
            student_name: student.to_string(),
            class_name: Some("计算机2101".to_string()),
            course_name: course.to_string(),
            credit: 2.5,
            weekday: Some(Weekday::Wed),
            time_slot: Some(TimeSlot::PM1),
            week_range: Some("3-16".to_string()),
            classroom: classroom.to_string(),
        }
    }

    #[test]
    fn quoted_cells_keep_commas_and_quotes() {
        let records = parse_csv_records(r#"a,"b,c","say ""hi""",,"#);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].1, vec!["a", "b,c", "say \"hi\"", "", ""]);
        assert_eq!(csv_quote("b,c"), "\"b,c\"");
    }

    #[test]
    fn basic_layout_with_bom_and_reordered_columns() {
        let text = "\u{feff}教室,学生姓名,课程名称,学分,行课时间\n1203,张三,高等数学,4,上午一段\n\n";
        let parsed = parse_sheet(text, "t.csv").expect("parse");
        assert_eq!(parsed.layout, SheetLayout::Basic);
        assert_eq!(parsed.rows.len(), 1);
        assert_eq!(parsed.rows[0].student, "张三");
        assert_eq!(parsed.rows[0].classroom, "1203");
        assert_eq!(parsed.rows[0].time_slot, "上午一段");
    }

    #[test]
    fn english_headers_are_accepted() {
        let text = "student_name,course_name,credit,time_slot,classroom,weekday\nA,Math,3,AM2,H2101,Fri\n";
        let parsed = parse_sheet(text, "t.csv").expect("parse");
        assert_eq!(parsed.layout, SheetLayout::Extended);
        assert_eq!(parsed.rows[0].weekday, "Fri");
    }

    #[test]
    fn missing_column_is_a_source_error() {
        let text = "学生姓名,课程名称,学分,教室\nA,Math,3,1203\n";
        let err = parse_sheet(text, "t.csv").expect_err("missing time slot");
        assert_eq!(err.code(), "source_file_invalid");
        assert!(err.to_string().contains("行课时间"));
    }

    #[test]
    fn short_row_is_a_source_error() {
        let text = "学生姓名,课程名称,学分,行课时间,教室\nA,Math\n";
        assert!(matches!(
            parse_sheet(text, "t.csv"),
            Err(RosterError::SourceFile { .. })
        ));
    }

    #[test]
    fn bad_row_aborts_import_before_mutation() {
        let conn = open_memory();
        store::insert_entry(&conn, &entry("Old", "Math", "H1203")).expect("seed");
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("bad.csv");
        std::fs::write(
            &path,
            "学生姓名,课程名称,学分,行课时间,教室\nA,Math,4,AM1,1203\nB,Math,lots,AM1,1203\n",
        )
        .expect("write");

        let lookups = Lookups::default();
        let rules = RowRules::load(&conn, ClassroomPolicy::Reject, &lookups).expect("rules");
        let err = import_sheet(&conn, &path, &rules).expect_err("bad credit");

        assert_eq!(err.code(), "source_file_invalid");
        let stored = store::list_schedule(&conn).expect("list");
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].student_name, "Old");
    }

    #[test]
    fn missing_file_is_a_source_error() {
        let conn = open_memory();
        let lookups = Lookups::default();
        let rules = RowRules::load(&conn, ClassroomPolicy::Reject, &lookups).expect("rules");
        let err = import_sheet(&conn, Path::new("/nonexistent/x.csv"), &rules).expect_err("missing");
        assert_eq!(err.code(), "source_file_invalid");
    }

    #[test]
    fn export_then_import_reproduces_schedule() {
        let conn = open_memory();
        store::insert_course(
            &conn,
            &Course {
                name: "Math".to_string(),
                credit: 2.5,
                week_range: "3-16".to_string(),
            },
        )
        .expect("course");
        let original = vec![
            entry("A", "Math", "H1203"),
            ScheduleEntry {
                class_name: None,
                weekday: None,
                week_range: None,
                ..entry("B, Jr.", "Math", "H412")
            },
        ];
        store::bulk_replace_schedule(&conn, &original).expect("seed");

        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("out.csv");
        let written = export_sheet(&path, &stored_rows(&conn).expect("rows")).expect("export");
        assert_eq!(written, 2);
        let text = std::fs::read_to_string(&path).expect("read");
        assert!(text.contains(",1203\n"));
        assert!(!text.contains("H1203"));

        store::clear_schedule(&conn).expect("clear");
        let lookups = Lookups::default();
        let rules = RowRules::load(&conn, ClassroomPolicy::Reject, &lookups).expect("rules");
        let summary = import_sheet(&conn, &path, &rules).expect("import");
        assert_eq!(summary.layout, SheetLayout::Extended);
        assert_eq!(summary.imported, 2);

        let strip_ids = |v: Vec<ScheduleEntry>| -> Vec<ScheduleEntry> {
            v.into_iter().map(|e| ScheduleEntry { id: None, ..e }).collect()
        };
        assert_eq!(strip_ids(store::list_schedule(&conn).expect("list")), original);
    }

    #[test]
    fn template_imports_as_empty_schedule() {
        let conn = open_memory();
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("template.csv");
        export_template(&path).expect("template");

        let parsed = parse_sheet(&std::fs::read_to_string(&path).expect("read"), "t").expect("parse");
        assert_eq!(parsed.layout, SheetLayout::Extended);
        assert!(parsed.rows.is_empty());

        let lookups = Lookups::default();
        let rules = RowRules::load(&conn, ClassroomPolicy::Reject, &lookups).expect("rules");
        assert_eq!(import_sheet(&conn, &path, &rules).expect("import").imported, 0);
    }

    #[test]
    fn quoted_cells_may_span_lines() {
        let records = parse_csv_records("h1,h2\r\n\"A\nB\",x\r\nC,y\n");
        assert_eq!(
            records,
            vec![
                (1, vec!["h1".to_string(), "h2".to_string()]),
                (2, vec!["A\nB".to_string(), "x".to_string()]),
                (4, vec!["C".to_string(), "y".to_string()]),
            ]
        );
    }

    #[test]
    fn short_row_reports_its_starting_line() {
        let text = "学生姓名,课程名称,学分,行课时间,教室\n\"A\nB\",Math,3,AM1,1203\nC,Math\n";
        let err = parse_sheet(text, "t.csv").expect_err("short row");
        assert!(err.to_string().contains("line 4"), "{err}");
    }

    #[test]
    fn multi_line_names_survive_export_and_import() {
        let conn = open_memory();
        let original = vec![
            entry("A\nB", "Math", "H1203"),
            entry("Say \"hi\", C", "Art", "H2101"),
        ];
        store::bulk_replace_schedule(&conn, &original).expect("seed");

        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("multi.csv");
        export_sheet(&path, &stored_rows(&conn).expect("rows")).expect("export");

        store::clear_schedule(&conn).expect("clear");
        let lookups = Lookups::default();
        let rules = RowRules::load(&conn, ClassroomPolicy::Reject, &lookups).expect("rules");
        let summary = import_sheet(&conn, &path, &rules).expect("import");
        assert_eq!(summary.imported, 2);

        let stored = store::list_schedule(&conn).expect("list");
        assert_eq!(stored[0].student_name, "A\nB");
        assert_eq!(stored[1].student_name, "Say \"hi\", C");
    }

    #[test]
    fn rows_missing_student_or_course_are_skipped() {
        let conn = open_memory();
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("partial.csv");
        std::fs::write(
            &path,
            "学生姓名,课程名称,学分,行课时间,教室\nA,Math,4,AM1,1203\n,Math,4,AM1,1203\nB,,,,\n",
        )
        .expect("write");

        let lookups = Lookups::default();
        let rules = RowRules::load(&conn, ClassroomPolicy::Reject, &lookups).expect("rules");
        let summary = import_sheet(&conn, &path, &rules).expect("import");

        assert_eq!(summary.imported, 1);
        assert_eq!(summary.skipped, 2);
        assert_eq!(store::list_schedule(&conn).expect("list").len(), 1);
    }
}
