mod test_support;

use serde_json::json;
use test_support::{request_err_code, request_ok, spawn_sidecar, temp_dir};

fn comparable(entries: &serde_json::Value) -> Vec<serde_json::Value> {
    entries
        .as_array()
        .expect("entries")
        .iter()
        .map(|e| {
            let mut e = e.clone();
            e.as_object_mut().expect("object").remove("id");
            e
        })
        .collect()
}

#[test]
fn sheet_export_then_import_reproduces_schedule() {
    let workspace = temp_dir("rosterd-sheet-roundtrip");
    let sheet = workspace.join("schedule.csv");
    let (mut child, mut stdin, mut reader) = spawn_sidecar();
    request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "workspace.select",
        json!({ "path": workspace.to_string_lossy() }),
    );
    request_ok(&mut stdin, &mut reader, "2", "data.initialize", json!({}));
    request_ok(&mut stdin, &mut reader, "3", "schedule.generate", json!({ "seed": 11 }));
    let before = request_ok(&mut stdin, &mut reader, "4", "schedule.list", json!({}));

    let exported = request_ok(
        &mut stdin,
        &mut reader,
        "5",
        "schedule.exportSheet",
        json!({ "path": sheet.to_string_lossy() }),
    );
    assert_eq!(exported["rows"], 15);
    let text = std::fs::read_to_string(&sheet).expect("read sheet");
    assert!(text.contains("学生姓名,班级,课程名称,学分,星期,行课时间,周数,教室"));
    assert!(!text.contains(",H1") && !text.contains(",H2") && !text.contains(",H4"));

    request_ok(&mut stdin, &mut reader, "6", "schedule.clear", json!({}));
    let imported = request_ok(
        &mut stdin,
        &mut reader,
        "7",
        "schedule.importSheet",
        json!({ "path": sheet.to_string_lossy() }),
    );
    assert_eq!(imported["import"]["imported"], 15);
    assert_eq!(imported["import"]["skipped"], 0);
    assert_eq!(imported["import"]["layout"], "extended");

    let after = request_ok(&mut stdin, &mut reader, "8", "schedule.list", json!({}));
    assert_eq!(comparable(&before["entries"]), comparable(&after["entries"]));

    drop(stdin);
    let _ = child.wait();
}

#[test]
fn grid_rows_are_exported_when_given() {
    let workspace = temp_dir("rosterd-sheet-grid");
    let sheet = workspace.join("grid.csv");
    let (mut child, mut stdin, mut reader) = spawn_sidecar();

    let exported = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "schedule.exportSheet",
        json!({
            "path": sheet.to_string_lossy(),
            "rows": [{ "student": "A", "course": "Math", "credit": 4, "classroom": "H1203" }, {}]
        }),
    );
    assert_eq!(exported["rows"], 1);
    let text = std::fs::read_to_string(&sheet).expect("read");
    assert!(text.ends_with("A,,Math,4,,,,1203\n"));

    drop(stdin);
    let _ = child.wait();
}

#[test]
fn malformed_sheet_aborts_without_touching_schedule() {
    let workspace = temp_dir("rosterd-sheet-bad");
    let sheet = workspace.join("bad.csv");
    std::fs::write(
        &sheet,
        "学生姓名,课程名称,学分,行课时间,教室\n张三,高等数学,4,上午一段,1203\n李四,线性代数,x,上午二段,1204\n",
    )
    .expect("write");
    let (mut child, mut stdin, mut reader) = spawn_sidecar();
    request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "workspace.select",
        json!({ "path": workspace.to_string_lossy() }),
    );
    request_ok(&mut stdin, &mut reader, "2", "data.initialize", json!({}));
    request_ok(&mut stdin, &mut reader, "3", "schedule.generate", json!({ "seed": 5 }));

    let code = request_err_code(
        &mut stdin,
        &mut reader,
        "4",
        "schedule.importSheet",
        json!({ "path": sheet.to_string_lossy() }),
    );
    assert_eq!(code, "source_file_invalid");
    let listed = request_ok(&mut stdin, &mut reader, "5", "schedule.list", json!({}));
    assert_eq!(listed["entries"].as_array().map(|a| a.len()), Some(15));

    drop(stdin);
    let _ = child.wait();
}

#[test]
fn db_file_exchange_round_trips_minimal_columns() {
    let workspace = temp_dir("rosterd-db-exchange");
    let file = workspace.join("exchange.db");
    let (mut child, mut stdin, mut reader) = spawn_sidecar();
    request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "workspace.select",
        json!({ "path": workspace.to_string_lossy() }),
    );
    request_ok(&mut stdin, &mut reader, "2", "data.initialize", json!({}));
    request_ok(&mut stdin, &mut reader, "3", "schedule.generate", json!({ "seed": 9 }));

    let exported = request_ok(
        &mut stdin,
        &mut reader,
        "4",
        "schedule.exportDb",
        json!({ "path": file.to_string_lossy() }),
    );
    assert_eq!(exported["rows"], 15);

    request_ok(&mut stdin, &mut reader, "5", "schedule.clear", json!({}));
    let imported = request_ok(
        &mut stdin,
        &mut reader,
        "6",
        "schedule.importDb",
        json!({ "path": file.to_string_lossy() }),
    );
    assert_eq!(imported["imported"], 15);
    assert_eq!(imported["skipped"], 0);

    let listed = request_ok(&mut stdin, &mut reader, "7", "schedule.list", json!({}));
    let first = &listed["entries"][0];
    assert_eq!(first["studentName"], "张三");
    assert_eq!(first["timeSlot"], "AM1");
    // Only the minimal columns travel through the file.
    assert!(first["weekday"].is_null());
    assert!(first["className"].is_null());

    let code = request_err_code(
        &mut stdin,
        &mut reader,
        "8",
        "schedule.exportDb",
        json!({ "path": workspace.join("schedule.sqlite3").to_string_lossy() }),
    );
    assert_eq!(code, "precondition_failed");
    let health = request_ok(&mut stdin, &mut reader, "9", "health", json!({}));
    assert_eq!(health["counts"]["students"], 3);
    assert_eq!(health["counts"]["entries"], 15);

    drop(stdin);
    let _ = child.wait();
}

#[test]
fn template_has_header_and_one_blank_row() {
    let workspace = temp_dir("rosterd-template");
    let file = workspace.join("template.csv");
    let (mut child, mut stdin, mut reader) = spawn_sidecar();

    request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "schedule.exportTemplate",
        json!({ "path": file.to_string_lossy() }),
    );
    let text = std::fs::read_to_string(&file).expect("read");
    let lines: Vec<&str> = text.trim_start_matches('\u{feff}').lines().collect();
    assert_eq!(lines, vec!["学生姓名,班级,课程名称,学分,星期,行课时间,周数,教室", ",,,,,,,"]);

    drop(stdin);
    let _ = child.wait();
}
