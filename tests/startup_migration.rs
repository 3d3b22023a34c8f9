mod test_support;

use rusqlite::Connection;
use serde_json::json;
use test_support::{request_ok, spawn_sidecar_with_env, temp_dir};

fn legacy_workspace(prefix: &str) -> std::path::PathBuf {
    let workspace = temp_dir(prefix);
    let conn = Connection::open(workspace.join("schedule.sqlite3")).expect("open");
    conn.execute_batch(
        "CREATE TABLE students (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            student_name TEXT UNIQUE, class_name TEXT
         );
         CREATE TABLE courses (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            course_name TEXT UNIQUE, credit INTEGER, semester TEXT
         );
         CREATE TABLE schedule (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            student_name TEXT, course_name TEXT, credit INTEGER,
            time_slot TEXT, classroom TEXT
         );
         INSERT INTO students(student_name, class_name) VALUES ('张三', '计算机2101');
         INSERT INTO courses(course_name, credit, semester) VALUES ('高等数学', 4, '3-16');
         INSERT INTO schedule(student_name, course_name, credit, time_slot, classroom)
         VALUES ('张三', '高等数学', 4, '下午二段', 'H1203');",
    )
    .expect("legacy schema");
    workspace
}

#[test]
fn workspace_from_env_is_migrated_in_place() {
    let workspace = legacy_workspace("rosterd-migrate");
    let workspace_env = workspace.to_string_lossy().to_string();
    let (mut child, mut stdin, mut reader) =
        spawn_sidecar_with_env(&[("ROSTERD_WORKSPACE", workspace_env.as_str())]);

    let health = request_ok(&mut stdin, &mut reader, "1", "health", json!({}));
    assert_eq!(health["counts"]["entries"], 1);

    let listed = request_ok(&mut stdin, &mut reader, "2", "schedule.list", json!({}));
    assert_eq!(listed["entries"][0]["timeSlot"], "PM2");
    assert!(listed["entries"][0]["weekday"].is_null());
    let courses = request_ok(&mut stdin, &mut reader, "3", "courses.list", json!({}));
    assert_eq!(courses["courses"][0]["weekRange"], "3-16");

    drop(stdin);
    let _ = child.wait();
}

#[test]
fn recreate_policy_discards_persisted_entries_only() {
    let workspace = legacy_workspace("rosterd-recreate");
    let (mut child, mut stdin, mut reader) =
        spawn_sidecar_with_env(&[("ROSTERD_SCHEDULE_ON_START", "recreate")]);

    request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "workspace.select",
        json!({ "path": workspace.to_string_lossy() }),
    );
    let health = request_ok(&mut stdin, &mut reader, "2", "health", json!({}));
    assert_eq!(
        health["counts"],
        json!({ "students": 1, "courses": 1, "entries": 0 })
    );

    drop(stdin);
    let _ = child.wait();
}
