use crate::ipc::error::{fail, respond};
use crate::ipc::helpers::{decode_param, no_workspace, required_str, text_param};
use crate::ipc::types::{AppState, Request};
use crate::model::Student;
use crate::store;
use serde::Deserialize;
use serde_json::json;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StudentInput {
    name: String,
    #[serde(default)]
    class_name: String,
}

fn handle_students_list(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(conn) = state.db.as_ref() else {
        return no_workspace(req);
    };
    respond(&req.id, store::list_students(conn), |students| {
        json!({ "students": students })
    })
}

fn handle_students_create(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(conn) = state.db.as_ref() else {
        return no_workspace(req);
    };
    let name = match required_str(req, "name") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let student = match Student::from_input(name, &text_param(req, "className")) {
        Ok(s) => s,
        Err(e) => return fail(&req.id, &e),
    };
    let res = store::insert_student(conn, &student);
    if res.is_ok() {
        tracing::info!(student = %student.name, "student added");
        state.lookups.invalidate();
    }
    respond(&req.id, res, |()| json!({ "student": student }))
}

/// All-or-nothing: one invalid or duplicate name rejects the batch.
fn handle_students_bulk_create(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(conn) = state.db.as_ref() else {
        return no_workspace(req);
    };
    let inputs: Vec<StudentInput> = match decode_param(req, "students") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let students = match inputs
        .iter()
        .map(|s| Student::from_input(&s.name, &s.class_name))
        .collect::<Result<Vec<_>, _>>()
    {
        Ok(v) => v,
        Err(e) => return fail(&req.id, &e),
    };
    let res = store::insert_students(conn, &students);
    if let Ok(inserted) = res {
        tracing::info!(inserted, "students added");
        state.lookups.invalidate();
    }
    respond(&req.id, res, |inserted| json!({ "inserted": inserted }))
}

fn handle_students_update(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(conn) = state.db.as_ref() else {
        return no_workspace(req);
    };
    let (old_name, name) = match (required_str(req, "oldName"), required_str(req, "name")) {
        (Ok(o), Ok(n)) => (o, n),
        (Err(resp), _) | (_, Err(resp)) => return resp,
    };
    let student = match Student::from_input(name, &text_param(req, "className")) {
        Ok(s) => s,
        Err(e) => return fail(&req.id, &e),
    };
    let res = store::update_student(conn, old_name.trim(), &student);
    if res.is_ok() {
        tracing::info!(from = old_name, to = %student.name, "student updated");
        state.lookups.invalidate();
    }
    respond(&req.id, res, |()| json!({ "student": student }))
}

fn handle_students_delete(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(conn) = state.db.as_ref() else {
        return no_workspace(req);
    };
    let name = match required_str(req, "name") {
        Ok(v) => v.trim(),
        Err(resp) => return resp,
    };
    let res = store::delete_student(conn, name);
    if res.is_ok() {
        tracing::info!(student = name, "student deleted");
        state.lookups.invalidate();
    }
    respond(&req.id, res, |()| json!({ "deleted": name }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "students.list" => Some(handle_students_list(state, req)),
        "students.create" => Some(handle_students_create(state, req)),
        "students.bulkCreate" => Some(handle_students_bulk_create(state, req)),
        "students.update" => Some(handle_students_update(state, req)),
        "students.delete" => Some(handle_students_delete(state, req)),
        _ => None,
    }
}
