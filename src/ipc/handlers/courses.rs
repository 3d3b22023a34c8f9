use crate::ipc::error::{fail, respond};
use crate::ipc::helpers::{decode_param, no_workspace, required_str, text_param};
use crate::ipc::types::{AppState, Request};
use crate::model::Course;
use crate::store;
use serde::{Deserialize, Deserializer};
use serde_json::json;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CourseInput {
    name: String,
    #[serde(deserialize_with = "number_or_text")]
    credit: String,
    #[serde(default)]
    week_range: String,
}

/// Credits arrive either as JSON numbers or as the text typed into the form.
fn number_or_text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::String(s) => s,
        serde_json::Value::Null => String::new(),
        other => other.to_string(),
    })
}

fn handle_courses_list(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(conn) = state.db.as_ref() else {
        return no_workspace(req);
    };
    respond(&req.id, store::list_courses(conn), |courses| {
        json!({ "courses": courses })
    })
}

fn course_from_params(req: &Request) -> Result<Course, serde_json::Value> {
    let name = required_str(req, "name")?;
    Course::from_input(
        name,
        &text_param(req, "credit"),
        &text_param(req, "weekRange"),
    )
    .map_err(|e| fail(&req.id, &e))
}

fn handle_courses_create(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(conn) = state.db.as_ref() else {
        return no_workspace(req);
    };
    let course = match course_from_params(req) {
        Ok(c) => c,
        Err(resp) => return resp,
    };
    let res = store::insert_course(conn, &course);
    if res.is_ok() {
        tracing::info!(course = %course.name, credit = course.credit, "course added");
        state.lookups.invalidate();
    }
    respond(&req.id, res, |()| json!({ "course": course }))
}

fn handle_courses_bulk_create(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(conn) = state.db.as_ref() else {
        return no_workspace(req);
    };
    let inputs: Vec<CourseInput> = match decode_param(req, "courses") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let courses = match inputs
        .iter()
        .map(|c| Course::from_input(&c.name, &c.credit, &c.week_range))
        .collect::<Result<Vec<_>, _>>()
    {
        Ok(v) => v,
        Err(e) => return fail(&req.id, &e),
    };
    let res = store::insert_courses(conn, &courses);
    if let Ok(inserted) = res {
        tracing::info!(inserted, "courses added");
        state.lookups.invalidate();
    }
    respond(&req.id, res, |inserted| json!({ "inserted": inserted }))
}

fn handle_courses_update(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(conn) = state.db.as_ref() else {
        return no_workspace(req);
    };
    let old_name = match required_str(req, "oldName") {
        Ok(v) => v.trim(),
        Err(resp) => return resp,
    };
    let course = match course_from_params(req) {
        Ok(c) => c,
        Err(resp) => return resp,
    };
    let res = store::update_course(conn, old_name, &course);
    if res.is_ok() {
        tracing::info!(from = old_name, to = %course.name, "course updated");
        state.lookups.invalidate();
    }
    respond(&req.id, res, |()| json!({ "course": course }))
}

fn handle_courses_delete(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(conn) = state.db.as_ref() else {
        return no_workspace(req);
    };
    let name = match required_str(req, "name") {
        Ok(v) => v.trim(),
        Err(resp) => return resp,
    };
    let res = store::delete_course(conn, name);
    if res.is_ok() {
        tracing::info!(course = name, "course deleted");
        state.lookups.invalidate();
    }
    respond(&req.id, res, |()| json!({ "deleted": name }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "courses.list" => Some(handle_courses_list(state, req)),
        "courses.create" => Some(handle_courses_create(state, req)),
        "courses.bulkCreate" => Some(handle_courses_bulk_create(state, req)),
        "courses.update" => Some(handle_courses_update(state, req)),
        "courses.delete" => Some(handle_courses_delete(state, req)),
        _ => None,
    }
}
