use crate::error::RosterError;
use crate::generate;
use crate::ipc::error::{err, fail, ok, respond};
use crate::ipc::helpers::{decode_param, no_workspace, required_str};
use crate::ipc::types::{AppState, Request};
use crate::reconcile::{self, GridRow, ReconcileOptions, RowCheck, RowRules};
use crate::store;
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde_json::json;

fn handle_schedule_list(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(conn) = state.db.as_ref() else {
        return no_workspace(req);
    };
    respond(&req.id, store::list_schedule(conn), |entries| {
        json!({ "entries": entries })
    })
}

/// Manual entry of a single row, validated the same way as a grid save.
fn handle_schedule_append(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(conn) = state.db.as_ref() else {
        return no_workspace(req);
    };
    let row: GridRow = match decode_param(req, "row") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let lookups = match state.lookups.get(conn) {
        Ok(l) => l,
        Err(e) => return fail(&req.id, &e),
    };
    let rules = match RowRules::load(conn, state.config.classroom_policy, lookups) {
        Ok(r) => r,
        Err(e) => return fail(&req.id, &e),
    };
    let (entry, warnings) = match rules.check(0, &row) {
        RowCheck::Valid { entry, warnings } => (entry, warnings),
        RowCheck::Skip => {
            let e = RosterError::validation("row", "student and course are required");
            return fail(&req.id, &e);
        }
        RowCheck::Invalid(e) => return fail(&req.id, &e),
    };

    match store::insert_entry(conn, &entry) {
        Ok(id) => {
            tracing::info!(id, student = %entry.student_name, course = %entry.course_name, "entry appended");
            ok(
                &req.id,
                json!({ "entryId": id, "entry": entry, "warnings": warnings }),
            )
        }
        Err(e) => fail(&req.id, &e),
    }
}

fn handle_schedule_delete_row(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(conn) = state.db.as_ref() else {
        return no_workspace(req);
    };
    let Some(id) = req.params.get("id").and_then(|v| v.as_i64()) else {
        return err(&req.id, "bad_params", "missing id", None);
    };
    let res = store::delete_entry(conn, id);
    if res.is_ok() {
        tracing::info!(id, "entry deleted");
    }
    respond(&req.id, res, |()| json!({ "deleted": id }))
}

fn handle_schedule_delete_student(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(conn) = state.db.as_ref() else {
        return no_workspace(req);
    };
    let name = match required_str(req, "name") {
        Ok(v) => v.trim(),
        Err(resp) => return resp,
    };
    let res = store::delete_entries_for_student(conn, name);
    if let Ok(removed) = res {
        tracing::info!(student = name, removed, "student entries deleted");
    }
    respond(&req.id, res, |removed| json!({ "removed": removed }))
}

fn handle_schedule_clear(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(conn) = state.db.as_ref() else {
        return no_workspace(req);
    };
    let res = store::clear_schedule(conn);
    if let Ok(removed) = res {
        tracing::info!(removed, "schedule cleared");
    }
    respond(&req.id, res, |removed| json!({ "removed": removed }))
}

fn handle_schedule_save(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(conn) = state.db.as_ref() else {
        return no_workspace(req);
    };
    let rows: Vec<GridRow> = match decode_param(req, "rows") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let opts = ReconcileOptions {
        classroom_policy: state.config.classroom_policy,
        failure_policy: state.config.failure_policy,
    };
    let lookups = match state.lookups.get(conn) {
        Ok(l) => l,
        Err(e) => return fail(&req.id, &e),
    };
    respond(
        &req.id,
        reconcile::reconcile(conn, &rows, opts, lookups),
        |report| json!({ "report": report }),
    )
}

/// `params.seed` wins over the configured seed; neither means a fresh RNG.
fn handle_schedule_generate(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(conn) = state.db.as_ref() else {
        return no_workspace(req);
    };
    let seed = req
        .params
        .get("seed")
        .and_then(|v| v.as_u64())
        .or(state.config.seed);
    let mut rng = match seed {
        Some(s) => StdRng::seed_from_u64(s),
        None => StdRng::from_entropy(),
    };
    respond(&req.id, generate::regenerate(conn, &mut rng), |summary| {
        json!({ "summary": summary })
    })
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "schedule.list" => Some(handle_schedule_list(state, req)),
        "schedule.append" => Some(handle_schedule_append(state, req)),
        "schedule.deleteRow" => Some(handle_schedule_delete_row(state, req)),
        "schedule.deleteStudent" => Some(handle_schedule_delete_student(state, req)),
        "schedule.clear" => Some(handle_schedule_clear(state, req)),
        "schedule.save" => Some(handle_schedule_save(state, req)),
        "schedule.generate" => Some(handle_schedule_generate(state, req)),
        _ => None,
    }
}
