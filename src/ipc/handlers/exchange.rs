use crate::exchange;
use crate::ipc::error::{err, fail, respond};
use crate::ipc::helpers::{no_workspace, path_param};
use crate::ipc::types::{AppState, Request};
use crate::reconcile::{GridRow, RowRules};
use crate::sheet;
use serde_json::json;

fn handle_import_sheet(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(conn) = state.db.as_ref() else {
        return no_workspace(req);
    };
    let path = match path_param(req, "path") {
        Ok(p) => p,
        Err(resp) => return resp,
    };
    let lookups = match state.lookups.get(conn) {
        Ok(l) => l,
        Err(e) => return fail(&req.id, &e),
    };
    let res = RowRules::load(conn, state.config.classroom_policy, lookups)
        .and_then(|rules| sheet::import_sheet(conn, &path, &rules));
    respond(&req.id, res, |summary| json!({ "import": summary }))
}

/// Exports `params.rows` when given (the unsaved grid), else the stored schedule.
fn handle_export_sheet(state: &mut AppState, req: &Request) -> serde_json::Value {
    let path = match path_param(req, "path") {
        Ok(p) => p,
        Err(resp) => return resp,
    };
    let rows: Vec<GridRow> = match req.params.get("rows") {
        Some(v) if !v.is_null() => match serde_json::from_value(v.clone()) {
            Ok(rows) => rows,
            Err(e) => return err(&req.id, "bad_params", format!("invalid rows: {e}"), None),
        },
        _ => {
            let Some(conn) = state.db.as_ref() else {
                return no_workspace(req);
            };
            match sheet::stored_rows(conn) {
                Ok(rows) => rows,
                Err(e) => return fail(&req.id, &e),
            }
        }
    };
    respond(&req.id, sheet::export_sheet(&path, &rows), |written| {
        json!({ "path": path.to_string_lossy(), "rows": written })
    })
}

fn handle_export_template(_state: &mut AppState, req: &Request) -> serde_json::Value {
    let path = match path_param(req, "path") {
        Ok(p) => p,
        Err(resp) => return resp,
    };
    respond(&req.id, sheet::export_template(&path), |()| {
        json!({ "path": path.to_string_lossy() })
    })
}

fn handle_import_db(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(conn) = state.db.as_ref() else {
        return no_workspace(req);
    };
    let path = match path_param(req, "path") {
        Ok(p) => p,
        Err(resp) => return resp,
    };
    let lookups = match state.lookups.get(conn) {
        Ok(l) => l,
        Err(e) => return fail(&req.id, &e),
    };
    let res = RowRules::load(conn, state.config.classroom_policy, lookups)
        .and_then(|rules| exchange::import_db(conn, &path, &rules));
    respond(&req.id, res, |summary| {
        json!({ "imported": summary.imported, "skipped": summary.skipped })
    })
}

fn handle_export_db(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(conn) = state.db.as_ref() else {
        return no_workspace(req);
    };
    let path = match path_param(req, "path") {
        Ok(p) => p,
        Err(resp) => return resp,
    };
    respond(&req.id, exchange::export_db(conn, &path), |rows| {
        json!({ "path": path.to_string_lossy(), "rows": rows })
    })
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "schedule.importSheet" => Some(handle_import_sheet(state, req)),
        "schedule.exportSheet" => Some(handle_export_sheet(state, req)),
        "schedule.exportTemplate" => Some(handle_export_template(state, req)),
        "schedule.importDb" => Some(handle_import_db(state, req)),
        "schedule.exportDb" => Some(handle_export_db(state, req)),
        _ => None,
    }
}
