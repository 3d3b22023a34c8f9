use crate::db;
use crate::ipc::error::{err, ok, respond};
use crate::ipc::helpers::{no_workspace, path_param};
use crate::ipc::types::{AppState, Request};
use crate::seed;
use crate::store;
use serde_json::json;

fn handle_health(state: &mut AppState, req: &Request) -> serde_json::Value {
    let counts = state.db.as_ref().and_then(|conn| store::counts(conn).ok());
    ok(
        &req.id,
        json!({
            "version": env!("CARGO_PKG_VERSION"),
            "workspacePath": state.workspace.as_ref().map(|p| p.to_string_lossy().to_string()),
            "counts": counts,
        }),
    )
}

fn handle_workspace_select(state: &mut AppState, req: &Request) -> serde_json::Value {
    let path = match path_param(req, "path") {
        Ok(p) => p,
        Err(resp) => return resp,
    };

    match db::open_db(&path, state.config.schedule_startup) {
        Ok(conn) => {
            tracing::info!(workspace = %path.display(), "workspace opened");
            state.workspace = Some(path.clone());
            state.db = Some(conn);
            state.lookups.invalidate();
            ok(&req.id, json!({ "workspacePath": path.to_string_lossy() }))
        }
        Err(e) => {
            tracing::warn!(workspace = %path.display(), error = ?e, "workspace open failed");
            err(&req.id, "db_open_failed", format!("{e:?}"), None)
        }
    }
}

fn handle_data_initialize(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(conn) = state.db.as_ref() else {
        return no_workspace(req);
    };
    let res = store::reinitialize(conn, &seed::default_students(), &seed::default_courses());
    state.lookups.invalidate();
    respond(&req.id, res, |counts| json!({ "counts": counts }))
}

fn handle_data_clear(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(conn) = state.db.as_ref() else {
        return no_workspace(req);
    };
    let res = store::clear_all(conn);
    state.lookups.invalidate();
    respond(&req.id, res, |()| json!({}))
}

fn handle_lookups_get(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(conn) = state.db.as_ref() else {
        return ok(&req.id, json!({ "students": [], "courses": [] }));
    };
    let res = state.lookups.get(conn).map(|l| json!(l));
    respond(&req.id, res, |v| v)
}

fn handle_courses_catalog(_state: &mut AppState, req: &Request) -> serde_json::Value {
    ok(&req.id, json!({ "courses": seed::COURSE_CATALOG }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "health" => Some(handle_health(state, req)),
        "workspace.select" => Some(handle_workspace_select(state, req)),
        "data.initialize" => Some(handle_data_initialize(state, req)),
        "data.clear" => Some(handle_data_clear(state, req)),
        "lookups.get" => Some(handle_lookups_get(state, req)),
        "courses.catalog" => Some(handle_courses_catalog(state, req)),
        _ => None,
    }
}
