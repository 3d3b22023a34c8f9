use crate::ipc::error::respond;
use crate::ipc::helpers::{decode_param, no_workspace};
use crate::ipc::types::{AppState, Request};
use crate::stats::{self, FrequencyKey};
use serde_json::json;

fn handle_stats_frequency(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(conn) = state.db.as_ref() else {
        return no_workspace(req);
    };
    let key: FrequencyKey = match decode_param(req, "by") {
        Ok(k) => k,
        Err(resp) => return resp,
    };
    respond(&req.id, stats::frequency(conn, key), |buckets| {
        json!({ "by": key, "buckets": buckets })
    })
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "stats.frequency" => Some(handle_stats_frequency(state, req)),
        _ => None,
    }
}
