use crate::error::RosterError;
use serde_json::json;

pub fn ok(id: &str, result: serde_json::Value) -> serde_json::Value {
    json!({
        "id": id,
        "ok": true,
        "result": result
    })
}

pub fn err(
    id: &str,
    code: &str,
    message: impl Into<String>,
    details: Option<serde_json::Value>,
) -> serde_json::Value {
    let mut error = json!({
        "code": code,
        "message": message.into(),
    });
    if let Some(d) = details {
        error["details"] = d;
    }
    json!({
        "id": id,
        "ok": false,
        "error": error,
    })
}

/// Error response for a failed domain operation.
pub fn fail(id: &str, e: &RosterError) -> serde_json::Value {
    match e {
        RosterError::Store(_) | RosterError::Io(_) => {
            tracing::warn!(request = id, error = %e, "operation failed")
        }
        _ => tracing::debug!(request = id, error = %e, "operation rejected"),
    }
    err(id, e.code(), e.to_string(), e.details())
}

/// `ok` for a successful result, `fail` otherwise.
pub fn respond<T>(
    id: &str,
    res: Result<T, RosterError>,
    render: impl FnOnce(T) -> serde_json::Value,
) -> serde_json::Value {
    match res {
        Ok(v) => ok(id, render(v)),
        Err(e) => fail(id, &e),
    }
}
