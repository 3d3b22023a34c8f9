//! Parameter extraction. Each helper returns the ready-made `bad_params`
//! response on failure so handlers can early-return it.

use crate::ipc::error::err;
use crate::ipc::types::Request;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::path::PathBuf;

pub fn str_param<'a>(req: &'a Request, key: &str) -> Option<&'a str> {
    req.params.get(key).and_then(|v| v.as_str())
}

pub fn required_str<'a>(req: &'a Request, key: &str) -> Result<&'a str, Value> {
    str_param(req, key).ok_or_else(|| err(&req.id, "bad_params", format!("missing {key}"), None))
}

/// Cell-style text: strings as-is, numbers printed, null or absent as empty.
pub fn text_param(req: &Request, key: &str) -> String {
    match req.params.get(key) {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

pub fn path_param(req: &Request, key: &str) -> Result<PathBuf, Value> {
    let raw = required_str(req, key)?;
    if raw.trim().is_empty() {
        return Err(err(&req.id, "bad_params", format!("{key} must not be empty"), None));
    }
    Ok(PathBuf::from(raw))
}

pub fn decode_param<T: DeserializeOwned>(req: &Request, key: &str) -> Result<T, Value> {
    let Some(raw) = req.params.get(key) else {
        return Err(err(&req.id, "bad_params", format!("missing {key}"), None));
    };
    serde_json::from_value(raw.clone())
        .map_err(|e| err(&req.id, "bad_params", format!("invalid {key}: {e}"), None))
}

pub fn no_workspace(req: &Request) -> Value {
    err(&req.id, "no_workspace", "select a workspace first", None)
}
