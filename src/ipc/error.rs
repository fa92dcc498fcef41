use serde_json::json;

use crate::error::StoreError;

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

/// Error envelope carrying the HTTP status a front end should return.
pub fn store_err(id: &str, e: &StoreError) -> serde_json::Value {
    err(
        id,
        e.code(),
        e.to_string(),
        Some(json!({ "httpStatus": e.http_status() })),
    )
}

pub fn no_store(id: &str) -> serde_json::Value {
    err(
        id,
        "no_workspace",
        "student store is not open",
        Some(json!({ "httpStatus": 500 })),
    )
}
