use crate::ipc::error::{err, ok, store_err};
use crate::ipc::handlers::str_param;
use crate::ipc::types::{AppState, Request};
use serde_json::json;
use std::path::PathBuf;

fn handle_health(state: &mut AppState, req: &Request) -> serde_json::Value {
    ok(
        &req.id,
        json!({
            "version": env!("CARGO_PKG_VERSION"),
            "backend": state.store.as_ref().map(|s| s.kind()),
            "location": state.store.as_ref().map(|s| s.describe()),
            "dataDir": state.config.data_dir.to_string_lossy(),
            "lang": state.lang.code(),
        }),
    )
}

/// Re-point the data directory. In database mode only the mirror files move.
fn handle_workspace_select(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(path) = str_param(req, "path").filter(|p| !p.is_empty()) else {
        return err(&req.id, "bad_params", "missing params.path", None);
    };

    match state.select_workspace(PathBuf::from(path)) {
        Ok(()) => ok(
            &req.id,
            json!({
                "dataDir": path,
                "backend": state.store.as_ref().map(|s| s.kind()),
            }),
        ),
        Err(e) => store_err(&req.id, &e),
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "health" => Some(handle_health(state, req)),
        "workspace.select" => Some(handle_workspace_select(state, req)),
        _ => None,
    }
}
