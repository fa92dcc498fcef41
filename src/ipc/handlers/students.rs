use crate::aggregate;
use crate::error::StoreError;
use crate::ipc::error::{err, no_store, ok, store_err};
use crate::ipc::handlers::str_param;
use crate::ipc::types::{AppState, Request};
use crate::model::StudentRecord;
use serde_json::json;
use std::path::PathBuf;

/// Record fields sent flat in `params` (`name`, `career`, `originCity`,
/// `phone`, `semester`); legacy keys are accepted too.
fn record_from_params(req: &Request) -> Result<StudentRecord, StoreError> {
    if !req.params.is_object() {
        return Err(StoreError::validation("params must be an object"));
    }
    serde_json::from_value(req.params.clone())
        .map_err(|e| StoreError::validation(format!("malformed student: {e}")))
}

fn handle_students_list(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(store) = state.store.as_ref() else {
        return no_store(&req.id);
    };
    match store.list() {
        Ok(students) => {
            let revision = aggregate::revision(&students);
            ok(
                &req.id,
                json!({ "students": students, "revision": revision }),
            )
        }
        Err(e) => store_err(&req.id, &e),
    }
}

fn handle_students_add(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(store) = state.store.as_ref() else {
        return no_store(&req.id);
    };
    let result = record_from_params(req).and_then(|rec| store.add(rec));
    match result {
        Ok(record) => {
            state.invalidate_view();
            ok(&req.id, json!({ "success": true, "record": record }))
        }
        Err(e) => store_err(&req.id, &e),
    }
}

fn handle_students_update(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(store) = state.store.as_ref() else {
        return no_store(&req.id);
    };
    let Some(id) = str_param(req, "id").filter(|s| !s.is_empty()) else {
        return err(&req.id, "bad_params", "missing id", Some(json!({ "httpStatus": 400 })));
    };
    let result = record_from_params(req).and_then(|rec| store.update(id, rec));
    match result {
        Ok(record) => {
            state.invalidate_view();
            ok(&req.id, json!({ "success": true, "record": record }))
        }
        Err(e) => store_err(&req.id, &e),
    }
}

fn handle_students_replace_all(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(store) = state.store.as_ref() else {
        return no_store(&req.id);
    };
    let payload = req
        .params
        .get("students")
        .cloned()
        .unwrap_or(serde_json::Value::Null);
    match store.replace_all_json(&payload) {
        Ok(students) => {
            state.invalidate_view();
            ok(&req.id, json!({ "success": true, "students": students }))
        }
        Err(e) => store_err(&req.id, &e),
    }
}

fn handle_students_delete(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(store) = state.store.as_ref() else {
        return no_store(&req.id);
    };
    let Some(id) = str_param(req, "id").filter(|s| !s.is_empty()) else {
        return err(&req.id, "bad_params", "missing id", Some(json!({ "httpStatus": 400 })));
    };
    match store.delete(id) {
        Ok(()) => {
            state.invalidate_view();
            ok(&req.id, json!({ "success": true }))
        }
        Err(e) => store_err(&req.id, &e),
    }
}

fn handle_students_import_legacy(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(store) = state.store.as_ref() else {
        return no_store(&req.id);
    };
    let Some(path) = str_param(req, "path").filter(|s| !s.is_empty()) else {
        return err(&req.id, "bad_params", "missing path", Some(json!({ "httpStatus": 400 })));
    };
    match store.import_legacy(&PathBuf::from(path)) {
        Ok(summary) => {
            state.invalidate_view();
            ok(
                &req.id,
                json!({
                    "success": true,
                    "imported": summary.imported,
                    "skipped": summary.skipped,
                }),
            )
        }
        Err(e) => store_err(&req.id, &e),
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "students.list" => Some(handle_students_list(state, req)),
        "students.add" => Some(handle_students_add(state, req)),
        "students.update" => Some(handle_students_update(state, req)),
        "students.replaceAll" => Some(handle_students_replace_all(state, req)),
        "students.delete" => Some(handle_students_delete(state, req)),
        "students.importLegacy" => Some(handle_students_import_legacy(state, req)),
        _ => None,
    }
}
