use crate::aggregate::{self, color_bucket, DashboardView};
use crate::i18n::{t, Key, Lang};
use crate::ipc::error::{err, no_store, ok, store_err};
use crate::ipc::handlers::str_param;
use crate::ipc::types::{AppState, Request};
use serde_json::json;

/// Cached view, or the error envelope to answer with. A closed store gets
/// the same `no_workspace` reply as the students methods.
fn current_view<'a>(
    state: &'a mut AppState,
    req: &Request,
) -> Result<&'a DashboardView, serde_json::Value> {
    if state.store.is_none() {
        return Err(no_store(&req.id));
    }
    state.view().map_err(|e| store_err(&req.id, &e))
}

fn handle_dashboard_summary(state: &mut AppState, req: &Request) -> serde_json::Value {
    let view = match current_view(state, req) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let summary = view.summary();
    let lang = view.lang();
    ok(
        &req.id,
        json!({
            "students": summary.students,
            "cities": summary.cities,
            "careers": summary.careers,
            "revision": view.revision(),
            "lang": lang.code(),
            "labels": {
                "students": t(lang, Key::StatStudents),
                "cities": t(lang, Key::StatCities),
                "careers": t(lang, Key::StatCareers),
            }
        }),
    )
}

fn handle_dashboard_cities(state: &mut AppState, req: &Request) -> serde_json::Value {
    match current_view(state, req) {
        Ok(view) => ok(&req.id, json!({ "values": view.cities() })),
        Err(resp) => resp,
    }
}

fn handle_dashboard_careers(state: &mut AppState, req: &Request) -> serde_json::Value {
    match current_view(state, req) {
        Ok(view) => ok(&req.id, json!({ "values": view.careers() })),
        Err(resp) => resp,
    }
}

fn handle_dashboard_suggest(state: &mut AppState, req: &Request) -> serde_json::Value {
    let field = str_param(req, "field").unwrap_or("");
    if field != "city" && field != "career" {
        return err(
            &req.id,
            "bad_params",
            "field must be city or career",
            Some(json!({ "httpStatus": 400 })),
        );
    }
    let query = str_param(req, "query").unwrap_or("");
    let view = match current_view(state, req) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let options = if field == "city" {
        view.cities()
    } else {
        view.careers()
    };
    ok(
        &req.id,
        json!({ "values": aggregate::suggest(options, query) }),
    )
}

fn handle_dashboard_filter(state: &mut AppState, req: &Request) -> serde_json::Value {
    let city = str_param(req, "city").unwrap_or("");
    let career = str_param(req, "career").unwrap_or("");
    let view = match current_view(state, req) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let filter = view.filter(city, career);
    if !filter.is_active() {
        return ok(&req.id, json!({ "active": false }));
    }
    let students = filter.matches();
    ok(
        &req.id,
        json!({
            "active": true,
            "title": aggregate::filter_title(view.lang(), city, career),
            "count": students.len(),
            "countLabel": view.count_label(students.len()),
            "students": students,
        }),
    )
}

fn handle_dashboard_search(state: &mut AppState, req: &Request) -> serde_json::Value {
    let term = str_param(req, "term").unwrap_or("");
    let view = match current_view(state, req) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let students = aggregate::quick_search(view.records(), term);
    ok(
        &req.id,
        json!({
            "count": students.len(),
            "countLabel": view.count_label(students.len()),
            "students": students,
        }),
    )
}

fn handle_dashboard_provinces(state: &mut AppState, req: &Request) -> serde_json::Value {
    match current_view(state, req) {
        Ok(view) => ok(
            &req.id,
            json!({
                "maxCount": view.buckets().max_count(),
                "provinces": view.buckets().stats(),
            }),
        ),
        Err(resp) => resp,
    }
}

/// Detail for one map region. Provinces nobody comes from answer with an
/// empty list rather than not_found, like clicking a blank region.
fn handle_dashboard_province(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(name) = str_param(req, "name").filter(|s| !s.is_empty()) else {
        return err(
            &req.id,
            "bad_params",
            "missing name",
            Some(json!({ "httpStatus": 400 })),
        );
    };
    let view = match current_view(state, req) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let buckets = view.buckets();
    let students = buckets.get(name);
    ok(
        &req.id,
        json!({
            "province": name,
            "title": view.province_title(name),
            "count": students.len(),
            "countLabel": view.count_label(students.len()),
            "tier": color_bucket(students.len(), buckets.max_count()),
            "students": students,
        }),
    )
}

fn handle_dashboard_set_language(state: &mut AppState, req: &Request) -> serde_json::Value {
    let raw = str_param(req, "lang").unwrap_or("");
    let Some(lang) = Lang::parse(raw) else {
        return err(
            &req.id,
            "bad_params",
            format!("unsupported language: {raw}"),
            Some(json!({ "httpStatus": 400 })),
        );
    };
    state.set_lang(lang);
    ok(
        &req.id,
        json!({
            "lang": lang.code(),
            "labels": {
                "results": t(lang, Key::Results),
                "city": t(lang, Key::CityLabel),
                "career": t(lang, Key::CareerLabel),
                "province": t(lang, Key::ProvinceLabel),
            }
        }),
    )
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "dashboard.summary" => Some(handle_dashboard_summary(state, req)),
        "dashboard.cities" => Some(handle_dashboard_cities(state, req)),
        "dashboard.careers" => Some(handle_dashboard_careers(state, req)),
        "dashboard.suggest" => Some(handle_dashboard_suggest(state, req)),
        "dashboard.filter" => Some(handle_dashboard_filter(state, req)),
        "dashboard.search" => Some(handle_dashboard_search(state, req)),
        "dashboard.provinces" => Some(handle_dashboard_provinces(state, req)),
        "dashboard.province" => Some(handle_dashboard_province(state, req)),
        "dashboard.setLanguage" => Some(handle_dashboard_set_language(state, req)),
        _ => None,
    }
}
