mod test_support;

use serde_json::json;
use std::io::BufReader;
use std::process::{ChildStdin, ChildStdout};
use test_support::{request_err, request_ok, spawn_sidecar, string_field, student, temp_dir};

fn seed(stdin: &mut ChildStdin, reader: &mut BufReader<ChildStdout>) {
    let _ = request_ok(
        stdin,
        reader,
        "seed",
        "students.replaceAll",
        json!({
            "students": [
                student("Ana", "Enginyeria Civil", "Madrid"),
                student("Bo", "Medicina", "Galicia"),
                student("Cai", "Dret", "Lugo"),
                student("Dani", "Medicina", "Ávila"),
                student("Eli", "Dret", ""),
            ]
        }),
    );
}

fn strings(v: &serde_json::Value, key: &str) -> Vec<String> {
    v.get(key)
        .and_then(|v| v.as_array())
        .expect("array")
        .iter()
        .filter_map(|s| s.as_str().map(str::to_string))
        .collect()
}

#[test]
fn summary_and_unique_value_indexes() {
    let workspace = temp_dir("erasmus-dashboard-summary");
    let (_child, mut stdin, mut reader) = spawn_sidecar(&workspace);
    seed(&mut stdin, &mut reader);

    let summary = request_ok(&mut stdin, &mut reader, "1", "dashboard.summary", json!({}));
    assert_eq!(summary.get("students").and_then(|v| v.as_u64()), Some(5));
    assert_eq!(summary.get("cities").and_then(|v| v.as_u64()), Some(4));
    assert_eq!(summary.get("careers").and_then(|v| v.as_u64()), Some(3));

    let cities = request_ok(&mut stdin, &mut reader, "2", "dashboard.cities", json!({}));
    assert_eq!(strings(&cities, "values"), ["Ávila", "Galicia", "Lugo", "Madrid"]);
    let careers = request_ok(&mut stdin, &mut reader, "3", "dashboard.careers", json!({}));
    assert_eq!(
        strings(&careers, "values"),
        ["Dret", "Ingeniería Civil", "Medicina"]
    );

    let suggest = request_ok(
        &mut stdin,
        &mut reader,
        "4",
        "dashboard.suggest",
        json!({ "field": "career", "query": "ING" }),
    );
    assert_eq!(strings(&suggest, "values"), ["Ingeniería Civil"]);
    let (code, status) = request_err(
        &mut stdin,
        &mut reader,
        "5",
        "dashboard.suggest",
        json!({ "field": "phone", "query": "6" }),
    );
    assert_eq!((code.as_str(), status), ("bad_params", 400));
}

#[test]
fn text_filter_is_inactive_until_a_query_is_typed() {
    let workspace = temp_dir("erasmus-dashboard-filter");
    let (_child, mut stdin, mut reader) = spawn_sidecar(&workspace);
    seed(&mut stdin, &mut reader);

    let idle = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "dashboard.filter",
        json!({ "city": "  ", "career": "" }),
    );
    assert_eq!(idle.get("active").and_then(|v| v.as_bool()), Some(false));

    let hits = request_ok(
        &mut stdin,
        &mut reader,
        "2",
        "dashboard.filter",
        json!({ "career": "medi" }),
    );
    assert_eq!(hits.get("active").and_then(|v| v.as_bool()), Some(true));
    assert_eq!(hits.get("count").and_then(|v| v.as_u64()), Some(2));
    assert_eq!(string_field(&hits, "countLabel"), "2 estudiantes");
    assert_eq!(string_field(&hits, "title"), "Carrera: \"medi\"");

    let none = request_ok(
        &mut stdin,
        &mut reader,
        "3",
        "dashboard.filter",
        json!({ "city": "lugo", "career": "medi" }),
    );
    assert_eq!(none.get("active").and_then(|v| v.as_bool()), Some(true));
    assert_eq!(none.get("count").and_then(|v| v.as_u64()), Some(0));

    let search = request_ok(
        &mut stdin,
        &mut reader,
        "4",
        "dashboard.search",
        json!({ "term": "dani" }),
    );
    assert_eq!(search.get("count").and_then(|v| v.as_u64()), Some(1));
}

#[test]
fn province_buckets_fan_out_regions_and_rank_tiers() {
    let workspace = temp_dir("erasmus-dashboard-provinces");
    let (_child, mut stdin, mut reader) = spawn_sidecar(&workspace);
    seed(&mut stdin, &mut reader);

    let provinces = request_ok(&mut stdin, &mut reader, "1", "dashboard.provinces", json!({}));
    assert_eq!(provinces.get("maxCount").and_then(|v| v.as_u64()), Some(2));
    let stats = provinces
        .get("provinces")
        .and_then(|v| v.as_array())
        .cloned()
        .expect("provinces");
    let names: Vec<&str> = stats.iter().map(|s| string_field(s, "province")).collect();
    for expected in ["A Coruña", "Lugo", "Ourense", "Pontevedra", "Madrid", "Ávila"] {
        assert!(names.contains(&expected), "missing {expected} in {names:?}");
    }
    // Records with an empty origin are not placed anywhere.
    assert!(!names.contains(&""));
    assert_eq!(stats.len(), 6);

    let lugo = request_ok(
        &mut stdin,
        &mut reader,
        "2",
        "dashboard.province",
        json!({ "name": "Lugo" }),
    );
    assert_eq!(lugo.get("count").and_then(|v| v.as_u64()), Some(2));
    assert_eq!(string_field(&lugo, "tier"), "max");
    assert_eq!(string_field(&lugo, "title"), "Provincia: Lugo");

    let coruna = request_ok(
        &mut stdin,
        &mut reader,
        "3",
        "dashboard.province",
        json!({ "name": "A Coruña" }),
    );
    assert_eq!(string_field(&coruna, "tier"), "high");

    let blank = request_ok(
        &mut stdin,
        &mut reader,
        "4",
        "dashboard.province",
        json!({ "name": "Teruel" }),
    );
    assert_eq!(blank.get("count").and_then(|v| v.as_u64()), Some(0));
    assert_eq!(string_field(&blank, "tier"), "empty");
}

#[test]
fn views_follow_mutations_and_language_switches() {
    let workspace = temp_dir("erasmus-dashboard-refresh");
    let (_child, mut stdin, mut reader) = spawn_sidecar(&workspace);
    seed(&mut stdin, &mut reader);

    let before = request_ok(&mut stdin, &mut reader, "1", "dashboard.summary", json!({}));
    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "2",
        "students.add",
        student("Fe", "Farmàcia", "Sevilla"),
    );
    let after = request_ok(&mut stdin, &mut reader, "3", "dashboard.summary", json!({}));
    assert_eq!(after.get("students").and_then(|v| v.as_u64()), Some(6));
    assert_ne!(before.get("revision"), after.get("revision"));

    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "4",
        "dashboard.setLanguage",
        json!({ "lang": "ca" }),
    );
    let one = request_ok(
        &mut stdin,
        &mut reader,
        "5",
        "dashboard.filter",
        json!({ "city": "sevilla" }),
    );
    assert_eq!(string_field(&one, "countLabel"), "1 estudiant");
    assert_eq!(string_field(&one, "title"), "Ciutat: \"sevilla\"");

    let (code, _) = request_err(
        &mut stdin,
        &mut reader,
        "6",
        "dashboard.setLanguage",
        json!({ "lang": "fr" }),
    );
    assert_eq!(code, "bad_params");
}
