mod common;

use common::Sidecar;
use serde_json::{json, Value};

fn seeded() -> (tempfile::TempDir, Sidecar) {
    let workspace = tempfile::tempdir().expect("temp dir");
    let mut sc = Sidecar::spawn();
    sc.open(workspace.path());
    sc.login_viewer();
    (workspace, sc)
}

fn names(rows: &Value) -> Vec<String> {
    rows.as_array()
        .cloned()
        .unwrap_or_default()
        .into_iter()
        .filter_map(|r| r["name"].as_str().map(|s| s.to_string()))
        .collect()
}

#[test]
fn name_search_is_case_insensitive() {
    let (_ws, mut sc) = seeded();
    let res = sc.ok("records.query", json!({ "kind": "teachers", "searchTerm": "ana" }));
    assert_eq!(names(&res["rows"]), vec!["Ana Silva"]);
    let res = sc.ok("records.query", json!({ "kind": "teachers", "searchTerm": "SOUZA" }));
    assert_eq!(names(&res["rows"]), vec!["Carlos Souza"]);
    let res = sc.ok("records.query", json!({ "kind": "teachers" }));
    assert_eq!(names(&res["rows"]).len(), 2);
}

#[test]
fn only_named_collections_are_queryable() {
    let (_ws, mut sc) = seeded();
    let res = sc.ok("records.query", json!({ "kind": "events", "searchTerm": "junina" }));
    assert_eq!(names(&res["rows"]), vec!["Festa Junina"]);
    assert_eq!(
        sc.fail("records.query", json!({ "kind": "announcements", "searchTerm": "matr" })),
        "bad_params"
    );
}

#[test]
fn class_area_filter_and_enriched_rows() {
    let (_ws, mut sc) = seeded();
    let areas = sc.ok("classes.areas", json!({}));
    assert_eq!(areas["areas"], json!(["SEDUC", "Curso Balcão"]));

    let res = sc.ok(
        "records.query",
        json!({ "kind": "classes", "searchTerm": "", "areaFilter": "Curso Balcão" }),
    );
    assert_eq!(names(&res["rows"]), vec!["Curso de Redação"]);
    assert_eq!(res["rows"][0]["teacherName"], json!(null));
    assert_eq!(res["rows"][0]["subjectNames"], json!([]));

    let res = sc.ok(
        "records.query",
        json!({ "kind": "students", "searchTerm": "maria" }),
    );
    assert_eq!(res["rows"][0]["className"], json!(null));
}

#[test]
fn detail_lists_scalar_fields() {
    let (_ws, mut sc) = seeded();
    let id = sc.id_of("teachers", "Ana Silva");
    let res = sc.ok("records.detail", json!({ "kind": "teachers", "id": id }));
    let keys: Vec<String> = res["fields"]
        .as_array()
        .cloned()
        .unwrap_or_default()
        .into_iter()
        .filter_map(|f| f["key"].as_str().map(|s| s.to_string()))
        .collect();
    assert_eq!(
        keys,
        vec!["name", "specialty", "contractHours", "onLeave", "cpf", "phone", "address"]
    );
    assert_eq!(
        sc.fail("records.detail", json!({ "kind": "teachers", "id": "missing" })),
        "not_found"
    );
}

#[test]
fn reports_follow_the_live_store() {
    let workspace = tempfile::tempdir().expect("temp dir");
    let mut sc = Sidecar::spawn();
    sc.open(workspace.path());
    sc.login_admin();

    let fees = sc.ok("reports.feeStatus", json!({}));
    assert_eq!(fees["feeStatus"], json!({ "paid": 1, "due": 1, "exempt": 0 }));

    sc.ok(
        "records.create",
        json!({ "kind": "student", "fields": { "name": "Bruna", "feeStatus": "due" } }),
    );
    let fees = sc.ok("reports.feeStatus", json!({}));
    assert_eq!(fees["feeStatus"], json!({ "paid": 1, "due": 2, "exempt": 0 }));

    sc.ok(
        "records.create",
        json!({
            "kind": "teacher",
            "fields": {
                "name": "Diego",
                "contractHours": 40,
                "schedule": { "Seg-08:00": "A", "Ter-08:00": "B", "Qua-08:00": "C" }
            }
        }),
    );
    let workload = sc.ok("reports.teacherWorkload", json!({}));
    let rows = workload["teachers"].as_array().cloned().unwrap_or_default();
    let find = |name: &str| {
        rows.iter()
            .find(|r| r["name"].as_str() == Some(name))
            .cloned()
            .expect("teacher row")
    };
    assert_eq!((find("Ana Silva")["occupied"].clone(), find("Ana Silva")["free"].clone()), (json!(1), json!(39)));
    assert_eq!(find("Carlos Souza")["free"], json!(35));
    assert_eq!((find("Diego")["occupied"].clone(), find("Diego")["free"].clone()), (json!(3), json!(37)));

    let summary = sc.ok("dashboard.summary", json!({}));
    assert_eq!(summary["totalStudents"], json!(3));
    assert_eq!(summary["studentsWithDueFees"], json!(2));
    assert_eq!(summary["teachersOnLeave"], json!(1));
    assert_eq!(summary["totalClasses"], json!(2));
}

#[test]
fn announcements_and_calendar() {
    let workspace = tempfile::tempdir().expect("temp dir");
    let mut sc = Sidecar::spawn();
    sc.open(workspace.path());
    sc.login_admin();

    sc.ok(
        "announcements.publish",
        json!({ "title": "Reunião", "content": "Sala 3", "target": "teachers" }),
    );
    let list = sc.ok("announcements.list", json!({}));
    assert_eq!(list["announcements"][0]["title"], json!("Reunião"));
    assert_eq!(list["announcements"][0]["target"], json!("teachers"));
    assert_eq!(list["announcements"][1]["title"], json!("Início das Matrículas"));

    assert_eq!(
        sc.fail("announcements.publish", json!({ "title": "Só título" })),
        "validation_failed"
    );
    assert_eq!(
        sc.fail("announcements.publish", json!({ "title": "a", "content": "b", "target": "parents" })),
        "bad_params"
    );

    sc.ok(
        "records.create",
        json!({ "kind": "event", "fields": { "name": "Formatura", "date": "2030-12-12" } }),
    );
    let cal = sc.ok("events.calendar", json!({ "year": 2030, "month": 12 }));
    assert_eq!(cal["days"].as_array().map(|d| d.len()), Some(31));
    assert_eq!(cal["days"][11]["events"][0]["name"], json!("Formatura"));
    assert_eq!(
        sc.fail("events.calendar", json!({ "year": 2030, "month": 0 })),
        "validation_failed"
    );

    sc.login_viewer();
    assert_eq!(
        sc.fail("announcements.publish", json!({ "title": "a", "content": "b" })),
        "forbidden"
    );
}
