use serde_json::{json, Map, Value};

use crate::error::{CoreError, CoreResult};
use crate::forms;
use crate::ipc::helpers::{backend_mut, optional_str, required_str, respond};
use crate::ipc::types::{AppState, Request};
use crate::model::{Collection, EntityKind, Record};
use crate::query;
use crate::session::{require_admin, require_login};
use crate::store::EntityStore;

fn parse_kind(req: &Request) -> CoreResult<EntityKind> {
    let raw = required_str(req, "kind")?;
    EntityKind::parse(&raw).ok_or_else(|| {
        CoreError::bad_params(format!(
            "kind must be one of: teacher, student, subject, class, staff, event (got {raw})"
        ))
    })
}

fn parse_collection(req: &Request, key: &str) -> CoreResult<Collection> {
    let raw = required_str(req, key)?;
    Collection::parse(&raw).ok_or_else(|| CoreError::bad_params(format!("unknown collection: {raw}")))
}

fn handle_store_snapshot(state: &mut AppState, req: &Request) -> CoreResult<Value> {
    require_login(state.session.role())?;
    let collection = parse_collection(req, "collection")?;
    let rows = state.store.snapshot(collection);
    Ok(json!({
        "collection": collection,
        "revision": state.store.revision(collection),
        "records": *rows,
    }))
}

fn handle_form_select(state: &mut AppState, req: &Request) -> CoreResult<Value> {
    let kind = parse_kind(req)?;
    state.forms.select(kind);
    Ok(json!({ "draft": state.forms.draft() }))
}

fn handle_form_set(state: &mut AppState, req: &Request) -> CoreResult<Value> {
    let field = required_str(req, "field")?;
    let value = req.params.get("value").cloned().unwrap_or(Value::Null);
    state.forms.set_field(&field, value);
    Ok(json!({ "draft": state.forms.draft() }))
}

fn handle_form_get(state: &mut AppState, _req: &Request) -> CoreResult<Value> {
    Ok(json!({ "draft": state.forms.draft() }))
}

fn handle_form_submit(state: &mut AppState, _req: &Request) -> CoreResult<Value> {
    let role = state.session.role();
    require_admin(role)?;
    let kind = state.forms.draft().kind;
    let backend = backend_mut(&mut state.backend)?;
    let id = state.forms.submit_draft(role, &state.store, backend)?;
    state.notices.success(format!("{} added", kind.as_str()));
    Ok(json!({ "id": id, "kind": kind, "draft": state.forms.draft() }))
}

fn handle_records_create(state: &mut AppState, req: &Request) -> CoreResult<Value> {
    let kind = parse_kind(req)?;
    let fields: Map<String, Value> = match req.params.get("fields") {
        Some(Value::Object(m)) => m.clone(),
        None | Some(Value::Null) => Map::new(),
        Some(_) => return Err(CoreError::bad_params("fields must be an object")),
    };
    let role = state.session.role();
    require_admin(role)?;
    let backend = backend_mut(&mut state.backend)?;
    let id = forms::submit(role, &state.store, backend, kind, fields)?;
    state.notices.success(format!("{} added", kind.as_str()));
    Ok(json!({ "id": id, "kind": kind }))
}

/// Collections the queries page searches by name.
const QUERYABLE: [Collection; 6] = [
    Collection::Teachers,
    Collection::Students,
    Collection::Subjects,
    Collection::Classes,
    Collection::Staff,
    Collection::Events,
];

fn query_row(store: &EntityStore, collection: Collection, r: &Record) -> Value {
    let mut row = json!(r);
    match collection {
        Collection::Students => {
            let classes = store.snapshot(Collection::Classes);
            row["className"] = json!(query::class_of_student(&classes, &r.id));
        }
        Collection::Classes => {
            let teachers = store.snapshot(Collection::Teachers);
            let subjects = store.snapshot(Collection::Subjects);
            let teacher_name = r
                .str_field("teacherId")
                .and_then(|tid| query::name_of(&teachers, tid));
            let subject_names: Vec<&str> = r
                .id_set("subjectIds")
                .into_iter()
                .filter_map(|sid| query::name_of(&subjects, sid))
                .collect();
            row["teacherName"] = json!(teacher_name);
            row["subjectNames"] = json!(subject_names);
        }
        _ => {}
    }
    row
}

fn handle_records_query(state: &mut AppState, req: &Request) -> CoreResult<Value> {
    require_login(state.session.role())?;
    let collection = parse_collection(req, "kind")?;
    if !QUERYABLE.contains(&collection) {
        return Err(CoreError::bad_params(format!(
            "{} cannot be queried by name",
            collection.as_str()
        )));
    }
    let term = optional_str(req, "searchTerm").unwrap_or("");
    let area = optional_str(req, "areaFilter");

    let view = query::query(&state.store, collection, term, area);
    let rows: Vec<Value> = view
        .iter()
        .map(|r| query_row(&state.store, collection, r))
        .collect();
    Ok(json!({ "kind": collection, "rows": rows }))
}

fn handle_records_detail(state: &mut AppState, req: &Request) -> CoreResult<Value> {
    require_login(state.session.role())?;
    let collection = parse_collection(req, "kind")?;
    let id = required_str(req, "id")?;
    let record = state
        .store
        .find(collection, &id)
        .ok_or_else(|| CoreError::not_found("record", &id))?;
    Ok(json!({ "id": record.id, "fields": query::detail(&record) }))
}

fn handle_classes_areas(state: &mut AppState, _req: &Request) -> CoreResult<Value> {
    require_login(state.session.role())?;
    Ok(json!({ "areas": query::class_areas(&state.store) }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<Value> {
    let res = match req.method.as_str() {
        "store.snapshot" => handle_store_snapshot(state, req),
        "form.select" => handle_form_select(state, req),
        "form.set" => handle_form_set(state, req),
        "form.get" => handle_form_get(state, req),
        "form.submit" => handle_form_submit(state, req),
        "records.create" => handle_records_create(state, req),
        "records.query" => handle_records_query(state, req),
        "records.detail" => handle_records_detail(state, req),
        "classes.areas" => handle_classes_areas(state, req),
        _ => return None,
    };
    Some(respond(state, req, res))
}
