use serde_json::{json, Value};

use crate::error::{CoreError, CoreResult};
use crate::ipc::helpers::{backend_mut, optional_str, required_str, respond};
use crate::ipc::types::{AppState, Request};
use crate::linker::{self, LinkField, LinkValue};
use crate::model::Collection;
use crate::query;
use crate::session::{require_admin, require_login};

fn parse_field(req: &Request) -> CoreResult<LinkField> {
    let raw = required_str(req, "field")?;
    LinkField::parse(&raw).ok_or_else(|| {
        CoreError::bad_params("field must be one of: teacherId, studentIds, subjectIds")
    })
}

/// Accepts a single id or a list of ids. Absent or null reads as empty,
/// which the linker rejects as a validation failure.
fn parse_value(req: &Request) -> CoreResult<LinkValue> {
    match req.params.get("value") {
        None | Some(Value::Null) => Ok(LinkValue::Many(Vec::new())),
        Some(Value::String(s)) => Ok(LinkValue::One(s.clone())),
        Some(Value::Array(items)) => items
            .iter()
            .map(|v| {
                v.as_str()
                    .map(|s| s.to_string())
                    .ok_or_else(|| CoreError::bad_params("value must contain ids"))
            })
            .collect::<CoreResult<Vec<_>>>()
            .map(LinkValue::Many),
        Some(_) => Err(CoreError::bad_params("value must be an id or a list of ids")),
    }
}

fn handle_classes_link(state: &mut AppState, req: &Request) -> CoreResult<Value> {
    let class_id = optional_str(req, "classId").unwrap_or("").to_string();
    let field = parse_field(req)?;
    let value = parse_value(req)?;
    let role = state.session.role();
    require_admin(role)?;
    let backend = backend_mut(&mut state.backend)?;
    linker::link(role, &state.store, backend, &class_id, field, value)?;
    state.notices.success("linked");
    class_summary(state, &class_id)
}

fn class_summary(state: &AppState, class_id: &str) -> CoreResult<Value> {
    let class = state
        .store
        .find(Collection::Classes, class_id)
        .ok_or_else(|| CoreError::not_found("class", class_id))?;
    let teachers = state.store.snapshot(Collection::Teachers);
    let teacher_name = class
        .str_field("teacherId")
        .and_then(|tid| query::name_of(&teachers, tid));
    Ok(json!({
        "class": class,
        "teacherName": teacher_name,
        "studentCount": class.id_set("studentIds").len(),
        "subjectCount": class.id_set("subjectIds").len(),
    }))
}

fn link_state(state: &AppState) -> CoreResult<Value> {
    let selected = match state.links.class_id.as_deref() {
        Some(cid) => Some(class_summary(state, cid)?),
        None => None,
    };
    Ok(json!({ "selection": state.links, "selected": selected }))
}

fn handle_link_select(state: &mut AppState, req: &Request) -> CoreResult<Value> {
    require_login(state.session.role())?;
    let class_id = optional_str(req, "classId")
        .filter(|s| !s.is_empty())
        .map(|s| s.to_string());
    if let Some(cid) = class_id.as_deref() {
        if state.store.find(Collection::Classes, cid).is_none() {
            return Err(CoreError::not_found("class", cid));
        }
    }
    state.links.select_class(class_id);
    link_state(state)
}

fn handle_link_toggle(state: &mut AppState, req: &Request) -> CoreResult<Value> {
    require_login(state.session.role())?;
    let field = parse_field(req)?;
    let id = required_str(req, "id")?;
    state.links.toggle(&state.store, field, &id)?;
    link_state(state)
}

fn handle_link_state(state: &mut AppState, _req: &Request) -> CoreResult<Value> {
    require_login(state.session.role())?;
    link_state(state)
}

fn handle_link_candidates(state: &mut AppState, req: &Request) -> CoreResult<Value> {
    require_login(state.session.role())?;
    let class_id = required_str(req, "classId")?;
    let field = parse_field(req)?;
    let class = state
        .store
        .find(Collection::Classes, &class_id)
        .ok_or_else(|| CoreError::not_found("class", &class_id))?;
    Ok(json!({
        "field": field,
        "candidates": linker::candidates(&state.store, &class, field),
    }))
}

fn handle_link_submit(state: &mut AppState, req: &Request) -> CoreResult<Value> {
    let field = parse_field(req)?;
    let role = state.session.role();
    require_admin(role)?;
    let backend = backend_mut(&mut state.backend)?;
    state.links.submit(role, &state.store, backend, field)?;
    state.notices.success("linked");
    link_state(state)
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<Value> {
    let res = match req.method.as_str() {
        "classes.link" => handle_classes_link(state, req),
        "link.select" => handle_link_select(state, req),
        "link.toggle" => handle_link_toggle(state, req),
        "link.state" => handle_link_state(state, req),
        "link.candidates" => handle_link_candidates(state, req),
        "link.submit" => handle_link_submit(state, req),
        _ => return None,
    };
    Some(respond(state, req, res))
}
