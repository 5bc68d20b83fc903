use serde_json::{json, Value};

use crate::board;
use crate::error::{CoreError, CoreResult};
use crate::ipc::helpers::{backend_mut, optional_str, respond};
use crate::ipc::types::{AppState, Request};
use crate::model::{AnnouncementTarget, Collection};
use crate::session::{require_admin, require_login};

fn handle_announcements_list(state: &mut AppState, _req: &Request) -> CoreResult<Value> {
    require_login(state.session.role())?;
    Ok(json!({ "announcements": board::announcements(&state.store) }))
}

fn handle_announcements_publish(state: &mut AppState, req: &Request) -> CoreResult<Value> {
    let title = optional_str(req, "title").unwrap_or("");
    let content = optional_str(req, "content").unwrap_or("");
    let target = match optional_str(req, "target") {
        None => AnnouncementTarget::All,
        Some(raw) => AnnouncementTarget::parse(raw).ok_or_else(|| {
            CoreError::bad_params("target must be one of: all, teachers, staff")
        })?,
    };
    let role = state.session.role();
    require_admin(role)?;
    let backend = backend_mut(&mut state.backend)?;
    let id = board::publish_announcement(role, backend, title, content, target)?;
    state
        .notices
        .success(format!("announcement sent to {}", target.as_str()));
    Ok(json!({ "id": id, "target": target }))
}

fn handle_events_calendar(state: &mut AppState, req: &Request) -> CoreResult<Value> {
    require_login(state.session.role())?;
    let year = req
        .params
        .get("year")
        .and_then(|v| v.as_i64())
        .and_then(|y| i32::try_from(y).ok())
        .ok_or_else(|| CoreError::bad_params("missing year"))?;
    let month = req
        .params
        .get("month")
        .and_then(|v| v.as_u64())
        .and_then(|m| u32::try_from(m).ok())
        .ok_or_else(|| CoreError::bad_params("missing month"))?;
    let events = state.store.snapshot(Collection::Events);
    Ok(json!(board::month_view(&events, year, month)?))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<Value> {
    let res = match req.method.as_str() {
        "announcements.list" => handle_announcements_list(state, req),
        "announcements.publish" => handle_announcements_publish(state, req),
        "events.calendar" => handle_events_calendar(state, req),
        _ => return None,
    };
    Some(respond(state, req, res))
}
