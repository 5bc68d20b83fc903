use serde_json::{json, Value};

use crate::error::{CoreError, CoreResult};
use crate::ipc::helpers::{required_str, respond};
use crate::ipc::types::{AppState, Request};
use crate::model::{Page, Role};
use crate::session::require_login;

fn handle_login(state: &mut AppState, req: &Request) -> CoreResult<Value> {
    let email = required_str(req, "email")?;
    let password = required_str(req, "password")?;
    let user = state.session.login(&email, &password)?.clone();
    state.page = Page::default();
    state.notices.success(match user.role {
        Role::Administrator => "logged in as administrator",
        Role::Viewer => "logged in as viewer",
    });
    Ok(json!({ "email": user.email, "role": user.role }))
}

fn handle_logout(state: &mut AppState, _req: &Request) -> CoreResult<Value> {
    state.session.logout();
    state.page = Page::default();
    Ok(json!({ "role": null }))
}

fn handle_get(state: &mut AppState, _req: &Request) -> CoreResult<Value> {
    Ok(json!({ "user": state.session.user() }))
}

fn handle_nav_select(state: &mut AppState, req: &Request) -> CoreResult<Value> {
    require_login(state.session.role())?;
    let raw = required_str(req, "page")?;
    let page = Page::parse(&raw)
        .ok_or_else(|| CoreError::bad_params(format!("unknown page: {raw}")))?;
    state.page = page;
    Ok(json!({ "page": page }))
}

fn handle_nav_get(state: &mut AppState, _req: &Request) -> CoreResult<Value> {
    require_login(state.session.role())?;
    Ok(json!({ "page": state.page }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<Value> {
    let res = match req.method.as_str() {
        "session.login" => handle_login(state, req),
        "session.logout" => handle_logout(state, req),
        "session.get" => handle_get(state, req),
        "nav.select" => handle_nav_select(state, req),
        "nav.get" => handle_nav_get(state, req),
        _ => return None,
    };
    Some(respond(state, req, res))
}
