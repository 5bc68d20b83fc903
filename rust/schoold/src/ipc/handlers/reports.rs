use serde_json::{json, Value};

use crate::error::CoreResult;
use crate::ipc::helpers::respond;
use crate::ipc::types::{AppState, Request};
use crate::model::Collection;
use crate::reports;
use crate::session::require_login;

fn handle_fee_status(state: &mut AppState, _req: &Request) -> CoreResult<Value> {
    require_login(state.session.role())?;
    let students = state.store.snapshot(Collection::Students);
    Ok(json!({ "feeStatus": reports::fee_histogram(&students) }))
}

fn handle_teacher_workload(state: &mut AppState, _req: &Request) -> CoreResult<Value> {
    require_login(state.session.role())?;
    let teachers = state.store.snapshot(Collection::Teachers);
    Ok(json!({ "teachers": reports::teacher_workload(&teachers) }))
}

fn handle_dashboard_summary(state: &mut AppState, _req: &Request) -> CoreResult<Value> {
    require_login(state.session.role())?;
    Ok(json!(reports::dashboard_summary(&state.store)))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<Value> {
    let res = match req.method.as_str() {
        "reports.feeStatus" => handle_fee_status(state, req),
        "reports.teacherWorkload" => handle_teacher_workload(state, req),
        "dashboard.summary" => handle_dashboard_summary(state, req),
        _ => return None,
    };
    Some(respond(state, req, res))
}
