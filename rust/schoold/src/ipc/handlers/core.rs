use serde_json::{json, Value};
use std::path::{Path, PathBuf};

use crate::backend::Backend;
use crate::db::SqliteBackend;
use crate::error::{CoreError, CoreResult};
use crate::ipc::helpers::{required_str, respond};
use crate::ipc::types::{AppState, Request};
use crate::linker::LinkSelection;

fn handle_health(state: &mut AppState, _req: &Request) -> CoreResult<Value> {
    Ok(json!({
        "version": env!("CARGO_PKG_VERSION"),
        "workspacePath": state.workspace.as_ref().map(|p| p.to_string_lossy().to_string()),
        "authReady": state.seeder.auth_ready(),
        "streaming": state.store.is_streaming(),
        "role": state.session.role(),
    }))
}

/// Opens a workspace: resolve identity, seed once per session, then
/// mirror every collection.
pub fn open_workspace(state: &mut AppState, path: &Path) -> CoreResult<Value> {
    let mut backend = SqliteBackend::open(path).map_err(|e| {
        tracing::error!(path = %path.display(), error = %format!("{e:#}"), "opening workspace failed");
        CoreError::Backend(e.into())
    })?;

    close_workspace(state);

    let subject_id = backend.resolve_identity()?;
    let seed = match state.seeder.on_identity_resolved(&mut backend) {
        Ok(report) => Some(report),
        Err(e) => {
            // Seeding is best-effort; the workspace stays usable.
            tracing::error!(error = %e, "seeding sample data failed");
            state.notices.push(e.severity(), format!("seeding failed: {e}"));
            None
        }
    };
    state.store.init(&mut backend)?;

    state.backend = Some(Box::new(backend));
    state.workspace = Some(path.to_path_buf());
    tracing::info!(path = %path.display(), "workspace opened");

    Ok(json!({
        "workspacePath": path.to_string_lossy(),
        "subjectId": subject_id,
        "seed": seed,
    }))
}

fn close_workspace(state: &mut AppState) {
    if let Some(backend) = state.backend.as_deref_mut() {
        state.store.teardown(backend);
    }
    state.store.clear();
    state.backend = None;
    state.workspace = None;
    state.links = LinkSelection::default();
}

fn handle_workspace_select(state: &mut AppState, req: &Request) -> CoreResult<Value> {
    let path = PathBuf::from(required_str(req, "path")?);
    open_workspace(state, &path)
}

fn handle_workspace_close(state: &mut AppState, _req: &Request) -> CoreResult<Value> {
    close_workspace(state);
    Ok(json!({ "closed": true }))
}

fn handle_notifications_drain(state: &mut AppState, _req: &Request) -> CoreResult<Value> {
    Ok(json!({ "notifications": state.notices.drain() }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<Value> {
    let res = match req.method.as_str() {
        "health" => handle_health(state, req),
        "workspace.select" => handle_workspace_select(state, req),
        "workspace.close" => handle_workspace_close(state, req),
        "notifications.drain" => handle_notifications_drain(state, req),
        _ => return None,
    };
    Some(respond(state, req, res))
}
