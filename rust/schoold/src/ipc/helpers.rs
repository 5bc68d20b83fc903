use serde_json::Value;

use crate::backend::Backend;
use crate::error::{CoreError, CoreResult};
use crate::ipc::error::{core_err, ok};
use crate::ipc::types::{AppState, Request};

pub fn required_str(req: &Request, key: &str) -> CoreResult<String> {
    req.params
        .get(key)
        .and_then(|v| v.as_str())
        .map(|v| v.to_string())
        .ok_or_else(|| CoreError::bad_params(format!("missing {key}")))
}

pub fn optional_str<'a>(req: &'a Request, key: &str) -> Option<&'a str> {
    req.params.get(key).and_then(|v| v.as_str())
}

pub fn backend_mut(backend: &mut Option<Box<dyn Backend>>) -> CoreResult<&mut dyn Backend> {
    match backend {
        Some(b) => Ok(b.as_mut()),
        None => Err(CoreError::NoWorkspace),
    }
}

/// Turns a handler outcome into the response envelope. Failures a user
/// could cause are also queued as notifications.
pub fn respond(state: &AppState, req: &Request, res: CoreResult<Value>) -> Value {
    match res {
        Ok(v) => ok(&req.id, v),
        Err(e) => {
            tracing::debug!(method = %req.method, code = e.code(), error = %e, "request failed");
            if !matches!(e, CoreError::BadParams(_)) {
                state.notices.push(e.severity(), e.to_string());
            }
            core_err(&req.id, &e)
        }
    }
}
