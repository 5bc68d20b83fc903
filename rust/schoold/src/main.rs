mod backend;
mod board;
mod config;
mod db;
mod error;
mod forms;
mod ipc;
mod linker;
mod logging;
mod model;
mod notify;
mod query;
mod reports;
mod seed;
mod session;
mod store;

use clap::Parser;
use std::io::{self, BufRead, Write};

fn main() {
    let config = config::Config::parse();
    logging::init_logging(config.log_filter.as_deref());

    let mut state = ipc::AppState::new(&config);
    if let Some(path) = config.workspace.as_deref() {
        // A bad start-up workspace is reported and the loop still runs.
        if let Err(e) = ipc::open_workspace(&mut state, path) {
            tracing::error!(path = %path.display(), error = %e, "start-up workspace not opened");
            state.notices.push(e.severity(), e.to_string());
        }
    }

    let stdin = io::stdin();
    let mut stdout = io::stdout();

    for line in stdin.lock().lines() {
        let line = match line {
            Ok(v) => v,
            Err(_) => break,
        };
        if line.trim().is_empty() {
            continue;
        }

        let req: ipc::Request = match serde_json::from_str(&line) {
            Ok(v) => v,
            Err(e) => {
                // Can't reply without id; report without one.
                tracing::warn!(error = %e, "unparseable request line");
                let resp = serde_json::json!({
                    "ok": false,
                    "error": { "code": "bad_json", "message": e.to_string() }
                });
                let _ = writeln!(stdout, "{resp}");
                let _ = stdout.flush();
                continue;
            }
        };

        let resp = ipc::handle_request(&mut state, req);
        let _ = writeln!(
            stdout,
            "{}",
            serde_json::to_string(&resp).unwrap_or_else(|_| "{\"ok\":false}".to_string())
        );
        let _ = stdout.flush();
    }

    if let Some(backend) = state.backend.as_deref_mut() {
        state.store.teardown(backend);
    }
}
