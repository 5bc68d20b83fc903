#![allow(dead_code)]

use serde_json::{json, Value};
use std::io::{BufRead, BufReader, Write};
use std::path::Path;
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};

pub struct Sidecar {
    child: Child,
    stdin: ChildStdin,
    reader: BufReader<ChildStdout>,
    next_id: u64,
}

impl Sidecar {
    pub fn spawn() -> Self {
        Self::spawn_with(&[])
    }

    pub fn spawn_with(args: &[&str]) -> Self {
        let exe = env!("CARGO_BIN_EXE_schoold");
        let mut child = Command::new(exe)
            .args(args)
            .env_remove("SCHOOLD_WORKSPACE")
            .env_remove("SCHOOLD_NO_SEED")
            .env_remove("SCHOOLD_LOG")
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()
            .expect("spawn schoold");
        let stdin = child.stdin.take().expect("child stdin");
        let stdout = child.stdout.take().expect("child stdout");
        Sidecar {
            child,
            stdin,
            reader: BufReader::new(stdout),
            next_id: 1,
        }
    }

    pub fn send_raw(&mut self, line: &str) -> Value {
        writeln!(self.stdin, "{}", line).expect("write request");
        self.stdin.flush().expect("flush request");
        let mut out = String::new();
        self.reader.read_line(&mut out).expect("read response line");
        assert!(!out.trim().is_empty(), "empty response for {}", line);
        serde_json::from_str(out.trim()).expect("parse response json")
    }

    /// Full response envelope.
    pub fn request(&mut self, method: &str, params: Value) -> Value {
        let id = self.next_id.to_string();
        self.next_id += 1;
        let payload = json!({ "id": id, "method": method, "params": params });
        let value = self.send_raw(&payload.to_string());
        assert_eq!(value.get("id").and_then(|v| v.as_str()), Some(id.as_str()));
        value
    }

    pub fn ok(&mut self, method: &str, params: Value) -> Value {
        let value = self.request(method, params);
        assert!(
            value.get("ok").and_then(|v| v.as_bool()).unwrap_or(false),
            "{} failed: {}",
            method,
            value
                .get("error")
                .and_then(|e| e.get("message"))
                .and_then(|v| v.as_str())
                .unwrap_or("unknown error")
        );
        value.get("result").cloned().unwrap_or_else(|| json!({}))
    }

    /// Error code of a request expected to fail.
    pub fn fail(&mut self, method: &str, params: Value) -> String {
        let value = self.request(method, params);
        assert_eq!(
            value.get("ok").and_then(|v| v.as_bool()),
            Some(false),
            "{} unexpectedly succeeded: {}",
            method,
            value
        );
        value["error"]["code"].as_str().unwrap_or("").to_string()
    }

    pub fn open(&mut self, workspace: &Path) -> Value {
        self.ok(
            "workspace.select",
            json!({ "path": workspace.to_string_lossy() }),
        )
    }

    pub fn login_admin(&mut self) {
        self.ok(
            "session.login",
            json!({ "email": "admin@escola.com", "password": "admin" }),
        );
    }

    pub fn login_viewer(&mut self) {
        self.ok(
            "session.login",
            json!({ "email": "viewer@escola.com", "password": "viewer" }),
        );
    }

    pub fn records(&mut self, collection: &str) -> Vec<Value> {
        self.ok("store.snapshot", json!({ "collection": collection }))["records"]
            .as_array()
            .cloned()
            .unwrap_or_default()
    }

    /// Id of the first record in `collection` whose name is `name`.
    pub fn id_of(&mut self, collection: &str, name: &str) -> String {
        self.records(collection)
            .into_iter()
            .find(|r| r["name"].as_str() == Some(name))
            .and_then(|r| r["id"].as_str().map(|s| s.to_string()))
            .unwrap_or_else(|| panic!("{name} not in {collection}"))
    }
}

impl Drop for Sidecar {
    fn drop(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}
