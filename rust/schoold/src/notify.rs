use serde::Serialize;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Severity {
    Success,
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notice {
    pub message: String,
    pub severity: Severity,
}

/// Transient user-visible messages, drained by the UI in FIFO order.
/// Shared with snapshot sinks, which report from the backend's callback.
#[derive(Debug, Clone, Default)]
pub struct NoticeQueue {
    inner: Arc<Mutex<VecDeque<Notice>>>,
}

impl NoticeQueue {
    pub fn push(&self, severity: Severity, message: impl Into<String>) {
        let mut q = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        q.push_back(Notice {
            message: message.into(),
            severity,
        });
    }

    pub fn success(&self, message: impl Into<String>) {
        self.push(Severity::Success, message);
    }

    pub fn drain(&self) -> Vec<Notice> {
        let mut q = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        q.drain(..).collect()
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.inner.lock().unwrap_or_else(|e| e.into_inner()).len()
    }
}
