use chrono::{DateTime, Duration, SecondsFormat, Utc};
use rusqlite::{Connection, OptionalExtension};
use serde_json::{Map, Value};
use std::path::Path;
use uuid::Uuid;

use crate::backend::{apply_delta, Backend, BackendError, FieldDelta, SnapshotSink, SubscriptionId};
use crate::model::{Collection, Record};

pub fn open_db(workspace: &Path) -> anyhow::Result<Connection> {
    std::fs::create_dir_all(workspace)?;
    let db_path = workspace.join("school.sqlite3");
    let conn = Connection::open(db_path)?;
    init_schema(&conn)?;
    Ok(conn)
}

fn init_schema(conn: &Connection) -> anyhow::Result<()> {
    // Documents are schemaless JSON bodies; rowid order is insertion order.
    conn.execute(
        "CREATE TABLE IF NOT EXISTS records(
            seq INTEGER PRIMARY KEY AUTOINCREMENT,
            id TEXT NOT NULL UNIQUE,
            collection TEXT NOT NULL,
            body TEXT NOT NULL,
            created_at TEXT NOT NULL,
            updated_at TEXT
        )",
        [],
    )?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_records_collection ON records(collection, seq)",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS meta(
            key TEXT PRIMARY KEY,
            value TEXT NOT NULL
        )",
        [],
    )?;
    Ok(())
}

struct Subscriber {
    id: SubscriptionId,
    collection: Collection,
    sink: SnapshotSink,
}

/// Document store backed by a workspace SQLite file. Change notifications
/// are pushed synchronously after each committed write.
pub struct SqliteBackend {
    conn: Connection,
    subscribers: Vec<Subscriber>,
    next_subscription: u64,
    last_created_at: Option<DateTime<Utc>>,
}

impl SqliteBackend {
    pub fn open(workspace: &Path) -> anyhow::Result<Self> {
        let conn = open_db(workspace)?;
        Self::from_connection(conn)
    }

    #[cfg(test)]
    pub fn open_in_memory() -> anyhow::Result<Self> {
        let conn = Connection::open_in_memory()?;
        init_schema(&conn)?;
        Self::from_connection(conn)
    }

    fn from_connection(conn: Connection) -> anyhow::Result<Self> {
        let latest: Option<String> =
            conn.query_row("SELECT MAX(created_at) FROM records", [], |r| r.get(0))?;
        let last_created_at = latest
            .as_deref()
            .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
            .map(|d| d.with_timezone(&Utc));
        Ok(SqliteBackend {
            conn,
            subscribers: Vec::new(),
            next_subscription: 1,
            last_created_at,
        })
    }

    /// Creation stamps are strictly increasing, even within one clock tick.
    fn next_created_at(&mut self) -> String {
        let mut now = Utc::now();
        if let Some(last) = self.last_created_at {
            if now <= last {
                now = last + Duration::microseconds(1);
            }
        }
        self.last_created_at = Some(now);
        now.to_rfc3339_opts(SecondsFormat::Micros, true)
    }

    fn notify(&mut self, collection: Collection) {
        if !self.subscribers.iter().any(|s| s.collection == collection) {
            return;
        }
        let snapshot = self.read_all(collection);
        for sub in self
            .subscribers
            .iter_mut()
            .filter(|s| s.collection == collection)
        {
            (sub.sink)(snapshot.clone());
        }
    }
}

fn parse_body(body: &str) -> Result<Map<String, Value>, BackendError> {
    match serde_json::from_str::<Value>(body)? {
        Value::Object(map) => Ok(map),
        other => Err(BackendError(format!(
            "stored document is not an object: {other}"
        ))),
    }
}

impl Backend for SqliteBackend {
    fn resolve_identity(&mut self) -> Result<String, BackendError> {
        let existing: Option<String> = self
            .conn
            .query_row("SELECT value FROM meta WHERE key = 'subject_id'", [], |r| {
                r.get(0)
            })
            .optional()?;
        if let Some(id) = existing {
            return Ok(id);
        }
        let id = Uuid::new_v4().to_string();
        self.conn.execute(
            "INSERT INTO meta(key, value) VALUES('subject_id', ?)",
            [&id],
        )?;
        Ok(id)
    }

    fn read_all(&self, collection: Collection) -> Result<Vec<Record>, BackendError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, body, created_at FROM records WHERE collection = ? ORDER BY seq",
        )?;
        let rows = stmt
            .query_map([collection.as_str()], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                ))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        rows.into_iter()
            .map(|(id, body, created_at)| {
                Ok(Record {
                    id,
                    created_at,
                    fields: parse_body(&body)?,
                })
            })
            .collect()
    }

    fn create_record(
        &mut self,
        collection: Collection,
        fields: Map<String, Value>,
    ) -> Result<String, BackendError> {
        let id = Uuid::new_v4().to_string();
        let created_at = self.next_created_at();
        let body = serde_json::to_string(&Value::Object(fields))?;
        self.conn.execute(
            "INSERT INTO records(id, collection, body, created_at) VALUES(?, ?, ?, ?)",
            (&id, collection.as_str(), &body, &created_at),
        )?;
        self.notify(collection);
        Ok(id)
    }

    fn update_record(
        &mut self,
        collection: Collection,
        id: &str,
        field: &str,
        delta: FieldDelta,
    ) -> Result<(), BackendError> {
        let tx = self.conn.transaction()?;
        let body: Option<String> = tx
            .query_row(
                "SELECT body FROM records WHERE collection = ? AND id = ?",
                (collection.as_str(), id),
                |r| r.get(0),
            )
            .optional()?;
        let Some(body) = body else {
            return Err(BackendError(format!(
                "no document {id} in {}",
                collection.as_str()
            )));
        };

        let mut fields = parse_body(&body)?;
        apply_delta(&mut fields, field, delta);
        let body = serde_json::to_string(&Value::Object(fields))?;
        let updated_at = Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true);
        tx.execute(
            "UPDATE records SET body = ?, updated_at = ? WHERE collection = ? AND id = ?",
            (&body, &updated_at, collection.as_str(), id),
        )?;
        tx.commit()?;

        self.notify(collection);
        Ok(())
    }

    fn subscribe(
        &mut self,
        collection: Collection,
        mut sink: SnapshotSink,
    ) -> Result<SubscriptionId, BackendError> {
        let initial = self.read_all(collection)?;
        sink(Ok(initial));

        let id = SubscriptionId(self.next_subscription);
        self.next_subscription += 1;
        self.subscribers.push(Subscriber {
            id,
            collection,
            sink,
        });
        Ok(id)
    }

    fn unsubscribe(&mut self, id: SubscriptionId) {
        self.subscribers.retain(|s| s.id != id);
    }
}
