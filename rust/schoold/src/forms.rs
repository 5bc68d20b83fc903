use chrono::NaiveDate;
use serde::Serialize;
use serde_json::{Map, Value};

use crate::backend::{apply_delta, Backend, FieldDelta};
use crate::error::{CoreError, CoreResult};
use crate::model::{Collection, EntityKind, FeeStatus, Role};
use crate::session::require_admin;
use crate::store::EntityStore;

/// Editable add-data form. `form_key` changes every time the form is
/// reset so the UI can remount its inputs.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FormDraft {
    pub kind: EntityKind,
    pub fields: Map<String, Value>,
    pub form_key: u64,
}

pub struct FormController {
    draft: FormDraft,
}

impl Default for FormController {
    fn default() -> Self {
        FormController {
            draft: FormDraft {
                kind: EntityKind::Teacher,
                fields: Map::new(),
                form_key: 1,
            },
        }
    }
}

impl FormController {
    pub fn draft(&self) -> &FormDraft {
        &self.draft
    }

    /// Switching kinds starts from an empty form.
    pub fn select(&mut self, kind: EntityKind) {
        if self.draft.kind != kind {
            self.draft.kind = kind;
            self.reset();
        }
    }

    /// `null` clears the field.
    pub fn set_field(&mut self, field: &str, value: Value) {
        if value.is_null() {
            self.draft.fields.remove(field);
        } else {
            self.draft.fields.insert(field.to_string(), value);
        }
    }

    fn reset(&mut self) {
        self.draft.fields = Map::new();
        self.draft.form_key += 1;
    }

    /// Submits the draft; on success the draft is emptied.
    pub fn submit_draft(
        &mut self,
        role: Option<Role>,
        store: &EntityStore,
        backend: &mut dyn Backend,
    ) -> CoreResult<String> {
        let id = submit(
            role,
            store,
            backend,
            self.draft.kind,
            self.draft.fields.clone(),
        )?;
        self.reset();
        Ok(id)
    }
}

/// Creates one record of `kind` from `fields`.
pub fn submit(
    role: Option<Role>,
    store: &EntityStore,
    backend: &mut dyn Backend,
    kind: EntityKind,
    mut fields: Map<String, Value>,
) -> CoreResult<String> {
    require_admin(role)?;
    validate(kind, &fields, store)?;
    dedup_id_lists(&mut fields);

    let id = backend.create_record(kind.collection(), fields).map_err(|e| {
        tracing::error!(kind = kind.as_str(), error = %e, "create failed");
        CoreError::from(e)
    })?;
    tracing::debug!(kind = kind.as_str(), id = %id, "record created");
    Ok(id)
}

/// Keys the backend assigns; a record body never carries them.
const RESERVED: [&str; 2] = ["id", "createdAt"];

const ID_LISTS: [&str; 3] = ["studentIds", "subjectIds", "linkedClasses"];

fn validate(kind: EntityKind, fields: &Map<String, Value>, store: &EntityStore) -> CoreResult<()> {
    if let Some(key) = RESERVED.iter().find(|k| fields.contains_key(**k)) {
        return Err(CoreError::validation(format!("{key} is assigned by the store")));
    }
    let has_name = fields
        .get("name")
        .and_then(|v| v.as_str())
        .map(|s| !s.trim().is_empty())
        .unwrap_or(false);
    if !has_name {
        return Err(CoreError::validation("name is required"));
    }

    let schema = kind.schema();
    for (key, value) in fields {
        if !schema.contains(&key.as_str()) {
            tracing::warn!(kind = kind.as_str(), field = %key, "field not in schema; stored as-is");
            continue;
        }
        match key.as_str() {
            "contractHours" | "workload" => {
                let ok = value.as_f64().map(|n| n >= 0.0).unwrap_or(false);
                if !ok {
                    return Err(CoreError::validation(format!(
                        "{key} must be a non-negative number"
                    )));
                }
            }
            "feeStatus" => {
                if value.as_str().and_then(FeeStatus::parse).is_none() {
                    return Err(CoreError::validation(
                        "feeStatus must be one of: paid, due, exempt",
                    ));
                }
            }
            "onLeave" if !value.is_boolean() => {
                return Err(CoreError::validation("onLeave must be a boolean"));
            }
            "schedule" if !value.is_object() => {
                return Err(CoreError::validation(
                    "schedule must map time slots to class labels",
                ));
            }
            "date" => {
                let ok = value
                    .as_str()
                    .map(|s| NaiveDate::parse_from_str(s, "%Y-%m-%d").is_ok())
                    .unwrap_or(false);
                if !ok {
                    return Err(CoreError::validation("date must be YYYY-MM-DD"));
                }
            }
            "teacherId" => {
                if let Some(tid) = value.as_str() {
                    if store.find(Collection::Teachers, tid).is_none() {
                        return Err(CoreError::validation(format!("unknown teacher {tid}")));
                    }
                } else if !value.is_null() {
                    return Err(CoreError::validation("teacherId must be a teacher id"));
                }
            }
            "studentIds" | "subjectIds" | "linkedClasses" => {
                let is_id = |v: &Value| v.as_str().is_some_and(|s| !s.is_empty());
                let ok = value
                    .as_array()
                    .map(|items| items.iter().all(is_id))
                    .unwrap_or(false);
                if !ok {
                    return Err(CoreError::validation(format!("{key} must be a list of ids")));
                }
            }
            _ => {}
        }
    }
    Ok(())
}

/// Id lists are sets; repeated members collapse to their first occurrence.
fn dedup_id_lists(fields: &mut Map<String, Value>) {
    for key in ID_LISTS {
        if let Some(Value::Array(items)) = fields.remove(key) {
            apply_delta(fields, key, FieldDelta::Union(items));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::SqliteBackend;
    use crate::notify::NoticeQueue;
    use crate::store::testing::record;
    use serde_json::json;

    const KINDS: [EntityKind; 6] = [
        EntityKind::Teacher,
        EntityKind::Student,
        EntityKind::Subject,
        EntityKind::Class,
        EntityKind::Staff,
        EntityKind::Event,
    ];

    fn fields(v: Value) -> Map<String, Value> {
        match v {
            Value::Object(m) => m,
            _ => Map::new(),
        }
    }

    fn setup() -> (EntityStore, SqliteBackend) {
        let mut backend = SqliteBackend::open_in_memory().expect("open");
        let mut store = EntityStore::new(NoticeQueue::default());
        store.init(&mut backend).expect("init");
        (store, backend)
    }

    #[test]
    fn missing_or_blank_name_is_rejected_without_writing() {
        let (store, mut backend) = setup();
        for kind in KINDS {
            for body in [json!({}), json!({ "name": "" }), json!({ "name": "   " })] {
                let res = submit(
                    Some(Role::Administrator),
                    &store,
                    &mut backend,
                    kind,
                    fields(body),
                );
                assert!(matches!(res, Err(CoreError::Validation(_))), "{kind:?}");
            }
            assert!(store.snapshot(kind.collection()).is_empty());
        }
    }

    #[test]
    fn viewers_and_anonymous_callers_cannot_submit() {
        let (store, mut backend) = setup();
        for kind in KINDS {
            for role in [Some(Role::Viewer), None] {
                let res = submit(role, &store, &mut backend, kind, fields(json!({ "name": "X" })));
                assert!(matches!(res, Err(CoreError::Authorization(_))));
                // Authorization wins over validation.
                let res = submit(role, &store, &mut backend, kind, Map::new());
                assert!(matches!(res, Err(CoreError::Authorization(_))));
            }
        }
    }

    #[test]
    fn admin_submit_appears_in_store_with_timestamp() {
        let (store, mut backend) = setup();
        let id = submit(
            Some(Role::Administrator),
            &store,
            &mut backend,
            EntityKind::Teacher,
            fields(json!({ "name": "Beatriz Costa", "contractHours": 20, "nickname": "Bia" })),
        )
        .expect("submit");

        let rec = store.find(Collection::Teachers, &id).expect("in store");
        assert_eq!(rec.name(), Some("Beatriz Costa"));
        assert!(!rec.created_at.is_empty());
        // Unknown fields are kept.
        assert_eq!(rec.fields["nickname"], json!("Bia"));
    }

    #[test]
    fn typed_fields_are_checked() {
        let (store, mut backend) = setup();
        let admin = Some(Role::Administrator);
        let cases = [
            (EntityKind::Teacher, json!({ "name": "A", "contractHours": -1 })),
            (EntityKind::Student, json!({ "name": "A", "feeStatus": "late" })),
            (EntityKind::Subject, json!({ "name": "A", "workload": "lots" })),
            (EntityKind::Event, json!({ "name": "A", "date": "25/06/2026" })),
            (EntityKind::Class, json!({ "name": "A", "teacherId": "ghost" })),
        ];
        for (kind, body) in cases {
            let res = submit(admin, &store, &mut backend, kind, fields(body));
            assert!(matches!(res, Err(CoreError::Validation(_))), "{kind:?}");
        }
        // Event only requires a name.
        submit(admin, &store, &mut backend, EntityKind::Event, fields(json!({ "name": "Feira" })))
            .expect("event without date");
    }

    #[test]
    fn draft_resets_on_success_only() {
        let (store, mut backend) = setup();
        let mut form = FormController::default();
        form.select(EntityKind::Student);
        form.set_field("feeStatus", json!("due"));

        let res = form.submit_draft(Some(Role::Administrator), &store, &mut backend);
        assert!(res.is_err());
        assert_eq!(form.draft().fields.len(), 1);

        form.set_field("name", json!("Lucas"));
        let key = form.draft().form_key;
        form.submit_draft(Some(Role::Administrator), &store, &mut backend)
            .expect("submit");
        assert!(form.draft().fields.is_empty());
        assert_eq!(form.draft().kind, EntityKind::Student);
        assert!(form.draft().form_key > key);
    }

    #[test]
    fn class_teacher_reference_must_exist() {
        let (store, mut backend) = setup();
        store.replace(
            Collection::Teachers,
            vec![record("t1", json!({ "name": "Ana Silva" }))],
        );
        submit(
            Some(Role::Administrator),
            &store,
            &mut backend,
            EntityKind::Class,
            fields(json!({ "name": "Turma A", "area": "EJA", "teacherId": "t1" })),
        )
        .expect("known teacher");
    }

    #[test]
    fn store_assigned_keys_cannot_be_supplied() {
        let (store, mut backend) = setup();
        let admin = Some(Role::Administrator);
        for body in [
            json!({ "name": "Turma X", "id": "fake" }),
            json!({ "name": "Turma X", "createdAt": "1999-01-01" }),
        ] {
            let res = submit(admin, &store, &mut backend, EntityKind::Class, fields(body));
            assert!(matches!(res, Err(CoreError::Validation(_))));
        }
        assert!(store.snapshot(Collection::Classes).is_empty());

        let body = fields(json!({ "name": "Turma X" }));
        let id = submit(admin, &store, &mut backend, EntityKind::Class, body).expect("submit");
        let rec = store.find(Collection::Classes, &id).expect("in store");
        let wire: Value = serde_json::from_str(&serde_json::to_string(&rec).expect("serialize"))
            .expect("reparse");
        assert_eq!(wire["id"], json!(id));
        assert_eq!(wire["createdAt"], json!(rec.created_at));
    }

    #[test]
    fn class_id_lists_are_stored_without_duplicates() {
        let (store, mut backend) = setup();
        let admin = Some(Role::Administrator);
        let id = submit(
            admin,
            &store,
            &mut backend,
            EntityKind::Class,
            fields(json!({
                "name": "Turma Y",
                "studentIds": ["s1", "s1", "s2"],
                "subjectIds": ["m1", "m1"]
            })),
        )
        .expect("submit");
        let rec = store.find(Collection::Classes, &id).expect("in store");
        assert_eq!(rec.id_set("studentIds"), vec!["s1", "s2"]);
        assert_eq!(rec.id_set("subjectIds"), vec!["m1"]);

        for members in [json!([1, 2]), json!(["s1", null]), json!([""])] {
            let body = json!({ "name": "Turma Z", "studentIds": members });
            let res = submit(admin, &store, &mut backend, EntityKind::Class, fields(body));
            assert!(matches!(res, Err(CoreError::Validation(_))));
        }
    }
}
