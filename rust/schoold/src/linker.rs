use serde::Serialize;
use serde_json::Value;

use crate::backend::{Backend, FieldDelta};
use crate::error::{CoreError, CoreResult};
use crate::model::{Collection, Record, Role};
use crate::session::require_admin;
use crate::store::EntityStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum LinkField {
    TeacherId,
    StudentIds,
    SubjectIds,
}

impl LinkField {
    pub fn parse(raw: &str) -> Option<LinkField> {
        match raw {
            "teacherId" => Some(LinkField::TeacherId),
            "studentIds" => Some(LinkField::StudentIds),
            "subjectIds" => Some(LinkField::SubjectIds),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            LinkField::TeacherId => "teacherId",
            LinkField::StudentIds => "studentIds",
            LinkField::SubjectIds => "subjectIds",
        }
    }

    /// Collection the linked ids point into.
    pub fn target(self) -> Collection {
        match self {
            LinkField::TeacherId => Collection::Teachers,
            LinkField::StudentIds => Collection::Students,
            LinkField::SubjectIds => Collection::Subjects,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkValue {
    One(String),
    Many(Vec<String>),
}

impl LinkValue {
    fn is_empty(&self) -> bool {
        match self {
            LinkValue::One(id) => id.is_empty(),
            LinkValue::Many(ids) => ids.iter().all(|id| id.is_empty()),
        }
    }
}

/// Associates a class with its teacher (overwrite) or with students and
/// subjects (set union, never removing members).
pub fn link(
    role: Option<Role>,
    store: &EntityStore,
    backend: &mut dyn Backend,
    class_id: &str,
    field: LinkField,
    value: LinkValue,
) -> CoreResult<()> {
    require_admin(role)?;
    if class_id.is_empty() || value.is_empty() {
        return Err(CoreError::validation(
            "select a class and the items to link",
        ));
    }
    if store.find(Collection::Classes, class_id).is_none() {
        return Err(CoreError::not_found("class", class_id));
    }

    let delta = match (field, value) {
        (LinkField::TeacherId, LinkValue::One(tid)) => {
            if store.find(Collection::Teachers, &tid).is_none() {
                return Err(CoreError::validation(format!("unknown teacher {tid}")));
            }
            FieldDelta::Set(Value::String(tid))
        }
        (LinkField::TeacherId, LinkValue::Many(_)) => {
            return Err(CoreError::validation("teacherId takes a single id"));
        }
        (_, LinkValue::One(id)) => FieldDelta::Union(vec![Value::String(id)]),
        (_, LinkValue::Many(ids)) => FieldDelta::Union(
            ids.into_iter()
                .filter(|id| !id.is_empty())
                .map(Value::String)
                .collect(),
        ),
    };

    backend
        .update_record(Collection::Classes, class_id, field.as_str(), delta)
        .map_err(|e| {
            tracing::error!(class_id, field = field.as_str(), error = %e, "link failed");
            CoreError::from(e)
        })
}

/// Ids of `field`'s target collection not yet linked to the class; what
/// the link screen offers for selection.
pub fn candidates(store: &EntityStore, class: &Record, field: LinkField) -> Vec<Record> {
    let pool = store.snapshot(field.target());
    match field {
        LinkField::TeacherId => pool.iter().cloned().collect(),
        _ => {
            let linked = class.id_set(field.as_str());
            pool.iter()
                .filter(|r| !linked.contains(&r.id.as_str()))
                .cloned()
                .collect()
        }
    }
}

/// Transient multi-select state of the link screen.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkSelection {
    pub class_id: Option<String>,
    pub teacher_id: Option<String>,
    pub student_ids: Vec<String>,
    pub subject_ids: Vec<String>,
}

impl LinkSelection {
    /// Choosing another class drops every pending selection.
    pub fn select_class(&mut self, class_id: Option<String>) {
        if self.class_id != class_id {
            *self = LinkSelection {
                class_id,
                ..Default::default()
            };
        }
    }

    /// Picks a teacher, or flips membership of a student/subject. Ids
    /// already linked to the selected class cannot be picked.
    pub fn toggle(&mut self, store: &EntityStore, field: LinkField, id: &str) -> CoreResult<()> {
        let class_id = self
            .class_id
            .as_deref()
            .ok_or_else(|| CoreError::validation("select a class first"))?;
        let class = store
            .find(Collection::Classes, class_id)
            .ok_or_else(|| CoreError::not_found("class", class_id))?;
        if store.find(field.target(), id).is_none() {
            return Err(CoreError::not_found("record", id));
        }

        let picked = match field {
            LinkField::TeacherId => {
                self.teacher_id = Some(id.to_string());
                return Ok(());
            }
            LinkField::StudentIds => &mut self.student_ids,
            LinkField::SubjectIds => &mut self.subject_ids,
        };
        if let Some(pos) = picked.iter().position(|p| p == id) {
            picked.remove(pos);
            return Ok(());
        }
        if class.id_set(field.as_str()).contains(&id) {
            return Err(CoreError::validation(format!(
                "{id} is already linked to this class"
            )));
        }
        picked.push(id.to_string());
        Ok(())
    }

    /// Links the pending selection for `field`, then clears it.
    pub fn submit(
        &mut self,
        role: Option<Role>,
        store: &EntityStore,
        backend: &mut dyn Backend,
        field: LinkField,
    ) -> CoreResult<()> {
        let class_id = self.class_id.clone().unwrap_or_default();
        let value = match field {
            LinkField::TeacherId => LinkValue::One(self.teacher_id.clone().unwrap_or_default()),
            LinkField::StudentIds => LinkValue::Many(self.student_ids.clone()),
            LinkField::SubjectIds => LinkValue::Many(self.subject_ids.clone()),
        };
        link(role, store, backend, &class_id, field, value)?;
        match field {
            LinkField::TeacherId => self.teacher_id = None,
            LinkField::StudentIds => self.student_ids.clear(),
            LinkField::SubjectIds => self.subject_ids.clear(),
        }
        Ok(())
    }
}
