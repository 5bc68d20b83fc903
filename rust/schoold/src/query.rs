use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;

use crate::model::{Collection, Record};
use crate::store::EntityStore;

/// Filtered view over one collection snapshot. Iterating it again walks
/// the same snapshot; a fresh `query` call sees the live store.
#[derive(Debug, Clone)]
pub struct QueryView {
    rows: Arc<Vec<Record>>,
    needle: String,
    area: Option<String>,
}

impl QueryView {
    pub fn iter(&self) -> impl Iterator<Item = &Record> + '_ {
        self.rows.iter().filter(move |r| self.matches(r))
    }

    fn matches(&self, r: &Record) -> bool {
        if let Some(area) = &self.area {
            if r.str_field("area") != Some(area.as_str()) {
                return false;
            }
        }
        if self.needle.is_empty() {
            return true;
        }
        r.name()
            .map(|n| n.to_lowercase().contains(&self.needle))
            .unwrap_or(false)
    }
}

/// Case-insensitive name search, plus an exact area filter for classes.
pub fn query(
    store: &EntityStore,
    collection: Collection,
    search_term: &str,
    area_filter: Option<&str>,
) -> QueryView {
    let area = match collection {
        Collection::Classes => area_filter
            .filter(|a| !a.is_empty())
            .map(|a| a.to_string()),
        _ => None,
    };
    QueryView {
        rows: store.snapshot(collection),
        needle: search_term.to_lowercase(),
        area,
    }
}

/// Distinct class areas, in first-seen order.
pub fn class_areas(store: &EntityStore) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for c in store.snapshot(Collection::Classes).iter() {
        if let Some(area) = c.str_field("area") {
            if !out.iter().any(|a| a == area) {
                out.push(area.to_string());
            }
        }
    }
    out
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DetailField {
    pub key: String,
    pub label: String,
    pub value: Value,
    pub display: String,
}

/// Scalar fields of one record. Lists, maps, nulls, and the bookkeeping
/// keys are left out.
pub fn detail(record: &Record) -> Vec<DetailField> {
    record
        .fields
        .iter()
        .filter(|(key, _)| key.as_str() != "id" && key.as_str() != "createdAt")
        .filter_map(|(key, value)| {
            let display = match value {
                Value::String(s) => s.clone(),
                Value::Number(n) => n.to_string(),
                Value::Bool(b) => b.to_string(),
                _ => return None,
            };
            Some(DetailField {
                key: key.clone(),
                label: label_for(key),
                value: value.clone(),
                display,
            })
        })
        .collect()
}

fn label_for(key: &str) -> String {
    let mut chars = key.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Name of the first class listing `student_id`.
pub fn class_of_student<'a>(classes: &'a [Record], student_id: &str) -> Option<&'a str> {
    classes
        .iter()
        .find(|c| c.id_set("studentIds").contains(&student_id))
        .and_then(|c| c.name())
}

pub fn name_of<'a>(rows: &'a [Record], id: &str) -> Option<&'a str> {
    rows.iter().find(|r| r.id == id).and_then(|r| r.name())
}
