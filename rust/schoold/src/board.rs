use chrono::{Datelike, NaiveDate};
use serde::Serialize;
use serde_json::{Map, Value};

use crate::backend::Backend;
use crate::error::{CoreError, CoreResult};
use crate::model::{AnnouncementTarget, Collection, Record, Role};
use crate::session::require_admin;
use crate::store::EntityStore;

/// Posts an announcement. Title and content are both required.
pub fn publish_announcement(
    role: Option<Role>,
    backend: &mut dyn Backend,
    title: &str,
    content: &str,
    target: AnnouncementTarget,
) -> CoreResult<String> {
    require_admin(role)?;
    if title.trim().is_empty() || content.trim().is_empty() {
        return Err(CoreError::validation(
            "announcement title and content are required",
        ));
    }

    let mut fields = Map::new();
    fields.insert("title".into(), Value::String(title.to_string()));
    fields.insert("content".into(), Value::String(content.to_string()));
    fields.insert("target".into(), Value::String(target.as_str().to_string()));
    let id = backend
        .create_record(Collection::Announcements, fields)
        .map_err(|e| {
            tracing::error!(error = %e, "publishing announcement failed");
            CoreError::from(e)
        })?;
    Ok(id)
}

/// Announcements, newest first.
pub fn announcements(store: &EntityStore) -> Vec<Record> {
    let mut out: Vec<Record> = store.snapshot(Collection::Announcements).to_vec();
    // RFC 3339 stamps with a fixed precision sort lexically.
    out.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    out
}

#[derive(Debug, Clone, Serialize)]
pub struct EventRef {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct DayCell {
    pub day: u32,
    pub date: String,
    pub events: Vec<EventRef>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthView {
    pub year: i32,
    pub month: u32,
    /// Weekday of the 1st, 0 = Sunday; the number of blank leading cells.
    pub first_weekday: u32,
    pub days: Vec<DayCell>,
}

pub fn month_view(events: &[Record], year: i32, month: u32) -> CoreResult<MonthView> {
    let first = NaiveDate::from_ymd_opt(year, month, 1)
        .ok_or_else(|| CoreError::validation(format!("invalid month {year}-{month}")))?;
    let next = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)
    }
    .ok_or_else(|| CoreError::validation(format!("invalid month {year}-{month}")))?;

    let days = first
        .iter_days()
        .take_while(|d| *d < next)
        .map(|d| {
            let date = d.format("%Y-%m-%d").to_string();
            let events = events
                .iter()
                .filter(|e| e.str_field("date") == Some(date.as_str()))
                .map(|e| EventRef {
                    id: e.id.clone(),
                    name: e.name().unwrap_or_default().to_string(),
                })
                .collect();
            DayCell {
                day: d.day(),
                date,
                events,
            }
        })
        .collect();

    Ok(MonthView {
        year,
        month,
        first_weekday: first.weekday().num_days_from_sunday(),
        days,
    })
}
