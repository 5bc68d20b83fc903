use serde::Serialize;
use serde_json::Value;

use crate::model::{Collection, FeeStatus, Record};
use crate::store::EntityStore;

/// Contract hours assumed for teachers that never had them recorded.
const DEFAULT_CONTRACT_HOURS: i64 = 40;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct FeeHistogram {
    pub paid: usize,
    pub due: usize,
    pub exempt: usize,
}

/// Students per fee status. Students without a recognised status are not counted.
pub fn fee_histogram(students: &[Record]) -> FeeHistogram {
    let mut h = FeeHistogram::default();
    for s in students {
        match s.str_field("feeStatus").and_then(FeeStatus::parse) {
            Some(FeeStatus::Paid) => h.paid += 1,
            Some(FeeStatus::Due) => h.due += 1,
            Some(FeeStatus::Exempt) => h.exempt += 1,
            None => {}
        }
    }
    h
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TeacherWorkload {
    pub id: String,
    pub name: String,
    pub occupied: i64,
    /// Contract hours minus occupied slots; negative when over-scheduled.
    pub free: i64,
}

pub fn teacher_workload(teachers: &[Record]) -> Vec<TeacherWorkload> {
    teachers
        .iter()
        .map(|t| {
            let occupied = match t.fields.get("schedule") {
                Some(Value::Object(slots)) => slots.len() as i64,
                Some(Value::Array(slots)) => slots.len() as i64,
                _ => 0,
            };
            let contract = t
                .fields
                .get("contractHours")
                .and_then(|v| v.as_f64())
                .map(|h| h as i64)
                .unwrap_or(DEFAULT_CONTRACT_HOURS);
            TeacherWorkload {
                id: t.id.clone(),
                name: t.name().unwrap_or_default().to_string(),
                occupied,
                free: contract - occupied,
            }
        })
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardSummary {
    pub total_students: usize,
    pub total_teachers: usize,
    pub total_classes: usize,
    pub students_with_due_fees: usize,
    pub teachers_on_leave: usize,
}

pub fn dashboard_summary(store: &EntityStore) -> DashboardSummary {
    let students = store.snapshot(Collection::Students);
    let teachers = store.snapshot(Collection::Teachers);
    DashboardSummary {
        total_students: students.len(),
        total_teachers: teachers.len(),
        total_classes: store.snapshot(Collection::Classes).len(),
        students_with_due_fees: fee_histogram(&students).due,
        teachers_on_leave: teachers
            .iter()
            .filter(|t| t.fields.get("onLeave").and_then(|v| v.as_bool()) == Some(true))
            .count(),
    }
}
