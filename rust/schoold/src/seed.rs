use chrono::{Datelike, NaiveDate, Utc};
use serde::Serialize;
use serde_json::{json, Map, Value};

use crate::backend::Backend;
use crate::error::CoreResult;
use crate::model::Collection;

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SeedReport {
    /// True when the auth-ready flag was already set and nothing ran.
    pub skipped: bool,
    pub seeded: Vec<SeededCollection>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SeededCollection {
    pub collection: Collection,
    pub count: usize,
}

/// One-shot sample-data writer, gated by the session's auth-ready flag.
#[derive(Debug)]
pub struct Seeder {
    enabled: bool,
    auth_ready: bool,
}

impl Seeder {
    pub fn new(enabled: bool) -> Self {
        Seeder {
            enabled,
            auth_ready: false,
        }
    }

    pub fn auth_ready(&self) -> bool {
        self.auth_ready
    }

    /// Called whenever identity resolution succeeds. Seeds every empty
    /// collection on the first call of the session only; the flag is set
    /// before writing, so a failed run is not retried.
    pub fn on_identity_resolved(&mut self, backend: &mut dyn Backend) -> CoreResult<SeedReport> {
        if self.auth_ready {
            return Ok(SeedReport {
                skipped: true,
                seeded: Vec::new(),
            });
        }
        self.auth_ready = true;

        let mut report = SeedReport::default();
        if !self.enabled {
            return Ok(report);
        }

        let today = Utc::now().date_naive();
        for collection in Collection::ALL {
            if !backend.read_all(collection)?.is_empty() {
                continue;
            }
            let samples = sample_records(collection, today);
            tracing::info!(
                collection = collection.as_str(),
                count = samples.len(),
                "seeding sample data"
            );
            let count = samples.len();
            for item in samples {
                backend.create_record(collection, item)?;
            }
            report.seeded.push(SeededCollection { collection, count });
        }
        Ok(report)
    }
}

fn object(v: Value) -> Map<String, Value> {
    match v {
        Value::Object(m) => m,
        _ => Map::new(),
    }
}

fn iso_date(year: i32, month: u32, day: u32) -> Value {
    NaiveDate::from_ymd_opt(year, month, day)
        .map(|d| Value::String(d.format("%Y-%m-%d").to_string()))
        .unwrap_or(Value::Null)
}

/// Fixed sample content per collection, in write order.
pub fn sample_records(collection: Collection, today: NaiveDate) -> Vec<Map<String, Value>> {
    let items = match collection {
        Collection::Teachers => vec![
            json!({
                "name": "Ana Silva",
                "specialty": "Matemática",
                "contractHours": 40,
                "schedule": { "Segunda-09:00": "Turma A" },
                "onLeave": false,
                "cpf": "111.222.333-44",
                "phone": "11987654321",
                "address": "Rua das Flores, 123"
            }),
            json!({
                "name": "Carlos Souza",
                "specialty": "Português",
                "contractHours": 36,
                "schedule": { "Terça-14:00": "Turma C" },
                "onLeave": true,
                "cpf": "222.333.444-55",
                "phone": "11987654322",
                "address": "Avenida Principal, 456"
            }),
        ],
        Collection::Students => vec![
            json!({
                "name": "João Pereira",
                "warnings": "Nenhum",
                "onLeave": false,
                "feeStatus": "paid",
                "cpf": "333.444.555-66",
                "phone": "11912345678",
                "address": "Travessa dos Pássaros, 789"
            }),
            json!({
                "name": "Maria Oliveira",
                "warnings": "Laudo de dislexia",
                "onLeave": false,
                "feeStatus": "due",
                "cpf": "444.555.666-77",
                "phone": "11912345679",
                "address": "Largo das Árvores, 101"
            }),
        ],
        Collection::Subjects => vec![
            json!({ "name": "Cálculo I", "coursePlan": "Plano de ensino...", "workload": 60 }),
            json!({ "name": "Gramática Avançada", "coursePlan": "Estudo aprofundado...", "workload": 40 }),
        ],
        Collection::Classes => vec![
            json!({
                "name": "Turma de Lógica 101",
                "area": "SEDUC",
                "teacherId": null,
                "studentIds": [],
                "subjectIds": []
            }),
            json!({
                "name": "Curso de Redação",
                "area": "Curso Balcão",
                "teacherId": null,
                "studentIds": [],
                "subjectIds": []
            }),
        ],
        Collection::Staff => vec![json!({
            "name": "Roberto Lima",
            "role": "Secretário",
            "contractHours": 40
        })],
        Collection::Events => vec![
            json!({
                "name": "Reunião de Pais",
                "date": iso_date(today.year(), today.month(), 25),
                "description": "Reunião bimestral.",
                "linkedClasses": []
            }),
            json!({
                "name": "Festa Junina",
                "date": iso_date(today.year(), 6, 24),
                "description": "Comemoração.",
                "linkedClasses": []
            }),
        ],
        Collection::Announcements => vec![json!({
            "title": "Início das Matrículas",
            "content": "As matrículas para o próximo semestre começarão na próxima segunda-feira.",
            "target": "all"
        })],
    };
    items.into_iter().map(object).collect()
}
