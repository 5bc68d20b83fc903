use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// The seven named record groups mirrored by the entity store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Collection {
    Teachers,
    Students,
    Subjects,
    Classes,
    Staff,
    Events,
    Announcements,
}

impl Collection {
    pub const ALL: [Collection; 7] = [
        Collection::Teachers,
        Collection::Students,
        Collection::Subjects,
        Collection::Classes,
        Collection::Staff,
        Collection::Events,
        Collection::Announcements,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Collection::Teachers => "teachers",
            Collection::Students => "students",
            Collection::Subjects => "subjects",
            Collection::Classes => "classes",
            Collection::Staff => "staff",
            Collection::Events => "events",
            Collection::Announcements => "announcements",
        }
    }

    /// Accepts collection names as well as the singular entity kind names.
    pub fn parse(raw: &str) -> Option<Collection> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "teachers" | "teacher" => Some(Collection::Teachers),
            "students" | "student" => Some(Collection::Students),
            "subjects" | "subject" => Some(Collection::Subjects),
            "classes" | "class" => Some(Collection::Classes),
            "staff" => Some(Collection::Staff),
            "events" | "event" => Some(Collection::Events),
            "announcements" | "announcement" => Some(Collection::Announcements),
            _ => None,
        }
    }
}

/// Entity kinds that can be created through the add-data form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum EntityKind {
    Teacher,
    Student,
    Subject,
    Class,
    Staff,
    Event,
}

impl EntityKind {
    pub fn as_str(self) -> &'static str {
        match self {
            EntityKind::Teacher => "teacher",
            EntityKind::Student => "student",
            EntityKind::Subject => "subject",
            EntityKind::Class => "class",
            EntityKind::Staff => "staff",
            EntityKind::Event => "event",
        }
    }

    pub fn parse(raw: &str) -> Option<EntityKind> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "teacher" => Some(EntityKind::Teacher),
            "student" => Some(EntityKind::Student),
            "subject" => Some(EntityKind::Subject),
            "class" => Some(EntityKind::Class),
            "staff" => Some(EntityKind::Staff),
            "event" => Some(EntityKind::Event),
            _ => None,
        }
    }

    pub fn collection(self) -> Collection {
        match self {
            EntityKind::Teacher => Collection::Teachers,
            EntityKind::Student => Collection::Students,
            EntityKind::Subject => Collection::Subjects,
            EntityKind::Class => Collection::Classes,
            EntityKind::Staff => Collection::Staff,
            EntityKind::Event => Collection::Events,
        }
    }

    /// Field names the rest of the system understands for this kind.
    pub fn schema(self) -> &'static [&'static str] {
        match self {
            EntityKind::Teacher => &[
                "name",
                "specialty",
                "contractHours",
                "schedule",
                "onLeave",
                "cpf",
                "phone",
                "address",
            ],
            EntityKind::Student => &[
                "name",
                "warnings",
                "onLeave",
                "feeStatus",
                "cpf",
                "phone",
                "address",
            ],
            EntityKind::Subject => &["name", "coursePlan", "workload"],
            EntityKind::Class => &["name", "area", "teacherId", "studentIds", "subjectIds"],
            EntityKind::Staff => &["name", "role", "contractHours", "cpf", "phone", "address"],
            EntityKind::Event => &["name", "date", "description", "linkedClasses"],
        }
    }
}

/// One stored document. `id` and `created_at` are assigned by the backend;
/// everything else lives in `fields`, in insertion order.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Record {
    pub id: String,
    pub created_at: String,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl Record {
    pub fn str_field(&self, key: &str) -> Option<&str> {
        self.fields.get(key).and_then(|v| v.as_str())
    }

    pub fn name(&self) -> Option<&str> {
        self.str_field("name")
    }

    /// String members of an array field; missing or non-array fields read as empty.
    pub fn id_set(&self, key: &str) -> Vec<&str> {
        self.fields
            .get(key)
            .and_then(|v| v.as_array())
            .map(|items| items.iter().filter_map(|v| v.as_str()).collect())
            .unwrap_or_default()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FeeStatus {
    Paid,
    Due,
    Exempt,
}

impl FeeStatus {
    pub fn parse(raw: &str) -> Option<FeeStatus> {
        match raw {
            "paid" => Some(FeeStatus::Paid),
            "due" => Some(FeeStatus::Due),
            "exempt" => Some(FeeStatus::Exempt),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AnnouncementTarget {
    All,
    Teachers,
    Staff,
}

impl AnnouncementTarget {
    pub fn as_str(self) -> &'static str {
        match self {
            AnnouncementTarget::All => "all",
            AnnouncementTarget::Teachers => "teachers",
            AnnouncementTarget::Staff => "staff",
        }
    }

    pub fn parse(raw: &str) -> Option<AnnouncementTarget> {
        match raw {
            "all" => Some(AnnouncementTarget::All),
            "teachers" => Some(AnnouncementTarget::Teachers),
            "staff" => Some(AnnouncementTarget::Staff),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Role {
    Administrator,
    Viewer,
}

/// Named pages of the dashboard, selected by the navigation state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Page {
    #[default]
    Dashboard,
    AddData,
    LinkData,
    Events,
    Queries,
    Reports,
}

impl Page {
    pub fn parse(raw: &str) -> Option<Page> {
        match raw {
            "dashboard" => Some(Page::Dashboard),
            "addData" => Some(Page::AddData),
            "linkData" => Some(Page::LinkData),
            "events" => Some(Page::Events),
            "queries" => Some(Page::Queries),
            "reports" => Some(Page::Reports),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn record_serializes_flat_with_fields_in_insertion_order() {
        let mut fields = Map::new();
        fields.insert("name".into(), json!("Ana Silva"));
        fields.insert("contractHours".into(), json!(40));
        let rec = Record {
            id: "t1".into(),
            created_at: "2026-01-01T00:00:00.000000Z".into(),
            fields,
        };
        let text = serde_json::to_string(&rec).expect("serialize");
        assert_eq!(
            text,
            r#"{"id":"t1","createdAt":"2026-01-01T00:00:00.000000Z","name":"Ana Silva","contractHours":40}"#
        );
    }

    #[test]
    fn collection_parse_accepts_singular_kind_names() {
        assert_eq!(Collection::parse("teacher"), Some(Collection::Teachers));
        assert_eq!(Collection::parse("Classes"), Some(Collection::Classes));
        assert_eq!(Collection::parse("turmas"), None);
        for c in Collection::ALL {
            assert_eq!(Collection::parse(c.as_str()), Some(c));
        }
    }
}
