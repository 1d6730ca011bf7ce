// record.rs
// Raw project records as delivered by the data source, plus the typed views
// the extractor reads out of them.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One project as delivered by the data source.
///
/// Field shapes are not trusted: nested collections may still be encoded as
/// strings, ids may be numbers or strings, and any field may be missing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RawProjectRecord {
    fields: Map<String, Value>,
}

impl RawProjectRecord {
    pub fn new(fields: Map<String, Value>) -> Self {
        Self { fields }
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    pub fn insert(&mut self, field: impl Into<String>, value: Value) -> Option<Value> {
        self.fields.insert(field.into(), value)
    }

    /// Scalar field rendered as text; `None` for missing, null and nested values.
    pub fn scalar(&self, field: &str) -> Option<String> {
        self.fields.get(field).and_then(scalar_to_string)
    }

    /// Record id for log lines.
    pub fn id_label(&self) -> String {
        self.scalar("id").unwrap_or_else(|| "Unknown".to_string())
    }

    /// Members from `detailed_team`. A field that is still encoded, or absent,
    /// yields no members.
    pub fn members(&self) -> Vec<TeamMember> {
        self.entries("detailed_team")
            .filter_map(TeamMember::from_entry)
            .collect()
    }

    /// Leaders from `leaders`, with the same "no entries" fallback as [`Self::members`].
    pub fn leaders(&self) -> Vec<TeamLeader> {
        self.entries("leaders")
            .filter_map(TeamLeader::from_entry)
            .collect()
    }

    fn entries(&self, field: &str) -> impl Iterator<Item = &Map<String, Value>> {
        self.fields
            .get(field)
            .and_then(Value::as_array)
            .into_iter()
            .flatten()
            .filter_map(Value::as_object)
    }
}

impl From<Map<String, Value>> for RawProjectRecord {
    fn from(fields: Map<String, Value>) -> Self {
        Self::new(fields)
    }
}

/// A `detailed_team` entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TeamMember {
    pub id: Option<String>,
    pub full_name: Option<String>,
    pub role: String,
    pub start_date: Option<String>,
}

impl TeamMember {
    fn from_entry(entry: &Map<String, Value>) -> Option<Self> {
        if entry.is_empty() {
            return None;
        }
        Some(Self {
            id: first_scalar(entry, &["id", "userId"]),
            full_name: first_text(entry, &["fullName", "name"]),
            role: first_scalar(entry, &["role"]).unwrap_or_default(),
            start_date: first_text(entry, &["startDate"]),
        })
    }
}

/// A `leaders` entry.
#[derive(Debug, Clone, PartialEq)]
pub struct TeamLeader {
    pub id: Option<String>,
    /// `name`, or `fio` when the source uses the older key.
    pub full_name: Option<String>,
    pub role: String,
    /// Any nonzero value marks a project owner.
    pub owner_privilege: f64,
    pub first_name: Option<String>,
    pub middle_name: Option<String>,
    pub last_name: Option<String>,
    pub emails: Vec<String>,
}

impl TeamLeader {
    fn from_entry(entry: &Map<String, Value>) -> Option<Self> {
        if entry.is_empty() {
            return None;
        }
        Some(Self {
            id: first_scalar(entry, &["id", "userId"]),
            full_name: first_text(entry, &["name", "fio"]),
            role: first_scalar(entry, &["role"]).unwrap_or_default(),
            owner_privilege: entry
                .get("ownerPrivilege")
                .and_then(number)
                .unwrap_or(0.0),
            first_name: first_text(entry, &["first_name"]),
            middle_name: first_text(entry, &["middle_name"]),
            last_name: first_text(entry, &["last_name"]),
            emails: emails(entry),
        })
    }
}

/// Email addresses: a list, or a single string.
fn emails(entry: &Map<String, Value>) -> Vec<String> {
    match entry.get("email") {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(|v| v.as_str().map(str::to_owned))
            .filter(|s| !s.is_empty())
            .collect(),
        Some(Value::String(s)) if !s.is_empty() => vec![s.clone()],
        _ => Vec::new(),
    }
}

/// Strings, numbers and booleans as text. Nulls and nested values are `None`.
pub fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn first_scalar(entry: &Map<String, Value>, keys: &[&str]) -> Option<String> {
    keys.iter()
        .find_map(|key| entry.get(*key).and_then(scalar_to_string))
}

/// Like `first_scalar`, but blank strings count as absent.
fn first_text(entry: &Map<String, Value>, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|key| {
        entry
            .get(*key)
            .and_then(scalar_to_string)
            .filter(|s| !s.trim().is_empty())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(value: Value) -> RawProjectRecord {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn scalar_renders_numbers_and_strings() {
        let r = record(json!({"id": 42, "type": "research", "owner": true, "x": null}));
        assert_eq!(r.scalar("id").as_deref(), Some("42"));
        assert_eq!(r.scalar("type").as_deref(), Some("research"));
        assert_eq!(r.scalar("owner").as_deref(), Some("true"));
        assert_eq!(r.scalar("x"), None);
        assert_eq!(r.scalar("missing"), None);
    }

    #[test]
    fn member_falls_back_to_user_id_and_name() {
        let r = record(json!({
            "detailed_team": [{"userId": 7, "name": "Ivan Petrov", "role": "dev", "startDate": null}]
        }));
        let members = r.members();
        assert_eq!(members.len(), 1);
        assert_eq!(members[0].id.as_deref(), Some("7"));
        assert_eq!(members[0].full_name.as_deref(), Some("Ivan Petrov"));
        assert_eq!(members[0].start_date, None);
    }

    #[test]
    fn still_encoded_team_yields_no_members() {
        let r = record(json!({"detailed_team": "[{'id': 1"}));
        assert!(r.members().is_empty());
        assert!(r.leaders().is_empty());
    }

    #[test]
    fn leader_reads_fio_and_privilege() {
        let r = record(json!({
            "leaders": [{"id": "3", "fio": "Sidorov Ivan Petrovich", "ownerPrivilege": "1",
                         "first_name": "Ivan", "middle_name": "", "last_name": "Sidorov"}]
        }));
        let leaders = r.leaders();
        assert_eq!(leaders[0].full_name.as_deref(), Some("Sidorov Ivan Petrovich"));
        assert_eq!(leaders[0].owner_privilege, 1.0);
        assert_eq!(leaders[0].middle_name, None);
        assert_eq!(leaders[0].last_name.as_deref(), Some("Sidorov"));
    }

    #[test]
    fn fractional_privilege_stays_nonzero() {
        let r = record(json!({
            "leaders": [
                {"id": 1, "name": "A", "ownerPrivilege": 0.5},
                {"id": 2, "name": "B", "ownerPrivilege": "0.25"},
                {"id": 3, "name": "C", "ownerPrivilege": 0},
                {"id": 4, "name": "D", "ownerPrivilege": true},
                {"id": 5, "name": "E"}
            ]
        }));
        let privileges: Vec<f64> = r.leaders().iter().map(|l| l.owner_privilege).collect();
        assert_eq!(privileges, vec![0.5, 0.25, 0.0, 1.0, 0.0]);
    }

    #[test]
    fn emails_accept_list_or_string() {
        let list = json!({"email": ["a.b@hse.ru", "c@x.org"]});
        let single = json!({"email": "solo@hse.ru"});
        assert_eq!(emails(list.as_object().unwrap()), vec!["a.b@hse.ru", "c@x.org"]);
        assert_eq!(emails(single.as_object().unwrap()), vec!["solo@hse.ru"]);
        assert!(emails(&Map::new()).is_empty());
    }
}
