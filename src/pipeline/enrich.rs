// enrich.rs
// Phase 7: Attach externally scraped interests to person nodes

use super::document::{GraphDocument, NodeTag};
use super::extract::leader_label;
use crate::error::{PipelineError, Result};
use crate::record::RawProjectRecord;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;
use std::collections::{BTreeMap, HashMap};
use std::path::PathBuf;
use tracing::{info, warn};

/// Programme codes ("09.03.04 Software engineering") up to the next comma.
static PROGRAMME_CODE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b\d{2}\.\d{2}\.\d{2}\b[^,]*").expect("valid programme code regex"));

/// Collaborator supplying person display label -> interests.
pub trait InterestSource {
    fn interests_by_label(&self) -> Result<HashMap<String, Vec<String>>>;
}

impl InterestSource for HashMap<String, Vec<String>> {
    fn interests_by_label(&self) -> Result<HashMap<String, Vec<String>>> {
        Ok(self.clone())
    }
}

/// Cached scrape output on disk. A missing file means no enrichment.
#[derive(Debug, Clone)]
pub struct JsonInterestFile {
    pub path: PathBuf,
}

impl JsonInterestFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum InterestValue {
    List(Vec<String>),
    Text(String),
}

impl InterestValue {
    fn into_items(self) -> Vec<String> {
        match self {
            InterestValue::List(items) => items,
            InterestValue::Text(text) => text.split(',').map(|s| s.trim().to_string()).collect(),
        }
    }
}

impl InterestSource for JsonInterestFile {
    fn interests_by_label(&self) -> Result<HashMap<String, Vec<String>>> {
        if !self.path.exists() {
            info!(path = %self.path.display(), "no interests file, skipping enrichment data");
            return Ok(HashMap::new());
        }
        let raw = std::fs::read_to_string(&self.path).map_err(|e| PipelineError::io(&self.path, e))?;
        let parsed: HashMap<String, InterestValue> = serde_json::from_str(&raw).map_err(|e| {
            PipelineError::MalformedInput(format!(
                "interests file {} is not a label -> interests object: {e}",
                self.path.display()
            ))
        })?;
        Ok(parsed
            .into_iter()
            .map(|(label, value)| (label, value.into_items()))
            .collect())
    }
}

/// Interests from `source`, or none when it cannot be read. Enrichment still
/// runs on an empty map, so every person ends up with empty interests.
pub fn interests_or_empty(source: &dyn InterestSource) -> HashMap<String, Vec<String>> {
    match source.interests_by_label() {
        Ok(interests) => interests,
        Err(e) => {
            warn!(error = %e, "interests unavailable, persons get empty interests");
            HashMap::new()
        }
    }
}

/// Join interests with `", "`, dropping programme codes and empty items.
pub fn format_interests(interests: &[String]) -> String {
    interests
        .iter()
        .map(|item| PROGRAMME_CODE.replace_all(item, ""))
        .map(|item| item.trim().trim_matches(',').trim().to_string())
        .filter(|item| !item.is_empty())
        .collect::<Vec<_>>()
        .join(", ")
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EnrichmentStats {
    pub persons: usize,
    pub matched: usize,
}

/// Attach interests to every person node. Matched nodes lose their URL
/// placeholder; unmatched ones get an empty `interests`.
pub fn enrich_document(
    document: &mut GraphDocument,
    interests: &HashMap<String, Vec<String>>,
) -> EnrichmentStats {
    let mut stats = EnrichmentStats::default();
    for node in document
        .nodes
        .iter_mut()
        .filter(|n| n.tag == NodeTag::Person)
    {
        stats.persons += 1;
        match interests.get(&node.label) {
            Some(found) => {
                stats.matched += 1;
                node.interests = Some(format_interests(found));
                node.url = None;
            }
            None => node.interests = Some(String::new()),
        }
    }
    info!(persons = stats.persons, matched = stats.matched, "interests attached");
    stats
}

/// Lookup key the staff directory scraper uses for one leader.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StaffKey {
    /// Part of the first email before `@`
    pub email_prefix: Option<String>,
    /// Same text as the leader's person node label
    pub label: String,
}

/// Staff directory keys per leader id, across all records. A leader seen in
/// several projects keeps the last entry.
pub fn staff_directory_keys(records: &[RawProjectRecord]) -> BTreeMap<String, StaffKey> {
    let mut keys = BTreeMap::new();
    for leader in records.iter().flat_map(RawProjectRecord::leaders) {
        let Some(id) = leader.id.clone() else {
            continue;
        };
        let email_prefix = leader
            .emails
            .first()
            .and_then(|email| email.split('@').next())
            .filter(|prefix| !prefix.is_empty())
            .map(str::to_owned);
        keys.insert(
            id,
            StaffKey {
                email_prefix,
                label: leader_label(&leader),
            },
        );
    }
    keys
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::document::{static_tags, DocumentNode};
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use std::io::Write;

    fn node(key: &str, label: &str, tag: NodeTag) -> DocumentNode {
        DocumentNode {
            key: key.into(),
            label: label.into(),
            tag,
            url: Some(String::new()),
            interests: None,
            cluster: "0".into(),
            x: 0.0,
            y: 0.0,
            score: 2.0,
        }
    }

    fn document() -> GraphDocument {
        GraphDocument {
            nodes: vec![
                node("0", "Ivanov I.I.", NodeTag::Person),
                node("1", "Smart home", NodeTag::Tool),
                node("2", "Petrov P.", NodeTag::Person),
            ],
            edges: vec![[0, 1], [2, 1]],
            clusters: Vec::new(),
            tags: static_tags(),
        }
    }

    #[test]
    fn found_label_gets_interests_and_loses_url() {
        let mut doc = document();
        let interests = HashMap::from([(
            "Ivanov I.I.".to_string(),
            vec!["ML".to_string(), "IoT".to_string()],
        )]);
        let stats = enrich_document(&mut doc, &interests);

        assert_eq!(stats, EnrichmentStats { persons: 2, matched: 1 });
        assert_eq!(doc.nodes[0].interests.as_deref(), Some("ML, IoT"));
        assert_eq!(doc.nodes[0].url, None);
        assert_eq!(doc.nodes[2].interests.as_deref(), Some(""));
        assert_eq!(doc.nodes[2].url.as_deref(), Some(""));
        // project nodes are untouched
        assert_eq!(doc.nodes[1].interests, None);
    }

    #[test]
    fn formatting_strips_programme_codes() {
        let items = vec![
            "Machine learning".to_string(),
            "09.03.04 Software engineering".to_string(),
            "Robotics".to_string(),
        ];
        assert_eq!(format_interests(&items), "Machine learning, Robotics");
        assert_eq!(format_interests(&[]), "");
        assert_eq!(format_interests(&["01.03.02 Applied maths".to_string()]), "");
    }

    #[test]
    fn interest_file_accepts_lists_and_strings() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            "{}",
            json!({"Ivanov I.I.": ["ML", "IoT"], "Petrov P.": "Networks, 11.04.02 Radio"})
        )
        .unwrap();

        let interests = JsonInterestFile::new(file.path()).interests_by_label().unwrap();
        assert_eq!(interests["Ivanov I.I."], vec!["ML", "IoT"]);
        assert_eq!(format_interests(&interests["Petrov P."]), "Networks");
    }

    #[test]
    fn missing_interest_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let source = JsonInterestFile::new(dir.path().join("absent.json"));
        assert!(source.interests_by_label().unwrap().is_empty());
    }

    #[test]
    fn malformed_interest_file_is_an_input_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "[1, 2]").unwrap();
        let err = JsonInterestFile::new(file.path()).interests_by_label().unwrap_err();
        assert!(err.is_input_error());
    }

    #[test]
    fn unreadable_interests_fall_back_to_empty() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{{\"Ivanov I.I.\": ").unwrap();
        let interests = interests_or_empty(&JsonInterestFile::new(file.path()));
        assert!(interests.is_empty());

        let mut doc = document();
        let stats = enrich_document(&mut doc, &interests);
        assert_eq!(stats.matched, 0);
        assert_eq!(doc.nodes[0].interests.as_deref(), Some(""));
        assert_eq!(doc.nodes[2].interests.as_deref(), Some(""));
    }

    #[test]
    fn staff_keys_use_first_email_and_leader_label() {
        let records: Vec<RawProjectRecord> = serde_json::from_value(json!([
            {"id": 1, "leaders": [
                {"id": 10, "name": "Sidorov Sidor Sidorovich", "first_name": "Sidor",
                 "middle_name": "Sidorovich", "last_name": "Sidorov",
                 "email": ["ssidorov@hse.ru", "other@x.org"]},
                {"id": 11, "name": "Orlov Oleg", "first_name": "Oleg", "last_name": "Orlov",
                 "email": "oorlov@hse.ru"},
                {"id": 12, "name": "No Mail", "last_name": "Mail"}
            ]}
        ]))
        .unwrap();

        let keys = staff_directory_keys(&records);
        assert_eq!(keys.len(), 3);
        assert_eq!(
            keys["10"],
            StaffKey {
                email_prefix: Some("ssidorov".into()),
                label: "Sidorov S.S.".into()
            }
        );
        assert_eq!(keys["11"].email_prefix.as_deref(), Some("oorlov"));
        assert_eq!(keys["11"].label, "Orlov O.");
        assert_eq!(keys["12"].email_prefix, None);
        assert_eq!(keys["12"].label, "Mail");
    }
}
