// extract.rs
// Phase 3: Derive person nodes, the project node and weighted edges per record

use super::names::{leader_short_name, short_name, NameParts};
use crate::graph::{Edge, GroupBy, NodeId, PersonNode, ProjectNode, UNKNOWN_GROUP};
use crate::record::{RawProjectRecord, TeamLeader, TeamMember};
use chrono::{NaiveDate, NaiveDateTime};
use std::collections::HashMap;
use tracing::{debug, warn};

/// `startDate` of a team member.
pub const MEMBER_DATE_FORMAT: &str = "%d.%m.%Y";
/// `dateCreated` of a project; used as every leader's join date.
pub const PROJECT_CREATED_FORMAT: &str = "%d.%m.%Y %H:%M:%S";

/// Inputs shared by every record in one run.
///
/// `now` is fixed once per run. Membership durations, and therefore edge
/// weights, depend on it: the same records produce different weights when run
/// at different times.
#[derive(Debug, Clone, Copy)]
pub struct ExtractContext {
    pub group_by: GroupBy,
    pub now: NaiveDateTime,
}

/// Everything extracted from one record.
#[derive(Debug, Clone, PartialEq)]
pub struct Extraction {
    pub edges: Vec<Edge>,
    pub nodes_by_id: HashMap<NodeId, PersonNode>,
    pub project: ProjectNode,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExtractionStats {
    pub records_skipped: usize,
    pub members_seen: usize,
    pub members_skipped: usize,
    pub leaders_seen: usize,
    pub leaders_skipped: usize,
}

/// Extract one record. `None` only when the record has no id to build a
/// project node from.
pub fn extract_edges(
    record: &RawProjectRecord,
    ctx: &ExtractContext,
    stats: &mut ExtractionStats,
) -> Option<Extraction> {
    let Some(project_id) = record.scalar("id") else {
        warn!("skipping project record without an id");
        stats.records_skipped += 1;
        return None;
    };

    let project = ProjectNode {
        id: format!("project_{project_id}"),
        name: record
            .scalar("nameRus")
            .or_else(|| record.scalar("name"))
            .unwrap_or_default(),
        project_type: record.scalar("type").unwrap_or_default(),
    };
    let group = record
        .scalar(ctx.group_by.field())
        .unwrap_or_else(|| UNKNOWN_GROUP.to_string());

    let mut people = Vec::new();

    for member in record.members() {
        stats.members_seen += 1;
        match member_node(&member, ctx.now) {
            Some(node) => people.push(node),
            None => {
                stats.members_skipped += 1;
                debug!(project = %project_id, member = ?member.id, "skipping team member");
            }
        }
    }

    let created = record
        .scalar("dateCreated")
        .and_then(|raw| NaiveDateTime::parse_from_str(&raw, PROJECT_CREATED_FORMAT).ok());

    for leader in record.leaders() {
        stats.leaders_seen += 1;
        match created.and_then(|joined| leader_node(&leader, joined, ctx.now)) {
            Some(node) => people.push(node),
            None => {
                stats.leaders_skipped += 1;
                debug!(project = %project_id, leader = ?leader.id, "skipping leader");
            }
        }
    }

    let mut edges = Vec::with_capacity(people.len());
    let mut nodes_by_id = HashMap::with_capacity(people.len());
    for person in people {
        nodes_by_id.insert(person.id.clone(), person.clone());
        edges.push(Edge::new(person, project.clone(), group.clone()));
    }

    Some(Extraction {
        edges,
        nodes_by_id,
        project,
    })
}

fn member_node(member: &TeamMember, now: NaiveDateTime) -> Option<PersonNode> {
    let full_name = member.full_name.as_deref()?;
    let id = member.id.as_deref()?;
    let joined = NaiveDate::parse_from_str(member.start_date.as_deref()?, MEMBER_DATE_FORMAT)
        .ok()?
        .and_hms_opt(0, 0, 0)?;

    Some(PersonNode {
        id: format!("user_{id}"),
        full_name: full_name.to_string(),
        short_name: short_name(full_name),
        role: member.role.clone(),
        membership_duration_days: duration_days(joined, now),
    })
}

fn leader_node(leader: &TeamLeader, joined: NaiveDateTime, now: NaiveDateTime) -> Option<PersonNode> {
    if leader.owner_privilege == 0.0 {
        return None;
    }
    let full_name = leader.full_name.as_deref()?;
    let id = leader.id.as_deref()?;

    Some(PersonNode {
        id: format!("user_{id}"),
        full_name: full_name.to_string(),
        short_name: leader_label(leader),
        role: leader.role.clone(),
        membership_duration_days: duration_days(joined, now),
    })
}

/// Display label of a leader. Falls back to the member template when the
/// structured last name is missing.
pub fn leader_label(leader: &TeamLeader) -> String {
    match leader.last_name.as_deref() {
        Some(last) => leader_short_name(NameParts {
            last: Some(last),
            first: leader.first_name.as_deref(),
            middle: leader.middle_name.as_deref(),
        }),
        None => leader
            .full_name
            .as_deref()
            .map(short_name)
            .unwrap_or_default(),
    }
}

/// Whole days from `joined` to `now`; a join date in the future counts as 0.
pub fn duration_days(joined: NaiveDateTime, now: NaiveDateTime) -> i64 {
    (now - joined).num_days().max(0)
}
