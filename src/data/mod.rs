//! Issue model consumed by the tree engine.
//!
//! Issues arrive fully formed (from a beads `issues.jsonl` export or from the
//! host application) and are never mutated by the tree.

pub mod sorting;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

pub use sorting::{compare_issues, SortDirection, SortField};

/// Lookup of every known issue by identifier.
///
/// Supplied by the caller for blocker resolution; blockers may live outside the
/// subset currently shown in the tree.
pub type IssueIndex = HashMap<String, Issue>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Issue {
    pub id: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub status: Status,
    #[serde(default = "default_priority")]
    pub priority: i32,
    #[serde(default)]
    pub issue_type: IssueType,
    #[serde(default)]
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub updated_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub closed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub labels: Vec<String>,
    #[serde(default)]
    pub dependencies: Vec<Dependency>,
}

fn default_priority() -> i32 {
    2
}

impl Issue {
    /// Parent named by the first `parent-child` edge, if any.
    pub fn parent_id(&self) -> Option<&str> {
        self.dependencies
            .iter()
            .find(|d| d.dep_type == DependencyType::ParentChild)
            .map(|d| d.depends_on_id.as_str())
    }

    /// Identifiers of issues blocking this one.
    pub fn blocker_ids(&self) -> impl Iterator<Item = &str> {
        self.dependencies
            .iter()
            .filter(|d| d.dep_type == DependencyType::Blocks)
            .map(|d| d.depends_on_id.as_str())
    }
}

/// A typed edge from `issue_id` to `depends_on_id`.
///
/// For `parent-child` edges, `depends_on_id` is the parent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dependency {
    #[serde(default)]
    pub issue_id: String,
    pub depends_on_id: String,
    #[serde(rename = "type")]
    pub dep_type: DependencyType,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum DependencyType {
    ParentChild,
    Blocks,
    Related,
    DiscoveredFrom,
    Other(String),
}

impl DependencyType {
    pub fn as_str(&self) -> &str {
        match self {
            Self::ParentChild => "parent-child",
            Self::Blocks => "blocks",
            Self::Related => "related",
            Self::DiscoveredFrom => "discovered-from",
            Self::Other(s) => s,
        }
    }
}

impl From<String> for DependencyType {
    fn from(value: String) -> Self {
        match value.as_str() {
            "parent-child" => Self::ParentChild,
            "blocks" => Self::Blocks,
            "related" => Self::Related,
            "discovered-from" => Self::DiscoveredFrom,
            _ => Self::Other(value),
        }
    }
}

impl From<DependencyType> for String {
    fn from(value: DependencyType) -> Self {
        value.as_str().to_string()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Status {
    #[default]
    Open,
    InProgress,
    Blocked,
    Closed,
    Tombstone,
    Other(String),
}

impl Status {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Open => "open",
            Self::InProgress => "in_progress",
            Self::Blocked => "blocked",
            Self::Closed => "closed",
            Self::Tombstone => "tombstone",
            Self::Other(s) => s,
        }
    }

    /// Short fixed-width badge text for tree rows.
    pub fn badge(&self) -> &'static str {
        match self {
            Self::Open => "OPEN",
            Self::InProgress => "PROG",
            Self::Blocked => "BLKD",
            Self::Closed => "DONE",
            Self::Tombstone => "TOMB",
            Self::Other(_) => "????",
        }
    }

    pub fn sort_order(&self) -> u8 {
        match self {
            Self::Open => 0,
            Self::InProgress => 1,
            Self::Blocked => 2,
            Self::Closed => 3,
            Self::Tombstone => 4,
            Self::Other(_) => 5,
        }
    }

    pub fn is_closed_like(&self) -> bool {
        matches!(self, Self::Closed | Self::Tombstone)
    }
}

impl From<String> for Status {
    fn from(value: String) -> Self {
        match value.as_str() {
            "open" => Self::Open,
            "in_progress" => Self::InProgress,
            "blocked" => Self::Blocked,
            "closed" => Self::Closed,
            "tombstone" => Self::Tombstone,
            _ => Self::Other(value),
        }
    }
}

impl From<Status> for String {
    fn from(value: Status) -> Self {
        value.as_str().to_string()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum IssueType {
    Epic,
    Feature,
    #[default]
    Task,
    Bug,
    Chore,
    Other(String),
}

impl IssueType {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Epic => "epic",
            Self::Feature => "feature",
            Self::Task => "task",
            Self::Bug => "bug",
            Self::Chore => "chore",
            Self::Other(s) => s,
        }
    }

    /// Canonical order: epic, feature, task, bug, chore, then anything else.
    pub fn sort_order(&self) -> u8 {
        match self {
            Self::Epic => 0,
            Self::Feature => 1,
            Self::Task => 2,
            Self::Bug => 3,
            Self::Chore => 4,
            Self::Other(_) => 5,
        }
    }
}

impl From<String> for IssueType {
    fn from(value: String) -> Self {
        match value.as_str() {
            "epic" => Self::Epic,
            "feature" => Self::Feature,
            "task" => Self::Task,
            "bug" => Self::Bug,
            "chore" => Self::Chore,
            _ => Self::Other(value),
        }
    }
}

impl From<IssueType> for String {
    fn from(value: IssueType) -> Self {
        value.as_str().to_string()
    }
}

/// Parse JSONL issue content, one issue per non-blank line.
///
/// Lines that fail to parse are skipped and logged.
pub fn parse_issues_jsonl(content: &str) -> Vec<Issue> {
    let mut issues = Vec::new();
    for (idx, line) in content.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        match serde_json::from_str::<Issue>(line) {
            Ok(issue) => issues.push(issue),
            Err(e) => tracing::warn!("Skipping malformed issue on line {}: {}", idx + 1, e),
        }
    }
    issues
}

pub fn load_issues(path: &Path) -> Result<Vec<Issue>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read issues from {}", path.display()))?;
    Ok(parse_issues_jsonl(&content))
}

/// Build an identifier index over a slice of issues. Later duplicates lose.
pub fn index_issues(issues: &[Issue]) -> IssueIndex {
    let mut index = IssueIndex::with_capacity(issues.len());
    for issue in issues {
        index
            .entry(issue.id.clone())
            .or_insert_with(|| issue.clone());
    }
    index
}
