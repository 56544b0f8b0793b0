//! Sort fields, directions and the sibling comparator.
//!
//! This module is the single source of truth for ordering issues. The tree
//! sorts each sibling group with [`compare_issues`]; flat mode sorts the whole
//! visible set with the same comparator.

use super::Issue;
use std::cmp::Ordering;
use std::collections::HashMap;

/// Field used to order sibling issues.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SortField {
    Priority,
    #[default]
    Created,
    Updated,
    Title,
    Status,
    Type,
    DepsCount,
    PageRank,
}

impl SortField {
    pub const COUNT: usize = 8;

    /// Iterator over all fields in popup order
    pub fn all() -> impl Iterator<Item = Self> {
        [
            Self::Priority,
            Self::Created,
            Self::Updated,
            Self::Title,
            Self::Status,
            Self::Type,
            Self::DepsCount,
            Self::PageRank,
        ]
        .into_iter()
    }

    pub fn index(&self) -> usize {
        match self {
            Self::Priority => 0,
            Self::Created => 1,
            Self::Updated => 2,
            Self::Title => 3,
            Self::Status => 4,
            Self::Type => 5,
            Self::DepsCount => 6,
            Self::PageRank => 7,
        }
    }

    pub fn from_index(idx: usize) -> Option<Self> {
        Self::all().nth(idx)
    }

    pub fn next(&self) -> Self {
        Self::from_index((self.index() + 1) % Self::COUNT).unwrap_or_default()
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Priority => "Priority",
            Self::Created => "Created",
            Self::Updated => "Updated",
            Self::Title => "Title",
            Self::Status => "Status",
            Self::Type => "Type",
            Self::DepsCount => "Deps",
            Self::PageRank => "PageRank",
        }
    }

    /// Natural direction: most urgent, alphabetical and canonical orders
    /// ascend; time, dependency and rank fields show the largest first.
    pub fn default_direction(&self) -> SortDirection {
        match self {
            Self::Priority | Self::Title | Self::Status | Self::Type => SortDirection::Ascending,
            Self::Created | Self::Updated | Self::DepsCount | Self::PageRank => {
                SortDirection::Descending
            }
        }
    }
}

impl std::str::FromStr for SortField {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        Self::all()
            .find(|f| {
                f.label().eq_ignore_ascii_case(&wanted)
                    || (wanted == "deps_count" && *f == Self::DepsCount)
                    || (wanted == "depscount" && *f == Self::DepsCount)
            })
            .ok_or_else(|| anyhow::anyhow!("Unknown sort field: {}", s))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SortDirection {
    Ascending,
    #[default]
    Descending,
}

impl SortDirection {
    pub fn toggle(&self) -> Self {
        match self {
            Self::Ascending => Self::Descending,
            Self::Descending => Self::Ascending,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Ascending => "Ascending",
            Self::Descending => "Descending",
        }
    }

    pub fn indicator(&self) -> &'static str {
        match self {
            Self::Ascending => "▲",
            Self::Descending => "▼",
        }
    }
}

impl std::str::FromStr for SortDirection {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "asc" | "ascending" => Ok(Self::Ascending),
            "desc" | "descending" => Ok(Self::Descending),
            _ => anyhow::bail!("Unknown sort direction: {}", s),
        }
    }
}

/// Compare two issues for the given field and direction.
///
/// The direction flips only the field comparison; equal keys always fall back
/// to ascending identifier order so repeated sorts are deterministic.
pub fn compare_issues(
    a: &Issue,
    b: &Issue,
    field: SortField,
    direction: SortDirection,
    pagerank: &HashMap<String, f64>,
) -> Ordering {
    let primary = compare_field(a, b, field, pagerank);
    let primary = match direction {
        SortDirection::Ascending => primary,
        SortDirection::Descending => primary.reverse(),
    };
    primary.then_with(|| a.id.cmp(&b.id))
}

fn compare_field(a: &Issue, b: &Issue, field: SortField, pagerank: &HashMap<String, f64>) -> Ordering {
    match field {
        SortField::Priority => a
            .priority
            .cmp(&b.priority)
            .then_with(|| a.issue_type.sort_order().cmp(&b.issue_type.sort_order())),
        SortField::Created => a.created_at.cmp(&b.created_at),
        SortField::Updated => a.updated_at.cmp(&b.updated_at),
        SortField::Title => a.title.cmp(&b.title),
        SortField::Status => a.status.sort_order().cmp(&b.status.sort_order()),
        SortField::Type => a.issue_type.sort_order().cmp(&b.issue_type.sort_order()),
        SortField::DepsCount => a.dependencies.len().cmp(&b.dependencies.len()),
        SortField::PageRank => {
            // Missing and NaN scores both rank as zero
            let rank = |id: &str| pagerank.get(id).copied().filter(|r| !r.is_nan()).unwrap_or(0.0);
            rank(&a.id).total_cmp(&rank(&b.id))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{Dependency, DependencyType, IssueType, Status};
    use chrono::{TimeZone, Utc};

    fn make_issue(id: &str, title: &str, priority: i32, day: u32) -> Issue {
        Issue {
            id: id.to_string(),
            title: title.to_string(),
            description: None,
            status: Status::Open,
            priority,
            issue_type: IssueType::Task,
            created_at: Utc.with_ymd_and_hms(2024, 1, day, 0, 0, 0).unwrap(),
            updated_at: Utc.with_ymd_and_hms(2024, 2, day, 0, 0, 0).unwrap(),
            closed_at: None,
            labels: Vec::new(),
            dependencies: Vec::new(),
        }
    }

    fn sorted_ids(mut issues: Vec<Issue>, field: SortField, dir: SortDirection) -> Vec<String> {
        let ranks = HashMap::new();
        issues.sort_by(|a, b| compare_issues(a, b, field, dir, &ranks));
        issues.into_iter().map(|i| i.id).collect()
    }

    #[test]
    fn test_sort_by_title_both_directions() {
        let issues = vec![make_issue("b", "Beta", 1, 1), make_issue("a", "Alpha", 1, 2)];
        assert_eq!(
            sorted_ids(issues.clone(), SortField::Title, SortDirection::Ascending),
            vec!["a", "b"]
        );
        assert_eq!(
            sorted_ids(issues, SortField::Title, SortDirection::Descending),
            vec!["b", "a"]
        );
    }

    #[test]
    fn test_title_is_case_sensitive() {
        let issues = vec![make_issue("1", "alpha", 1, 1), make_issue("2", "Beta", 1, 1)];
        // Uppercase sorts before lowercase in byte order
        assert_eq!(
            sorted_ids(issues, SortField::Title, SortDirection::Ascending),
            vec!["2", "1"]
        );
    }

    #[test]
    fn test_priority_uses_type_as_secondary_key() {
        let mut bug = make_issue("bug", "B", 1, 1);
        bug.issue_type = IssueType::Bug;
        let mut epic = make_issue("epic", "E", 1, 1);
        epic.issue_type = IssueType::Epic;
        let p0 = make_issue("urgent", "U", 0, 1);

        assert_eq!(
            sorted_ids(vec![bug, epic, p0], SortField::Priority, SortDirection::Ascending),
            vec!["urgent", "epic", "bug"]
        );
    }

    #[test]
    fn test_created_descending_is_newest_first() {
        let issues = vec![
            make_issue("old", "Old", 1, 1),
            make_issue("new", "New", 1, 20),
            make_issue("mid", "Mid", 1, 10),
        ];
        assert_eq!(
            sorted_ids(issues, SortField::Created, SortDirection::Descending),
            vec!["new", "mid", "old"]
        );
    }

    #[test]
    fn test_ties_break_on_id_in_both_directions() {
        let issues = vec![make_issue("c", "Same", 1, 1), make_issue("a", "Same", 1, 1)];
        assert_eq!(
            sorted_ids(issues.clone(), SortField::Title, SortDirection::Ascending),
            vec!["a", "c"]
        );
        assert_eq!(
            sorted_ids(issues, SortField::Title, SortDirection::Descending),
            vec!["a", "c"]
        );
    }

    #[test]
    fn test_status_canonical_order() {
        let mut closed = make_issue("closed", "C", 1, 1);
        closed.status = Status::Closed;
        let mut blocked = make_issue("blocked", "B", 1, 1);
        blocked.status = Status::Blocked;
        let mut other = make_issue("other", "O", 1, 1);
        other.status = Status::Other("review".into());
        let open = make_issue("open", "O", 1, 1);

        assert_eq!(
            sorted_ids(vec![other, closed, open, blocked], SortField::Status, SortDirection::Ascending),
            vec!["open", "blocked", "closed", "other"]
        );
    }

    #[test]
    fn test_deps_count_and_pagerank() {
        let mut many = make_issue("many", "M", 1, 1);
        many.dependencies = vec![
            Dependency {
                issue_id: "many".into(),
                depends_on_id: "x".into(),
                dep_type: DependencyType::Related,
            };
            3
        ];
        let none = make_issue("none", "N", 1, 1);
        assert_eq!(
            sorted_ids(vec![none.clone(), many.clone()], SortField::DepsCount, SortDirection::Descending),
            vec!["many", "none"]
        );

        let mut ranks = HashMap::new();
        ranks.insert("none".to_string(), 0.9);
        let mut issues = vec![many, none];
        issues.sort_by(|a, b| {
            compare_issues(a, b, SortField::PageRank, SortDirection::Descending, &ranks)
        });
        assert_eq!(issues[0].id, "none");
    }

    #[test]
    fn test_field_cycle_and_defaults() {
        assert_eq!(SortField::PageRank.next(), SortField::Priority);
        assert_eq!(SortField::Priority.next(), SortField::Created);
        assert_eq!(SortField::all().count(), SortField::COUNT);
        assert_eq!(SortField::Priority.default_direction(), SortDirection::Ascending);
        assert_eq!(SortField::Updated.default_direction(), SortDirection::Descending);
        assert_eq!(SortField::DepsCount.label(), "Deps");
        assert_eq!(SortDirection::Ascending.toggle(), SortDirection::Descending);
        assert_eq!("deps".parse::<SortField>().unwrap(), SortField::DepsCount);
        assert_eq!("desc".parse::<SortDirection>().unwrap(), SortDirection::Descending);
    }

    #[test]
    fn test_nan_pagerank_ranks_as_zero() {
        let issues: Vec<Issue> = (0..200).map(|i| make_issue(&format!("i{:03}", i), "T", 1, 1)).collect();
        let mut ranks = HashMap::new();
        for (i, issue) in issues.iter().enumerate() {
            let score = if i % 3 == 0 { f64::NAN } else { (i % 7) as f64 / 10.0 };
            ranks.insert(issue.id.clone(), score);
        }

        let mut sorted = issues.clone();
        sorted.sort_by(|a, b| compare_issues(a, b, SortField::PageRank, SortDirection::Descending, &ranks));
        assert_eq!(sorted.len(), 200);

        let score = |i: &Issue| ranks[&i.id].max(0.0);
        for pair in sorted.windows(2) {
            let (a, b) = (score(&pair[0]), score(&pair[1]));
            assert!(a > b || (a == b && pair[0].id < pair[1].id), "{} before {}", pair[0].id, pair[1].id);
        }
    }
}
