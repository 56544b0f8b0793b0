//! Filter engine: simple status filters and the advanced predicate language.
//!
//! A filter yields two node sets. `matches` holds nodes that satisfy the
//! filter; `context` holds every forest ancestor of a match, shown dimmed so a
//! match never appears without its path.

use super::forest::{Forest, NodeId};
use crate::data::{Issue, IssueIndex, Status};
use std::collections::HashSet;

/// Predefined status filters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SimpleFilter {
    #[default]
    All,
    Open,
    Closed,
    Ready,
}

impl SimpleFilter {
    /// Parse a filter name. Unknown names fall back to `All`.
    pub fn parse(s: &str) -> Self {
        match s.trim().to_ascii_lowercase().as_str() {
            "open" => Self::Open,
            "closed" => Self::Closed,
            "ready" => Self::Ready,
            "" | "all" => Self::All,
            other => {
                tracing::debug!("Unknown tree filter {:?}, showing all", other);
                Self::All
            }
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::All => "all",
            Self::Open => "open",
            Self::Closed => "closed",
            Self::Ready => "ready",
        }
    }

    /// `lookup` resolves blockers; it should cover issues outside the tree.
    pub fn matches<'a>(&self, issue: &Issue, lookup: impl Fn(&str) -> Option<&'a Issue>) -> bool {
        match self {
            Self::All => true,
            Self::Open => !issue.status.is_closed_like(),
            Self::Closed => issue.status.is_closed_like(),
            Self::Ready => {
                !issue.status.is_closed_like()
                    && issue.status != Status::Blocked
                    && !issue
                        .blocker_ids()
                        .any(|id| lookup(id).is_some_and(|b| !b.status.is_closed_like()))
            }
        }
    }
}

/// Fields understood by `field:value` tokens.
pub const FILTER_FIELDS: [&str; 3] = ["status", "priority", "type"];

/// One term of an advanced filter. An empty `field` is a plain-text title match.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterPredicate {
    pub field: String,
    pub value: String,
    pub negated: bool,
}

impl FilterPredicate {
    pub fn is_plain_text(&self) -> bool {
        self.field.is_empty()
    }

    pub fn matches(&self, issue: &Issue) -> bool {
        let hit = match self.field.as_str() {
            "" => issue
                .title
                .to_lowercase()
                .contains(&self.value.to_lowercase()),
            "status" => normalize(issue.status.as_str()) == normalize(&self.value),
            "priority" => parse_priority(&self.value) == Some(issue.priority),
            "type" => issue.issue_type.as_str().eq_ignore_ascii_case(&self.value),
            _ => false,
        };
        hit != self.negated
    }
}

fn normalize(s: &str) -> String {
    s.trim().to_ascii_lowercase().replace('-', "_")
}

fn parse_priority(value: &str) -> Option<i32> {
    let digits = value
        .strip_prefix('p')
        .or_else(|| value.strip_prefix('P'))
        .unwrap_or(value);
    digits.parse().ok()
}

/// Parse an advanced filter string.
///
/// `[!]field:value` tokens with a known field become field predicates. All
/// other tokens are joined into a single plain-text predicate, listed first.
pub fn parse_filter_predicates(input: &str) -> Vec<FilterPredicate> {
    let mut fields = Vec::new();
    let mut plain: Vec<&str> = Vec::new();
    let mut plain_negated = false;

    for token in input.split_whitespace() {
        let (negated, body) = match token.strip_prefix('!') {
            Some(rest) => (true, rest),
            None => (false, token),
        };
        if body.is_empty() {
            continue;
        }
        if let Some((field, value)) = body.split_once(':') {
            let field = field.to_ascii_lowercase();
            if FILTER_FIELDS.contains(&field.as_str()) && !value.is_empty() {
                fields.push(FilterPredicate {
                    field,
                    value: value.to_string(),
                    negated,
                });
                continue;
            }
        }
        plain_negated |= negated;
        plain.push(body);
    }

    let mut predicates = Vec::with_capacity(fields.len() + 1);
    if !plain.is_empty() {
        predicates.push(FilterPredicate {
            field: String::new(),
            value: plain.join(" "),
            negated: plain_negated,
        });
    }
    predicates.extend(fields);
    predicates
}

/// The filter currently applied to the tree.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum ActiveFilter {
    #[default]
    None,
    Simple(SimpleFilter),
    Advanced {
        query: String,
        predicates: Vec<FilterPredicate>,
    },
}

impl ActiveFilter {
    pub fn simple(name: &str) -> Self {
        match SimpleFilter::parse(name) {
            SimpleFilter::All => Self::None,
            f => Self::Simple(f),
        }
    }

    pub fn advanced(query: &str) -> Self {
        let predicates = parse_filter_predicates(query);
        if predicates.is_empty() {
            return Self::None;
        }
        Self::Advanced {
            query: query.trim().to_string(),
            predicates,
        }
    }

    pub fn is_active(&self) -> bool {
        !matches!(self, Self::None)
    }

    pub fn label(&self) -> &str {
        match self {
            Self::None => "all",
            Self::Simple(f) => f.label(),
            Self::Advanced { query, .. } => query,
        }
    }

    fn matches(&self, issue: &Issue, forest: &Forest, index: Option<&IssueIndex>) -> bool {
        match self {
            Self::None => true,
            Self::Simple(f) => f.matches(issue, |id| match index {
                Some(index) => index.get(id),
                None => forest.get(id).map(|n| &forest.node(n).issue),
            }),
            Self::Advanced { predicates, .. } => predicates.iter().all(|p| p.matches(issue)),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct FilterSets {
    pub matches: HashSet<NodeId>,
    pub context: HashSet<NodeId>,
}

impl FilterSets {
    /// Nodes that survive the filter: matches and their ancestors.
    pub fn is_visible(&self, id: NodeId) -> bool {
        self.matches.contains(&id) || self.context.contains(&id)
    }

    pub fn is_dimmed(&self, id: NodeId) -> bool {
        self.context.contains(&id) && !self.matches.contains(&id)
    }
}

/// Evaluate `filter` over the forest. Returns `None` when no filter is active.
pub fn compute_filter_sets(
    forest: &Forest,
    filter: &ActiveFilter,
    index: Option<&IssueIndex>,
) -> Option<FilterSets> {
    if !filter.is_active() {
        return None;
    }
    let mut sets = FilterSets::default();
    for (id, node) in forest.iter() {
        if filter.matches(&node.issue, forest, index) {
            sets.matches.insert(id);
        }
    }
    for &id in &sets.matches {
        for ancestor in forest.ancestors(id) {
            if !sets.context.insert(ancestor) {
                break;
            }
        }
    }
    Some(sets)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_predicate_counts() {
        assert_eq!(parse_filter_predicates("").len(), 0);
        assert_eq!(parse_filter_predicates("login page").len(), 1);
        assert_eq!(parse_filter_predicates("!closed").len(), 1);
        assert_eq!(parse_filter_predicates("priority:1 !status:closed").len(), 2);
        assert_eq!(parse_filter_predicates("type:epic status:open priority:1").len(), 3);
        assert_eq!(parse_filter_predicates("login !status:closed").len(), 2);
    }

    #[test]
    fn test_parse_negated_field() {
        let preds = parse_filter_predicates("!status:closed");
        assert_eq!(
            preds,
            vec![FilterPredicate {
                field: "status".into(),
                value: "closed".into(),
                negated: true,
            }]
        );
    }

    #[test]
    fn test_plain_tokens_join_into_one() {
        let preds = parse_filter_predicates("login   page");
        assert_eq!(preds.len(), 1);
        assert!(preds[0].is_plain_text());
        assert_eq!(preds[0].value, "login page");
        assert!(!preds[0].negated);
    }

    #[test]
    fn test_unknown_field_is_plain_text() {
        let preds = parse_filter_predicates("owner:bob");
        assert_eq!(preds.len(), 1);
        assert!(preds[0].is_plain_text());
        assert_eq!(preds[0].value, "owner:bob");
    }

    #[test]
    fn test_lone_bang_is_ignored() {
        assert!(parse_filter_predicates("! !").is_empty());
        assert_eq!(ActiveFilter::advanced("  "), ActiveFilter::None);
    }

    #[test]
    fn test_priority_value_forms() {
        assert_eq!(parse_priority("1"), Some(1));
        assert_eq!(parse_priority("P0"), Some(0));
        assert_eq!(parse_priority("p3"), Some(3));
        assert_eq!(parse_priority("high"), None);
    }

    #[test]
    fn test_simple_filter_parse() {
        assert_eq!(SimpleFilter::parse("OPEN"), SimpleFilter::Open);
        assert_eq!(SimpleFilter::parse("bogus"), SimpleFilter::All);
        assert_eq!(ActiveFilter::simple("all"), ActiveFilter::None);
        assert_eq!(ActiveFilter::simple(""), ActiveFilter::None);
        assert_eq!(ActiveFilter::simple("ready").label(), "ready");
    }
}
