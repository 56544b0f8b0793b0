//! Flattening pipeline: forest to the ordered sequence of visible rows.
//!
//! The flat sequence is the only structure the viewport, the renderer and
//! cursor arithmetic look at. It is rebuilt after every structural, filter,
//! sort or mode change.

use super::filter::FilterSets;
use super::forest::{Forest, NodeId};
use crate::data::{compare_issues, SortDirection, SortField};
use std::collections::HashMap;

/// One visible row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FlatEntry {
    pub node: NodeId,
    /// Depth in the displayed hierarchy (0 in flat mode and for the XRay root).
    pub depth: usize,
    /// Parent in the displayed hierarchy.
    pub parent: Option<NodeId>,
    /// Last displayed child of its parent (or last displayed root).
    pub is_last: bool,
    /// Shown only as context for a filter match.
    pub dimmed: bool,
}

/// How the forest is projected onto rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DisplayMode {
    #[default]
    Tree,
    Flat,
    XRay(NodeId),
}

pub struct FlattenOptions<'a> {
    pub mode: DisplayMode,
    pub filter: Option<&'a FilterSets>,
    pub sort_field: SortField,
    pub sort_direction: SortDirection,
    pub pagerank: &'a HashMap<String, f64>,
}

pub fn flatten(forest: &Forest, opts: &FlattenOptions<'_>) -> Vec<FlatEntry> {
    project(forest, opts, false)
}

/// Like [`flatten`], but every node counts as expanded. This is the order
/// rows would take once their ancestors are revealed.
pub fn flatten_expanded(forest: &Forest, opts: &FlattenOptions<'_>) -> Vec<FlatEntry> {
    project(forest, opts, true)
}

fn project(forest: &Forest, opts: &FlattenOptions<'_>, expand_all: bool) -> Vec<FlatEntry> {
    let mut out = Vec::new();
    let included = |id: NodeId| opts.filter.map_or(true, |f| f.is_visible(id));
    let dimmed = |id: NodeId| opts.filter.is_some_and(|f| f.is_dimmed(id));

    match opts.mode {
        DisplayMode::Tree => {
            let roots: Vec<NodeId> = forest.roots().iter().copied().filter(|&r| included(r)).collect();
            walk(forest, opts.filter, &roots, expand_all, &mut out);
        }
        DisplayMode::XRay(root) => {
            if included(root) {
                walk(forest, opts.filter, &[root], true, &mut out);
            }
        }
        DisplayMode::Flat => {
            let mut ids: Vec<NodeId> = forest.preorder().into_iter().filter(|&n| included(n)).collect();
            ids.sort_by(|a, b| {
                compare_issues(
                    &forest.node(*a).issue,
                    &forest.node(*b).issue,
                    opts.sort_field,
                    opts.sort_direction,
                    opts.pagerank,
                )
            });
            out.extend(ids.into_iter().map(|node| FlatEntry {
                node,
                depth: 0,
                parent: None,
                is_last: false,
                dimmed: dimmed(node),
            }));
        }
    }
    out
}

/// Pre-order walk over `tops` with an explicit stack, so depth is bounded
/// only by memory.
fn walk(
    forest: &Forest,
    filter: Option<&FilterSets>,
    tops: &[NodeId],
    force_expand: bool,
    out: &mut Vec<FlatEntry>,
) {
    let mut stack: Vec<FlatEntry> = Vec::new();
    push_level(&mut stack, filter, tops, 0, None);

    while let Some(entry) = stack.pop() {
        out.push(entry);

        let node = forest.node(entry.node);
        // Context ancestors open up so their matching descendants stay reachable
        let is_context = filter.is_some_and(|f| f.context.contains(&entry.node));
        if !(force_expand || node.expanded || is_context) {
            continue;
        }

        let children: Vec<NodeId> = node
            .children
            .iter()
            .copied()
            .filter(|&c| filter.map_or(true, |f| f.is_visible(c)))
            .collect();
        push_level(&mut stack, filter, &children, entry.depth + 1, Some(entry.node));
    }
}

/// Push one sibling group in reverse so the first sibling pops first.
fn push_level(
    stack: &mut Vec<FlatEntry>,
    filter: Option<&FilterSets>,
    siblings: &[NodeId],
    depth: usize,
    parent: Option<NodeId>,
) {
    let last = siblings.len().saturating_sub(1);
    for (i, &node) in siblings.iter().enumerate().rev() {
        stack.push(FlatEntry {
            node,
            depth,
            parent,
            is_last: i == last,
            dimmed: filter.is_some_and(|f| f.is_dimmed(node)),
        });
    }
}

/// Row index of every node in `entries`.
pub fn index_positions(entries: &[FlatEntry]) -> HashMap<NodeId, usize> {
    entries.iter().enumerate().map(|(i, e)| (e.node, i)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{Dependency, DependencyType, Issue, IssueType, Status};
    use chrono::{TimeZone, Utc};
    use std::collections::HashSet;

    fn make_issue(id: &str, parent: Option<&str>) -> Issue {
        Issue {
            id: id.to_string(),
            title: id.to_uppercase(),
            description: None,
            status: Status::Open,
            priority: 2,
            issue_type: IssueType::Task,
            created_at: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
            updated_at: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
            closed_at: None,
            labels: Vec::new(),
            dependencies: parent
                .map(|p| {
                    vec![Dependency {
                        issue_id: id.to_string(),
                        depends_on_id: p.to_string(),
                        dep_type: DependencyType::ParentChild,
                    }]
                })
                .unwrap_or_default(),
        }
    }

    fn sample() -> Forest {
        Forest::build(&[
            make_issue("epic", None),
            make_issue("task", Some("epic")),
            make_issue("sub", Some("task")),
            make_issue("solo", None),
        ])
    }

    fn ids(forest: &Forest, entries: &[FlatEntry]) -> Vec<String> {
        entries.iter().map(|e| forest.node(e.node).id().to_string()).collect()
    }

    fn run(forest: &Forest, mode: DisplayMode, filter: Option<&FilterSets>) -> Vec<FlatEntry> {
        let ranks = HashMap::new();
        flatten(
            forest,
            &FlattenOptions {
                mode,
                filter,
                sort_field: SortField::Title,
                sort_direction: SortDirection::Ascending,
                pagerank: &ranks,
            },
        )
    }

    #[test]
    fn test_tree_respects_expand_state() {
        let forest = sample();
        let entries = run(&forest, DisplayMode::Tree, None);
        assert_eq!(ids(&forest, &entries), vec!["epic", "task", "solo"]);
        assert_eq!(entries[1].depth, 1);
        assert_eq!(entries[1].parent, forest.get("epic"));
        assert!(entries[1].is_last);
        assert!(!entries[0].is_last);
        assert!(entries[2].is_last);
    }

    #[test]
    fn test_flat_mode_lists_everything_at_depth_zero() {
        let forest = sample();
        let entries = run(&forest, DisplayMode::Flat, None);
        assert_eq!(ids(&forest, &entries), vec!["epic", "solo", "sub", "task"]);
        assert!(entries.iter().all(|e| e.depth == 0 && e.parent.is_none()));
    }

    #[test]
    fn test_xray_shows_full_subtree() {
        let forest = sample();
        let epic = forest.get("epic").unwrap();
        let entries = run(&forest, DisplayMode::XRay(epic), None);
        assert_eq!(ids(&forest, &entries), vec!["epic", "task", "sub"]);
        assert_eq!(entries[0].depth, 0);
        assert_eq!(entries[2].depth, 2);
    }

    #[test]
    fn test_context_ancestors_open_without_expansion() {
        let forest = sample();
        let sub = forest.get("sub").unwrap();
        let sets = FilterSets {
            matches: HashSet::from([sub]),
            context: forest.ancestors(sub).into_iter().collect(),
        };
        let entries = run(&forest, DisplayMode::Tree, Some(&sets));
        assert_eq!(ids(&forest, &entries), vec!["epic", "task", "sub"]);
        assert!(entries[0].dimmed && entries[1].dimmed);
        assert!(!entries[2].dimmed);
    }

    #[test]
    fn test_expanded_order_ignores_fold_state() {
        let forest = sample();
        let ranks = HashMap::new();
        let entries = flatten_expanded(
            &forest,
            &FlattenOptions {
                mode: DisplayMode::Tree,
                filter: None,
                sort_field: SortField::Title,
                sort_direction: SortDirection::Ascending,
                pagerank: &ranks,
            },
        );
        assert_eq!(ids(&forest, &entries), vec!["epic", "task", "sub", "solo"]);
        assert_eq!(entries[2].depth, 2);
        assert!(entries[2].is_last);
    }

    #[test]
    fn test_deep_chain_flattens_iteratively() {
        let depth = 50_000;
        let mut issues = vec![make_issue("n0", None)];
        for i in 1..depth {
            issues.push(make_issue(&format!("n{}", i), Some(format!("n{}", i - 1).as_str())));
        }
        let forest = Forest::build(&issues);
        let entries = run(&forest, DisplayMode::XRay(forest.roots()[0]), None);
        assert_eq!(entries.len(), depth);
        assert_eq!(entries[depth - 1].depth, depth - 1);
        assert_eq!(entries[depth - 1].parent, Some(entries[depth - 2].node));
    }
}
