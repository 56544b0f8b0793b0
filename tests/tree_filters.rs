//! Tests for simple and advanced tree filters.
//!
//! Matches must always be shown with their ancestors, which are dimmed
//! unless they match themselves.

mod test_utils;

use canopy::data::{index_issues, DependencyType, IssueType, Status};
use canopy::tree::parse_filter_predicates;
use pretty_assertions::assert_eq;
use std::sync::Arc;
use test_utils::*;

fn make_issues() -> Vec<canopy::data::Issue> {
    vec![
        with_type(make_issue("epic", "Auth epic"), IssueType::Epic),
        make_child("task", "Login form", "epic"),
        with_status(make_child("subtask", "Login api", "task"), Status::Closed),
        with_priority(make_issue("other-1", "Docs"), 1),
        with_status(make_issue("other-2", "Old cleanup"), Status::Tombstone),
    ]
}

// ============================================================================
// Simple filters
// ============================================================================

#[test]
fn test_closed_filter_shows_dimmed_ancestors() {
    let mut model = make_model(&make_issues());
    let before = model.node_count();
    assert_eq!(before, 4);

    model.apply_filter("closed");
    assert_eq!(ids(&model), strings(&["epic", "task", "subtask", "other-2"]));
    assert!(model.is_filter_dimmed("epic"));
    assert!(model.is_filter_dimmed("task"));
    assert!(!model.is_filter_dimmed("subtask"));
    assert!(!model.is_filter_dimmed("other-2"));
    assert_eq!(model.filter(), "closed");

    model.apply_filter("all");
    assert_eq!(model.node_count(), before);
    assert!(!model.is_filter_dimmed("epic"));
    assert_eq!(model.filter(), "all");
}

#[test]
fn test_open_filter_hides_closed_like() {
    let mut model = make_model(&make_issues());
    model.apply_filter("OPEN");
    assert_eq!(ids(&model), strings(&["epic", "task", "other-1"]));
    assert!(!model.is_filter_dimmed("task"));
}

#[test]
fn test_unknown_filter_shows_everything() {
    let mut model = make_model(&make_issues());
    model.apply_filter("nonsense");
    assert_eq!(model.node_count(), 4);
    assert_eq!(model.filter(), "all");
}

#[test]
fn test_ready_filter_resolves_blockers_through_global_index() {
    let external_open = make_issue("external", "Elsewhere");
    let work = with_edge(make_issue("work", "Blocked work"), "external", DependencyType::Blocks);
    let free = make_issue("free", "Free work");

    let mut model = make_model(&[work.clone(), free.clone()]);

    // Without an index the blocker cannot be found, so it does not block
    model.apply_filter("ready");
    assert_eq!(ids(&model), strings(&["free", "work"]));

    let all = vec![work.clone(), free.clone(), external_open];
    model.set_global_issue_index(Arc::new(index_issues(&all)));
    assert_eq!(ids(&model), strings(&["free"]));

    let external_closed = with_status(make_issue("external", "Elsewhere"), Status::Closed);
    let all = vec![work, free, external_closed];
    model.set_global_issue_index(Arc::new(index_issues(&all)));
    assert_eq!(ids(&model), strings(&["free", "work"]));
}

#[test]
fn test_ready_excludes_blocked_status() {
    let mut model = make_model(&[
        with_status(make_issue("stuck", "Stuck"), Status::Blocked),
        make_issue("go", "Go"),
    ]);
    model.apply_filter("ready");
    assert_eq!(ids(&model), strings(&["go"]));
}

// ============================================================================
// Advanced filters
// ============================================================================

#[test]
fn test_predicate_counts() {
    assert_eq!(parse_filter_predicates("").len(), 0);
    assert_eq!(parse_filter_predicates("login page").len(), 1);
    assert_eq!(parse_filter_predicates("priority:1 !status:closed").len(), 2);
    assert_eq!(parse_filter_predicates("type:epic status:open priority:1").len(), 3);
    assert_eq!(parse_filter_predicates("login !status:closed").len(), 2);
}

#[test]
fn test_advanced_field_predicates() {
    let mut model = make_model(&make_issues());

    model.apply_advanced_filter("type:epic");
    assert_eq!(ids(&model), strings(&["epic"]));

    model.apply_advanced_filter("priority:p1");
    assert_eq!(ids(&model), strings(&["other-1"]));

    model.apply_advanced_filter("status:in-progress");
    assert_eq!(model.node_count(), 0);
    assert_eq!(model.filter(), "status:in-progress");
}

#[test]
fn test_plain_text_and_negation_combine() {
    let mut model = make_model(&make_issues());
    model.apply_advanced_filter("login !status:closed");
    assert_eq!(ids(&model), strings(&["epic", "task"]));
    assert!(model.is_filter_dimmed("epic"));
    assert!(!model.is_filter_dimmed("task"));
}

#[test]
fn test_empty_advanced_filter_clears() {
    let mut model = make_model(&make_issues());
    model.apply_advanced_filter("type:epic");
    model.apply_advanced_filter("   ");
    assert_eq!(model.node_count(), 4);
    assert_eq!(model.filter(), "all");
}

#[test]
fn test_filter_survives_rebuild() {
    let mut model = make_model(&make_issues());
    model.apply_filter("closed");
    model.build(&make_issues());
    assert_eq!(model.filter(), "closed");
    assert_eq!(model.node_count(), 4);
}
