//! Rendering tests for `TreeModel::view` and its pieces.
//!
//! Widths stay at or below 60 columns so rows carry no age column.

mod test_utils;

use canopy::data::IssueType;
use canopy::tree::{TreeModel, EMPTY_STATE};
use pretty_assertions::assert_eq;
use test_utils::*;

fn row_texts(model: &TreeModel) -> Vec<String> {
    model.visible_rows().into_iter().map(|r| r.text).collect()
}

// ============================================================================
// Empty and degenerate states
// ============================================================================

#[test]
fn test_empty_forest_renders_help() {
    let mut model = TreeModel::new();
    assert_eq!(model.view(), EMPTY_STATE);
    model.build(&[]);
    assert_eq!(model.view(), EMPTY_STATE);
    assert!(model.view().contains("bd dep add <child-id> <parent-id> --type parent-child"));
}

#[test]
fn test_filter_without_matches() {
    let mut model = make_model(&make_three_levels());
    model.apply_advanced_filter("status:in_progress");
    let view = model.view();
    assert_eq!(view.lines().count(), 2);
    assert!(view.contains("No issues match the current filter."));
}

#[test]
fn test_zero_and_negative_sizes_render() {
    let roots: Vec<_> = (0..3).map(|i| make_issue(&format!("r{}", i), "Root")).collect();
    let mut model = make_model(&roots);

    model.set_size(0, 0);
    assert_eq!(model.view().lines().count(), 4);

    model.set_size(-5, -5);
    assert_eq!(model.view().lines().count(), 4);
    assert_eq!(model.visible_rows().len(), 3);
}

#[test]
fn test_tiny_width_keeps_minimum_title() {
    let mut model = make_model(&[make_issue("bd-1", "A rather long title")]);
    model.set_size(10, 10);
    let rows = row_texts(&model);
    assert!(rows[0].ends_with("A ra…"), "got {:?}", rows[0]);
}

// ============================================================================
// Header
// ============================================================================

#[test]
fn test_header_badges() {
    let mut issues = make_three_levels();
    issues.push(make_issue("other", "Other"));
    let mut model = make_model(&issues);
    assert!(model.render_header().starts_with("[TREE]  TYPE PRI STATUS"));

    model.toggle_follow_mode();
    model.select_by_id("task");
    model.toggle_xray();
    model.enter_occur_mode("sub");
    let header = model.render_header();
    assert!(header.starts_with("[TREE] [XRAY: Task] [FOLLOW] [OCCUR: sub]"), "got {:?}", header);

    model.exit_occur_mode();
    model.exit_xray();
    model.toggle_follow_mode();
    model.toggle_flat_mode();
    assert!(model.render_header().starts_with("[FLAT]  TYPE"));
}

#[test]
fn test_header_is_first_view_line() {
    let mut model = make_model(&make_three_levels());
    model.set_size(60, 20);
    let view = model.view();
    let first = view.lines().next().unwrap();
    assert!(first.starts_with("[TREE]"));
}

// ============================================================================
// Rows and connectors
// ============================================================================

#[test]
fn test_three_level_rows() {
    let mut model = make_model(&make_three_levels());
    model.set_size(60, 20);
    model.expand_all();
    assert_eq!(
        row_texts(&model),
        strings(&[
            "> ▾ ◆ P2 OPEN epic Epic",
            "  └── ▾ ▪ P2 OPEN task Task",
            "      └── • ▪ P2 OPEN subtask Subtask",
        ])
    );
}

#[test]
fn test_connectors_pipe_through_open_siblings() {
    let mut model = make_model(&[
        make_issue("root", "Root"),
        make_child("a", "A", "root"),
        make_child("a1", "A1", "a"),
        make_child("b", "B", "root"),
    ]);
    model.set_size(60, 20);
    model.expand_all();
    let rows = row_texts(&model);
    assert!(rows[1].starts_with("  ├── ▾"), "got {:?}", rows[1]);
    assert!(rows[2].starts_with("  │   └── •"), "got {:?}", rows[2]);
    assert!(rows[3].starts_with("  └── •"), "got {:?}", rows[3]);
}

#[test]
fn test_collapsed_indicator_and_type_icons() {
    let mut model = make_model(&[
        with_type(make_issue("bug", "Bug"), IssueType::Bug),
        make_child("fix", "Fix", "bug"),
    ]);
    model.set_size(60, 20);
    model.collapse_all();
    assert_eq!(row_texts(&model), strings(&["> ▸ ✖ P2 OPEN bug Bug"]));
}

#[test]
fn test_marks_and_bookmarks_in_rows() {
    let mut model = make_model(&[make_issue("a", "A"), make_issue("b", "B")]);
    model.set_size(60, 20);
    model.toggle_mark();
    model.move_down();
    model.toggle_bookmark();

    let rows = model.visible_rows();
    assert!(rows[0].marked);
    assert!(rows[0].text.starts_with(" ●"));
    assert!(rows[1].selected);
    assert!(rows[1].text.starts_with("> • ★ ▪"), "got {:?}", rows[1].text);
}

#[test]
fn test_dimmed_and_search_flags() {
    let mut model = make_model(&[
        make_issue("parent", "Parent"),
        with_status(make_child("done", "Finished", "parent"), canopy::data::Status::Closed),
    ]);
    model.apply_filter("closed");
    model.enter_search_mode();
    for c in "fini".chars() {
        model.search_add_char(c);
    }

    let rows = model.visible_rows();
    assert_eq!(rows.len(), 2);
    assert!(rows[0].dimmed);
    assert!(!rows[0].search_match);
    assert!(!rows[1].dimmed);
    assert!(rows[1].search_match);
    assert!(rows[1].selected);
}

#[test]
fn test_flat_mode_has_no_connectors() {
    let mut model = make_model(&make_three_levels());
    model.set_size(60, 20);
    model.toggle_flat_mode();
    let rows = row_texts(&model);
    assert_eq!(rows.len(), 3);
    assert!(rows.iter().all(|r| !r.contains("──")));
}

#[test]
fn test_xray_over_flat_mode_keeps_tree_layout() {
    let mut model = make_model(&make_three_levels());
    model.set_size(60, 20);
    model.toggle_flat_mode();
    model.select_by_id("task");
    model.toggle_xray();
    assert!(model.is_flat_mode());

    let header = model.render_header();
    assert!(header.starts_with("[TREE] [XRAY: Task]"), "got {:?}", header);
    assert_eq!(
        row_texts(&model),
        strings(&["> ▾ ▪ P2 OPEN task Task", "  └── • ▪ P2 OPEN subtask Subtask"])
    );

    model.exit_xray();
    assert!(model.render_header().starts_with("[FLAT]"));
}

// ============================================================================
// Position indicator, sticky lines and the search bar
// ============================================================================

#[test]
fn test_position_indicator_only_on_overflow() {
    let roots: Vec<_> = (0..30).map(|i| make_issue(&format!("bd-{:02}", i), "Item")).collect();
    let mut model = make_model(&roots);
    model.set_size(60, 10);
    assert_eq!(model.position_indicator().as_deref(), Some(" Page 1/4 (1-8 of 30)"));

    model.jump_to_bottom();
    assert_eq!(model.position_indicator().as_deref(), Some(" Page 3/4 (23-30 of 30)"));

    let mut small = make_model(&roots[..3]);
    small.set_size(60, 10);
    assert_eq!(small.position_indicator(), None);
}

#[test]
fn test_sticky_line_for_scrolled_parent() {
    let mut issues = vec![make_issue("root", "Root")];
    issues.extend((0..30).map(|i| make_child(&format!("c-{:02}", i), "Child", "root")));
    let mut model = make_model(&issues);
    model.set_size(60, 10);

    assert!(model.sticky_scroll_lines().is_empty());

    model.jump_to_bottom();
    assert_eq!(model.sticky_scroll_lines(), strings(&["  ↑ root Root"]));
    let view = model.view();
    let lines: Vec<&str> = view.lines().collect();
    assert_eq!(lines[1], "  ↑ root Root");
    assert_eq!(lines.len(), 1 + 1 + 8 + 1);
}

#[test]
fn test_search_bar_states() {
    let mut model = make_model(&make_three_levels());
    assert!(model.search_bar().is_none());

    model.enter_search_mode();
    assert_eq!(model.search_bar().as_deref(), Some("/"));

    for c in "sub".chars() {
        model.search_add_char(c);
    }
    assert_eq!(model.search_bar().as_deref(), Some("/sub [1/1]"));
    assert!(model.view().ends_with("/sub [1/1]"));
    // The hidden match was revealed and selected
    assert_eq!(model.selected_id(), Some("subtask"));

    model.search_add_char('z');
    assert_eq!(model.search_bar().as_deref(), Some("/subz [no matches]"));

    model.exit_search_mode();
    assert!(model.search_bar().is_none());
}

#[test]
fn test_sort_popup_lists_every_field() {
    let mut model = make_model(&make_three_levels());
    model.open_sort_popup();
    let popup = model.render_sort_popup();
    let lines: Vec<&str> = popup.lines().collect();
    assert_eq!(lines.len(), 9);
    assert_eq!(lines[0], "Sort by:");
    assert_eq!(lines[2], "▸ ▼ Created");
    assert_eq!(lines[8], "    PageRank");
}
