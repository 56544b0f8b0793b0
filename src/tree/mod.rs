//! Hierarchical issue tree engine.
//!
//! [`TreeModel`] owns the forest, the flattened row sequence and the
//! viewport/cursor state. Every public operation is synchronous, panic-free
//! on empty or unbuilt models, and leaves the flat sequence, cursor and
//! viewport consistent with what [`TreeModel::view`] renders.

mod filter;
mod flatten;
mod forest;
pub mod icons;
mod navigation;
mod render;
mod search;
mod state;
mod sticky;
mod viewport;

pub use filter::{parse_filter_predicates, ActiveFilter, FilterPredicate, SimpleFilter};
pub use flatten::{DisplayMode, FlatEntry};
pub use forest::{default_expanded, Forest, NodeId, TreeNode};
pub use render::{format_age, truncate_to_width, RenderedRow, EMPTY_STATE};
pub use state::{read_state, tree_state_path, TreeState, TREE_STATE_FILE, TREE_STATE_VERSION};
pub use sticky::MAX_STICKY_LINES;
pub use viewport::{Viewport, FALLBACK_VISIBLE_ROWS};

use crate::data::{Issue, IssueIndex, SortDirection, SortField};
use filter::FilterSets;
use flatten::FlattenOptions;
use search::{OccurState, SearchState};
use std::collections::{BTreeSet, HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Position in the three-step visibility cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum VisibilityCycle {
    #[default]
    Folded,
    Children,
    Subtree,
}

#[derive(Debug, Default)]
pub struct TreeModel {
    forest: Forest,
    entries: Vec<FlatEntry>,
    positions: HashMap<NodeId, usize>,
    viewport: Viewport,
    width: i32,
    built: bool,

    // Persistence
    beads_dir: Option<PathBuf>,

    // Sorting
    sort_field: SortField,
    sort_direction: SortDirection,
    pagerank: HashMap<String, f64>,
    sort_popup: Option<usize>,

    // Filtering
    filter: ActiveFilter,
    filter_sets: Option<FilterSets>,
    global_index: Option<Arc<IssueIndex>>,

    // Modes
    flat_mode: bool,
    xray_root: Option<String>,
    follow_mode: bool,
    follow_baseline: Option<HashSet<String>>,

    // Selection sets, keyed by issue identifier
    marks: HashSet<String>,
    bookmarks: BTreeSet<String>,

    // Visibility cycling memory
    cycle_states: HashMap<String, VisibilityCycle>,
    /// State the next global cycle applies.
    global_cycle: VisibilityCycle,

    search: SearchState,
    occur: Option<OccurState>,
}

impl TreeModel {
    pub fn new() -> Self {
        Self::default()
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Construction
    // ─────────────────────────────────────────────────────────────────────────

    /// Replace the forest with one built from `issues`.
    ///
    /// Expand state, marks and bookmarks carry over by identifier. The first
    /// build after a beads directory is set loads the state file instead.
    pub fn build(&mut self, issues: &[Issue]) {
        let selected = self.selected_id().map(str::to_string);
        let carried = self
            .built
            .then(|| TreeState::capture(&self.forest, self.bookmarks.iter()));

        self.forest = Forest::build(issues);
        match carried {
            Some(state) => state.apply(&mut self.forest),
            None => self.load_state(),
        }
        self.forest
            .sort(self.sort_field, self.sort_direction, &self.pagerank);

        if let Some(root) = &self.xray_root {
            if self.forest.get(root).is_none() {
                tracing::debug!("XRay root {} is gone, leaving XRay mode", root);
                self.xray_root = None;
            }
        }
        self.cycle_states.retain(|id, _| self.forest.get(id).is_some());
        self.built = true;

        self.recompute_filter();
        self.rebuild_flat_list();
        self.refresh_search_matches();
        if let Some(id) = selected {
            self.select_by_id(&id);
        }
        self.viewport.ensure_cursor_visible(self.entries.len());
    }

    pub fn is_built(&self) -> bool {
        self.built
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Configuration
    // ─────────────────────────────────────────────────────────────────────────

    /// Set the render area. Zero or negative values fall back to defaults.
    pub fn set_size(&mut self, width: i32, height: i32) {
        self.width = width;
        self.viewport.height = height;
        self.viewport.ensure_cursor_visible(self.entries.len());
    }

    pub fn width(&self) -> i32 {
        self.width
    }

    pub fn height(&self) -> i32 {
        self.viewport.height
    }

    /// Enable persistence under `dir`. Loads the state file right away when
    /// the tree is already built.
    pub fn set_beads_dir(&mut self, dir: impl Into<PathBuf>) {
        self.beads_dir = Some(dir.into());
        if self.built {
            self.load_state();
            self.refresh();
        }
    }

    pub fn beads_dir(&self) -> Option<&Path> {
        self.beads_dir.as_deref()
    }

    pub fn state_path(&self) -> PathBuf {
        tree_state_path(self.beads_dir.as_deref())
    }

    /// Global issue lookup used to resolve blockers for the `ready` filter.
    pub fn set_global_issue_index(&mut self, index: Arc<IssueIndex>) {
        self.global_index = Some(index);
        if self.filter.is_active() {
            self.recompute_filter();
            self.refresh();
        }
    }

    pub fn set_pagerank_scores(&mut self, scores: HashMap<String, f64>) {
        self.pagerank = scores;
        if self.sort_field == SortField::PageRank {
            self.resort();
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Sorting
    // ─────────────────────────────────────────────────────────────────────────

    pub fn set_sort(&mut self, field: SortField, direction: SortDirection) {
        self.sort_field = field;
        self.sort_direction = direction;
        self.resort();
    }

    /// Advance to the next sort field with its default direction.
    pub fn cycle_sort_mode(&mut self) {
        let next = self.sort_field.next();
        self.set_sort(next, next.default_direction());
    }

    pub fn sort_field(&self) -> SortField {
        self.sort_field
    }

    pub fn sort_direction(&self) -> SortDirection {
        self.sort_direction
    }

    fn resort(&mut self) {
        self.forest
            .sort(self.sort_field, self.sort_direction, &self.pagerank);
        self.refresh_search_matches();
        self.refresh_keeping_selection();
    }

    pub fn is_sort_popup_open(&self) -> bool {
        self.sort_popup.is_some()
    }

    pub fn open_sort_popup(&mut self) {
        self.sort_popup = Some(self.sort_field.index());
    }

    pub fn close_sort_popup(&mut self) {
        self.sort_popup = None;
    }

    /// Highlighted row of the sort popup; the current field when closed.
    pub fn sort_popup_cursor(&self) -> usize {
        self.sort_popup.unwrap_or_else(|| self.sort_field.index())
    }

    pub fn sort_popup_down(&mut self) {
        if let Some(cursor) = self.sort_popup.as_mut() {
            *cursor = (*cursor + 1).min(SortField::COUNT - 1);
        }
    }

    pub fn sort_popup_up(&mut self) {
        if let Some(cursor) = self.sort_popup.as_mut() {
            *cursor = cursor.saturating_sub(1);
        }
    }

    /// Apply the highlighted field and close the popup. Picking the active
    /// field flips its direction.
    pub fn sort_popup_select(&mut self) {
        let Some(cursor) = self.sort_popup.take() else {
            return;
        };
        let Some(field) = SortField::from_index(cursor) else {
            return;
        };
        if field == self.sort_field {
            self.set_sort(field, self.sort_direction.toggle());
        } else {
            self.set_sort(field, field.default_direction());
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Filtering
    // ─────────────────────────────────────────────────────────────────────────

    /// Apply a simple filter: `all`, `open`, `closed` or `ready`.
    pub fn apply_filter(&mut self, name: &str) {
        self.filter = ActiveFilter::simple(name);
        self.recompute_filter();
        self.refresh_keeping_selection();
    }

    /// Apply an advanced predicate filter such as `type:epic !status:closed`.
    pub fn apply_advanced_filter(&mut self, query: &str) {
        self.filter = ActiveFilter::advanced(query);
        self.recompute_filter();
        self.refresh_keeping_selection();
    }

    /// Label of the active filter, `all` when none.
    pub fn filter(&self) -> &str {
        self.filter.label()
    }

    pub fn active_filter(&self) -> &ActiveFilter {
        &self.filter
    }

    /// True when `id` is shown only as an ancestor of a filter match.
    pub fn is_filter_dimmed(&self, id: &str) -> bool {
        match (&self.filter_sets, self.forest.get(id)) {
            (Some(sets), Some(node)) => sets.is_dimmed(node),
            _ => false,
        }
    }

    fn recompute_filter(&mut self) {
        self.filter_sets =
            filter::compute_filter_sets(&self.forest, &self.filter, self.global_index.as_deref());
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Display modes
    // ─────────────────────────────────────────────────────────────────────────

    pub fn toggle_flat_mode(&mut self) {
        self.flat_mode = !self.flat_mode;
        self.refresh_keeping_selection();
    }

    pub fn is_flat_mode(&self) -> bool {
        self.flat_mode
    }

    /// Isolate the selected node's subtree, or leave XRay if already active.
    /// Leaves are ignored.
    pub fn toggle_xray(&mut self) {
        if self.xray_root.is_some() {
            self.exit_xray();
            return;
        }
        let Some(node) = self.selected_node() else {
            return;
        };
        if !self.forest.node(node).has_children() {
            return;
        }
        self.xray_root = Some(self.forest.node(node).id().to_string());
        self.viewport.cursor = 0;
        self.viewport.offset = 0;
        self.refresh();
    }

    pub fn exit_xray(&mut self) {
        let Some(root) = self.xray_root.take() else {
            return;
        };
        self.rebuild_flat_list();
        self.select_by_id(&root);
        self.viewport.ensure_cursor_visible(self.entries.len());
    }

    pub fn is_xray(&self) -> bool {
        self.xray_root.is_some()
    }

    /// Title of the XRay root, when XRay is active.
    pub fn xray_title(&self) -> Option<&str> {
        let node = self.forest.get(self.xray_root.as_deref()?)?;
        Some(self.forest.node(node).issue.title.as_str())
    }

    pub fn toggle_follow_mode(&mut self) {
        self.follow_mode = !self.follow_mode;
    }

    pub fn follow_mode(&self) -> bool {
        self.follow_mode
    }

    fn display_mode(&self) -> DisplayMode {
        if let Some(root) = self.xray_root.as_deref().and_then(|id| self.forest.get(id)) {
            DisplayMode::XRay(root)
        } else if self.flat_mode {
            DisplayMode::Flat
        } else {
            DisplayMode::Tree
        }
    }

    /// Rows are laid out without hierarchy. XRay keeps its tree layout even
    /// when flat mode is on underneath it.
    fn is_flat_layout(&self) -> bool {
        matches!(self.display_mode(), DisplayMode::Flat)
    }

    /// Every displayable node in the order it would appear with all of its
    /// ancestors expanded.
    fn display_order(&self) -> Vec<NodeId> {
        let mut entries = flatten::flatten_expanded(&self.forest, &self.flatten_options());
        if let Some(occur) = &self.occur {
            occur.retain(&self.forest, &mut entries);
        }
        entries.into_iter().map(|e| e.node).collect()
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Queries
    // ─────────────────────────────────────────────────────────────────────────

    /// Number of rows in the flattened sequence.
    pub fn node_count(&self) -> usize {
        self.entries.len()
    }

    pub fn root_count(&self) -> usize {
        self.forest.roots().len()
    }

    /// Number of issues in the forest, visible or not.
    pub fn total_count(&self) -> usize {
        self.forest.len()
    }

    pub fn forest(&self) -> &Forest {
        &self.forest
    }

    pub fn entries(&self) -> &[FlatEntry] {
        &self.entries
    }

    /// Identifiers of the flattened rows, in display order.
    pub fn visible_ids(&self) -> Vec<&str> {
        self.entries
            .iter()
            .map(|e| self.forest.node(e.node).id())
            .collect()
    }

    pub fn cursor(&self) -> usize {
        self.viewport.cursor
    }

    pub fn viewport_offset(&self) -> usize {
        self.viewport.offset
    }

    pub fn visible_range(&self) -> (usize, usize) {
        self.viewport.visible_range(self.entries.len())
    }

    pub fn effective_visible_count(&self) -> usize {
        self.viewport.effective_visible_count(self.entries.len())
    }

    pub fn selected_issue(&self) -> Option<&Issue> {
        self.selected_node().map(|n| &self.forest.node(n).issue)
    }

    pub fn selected_id(&self) -> Option<&str> {
        self.selected_node().map(|n| self.forest.node(n).id())
    }

    /// Depth of the selected row in the displayed hierarchy.
    pub fn selected_depth(&self) -> Option<usize> {
        self.entries.get(self.viewport.cursor).map(|e| e.depth)
    }

    pub fn is_expanded(&self, id: &str) -> bool {
        self.forest
            .get(id)
            .is_some_and(|n| self.forest.node(n).expanded)
    }

    pub fn is_marked(&self, id: &str) -> bool {
        self.marks.contains(id)
    }

    pub fn is_bookmarked(&self, id: &str) -> bool {
        self.bookmarks.contains(id)
    }

    /// Marked identifiers, sorted.
    pub fn marked_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.marks.iter().cloned().collect();
        ids.sort();
        ids
    }

    /// Bookmarked identifiers, sorted.
    pub fn bookmarked_ids(&self) -> Vec<String> {
        self.bookmarks.iter().cloned().collect()
    }

    fn selected_node(&self) -> Option<NodeId> {
        self.entries.get(self.viewport.cursor).map(|e| e.node)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Pipeline
    // ─────────────────────────────────────────────────────────────────────────

    fn flatten_options(&self) -> FlattenOptions<'_> {
        FlattenOptions {
            mode: self.display_mode(),
            filter: self.filter_sets.as_ref(),
            sort_field: self.sort_field,
            sort_direction: self.sort_direction,
            pagerank: &self.pagerank,
        }
    }

    /// Re-run the flattening pipeline and clamp the cursor.
    fn rebuild_flat_list(&mut self) {
        self.entries = flatten::flatten(&self.forest, &self.flatten_options());
        if let Some(occur) = &self.occur {
            occur.retain(&self.forest, &mut self.entries);
        }
        self.positions = flatten::index_positions(&self.entries);
        self.viewport.clamp_cursor(self.entries.len());
    }

    fn refresh(&mut self) {
        self.rebuild_flat_list();
        self.viewport.ensure_cursor_visible(self.entries.len());
    }

    /// Re-flatten, keeping the cursor on the selected node or, when that row
    /// disappeared, on its nearest displayed ancestor.
    fn refresh_keeping_selection(&mut self) {
        let selected = self.selected_node();
        self.rebuild_flat_list();
        if let Some(node) = selected {
            let row = std::iter::once(node)
                .chain(self.forest.ancestors(node))
                .find_map(|n| self.positions.get(&n).copied());
            if let Some(row) = row {
                self.viewport.cursor = row;
            }
        }
        self.viewport.ensure_cursor_visible(self.entries.len());
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Persistence
    // ─────────────────────────────────────────────────────────────────────────

    fn load_state(&mut self) {
        let Some(dir) = self.beads_dir.as_deref() else {
            return;
        };
        let loaded = state::load_or_default(&tree_state_path(Some(dir)));
        loaded.apply(&mut self.forest);
        self.bookmarks = loaded
            .bookmarks
            .into_iter()
            .filter(|id| self.forest.get(id).is_some())
            .collect();
    }

    /// Persist expand state and bookmarks. Skipped without a beads directory.
    fn save_state(&self) {
        let Some(dir) = self.beads_dir.as_deref() else {
            return;
        };
        let path = tree_state_path(Some(dir));
        let state = TreeState::capture(&self.forest, self.bookmarks.iter());
        if let Err(e) = state::write_state(&path, &state) {
            tracing::warn!("Failed to save tree state: {:#}", e);
        }
    }
}
