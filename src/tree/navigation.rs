//! Cursor movement and expand/mark/bookmark operations on [`TreeModel`].
//!
//! Every operation is a no-op on an empty or unbuilt model.

use super::forest::NodeId;
use super::{TreeModel, VisibilityCycle};
use std::collections::HashSet;

impl TreeModel {
    // ─────────────────────────────────────────────────────────────────────────
    // Linear movement
    // ─────────────────────────────────────────────────────────────────────────

    pub fn move_down(&mut self) {
        self.viewport.move_by(1, self.entries.len());
    }

    pub fn move_up(&mut self) {
        self.viewport.move_by(-1, self.entries.len());
    }

    pub fn jump_to_top(&mut self) {
        self.set_cursor(0);
    }

    pub fn jump_to_bottom(&mut self) {
        self.set_cursor(self.entries.len().saturating_sub(1));
    }

    fn half_page(&self) -> isize {
        (self.effective_visible_count() / 2).max(1) as isize
    }

    fn full_page(&self) -> isize {
        self.effective_visible_count() as isize
    }

    /// Half a page down.
    pub fn page_down(&mut self) {
        self.viewport.move_by(self.half_page(), self.entries.len());
    }

    /// Half a page up.
    pub fn page_up(&mut self) {
        self.viewport.move_by(-self.half_page(), self.entries.len());
    }

    pub fn page_forward_full(&mut self) {
        self.viewport.move_by(self.full_page(), self.entries.len());
    }

    pub fn page_backward_full(&mut self) {
        self.viewport.move_by(-self.full_page(), self.entries.len());
    }

    fn set_cursor(&mut self, row: usize) {
        if self.entries.is_empty() {
            return;
        }
        self.viewport.cursor = row.min(self.entries.len() - 1);
        self.viewport.ensure_cursor_visible(self.entries.len());
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Hierarchy movement
    // ─────────────────────────────────────────────────────────────────────────

    /// Move to the displayed parent. No-op at depth 0.
    pub fn jump_to_parent(&mut self) {
        let parent_row = self
            .entries
            .get(self.viewport.cursor)
            .and_then(|e| e.parent)
            .and_then(|p| self.positions.get(&p).copied());
        if let Some(row) = parent_row {
            self.set_cursor(row);
        }
    }

    /// Row indices of the displayed siblings of the cursor row, itself included.
    /// Root-level rows are siblings of each other.
    fn displayed_siblings(&self) -> Vec<usize> {
        let Some(current) = self.entries.get(self.viewport.cursor) else {
            return Vec::new();
        };
        let parent = current.parent;
        match parent.and_then(|p| self.positions.get(&p).copied()) {
            Some(parent_row) => {
                let parent_depth = self.entries[parent_row].depth;
                self.entries[parent_row + 1..]
                    .iter()
                    .enumerate()
                    .take_while(|(_, e)| e.depth > parent_depth)
                    .filter(|(_, e)| e.parent == parent)
                    .map(|(i, _)| parent_row + 1 + i)
                    .collect()
            }
            // Root level, or a parent hidden by occur mode
            None => self
                .entries
                .iter()
                .enumerate()
                .filter(|(_, e)| e.parent == parent)
                .map(|(i, _)| i)
                .collect(),
        }
    }

    pub fn next_sibling(&mut self) {
        let siblings = self.displayed_siblings();
        if let Some(&row) = siblings.iter().find(|&&r| r > self.viewport.cursor) {
            self.set_cursor(row);
        }
    }

    pub fn prev_sibling(&mut self) {
        let siblings = self.displayed_siblings();
        if let Some(&row) = siblings.iter().rev().find(|&&r| r < self.viewport.cursor) {
            self.set_cursor(row);
        }
    }

    pub fn first_sibling(&mut self) {
        if let Some(&row) = self.displayed_siblings().first() {
            self.set_cursor(row);
        }
    }

    pub fn last_sibling(&mut self) {
        if let Some(&row) = self.displayed_siblings().last() {
            self.set_cursor(row);
        }
    }

    /// `→`: expand a collapsed node, or step into an expanded one.
    pub fn expand_or_move_to_child(&mut self) {
        let Some(node) = self.selected_node() else {
            return;
        };
        if !self.forest.node(node).has_children() {
            return;
        }
        if self.row_is_open(node) {
            let child_row = self.viewport.cursor + 1;
            if self.entries.get(child_row).is_some_and(|e| e.parent == Some(node)) {
                self.set_cursor(child_row);
            }
        } else {
            self.set_expanded(node, true);
        }
    }

    /// `←`: collapse an expanded node, otherwise jump to the parent.
    pub fn collapse_or_jump_to_parent(&mut self) {
        let Some(node) = self.selected_node() else {
            return;
        };
        let tree = self.forest.node(node);
        if tree.has_children() && tree.expanded {
            self.set_expanded(node, false);
        } else {
            self.jump_to_parent();
        }
    }

    /// Whether the row's children are displayed beneath it.
    fn row_is_open(&self, node: NodeId) -> bool {
        let row = self.viewport.cursor;
        self.entries.get(row + 1).is_some_and(|e| e.parent == Some(node))
            || self.forest.node(node).expanded
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Expand state
    // ─────────────────────────────────────────────────────────────────────────

    fn set_expanded(&mut self, node: NodeId, expanded: bool) {
        self.forest.node_mut(node).expanded = expanded;
        self.cycle_states.remove(self.forest.node(node).id());
        self.refresh_keeping_selection();
        self.save_state();
    }

    /// Flip the selected node's expand state. Leaves are ignored.
    pub fn toggle_expand(&mut self) {
        let Some(node) = self.selected_node() else {
            return;
        };
        let tree = self.forest.node(node);
        if tree.has_children() {
            let expanded = !tree.expanded;
            self.set_expanded(node, expanded);
        }
    }

    pub fn expand_all(&mut self) {
        self.set_all(true);
    }

    pub fn collapse_all(&mut self) {
        self.set_all(false);
    }

    /// Expand everything when anything is collapsed, otherwise collapse all.
    pub fn toggle_expand_collapse_all(&mut self) {
        let expand = self.forest.any_collapsed();
        self.set_all(expand);
    }

    fn set_all(&mut self, expanded: bool) {
        if !self.built {
            return;
        }
        self.forest.set_all_expanded(expanded);
        self.cycle_states.clear();
        self.refresh_keeping_selection();
        self.save_state();
    }

    /// Expand nodes above `level`: level 1 shows roots only, level 2 their
    /// children, and so on.
    pub fn expand_to_level(&mut self, level: usize) {
        if !self.built {
            return;
        }
        let ids: Vec<NodeId> = self.forest.iter().map(|(id, _)| id).collect();
        for id in ids {
            let node = self.forest.node_mut(id);
            if node.has_children() {
                node.expanded = node.depth + 1 < level;
            }
        }
        self.cycle_states.clear();
        self.refresh_keeping_selection();
        self.save_state();
    }

    /// Enter on a node: folded, then direct children, then the full subtree.
    pub fn cycle_node_visibility(&mut self) {
        let Some(node) = self.selected_node() else {
            return;
        };
        if !self.forest.node(node).has_children() {
            return;
        }
        let id = self.forest.node(node).id().to_string();
        let current = match self.cycle_states.get(&id) {
            // Memory is only trusted while it agrees with the node
            Some(&state) if (state == VisibilityCycle::Folded) != self.forest.node(node).expanded => state,
            _ => self.detect_cycle_state(node),
        };

        let next = match current {
            VisibilityCycle::Folded => {
                self.forest.set_expanded_recursive(node, false);
                self.forest.node_mut(node).expanded = true;
                VisibilityCycle::Children
            }
            VisibilityCycle::Children => {
                self.forest.set_expanded_recursive(node, true);
                VisibilityCycle::Subtree
            }
            VisibilityCycle::Subtree => {
                self.forest.set_expanded_recursive(node, false);
                VisibilityCycle::Folded
            }
        };
        self.cycle_states.insert(id, next);
        self.refresh_keeping_selection();
        self.save_state();
    }

    fn detect_cycle_state(&self, node: NodeId) -> VisibilityCycle {
        if !self.forest.node(node).expanded {
            VisibilityCycle::Folded
        } else if self.forest.all_descendants_expanded(node) {
            VisibilityCycle::Subtree
        } else {
            VisibilityCycle::Children
        }
    }

    /// Whole-tree cycle: fold everything, then roots open, then all open.
    pub fn cycle_global_visibility(&mut self) {
        if !self.built {
            return;
        }
        self.global_cycle = match self.global_cycle {
            VisibilityCycle::Folded => {
                self.forest.set_all_expanded(false);
                VisibilityCycle::Children
            }
            VisibilityCycle::Children => {
                self.forest.set_all_expanded(false);
                let roots = self.forest.roots().to_vec();
                for root in roots {
                    let node = self.forest.node_mut(root);
                    if node.has_children() {
                        node.expanded = true;
                    }
                }
                VisibilityCycle::Subtree
            }
            VisibilityCycle::Subtree => {
                self.forest.set_all_expanded(true);
                VisibilityCycle::Folded
            }
        };
        self.cycle_states.clear();
        self.refresh_keeping_selection();
        self.save_state();
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Marks and bookmarks
    // ─────────────────────────────────────────────────────────────────────────

    pub fn toggle_mark(&mut self) {
        let Some(id) = self.selected_id().map(str::to_string) else {
            return;
        };
        if !self.marks.remove(&id) {
            self.marks.insert(id);
        }
    }

    pub fn unmark_all(&mut self) {
        self.marks.clear();
    }

    pub fn toggle_bookmark(&mut self) {
        let Some(id) = self.selected_id().map(str::to_string) else {
            return;
        };
        if !self.bookmarks.remove(&id) {
            self.bookmarks.insert(id);
        }
        self.save_state();
    }

    /// Jump to the next bookmarked row after the cursor, wrapping around.
    ///
    /// When no bookmark is displayed, the first one hidden under a collapsed
    /// ancestor is revealed instead.
    pub fn cycle_bookmark(&mut self) {
        if self.bookmarks.is_empty() || self.entries.is_empty() {
            return;
        }
        let cursor = self.viewport.cursor;
        let is_bookmarked = |row: &usize| {
            let node = self.entries[*row].node;
            self.bookmarks.contains(self.forest.node(node).id())
        };
        let target = (cursor + 1..self.entries.len())
            .find(is_bookmarked)
            .or_else(|| (0..=cursor).find(is_bookmarked));
        if let Some(row) = target {
            self.set_cursor(row);
            return;
        }

        let hidden = self
            .forest
            .preorder()
            .into_iter()
            .find(|&n| self.bookmarks.contains(self.forest.node(n).id()));
        if let Some(node) = hidden {
            self.reveal(node);
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Selection
    // ─────────────────────────────────────────────────────────────────────────

    /// Move the cursor to `id` if it is displayed. Returns whether it moved.
    pub fn select_by_id(&mut self, id: &str) -> bool {
        let row = self
            .forest
            .get(id)
            .and_then(|node| self.positions.get(&node).copied());
        match row {
            Some(row) => {
                self.set_cursor(row);
                true
            }
            None => false,
        }
    }

    /// Expand every collapsed ancestor of `node` and select it. Returns whether
    /// the node ended up displayed.
    pub(super) fn reveal(&mut self, node: NodeId) -> bool {
        let mut changed = false;
        for ancestor in self.forest.ancestors(node) {
            let tree = self.forest.node_mut(ancestor);
            if !tree.expanded {
                tree.expanded = true;
                changed = true;
            }
        }
        if changed {
            self.rebuild_flat_list();
            self.save_state();
        }
        match self.positions.get(&node).copied() {
            Some(row) => {
                self.set_cursor(row);
                true
            }
            None => {
                self.viewport.ensure_cursor_visible(self.entries.len());
                false
            }
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Follow mode
    // ─────────────────────────────────────────────────────────────────────────

    /// Reveal and select the first identifier in `new_ids` missing from
    /// `old_ids`, in display order. Returns it when follow mode is on and the
    /// issue could be shown.
    pub fn detect_and_follow_changes(&mut self, old_ids: &[String], new_ids: &[String]) -> Option<String> {
        if !self.follow_mode {
            return None;
        }
        let old: HashSet<&str> = old_ids.iter().map(String::as_str).collect();
        let added: HashSet<&str> = new_ids
            .iter()
            .map(String::as_str)
            .filter(|id| !old.contains(id))
            .collect();
        if added.is_empty() {
            return None;
        }

        let first = self
            .display_order()
            .into_iter()
            .find(|&n| added.contains(self.forest.node(n).id()))?;
        let id = self.forest.node(first).id().to_string();
        if self.reveal(first) {
            tracing::debug!("Following new issue {}", id);
            Some(id)
        } else {
            None
        }
    }

    /// Follow against an internal snapshot. The first call only records it.
    pub fn follow_new_ids(&mut self, ids: &[String]) -> Option<String> {
        let Some(baseline) = self.follow_baseline.replace(ids.iter().cloned().collect()) else {
            return None;
        };
        let old: Vec<String> = baseline.into_iter().collect();
        self.detect_and_follow_changes(&old, ids)
    }
}
