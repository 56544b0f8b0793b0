//! Incremental search and occur mode.
//!
//! Search walks every node (collapsed ones included) and reveals the current
//! match. Occur mode is a regex post-filter over the flattened rows.

use super::flatten::FlatEntry;
use super::forest::{Forest, NodeId};
use super::TreeModel;
use regex::Regex;

#[derive(Debug, Default)]
pub(super) struct SearchState {
    active: bool,
    query: String,
    matches: Vec<NodeId>,
    current: usize,
}

impl SearchState {
    pub(super) fn has_query(&self) -> bool {
        !self.query.is_empty()
    }

    fn current_match(&self) -> Option<NodeId> {
        self.matches.get(self.current).copied()
    }
}

#[derive(Debug)]
pub(super) struct OccurState {
    pattern: String,
    regex: Regex,
}

impl OccurState {
    /// Compile `pattern` case-insensitively.
    fn compile(pattern: &str) -> Result<Self, regex::Error> {
        let regex = Regex::new(&format!("(?i){}", pattern))?;
        Ok(Self {
            pattern: pattern.to_string(),
            regex,
        })
    }

    pub(super) fn retain(&self, forest: &Forest, entries: &mut Vec<FlatEntry>) {
        entries.retain(|e| {
            let issue = &forest.node(e.node).issue;
            self.regex.is_match(&issue.id)
                || self.regex.is_match(&issue.title)
                || self.regex.is_match(issue.status.as_str())
        });
    }
}

fn search_matches(forest: &Forest, query: &str) -> Vec<NodeId> {
    if query.is_empty() {
        return Vec::new();
    }
    let needle = query.to_lowercase();
    forest
        .preorder()
        .into_iter()
        .filter(|&n| {
            let issue = &forest.node(n).issue;
            issue.title.to_lowercase().contains(&needle) || issue.id.to_lowercase().contains(&needle)
        })
        .collect()
}

impl TreeModel {
    // ─────────────────────────────────────────────────────────────────────────
    // Search
    // ─────────────────────────────────────────────────────────────────────────

    /// Start typing a new query.
    pub fn enter_search_mode(&mut self) {
        self.search = SearchState {
            active: true,
            ..SearchState::default()
        };
    }

    /// Stop editing the query. Matches stay navigable with n/N.
    pub fn exit_search_mode(&mut self) {
        self.search.active = false;
    }

    pub fn clear_search(&mut self) {
        self.search = SearchState::default();
    }

    pub fn is_search_mode(&self) -> bool {
        self.search.active
    }

    pub fn search_query(&self) -> &str {
        &self.search.query
    }

    pub fn search_add_char(&mut self, c: char) {
        self.search.query.push(c);
        self.execute_search();
    }

    pub fn search_backspace(&mut self) {
        if self.search.query.pop().is_some() {
            self.execute_search();
        }
    }

    pub fn search_match_count(&self) -> usize {
        self.search.matches.len()
    }

    /// 1-based index of the current match, 0 without matches.
    pub fn search_match_index(&self) -> usize {
        if self.search.matches.is_empty() {
            0
        } else {
            self.search.current + 1
        }
    }

    pub fn is_search_match(&self, id: &str) -> bool {
        self.forest
            .get(id)
            .is_some_and(|n| self.search.matches.contains(&n))
    }

    pub fn next_search_match(&mut self) {
        let count = self.search.matches.len();
        if count == 0 {
            return;
        }
        self.search.current = (self.search.current + 1) % count;
        self.jump_to_search_match();
    }

    pub fn prev_search_match(&mut self) {
        let count = self.search.matches.len();
        if count == 0 {
            return;
        }
        self.search.current = (self.search.current + count - 1) % count;
        self.jump_to_search_match();
    }

    /// Recompute matches for the current query and jump to the first one.
    fn execute_search(&mut self) {
        self.search.matches = search_matches(&self.forest, &self.search.query);
        self.search.current = 0;
        self.jump_to_search_match();
    }

    /// Recompute matches after a rebuild or re-sort without moving the
    /// cursor, staying on the same current match when it still exists.
    pub(super) fn refresh_search_matches(&mut self) {
        let current = self
            .search
            .current_match()
            .map(|n| self.forest.node(n).id().to_string());
        self.search.matches = search_matches(&self.forest, &self.search.query);
        self.search.current = current
            .and_then(|id| self.forest.get(&id))
            .and_then(|n| self.search.matches.iter().position(|&m| m == n))
            .unwrap_or(0);
    }

    fn jump_to_search_match(&mut self) {
        if let Some(node) = self.search.current_match() {
            self.reveal(node);
        }
    }

    /// `/query [i/n]` while editing a query, `None` otherwise.
    pub fn search_bar(&self) -> Option<String> {
        if !self.search.active {
            return None;
        }
        let mut bar = format!("/{}", self.search.query);
        if self.search.has_query() {
            if self.search.matches.is_empty() {
                bar.push_str(" [no matches]");
            } else {
                bar.push_str(&format!(" [{}/{}]", self.search_match_index(), self.search_match_count()));
            }
        }
        Some(bar)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Occur
    // ─────────────────────────────────────────────────────────────────────────

    /// Keep only rows whose id, title or status matches `pattern`.
    /// Empty or invalid patterns leave the rows untouched.
    pub fn enter_occur_mode(&mut self, pattern: &str) {
        let pattern = pattern.trim();
        if pattern.is_empty() {
            return;
        }
        match OccurState::compile(pattern) {
            Ok(occur) => {
                self.occur = Some(occur);
                self.refresh_keeping_selection();
            }
            Err(e) => tracing::debug!("Invalid occur pattern {:?}: {}", pattern, e),
        }
    }

    pub fn exit_occur_mode(&mut self) {
        if self.occur.take().is_some() {
            self.refresh_keeping_selection();
        }
    }

    pub fn is_occur_mode(&self) -> bool {
        self.occur.is_some()
    }

    pub fn occur_pattern(&self) -> Option<&str> {
        self.occur.as_ref().map(|o| o.pattern.as_str())
    }
}
