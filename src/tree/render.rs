//! Text rendering of the tree.
//!
//! Only rows inside the visible window are formatted, so render cost is
//! independent of the number of issues.

use super::flatten::FlatEntry;
use super::icons;
use super::{sticky, TreeModel};
use crate::data::SortField;
use chrono::{DateTime, Utc};
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

/// Width used when none has been set.
pub const FALLBACK_WIDTH: usize = 80;
pub const MAX_ID_WIDTH: usize = 35;
pub const MIN_TITLE_WIDTH: usize = 5;
/// Narrower terminals drop the age column.
pub const AGE_COLUMN_MIN_WIDTH: usize = 60;

const COLUMN_CAPTIONS: &str = "  TYPE PRI STATUS      ID                     TITLE";

pub const EMPTY_STATE: &str = "Tree View\n\n\
No issues to display.\n\n\
To create hierarchy, add parent-child dependencies:\n  \
bd dep add <child-id> <parent-id> --type parent-child";

pub const NO_MATCHES: &str = "  No issues match the current filter.";

/// A formatted row plus the flags a styled front end needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedRow {
    pub id: String,
    pub text: String,
    pub selected: bool,
    pub dimmed: bool,
    pub marked: bool,
    pub search_match: bool,
}

/// Truncate `s` to at most `max` display columns, ending with `…` when cut.
pub fn truncate_to_width(s: &str, max: usize) -> String {
    if s.width() <= max {
        return s.to_string();
    }
    if max == 0 {
        return String::new();
    }
    let mut out = String::new();
    let mut used = 0;
    for c in s.chars() {
        let w = c.width().unwrap_or(0);
        if used + w > max - 1 {
            break;
        }
        used += w;
        out.push(c);
    }
    out.push(icons::ELLIPSIS);
    out
}

/// Compact relative age: `now`, `5m`, `3h`, `2d`, `4mo`, `1y`.
pub fn format_age(then: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let secs = (now - then).num_seconds().max(0);
    match secs {
        s if s < 60 => "now".to_string(),
        s if s < 3_600 => format!("{}m", s / 60),
        s if s < 86_400 => format!("{}h", s / 3_600),
        s if s < 30 * 86_400 => format!("{}d", s / 86_400),
        s if s < 365 * 86_400 => format!("{}mo", s / (30 * 86_400)),
        s => format!("{}y", s / (365 * 86_400)),
    }
}

impl TreeModel {
    fn render_width(&self) -> usize {
        usize::try_from(self.width)
            .ok()
            .filter(|&w| w > 0)
            .unwrap_or(FALLBACK_WIDTH)
    }

    /// The full text block: header, sticky lines, rows, position indicator and
    /// search bar.
    pub fn view(&self) -> String {
        if self.forest.is_empty() {
            return EMPTY_STATE.to_string();
        }
        let width = self.render_width();
        let mut lines = vec![truncate_to_width(&self.render_header(), width)];
        if self.entries.is_empty() {
            lines.push(NO_MATCHES.to_string());
        } else {
            lines.extend(self.sticky_scroll_lines());
            lines.extend(self.visible_rows().into_iter().map(|r| r.text));
            if let Some(indicator) = self.position_indicator() {
                lines.push(indicator);
            }
        }
        if let Some(bar) = self.search_bar() {
            lines.push(bar);
        }
        lines.join("\n")
    }

    /// Mode badges followed by the column captions.
    pub fn render_header(&self) -> String {
        let mut header = String::from(if self.is_flat_layout() { "[FLAT]" } else { "[TREE]" });
        if let Some(title) = self.xray_title() {
            header.push_str(&format!(" [XRAY: {}]", title));
        }
        if self.follow_mode {
            header.push_str(" [FOLLOW]");
        }
        if let Some(pattern) = self.occur_pattern() {
            header.push_str(&format!(" [OCCUR: {}]", pattern));
        }
        header.push_str(COLUMN_CAPTIONS);
        header
    }

    pub fn position_indicator(&self) -> Option<String> {
        let len = self.entries.len();
        self.viewport
            .needs_indicator(len)
            .then(|| self.viewport.position_indicator(len))
    }

    /// Breadcrumbs for displayed ancestors scrolled above the window,
    /// nearest first.
    pub fn sticky_scroll_lines(&self) -> Vec<String> {
        let (start, _) = self.visible_range();
        let width = self.render_width();
        sticky::sticky_ancestors(&self.entries, &self.positions, self.viewport.cursor, start)
            .into_iter()
            .map(|row| {
                let entry = &self.entries[row];
                let issue = &self.forest.node(entry.node).issue;
                let line = format!(
                    "  {}{} {} {}",
                    "  ".repeat(entry.depth),
                    icons::STICKY,
                    issue.id,
                    issue.title
                );
                truncate_to_width(&line, width)
            })
            .collect()
    }

    /// Rows inside the visible window.
    pub fn visible_rows(&self) -> Vec<RenderedRow> {
        let (start, end) = self.visible_range();
        let width = self.render_width();
        let now = Utc::now();
        (start..end)
            .map(|row| {
                let entry = &self.entries[row];
                let id = self.forest.node(entry.node).id();
                RenderedRow {
                    id: id.to_string(),
                    text: self.format_row(entry, row == self.viewport.cursor, width, now),
                    selected: row == self.viewport.cursor,
                    dimmed: entry.dimmed,
                    marked: self.marks.contains(id),
                    search_match: self.is_search_match(id),
                }
            })
            .collect()
    }

    fn format_row(&self, entry: &FlatEntry, selected: bool, width: usize, now: DateTime<Utc>) -> String {
        let node = self.forest.node(entry.node);
        let issue = &node.issue;

        let mut line = String::new();
        line.push_str(if selected { icons::CURSOR } else { " " });
        line.push_str(if self.marks.contains(issue.id.as_str()) { icons::MARK } else { " " });
        line.push_str(&self.tree_prefix(entry));

        let next = self
            .positions
            .get(&entry.node)
            .and_then(|&row| self.entries.get(row + 1));
        let open = match next {
            Some(next) if next.parent == Some(entry.node) => true,
            _ => node.expanded,
        };
        let indicator = if !node.has_children() {
            icons::LEAF
        } else if open && !self.is_flat_layout() {
            icons::EXPANDED
        } else {
            icons::COLLAPSED
        };
        line.push_str(indicator);
        line.push(' ');
        if self.bookmarks.contains(issue.id.as_str()) {
            line.push_str(icons::BOOKMARK);
            line.push(' ');
        }
        line.push_str(&format!(
            "{} P{} {} {} ",
            icons::type_icon(&issue.issue_type),
            issue.priority,
            issue.status.badge(),
            truncate_to_width(&issue.id, MAX_ID_WIDTH),
        ));

        let age = (width > AGE_COLUMN_MIN_WIDTH).then(|| format!(" {:>4}", format_age(issue.created_at, now)));
        let age_width = age.as_deref().map_or(0, UnicodeWidthStr::width);
        let title_width = width
            .saturating_sub(line.width() + age_width)
            .max(MIN_TITLE_WIDTH);
        let title = truncate_to_width(&issue.title, title_width);
        line.push_str(&title);

        if let Some(age) = age {
            let pad = title_width.saturating_sub(title.width());
            line.push_str(&" ".repeat(pad));
            line.push_str(&age);
        }
        line
    }

    /// Connector glyphs for a row: one segment per displayed ancestor below
    /// the root, then the row's own branch.
    fn tree_prefix(&self, entry: &FlatEntry) -> String {
        if entry.depth == 0 || self.is_flat_layout() {
            return String::new();
        }
        let mut segments = Vec::with_capacity(entry.depth);
        segments.push(if entry.is_last { icons::LAST_BRANCH } else { icons::BRANCH });

        let mut current = *entry;
        while let Some(&row) = current.parent.and_then(|p| self.positions.get(&p)) {
            let parent = self.entries[row];
            if parent.depth == 0 {
                break;
            }
            segments.push(if parent.is_last { icons::BLANK } else { icons::PIPE });
            current = parent;
        }
        segments.iter().rev().copied().collect()
    }

    /// The sort popup: a title line, then one line per field.
    pub fn render_sort_popup(&self) -> String {
        let cursor = self.sort_popup_cursor();
        let mut lines = vec!["Sort by:".to_string()];
        for field in SortField::all() {
            let marker = if field.index() == cursor { icons::POPUP_CURSOR } else { "  " };
            let direction = if field == self.sort_field {
                format!("{} ", self.sort_direction.indicator())
            } else {
                "  ".to_string()
            };
            lines.push(format!("{}{}{}", marker, direction, field.label()));
        }
        lines.join("\n")
    }
}
