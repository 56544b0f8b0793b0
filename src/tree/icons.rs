//! Glyphs used by the tree renderer.

use crate::data::IssueType;

// Tree connectors
pub const PIPE: &str = "│   ";
pub const BLANK: &str = "    ";
pub const BRANCH: &str = "├── ";
pub const LAST_BRANCH: &str = "└── ";

// Expand indicators
pub const LEAF: &str = "•";
pub const EXPANDED: &str = "▾";
pub const COLLAPSED: &str = "▸";

// Row markers
pub const CURSOR: &str = ">";
pub const MARK: &str = "●";
pub const BOOKMARK: &str = "★";
pub const STICKY: &str = "↑"; // Breadcrumb for a scrolled-off ancestor
pub const ELLIPSIS: char = '…';

// Issue types
pub const TYPE_EPIC: &str = "◆";
pub const TYPE_FEATURE: &str = "✦";
pub const TYPE_TASK: &str = "▪";
pub const TYPE_BUG: &str = "✖";
pub const TYPE_CHORE: &str = "⚙";
pub const TYPE_OTHER: &str = "·";

// Sort popup
pub const POPUP_CURSOR: &str = "▸ ";

pub fn type_icon(issue_type: &IssueType) -> &'static str {
    match issue_type {
        IssueType::Epic => TYPE_EPIC,
        IssueType::Feature => TYPE_FEATURE,
        IssueType::Task => TYPE_TASK,
        IssueType::Bug => TYPE_BUG,
        IssueType::Chore => TYPE_CHORE,
        IssueType::Other(_) => TYPE_OTHER,
    }
}
