//! Message enum for Elm Architecture (TEA) pattern.
//!
//! Every user action on the tree viewer is a message. Key events are mapped
//! to messages in `input.rs` and applied by `App::update()`.

use super::app::PromptKind;

#[derive(Debug, Clone, PartialEq)]
pub enum Message {
    // ─────────────────────────────────────────────────────────────────────────
    // App lifecycle
    // ─────────────────────────────────────────────────────────────────────────
    /// Quit the application
    Quit,
    /// Re-read the issues file
    Reload,

    // ─────────────────────────────────────────────────────────────────────────
    // Cursor movement
    // ─────────────────────────────────────────────────────────────────────────
    MoveUp,
    MoveDown,
    GotoTop,
    GotoBottom,
    /// Half a page up
    PageUp,
    /// Half a page down
    PageDown,
    PageBackwardFull,
    PageForwardFull,
    JumpToParent,
    NextSibling,
    PrevSibling,
    FirstSibling,
    LastSibling,

    // ─────────────────────────────────────────────────────────────────────────
    // Expand state
    // ─────────────────────────────────────────────────────────────────────────
    /// Expand, or step into the first child
    ExpandOrChild,
    /// Collapse, or step out to the parent
    CollapseOrParent,
    ToggleExpand,
    ToggleExpandAll,
    CycleNodeVisibility,
    CycleGlobalVisibility,
    /// Show levels down to the given depth (1 = roots only)
    ExpandToLevel(usize),

    // ─────────────────────────────────────────────────────────────────────────
    // Marks and bookmarks
    // ─────────────────────────────────────────────────────────────────────────
    ToggleMark,
    UnmarkAll,
    ToggleBookmark,
    CycleBookmark,

    // ─────────────────────────────────────────────────────────────────────────
    // Display modes
    // ─────────────────────────────────────────────────────────────────────────
    ToggleXRay,
    ToggleFlatMode,
    ToggleFollowMode,
    /// Leave XRay or occur mode, whichever is active
    Escape,

    // ─────────────────────────────────────────────────────────────────────────
    // Sorting and filtering
    // ─────────────────────────────────────────────────────────────────────────
    CycleSortMode,
    ToggleSortMenu,
    SortMenuUp,
    SortMenuDown,
    SortMenuSelect,
    /// Advance through all / open / closed / ready
    CycleFilter,

    // ─────────────────────────────────────────────────────────────────────────
    // Search mode
    // ─────────────────────────────────────────────────────────────────────────
    EnterSearch,
    /// Stop typing, keep matches
    ConfirmSearch,
    /// Stop typing and drop matches
    CancelSearch,
    SearchInput(char),
    SearchBackspace,
    NextMatch,
    PrevMatch,

    // ─────────────────────────────────────────────────────────────────────────
    // Prompts (advanced filter, occur pattern)
    // ─────────────────────────────────────────────────────────────────────────
    OpenPrompt(PromptKind),
    PromptInput(char),
    PromptBackspace,
    PromptConfirm,
    PromptCancel,

    /// No operation (unhandled key)
    None,
}
