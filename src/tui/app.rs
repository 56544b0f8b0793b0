use crate::data::{index_issues, load_issues};
use crate::tree::{ActiveFilter, SimpleFilter, TreeModel};
use anyhow::Result;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Simple filters in the order `CycleFilter` walks them.
pub const FILTER_CYCLE: [SimpleFilter; 4] = [
    SimpleFilter::All,
    SimpleFilter::Open,
    SimpleFilter::Closed,
    SimpleFilter::Ready,
];

/// What a single-line prompt edits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptKind {
    /// Advanced predicate filter
    Filter,
    /// Occur regex
    Occur,
}

impl PromptKind {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Filter => "filter",
            Self::Occur => "occur",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prompt {
    pub kind: PromptKind,
    pub input: String,
}

pub struct App {
    pub model: TreeModel,
    pub prompt: Option<Prompt>,
    pub status_message: Option<String>,
    pub error_message: Option<String>,
    issues_path: PathBuf,
    filter_idx: usize,
}

impl App {
    pub fn new(model: TreeModel, issues_path: PathBuf) -> Self {
        let filter_idx = FILTER_CYCLE
            .iter()
            .position(|f| f.label() == model.filter())
            .unwrap_or(0);
        Self {
            model,
            prompt: None,
            status_message: None,
            error_message: None,
            issues_path,
            filter_idx,
        }
    }

    pub fn issues_path(&self) -> &Path {
        &self.issues_path
    }

    /// Re-read the issues file and rebuild the tree. In follow mode the first
    /// new issue is selected.
    pub fn reload(&mut self) -> Result<()> {
        let issues = load_issues(&self.issues_path)?;
        let ids: Vec<String> = issues.iter().map(|i| i.id.clone()).collect();

        self.model.set_global_issue_index(Arc::new(index_issues(&issues)));
        self.model.build(&issues);
        if let Some(id) = self.model.follow_new_ids(&ids) {
            self.status_message = Some(format!("Following {}", id));
        }
        self.error_message = None;
        tracing::debug!("Loaded {} issues from {}", issues.len(), self.issues_path.display());
        Ok(())
    }

    /// Size of the tree area, header included.
    pub fn resize(&mut self, width: u16, height: u16) {
        // Bottom row is the status bar
        self.model
            .set_size(i32::from(width), i32::from(height.saturating_sub(1)));
    }

    /// Apply a message; returns `Ok(true)` when the app should quit.
    pub fn update(&mut self, msg: super::Message) -> Result<bool> {
        use super::Message;

        if msg != Message::None {
            self.status_message = None;
        }

        match msg {
            // ─────────────────────────────────────────────────────────────────
            // App lifecycle
            // ─────────────────────────────────────────────────────────────────
            Message::Quit => return Ok(true),
            Message::Reload => {
                if let Err(e) = self.reload() {
                    tracing::warn!("Reload failed: {:#}", e);
                    self.error_message = Some(format!("{:#}", e));
                }
            }

            // ─────────────────────────────────────────────────────────────────
            // Cursor movement
            // ─────────────────────────────────────────────────────────────────
            Message::MoveUp => self.model.move_up(),
            Message::MoveDown => self.model.move_down(),
            Message::GotoTop => self.model.jump_to_top(),
            Message::GotoBottom => self.model.jump_to_bottom(),
            Message::PageUp => self.model.page_up(),
            Message::PageDown => self.model.page_down(),
            Message::PageBackwardFull => self.model.page_backward_full(),
            Message::PageForwardFull => self.model.page_forward_full(),
            Message::JumpToParent => self.model.jump_to_parent(),
            Message::NextSibling => self.model.next_sibling(),
            Message::PrevSibling => self.model.prev_sibling(),
            Message::FirstSibling => self.model.first_sibling(),
            Message::LastSibling => self.model.last_sibling(),

            // ─────────────────────────────────────────────────────────────────
            // Expand state
            // ─────────────────────────────────────────────────────────────────
            Message::ExpandOrChild => self.model.expand_or_move_to_child(),
            Message::CollapseOrParent => self.model.collapse_or_jump_to_parent(),
            Message::ToggleExpand => self.model.toggle_expand(),
            Message::ToggleExpandAll => self.model.toggle_expand_collapse_all(),
            Message::CycleNodeVisibility => self.model.cycle_node_visibility(),
            Message::CycleGlobalVisibility => self.model.cycle_global_visibility(),
            Message::ExpandToLevel(level) => self.model.expand_to_level(level),

            // ─────────────────────────────────────────────────────────────────
            // Marks and bookmarks
            // ─────────────────────────────────────────────────────────────────
            Message::ToggleMark => self.model.toggle_mark(),
            Message::UnmarkAll => self.model.unmark_all(),
            Message::ToggleBookmark => self.model.toggle_bookmark(),
            Message::CycleBookmark => self.model.cycle_bookmark(),

            // ─────────────────────────────────────────────────────────────────
            // Display modes
            // ─────────────────────────────────────────────────────────────────
            Message::ToggleXRay => self.model.toggle_xray(),
            Message::ToggleFlatMode => self.model.toggle_flat_mode(),
            Message::ToggleFollowMode => {
                self.model.toggle_follow_mode();
                let state = if self.model.follow_mode() { "on" } else { "off" };
                self.status_message = Some(format!("Follow mode {}", state));
            }
            Message::Escape => {
                if self.model.is_occur_mode() {
                    self.model.exit_occur_mode();
                } else if self.model.is_xray() {
                    self.model.exit_xray();
                } else if self.model.search_match_count() > 0 {
                    self.model.clear_search();
                }
            }

            // ─────────────────────────────────────────────────────────────────
            // Sorting and filtering
            // ─────────────────────────────────────────────────────────────────
            Message::CycleSortMode => self.model.cycle_sort_mode(),
            Message::ToggleSortMenu => {
                if self.model.is_sort_popup_open() {
                    self.model.close_sort_popup();
                } else {
                    self.model.open_sort_popup();
                }
            }
            Message::SortMenuUp => self.model.sort_popup_up(),
            Message::SortMenuDown => self.model.sort_popup_down(),
            Message::SortMenuSelect => self.model.sort_popup_select(),
            Message::CycleFilter => {
                self.filter_idx = (self.filter_idx + 1) % FILTER_CYCLE.len();
                self.model.apply_filter(FILTER_CYCLE[self.filter_idx].label());
            }

            // ─────────────────────────────────────────────────────────────────
            // Search mode
            // ─────────────────────────────────────────────────────────────────
            Message::EnterSearch => self.model.enter_search_mode(),
            Message::ConfirmSearch => self.model.exit_search_mode(),
            Message::CancelSearch => self.model.clear_search(),
            Message::SearchInput(c) => self.model.search_add_char(c),
            Message::SearchBackspace => self.model.search_backspace(),
            Message::NextMatch => self.model.next_search_match(),
            Message::PrevMatch => self.model.prev_search_match(),

            // ─────────────────────────────────────────────────────────────────
            // Prompts
            // ─────────────────────────────────────────────────────────────────
            Message::OpenPrompt(kind) => {
                let input = match kind {
                    PromptKind::Filter => match self.model.active_filter() {
                        ActiveFilter::Advanced { query, .. } => query.clone(),
                        _ => String::new(),
                    },
                    PromptKind::Occur => self.model.occur_pattern().unwrap_or_default().to_string(),
                };
                self.prompt = Some(Prompt { kind, input });
            }
            Message::PromptInput(c) => {
                if let Some(prompt) = self.prompt.as_mut() {
                    prompt.input.push(c);
                }
            }
            Message::PromptBackspace => {
                if let Some(prompt) = self.prompt.as_mut() {
                    prompt.input.pop();
                }
            }
            Message::PromptConfirm => {
                if let Some(prompt) = self.prompt.take() {
                    self.confirm_prompt(prompt);
                }
            }
            Message::PromptCancel => self.prompt = None,

            Message::None => {}
        }
        Ok(false)
    }

    fn confirm_prompt(&mut self, prompt: Prompt) {
        match prompt.kind {
            PromptKind::Filter => {
                self.model.apply_advanced_filter(&prompt.input);
                self.filter_idx = 0;
            }
            PromptKind::Occur => {
                if prompt.input.trim().is_empty() {
                    self.model.exit_occur_mode();
                    return;
                }
                self.model.enter_occur_mode(&prompt.input);
                if !self.model.is_occur_mode() {
                    self.error_message = Some(format!("Invalid pattern: {}", prompt.input));
                }
            }
        }
    }
}
