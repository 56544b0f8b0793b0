//! Tree state persistence.
//!
//! Saves the expand/collapse choices that differ from the depth default, plus
//! bookmarks, to `<beads_dir>/tree-state.json`:
//!
//! ```json
//! {
//!   "version": 1,
//!   "expanded": { "bd-123": true, "bd-456": false },
//!   "bookmarks": ["bd-789"]
//! }
//! ```
//!
//! Writes go to a locked temp file that is renamed over the target.

use super::forest::{default_expanded, Forest};
use anyhow::{Context, Result};
use fs2::FileExt;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

pub const TREE_STATE_VERSION: u32 = 1;
pub const TREE_STATE_FILE: &str = "tree-state.json";
pub const DEFAULT_BEADS_DIR: &str = ".beads";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreeState {
    pub version: u32,
    #[serde(default)]
    pub expanded: BTreeMap<String, bool>,
    #[serde(default)]
    pub bookmarks: BTreeSet<String>,
}

impl Default for TreeState {
    fn default() -> Self {
        Self {
            version: TREE_STATE_VERSION,
            expanded: BTreeMap::new(),
            bookmarks: BTreeSet::new(),
        }
    }
}

impl TreeState {
    /// Snapshot the non-default expand state of `forest`.
    pub fn capture<'a>(forest: &Forest, bookmarks: impl IntoIterator<Item = &'a String>) -> Self {
        let expanded = forest
            .iter()
            .filter(|(_, node)| node.has_children() && node.expanded != default_expanded(node.depth))
            .map(|(_, node)| (node.id().to_string(), node.expanded))
            .collect();
        Self {
            version: TREE_STATE_VERSION,
            expanded,
            bookmarks: bookmarks.into_iter().cloned().collect(),
        }
    }

    /// Apply expand state to matching nodes. Unknown identifiers are skipped.
    pub fn apply(&self, forest: &mut Forest) {
        let mut stale = 0usize;
        for (id, &expanded) in &self.expanded {
            match forest.get(id) {
                Some(node) => forest.node_mut(node).expanded = expanded,
                None => stale += 1,
            }
        }
        if stale > 0 {
            tracing::debug!("Ignored {} stale tree-state entries", stale);
        }
    }
}

/// Location of the state file; `.beads/tree-state.json` when no dir is given.
pub fn tree_state_path(beads_dir: Option<&Path>) -> PathBuf {
    beads_dir
        .unwrap_or_else(|| Path::new(DEFAULT_BEADS_DIR))
        .join(TREE_STATE_FILE)
}

/// Read state from `path`. A missing file yields `Ok(None)`.
pub fn read_state(path: &Path) -> Result<Option<TreeState>> {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => {
            return Err(e).with_context(|| format!("Failed to read tree state from {}", path.display()))
        }
    };
    let state = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse tree state from {}", path.display()))?;
    Ok(Some(state))
}

/// Best-effort load: any failure falls back to the default state.
pub fn load_or_default(path: &Path) -> TreeState {
    match read_state(path) {
        Ok(Some(state)) => state,
        Ok(None) => TreeState::default(),
        Err(e) => {
            tracing::warn!("Invalid tree state, using defaults: {:#}", e);
            TreeState::default()
        }
    }
}

/// Overwrite `path` with `state`, creating parent directories as needed.
pub fn write_state(path: &Path, state: &TreeState) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create state directory {}", parent.display()))?;
    }

    let tmp = path.with_extension("json.tmp");
    let file = File::create(&tmp)
        .with_context(|| format!("Failed to create {}", tmp.display()))?;
    file.lock_exclusive()?;

    let content = serde_json::to_string_pretty(state)?;
    let mut writer = BufWriter::new(&file);
    writer.write_all(content.as_bytes())?;
    writer.flush()?;
    drop(writer);
    file.sync_all()?;
    file.unlock()?;

    fs::rename(&tmp, path)
        .with_context(|| format!("Failed to replace tree state at {}", path.display()))?;
    Ok(())
}
