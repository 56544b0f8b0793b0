//! Canopy - hierarchical issue tree for beads issue trackers
//!
//! This library crate exposes internal modules for integration testing.

pub mod config;
pub mod data;
pub mod tree;
pub mod tui;
