//! Diagnostics
//!
//! Bounded histories of recent layouts and fired events, plus the record
//! types that a container serializes into its JSON dump. Dumping is purely
//! observational.

use std::collections::VecDeque;

use glide_core::Axis;
use serde::Serialize;

use crate::edge::ScrollEdge;

/// Entries kept per history
pub const HISTORY_CAPACITY: usize = 30;

/// Ring buffer keeping the most recent entries
#[derive(Debug, Clone)]
pub struct History<T> {
    entries: VecDeque<T>,
    capacity: usize,
}

impl<T> History<T> {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity: capacity.max(1),
        }
    }

    pub fn push(&mut self, entry: T) {
        if self.entries.len() == self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(entry);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn last(&self) -> Option<&T> {
        self.entries.back()
    }

    /// Oldest first
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.entries.iter()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

impl<T> Default for History<T> {
    fn default() -> Self {
        Self::with_capacity(HISTORY_CAPACITY)
    }
}

impl<T: Serialize> History<T> {
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::Value::Array(
            self.entries
                .iter()
                .filter_map(|entry| serde_json::to_value(entry).ok())
                .collect(),
        )
    }
}

/// One layout pass as seen by a container
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LayoutRecord {
    pub axis: Axis,
    pub viewport_length: f32,
    pub extent: f32,
    pub scrollable_distance: f32,
    pub offset: f32,
}

/// Named events recorded by the event hub
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ScrollEventKind {
    ReachStart,
    ReachEnd,
    ScrollStart,
    ScrollStop,
    ScrollEdge(ScrollEdge),
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct EventRecord {
    pub kind: ScrollEventKind,
    pub offset: f32,
}

/// Render a JSON dump as indented `key: value` lines
pub fn to_text(value: &serde_json::Value) -> String {
    let mut out = String::new();
    write_text(value, 0, &mut out);
    out
}

fn write_text(value: &serde_json::Value, depth: usize, out: &mut String) {
    let indent = "  ".repeat(depth);
    match value {
        serde_json::Value::Object(map) => {
            for (key, item) in map {
                if item.is_object() || item.is_array() {
                    out.push_str(&format!("{indent}{key}:\n"));
                    write_text(item, depth + 1, out);
                } else {
                    out.push_str(&format!("{indent}{key}: {item}\n"));
                }
            }
        }
        serde_json::Value::Array(items) => {
            for (index, item) in items.iter().enumerate() {
                if item.is_object() || item.is_array() {
                    out.push_str(&format!("{indent}[{index}]\n"));
                    write_text(item, depth + 1, out);
                } else {
                    out.push_str(&format!("{indent}[{index}] {item}\n"));
                }
            }
        }
        other => out.push_str(&format!("{indent}{other}\n")),
    }
}
