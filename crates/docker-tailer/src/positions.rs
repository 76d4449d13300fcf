// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Contract for the external store of stream resume offsets.
//!
//! The store itself (its file format, flush cadence, etc.) lives outside
//! this crate; the manager only needs to delete entries for targets that
//! have gone away, and targets save their own offsets through their side
//! of the store.

/// Key of one position-store entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Entry {
    /// Path-or-cursor key. Container entries use [`cursor_key`] so a
    /// file-backed store never mistakes the container ID for a filesystem
    /// path it should stat and garbage-collect.
    pub path: String,
    /// Label set of the entry, canonical string form.
    pub labels: String,
}

/// External store of resume offsets, keyed by path/cursor plus label set.
pub trait Positions: Send + Sync {
    /// Best-effort removal of an entry. Removing an absent key is not an
    /// error.
    fn remove(&self, path: &str, labels: &str);
}

/// Marks a position key as an opaque cursor rather than a readable file
/// path.
pub fn cursor_key(name: &str) -> String {
    format!("cursor-{name}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cursor_key_prefixes_name() {
        assert_eq!(cursor_key("abc123"), "cursor-abc123");
    }

    #[test]
    fn test_entry_equality_covers_both_fields() {
        let a = Entry {
            path: cursor_key("c1"),
            labels: r#"{job="docker"}"#.to_string(),
        };
        let same = a.clone();
        let other_labels = Entry {
            path: cursor_key("c1"),
            labels: r#"{job="other"}"#.to_string(),
        };

        assert_eq!(a, same);
        assert_ne!(a, other_labels);
    }
}
