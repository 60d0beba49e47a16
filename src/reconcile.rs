//! Change detection between the persisted cursor and a freshly fetched
//! snapshot. Two strategies:
//!
//! - key-set diff for feeds that return the full current catalog;
//! - ordered-cursor diff (hash stop-marker or numeric watermark) for feeds
//!   that return a short window of recent records.
//!
//! Both are pure functions: callers fetch and persist, this module only
//! decides what is new and what cursor to write next.

use std::collections::{BTreeMap, BTreeSet};

use serde_json::Value;

use crate::state::Cursor;

/// Result of a key-set diff.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeySetOutcome {
    /// Keys present now but not in the previous run, in sorted order.
    pub new_keys: Vec<String>,
    /// Cursor to persist: the full current key set (disappeared keys drop
    /// out, they are not merged into a union).
    pub cursor: Cursor,
}

/// Diff a fetched catalog against the previously seen key set.
///
/// An empty snapshot is legal: the upstream catalog really can be empty, and
/// a fetch failure never reaches this function. It yields zero new keys and
/// resets the cursor to the empty set.
pub fn diff_key_set(
    previous: &BTreeSet<String>,
    current: &BTreeMap<String, Value>,
) -> KeySetOutcome {
    let current_keys: BTreeSet<String> = current.keys().cloned().collect();
    let new_keys = current_keys.difference(previous).cloned().collect();
    KeySetOutcome {
        new_keys,
        cursor: Cursor::Keys(current_keys),
    }
}

/// A record from an ordered feed window.
pub trait Ordered {
    /// Monotonic ordering key (logical time or unix seconds).
    fn order_key(&self) -> u64;
    /// Stable identity (transaction hash).
    fn id(&self) -> &str;
}

/// Result of an ordered-cursor diff.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderedOutcome<R> {
    /// New records in ascending order, so alerts go out chronologically.
    pub new_records: Vec<R>,
    pub cursor: Cursor,
}

/// Diff a window of records against the last-seen hash.
///
/// The feed may return the window in any order (tonapi returns newest-first);
/// records are sorted ascending before anything else. A record is new iff it
/// comes after the position of `last` in that order. If `last` is no longer
/// inside the window, more records arrived since the previous run than the
/// window holds and every record counts as new. That can re-alert items that
/// scrolled out, a known limitation of small-window polling, not repaired
/// here.
pub fn diff_by_hash<R: Ordered>(last: Option<&str>, mut records: Vec<R>) -> OrderedOutcome<R> {
    records.sort_by_key(Ordered::order_key);

    let Some(newest) = records.last() else {
        // Empty window: nothing new, cursor unchanged.
        return OrderedOutcome {
            new_records: Vec::new(),
            cursor: Cursor::Hash(last.map(str::to_string)),
        };
    };
    let cursor = Cursor::Hash(Some(newest.id().to_string()));

    let Some(last) = last else {
        // First run: adopt the newest hash without alerting on the backlog.
        return OrderedOutcome {
            new_records: Vec::new(),
            cursor,
        };
    };

    let new_records = match records.iter().position(|r| r.id() == last) {
        Some(pos) => records.split_off(pos + 1),
        None => records,
    };
    OrderedOutcome {
        new_records,
        cursor,
    }
}

/// Diff a window of records against a numeric watermark.
///
/// A record is new iff its ordering key is strictly greater than `last`. The
/// returned watermark is `max(last, newest key)`, so a feed that regresses
/// can never move the persisted watermark backwards.
pub fn diff_by_watermark<R: Ordered>(last: u64, mut records: Vec<R>) -> OrderedOutcome<R> {
    records.sort_by_key(Ordered::order_key);

    let Some(newest_key) = records.last().map(Ordered::order_key) else {
        return OrderedOutcome {
            new_records: Vec::new(),
            cursor: Cursor::Watermark(last),
        };
    };
    let cursor = Cursor::Watermark(newest_key.max(last));

    if last == 0 {
        // First run: start the watermark at the newest record, no backlog
        // notifications.
        return OrderedOutcome {
            new_records: Vec::new(),
            cursor,
        };
    }

    let new_records = records.into_iter().filter(|r| r.order_key() > last).collect();
    OrderedOutcome {
        new_records,
        cursor,
    }
}
