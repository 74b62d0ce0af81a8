//! Diagnostic trace of completed transitions.
//!
//! The machine records a [`TransitionRecord`] per transition when its debug
//! flag is on. Records carry a wall-clock timestamp and the host tick, both
//! for diagnostics only; nothing in the machine reads them back.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::time::Duration;

/// Record of a single transition.
///
/// # Example
///
/// ```rust
/// use signalbox::core::TransitionRecord;
/// use chrono::Utc;
///
/// let record = TransitionRecord {
///     from: Some("Idle".to_string()),
///     to: "Running".to_string(),
///     tick: Some(120),
///     timestamp: Utc::now(),
/// };
/// assert_eq!(record.to, "Running");
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TransitionRecord {
    /// State left, `None` for the machine's first transition
    pub from: Option<String>,
    /// State entered
    pub to: String,
    /// Host tick at the time of the transition, if a tick source is set
    pub tick: Option<u64>,
    /// When the transition occurred
    pub timestamp: DateTime<Utc>,
}

/// Bounded, oldest-first log of transitions.
///
/// Once `capacity` records are held, recording a new one evicts the oldest.
/// A capacity of zero keeps nothing.
///
/// # Example
///
/// ```rust
/// use signalbox::core::{TransitionLog, TransitionRecord};
/// use chrono::Utc;
///
/// let mut log = TransitionLog::with_capacity(2);
/// for (from, to) in [(None, "A"), (Some("A"), "B"), (Some("B"), "C")] {
///     log.record(TransitionRecord {
///         from: from.map(str::to_string),
///         to: to.to_string(),
///         tick: None,
///         timestamp: Utc::now(),
///     });
/// }
///
/// assert_eq!(log.len(), 2);
/// assert_eq!(log.path(), vec!["A", "B", "C"]);
/// ```
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct TransitionLog {
    capacity: usize,
    records: VecDeque<TransitionRecord>,
}

impl TransitionLog {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            capacity,
            records: VecDeque::with_capacity(capacity),
        }
    }

    pub fn record(&mut self, record: TransitionRecord) {
        if self.capacity == 0 {
            return;
        }
        while self.records.len() >= self.capacity {
            self.records.pop_front();
        }
        self.records.push_back(record);
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Records, oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &TransitionRecord> {
        self.records.iter()
    }

    pub fn last(&self) -> Option<&TransitionRecord> {
        self.records.back()
    }

    /// Names of the states traversed: the `from` of the oldest record (when
    /// it has one), then the `to` of every record.
    pub fn path(&self) -> Vec<&str> {
        let mut path = Vec::with_capacity(self.records.len() + 1);
        if let Some(from) = self.records.front().and_then(|r| r.from.as_deref()) {
            path.push(from);
        }
        path.extend(self.records.iter().map(|r| r.to.as_str()));
        path
    }

    /// Time between the oldest and newest retained records.
    pub fn span(&self) -> Option<Duration> {
        let (first, last) = (self.records.front()?, self.records.back()?);
        last.timestamp
            .signed_duration_since(first.timestamp)
            .to_std()
            .ok()
    }

    pub fn clear(&mut self) {
        self.records.clear();
    }
}
