// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Notification queue with TTL and dedupe for CRUD feedback.
//!
//! Every mutation outcome is pushed here as a success or error toast. The
//! queue is owned by whichever component shows the notifications.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

/// Default lifetime for a notification.
pub const DEFAULT_TTL: Duration = Duration::from_secs(4);

/// Toast severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastKind {
    /// An operation completed.
    Success,
    /// Informational note.
    Info,
    /// Warning that may need attention.
    Warn,
    /// An operation failed.
    Error,
}

/// Identifier for a toast entry.
pub type ToastId = u64;

/// Toast data stored in the service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toast {
    /// Stable identifier.
    pub id: ToastId,
    /// Severity.
    pub kind: ToastKind,
    /// Short title line (e.g. "Record created").
    pub title: String,
    /// Optional detail, usually an error summary.
    pub body: Option<String>,
    /// Time-to-live duration.
    pub ttl: Duration,
    /// Creation time.
    pub created: Instant,
}

/// Rendering-friendly view of a toast.
#[derive(Debug, Clone)]
pub struct ToastRender {
    /// Stable identifier.
    pub id: ToastId,
    /// Severity.
    pub kind: ToastKind,
    /// Short title line.
    pub title: String,
    /// Optional body text.
    pub body: Option<String>,
    /// 1.0 -> just created, 0.0 -> expired.
    pub progress: f32,
}

/// In-memory toast queue with TTL and dedupe window.
#[derive(Debug)]
pub struct ToastService {
    queue: VecDeque<Toast>,
    max: usize,
    dedupe_window: Duration,
    next_id: ToastId,
}

impl Default for ToastService {
    fn default() -> Self {
        Self::new(8)
    }
}

impl ToastService {
    /// Create a new queue holding at most `max` toasts.
    pub fn new(max: usize) -> Self {
        Self {
            queue: VecDeque::new(),
            max: max.max(1),
            dedupe_window: Duration::from_millis(500),
            next_id: 1,
        }
    }

    /// Push a toast. An identical toast pushed within the dedupe window is
    /// refreshed and moved to the back instead of duplicated.
    pub fn push<S, B>(
        &mut self,
        kind: ToastKind,
        title: S,
        body: B,
        ttl: Duration,
        now: Instant,
    ) -> ToastId
    where
        S: Into<String>,
        B: Into<Option<String>>,
    {
        let title = title.into();
        let body = body.into();

        let duplicate = self.queue.iter().position(|t| {
            t.kind == kind
                && t.title == title
                && t.body == body
                && now.saturating_duration_since(t.created) <= self.dedupe_window
        });
        // A refreshed duplicate moves to the back so it reads as the latest.
        if let Some(mut existing) = duplicate.and_then(|i| self.queue.remove(i)) {
            existing.created = now;
            existing.ttl = ttl;
            let id = existing.id;
            self.queue.push_back(existing);
            return id;
        }

        let id = self.next_id;
        self.next_id += 1;
        if self.queue.len() == self.max {
            self.queue.pop_front();
        }
        self.queue.push_back(Toast {
            id,
            kind,
            title,
            body,
            ttl,
            created: now,
        });
        id
    }

    /// Success toast with the default TTL.
    pub fn success(&mut self, title: impl Into<String>, now: Instant) -> ToastId {
        self.push(ToastKind::Success, title, None, DEFAULT_TTL, now)
    }

    /// Error toast with the default TTL.
    pub fn error(
        &mut self,
        title: impl Into<String>,
        detail: impl Into<String>,
        now: Instant,
    ) -> ToastId {
        self.push(ToastKind::Error, title, Some(detail.into()), DEFAULT_TTL, now)
    }

    /// Most recently pushed toast, expired or not.
    pub fn latest(&self) -> Option<&Toast> {
        self.queue.back()
    }

    /// All queued toasts, oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &Toast> {
        self.queue.iter()
    }

    /// Remove a toast the user dismissed.
    pub fn dismiss(&mut self, id: ToastId) -> bool {
        let before = self.queue.len();
        self.queue.retain(|t| t.id != id);
        self.queue.len() != before
    }

    /// Drop expired toasts.
    pub fn retain_visible(&mut self, now: Instant) {
        self.queue
            .retain(|t| now.saturating_duration_since(t.created) < t.ttl);
    }

    /// Return render-ready toasts with progress ratios.
    pub fn visible(&self, now: Instant) -> Vec<ToastRender> {
        self.queue
            .iter()
            .filter(|t| now.saturating_duration_since(t.created) < t.ttl)
            .map(|t| ToastRender {
                id: t.id,
                kind: t.kind,
                title: t.title.clone(),
                body: t.body.clone(),
                progress: 1.0
                    - (now.saturating_duration_since(t.created).as_secs_f32()
                        / t.ttl.as_secs_f32()),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::expect_used)]
    #![allow(clippy::panic)]

    use super::*;

    #[test]
    fn identical_toasts_within_window_are_deduped() {
        let mut toasts = ToastService::default();
        let now = Instant::now();
        let a = toasts.error("Failed to delete record", "backend down", now);
        let b = toasts.error(
            "Failed to delete record",
            "backend down",
            now + Duration::from_millis(100),
        );
        assert_eq!(a, b);
        assert_eq!(toasts.iter().count(), 1);
    }

    #[test]
    fn refreshed_duplicate_becomes_latest() {
        let mut toasts = ToastService::default();
        let now = Instant::now();
        let failed = toasts.error("Failed to delete record", "backend down", now);
        toasts.success("Record created successfully", now);
        let later = now + Duration::from_millis(200);
        let again = toasts.error("Failed to delete record", "backend down", later);
        assert_eq!(failed, again);
        assert_eq!(toasts.iter().count(), 2);
        let latest = toasts.latest().unwrap();
        assert_eq!(latest.id, failed);
        assert_eq!(latest.created, later);
    }

    #[test]
    fn queue_is_bounded() {
        let mut toasts = ToastService::new(2);
        let now = Instant::now();
        toasts.success("one", now);
        toasts.success("two", now);
        toasts.success("three", now);
        let titles: Vec<_> = toasts.iter().map(|t| t.title.as_str()).collect();
        assert_eq!(titles, ["two", "three"]);
    }

    #[test]
    fn expired_toasts_are_hidden_and_dropped() {
        let mut toasts = ToastService::default();
        let now = Instant::now();
        toasts.success("Record created", now);
        assert_eq!(toasts.visible(now).len(), 1);
        let later = now + DEFAULT_TTL;
        assert!(toasts.visible(later).is_empty());
        toasts.retain_visible(later);
        assert!(toasts.latest().is_none());
    }

    #[test]
    fn dismiss_removes_by_id() {
        let mut toasts = ToastService::default();
        let id = toasts.success("Record updated", Instant::now());
        assert!(toasts.dismiss(id));
        assert!(!toasts.dismiss(id));
    }
}
