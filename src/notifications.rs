//! User-facing notices and an in-memory notice log.

use std::collections::VecDeque;
use std::sync::Mutex;

use crate::services::NotificationSink;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    Info,
    Success,
    Warning,
    Error,
}

/// A notice for the view layer: `{title, description}` plus presentation hints.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub kind: NoticeKind,
    pub title: String,
    pub description: String,
    /// The user has to acknowledge the notice before continuing
    pub requires_ack: bool,
    pub autodismiss_ms: Option<u64>,
}

impl Notice {
    pub fn new(kind: NoticeKind, title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            kind,
            title: title.into(),
            description: description.into(),
            requires_ack: false,
            autodismiss_ms: None,
        }
    }

    pub fn blocking(mut self) -> Self {
        self.requires_ack = true;
        self.autodismiss_ms = None;
        self
    }

    pub fn autodismiss(mut self, ms: u64) -> Self {
        self.autodismiss_ms = Some(ms);
        self
    }
}

/// A notification entry with message and timestamp
#[derive(Clone, Debug)]
pub struct NotificationEntry {
    pub notice: Notice,
    pub timestamp: chrono::DateTime<chrono::Local>,
}

impl NotificationEntry {
    pub fn new(notice: Notice) -> Self {
        Self {
            notice,
            timestamp: chrono::Local::now(),
        }
    }

    pub fn message(&self) -> String {
        if self.notice.description.is_empty() {
            self.notice.title.clone()
        } else {
            format!("{}: {}", self.notice.title, self.notice.description)
        }
    }

    pub fn time_ago(&self) -> String {
        let now = chrono::Local::now();
        let duration = now.signed_duration_since(self.timestamp);
        if duration.num_seconds() < 60 {
            "just now".to_string()
        } else if duration.num_minutes() < 60 {
            format!("{}m ago", duration.num_minutes())
        } else if duration.num_hours() < 24 {
            format!("{}h ago", duration.num_hours())
        } else {
            self.timestamp.format("%m/%d %H:%M").to_string()
        }
    }
}

/// Bounded log of recent notices. Also mirrors each notice to `tracing`.
pub struct NoticeLog {
    entries: Mutex<VecDeque<NotificationEntry>>,
    capacity: usize,
}

impl Default for NoticeLog {
    fn default() -> Self {
        Self::with_capacity(50)
    }
}

impl NoticeLog {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Mutex::new(VecDeque::with_capacity(capacity)),
            capacity: capacity.max(1),
        }
    }

    pub fn entries(&self) -> Vec<NotificationEntry> {
        match self.entries.lock() {
            Ok(entries) => entries.iter().cloned().collect(),
            Err(poisoned) => poisoned.into_inner().iter().cloned().collect(),
        }
    }

    pub fn notices(&self) -> Vec<Notice> {
        self.entries().into_iter().map(|e| e.notice).collect()
    }

    pub fn count_of(&self, kind: NoticeKind) -> usize {
        self.entries().iter().filter(|e| e.notice.kind == kind).count()
    }
}

impl NotificationSink for NoticeLog {
    fn notify(&self, notice: Notice) {
        match notice.kind {
            NoticeKind::Error => tracing::error!("{} - {}", notice.title, notice.description),
            NoticeKind::Warning => tracing::warn!("{} - {}", notice.title, notice.description),
            _ => tracing::info!("{} - {}", notice.title, notice.description),
        }

        let mut entries = match self.entries.lock() {
            Ok(entries) => entries,
            Err(poisoned) => poisoned.into_inner(),
        };
        if entries.len() == self.capacity {
            entries.pop_front();
        }
        entries.push_back(NotificationEntry::new(notice));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blocking_notice_has_no_autodismiss() {
        let notice = Notice::new(NoticeKind::Error, "Transaction error", "boom")
            .autodismiss(2000)
            .blocking();
        assert!(notice.requires_ack);
        assert_eq!(notice.autodismiss_ms, None);
    }

    #[test]
    fn test_log_drops_oldest_past_capacity() {
        let log = NoticeLog::with_capacity(2);
        log.notify(Notice::new(NoticeKind::Info, "a", ""));
        log.notify(Notice::new(NoticeKind::Info, "b", ""));
        log.notify(Notice::new(NoticeKind::Error, "c", ""));

        let titles: Vec<_> = log.notices().into_iter().map(|n| n.title).collect();
        assert_eq!(titles, vec!["b", "c"]);
        assert_eq!(log.count_of(NoticeKind::Error), 1);
    }

    #[test]
    fn test_entry_message_and_age() {
        let entry = NotificationEntry::new(Notice::new(NoticeKind::Info, "Switched network", "Sepolia"));
        assert_eq!(entry.message(), "Switched network: Sepolia");
        assert_eq!(entry.time_ago(), "just now");
    }
}
