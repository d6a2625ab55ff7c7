//! Shape of `notify-cache.yaml`, owned by the (out-of-scope) notifier and
//! read by the fix engine at session end.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotifyCacheEntry {
    pub channel: String,
    pub repo_key: Option<String>,
    pub failed_at: DateTime<Utc>,
    pub reason: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NotifyCache {
    #[serde(default)]
    pub entries: Vec<NotifyCacheEntry>,
    /// High-water mark: entries at or before this time have already been
    /// surfaced to the user.
    pub last_read_at: Option<DateTime<Utc>>,
}

impl NotifyCache {
    /// Entries strictly after `last_read_at`, in chronological order.
    pub fn unseen(&self) -> Vec<&NotifyCacheEntry> {
        let mut unseen: Vec<&NotifyCacheEntry> = match self.last_read_at {
            Some(since) => self.entries.iter().filter(|e| e.failed_at > since).collect(),
            None => self.entries.iter().collect(),
        };
        unseen.sort_by_key(|e| e.failed_at);
        unseen
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(secs, 0).unwrap()
    }

    #[test]
    fn unseen_filters_by_last_read_at() {
        let cache = NotifyCache {
            entries: vec![
                NotifyCacheEntry {
                    channel: "slack".into(),
                    repo_key: None,
                    failed_at: at(10),
                    reason: "timeout".into(),
                },
                NotifyCacheEntry {
                    channel: "slack".into(),
                    repo_key: None,
                    failed_at: at(20),
                    reason: "timeout".into(),
                },
            ],
            last_read_at: Some(at(10)),
        };
        let unseen = cache.unseen();
        assert_eq!(unseen.len(), 1);
        assert_eq!(unseen[0].failed_at, at(20));
    }
}
