//! Reader side of notification delivery warnings: surfaces unseen
//! `notify-cache.yaml` entries once per session, then advances the
//! high-water mark.

use bbfix_api::{Error, NotifyCacheEntry};
use bbfix_state::StateStore;
use chrono::Utc;

/// Returns every entry not yet surfaced, newest last, and marks them seen.
pub fn drain_unseen(store: &StateStore) -> Result<Vec<NotifyCacheEntry>, Error> {
    let mut cache = store.load_notify_cache()?;
    let unseen: Vec<NotifyCacheEntry> = cache.unseen().into_iter().cloned().collect();
    if !unseen.is_empty() {
        cache.last_read_at = Some(Utc::now());
        store.save_notify_cache(&cache)?;
    }
    Ok(unseen)
}

#[cfg(test)]
mod tests {
    use super::*;
    use bbfix_api::NotifyCache;

    #[test]
    fn drain_returns_entries_and_advances_watermark() {
        let dir = tempfile::tempdir().unwrap();
        let store = StateStore::open(dir.path()).unwrap();
        let cache = NotifyCache {
            entries: vec![NotifyCacheEntry {
                channel: "slack".into(),
                repo_key: Some("software/api".into()),
                failed_at: Utc::now(),
                reason: "webhook timeout".into(),
            }],
            last_read_at: None,
        };
        store.save_notify_cache(&cache).unwrap();

        let first = drain_unseen(&store).unwrap();
        assert_eq!(first.len(), 1);

        let second = drain_unseen(&store).unwrap();
        assert!(second.is_empty());
    }
}
