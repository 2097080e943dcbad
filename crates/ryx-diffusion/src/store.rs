//! The diffusion store (spec §4.4): at-most-once local storage per
//! content id, reader-preferred lock, readers copy snapshots out rather
//! than holding the lock across I/O (spec §5).

use parking_lot::RwLock;
use ryx_types::{Message, MessageId};
use std::collections::HashMap;

#[derive(Default)]
pub struct MessageStore {
    inner: RwLock<HashMap<MessageId, Message>>,
}

/// Aggregate energy/hop observability used by the control surface's
/// diffusion-stats projection (spec §6.2).
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize)]
pub struct StoreStats {
    pub count: usize,
    pub mean_energy: f64,
    pub max_hops: u32,
}

impl MessageStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.inner.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn get(&self, id: &MessageId) -> Option<Message> {
        self.inner.read().get(id).cloned()
    }

    pub fn contains(&self, id: &MessageId) -> bool {
        self.inner.read().contains_key(id)
    }

    /// Insert iff absent (spec §4.4 invariant 6: dedup by content id).
    /// Returns the stored record and whether it was freshly inserted.
    pub fn insert_if_absent(&self, message: Message) -> (Message, bool) {
        let mut guard = self.inner.write();
        if let Some(existing) = guard.get(&message.id) {
            return (existing.clone(), false);
        }
        guard.insert(message.id, message.clone());
        (message, true)
    }

    pub fn remove(&self, id: &MessageId) -> Option<Message> {
        self.inner.write().remove(id)
    }

    pub fn all(&self) -> Vec<Message> {
        self.inner.read().values().cloned().collect()
    }

    pub fn count_by_kind(&self) -> HashMap<String, usize> {
        let mut counts = HashMap::new();
        for msg in self.inner.read().values() {
            *counts.entry(msg.kind.as_str().to_string()).or_insert(0) += 1;
        }
        counts
    }

    pub fn stats(&self) -> StoreStats {
        let guard = self.inner.read();
        if guard.is_empty() {
            return StoreStats::default();
        }
        let count = guard.len();
        let total_energy: f64 = guard.values().map(|m| m.energy).sum();
        let max_hops = guard.values().map(|m| m.hops).max().unwrap_or(0);
        StoreStats {
            count,
            mean_energy: total_energy / count as f64,
            max_hops,
        }
    }

    /// Removes up to `batch_cap` entries for which `predicate` returns
    /// true; the cleanup batch cap bounds work done per tick (spec §4.4).
    pub fn cleanup_where(&self, batch_cap: usize, predicate: impl Fn(&Message) -> bool) -> usize {
        let mut guard = self.inner.write();
        let doomed: Vec<MessageId> = guard
            .values()
            .filter(|m| predicate(m))
            .take(batch_cap)
            .map(|m| m.id)
            .collect();
        for id in &doomed {
            guard.remove(id);
        }
        doomed.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ryx_types::{Metadata, MessageKind, NodeId};

    fn msg(payload: &[u8]) -> Message {
        Message::inject(NodeId::new("a"), MessageKind::new("text"), payload.to_vec(), 3.0, 300, 0, Metadata::new())
    }

    #[test]
    fn insert_if_absent_dedups_identical_payload() {
        let store = MessageStore::new();
        let (_, first) = store.insert_if_absent(msg(b"hello"));
        let (_, second) = store.insert_if_absent(msg(b"hello"));
        assert!(first);
        assert!(!second);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn distinct_payloads_both_stored() {
        let store = MessageStore::new();
        store.insert_if_absent(msg(b"a"));
        store.insert_if_absent(msg(b"b"));
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn cleanup_respects_batch_cap() {
        let store = MessageStore::new();
        for i in 0..5u8 {
            store.insert_if_absent(msg(&[i]));
        }
        let removed = store.cleanup_where(2, |_| true);
        assert_eq!(removed, 2);
        assert_eq!(store.len(), 3);
    }

    #[test]
    fn count_by_kind_aggregates() {
        let store = MessageStore::new();
        store.insert_if_absent(msg(b"a"));
        let counts = store.count_by_kind();
        assert_eq!(counts.get("text"), Some(&1));
    }
}
