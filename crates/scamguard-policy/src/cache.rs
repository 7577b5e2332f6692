//! Message cache
//!
//! Recently admitted messages by id, consulted when a correction arrives
//! for a message the platform can no longer return. Bounded: the oldest
//! insertion is evicted first, and entries older than the TTL read as absent.

use parking_lot::Mutex;
use scamguard_core::Message;
use std::collections::{HashMap, VecDeque};
use std::time::{Duration, Instant};

use crate::config::MessageCacheConfig;

struct Entry {
    message: Message,
    inserted: Instant,
    seq: u64,
}

#[derive(Default)]
struct CacheInner {
    entries: HashMap<String, Entry>,
    order: VecDeque<(String, u64)>,
    next_seq: u64,
}

impl CacheInner {
    /// Drop queue slots left behind by re-inserts and expiries
    fn compact(&mut self) {
        let entries = &self.entries;
        self.order
            .retain(|(id, seq)| entries.get(id).is_some_and(|e| e.seq == *seq));
    }
}

/// Concurrency-safe bounded message cache
pub struct MessageCache {
    capacity: usize,
    ttl: Duration,
    inner: Mutex<CacheInner>,
}

impl MessageCache {
    pub fn new(capacity: usize, ttl: Duration) -> Self {
        Self {
            capacity,
            ttl,
            inner: Mutex::new(CacheInner::default()),
        }
    }

    pub fn from_config(config: &MessageCacheConfig) -> Self {
        Self::new(config.capacity, Duration::from_secs(config.ttl_sec))
    }

    pub fn insert(&self, message: Message) {
        self.insert_at(message, Instant::now());
    }

    /// Insert or refresh a message at `now`
    pub fn insert_at(&self, message: Message, now: Instant) {
        if self.capacity == 0 {
            return;
        }

        let mut inner = self.inner.lock();
        let seq = inner.next_seq;
        inner.next_seq += 1;

        inner.order.push_back((message.id.clone(), seq));
        inner.entries.insert(
            message.id.clone(),
            Entry {
                message,
                inserted: now,
                seq,
            },
        );

        while inner.entries.len() > self.capacity {
            let Some((id, seq)) = inner.order.pop_front() else {
                break;
            };
            // Skip queue slots superseded by a later insert of the same id
            if inner.entries.get(&id).is_some_and(|e| e.seq == seq) {
                inner.entries.remove(&id);
            }
        }

        if inner.order.len() > self.capacity.saturating_mul(2) {
            inner.compact();
        }
    }

    pub fn get(&self, message_id: &str) -> Option<Message> {
        self.get_at(message_id, Instant::now())
    }

    /// Look up a message at `now`, dropping it if expired
    pub fn get_at(&self, message_id: &str, now: Instant) -> Option<Message> {
        let mut inner = self.inner.lock();
        let expired = match inner.entries.get(message_id) {
            Some(entry) => now.saturating_duration_since(entry.inserted) >= self.ttl,
            None => return None,
        };

        if expired {
            inner.entries.remove(message_id);
            return None;
        }
        inner.entries.get(message_id).map(|e| e.message.clone())
    }

    pub fn len(&self) -> usize {
        self.inner.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[cfg(test)]
    fn queue_len(&self) -> usize {
        self.inner.lock().order.len()
    }
}
