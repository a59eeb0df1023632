//! Subscribers following a single order book.
//!
//! A [`BookListeners`] group holds weak handles only. The session layer owns
//! each subscriber; once it drops its `Arc`, the handle stops resolving and
//! the group skips it (and, when configured, forgets it) on the next publish.
//!
//! The group lock is held only while collecting live handles. Messages are
//! sent after it is released, so a slow subscriber never blocks
//! `add_subscriber` / `remove_subscriber` on the same group.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Weak};

use bookdb_types::Book;
use parking_lot::Mutex;
use serde_json::Value;

/// A consumer of book notifications, owned by the connection layer.
pub trait Subscriber: Send + Sync {
    /// Stable numeric id, unique among live subscribers.
    fn id(&self) -> u64;

    /// Deliver one notification. Must not block on the network.
    fn send(&self, message: &Value);
}

/// The subscribers of one order book.
#[derive(Debug)]
pub struct BookListeners {
    book: Book,
    prune_dead: bool,
    listeners: Mutex<HashMap<u64, Weak<dyn Subscriber>>>,
}

impl BookListeners {
    #[must_use]
    pub fn new(book: Book, prune_dead: bool) -> Self {
        Self {
            book,
            prune_dead,
            listeners: Mutex::new(HashMap::new()),
        }
    }

    /// The book this group follows.
    #[must_use]
    pub fn book(&self) -> &Book {
        &self.book
    }

    /// Register `subscriber` under its own id, replacing any previous handle.
    pub fn add_subscriber(&self, subscriber: &Arc<dyn Subscriber>) {
        self.add_subscriber_with_id(subscriber.id(), Arc::downgrade(subscriber));
    }

    pub fn add_subscriber_with_id(&self, id: u64, handle: Weak<dyn Subscriber>) {
        self.listeners.lock().insert(id, handle);
    }

    /// Returns whether `id` was registered.
    pub fn remove_subscriber(&self, id: u64) -> bool {
        self.listeners.lock().remove(&id).is_some()
    }

    /// Deliver `message` to every live subscriber. Returns deliveries made.
    pub fn publish(&self, message: &Value) -> usize {
        let mut published = HashSet::new();
        self.publish_once(message, &mut published)
    }

    /// Like [`publish`](Self::publish), but skips subscribers already in
    /// `published` and records the ones delivered to.
    ///
    /// Sharing one `published` set across every book a transaction touched
    /// gives each subscriber that transaction at most once.
    pub fn publish_once(&self, message: &Value, published: &mut HashSet<u64>) -> usize {
        let live = self.collect_live();

        let mut delivered = 0;
        for (id, subscriber) in live {
            if published.insert(id) {
                subscriber.send(message);
                delivered += 1;
            }
        }

        tracing::trace!(book = %self.book, delivered, "Published to book listeners");
        delivered
    }

    /// Number of registered handles, live or not.
    #[must_use]
    pub fn len(&self) -> usize {
        self.listeners.lock().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.listeners.lock().is_empty()
    }

    /// Number of handles that still resolve.
    #[must_use]
    pub fn live_count(&self) -> usize {
        self.listeners
            .lock()
            .values()
            .filter(|handle| handle.strong_count() > 0)
            .count()
    }

    fn collect_live(&self) -> Vec<(u64, Arc<dyn Subscriber>)> {
        let mut guard = self.listeners.lock();
        let mut live = Vec::with_capacity(guard.len());
        let before = guard.len();

        guard.retain(|id, handle| match handle.upgrade() {
            Some(subscriber) => {
                live.push((*id, subscriber));
                true
            }
            None => !self.prune_dead,
        });

        let dropped = before - guard.len();
        if dropped > 0 {
            tracing::debug!(book = %self.book, dropped, "Dropped dead book listeners");
        }
        live
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bookdb_types::{AccountId, Issue};
    use serde_json::json;

    struct Recorder {
        id: u64,
        received: Mutex<Vec<Value>>,
    }

    impl Recorder {
        fn new(id: u64) -> Arc<Self> {
            Arc::new(Self {
                id,
                received: Mutex::new(Vec::new()),
            })
        }

        fn count(&self) -> usize {
            self.received.lock().len()
        }
    }

    impl Subscriber for Recorder {
        fn id(&self) -> u64 {
            self.id
        }

        fn send(&self, message: &Value) {
            self.received.lock().push(message.clone());
        }
    }

    fn group(prune_dead: bool) -> BookListeners {
        let book = Book::new(Issue::iou("USD", AccountId::random()), Issue::native());
        BookListeners::new(book, prune_dead)
    }

    fn as_sub(r: &Arc<Recorder>) -> Arc<dyn Subscriber> {
        r.clone()
    }

    #[test]
    fn publish_delivers_exactly_once() {
        let g = group(true);
        let alice = Recorder::new(1);
        g.add_subscriber(&as_sub(&alice));

        let msg = json!({ "type": "transaction", "seq": 5 });
        assert_eq!(g.publish(&msg), 1);
        assert_eq!(alice.count(), 1);
        assert_eq!(alice.received.lock()[0], msg);
    }

    #[test]
    fn removed_subscriber_not_delivered() {
        let g = group(true);
        let alice = Recorder::new(1);
        g.add_subscriber(&as_sub(&alice));

        assert!(g.remove_subscriber(1));
        assert_eq!(g.publish(&json!({})), 0);
        assert_eq!(alice.count(), 0);

        // Absence is not an error.
        assert!(!g.remove_subscriber(1));
    }

    #[test]
    fn dead_handle_skipped_and_pruned() {
        let g = group(true);
        let alice = Recorder::new(1);
        let bob = Recorder::new(2);
        g.add_subscriber(&as_sub(&alice));
        g.add_subscriber(&as_sub(&bob));
        drop(bob);

        assert_eq!(g.len(), 2);
        assert_eq!(g.live_count(), 1);
        assert_eq!(g.publish(&json!({ "n": 1 })), 1);
        assert_eq!(alice.count(), 1);
        assert_eq!(g.len(), 1);
    }

    #[test]
    fn dead_handle_kept_without_pruning() {
        let g = group(false);
        let bob = Recorder::new(2);
        g.add_subscriber(&as_sub(&bob));
        drop(bob);

        assert_eq!(g.publish(&json!({})), 0);
        assert_eq!(g.len(), 1);
        assert_eq!(g.live_count(), 0);
    }

    #[test]
    fn re_adding_overwrites_handle() {
        let g = group(true);
        let first = Recorder::new(7);
        let second = Recorder::new(7);
        g.add_subscriber(&as_sub(&first));
        g.add_subscriber(&as_sub(&second));

        assert_eq!(g.len(), 1);
        g.publish(&json!({}));
        assert_eq!(first.count(), 0);
        assert_eq!(second.count(), 1);
    }

    #[test]
    fn explicit_id_registration() {
        let g = group(true);
        let alice = Recorder::new(1);
        let handle: Arc<dyn Subscriber> = alice.clone();
        g.add_subscriber_with_id(99, Arc::downgrade(&handle));

        assert!(g.remove_subscriber(99));
        assert!(g.is_empty());
    }

    #[test]
    fn publish_once_skips_already_published() {
        let g = group(true);
        let alice = Recorder::new(1);
        let bob = Recorder::new(2);
        g.add_subscriber(&as_sub(&alice));
        g.add_subscriber(&as_sub(&bob));

        let mut published = HashSet::from([1]);
        assert_eq!(g.publish_once(&json!({}), &mut published), 1);
        assert_eq!(alice.count(), 0);
        assert_eq!(bob.count(), 1);
        assert!(published.contains(&2));
    }

    #[test]
    fn empty_group_publish_is_noop() {
        let g = group(true);
        assert!(g.is_empty());
        assert_eq!(g.publish(&json!({})), 0);
    }
}
