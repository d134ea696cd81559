//! Explicit change-notification contract shared by both stores.
//!
//! # Invariants
//! - Listeners run synchronously, in subscription order, after the
//!   triggering mutation has been applied and persisted.
//! - Ids are never reused within one store.

/// Handle returned by `subscribe`; pass it to `unsubscribe`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(u64);

pub(crate) struct Subscribers<L: ?Sized> {
    next_id: u64,
    entries: Vec<(SubscriptionId, Box<L>)>,
}

impl<L: ?Sized> Default for Subscribers<L> {
    fn default() -> Self {
        Self {
            next_id: 0,
            entries: Vec::new(),
        }
    }
}

impl<L: ?Sized> Subscribers<L> {
    pub(crate) fn insert(&mut self, listener: Box<L>) -> SubscriptionId {
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;
        self.entries.push((id, listener));
        id
    }

    pub(crate) fn remove(&mut self, id: SubscriptionId) -> bool {
        let before = self.entries.len();
        self.entries.retain(|(entry_id, _)| *entry_id != id);
        self.entries.len() != before
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    pub(crate) fn listeners_mut(&mut self) -> impl Iterator<Item = &mut Box<L>> {
        self.entries.iter_mut().map(|(_, listener)| listener)
    }
}

#[cfg(test)]
mod tests {
    use super::Subscribers;

    type Listener = dyn FnMut(&mut Vec<u32>);

    #[test]
    fn ids_are_not_reused_and_removal_reports_hits() {
        let mut subscribers: Subscribers<Listener> = Subscribers::default();
        let first = subscribers.insert(Box::new(|log: &mut Vec<u32>| log.push(1)));
        assert!(subscribers.remove(first));
        assert!(!subscribers.remove(first));

        let second = subscribers.insert(Box::new(|log: &mut Vec<u32>| log.push(2)));
        assert_ne!(first, second);
        assert_eq!(subscribers.len(), 1);
    }

    #[test]
    fn listeners_run_in_subscription_order() {
        let mut subscribers: Subscribers<Listener> = Subscribers::default();
        subscribers.insert(Box::new(|log: &mut Vec<u32>| log.push(1)));
        subscribers.insert(Box::new(|log: &mut Vec<u32>| log.push(2)));
        subscribers.insert(Box::new(|log: &mut Vec<u32>| log.push(3)));

        let mut log = Vec::new();
        for listener in subscribers.listeners_mut() {
            listener(&mut log);
        }
        assert_eq!(log, vec![1, 2, 3]);
    }
}
