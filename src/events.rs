//! Typed publish/subscribe.

use std::fmt;

/// Returned by [`EventEmitter::on`]; pass it to [`EventEmitter::off`] to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

struct Subscription<E> {
    id: SubscriptionId,
    once: bool,
    callback: Box<dyn FnMut(&E)>,
}

/// Dispatches events of type `E` to subscribers in subscription order.
pub struct EventEmitter<E> {
    next_id: u64,
    subscriptions: Vec<Subscription<E>>,
}

impl<E> Default for EventEmitter<E> {
    fn default() -> Self {
        Self {
            next_id: 1,
            subscriptions: Vec::new(),
        }
    }
}

impl<E> fmt::Debug for EventEmitter<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventEmitter")
            .field("subscriptions", &self.subscriptions.len())
            .finish()
    }
}

impl<E> EventEmitter<E> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on<F>(&mut self, callback: F) -> SubscriptionId
    where
        F: FnMut(&E) + 'static,
    {
        self.subscribe(Box::new(callback), false)
    }

    /// Like [`on`](Self::on), but the subscription is dropped after its first event.
    pub fn once<F>(&mut self, callback: F) -> SubscriptionId
    where
        F: FnMut(&E) + 'static,
    {
        self.subscribe(Box::new(callback), true)
    }

    /// Returns false if the subscription was already gone.
    pub fn off(&mut self, id: SubscriptionId) -> bool {
        let before = self.subscriptions.len();
        self.subscriptions.retain(|s| s.id != id);
        self.subscriptions.len() != before
    }

    pub fn emit(&mut self, event: &E) {
        for subscription in self.subscriptions.iter_mut() {
            (subscription.callback)(event);
        }
        self.subscriptions.retain(|s| !s.once);
    }

    pub fn clear(&mut self) {
        self.subscriptions.clear();
    }

    pub fn len(&self) -> usize {
        self.subscriptions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.subscriptions.is_empty()
    }

    fn subscribe(&mut self, callback: Box<dyn FnMut(&E)>, once: bool) -> SubscriptionId {
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;
        self.subscriptions.push(Subscription { id, once, callback });
        id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn recorder() -> (Rc<RefCell<Vec<i32>>>, impl FnMut(&i32) + 'static) {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        (seen, move |v: &i32| sink.borrow_mut().push(*v))
    }

    #[test]
    fn emit_reaches_every_subscriber() {
        let mut events = EventEmitter::new();
        let (a, fa) = recorder();
        let (b, fb) = recorder();
        events.on(fa);
        events.on(fb);
        events.emit(&7);
        assert_eq!(*a.borrow(), [7]);
        assert_eq!(*b.borrow(), [7]);
    }

    #[test]
    fn once_fires_a_single_time() {
        let mut events = EventEmitter::new();
        let (seen, f) = recorder();
        events.once(f);
        events.emit(&1);
        events.emit(&2);
        assert_eq!(*seen.borrow(), [1]);
        assert!(events.is_empty());
    }

    #[test]
    fn off_unsubscribes() {
        let mut events = EventEmitter::new();
        let (seen, f) = recorder();
        let id = events.on(f);
        assert!(events.off(id));
        assert!(!events.off(id));
        events.emit(&3);
        assert!(seen.borrow().is_empty());
    }
}
