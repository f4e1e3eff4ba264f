// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SubscriptionId(u64);

impl SubscriptionId {
    pub const fn get(self) -> u64 {
        self.0
    }
}

/// Change notifications published by a grid. Row positions are in the
/// grid's visible coordinate space at the time of publication.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GridEvent {
    DataChanged { row: usize, column: usize },
    RowsInserted { first: usize, last: usize },
    RowsRemoved { first: usize, last: usize },
    LayoutChanged,
    TotalChanged { cents: i64 },
}

type Handler<E> = Box<dyn FnMut(&E)>;

/// Synchronous publish/subscribe list. Handlers run on the publishing
/// thread, in subscription order, before `publish` returns.
pub struct EventBus<E> {
    next_id: u64,
    handlers: Vec<(SubscriptionId, Handler<E>)>,
}

impl<E> Default for EventBus<E> {
    fn default() -> Self {
        Self {
            next_id: 1,
            handlers: Vec::new(),
        }
    }
}

impl<E> std::fmt::Debug for EventBus<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("subscribers", &self.handlers.len())
            .finish()
    }
}

impl<E> EventBus<E> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe<F>(&mut self, handler: F) -> SubscriptionId
    where
        F: FnMut(&E) + 'static,
    {
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;
        self.handlers.push((id, Box::new(handler)));
        id
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.handlers.len();
        self.handlers.retain(|(existing, _)| *existing != id);
        self.handlers.len() != before
    }

    pub fn publish(&mut self, event: &E) {
        for (_, handler) in &mut self.handlers {
            handler(event);
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.handlers.len()
    }
}

#[cfg(test)]
mod tests {
    use super::{EventBus, GridEvent};
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn handlers_run_in_subscription_order() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let mut bus = EventBus::new();

        let first = Rc::clone(&seen);
        bus.subscribe(move |event: &GridEvent| first.borrow_mut().push(("first", event.clone())));
        let second = Rc::clone(&seen);
        bus.subscribe(move |event: &GridEvent| second.borrow_mut().push(("second", event.clone())));

        bus.publish(&GridEvent::LayoutChanged);
        assert_eq!(
            *seen.borrow(),
            vec![
                ("first", GridEvent::LayoutChanged),
                ("second", GridEvent::LayoutChanged),
            ]
        );
    }

    #[test]
    fn unsubscribe_stops_delivery() {
        let count = Rc::new(RefCell::new(0));
        let mut bus = EventBus::new();
        let counter = Rc::clone(&count);
        let id = bus.subscribe(move |_: &GridEvent| *counter.borrow_mut() += 1);

        bus.publish(&GridEvent::TotalChanged { cents: 1 });
        assert!(bus.unsubscribe(id));
        assert!(!bus.unsubscribe(id));
        bus.publish(&GridEvent::TotalChanged { cents: 2 });

        assert_eq!(*count.borrow(), 1);
        assert_eq!(bus.subscriber_count(), 0);
    }
}
