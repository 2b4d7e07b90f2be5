//! Named-event dispatch.
//!
//! An [`Emitter`] maps event names to handler lists. Handlers receive a
//! mutable scope of type `S` along with the event arguments, which lets a
//! handler registered on a component drive the owning [`Tree`](crate::Tree)
//! without reference cycles. Dispatch operates on a snapshot of the handler
//! list, so handlers added or removed during a trigger take effect on the
//! next trigger.

use std::{cell::RefCell, collections::HashMap, rc::Rc};

use tracing::warn;

use crate::value::Value;

/// Token identifying a registered handler, used to remove it later.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HandlerId(u64);

type Handler<S> = Rc<RefCell<dyn FnMut(&mut S, &[Value])>>;

struct Slot<S> {
    id: HandlerId,
    func: Handler<S>,
}

/// An event emitter dispatching to handlers keyed by event name.
pub struct Emitter<S = ()> {
    slots: HashMap<String, Vec<Slot<S>>>,
    next_id: u64,
}

impl<S> Default for Emitter<S> {
    fn default() -> Self {
        Self {
            slots: HashMap::new(),
            next_id: 0,
        }
    }
}

impl<S> std::fmt::Debug for Emitter<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Emitter")
            .field("events", &self.slots.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl<S> Emitter<S> {
    /// Create an empty emitter.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler for a named event. Returns a token that can be
    /// passed to [`Emitter::off`] to remove the handler.
    pub fn on(
        &mut self,
        event: impl Into<String>,
        func: impl FnMut(&mut S, &[Value]) + 'static,
    ) -> HandlerId {
        let id = HandlerId(self.next_id);
        self.next_id += 1;
        self.slots.entry(event.into()).or_default().push(Slot {
            id,
            func: Rc::new(RefCell::new(func)),
        });
        id
    }

    /// Remove a previously registered handler. Returns false if no handler
    /// with the given token is registered for the event.
    pub fn off(&mut self, event: &str, id: HandlerId) -> bool {
        let Some(slots) = self.slots.get_mut(event) else {
            return false;
        };
        let before = slots.len();
        slots.retain(|s| s.id != id);
        let removed = slots.len() != before;
        if slots.is_empty() {
            self.slots.remove(event);
        }
        removed
    }

    /// True if any handler is registered for the event.
    pub fn has_handlers(&self, event: &str) -> bool {
        self.slots.contains_key(event)
    }

    /// Snapshot the handlers registered for an event at this moment.
    pub(crate) fn snapshot(&self, event: &str) -> Vec<Handler<S>> {
        self.slots
            .get(event)
            .map(|slots| slots.iter().map(|s| s.func.clone()).collect())
            .unwrap_or_default()
    }

    /// Invoke every handler registered for the event. A handler that is
    /// already executing (a re-entrant trigger of the same event from within
    /// its own body) is skipped with a warning rather than deadlocking.
    pub fn trigger(&self, scope: &mut S, event: &str, args: &[Value]) {
        for func in self.snapshot(event) {
            match func.try_borrow_mut() {
                Ok(mut f) => f(scope, args),
                Err(_) => warn!(event, "skipping re-entrant event handler"),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn on_trigger_off() {
        let mut e: Emitter<Vec<i64>> = Emitter::new();
        let id = e.on("ping", |log, args| {
            log.push(args[0].as_int().unwrap_or(0));
        });
        let mut log = Vec::new();
        e.trigger(&mut log, "ping", &[Value::Int(1)]);
        e.trigger(&mut log, "other", &[]);
        assert_eq!(log, vec![1]);
        assert!(e.off("ping", id));
        assert!(!e.off("ping", id));
        e.trigger(&mut log, "ping", &[Value::Int(2)]);
        assert_eq!(log, vec![1]);
    }

    #[test]
    fn handlers_run_in_registration_order() {
        let mut e: Emitter<Vec<i64>> = Emitter::new();
        e.on("ev", |log, _| log.push(1));
        e.on("ev", |log, _| log.push(2));
        let mut log = Vec::new();
        e.trigger(&mut log, "ev", &[]);
        assert_eq!(log, vec![1, 2]);
    }

    #[test]
    fn removal_takes_effect_next_trigger() {
        let mut e: Emitter<Vec<i64>> = Emitter::new();
        let id = e.on("ev", |log, _| log.push(1));
        e.on("ev", |log, _| log.push(2));
        let mut log = Vec::new();
        e.trigger(&mut log, "ev", &[]);
        assert!(e.off("ev", id));
        e.trigger(&mut log, "ev", &[]);
        assert_eq!(log, vec![1, 2, 2]);
    }
}
