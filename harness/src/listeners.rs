use crate::controller::{FormEvent, ViewState};

pub type Listener = Box<dyn Fn(&FormEvent, &ViewState) + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

/// Callbacks run synchronously, in subscription order, after every action.
pub struct ListenerRegistry {
    listeners: Vec<(SubscriptionId, Listener)>,
    next_id: u64,
}

impl ListenerRegistry {
    pub fn new() -> Self {
        Self {
            listeners: Vec::new(),
            next_id: 0,
        }
    }

    pub fn subscribe(&mut self, listener: Listener) -> SubscriptionId {
        self.next_id += 1;
        let id = SubscriptionId(self.next_id);
        self.listeners.push((id, listener));
        id
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(existing, _)| *existing != id);
        self.listeners.len() != before
    }

    pub fn notify(&self, event: &FormEvent, view: &ViewState) {
        for (_, listener) in &self.listeners {
            listener(event, view);
        }
    }

    pub fn len(&self) -> usize {
        self.listeners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }
}

impl Default for ListenerRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[test]
    fn test_notify_in_subscription_order() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let mut registry = ListenerRegistry::new();

        for tag in ["first", "second"] {
            let seen = Arc::clone(&seen);
            registry.subscribe(Box::new(move |_, _| seen.lock().unwrap().push(tag)));
        }

        registry.notify(&FormEvent::Reset, &ViewState::default());
        assert_eq!(*seen.lock().unwrap(), vec!["first", "second"]);
    }

    #[test]
    fn test_unsubscribe() {
        let mut registry = ListenerRegistry::new();
        let id = registry.subscribe(Box::new(|_, _| {}));
        assert_eq!(registry.len(), 1);

        assert!(registry.unsubscribe(id));
        assert!(!registry.unsubscribe(id));
        assert!(registry.is_empty());
    }
}
