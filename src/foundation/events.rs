use std::fmt;

type Listener<E> = Box<dyn FnMut(&E)>;

/// Registered change listeners for one event type, called in subscription order.
pub struct Emitter<E> {
    listeners: Vec<Listener<E>>,
}

impl<E> Default for Emitter<E> {
    fn default() -> Self {
        Self {
            listeners: Vec::new(),
        }
    }
}

impl<E> fmt::Debug for Emitter<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Emitter")
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

impl<E> Emitter<E> {
    /// Register a listener.
    pub fn subscribe(&mut self, listener: impl FnMut(&E) + 'static) {
        self.listeners.push(Box::new(listener));
    }

    /// Deliver `event` to every listener.
    pub fn emit(&mut self, event: E) {
        for listener in &mut self.listeners {
            listener(&event);
        }
    }
}
