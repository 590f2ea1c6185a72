/// An emitted event together with its emission order.
#[derive(Debug, Clone, PartialEq)]
pub struct Event<E> {
    /// 0-based, monotonically increasing across the lifetime of the bus.
    pub seq: u64,
    pub payload: E,
}

/// Single-threaded event queue.
///
/// Producers `emit` synchronously; the owner drains the queue in the same turn. Nothing is
/// dispatched implicitly, so handlers always observe events in emission order.
#[derive(Debug)]
pub struct EventBus<E> {
    next_seq: u64,
    events: Vec<Event<E>>,
}

impl<E> EventBus<E> {
    pub fn new() -> Self {
        Self {
            next_seq: 0,
            events: Vec::new(),
        }
    }

    pub fn emit(&mut self, payload: E) -> u64 {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.events.push(Event { seq, payload });
        seq
    }

    pub fn events(&self) -> &[Event<E>] {
        &self.events
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn drain(&mut self) -> Vec<Event<E>> {
        std::mem::take(&mut self.events)
    }
}

impl<E> Default for EventBus<E> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::EventBus;

    #[test]
    fn records_events_in_emission_order() {
        let mut bus = EventBus::new();
        bus.emit("first");
        bus.emit("second");
        assert_eq!(bus.events().len(), 2);
        assert_eq!(bus.events()[0].payload, "first");
        assert_eq!(bus.events()[1].seq, 1);
    }

    #[test]
    fn drain_clears_events_but_keeps_sequence() {
        let mut bus = EventBus::new();
        bus.emit(1u8);
        let drained = bus.drain();
        assert_eq!(drained.len(), 1);
        assert!(bus.is_empty());
        assert_eq!(bus.emit(2u8), 1);
    }
}
