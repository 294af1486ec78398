use foundation::time::Time;

/// Minimal event type for traceability.
///
/// Events are structured text tagged with the time they were recorded at. The
/// web entrypoint flushes them to the browser console; tests assert on them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Event {
    pub at: Time,
    pub kind: &'static str,
    pub message: String,
}

#[derive(Debug, Default)]
pub struct EventBus {
    events: Vec<Event>,
}

impl EventBus {
    pub fn new() -> Self {
        Self { events: Vec::new() }
    }

    pub fn emit(&mut self, at: Time, kind: &'static str, message: impl Into<String>) {
        self.events.push(Event {
            at,
            kind,
            message: message.into(),
        });
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    pub fn of_kind<'a>(&'a self, kind: &'a str) -> impl Iterator<Item = &'a Event> + 'a {
        self.events.iter().filter(move |e| e.kind == kind)
    }

    pub fn drain(&mut self) -> Vec<Event> {
        std::mem::take(&mut self.events)
    }
}

#[cfg(test)]
mod tests {
    use super::EventBus;
    use foundation::time::Time;

    #[test]
    fn records_events_with_time() {
        let mut bus = EventBus::new();
        bus.emit(Time(3000), "test", "hello");
        assert_eq!(bus.events().len(), 1);
        assert_eq!(bus.events()[0].at, Time(3000));
    }

    #[test]
    fn filters_by_kind() {
        let mut bus = EventBus::new();
        bus.emit(Time(0), "a", "1");
        bus.emit(Time(0), "b", "2");
        bus.emit(Time(1), "a", "3");
        let msgs: Vec<_> = bus.of_kind("a").map(|e| e.message.as_str()).collect();
        assert_eq!(msgs, vec!["1", "3"]);
    }

    #[test]
    fn drain_clears_events() {
        let mut bus = EventBus::new();
        bus.emit(Time(0), "k", "m");
        let drained = bus.drain();
        assert_eq!(drained.len(), 1);
        assert!(bus.events().is_empty());
    }
}
