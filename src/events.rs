use std::collections::{HashMap, VecDeque};

use crate::project::Filter;
use crate::ui::theme::ThemeMode;

/// Channel an event is published on. Handlers subscribe per topic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Topic {
    LocaleChanged,
    ThemeChanged,
    FilterChanged,
}

/// Application-wide notifications. Each variant carries its new value.
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    LocaleChanged { locale: String },
    ThemeChanged { mode: ThemeMode },
    FilterChanged { filter: Filter },
}

impl Event {
    pub fn topic(&self) -> Topic {
        match self {
            Event::LocaleChanged { .. } => Topic::LocaleChanged,
            Event::ThemeChanged { .. } => Topic::ThemeChanged,
            Event::FilterChanged { .. } => Topic::FilterChanged,
        }
    }
}

/// Handle returned by [`EventBus::subscribe`], used to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(u64);

pub type Handler = Box<dyn FnMut(&Event)>;

/// Synchronous publish/subscribe dispatcher.
///
/// Handlers run in subscription order on the caller's thread. `publish`
/// borrows the bus mutably for the whole dispatch and handlers only see the
/// event, so the subscriber list cannot change mid-dispatch. A handler that
/// panics aborts the remaining dispatch.
pub struct EventBus {
    handlers: HashMap<Topic, Vec<(SubscriptionId, Handler)>>,
    next_id: u64,
    history: EventLog,
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl EventBus {
    pub fn new() -> Self {
        Self {
            handlers: HashMap::new(),
            next_id: 0,
            history: EventLog::new(HISTORY_CAPACITY),
        }
    }

    /// Register a handler for `topic`. Ids are never reused.
    pub fn subscribe(&mut self, topic: Topic, handler: impl FnMut(&Event) + 'static) -> SubscriptionId {
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;
        self.handlers
            .entry(topic)
            .or_default()
            .push((id, Box::new(handler)));
        log::trace!("subscribe {topic:?} -> {id:?}");
        id
    }

    /// Remove a handler. Returns false if it was not registered.
    pub fn unsubscribe(&mut self, topic: Topic, id: SubscriptionId) -> bool {
        let Some(list) = self.handlers.get_mut(&topic) else {
            return false;
        };
        let before = list.len();
        list.retain(|(sid, _)| *sid != id);
        before != list.len()
    }

    /// Invoke every handler of the event's topic, in subscription order.
    /// Returns how many handlers ran.
    pub fn publish(&mut self, event: &Event) -> usize {
        let topic = event.topic();
        self.history.push(event.clone());
        let Some(list) = self.handlers.get_mut(&topic) else {
            return 0;
        };
        for (_, handler) in list.iter_mut() {
            handler(event);
        }
        log::debug!("published {event:?} to {} handler(s)", list.len());
        list.len()
    }

    /// Number of live handlers on a topic.
    pub fn subscriber_count(&self, topic: Topic) -> usize {
        self.handlers.get(&topic).map_or(0, Vec::len)
    }

    /// Recently published events, oldest first.
    pub fn history(&self) -> &EventLog {
        &self.history
    }
}

const HISTORY_CAPACITY: usize = 256;

/// The last `capacity` published events, oldest first. Older ones fall off
/// the front.
pub struct EventLog {
    events: VecDeque<Event>,
    capacity: usize,
}

impl EventLog {
    /// A capacity of zero is treated as one.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            events: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn push(&mut self, event: Event) {
        if self.events.len() == self.capacity {
            self.events.pop_front();
        }
        self.events.push_back(event);
    }

    pub fn iter(&self) -> impl Iterator<Item = &Event> {
        self.events.iter()
    }

    /// Up to `n` newest events, newest last.
    pub fn recent(&self, n: usize) -> Vec<&Event> {
        let skip = self.events.len().saturating_sub(n);
        self.events.iter().skip(skip).collect()
    }

    /// Number of stored events on one topic.
    pub fn count_topic(&self, topic: Topic) -> usize {
        self.iter().filter(|e| e.topic() == topic).count()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;

    fn locale(code: &str) -> Event {
        Event::LocaleChanged {
            locale: code.to_string(),
        }
    }

    fn code(event: &Event) -> &str {
        match event {
            Event::LocaleChanged { locale } => locale,
            _ => "",
        }
    }

    #[test]
    fn handlers_run_in_subscription_order() {
        let mut bus = EventBus::new();
        let seen = Rc::new(RefCell::new(Vec::new()));
        for tag in ["a", "b", "c"] {
            let seen = Rc::clone(&seen);
            bus.subscribe(Topic::LocaleChanged, move |_| seen.borrow_mut().push(tag));
        }
        assert_eq!(bus.publish(&locale("en")), 3);
        assert_eq!(*seen.borrow(), vec!["a", "b", "c"]);
    }

    #[test]
    fn publish_only_reaches_matching_topic() {
        let mut bus = EventBus::new();
        let hits = Rc::new(RefCell::new(0));
        let h = Rc::clone(&hits);
        bus.subscribe(Topic::ThemeChanged, move |_| *h.borrow_mut() += 1);
        assert_eq!(bus.publish(&locale("en")), 0);
        assert_eq!(*hits.borrow(), 0);
    }

    #[test]
    fn unsubscribe_removes_only_that_handler() {
        let mut bus = EventBus::new();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let s1 = Rc::clone(&seen);
        let first = bus.subscribe(Topic::LocaleChanged, move |e| {
            s1.borrow_mut().push(format!("1:{}", code(e)))
        });
        let s2 = Rc::clone(&seen);
        bus.subscribe(Topic::LocaleChanged, move |e| {
            s2.borrow_mut().push(format!("2:{}", code(e)))
        });

        assert!(bus.unsubscribe(Topic::LocaleChanged, first));
        assert!(!bus.unsubscribe(Topic::LocaleChanged, first));
        assert!(!bus.unsubscribe(Topic::FilterChanged, first));

        bus.publish(&locale("it"));
        assert_eq!(*seen.borrow(), vec!["2:it".to_string()]);
        assert_eq!(bus.subscriber_count(Topic::LocaleChanged), 1);
    }

    #[test]
    fn subscription_ids_are_unique() {
        let mut bus = EventBus::new();
        let a = bus.subscribe(Topic::LocaleChanged, |_| {});
        bus.unsubscribe(Topic::LocaleChanged, a);
        let b = bus.subscribe(Topic::LocaleChanged, |_| {});
        assert_ne!(a, b);
    }

    #[test]
    #[should_panic(expected = "handler failed")]
    fn panicking_handler_propagates() {
        let mut bus = EventBus::new();
        bus.subscribe(Topic::LocaleChanged, |_| panic!("handler failed"));
        bus.publish(&locale("en"));
    }

    #[test]
    fn history_records_published_events() {
        let mut bus = EventBus::new();
        bus.publish(&locale("en"));
        bus.publish(&Event::ThemeChanged {
            mode: ThemeMode::Light,
        });
        assert_eq!(bus.history().len(), 2);
        assert_eq!(bus.history().count_topic(Topic::LocaleChanged), 1);
    }

    #[test]
    fn log_drops_oldest_when_full() {
        let mut log = EventLog::new(3);
        for c in ["a", "b", "c", "d", "e"] {
            log.push(locale(c));
        }
        assert_eq!(log.len(), 3);
        let codes: Vec<&str> = log.iter().map(code).collect();
        assert_eq!(codes, vec!["c", "d", "e"]);
    }

    #[test]
    fn recent_returns_newest_in_order() {
        let mut log = EventLog::new(3);
        for c in ["a", "b", "c", "d", "e", "f", "g"] {
            log.push(locale(c));
        }
        let codes: Vec<&str> = log.recent(2).into_iter().map(code).collect();
        assert_eq!(codes, vec!["f", "g"]);
    }

    #[test]
    fn recent_caps_at_stored_count() {
        let mut log = EventLog::new(10);
        log.push(locale("a"));
        log.push(locale("b"));
        assert_eq!(log.recent(100).len(), 2);
    }

    #[test]
    fn zero_capacity_keeps_one_event() {
        let mut log = EventLog::new(0);
        assert!(log.is_empty());
        log.push(locale("a"));
        log.push(locale("b"));
        assert_eq!(log.len(), 1);
        assert_eq!(log.iter().map(code).collect::<Vec<_>>(), vec!["b"]);
    }
}
