//! Observer registration for engine notifications.
//!
//! Listeners are plain closures registered per [`EventKind`] (or for all
//! kinds). [`EventBus::emit`] calls them synchronously in registration
//! order, so every listener has run before the emitting call returns and
//! therefore before the tick's geometry is handed to the renderer.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::engine::InputMode;
use crate::market::MarketMappingMode;
use crate::presets::WavePreset;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum HarmonicEvent {
    ModeSwitched { mode: InputMode },
    #[serde(rename = "toggled-2d")]
    Toggled2D { enabled: bool },
    HarmonicCountChanged { count: usize },
    /// Aggregate spectrum energy crossed the beat threshold.
    Beat { strength: f64 },
    MarketApplied {
        market_time: String,
        mode: Option<MarketMappingMode>,
    },
    PresetSelected { preset: WavePreset },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EventKind {
    ModeSwitched,
    Toggled2D,
    HarmonicCountChanged,
    Beat,
    MarketApplied,
    PresetSelected,
}

impl HarmonicEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            HarmonicEvent::ModeSwitched { .. } => EventKind::ModeSwitched,
            HarmonicEvent::Toggled2D { .. } => EventKind::Toggled2D,
            HarmonicEvent::HarmonicCountChanged { .. } => EventKind::HarmonicCountChanged,
            HarmonicEvent::Beat { .. } => EventKind::Beat,
            HarmonicEvent::MarketApplied { .. } => EventKind::MarketApplied,
            HarmonicEvent::PresetSelected { .. } => EventKind::PresetSelected,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(u64);

type Listener = Box<dyn FnMut(&HarmonicEvent)>;

struct Registration {
    id: ListenerId,
    /// `None` listens to every kind.
    kind: Option<EventKind>,
    listener: Listener,
}

#[derive(Default)]
pub struct EventBus {
    next_id: u64,
    registrations: Vec<Registration>,
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBus")
            .field("listeners", &self.registrations.len())
            .finish()
    }
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    fn register(&mut self, kind: Option<EventKind>, listener: Listener) -> ListenerId {
        let id = ListenerId(self.next_id);
        self.next_id += 1;
        self.registrations.push(Registration { id, kind, listener });
        id
    }

    pub fn subscribe<F>(&mut self, kind: EventKind, listener: F) -> ListenerId
    where
        F: FnMut(&HarmonicEvent) + 'static,
    {
        self.register(Some(kind), Box::new(listener))
    }

    pub fn subscribe_all<F>(&mut self, listener: F) -> ListenerId
    where
        F: FnMut(&HarmonicEvent) + 'static,
    {
        self.register(None, Box::new(listener))
    }

    /// Returns whether a listener was removed.
    pub fn unsubscribe(&mut self, id: ListenerId) -> bool {
        let before = self.registrations.len();
        self.registrations.retain(|r| r.id != id);
        self.registrations.len() != before
    }

    pub fn listener_count(&self) -> usize {
        self.registrations.len()
    }

    pub fn emit(&mut self, event: &HarmonicEvent) {
        let kind = event.kind();
        for r in self.registrations.iter_mut() {
            if r.kind.map_or(true, |k| k == kind) {
                (r.listener)(event);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn listeners_filter_by_kind() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let mut bus = EventBus::new();
        let s = seen.clone();
        bus.subscribe(EventKind::Beat, move |e| s.borrow_mut().push(e.clone()));
        bus.emit(&HarmonicEvent::Toggled2D { enabled: true });
        bus.emit(&HarmonicEvent::Beat { strength: 0.7 });
        assert_eq!(*seen.borrow(), vec![HarmonicEvent::Beat { strength: 0.7 }]);
    }

    #[test]
    fn unsubscribe_stops_delivery() {
        let count = Rc::new(RefCell::new(0));
        let mut bus = EventBus::new();
        let c = count.clone();
        let id = bus.subscribe_all(move |_| *c.borrow_mut() += 1);
        bus.emit(&HarmonicEvent::HarmonicCountChanged { count: 4 });
        assert!(bus.unsubscribe(id));
        assert!(!bus.unsubscribe(id));
        bus.emit(&HarmonicEvent::HarmonicCountChanged { count: 5 });
        assert_eq!(*count.borrow(), 1);
        assert_eq!(bus.listener_count(), 0);
    }

    #[test]
    fn events_serialize_tagged() {
        let json = serde_json::to_string(&HarmonicEvent::Beat { strength: 0.5 }).expect("json");
        assert_eq!(json, r#"{"type":"beat","strength":0.5}"#);
    }
}
