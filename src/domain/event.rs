// Flight-phase event domain models
use super::sample::Sample;
use std::fmt;

/// Named flight-phase markers, declared in canonical highlight order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EventKind {
    Launch,
    ThrustMax,
    SecondStageIgnition,
    ThrustEnd,
    MaxVelocity,
    Apogee,
    Deploy,
    Land,
}

impl EventKind {
    pub const CANONICAL_ORDER: [EventKind; 8] = [
        EventKind::Launch,
        EventKind::ThrustMax,
        EventKind::SecondStageIgnition,
        EventKind::ThrustEnd,
        EventKind::MaxVelocity,
        EventKind::Apogee,
        EventKind::Deploy,
        EventKind::Land,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Self::Launch => "launch",
            Self::ThrustMax => "thrust-max",
            Self::SecondStageIgnition => "second-stage-ignition",
            Self::ThrustEnd => "thrust-end",
            Self::MaxVelocity => "max-velocity",
            Self::Apogee => "apogee",
            Self::Deploy => "deploy",
            Self::Land => "land",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A detected event anchored to one sample.
#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    pub kind: EventKind,
    pub sample: Sample,
    /// Present for events derived from a fitted velocity curve.
    pub velocity: Option<f64>,
}

impl Event {
    pub fn new(kind: EventKind, sample: Sample) -> Self {
        Self {
            kind,
            sample,
            velocity: None,
        }
    }

    pub fn with_velocity(mut self, velocity: f64) -> Self {
        self.velocity = Some(velocity);
        self
    }

    pub fn row(&self) -> usize {
        self.sample.row
    }
}

/// Found events of one flight, kept in canonical order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Highlights {
    events: Vec<Event>,
}

impl Highlights {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces an event, preserving canonical order.
    pub fn insert(&mut self, event: Event) {
        match self.events.binary_search_by(|e| e.kind.cmp(&event.kind)) {
            Ok(idx) => self.events[idx] = event,
            Err(idx) => self.events.insert(idx, event),
        }
    }

    pub fn get(&self, kind: EventKind) -> Option<&Event> {
        self.events.iter().find(|e| e.kind == kind)
    }

    pub fn row(&self, kind: EventKind) -> Option<usize> {
        self.get(kind).map(Event::row)
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

}
