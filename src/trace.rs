//! Rolling trace of X events and manager transitions.
//!
//! The dispatch loop records everything it sees into a fixed-size ring;
//! when an asynchronous X error surfaces, the newest entries give the
//! debug log the context that led up to it.

use std::collections::VecDeque;
use std::time::Instant;

use serde::{Deserialize, Serialize};

/// One recorded event or transition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TraceEntry {
    pub seq: u64,
    pub at_ms: u64,
    pub kind: String,
    pub window: Option<u32>,
    pub detail: String,
}

/// State transitions that can be traced
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "transition", rename_all = "snake_case")]
pub enum StateTransition {
    /// A client was wrapped in a decoration
    WindowFramed { client: u32, frame: u32, title: u32 },
    /// A client's decoration was torn down
    WindowUnframed { client: u32 },
    /// A destroyed id was dropped from the bookkeeping
    DecorationDropped { window: u32 },
    /// Input focus moved to a client
    FocusMoved { client: u32 },
    /// A pointer drag began on a decoration
    DragStarted { frame: u32, kind: String },
    /// The drag in progress ended
    DragEnded,
}

impl StateTransition {
    /// Flatten into a (kind, window, detail) row for the ring.
    fn describe(&self) -> (&'static str, Option<u32>, String) {
        match self {
            Self::WindowFramed { client, frame, title } => (
                "window_framed",
                Some(*client),
                format!("frame=0x{:x} title=0x{:x}", frame, title),
            ),
            Self::WindowUnframed { client } => ("window_unframed", Some(*client), String::new()),
            Self::DecorationDropped { window } => {
                ("decoration_dropped", Some(*window), String::new())
            }
            Self::FocusMoved { client } => ("focus_moved", Some(*client), String::new()),
            Self::DragStarted { frame, kind } => {
                ("drag_started", Some(*frame), format!("kind={}", kind))
            }
            Self::DragEnded => ("drag_ended", None, String::new()),
        }
    }
}

/// Fixed-size ring of the most recent [`TraceEntry`] rows.
pub struct EventTracer {
    ring: VecDeque<TraceEntry>,
    capacity: usize,
    next_seq: u64,
    started: Instant,
}

impl EventTracer {
    pub fn new(capacity: usize) -> Self {
        Self {
            ring: VecDeque::with_capacity(capacity),
            capacity,
            next_seq: 0,
            started: Instant::now(),
        }
    }

    /// Record one X event as the dispatch loop saw it.
    pub fn record(&mut self, kind: &str, window: Option<u32>, detail: &str) {
        let seq = self.next_seq;
        self.next_seq += 1;

        self.ring.push_back(TraceEntry {
            seq,
            at_ms: self.started.elapsed().as_millis() as u64,
            kind: kind.to_string(),
            window,
            detail: detail.to_string(),
        });
        if self.ring.len() > self.capacity {
            self.ring.pop_front();
        }
    }

    /// Record a bookkeeping transition alongside the raw events.
    pub fn transition(&mut self, transition: &StateTransition) {
        let (kind, window, detail) = transition.describe();
        self.record(kind, window, &detail);
    }

    /// The `count` newest entries, oldest first.
    pub fn recent(&self, count: usize) -> impl Iterator<Item = &TraceEntry> {
        self.ring.iter().skip(self.ring.len().saturating_sub(count))
    }
}
