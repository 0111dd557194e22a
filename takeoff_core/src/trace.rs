//! # Diagnostic Trace Sink
//!
//! Calculators are pure and never print. When a caller wants to see the
//! intermediate steps (which offset a grid label resolved to, which openings
//! were deducted) it injects a [`TraceSink`]. The default is [`NoopTrace`].
//!
//! ```rust
//! use takeoff_core::grid::{GridLine, GridSystem, GridIndex};
//! use takeoff_core::trace::{CollectingTrace, TraceEvent};
//!
//! let grid = GridSystem {
//!     grid_x: vec![GridLine::new("A", 0.0), GridLine::new("B", 5.0)],
//!     grid_y: vec![GridLine::new("1", 0.0)],
//! };
//! let trace = CollectingTrace::new();
//! let index = GridIndex::new(&grid).with_trace(&trace);
//! index.offset_x("B").unwrap();
//!
//! assert!(matches!(trace.events()[0], TraceEvent::GridResolved { .. }));
//! ```

use std::cell::RefCell;

use serde::{Deserialize, Serialize};

/// One diagnostic observation made during a calc run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event")]
pub enum TraceEvent {
    /// A grid label resolved to an offset
    GridResolved { axis: String, label: String, offset: f64 },
    /// A level label resolved to an elevation
    LevelResolved { label: String, elevation: f64 },
    /// Openings were deducted from a target surface
    OpeningsDeducted { target_id: String, count: usize, total_area_m2: f64 },
    /// A takeoff quantity was produced
    QuantityComputed { source_id: String, resource_key: String, quantity: f64 },
    /// Stations were sorted by chainage before integration
    StationsSorted { count: usize, first_chainage: f64, last_chainage: f64 },
}

/// Receiver for diagnostic events.
pub trait TraceSink {
    fn record(&self, event: &TraceEvent);
}

/// Discards every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopTrace;

impl TraceSink for NoopTrace {
    fn record(&self, _event: &TraceEvent) {}
}

/// Shared no-op sink used when no trace is injected.
pub static NOOP_TRACE: NoopTrace = NoopTrace;

/// Forwards events to the `tracing` ecosystem at debug/trace level.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl TraceSink for TracingSink {
    fn record(&self, event: &TraceEvent) {
        match event {
            TraceEvent::GridResolved { axis, label, offset } => {
                tracing::trace!(axis = %axis, label = %label, offset, "Resolved grid line");
            }
            TraceEvent::LevelResolved { label, elevation } => {
                tracing::trace!(label = %label, elevation, "Resolved level");
            }
            TraceEvent::OpeningsDeducted { target_id, count, total_area_m2 } => {
                tracing::debug!(target = %target_id, count, total_area_m2, "Deducted openings");
            }
            TraceEvent::QuantityComputed { source_id, resource_key, quantity } => {
                tracing::debug!(source = %source_id, resource = %resource_key, quantity, "Computed quantity");
            }
            TraceEvent::StationsSorted { count, first_chainage, last_chainage } => {
                tracing::trace!(count, first_chainage, last_chainage, "Sorted stations by chainage");
            }
        }
    }
}

/// Keeps every event in memory, for tests and interactive inspection.
#[derive(Debug, Default)]
pub struct CollectingTrace {
    events: RefCell<Vec<TraceEvent>>,
}

impl CollectingTrace {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the events recorded so far
    pub fn events(&self) -> Vec<TraceEvent> {
        self.events.borrow().clone()
    }

    pub fn len(&self) -> usize {
        self.events.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.borrow().is_empty()
    }
}

impl TraceSink for CollectingTrace {
    fn record(&self, event: &TraceEvent) {
        self.events.borrow_mut().push(event.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collecting_trace_keeps_order() {
        let trace = CollectingTrace::new();
        trace.record(&TraceEvent::LevelResolved { label: "L1".into(), elevation: 0.0 });
        trace.record(&TraceEvent::LevelResolved { label: "L2".into(), elevation: 3.0 });

        let events = trace.events();
        assert_eq!(events.len(), 2);
        assert_eq!(
            events[1],
            TraceEvent::LevelResolved { label: "L2".into(), elevation: 3.0 }
        );
    }

    #[test]
    fn test_noop_trace_records_nothing() {
        let sink: &dyn TraceSink = &NOOP_TRACE;
        sink.record(&TraceEvent::StationsSorted { count: 3, first_chainage: 0.0, last_chainage: 20.0 });
    }
}
